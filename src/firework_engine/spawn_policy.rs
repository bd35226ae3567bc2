//! Politiques de tir : timer périodique et déclencheurs utilisateur.

use glam::Vec3;
use log::warn;
use rand::Rng;

use crate::firework_engine::config::ShowConfig;
use crate::firework_engine::types::Timestamp;
use crate::scene_engine::types::Ray;

/// Point de départ et direction d'un tir.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Launch {
    pub origin: Vec3,
    pub direction: Vec3,
}

/// Timer de tir à période fixe (avec variation optionnelle).
///
/// Le premier tir a lieu une période après le premier `poll`, comme un
/// intervalle classique.
#[derive(Debug, Clone)]
pub struct SpawnTimer {
    period_ms: Timestamp,
    variation_ms: Timestamp,
    max_catch_up: usize,
    next_fire_at: Option<Timestamp>,
}

impl SpawnTimer {
    pub fn new(period_ms: Timestamp, variation_ms: Timestamp, max_catch_up: usize) -> Self {
        Self {
            period_ms: period_ms.max(1),
            variation_ms: variation_ms.min(period_ms.saturating_sub(1)),
            max_catch_up: max_catch_up.max(1),
            next_fire_at: None,
        }
    }

    pub fn from_config(config: &ShowConfig) -> Self {
        Self::new(
            config.spawn_interval_ms,
            config.spawn_interval_variation_ms,
            config.max_timer_catch_up,
        )
    }

    pub fn next_fire_at(&self) -> Option<Timestamp> {
        self.next_fire_at
    }

    /// Force une échéance à `now` (le prochain `poll(now)` tire une fois).
    pub fn force_due(&mut self, now: Timestamp) {
        self.next_fire_at = Some(now);
    }

    /// Nombre de tirs dus à `now`.
    ///
    /// Après un gel de l'horloge, au plus `max_catch_up` tirs sont rattrapés ;
    /// les suivants sont abandonnés et le timer repart de `now`.
    pub fn poll(&mut self, now: Timestamp, rng: &mut impl Rng) -> usize {
        let Some(mut next) = self.next_fire_at else {
            self.next_fire_at = Some(now + self.next_interval(rng));
            return 0;
        };

        let mut due = 0;
        while now >= next {
            if due == self.max_catch_up {
                warn!(
                    "⏱️ Spawn timer late by {} ms, dropping missed launches",
                    now - next
                );
                next = now + self.next_interval(rng);
                break;
            }
            due += 1;
            next += self.next_interval(rng);
        }
        self.next_fire_at = Some(next);
        due
    }

    fn next_interval(&self, rng: &mut impl Rng) -> Timestamp {
        if self.variation_ms == 0 {
            return self.period_ms;
        }
        rng.random_range(
            (self.period_ms - self.variation_ms)..=(self.period_ms + self.variation_ms),
        )
    }
}

/// Tir du timer : abscisse entière aléatoire, au sol, à profondeur fixe.
pub fn timer_launch(config: &ShowConfig, rng: &mut impl Rng) -> Launch {
    let (x_min, x_max) = config.spawn_origin_x_range();
    let x = if x_min < x_max {
        rng.random_range(x_min..x_max)
    } else {
        x_min
    };
    Launch {
        origin: Vec3::new(x as f32, 0.0, config.spawn_origin_z) * config.scene_scale,
        direction: config.spawn_direction(),
    }
}

/// Événements d'entrée qui peuvent déclencher un tir.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Double-tap du pointeur, avec le rayon de picking
    DoubleTap { ray: Ray },
    /// Changement d'état de la gâchette d'une manette VR
    XrTrigger {
        was_pressed: bool,
        is_pressed: bool,
        ray: Ray,
    },
}

impl InputEvent {
    /// Tir associé à l'événement, s'il y en a un.
    ///
    /// Le double-tap relève légèrement la direction ; la gâchette VR ne tire
    /// qu'au relâchement.
    pub fn launch(&self, double_tap_lift: f32) -> Option<Launch> {
        match *self {
            InputEvent::DoubleTap { ray } => Some(Launch {
                origin: ray.origin,
                direction: ray.direction + Vec3::new(0.0, double_tap_lift, 0.0),
            }),
            InputEvent::XrTrigger {
                was_pressed,
                is_pressed,
                ray,
            } => (was_pressed && !is_pressed).then_some(Launch {
                origin: ray.origin,
                direction: ray.direction,
            }),
        }
    }
}
