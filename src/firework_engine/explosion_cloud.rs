use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use rand::Rng;

use crate::firework_engine::config::RocketConfig;
use crate::firework_engine::types::{Color, Timestamp, SECOND_MS};
use crate::scene_engine::types::CloudHandle;

/// Point envoyé au nuage de la scène (layout compatible buffer GPU).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct CloudPoint {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

/// Particule d'explosion : position de départ sur la surface du modèle et
/// vitesse radiale depuis le centre de l'explosion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExplosionParticle {
    pub initial_position: Vec3,
    pub radial_velocity: Vec3,
}

impl ExplosionParticle {
    pub fn new(surface_point: Vec3, center: Vec3) -> Self {
        Self {
            initial_position: surface_point,
            radial_velocity: surface_point - center,
        }
    }

    /// Position pour un facteur d'échelle donné, recalculée depuis la position
    /// initiale (aucune accumulation d'une frame à l'autre).
    #[inline(always)]
    pub fn position_at(&self, velocity_scale: f32) -> Vec3 {
        self.initial_position + self.radial_velocity * velocity_scale
    }
}

/// Facteur d'expansion : croissance logarithmique du temps écoulé (secondes).
#[inline]
pub fn velocity_scale(elapsed_ms: Timestamp, gain: f32) -> f32 {
    (1.0 + elapsed_ms as f32 / SECOND_MS).log2() * gain
}

/// Fondu linéaire de 1 à 0 sur la période d'explosion.
#[inline]
pub fn fade_factor(elapsed_ms: Timestamp, period_ms: Timestamp) -> f32 {
    (1.0 - elapsed_ms as f32 / period_ms as f32).clamp(0.0, 1.0)
}

/// Intensité de la lumière : `max(1 - k * e / P, 0)`.
#[inline]
pub fn light_intensity(elapsed_ms: Timestamp, period_ms: Timestamp, fade_slope: f32) -> f32 {
    (1.0 - fade_slope * elapsed_ms as f32 / period_ms as f32).max(0.0)
}

/// Nuage de points d'une explosion, possédé par une seule fusée.
///
/// `points` est le tampon de sortie réécrit à chaque frame : il appartient à
/// ce nuage et n'est jamais partagé avec une autre fusée.
#[derive(Debug)]
pub struct ExplosionCloud {
    handle: CloudHandle,
    center: Vec3,
    base_color: Color,
    particles: Vec<ExplosionParticle>,
    points: Vec<CloudPoint>,
}

impl ExplosionCloud {
    pub fn new(handle: CloudHandle, center: Vec3, base_color: Color, surface: Vec<Vec3>) -> Self {
        let particles: Vec<_> = surface
            .into_iter()
            .map(|p| ExplosionParticle::new(p, center))
            .collect();
        let points = vec![CloudPoint::default(); particles.len()];
        Self {
            handle,
            center,
            base_color,
            particles,
            points,
        }
    }

    pub fn handle(&self) -> CloudHandle {
        self.handle
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn particles(&self) -> &[ExplosionParticle] {
        &self.particles
    }

    /// Dernière frame calculée.
    pub fn points(&self) -> &[CloudPoint] {
        &self.points
    }

    /// Recalcule positions et couleurs pour `elapsed_ms` depuis le début de
    /// l'explosion.
    ///
    /// Passé `crackle_start_fraction` de la période, les couleurs RGB sont
    /// retirées au hasard à chaque frame (scintillement), l'alpha continue
    /// de décroître.
    pub fn update(
        &mut self,
        elapsed_ms: Timestamp,
        config: &RocketConfig,
        rng: &mut impl Rng,
    ) -> &[CloudPoint] {
        let scale = velocity_scale(elapsed_ms, config.explosion_velocity_gain);
        let fade = fade_factor(elapsed_ms, config.explosion_period_ms);
        let crackle = config.crackle_flicker
            && elapsed_ms as f32
                >= config.crackle_start_fraction * config.explosion_period_ms as f32;

        let faded = (self.base_color * fade).to_array();
        for (particle, point) in self.particles.iter().zip(self.points.iter_mut()) {
            point.position = particle.position_at(scale).to_array();
            point.color = if crackle {
                [rng.random(), rng.random(), rng.random(), fade]
            } else {
                [faded[0], faded[1], faded[2], fade]
            };
        }
        &self.points
    }
}
