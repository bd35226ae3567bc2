use anyhow::ensure;
use glam::Vec3;
use itertools::Itertools;
use serde::Deserialize;
use std::f32::consts::{FRAC_PI_6, FRAC_PI_8};

use crate::firework_engine::types::Timestamp;

/// Constantes de vol et d'explosion d'une fusée.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RocketConfig {
    pub rocket_speed: f32,
    pub rocket_mass: f32,
    pub rocket_restitution: f32,
    pub rocket_diameter: f32,

    /// Durée totale du vol (ms)
    pub flight_duration_ms: Timestamp,
    /// Fraction du vol à partir de laquelle la traînée ralentit
    pub trail_slow_fraction: f32,
    /// Fraction du vol à partir de laquelle la traînée n'émet plus
    pub trail_cutoff_fraction: f32,

    pub trail_capacity: usize,
    pub trail_emit_rate: f32,
    pub trail_min_life: f32,
    pub trail_max_life: f32,
    pub trail_slow_emit_rate: f32,
    pub trail_slow_min_life: f32,
    pub trail_slow_max_life: f32,

    /// Durée de l'animation d'explosion (ms)
    pub explosion_period_ms: Timestamp,
    pub particles_per_explosion: usize,
    pub explosion_point_size: f32,
    /// Gain appliqué à `log2(1 + t)` pour l'expansion du nuage
    pub explosion_velocity_gain: f32,
    /// Pente du fondu de la lumière : `max(1 - k * e / P, 0)`
    pub light_fade_factor: f32,
    pub crackle_flicker: bool,
    /// Fraction de la période à partir de laquelle les couleurs scintillent
    pub crackle_start_fraction: f32,

    pub light_flight_intensity: f32,
    pub light_offset_y: f32,
    pub shadow_map_size: u32,

    /// Amplitudes (radians) de l'inclinaison aléatoire du modèle d'explosion
    pub template_tilt_x: f32,
    pub template_tilt_y: f32,
    pub template_tilt_z: f32,

    pub whistle_max_distance: f32,
    pub whistle_rolloff: f32,
    pub pop_max_distance: f32,
    pub pop_rolloff: f32,
}

impl Default for RocketConfig {
    fn default() -> Self {
        Self {
            rocket_speed: 10.0,
            rocket_mass: 1.0,
            rocket_restitution: 0.9,
            rocket_diameter: 0.15,
            flight_duration_ms: 2000,
            trail_slow_fraction: 2.0 / 3.0,
            trail_cutoff_fraction: 5.0 / 6.0,
            trail_capacity: 2000,
            trail_emit_rate: 1000.0,
            trail_min_life: 0.3,
            trail_max_life: 0.7,
            trail_slow_emit_rate: 100.0,
            trail_slow_min_life: 0.2,
            trail_slow_max_life: 0.5,
            explosion_period_ms: 3000,
            particles_per_explosion: 5000,
            explosion_point_size: 0.8,
            explosion_velocity_gain: 4.0,
            light_fade_factor: 1.0,
            crackle_flicker: true,
            crackle_start_fraction: 0.5,
            light_flight_intensity: 0.3,
            light_offset_y: -0.26,
            shadow_map_size: 1024,
            template_tilt_x: FRAC_PI_8,
            template_tilt_y: FRAC_PI_6,
            template_tilt_z: FRAC_PI_6,
            whistle_max_distance: 1000.0,
            whistle_rolloff: 40.0,
            pop_max_distance: 1000.0,
            pop_rolloff: 10.0,
        }
    }
}

impl RocketConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(self.flight_duration_ms > 0, "flight_duration_ms must be > 0");
        ensure!(
            self.explosion_period_ms > 0,
            "explosion_period_ms must be > 0"
        );
        ensure!(
            0.0 <= self.trail_slow_fraction
                && self.trail_slow_fraction <= self.trail_cutoff_fraction
                && self.trail_cutoff_fraction <= 1.0,
            "trail fractions must satisfy 0 <= slow ({}) <= cutoff ({}) <= 1",
            self.trail_slow_fraction,
            self.trail_cutoff_fraction
        );
        ensure!(
            (0.0..=1.0).contains(&self.crackle_start_fraction),
            "crackle_start_fraction must be in [0, 1], got {}",
            self.crackle_start_fraction
        );
        ensure!(
            self.particles_per_explosion > 0,
            "particles_per_explosion must be > 0"
        );
        ensure!(
            self.trail_min_life <= self.trail_max_life
                && self.trail_slow_min_life <= self.trail_slow_max_life,
            "trail life ranges must be ordered (min <= max)"
        );

        // Amplitudes, débits et tailles : finis et positifs (NaN refusé)
        for (name, value) in [
            ("template_tilt_x", self.template_tilt_x),
            ("template_tilt_y", self.template_tilt_y),
            ("template_tilt_z", self.template_tilt_z),
            ("trail_emit_rate", self.trail_emit_rate),
            ("trail_min_life", self.trail_min_life),
            ("trail_max_life", self.trail_max_life),
            ("trail_slow_emit_rate", self.trail_slow_emit_rate),
            ("trail_slow_min_life", self.trail_slow_min_life),
            ("trail_slow_max_life", self.trail_slow_max_life),
            ("explosion_point_size", self.explosion_point_size),
            ("explosion_velocity_gain", self.explosion_velocity_gain),
            ("light_fade_factor", self.light_fade_factor),
        ] {
            ensure!(
                value.is_finite() && value >= 0.0,
                "{} must be finite and >= 0, got {}",
                name,
                value
            );
        }
        Ok(())
    }

    /// Vrai si `elapsed_ms` a atteint la fraction `fraction` de la durée de vol.
    #[inline]
    pub fn flight_fraction_reached(&self, elapsed_ms: Timestamp, fraction: f32) -> bool {
        elapsed_ms as f64 >= self.flight_duration_ms as f64 * fraction as f64
    }
}

/// Configuration du spectacle : cadence de tir, origine et physique de la scène.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ShowConfig {
    pub gravity: f32,

    pub timer_enabled: bool,
    pub spawn_interval_ms: Timestamp,
    pub spawn_interval_variation_ms: Timestamp,
    /// Nombre max de tirs rattrapés en un seul tick (après un gel de l'horloge)
    pub max_timer_catch_up: usize,

    /// Bornes (entières) de l'abscisse de tir du timer
    pub spawn_origin_x_min: i32,
    pub spawn_origin_x_max: i32,
    pub spawn_origin_z: f32,
    pub spawn_direction: [f32; 3],
    pub scene_scale: f32,

    /// Composante verticale ajoutée au rayon d'un double-tap
    pub double_tap_lift: f32,

    /// Retire du `Fleet` les fusées arrivées dans CLEANED_UP
    pub evict_cleaned_up: bool,

    pub metrics_interval_ms: Timestamp,
    pub seed: Option<u64>,

    pub rocket: RocketConfig,
}

impl Default for ShowConfig {
    fn default() -> Self {
        Self {
            gravity: -3.0,
            timer_enabled: true,
            spawn_interval_ms: 3000,
            spawn_interval_variation_ms: 0,
            max_timer_catch_up: 4,
            spawn_origin_x_min: -5,
            spawn_origin_x_max: 5,
            spawn_origin_z: 3.0,
            spawn_direction: [0.0, 1.0, 0.0],
            scene_scale: 1.0,
            double_tap_lift: 0.3,
            evict_cleaned_up: true,
            metrics_interval_ms: 1000,
            seed: None,
            rocket: RocketConfig::default(),
        }
    }
}

impl ShowConfig {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(self.spawn_interval_ms > 0, "spawn_interval_ms must be > 0");
        ensure!(self.scene_scale > 0.0, "scene_scale must be > 0");
        self.rocket.validate()
    }

    pub fn spawn_direction(&self) -> Vec3 {
        Vec3::from_array(self.spawn_direction)
    }

    /// Intervalle `[min, max)` de l'abscisse de tir, bornes remises dans l'ordre.
    pub fn spawn_origin_x_range(&self) -> (i32, i32) {
        [self.spawn_origin_x_min, self.spawn_origin_x_max]
            .iter()
            .copied()
            .minmax()
            .into_option()
            .unwrap_or((0, 0))
    }
}
