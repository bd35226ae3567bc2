use derive_builder::Builder;
use glam::Vec3;
use std::ops::Range;

use crate::firework_engine::types::Color;

// ------------------------
// Handles opaques
// ------------------------
// Le cœur ne possède jamais les ressources de la scène : il ne garde que des
// identifiants, la scène reste propriétaire des objets réels.

/// Corps visuel + physique d'une fusée (sphère + imposteur physique).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyHandle(pub u64);

/// Émetteur de particules de traînée.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EmitterHandle(pub u64);

/// Lumière ponctuelle (avec son générateur d'ombres).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LightHandle(pub u64);

/// Nuage de points d'explosion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CloudHandle(pub u64);

/// Maillage de la scène (sol, textes 3D...) sur lequel on projette des ombres.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHandle(pub u64);

// ------------------------
// Requêtes
// ------------------------

/// Description du corps créé pour une fusée.
#[derive(Debug, Clone, Copy)]
pub struct BodyDesc {
    pub position: Vec3,
    pub diameter: f32,
    pub mass: f32,
    pub restitution: f32,
    pub color: Color,
}

/// Paramètres d'émission d'une traînée.
#[derive(Debug, Clone, PartialEq)]
pub struct EmitterSettings {
    /// Nombre max de particules vivantes
    pub capacity: usize,
    /// Particules émises par seconde
    pub emit_rate: f32,
    /// Durée de vie des particules (secondes)
    pub life_time: Range<f32>,
    pub color: Color,
}

/// Lumière attachée sous le corps de la fusée.
#[derive(Debug, Clone, Copy)]
pub struct LightDesc {
    pub color: Color,
    pub intensity: f32,
    /// Décalage par rapport au corps parent
    pub offset: Vec3,
    pub shadow_map_size: u32,
}

/// Sons joués par une fusée.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundCue {
    Whistle,
    Pop,
    Crackle,
}

/// Modèle d'atténuation des sons spatialisés.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceModel {
    #[default]
    Linear,
    Inverse,
    Exponential,
}

/// Requête de lecture d'un son « one-shot ».
///
/// Construite exclusivement via `SoundRequestBuilder` :
/// un son sans `attached_to` est non spatialisé.
#[derive(Clone, Builder, Debug, PartialEq)]
#[builder(pattern = "owned", build_fn(error = "anyhow::Error"))]
pub struct SoundRequest {
    pub cue: SoundCue,

    /// Corps auquel le son est attaché (spatialisation)
    #[builder(default)]
    pub attached_to: Option<BodyHandle>,

    #[builder(default)]
    pub distance_model: DistanceModel,

    #[builder(default = "1000.0")]
    pub max_distance: f32,

    #[builder(default = "1.0")]
    pub rolloff_factor: f32,
}

impl SoundRequest {
    pub fn is_spatial(&self) -> bool {
        self.attached_to.is_some()
    }
}

/// Rayon d'entrée utilisateur (pointeur, manette VR).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }
}
