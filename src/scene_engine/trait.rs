use glam::{Affine3A, Vec3};
use std::ops::Range;

use crate::firework_engine::explosion_cloud::CloudPoint;
use crate::firework_engine::explosion_template::ExplosionTemplate;
use crate::firework_engine::types::{Color, Timestamp};
use crate::scene_engine::types::{
    BodyDesc, BodyHandle, CloudHandle, EmitterHandle, EmitterSettings, LightDesc, LightHandle,
    MeshHandle, SoundRequest,
};

/// 🔧 Trait `PhysicsBackend`
///
/// Moteur physique externe : le cœur ne fait qu'émettre des requêtes,
/// l'intégration des corps rigides reste chez le collaborateur.
pub trait PhysicsBackend {
    /// Crée un corps (maillage + imposteur physique) et retourne son handle.
    fn create_body(&mut self, desc: &BodyDesc) -> BodyHandle;

    fn set_linear_velocity(&mut self, body: BodyHandle, velocity: Vec3);

    fn body_position(&self, body: BodyHandle) -> Vec3;

    /// Retire l'imposteur physique : le corps n'est plus intégré,
    /// mais son maillage reste dans la scène jusqu'à `dispose_body`.
    fn release_physics(&mut self, body: BodyHandle);

    fn dispose_body(&mut self, body: BodyHandle);

    /// Avance la simulation physique jusqu'à `now`. Par défaut, ne fait rien.
    fn step_simulation(&mut self, _now: Timestamp) {}
}

/// 🔊 Trait `AudioBackend`
pub trait AudioBackend {
    /// Joue un son unique, spatialisé s'il est attaché à un corps.
    fn play_one_shot(&mut self, request: &SoundRequest);
}

/// 🎆 Trait `VisualBackend`
///
/// Émetteurs de particules, lumières et nuages de points.
pub trait VisualBackend {
    fn create_emitter(&mut self, body: BodyHandle, settings: &EmitterSettings) -> EmitterHandle;
    fn start_emitter(&mut self, emitter: EmitterHandle);
    fn stop_emitter(&mut self, emitter: EmitterHandle);
    /// Change le débit et la durée de vie des prochaines particules.
    fn set_emitter_rate(&mut self, emitter: EmitterHandle, emit_rate: f32, life_time: Range<f32>);
    fn dispose_emitter(&mut self, emitter: EmitterHandle);

    /// Crée une lumière ponctuelle attachée à `body`, qui projette des ombres
    /// sur `shadow_casters`.
    fn create_light(
        &mut self,
        body: BodyHandle,
        desc: &LightDesc,
        shadow_casters: &[MeshHandle],
    ) -> LightHandle;
    fn set_light_intensity(&mut self, light: LightHandle, intensity: f32);
    fn dispose_light(&mut self, light: LightHandle);

    fn set_body_visible(&mut self, body: BodyHandle, visible: bool);

    /// Construit un nuage de `count` points répartis sur la surface de
    /// `template` (placé par `placement`), teintés de `color`.
    ///
    /// Retourne le handle du nuage et les positions monde initiales des points.
    fn build_point_cloud(
        &mut self,
        template: &ExplosionTemplate,
        placement: Affine3A,
        count: usize,
        color: Color,
        point_size: f32,
    ) -> (CloudHandle, Vec<Vec3>);

    /// Pousse les positions/couleurs courantes des points du nuage.
    fn update_point_cloud(&mut self, cloud: CloudHandle, points: &[CloudPoint]);

    fn dispose_point_cloud(&mut self, cloud: CloudHandle);
}

/// Tous les collaborateurs de scène réunis.
pub trait SceneBackend: PhysicsBackend + AudioBackend + VisualBackend {}

impl<T: PhysicsBackend + AudioBackend + VisualBackend> SceneBackend for T {}
