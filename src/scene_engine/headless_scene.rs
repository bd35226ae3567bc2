//! Scène en mémoire, sans rendu ni audio.
//!
//! Implémente tous les collaborateurs de scène : intégration balistique
//! simple des corps, comptabilité des ressources, journal optionnel des
//! requêtes reçues. Utilisée par le binaire, les tests et les benchmarks.
//!
//! Toute requête sur un handle inconnu ou déjà libéré est une violation de
//! contrat : elle provoque un panic explicite.

use glam::{Affine3A, Vec3};
use log::debug;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;
use std::ops::Range;

use crate::firework_engine::explosion_cloud::CloudPoint;
use crate::firework_engine::explosion_template::ExplosionTemplate;
use crate::firework_engine::types::{Color, Timestamp, SECOND_MS};
use crate::scene_engine::r#trait::{AudioBackend, PhysicsBackend, VisualBackend};
use crate::scene_engine::types::{
    BodyDesc, BodyHandle, CloudHandle, EmitterHandle, EmitterSettings, LightDesc, LightHandle,
    MeshHandle, SoundCue, SoundRequest,
};

/// Requête reçue par la scène (journal).
#[derive(Debug, Clone, PartialEq)]
pub enum SceneCommand {
    CreateBody(BodyHandle),
    SetLinearVelocity(BodyHandle, Vec3),
    ReleasePhysics(BodyHandle),
    SetBodyVisible(BodyHandle, bool),
    DisposeBody(BodyHandle),
    CreateEmitter(EmitterHandle),
    StartEmitter(EmitterHandle),
    StopEmitter(EmitterHandle),
    SetEmitterRate(EmitterHandle, f32, Range<f32>),
    DisposeEmitter(EmitterHandle),
    CreateLight(LightHandle, usize),
    SetLightIntensity(LightHandle, f32),
    DisposeLight(LightHandle),
    PlaySound(SoundRequest),
    BuildPointCloud(CloudHandle, usize),
    UpdatePointCloud(CloudHandle, usize),
    DisposePointCloud(CloudHandle),
}

#[derive(Debug, Clone)]
struct BodyState {
    position: Vec3,
    velocity: Vec3,
    restitution: f32,
    physics: bool,
    visible: bool,
}

#[derive(Debug, Clone)]
struct EmitterState {
    settings: EmitterSettings,
    running: bool,
}

/// Compteurs de ressources vivantes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SceneStats {
    pub bodies: usize,
    pub physics_bodies: usize,
    pub emitters: usize,
    pub running_emitters: usize,
    pub lights: usize,
    pub clouds: usize,
    pub sounds_played: usize,
    pub uploaded_bytes: usize,
}

impl SceneStats {
    /// Vrai si aucune ressource n'est encore allouée.
    pub fn is_empty(&self) -> bool {
        self.bodies == 0 && self.emitters == 0 && self.lights == 0 && self.clouds == 0
    }
}

#[derive(Debug)]
pub struct HeadlessScene {
    gravity: Vec3,
    next_handle: u64,
    last_step: Option<Timestamp>,

    bodies: HashMap<u64, BodyState>,
    emitters: HashMap<u64, EmitterState>,
    lights: HashMap<u64, f32>,
    clouds: HashMap<u64, usize>,
    static_meshes: Vec<(MeshHandle, String)>,

    sounds_played: usize,
    uploaded_bytes: usize,

    recording: bool,
    commands: Vec<SceneCommand>,

    /// Tirage des points de surface des nuages
    rng: StdRng,
}

impl HeadlessScene {
    pub fn new(gravity: f32) -> Self {
        Self::with_rng(gravity, StdRng::from_os_rng())
    }

    pub fn with_seed(gravity: f32, seed: u64) -> Self {
        Self::with_rng(gravity, StdRng::seed_from_u64(seed))
    }

    fn with_rng(gravity: f32, rng: StdRng) -> Self {
        Self {
            gravity: Vec3::new(0.0, gravity, 0.0),
            next_handle: 1,
            last_step: None,
            bodies: HashMap::new(),
            emitters: HashMap::new(),
            lights: HashMap::new(),
            clouds: HashMap::new(),
            static_meshes: Vec::new(),
            sounds_played: 0,
            uploaded_bytes: 0,
            recording: false,
            commands: Vec::new(),
            rng,
        }
    }

    /// Active le journal des requêtes.
    pub fn recording(mut self) -> Self {
        self.recording = true;
        self
    }

    /// Enregistre un maillage statique (sol, texte...) et retourne son handle.
    pub fn add_static_mesh(&mut self, name: &str) -> MeshHandle {
        let handle = MeshHandle(self.allocate_handle());
        self.static_meshes.push((handle, name.to_string()));
        handle
    }

    pub fn static_meshes(&self) -> impl Iterator<Item = (MeshHandle, &str)> {
        self.static_meshes.iter().map(|(h, n)| (*h, n.as_str()))
    }

    pub fn commands(&self) -> &[SceneCommand] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<SceneCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn stats(&self) -> SceneStats {
        SceneStats {
            bodies: self.bodies.len(),
            physics_bodies: self.bodies.values().filter(|b| b.physics).count(),
            emitters: self.emitters.len(),
            running_emitters: self.emitters.values().filter(|e| e.running).count(),
            lights: self.lights.len(),
            clouds: self.clouds.len(),
            sounds_played: self.sounds_played,
            uploaded_bytes: self.uploaded_bytes,
        }
    }

    pub fn light_intensity(&self, light: LightHandle) -> Option<f32> {
        self.lights.get(&light.0).copied()
    }

    pub fn is_body_visible(&self, body: BodyHandle) -> Option<bool> {
        self.bodies.get(&body.0).map(|b| b.visible)
    }

    pub fn body_velocity(&self, body: BodyHandle) -> Option<Vec3> {
        self.bodies.get(&body.0).map(|b| b.velocity)
    }

    pub fn emitter_settings(&self, emitter: EmitterHandle) -> Option<&EmitterSettings> {
        self.emitters.get(&emitter.0).map(|e| &e.settings)
    }

    pub fn sounds(&self, cue: SoundCue) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, SceneCommand::PlaySound(r) if r.cue == cue))
            .count()
    }

    fn allocate_handle(&mut self) -> u64 {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }

    fn record(&mut self, command: SceneCommand) {
        if self.recording {
            self.commands.push(command);
        }
    }

    fn body_mut(&mut self, body: BodyHandle) -> &mut BodyState {
        self.bodies
            .get_mut(&body.0)
            .unwrap_or_else(|| panic!("unknown or disposed body {:?}", body))
    }

    fn emitter_mut(&mut self, emitter: EmitterHandle) -> &mut EmitterState {
        self.emitters
            .get_mut(&emitter.0)
            .unwrap_or_else(|| panic!("unknown or disposed emitter {:?}", emitter))
    }

    fn light_mut(&mut self, light: LightHandle) -> &mut f32 {
        self.lights
            .get_mut(&light.0)
            .unwrap_or_else(|| panic!("unknown or disposed light {:?}", light))
    }
}

impl PhysicsBackend for HeadlessScene {
    fn create_body(&mut self, desc: &BodyDesc) -> BodyHandle {
        let handle = BodyHandle(self.allocate_handle());
        self.bodies.insert(
            handle.0,
            BodyState {
                position: desc.position,
                velocity: Vec3::ZERO,
                restitution: desc.restitution,
                physics: true,
                visible: true,
            },
        );
        self.record(SceneCommand::CreateBody(handle));
        handle
    }

    fn set_linear_velocity(&mut self, body: BodyHandle, velocity: Vec3) {
        let state = self.body_mut(body);
        assert!(state.physics, "{:?} has no physics anymore", body);
        state.velocity = velocity;
        self.record(SceneCommand::SetLinearVelocity(body, velocity));
    }

    fn body_position(&self, body: BodyHandle) -> Vec3 {
        self.bodies
            .get(&body.0)
            .map(|b| b.position)
            .unwrap_or_else(|| panic!("unknown or disposed body {:?}", body))
    }

    fn release_physics(&mut self, body: BodyHandle) {
        let state = self.body_mut(body);
        assert!(state.physics, "physics of {:?} released twice", body);
        state.physics = false;
        state.velocity = Vec3::ZERO;
        self.record(SceneCommand::ReleasePhysics(body));
    }

    fn dispose_body(&mut self, body: BodyHandle) {
        assert!(
            self.bodies.remove(&body.0).is_some(),
            "body {:?} disposed twice",
            body
        );
        self.record(SceneCommand::DisposeBody(body));
    }

    /// Intégration d'Euler semi-implicite, rebond sur le sol (y = 0).
    fn step_simulation(&mut self, now: Timestamp) {
        let dt = match self.last_step {
            Some(last) => now.saturating_sub(last) as f32 / SECOND_MS,
            None => 0.0,
        };
        self.last_step = Some(now);
        if dt <= 0.0 {
            return;
        }

        let gravity = self.gravity;
        for body in self.bodies.values_mut().filter(|b| b.physics) {
            body.velocity += gravity * dt;
            body.position += body.velocity * dt;
            if body.position.y < 0.0 && body.velocity.y < 0.0 {
                body.position.y = 0.0;
                body.velocity.y = -body.velocity.y * body.restitution;
            }
        }
    }
}

impl AudioBackend for HeadlessScene {
    fn play_one_shot(&mut self, request: &SoundRequest) {
        if let Some(body) = request.attached_to {
            assert!(
                self.bodies.contains_key(&body.0),
                "sound attached to unknown body {:?}",
                body
            );
        }
        self.sounds_played += 1;
        self.record(SceneCommand::PlaySound(request.clone()));
    }
}

impl VisualBackend for HeadlessScene {
    fn create_emitter(&mut self, body: BodyHandle, settings: &EmitterSettings) -> EmitterHandle {
        assert!(
            self.bodies.contains_key(&body.0),
            "emitter on unknown body {:?}",
            body
        );
        let handle = EmitterHandle(self.allocate_handle());
        self.emitters.insert(
            handle.0,
            EmitterState {
                settings: settings.clone(),
                running: false,
            },
        );
        self.record(SceneCommand::CreateEmitter(handle));
        handle
    }

    fn start_emitter(&mut self, emitter: EmitterHandle) {
        self.emitter_mut(emitter).running = true;
        self.record(SceneCommand::StartEmitter(emitter));
    }

    fn stop_emitter(&mut self, emitter: EmitterHandle) {
        self.emitter_mut(emitter).running = false;
        self.record(SceneCommand::StopEmitter(emitter));
    }

    fn set_emitter_rate(&mut self, emitter: EmitterHandle, emit_rate: f32, life_time: Range<f32>) {
        let state = self.emitter_mut(emitter);
        state.settings.emit_rate = emit_rate;
        state.settings.life_time = life_time.clone();
        self.record(SceneCommand::SetEmitterRate(emitter, emit_rate, life_time));
    }

    fn dispose_emitter(&mut self, emitter: EmitterHandle) {
        assert!(
            self.emitters.remove(&emitter.0).is_some(),
            "emitter {:?} disposed twice",
            emitter
        );
        self.record(SceneCommand::DisposeEmitter(emitter));
    }

    fn create_light(
        &mut self,
        body: BodyHandle,
        desc: &LightDesc,
        shadow_casters: &[MeshHandle],
    ) -> LightHandle {
        assert!(
            self.bodies.contains_key(&body.0),
            "light on unknown body {:?}",
            body
        );
        let handle = LightHandle(self.allocate_handle());
        self.lights.insert(handle.0, desc.intensity);
        self.record(SceneCommand::CreateLight(handle, shadow_casters.len()));
        handle
    }

    fn set_light_intensity(&mut self, light: LightHandle, intensity: f32) {
        *self.light_mut(light) = intensity;
        self.record(SceneCommand::SetLightIntensity(light, intensity));
    }

    fn dispose_light(&mut self, light: LightHandle) {
        assert!(
            self.lights.remove(&light.0).is_some(),
            "light {:?} disposed twice",
            light
        );
        self.record(SceneCommand::DisposeLight(light));
    }

    fn set_body_visible(&mut self, body: BodyHandle, visible: bool) {
        self.body_mut(body).visible = visible;
        self.record(SceneCommand::SetBodyVisible(body, visible));
    }

    fn build_point_cloud(
        &mut self,
        template: &ExplosionTemplate,
        placement: Affine3A,
        count: usize,
        _color: Color,
        _point_size: f32,
    ) -> (CloudHandle, Vec<Vec3>) {
        let handle = CloudHandle(self.allocate_handle());
        let positions = template.sample_surface(count, placement, &mut self.rng);
        self.clouds.insert(handle.0, positions.len());
        debug!(
            "Point cloud {:?} built from '{}' ({} points)",
            handle,
            template.name(),
            positions.len()
        );
        self.record(SceneCommand::BuildPointCloud(handle, positions.len()));
        (handle, positions)
    }

    fn update_point_cloud(&mut self, cloud: CloudHandle, points: &[CloudPoint]) {
        let expected = *self
            .clouds
            .get(&cloud.0)
            .unwrap_or_else(|| panic!("unknown or disposed cloud {:?}", cloud));
        assert_eq!(
            expected,
            points.len(),
            "cloud {:?}: point count changed",
            cloud
        );
        self.uploaded_bytes += bytemuck::cast_slice::<CloudPoint, u8>(points).len();
        self.record(SceneCommand::UpdatePointCloud(cloud, points.len()));
    }

    fn dispose_point_cloud(&mut self, cloud: CloudHandle) {
        assert!(
            self.clouds.remove(&cloud.0).is_some(),
            "cloud {:?} disposed twice",
            cloud
        );
        self.record(SceneCommand::DisposePointCloud(cloud));
    }
}
