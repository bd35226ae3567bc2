use glam::{Affine3A, EulerRot, Quat, Vec3};
use log::{debug, warn};
use rand::Rng;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::firework_engine::{
    config::RocketConfig,
    explosion_cloud::{light_intensity, ExplosionCloud},
    explosion_template::ExplosionTemplate,
    rocket_state::RocketState,
    types::{Color, Timestamp},
};
use crate::scene_engine::{
    types::{
        BodyDesc, BodyHandle, DistanceModel, EmitterHandle, EmitterSettings, LightDesc,
        LightHandle, MeshHandle, SoundCue, SoundRequestBuilder,
    },
    SceneBackend,
};

/// Compteur global pour générer des ID uniques pour les rockets
pub static ROCKET_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Régime de la traînée pendant le vol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrailPhase {
    Emitting,
    Slowed,
    Stopped,
}

#[derive(Debug)]
struct Trail {
    emitter: EmitterHandle,
    phase: TrailPhase,
}

/// Ce qui s'est passé pendant un `update`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RocketUpdate {
    pub launched: bool,
    pub explosion_started: bool,
    pub cleaned_up: bool,
}

/// Représentation d’une fusée : machine à états + handles vers ses
/// ressources dans la scène.
///
/// Les ressources de vol (traînée, physique) sont rendues dès le début de
/// l'explosion ; le nuage d'explosion n'existe qu'entre EXPLODE_START et la
/// sortie d'EXPLODING ; le corps et sa lumière sont libérés à EXPLODED.
#[derive(Debug)]
pub struct Rocket {
    /// ID unique de la rocket
    id: u64,
    state: RocketState,

    launch_direction: Vec3,
    color: Color,

    start_flight_time: Option<Timestamp>,
    start_explosion_time: Option<Timestamp>,

    body: Option<BodyHandle>,
    light: Option<LightHandle>,
    trail: Option<Trail>,
    explosion: Option<ExplosionCloud>,

    /// Consommé au moment de l'explosion
    explosion_template: Option<Rc<ExplosionTemplate>>,
    shadow_casters: Rc<[MeshHandle]>,
}

impl Rocket {
    /// Crée une fusée dans l'état CREATED : corps, lumière et traînée (non
    /// démarrée) sont demandés à la scène, la couleur est tirée au hasard.
    pub fn new(
        scene: &mut impl SceneBackend,
        config: &RocketConfig,
        rng: &mut impl Rng,
        launch_direction: Vec3,
        origin: Vec3,
        shadow_casters: Rc<[MeshHandle]>,
        explosion_template: Rc<ExplosionTemplate>,
    ) -> Self {
        let color = Color::new(rng.random(), rng.random(), rng.random());

        let body = scene.create_body(&BodyDesc {
            position: origin,
            diameter: config.rocket_diameter,
            mass: config.rocket_mass,
            restitution: config.rocket_restitution,
            color,
        });
        let light = scene.create_light(
            body,
            &LightDesc {
                color,
                intensity: config.light_flight_intensity,
                offset: Vec3::new(0.0, config.light_offset_y, 0.0),
                shadow_map_size: config.shadow_map_size,
            },
            &shadow_casters,
        );
        let emitter = scene.create_emitter(
            body,
            &EmitterSettings {
                capacity: config.trail_capacity,
                emit_rate: config.trail_emit_rate,
                life_time: config.trail_min_life..config.trail_max_life,
                color,
            },
        );

        Self {
            id: ROCKET_ID_COUNTER.fetch_add(1, Ordering::Relaxed),
            state: RocketState::Created,
            launch_direction,
            color,
            start_flight_time: None,
            start_explosion_time: None,
            body: Some(body),
            light: Some(light),
            trail: Some(Trail {
                emitter,
                phase: TrailPhase::Emitting,
            }),
            explosion: None,
            explosion_template: Some(explosion_template),
            shadow_casters,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn current_state(&self) -> RocketState {
        self.state
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn launch_direction(&self) -> Vec3 {
        self.launch_direction
    }

    pub fn start_flight_time(&self) -> Option<Timestamp> {
        self.start_flight_time
    }

    pub fn start_explosion_time(&self) -> Option<Timestamp> {
        self.start_explosion_time
    }

    pub fn body(&self) -> Option<BodyHandle> {
        self.body
    }

    pub fn light(&self) -> Option<LightHandle> {
        self.light
    }

    pub fn trail_phase(&self) -> Option<TrailPhase> {
        self.trail.as_ref().map(|t| t.phase)
    }

    pub fn explosion(&self) -> Option<&ExplosionCloud> {
        self.explosion.as_ref()
    }

    pub fn shadow_casters(&self) -> &[MeshHandle] {
        &self.shadow_casters
    }

    /// Vrai tant que la fusée détient au moins une ressource de la scène.
    pub fn holds_resources(&self) -> bool {
        self.body.is_some()
            || self.light.is_some()
            || self.trail.is_some()
            || self.explosion.is_some()
    }

    /// Fait avancer la machine à états jusqu'à `now`.
    ///
    /// Les transitions immédiates (FIRED → EXPLODE_START → EXPLODING,
    /// EXPLODING → EXPLODED → CLEANED_UP) s'enchaînent dans le même appel.
    /// Sans effet sur une fusée CLEANED_UP.
    pub fn update(
        &mut self,
        now: Timestamp,
        scene: &mut impl SceneBackend,
        config: &RocketConfig,
        rng: &mut impl Rng,
    ) -> RocketUpdate {
        let mut outcome = RocketUpdate::default();
        loop {
            let before = self.state;
            match self.state {
                RocketState::Created => {
                    self.launch(now, scene, config);
                    outcome.launched = true;
                    self.advance_to(RocketState::Fired);
                }
                RocketState::Fired => {
                    if self.update_flight(now, scene, config) {
                        self.advance_to(RocketState::ExplodeStart);
                    }
                }
                RocketState::ExplodeStart => {
                    self.start_explosion(now, scene, config, rng);
                    outcome.explosion_started = true;
                    self.advance_to(RocketState::Exploding);
                }
                RocketState::Exploding => {
                    if self.update_explosion(now, scene, config, rng) {
                        self.advance_to(RocketState::Exploded);
                    }
                }
                RocketState::Exploded => {
                    self.clean_up(scene);
                    outcome.cleaned_up = true;
                    self.advance_to(RocketState::CleanedUp);
                }
                RocketState::CleanedUp => {}
            }

            let chained = before != self.state
                && matches!(
                    self.state,
                    RocketState::ExplodeStart | RocketState::Exploding | RocketState::Exploded
                );
            if !chained {
                break;
            }
        }
        outcome
    }

    fn advance_to(&mut self, next: RocketState) {
        debug_assert_eq!(
            self.state.next(),
            Some(next),
            "rocket {}: illegal transition {} -> {}",
            self.id,
            self.state,
            next
        );
        debug!("🚀 Rocket {}: {} -> {}", self.id, self.state, next);
        self.state = next;
    }

    /// CREATED : vitesse initiale, traînée, sifflement.
    fn launch(&mut self, now: Timestamp, scene: &mut impl SceneBackend, config: &RocketConfig) {
        debug_assert!(self.start_flight_time.is_none());
        self.start_flight_time = Some(now);

        let Some(body) = self.body else {
            return;
        };
        let velocity = self.launch_direction.normalize_or_zero() * config.rocket_speed;
        scene.set_linear_velocity(body, velocity);
        if let Some(trail) = &self.trail {
            scene.start_emitter(trail.emitter);
        }
        play(
            scene,
            SoundRequestBuilder::default()
                .cue(SoundCue::Whistle)
                .attached_to(Some(body))
                .distance_model(DistanceModel::Linear)
                .max_distance(config.whistle_max_distance)
                .rolloff_factor(config.whistle_rolloff),
        );
    }

    /// FIRED : ralentit puis coupe la traînée ; vrai quand le vol est terminé.
    fn update_flight(
        &mut self,
        now: Timestamp,
        scene: &mut impl SceneBackend,
        config: &RocketConfig,
    ) -> bool {
        let Some(start) = self.start_flight_time else {
            return false;
        };
        let elapsed = now.saturating_sub(start);

        if elapsed >= config.flight_duration_ms {
            if let Some(trail) = self.trail.take() {
                scene.dispose_emitter(trail.emitter);
            }
            return true;
        }

        if let Some(trail) = self.trail.as_mut() {
            if config.flight_fraction_reached(elapsed, config.trail_cutoff_fraction) {
                if trail.phase != TrailPhase::Stopped {
                    scene.stop_emitter(trail.emitter);
                    trail.phase = TrailPhase::Stopped;
                }
            } else if config.flight_fraction_reached(elapsed, config.trail_slow_fraction)
                && trail.phase == TrailPhase::Emitting
            {
                scene.set_emitter_rate(
                    trail.emitter,
                    config.trail_slow_emit_rate,
                    config.trail_slow_min_life..config.trail_slow_max_life,
                );
                trail.phase = TrailPhase::Slowed;
            }
        }
        false
    }

    /// EXPLODE_START : fin de la physique, construction du nuage, sons.
    fn start_explosion(
        &mut self,
        now: Timestamp,
        scene: &mut impl SceneBackend,
        config: &RocketConfig,
        rng: &mut impl Rng,
    ) {
        debug_assert!(self.start_explosion_time.is_none());
        self.start_explosion_time = Some(now);

        let Some(body) = self.body else {
            return;
        };
        let center = scene.body_position(body);
        scene.release_physics(body);
        scene.set_body_visible(body, false);
        if let Some(light) = self.light {
            scene.set_light_intensity(light, 1.0);
        }

        if let Some(template) = self.explosion_template.take() {
            let tilt = Quat::from_euler(
                EulerRot::XYZ,
                rng.random_range(-config.template_tilt_x..=config.template_tilt_x),
                rng.random_range(-config.template_tilt_y..=config.template_tilt_y),
                rng.random_range(-config.template_tilt_z..=config.template_tilt_z),
            );
            let (handle, surface) = scene.build_point_cloud(
                &template,
                Affine3A::from_rotation_translation(tilt, center),
                config.particles_per_explosion,
                self.color,
                config.explosion_point_size,
            );
            debug!(
                "🎆 Rocket {} explodes at ({:.2}, {:.2}, {:.2}) as '{}' ({} points)",
                self.id,
                center.x,
                center.y,
                center.z,
                template.name(),
                surface.len()
            );
            self.explosion = Some(ExplosionCloud::new(handle, center, self.color, surface));
        }

        play(
            scene,
            SoundRequestBuilder::default()
                .cue(SoundCue::Pop)
                .attached_to(Some(body))
                .distance_model(DistanceModel::Linear)
                .max_distance(config.pop_max_distance)
                .rolloff_factor(config.pop_rolloff),
        );
        play(scene, SoundRequestBuilder::default().cue(SoundCue::Crackle));
    }

    /// EXPLODING : anime le nuage et la lumière ; vrai une fois la période dépassée.
    fn update_explosion(
        &mut self,
        now: Timestamp,
        scene: &mut impl SceneBackend,
        config: &RocketConfig,
        rng: &mut impl Rng,
    ) -> bool {
        let Some(start) = self.start_explosion_time else {
            return true;
        };
        let elapsed = now.saturating_sub(start);

        if elapsed > config.explosion_period_ms {
            if let Some(cloud) = self.explosion.take() {
                scene.dispose_point_cloud(cloud.handle());
            }
            return true;
        }

        if let Some(cloud) = self.explosion.as_mut() {
            let handle = cloud.handle();
            let points = cloud.update(elapsed, config, rng);
            scene.update_point_cloud(handle, points);
        }
        if let Some(light) = self.light {
            scene.set_light_intensity(
                light,
                light_intensity(elapsed, config.explosion_period_ms, config.light_fade_factor),
            );
        }
        false
    }

    /// EXPLODED : libère la lumière et le corps.
    fn clean_up(&mut self, scene: &mut impl SceneBackend) {
        if let Some(light) = self.light.take() {
            scene.dispose_light(light);
        }
        if let Some(body) = self.body.take() {
            scene.dispose_body(body);
        }
    }
}

fn play(scene: &mut impl SceneBackend, request: SoundRequestBuilder) {
    match request.build() {
        Ok(request) => scene.play_one_shot(&request),
        Err(e) => warn!("🔇 Invalid sound request: {}", e),
    }
}
