use generational_arena::{Arena, Index};
use glam::Vec3;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::rc::Rc;

use crate::firework_engine::{
    config::ShowConfig,
    explosion_template::{AssetBundle, ExplosionTemplate},
    rocket::Rocket,
    rocket_state::RocketState,
    spawn_policy::{timer_launch, InputEvent, Launch, SpawnTimer},
    types::{TickReport, Timestamp},
};
use crate::scene_engine::SceneBackend;

/// Identifiant stable d'une fusée dans le `Fleet`.
pub type RocketId = Index;

/// Contrôleur de flotte : possède les fusées, les met à jour à chaque tick et
/// gère les tirs (timer + entrées utilisateur).
#[derive(Debug)]
pub struct Fleet {
    rockets: Arena<Rocket>, // Slots pour toutes les fusées
    order: Vec<RocketId>,   // Ordre d'insertion
    config: ShowConfig,
    assets: AssetBundle,
    spawn_timer: SpawnTimer,
    rng: StdRng,
    total_spawned: u64,
}

impl Fleet {
    /// Crée le contrôleur. Échoue si la configuration est invalide ou si le
    /// paquet d'assets ne contient aucun modèle d'explosion.
    pub fn new(config: ShowConfig, assets: AssetBundle) -> anyhow::Result<Self> {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self::with_rng(config, assets, rng)
    }

    pub fn with_rng(config: ShowConfig, assets: AssetBundle, rng: StdRng) -> anyhow::Result<Self> {
        config.validate()?;
        anyhow::ensure!(
            assets.is_ready(),
            "asset bundle has no explosion template, rockets cannot be fired"
        );

        info!(
            "Fleet ready: templates [{}], {} shadow casters, timer every {} ms",
            assets.template_names().collect::<Vec<_>>().join(", "),
            assets.shadow_casters().len(),
            config.spawn_interval_ms
        );

        Ok(Self {
            rockets: Arena::new(),
            order: Vec::new(),
            spawn_timer: SpawnTimer::from_config(&config),
            config,
            assets,
            rng,
            total_spawned: 0,
        })
    }

    /// Crée une fusée (état CREATED) et l'ajoute en fin de flotte.
    ///
    /// Le modèle d'explosion doit être prêt : c'est garanti pour les modèles
    /// issus de l'`AssetBundle`.
    pub fn fire_rocket(
        &mut self,
        scene: &mut impl SceneBackend,
        direction: Vec3,
        origin: Vec3,
        explosion_template: Rc<ExplosionTemplate>,
    ) -> RocketId {
        let rocket = Rocket::new(
            scene,
            &self.config.rocket,
            &mut self.rng,
            direction,
            origin,
            self.assets.shadow_casters(),
            explosion_template,
        );
        debug!(
            "🚀 Rocket {} spawned at ({:.2}, {:.2}, {:.2})",
            rocket.id(),
            origin.x,
            origin.y,
            origin.z
        );
        let id = self.rockets.insert(rocket);
        self.order.push(id);
        self.total_spawned += 1;
        id
    }

    /// Tire une fusée avec un modèle choisi selon les poids du paquet d'assets.
    pub fn fire(&mut self, scene: &mut impl SceneBackend, launch: Launch) -> Option<RocketId> {
        let template = self.assets.sample_template(&mut self.rng)?;
        Some(self.fire_rocket(scene, launch.direction, launch.origin, template))
    }

    /// Tir déclenché par l'utilisateur (double-tap, relâchement de gâchette VR).
    pub fn handle_input(
        &mut self,
        scene: &mut impl SceneBackend,
        event: &InputEvent,
    ) -> Option<RocketId> {
        let launch = event.launch(self.config.double_tap_lift)?;
        self.fire(scene, launch)
    }

    /// Un tick : tirs dus au timer, puis `update(now)` sur chaque fusée non
    /// terminée, dans l'ordre d'insertion, avec le même `now` pour toutes.
    pub fn tick(&mut self, now: Timestamp, scene: &mut impl SceneBackend) -> TickReport {
        let mut report = TickReport::default();

        if self.config.timer_enabled {
            let due = self.spawn_timer.poll(now, &mut self.rng);
            for _ in 0..due {
                let launch = timer_launch(&self.config, &mut self.rng);
                if self.fire(scene, launch).is_some() {
                    report.spawned += 1;
                }
            }
        }

        for &id in &self.order {
            let Some(rocket) = self.rockets.get_mut(id) else {
                continue;
            };
            if rocket.current_state().is_terminal() {
                continue;
            }
            let outcome = rocket.update(now, scene, &self.config.rocket, &mut self.rng);
            report.updated += 1;
            report.launched += outcome.launched as usize;
            report.explosions_started += outcome.explosion_started as usize;
            report.cleaned_up += outcome.cleaned_up as usize;
        }

        if self.config.evict_cleaned_up && report.cleaned_up > 0 {
            self.evict_cleaned_up();
        }

        report.live = self.live_count();
        report
    }

    /// Retire les fusées terminées en conservant l'ordre des autres.
    fn evict_cleaned_up(&mut self) {
        let rockets = &mut self.rockets;
        self.order.retain(|&id| match rockets.get(id) {
            Some(r) if r.current_state().is_terminal() => {
                rockets.remove(id);
                false
            }
            Some(_) => true,
            None => false,
        });
    }

    pub fn rocket(&self, id: RocketId) -> Option<&Rocket> {
        self.rockets.get(id)
    }

    /// État d'une fusée.
    ///
    /// Une fusée évincée est forcément CLEANED_UP. Le `Fleet` ne garde aucune
    /// trace des identifiants retirés : tout identifiant absent de la flotte,
    /// y compris un identifiant jamais émis par elle, est rapporté
    /// CLEANED_UP. Utiliser [`Fleet::rocket`] pour savoir si la fusée est
    /// encore présente.
    pub fn rocket_state(&self, id: RocketId) -> RocketState {
        self.rockets
            .get(id)
            .map_or(RocketState::CleanedUp, Rocket::current_state)
    }

    /// Fusées dans l'ordre d'insertion.
    pub fn iter(&self) -> impl Iterator<Item = (RocketId, &Rocket)> + '_ {
        self.order
            .iter()
            .filter_map(move |&id| self.rockets.get(id).map(|r| (id, r)))
    }

    /// Nombre d'entrées conservées (y compris CLEANED_UP si pas d'éviction).
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn live_count(&self) -> usize {
        self.iter()
            .filter(|(_, r)| !r.current_state().is_terminal())
            .count()
    }

    pub fn total_spawned(&self) -> u64 {
        self.total_spawned
    }

    pub fn config(&self) -> &ShowConfig {
        &self.config
    }

    pub fn assets(&self) -> &AssetBundle {
        &self.assets
    }

    pub fn assets_mut(&mut self) -> &mut AssetBundle {
        &mut self.assets
    }

    pub fn next_timer_fire_at(&self) -> Option<Timestamp> {
        self.spawn_timer.next_fire_at()
    }
}

// ==================================
// Helpers pour tests
// ==================================
#[cfg(any(test, feature = "test_helpers"))]
pub trait FleetTestHelpers {
    fn force_next_launch(&mut self, now: Timestamp);
    fn rockets_count(&self) -> usize;
}

#[cfg(any(test, feature = "test_helpers"))]
impl FleetTestHelpers for Fleet {
    fn force_next_launch(&mut self, now: Timestamp) {
        self.spawn_timer.force_due(now);
    }

    fn rockets_count(&self) -> usize {
        self.live_count()
    }
}
