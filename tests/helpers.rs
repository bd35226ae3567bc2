use fireworks_show::firework_engine::config::{RocketConfig, ShowConfig};
use fireworks_show::firework_engine::{AssetBundle, ExplosionTemplate, Fleet, Rocket};
use fireworks_show::scene_engine::{HeadlessScene, MeshHandle};
use fireworks_show::scene_engine::PhysicsBackend;
use glam::Vec3;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::rc::Rc;

#[allow(unused)]
pub const GRAVITY: f32 = -3.0;

/// Configuration de fusée allégée (peu de points par explosion).
#[allow(unused)]
pub fn small_rocket_config() -> RocketConfig {
    RocketConfig {
        particles_per_explosion: 64,
        ..RocketConfig::default()
    }
}

/// Spectacle déterministe, sans timer.
#[allow(unused)]
pub fn manual_show_config() -> ShowConfig {
    ShowConfig {
        seed: Some(42),
        timer_enabled: false,
        metrics_interval_ms: 60_000,
        rocket: small_rocket_config(),
        ..ShowConfig::default()
    }
}

#[allow(unused)]
pub fn recording_scene() -> HeadlessScene {
    HeadlessScene::with_seed(GRAVITY, 7).recording()
}

#[allow(unused)]
pub fn test_assets(scene: &mut HeadlessScene) -> AssetBundle {
    let casters = vec![scene.add_static_mesh("ground"), scene.add_static_mesh("Happy")];
    AssetBundle::mothers_day(casters).unwrap()
}

#[allow(unused)]
pub fn test_fleet(scene: &mut HeadlessScene, config: ShowConfig) -> Fleet {
    let assets = test_assets(scene);
    Fleet::new(config, assets).unwrap()
}

#[allow(unused)]
pub fn heart() -> Rc<ExplosionTemplate> {
    Rc::new(ExplosionTemplate::heart("heart", 3.0, 32).unwrap())
}

#[allow(unused)]
pub fn seeded_rng() -> StdRng {
    StdRng::seed_from_u64(42)
}

/// Fusée lancée verticalement depuis l'origine.
#[allow(unused)]
pub fn vertical_rocket(
    scene: &mut HeadlessScene,
    config: &RocketConfig,
    rng: &mut StdRng,
) -> Rocket {
    let casters: Rc<[MeshHandle]> = Rc::from(vec![MeshHandle(1000), MeshHandle(1001)]);
    Rocket::new(scene, config, rng, Vec3::Y, Vec3::ZERO, casters, heart())
}

/// Une frame : physique de la scène puis mise à jour de la fusée.
#[allow(unused)]
pub fn advance(
    rocket: &mut Rocket,
    scene: &mut HeadlessScene,
    now: u64,
    config: &RocketConfig,
    rng: &mut StdRng,
) {
    scene.step_simulation(now);
    rocket.update(now, scene, config, rng);
}
