use anyhow::Result;
use glam::Vec3;
use log::info;
use std::env;

use fireworks_show::firework_engine::config::ShowConfig;
use fireworks_show::firework_engine::{AssetBundle, Fleet, InputEvent};
use fireworks_show::scene_engine::{HeadlessScene, Ray};
use fireworks_show::Show;

const FRAME_MS: u64 = 16;
const DEFAULT_SHOW_SECONDS: u64 = 60;

/// Main entry point: headless fireworks show.
fn main() -> Result<()> {
    env_logger::init();

    info!("🚀 Starting Fireworks Show...");

    let config = ShowConfig::from_file("assets/config/show.toml").unwrap_or_default();
    info!("Show config loaded:\n{:#?}", config);

    // --------------------------
    // Durée du spectacle
    // --------------------------
    let seconds = env::args()
        .nth(1) // priorité à l'argument CLI
        .or_else(|| env::var("FIREWORKS_SHOW_SECONDS").ok())
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(DEFAULT_SHOW_SECONDS);

    // --------------------------
    // Scène et assets
    // --------------------------
    let mut scene = match config.seed {
        Some(seed) => HeadlessScene::with_seed(config.gravity, seed),
        None => HeadlessScene::new(config.gravity),
    };
    let shadow_casters = ["ground", "Happy", "Mother's", "Day"]
        .iter()
        .map(|name| scene.add_static_mesh(name))
        .collect();
    let assets = AssetBundle::mothers_day(shadow_casters)?;

    let fleet = Fleet::new(config, assets)?;
    let mut show = Show::new(scene, fleet);

    // Première moitié au timer, puis un double-tap vers le ciel
    let half_ms = seconds * 500;
    show.run_simulated(half_ms, FRAME_MS);
    show.handle_input(&InputEvent::DoubleTap {
        ray: Ray::new(Vec3::new(0.0, 5.0, -10.0), Vec3::new(0.0, 0.5, 1.0)),
    });
    let metrics = show.run_simulated(seconds * 1000 - half_ms, FRAME_MS);

    info!(
        "🎆 Show finished: {} rockets spawned, {} explosions, {} cleaned up, max {} live, {} frames",
        show.fleet().total_spawned(),
        metrics.explosions,
        metrics.cleaned_up,
        metrics.max_live,
        metrics.frames
    );
    info!("Scene at the end: {:?}", show.scene().stats());

    Ok(())
}
