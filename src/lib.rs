pub mod show;
pub use show::Show;
// Firework engine (cœur : fusées + flotte)
pub mod firework_engine;
pub use firework_engine::Fleet;
pub use firework_engine::Rocket;
pub use firework_engine::RocketState;
// Scene engine (collaborateurs : physique, audio, visuel)
pub mod scene_engine;
pub use scene_engine::HeadlessScene;
pub use scene_engine::SceneBackend;
