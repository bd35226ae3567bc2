pub mod r#trait;
pub use r#trait::{AudioBackend, PhysicsBackend, SceneBackend, VisualBackend};

pub mod types;
pub use self::types::{
    BodyHandle, CloudHandle, EmitterHandle, LightHandle, MeshHandle, Ray, SoundCue, SoundRequest,
};

pub mod headless_scene;
pub use self::headless_scene::{HeadlessScene, SceneCommand, SceneStats};
