pub mod types;
pub use self::types::{Color, TickReport, Timestamp};

pub mod config;
pub use self::config::{RocketConfig, ShowConfig};

pub mod rocket_state;
pub use self::rocket_state::RocketState;

pub mod rocket;
pub use self::rocket::Rocket;

pub mod explosion_cloud;
pub use self::explosion_cloud::{CloudPoint, ExplosionCloud};

pub mod explosion_template;
pub use self::explosion_template::{AssetBundle, ExplosionTemplate};

pub mod spawn_policy;
pub use self::spawn_policy::{InputEvent, Launch, SpawnTimer};

pub mod fleet;
pub use self::fleet::{Fleet, RocketId};
