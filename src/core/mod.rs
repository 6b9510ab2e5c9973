pub mod config;
pub mod error;
pub mod types;

pub use config::AiConfig;
pub use error::{CoreError, Result};
pub use types::{BuildingId, CommandId, FactionId, GroupId, TimeMs, UnitId, Vec2, ZoneId};
