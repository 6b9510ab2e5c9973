//! World-state boundary: entity snapshots in, mutations out

pub mod entity;
pub mod kinds;
pub mod mutation;
pub mod state;
pub mod view;

pub use entity::{Building, ProductionItem, Unit, UnitTask};
pub use kinds::{BuildingKind, BuildingStats, Stockpile, UnitKind, UnitStats};
pub use mutation::WorldMutation;
pub use state::{ApplyReport, World, WorldSnapshot};
pub use view::{WorldIndex, WorldView};
