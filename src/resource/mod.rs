//! Resource zones and their allocator

pub mod allocator;
pub mod zone;

pub use allocator::{nearest_drop_off, Extraction, ResourceZoneAllocator};
pub use zone::{ResourceCategory, ResourceZone, EXHAUSTION_EPSILON};
