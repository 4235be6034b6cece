//! Region graph: areas, cells and world entities of one shared game space.
//!
//! # Invariants
//! - Every cell belongs to exactly one area; every entity references the cell
//!   containing it.
//! - All mutations go through `&mut Region` and are recorded as events.
//! - Readers use [`RegionView`], which never mutates.
//!
//! Queries are linear scans over id-ordered maps. A real deployment plugs its
//! spatial index in behind [`RegionView`].

mod camera;
mod partition;
mod region;
mod view;

pub use camera::{CameraSetting, CameraSettingCatalog, CameraSettingCollection};
pub use partition::PartitionFilter;
pub use region::{Area, Cell, Region, RegionError, RegionEvent, RegionKind, WorldEntity};
pub use view::{RegionView, Transition};
