//! Shared types for worldview: identifiers, transforms and planar volumes.
//!
//! The planar world is the XY plane with Z pointing up. Every volume and
//! distance computation in the workspace ignores Z.

mod geometry;
mod types;

pub use geometry::{Aabb2, wrap_angle};
pub use types::{
    AreaId, CameraSettingId, CellId, EntityId, RegionId, Transform, distance_squared_2d,
};
