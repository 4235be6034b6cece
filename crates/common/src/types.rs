use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident($inner:ty)) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
        )]
        pub struct $name(pub $inner);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(
    /// Identifier of a region (one shared, persistent game space).
    RegionId(u64)
);
id_type!(
    /// Identifier of an area inside a region. Unique per region.
    AreaId(u32)
);
id_type!(
    /// Identifier of a cell inside a region. Unique per region, not per area.
    CellId(u32)
);
id_type!(
    /// Identifier of a world entity.
    EntityId(u64)
);
id_type!(
    /// Opaque key of a camera setting collection.
    CameraSettingId(u64)
);

/// Spatial transform: position, rotation, scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Transform placed at `position` with no rotation and unit scale.
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }
}

/// Squared distance between two points, ignoring Z.
pub fn distance_squared_2d(a: Vec3, b: Vec3) -> f32 {
    a.truncate().distance_squared(b.truncate())
}
