use glam::Vec3;
use serde::{Deserialize, Serialize};
use worldview_common::{Aabb2, AreaId, CellId, EntityId, RegionId};

use crate::camera::CameraSettingCatalog;
use crate::partition::PartitionFilter;
use crate::region::{Area, Cell, WorldEntity};

/// Read-only spatial queries over a region.
///
/// This is the only surface interest passes use, so many clients can read the
/// same region at once while its owning tick is the sole writer. Sequences are
/// returned in ascending id order.
pub trait RegionView {
    fn id(&self) -> RegionId;

    /// Hub regions reveal their minimap in full.
    fn is_hub(&self) -> bool;

    /// Cell containing `position`, if any.
    fn cell_at_position(&self, position: Vec3) -> Option<&Cell>;

    fn cells_in_volume(&self, volume: &Aabb2) -> Vec<&Cell>;

    fn entities_in_volume(&self, volume: &Aabb2, filter: PartitionFilter) -> Vec<&WorldEntity>;

    fn cell_by_id(&self, id: CellId) -> Option<&Cell>;

    fn area_by_id(&self, id: AreaId) -> Option<&Area>;

    fn entity_by_id(&self, id: EntityId) -> Option<&WorldEntity>;

    fn camera_settings(&self) -> &CameraSettingCatalog;

    /// Stored minimap discovery archive for this region, if it keeps one.
    fn map_discovery(&self) -> Option<&[u8]> {
        None
    }
}

/// Destination of a teleport or zone change.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub cell_id: CellId,
    pub position: Vec3,
}
