//! Outbound protocol messages produced by interest passes.
//!
//! Only payload fields are modelled here; wire encoding belongs to the
//! network layer.

use bitflags::bitflags;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use worldview_common::{Aabb2, AreaId, CellId, EntityId, Transform};
use worldview_region::{Cell, PartitionFilter, RegionView, WorldEntity};

use crate::error::AoiError;

bitflags! {
    /// Environment update flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct EnvironmentFlags: u32 {
        /// New map content arrived; the client rebuilds its scene.
        const REFRESH = 1;
    }
}

/// Everything a client needs to instantiate a cell locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellDescriptor {
    pub cell_id: CellId,
    pub area_id: AreaId,
    pub prototype: String,
    pub transform: Transform,
    pub bounds: Aabb2,
}

impl From<&Cell> for CellDescriptor {
    fn from(cell: &Cell) -> Self {
        Self {
            cell_id: cell.id,
            area_id: cell.area_id,
            prototype: cell.prototype.clone(),
            transform: cell.transform,
            bounds: cell.bounds,
        }
    }
}

/// Full entity state sent when an entity becomes interesting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    pub entity_id: EntityId,
    pub prototype: String,
    pub position: Vec3,
    pub cell_id: CellId,
    pub partition: PartitionFilter,
    pub track_after_discovery: bool,
}

impl From<&WorldEntity> for EntitySnapshot {
    fn from(entity: &WorldEntity) -> Self {
        Self {
            entity_id: entity.id,
            prototype: entity.prototype.clone(),
            position: entity.position,
            cell_id: entity.cell_id,
            partition: entity.partition,
            track_after_discovery: entity.track_after_discovery,
        }
    }
}

/// Minimap state. Serialized into [`GameMessage::MinimapUpdate`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MinimapArchive {
    pub reveal_all: bool,
    /// Occlusion bitmap, one bit per minimap tile. Empty means nothing has
    /// been uncovered yet.
    pub map: Vec<u8>,
}

impl MinimapArchive {
    pub fn encode(&self) -> Result<Vec<u8>, AoiError> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf).map_err(|e| AoiError::MinimapEncode(e.to_string()))?;
        Ok(buf)
    }

    pub fn decode(data: &[u8]) -> Result<Self, AoiError> {
        ciborium::from_reader(data).map_err(|e| AoiError::MinimapDecode(e.to_string()))
    }
}

/// Message kinds, for logging and batch inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageKind {
    AreaAdd,
    AreaRemove,
    CellCreate,
    CellDestroy,
    EnvironmentUpdate,
    MinimapUpdate,
    EntityCreate,
    EntityDestroy,
}

/// One outbound update for a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameMessage {
    /// An area became relevant. `is_snapshot` is false while streaming.
    AreaAdd {
        area_id: AreaId,
        origin: Vec3,
        is_snapshot: bool,
    },
    /// The last tracked cell of an area was evicted; the client drops the area.
    AreaRemove { area_id: AreaId },
    CellCreate(CellDescriptor),
    /// The client releases the cell's geometry.
    CellDestroy { cell_id: CellId },
    EnvironmentUpdate { flags: EnvironmentFlags },
    /// Empty `archive_data` means reveal the whole map.
    MinimapUpdate { archive_data: Vec<u8> },
    EntityCreate(EntitySnapshot),
    EntityDestroy { entity_id: EntityId },
}

impl GameMessage {
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::AreaAdd { .. } => MessageKind::AreaAdd,
            Self::AreaRemove { .. } => MessageKind::AreaRemove,
            Self::CellCreate(_) => MessageKind::CellCreate,
            Self::CellDestroy { .. } => MessageKind::CellDestroy,
            Self::EnvironmentUpdate { .. } => MessageKind::EnvironmentUpdate,
            Self::MinimapUpdate { .. } => MessageKind::MinimapUpdate,
            Self::EntityCreate(_) => MessageKind::EntityCreate,
            Self::EntityDestroy { .. } => MessageKind::EntityDestroy,
        }
    }

    pub fn area_add(area_id: AreaId, origin: Vec3) -> Self {
        Self::AreaAdd {
            area_id,
            origin,
            is_snapshot: false,
        }
    }

    pub fn environment_refresh() -> Self {
        Self::EnvironmentUpdate {
            flags: EnvironmentFlags::REFRESH,
        }
    }

    /// Minimap payload for `region`: reveal-all for hubs, otherwise the
    /// region's stored discovery archive, or an empty one.
    ///
    /// A stored archive must decode; it is forwarded byte for byte.
    pub fn minimap<R: RegionView + ?Sized>(region: &R) -> Result<Self, AoiError> {
        let archive_data = if region.is_hub() {
            Vec::new()
        } else if let Some(stored) = region.map_discovery() {
            MinimapArchive::decode(stored)?;
            stored.to_vec()
        } else {
            MinimapArchive::default().encode()?
        };
        Ok(Self::MinimapUpdate { archive_data })
    }
}

impl From<&Cell> for GameMessage {
    fn from(cell: &Cell) -> Self {
        Self::CellCreate(cell.into())
    }
}

impl From<&WorldEntity> for GameMessage {
    fn from(entity: &WorldEntity) -> Self {
        Self::EntityCreate(entity.into())
    }
}
