use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use worldview_common::{Aabb2, AreaId, CellId, EntityId, RegionId, Transform};

use crate::camera::CameraSettingCatalog;
use crate::partition::PartitionFilter;
use crate::view::RegionView;

/// Errors from region mutations.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum RegionError {
    #[error("area {0} already exists")]
    DuplicateArea(AreaId),
    #[error("cell {0} already exists")]
    DuplicateCell(CellId),
    #[error("entity {0} already exists")]
    DuplicateEntity(EntityId),
    #[error("area {0} not found")]
    UnknownArea(AreaId),
    #[error("entity {0} not found")]
    UnknownEntity(EntityId),
    #[error("no cell at position ({x}, {y})")]
    NoCellAtPosition { x: f32, y: f32 },
}

/// Region flavour. Hubs reveal their whole minimap up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RegionKind {
    #[default]
    Standard,
    Hub,
}

/// A group of cells generated together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Area {
    pub id: AreaId,
    pub origin: Vec3,
    /// Created at runtime rather than by the region generator.
    pub dynamic: bool,
    cells: BTreeSet<CellId>,
}

impl Area {
    pub fn new(id: AreaId, origin: Vec3) -> Self {
        Self {
            id,
            origin,
            dynamic: false,
            cells: BTreeSet::new(),
        }
    }

    pub fn dynamic(mut self) -> Self {
        self.dynamic = true;
        self
    }

    /// Cells of this area in ascending id order.
    pub fn cell_ids(&self) -> impl Iterator<Item = CellId> + '_ {
        self.cells.iter().copied()
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }
}

/// A rectangular piece of map geometry owned by one area.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cell {
    pub id: CellId,
    pub area_id: AreaId,
    pub prototype: String,
    pub transform: Transform,
    pub bounds: Aabb2,
}

impl Cell {
    /// Cell whose transform sits at the center of `bounds`.
    pub fn new(id: CellId, area_id: AreaId, prototype: impl Into<String>, bounds: Aabb2) -> Self {
        let center = bounds.center();
        Self {
            id,
            area_id,
            prototype: prototype.into(),
            transform: Transform::from_position(center.extend(0.0)),
            bounds,
        }
    }
}

/// An entity placed in the world. Entities are points for volume queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldEntity {
    pub id: EntityId,
    pub prototype: String,
    pub position: Vec3,
    /// Cell currently containing the entity. Maintained by the region.
    pub cell_id: CellId,
    pub partition: PartitionFilter,
    /// Keep streaming this entity once a client has discovered it.
    pub track_after_discovery: bool,
}

impl WorldEntity {
    pub fn new(id: EntityId, prototype: impl Into<String>, position: Vec3) -> Self {
        Self {
            id,
            prototype: prototype.into(),
            position,
            cell_id: CellId::default(),
            partition: PartitionFilter::ACTIVE,
            track_after_discovery: false,
        }
    }

    pub fn with_partition(mut self, partition: PartitionFilter) -> Self {
        self.partition = partition;
        self
    }

    pub fn tracked_after_discovery(mut self) -> Self {
        self.track_after_discovery = true;
        self
    }
}

/// A record of every mutation made to a region by its owning tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RegionEvent {
    AreaAdded { id: AreaId, dynamic: bool },
    CellAdded { id: CellId, area_id: AreaId },
    EntitySpawned { id: EntityId, cell_id: CellId },
    EntityMoved { id: EntityId, from: CellId, to: CellId },
    EntityPartitionChanged { id: EntityId, partition: PartitionFilter },
    EntityDespawned { id: EntityId },
}

/// Authoritative region graph.
///
/// Mutation needs `&mut Region` and is reserved for the simulation tick that
/// owns the region. Client interest passes only see it through [`RegionView`].
/// BTreeMaps keep every iteration in ascending id order.
#[derive(Debug, Clone, Default)]
pub struct Region {
    id: RegionId,
    kind: RegionKind,
    areas: BTreeMap<AreaId, Area>,
    cells: BTreeMap<CellId, Cell>,
    entities: BTreeMap<EntityId, WorldEntity>,
    camera_settings: CameraSettingCatalog,
    map_discovery: Option<Vec<u8>>,
    events: Vec<RegionEvent>,
}

impl Region {
    pub fn new(id: RegionId, kind: RegionKind) -> Self {
        Self {
            id,
            kind,
            ..Default::default()
        }
    }

    pub fn with_camera_settings(mut self, catalog: CameraSettingCatalog) -> Self {
        self.camera_settings = catalog;
        self
    }

    /// Replace the stored minimap discovery archive.
    pub fn set_map_discovery(&mut self, data: Vec<u8>) {
        self.map_discovery = Some(data);
    }

    pub fn kind(&self) -> RegionKind {
        self.kind
    }

    pub fn areas(&self) -> &BTreeMap<AreaId, Area> {
        &self.areas
    }

    pub fn cells(&self) -> &BTreeMap<CellId, Cell> {
        &self.cells
    }

    pub fn entities(&self) -> &BTreeMap<EntityId, WorldEntity> {
        &self.entities
    }

    /// Drain and return the mutation log.
    pub fn drain_events(&mut self) -> Vec<RegionEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[RegionEvent] {
        &self.events
    }

    pub fn add_area(&mut self, area: Area) -> Result<(), RegionError> {
        if self.areas.contains_key(&area.id) {
            return Err(RegionError::DuplicateArea(area.id));
        }
        self.events.push(RegionEvent::AreaAdded {
            id: area.id,
            dynamic: area.dynamic,
        });
        // Cells are attached through add_cell only.
        let area = Area {
            cells: BTreeSet::new(),
            ..area
        };
        self.areas.insert(area.id, area);
        Ok(())
    }

    pub fn add_cell(&mut self, cell: Cell) -> Result<(), RegionError> {
        if self.cells.contains_key(&cell.id) {
            return Err(RegionError::DuplicateCell(cell.id));
        }
        let area = self
            .areas
            .get_mut(&cell.area_id)
            .ok_or(RegionError::UnknownArea(cell.area_id))?;
        area.cells.insert(cell.id);
        self.events.push(RegionEvent::CellAdded {
            id: cell.id,
            area_id: cell.area_id,
        });
        self.cells.insert(cell.id, cell);
        Ok(())
    }

    /// Place an entity; its cell is resolved from its position.
    pub fn spawn_entity(&mut self, mut entity: WorldEntity) -> Result<CellId, RegionError> {
        if self.entities.contains_key(&entity.id) {
            return Err(RegionError::DuplicateEntity(entity.id));
        }
        let cell_id = self.require_cell_at(entity.position)?;
        entity.cell_id = cell_id;
        self.events.push(RegionEvent::EntitySpawned {
            id: entity.id,
            cell_id,
        });
        self.entities.insert(entity.id, entity);
        Ok(cell_id)
    }

    /// Move an entity. A position outside every cell is rejected and the
    /// entity stays where it was.
    pub fn move_entity(&mut self, id: EntityId, position: Vec3) -> Result<CellId, RegionError> {
        let to = self.require_cell_at(position)?;
        let entity = self
            .entities
            .get_mut(&id)
            .ok_or(RegionError::UnknownEntity(id))?;
        let from = entity.cell_id;
        entity.position = position;
        entity.cell_id = to;
        self.events.push(RegionEvent::EntityMoved { id, from, to });
        Ok(to)
    }

    pub fn set_partition(
        &mut self,
        id: EntityId,
        partition: PartitionFilter,
    ) -> Result<(), RegionError> {
        let entity = self
            .entities
            .get_mut(&id)
            .ok_or(RegionError::UnknownEntity(id))?;
        entity.partition = partition;
        self.events
            .push(RegionEvent::EntityPartitionChanged { id, partition });
        Ok(())
    }

    pub fn despawn_entity(&mut self, id: EntityId) -> Option<WorldEntity> {
        let removed = self.entities.remove(&id);
        if removed.is_some() {
            self.events.push(RegionEvent::EntityDespawned { id });
        }
        removed
    }

    fn require_cell_at(&self, position: Vec3) -> Result<CellId, RegionError> {
        self.cell_at_position(position)
            .map(|c| c.id)
            .ok_or(RegionError::NoCellAtPosition {
                x: position.x,
                y: position.y,
            })
    }
}

impl RegionView for Region {
    fn id(&self) -> RegionId {
        self.id
    }

    fn is_hub(&self) -> bool {
        self.kind == RegionKind::Hub
    }

    fn cell_at_position(&self, position: Vec3) -> Option<&Cell> {
        self.cells
            .values()
            .find(|cell| cell.bounds.contains_point(position))
    }

    fn cells_in_volume(&self, volume: &Aabb2) -> Vec<&Cell> {
        self.cells
            .values()
            .filter(|cell| cell.bounds.intersects(volume))
            .collect()
    }

    fn entities_in_volume(&self, volume: &Aabb2, filter: PartitionFilter) -> Vec<&WorldEntity> {
        self.entities
            .values()
            .filter(|e| filter.accepts(e.partition) && volume.contains_point(e.position))
            .collect()
    }

    fn cell_by_id(&self, id: CellId) -> Option<&Cell> {
        self.cells.get(&id)
    }

    fn area_by_id(&self, id: AreaId) -> Option<&Area> {
        self.areas.get(&id)
    }

    fn entity_by_id(&self, id: EntityId) -> Option<&WorldEntity> {
        self.entities.get(&id)
    }

    fn camera_settings(&self) -> &CameraSettingCatalog {
        &self.camera_settings
    }

    fn map_discovery(&self) -> Option<&[u8]> {
        self.map_discovery.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    fn square(x: f32, y: f32, size: f32) -> Aabb2 {
        Aabb2::new(Vec2::new(x, y), Vec2::new(x + size, y + size))
    }

    fn two_cell_region() -> Region {
        let mut region = Region::new(RegionId(1), RegionKind::Standard);
        region.add_area(Area::new(AreaId(1), Vec3::ZERO)).unwrap();
        region
            .add_cell(Cell::new(CellId(10), AreaId(1), "a", square(0.0, 0.0, 100.0)))
            .unwrap();
        region
            .add_cell(Cell::new(CellId(11), AreaId(1), "b", square(100.0, 0.0, 100.0)))
            .unwrap();
        region
    }

    #[test]
    fn cells_are_attached_to_their_area() {
        let region = two_cell_region();
        let area = region.area_by_id(AreaId(1)).unwrap();
        assert_eq!(area.cell_ids().collect::<Vec<_>>(), vec![CellId(10), CellId(11)]);
        assert_eq!(region.events().len(), 3);
    }

    #[test]
    fn duplicate_and_orphan_cells_rejected() {
        let mut region = two_cell_region();
        let dup = Cell::new(CellId(10), AreaId(1), "x", square(0.0, 0.0, 1.0));
        assert_eq!(region.add_cell(dup), Err(RegionError::DuplicateCell(CellId(10))));
        let orphan = Cell::new(CellId(12), AreaId(9), "x", square(0.0, 0.0, 1.0));
        assert_eq!(region.add_cell(orphan), Err(RegionError::UnknownArea(AreaId(9))));
        assert_eq!(
            region.add_area(Area::new(AreaId(1), Vec3::ZERO)),
            Err(RegionError::DuplicateArea(AreaId(1)))
        );
    }

    #[test]
    fn point_query_picks_lowest_cell_on_shared_edge() {
        let region = two_cell_region();
        let cell = region.cell_at_position(Vec3::new(100.0, 50.0, 0.0)).unwrap();
        assert_eq!(cell.id, CellId(10));
        let cell = region.cell_at_position(Vec3::new(150.0, 50.0, 0.0)).unwrap();
        assert_eq!(cell.id, CellId(11));
        assert!(region.cell_at_position(Vec3::new(-5.0, 0.0, 0.0)).is_none());
    }

    #[test]
    fn volume_query_returns_ascending_ids() {
        let region = two_cell_region();
        let ids: Vec<_> = region
            .cells_in_volume(&square(50.0, 0.0, 100.0))
            .iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec![CellId(10), CellId(11)]);
        assert!(region.cells_in_volume(&square(500.0, 500.0, 10.0)).is_empty());
    }

    #[test]
    fn spawn_resolves_cell_and_move_updates_it() {
        let mut region = two_cell_region();
        let id = EntityId(7);
        let cell = region
            .spawn_entity(WorldEntity::new(id, "crate", Vec3::new(20.0, 20.0, 0.0)))
            .unwrap();
        assert_eq!(cell, CellId(10));
        let cell = region.move_entity(id, Vec3::new(150.0, 20.0, 0.0)).unwrap();
        assert_eq!(cell, CellId(11));
        assert_eq!(region.entity_by_id(id).unwrap().cell_id, CellId(11));
        assert!(matches!(
            region.move_entity(id, Vec3::new(999.0, 0.0, 0.0)),
            Err(RegionError::NoCellAtPosition { .. })
        ));
        assert_eq!(region.entity_by_id(id).unwrap().cell_id, CellId(11));
    }

    #[test]
    fn entity_query_applies_partition_filter() {
        let mut region = two_cell_region();
        region
            .spawn_entity(WorldEntity::new(EntityId(1), "npc", Vec3::new(10.0, 10.0, 0.0)))
            .unwrap();
        region
            .spawn_entity(
                WorldEntity::new(EntityId(2), "prop", Vec3::new(20.0, 10.0, 0.0))
                    .with_partition(PartitionFilter::STATIC),
            )
            .unwrap();
        region
            .spawn_entity(
                WorldEntity::new(EntityId(3), "sleeper", Vec3::new(30.0, 10.0, 0.0))
                    .with_partition(PartitionFilter::DORMANT),
            )
            .unwrap();

        let volume = square(0.0, 0.0, 200.0);
        let awake: Vec<_> = region
            .entities_in_volume(&volume, PartitionFilter::AWAKE)
            .iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(awake, vec![EntityId(1), EntityId(2)]);

        let active = region.entities_in_volume(&volume, PartitionFilter::ACTIVE);
        assert_eq!(active.len(), 1);

        region.set_partition(EntityId(3), PartitionFilter::ACTIVE).unwrap();
        assert_eq!(region.entities_in_volume(&volume, PartitionFilter::AWAKE).len(), 3);
    }

    #[test]
    fn despawn_logs_once() {
        let mut region = two_cell_region();
        region
            .spawn_entity(WorldEntity::new(EntityId(1), "npc", Vec3::new(10.0, 10.0, 0.0)))
            .unwrap();
        region.drain_events();
        assert!(region.despawn_entity(EntityId(1)).is_some());
        assert!(region.despawn_entity(EntityId(1)).is_none());
        assert_eq!(region.drain_events(), vec![RegionEvent::EntityDespawned { id: EntityId(1) }]);
    }

    #[test]
    fn map_discovery_is_stored() {
        let mut region = two_cell_region();
        assert!(region.map_discovery().is_none());
        region.set_map_discovery(vec![1, 2, 3]);
        assert_eq!(region.map_discovery(), Some(&[1, 2, 3][..]));
    }

    #[test]
    fn hub_kind() {
        assert!(Region::new(RegionId(2), RegionKind::Hub).is_hub());
        assert!(!two_cell_region().is_hub());
    }
}
