use glam::Vec3;
use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;
use worldview_common::{Aabb2, AreaId, CameraSettingId, CellId, EntityId, RegionId, distance_squared_2d};
use worldview_region::{Cell, CameraSettingCatalog, PartitionFilter, RegionView, Transition, WorldEntity};

use crate::config::{AoiConfig, CellEvictionPolicy};
use crate::error::AoiError;
use crate::message::GameMessage;
use crate::stats::{AoiStats, AoiSummary, PassTimer};
use crate::view::CameraView;

/// What a client has been told about one cell or entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadStatus {
    /// Last pass at which the item was confirmed relevant.
    pub frame: u64,
    /// Client finished loading it. Entities are loaded on creation.
    pub loaded: bool,
    /// Exempt from staleness eviction.
    pub interest_to_player: bool,
}

impl LoadStatus {
    fn cell(frame: u64) -> Self {
        Self {
            frame,
            loaded: false,
            interest_to_player: false,
        }
    }

    fn entity(frame: u64, interest_to_player: bool) -> Self {
        Self {
            frame,
            loaded: true,
            interest_to_player,
        }
    }
}

/// Whether an entity stays tracked after it leaves the player's view.
pub fn entity_interest(entity: &WorldEntity) -> bool {
    entity.track_after_discovery
}

/// Per-client area-of-interest state.
///
/// Tracks every cell and entity the client has been told about and turns
/// player movement into ordered create/destroy messages. One instance per
/// client session; it only reads the region it is bound to.
///
/// Cell and entity passes keep separate frame counters. Each pass bumps its
/// own counter, so a stored frame equal to the counter means "seen this pass".
#[derive(Debug, Clone)]
pub struct AreaOfInterest {
    config: AoiConfig,
    region: Option<RegionId>,
    loaded_cells: BTreeMap<CellId, LoadStatus>,
    loaded_entities: BTreeMap<EntityId, LoadStatus>,
    cell_frame: u64,
    entity_frame: u64,
    last_update_center: Vec3,
    camera_view: CameraView,
    entities_volume: Option<Aabb2>,
    visibility_volume: Option<Aabb2>,
    cells_in_region: usize,
    loaded_cell_count: usize,
    stats: AoiStats,
    timer: PassTimer,
}

impl AreaOfInterest {
    /// Unbound state. Call [`reset`](Self::reset) before any pass.
    pub fn new(config: AoiConfig) -> Self {
        Self {
            camera_view: CameraView::unrotated(&config),
            config,
            region: None,
            loaded_cells: BTreeMap::new(),
            loaded_entities: BTreeMap::new(),
            cell_frame: 0,
            entity_frame: 0,
            last_update_center: Vec3::ZERO,
            entities_volume: None,
            visibility_volume: None,
            cells_in_region: 0,
            loaded_cell_count: 0,
            stats: AoiStats::default(),
            timer: PassTimer::default(),
        }
    }

    /// Forget everything and bind to `region` (session start, region transfer).
    pub fn reset<R: RegionView + ?Sized>(&mut self, region: &R) {
        self.loaded_cells.clear();
        self.loaded_entities.clear();
        self.cell_frame = 0;
        self.entity_frame = 0;
        self.cells_in_region = 0;
        self.loaded_cell_count = 0;
        self.last_update_center = Vec3::ZERO;
        self.entities_volume = None;
        self.visibility_volume = None;
        self.stats = AoiStats::default();
        self.region = Some(region.id());
        self.init_player_view(None, region.camera_settings());
        tracing::debug!(region = %region.id(), "interest reset");
    }

    /// Rebuild the camera footprint for `settings`.
    pub fn init_player_view(
        &mut self,
        settings: Option<CameraSettingId>,
        catalog: &CameraSettingCatalog,
    ) {
        self.camera_view = CameraView::new(settings, catalog, &self.config);
    }

    /// Whether the player moved far enough from the last pass center.
    pub fn should_update(&self, position: Vec3) -> bool {
        let threshold = self.config.update_distance;
        distance_squared_2d(self.last_update_center, position) > threshold * threshold
    }

    /// Stream cells and areas that entered the visibility volume.
    ///
    /// Returns area adds (ascending area id), each followed by its cell
    /// creates (ascending cell id); then evictions if enabled; then an
    /// environment refresh and a minimap update whenever anything was sent.
    pub fn update_cells<R: RegionView + ?Sized>(
        &mut self,
        region: &R,
        position: Vec3,
    ) -> Result<Vec<GameMessage>, AoiError> {
        self.check_bound(region.id())?;
        let _span = tracing::info_span!("aoi_update_cells", region = %region.id()).entered();
        let started = Instant::now();

        self.cell_frame += 1;
        let frame = self.cell_frame;
        let mut messages = Vec::new();

        if region.cell_at_position(position).is_none() {
            tracing::trace!(?position, "player outside every cell, skipping");
            return Ok(messages);
        }
        // Built before the tracker changes so a failure leaves it untouched.
        let minimap = GameMessage::minimap(region)?;

        let volume = self.camera_view.visibility_volume(position);
        self.visibility_volume = Some(volume);

        let mut new_cells: BTreeMap<AreaId, Vec<&Cell>> = BTreeMap::new();
        for cell in region.cells_in_volume(&volume) {
            match self.loaded_cells.get_mut(&cell.id) {
                Some(status) => status.frame = frame,
                None => new_cells.entry(cell.area_id).or_default().push(cell),
            }
        }

        let mut stats = AoiStats::default();
        if !new_cells.is_empty() {
            let used_areas = self.used_areas(region);
            for (area_id, mut cells) in new_cells {
                if !used_areas.contains(&area_id) {
                    let origin = region.area_by_id(area_id).map_or(Vec3::ZERO, |a| a.origin);
                    tracing::debug!(%area_id, "adding area");
                    messages.push(GameMessage::area_add(area_id, origin));
                    stats.areas_added += 1;
                }
                cells.sort_by_key(|c| c.id);
                cells.dedup_by_key(|c| c.id);
                for cell in cells {
                    tracing::debug!(cell_id = %cell.id, %area_id, "creating cell");
                    messages.push(GameMessage::from(cell));
                    self.loaded_cells.insert(cell.id, LoadStatus::cell(frame));
                    stats.cells_created += 1;
                }
            }
        }

        if let CellEvictionPolicy::EvictStale { grace_passes } = self.config.cell_eviction {
            let (cells, areas) = self.evict_stale_cells(region, grace_passes, &mut messages);
            stats.cells_evicted = cells;
            stats.areas_removed = areas;
        }

        self.cells_in_region = self.loaded_cells.len();

        // Nothing new: the update center stays where the last real update was.
        if messages.is_empty() {
            self.finish_pass(stats, started);
            return Ok(messages);
        }
        messages.push(GameMessage::environment_refresh());
        messages.push(minimap);

        self.last_update_center = position;
        self.finish_pass(stats, started);
        tracing::trace!(
            frame,
            messages = messages.len(),
            tracked = self.loaded_cells.len(),
            "cell pass complete"
        );
        Ok(messages)
    }

    /// Stream entities that entered the entity volume and destroy the ones
    /// that left it.
    ///
    /// Entities standing in a tracked cell the client has not finished loading
    /// are held back. Returns all creates followed by all destroys.
    pub fn update_entities<R: RegionView + ?Sized>(
        &mut self,
        region: &R,
        position: Vec3,
    ) -> Result<Vec<GameMessage>, AoiError> {
        self.check_bound(region.id())?;
        let _span = tracing::info_span!("aoi_update_entities", region = %region.id()).entered();
        let started = Instant::now();

        self.entity_frame += 1;
        let frame = self.entity_frame;
        let volume = self.camera_view.entities_volume(position);
        self.entities_volume = Some(volume);

        let mut messages = Vec::new();
        for entity in region.entities_in_volume(&volume, PartitionFilter::AWAKE) {
            if self
                .loaded_cells
                .get(&entity.cell_id)
                .is_some_and(|cell| !cell.loaded)
            {
                continue;
            }
            match self.loaded_entities.get_mut(&entity.id) {
                Some(status) => status.frame = frame,
                None => {
                    let interest = entity_interest(entity);
                    self.loaded_entities
                        .insert(entity.id, LoadStatus::entity(frame, interest));
                    tracing::debug!(entity_id = %entity.id, interest, "creating entity");
                    messages.push(GameMessage::from(entity));
                }
            }
        }
        let created = messages.len();

        let stale: Vec<EntityId> = self
            .loaded_entities
            .iter()
            .filter(|(_, status)| status.frame < frame && !status.interest_to_player)
            .map(|(id, _)| *id)
            .collect();
        for entity_id in &stale {
            self.loaded_entities.remove(entity_id);
            tracing::debug!(%entity_id, "destroying entity");
            messages.push(GameMessage::EntityDestroy {
                entity_id: *entity_id,
            });
        }

        self.last_update_center = position;
        let stats = AoiStats {
            entities_created: created,
            entities_destroyed: stale.len(),
            ..AoiStats::default()
        };
        self.finish_pass(stats, started);
        tracing::trace!(
            frame,
            created,
            destroyed = stale.len(),
            tracked = self.loaded_entities.len(),
            "entity pass complete"
        );
        Ok(messages)
    }

    /// Stop tracking an entity regardless of its interest flag.
    ///
    /// Returns the destroy message to send, or `None` if it was not tracked.
    pub fn release_entity(&mut self, entity_id: EntityId) -> Option<GameMessage> {
        self.loaded_entities.remove(&entity_id)?;
        tracing::debug!(%entity_id, "releasing entity");
        Some(GameMessage::EntityDestroy { entity_id })
    }

    /// Client acknowledged that a cell finished loading.
    ///
    /// Only the first acknowledgement of a tracked cell counts towards
    /// [`loaded_cell_count`](Self::loaded_cell_count). Returns whether the
    /// cell changed state.
    pub fn on_cell_loaded(&mut self, cell_id: CellId) -> bool {
        match self.loaded_cells.get_mut(&cell_id) {
            Some(status) if !status.loaded => {
                status.loaded = true;
                self.loaded_cell_count += 1;
                true
            }
            Some(_) => false,
            None => {
                tracing::debug!(%cell_id, "load ack for untracked cell");
                false
            }
        }
    }

    /// True while the transition's destination cell is not loaded on the client.
    pub fn check_target_cell(&self, transition: &Transition) -> bool {
        self.loaded_cells
            .get(&transition.cell_id)
            .is_none_or(|status| !status.loaded)
    }

    /// Mark every tracked cell as loaded.
    pub fn force_cell_load(&mut self) {
        for status in self.loaded_cells.values_mut() {
            status.loaded = true;
        }
        self.loaded_cell_count = self.loaded_cells.len();
    }

    pub fn config(&self) -> &AoiConfig {
        &self.config
    }

    pub fn region(&self) -> Option<RegionId> {
        self.region
    }

    pub fn loaded_cells(&self) -> &BTreeMap<CellId, LoadStatus> {
        &self.loaded_cells
    }

    pub fn loaded_entities(&self) -> &BTreeMap<EntityId, LoadStatus> {
        &self.loaded_entities
    }

    pub fn cell_status(&self, id: CellId) -> Option<&LoadStatus> {
        self.loaded_cells.get(&id)
    }

    pub fn entity_status(&self, id: EntityId) -> Option<&LoadStatus> {
        self.loaded_entities.get(&id)
    }

    pub fn cell_frame(&self) -> u64 {
        self.cell_frame
    }

    pub fn entity_frame(&self) -> u64 {
        self.entity_frame
    }

    pub fn last_update_center(&self) -> Vec3 {
        self.last_update_center
    }

    pub fn camera_view(&self) -> &CameraView {
        &self.camera_view
    }

    /// Entity volume of the last entity pass.
    pub fn entities_volume(&self) -> Option<Aabb2> {
        self.entities_volume
    }

    /// Visibility volume of the last cell pass.
    pub fn visibility_volume(&self) -> Option<Aabb2> {
        self.visibility_volume
    }

    pub fn cells_in_region(&self) -> usize {
        self.cells_in_region
    }

    pub fn loaded_cell_count(&self) -> usize {
        self.loaded_cell_count
    }

    /// Counters from the most recent pass.
    pub fn stats(&self) -> &AoiStats {
        &self.stats
    }

    pub fn pass_timer(&self) -> &PassTimer {
        &self.timer
    }

    pub fn summary(&self) -> AoiSummary {
        AoiSummary {
            region: self.region,
            cells_in_region: self.cells_in_region,
            loaded_cell_count: self.loaded_cell_count,
            tracked_entities: self.loaded_entities.len(),
            cell_frame: self.cell_frame,
            entity_frame: self.entity_frame,
            average_pass: self.timer.average(),
        }
    }

    fn check_bound(&self, given: RegionId) -> Result<(), AoiError> {
        match self.region {
            None => Err(AoiError::RegionNotBound),
            Some(bound) if bound != given => Err(AoiError::RegionMismatch { bound, given }),
            Some(_) => Ok(()),
        }
    }

    // Areas the client already knows through at least one tracked cell.
    fn used_areas<R: RegionView + ?Sized>(&self, region: &R) -> BTreeSet<AreaId> {
        self.loaded_cells
            .keys()
            .filter_map(|id| region.cell_by_id(*id))
            .map(|cell| cell.area_id)
            .collect()
    }

    // Cells unseen for more than `grace` passes go, unless a tracked entity
    // still stands in them. Returns (cells evicted, areas removed).
    fn evict_stale_cells<R: RegionView + ?Sized>(
        &mut self,
        region: &R,
        grace: u64,
        messages: &mut Vec<GameMessage>,
    ) -> (usize, usize) {
        let frame = self.cell_frame;
        let occupied: BTreeSet<CellId> = self
            .loaded_entities
            .keys()
            .filter_map(|id| region.entity_by_id(*id))
            .map(|entity| entity.cell_id)
            .collect();
        let stale: Vec<CellId> = self
            .loaded_cells
            .iter()
            .filter(|(id, status)| frame - status.frame > grace && !occupied.contains(id))
            .map(|(id, _)| *id)
            .collect();
        if stale.is_empty() {
            return (0, 0);
        }

        let areas_before = self.used_areas(region);
        for cell_id in &stale {
            if self.loaded_cells.remove(cell_id).is_some_and(|s| s.loaded) {
                self.loaded_cell_count = self.loaded_cell_count.saturating_sub(1);
            }
            tracing::debug!(%cell_id, "evicting stale cell");
            messages.push(GameMessage::CellDestroy { cell_id: *cell_id });
        }
        let areas_after = self.used_areas(region);
        let removed: Vec<AreaId> = areas_before.difference(&areas_after).copied().collect();
        for area_id in &removed {
            tracing::debug!(%area_id, "removing area");
            messages.push(GameMessage::AreaRemove { area_id: *area_id });
        }
        (stale.len(), removed.len())
    }

    fn finish_pass(&mut self, mut stats: AoiStats, started: Instant) {
        stats.tracked_cells = self.loaded_cells.len();
        stats.tracked_entities = self.loaded_entities.len();
        stats.pass_time = started.elapsed();
        self.timer.record(stats.pass_time);
        self.stats = stats;
    }
}
