use std::fmt;
use std::time::Duration;
use worldview_common::RegionId;

/// Counters from the most recent cell or entity pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AoiStats {
    pub areas_added: usize,
    pub areas_removed: usize,
    pub cells_created: usize,
    pub cells_evicted: usize,
    pub entities_created: usize,
    pub entities_destroyed: usize,
    pub tracked_cells: usize,
    pub tracked_entities: usize,
    pub pass_time: Duration,
}

/// Ring buffer of recent pass durations.
#[derive(Debug, Clone)]
pub struct PassTimer {
    history: Vec<Duration>,
    index: usize,
    filled: bool,
}

impl PassTimer {
    /// A timer remembering the last `capacity` passes (at least one).
    pub fn new(capacity: usize) -> Self {
        Self {
            history: vec![Duration::ZERO; capacity.max(1)],
            index: 0,
            filled: false,
        }
    }

    pub fn record(&mut self, dt: Duration) {
        self.history[self.index] = dt;
        self.index = (self.index + 1) % self.history.len();
        if self.index == 0 {
            self.filled = true;
        }
    }

    fn recorded(&self) -> &[Duration] {
        if self.filled {
            &self.history
        } else {
            &self.history[..self.index]
        }
    }

    pub fn count(&self) -> usize {
        self.recorded().len()
    }

    pub fn average(&self) -> Duration {
        let samples = self.recorded();
        if samples.is_empty() {
            return Duration::ZERO;
        }
        samples.iter().sum::<Duration>() / samples.len() as u32
    }

    pub fn max(&self) -> Duration {
        self.recorded().iter().copied().max().unwrap_or(Duration::ZERO)
    }
}

impl Default for PassTimer {
    fn default() -> Self {
        Self::new(64)
    }
}

/// Snapshot of one client's interest state for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct AoiSummary {
    pub region: Option<RegionId>,
    pub cells_in_region: usize,
    pub loaded_cell_count: usize,
    pub tracked_entities: usize,
    pub cell_frame: u64,
    pub entity_frame: u64,
    pub average_pass: Duration,
}

impl fmt::Display for AoiSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let region = self
            .region
            .map_or_else(|| "unbound".to_string(), |r| r.to_string());
        write!(
            f,
            "AOI: region={} cells={} loaded={} entities={} frames=({}, {}) avg_pass={:?}",
            region,
            self.cells_in_region,
            self.loaded_cell_count,
            self.tracked_entities,
            self.cell_frame,
            self.entity_frame,
            self.average_pass
        )
    }
}
