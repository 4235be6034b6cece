use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Spatial partitions an entity lives in, and the set a query accepts.
    ///
    /// A query matches an entity when the two sets share at least one flag.
    /// An entity with no flags is dormant and never matches.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct PartitionFilter: u8 {
        /// Simulated partition: moving, thinking entities.
        const ACTIVE = 1 << 0;
        /// Static partition: props and markers that never move.
        const STATIC = 1 << 1;
    }
}

impl Default for PartitionFilter {
    fn default() -> Self {
        Self::ACTIVE
    }
}

impl PartitionFilter {
    /// Filter used by interest queries: everything that is not dormant.
    pub const AWAKE: Self = Self::ACTIVE.union(Self::STATIC);

    /// Membership value for a dormant entity.
    pub const DORMANT: Self = Self::empty();

    pub fn is_dormant(&self) -> bool {
        self.is_empty()
    }

    /// Whether an entity with membership `partition` passes this filter.
    pub fn accepts(&self, partition: PartitionFilter) -> bool {
        self.intersects(partition)
    }
}
