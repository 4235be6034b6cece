//! Area of interest: decides which cells and entities each client sees.
//!
//! # Invariants
//! - An area is announced before any of its cells, and only once while the
//!   client knows at least one of its cells.
//! - Cell creates are ordered by area id, then cell id, regardless of query order.
//! - Entities flagged for interest are never destroyed by staleness.
//! - Passes only read the region; many clients may share one region.
//!
//! Each pass returns an ordered batch of [`GameMessage`]s for the network layer.

mod aoi;
mod config;
mod error;
mod message;
mod stats;
mod view;

pub use aoi::{AreaOfInterest, LoadStatus, entity_interest};
pub use config::{AoiConfig, CellEvictionPolicy, ConfigError};
pub use error::AoiError;
pub use message::{
    CellDescriptor, EntitySnapshot, EnvironmentFlags, GameMessage, MessageKind, MinimapArchive,
};
pub use stats::{AoiStats, AoiSummary, PassTimer};
pub use view::CameraView;

pub fn crate_info() -> &'static str {
    "worldview-stream v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("stream"));
    }
}
