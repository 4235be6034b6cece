use worldview_common::RegionId;

/// Contract violations reported by an interest pass.
///
/// Expected runtime conditions (no cell under the player, empty queries,
/// missing camera settings) never produce an error.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum AoiError {
    #[error("interest pass invoked before a region was bound")]
    RegionNotBound,
    #[error("interest bound to region {bound} but queried with region {given}")]
    RegionMismatch { bound: RegionId, given: RegionId },
    #[error("minimap encoding failed: {0}")]
    MinimapEncode(String),
    #[error("minimap decoding failed: {0}")]
    MinimapDecode(String),
}
