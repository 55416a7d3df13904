//! Viewers: cached pose, refresh gating and per-viewer GPU state.

mod pose;
mod registry;
mod state;

pub use pose::{
  pose_refresh_reason, zone_heights_changed, RefreshReason, RefreshThresholds, ViewerPose,
  ZoneHeights,
};
pub use registry::ViewerRegistry;
pub use state::{RefreshContext, ViewerState};

/// Stable caller-side identity of a viewer (a camera).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewerId(pub u64);
