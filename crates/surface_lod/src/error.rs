//! Error type for the LOD engine.
//!
//! Most per-frame conditions are not errors: a viewer without an instance set
//! simply renders nothing. The variants below are the few cases a caller has
//! to hear about.

use crate::context::SurfaceHandle;
use crate::viewer::ViewerId;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LodError {
  /// The handle was never issued or the surface was already shut down.
  #[error("Unknown surface handle ({0:?})")]
  UnknownSurface(SurfaceHandle),

  /// The driver did not precompute frustum planes for this viewer before
  /// calling update. The viewer's refresh is skipped for the frame.
  #[error("Culling data for viewer {0:?} was not prepared for this frame")]
  MissingCullingData(ViewerId),

  /// Configuration rejected by `SurfaceConfig::validate`.
  #[error("Invalid surface configuration: {0}")]
  InvalidConfig(String),
}
