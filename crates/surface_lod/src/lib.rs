//! surface_lod - adaptive quadtree LOD for unbounded water surfaces
//!
//! Tiles an effectively infinite horizontal surface into chunks, picks a
//! detail level per chunk from viewer distance and interaction zones, culls
//! against each viewer's frustum, flags seams between chunks of different
//! detail, and packs the result into GPU-ready instance buffers. A companion
//! pass buckets rotated rectangular zones into a uniform grid for constant
//! time per-cell lookup at render time.
//!
//! # Features
//!
//! - **Static hierarchy**: arena quadtree with a per-depth neighbor index,
//!   built once per configuration
//! - **Per-viewer traversal**: frustum and distance tests with pop-free LOD,
//!   horizon stretching of the outer rings, and forced subdivision around
//!   wave-simulation zones
//! - **Refresh gating**: cached pose hysteresis keeps multi-viewer frames
//!   cheap
//! - **Zone clustering**: SAT-based grid fit with upload skipping on an
//!   unchanged zone set
//!
//! Engine agnostic: no renderer types. Buffers are exposed as `Pod` slices
//! with an identity that changes on reallocation.
//!
//! # Example
//!
//! ```ignore
//! use surface_lod::{FrameInputs, LodContext, SurfaceConfig, ViewerFrame};
//!
//! let mut context = LodContext::new();
//! let ocean = context.initialize(SurfaceConfig::default());
//!
//! let report = context.update(ocean, &FrameInputs {
//!     viewers: &[camera_frame],
//!     zones: &zones,
//!     max_wave_height: 2.0,
//!     wind_speed: 5.0,
//!     detail_by_distance: true,
//!     primary_viewer: None,
//! })?;
//! ```

pub mod config;
pub mod constants;
pub mod context;
pub mod error;
pub mod frustum;
pub mod metrics;
pub mod packing;
pub mod quadtree;
pub mod surface;
pub mod viewer;
pub mod zones;

pub use config::SurfaceConfig;
pub use context::{LodContext, SurfaceHandle};
pub use error::LodError;
pub use frustum::{Frustum, Plane};
pub use metrics::LodMetrics;
pub use packing::{DetailTier, DetailTierTable, InstanceRecord};
pub use quadtree::{EdgeFlags, QuadHierarchy, TraversalSettings};
pub use surface::{FrameInputs, FrameReport, SurfaceInstance, ViewerFrame, ViewerRenderData};
pub use viewer::{RefreshReason, RefreshThresholds, ViewerId, ViewerPose};
pub use zones::{
  ColorWindParams, WaveSimParams, Zone, ZoneGridConfig, ZoneKey, ZoneKind, ZoneKindTag,
};
