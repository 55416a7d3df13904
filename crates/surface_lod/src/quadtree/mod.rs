//! Static surface quadtree, per-viewer traversal and seam derivation.
//!
//! ```text
//! HierarchyConfig ──build──▶ QuadHierarchy (arena + per-depth coord index)
//!                                  │
//!      viewer pose + frustum ──────┤
//!                                  ▼
//!                              traverse() ──▶ VisibleSet ──▶ edge flags
//! ```

mod bounds;
mod config;
mod hierarchy;
mod node;
mod seams;
mod traversal;

pub use bounds::{DAabb3, Rect2};
pub use config::{HierarchyConfig, LodDistances, BOUNDS_DEPTH_BELOW_SURFACE};
pub use hierarchy::QuadHierarchy;
pub use node::{NodeId, QuadNode};
pub use seams::{edge_flags, EdgeFlags};
pub use traversal::{
  forced_subdivision_cutoff, traverse, NodeVisibility, SimZoneFootprint, TraversalInput,
  TraversalSettings, VisibleChunk, VisibleSet,
};
