//! Fixed limits shared by the hierarchy, packing and zone clustering.
//!
//! # Depth Convention
//!
//! Depth 0 = root (coarsest, covers the whole surface), higher depth = finer.
//!
//! ```text
//! Node Size       = total_size / 2^depth
//! LOD Distance[d] = total_size / 2^(d+1)      (d >= 1)
//! LOD Distance[0] = +inf                      (root always subdivides)
//! ```
//!
//! # Side Convention
//!
//! The surface lies in the XZ plane, +Y up.
//!
//! ```text
//!              TOP (+Z)
//!           ┌───────────┐
//!           │           │
//!  LEFT (-X)│   node    │RIGHT (+X)
//!           │           │
//!           └───────────┘
//!            BOTTOM (-Z)
//! ```

/// Hard ceiling for hierarchy depth. 4^8 = 65536 leaves at full detail.
pub const MAX_DEPTH_LIMIT: u32 = 8;

/// Number of sides per quadtree node.
pub const SIDE_COUNT: usize = 4;

/// Side indices, in the order used by neighbor arrays and edge masks.
pub const SIDE_LEFT: usize = 0;
pub const SIDE_RIGHT: usize = 1;
pub const SIDE_TOP: usize = 2;
pub const SIDE_BOTTOM: usize = 3;

/// Grid step per side, in (x, z) bucket units.
pub const SIDE_OFFSETS: [(i32, i32); SIDE_COUNT] = [
  (-1, 0), // LEFT
  (1, 0),  // RIGHT
  (0, 1),  // TOP
  (0, -1), // BOTTOM
];

/// Distance a missing outer-ring side is stretched to, in world units.
///
/// Finite so plane tests never multiply a zero normal component by infinity.
pub const HORIZON_EXTENT: f64 = 1.0e9;

/// Sentinel written to the flattened zone-index list for cells with no zone.
pub const NO_ZONE: u32 = u32::MAX;

/// Buffer capacities are rounded up to this many elements.
pub const BUFFER_GRANULARITY: u32 = 16;

/// Capacity of the per-depth counters in metrics (depths above are folded
/// into the last slot).
pub const METRIC_DEPTH_SLOTS: usize = 16;
