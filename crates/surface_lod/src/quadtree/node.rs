//! QuadNode - one quadrant of the surface at a fixed subdivision depth.
//!
//! Nodes live in a flat arena owned by [`super::QuadHierarchy`]. Parent,
//! child and neighbor links are plain arena indices.

use glam::{DVec2, IVec2};

use super::Rect2;
use crate::constants::SIDE_COUNT;

/// Index of a node inside its hierarchy's arena.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct NodeId(pub u32);

impl NodeId {
  /// The root is always the first node pushed into the arena.
  pub const ROOT: Self = Self(0);

  #[inline]
  pub fn index(self) -> usize {
    self.0 as usize
  }
}

/// Quadtree node.
///
/// Children are ordered by quadrant bits:
/// - bit 0: +X half
/// - bit 1: +Z half
#[derive(Clone, Debug)]
pub struct QuadNode {
  /// Subdivision depth (0 = root).
  pub depth: u32,
  /// Horizontal center (`x` = world X, `y` = world Z).
  pub center: DVec2,
  /// Edge length in world units.
  pub size: f64,
  /// Parent node. The root is its own parent.
  pub parent: NodeId,
  /// Four children, or `None` for a leaf.
  pub children: Option<[NodeId; 4]>,
  /// Same-depth neighbors, indexed by `SIDE_*`. `None` at the outer boundary
  /// or where the neighboring area is covered by a coarser leaf.
  pub neighbors: [Option<NodeId>; SIDE_COUNT],
  /// Bucket coordinate at this depth, `0..2^depth` on each axis.
  pub coord: IVec2,
}

impl QuadNode {
  #[inline]
  pub fn is_leaf(&self) -> bool {
    self.children.is_none()
  }

  #[inline]
  pub fn rect(&self) -> Rect2 {
    Rect2::from_center_size(self.center, self.size)
  }

  /// Center of the child in `quadrant` (0-3).
  #[inline]
  pub fn child_center(&self, quadrant: u8) -> DVec2 {
    let quarter = self.size * 0.25;
    let sx = if quadrant & 1 == 0 { -1.0 } else { 1.0 };
    let sz = if (quadrant >> 1) & 1 == 0 { -1.0 } else { 1.0 };
    self.center + DVec2::new(sx * quarter, sz * quarter)
  }
}
