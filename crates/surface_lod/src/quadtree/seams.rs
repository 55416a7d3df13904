//! Seam and infinite-edge flags for visible chunks.
//!
//! A chunk edge needs welding when the area across it is rendered one level
//! coarser. Outer-ring chunks on the root boundary get an infinite flag
//! instead: nothing is gridded beyond them and the edge is stretched toward
//! the horizon.
//!
//! ```text
//! bit:  7   6   5   4   3   2   1   0
//!      ┌───┬───┬───┬───┬───┬───┬───┬───┐
//!      │ B │ T │ R │ L │ B │ T │ R │ L │
//!      └───┴───┴───┴───┴───┴───┴───┴───┘
//!        infinite edges    seams
//! ```

use bitflags::bitflags;

use super::{NodeId, QuadHierarchy, VisibleSet};
use crate::constants::SIDE_COUNT;

bitflags! {
  /// Per-chunk edge mask, uploaded as-is in the instance record.
  #[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
  pub struct EdgeFlags: u32 {
    const SEAM_LEFT = 1 << 0;
    const SEAM_RIGHT = 1 << 1;
    const SEAM_TOP = 1 << 2;
    const SEAM_BOTTOM = 1 << 3;
    const INFINITE_LEFT = 1 << 4;
    const INFINITE_RIGHT = 1 << 5;
    const INFINITE_TOP = 1 << 6;
    const INFINITE_BOTTOM = 1 << 7;

    const SEAMS = Self::SEAM_LEFT.bits()
      | Self::SEAM_RIGHT.bits()
      | Self::SEAM_TOP.bits()
      | Self::SEAM_BOTTOM.bits();
    const INFINITE = Self::INFINITE_LEFT.bits()
      | Self::INFINITE_RIGHT.bits()
      | Self::INFINITE_TOP.bits()
      | Self::INFINITE_BOTTOM.bits();
  }
}

impl EdgeFlags {
  /// Seam bit for a `SIDE_*` index.
  #[inline]
  pub fn seam(side: usize) -> Self {
    Self::from_bits_truncate(1 << side)
  }

  /// Infinite-edge bit for a `SIDE_*` index.
  #[inline]
  pub fn infinite(side: usize) -> Self {
    Self::from_bits_truncate(1 << (side + SIDE_COUNT))
  }

  #[inline]
  pub fn has_seam(self, side: usize) -> bool {
    self.contains(Self::seam(side))
  }

  #[inline]
  pub fn has_infinite(self, side: usize) -> bool {
    self.contains(Self::infinite(side))
  }

  #[inline]
  pub fn seam_count(self) -> u32 {
    self.intersection(Self::SEAMS).bits().count_ones()
  }

  #[inline]
  pub fn infinite_count(self) -> u32 {
    self.intersection(Self::INFINITE).bits().count_ones()
  }
}

/// Edge flags for a visible node.
///
/// Per side:
/// - no neighbor, inner side: the area is covered by a coarser leaf, seam.
/// - no neighbor, boundary side, depth within the infinite ring: infinite.
/// - neighbor not visible but its parent is: seam.
pub fn edge_flags(
  hierarchy: &QuadHierarchy,
  id: NodeId,
  visible: &VisibleSet,
  infinite_ring_depth: u32,
) -> EdgeFlags {
  let node = hierarchy.node(id);
  let mut flags = EdgeFlags::empty();

  for side in 0..SIDE_COUNT {
    match node.neighbors[side] {
      None => {
        if !hierarchy.is_boundary_side(id, side) {
          flags |= EdgeFlags::seam(side);
        } else if node.depth <= infinite_ring_depth {
          flags |= EdgeFlags::infinite(side);
        }
      }
      Some(neighbor) => {
        let parent = hierarchy.node(neighbor).parent;
        if !visible.contains(neighbor) && visible.contains(parent) {
          flags |= EdgeFlags::seam(side);
        }
      }
    }
  }

  flags
}

#[cfg(test)]
#[path = "seams_test.rs"]
mod seams_test;
