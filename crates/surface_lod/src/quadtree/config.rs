//! HierarchyConfig and the per-depth LOD distance table.

use glam::{DVec2, DVec3};

use super::{DAabb3, Rect2};
use crate::constants::MAX_DEPTH_LIMIT;

/// Thickness of the total bounds below the surface level. The box is
/// centered below the mean surface so submerged viewers still hit the root.
pub const BOUNDS_DEPTH_BELOW_SURFACE: f64 = 200.0;

/// Everything that shapes the static hierarchy. Two equal configs build
/// identical trees, so comparing them decides whether a rebuild is due.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HierarchyConfig {
  /// Horizontal center of the surface.
  pub center: DVec2,
  /// Far distance the surface must cover from its center.
  pub far_distance: f64,
  /// Mean surface height.
  pub surface_level: f64,
  /// Distance below which no finer level is generated.
  pub min_lod_distance: f64,
  /// Requested depth ceiling (clamped to `MAX_DEPTH_LIMIT`).
  pub max_depth: u32,
  /// When false, nodes farther from the center than their level distance
  /// stop subdividing at build time (fixed cutoffs).
  pub detail_by_distance: bool,
}

impl HierarchyConfig {
  /// Edge length of the root node.
  #[inline]
  pub fn total_size(&self) -> f64 {
    self.far_distance * 2.0
  }

  /// Root footprint.
  pub fn root_rect(&self) -> Rect2 {
    Rect2::from_center_size(self.center, self.total_size())
  }

  /// Total bounding volume: the root footprint, spanning from
  /// `BOUNDS_DEPTH_BELOW_SURFACE` under the surface to the surface itself.
  pub fn total_bounds(&self) -> DAabb3 {
    let half = self.total_size() * 0.5;
    let half_height = BOUNDS_DEPTH_BELOW_SURFACE * 0.5;
    DAabb3::from_center_half_extents(
      DVec3::new(self.center.x, self.surface_level - half_height, self.center.y),
      DVec3::new(half, half_height, half),
    )
  }

  pub fn lod_distances(&self) -> LodDistances {
    LodDistances::compute(
      self.total_size(),
      self.min_lod_distance,
      self.max_depth.min(MAX_DEPTH_LIMIT),
    )
  }
}

impl Default for HierarchyConfig {
  fn default() -> Self {
    Self {
      center: DVec2::ZERO,
      far_distance: 2000.0,
      surface_level: 0.0,
      min_lod_distance: 10.0,
      max_depth: MAX_DEPTH_LIMIT,
      detail_by_distance: true,
    }
  }
}

/// One LOD distance per depth, shared read-only by every viewer.
///
/// ```text
/// distances[0] = +inf
/// distances[d] = total_size / 2^(d+1)
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct LodDistances {
  distances: Vec<f64>,
}

impl LodDistances {
  /// Build the table for `total_size`, stopping at the first depth whose
  /// radius is at or below `min_distance`, and never deeper than
  /// `depth_limit`.
  pub fn compute(total_size: f64, min_distance: f64, depth_limit: u32) -> Self {
    let depth = Self::natural_depth(total_size, min_distance).min(depth_limit);
    let mut distances = Vec::with_capacity(depth as usize + 1);
    distances.push(f64::INFINITY);
    for d in 1..=depth {
      distances.push(Self::radius(total_size, d));
    }
    Self { distances }
  }

  /// Smallest depth `d` with `total_size / 2^(d+1) <= min_distance`, before
  /// any depth clamping.
  pub fn natural_depth(total_size: f64, min_distance: f64) -> u32 {
    debug_assert!(total_size > 0.0, "Surface bounds must be non-zero");
    let mut depth = 0;
    // 62 keeps the shift well defined for degenerate minimum distances.
    while depth < 62 && Self::radius(total_size, depth) > min_distance {
      depth += 1;
    }
    depth
  }

  #[inline]
  fn radius(total_size: f64, depth: u32) -> f64 {
    total_size / (1u64 << (depth + 1)) as f64
  }

  /// Deepest level of the hierarchy.
  #[inline]
  pub fn max_depth(&self) -> u32 {
    (self.distances.len() - 1) as u32
  }

  /// Distance threshold for `depth`. Depths past the table are treated as
  /// the finest entry.
  #[inline]
  pub fn get(&self, depth: u32) -> f64 {
    let index = (depth as usize).min(self.distances.len() - 1);
    self.distances[index]
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.distances.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.distances.is_empty()
  }

  pub fn as_slice(&self) -> &[f64] {
    &self.distances
  }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
