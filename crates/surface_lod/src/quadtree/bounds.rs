//! Double-precision bounds used by the hierarchy and culling.
//!
//! `Rect2` is a horizontal footprint in the XZ plane (`x` = world X,
//! `y` = world Z). `DAabb3` is a full 3D box for frustum tests.

use glam::{DVec2, DVec3};

/// Closed axis-aligned rectangle in the horizontal plane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect2 {
  pub min: DVec2,
  pub max: DVec2,
}

impl Rect2 {
  pub fn new(min: DVec2, max: DVec2) -> Self {
    debug_assert!(
      min.x <= max.x && min.y <= max.y,
      "Rect corners out of order"
    );
    Self { min, max }
  }

  /// Square of edge `size` centered on `center`.
  pub fn from_center_size(center: DVec2, size: f64) -> Self {
    let half = DVec2::splat(size * 0.5);
    Self {
      min: center - half,
      max: center + half,
    }
  }

  /// Touching edges count as overlapping.
  #[inline]
  pub fn overlaps(&self, other: &Rect2) -> bool {
    self.min.x <= other.max.x
      && self.max.x >= other.min.x
      && self.min.y <= other.max.y
      && self.max.y >= other.min.y
  }

  #[inline]
  pub fn contains_point(&self, point: DVec2) -> bool {
    point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
  }

  /// Euclidean distance from `point` to the closest point of the rectangle
  /// (zero when inside).
  #[inline]
  pub fn distance_to_point(&self, point: DVec2) -> f64 {
    let clamped = point.clamp(self.min, self.max);
    point.distance(clamped)
  }

  #[inline]
  pub fn size(&self) -> DVec2 {
    self.max - self.min
  }

  #[inline]
  pub fn center(&self) -> DVec2 {
    (self.min + self.max) * 0.5
  }

  #[inline]
  pub fn area(&self) -> f64 {
    let size = self.size();
    size.x * size.y
  }

  /// Grow on every side by `margin`.
  #[inline]
  pub fn inflate(&self, margin: f64) -> Self {
    Self {
      min: self.min - DVec2::splat(margin),
      max: self.max + DVec2::splat(margin),
    }
  }

  /// Smallest rectangle enclosing both.
  #[inline]
  pub fn union(&self, other: &Rect2) -> Self {
    Self {
      min: self.min.min(other.min),
      max: self.max.max(other.max),
    }
  }

  /// Extrude into a 3D box spanning `min_y..=max_y`.
  #[inline]
  pub fn extrude(&self, min_y: f64, max_y: f64) -> DAabb3 {
    DAabb3::new(
      DVec3::new(self.min.x, min_y, self.min.y),
      DVec3::new(self.max.x, max_y, self.max.y),
    )
  }
}

/// Culling box: a footprint extruded over a height range.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DAabb3 {
  pub min: DVec3,
  pub max: DVec3,
}

impl DAabb3 {
  pub fn new(min: DVec3, max: DVec3) -> Self {
    debug_assert!(
      min.x <= max.x && min.y <= max.y && min.z <= max.z,
      "Box corners out of order"
    );
    Self { min, max }
  }

  pub fn from_center_half_extents(center: DVec3, half_extents: DVec3) -> Self {
    Self {
      min: center - half_extents,
      max: center + half_extents,
    }
  }

  #[inline]
  pub fn size(&self) -> DVec3 {
    self.max - self.min
  }

  #[inline]
  pub fn center(&self) -> DVec3 {
    (self.min + self.max) * 0.5
  }
}
