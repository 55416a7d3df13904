//! View frustum planes and bounding-volume tests.
//!
//! Frustum planes are normally precomputed by the render pipeline and handed
//! to [`crate::FrameInputs`]. `Frustum::from_view_projection` exists for
//! drivers that only have matrices (and for tests).

use glam::{DMat4, DVec3, DVec4};

use crate::quadtree::DAabb3;

/// Plane in Hessian normal form. Points with a positive signed distance are on
/// the side the normal points to (inside the frustum).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Plane {
  pub normal: DVec3,
  pub distance: f64,
}

impl Plane {
  pub fn new(normal: DVec3, distance: f64) -> Self {
    Self { normal, distance }
  }

  /// Plane through `point` facing `normal` (normalized here).
  pub fn from_point_normal(point: DVec3, normal: DVec3) -> Self {
    let normal = normal.normalize();
    Self {
      normal,
      distance: -normal.dot(point),
    }
  }

  /// Normalize a raw `(a, b, c, d)` row extracted from a clip matrix.
  fn from_row(row: DVec4) -> Self {
    let normal = row.truncate();
    let length = normal.length();

    if length <= f64::EPSILON || !length.is_finite() {
      return Self {
        normal: DVec3::Y,
        distance: 0.0,
      };
    }

    Self {
      normal: normal / length,
      distance: row.w / length,
    }
  }

  #[inline]
  pub fn signed_distance(&self, point: DVec3) -> f64 {
    self.normal.dot(point) + self.distance
  }
}

/// Six inward-facing planes: left, right, bottom, top, near, far.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Frustum {
  pub planes: [Plane; 6],
}

impl Frustum {
  pub fn new(planes: [Plane; 6]) -> Self {
    Self { planes }
  }

  /// Extract planes from a `projection * view` matrix with a 0..1 depth range.
  pub fn from_view_projection(view_proj: DMat4) -> Self {
    let r0 = view_proj.row(0);
    let r1 = view_proj.row(1);
    let r2 = view_proj.row(2);
    let r3 = view_proj.row(3);

    let left = Plane::from_row(r3 + r0);
    let right = Plane::from_row(r3 - r0);
    let bottom = Plane::from_row(r3 + r1);
    let top = Plane::from_row(r3 - r1);
    let near = Plane::from_row(r2);
    let far = Plane::from_row(r3 - r2);

    Self {
      planes: [left, right, bottom, top, near, far],
    }
  }

  /// Right-handed perspective frustum looking along `forward`.
  ///
  /// `fov_y` is the vertical field of view in radians.
  pub fn perspective(
    position: DVec3,
    forward: DVec3,
    fov_y: f64,
    aspect: f64,
    near: f64,
    far: f64,
  ) -> Self {
    let forward = forward.normalize();
    let up = if forward.dot(DVec3::Y).abs() > 0.999 {
      DVec3::Z
    } else {
      DVec3::Y
    };
    let view = DMat4::look_to_rh(position, forward, up);
    let projection = DMat4::perspective_rh(fov_y, aspect, near, far);
    Self::from_view_projection(projection * view)
  }

  /// Conservative box test: false only when the box is fully outside one
  /// plane.
  pub fn intersects_aabb(&self, aabb: &DAabb3) -> bool {
    const EPS: f64 = 1e-9;
    for plane in &self.planes {
      // Corner farthest along the plane normal.
      let mask = plane.normal.cmplt(DVec3::ZERO);
      let p = DVec3::select(mask, aabb.min, aabb.max);
      if plane.signed_distance(p) < -EPS {
        return false;
      }
    }
    true
  }

  pub fn intersects_sphere(&self, center: DVec3, radius: f64) -> bool {
    self
      .planes
      .iter()
      .all(|plane| plane.signed_distance(center) >= -radius)
  }
}

#[cfg(test)]
#[path = "frustum_test.rs"]
mod frustum_test;
