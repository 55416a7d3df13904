//! Viewer pose and the hysteresis that decides when a refresh is due.
//!
//! A refresh is a full traversal plus packing, too expensive to run every
//! frame for several viewers. The cached pose of the last refresh is compared
//! against the current one and the refresh only runs once the viewer has
//! turned, moved or changed projection far enough.

use glam::DVec3;
use serde::Deserialize;
use smallvec::SmallVec;

use crate::zones::ZoneKey;

/// Height of each active simulation zone, keyed by zone identity.
pub type ZoneHeights = SmallVec<[(ZoneKey, f64); 8]>;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewerPose {
  pub position: DVec3,
  /// Unit view direction.
  pub forward: DVec3,
  pub far_clip: f64,
  /// Vertical field of view, radians.
  pub fov: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct RefreshThresholds {
  /// Forward-vector change, degrees.
  pub rotation_degrees: f64,
  pub forward_movement: f64,
  /// Applies when the viewer moves against its cached forward vector.
  pub backward_movement: f64,
  /// Surface and zone height change.
  pub height_tolerance: f64,
}

impl Default for RefreshThresholds {
  fn default() -> Self {
    Self {
      rotation_degrees: 2.0,
      forward_movement: 4.0,
      backward_movement: 1.0,
      height_tolerance: 0.05,
    }
  }
}

/// Why a viewer's state was rebuilt this frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RefreshReason {
  /// No instance buffer was ever written for this viewer.
  NoInstances,
  /// Configuration or hierarchy changed since the last refresh.
  Invalidated,
  Rotated,
  MovedForward,
  MovedBackward,
  FarClipChanged,
  FovChanged,
  SurfaceHeightChanged,
  ZoneHeightChanged,
}

/// Compare the pose of the last refresh against the current one.
///
/// Returns the first reason found, or `None` when the cached state is still
/// good enough.
pub fn pose_refresh_reason(
  cached: &ViewerPose,
  current: &ViewerPose,
  thresholds: &RefreshThresholds,
) -> Option<RefreshReason> {
  if cached.far_clip != current.far_clip {
    return Some(RefreshReason::FarClipChanged);
  }
  if cached.fov != current.fov {
    return Some(RefreshReason::FovChanged);
  }

  let turned = cached.forward.angle_between(current.forward).to_degrees();
  if turned > thresholds.rotation_degrees {
    return Some(RefreshReason::Rotated);
  }

  let delta = current.position - cached.position;
  let moved = delta.length();
  if delta.dot(cached.forward) < 0.0 {
    if moved > thresholds.backward_movement {
      return Some(RefreshReason::MovedBackward);
    }
  } else if moved > thresholds.forward_movement {
    return Some(RefreshReason::MovedForward);
  }

  None
}

/// True when the zone set changed or any zone moved vertically by more than
/// `tolerance`. Zones are matched by key, so ordering is irrelevant.
pub fn zone_heights_changed(
  cached: &[(ZoneKey, f64)],
  current: &[(ZoneKey, f64)],
  tolerance: f64,
) -> bool {
  cached.len() != current.len()
    || current.iter().any(|(key, height)| {
      cached
        .iter()
        .find(|(cached_key, _)| cached_key == key)
        .map_or(true, |(_, cached_height)| (cached_height - height).abs() > tolerance)
    })
}

#[cfg(test)]
mod tests {
  use super::*;

  fn pose(position: DVec3, forward: DVec3) -> ViewerPose {
    ViewerPose {
      position,
      forward,
      far_clip: 1000.0,
      fov: 1.0,
    }
  }

  #[test]
  fn test_small_changes_keep_state() {
    let thresholds = RefreshThresholds::default();
    let cached = pose(DVec3::ZERO, DVec3::Z);
    let current = pose(DVec3::new(0.0, 0.0, 3.0), DVec3::new(0.01, 0.0, 1.0).normalize());
    assert_eq!(pose_refresh_reason(&cached, &current, &thresholds), None);
  }

  #[test]
  fn test_rotation_triggers() {
    let thresholds = RefreshThresholds::default();
    let cached = pose(DVec3::ZERO, DVec3::Z);
    let current = pose(DVec3::ZERO, DVec3::new(0.1, 0.0, 1.0).normalize());
    assert_eq!(
      pose_refresh_reason(&cached, &current, &thresholds),
      Some(RefreshReason::Rotated)
    );
  }

  /// The same distance passes forward but trips the backward threshold.
  #[test]
  fn test_backward_threshold_is_tighter() {
    let thresholds = RefreshThresholds::default();
    let cached = pose(DVec3::ZERO, DVec3::Z);

    let ahead = pose(DVec3::new(0.0, 0.0, 2.0), DVec3::Z);
    assert_eq!(pose_refresh_reason(&cached, &ahead, &thresholds), None);

    let behind = pose(DVec3::new(0.0, 0.0, -2.0), DVec3::Z);
    assert_eq!(
      pose_refresh_reason(&cached, &behind, &thresholds),
      Some(RefreshReason::MovedBackward)
    );

    let far_ahead = pose(DVec3::new(0.0, 0.0, 5.0), DVec3::Z);
    assert_eq!(
      pose_refresh_reason(&cached, &far_ahead, &thresholds),
      Some(RefreshReason::MovedForward)
    );
  }

  #[test]
  fn test_projection_changes_trigger() {
    let thresholds = RefreshThresholds::default();
    let cached = pose(DVec3::ZERO, DVec3::Z);

    let mut current = cached;
    current.far_clip = 900.0;
    assert_eq!(
      pose_refresh_reason(&cached, &current, &thresholds),
      Some(RefreshReason::FarClipChanged)
    );

    let mut current = cached;
    current.fov = 1.2;
    assert_eq!(
      pose_refresh_reason(&cached, &current, &thresholds),
      Some(RefreshReason::FovChanged)
    );
  }

  #[test]
  fn test_zone_heights() {
    let a = [(ZoneKey(1), 0.0), (ZoneKey(2), 5.0)];
    assert!(!zone_heights_changed(&a, &[(ZoneKey(1), 0.01), (ZoneKey(2), 5.0)], 0.05));
    assert!(zone_heights_changed(&a, &[(ZoneKey(1), 0.2), (ZoneKey(2), 5.0)], 0.05));
    assert!(zone_heights_changed(&a, &[(ZoneKey(1), 0.0)], 0.05));
    assert!(zone_heights_changed(&a, &[(ZoneKey(1), 0.0), (ZoneKey(3), 5.0)], 0.05));
  }

  #[test]
  fn test_zone_heights_ignore_order() {
    let a = [(ZoneKey(1), 0.0), (ZoneKey(2), 5.0)];
    assert!(!zone_heights_changed(&a, &[(ZoneKey(2), 5.0), (ZoneKey(1), 0.0)], 0.05));
    assert!(zone_heights_changed(&a, &[(ZoneKey(2), 5.0), (ZoneKey(1), 0.3)], 0.05));
  }
}
