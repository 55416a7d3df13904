use super::*;

fn looking_down_z() -> Frustum {
  Frustum::perspective(
    DVec3::ZERO,
    DVec3::Z,
    60f64.to_radians(),
    1.0,
    0.1,
    100.0,
  )
}

#[test]
fn test_point_ahead_is_inside_all_planes() {
  let frustum = looking_down_z();
  let point = DVec3::new(0.0, 0.0, 10.0);
  for (i, plane) in frustum.planes.iter().enumerate() {
    assert!(
      plane.signed_distance(point) > 0.0,
      "Plane {} should have the point on its inner side",
      i
    );
  }
}

#[test]
fn test_planes_are_normalized() {
  let frustum = looking_down_z();
  for plane in &frustum.planes {
    assert!((plane.normal.length() - 1.0).abs() < 1e-9);
  }
}

#[test]
fn test_box_ahead_is_visible() {
  let frustum = looking_down_z();
  let aabb = DAabb3::from_center_half_extents(DVec3::new(0.0, 0.0, 20.0), DVec3::ONE);
  assert!(frustum.intersects_aabb(&aabb));
}

#[test]
fn test_box_behind_is_culled() {
  let frustum = looking_down_z();
  let aabb = DAabb3::from_center_half_extents(DVec3::new(0.0, 0.0, -20.0), DVec3::ONE);
  assert!(!frustum.intersects_aabb(&aabb));
}

#[test]
fn test_box_beyond_far_plane_is_culled() {
  let frustum = looking_down_z();
  let aabb = DAabb3::from_center_half_extents(DVec3::new(0.0, 0.0, 150.0), DVec3::ONE);
  assert!(!frustum.intersects_aabb(&aabb));
}

#[test]
fn test_box_far_to_the_side_is_culled() {
  let frustum = looking_down_z();
  let aabb = DAabb3::from_center_half_extents(DVec3::new(80.0, 0.0, 10.0), DVec3::ONE);
  assert!(!frustum.intersects_aabb(&aabb));
}

#[test]
fn test_box_straddling_a_plane_is_visible() {
  let frustum = looking_down_z();
  // Spans from behind the camera to well in front of it.
  let aabb = DAabb3::new(DVec3::new(-1.0, -1.0, -50.0), DVec3::new(1.0, 1.0, 50.0));
  assert!(frustum.intersects_aabb(&aabb));
}

#[test]
fn test_sphere() {
  let frustum = looking_down_z();
  assert!(frustum.intersects_sphere(DVec3::new(0.0, 0.0, 30.0), 1.0));
  assert!(!frustum.intersects_sphere(DVec3::new(0.0, 0.0, -30.0), 1.0));
  // Behind the camera but large enough to reach in front of the near plane.
  assert!(frustum.intersects_sphere(DVec3::new(0.0, 0.0, -3.0), 5.0));
}

#[test]
fn test_plane_from_point_normal() {
  let plane = Plane::from_point_normal(DVec3::new(0.0, 5.0, 0.0), DVec3::new(0.0, 2.0, 0.0));
  assert_eq!(plane.normal, DVec3::Y);
  assert_eq!(plane.signed_distance(DVec3::new(3.0, 7.0, 1.0)), 2.0);
  assert_eq!(plane.signed_distance(DVec3::new(0.0, 4.0, 0.0)), -1.0);
}
