use glam::DVec3;

use super::*;
use crate::zones::{WaveSimParams, ZoneKey, ZoneKind};

fn config() -> SurfaceConfig {
  SurfaceConfig {
    far_distance: 512.0,
    min_lod_distance: 8.0,
    ..Default::default()
  }
}

fn viewer(id: u64, position: DVec3) -> ViewerFrame {
  let pose = ViewerPose {
    position,
    forward: DVec3::Z,
    far_clip: 1000.0,
    fov: 1.0,
  };
  ViewerFrame {
    id: ViewerId(id),
    pose,
    frustum: Some(Frustum::perspective(position, pose.forward, pose.fov, 1.5, 0.1, pose.far_clip)),
    surface_height: None,
  }
}

fn wave_zone(key: u64, position: DVec3) -> Zone {
  Zone {
    key: ZoneKey(key),
    position,
    size: DVec3::new(20.0, 4.0, 20.0),
    yaw: 0.0,
    initialized: true,
    kind: ZoneKind::WaveSimulation(WaveSimParams::default()),
  }
}

fn inputs<'a>(viewers: &'a [ViewerFrame], zones: &'a [Zone]) -> FrameInputs<'a> {
  FrameInputs {
    viewers,
    zones,
    max_wave_height: 1.0,
    wind_speed: 0.0,
    detail_by_distance: true,
    primary_viewer: None,
  }
}

#[test]
fn test_first_frame_refreshes_then_reuses() {
  let mut surface = SurfaceInstance::new(config());
  let viewers = [viewer(1, DVec3::new(0.0, 10.0, 0.0)), viewer(2, DVec3::new(100.0, 30.0, 0.0))];

  let first = surface.update(&inputs(&viewers, &[]));
  assert_eq!(first.frame, 1);
  assert_eq!(
    first.refreshed,
    vec![(ViewerId(1), RefreshReason::NoInstances), (ViewerId(2), RefreshReason::NoInstances)]
  );
  assert!(first.skipped.is_empty());

  let second = surface.update(&inputs(&viewers, &[]));
  assert!(second.refreshed.is_empty());
  assert_eq!(second.reused, vec![ViewerId(1), ViewerId(2)]);

  let data = surface.render_data(ViewerId(1)).unwrap();
  assert!(data.has_instances);
  assert_eq!(data.origin, DVec3::new(0.0, 10.0, 0.0));
  assert_eq!(data.draw_args.as_slice()[0].instance_count, data.instances.count());
}

/// A viewer without culling data is skipped; the others still update.
#[test]
fn test_missing_culling_data_skips_viewer() {
  let mut surface = SurfaceInstance::new(config());
  let mut blind = viewer(2, DVec3::new(0.0, 10.0, 0.0));
  blind.frustum = None;
  let viewers = [viewer(1, DVec3::new(0.0, 10.0, 0.0)), blind];

  let report = surface.update(&inputs(&viewers, &[]));
  assert_eq!(report.refreshed.len(), 1);
  assert_eq!(
    report.skipped,
    vec![(ViewerId(2), LodError::MissingCullingData(ViewerId(2)))]
  );

  let data = surface.render_data(ViewerId(2)).unwrap();
  assert!(!data.has_instances);
}

#[test]
fn test_detail_setting_change_rebuilds() {
  let mut surface = SurfaceInstance::new(config());
  let viewers = [viewer(1, DVec3::new(0.0, 10.0, 0.0))];
  surface.update(&inputs(&viewers, &[]));
  let full = surface.hierarchy().len();

  let mut frame = inputs(&viewers, &[]);
  frame.detail_by_distance = false;
  let report = surface.update(&frame);

  assert!(report.rebuilt);
  assert_eq!(report.refreshed, vec![(ViewerId(1), RefreshReason::Invalidated)]);
  assert!(!surface.hierarchy().config().detail_by_distance);
  assert!(surface.hierarchy().len() < full);

  // Same setting again: nothing to rebuild.
  assert!(!surface.update(&frame).rebuilt);
}

/// Two zones trading rank after a small sidestep keep the cached state.
#[test]
fn test_zone_rank_swap_keeps_cache() {
  let mut surface = SurfaceInstance::new(config());
  let zones = [
    wave_zone(1, DVec3::new(-5.0, 0.0, 50.0)),
    wave_zone(2, DVec3::new(5.0, 0.0, 50.0)),
  ];

  let left = [viewer(1, DVec3::new(-1.0, 10.0, 0.0))];
  let report = surface.update(&inputs(&left, &zones));
  assert_eq!(report.refreshed, vec![(ViewerId(1), RefreshReason::NoInstances)]);
  assert_eq!(report.zones.wave.retained, 2);

  // Below the forward threshold, but zone 2 is now the nearer one.
  let right = [viewer(1, DVec3::new(1.0, 10.0, 0.0))];
  let report = surface.update(&inputs(&right, &zones));
  assert!(report.refreshed.is_empty(), "{:?}", report.refreshed);
  assert_eq!(report.reused, vec![ViewerId(1)]);
}

#[test]
fn test_viewer_cap_evicts_oldest() {
  let mut surface = SurfaceInstance::new(SurfaceConfig {
    max_viewers: 2,
    ..config()
  });
  let viewers = [
    viewer(1, DVec3::new(0.0, 10.0, 0.0)),
    viewer(2, DVec3::new(10.0, 10.0, 0.0)),
    viewer(3, DVec3::new(20.0, 10.0, 0.0)),
  ];

  let report = surface.update(&inputs(&viewers, &[]));
  assert_eq!(report.evicted, vec![ViewerId(1)]);
  assert_eq!(surface.viewers().len(), 2);
  assert!(surface.viewer(ViewerId(1)).is_none());
}

/// Active simulation zones shift the tier to finer chunk meshes.
#[test]
fn test_tier_follows_wind_and_zones() {
  let mut surface = SurfaceInstance::new(config());
  let viewers = [viewer(1, DVec3::new(0.0, 10.0, 0.0))];

  let calm = surface.update(&inputs(&viewers, &[]));
  assert_eq!(calm.tier, 0);
  assert_eq!(surface.render_data(ViewerId(1)).unwrap().mesh.resolution, 8);

  let zones = [wave_zone(1, DVec3::new(0.0, 0.0, 50.0))];
  let with_zone = surface.update(&inputs(&viewers, &zones));
  assert_eq!(with_zone.tier, 1);
  assert_eq!(with_zone.zones.wave.retained, 1);
  assert_eq!(surface.render_data(ViewerId(1)).unwrap().mesh.resolution, 16);

  let mut windy = inputs(&viewers, &[]);
  windy.wind_speed = 50.0;
  assert_eq!(surface.update(&windy).tier, 3);

  let other = surface.render_data_at(ViewerId(1), 2).unwrap();
  assert_eq!(other.mesh.resolution, 24);
  assert!(surface.render_data_at(ViewerId(1), 9).is_none());
}

#[test]
fn test_zone_height_change_refreshes() {
  let mut surface = SurfaceInstance::new(config());
  let viewers = [viewer(1, DVec3::new(0.0, 10.0, 0.0))];

  surface.update(&inputs(&viewers, &[wave_zone(1, DVec3::new(0.0, 0.0, 50.0))]));
  let same = surface.update(&inputs(&viewers, &[wave_zone(1, DVec3::new(0.0, 0.0, 50.0))]));
  assert!(same.refreshed.is_empty());
  assert!(!same.zones.wave.grid_uploaded);

  let raised = surface.update(&inputs(&viewers, &[wave_zone(1, DVec3::new(0.0, 1.0, 50.0))]));
  assert_eq!(raised.refreshed, vec![(ViewerId(1), RefreshReason::ZoneHeightChanged)]);
  assert!(raised.zones.wave.grid_uploaded);
}

/// Zones are clustered against every viewer frustum, not just the primary.
#[test]
fn test_zones_visible_to_any_viewer_are_retained() {
  let mut surface = SurfaceInstance::new(config());
  let mut behind = viewer(2, DVec3::new(0.0, 10.0, 0.0));
  behind.frustum = Some(Frustum::perspective(
    DVec3::new(0.0, 10.0, 0.0),
    DVec3::NEG_Z,
    1.0,
    1.5,
    0.1,
    1000.0,
  ));
  let zones = [
    wave_zone(1, DVec3::new(0.0, 0.0, 50.0)),
    wave_zone(2, DVec3::new(0.0, 0.0, -50.0)),
  ];

  surface.update(&inputs(&[viewer(1, DVec3::new(0.0, 10.0, 0.0))], &zones));
  assert_eq!(surface.zone_grid(ZoneKindTag::WaveSimulation).retained().len(), 1);

  surface.update(&inputs(&[viewer(1, DVec3::new(0.0, 10.0, 0.0)), behind], &zones));
  assert_eq!(surface.zone_grid(ZoneKindTag::WaveSimulation).retained().len(), 2);
  assert!(surface.zone_grid(ZoneKindTag::ColorWind).retained().is_empty());
}

#[test]
fn test_reconfigure() {
  let mut surface = SurfaceInstance::new(config());
  let viewers = [viewer(1, DVec3::new(0.0, 10.0, 0.0)), viewer(2, DVec3::new(5.0, 10.0, 0.0))];
  surface.update(&inputs(&viewers, &[]));

  // Traversal tweak: applied in place, viewers refresh.
  let mut tweaked = surface.config().clone();
  tweaked.traversal.horizontal_displacement_margin = 8.0;
  assert!(!surface.reconfigure(tweaked.clone()));
  let report = surface.update(&inputs(&viewers, &[]));
  assert!(report
    .refreshed
    .iter()
    .all(|(_, reason)| *reason == RefreshReason::Invalidated));
  assert_eq!(report.refreshed.len(), 2);

  // Lower viewer cap.
  tweaked.max_viewers = 1;
  assert!(!surface.reconfigure(tweaked.clone()));
  assert_eq!(surface.viewers().len(), 1);

  // Bounds change: rebuild.
  tweaked.far_distance = 1024.0;
  assert!(surface.reconfigure(tweaked));
  assert_eq!(surface.hierarchy().config().far_distance, 1024.0);
}

#[test]
fn test_remove_viewer() {
  let mut surface = SurfaceInstance::new(config());
  surface.update(&inputs(&[viewer(1, DVec3::new(0.0, 10.0, 0.0))], &[]));
  assert!(surface.remove_viewer(ViewerId(1)));
  assert!(!surface.remove_viewer(ViewerId(1)));
  assert!(surface.render_data(ViewerId(1)).is_none());
}
