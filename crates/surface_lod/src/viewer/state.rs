//! ViewerState - everything one viewer keeps between frames.
//!
//! Created lazily the first time a viewer is seen. A refresh rebuilds the
//! visible set, repacks the instance buffer and rewrites the indirect draw
//! arguments of every detail tier. Between refreshes the previous buffers
//! are reused untouched.

use glam::DVec3;

use super::{
  pose_refresh_reason, zone_heights_changed, RefreshReason, RefreshThresholds, ViewerId,
  ViewerPose, ZoneHeights,
};
use crate::frustum::Frustum;
use crate::packing::{
  draw_args, pack_instances, ChunkMesh, DrawIndexedIndirectArgs, GrowingBuffer, InstanceRecord,
};
use crate::quadtree::{
  traverse, QuadHierarchy, SimZoneFootprint, TraversalInput, TraversalSettings, VisibleSet,
};
use crate::zones::ZoneKey;

/// Instance capacity allocated before the first refresh.
const INITIAL_INSTANCE_CAPACITY: u32 = 64;

/// Shared, per-frame inputs of a refresh.
pub struct RefreshContext<'a> {
  pub hierarchy: &'a QuadHierarchy,
  pub settings: &'a TraversalSettings,
  pub frustum: &'a Frustum,
  pub pose: ViewerPose,
  pub surface_height: f64,
  pub max_wave_height: f64,
  pub zones: &'a [SimZoneFootprint],
  pub zone_heights: &'a ZoneHeights,
  /// One mesh per detail tier.
  pub meshes: &'a [ChunkMesh],
  pub max_instances: usize,
}

pub struct ViewerState {
  id: ViewerId,
  visible: VisibleSet,
  /// Pose of the last refresh.
  pose: Option<ViewerPose>,
  surface_height: f64,
  zone_heights: ZoneHeights,
  /// World position the instance records are relative to.
  origin: DVec3,
  instances: GrowingBuffer<InstanceRecord>,
  instance_scratch: Vec<InstanceRecord>,
  draw_args: Vec<GrowingBuffer<DrawIndexedIndirectArgs>>,
  tier: usize,
  last_seen: u64,
  invalidated: bool,
  refreshes: u64,
}

impl ViewerState {
  pub fn new(id: ViewerId, tier_count: usize, max_instances: u32) -> Self {
    Self {
      id,
      visible: VisibleSet::new(),
      pose: None,
      surface_height: 0.0,
      zone_heights: ZoneHeights::new(),
      origin: DVec3::ZERO,
      instances: GrowingBuffer::new("instances", INITIAL_INSTANCE_CAPACITY, max_instances),
      instance_scratch: Vec::new(),
      draw_args: (0..tier_count)
        .map(|_| GrowingBuffer::new("draw_args", 1, 1))
        .collect(),
      tier: 0,
      last_seen: 0,
      invalidated: false,
      refreshes: 0,
    }
  }

  /// Cheap per-frame check. `None` means the cached buffers stay valid.
  pub fn refresh_reason(
    &self,
    pose: &ViewerPose,
    surface_height: f64,
    zone_heights: &[(ZoneKey, f64)],
    thresholds: &RefreshThresholds,
  ) -> Option<RefreshReason> {
    let Some(cached) = self.pose.as_ref() else {
      return Some(RefreshReason::NoInstances);
    };
    if self.instances.uploads() == 0 {
      return Some(RefreshReason::NoInstances);
    }
    if self.invalidated {
      return Some(RefreshReason::Invalidated);
    }
    if let Some(reason) = pose_refresh_reason(cached, pose, thresholds) {
      return Some(reason);
    }
    if (self.surface_height - surface_height).abs() > thresholds.height_tolerance {
      return Some(RefreshReason::SurfaceHeightChanged);
    }
    if zone_heights_changed(&self.zone_heights, zone_heights, thresholds.height_tolerance) {
      return Some(RefreshReason::ZoneHeightChanged);
    }
    None
  }

  /// Traverse, pack and rewrite every draw-argument buffer.
  #[tracing::instrument(skip_all, name = "viewer::refresh", fields(viewer = self.id.0))]
  pub fn refresh(&mut self, ctx: &RefreshContext<'_>) {
    traverse(
      ctx.hierarchy,
      ctx.settings,
      &TraversalInput {
        viewer: ctx.pose.position,
        far_clip: ctx.pose.far_clip,
        frustum: ctx.frustum,
        surface_height: ctx.surface_height,
        max_wave_height: ctx.max_wave_height,
        zones: ctx.zones,
      },
      &mut self.visible,
    );

    self.origin = ctx.pose.position;
    pack_instances(
      ctx.hierarchy,
      self.visible.as_slice(),
      self.origin,
      ctx.surface_height,
      ctx.max_instances,
      &mut self.instance_scratch,
    );
    let written = self.instances.write(&self.instance_scratch);

    // Tier count can change with a reconfigure.
    self
      .draw_args
      .resize_with(ctx.meshes.len(), || GrowingBuffer::new("draw_args", 1, 1));
    for (buffer, mesh) in self.draw_args.iter_mut().zip(ctx.meshes) {
      buffer.write(&[draw_args(mesh, written.end)]);
    }

    self.pose = Some(ctx.pose);
    self.surface_height = ctx.surface_height;
    self.zone_heights.clone_from(ctx.zone_heights);
    self.invalidated = false;
    self.refreshes += 1;

    tracing::trace!(
      visible = self.visible.len(),
      instances = written.end,
      "Refreshed viewer"
    );
  }

  /// Force a refresh on the next frame.
  pub fn invalidate(&mut self) {
    self.invalidated = true;
  }

  #[inline]
  pub fn id(&self) -> ViewerId {
    self.id
  }

  /// True once a refresh produced at least one instance.
  #[inline]
  pub fn has_instances(&self) -> bool {
    self.instances.uploads() > 0 && !self.instances.is_empty()
  }

  pub fn visible(&self) -> &VisibleSet {
    &self.visible
  }

  pub fn pose(&self) -> Option<&ViewerPose> {
    self.pose.as_ref()
  }

  #[inline]
  pub fn origin(&self) -> DVec3 {
    self.origin
  }

  pub fn instances(&self) -> &GrowingBuffer<InstanceRecord> {
    &self.instances
  }

  /// Draw arguments for `tier`, if that tier exists.
  pub fn draw_args(&self, tier: usize) -> Option<&GrowingBuffer<DrawIndexedIndirectArgs>> {
    self.draw_args.get(tier)
  }

  #[inline]
  pub fn tier(&self) -> usize {
    self.tier
  }

  pub fn set_tier(&mut self, tier: usize) {
    self.tier = tier;
  }

  #[inline]
  pub fn last_seen(&self) -> u64 {
    self.last_seen
  }

  pub fn touch(&mut self, frame: u64) {
    self.last_seen = frame;
  }

  /// Refreshes performed since creation.
  #[inline]
  pub fn refreshes(&self) -> u64 {
    self.refreshes
  }
}

#[cfg(test)]
#[path = "state_test.rs"]
mod state_test;
