//! SurfaceInstance - one LOD surface: hierarchy, viewers and zone grids.
//!
//! # Frame Order
//!
//! ```text
//! update(inputs)
//!   ├─ detail setting changed? ──▶ rebuild hierarchy, invalidate viewers
//!   ├─ cluster zones (once, against every viewer frustum)
//!   ├─ pick detail tier from wind speed + active zones
//!   └─ per viewer, in input order:
//!        register / evict ─▶ culling data? ─▶ refresh due? ─▶ refresh
//!                               │ no             │ no
//!                               ▼                ▼
//!                        MissingCullingData   reuse cached buffers
//! ```

use glam::DVec3;
use web_time::Instant;

use crate::config::SurfaceConfig;
use crate::error::LodError;
use crate::frustum::Frustum;
use crate::metrics::LodMetrics;
use crate::packing::{ChunkMesh, DrawIndexedIndirectArgs, GrowingBuffer, InstanceRecord};
use crate::quadtree::QuadHierarchy;
use crate::viewer::{
  RefreshContext, RefreshReason, ViewerId, ViewerPose, ViewerRegistry, ViewerState, ZoneHeights,
};
use crate::zones::{Zone, ZoneCluster, ZoneFrameOutcome, ZoneGrids, ZoneKindTag};

/// One viewer's inputs for a frame.
#[derive(Clone, Copy, Debug)]
pub struct ViewerFrame {
  pub id: ViewerId,
  pub pose: ViewerPose,
  /// Planes precomputed by the driver. `None` skips the viewer this frame.
  pub frustum: Option<Frustum>,
  /// Surface height under the viewer. Defaults to the configured level.
  pub surface_height: Option<f64>,
}

/// Everything the driver supplies once per frame.
#[derive(Clone, Copy, Debug)]
pub struct FrameInputs<'a> {
  pub viewers: &'a [ViewerFrame],
  pub zones: &'a [Zone],
  pub max_wave_height: f64,
  pub wind_speed: f64,
  pub detail_by_distance: bool,
  /// Viewer zones are ranked against. Defaults to the first viewer.
  pub primary_viewer: Option<ViewerId>,
}

/// What one frame did.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameReport {
  pub frame: u64,
  /// The hierarchy was rebuilt at the start of the frame.
  pub rebuilt: bool,
  pub refreshed: Vec<(ViewerId, RefreshReason)>,
  /// Viewers whose cached state was reused.
  pub reused: Vec<ViewerId>,
  pub skipped: Vec<(ViewerId, LodError)>,
  pub evicted: Vec<ViewerId>,
  pub zones: ZoneFrameOutcome,
  pub tier: usize,
}

/// What a renderer needs to draw one viewer.
#[derive(Clone, Copy)]
pub struct ViewerRenderData<'a> {
  pub has_instances: bool,
  pub tier: usize,
  /// World position instance records are relative to.
  pub origin: DVec3,
  pub instances: &'a GrowingBuffer<InstanceRecord>,
  pub draw_args: &'a GrowingBuffer<DrawIndexedIndirectArgs>,
  pub mesh: &'a ChunkMesh,
}

pub struct SurfaceInstance {
  config: SurfaceConfig,
  hierarchy: QuadHierarchy,
  meshes: Vec<ChunkMesh>,
  viewers: ViewerRegistry,
  zones: ZoneGrids,
  metrics: LodMetrics,
  frame: u64,
}

impl SurfaceInstance {
  pub fn new(config: SurfaceConfig) -> Self {
    debug_assert!(config.validate().is_ok(), "Invalid surface configuration");

    Self {
      hierarchy: QuadHierarchy::build(config.hierarchy()),
      meshes: build_meshes(&config),
      viewers: ViewerRegistry::new(
        config.max_viewers,
        config.tiers.len(),
        config.max_instances_per_viewer,
      ),
      zones: ZoneGrids::new(config.wave_zones, config.color_wind_zones),
      metrics: LodMetrics::new(),
      frame: 0,
      config,
    }
  }

  pub fn update(&mut self, inputs: &FrameInputs<'_>) -> FrameReport {
    self.frame += 1;
    let mut report = FrameReport {
      frame: self.frame,
      ..Default::default()
    };

    if inputs.detail_by_distance != self.config.detail_by_distance {
      self.config.detail_by_distance = inputs.detail_by_distance;
      self.rebuild();
      report.rebuilt = true;
    }

    report.zones = self.cluster_zones(inputs);

    let footprints = self.zones.wave.active_footprints();
    let mut zone_heights: ZoneHeights = self
      .zones
      .wave
      .active()
      .map(|zone| (zone.key, zone.position.y))
      .collect();
    zone_heights.sort_unstable_by_key(|(key, _)| *key);
    report.tier = self.config.tiers.select(inputs.wind_speed, !footprints.is_empty());

    self.metrics.begin_frame();
    for frame in inputs.viewers {
      if let Some(evicted) = self.viewers.ensure(frame.id, self.frame) {
        report.evicted.push(evicted);
      }
      let Some(state) = self.viewers.get_mut(frame.id) else {
        continue;
      };
      state.set_tier(report.tier);

      let Some(frustum) = frame.frustum.as_ref() else {
        let error = LodError::MissingCullingData(frame.id);
        tracing::warn!(viewer = frame.id.0, "{error}");
        self.metrics.record_refresh_error();
        report.skipped.push((frame.id, error));
        continue;
      };

      let surface_height = frame.surface_height.unwrap_or(self.config.surface_level);
      let reason = state.refresh_reason(
        &frame.pose,
        surface_height,
        &zone_heights,
        &self.config.refresh,
      );
      match reason {
        Some(reason) => {
          let start = Instant::now();
          state.refresh(&RefreshContext {
            hierarchy: &self.hierarchy,
            settings: &self.config.traversal,
            frustum,
            pose: frame.pose,
            surface_height,
            max_wave_height: inputs.max_wave_height,
            zones: &footprints,
            zone_heights: &zone_heights,
            meshes: &self.meshes,
            max_instances: self.config.max_instances_per_viewer as usize,
          });
          self
            .metrics
            .record_refresh_timing(start.elapsed().as_micros() as u64);
          tracing::trace!(viewer = frame.id.0, ?reason, "Viewer refresh");
          report.refreshed.push((frame.id, reason));
        }
        None => {
          self.metrics.record_refresh_skipped();
          report.reused.push(frame.id);
        }
      }
      self.metrics.record_visible_set(&self.hierarchy, state.visible());
    }

    report
  }

  fn cluster_zones(&mut self, inputs: &FrameInputs<'_>) -> ZoneFrameOutcome {
    let frustums: Vec<&Frustum> = inputs
      .viewers
      .iter()
      .filter_map(|viewer| viewer.frustum.as_ref())
      .collect();
    let primary = inputs
      .primary_viewer
      .and_then(|id| inputs.viewers.iter().find(|viewer| viewer.id == id))
      .or_else(|| inputs.viewers.first())
      .map(|viewer| viewer.pose.position);

    let start = Instant::now();
    let outcome = self.zones.cluster(inputs.zones, &frustums, primary);
    self.metrics.record_cluster(
      start.elapsed().as_micros() as u64,
      &[outcome.wave, outcome.color_wind],
    );
    outcome
  }

  fn rebuild(&mut self) {
    tracing::debug!(
      far_distance = self.config.far_distance,
      detail_by_distance = self.config.detail_by_distance,
      "Rebuilding surface hierarchy"
    );
    self.hierarchy = QuadHierarchy::build(self.config.hierarchy());
    self.viewers.invalidate_all();
  }

  /// Apply a new configuration. Returns true when the hierarchy was rebuilt.
  pub fn reconfigure(&mut self, config: SurfaceConfig) -> bool {
    debug_assert!(config.validate().is_ok(), "Invalid surface configuration");

    let rebuild = self.config.requires_rebuild(&config);
    let reset_viewers = self.config.requires_viewer_reset(&config);
    let regrid = self.config.wave_zones != config.wave_zones
      || self.config.color_wind_zones != config.color_wind_zones;
    let refresh_viewers = self.config.traversal != config.traversal;
    self.config = config;

    if regrid {
      self.zones = ZoneGrids::new(self.config.wave_zones, self.config.color_wind_zones);
    }
    if reset_viewers {
      self.meshes = build_meshes(&self.config);
      self
        .viewers
        .reset(self.config.tiers.len(), self.config.max_instances_per_viewer);
    }
    for id in self.viewers.set_max_viewers(self.config.max_viewers) {
      tracing::debug!(viewer = id.0, "Viewer dropped by lower viewer cap");
    }
    if rebuild {
      self.rebuild();
    } else if refresh_viewers {
      self.viewers.invalidate_all();
    }
    rebuild
  }

  pub fn remove_viewer(&mut self, id: ViewerId) -> bool {
    self.viewers.remove(id).is_some()
  }

  /// Render data for `viewer` at its current tier, if the viewer is known.
  pub fn render_data(&self, viewer: ViewerId) -> Option<ViewerRenderData<'_>> {
    let state = self.viewers.get(viewer)?;
    self.render_data_for_tier(state, state.tier())
  }

  /// Render data for `viewer` drawn with the mesh of `tier`.
  pub fn render_data_at(&self, viewer: ViewerId, tier: usize) -> Option<ViewerRenderData<'_>> {
    let state = self.viewers.get(viewer)?;
    self.render_data_for_tier(state, tier)
  }

  fn render_data_for_tier<'a>(
    &'a self,
    state: &'a ViewerState,
    tier: usize,
  ) -> Option<ViewerRenderData<'a>> {
    Some(ViewerRenderData {
      has_instances: state.has_instances(),
      tier,
      origin: state.origin(),
      instances: state.instances(),
      draw_args: state.draw_args(tier)?,
      mesh: self.meshes.get(tier)?,
    })
  }

  pub fn config(&self) -> &SurfaceConfig {
    &self.config
  }

  pub fn hierarchy(&self) -> &QuadHierarchy {
    &self.hierarchy
  }

  pub fn viewers(&self) -> &ViewerRegistry {
    &self.viewers
  }

  pub fn viewer(&self, id: ViewerId) -> Option<&ViewerState> {
    self.viewers.get(id)
  }

  /// Cell table, index list, zone records and grid metadata of one kind.
  pub fn zone_grid(&self, kind: ZoneKindTag) -> &ZoneCluster {
    self.zones.get(kind)
  }

  pub fn meshes(&self) -> &[ChunkMesh] {
    &self.meshes
  }

  pub fn metrics(&self) -> &LodMetrics {
    &self.metrics
  }

  /// Frames processed so far.
  #[inline]
  pub fn frame(&self) -> u64 {
    self.frame
  }
}

fn build_meshes(config: &SurfaceConfig) -> Vec<ChunkMesh> {
  config
    .tiers
    .tiers
    .iter()
    .map(|tier| ChunkMesh::grid(tier.resolution))
    .collect()
}

#[cfg(test)]
#[path = "surface_test.rs"]
mod surface_test;
