//! SurfaceConfig - everything a surface is initialized with.
//!
//! Every field has a production default and the whole tree deserializes from
//! partial TOML. Fields split in two groups:
//!
//! - **Hierarchy** (`center`, `far_distance`, `surface_level`,
//!   `min_lod_distance`, `max_depth`, `detail_by_distance`): changing any of
//!   them rebuilds the static quadtree and invalidates every viewer.
//! - **Everything else** is applied in place.

use glam::DVec2;
use serde::Deserialize;

use crate::constants::MAX_DEPTH_LIMIT;
use crate::error::LodError;
use crate::packing::DetailTierTable;
use crate::quadtree::{HierarchyConfig, TraversalSettings};
use crate::viewer::RefreshThresholds;
use crate::zones::ZoneGridConfig;

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
  /// Horizontal center of the surface, `[x, z]`.
  pub center: DVec2,
  pub far_distance: f64,
  /// Mean surface height.
  pub surface_level: f64,
  pub min_lod_distance: f64,
  pub max_depth: u32,
  /// False selects fixed cutoffs: the hierarchy is pruned at build time.
  pub detail_by_distance: bool,

  pub traversal: TraversalSettings,
  pub refresh: RefreshThresholds,
  pub tiers: DetailTierTable,
  pub wave_zones: ZoneGridConfig,
  pub color_wind_zones: ZoneGridConfig,

  pub max_instances_per_viewer: u32,
  pub max_viewers: usize,
}

impl Default for SurfaceConfig {
  fn default() -> Self {
    Self {
      center: DVec2::ZERO,
      far_distance: 4000.0,
      surface_level: 0.0,
      min_lod_distance: 16.0,
      max_depth: MAX_DEPTH_LIMIT,
      detail_by_distance: true,
      traversal: TraversalSettings::default(),
      refresh: RefreshThresholds::default(),
      tiers: DetailTierTable::default(),
      wave_zones: ZoneGridConfig::default(),
      color_wind_zones: ZoneGridConfig {
        max_zones: 32,
        ..ZoneGridConfig::default()
      },
      max_instances_per_viewer: 4096,
      max_viewers: 4,
    }
  }
}

impl SurfaceConfig {
  /// The part of the config that shapes the static hierarchy.
  pub fn hierarchy(&self) -> HierarchyConfig {
    HierarchyConfig {
      center: self.center,
      far_distance: self.far_distance,
      surface_level: self.surface_level,
      min_lod_distance: self.min_lod_distance,
      max_depth: self.max_depth,
      detail_by_distance: self.detail_by_distance,
    }
  }

  /// True when switching from `self` to `other` requires a hierarchy rebuild.
  pub fn requires_rebuild(&self, other: &SurfaceConfig) -> bool {
    self.hierarchy() != other.hierarchy()
  }

  /// True when per-viewer buffers must be recreated for `other`.
  pub fn requires_viewer_reset(&self, other: &SurfaceConfig) -> bool {
    self.tiers != other.tiers || self.max_instances_per_viewer != other.max_instances_per_viewer
  }

  pub fn validate(&self) -> Result<(), LodError> {
    let invalid = |reason: String| Err(LodError::InvalidConfig(reason));

    if !(self.far_distance.is_finite() && self.far_distance > 0.0) {
      return invalid(format!(
        "far_distance must be positive and finite, got {}",
        self.far_distance
      ));
    }
    if !self.center.is_finite() || !self.surface_level.is_finite() {
      return invalid("center and surface_level must be finite".into());
    }
    if !(self.min_lod_distance.is_finite() && self.min_lod_distance > 0.0) {
      return invalid(format!(
        "min_lod_distance must be positive and finite, got {}",
        self.min_lod_distance
      ));
    }
    if self.max_depth > MAX_DEPTH_LIMIT {
      return invalid(format!(
        "max_depth {} exceeds the limit of {}",
        self.max_depth, MAX_DEPTH_LIMIT
      ));
    }
    if self.tiers.is_empty() {
      return invalid("detail tier table is empty".into());
    }
    if self.tiers.tiers.iter().any(|tier| tier.resolution == 0) {
      return invalid("detail tier resolution must be non-zero".into());
    }
    if self.max_viewers == 0 {
      return invalid("max_viewers must be non-zero".into());
    }
    if self.max_instances_per_viewer == 0 {
      return invalid("max_instances_per_viewer must be non-zero".into());
    }
    let grids = [
      ("wave_zones", &self.wave_zones),
      ("color_wind_zones", &self.color_wind_zones),
    ];
    for (name, zones) in grids {
      if zones.max_zones == 0 || zones.max_zones_per_cell == 0 || zones.max_grid_dim == 0 {
        return invalid(format!("{name}: zone caps and grid dimension must be non-zero"));
      }
      if !(zones.base_cell_size.is_finite() && zones.base_cell_size > 0.0) {
        return invalid(format!("{name}: base_cell_size must be positive and finite"));
      }
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_default_is_valid() {
    assert_eq!(SurfaceConfig::default().validate(), Ok(()));
  }

  #[test]
  fn test_partial_toml() {
    let config: SurfaceConfig = toml::from_str(
      r#"
        far_distance = 1000.0
        center = [10.0, -5.0]

        [traversal]
        infinite_ring_depth = 1

        [wave_zones]
        max_zones = 4
      "#,
    )
    .unwrap();

    assert_eq!(config.far_distance, 1000.0);
    assert_eq!(config.center, DVec2::new(10.0, -5.0));
    assert_eq!(config.traversal.infinite_ring_depth, 1);
    assert_eq!(
      config.traversal.horizontal_displacement_margin,
      TraversalSettings::default().horizontal_displacement_margin
    );
    assert_eq!(config.wave_zones.max_zones, 4);
    assert_eq!(config.wave_zones.max_zones_per_cell, 8);
    assert_eq!(config.max_viewers, 4);
  }

  #[test]
  fn test_validate_rejects() {
    let cases = [
      SurfaceConfig {
        far_distance: 0.0,
        ..Default::default()
      },
      SurfaceConfig {
        far_distance: f64::INFINITY,
        ..Default::default()
      },
      SurfaceConfig {
        max_depth: MAX_DEPTH_LIMIT + 1,
        ..Default::default()
      },
      SurfaceConfig {
        tiers: DetailTierTable {
          tiers: Vec::new(),
          zone_tier_offset: 0,
        },
        ..Default::default()
      },
      SurfaceConfig {
        max_viewers: 0,
        ..Default::default()
      },
      SurfaceConfig {
        wave_zones: ZoneGridConfig {
          max_zones: 0,
          ..Default::default()
        },
        ..Default::default()
      },
    ];
    for config in cases {
      assert!(matches!(config.validate(), Err(LodError::InvalidConfig(_))));
    }
  }

  #[test]
  fn test_rebuild_detection() {
    let base = SurfaceConfig::default();

    let mut changed = base.clone();
    changed.refresh.rotation_degrees = 10.0;
    changed.max_viewers = 8;
    assert!(!base.requires_rebuild(&changed));

    changed.detail_by_distance = false;
    assert!(base.requires_rebuild(&changed));

    let mut bounds = base.clone();
    bounds.far_distance *= 2.0;
    assert!(base.requires_rebuild(&bounds));
  }
}
