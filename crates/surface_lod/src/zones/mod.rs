//! Zone clustering: rotated rectangular zones bucketed into a uniform grid
//! for constant-time per-cell lookup at render time.
//!
//! Runs once per frame, independent of any single viewer. Wave-simulation
//! and color/wind zones are clustered into separate grids.

mod clustering;
mod grid;
mod sat;
mod zone;

pub use clustering::{ClusterOutcome, ZoneCluster, ZoneGridConfig, ZoneRecord};
pub use grid::{CellRange, GridMeta, ZoneGrid};
pub use sat::cell_overlaps_zone;
pub use zone::{
  ColorWindParams, OrientedRect, WaveSimParams, Zone, ZoneKey, ZoneKind, ZoneKindTag,
};

use glam::DVec3;

use crate::frustum::Frustum;

/// Both zone grids of a surface.
pub struct ZoneGrids {
  pub wave: ZoneCluster,
  pub color_wind: ZoneCluster,
}

/// Outcome of clustering both kinds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ZoneFrameOutcome {
  pub wave: ClusterOutcome,
  pub color_wind: ClusterOutcome,
}

impl ZoneGrids {
  pub fn new(wave: ZoneGridConfig, color_wind: ZoneGridConfig) -> Self {
    Self {
      wave: ZoneCluster::new(ZoneKindTag::WaveSimulation, wave),
      color_wind: ZoneCluster::new(ZoneKindTag::ColorWind, color_wind),
    }
  }

  pub fn cluster(
    &mut self,
    zones: &[Zone],
    frustums: &[&Frustum],
    primary: Option<DVec3>,
  ) -> ZoneFrameOutcome {
    ZoneFrameOutcome {
      wave: self.wave.cluster(zones, frustums, primary),
      color_wind: self.color_wind.cluster(zones, frustums, primary),
    }
  }

  pub fn get(&self, tag: ZoneKindTag) -> &ZoneCluster {
    match tag {
      ZoneKindTag::WaveSimulation => &self.wave,
      ZoneKindTag::ColorWind => &self.color_wind,
    }
  }
}
