//! Per-kind zone clustering into a uniform lookup grid.
//!
//! Each frame, for one zone kind:
//!
//! 1. Keep zones whose bounds intersect any viewer frustum.
//! 2. Sort by squared distance to the primary viewer and keep `max_zones`.
//!    Color/wind zones are then re-sorted by height. IDs are the final
//!    ordinal positions.
//! 3. Fit a grid over the retained bounds.
//! 4. SAT-test every retained zone against every cell, up to
//!    `max_zones_per_cell` per cell.
//! 5. Upload the cell table and index list only when the retained-set hash
//!    changed. Zone records are uploaded only when their bytes changed.
//!
//! # Index Layout
//!
//! ```text
//! indices: [NO_ZONE, z0, z3, z1, z2, z3, ...]
//!              ▲      └──┬──┘ └────┬────┘
//!              │       cell 4    cell 5
//!      every empty cell: offset 0, count 1
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use bytemuck::{Pod, Zeroable};
use glam::{DMat3, DVec3};
use serde::Deserialize;

use super::{cell_overlaps_zone, CellRange, GridMeta, Zone, ZoneGrid, ZoneKindTag};
use crate::constants::NO_ZONE;
use crate::frustum::Frustum;
use crate::packing::GrowingBuffer;
use crate::quadtree::{Rect2, SimZoneFootprint};

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ZoneGridConfig {
  /// Zones retained per frame.
  pub max_zones: usize,
  pub max_zones_per_cell: usize,
  /// Preferred cell edge. Cells grow past it to respect `max_grid_dim`.
  pub base_cell_size: f64,
  pub max_grid_dim: u32,
  /// Cells are inflated by this much in the overlap test.
  pub grid_margin: f64,
}

impl Default for ZoneGridConfig {
  fn default() -> Self {
    Self {
      max_zones: 16,
      max_zones_per_cell: 8,
      base_cell_size: 32.0,
      max_grid_dim: 32,
      grid_margin: 1.0,
    }
  }
}

/// GPU record for one retained zone, 96 bytes.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct ZoneRecord {
  pub position: [f32; 3],
  pub yaw: f32,
  pub half_size: [f32; 3],
  pub initialized: u32,
  /// Yaw rotation, columns padded to 16 bytes.
  pub rotation: [[f32; 4]; 3],
  /// Kind-specific parameters.
  pub params: [f32; 4],
}

impl ZoneRecord {
  pub fn from_zone(zone: &Zone) -> Self {
    let rotation = DMat3::from_rotation_y(zone.yaw).as_mat3();
    let column = |i: usize| {
      let c = rotation.col(i);
      [c.x, c.y, c.z, 0.0]
    };
    Self {
      position: zone.position.as_vec3().to_array(),
      yaw: zone.yaw as f32,
      half_size: (zone.size * 0.5).as_vec3().to_array(),
      initialized: zone.initialized as u32,
      rotation: [column(0), column(1), column(2)],
      params: zone.kind.params(),
    }
  }
}

/// What one clustering pass did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClusterOutcome {
  pub visible: usize,
  pub retained: usize,
  /// Cell table and index list were re-uploaded.
  pub grid_uploaded: bool,
  pub zone_data_uploaded: bool,
}

pub struct ZoneCluster {
  tag: ZoneKindTag,
  config: ZoneGridConfig,
  /// Retained zones in ID order.
  retained: Vec<Zone>,
  grid: ZoneGrid,
  meta: GridMeta,
  hash: Option<u64>,
  cells: GrowingBuffer<CellRange>,
  indices: GrowingBuffer<u32>,
  zone_data: GrowingBuffer<ZoneRecord>,
  // Scratch reused across frames.
  cell_scratch: Vec<CellRange>,
  index_scratch: Vec<u32>,
  record_scratch: Vec<ZoneRecord>,
}

impl ZoneCluster {
  pub fn new(tag: ZoneKindTag, config: ZoneGridConfig) -> Self {
    let max_cells = config.max_grid_dim.max(1).saturating_mul(config.max_grid_dim.max(1));
    let max_indices = max_cells
      .saturating_mul(config.max_zones_per_cell.max(1) as u32)
      .saturating_add(1);
    let label = match tag {
      ZoneKindTag::WaveSimulation => ("wave_cells", "wave_indices", "wave_zones"),
      ZoneKindTag::ColorWind => ("color_wind_cells", "color_wind_indices", "color_wind_zones"),
    };

    Self {
      tag,
      config,
      retained: Vec::new(),
      grid: ZoneGrid::SENTINEL,
      meta: ZoneGrid::SENTINEL.meta(0),
      hash: None,
      cells: GrowingBuffer::new(label.0, 1, max_cells),
      indices: GrowingBuffer::new(label.1, 1, max_indices),
      zone_data: GrowingBuffer::new(label.2, 0, config.max_zones as u32),
      cell_scratch: Vec::new(),
      index_scratch: Vec::new(),
      record_scratch: Vec::new(),
    }
  }

  /// Run one clustering pass over `zones` (zones of other kinds are
  /// ignored). `primary` is the position zones are ranked against.
  #[tracing::instrument(skip_all, name = "zones::cluster", fields(kind = ?self.tag))]
  pub fn cluster(
    &mut self,
    zones: &[Zone],
    frustums: &[&Frustum],
    primary: Option<DVec3>,
  ) -> ClusterOutcome {
    self.retained.clear();
    self.retained.extend(zones.iter().filter(|zone| {
      zone.tag() == self.tag && {
        let bounds = zone.bounds();
        frustums.iter().any(|frustum| frustum.intersects_aabb(&bounds))
      }
    }));
    let visible = self.retained.len();

    if let Some(origin) = primary {
      self.retained.sort_by(|a, b| {
        a.position
          .distance_squared(origin)
          .total_cmp(&b.position.distance_squared(origin))
      });
    }
    self.retained.truncate(self.config.max_zones);
    if self.tag == ZoneKindTag::ColorWind {
      self.retained.sort_by(|a, b| a.position.y.total_cmp(&b.position.y));
    }

    let hash = self.retained_hash();
    let grid_uploaded = self.hash != Some(hash);
    if grid_uploaded {
      self.rebuild_grid();
      self.cells.write(&self.cell_scratch);
      self.indices.write(&self.index_scratch);
      self.hash = Some(hash);
    }

    self.record_scratch.clear();
    self.record_scratch.extend(self.retained.iter().map(ZoneRecord::from_zone));
    let zone_data_uploaded = self.zone_data.as_slice() != self.record_scratch.as_slice()
      || self.zone_data.uploads() == 0;
    if zone_data_uploaded {
      self.zone_data.write(&self.record_scratch);
    }

    tracing::trace!(
      visible,
      retained = self.retained.len(),
      grid_uploaded,
      zone_data_uploaded,
      "Clustered zones"
    );

    ClusterOutcome {
      visible,
      retained: self.retained.len(),
      grid_uploaded,
      zone_data_uploaded,
    }
  }

  /// Identity, bounds, rotation and init flag of each retained zone, in ID
  /// order. Reordering the same set changes the hash, as it changes IDs.
  fn retained_hash(&self) -> u64 {
    let mut hasher = DefaultHasher::new();
    self.retained.len().hash(&mut hasher);
    for zone in &self.retained {
      zone.key.hash(&mut hasher);
      for value in zone.position.to_array().into_iter().chain(zone.size.to_array()) {
        value.to_bits().hash(&mut hasher);
      }
      zone.yaw.to_bits().hash(&mut hasher);
      zone.initialized.hash(&mut hasher);
    }
    hasher.finish()
  }

  fn rebuild_grid(&mut self) {
    self.cell_scratch.clear();
    self.index_scratch.clear();
    self.index_scratch.push(NO_ZONE);

    let rects: Vec<_> = self.retained.iter().map(Zone::oriented_rect).collect();
    let Some(bounds) = rects.iter().map(|r| r.bounds()).reduce(|a, b| a.union(&b)) else {
      self.grid = ZoneGrid::SENTINEL;
      self.meta = self.grid.meta(0);
      self.cell_scratch.push(CellRange { offset: 0, count: 1 });
      return;
    };

    self.grid = ZoneGrid::fit(bounds, self.config.base_cell_size, self.config.max_grid_dim);
    self.meta = self.grid.meta(self.retained.len() as u32);

    for row in 0..self.grid.rows {
      for column in 0..self.grid.columns {
        let cell = self.grid.cell_rect(column, row);
        let offset = self.index_scratch.len() as u32;
        let mut count = 0;
        for (id, rect) in rects.iter().enumerate() {
          if count >= self.config.max_zones_per_cell {
            break;
          }
          if cell_overlaps_zone(&cell, rect, self.config.grid_margin) {
            self.index_scratch.push(id as u32);
            count += 1;
          }
        }
        self.cell_scratch.push(if count == 0 {
          CellRange { offset: 0, count: 1 }
        } else {
          CellRange {
            offset,
            count: count as u32,
          }
        });
      }
    }
  }

  #[inline]
  pub fn tag(&self) -> ZoneKindTag {
    self.tag
  }

  pub fn config(&self) -> &ZoneGridConfig {
    &self.config
  }

  /// Retained zones; a zone's ID is its index here.
  pub fn retained(&self) -> &[Zone] {
    &self.retained
  }

  pub fn grid(&self) -> &ZoneGrid {
    &self.grid
  }

  pub fn meta(&self) -> &GridMeta {
    &self.meta
  }

  /// Hash of the retained set as of the last upload.
  pub fn hash(&self) -> Option<u64> {
    self.hash
  }

  pub fn cells(&self) -> &GrowingBuffer<CellRange> {
    &self.cells
  }

  pub fn indices(&self) -> &GrowingBuffer<u32> {
    &self.indices
  }

  pub fn zone_data(&self) -> &GrowingBuffer<ZoneRecord> {
    &self.zone_data
  }

  /// Zone IDs registered in a cell (empty for sentinel cells).
  pub fn cell_zones(&self, column: u32, row: u32) -> &[u32] {
    let Some(range) = self.cells.as_slice().get(self.grid.cell_index(column, row)) else {
      return &[];
    };
    let start = range.offset as usize;
    let end = start + range.count as usize;
    match self.indices.as_slice().get(start..end) {
      Some([NO_ZONE]) | None => &[],
      Some(ids) => ids,
    }
  }

  /// Retained, initialized zones: the ones that drive forced subdivision.
  pub fn active(&self) -> impl Iterator<Item = &Zone> {
    self.retained.iter().filter(|zone| zone.initialized)
  }

  pub fn active_footprints(&self) -> Vec<SimZoneFootprint> {
    self
      .active()
      .map(|zone| SimZoneFootprint {
        footprint: zone.oriented_rect().bounds(),
        center: zone.position,
        radius: zone.radius().max(1.0),
      })
      .collect()
  }

  /// Footprint of the whole retained set, if any.
  pub fn retained_bounds(&self) -> Option<Rect2> {
    self
      .retained
      .iter()
      .map(|zone| zone.oriented_rect().bounds())
      .reduce(|a, b| a.union(&b))
  }
}

#[cfg(test)]
#[path = "clustering_test.rs"]
mod clustering_test;
