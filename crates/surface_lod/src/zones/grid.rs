//! Uniform grid laid over the bounds of the retained zones.
//!
//! The grid never exceeds `max_dim` cells per axis: when the bounds are too
//! large for the base cell size, cells grow instead.

use bytemuck::{Pod, Zeroable};
use glam::DVec2;

use crate::quadtree::Rect2;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZoneGrid {
  pub origin: DVec2,
  pub world_size: DVec2,
  pub cell_size: DVec2,
  pub columns: u32,
  pub rows: u32,
}

impl ZoneGrid {
  /// Single cell at the origin, used when no zone is retained.
  pub const SENTINEL: Self = Self {
    origin: DVec2::ZERO,
    world_size: DVec2::ONE,
    cell_size: DVec2::ONE,
    columns: 1,
    rows: 1,
  };

  /// Cover `bounds` with cells of roughly `base_cell_size`, at most
  /// `max_dim` per axis and at least one.
  pub fn fit(bounds: Rect2, base_cell_size: f64, max_dim: u32) -> Self {
    let world_size = bounds.size().max(DVec2::splat(f64::EPSILON));
    let base = base_cell_size.max(f64::EPSILON);
    let max_dim = max_dim.max(1);

    let count = |extent: f64| ((extent / base).ceil() as u32).clamp(1, max_dim);
    let columns = count(world_size.x);
    let rows = count(world_size.y);

    Self {
      origin: bounds.min,
      world_size,
      cell_size: world_size / DVec2::new(columns as f64, rows as f64),
      columns,
      rows,
    }
  }

  #[inline]
  pub fn cell_count(&self) -> usize {
    self.columns as usize * self.rows as usize
  }

  /// Row-major index: rows run along +Z, columns along +X.
  #[inline]
  pub fn cell_index(&self, column: u32, row: u32) -> usize {
    row as usize * self.columns as usize + column as usize
  }

  pub fn cell_rect(&self, column: u32, row: u32) -> Rect2 {
    let min = self.origin + self.cell_size * DVec2::new(column as f64, row as f64);
    Rect2::new(min, min + self.cell_size)
  }

  /// Cell containing a world XZ point, if inside the grid.
  pub fn cell_at(&self, point: DVec2) -> Option<(u32, u32)> {
    let local = (point - self.origin) / self.cell_size;
    if local.x < 0.0 || local.y < 0.0 {
      return None;
    }
    let column = local.x.floor() as u32;
    let row = local.y.floor() as u32;
    // The max edge belongs to the last cell.
    let column = if local.x <= self.columns as f64 { column.min(self.columns - 1) } else { column };
    let row = if local.y <= self.rows as f64 { row.min(self.rows - 1) } else { row };
    (column < self.columns && row < self.rows).then_some((column, row))
  }

  pub fn meta(&self, zone_count: u32) -> GridMeta {
    GridMeta {
      origin: self.origin.as_vec2().to_array(),
      world_size: self.world_size.as_vec2().to_array(),
      cell_size: self.cell_size.as_vec2().to_array(),
      columns: self.columns,
      rows: self.rows,
      zone_count,
      _pad: [0; 3],
    }
  }
}

/// Grid description uploaded alongside the cell table, 48 bytes.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GridMeta {
  pub origin: [f32; 2],
  pub world_size: [f32; 2],
  pub cell_size: [f32; 2],
  pub columns: u32,
  pub rows: u32,
  pub zone_count: u32,
  pub _pad: [u32; 3],
}

/// Slice of the flattened zone-index list belonging to one cell.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct CellRange {
  pub offset: u32,
  pub count: u32,
}
