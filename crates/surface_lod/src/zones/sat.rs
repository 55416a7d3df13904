//! Separating-axis test between an axis-aligned grid cell and a rotated zone.
//!
//! Two convex rectangles are disjoint iff some axis among the four edge
//! normals separates their projections. The cell is inflated by `margin`
//! so zones just outside a cell still register in it.

use glam::DVec2;

use super::OrientedRect;
use crate::quadtree::Rect2;

pub fn cell_overlaps_zone(cell: &Rect2, zone: &OrientedRect, margin: f64) -> bool {
  let cell_half = cell.size() * 0.5 + DVec2::splat(margin);
  let offset = zone.center - cell.center();

  // Cell axes.
  let zone_on_x = zone.u.x.abs() * zone.half_extents.x + zone.v.x.abs() * zone.half_extents.y;
  if offset.x.abs() > cell_half.x + zone_on_x {
    return false;
  }
  let zone_on_z = zone.u.y.abs() * zone.half_extents.x + zone.v.y.abs() * zone.half_extents.y;
  if offset.y.abs() > cell_half.y + zone_on_z {
    return false;
  }

  // Zone axes.
  for (axis, zone_half) in [(zone.u, zone.half_extents.x), (zone.v, zone.half_extents.y)] {
    let cell_on_axis = cell_half.x * axis.x.abs() + cell_half.y * axis.y.abs();
    if offset.dot(axis).abs() > zone_half + cell_on_axis {
      return false;
    }
  }

  true
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::f64::consts::FRAC_PI_4;

  fn unit_cell(min: DVec2) -> Rect2 {
    Rect2::new(min, min + DVec2::ONE)
  }

  #[test]
  fn test_axis_aligned_overlap() {
    let zone = OrientedRect::new(DVec2::new(0.5, 0.5), DVec2::splat(0.25), 0.0);
    assert!(cell_overlaps_zone(&unit_cell(DVec2::ZERO), &zone, 0.0));
    assert!(!cell_overlaps_zone(&unit_cell(DVec2::new(2.0, 0.0)), &zone, 0.0));
  }

  /// A diamond whose bounding box touches the cell corner, but whose body
  /// does not, is only separated by a zone axis.
  #[test]
  fn test_rotated_zone_separated_on_own_axis() {
    let zone = OrientedRect::new(DVec2::new(2.0, 2.0), DVec2::splat(0.75), FRAC_PI_4);
    let cell = unit_cell(DVec2::ZERO);
    assert!(zone.bounds().overlaps(&cell));
    assert!(!cell_overlaps_zone(&cell, &zone, 0.0));
  }

  #[test]
  fn test_margin_catches_near_miss() {
    let zone = OrientedRect::new(DVec2::new(1.6, 0.5), DVec2::splat(0.5), 0.0);
    let cell = unit_cell(DVec2::ZERO);
    assert!(!cell_overlaps_zone(&cell, &zone, 0.0));
    assert!(cell_overlaps_zone(&cell, &zone, 0.2));
  }

  #[test]
  fn test_zone_containing_cell() {
    let zone = OrientedRect::new(DVec2::ZERO, DVec2::splat(50.0), 0.3);
    assert!(cell_overlaps_zone(&unit_cell(DVec2::new(3.0, -2.0)), &zone, 0.0));
  }
}
