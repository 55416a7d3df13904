use glam::DVec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::*;
use crate::constants::{SIDE_BOTTOM, SIDE_LEFT, SIDE_RIGHT, SIDE_TOP};
use crate::frustum::{Frustum, Plane};
use crate::quadtree::{traverse, HierarchyConfig, TraversalInput, TraversalSettings};

fn build(detail_by_distance: bool) -> QuadHierarchy {
  QuadHierarchy::build(HierarchyConfig {
    far_distance: 512.0,
    min_lod_distance: 4.0,
    detail_by_distance,
    ..Default::default()
  })
}

fn visible_from(hierarchy: &QuadHierarchy, viewer: DVec3, frustum: &Frustum) -> VisibleSet {
  let input = TraversalInput {
    viewer,
    far_clip: 1.0e6,
    frustum,
    surface_height: 0.0,
    max_wave_height: 0.0,
    zones: &[],
  };
  let mut set = VisibleSet::new();
  traverse(hierarchy, &TraversalSettings::default(), &input, &mut set);
  set
}

/// Check every flag of every chunk against its definition.
fn assert_flags_consistent(hierarchy: &QuadHierarchy, set: &VisibleSet, ring: u32) {
  for chunk in set.iter() {
    let node = hierarchy.node(chunk.node);
    for side in 0..SIDE_COUNT {
      let neighbor = node.neighbors[side];
      let seam = chunk.edges.has_seam(side);
      let infinite = chunk.edges.has_infinite(side);

      assert!(!(seam && infinite), "Side {} is both seam and infinite", side);

      if seam {
        let justified = match neighbor {
          None => !hierarchy.is_boundary_side(chunk.node, side),
          Some(m) => !set.contains(m) && set.contains(hierarchy.node(m).parent),
        };
        assert!(justified, "Unjustified seam on side {} of {:?}", side, chunk.node);
      }
      if infinite {
        assert!(neighbor.is_none());
        assert!(node.depth <= ring);
      }
    }
  }
}

#[test]
fn test_bit_layout() {
  assert_eq!(EdgeFlags::seam(SIDE_LEFT).bits(), 0b0000_0001);
  assert_eq!(EdgeFlags::seam(SIDE_BOTTOM).bits(), 0b0000_1000);
  assert_eq!(EdgeFlags::infinite(SIDE_LEFT).bits(), 0b0001_0000);
  assert_eq!(EdgeFlags::infinite(SIDE_BOTTOM).bits(), 0b1000_0000);
  assert_eq!(EdgeFlags::SEAMS.bits(), 0x0f);
  assert_eq!(EdgeFlags::INFINITE.bits(), 0xf0);
}

#[test]
fn test_counts() {
  let flags = EdgeFlags::SEAM_LEFT | EdgeFlags::SEAM_TOP | EdgeFlags::INFINITE_RIGHT;
  assert_eq!(flags.seam_count(), 2);
  assert_eq!(flags.infinite_count(), 1);
  assert!(flags.has_seam(SIDE_TOP));
  assert!(!flags.has_seam(SIDE_RIGHT));
  assert!(flags.has_infinite(SIDE_RIGHT));
}

/// Seeded sweep over viewers: flags always match the neighbor rules.
#[test]
fn test_flags_consistent_for_random_viewers() {
  let hierarchy = build(true);
  let ring = TraversalSettings::default().infinite_ring_depth;
  let mut rng = StdRng::seed_from_u64(7);

  for _ in 0..16 {
    let viewer = DVec3::new(
      rng.random_range(-500.0..500.0),
      rng.random_range(0.5..60.0),
      rng.random_range(-500.0..500.0),
    );
    let yaw: f64 = rng.random_range(0.0..std::f64::consts::TAU);
    let frustum = Frustum::perspective(
      viewer,
      DVec3::new(yaw.sin(), -0.25, yaw.cos()),
      70f64.to_radians(),
      16.0 / 9.0,
      0.1,
      3000.0,
    );
    let set = visible_from(&hierarchy, viewer, &frustum);
    assert_flags_consistent(&hierarchy, &set, ring);
  }
}

/// Where a finer chunk borders a coarser one, the finer side is welded.
#[test]
fn test_finer_chunk_seams_against_coarser_neighbor() {
  let hierarchy = build(true);
  let open = Frustum::new([Plane::new(DVec3::Y, 1.0e12); 6]);
  let set = visible_from(&hierarchy, DVec3::new(0.0, 2.0, 0.0), &open);

  let mut welded = 0;
  for chunk in set.iter() {
    let node = hierarchy.node(chunk.node);
    for side in 0..SIDE_COUNT {
      let Some(neighbor) = node.neighbors[side] else {
        continue;
      };
      let parent = hierarchy.node(neighbor).parent;
      if set.contains(parent) {
        assert!(chunk.edges.has_seam(side));
        welded += 1;
      }
    }
  }
  assert!(welded > 0, "A viewer near the center must produce level changes");
}

/// Pruned trees: a missing inner neighbor means a coarser leaf is across
/// the edge.
#[test]
fn test_pruned_tree_inner_gaps_are_seams() {
  let hierarchy = build(false);
  let open = Frustum::new([Plane::new(DVec3::Y, 1.0e12); 6]);
  let set = visible_from(&hierarchy, DVec3::new(0.0, 1.0, 0.0), &open);
  let ring = TraversalSettings::default().infinite_ring_depth;

  assert_flags_consistent(&hierarchy, &set, ring);

  let mut gaps = 0;
  for chunk in set.iter() {
    let node = hierarchy.node(chunk.node);
    for side in 0..SIDE_COUNT {
      if node.neighbors[side].is_none() && !hierarchy.is_boundary_side(chunk.node, side) {
        assert!(chunk.edges.has_seam(side));
        gaps += 1;
      }
    }
  }
  assert!(gaps > 0, "Fixed cutoffs should leave coarser leaves beside finer ones");
}

/// Only boundary sides within the ring depth are infinite.
#[test]
fn test_infinite_flags_respect_ring_depth() {
  let hierarchy = build(true);
  let open = Frustum::new([Plane::new(DVec3::Y, 1.0e12); 6]);
  let set = visible_from(&hierarchy, DVec3::new(0.0, 2.0, 0.0), &open);

  for chunk in set.iter() {
    let node = hierarchy.node(chunk.node);
    let flags = edge_flags(&hierarchy, chunk.node, &set, 0);
    assert_eq!(flags.infinite_count(), 0, "Depth {} flagged with ring 0", node.depth);

    let all = edge_flags(&hierarchy, chunk.node, &set, u32::MAX);
    for side in [SIDE_LEFT, SIDE_RIGHT, SIDE_TOP, SIDE_BOTTOM] {
      assert_eq!(
        all.has_infinite(side),
        hierarchy.is_boundary_side(chunk.node, side),
        "Boundary side {} at {:?}",
        side,
        node.center
      );
    }
  }
}
