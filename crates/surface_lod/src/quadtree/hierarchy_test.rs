use super::*;
use crate::constants::MAX_DEPTH_LIMIT;

fn small_config() -> HierarchyConfig {
  HierarchyConfig {
    center: DVec2::ZERO,
    far_distance: 512.0,
    surface_level: 0.0,
    min_lod_distance: 16.0,
    max_depth: MAX_DEPTH_LIMIT,
    detail_by_distance: true,
  }
}

fn opposite(side: usize) -> usize {
  match side {
    SIDE_LEFT => SIDE_RIGHT,
    SIDE_RIGHT => SIDE_LEFT,
    SIDE_TOP => SIDE_BOTTOM,
    _ => SIDE_TOP,
  }
}

/// Full tree: 1 + 4 + 16 + ... nodes.
#[test]
fn test_full_tree_node_count() {
  let hierarchy = QuadHierarchy::build(small_config());
  // 1024 / 2^(d+1) <= 16 at d = 5
  assert_eq!(hierarchy.max_depth(), 5);
  let expected: usize = (0..=5).map(|d| 1usize << (2 * d)).sum();
  assert_eq!(hierarchy.len(), expected);
}

/// Root is its own parent and spans the configured bounds.
#[test]
fn test_root() {
  let hierarchy = QuadHierarchy::build(small_config());
  let root = hierarchy.root();
  assert_eq!(root.depth, 0);
  assert_eq!(root.parent, NodeId::ROOT);
  assert_eq!(root.size, 1024.0);
  assert_eq!(root.coord, IVec2::ZERO);
  assert!(root.neighbors.iter().all(|n| n.is_none()));
}

/// At every depth, node areas sum to the root area and no two nodes overlap.
#[test]
fn test_depth_levels_cover_root_exactly() {
  let hierarchy = QuadHierarchy::build(small_config());
  let root_area = hierarchy.root_rect().area();

  for depth in 0..=hierarchy.max_depth() {
    let ids: Vec<_> = hierarchy.nodes_at_depth(depth).collect();
    let area: f64 = ids.iter().map(|id| hierarchy.node(*id).rect().area()).sum();
    assert_eq!(area, root_area, "Depth {} does not cover the root", depth);

    // Distinct coords at the same depth imply disjoint cells.
    let mut coords: Vec<_> = ids.iter().map(|id| hierarchy.node(*id).coord).collect();
    coords.sort_by_key(|c| (c.x, c.y));
    coords.dedup();
    assert_eq!(coords.len(), ids.len(), "Duplicate coords at depth {}", depth);
  }
}

/// Children exactly tile their parent.
#[test]
fn test_children_union_equals_parent() {
  let hierarchy = QuadHierarchy::build(small_config());
  for (id, node) in hierarchy.iter() {
    let Some(children) = node.children else {
      continue;
    };
    let union = children
      .iter()
      .map(|c| hierarchy.node(*c).rect())
      .reduce(|a, b| a.union(&b))
      .unwrap();
    assert_eq!(union, node.rect(), "Children of {:?} do not tile it", id);

    let area: f64 = children.iter().map(|c| hierarchy.node(*c).rect().area()).sum();
    assert_eq!(area, node.rect().area());

    for child in children {
      assert_eq!(hierarchy.node(child).parent, id);
      assert_eq!(hierarchy.node(child).depth, node.depth + 1);
    }
  }
}

/// Projected bucket coords agree with the parent-derived coords.
#[test]
fn test_coords_follow_quadrant_bits() {
  let hierarchy = QuadHierarchy::build(small_config());
  for (_, node) in hierarchy.iter() {
    let Some(children) = node.children else {
      continue;
    };
    for (q, child) in children.iter().enumerate() {
      let expected = node.coord * 2 + IVec2::new((q & 1) as i32, ((q >> 1) & 1) as i32);
      assert_eq!(hierarchy.node(*child).coord, expected);
    }
  }
}

/// n.left = m implies m.right = n, and the same for top/bottom.
#[test]
fn test_neighbor_symmetry() {
  let hierarchy = QuadHierarchy::build(small_config());
  for (id, node) in hierarchy.iter() {
    for side in 0..SIDE_COUNT {
      if let Some(neighbor) = node.neighbors[side] {
        assert_eq!(
          hierarchy.node(neighbor).neighbors[opposite(side)],
          Some(id),
          "Asymmetric neighbor link on side {} of {:?}",
          side,
          id
        );
        assert_eq!(hierarchy.node(neighbor).depth, node.depth);
      }
    }
  }
}

/// In a full tree, a missing neighbor only happens on the outer boundary.
#[test]
fn test_missing_neighbors_only_at_boundary_in_full_tree() {
  let hierarchy = QuadHierarchy::build(small_config());
  for (id, node) in hierarchy.iter() {
    for side in 0..SIDE_COUNT {
      assert_eq!(
        node.neighbors[side].is_none(),
        hierarchy.is_boundary_side(id, side),
        "Side {} of {:?} at depth {}",
        side,
        id,
        node.depth
      );
    }
  }
}

/// Neighbor on the right sits one node-size along +X.
#[test]
fn test_neighbor_geometry() {
  let hierarchy = QuadHierarchy::build(small_config());
  for (_, node) in hierarchy.iter() {
    if let Some(right) = node.neighbors[SIDE_RIGHT] {
      let delta = hierarchy.node(right).center - node.center;
      assert_eq!(delta, DVec2::new(node.size, 0.0));
    }
    if let Some(top) = node.neighbors[SIDE_TOP] {
      let delta = hierarchy.node(top).center - node.center;
      assert_eq!(delta, DVec2::new(0.0, node.size));
    }
  }
}

/// Fixed cutoffs stop subdividing nodes whose center lies beyond their level
/// distance.
#[test]
fn test_fixed_cutoffs_prune_far_nodes() {
  let full = QuadHierarchy::build(small_config());
  let pruned = QuadHierarchy::build(HierarchyConfig {
    detail_by_distance: false,
    ..small_config()
  });

  assert!(pruned.len() < full.len());

  let distances = pruned.distances().clone();
  for (_, node) in pruned.iter() {
    let from_center = node.center.distance(DVec2::ZERO);
    if node.children.is_some() {
      assert!(
        from_center <= distances.get(node.depth),
        "Node at depth {} subdivided beyond its distance",
        node.depth
      );
    } else if node.depth < pruned.max_depth() {
      assert!(from_center > distances.get(node.depth));
    }
  }

  // Quadrant centers sit sqrt(2) * size / 4 from the root center, past the
  // size / 4 cutoff of depth 1.
  assert_eq!(pruned.len(), 5);
  assert!(pruned.nodes_at_depth(1).all(|id| pruned.node(id).is_leaf()));
}

/// Pruned trees still tile the root with their leaves and keep symmetry.
#[test]
fn test_pruned_tree_leaves_cover_root() {
  let pruned = QuadHierarchy::build(HierarchyConfig {
    detail_by_distance: false,
    ..small_config()
  });
  let leaf_area: f64 = pruned
    .iter()
    .filter(|(_, n)| n.is_leaf())
    .map(|(_, n)| n.rect().area())
    .sum();
  assert_eq!(leaf_area, pruned.root_rect().area());

  for (id, node) in pruned.iter() {
    for side in 0..SIDE_COUNT {
      if let Some(neighbor) = node.neighbors[side] {
        assert_eq!(pruned.node(neighbor).neighbors[opposite(side)], Some(id));
      }
    }
  }
}

/// Offset centers keep coords in range.
#[test]
fn test_offset_center_lookup() {
  let hierarchy = QuadHierarchy::build(HierarchyConfig {
    center: DVec2::new(5000.0, -3000.0),
    ..small_config()
  });
  let root = hierarchy.root();
  assert_eq!(root.center, DVec2::new(5000.0, -3000.0));

  let corner = hierarchy.node_at(2, IVec2::new(3, 0)).unwrap();
  let node = hierarchy.node(corner);
  assert!(hierarchy.is_boundary_side(corner, SIDE_RIGHT));
  assert!(hierarchy.is_boundary_side(corner, SIDE_BOTTOM));
  assert!(!hierarchy.is_boundary_side(corner, SIDE_LEFT));
  assert_eq!(node.center, DVec2::new(5000.0 + 384.0, -3000.0 - 384.0));
}

#[test]
fn test_depth_zero_is_single_leaf() {
  let hierarchy = QuadHierarchy::build(HierarchyConfig {
    min_lod_distance: 10_000.0,
    ..small_config()
  });
  assert_eq!(hierarchy.len(), 1);
  assert!(hierarchy.root().is_leaf());
}
