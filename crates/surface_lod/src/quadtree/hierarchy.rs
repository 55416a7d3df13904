//! QuadHierarchy - the static quadtree tiling the whole surface.
//!
//! Built once per [`HierarchyConfig`]. After construction the hierarchy is
//! read-only and shared by every viewer of the surface.
//!
//! # Construction
//!
//! 1. **Subdivide** top-down from the root until the depth limit, or, with
//!    detail-by-distance disabled, until a node center lies beyond its
//!    level distance from the root center.
//! 2. **Register** every node in a per-depth `coord -> node` index. The coord
//!    comes from projecting the node center into the root extents and
//!    bucketing into `2^depth` cells per axis.
//! 3. **Resolve neighbors** in one pass per depth by looking up the four
//!    adjacent buckets.

use std::collections::HashMap;

use glam::{DVec2, IVec2};

use super::{HierarchyConfig, LodDistances, NodeId, QuadNode, Rect2};
use crate::constants::{SIDE_BOTTOM, SIDE_COUNT, SIDE_LEFT, SIDE_OFFSETS, SIDE_RIGHT, SIDE_TOP};

pub struct QuadHierarchy {
  config: HierarchyConfig,
  distances: LodDistances,
  root_rect: Rect2,
  /// Arena. `NodeId::ROOT` is index 0.
  nodes: Vec<QuadNode>,
  /// Neighbor index: one map per depth.
  by_coord: Vec<HashMap<IVec2, NodeId>>,
}

impl QuadHierarchy {
  #[tracing::instrument(skip_all, name = "quadtree::build")]
  pub fn build(config: HierarchyConfig) -> Self {
    debug_assert!(
      config.far_distance > 0.0 && config.far_distance.is_finite(),
      "Surface bounds must be non-zero and finite"
    );

    let distances = config.lod_distances();
    let root_rect = config.root_rect();
    let max_depth = distances.max_depth();

    let mut hierarchy = Self {
      config,
      distances,
      root_rect,
      nodes: Vec::new(),
      by_coord: vec![HashMap::new(); max_depth as usize + 1],
    };

    let root = hierarchy.push_node(0, config.center, config.total_size(), NodeId::ROOT);
    debug_assert_eq!(root, NodeId::ROOT);
    hierarchy.subdivide(root);
    hierarchy.resolve_neighbors();

    tracing::debug!(
      nodes = hierarchy.nodes.len(),
      max_depth,
      detail_by_distance = config.detail_by_distance,
      "Built surface hierarchy"
    );

    hierarchy
  }

  fn push_node(&mut self, depth: u32, center: DVec2, size: f64, parent: NodeId) -> NodeId {
    let id = NodeId(self.nodes.len() as u32);
    let coord = self.bucket_coord(center, depth);
    self.nodes.push(QuadNode {
      depth,
      center,
      size,
      parent,
      children: None,
      neighbors: [None; SIDE_COUNT],
      coord,
    });
    self.by_coord[depth as usize].insert(coord, id);
    id
  }

  /// Project `center` into the root extents and bucket it at `depth`.
  fn bucket_coord(&self, center: DVec2, depth: u32) -> IVec2 {
    let cells = (1i64 << depth) as f64;
    let uv = (center - self.root_rect.min) / self.root_rect.size();
    let max_index = (1i32 << depth) - 1;
    IVec2::new(
      ((uv.x * cells).floor() as i32).clamp(0, max_index),
      ((uv.y * cells).floor() as i32).clamp(0, max_index),
    )
  }

  fn should_subdivide(&self, id: NodeId) -> bool {
    let node = &self.nodes[id.index()];
    if node.depth >= self.distances.max_depth() {
      return false;
    }
    if !self.config.detail_by_distance {
      if node.center.distance(self.config.center) > self.distances.get(node.depth) {
        return false;
      }
    }
    true
  }

  fn subdivide(&mut self, id: NodeId) {
    if !self.should_subdivide(id) {
      return;
    }

    let (depth, size, centers) = {
      let node = &self.nodes[id.index()];
      let centers: [DVec2; 4] = std::array::from_fn(|q| node.child_center(q as u8));
      (node.depth, node.size, centers)
    };

    let children: [NodeId; 4] =
      std::array::from_fn(|q| self.push_node(depth + 1, centers[q], size * 0.5, id));
    self.nodes[id.index()].children = Some(children);

    for child in children {
      self.subdivide(child);
    }
  }

  fn resolve_neighbors(&mut self) {
    for depth_map in &self.by_coord {
      for (coord, id) in depth_map {
        let node = &mut self.nodes[id.index()];
        for (side, (dx, dz)) in SIDE_OFFSETS.iter().enumerate() {
          node.neighbors[side] = depth_map.get(&(*coord + IVec2::new(*dx, *dz))).copied();
        }
      }
    }
  }

  pub fn config(&self) -> &HierarchyConfig {
    &self.config
  }

  pub fn distances(&self) -> &LodDistances {
    &self.distances
  }

  /// Deepest level any node can have.
  #[inline]
  pub fn max_depth(&self) -> u32 {
    self.distances.max_depth()
  }

  #[inline]
  pub fn root(&self) -> &QuadNode {
    &self.nodes[NodeId::ROOT.index()]
  }

  pub fn root_rect(&self) -> Rect2 {
    self.root_rect
  }

  #[inline]
  pub fn node(&self, id: NodeId) -> &QuadNode {
    &self.nodes[id.index()]
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = (NodeId, &QuadNode)> {
    self
      .nodes
      .iter()
      .enumerate()
      .map(|(i, node)| (NodeId(i as u32), node))
  }

  /// Look up the node occupying `coord` at `depth`.
  pub fn node_at(&self, depth: u32, coord: IVec2) -> Option<NodeId> {
    self
      .by_coord
      .get(depth as usize)
      .and_then(|map| map.get(&coord).copied())
  }

  pub fn nodes_at_depth(&self, depth: u32) -> impl Iterator<Item = NodeId> + '_ {
    self
      .by_coord
      .get(depth as usize)
      .into_iter()
      .flat_map(|map| map.values().copied())
  }

  /// True when `side` of the node lies on the outer edge of the root.
  pub fn is_boundary_side(&self, id: NodeId, side: usize) -> bool {
    let node = self.node(id);
    let last = (1i32 << node.depth) - 1;
    match side {
      SIDE_LEFT => node.coord.x == 0,
      SIDE_RIGHT => node.coord.x == last,
      SIDE_TOP => node.coord.y == last,
      SIDE_BOTTOM => node.coord.y == 0,
      _ => false,
    }
  }
}

#[cfg(test)]
#[path = "hierarchy_test.rs"]
mod hierarchy_test;
