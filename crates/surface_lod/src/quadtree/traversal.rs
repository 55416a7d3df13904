//! Per-viewer visibility and LOD traversal.
//!
//! Walks the static hierarchy from the root once per refresh. Every node is
//! classified as one of:
//!
//! ```text
//! NotVisible     outside the frustum, or a leaf beyond twice the far clip
//! NotVisibleLod  farther than its depth's LOD distance (parent renders it)
//! Visible        a rendered leaf, or an interior node whose subtree renders
//! ```
//!
//! A child reporting `NotVisibleLod` is added to the visible set in place of
//! its finer descendants. A node is therefore never rendered together with
//! one of its ancestors, and no two rendered nodes overlap.
//!
//! Nodes that overlap an active wave-simulation zone are force-subdivided
//! within a depth band that narrows as the viewer approaches the zone.

use std::collections::HashSet;

use glam::{DVec2, DVec3};
use serde::Deserialize;

use super::{edge_flags, EdgeFlags, NodeId, QuadHierarchy, QuadNode, Rect2};
use crate::constants::{HORIZON_EXTENT, SIDE_BOTTOM, SIDE_COUNT, SIDE_LEFT, SIDE_RIGHT, SIDE_TOP};
use crate::frustum::Frustum;

/// Tunables for the traversal. Shared by every viewer of a surface.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct TraversalSettings {
  /// Horizontal margin added to every node box before culling, covering
  /// horizontal wave displacement.
  pub horizontal_displacement_margin: f64,
  /// Scale applied to the current max wave height for the culling margin.
  pub wave_height_multiplier: f64,
  /// Nodes at or above this depth (outer rings) stretch missing boundary
  /// sides toward the horizon.
  pub infinite_ring_depth: u32,
  /// Shallowest depth forced subdivision applies to.
  pub forced_subdivision_min_depth: u32,
  /// Vertical band around a simulation zone inside which the viewer counts
  /// as being at the zone.
  pub zone_vertical_band: f64,
  /// Camera distance used for nodes overlapping a zone the viewer is in.
  pub zone_detail_distance: f64,
}

impl Default for TraversalSettings {
  fn default() -> Self {
    Self {
      horizontal_displacement_margin: 4.0,
      wave_height_multiplier: 1.5,
      infinite_ring_depth: 2,
      forced_subdivision_min_depth: 3,
      zone_vertical_band: 10.0,
      zone_detail_distance: 0.0,
    }
  }
}

/// Horizontal footprint of an active wave-simulation zone, as seen by the
/// traversal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimZoneFootprint {
  /// Axis-aligned bounds of the zone's oriented rectangle.
  pub footprint: Rect2,
  /// World-space zone center.
  pub center: DVec3,
  /// Horizontal radius (half the larger edge, at least 1).
  pub radius: f64,
}

/// Per-refresh inputs for one viewer.
#[derive(Clone, Copy, Debug)]
pub struct TraversalInput<'a> {
  pub viewer: DVec3,
  pub far_clip: f64,
  pub frustum: &'a Frustum,
  /// Surface height under the viewer. Node boxes follow it vertically.
  pub surface_height: f64,
  pub max_wave_height: f64,
  /// Active (retained and initialized) simulation zones.
  pub zones: &'a [SimZoneFootprint],
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeVisibility {
  NotVisible,
  NotVisibleLod,
  Visible,
}

/// One rendered node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VisibleChunk {
  pub node: NodeId,
  /// Filled in once the whole set is known.
  pub edges: EdgeFlags,
  /// Camera distance at the time of the refresh.
  pub distance: f64,
}

/// Visible nodes of one refresh, in insertion order.
#[derive(Clone, Debug, Default)]
pub struct VisibleSet {
  chunks: Vec<VisibleChunk>,
  members: HashSet<NodeId>,
}

impl VisibleSet {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn clear(&mut self) {
    self.chunks.clear();
    self.members.clear();
  }

  fn insert(&mut self, node: NodeId, distance: f64) {
    if self.members.insert(node) {
      self.chunks.push(VisibleChunk {
        node,
        edges: EdgeFlags::empty(),
        distance,
      });
    }
  }

  #[inline]
  pub fn contains(&self, node: NodeId) -> bool {
    self.members.contains(&node)
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.chunks.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.chunks.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = &VisibleChunk> {
    self.chunks.iter()
  }

  pub fn as_slice(&self) -> &[VisibleChunk] {
    &self.chunks
  }

  fn resolve_edges(&mut self, hierarchy: &QuadHierarchy, infinite_ring_depth: u32) {
    let edges: Vec<EdgeFlags> = self
      .chunks
      .iter()
      .map(|chunk| edge_flags(hierarchy, chunk.node, self, infinite_ring_depth))
      .collect();
    for (chunk, flags) in self.chunks.iter_mut().zip(edges) {
      chunk.edges = flags;
    }
  }
}

/// Depth up to which nodes overlapping a zone are force-subdivided.
///
/// `min_depth + floor(log2(1 + d / r))`, clamped to `[min_depth, max_depth]`,
/// where `d` is the viewer's distance to the zone center and `r` the zone
/// radius. The band shrinks as the viewer closes in, where plain distance
/// already refines the area.
pub fn forced_subdivision_cutoff(
  viewer: DVec3,
  zone: &SimZoneFootprint,
  min_depth: u32,
  max_depth: u32,
) -> u32 {
  let radius = zone.radius.max(1.0);
  let ratio = viewer.distance(zone.center) / radius;
  let extra = (1.0 + ratio).log2().floor().max(0.0) as u32;
  (min_depth + extra).clamp(min_depth, max_depth.max(min_depth))
}

/// Rebuild `out` for one viewer and resolve edge flags on every chunk.
#[tracing::instrument(skip_all, name = "quadtree::traverse")]
pub fn traverse(
  hierarchy: &QuadHierarchy,
  settings: &TraversalSettings,
  input: &TraversalInput<'_>,
  out: &mut VisibleSet,
) {
  out.clear();

  let cutoffs: Vec<u32> = input
    .zones
    .iter()
    .map(|zone| {
      forced_subdivision_cutoff(
        input.viewer,
        zone,
        settings.forced_subdivision_min_depth,
        hierarchy.max_depth(),
      )
    })
    .collect();

  let mut walk = Walk {
    hierarchy,
    settings,
    input,
    cutoffs: &cutoffs,
    out: &mut *out,
  };
  // The root threshold is infinite, so it never reports NotVisibleLod.
  walk.visit(NodeId::ROOT);

  out.resolve_edges(hierarchy, settings.infinite_ring_depth);
}

struct Walk<'a, 'b> {
  hierarchy: &'a QuadHierarchy,
  settings: &'a TraversalSettings,
  input: &'a TraversalInput<'b>,
  cutoffs: &'a [u32],
  out: &'a mut VisibleSet,
}

impl Walk<'_, '_> {
  fn visit(&mut self, id: NodeId) -> (NodeVisibility, f64) {
    let hierarchy = self.hierarchy;
    let node = hierarchy.node(id);
    let rect = self.horizon_rect(id, node);

    let margin = self.settings.horizontal_displacement_margin
      + self.input.max_wave_height * self.settings.wave_height_multiplier;
    let surface = self.input.surface_height;
    let aabb = rect.inflate(margin).extrude(surface - margin, surface + margin);
    if !self.input.frustum.intersects_aabb(&aabb) {
      return (NodeVisibility::NotVisible, f64::INFINITY);
    }

    let distance = self.camera_distance(node, &rect);
    let threshold = hierarchy.distances().get(node.depth);
    if distance > threshold && !self.is_forced(node) {
      return (NodeVisibility::NotVisibleLod, distance);
    }

    let Some(children) = node.children else {
      if distance <= self.input.far_clip * 2.0 {
        self.out.insert(id, distance);
        return (NodeVisibility::Visible, distance);
      }
      return (NodeVisibility::NotVisible, distance);
    };

    for child in children {
      let (visibility, child_distance) = self.visit(child);
      if visibility == NodeVisibility::NotVisibleLod {
        self.out.insert(child, child_distance);
      }
    }
    (NodeVisibility::Visible, distance)
  }

  /// Node footprint, with boundary sides of outer-ring nodes pushed out to
  /// the horizon.
  fn horizon_rect(&self, id: NodeId, node: &QuadNode) -> Rect2 {
    let mut rect = node.rect();
    if node.depth > self.settings.infinite_ring_depth {
      return rect;
    }
    for side in 0..SIDE_COUNT {
      if node.neighbors[side].is_some() || !self.hierarchy.is_boundary_side(id, side) {
        continue;
      }
      match side {
        SIDE_LEFT => rect.min.x -= HORIZON_EXTENT,
        SIDE_RIGHT => rect.max.x += HORIZON_EXTENT,
        SIDE_TOP => rect.max.y += HORIZON_EXTENT,
        SIDE_BOTTOM => rect.min.y -= HORIZON_EXTENT,
        _ => {}
      }
    }
    rect
  }

  fn camera_distance(&self, node: &QuadNode, rect: &Rect2) -> f64 {
    let viewer = self.input.viewer;
    let viewer_xz = DVec2::new(viewer.x, viewer.z);

    let band = self.settings.zone_vertical_band;
    let node_rect = node.rect();
    let at_zone = self.input.zones.iter().any(|zone| {
      zone.footprint.overlaps(&node_rect)
        && (viewer.y - zone.center.y).abs() <= band
        && zone.footprint.inflate(band).contains_point(viewer_xz)
    });
    if at_zone {
      return self.settings.zone_detail_distance;
    }

    let horizontal = rect.distance_to_point(viewer_xz);
    let vertical = (viewer.y - self.input.surface_height).abs();
    (horizontal * horizontal + vertical * vertical).sqrt()
  }

  fn is_forced(&self, node: &QuadNode) -> bool {
    if node.depth < self.settings.forced_subdivision_min_depth || node.is_leaf() {
      return false;
    }
    let node_rect = node.rect();
    self
      .input
      .zones
      .iter()
      .zip(self.cutoffs)
      .any(|(zone, cutoff)| node.depth <= *cutoff && zone.footprint.overlaps(&node_rect))
  }
}

#[cfg(test)]
#[path = "traversal_test.rs"]
mod traversal_test;
