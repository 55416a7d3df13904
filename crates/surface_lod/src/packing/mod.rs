//! Instance packing: visible set → GPU-ready records.
//!
//! Chunks are ordered nearest-first before the per-viewer cap applies, so a
//! clamped frame loses its farthest chunks.

mod buffer;
mod mesh;
mod records;
mod tiers;

pub use buffer::{BufferId, GrowingBuffer};
pub use mesh::ChunkMesh;
pub use records::{DrawIndexedIndirectArgs, InstanceRecord};
pub use tiers::{DetailTier, DetailTierTable};

use glam::DVec3;

use crate::quadtree::{QuadHierarchy, VisibleChunk};

/// Serialize `chunks` into instance records relative to `origin`, keeping at
/// most `max_instances` of the nearest.
pub fn pack_instances(
  hierarchy: &QuadHierarchy,
  chunks: &[VisibleChunk],
  origin: DVec3,
  surface_height: f64,
  max_instances: usize,
  out: &mut Vec<InstanceRecord>,
) {
  out.clear();

  let mut order: Vec<&VisibleChunk> = chunks.iter().collect();
  order.sort_by(|a, b| a.distance.total_cmp(&b.distance));
  order.truncate(max_instances);

  out.extend(order.into_iter().map(|chunk| {
    let node = hierarchy.node(chunk.node);
    InstanceRecord {
      position: [
        (node.center.x - origin.x) as f32,
        (surface_height - origin.y) as f32,
        (node.center.y - origin.z) as f32,
      ],
      size: node.size as f32,
      edge_mask: chunk.edges.bits(),
      depth: node.depth,
      _pad: [0; 2],
    }
  }));
}

/// Indirect draw of `instance_count` copies of `mesh`.
#[inline]
pub fn draw_args(mesh: &ChunkMesh, instance_count: u32) -> DrawIndexedIndirectArgs {
  DrawIndexedIndirectArgs {
    index_count: mesh.index_count(),
    instance_count,
    first_index: 0,
    base_vertex: 0,
    first_instance: 0,
  }
}
