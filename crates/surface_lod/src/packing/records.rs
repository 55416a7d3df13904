//! Fixed-layout GPU records written by packing.

use bytemuck::{Pod, Zeroable};

/// One visible chunk, 32 bytes.
///
/// `position` is relative to the viewer's snapshot origin so it stays
/// precise in `f32` far from the world origin.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct InstanceRecord {
  pub position: [f32; 3],
  /// Edge length in world units.
  pub size: f32,
  /// `EdgeFlags` bits: seams in 0..4, infinite edges in 4..8.
  pub edge_mask: u32,
  pub depth: u32,
  pub _pad: [u32; 2],
}

/// Indexed indirect draw arguments, laid out as graphics APIs expect them.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct DrawIndexedIndirectArgs {
  pub index_count: u32,
  pub instance_count: u32,
  pub first_index: u32,
  pub base_vertex: i32,
  pub first_instance: u32,
}
