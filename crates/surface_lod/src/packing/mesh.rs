//! ChunkMesh - the unit grid every visible chunk instances.
//!
//! ```text
//!  (-0.5, +0.5)          (+0.5, +0.5)
//!       ┌────┬────┬────┐
//!       │ ╲  │ ╲  │ ╲  │   resolution = 3
//!       ├────┼────┼────┤   (res + 1)^2 vertices
//!       │ ╲  │ ╲  │ ╲  │   res * res * 6 indices
//!       ├────┼────┼────┤
//!       │ ╲  │ ╲  │ ╲  │
//!       └────┴────┴────┘
//!  (-0.5, -0.5)          (+0.5, -0.5)
//! ```
//!
//! The shader scales by the instance size, offsets by the instance
//! position, and snaps odd edge vertices where the edge mask has a seam.

#[derive(Clone, Debug, PartialEq)]
pub struct ChunkMesh {
  pub resolution: u32,
  /// XZ grid at y = 0.
  pub positions: Vec<[f32; 3]>,
  pub indices: Vec<u32>,
}

impl ChunkMesh {
  pub fn grid(resolution: u32) -> Self {
    let resolution = resolution.max(1);
    let row = resolution + 1;
    let step = 1.0 / resolution as f32;

    let mut positions = Vec::with_capacity((row * row) as usize);
    for z in 0..row {
      for x in 0..row {
        positions.push([x as f32 * step - 0.5, 0.0, z as f32 * step - 0.5]);
      }
    }

    let mut indices = Vec::with_capacity((resolution * resolution * 6) as usize);
    for z in 0..resolution {
      for x in 0..resolution {
        let i0 = z * row + x;
        let i1 = i0 + 1;
        let i2 = i0 + row;
        let i3 = i2 + 1;
        indices.extend_from_slice(&[i0, i2, i1, i1, i2, i3]);
      }
    }

    Self {
      resolution,
      positions,
      indices,
    }
  }

  #[inline]
  pub fn vertex_count(&self) -> u32 {
    self.positions.len() as u32
  }

  #[inline]
  pub fn index_count(&self) -> u32 {
    self.indices.len() as u32
  }
}
