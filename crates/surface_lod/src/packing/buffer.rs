//! GrowingBuffer - CPU-side staging for a GPU buffer that only grows.
//!
//! Capacity is rounded up to `BUFFER_GRANULARITY` elements and never
//! shrinks. Every reallocation issues a fresh [`BufferId`], so a renderer
//! holding GPU resources keyed by id knows to recreate its buffer. Writes past
//! the hard maximum are truncated: callers order their data so the tail is
//! the least important part.

use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};

use bytemuck::Pod;

use crate::constants::BUFFER_GRANULARITY;

static BUFFER_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Identity of one allocation. Changes whenever the buffer is reallocated.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct BufferId(u64);

impl BufferId {
  fn new() -> Self {
    Self(BUFFER_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
  }

  pub fn raw(&self) -> u64 {
    self.0
  }
}

pub struct GrowingBuffer<T: Pod> {
  label: &'static str,
  data: Vec<T>,
  capacity: u32,
  max_capacity: u32,
  id: BufferId,
  uploads: u64,
}

impl<T: Pod> GrowingBuffer<T> {
  pub fn new(label: &'static str, capacity: u32, max_capacity: u32) -> Self {
    let capacity = capacity.min(max_capacity);
    Self {
      label,
      data: Vec::with_capacity(capacity as usize),
      capacity,
      max_capacity,
      id: BufferId::new(),
      uploads: 0,
    }
  }

  /// Replace the contents. Returns the written element range, which is
  /// shorter than `data` when the hard maximum clamps it.
  pub fn write(&mut self, data: &[T]) -> Range<u32> {
    let count = (data.len() as u64).min(self.max_capacity as u64) as u32;
    if (count as usize) < data.len() {
      tracing::debug!(
        label = self.label,
        requested = data.len(),
        kept = count,
        "Buffer write clamped to hard maximum"
      );
    }

    self.ensure_size(count);
    self.data.clear();
    self.data.extend_from_slice(&data[..count as usize]);
    self.uploads += 1;

    0..count
  }

  fn ensure_size(&mut self, required: u32) {
    if required > self.capacity {
      self.resize(required);
    }
  }

  fn resize(&mut self, required: u32) {
    let new_capacity = required
      .next_multiple_of(BUFFER_GRANULARITY)
      .min(self.max_capacity);

    tracing::debug!(
      label = self.label,
      from = self.capacity,
      to = new_capacity,
      bytes = new_capacity as usize * std::mem::size_of::<T>(),
      "Resizing buffer"
    );

    self.data.reserve(new_capacity as usize - self.data.len());
    self.capacity = new_capacity;
    self.id = BufferId::new();
  }

  #[inline]
  pub fn count(&self) -> u32 {
    self.data.len() as u32
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.data.is_empty()
  }

  #[inline]
  pub fn capacity(&self) -> u32 {
    self.capacity
  }

  #[inline]
  pub fn max_capacity(&self) -> u32 {
    self.max_capacity
  }

  #[inline]
  pub fn id(&self) -> BufferId {
    self.id
  }

  /// Number of writes since creation.
  #[inline]
  pub fn uploads(&self) -> u64 {
    self.uploads
  }

  pub fn label(&self) -> &'static str {
    self.label
  }

  pub fn as_slice(&self) -> &[T] {
    &self.data
  }

  /// Contents as raw bytes, ready for upload.
  pub fn as_bytes(&self) -> &[u8] {
    bytemuck::cast_slice(&self.data)
  }
}

#[cfg(test)]
#[path = "buffer_test.rs"]
mod buffer_test;
