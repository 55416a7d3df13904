//! ViewerRegistry - per-surface viewer states keyed by a stable viewer id.
//!
//! Bounded by `max_viewers`. Registering one more viewer evicts the one seen
//! least recently.

use std::collections::HashMap;

use super::{ViewerId, ViewerState};

pub struct ViewerRegistry {
  viewers: HashMap<ViewerId, ViewerState>,
  max_viewers: usize,
  tier_count: usize,
  max_instances: u32,
}

impl ViewerRegistry {
  pub fn new(max_viewers: usize, tier_count: usize, max_instances: u32) -> Self {
    Self {
      viewers: HashMap::new(),
      max_viewers: max_viewers.max(1),
      tier_count,
      max_instances,
    }
  }

  /// Make sure `id` has a state and mark it seen at `frame`. Returns the
  /// viewer evicted to make room, if any.
  pub fn ensure(&mut self, id: ViewerId, frame: u64) -> Option<ViewerId> {
    let mut evicted = None;
    if !self.viewers.contains_key(&id) {
      if self.viewers.len() >= self.max_viewers {
        evicted = self.evict_oldest();
      }
      tracing::debug!(viewer = id.0, "Registered viewer");
      self
        .viewers
        .insert(id, ViewerState::new(id, self.tier_count, self.max_instances));
    }
    if let Some(state) = self.viewers.get_mut(&id) {
      state.touch(frame);
    }
    evicted
  }

  fn evict_oldest(&mut self) -> Option<ViewerId> {
    let oldest = self
      .viewers
      .values()
      .min_by_key(|state| (state.last_seen(), state.id()))
      .map(ViewerState::id)?;
    self.viewers.remove(&oldest);
    tracing::debug!(viewer = oldest.0, "Evicted least recently seen viewer");
    Some(oldest)
  }

  pub fn remove(&mut self, id: ViewerId) -> Option<ViewerState> {
    let removed = self.viewers.remove(&id);
    if removed.is_some() {
      tracing::debug!(viewer = id.0, "Removed viewer");
    }
    removed
  }

  pub fn get(&self, id: ViewerId) -> Option<&ViewerState> {
    self.viewers.get(&id)
  }

  pub fn get_mut(&mut self, id: ViewerId) -> Option<&mut ViewerState> {
    self.viewers.get_mut(&id)
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.viewers.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.viewers.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = &ViewerState> {
    self.viewers.values()
  }

  pub fn ids(&self) -> impl Iterator<Item = ViewerId> + '_ {
    self.viewers.keys().copied()
  }

  #[inline]
  pub fn max_viewers(&self) -> usize {
    self.max_viewers
  }

  /// Force every viewer to refresh next frame.
  pub fn invalidate_all(&mut self) {
    for state in self.viewers.values_mut() {
      state.invalidate();
    }
  }

  /// Lower or raise the viewer cap, evicting the oldest states past it.
  pub fn set_max_viewers(&mut self, max_viewers: usize) -> Vec<ViewerId> {
    self.max_viewers = max_viewers.max(1);
    let mut evicted = Vec::new();
    while self.viewers.len() > self.max_viewers {
      match self.evict_oldest() {
        Some(id) => evicted.push(id),
        None => break,
      }
    }
    evicted
  }

  /// Drop every state; new ones use the given buffer layout.
  pub fn reset(&mut self, tier_count: usize, max_instances: u32) {
    if !self.viewers.is_empty() {
      tracing::debug!(viewers = self.viewers.len(), "Reset viewer states");
    }
    self.viewers.clear();
    self.tier_count = tier_count;
    self.max_instances = max_instances;
  }
}
