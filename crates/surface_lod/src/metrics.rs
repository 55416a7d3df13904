//! Per-surface counters and timings for the LOD engine.
//!
//! Collection compiles away without the `metrics` feature and can be paused
//! at runtime through [`COLLECT_METRICS`]. Counters marked cumulative keep
//! growing until [`LodMetrics::reset`]; the chunk distribution is rebuilt
//! every frame.
//!
//! ```ignore
//! let metrics = context.surface(handle)?.metrics();
//! tracing::info!(ratio = metrics.gating_ratio(), "Refresh gating");
//! ```

use std::collections::VecDeque;
#[cfg(feature = "metrics")]
use std::sync::atomic::Ordering;
use std::sync::atomic::AtomicBool;

use crate::constants::METRIC_DEPTH_SLOTS;
use crate::quadtree::{QuadHierarchy, VisibleSet};
use crate::zones::ClusterOutcome;

/// Samples kept per timing history.
const TIMING_SAMPLES: usize = 128;

/// Pauses collection when cleared. Ignored without the `metrics` feature.
pub static COLLECT_METRICS: AtomicBool = AtomicBool::new(true);

#[inline]
pub fn is_enabled() -> bool {
  cfg!(feature = "metrics") && collect_flag()
}

#[cfg(feature = "metrics")]
#[inline]
fn collect_flag() -> bool {
  COLLECT_METRICS.load(Ordering::Relaxed)
}

#[cfg(not(feature = "metrics"))]
#[inline]
fn collect_flag() -> bool {
  false
}

/// Last `capacity` timings in microseconds with a running total.
#[derive(Debug, Clone)]
pub struct TimingWindow {
  samples: VecDeque<u64>,
  capacity: usize,
  total: u64,
}

impl TimingWindow {
  pub fn new(capacity: usize) -> Self {
    let capacity = capacity.max(1);
    Self {
      samples: VecDeque::with_capacity(capacity),
      capacity,
      total: 0,
    }
  }

  pub fn push(&mut self, micros: u64) {
    if self.samples.len() == self.capacity {
      if let Some(evicted) = self.samples.pop_front() {
        self.total -= evicted;
      }
    }
    self.samples.push_back(micros);
    self.total += micros;
  }

  pub fn len(&self) -> usize {
    self.samples.len()
  }

  pub fn is_empty(&self) -> bool {
    self.samples.is_empty()
  }

  /// Mean of the kept samples, zero when empty.
  pub fn average(&self) -> f64 {
    if self.samples.is_empty() {
      return 0.0;
    }
    self.total as f64 / self.samples.len() as f64
  }
}

impl Default for TimingWindow {
  fn default() -> Self {
    Self::new(TIMING_SAMPLES)
  }
}

/// Per-surface statistics, updated once per frame.
#[derive(Debug, Clone)]
pub struct LodMetrics {
  // Visible set distribution (this frame, all viewers)
  /// Rendered chunks per depth. Depths past the last slot share it.
  pub chunks_per_depth: [u32; METRIC_DEPTH_SLOTS],
  pub visible_chunks: u32,
  pub seam_edges: u64,
  pub infinite_edges: u64,

  // Refresh gating (cumulative)
  pub refreshes: u64,
  /// Viewers whose cached state was reused.
  pub refreshes_skipped: u64,
  /// Viewers skipped because their culling data was missing.
  pub refresh_errors: u64,

  // Zone grids (cumulative, both kinds)
  pub grid_uploads: u64,
  /// Clustering passes whose hash matched the previous frame.
  pub grid_uploads_skipped: u64,
  pub zone_data_uploads: u64,

  // Timing
  /// Microseconds per viewer refresh.
  pub refresh_timings: TimingWindow,
  /// Microseconds per clustering pass (both kinds).
  pub cluster_timings: TimingWindow,
  pub last_refresh_us: u64,
  pub last_cluster_us: u64,
}

impl Default for LodMetrics {
  fn default() -> Self {
    Self {
      chunks_per_depth: [0; METRIC_DEPTH_SLOTS],
      visible_chunks: 0,
      seam_edges: 0,
      infinite_edges: 0,
      refreshes: 0,
      refreshes_skipped: 0,
      refresh_errors: 0,
      grid_uploads: 0,
      grid_uploads_skipped: 0,
      zone_data_uploads: 0,
      refresh_timings: TimingWindow::default(),
      cluster_timings: TimingWindow::default(),
      last_refresh_us: 0,
      last_cluster_us: 0,
    }
  }
}

impl LodMetrics {
  pub fn new() -> Self {
    Self::default()
  }

  /// Reset everything, cumulative counters included.
  pub fn reset(&mut self) {
    *self = Self::default();
  }

  /// Clear the per-frame distribution before the viewers are recorded.
  pub fn begin_frame(&mut self) {
    self.chunks_per_depth.fill(0);
    self.visible_chunks = 0;
    self.seam_edges = 0;
    self.infinite_edges = 0;
  }

  /// Add one viewer's current visible set to this frame's distribution.
  pub fn record_visible_set(&mut self, hierarchy: &QuadHierarchy, visible: &VisibleSet) {
    if !is_enabled() {
      return;
    }
    for chunk in visible.iter() {
      let depth = hierarchy.node(chunk.node).depth as usize;
      self.chunks_per_depth[depth.min(METRIC_DEPTH_SLOTS - 1)] += 1;
      self.seam_edges += chunk.edges.seam_count() as u64;
      self.infinite_edges += chunk.edges.infinite_count() as u64;
    }
    self.visible_chunks += visible.len() as u32;
  }

  pub fn record_refresh_timing(&mut self, timing_us: u64) {
    if is_enabled() {
      self.refreshes += 1;
      self.refresh_timings.push(timing_us);
      self.last_refresh_us = timing_us;
    }
  }

  pub fn record_refresh_skipped(&mut self) {
    if is_enabled() {
      self.refreshes_skipped += 1;
    }
  }

  pub fn record_refresh_error(&mut self) {
    if is_enabled() {
      self.refresh_errors += 1;
    }
  }

  pub fn record_cluster(&mut self, timing_us: u64, outcomes: &[ClusterOutcome]) {
    if !is_enabled() {
      return;
    }
    self.cluster_timings.push(timing_us);
    self.last_cluster_us = timing_us;
    for outcome in outcomes {
      if outcome.grid_uploaded {
        self.grid_uploads += 1;
      } else {
        self.grid_uploads_skipped += 1;
      }
      if outcome.zone_data_uploaded {
        self.zone_data_uploads += 1;
      }
    }
  }

  pub fn avg_refresh_timing_us(&self) -> f64 {
    self.refresh_timings.average()
  }

  pub fn avg_cluster_timing_us(&self) -> f64 {
    self.cluster_timings.average()
  }

  /// Share of viewer updates served from cache, 0..1.
  pub fn gating_ratio(&self) -> f64 {
    let total = self.refreshes + self.refreshes_skipped;
    if total == 0 {
      0.0
    } else {
      self.refreshes_skipped as f64 / total as f64
    }
  }
}
