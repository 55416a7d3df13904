//! LodContext - explicit entry point hosting any number of surfaces.
//!
//! The driver owns the context and calls it once per frame:
//!
//! ```ignore
//! let mut context = LodContext::new();
//! let ocean = context.initialize(SurfaceConfig::default());
//! loop {
//!     let report = context.update(ocean, &inputs)?;
//!     let data = context.render_data(ocean, camera)?;
//! }
//! context.shutdown(ocean)?;
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::config::SurfaceConfig;
use crate::error::LodError;
use crate::surface::{FrameInputs, FrameReport, SurfaceInstance, ViewerRenderData};
use crate::viewer::ViewerId;

static SURFACE_HANDLE_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Opaque surface identifier, unique within the process lifetime.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct SurfaceHandle(u64);

impl SurfaceHandle {
  fn new() -> Self {
    Self(SURFACE_HANDLE_COUNTER.fetch_add(1, Ordering::Relaxed))
  }

  pub fn raw(&self) -> u64 {
    self.0
  }
}

#[derive(Default)]
pub struct LodContext {
  surfaces: HashMap<SurfaceHandle, SurfaceInstance>,
}

impl LodContext {
  pub fn new() -> Self {
    Self::default()
  }

  /// Build a surface. The configuration is expected to pass
  /// [`SurfaceConfig::validate`].
  pub fn initialize(&mut self, config: SurfaceConfig) -> SurfaceHandle {
    let handle = SurfaceHandle::new();
    tracing::debug!(surface = handle.0, "Initializing surface");
    self.surfaces.insert(handle, SurfaceInstance::new(config));
    handle
  }

  /// Run one frame for `handle`. Per-viewer problems end up in the report;
  /// only an unknown handle fails.
  pub fn update(
    &mut self,
    handle: SurfaceHandle,
    inputs: &FrameInputs<'_>,
  ) -> Result<FrameReport, LodError> {
    Ok(self.surface_mut(handle)?.update(inputs))
  }

  /// Release every resource of the surface.
  pub fn shutdown(&mut self, handle: SurfaceHandle) -> Result<(), LodError> {
    self
      .surfaces
      .remove(&handle)
      .map(|_| tracing::debug!(surface = handle.0, "Shut down surface"))
      .ok_or(LodError::UnknownSurface(handle))
  }

  /// Returns true when the change rebuilt the hierarchy.
  pub fn reconfigure(
    &mut self,
    handle: SurfaceHandle,
    config: SurfaceConfig,
  ) -> Result<bool, LodError> {
    Ok(self.surface_mut(handle)?.reconfigure(config))
  }

  /// Returns true when the viewer was known.
  pub fn remove_viewer(
    &mut self,
    handle: SurfaceHandle,
    viewer: ViewerId,
  ) -> Result<bool, LodError> {
    Ok(self.surface_mut(handle)?.remove_viewer(viewer))
  }

  /// Render data for a viewer. `Ok(None)` when the viewer has no state yet.
  pub fn render_data(
    &self,
    handle: SurfaceHandle,
    viewer: ViewerId,
  ) -> Result<Option<ViewerRenderData<'_>>, LodError> {
    Ok(self.surface(handle)?.render_data(viewer))
  }

  pub fn surface(&self, handle: SurfaceHandle) -> Result<&SurfaceInstance, LodError> {
    self
      .surfaces
      .get(&handle)
      .ok_or(LodError::UnknownSurface(handle))
  }

  fn surface_mut(&mut self, handle: SurfaceHandle) -> Result<&mut SurfaceInstance, LodError> {
    self
      .surfaces
      .get_mut(&handle)
      .ok_or(LodError::UnknownSurface(handle))
  }

  pub fn handles(&self) -> impl Iterator<Item = SurfaceHandle> + '_ {
    self.surfaces.keys().copied()
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.surfaces.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.surfaces.is_empty()
  }
}

#[cfg(test)]
#[path = "context_test.rs"]
mod context_test;
