//! Render-target pipeline: native render, nearest magnify, bilinear present.
//!
//! Every frame runs three phases in a fixed order around the host's scene
//! draw:
//!
//! 1. [`pre_render`](RenderTargetPipeline::pre_render): the camera covers the
//!    whole surface and renders into the native surface.
//! 2. [`post_process`](RenderTargetPipeline::post_process): native is copied
//!    to the scaled surface with nearest sampling (uniform pixel blocks),
//!    then scaled is copied to the host output with bilinear sampling.
//! 3. [`post_render`](RenderTargetPipeline::post_render): the camera gets the
//!    letterboxed viewport back and renders to the default output again.
//!
//! The pipeline owns the surface backend. Both surfaces are released on
//! teardown, on drop, and when initialization fails halfway.

use crate::camera::DisplayCamera;
use crate::config::DisplayConfig;
use crate::error::DisplayError;
use crate::surface::{
  BlitTarget, FilterMode, SurfaceAllocator, SurfaceBlitter, SurfaceDescriptor,
};
use crate::viewport::ViewportRect;

/// Position of the pipeline within a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FramePhase {
  /// Between frames; the camera presents into the viewport.
  Idle,
  /// Camera redirected into the native surface; scene may render.
  Redirected,
  /// Native frame copied through the scaled surface to the output.
  Processed,
  /// Surfaces released. Terminal.
  TornDown,
}

/// The two offscreen surfaces.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderSurfaces<S> {
  /// Virtual resolution, nearest sampling.
  pub native: S,
  /// `scale_factor` × virtual resolution, bilinear sampling.
  pub scaled: S,
}

pub struct RenderTargetPipeline<B: SurfaceBlitter> {
  backend: B,
  surfaces: Option<RenderSurfaces<B::Surface>>,
  viewport: ViewportRect,
  phase: FramePhase,
}

impl<B: SurfaceBlitter> RenderTargetPipeline<B> {
  /// Allocates both surfaces for `config` (see [`allocate_surfaces`]).
  pub fn new(config: &DisplayConfig, mut backend: B) -> Result<Self, DisplayError> {
    let surfaces = allocate_surfaces(config, &mut backend)?;

    Ok(Self {
      backend,
      surfaces: Some(surfaces),
      viewport: ViewportRect::FULL,
      phase: FramePhase::Idle,
    })
  }

  #[inline]
  pub fn phase(&self) -> FramePhase {
    self.phase
  }

  #[inline]
  pub fn is_torn_down(&self) -> bool {
    self.phase == FramePhase::TornDown
  }

  /// Viewport the camera gets back at post-render.
  #[inline]
  pub fn viewport(&self) -> ViewportRect {
    self.viewport
  }

  /// Adopts a new viewport, applied at the next post-render.
  pub fn adopt_viewport(&mut self, rect: ViewportRect) {
    self.viewport = rect;
  }

  /// The live surfaces, or `None` after teardown.
  pub fn surfaces(&self) -> Option<&RenderSurfaces<B::Surface>> {
    self.surfaces.as_ref()
  }

  pub fn backend(&self) -> &B {
    &self.backend
  }

  /// Backend access for the host, e.g. to draw the scene into the native
  /// surface or resize the output.
  pub fn backend_mut(&mut self) -> &mut B {
    &mut self.backend
  }

  /// Phase 1: full-surface rect, render into the native surface.
  pub fn pre_render<C>(&mut self, camera: &mut C) -> Result<(), DisplayError>
  where
    C: DisplayCamera<Surface = B::Surface> + ?Sized,
  {
    self.expect_phase(FramePhase::Idle)?;
    let native = self.live_surfaces()?.native.clone();

    camera.set_viewport_rect(ViewportRect::FULL);
    camera.set_render_target(Some(native));

    self.phase = FramePhase::Redirected;
    Ok(())
  }

  /// Phase 2: nearest magnify into the scaled surface, then bilinear copy to
  /// the host output inside the current viewport.
  ///
  /// On a blit error the pipeline stays redirected; `post_render` still
  /// restores the camera.
  pub fn post_process(&mut self) -> Result<(), DisplayError> {
    self.expect_phase(FramePhase::Redirected)?;
    let RenderSurfaces { native, scaled } = self.live_surfaces()?.clone();

    // Something outside the pipeline may have changed it
    if self.backend.filter(&native) != Some(FilterMode::Nearest) {
      self.backend.set_filter(&native, FilterMode::Nearest);
    }

    self.backend.blit(&native, BlitTarget::Surface(&scaled))?;
    self
      .backend
      .blit(&scaled, BlitTarget::Output(self.viewport))?;

    self.phase = FramePhase::Processed;
    Ok(())
  }

  /// Phase 3: restore the letterboxed viewport and the default output.
  ///
  /// Also accepted straight after `pre_render`, which abandons a frame whose
  /// post-process failed.
  pub fn post_render<C>(&mut self, camera: &mut C) -> Result<(), DisplayError>
  where
    C: DisplayCamera<Surface = B::Surface> + ?Sized,
  {
    if self.phase != FramePhase::Redirected {
      self.expect_phase(FramePhase::Processed)?;
    }

    camera.set_viewport_rect(self.viewport);
    camera.set_render_target(None);

    self.phase = FramePhase::Idle;
    Ok(())
  }

  /// Releases both surfaces. Calling it again is a no-op.
  pub fn teardown(&mut self) {
    if let Some(surfaces) = self.surfaces.take() {
      release_surfaces(&mut self.backend, &surfaces);
    }
    self.phase = FramePhase::TornDown;
  }

  fn live_surfaces(&self) -> Result<&RenderSurfaces<B::Surface>, DisplayError> {
    self.surfaces.as_ref().ok_or(DisplayError::TornDown)
  }

  fn expect_phase(&self, expected: FramePhase) -> Result<(), DisplayError> {
    match self.phase {
      FramePhase::TornDown => Err(DisplayError::TornDown),
      found if found == expected => Ok(()),
      found => Err(DisplayError::PhaseOrder { expected, found }),
    }
  }
}

/// Allocates the native and scaled surfaces for `config`.
///
/// If the scaled surface cannot be allocated the native surface is released
/// before the error is returned.
pub fn allocate_surfaces<A: SurfaceAllocator + ?Sized>(
  config: &DisplayConfig,
  allocator: &mut A,
) -> Result<RenderSurfaces<A::Surface>, DisplayError> {
  config.validate()?;

  let native_size = config.native_size();
  let scaled_size = config.scaled_size();

  let native = allocator.create(&SurfaceDescriptor::new(
    "pixel_display_native",
    native_size.x,
    native_size.y,
    FilterMode::Nearest,
  ))?;

  let scaled = match allocator.create(&SurfaceDescriptor::new(
    "pixel_display_scaled",
    scaled_size.x,
    scaled_size.y,
    FilterMode::Bilinear,
  )) {
    Ok(scaled) => scaled,
    Err(err) => {
      allocator.release(&native);
      log::warn!("pixel display init aborted: {}", err);
      return Err(err);
    }
  };

  log::info!(
    "pixel display surfaces: native {}x{}, scaled {}x{}",
    native_size.x,
    native_size.y,
    scaled_size.x,
    scaled_size.y
  );

  Ok(RenderSurfaces { native, scaled })
}

/// Releases both surfaces.
pub fn release_surfaces<A: SurfaceAllocator + ?Sized>(
  allocator: &mut A,
  surfaces: &RenderSurfaces<A::Surface>,
) {
  allocator.release(&surfaces.native);
  allocator.release(&surfaces.scaled);
  log::info!("pixel display surfaces released");
}

impl<B: SurfaceBlitter> Drop for RenderTargetPipeline<B> {
  fn drop(&mut self) {
    self.teardown();
  }
}
