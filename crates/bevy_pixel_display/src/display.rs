//! Host-facing driver tying the camera, viewport and pipeline together.
//!
//! A host calls the methods of [`PixelPerfectDisplay`] in this order:
//!
//! ```text
//! initialize                      once
//! loop {
//!   update(display, live_edit)    every frame, before post_render
//!   pre_render
//!   <host draws the scene>
//!   post_process
//!   post_render
//! }
//! teardown                        once (dropping also tears down)
//! ```
//!
//! [`render_frame`](PixelPerfectDisplay::render_frame) runs the three render
//! phases around a scene-drawing closure.

use crate::camera::{CameraParams, DisplayCamera};
use crate::config::DisplayConfig;
use crate::error::DisplayError;
use crate::pipeline::{FramePhase, RenderSurfaces, RenderTargetPipeline};
use crate::resize::ResizeWatcher;
use crate::surface::SurfaceBlitter;
use crate::viewport::{DisplaySize, ViewportRect, compute_viewport};

pub struct PixelPerfectDisplay<B: SurfaceBlitter> {
  /// Config the surfaces were allocated for.
  session: DisplayConfig,
  /// Latest config, possibly edited since initialization.
  config: DisplayConfig,
  camera_params: CameraParams,
  watcher: ResizeWatcher,
  pipeline: RenderTargetPipeline<B>,
}

impl<B: SurfaceBlitter> PixelPerfectDisplay<B> {
  /// Validates the config, configures the camera, allocates both surfaces
  /// and computes the initial viewport.
  ///
  /// Any failure aborts setup; no surface stays allocated.
  pub fn initialize<C>(
    config: DisplayConfig,
    display: DisplaySize,
    backend: B,
    camera: &mut C,
  ) -> Result<Self, DisplayError>
  where
    C: DisplayCamera<Surface = B::Surface> + ?Sized,
  {
    config.validate()?;
    let camera_params = CameraParams::try_from(&config)?;
    let viewport = compute_viewport(
      display.width,
      display.height,
      config.virtual_width,
      config.virtual_height,
    )?;

    let mut pipeline = RenderTargetPipeline::new(&config, backend)?;
    pipeline.adopt_viewport(viewport);

    camera_params.apply(camera);
    camera.set_viewport_rect(viewport);

    Ok(Self {
      session: config,
      config,
      camera_params,
      watcher: ResizeWatcher::new(display, &config),
      pipeline,
    })
  }

  /// Replaces the editable config and recomputes the camera parameters.
  ///
  /// The camera picks them up at the next live-edit `update`. Surfaces and
  /// the viewport target keep the session resolution; changing it requires
  /// a new `initialize`. An invalid config is rejected and nothing changes.
  pub fn set_config(&mut self, config: DisplayConfig) -> Result<(), DisplayError> {
    config.validate()?;
    let camera_params = CameraParams::try_from(&config)?;

    if config.native_size() != self.session.native_size()
      || config.scale_factor != self.session.scale_factor
    {
      log::warn!(
        "display surfaces stay at {}x{} x{} until re-initialized",
        self.session.virtual_width,
        self.session.virtual_height,
        self.session.scale_factor
      );
    }

    self.config = config;
    self.camera_params = camera_params;
    Ok(())
  }

  /// Per-frame update.
  ///
  /// With `live_edit` the camera parameters of the current config (see
  /// [`set_config`](Self::set_config)) are applied to the camera again.
  /// Returns the new viewport when the display size changed; it is applied
  /// at the next post-render.
  pub fn update<C>(
    &mut self,
    display: DisplaySize,
    live_edit: bool,
    camera: &mut C,
  ) -> Option<ViewportRect>
  where
    C: DisplayCamera<Surface = B::Surface> + ?Sized,
  {
    if live_edit {
      self.camera_params.apply(camera);
    }

    let rect = self.watcher.check_and_update(display)?;
    self.pipeline.adopt_viewport(rect);
    Some(rect)
  }

  pub fn pre_render<C>(&mut self, camera: &mut C) -> Result<(), DisplayError>
  where
    C: DisplayCamera<Surface = B::Surface> + ?Sized,
  {
    self.pipeline.pre_render(camera)
  }

  pub fn post_process(&mut self) -> Result<(), DisplayError> {
    self.pipeline.post_process()
  }

  pub fn post_render<C>(&mut self, camera: &mut C) -> Result<(), DisplayError>
  where
    C: DisplayCamera<Surface = B::Surface> + ?Sized,
  {
    self.pipeline.post_render(camera)
  }

  /// Runs pre-render, `draw_scene`, post-process and post-render.
  ///
  /// Post-render runs even when post-process fails, so the camera is always
  /// restored; the post-process error is returned afterwards.
  ///
  /// `draw_scene` receives the backend and the native surface to draw into.
  pub fn render_frame<C, F>(&mut self, camera: &mut C, draw_scene: F) -> Result<(), DisplayError>
  where
    C: DisplayCamera<Surface = B::Surface> + ?Sized,
    F: FnOnce(&mut B, &B::Surface),
  {
    self.pipeline.pre_render(camera)?;
    let native = self
      .pipeline
      .surfaces()
      .map(|s| s.native.clone())
      .ok_or(DisplayError::TornDown)?;
    draw_scene(self.pipeline.backend_mut(), &native);
    let processed = self.pipeline.post_process();
    self.pipeline.post_render(camera)?;
    processed
  }

  /// Releases the surfaces. Safe to call more than once.
  pub fn teardown(&mut self) {
    self.pipeline.teardown();
  }

  #[inline]
  pub fn config(&self) -> &DisplayConfig {
    &self.config
  }

  /// Config the surfaces were allocated for.
  #[inline]
  pub fn session_config(&self) -> &DisplayConfig {
    &self.session
  }

  #[inline]
  pub fn camera_params(&self) -> &CameraParams {
    &self.camera_params
  }

  #[inline]
  pub fn viewport(&self) -> ViewportRect {
    self.pipeline.viewport()
  }

  #[inline]
  pub fn phase(&self) -> FramePhase {
    self.pipeline.phase()
  }

  pub fn surfaces(&self) -> Option<&RenderSurfaces<B::Surface>> {
    self.pipeline.surfaces()
  }

  pub fn backend(&self) -> &B {
    self.pipeline.backend()
  }

  pub fn backend_mut(&mut self) -> &mut B {
    self.pipeline.backend_mut()
  }
}
