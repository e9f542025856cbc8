//! Orthographic camera parameterization for the virtual pixel grid.

use crate::config::DisplayConfig;
use crate::error::DisplayError;
use crate::viewport::ViewportRect;

/// Near clip plane. Content must sit within half a unit of the camera plane.
pub const NEAR_CLIP: f32 = -0.5;

/// Far clip plane.
pub const FAR_CLIP: f32 = 0.5;

/// Projection parameters that map one vertical world unit to exactly
/// `pixels_per_unit` virtual pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraParams {
  pub orthographic: bool,
  /// Width over height of the virtual grid.
  pub aspect: f32,
  /// Half of the visible world height.
  pub half_height: f32,
  pub near: f32,
  pub far: f32,
}

impl CameraParams {
  /// Half of the visible world width.
  #[inline]
  pub fn half_width(&self) -> f32 {
    self.half_height * self.aspect
  }

  /// Writes every parameter to the camera.
  ///
  /// Reapplying unchanged parameters leaves the camera unchanged.
  pub fn apply<C: DisplayCamera + ?Sized>(&self, camera: &mut C) {
    camera.set_orthographic(self.orthographic);
    camera.set_aspect(self.aspect);
    camera.set_half_height(self.half_height);
    camera.set_clip_planes(self.near, self.far);
  }
}

/// Computes the orthographic projection for a virtual grid.
pub fn compute_camera_params(
  virtual_w: u32,
  virtual_h: u32,
  pixels_per_unit: u32,
) -> Result<CameraParams, DisplayError> {
  DisplayError::check_dimension("virtual_width", virtual_w)?;
  DisplayError::check_dimension("virtual_height", virtual_h)?;
  DisplayError::check_dimension("pixels_per_unit", pixels_per_unit)?;

  Ok(CameraParams {
    orthographic: true,
    aspect: virtual_w as f32 / virtual_h as f32,
    half_height: virtual_h as f32 / (2.0 * pixels_per_unit as f32),
    near: NEAR_CLIP,
    far: FAR_CLIP,
  })
}

impl TryFrom<&DisplayConfig> for CameraParams {
  type Error = DisplayError;

  fn try_from(config: &DisplayConfig) -> Result<Self, Self::Error> {
    compute_camera_params(
      config.virtual_width,
      config.virtual_height,
      config.pixels_per_unit,
    )
  }
}

/// Camera fields the display core writes.
///
/// Implemented by host camera adapters. The core never reads scene content
/// through this trait.
pub trait DisplayCamera {
  /// Handle of a surface the camera can render into.
  type Surface: Clone;

  fn set_orthographic(&mut self, orthographic: bool);
  fn set_aspect(&mut self, aspect: f32);
  fn set_half_height(&mut self, half_height: f32);
  fn set_clip_planes(&mut self, near: f32, far: f32);
  /// Sets the normalized output rectangle on the display.
  fn set_viewport_rect(&mut self, rect: ViewportRect);
  /// Redirects rendering into `target`, or back to the default display
  /// output when `None`.
  fn set_render_target(&mut self, target: Option<Self::Surface>);
}

/// Plain-data camera for software hosts and tests.
#[derive(Clone, Debug, PartialEq)]
pub struct OrthoCamera<S> {
  pub orthographic: bool,
  pub aspect: f32,
  pub half_height: f32,
  pub near: f32,
  pub far: f32,
  pub viewport: ViewportRect,
  pub target: Option<S>,
}

impl<S> Default for OrthoCamera<S> {
  fn default() -> Self {
    Self {
      orthographic: false,
      aspect: 1.0,
      half_height: 1.0,
      near: 0.1,
      far: 1000.0,
      viewport: ViewportRect::FULL,
      target: None,
    }
  }
}

impl<S: Clone> DisplayCamera for OrthoCamera<S> {
  type Surface = S;

  fn set_orthographic(&mut self, orthographic: bool) {
    self.orthographic = orthographic;
  }

  fn set_aspect(&mut self, aspect: f32) {
    self.aspect = aspect;
  }

  fn set_half_height(&mut self, half_height: f32) {
    self.half_height = half_height;
  }

  fn set_clip_planes(&mut self, near: f32, far: f32) {
    self.near = near;
    self.far = far;
  }

  fn set_viewport_rect(&mut self, rect: ViewportRect) {
    self.viewport = rect;
  }

  fn set_render_target(&mut self, target: Option<S>) {
    self.target = target;
  }
}
