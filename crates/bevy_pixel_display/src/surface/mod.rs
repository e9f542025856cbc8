//! Offscreen surface collaborators.
//!
//! The display core never touches pixels itself. It asks a
//! [`SurfaceAllocator`] for render surfaces and a [`SurfaceBlitter`] to copy
//! between them, honoring each source surface's [`FilterMode`].
//!
//! [`SoftwareBackend`] is a CPU implementation of both traits.

mod buffer;
mod software;

pub use buffer::{PixelBuffer, Rgba};
pub use software::{DEFAULT_MAX_DIMENSION, SoftwareBackend, SurfaceId};

use crate::error::DisplayError;
use crate::viewport::ViewportRect;

/// How a surface is sampled when it is the source of a copy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FilterMode {
  /// Closest texel, hard edges.
  #[default]
  Nearest,
  /// Blend of the four closest texels.
  Bilinear,
}

/// Color format of a surface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SurfaceFormat {
  /// 8 bits per channel RGBA in sRGB space.
  #[default]
  Rgba8Srgb,
}

/// Everything an allocator needs to create a surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SurfaceDescriptor {
  /// Debug label, also used in allocation errors.
  pub label: &'static str,
  pub width: u32,
  pub height: u32,
  pub format: SurfaceFormat,
  pub filter: FilterMode,
}

impl SurfaceDescriptor {
  pub fn new(label: &'static str, width: u32, height: u32, filter: FilterMode) -> Self {
    Self {
      label,
      width,
      height,
      format: SurfaceFormat::default(),
      filter,
    }
  }

  pub(crate) fn allocation_error(&self, reason: impl Into<String>) -> DisplayError {
    DisplayError::SurfaceAllocation {
      label: self.label,
      width: self.width,
      height: self.height,
      reason: reason.into(),
    }
  }
}

/// Creates, reconfigures and releases render surfaces.
pub trait SurfaceAllocator {
  /// Handle to an allocated surface.
  type Surface: Clone + PartialEq + std::fmt::Debug;

  fn create(&mut self, descriptor: &SurfaceDescriptor) -> Result<Self::Surface, DisplayError>;

  /// Current sampling mode, or `None` for an unknown surface or a host
  /// default sampler.
  fn filter(&self, surface: &Self::Surface) -> Option<FilterMode>;

  fn set_filter(&mut self, surface: &Self::Surface, filter: FilterMode);

  /// Frees the surface. Releasing an unknown surface is a no-op.
  fn release(&mut self, surface: &Self::Surface);
}

/// Destination of a copy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BlitTarget<'a, S> {
  /// Another surface, filled completely.
  Surface(&'a S),
  /// The host's default output, filled inside the given rectangle.
  Output(ViewportRect),
}

/// Copies between surfaces.
pub trait SurfaceBlitter: SurfaceAllocator {
  /// Stretches `source` over `target`, sampling with the source's filter.
  fn blit(
    &mut self,
    source: &Self::Surface,
    target: BlitTarget<'_, Self::Surface>,
  ) -> Result<(), DisplayError>;
}

impl<T: SurfaceAllocator + ?Sized> SurfaceAllocator for &mut T {
  type Surface = T::Surface;

  fn create(&mut self, descriptor: &SurfaceDescriptor) -> Result<Self::Surface, DisplayError> {
    (**self).create(descriptor)
  }

  fn filter(&self, surface: &Self::Surface) -> Option<FilterMode> {
    (**self).filter(surface)
  }

  fn set_filter(&mut self, surface: &Self::Surface, filter: FilterMode) {
    (**self).set_filter(surface, filter)
  }

  fn release(&mut self, surface: &Self::Surface) {
    (**self).release(surface)
  }
}

impl<T: SurfaceBlitter + ?Sized> SurfaceBlitter for &mut T {
  fn blit(
    &mut self,
    source: &Self::Surface,
    target: BlitTarget<'_, Self::Surface>,
  ) -> Result<(), DisplayError> {
    (**self).blit(source, target)
  }
}
