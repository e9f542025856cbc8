//! CPU surface backend.
//!
//! Holds every allocated surface as a [`PixelBuffer`] plus an output
//! framebuffer sized to the display. Blits resample on the CPU, which makes
//! the full frame cycle observable in headless tests and tools.

use std::collections::HashMap;

use super::buffer::{PixelBuffer, Rgba};
use super::{BlitTarget, FilterMode, SurfaceAllocator, SurfaceBlitter, SurfaceDescriptor};
use crate::error::DisplayError;
use crate::viewport::DisplaySize;

/// Largest surface side accepted by default. Matches the wgpu default limit
/// for 2D textures.
pub const DEFAULT_MAX_DIMENSION: u32 = 8192;

/// Color of the bars around the viewport in the output framebuffer.
const BAR_COLOR: Rgba = [0, 0, 0, 255];

/// Handle to a surface owned by a [`SoftwareBackend`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SurfaceId(u32);

struct SoftwareSurface {
  pixels: PixelBuffer,
  filter: FilterMode,
}

/// CPU implementation of [`SurfaceAllocator`] and [`SurfaceBlitter`].
pub struct SoftwareBackend {
  surfaces: HashMap<SurfaceId, SoftwareSurface>,
  next_id: u32,
  output: PixelBuffer,
  max_dimension: u32,
}

impl SoftwareBackend {
  /// Creates a backend whose output framebuffer matches the display.
  pub fn new(display: DisplaySize) -> Self {
    Self {
      surfaces: HashMap::new(),
      next_id: 0,
      output: PixelBuffer::filled(display.width, display.height, BAR_COLOR),
      max_dimension: DEFAULT_MAX_DIMENSION,
    }
  }

  /// Overrides the largest accepted surface side.
  pub fn with_max_dimension(mut self, max_dimension: u32) -> Self {
    self.max_dimension = max_dimension;
    self
  }

  /// Reallocates the output framebuffer after a display resize.
  pub fn resize_output(&mut self, display: DisplaySize) {
    if self.output.width() != display.width || self.output.height() != display.height {
      self.output = PixelBuffer::filled(display.width, display.height, BAR_COLOR);
    }
  }

  /// The composited frame.
  pub fn output(&self) -> &PixelBuffer {
    &self.output
  }

  pub fn surface(&self, id: &SurfaceId) -> Option<&PixelBuffer> {
    self.surfaces.get(id).map(|s| &s.pixels)
  }

  /// Mutable pixels of a surface, e.g. for a software scene renderer.
  pub fn surface_mut(&mut self, id: &SurfaceId) -> Option<&mut PixelBuffer> {
    self.surfaces.get_mut(id).map(|s| &mut s.pixels)
  }

  /// Number of surfaces currently allocated.
  pub fn live_surfaces(&self) -> usize {
    self.surfaces.len()
  }
}

impl SurfaceAllocator for SoftwareBackend {
  type Surface = SurfaceId;

  fn create(&mut self, descriptor: &SurfaceDescriptor) -> Result<SurfaceId, DisplayError> {
    if descriptor.width == 0 || descriptor.height == 0 {
      return Err(descriptor.allocation_error("zero-sized surface"));
    }
    if descriptor.width > self.max_dimension || descriptor.height > self.max_dimension {
      return Err(descriptor.allocation_error(format!(
        "exceeds maximum dimension {}",
        self.max_dimension
      )));
    }

    let id = SurfaceId(self.next_id);
    self.next_id += 1;
    self.surfaces.insert(
      id,
      SoftwareSurface {
        pixels: PixelBuffer::new(descriptor.width, descriptor.height),
        filter: descriptor.filter,
      },
    );

    log::debug!(
      "software surface '{}' {:?}: {}x{} {:?}",
      descriptor.label,
      id,
      descriptor.width,
      descriptor.height,
      descriptor.filter
    );
    Ok(id)
  }

  fn filter(&self, surface: &SurfaceId) -> Option<FilterMode> {
    self.surfaces.get(surface).map(|s| s.filter)
  }

  fn set_filter(&mut self, surface: &SurfaceId, filter: FilterMode) {
    if let Some(s) = self.surfaces.get_mut(surface) {
      s.filter = filter;
    }
  }

  fn release(&mut self, surface: &SurfaceId) {
    self.surfaces.remove(surface);
  }
}

impl SurfaceBlitter for SoftwareBackend {
  fn blit(
    &mut self,
    source: &SurfaceId,
    target: BlitTarget<'_, SurfaceId>,
  ) -> Result<(), DisplayError> {
    match target {
      BlitTarget::Surface(id) if id == source => {
        // Same-size copy onto itself is the identity
        if self.surfaces.contains_key(id) {
          Ok(())
        } else {
          Err(DisplayError::StaleSurface)
        }
      }
      BlitTarget::Surface(id) => {
        // Take the destination out so source and destination can be borrowed
        // at the same time.
        let mut dst = self.surfaces.remove(id).ok_or(DisplayError::StaleSurface)?;
        let result = match self.surfaces.get(source) {
          Some(src) => {
            let (w, h) = (dst.pixels.width(), dst.pixels.height());
            stretch(src, &mut dst.pixels, 0, 0, w, h);
            Ok(())
          }
          None => Err(DisplayError::StaleSurface),
        };
        self.surfaces.insert(*id, dst);
        result
      }
      BlitTarget::Output(rect) => {
        let src = self.surfaces.get(source).ok_or(DisplayError::StaleSurface)?;
        let display = DisplaySize::new(self.output.width(), self.output.height());
        if display.is_empty() {
          return Ok(());
        }
        let region = rect.to_physical(display);
        let (x, y) = (region.position.x, region.position.y);
        let (w, h) = (region.size.x, region.size.y);
        paint_bars(&mut self.output, x, y, w, h);
        stretch(src, &mut self.output, x, y, w, h);
        Ok(())
      }
    }
  }
}

/// Paints everything outside the `w × h` region at (`x`, `y`) with the bar
/// color.
fn paint_bars(output: &mut PixelBuffer, x: u32, y: u32, w: u32, h: u32) {
  let (total_w, total_h) = (output.width(), output.height());
  let right = x + w;
  let bottom = y + h;
  output.fill_rect(0, 0, total_w, y, BAR_COLOR);
  output.fill_rect(0, bottom, total_w, total_h.saturating_sub(bottom), BAR_COLOR);
  output.fill_rect(0, y, x, h, BAR_COLOR);
  output.fill_rect(right, y, total_w.saturating_sub(right), h, BAR_COLOR);
}

/// Resamples `src` over the `w × h` region of `dst` at (`x`, `y`).
fn stretch(src: &SoftwareSurface, dst: &mut PixelBuffer, x: u32, y: u32, w: u32, h: u32) {
  for row in 0..h {
    let v = (row as f32 + 0.5) / h as f32;
    for col in 0..w {
      let u = (col as f32 + 0.5) / w as f32;
      dst.set(x + col, y + row, src.pixels.sample(u, v, src.filter));
    }
  }
}
