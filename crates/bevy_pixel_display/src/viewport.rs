//! Aspect-preserving viewport placement.
//!
//! The virtual grid is fitted into the display surface at the largest size
//! that keeps its aspect ratio. The leftover space becomes vertical bars
//! (pillarbox, display wider than target) or horizontal bars (letterbox,
//! display narrower than target).

use bevy::prelude::*;

use crate::error::DisplayError;

/// Physical pixel size of the host display surface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct DisplaySize {
  pub width: u32,
  pub height: u32,
}

impl DisplaySize {
  pub const fn new(width: u32, height: u32) -> Self {
    Self { width, height }
  }

  /// Returns true if either side is zero (e.g. a minimized window).
  #[inline]
  pub fn is_empty(&self) -> bool {
    self.width == 0 || self.height == 0
  }
}

impl From<UVec2> for DisplaySize {
  fn from(size: UVec2) -> Self {
    Self::new(size.x, size.y)
  }
}

impl From<DisplaySize> for UVec2 {
  fn from(size: DisplaySize) -> Self {
    UVec2::new(size.width, size.height)
  }
}

/// Sub-rectangle of the display in normalized `[0, 1]` coordinates.
///
/// Origin is the top-left corner of the display. One axis always spans the
/// full display and the other is centered.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportRect {
  pub x: f32,
  pub y: f32,
  pub width: f32,
  pub height: f32,
}

impl Default for ViewportRect {
  fn default() -> Self {
    Self::FULL
  }
}

/// Pixel-space placement of a [`ViewportRect`] on a concrete display.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhysicalViewport {
  pub position: UVec2,
  pub size: UVec2,
}

impl ViewportRect {
  /// The whole display surface.
  pub const FULL: Self = Self {
    x: 0.0,
    y: 0.0,
    width: 1.0,
    height: 1.0,
  };

  #[inline]
  pub fn is_full(&self) -> bool {
    *self == Self::FULL
  }

  /// Maps the rectangle onto a display of the given pixel size.
  ///
  /// Edges are rounded to the nearest pixel. The result is never empty for a
  /// non-empty display and never extends past the display edge.
  pub fn to_physical(&self, display: DisplaySize) -> PhysicalViewport {
    let (x0, x1) = span_to_pixels(self.x, self.width, display.width);
    let (y0, y1) = span_to_pixels(self.y, self.height, display.height);
    PhysicalViewport {
      position: UVec2::new(x0, y0),
      size: UVec2::new(x1 - x0, y1 - y0),
    }
  }
}

fn span_to_pixels(offset: f32, extent: f32, total: u32) -> (u32, u32) {
  let total_f = total as f32;
  let start = ((offset * total_f).round() as u32).min(total.saturating_sub(1));
  let end = (((offset + extent) * total_f).round() as u32)
    .min(total)
    .max(start + 1);
  (start, end)
}

/// Computes the centered, aspect-preserving viewport for a display.
///
/// Ties (display aspect exactly equal to target aspect) take the letterbox
/// branch and produce [`ViewportRect::FULL`]. Aspects are compared exactly by
/// cross-multiplication so ties do not depend on float rounding.
pub fn compute_viewport(
  display_w: u32,
  display_h: u32,
  target_w: u32,
  target_h: u32,
) -> Result<ViewportRect, DisplayError> {
  DisplayError::check_dimension("display_width", display_w)?;
  DisplayError::check_dimension("display_height", display_h)?;
  DisplayError::check_dimension("target_width", target_w)?;
  DisplayError::check_dimension("target_height", target_h)?;

  let screen_aspect = display_w as f32 / display_h as f32;
  let target_aspect = target_w as f32 / target_h as f32;

  let wider = display_w as u64 * target_h as u64 > target_w as u64 * display_h as u64;
  let tied = display_w as u64 * target_h as u64 == target_w as u64 * display_h as u64;

  let rect = if wider {
    // Pillarbox: bars left and right
    let width = target_aspect / screen_aspect;
    ViewportRect {
      x: (1.0 - width) / 2.0,
      y: 0.0,
      width,
      height: 1.0,
    }
  } else if tied {
    ViewportRect::FULL
  } else {
    // Letterbox: bars top and bottom
    let height = screen_aspect / target_aspect;
    ViewportRect {
      x: 0.0,
      y: (1.0 - height) / 2.0,
      width: 1.0,
      height,
    }
  };

  Ok(rect)
}
