//! CPU pixel buffer with nearest and bilinear sampling.
//!
//! Data is stored in row-major order where row 0 is the top of the image,
//! matching texture and viewport conventions.

use std::ops::{Index, IndexMut};

use super::FilterMode;

/// One RGBA8 texel.
pub type Rgba = [u8; 4];

/// A 2D buffer of RGBA8 texels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
  data: Box<[Rgba]>,
  width: u32,
  height: u32,
}

impl PixelBuffer {
  /// Creates a buffer cleared to transparent black.
  pub fn new(width: u32, height: u32) -> Self {
    Self::filled(width, height, [0, 0, 0, 0])
  }

  pub fn filled(width: u32, height: u32, value: Rgba) -> Self {
    let len = (width as usize) * (height as usize);
    Self {
      data: vec![value; len].into_boxed_slice(),
      width,
      height,
    }
  }

  #[inline]
  pub fn width(&self) -> u32 {
    self.width
  }

  #[inline]
  pub fn height(&self) -> u32 {
    self.height
  }

  #[inline]
  fn index_of(&self, x: u32, y: u32) -> Option<usize> {
    if x < self.width && y < self.height {
      Some((y as usize) * (self.width as usize) + (x as usize))
    } else {
      None
    }
  }

  #[inline]
  pub fn get(&self, x: u32, y: u32) -> Option<Rgba> {
    self.index_of(x, y).map(|i| self.data[i])
  }

  /// Sets the texel at (x, y). Returns `false` if out of bounds.
  #[inline]
  pub fn set(&mut self, x: u32, y: u32, value: Rgba) -> bool {
    if let Some(i) = self.index_of(x, y) {
      self.data[i] = value;
      true
    } else {
      false
    }
  }

  pub fn fill(&mut self, value: Rgba) {
    self.data.fill(value);
  }

  /// Fills the rectangle, clamped to the buffer bounds.
  pub fn fill_rect(&mut self, x: u32, y: u32, width: u32, height: u32, value: Rgba) {
    let x_end = x.saturating_add(width).min(self.width);
    let y_end = y.saturating_add(height).min(self.height);
    for row in y.min(y_end)..y_end {
      for col in x.min(x_end)..x_end {
        self[(col, row)] = value;
      }
    }
  }

  /// Samples at normalized coordinates with the given filter.
  ///
  /// `u` and `v` address texel edges: `(0, 0)` is the top-left corner of the
  /// first texel and `(1, 1)` the bottom-right corner of the last. Sampling
  /// outside the buffer clamps to the edge.
  pub fn sample(&self, u: f32, v: f32, filter: FilterMode) -> Rgba {
    match filter {
      FilterMode::Nearest => self.sample_nearest(u, v),
      FilterMode::Bilinear => self.sample_bilinear(u, v),
    }
  }

  fn sample_nearest(&self, u: f32, v: f32) -> Rgba {
    let x = clamp_texel(u * self.width as f32, self.width);
    let y = clamp_texel(v * self.height as f32, self.height);
    self[(x, y)]
  }

  fn sample_bilinear(&self, u: f32, v: f32) -> Rgba {
    // Texel centers sit at half-integer positions
    let fx = u * self.width as f32 - 0.5;
    let fy = v * self.height as f32 - 0.5;
    let x0 = fx.floor();
    let y0 = fy.floor();
    let tx = fx - x0;
    let ty = fy - y0;

    let x0i = clamp_texel(x0, self.width);
    let x1i = clamp_texel(x0 + 1.0, self.width);
    let y0i = clamp_texel(y0, self.height);
    let y1i = clamp_texel(y0 + 1.0, self.height);

    let top = lerp_rgba(self[(x0i, y0i)], self[(x1i, y0i)], tx);
    let bottom = lerp_rgba(self[(x0i, y1i)], self[(x1i, y1i)], tx);
    to_rgba8(lerp4(top, bottom, ty))
  }
}

#[inline]
fn clamp_texel(position: f32, extent: u32) -> u32 {
  if position <= 0.0 {
    0
  } else {
    (position as u32).min(extent.saturating_sub(1))
  }
}

#[inline]
fn lerp_rgba(a: Rgba, b: Rgba, t: f32) -> [f32; 4] {
  lerp4(a.map(f32::from), b.map(f32::from), t)
}

#[inline]
fn lerp4(a: [f32; 4], b: [f32; 4], t: f32) -> [f32; 4] {
  [
    a[0] + (b[0] - a[0]) * t,
    a[1] + (b[1] - a[1]) * t,
    a[2] + (b[2] - a[2]) * t,
    a[3] + (b[3] - a[3]) * t,
  ]
}

#[inline]
fn to_rgba8(c: [f32; 4]) -> Rgba {
  c.map(|channel| channel.round().clamp(0.0, 255.0) as u8)
}

impl Index<(u32, u32)> for PixelBuffer {
  type Output = Rgba;

  #[inline]
  fn index(&self, (x, y): (u32, u32)) -> &Self::Output {
    let i = (y as usize) * (self.width as usize) + (x as usize);
    &self.data[i]
  }
}

impl IndexMut<(u32, u32)> for PixelBuffer {
  #[inline]
  fn index_mut(&mut self, (x, y): (u32, u32)) -> &mut Self::Output {
    let i = (y as usize) * (self.width as usize) + (x as usize);
    &mut self.data[i]
  }
}
