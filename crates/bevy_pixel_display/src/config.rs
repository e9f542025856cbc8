//! Session configuration for the virtual pixel grid.

use std::path::Path;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::DisplayError;

/// Fixed virtual resolution and upscale settings.
///
/// Immutable for a session: changing any field requires re-running
/// initialization so the render surfaces are reallocated. Only the camera
/// parameters follow live edits (see `PixelPerfectDisplay::update`).
///
/// # Example
/// ```toml
/// virtual_width = 320
/// virtual_height = 180
/// pixels_per_unit = 16
/// scale_factor = 4
/// ```
#[derive(Resource, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
  /// Width of the virtual pixel grid.
  pub virtual_width: u32,
  /// Height of the virtual pixel grid.
  pub virtual_height: u32,
  /// Virtual pixels per vertical world unit.
  pub pixels_per_unit: u32,
  /// Integer multiplier for the intermediate nearest-neighbor surface.
  pub scale_factor: u32,
}

impl Default for DisplayConfig {
  fn default() -> Self {
    Self {
      virtual_width: 640,
      virtual_height: 480,
      pixels_per_unit: 100,
      scale_factor: 4,
    }
  }
}

impl DisplayConfig {
  /// Creates a config with the given virtual resolution and default density.
  pub fn new(virtual_width: u32, virtual_height: u32) -> Self {
    Self {
      virtual_width,
      virtual_height,
      ..default()
    }
  }

  pub fn with_pixels_per_unit(mut self, pixels_per_unit: u32) -> Self {
    self.pixels_per_unit = pixels_per_unit;
    self
  }

  pub fn with_scale_factor(mut self, scale_factor: u32) -> Self {
    self.scale_factor = scale_factor;
    self
  }

  /// Checks every dimension is positive and the scaled surface fits in
  /// `u32`.
  pub fn validate(&self) -> Result<(), DisplayError> {
    DisplayError::check_dimension("virtual_width", self.virtual_width)?;
    DisplayError::check_dimension("virtual_height", self.virtual_height)?;
    DisplayError::check_dimension("pixels_per_unit", self.pixels_per_unit)?;
    DisplayError::check_dimension("scale_factor", self.scale_factor)?;
    self.checked_scaled_size().ok_or(DisplayError::InvalidDimension {
      name: "scale_factor",
      value: self.scale_factor,
    })?;
    Ok(())
  }

  /// Size of the native surface the scene renders into.
  #[inline]
  pub fn native_size(&self) -> UVec2 {
    UVec2::new(self.virtual_width, self.virtual_height)
  }

  /// Size of the intermediate nearest-neighbor upscaled surface.
  ///
  /// Saturates on overflow; `validate` rejects such configs.
  #[inline]
  pub fn scaled_size(&self) -> UVec2 {
    self
      .checked_scaled_size()
      .unwrap_or(UVec2::splat(u32::MAX))
  }

  fn checked_scaled_size(&self) -> Option<UVec2> {
    Some(UVec2::new(
      self.virtual_width.checked_mul(self.scale_factor)?,
      self.virtual_height.checked_mul(self.scale_factor)?,
    ))
  }

  /// Parses and validates a TOML document.
  pub fn from_toml_str(source: &str) -> Result<Self, DisplayError> {
    let config: Self = toml::from_str(source)?;
    config.validate()?;
    Ok(config)
  }

  /// Reads, parses and validates a TOML file.
  pub fn load(path: impl AsRef<Path>) -> Result<Self, DisplayError> {
    let source = std::fs::read_to_string(path.as_ref())?;
    Self::from_toml_str(&source)
  }
}
