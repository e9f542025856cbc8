//! Error type shared by the display core and its backends.

use std::io;

use crate::pipeline::FramePhase;

/// Error raised while configuring or driving a pixel-perfect display.
#[derive(Debug)]
pub enum DisplayError {
  /// A configured or observed dimension was zero.
  InvalidDimension { name: &'static str, value: u32 },
  /// The surface allocator could not create a surface.
  SurfaceAllocation {
    label: &'static str,
    width: u32,
    height: u32,
    reason: String,
  },
  /// A released or unknown surface handle reached a backend.
  StaleSurface,
  /// A frame phase was invoked after teardown.
  TornDown,
  /// Frame phases were invoked out of order.
  PhaseOrder {
    expected: FramePhase,
    found: FramePhase,
  },
  Io(io::Error),
  Parse(toml::de::Error),
}

impl DisplayError {
  /// Returns `InvalidDimension` when `value` is zero.
  pub(crate) fn check_dimension(name: &'static str, value: u32) -> Result<u32, Self> {
    if value == 0 {
      Err(Self::InvalidDimension { name, value })
    } else {
      Ok(value)
    }
  }
}

impl From<io::Error> for DisplayError {
  fn from(err: io::Error) -> Self {
    Self::Io(err)
  }
}

impl From<toml::de::Error> for DisplayError {
  fn from(err: toml::de::Error) -> Self {
    Self::Parse(err)
  }
}

impl std::fmt::Display for DisplayError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::InvalidDimension { name, value } => {
        write!(f, "invalid dimension: {} = {} (must be > 0)", name, value)
      }
      Self::SurfaceAllocation {
        label,
        width,
        height,
        reason,
      } => write!(
        f,
        "failed to allocate surface '{}' ({}x{}): {}",
        label, width, height, reason
      ),
      Self::StaleSurface => write!(f, "surface handle was released or never allocated"),
      Self::TornDown => write!(f, "display pipeline has been torn down"),
      Self::PhaseOrder { expected, found } => write!(
        f,
        "frame phase out of order: expected {:?}, pipeline is {:?}",
        expected, found
      ),
      Self::Io(e) => write!(f, "I/O error: {}", e),
      Self::Parse(e) => write!(f, "config parse error: {}", e),
    }
  }
}

impl std::error::Error for DisplayError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      Self::Io(e) => Some(e),
      Self::Parse(e) => Some(e),
      _ => None,
    }
  }
}
