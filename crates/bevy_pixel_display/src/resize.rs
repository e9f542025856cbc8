//! Display-size change detection.

use crate::config::DisplayConfig;
use crate::viewport::{DisplaySize, ViewportRect, compute_viewport};

/// Recomputes the viewport when the display size changes between frames.
#[derive(Clone, Debug)]
pub struct ResizeWatcher {
  last: DisplaySize,
  target_width: u32,
  target_height: u32,
}

impl ResizeWatcher {
  /// Starts watching from the size seen at initialization.
  pub fn new(initial: DisplaySize, config: &DisplayConfig) -> Self {
    Self {
      last: initial,
      target_width: config.virtual_width,
      target_height: config.virtual_height,
    }
  }

  /// Last display size a viewport was computed for.
  #[inline]
  pub fn last_size(&self) -> DisplaySize {
    self.last
  }

  /// Returns the new viewport if `current` differs from the last seen size.
  ///
  /// Zero-area sizes (minimized windows) are ignored and do not replace the
  /// held size.
  pub fn check_and_update(&mut self, current: DisplaySize) -> Option<ViewportRect> {
    if current == self.last {
      return None;
    }

    if current.is_empty() {
      log::debug!(
        "ignoring empty display size {}x{}",
        current.width,
        current.height
      );
      return None;
    }

    match compute_viewport(
      current.width,
      current.height,
      self.target_width,
      self.target_height,
    ) {
      Ok(rect) => {
        log::info!(
          "display resized {}x{} -> {}x{}, viewport {:?}",
          self.last.width,
          self.last.height,
          current.width,
          current.height,
          rect
        );
        self.last = current;
        Some(rect)
      }
      Err(err) => {
        log::warn!("viewport not recomputed: {}", err);
        None
      }
    }
  }
}
