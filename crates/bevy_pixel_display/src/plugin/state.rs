//! Runtime state for the pixel display plugin.

use bevy::camera::visibility::RenderLayers;
use bevy::prelude::*;

use crate::config::DisplayConfig;
use crate::pipeline::RenderSurfaces;
use crate::resize::ResizeWatcher;
use crate::viewport::ViewportRect;

/// Lifecycle of the plugin's camera graph.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DisplayLifecycle {
  /// Waiting for a window and a `PixelDisplayCamera`.
  #[default]
  Pending,
  Active,
  /// Setup hit a fatal error; nothing was left allocated.
  Failed,
  /// Surfaces released. Terminal.
  TornDown,
}

/// Scene camera settings overwritten by setup, put back on teardown.
#[derive(Clone, Debug)]
pub struct SceneCameraRestore {
  pub order: isize,
  /// `None` if the camera had no `RenderLayers` component.
  pub layers: Option<RenderLayers>,
}

#[derive(Resource, Default)]
pub struct PixelDisplayState {
  /// Native and scaled render targets while active.
  pub surfaces: Option<RenderSurfaces<Handle<Image>>>,
  /// Current letterbox/pillarbox rectangle of the present camera.
  pub viewport: ViewportRect,
  /// Config the surfaces were allocated for.
  pub session_config: Option<DisplayConfig>,
  pub watcher: Option<ResizeWatcher>,
  pub scene_restore: Option<SceneCameraRestore>,
  pub lifecycle: DisplayLifecycle,
}

impl PixelDisplayState {
  #[inline]
  pub fn is_active(&self) -> bool {
    self.lifecycle == DisplayLifecycle::Active
  }
}

/// Plugin-wide settings.
#[derive(Resource, Clone, Copy, Debug, Default)]
pub struct PixelDisplaySettings {
  /// Reapply camera parameters from [`DisplayConfig`] every frame.
  pub live_edit: bool,
}
