//! Bevy host for the pixel display.
//!
//! # Usage
//!
//! ```ignore
//! use bevy_pixel_display::{DisplayConfig, PixelDisplayCamera, PixelDisplayPlugin};
//!
//! app.add_plugins(PixelDisplayPlugin::new(DisplayConfig::new(320, 180)));
//!
//! // Mark your game camera with PixelDisplayCamera
//! commands.spawn((Camera2d, PixelDisplayCamera));
//! ```
//!
//! # Architecture
//!
//! Uses three cameras:
//! 1. **Scene Camera** (the marked camera): renders layers 0-29 into the
//!    native render target at the virtual resolution.
//! 2. **Upscale Camera**: renders a sprite of the native target (nearest
//!    sampling) into the scaled render target, layer 30.
//! 3. **Present Camera**: renders a sprite of the scaled target (linear
//!    sampling) to the window inside the letterboxed viewport, layer 31.
//!
//! Game content must stay off layers 30 and 31 and within half a world unit
//! of the scene camera's z.

mod adapters;
mod components;
mod setup;
mod state;
mod systems;

use bevy::prelude::*;
use bevy::transform::TransformSystems;
pub use adapters::{BevyDisplayCamera, ImageSurfaces};
pub use components::{PixelBlitSprite, PixelDisplayCamera, PixelPresentCamera, PixelUpscaleCamera};
pub use setup::{PRESENT_LAYER, UPSCALE_LAYER};
pub use state::{DisplayLifecycle, PixelDisplayState, PixelDisplaySettings, SceneCameraRestore};
pub use systems::teardown_pixel_display;

use crate::config::DisplayConfig;

/// System set for the per-frame pixel display systems.
///
/// Runs in `PostUpdate` after `TransformSystems::Propagate`.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct PixelDisplaySet;

/// Plugin for fixed-resolution pixel-perfect display.
///
/// Add this plugin after `DefaultPlugins`. A [`DisplayConfig`] resource
/// inserted before the plugin takes precedence over the plugin's config.
#[derive(Clone, Debug, Default)]
pub struct PixelDisplayPlugin {
  pub config: DisplayConfig,
  pub live_edit: bool,
}

impl PixelDisplayPlugin {
  pub fn new(config: DisplayConfig) -> Self {
    Self {
      config,
      live_edit: false,
    }
  }

  /// Reapply camera parameters from the [`DisplayConfig`] resource every
  /// frame, e.g. while the config file is hot-reloaded.
  pub fn live_edit(mut self, enabled: bool) -> Self {
    self.live_edit = enabled;
    self
  }
}

impl Plugin for PixelDisplayPlugin {
  fn build(&self, app: &mut App) {
    if !app.world().contains_resource::<DisplayConfig>() {
      app.insert_resource(self.config);
    }
    app.insert_resource(PixelDisplaySettings {
      live_edit: self.live_edit,
    });
    app.init_resource::<PixelDisplayState>();

    app.configure_sets(
      PostUpdate,
      PixelDisplaySet.after(TransformSystems::Propagate),
    );

    // Setup waits in Update until the window and the marked camera exist
    app.add_systems(
      Update,
      setup::setup_pixel_display.run_if(pixel_display_pending),
    );

    app.add_systems(
      PostUpdate,
      (
        systems::refresh_camera_params.run_if(live_edit_enabled),
        systems::enforce_native_sampler,
        systems::watch_display_resize,
      )
        .chain()
        .in_set(PixelDisplaySet)
        .run_if(pixel_display_active),
    );

    app.add_systems(
      Last,
      systems::teardown_pixel_display.run_if(systems::app_exit_requested),
    );
  }
}

/// Run condition: setup has not run yet.
fn pixel_display_pending(state: Res<PixelDisplayState>) -> bool {
  state.lifecycle == DisplayLifecycle::Pending
}

/// Run condition: the camera graph is live.
fn pixel_display_active(state: Res<PixelDisplayState>) -> bool {
  state.is_active()
}

fn live_edit_enabled(settings: Res<PixelDisplaySettings>) -> bool {
  settings.live_edit
}
