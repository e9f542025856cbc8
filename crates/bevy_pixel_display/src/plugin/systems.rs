//! Per-frame and teardown systems for the pixel display.

use bevy::camera::visibility::RenderLayers;
use bevy::ecs::message::MessageReader;
use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use super::adapters::{BevyDisplayCamera, ImageSurfaces, projection_matches};
use super::components::{
  PixelBlitSprite, PixelDisplayCamera, PixelPresentCamera, PixelUpscaleCamera,
};
use super::state::{DisplayLifecycle, PixelDisplayState};
use crate::camera::{CameraParams, DisplayCamera};
use crate::config::DisplayConfig;
use crate::pipeline::release_surfaces;
use crate::surface::{FilterMode, SurfaceAllocator};
use crate::viewport::{DisplaySize, ViewportRect};

fn primary_display_size(windows: &Query<&Window, With<PrimaryWindow>>) -> Option<DisplaySize> {
  windows
    .single()
    .ok()
    .map(|window| DisplaySize::new(window.physical_width(), window.physical_height()))
}

/// System: Reapplies camera parameters from [`DisplayConfig`] every frame.
///
/// Only scheduled in live-edit mode. Edits to the virtual resolution or scale
/// factor change the projection immediately, but the render targets keep
/// their session size until the app restarts.
pub fn refresh_camera_params(
  config: Res<DisplayConfig>,
  state: Res<PixelDisplayState>,
  mut scene_cameras: Query<(&mut Camera, &mut Projection), With<PixelDisplayCamera>>,
  windows: Query<&Window, With<PrimaryWindow>>,
) {
  let params = match CameraParams::try_from(&*config) {
    Ok(params) => params,
    Err(err) => {
      if config.is_changed() {
        warn!("Ignoring edited display config: {}", err);
      }
      return;
    }
  };

  if config.is_changed() {
    if let Some(session) = state.session_config {
      if session.native_size() != config.native_size() || session.scale_factor != config.scale_factor
      {
        warn!(
          "Display surfaces stay at {}x{} x{} until restart",
          session.virtual_width, session.virtual_height, session.scale_factor
        );
      }
    }
  }

  let display = primary_display_size(&windows).unwrap_or_default();
  for (mut camera, mut projection) in scene_cameras.iter_mut() {
    // Writing through Mut marks the projection changed
    if projection_matches(&projection, &params) {
      continue;
    }
    params.apply(&mut BevyDisplayCamera::new(
      &mut camera,
      &mut projection,
      display,
    ));
  }
}

/// System: Keeps the native render target on nearest sampling.
pub fn enforce_native_sampler(state: Res<PixelDisplayState>, mut images: ResMut<Assets<Image>>) {
  let Some(surfaces) = state.surfaces.as_ref() else {
    return;
  };

  let mut allocator = ImageSurfaces::new(&mut images);
  if allocator.filter(&surfaces.native) != Some(FilterMode::Nearest) {
    debug!("Restoring nearest sampling on native render target");
    allocator.set_filter(&surfaces.native, FilterMode::Nearest);
  }
}

/// System: Moves the present camera's viewport when the window is resized.
pub fn watch_display_resize(
  mut state: ResMut<PixelDisplayState>,
  mut present_cameras: Query<(&mut Camera, &mut Projection), With<PixelPresentCamera>>,
  windows: Query<&Window, With<PrimaryWindow>>,
) {
  let Some(display) = primary_display_size(&windows) else {
    return;
  };

  let state = &mut *state;
  let Some(watcher) = state.watcher.as_mut() else {
    return;
  };
  let Some(rect) = watcher.check_and_update(display) else {
    return;
  };
  state.viewport = rect;

  for (mut camera, mut projection) in present_cameras.iter_mut() {
    BevyDisplayCamera::new(&mut camera, &mut projection, display).set_viewport_rect(rect);
  }
}

/// System: Releases the render targets and removes the helper cameras.
///
/// The scene camera goes back to rendering straight to the window with the
/// order and render layers it had before setup. Running it again after
/// teardown does nothing.
pub fn teardown_pixel_display(
  mut commands: Commands,
  mut state: ResMut<PixelDisplayState>,
  mut images: ResMut<Assets<Image>>,
  mut scene_cameras: Query<(Entity, &mut Camera, &mut Projection), With<PixelDisplayCamera>>,
  helpers: Query<
    Entity,
    Or<(
      With<PixelUpscaleCamera>,
      With<PixelPresentCamera>,
      With<PixelBlitSprite>,
    )>,
  >,
) {
  if state.lifecycle == DisplayLifecycle::TornDown {
    return;
  }

  if let Some(surfaces) = state.surfaces.take() {
    release_surfaces(&mut ImageSurfaces::new(&mut images), &surfaces);
  }

  for entity in helpers.iter() {
    commands.entity(entity).despawn();
  }

  let restore = state.scene_restore.take();
  for (entity, mut camera, mut projection) in scene_cameras.iter_mut() {
    let mut scene = BevyDisplayCamera::new(&mut camera, &mut projection, DisplaySize::default());
    scene.set_viewport_rect(ViewportRect::FULL);
    scene.set_render_target(None);

    if let Some(restore) = restore.as_ref() {
      camera.order = restore.order;
      match restore.layers.clone() {
        Some(layers) => commands.entity(entity).insert(layers),
        None => commands.entity(entity).remove::<RenderLayers>(),
      };
    }
  }

  state.watcher = None;
  state.lifecycle = DisplayLifecycle::TornDown;
  info!("Pixel display torn down");
}

/// Run condition: true once an [`AppExit`] message has been written.
pub fn app_exit_requested(mut exits: MessageReader<AppExit>) -> bool {
  exits.read().count() > 0
}
