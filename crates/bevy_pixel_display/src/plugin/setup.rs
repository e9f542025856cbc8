//! Setup system for the pixel display camera graph.

use bevy::camera::visibility::RenderLayers;
use bevy::camera::{RenderTarget, ScalingMode};
use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use super::adapters::{BevyDisplayCamera, ImageSurfaces};
use super::components::{
  PixelBlitSprite, PixelDisplayCamera, PixelPresentCamera, PixelUpscaleCamera,
};
use super::state::{DisplayLifecycle, PixelDisplayState, SceneCameraRestore};
use crate::camera::{CameraParams, DisplayCamera};
use crate::config::DisplayConfig;
use crate::error::DisplayError;
use crate::pipeline::allocate_surfaces;
use crate::resize::ResizeWatcher;
use crate::viewport::{DisplaySize, ViewportRect, compute_viewport};

/// Layer seen only by the upscale camera.
pub const UPSCALE_LAYER: usize = 30;

/// Layer seen only by the present camera.
pub const PRESENT_LAYER: usize = 31;

const SCENE_ORDER: isize = -2;
const UPSCALE_ORDER: isize = -1;
const PRESENT_ORDER: isize = 0;

/// System: Builds the camera graph once a window and a
/// [`PixelDisplayCamera`] exist.
///
/// Creates:
/// - native render target (virtual resolution, nearest)
/// - scaled render target (`scale_factor` × virtual, linear)
/// - upscale camera + sprite: native → scaled
/// - present camera + sprite: scaled → window, inside the viewport
///
/// The scene camera keeps the redirected state (full rect, native target) and
/// the present camera keeps the restored state (viewport rect, window
/// target), so the three render phases need no per-frame camera swaps.
pub fn setup_pixel_display(
  mut commands: Commands,
  config: Res<DisplayConfig>,
  mut state: ResMut<PixelDisplayState>,
  mut images: ResMut<Assets<Image>>,
  mut scene_cameras: Query<
    (Entity, &mut Camera, &mut Projection, Option<&RenderLayers>),
    With<PixelDisplayCamera>,
  >,
  windows: Query<&Window, With<PrimaryWindow>>,
) {
  if state.lifecycle != DisplayLifecycle::Pending {
    return;
  }

  let Ok((scene_entity, mut camera, mut projection, layers)) = scene_cameras.single_mut() else {
    return;
  };

  let Ok(window) = windows.single() else {
    return;
  };

  let display = DisplaySize::new(window.physical_width(), window.physical_height());
  if display.is_empty() {
    return;
  }

  let (params, viewport) = match prepare(&config, display) {
    Ok(prepared) => prepared,
    Err(err) => {
      error!("Pixel display setup failed: {}", err);
      state.lifecycle = DisplayLifecycle::Failed;
      return;
    }
  };

  let surfaces = match allocate_surfaces(&*config, &mut ImageSurfaces::new(&mut images)) {
    Ok(surfaces) => surfaces,
    Err(err) => {
      error!("Pixel display setup failed: {}", err);
      state.lifecycle = DisplayLifecycle::Failed;
      return;
    }
  };

  let scene_restore = SceneCameraRestore {
    order: camera.order,
    layers: layers.cloned(),
  };

  // Scene camera: virtual grid projection, renders into native
  {
    let mut scene = BevyDisplayCamera::new(&mut camera, &mut projection, display);
    params.apply(&mut scene);
    scene.set_viewport_rect(ViewportRect::FULL);
    scene.set_render_target(Some(surfaces.native.clone()));
  }
  camera.order = SCENE_ORDER;
  let scene_layers: RenderLayers = (0..UPSCALE_LAYER).collect();
  commands.entity(scene_entity).insert(scene_layers);

  let scaled_size = config.scaled_size().as_vec2();

  // Native → scaled, nearest sampling on the native image
  commands.spawn((
    Name::new("PixelUpscaleCamera"),
    PixelUpscaleCamera,
    Camera2d,
    Camera {
      order: UPSCALE_ORDER,
      target: RenderTarget::Image(surfaces.scaled.clone().into()),
      clear_color: ClearColorConfig::Custom(Color::BLACK),
      ..default()
    },
    blit_projection(scaled_size),
    RenderLayers::layer(UPSCALE_LAYER),
  ));
  commands.spawn((
    Name::new("PixelUpscaleSprite"),
    PixelBlitSprite,
    Sprite {
      image: surfaces.native.clone(),
      custom_size: Some(scaled_size),
      ..default()
    },
    Transform::default(),
    RenderLayers::layer(UPSCALE_LAYER),
  ));

  // Scaled → window, linear sampling on the scaled image
  let mut present_camera = Camera {
    order: PRESENT_ORDER,
    clear_color: ClearColorConfig::Custom(Color::BLACK),
    ..default()
  };
  let mut present_projection = blit_projection(scaled_size);
  {
    let mut present = BevyDisplayCamera::new(&mut present_camera, &mut present_projection, display);
    present.set_viewport_rect(viewport);
    present.set_render_target(None);
  }
  commands.spawn((
    Name::new("PixelPresentCamera"),
    PixelPresentCamera,
    Camera2d,
    present_camera,
    present_projection,
    RenderLayers::layer(PRESENT_LAYER),
  ));
  commands.spawn((
    Name::new("PixelPresentSprite"),
    PixelBlitSprite,
    Sprite {
      image: surfaces.scaled.clone(),
      custom_size: Some(scaled_size),
      ..default()
    },
    Transform::default(),
    RenderLayers::layer(PRESENT_LAYER),
  ));

  let (display_width, display_height) = (display.width, display.height);
  info!(
    "Pixel display: {}x{} virtual, x{} upscale, {}x{} window, viewport {:?}",
    config.virtual_width,
    config.virtual_height,
    config.scale_factor,
    display_width,
    display_height,
    viewport
  );

  state.surfaces = Some(surfaces);
  state.viewport = viewport;
  state.session_config = Some(*config);
  state.watcher = Some(ResizeWatcher::new(display, &config));
  state.scene_restore = Some(scene_restore);
  state.lifecycle = DisplayLifecycle::Active;
}

/// Validates everything that can fail before any render target exists.
fn prepare(
  config: &DisplayConfig,
  display: DisplaySize,
) -> Result<(CameraParams, ViewportRect), DisplayError> {
  config.validate()?;
  let params = CameraParams::try_from(config)?;
  let viewport = compute_viewport(
    display.width,
    display.height,
    config.virtual_width,
    config.virtual_height,
  )?;
  Ok((params, viewport))
}

/// Projection that maps a sprite of `size` exactly onto the camera output.
pub(crate) fn blit_projection(size: Vec2) -> Projection {
  Projection::Orthographic(OrthographicProjection {
    near: -1.0,
    far: 1.0,
    scaling_mode: ScalingMode::Fixed {
      width: size.x,
      height: size.y,
    },
    ..OrthographicProjection::default_2d()
  })
}
