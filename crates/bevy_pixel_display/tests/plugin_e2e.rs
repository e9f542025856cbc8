//! E2E tests for `PixelDisplayPlugin` in a headless app.
//!
//! Tests cover:
//! - Camera graph setup (render targets, samplers, viewport, camera targets)
//! - Letterbox updates on window resize
//! - Live-edit reapplication of camera parameters
//! - Fatal setup errors (invalid config, oversized render target)
//! - Idempotent teardown restoring the scene camera
//!
//! Run with:
//!   cargo test -p bevy_pixel_display --test plugin_e2e

use bevy::camera::visibility::RenderLayers;
use bevy::camera::{RenderTarget, ScalingMode};
use bevy::ecs::system::RunSystemOnce;
use bevy::image::{ImageFilterMode, ImageSampler};
use bevy::prelude::*;
use bevy::window::{PrimaryWindow, WindowRef, WindowResolution};
use bevy_pixel_display::plugin::{PixelPresentCamera, PixelUpscaleCamera, teardown_pixel_display};
use bevy_pixel_display::{
  DisplayConfig, DisplayLifecycle, PixelDisplayCamera, PixelDisplayPlugin, PixelDisplayState,
};

struct TestHarness {
  app: App,
  window: Entity,
  camera: Entity,
}

impl TestHarness {
  fn new(plugin: PixelDisplayPlugin) -> Self {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.add_plugins(bevy::transform::TransformPlugin);
    app.add_plugins(bevy::asset::AssetPlugin::default());
    // ImagePlugin registers the Image asset type
    app.add_plugins(bevy::image::ImagePlugin::default());
    app.add_plugins(plugin);

    let window = app
      .world_mut()
      .spawn((
        Window {
          resolution: WindowResolution::new(1920, 1080),
          ..default()
        },
        PrimaryWindow,
      ))
      .id();
    let camera = app.world_mut().spawn((Camera2d, PixelDisplayCamera)).id();

    Self {
      app,
      window,
      camera,
    }
  }

  fn state(&self) -> &PixelDisplayState {
    self.app.world().resource::<PixelDisplayState>()
  }

  fn image(&self, handle: &Handle<Image>) -> Option<&Image> {
    self.app.world().resource::<Assets<Image>>().get(handle)
  }

  fn native(&self) -> Handle<Image> {
    self.state().surfaces.as_ref().expect("surfaces").native.clone()
  }

  fn scaled(&self) -> Handle<Image> {
    self.state().surfaces.as_ref().expect("surfaces").scaled.clone()
  }

  fn present_camera(&mut self) -> Camera {
    let world = self.app.world_mut();
    let mut query = world.query_filtered::<&Camera, With<PixelPresentCamera>>();
    query.single(world).expect("one present camera").clone()
  }

  fn scene_camera(&self) -> &Camera {
    self.app.world().get::<Camera>(self.camera).expect("scene camera")
  }

  fn resize_window(&mut self, width: u32, height: u32) {
    let mut window = self
      .app
      .world_mut()
      .get_mut::<Window>(self.window)
      .expect("window");
    window.resolution.set_physical_resolution(width, height);
  }

  fn count<F: bevy::ecs::query::QueryFilter>(&mut self) -> usize {
    let world = self.app.world_mut();
    world.query_filtered::<Entity, F>().iter(world).count()
  }
}

fn mag_filter(image: &Image) -> Option<ImageFilterMode> {
  match &image.sampler {
    ImageSampler::Descriptor(descriptor) => Some(descriptor.mag_filter),
    ImageSampler::Default => None,
  }
}

#[test]
fn setup_builds_render_targets() {
  let mut harness = TestHarness::new(PixelDisplayPlugin::default());
  harness.app.update();

  assert_eq!(harness.state().lifecycle, DisplayLifecycle::Active);

  let native = harness.image(&harness.native()).expect("native image");
  assert_eq!(native.size(), UVec2::new(640, 480));
  assert_eq!(mag_filter(native), Some(ImageFilterMode::Nearest));

  let scaled = harness.image(&harness.scaled()).expect("scaled image");
  assert_eq!(scaled.size(), UVec2::new(2560, 1920));
  assert_eq!(mag_filter(scaled), Some(ImageFilterMode::Linear));
}

#[test]
fn scene_camera_renders_into_native_target() {
  let mut harness = TestHarness::new(PixelDisplayPlugin::default());
  harness.app.update();

  let native = harness.native();
  let camera = harness.scene_camera();
  match &camera.target {
    RenderTarget::Image(target) => assert_eq!(target.handle, native),
    other => panic!("scene camera should target the native image, got {other:?}"),
  }
  assert!(camera.viewport.is_none());

  let projection = harness
    .app
    .world()
    .get::<Projection>(harness.camera)
    .expect("projection");
  let Projection::Orthographic(ortho) = projection else {
    panic!("scene projection should be orthographic");
  };
  let ScalingMode::Fixed { width, height } = ortho.scaling_mode else {
    panic!("scene scaling mode should be fixed");
  };
  assert!((width - 6.4).abs() < 1e-5);
  assert!((height - 4.8).abs() < 1e-5);
  assert_eq!((ortho.near, ortho.far), (-0.5, 0.5));
}

#[test]
fn present_camera_is_pillarboxed() {
  let mut harness = TestHarness::new(PixelDisplayPlugin::default());
  harness.app.update();

  let camera = harness.present_camera();
  assert!(matches!(
    camera.target,
    RenderTarget::Window(WindowRef::Primary)
  ));
  let viewport = camera.viewport.expect("present viewport");
  assert_eq!(viewport.physical_position, UVec2::new(240, 0));
  assert_eq!(viewport.physical_size, UVec2::new(1440, 1080));

  let scaled = harness.scaled();
  let world = harness.app.world_mut();
  let mut upscale = world.query_filtered::<&Camera, With<PixelUpscaleCamera>>();
  let upscale = upscale.single(world).expect("one upscale camera");
  match &upscale.target {
    RenderTarget::Image(target) => assert_eq!(target.handle, scaled),
    other => panic!("upscale camera should target the scaled image, got {other:?}"),
  }
}

#[test]
fn resize_switches_to_letterbox() {
  let mut harness = TestHarness::new(PixelDisplayPlugin::default());
  harness.app.update();

  harness.resize_window(800, 1200);
  harness.app.update();

  let viewport = harness.present_camera().viewport.expect("present viewport");
  assert_eq!(viewport.physical_position, UVec2::new(0, 300));
  assert_eq!(viewport.physical_size, UVec2::new(800, 600));

  let rect = harness.state().viewport;
  assert_eq!((rect.y, rect.height), (0.25, 0.5));
}

#[test]
fn matching_aspect_clears_viewport() {
  let mut harness = TestHarness::new(PixelDisplayPlugin::default());
  harness.app.update();

  harness.resize_window(800, 600);
  harness.app.update();

  assert!(harness.present_camera().viewport.is_none());
  assert!(harness.state().viewport.is_full());
}

#[test]
fn native_sampler_is_forced_back_to_nearest() {
  let mut harness = TestHarness::new(PixelDisplayPlugin::default());
  harness.app.update();

  let native = harness.native();
  harness
    .app
    .world_mut()
    .resource_mut::<Assets<Image>>()
    .get_mut(&native)
    .expect("native image")
    .sampler = ImageSampler::linear();
  harness.app.update();

  let image = harness.image(&native).expect("native image");
  assert_eq!(mag_filter(image), Some(ImageFilterMode::Nearest));
}

#[test]
fn live_edit_reapplies_projection() {
  let mut harness = TestHarness::new(PixelDisplayPlugin::default().live_edit(true));
  harness.app.update();

  harness
    .app
    .world_mut()
    .resource_mut::<DisplayConfig>()
    .pixels_per_unit = 50;
  harness.app.update();

  let Some(Projection::Orthographic(ortho)) = harness.app.world().get::<Projection>(harness.camera)
  else {
    panic!("scene projection should be orthographic");
  };
  let ScalingMode::Fixed { height, .. } = ortho.scaling_mode else {
    panic!("scene scaling mode should be fixed");
  };
  assert!((height - 9.6).abs() < 1e-5);

  // Render targets keep their session size
  let native = harness.image(&harness.native()).expect("native image");
  assert_eq!(native.size(), UVec2::new(640, 480));
}

#[test]
fn live_edit_leaves_unchanged_projection_alone() {
  let mut harness = TestHarness::new(PixelDisplayPlugin::default().live_edit(true));
  harness.app.update();
  harness.app.update();

  let changed_at = |harness: &TestHarness| {
    harness
      .app
      .world()
      .entity(harness.camera)
      .get_ref::<Projection>()
      .expect("projection")
      .last_changed()
  };
  let before = changed_at(&harness);
  harness.app.update();
  harness.app.update();
  assert_eq!(changed_at(&harness), before);

  harness
    .app
    .world_mut()
    .resource_mut::<DisplayConfig>()
    .pixels_per_unit = 50;
  harness.app.update();
  assert_ne!(changed_at(&harness), before);
}

#[test]
fn invalid_config_fails_setup() {
  let mut harness = TestHarness::new(PixelDisplayPlugin::new(DisplayConfig::new(0, 480)));
  let images_before = harness.app.world().resource::<Assets<Image>>().len();
  harness.app.update();
  harness.app.update();

  assert_eq!(harness.state().lifecycle, DisplayLifecycle::Failed);
  assert!(harness.state().surfaces.is_none());
  assert_eq!(harness.count::<With<PixelPresentCamera>>(), 0);
  assert_eq!(
    harness.app.world().resource::<Assets<Image>>().len(),
    images_before,
    "no render target is left allocated"
  );
}

#[test]
fn oversized_render_target_fails_setup() {
  // 640 × 13 = 8320 exceeds the 8192 texture limit; native is allocated first
  let config = DisplayConfig::new(640, 480).with_scale_factor(13);
  let mut harness = TestHarness::new(PixelDisplayPlugin::new(config));
  let images_before = harness.app.world().resource::<Assets<Image>>().len();
  harness.app.update();

  assert_eq!(harness.state().lifecycle, DisplayLifecycle::Failed);
  assert!(harness.state().surfaces.is_none());
  assert_eq!(harness.count::<With<PixelUpscaleCamera>>(), 0);
  assert_eq!(
    harness.app.world().resource::<Assets<Image>>().len(),
    images_before,
    "the native render target is released"
  );
  assert!(matches!(
    harness.scene_camera().target,
    RenderTarget::Window(WindowRef::Primary)
  ));
}

#[test]
fn setup_waits_for_a_marked_camera() {
  let mut harness = TestHarness::new(PixelDisplayPlugin::default());
  harness
    .app
    .world_mut()
    .entity_mut(harness.camera)
    .remove::<PixelDisplayCamera>();
  harness.app.update();
  assert_eq!(harness.state().lifecycle, DisplayLifecycle::Pending);

  harness
    .app
    .world_mut()
    .entity_mut(harness.camera)
    .insert(PixelDisplayCamera);
  harness.app.update();
  assert_eq!(harness.state().lifecycle, DisplayLifecycle::Active);
}

#[test]
fn teardown_restores_existing_layers_and_order() {
  let mut harness = TestHarness::new(PixelDisplayPlugin::default());
  let mut scene = harness.app.world_mut().entity_mut(harness.camera);
  scene.insert(RenderLayers::layer(3));
  scene.get_mut::<Camera>().expect("scene camera").order = 5;
  harness.app.update();

  assert_eq!(harness.scene_camera().order, -2);
  harness
    .app
    .world_mut()
    .run_system_once(teardown_pixel_display)
    .expect("teardown runs");

  assert_eq!(harness.scene_camera().order, 5);
  assert_eq!(
    harness.app.world().get::<RenderLayers>(harness.camera),
    Some(&RenderLayers::layer(3))
  );
}

#[test]
fn teardown_is_idempotent() {
  let mut harness = TestHarness::new(PixelDisplayPlugin::default());
  harness.app.update();

  let native = harness.native();
  let scaled = harness.scaled();

  harness
    .app
    .world_mut()
    .run_system_once(teardown_pixel_display)
    .expect("teardown runs");
  harness
    .app
    .world_mut()
    .run_system_once(teardown_pixel_display)
    .expect("second teardown runs");

  assert_eq!(harness.state().lifecycle, DisplayLifecycle::TornDown);
  assert!(harness.state().surfaces.is_none());
  assert!(harness.image(&native).is_none());
  assert!(harness.image(&scaled).is_none());
  assert_eq!(harness.count::<With<PixelPresentCamera>>(), 0);
  assert_eq!(harness.count::<With<PixelUpscaleCamera>>(), 0);

  let camera = harness.scene_camera();
  assert!(matches!(
    camera.target,
    RenderTarget::Window(WindowRef::Primary)
  ));
  assert!(camera.viewport.is_none());
  assert_eq!(camera.order, 0);
  assert!(
    harness
      .app
      .world()
      .get::<RenderLayers>(harness.camera)
      .is_none()
  );

  // Frames after teardown do nothing
  harness.app.update();
  assert_eq!(harness.state().lifecycle, DisplayLifecycle::TornDown);
}
