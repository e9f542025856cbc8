//! E2E tests for the full display cycle on the software backend.
//!
//! Drives `PixelPerfectDisplay` through initialize, several frames, a display
//! resize and teardown, and checks the composited output pixel by pixel.
//!
//! Run with:
//!   cargo test -p bevy_pixel_display --test display_cycle_e2e

use bevy_pixel_display::{
  DisplayConfig, DisplaySize, FramePhase, OrthoCamera, PixelBuffer, PixelPerfectDisplay, Rgba,
  SoftwareBackend, SurfaceId, ViewportRect,
};

const BAR: Rgba = [0, 0, 0, 255];

/// 4×2 virtual grid, 2× upscale, 1 world unit per pixel.
fn config() -> DisplayConfig {
  DisplayConfig::new(4, 2)
    .with_pixels_per_unit(1)
    .with_scale_factor(2)
}

/// Distinct color for every virtual pixel.
fn scene_color(x: u32, y: u32) -> Rgba {
  [(x * 60) as u8, (y * 120) as u8, 200, 255]
}

fn draw_scene(backend: &mut SoftwareBackend, native: &SurfaceId) {
  let pixels = backend.surface_mut(native).expect("native surface");
  for y in 0..pixels.height() {
    for x in 0..pixels.width() {
      pixels.set(x, y, scene_color(x, y));
    }
  }
}

struct Harness {
  display: PixelPerfectDisplay<SoftwareBackend>,
  camera: OrthoCamera<SurfaceId>,
}

impl Harness {
  fn new(size: DisplaySize) -> Self {
    let mut camera = OrthoCamera::default();
    let display = PixelPerfectDisplay::initialize(config(), size, SoftwareBackend::new(size), &mut camera)
      .expect("display initializes");
    Self { display, camera }
  }

  fn resize(&mut self, size: DisplaySize) -> Option<ViewportRect> {
    self.display.backend_mut().resize_output(size);
    self.display.update(size, false, &mut self.camera)
  }

  fn frame(&mut self) {
    self
      .display
      .render_frame(&mut self.camera, draw_scene)
      .expect("frame renders");
  }

  fn output(&self) -> &PixelBuffer {
    self.display.backend().output()
  }

  fn scaled(&self) -> &PixelBuffer {
    let surfaces = self.display.surfaces().expect("surfaces live");
    self
      .display
      .backend()
      .surface(&surfaces.scaled)
      .expect("scaled surface")
  }
}

#[test]
fn scaled_surface_holds_uniform_blocks() {
  let mut harness = Harness::new(DisplaySize::new(16, 4));
  harness.frame();

  let scaled = harness.scaled();
  assert_eq!((scaled.width(), scaled.height()), (8, 4));
  for y in 0..4 {
    for x in 0..8 {
      assert_eq!(
        scaled.get(x, y),
        Some(scene_color(x / 2, y / 2)),
        "scaled texel ({x}, {y})"
      );
    }
  }
}

#[test]
fn pillarbox_output_has_side_bars() {
  // 16×4 is wider than 4×2: viewport x = 0.25, width = 0.5
  let mut harness = Harness::new(DisplaySize::new(16, 4));
  assert_eq!(harness.display.viewport().x, 0.25);
  harness.frame();

  let output = harness.output();
  for y in 0..4 {
    for x in 0..16 {
      let expected = if (4..12).contains(&x) {
        scene_color((x - 4) / 2, y / 2)
      } else {
        BAR
      };
      assert_eq!(output.get(x, y), Some(expected), "output pixel ({x}, {y})");
    }
  }
}

#[test]
fn matching_aspect_fills_the_display() {
  let mut harness = Harness::new(DisplaySize::new(8, 4));
  assert!(harness.display.viewport().is_full());
  harness.frame();

  let output = harness.output();
  assert_eq!(output.get(0, 0), Some(scene_color(0, 0)));
  assert_eq!(output.get(7, 3), Some(scene_color(3, 1)));
}

#[test]
fn resize_moves_bars_from_sides_to_top_and_bottom() {
  let mut harness = Harness::new(DisplaySize::new(16, 4));
  harness.frame();

  // Same size again: nothing to do
  assert_eq!(harness.resize(DisplaySize::new(16, 4)), None);

  // 4×4 is narrower than 4×2: viewport y = 0.25, height = 0.5
  let rect = harness
    .resize(DisplaySize::new(4, 4))
    .expect("viewport changes");
  assert_eq!((rect.x, rect.width), (0.0, 1.0));
  assert_eq!((rect.y, rect.height), (0.25, 0.5));

  // Until post-render the camera keeps the old rect
  assert_eq!(harness.camera.viewport.x, 0.25);

  harness.frame();
  assert_eq!(harness.camera.viewport, rect);

  let output = harness.output();
  assert_eq!((output.width(), output.height()), (4, 4));
  for x in 0..4 {
    assert_eq!(output.get(x, 0), Some(BAR));
    assert_eq!(output.get(x, 3), Some(BAR));
    // Each output pixel covers one 2×2 block of identical texels
    assert_eq!(output.get(x, 1), Some(scene_color(x, 0)));
    assert_eq!(output.get(x, 2), Some(scene_color(x, 1)));
  }
}

#[test]
fn zero_sized_resize_keeps_the_last_viewport() {
  let mut harness = Harness::new(DisplaySize::new(16, 4));
  let before = harness.display.viewport();

  assert_eq!(harness.display.update(DisplaySize::new(0, 0), false, &mut harness.camera), None);
  harness.frame();
  assert_eq!(harness.display.viewport(), before);
}

#[test]
fn camera_state_between_frames_is_restored() {
  let mut harness = Harness::new(DisplaySize::new(16, 4));

  for _ in 0..3 {
    harness.frame();
    assert_eq!(harness.display.phase(), FramePhase::Idle);
    assert_eq!(harness.camera.target, None);
    assert_eq!(harness.camera.viewport, harness.display.viewport());
  }

  let params = harness.display.camera_params();
  assert!(params.orthographic);
  assert_eq!(params.half_height, 1.0);
  assert_eq!(params.aspect, 2.0);
}

#[test]
fn teardown_releases_everything_and_is_repeatable() {
  let mut harness = Harness::new(DisplaySize::new(16, 4));
  harness.frame();
  assert_eq!(harness.display.backend().live_surfaces(), 2);

  harness.display.teardown();
  harness.display.teardown();

  assert_eq!(harness.display.phase(), FramePhase::TornDown);
  assert!(harness.display.surfaces().is_none());
  assert_eq!(harness.display.backend().live_surfaces(), 0);
  assert!(
    harness
      .display
      .render_frame(&mut harness.camera, draw_scene)
      .is_err()
  );
}

#[test]
fn oversized_scale_factor_fails_without_leaking() {
  let size = DisplaySize::new(16, 4);
  let mut backend = SoftwareBackend::new(size).with_max_dimension(6);
  let mut camera = OrthoCamera::default();

  // Native 4×2 fits, scaled 8×4 does not
  assert!(PixelPerfectDisplay::initialize(config(), size, &mut backend, &mut camera).is_err());
  assert_eq!(backend.live_surfaces(), 0);
  assert_eq!(camera.target, None);
}
