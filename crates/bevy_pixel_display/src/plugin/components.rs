//! Marker components for the pixel display camera graph.

use bevy::prelude::*;

/// Marks the game camera that should render through the pixel display.
///
/// The camera becomes the scene camera: it renders the virtual grid into the
/// native surface.
#[derive(Component, Default)]
pub struct PixelDisplayCamera;

/// Camera that magnifies the native surface into the scaled surface.
#[derive(Component)]
pub struct PixelUpscaleCamera;

/// Camera that presents the scaled surface inside the letterboxed viewport.
#[derive(Component)]
pub struct PixelPresentCamera;

/// Full-surface sprite sampled by the upscale or present camera.
#[derive(Component)]
pub struct PixelBlitSprite;
