//! Pixel Display - fixed-resolution pixel-perfect rendering for Bevy.
//!
//! The scene is rendered at a small virtual resolution, upscaled by an
//! integer factor with nearest sampling, then scaled to the window with
//! linear sampling inside an aspect-preserving viewport (letterbox or
//! pillarbox).
//!
//! The core types are engine-agnostic: [`PixelPerfectDisplay`] drives any
//! [`DisplayCamera`] and [`SurfaceBlitter`], and [`SoftwareBackend`] runs the
//! whole pipeline on CPU pixel buffers. [`PixelDisplayPlugin`] hosts the same
//! pipeline on Bevy cameras and render targets.

pub mod camera;
pub mod config;
pub mod display;
pub mod error;
pub mod pipeline;
pub mod plugin;
pub mod resize;
pub mod surface;
pub mod viewport;

pub use camera::{CameraParams, DisplayCamera, FAR_CLIP, NEAR_CLIP, OrthoCamera, compute_camera_params};
pub use config::DisplayConfig;
pub use display::PixelPerfectDisplay;
pub use error::DisplayError;
pub use pipeline::{FramePhase, RenderSurfaces, RenderTargetPipeline};
pub use plugin::{
  DisplayLifecycle, PixelDisplayCamera, PixelDisplayPlugin, PixelDisplaySet, PixelDisplaySettings,
  PixelDisplayState,
};
pub use resize::ResizeWatcher;
pub use surface::{
  BlitTarget, FilterMode, PixelBuffer, Rgba, SoftwareBackend, SurfaceAllocator, SurfaceBlitter,
  SurfaceDescriptor, SurfaceId,
};
pub use viewport::{DisplaySize, ViewportRect, compute_viewport};
