//! Bevy implementations of the camera and surface collaborators.

use bevy::camera::{RenderTarget, ScalingMode, Viewport};
use bevy::image::{ImageFilterMode, ImageSampler};
use bevy::prelude::*;
use bevy::render::render_resource::{
  Extent3d, TextureDescriptor, TextureDimension, TextureFormat, TextureUsages,
};
use bevy::window::WindowRef;

use crate::camera::{CameraParams, DisplayCamera};
use crate::error::DisplayError;
use crate::surface::{
  DEFAULT_MAX_DIMENSION, FilterMode, SurfaceAllocator, SurfaceDescriptor, SurfaceFormat,
};
use crate::viewport::{DisplaySize, ViewportRect};

/// `DisplayCamera` over a Bevy camera and its projection.
///
/// The viewport rect is converted to physical pixels using the display size
/// given at construction.
pub struct BevyDisplayCamera<'a> {
  camera: &'a mut Camera,
  projection: &'a mut Projection,
  display: DisplaySize,
}

impl<'a> BevyDisplayCamera<'a> {
  pub fn new(camera: &'a mut Camera, projection: &'a mut Projection, display: DisplaySize) -> Self {
    Self {
      camera,
      projection,
      display,
    }
  }

  fn ortho_mut(&mut self) -> Option<&mut OrthographicProjection> {
    match &mut *self.projection {
      Projection::Orthographic(ortho) => Some(ortho),
      _ => None,
    }
  }
}

/// Visible world size of a fixed orthographic projection, `(1, 1)` for any
/// other scaling mode.
fn fixed_extent(ortho: &OrthographicProjection) -> (f32, f32) {
  match ortho.scaling_mode {
    ScalingMode::Fixed { width, height } if height > 0.0 => (width, height),
    _ => (1.0, 1.0),
  }
}

/// Returns true if `projection` already shows what `params` would set.
pub(crate) fn projection_matches(projection: &Projection, params: &CameraParams) -> bool {
  let Projection::Orthographic(ortho) = projection else {
    return false;
  };
  let ScalingMode::Fixed { width, height } = ortho.scaling_mode else {
    return false;
  };
  params.orthographic
    && ortho.scale == 1.0
    && ortho.near == params.near
    && ortho.far == params.far
    && approx_eq(height, 2.0 * params.half_height)
    && approx_eq(width, 2.0 * params.half_width())
}

fn approx_eq(a: f32, b: f32) -> bool {
  (a - b).abs() <= 1e-5 * b.abs().max(1.0)
}

impl DisplayCamera for BevyDisplayCamera<'_> {
  type Surface = Handle<Image>;

  fn set_orthographic(&mut self, orthographic: bool) {
    let is_orthographic = matches!(*self.projection, Projection::Orthographic(_));
    let is_perspective = matches!(*self.projection, Projection::Perspective(_));
    if orthographic && !is_orthographic {
      *self.projection = Projection::Orthographic(OrthographicProjection::default_2d());
    } else if !orthographic && !is_perspective {
      *self.projection = Projection::Perspective(default());
    }
  }

  fn set_aspect(&mut self, aspect: f32) {
    if let Some(ortho) = self.ortho_mut() {
      let (_, height) = fixed_extent(ortho);
      ortho.scaling_mode = ScalingMode::Fixed {
        width: height * aspect,
        height,
      };
    }
  }

  fn set_half_height(&mut self, half_height: f32) {
    if let Some(ortho) = self.ortho_mut() {
      let (width, height) = fixed_extent(ortho);
      let aspect = width / height;
      ortho.scale = 1.0;
      ortho.scaling_mode = ScalingMode::Fixed {
        width: 2.0 * half_height * aspect,
        height: 2.0 * half_height,
      };
    }
  }

  fn set_clip_planes(&mut self, near: f32, far: f32) {
    if let Some(ortho) = self.ortho_mut() {
      ortho.near = near;
      ortho.far = far;
    }
  }

  fn set_viewport_rect(&mut self, rect: ViewportRect) {
    if rect.is_full() || self.display.is_empty() {
      self.camera.viewport = None;
      return;
    }
    let physical = rect.to_physical(self.display);
    self.camera.viewport = Some(Viewport {
      physical_position: physical.position,
      physical_size: physical.size,
      ..default()
    });
  }

  fn set_render_target(&mut self, target: Option<Handle<Image>>) {
    self.camera.target = match target {
      Some(image) => RenderTarget::Image(image.into()),
      None => RenderTarget::Window(WindowRef::Primary),
    };
  }
}

/// `SurfaceAllocator` backed by `Assets<Image>` render targets.
pub struct ImageSurfaces<'a> {
  images: &'a mut Assets<Image>,
}

impl<'a> ImageSurfaces<'a> {
  pub fn new(images: &'a mut Assets<Image>) -> Self {
    Self { images }
  }
}

fn sampler_for(filter: FilterMode) -> ImageSampler {
  match filter {
    FilterMode::Nearest => ImageSampler::nearest(),
    FilterMode::Bilinear => ImageSampler::linear(),
  }
}

fn filter_of(sampler: &ImageSampler) -> Option<FilterMode> {
  match sampler {
    ImageSampler::Default => None,
    ImageSampler::Descriptor(descriptor) => match descriptor.mag_filter {
      ImageFilterMode::Nearest => Some(FilterMode::Nearest),
      ImageFilterMode::Linear => Some(FilterMode::Bilinear),
    },
  }
}

fn texture_format(format: SurfaceFormat) -> TextureFormat {
  match format {
    SurfaceFormat::Rgba8Srgb => TextureFormat::Rgba8UnormSrgb,
  }
}

impl SurfaceAllocator for ImageSurfaces<'_> {
  type Surface = Handle<Image>;

  fn create(&mut self, descriptor: &SurfaceDescriptor) -> Result<Handle<Image>, DisplayError> {
    if descriptor.width == 0 || descriptor.height == 0 {
      return Err(descriptor.allocation_error("zero-sized render target"));
    }
    if descriptor.width > DEFAULT_MAX_DIMENSION || descriptor.height > DEFAULT_MAX_DIMENSION {
      return Err(descriptor.allocation_error(format!(
        "exceeds maximum texture dimension {}",
        DEFAULT_MAX_DIMENSION
      )));
    }

    let size = Extent3d {
      width: descriptor.width,
      height: descriptor.height,
      depth_or_array_layers: 1,
    };

    let mut image = Image {
      texture_descriptor: TextureDescriptor {
        label: Some(descriptor.label),
        size,
        dimension: TextureDimension::D2,
        format: texture_format(descriptor.format),
        mip_level_count: 1,
        sample_count: 1,
        usage: TextureUsages::TEXTURE_BINDING
          | TextureUsages::COPY_DST
          | TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
      },
      sampler: sampler_for(descriptor.filter),
      ..default()
    };
    image.resize(size);

    debug!(
      "render target '{}': {}x{} {:?}",
      descriptor.label, descriptor.width, descriptor.height, descriptor.filter
    );
    Ok(self.images.add(image))
  }

  fn filter(&self, surface: &Handle<Image>) -> Option<FilterMode> {
    self
      .images
      .get(surface)
      .and_then(|image| filter_of(&image.sampler))
  }

  fn set_filter(&mut self, surface: &Handle<Image>, filter: FilterMode) {
    // get_mut marks the asset modified; skip it when nothing changes
    if self.filter(surface) == Some(filter) {
      return;
    }
    if let Some(image) = self.images.get_mut(surface) {
      image.sampler = sampler_for(filter);
    }
  }

  fn release(&mut self, surface: &Handle<Image>) {
    self.images.remove(surface);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::camera::compute_camera_params;

  #[test]
  fn camera_params_become_fixed_orthographic_projection() {
    let mut camera = Camera::default();
    let mut projection = Projection::Perspective(default());
    let mut adapter =
      BevyDisplayCamera::new(&mut camera, &mut projection, DisplaySize::new(1920, 1080));

    compute_camera_params(640, 480, 100)
      .unwrap()
      .apply(&mut adapter);

    let Projection::Orthographic(ortho) = &projection else {
      panic!("projection should be orthographic");
    };
    let ScalingMode::Fixed { width, height } = ortho.scaling_mode else {
      panic!("scaling mode should be fixed");
    };
    assert!((height - 4.8).abs() < 1e-5);
    assert!((width - 6.4).abs() < 1e-5);
    assert_eq!((ortho.near, ortho.far), (-0.5, 0.5));
  }

  #[test]
  fn applied_params_match_projection() {
    let mut camera = Camera::default();
    let mut projection = Projection::Perspective(default());
    let params = compute_camera_params(640, 480, 100).unwrap();
    assert!(!projection_matches(&projection, &params));

    params.apply(&mut BevyDisplayCamera::new(
      &mut camera,
      &mut projection,
      DisplaySize::new(1920, 1080),
    ));
    assert!(projection_matches(&projection, &params));

    let edited = compute_camera_params(640, 480, 50).unwrap();
    assert!(!projection_matches(&projection, &edited));
  }

  #[test]
  fn viewport_rect_maps_to_physical_viewport() {
    let mut camera = Camera::default();
    let mut projection = Projection::Orthographic(OrthographicProjection::default_2d());
    let mut adapter =
      BevyDisplayCamera::new(&mut camera, &mut projection, DisplaySize::new(800, 1200));

    adapter.set_viewport_rect(ViewportRect {
      x: 0.0,
      y: 0.25,
      width: 1.0,
      height: 0.5,
    });
    let viewport = camera.viewport.clone().expect("viewport set");
    assert_eq!(viewport.physical_position, UVec2::new(0, 300));
    assert_eq!(viewport.physical_size, UVec2::new(800, 600));
  }

  #[test]
  fn full_rect_clears_viewport() {
    let mut camera = Camera {
      viewport: Some(Viewport::default()),
      ..default()
    };
    let mut projection = Projection::Orthographic(OrthographicProjection::default_2d());
    BevyDisplayCamera::new(&mut camera, &mut projection, DisplaySize::new(800, 600))
      .set_viewport_rect(ViewportRect::FULL);
    assert!(camera.viewport.is_none());
  }

  #[test]
  fn image_surfaces_allocate_and_release() {
    let mut images = Assets::<Image>::default();
    let mut surfaces = ImageSurfaces::new(&mut images);

    let handle = surfaces
      .create(&SurfaceDescriptor::new("t", 64, 32, FilterMode::Nearest))
      .unwrap();
    assert_eq!(surfaces.filter(&handle), Some(FilterMode::Nearest));

    surfaces.set_filter(&handle, FilterMode::Bilinear);
    assert_eq!(surfaces.filter(&handle), Some(FilterMode::Bilinear));

    surfaces.release(&handle);
    assert_eq!(surfaces.filter(&handle), None);
    assert!(images.get(&handle).is_none());
  }

  #[test]
  fn oversized_render_target_is_rejected() {
    let mut images = Assets::<Image>::default();
    let result = ImageSurfaces::new(&mut images).create(&SurfaceDescriptor::new(
      "big",
      DEFAULT_MAX_DIMENSION + 1,
      16,
      FilterMode::Bilinear,
    ));
    assert!(matches!(result, Err(DisplayError::SurfaceAllocation { .. })));
  }
}
