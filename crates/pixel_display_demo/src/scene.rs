//! A small scene that makes pixel snapping visible.

use bevy::prelude::*;
use bevy_pixel_display::{DisplayConfig, PixelDisplayCamera};

pub struct ScenePlugin;

impl Plugin for ScenePlugin {
  fn build(&self, app: &mut App) {
    app
      .add_systems(Startup, spawn_scene)
      .add_systems(Update, (drift_sprites, quit_on_escape));
  }
}

/// Moves sideways at `speed` world units per second.
#[derive(Component)]
struct Drift {
  origin: Vec3,
  speed: f32,
}

const TILE_COLORS: [Color; 2] = [Color::srgb(0.16, 0.18, 0.24), Color::srgb(0.22, 0.25, 0.32)];

fn spawn_scene(mut commands: Commands, config: Res<DisplayConfig>) {
  commands.spawn((Camera2d, PixelDisplayCamera));

  // One tile per world unit, covering the visible area
  let half_w = (config.virtual_width / config.pixels_per_unit / 2 + 1) as i32;
  let half_h = (config.virtual_height / config.pixels_per_unit / 2 + 1) as i32;
  for y in -half_h..=half_h {
    for x in -half_w..=half_w {
      let color = TILE_COLORS[((x + y).rem_euclid(2)) as usize];
      commands.spawn((
        Sprite::from_color(color, Vec2::ONE),
        Transform::from_xyz(x as f32, y as f32, -0.25),
      ));
    }
  }

  let movers = [
    (Color::srgb(0.95, 0.55, 0.2), Vec3::new(-2.0, 1.0, 0.0), 0.7),
    (Color::srgb(0.3, 0.85, 0.5), Vec3::new(0.0, 0.0, 0.1), 1.3),
    (Color::srgb(0.45, 0.6, 1.0), Vec3::new(2.0, -1.5, 0.2), 0.35),
  ];
  for (color, origin, speed) in movers {
    commands.spawn((
      Sprite::from_color(color, Vec2::splat(0.75)),
      Transform::from_translation(origin),
      Drift { origin, speed },
    ));
  }
}

fn drift_sprites(time: Res<Time>, mut sprites: Query<(&Drift, &mut Transform)>) {
  let t = time.elapsed_secs();
  for (drift, mut transform) in sprites.iter_mut() {
    transform.translation.x = drift.origin.x + (t * drift.speed).sin() * 2.0;
    transform.rotation = Quat::from_rotation_z(t * drift.speed);
  }
}

fn quit_on_escape(keys: Res<ButtonInput<KeyCode>>, mut exit: MessageWriter<AppExit>) {
  if keys.just_pressed(KeyCode::Escape) {
    exit.write(AppExit::Success);
  }
}
