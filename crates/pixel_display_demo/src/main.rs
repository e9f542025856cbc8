mod config;
mod scene;

use std::path::PathBuf;

use bevy::prelude::*;
use bevy::window::WindowResolution;
use bevy_pixel_display::{DisplayConfig, DisplayError, PixelDisplayPlugin};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "pixel_display_demo", about = "Pixel-perfect display demo")]
struct Args {
  /// Display config file
  #[arg(long, default_value = "assets/config/display.config.toml")]
  config: PathBuf,

  /// Hot-reload the display config and reapply camera parameters every frame
  #[arg(long)]
  live_edit: bool,

  /// Initial window size as WIDTHxHEIGHT
  #[arg(long, default_value = "1280x720", value_parser = parse_size)]
  window: (u32, u32),
}

fn parse_size(value: &str) -> Result<(u32, u32), String> {
  let (w, h) = value
    .split_once('x')
    .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{value}'"))?;
  let w = w.parse().map_err(|e| format!("bad width: {e}"))?;
  let h = h.parse().map_err(|e| format!("bad height: {e}"))?;
  Ok((w, h))
}

fn main() -> Result<(), DisplayError> {
  let args = Args::parse();
  let display_config = DisplayConfig::load(&args.config)?;

  // The asset server roots at the config's directory so hot reload watches
  // the same file that was loaded
  let config_path = args.config.canonicalize()?;
  let (asset_root, asset_path) = config::asset_location(&config_path);

  let mut app = App::new();

  app
    .add_plugins(
      DefaultPlugins
        .set(WindowPlugin {
          primary_window: Some(Window {
            resolution: WindowResolution::new(args.window.0, args.window.1),
            title: "Pixel Display".to_string(),
            ..default()
          }),
          ..default()
        })
        .set(AssetPlugin {
          file_path: asset_root,
          watch_for_changes_override: Some(args.live_edit),
          ..default()
        }),
    )
    .add_plugins(PixelDisplayPlugin::new(display_config).live_edit(args.live_edit))
    .add_plugins(scene::ScenePlugin);

  if args.live_edit {
    app.add_plugins(config::DisplayConfigReloadPlugin { asset_path });
  }

  app.run();
  Ok(())
}
