//! Hot reload of the display config asset.

use std::path::Path;

use bevy::{asset::AssetEvent, ecs::message::MessageReader, prelude::*, reflect::TypePath};
use bevy_common_assets::toml::TomlAssetPlugin;
use bevy_pixel_display::DisplayConfig;
use serde::Deserialize;

#[derive(Asset, TypePath, Deserialize, Debug, Clone)]
#[serde(transparent)]
pub struct DisplayConfigAsset(pub DisplayConfig);

#[derive(Resource)]
struct DisplayConfigSource(String);

#[derive(Resource)]
struct DisplayConfigHandle(Handle<DisplayConfigAsset>);

/// Splits a config file path into an asset root directory and the asset path
/// of the file inside it.
pub fn asset_location(config: &Path) -> (String, String) {
  let root = config
    .parent()
    .map(|dir| dir.to_string_lossy().into_owned())
    .unwrap_or_default();
  let file = config
    .file_name()
    .map(|name| name.to_string_lossy().into_owned())
    .unwrap_or_default();
  (root, file)
}

/// Watches the display config asset and copies edits into the
/// [`DisplayConfig`] resource.
pub struct DisplayConfigReloadPlugin {
  /// Path of the config inside the asset root.
  pub asset_path: String,
}

impl Plugin for DisplayConfigReloadPlugin {
  fn build(&self, app: &mut App) {
    app
      .insert_resource(DisplayConfigSource(self.asset_path.clone()))
      .add_plugins(TomlAssetPlugin::<DisplayConfigAsset>::new(&[
        "config.toml",
        "toml",
      ]))
      .add_systems(Startup, load_config_asset)
      .add_systems(Update, watch_config_changes);
  }
}

fn load_config_asset(
  mut commands: Commands,
  source: Res<DisplayConfigSource>,
  asset_server: Res<AssetServer>,
) {
  let handle: Handle<DisplayConfigAsset> = asset_server.load(source.0.clone());
  commands.insert_resource(DisplayConfigHandle(handle));
}

fn watch_config_changes(
  config_handle: Res<DisplayConfigHandle>,
  mut messages: MessageReader<AssetEvent<DisplayConfigAsset>>,
  configs: Res<Assets<DisplayConfigAsset>>,
  mut display_config: ResMut<DisplayConfig>,
) {
  for event in messages.read() {
    let AssetEvent::Modified { id } = event else {
      continue;
    };
    if config_handle.0.id() != *id {
      continue;
    }
    let Some(DisplayConfigAsset(config)) = configs.get(&config_handle.0) else {
      continue;
    };
    match config.validate() {
      Ok(()) => {
        info!("Display config reloaded!");
        display_config.set_if_neq(*config);
      }
      Err(err) => warn!("Ignoring display config edit: {}", err),
    }
  }
}
