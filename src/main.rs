use bevy::prelude::*;
use bevy::window::{PresentMode, Window, WindowPlugin};

#[cfg(feature = "dev")]
use bevy::dev_tools::fps_overlay::FpsOverlayPlugin;

use overlayps::{OverlayConfig, OverlayPsPlugin};

fn setup(mut commands: Commands) {
    commands.spawn((
        Camera2d,
        Camera {
            clear_color: ClearColorConfig::Custom(Color::srgb(0.93, 0.93, 0.9)),
            ..default()
        },
    ));
}

fn main() -> anyhow::Result<()> {
    let config = OverlayConfig::load()?;

    let mut app = App::new();

    app.add_plugins(DefaultPlugins.set(WindowPlugin {
        primary_window: Some(Window {
            title: format!("OverlayPS - {}", config.layer.title),
            present_mode: PresentMode::AutoVsync,
            ..default()
        }),
        ..default()
    }));

    #[cfg(feature = "dev")]
    app.add_plugins(FpsOverlayPlugin::default());

    app.insert_resource(config);
    app.add_plugins(OverlayPsPlugin);
    app.add_systems(Startup, setup);

    app.run();
    Ok(())
}
