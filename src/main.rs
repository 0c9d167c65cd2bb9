use bevy::prelude::*;

use vibe_settings::plugins::demo_scene::DemoScenePlugin;
use vibe_settings::plugins::preferences::DEFAULT_PREFERENCES_PATH;
use vibe_settings::prelude::*;

fn main() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();

    let mobile = std::env::args().any(|a| a == "--mobile");
    let preferences_path = if cfg!(target_arch = "wasm32") {
        None
    } else {
        Some(DEFAULT_PREFERENCES_PATH.into())
    };

    App::new()
        .insert_resource(ClearColor(Color::srgb(0.52, 0.80, 0.92)))
        .insert_resource(AmbientLight {
            color: Color::srgb(0.55, 0.55, 0.60),
            brightness: 800.0,
        })
        .insert_resource(Msaa::Sample4)
        .insert_resource(Graphics::new(PipelineSettings::default()))
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window { title: "Vibe Settings".into(), ..default() }),
            ..default()
        }))
        .add_plugins(SettingsSourcesPlugin {
            config_path: DEFAULT_CONFIG_PATH.into(),
            preferences_path,
            force_mobile: mobile,
        })
        .add_plugins(GraphicsSettingsPlugin) // telemetry, auto-scale, culling, vegetation, display
        .add_plugins(SettingsMenuPlugin)     // F1 / gear panel
        .add_plugins(DemoScenePlugin)
        .run();
}
