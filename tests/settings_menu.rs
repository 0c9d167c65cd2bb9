use bevy::prelude::*;
use bevy::time::Real;
use vibe_settings::plugins::settings_menu::{
    adjust_event, format_distance, format_multiplier, format_percent, setting_label, toggle_event, SettingKind,
    SettingsMenuState,
};
use vibe_settings::prelude::*;

#[test]
fn labels_match_widget_values() {
    assert_eq!(format_percent(0.95), "95%");
    assert_eq!(format_percent(0.6), "60%");
    assert_eq!(format_distance(383.6), "384m");
    assert_eq!(format_multiplier(1.5), "1.5x");

    let w = SettingsWidgets { shadow_quality: ShadowQuality::HardOnly, shadow_distance: 30.0, ..Default::default() };
    assert_eq!(setting_label(SettingKind::ShadowQuality, &w), "Hard (30m)");
    assert_eq!(setting_label(SettingKind::AutoScale, &w), "On");
    assert_eq!(setting_label(SettingKind::ShowFps, &w), "Off");
}

#[test]
fn buttons_map_to_edit_events() {
    let w = SettingsWidgets { render_scale: 0.9, entity_distance: 300.0, vegetation_tier: 3, ..Default::default() };
    assert_eq!(
        adjust_event(SettingKind::EntityDistance, -27.0, &w),
        Some(SettingChanged::EntityDistance(273.0))
    );
    assert_eq!(adjust_event(SettingKind::VegetationTier, 1.0, &w), Some(SettingChanged::VegetationTier(4)));
    assert_eq!(
        adjust_event(SettingKind::ShadowQuality, -1.0, &w),
        Some(SettingChanged::ShadowQuality(ShadowQuality::HardOnly))
    );
    assert_eq!(adjust_event(SettingKind::ShowFps, 1.0, &w), None);
    assert_eq!(toggle_event(SettingKind::AutoScale, &w), Some(SettingChanged::AutoScale(false)));
    assert_eq!(toggle_event(SettingKind::RenderScale, &w), None);
}

fn build_app() -> App {
    let mut app = App::new();
    app.init_resource::<Time>()
        .init_resource::<Time<Real>>()
        .init_resource::<ButtonInput<KeyCode>>()
        .add_plugins((GraphicsSettingsPlugin, SettingsMenuPlugin));
    app.update();
    app.update();
    app
}

fn texts(app: &mut App) -> Vec<String> {
    let mut q = app.world_mut().query::<&Text>();
    q.iter(app.world())
        .flat_map(|t| t.sections.iter().map(|s| s.value.clone()))
        .collect()
}

#[test]
fn panel_shows_current_settings() {
    let mut app = build_app();
    let all = texts(&mut app);
    for label in ["100%", "384m", "572m", "1.0x", "Unlimited", "4x MSAA"] {
        assert!(all.iter().any(|t| t == label), "missing {label} in {all:?}");
    }
}

#[test]
fn panel_tracks_auto_scale_changes_without_events() {
    let mut app = build_app();
    app.world_mut().resource_mut::<SettingsWidgets>().bypass_change_detection().render_scale = 0.85;
    app.update();
    assert!(texts(&mut app).iter().any(|t| t == "85%"));
}

#[test]
fn f1_toggles_panel() {
    let mut app = build_app();
    assert!(!app.world().resource::<SettingsMenuState>().open);

    app.world_mut().resource_mut::<ButtonInput<KeyCode>>().press(KeyCode::F1);
    app.update();
    app.world_mut().resource_mut::<ButtonInput<KeyCode>>().clear();
    assert!(app.world().resource::<SettingsMenuState>().open);

    app.world_mut().resource_mut::<ButtonInput<KeyCode>>().release(KeyCode::F1);
    app.world_mut().resource_mut::<ButtonInput<KeyCode>>().press(KeyCode::F1);
    app.update();
    assert!(!app.world().resource::<SettingsMenuState>().open);
}

#[test]
fn display_rows_cycle_and_toggle() {
    let w = SettingsWidgets { frame_cap: FrameRateCap::Fps60, anti_aliasing: AntiAliasing::X8, ..Default::default() };
    assert_eq!(setting_label(SettingKind::FrameRateCap, &w), "60 FPS");
    assert_eq!(setting_label(SettingKind::AntiAliasing, &w), "8x MSAA");
    assert_eq!(setting_label(SettingKind::VSync, &w), "On");
    assert_eq!(
        adjust_event(SettingKind::FrameRateCap, 1.0, &w),
        Some(SettingChanged::FrameRateCap(FrameRateCap::Fps120))
    );
    assert_eq!(
        adjust_event(SettingKind::AntiAliasing, 1.0, &w),
        Some(SettingChanged::AntiAliasing(AntiAliasing::X8))
    );
    assert_eq!(toggle_event(SettingKind::VSync, &w), Some(SettingChanged::VSync(false)));
    assert_eq!(adjust_event(SettingKind::VSync, 1.0, &w), None);
}
