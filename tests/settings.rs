use std::time::Duration;

use bevy::prelude::*;
use bevy::time::Real;
use vibe_settings::plugins::settings::{resolve_display_settings, resolve_startup_settings};
use vibe_settings::plugins::telemetry::FpsCounterVisible;
use vibe_settings::prelude::*;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-3
}

#[test]
fn empty_store_resolves_to_defaults() {
    let s = resolve_startup_settings(&QualityConfig::default(), &MemoryPreferenceStore::new(), Some(1.0), ShadowQuality::All);
    assert_eq!(s.render_scale, 1.0);
    assert!(approx(s.view.entity_distance, 384.0));
    assert!(approx(s.view.building_distance, 572.0));
    assert_eq!(s.view.vegetation_multiplier, 1.0);
    assert_eq!(s.vegetation_tier, 2);
    assert_eq!(s.shadow_quality, ShadowQuality::All);
    assert!(s.auto_scale);
    assert!(!s.show_fps);
}

#[test]
fn stored_values_are_clamped() {
    let store = MemoryPreferenceStore::with_values([
        (keys::RENDER_SCALE, 0.3),
        (keys::ENTITY_VIEW_DISTANCE, 5000.0),
        (keys::BUILDING_VIEW_DISTANCE, 10.0),
        (keys::VEGETATION_DISTANCE_MULTIPLIER, 9.0),
        (keys::VEGETATION_QUALITY, 7.0),
        (keys::SHADOW_QUALITY, 1.0),
    ]);
    let s = resolve_startup_settings(&QualityConfig::default(), &store, Some(1.0), ShadowQuality::All);
    assert!(approx(s.render_scale, 0.6));
    assert_eq!(s.view.entity_distance, 600.0);
    assert_eq!(s.view.building_distance, 80.0);
    assert_eq!(s.view.vegetation_multiplier, 2.0);
    assert_eq!(s.vegetation_tier, 3);
    assert_eq!(s.shadow_quality, ShadowQuality::HardOnly);
}

#[test]
fn mobile_caps_scale_and_vegetation() {
    let mut cfg = QualityConfig::default();
    cfg.platform.mobile = true;

    let s = resolve_startup_settings(&cfg, &MemoryPreferenceStore::new(), Some(1.0), ShadowQuality::All);
    assert!(approx(s.render_scale, 0.85));
    assert_eq!(s.vegetation_tier, 1);

    let store = MemoryPreferenceStore::with_values([(keys::RENDER_SCALE, 0.8), (keys::VEGETATION_QUALITY, 3.0)]);
    let s = resolve_startup_settings(&cfg, &store, Some(1.0), ShadowQuality::All);
    assert!(approx(s.render_scale, 0.8));
    assert_eq!(s.vegetation_tier, 2);
}

#[test]
fn missing_backend_scale_defaults_to_full() {
    let s = resolve_startup_settings(&QualityConfig::default(), &MemoryPreferenceStore::new(), None, ShadowQuality::Disabled);
    assert_eq!(s.render_scale, 1.0);
    assert_eq!(s.shadow_quality, ShadowQuality::Disabled);
}

#[test]
fn display_settings_restore_and_mobile_override() {
    let store = MemoryPreferenceStore::with_values([
        (keys::TARGET_FPS, 2.0),
        (keys::VSYNC, 1.0),
        (keys::ANTI_ALIASING, 0.0),
    ]);
    let current = DisplaySettings::default();
    let d = resolve_display_settings(&QualityConfig::default(), &store, &current);
    assert_eq!(d.frame_cap, FrameRateCap::Fps120);
    assert!(d.vsync);
    assert_eq!(d.anti_aliasing, AntiAliasing::Off);

    assert_eq!(
        resolve_display_settings(&QualityConfig::default(), &MemoryPreferenceStore::new(), &current),
        current
    );

    let mut cfg = QualityConfig::default();
    cfg.platform.mobile = true;
    let d = resolve_display_settings(&cfg, &store, &current);
    assert_eq!(d.frame_cap, FrameRateCap::Fps60);
    assert!(!d.vsync);
    assert_eq!(d.anti_aliasing, AntiAliasing::Off);
}

#[test]
fn sources_plugin_loads_config_and_preferences() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("quality.ron");
    std::fs::write(&config_path, "(auto_scale: (min_fps: 20.0))").unwrap();
    let prefs_path = dir.path().join("prefs").join("preferences.ron");
    std::fs::create_dir_all(prefs_path.parent().unwrap()).unwrap();
    std::fs::write(&prefs_path, "{ \"RenderScale\": ").unwrap();

    let mut app = App::new();
    app.add_plugins(SettingsSourcesPlugin {
        config_path: config_path.clone(),
        preferences_path: Some(prefs_path.clone()),
        force_mobile: true,
    });
    let cfg = app.world().resource::<QualityConfig>();
    assert_eq!(cfg.auto_scale.min_fps, 20.0);
    assert!(cfg.platform.mobile);
    assert_eq!(app.world().resource::<Preferences>().store().get_float(keys::RENDER_SCALE), None);

    app.world_mut().resource_mut::<Preferences>().persist(keys::RENDER_SCALE, 0.75);
    let reopened = RonPreferenceStore::open(&prefs_path).unwrap();
    assert_eq!(reopened.get_float(keys::RENDER_SCALE), Some(0.75));
}

// --- App-level ---

fn build_app(store: MemoryPreferenceStore) -> App {
    let mut app = App::new();
    app.init_resource::<Time>()
        .init_resource::<Time<Real>>()
        .insert_resource(Preferences::new(store))
        .insert_resource(Graphics::new(PipelineSettings::default()))
        .add_plugins(GraphicsSettingsPlugin);
    app.update();
    app
}

fn stored(app: &App, key: &str) -> Option<f32> {
    app.world().resource::<Preferences>().store().get_float(key)
}

#[test]
fn startup_restores_persisted_settings() {
    let app = build_app(MemoryPreferenceStore::with_values([
        (keys::RENDER_SCALE, 0.8),
        (keys::ENTITY_VIEW_DISTANCE, 250.0),
        (keys::VEGETATION_QUALITY, 1.0),
        (keys::DYNAMIC_PERFORMANCE, 0.0),
        (keys::SHOW_FPS, 1.0),
    ]));
    let world = app.world();
    assert!(approx(world.resource::<AutoScaleController>().current_scale(), 0.8));
    assert!(!world.resource::<AutoScaleController>().is_enabled());
    assert_eq!(world.resource::<Graphics>().config().render_scale(), Some(0.8));
    assert_eq!(world.resource::<ViewDistanceManager>().config().entity_distance, 250.0);
    assert_eq!(world.resource::<VegetationQuality>().tier(), 1);
    assert!(world.resource::<FpsCounterVisible>().0);

    let w = world.resource::<SettingsWidgets>();
    assert!(approx(w.render_scale, 0.8));
    assert_eq!(w.entity_distance, 250.0);
    assert!(!w.auto_scale);
    assert!(w.show_fps);
}

#[test]
fn distance_edit_is_clamped_applied_and_saved() {
    let mut app = build_app(MemoryPreferenceStore::new());
    app.world_mut().send_event(SettingChanged::EntityDistance(9999.0));
    app.update();
    assert_eq!(app.world().resource::<SettingsWidgets>().entity_distance, 600.0);
    assert_eq!(app.world().resource::<ViewDistanceManager>().config().entity_distance, 600.0);
    assert_eq!(stored(&app, keys::ENTITY_VIEW_DISTANCE), Some(600.0));
}

#[test]
fn multiplier_edit_reaches_vegetation_and_cull_cache() {
    let mut app = build_app(MemoryPreferenceStore::new());
    let cam = app.world_mut().spawn((Camera::default(), GlobalTransform::IDENTITY)).id();
    app.update();
    assert!(app.world().resource::<ViewDistanceManager>().cache().contains(cam));

    app.world_mut().send_event(SettingChanged::VegetationMultiplier(1.5));
    app.world_mut().run_schedule(Update);
    assert_eq!(app.world().resource::<VegetationQuality>().multiplier(), 1.5);
    assert!(app.world().resource::<ViewDistanceManager>().cache().is_dirty());
    assert_eq!(stored(&app, keys::VEGETATION_DISTANCE_MULTIPLIER), Some(1.5));
}

#[test]
fn manual_scale_runs_tier_mapper_and_restarts_grace() {
    let mut app = build_app(MemoryPreferenceStore::new());
    app.world_mut()
        .resource_mut::<Time<Real>>()
        .advance_by(Duration::from_secs(30));
    app.world_mut().send_event(SettingChanged::RenderScale(0.72));
    app.update();

    let gfx = app.world().resource::<Graphics>();
    assert_eq!(gfx.config().render_scale(), Some(0.72));
    assert_eq!(gfx.config().shadow_distance(), 30.0);
    let ctl = app.world().resource::<AutoScaleController>();
    assert_eq!(ctl.state().last_change, 30.0);
    let w = app.world().resource::<SettingsWidgets>();
    assert!(approx(w.render_scale, 0.72));
    assert_eq!(w.shadow_distance, 30.0);
    assert_eq!(stored(&app, keys::RENDER_SCALE), Some(0.72));
}

#[test]
fn toggles_persist() {
    let mut app = build_app(MemoryPreferenceStore::new());
    app.world_mut().send_event(SettingChanged::ShowFps(true));
    app.world_mut().send_event(SettingChanged::AutoScale(false));
    app.world_mut().send_event(SettingChanged::VegetationTier(5));
    app.world_mut().send_event(SettingChanged::ShadowQuality(ShadowQuality::Disabled));
    app.update();

    assert!(app.world().resource::<FpsCounterVisible>().0);
    assert!(!app.world().resource::<AutoScaleController>().is_enabled());
    assert_eq!(app.world().resource::<VegetationQuality>().tier(), 3);
    assert_eq!(app.world().resource::<Graphics>().config().shadow_quality(), ShadowQuality::Disabled);
    assert_eq!(stored(&app, keys::SHOW_FPS), Some(1.0));
    assert_eq!(stored(&app, keys::DYNAMIC_PERFORMANCE), Some(0.0));
    assert_eq!(stored(&app, keys::VEGETATION_QUALITY), Some(3.0));
    assert_eq!(stored(&app, keys::SHADOW_QUALITY), Some(0.0));
}

#[test]
fn runs_without_graphics_backend() {
    let mut app = App::new();
    app.init_resource::<Time>()
        .init_resource::<Time<Real>>()
        .add_plugins(GraphicsSettingsPlugin);
    app.update();
    app.world_mut().send_event(SettingChanged::RenderScale(0.7));
    app.update();
    assert_eq!(app.world().resource::<Graphics>().config().render_scale(), None);
    assert!(approx(app.world().resource::<AutoScaleController>().current_scale(), 0.7));
    assert!(approx(app.world().resource::<SettingsWidgets>().render_scale, 0.7));
}

#[test]
fn display_edits_are_applied_and_saved() {
    let mut app = build_app(MemoryPreferenceStore::new());
    app.world_mut().send_event(SettingChanged::FrameRateCap(FrameRateCap::Fps120));
    app.world_mut().send_event(SettingChanged::VSync(false));
    app.world_mut().send_event(SettingChanged::AntiAliasing(AntiAliasing::X8));
    app.update();

    let display = app.world().resource::<DisplaySettings>();
    assert_eq!(display.frame_cap, FrameRateCap::Fps120);
    assert!(!display.vsync);
    assert_eq!(display.anti_aliasing, AntiAliasing::X8);
    let w = app.world().resource::<SettingsWidgets>();
    assert_eq!(w.frame_cap, FrameRateCap::Fps120);
    assert!(!w.vsync);
    assert_eq!(w.anti_aliasing, AntiAliasing::X8);
    assert_eq!(stored(&app, keys::TARGET_FPS), Some(2.0));
    assert_eq!(stored(&app, keys::VSYNC), Some(0.0));
    assert_eq!(stored(&app, keys::ANTI_ALIASING), Some(3.0));
}

#[test]
fn startup_restores_display_settings() {
    let app = build_app(MemoryPreferenceStore::with_values([
        (keys::TARGET_FPS, 0.0),
        (keys::VSYNC, 0.0),
        (keys::ANTI_ALIASING, 1.0),
    ]));
    let display = app.world().resource::<DisplaySettings>();
    assert_eq!(display.frame_cap, FrameRateCap::Fps30);
    assert!(!display.vsync);
    assert_eq!(display.anti_aliasing, AntiAliasing::X2);
    assert_eq!(app.world().resource::<SettingsWidgets>().anti_aliasing, AntiAliasing::X2);
}

#[test]
fn manual_scale_wins_over_same_frame_evaluation() {
    let mut app = build_app(MemoryPreferenceStore::new());
    assert!(app.world().resource::<AutoScaleController>().is_enabled());

    // A ten second frame: far below the low threshold and well past the grace period.
    app.world_mut()
        .resource_mut::<Time<Real>>()
        .advance_by(Duration::from_secs(10));
    app.world_mut().send_event(SettingChanged::RenderScale(0.8));
    app.update();

    let ctl = app.world().resource::<AutoScaleController>();
    assert!(approx(ctl.current_scale(), 0.8));
    assert_eq!(ctl.state().last_change, 10.0);
    assert_eq!(app.world().resource::<Graphics>().config().render_scale(), Some(0.8));

    // Next evaluation is still inside the grace period that the edit restarted.
    app.world_mut()
        .resource_mut::<Time<Real>>()
        .advance_by(Duration::from_secs(2));
    app.update();
    assert!(approx(app.world().resource::<AutoScaleController>().current_scale(), 0.8));
    assert!(approx(app.world().resource::<SettingsWidgets>().render_scale, 0.8));
}
