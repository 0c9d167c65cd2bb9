//! Settings façade: restores persisted settings at startup, routes user edits
//! to the owning subsystem, and writes every edit back to the preference store.
//!
//! Widgets never mutate subsystems directly. They send [`SettingChanged`] and
//! read back [`SettingsWidgets`], which subsystems update without raising
//! change detection (the equivalent of a set-without-notify on a slider).

use std::path::PathBuf;

use bevy::prelude::*;
use bevy::time::Real;

use crate::plugins::auto_scale::{drive_auto_scale, AutoScaleController, AutoScalePlugin};
use crate::plugins::config::QualityConfig;
use crate::plugins::display::{AntiAliasing, DisplayPlugin, DisplaySettings, FrameRateCap};
use crate::plugins::graphics::{Graphics, GraphicsBackendPlugin};
use crate::plugins::preferences::{
    keys, MemoryPreferenceStore, PreferenceStore, Preferences, RonPreferenceStore,
};
use crate::plugins::quality_tiers::ShadowQuality;
use crate::plugins::scheduler::TaskQueue;
use crate::plugins::telemetry::{FpsCounterVisible, FrameTelemetry, TelemetryPlugin};
use crate::plugins::vegetation::{VegetationPlugin, VegetationQuality, MAX_VEGETATION_TIER};
use crate::plugins::view_distance::{ViewDistanceConfig, ViewDistanceManager, ViewDistancePlugin};

#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub enum SettingChanged {
    RenderScale(f32),
    EntityDistance(f32),
    BuildingDistance(f32),
    VegetationMultiplier(f32),
    VegetationTier(i32),
    ShadowQuality(ShadowQuality),
    AutoScale(bool),
    ShowFps(bool),
    FrameRateCap(FrameRateCap),
    VSync(bool),
    AntiAliasing(AntiAliasing),
}

/// Values currently displayed by the settings widgets.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct SettingsWidgets {
    pub render_scale: f32,
    pub entity_distance: f32,
    pub building_distance: f32,
    pub vegetation_multiplier: f32,
    pub vegetation_tier: u8,
    pub shadow_quality: ShadowQuality,
    pub shadow_distance: f32,
    pub auto_scale: bool,
    pub show_fps: bool,
    pub frame_cap: FrameRateCap,
    pub vsync: bool,
    pub anti_aliasing: AntiAliasing,
}

impl Default for SettingsWidgets {
    fn default() -> Self {
        Self {
            render_scale: 1.0,
            entity_distance: 0.0,
            building_distance: 0.0,
            vegetation_multiplier: 1.0,
            vegetation_tier: 2,
            shadow_quality: ShadowQuality::All,
            shadow_distance: 100.0,
            auto_scale: true,
            show_fps: false,
            frame_cap: FrameRateCap::Unlimited,
            vsync: true,
            anti_aliasing: AntiAliasing::X4,
        }
    }
}

/// Settings in effect right after startup.
#[derive(Debug, Clone, PartialEq)]
pub struct StartupSettings {
    pub render_scale: f32,
    pub view: ViewDistanceConfig,
    pub vegetation_tier: u8,
    pub shadow_quality: ShadowQuality,
    pub auto_scale: bool,
    pub show_fps: bool,
}

/// Merges stored preferences over configured defaults, then applies platform caps.
pub fn resolve_startup_settings(
    cfg: &QualityConfig,
    store: &dyn PreferenceStore,
    backend_scale: Option<f32>,
    backend_shadow_quality: ShadowQuality,
) -> StartupSettings {
    let bounds = &cfg.view_distance;
    let defaults = ViewDistanceConfig::defaults_for(bounds);
    let platform = &cfg.platform;

    let stored_scale = store.get_float(keys::RENDER_SCALE);
    let mut render_scale = cfg
        .auto_scale
        .clamp_scale(stored_scale.or(backend_scale).unwrap_or(cfg.auto_scale.max_scale));

    let default_tier = if platform.mobile {
        platform.mobile_default_vegetation_tier
    } else {
        platform.default_vegetation_tier
    };
    let stored_tier = store.get_float_or(keys::VEGETATION_QUALITY, f32::from(default_tier));
    let mut vegetation_tier = (stored_tier.round().max(0.0) as u8).min(MAX_VEGETATION_TIER);

    if platform.mobile {
        if render_scale > platform.mobile_scale_threshold {
            render_scale = cfg.auto_scale.clamp_scale(platform.mobile_scale);
        }
        vegetation_tier = vegetation_tier.min(platform.mobile_max_vegetation_tier);
    }

    let shadow_quality = store
        .get_float(keys::SHADOW_QUALITY)
        .map(|v| ShadowQuality::from_index(v.round() as i32))
        .unwrap_or(backend_shadow_quality);

    StartupSettings {
        render_scale,
        view: ViewDistanceConfig {
            entity_distance: bounds
                .entity
                .clamp(store.get_float_or(keys::ENTITY_VIEW_DISTANCE, defaults.entity_distance)),
            building_distance: bounds
                .building
                .clamp(store.get_float_or(keys::BUILDING_VIEW_DISTANCE, defaults.building_distance)),
            vegetation_multiplier: bounds.vegetation_multiplier.clamp(
                store.get_float_or(keys::VEGETATION_DISTANCE_MULTIPLIER, defaults.vegetation_multiplier),
            ),
        },
        vegetation_tier,
        shadow_quality,
        auto_scale: store.get_bool_or(keys::DYNAMIC_PERFORMANCE, true),
        show_fps: store.get_bool_or(keys::SHOW_FPS, false),
    }
}

/// Stored display settings over the current ones; handhelds are forced to
/// their capped, vsync-off configuration.
pub fn resolve_display_settings(
    cfg: &QualityConfig,
    store: &dyn PreferenceStore,
    current: &DisplaySettings,
) -> DisplaySettings {
    let mut display = DisplaySettings {
        frame_cap: store
            .get_float(keys::TARGET_FPS)
            .map(|v| FrameRateCap::from_index(v.round() as i32))
            .unwrap_or(current.frame_cap),
        vsync: store.get_bool_or(keys::VSYNC, current.vsync),
        anti_aliasing: store
            .get_float(keys::ANTI_ALIASING)
            .map(|v| AntiAliasing::from_index(v.round() as i32))
            .unwrap_or(current.anti_aliasing),
    };
    if cfg.platform.mobile {
        display.frame_cap = cfg.platform.mobile_frame_cap;
        display.vsync = cfg.platform.mobile_vsync;
    }
    display
}

/// Loads the tuning file and opens the preference store.
///
/// Add it after `DefaultPlugins` so load failures reach the log subscriber,
/// and before [`GraphicsSettingsPlugin`], which builds from the loaded config.
pub struct SettingsSourcesPlugin {
    pub config_path: PathBuf,
    /// `None` keeps preferences in memory for the session.
    pub preferences_path: Option<PathBuf>,
    pub force_mobile: bool,
}

impl Plugin for SettingsSourcesPlugin {
    fn build(&self, app: &mut App) {
        let mut config = QualityConfig::load_or_default(&self.config_path);
        config.platform.mobile |= self.force_mobile;
        let prefs = match &self.preferences_path {
            Some(path) => Preferences::new(RonPreferenceStore::open_or_empty(path)),
            None => Preferences::new(MemoryPreferenceStore::new()),
        };
        app.insert_resource(config).insert_resource(prefs);
    }
}

pub struct GraphicsSettingsPlugin;
impl Plugin for GraphicsSettingsPlugin {
    fn build(&self, app: &mut App) {
        let cfg = app
            .world()
            .get_resource::<QualityConfig>()
            .cloned()
            .unwrap_or_default();

        app.insert_resource(FrameTelemetry::with_capacity(cfg.auto_scale.history_size))
            .insert_resource(AutoScaleController::new(cfg.auto_scale.clone()))
            .insert_resource(ViewDistanceManager::new(cfg.view_distance, cfg.cull_layers))
            .insert_resource(VegetationQuality::new(
                cfg.vegetation.clone(),
                cfg.platform.default_vegetation_tier,
                1.0,
            ))
            .insert_resource(cfg)
            .init_resource::<Preferences>()
            .init_resource::<SettingsWidgets>()
            .add_event::<SettingChanged>()
            .add_plugins((
                TelemetryPlugin,
                GraphicsBackendPlugin,
                AutoScalePlugin,
                ViewDistancePlugin,
                VegetationPlugin,
                DisplayPlugin,
            ))
            .add_systems(Startup, load_settings)
            // Edits land first so a manual override restarts the grace period
            // before a due evaluation looks at it.
            .add_systems(Update, apply_setting_changes.before(drive_auto_scale));
    }
}

#[allow(clippy::too_many_arguments)]
fn load_settings(
    time: Res<Time<Real>>,
    cfg: Res<QualityConfig>,
    prefs: Res<Preferences>,
    mut controller: ResMut<AutoScaleController>,
    mut telemetry: ResMut<FrameTelemetry>,
    mut queue: ResMut<TaskQueue>,
    mut graphics: ResMut<Graphics>,
    mut view: ResMut<ViewDistanceManager>,
    mut vegetation: ResMut<VegetationQuality>,
    mut fps_visible: ResMut<FpsCounterVisible>,
    mut display: ResMut<DisplaySettings>,
    mut widgets: ResMut<SettingsWidgets>,
) {
    let resolved_display = resolve_display_settings(&cfg, prefs.store(), &display);
    if *display != resolved_display {
        *display = resolved_display;
    }

    let backend_scale = graphics.config().render_scale();
    let backend_quality = graphics.config().shadow_quality();
    let s = resolve_startup_settings(&cfg, prefs.store(), backend_scale, backend_quality);

    let gfx = graphics.config_mut();
    gfx.set_render_scale(s.render_scale);
    gfx.set_shadow_quality(s.shadow_quality);
    controller.adopt_scale(s.render_scale);

    view.set_entity_distance(s.view.entity_distance);
    view.set_building_distance(s.view.building_distance);
    let multiplier = view.set_vegetation_multiplier(s.view.vegetation_multiplier);
    vegetation.set_multiplier(multiplier);
    vegetation.set_tier(i32::from(s.vegetation_tier));

    fps_visible.0 = s.show_fps;
    if s.auto_scale {
        controller.enable(time.elapsed_seconds_f64(), &mut telemetry, &mut queue);
    }

    *widgets = SettingsWidgets {
        render_scale: s.render_scale,
        entity_distance: s.view.entity_distance,
        building_distance: s.view.building_distance,
        vegetation_multiplier: multiplier,
        vegetation_tier: vegetation.tier(),
        shadow_quality: s.shadow_quality,
        shadow_distance: graphics.config().shadow_distance(),
        auto_scale: s.auto_scale,
        show_fps: s.show_fps,
        frame_cap: display.frame_cap,
        vsync: display.vsync,
        anti_aliasing: display.anti_aliasing,
    };

    info!(
        "SETTINGS loaded scale={:.2} entity={:.0} building={:.0} vegetation={:.1}x tier={} auto={} fps={} mobile={}",
        s.render_scale,
        s.view.entity_distance,
        s.view.building_distance,
        multiplier,
        vegetation.tier(),
        s.auto_scale,
        s.show_fps,
        cfg.platform.mobile
    );
}

#[allow(clippy::too_many_arguments)]
fn apply_setting_changes(
    time: Res<Time<Real>>,
    mut events: EventReader<SettingChanged>,
    mut controller: ResMut<AutoScaleController>,
    mut telemetry: ResMut<FrameTelemetry>,
    mut queue: ResMut<TaskQueue>,
    mut graphics: ResMut<Graphics>,
    mut view: ResMut<ViewDistanceManager>,
    mut vegetation: ResMut<VegetationQuality>,
    mut prefs: ResMut<Preferences>,
    mut fps_visible: ResMut<FpsCounterVisible>,
    mut display: ResMut<DisplaySettings>,
    mut widgets: ResMut<SettingsWidgets>,
) {
    let now = time.elapsed_seconds_f64();
    for event in events.read() {
        let w = widgets.bypass_change_detection();
        match *event {
            SettingChanged::RenderScale(value) => {
                let tiers = controller.override_scale(value, now, graphics.config_mut());
                let scale = controller.current_scale();
                w.render_scale = scale;
                w.shadow_distance = tiers.shadow_distance;
                if let Some(quality) = tiers.shadow_quality {
                    w.shadow_quality = quality;
                }
                prefs.persist(keys::RENDER_SCALE, scale);
            }
            SettingChanged::EntityDistance(value) => {
                let stored = view.set_entity_distance(value);
                w.entity_distance = stored;
                prefs.persist(keys::ENTITY_VIEW_DISTANCE, stored);
            }
            SettingChanged::BuildingDistance(value) => {
                let stored = view.set_building_distance(value);
                w.building_distance = stored;
                prefs.persist(keys::BUILDING_VIEW_DISTANCE, stored);
            }
            SettingChanged::VegetationMultiplier(value) => {
                let stored = view.set_vegetation_multiplier(value);
                vegetation.set_multiplier(stored);
                w.vegetation_multiplier = stored;
                prefs.persist(keys::VEGETATION_DISTANCE_MULTIPLIER, stored);
            }
            SettingChanged::VegetationTier(tier) => {
                let stored = vegetation.set_tier(tier);
                w.vegetation_tier = stored;
                prefs.persist(keys::VEGETATION_QUALITY, f32::from(stored));
            }
            SettingChanged::ShadowQuality(quality) => {
                graphics.config_mut().set_shadow_quality(quality);
                w.shadow_quality = quality;
                prefs.persist(keys::SHADOW_QUALITY, f32::from(quality.index()));
                info!("SETTINGS shadow_quality={:?}", quality);
            }
            SettingChanged::AutoScale(enabled) => {
                if enabled {
                    controller.enable(now, &mut telemetry, &mut queue);
                } else {
                    controller.disable(&mut telemetry, &mut queue);
                }
                w.auto_scale = enabled;
                prefs.persist(keys::DYNAMIC_PERFORMANCE, if enabled { 1.0 } else { 0.0 });
            }
            SettingChanged::ShowFps(show) => {
                fps_visible.0 = show;
                w.show_fps = show;
                prefs.persist(keys::SHOW_FPS, if show { 1.0 } else { 0.0 });
            }
            SettingChanged::FrameRateCap(cap) => {
                display.frame_cap = cap;
                w.frame_cap = cap;
                prefs.persist(keys::TARGET_FPS, f32::from(cap.index()));
            }
            SettingChanged::VSync(enabled) => {
                display.vsync = enabled;
                w.vsync = enabled;
                prefs.persist(keys::VSYNC, if enabled { 1.0 } else { 0.0 });
            }
            SettingChanged::AntiAliasing(aa) => {
                display.anti_aliasing = aa;
                w.anti_aliasing = aa;
                prefs.persist(keys::ANTI_ALIASING, f32::from(aa.index()));
            }
        }
    }
}
