//! Convenience re-exports for frequently used types & plugins.
pub use crate::plugins::auto_scale::{AutoScaleConfig, AutoScaleController, AutoScalePlugin, ScaleChange, ScaleDirection, ScalingState};
pub use crate::plugins::config::{ConfigError, PlatformDefaults, QualityConfig, SliderRange, DEFAULT_CONFIG_PATH};
pub use crate::plugins::display::{AntiAliasing, DisplayPlugin, DisplaySettings, FrameRateCap};
pub use crate::plugins::graphics::{Graphics, GraphicsBackendPlugin, GraphicsConfig, NullGraphicsConfig, PipelineSettings, ScaledRenderCamera, ScaledRenderTarget};
pub use crate::plugins::preferences::{keys, MemoryPreferenceStore, PreferenceError, PreferenceStore, Preferences, RonPreferenceStore};
pub use crate::plugins::quality_tiers::{map_scale_to_tiers, QualityTiers, ShadowQuality};
pub use crate::plugins::scheduler::{TaskId, TaskQueue};
pub use crate::plugins::settings::{GraphicsSettingsPlugin, SettingChanged, SettingsSourcesPlugin, SettingsWidgets};
pub use crate::plugins::settings_menu::SettingsMenuPlugin;
pub use crate::plugins::telemetry::{FpsHistory, FrameTelemetry, TelemetryPlugin};
pub use crate::plugins::vegetation::{TerrainDetail, Tree, TreeCulled, VegetationParams, VegetationPlugin, VegetationQuality, VegetationTuning};
pub use crate::plugins::view_distance::{CameraRegistry, CategoryCullDistances, CullCategory, CullLayer, CullLayers, ViewDistanceBounds, ViewDistanceConfig, ViewDistanceManager, ViewDistancePlugin};
