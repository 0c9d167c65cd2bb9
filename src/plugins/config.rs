use std::fs;
use std::path::Path;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::plugins::auto_scale::AutoScaleConfig;
use crate::plugins::display::FrameRateCap;
use crate::plugins::vegetation::{VegetationTuning, MAX_VEGETATION_TIER};
use crate::plugins::view_distance::{CullLayers, ViewDistanceBounds, MAX_CULL_LAYERS};

pub const DEFAULT_CONFIG_PATH: &str = "assets/config/quality.ron";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: ron::error::SpannedError,
    },
}

/// Inclusive `[min, max]` range backing one slider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SliderRange {
    pub min: f32,
    pub max: f32,
}

impl SliderRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Clamps into the range; NaN falls back to the lower bound.
    /// Inverted bounds are read low-to-high instead of panicking.
    pub fn clamp(&self, value: f32) -> f32 {
        let (lo, hi) = self.ordered();
        if value.is_nan() {
            return lo;
        }
        value.max(lo).min(hi)
    }

    pub fn ordered(&self) -> (f32, f32) {
        if self.min <= self.max {
            (self.min, self.max)
        } else {
            (self.max, self.min)
        }
    }

    pub fn lerp(&self, t: f32) -> f32 {
        self.min + (self.max - self.min) * t
    }

    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min <= self.max
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformDefaults {
    /// Mobile handhelds: lower render scale cap and vegetation tier ceiling.
    pub mobile: bool,
    pub mobile_scale_threshold: f32,
    pub mobile_scale: f32,
    pub mobile_max_vegetation_tier: u8,
    pub mobile_default_vegetation_tier: u8,
    pub default_vegetation_tier: u8,
    /// Handhelds run capped with vsync off regardless of stored display settings.
    pub mobile_frame_cap: FrameRateCap,
    pub mobile_vsync: bool,
}

impl Default for PlatformDefaults {
    fn default() -> Self {
        Self {
            mobile: false,
            mobile_scale_threshold: 0.9,
            mobile_scale: 0.85,
            mobile_max_vegetation_tier: 2,
            mobile_default_vegetation_tier: 1,
            default_vegetation_tier: 2,
            mobile_frame_cap: FrameRateCap::Fps60,
            mobile_vsync: false,
        }
    }
}

#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct QualityConfig {
    pub auto_scale: AutoScaleConfig,
    pub view_distance: ViewDistanceBounds,
    pub cull_layers: CullLayers,
    pub vegetation: VegetationTuning,
    pub platform: PlatformDefaults,
}

impl QualityConfig {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: display.clone(),
            source,
        })?;
        ron::from_str(&content).map_err(|source| ConfigError::Parse { path: display, source })
    }

    /// Defaults when the file is missing; parse errors are logged and also fall back.
    /// Sections that fail validation are replaced by their defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            info!("CONFIG default path={}", path.display());
            return Self::default();
        }
        match Self::load_from_file(path) {
            Ok(cfg) => {
                let warnings = cfg.validate();
                for warning in &warnings {
                    warn!("CONFIG {}", warning);
                }
                info!("CONFIG loaded path={} warnings={}", path.display(), warnings.len());
                cfg.repaired()
            }
            Err(e) => {
                error!("CONFIG {} (using defaults)", e);
                Self::default()
            }
        }
    }

    /// Resets every section [`validate`](Self::validate) would complain about.
    pub fn repaired(mut self) -> Self {
        if !self.auto_scale.is_valid() {
            self.auto_scale = AutoScaleConfig::default();
        }
        let bounds = ViewDistanceBounds::default();
        let view = &mut self.view_distance;
        for (range, fallback) in [
            (&mut view.entity, bounds.entity),
            (&mut view.building, bounds.building),
            (&mut view.vegetation_multiplier, bounds.vegetation_multiplier),
        ] {
            if !range.is_valid() {
                *range = fallback;
            }
        }
        let tuning = VegetationTuning::default();
        let veg = &mut self.vegetation;
        for (range, fallback) in [
            (&mut veg.detail_distance, tuning.detail_distance),
            (&mut veg.detail_density, tuning.detail_density),
            (&mut veg.tree_distance, tuning.tree_distance),
        ] {
            if !range.is_valid() {
                *range = fallback;
            }
        }
        let platform = &mut self.platform;
        platform.mobile_max_vegetation_tier = platform.mobile_max_vegetation_tier.min(MAX_VEGETATION_TIER);
        self
    }

    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        let a = &self.auto_scale;
        if a.min_fps >= a.max_fps {
            warnings.push(format!(
                "auto_scale.min_fps ({}) should be below max_fps ({})",
                a.min_fps, a.max_fps
            ));
        }
        if !a.scale_range_is_valid() {
            warnings.push(format!(
                "auto_scale.min_scale ({}) should be in (0, max_scale={}]",
                a.min_scale, a.max_scale
            ));
        }
        if a.scale_step <= 0.0 {
            warnings.push(format!("auto_scale.scale_step ({}) should be > 0", a.scale_step));
        }
        if a.check_interval <= 0.0 {
            warnings.push(format!("auto_scale.check_interval ({}) should be > 0", a.check_interval));
        }
        if a.history_size == 0 {
            warnings.push("auto_scale.history_size should be at least 1".to_string());
        }
        for (name, range) in [
            ("entity", self.view_distance.entity),
            ("building", self.view_distance.building),
            ("vegetation_multiplier", self.view_distance.vegetation_multiplier),
            ("vegetation.detail_distance", self.vegetation.detail_distance),
            ("vegetation.detail_density", self.vegetation.detail_density),
            ("vegetation.tree_distance", self.vegetation.tree_distance),
        ] {
            if !range.is_valid() {
                warnings.push(format!("{} range [{}, {}] is invalid", name, range.min, range.max));
            }
        }
        for (category, layer) in self.cull_layers.entries() {
            if let Some(layer) = layer {
                if usize::from(layer) >= MAX_CULL_LAYERS {
                    warnings.push(format!("cull_layers.{:?} ({}) is out of range and will be skipped", category, layer));
                }
            }
        }
        if self.platform.mobile_max_vegetation_tier > MAX_VEGETATION_TIER {
            warnings.push(format!(
                "platform.mobile_max_vegetation_tier ({}) exceeds {}",
                self.platform.mobile_max_vegetation_tier,
                MAX_VEGETATION_TIER
            ));
        }
        warnings
    }
}
