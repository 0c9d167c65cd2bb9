//! Discrete shadow tiers derived from the continuous render scale.
//!
//! Two independent ladders: one for shadow distance, one for shadow quality.
//! Above the quality ladder's top threshold the mapper leaves the current
//! quality untouched, so a user-selected quality survives scale increases.

use serde::{Deserialize, Serialize};

use crate::plugins::graphics::GraphicsConfig;

pub const SHADOW_DISTANCE_LOW: f32 = 30.0;
pub const SHADOW_DISTANCE_MEDIUM: f32 = 50.0;
pub const SHADOW_DISTANCE_HIGH: f32 = 100.0;

// Ladder thresholds (exclusive upper bounds).
const DISTANCE_LOW_BELOW: f32 = 0.75;
const DISTANCE_MEDIUM_BELOW: f32 = 0.9;
const QUALITY_HARD_BELOW: f32 = 0.7;
const QUALITY_ALL_BELOW: f32 = 0.85;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ShadowQuality {
    Disabled,
    HardOnly,
    #[default]
    All,
}

impl ShadowQuality {
    pub const ALL: [ShadowQuality; 3] = [ShadowQuality::Disabled, ShadowQuality::HardOnly, ShadowQuality::All];

    pub fn index(self) -> u8 {
        match self {
            ShadowQuality::Disabled => 0,
            ShadowQuality::HardOnly => 1,
            ShadowQuality::All => 2,
        }
    }

    /// Out-of-range indices clamp to the nearest variant.
    pub fn from_index(index: i32) -> Self {
        match index {
            i if i <= 0 => ShadowQuality::Disabled,
            1 => ShadowQuality::HardOnly,
            _ => ShadowQuality::All,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ShadowQuality::Disabled => "Off",
            ShadowQuality::HardOnly => "Hard",
            ShadowQuality::All => "Soft",
        }
    }
}

/// Result of mapping a render scale. `shadow_quality == None` means "keep whatever is set".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityTiers {
    pub shadow_distance: f32,
    pub shadow_quality: Option<ShadowQuality>,
}

impl QualityTiers {
    pub fn apply(&self, graphics: &mut dyn GraphicsConfig) {
        graphics.set_shadow_distance(self.shadow_distance);
        if let Some(quality) = self.shadow_quality {
            graphics.set_shadow_quality(quality);
        }
    }
}

pub fn map_scale_to_tiers(scale: f32) -> QualityTiers {
    let shadow_distance = if scale < DISTANCE_LOW_BELOW {
        SHADOW_DISTANCE_LOW
    } else if scale < DISTANCE_MEDIUM_BELOW {
        SHADOW_DISTANCE_MEDIUM
    } else {
        SHADOW_DISTANCE_HIGH
    };
    let shadow_quality = if scale < QUALITY_HARD_BELOW {
        Some(ShadowQuality::HardOnly)
    } else if scale < QUALITY_ALL_BELOW {
        Some(ShadowQuality::All)
    } else {
        None
    };
    QualityTiers { shadow_distance, shadow_quality }
}
