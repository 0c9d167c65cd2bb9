use std::time::Duration;

use bevy::prelude::*;
use bevy::utils::Instant;
use bevy::window::{PresentMode, PrimaryWindow};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FrameRateCap {
    Fps30,
    Fps60,
    Fps120,
    #[default]
    Unlimited,
}

impl FrameRateCap {
    pub const ALL: [FrameRateCap; 4] = [Self::Fps30, Self::Fps60, Self::Fps120, Self::Unlimited];

    pub fn index(self) -> u8 {
        match self {
            Self::Fps30 => 0,
            Self::Fps60 => 1,
            Self::Fps120 => 2,
            Self::Unlimited => 3,
        }
    }

    pub fn from_index(index: i32) -> Self {
        Self::ALL[index.clamp(0, 3) as usize]
    }

    pub fn fps(self) -> Option<u32> {
        match self {
            Self::Fps30 => Some(30),
            Self::Fps60 => Some(60),
            Self::Fps120 => Some(120),
            Self::Unlimited => None,
        }
    }

    pub fn frame_budget(self) -> Option<Duration> {
        self.fps().map(|fps| Duration::from_secs_f64(1.0 / f64::from(fps)))
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Fps30 => "30 FPS",
            Self::Fps60 => "60 FPS",
            Self::Fps120 => "120 FPS",
            Self::Unlimited => "Unlimited",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AntiAliasing {
    Off,
    X2,
    #[default]
    X4,
    X8,
}

impl AntiAliasing {
    pub const ALL: [AntiAliasing; 4] = [Self::Off, Self::X2, Self::X4, Self::X8];

    pub fn index(self) -> u8 {
        match self {
            Self::Off => 0,
            Self::X2 => 1,
            Self::X4 => 2,
            Self::X8 => 3,
        }
    }

    pub fn from_index(index: i32) -> Self {
        Self::ALL[index.clamp(0, 3) as usize]
    }

    pub fn msaa(self) -> Msaa {
        match self {
            Self::Off => Msaa::Off,
            Self::X2 => Msaa::Sample2,
            Self::X4 => Msaa::Sample4,
            Self::X8 => Msaa::Sample8,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Off => "Off",
            Self::X2 => "2x MSAA",
            Self::X4 => "4x MSAA",
            Self::X8 => "8x MSAA",
        }
    }
}

/// Presentation settings owned by the window rather than the render pipeline.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct DisplaySettings {
    pub frame_cap: FrameRateCap,
    pub vsync: bool,
    pub anti_aliasing: AntiAliasing,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            frame_cap: FrameRateCap::Unlimited,
            vsync: true,
            anti_aliasing: AntiAliasing::X4,
        }
    }
}

pub fn present_mode(vsync: bool) -> PresentMode {
    if vsync {
        PresentMode::AutoVsync
    } else {
        PresentMode::AutoNoVsync
    }
}

/// How long to idle so a frame that took `spent` fills the cap's budget.
pub fn limiter_wait(cap: FrameRateCap, spent: Duration) -> Option<Duration> {
    cap.frame_budget()?
        .checked_sub(spent)
        .filter(|wait| !wait.is_zero())
}

#[derive(Resource, Debug, Default)]
pub struct FrameLimiter {
    last_frame_end: Option<Instant>,
}

pub struct DisplayPlugin;
impl Plugin for DisplayPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<DisplaySettings>()
            .init_resource::<FrameLimiter>()
            .add_systems(PostUpdate, apply_display_settings)
            .add_systems(Last, limit_frame_rate);
    }
}

fn apply_display_settings(
    settings: Res<DisplaySettings>,
    msaa: Option<ResMut<Msaa>>,
    mut q_window: Query<&mut Window, With<PrimaryWindow>>,
) {
    if !settings.is_changed() {
        return;
    }
    let mode = present_mode(settings.vsync);
    if let Ok(mut window) = q_window.get_single_mut() {
        if window.present_mode != mode {
            window.present_mode = mode;
        }
    }
    if let Some(mut msaa) = msaa {
        let samples = settings.anti_aliasing.msaa();
        if *msaa != samples {
            *msaa = samples;
        }
    }
    info!(
        "DISPLAY cap={} vsync={} aa={}",
        settings.frame_cap.label(),
        settings.vsync,
        settings.anti_aliasing.label()
    );
}

// Browsers pace frames themselves; native builds idle out the rest of the budget.
fn limit_frame_rate(settings: Res<DisplaySettings>, mut limiter: ResMut<FrameLimiter>) {
    if let Some(last) = limiter.last_frame_end {
        if let Some(wait) = limiter_wait(settings.frame_cap, last.elapsed()) {
            #[cfg(not(target_arch = "wasm32"))]
            std::thread::sleep(wait);
            #[cfg(target_arch = "wasm32")]
            let _ = wait;
        }
    }
    limiter.last_frame_end = Some(Instant::now());
}
