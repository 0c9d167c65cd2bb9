// Frame-time telemetry: smoothed FPS for display plus a bounded history of
// raw samples consumed by the auto-scaler while it is enabled.

use std::collections::VecDeque;

use bevy::prelude::*;
use bevy::time::Real;

/// Weight of the newest frame duration in the exponential smoothing.
pub const SMOOTHING: f32 = 0.1;
pub const DEFAULT_HISTORY_CAPACITY: usize = 30;

/// Bounded FIFO of raw FPS samples; the oldest sample is evicted first.
#[derive(Debug, Clone)]
pub struct FpsHistory {
    samples: VecDeque<f32>,
    capacity: usize,
}

impl FpsHistory {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, fps: f32) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(fps);
    }

    /// Arithmetic mean, `None` while empty.
    pub fn average(&self) -> Option<f32> {
        if self.samples.is_empty() {
            return None;
        }
        let sum: f32 = self.samples.iter().sum();
        Some(sum / self.samples.len() as f32)
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = f32> + '_ {
        self.samples.iter().copied()
    }
}

impl Default for FpsHistory {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }
}

#[derive(Resource, Debug, Default)]
pub struct FrameTelemetry {
    smoothed_dt: f32,
    current_fps: f32,
    recording: bool,
    history: FpsHistory,
}

impl FrameTelemetry {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            history: FpsHistory::with_capacity(capacity),
            ..default()
        }
    }

    /// Feed one frame duration (seconds). Zero or non-finite durations are skipped.
    pub fn tick(&mut self, raw_dt: f32) -> f32 {
        if raw_dt <= 0.0 || !raw_dt.is_finite() {
            return self.current_fps;
        }
        // Seed with the first sample so the counter does not start 10x too high.
        if self.smoothed_dt <= 0.0 {
            self.smoothed_dt = raw_dt;
        } else {
            self.smoothed_dt += (raw_dt - self.smoothed_dt) * SMOOTHING;
        }
        self.current_fps = 1.0 / self.smoothed_dt;
        if self.recording {
            self.history.push(1.0 / raw_dt);
        }
        self.current_fps
    }

    /// Start or stop appending raw samples. Either way the history starts empty.
    pub fn set_recording(&mut self, recording: bool) {
        self.recording = recording;
        self.history.clear();
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn current_fps(&self) -> f32 {
        self.current_fps
    }

    pub fn history(&self) -> &FpsHistory {
        &self.history
    }
}

/// Marker for the on-screen FPS readout.
#[derive(Component)]
pub struct FpsCounterText;

#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FpsCounterVisible(pub bool);

pub fn format_fps(fps: f32) -> String {
    format!("FPS: {}", fps.max(0.0).ceil() as u32)
}

pub struct TelemetryPlugin;
impl Plugin for TelemetryPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<FrameTelemetry>()
            .init_resource::<FpsCounterVisible>()
            .add_systems(PreUpdate, sample_frame_time)
            .add_systems(Update, (update_fps_counter, sync_fps_counter_visibility));
    }
}

fn sample_frame_time(time: Res<Time<Real>>, mut telemetry: ResMut<FrameTelemetry>) {
    let dt = time.delta_seconds();
    if dt <= 0.0 {
        return;
    }
    telemetry.tick(dt);
}

fn update_fps_counter(
    telemetry: Res<FrameTelemetry>,
    visible: Res<FpsCounterVisible>,
    mut q_text: Query<&mut Text, With<FpsCounterText>>,
) {
    if !visible.0 {
        return;
    }
    let label = format_fps(telemetry.current_fps());
    for mut text in &mut q_text {
        if let Some(section) = text.sections.first_mut() {
            if section.value != label {
                section.value = label.clone();
            }
        }
    }
}

fn sync_fps_counter_visibility(
    visible: Res<FpsCounterVisible>,
    mut q_text: Query<&mut Visibility, With<FpsCounterText>>,
) {
    if !visible.is_changed() {
        return;
    }
    for mut vis in &mut q_text {
        *vis = if visible.0 { Visibility::Inherited } else { Visibility::Hidden };
    }
}
