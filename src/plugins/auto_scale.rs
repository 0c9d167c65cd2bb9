use bevy::app::AppExit;
use bevy::prelude::*;
use bevy::time::Real;
use serde::{Deserialize, Serialize};

use crate::plugins::graphics::{Graphics, GraphicsConfig};
use crate::plugins::quality_tiers::{map_scale_to_tiers, QualityTiers};
use crate::plugins::scheduler::{TaskId, TaskQueue};
use crate::plugins::settings::SettingsWidgets;
use crate::plugins::telemetry::{FpsHistory, FrameTelemetry};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoScaleConfig {
    pub min_fps: f32,
    pub max_fps: f32,
    pub min_scale: f32,
    pub max_scale: f32,
    pub scale_step: f32,
    /// Seconds between evaluations.
    pub check_interval: f64,
    /// Minimum seconds between two scale changes.
    pub stabilization_delay: f64,
    pub history_size: usize,
    /// Average assumed while no samples were recorded.
    pub fallback_fps: f32,
}

impl Default for AutoScaleConfig {
    fn default() -> Self {
        Self {
            min_fps: 35.0,
            max_fps: 55.0,
            min_scale: 0.6,
            max_scale: 1.0,
            scale_step: 0.05,
            check_interval: 2.0,
            stabilization_delay: 5.0,
            history_size: 30,
            fallback_fps: 60.0,
        }
    }
}

impl AutoScaleConfig {
    /// Clamps and snaps to the 0.01 grid. Inverted bounds are read low-to-high.
    pub fn clamp_scale(&self, scale: f32) -> f32 {
        let (lo, hi) = if self.min_scale <= self.max_scale {
            (self.min_scale, self.max_scale)
        } else {
            (self.max_scale, self.min_scale)
        };
        if !scale.is_finite() {
            return hi;
        }
        snap(scale.max(lo).min(hi))
    }

    pub fn scale_range_is_valid(&self) -> bool {
        self.min_scale.is_finite() && self.max_scale.is_finite() && self.min_scale > 0.0 && self.min_scale <= self.max_scale
    }

    pub fn is_valid(&self) -> bool {
        self.min_fps < self.max_fps
            && self.scale_range_is_valid()
            && self.scale_step > 0.0
            && self.check_interval > 0.0
            && self.history_size > 0
    }
}

// Scales live on a 0.01 grid so repeated steps land exactly on ladder thresholds.
fn snap(scale: f32) -> f32 {
    (scale * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalingState {
    pub current_scale: f32,
    pub last_change: f64,
    pub enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleDirection {
    Down,
    Up,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleChange {
    pub previous: f32,
    pub scale: f32,
    pub avg_fps: f32,
    pub direction: ScaleDirection,
    pub tiers: QualityTiers,
}

/// Feedback loop from averaged FPS to render scale.
#[derive(Resource, Debug)]
pub struct AutoScaleController {
    config: AutoScaleConfig,
    state: ScalingState,
    task: Option<TaskId>,
}

impl Default for AutoScaleController {
    fn default() -> Self {
        Self::new(AutoScaleConfig::default())
    }
}

impl AutoScaleController {
    pub fn new(config: AutoScaleConfig) -> Self {
        let state = ScalingState {
            current_scale: config.max_scale,
            last_change: 0.0,
            enabled: false,
        };
        Self { config, state, task: None }
    }

    pub fn config(&self) -> &AutoScaleConfig {
        &self.config
    }

    pub fn state(&self) -> ScalingState {
        self.state
    }

    pub fn current_scale(&self) -> f32 {
        self.state.current_scale
    }

    pub fn is_enabled(&self) -> bool {
        self.state.enabled
    }

    pub fn task(&self) -> Option<TaskId> {
        self.task
    }

    /// Take over a scale read from the backend or the preference store.
    pub fn adopt_scale(&mut self, scale: f32) {
        self.state.current_scale = self.config.clamp_scale(scale);
    }

    pub fn enable(&mut self, now: f64, telemetry: &mut FrameTelemetry, queue: &mut TaskQueue) {
        if let Some(task) = self.task.take() {
            queue.cancel(task);
        }
        telemetry.set_recording(true);
        self.state.enabled = true;
        self.state.last_change = now;
        self.task = Some(queue.schedule_repeating(now, self.config.check_interval));
        info!(
            "AUTOSCALE enabled scale={:.2} interval={:.1}s",
            self.state.current_scale, self.config.check_interval
        );
    }

    /// Stops the periodic task and drops the history; the current scale is kept.
    pub fn disable(&mut self, telemetry: &mut FrameTelemetry, queue: &mut TaskQueue) {
        if let Some(task) = self.task.take() {
            queue.cancel(task);
        }
        telemetry.set_recording(false);
        if self.state.enabled {
            info!("AUTOSCALE disabled scale={:.2}", self.state.current_scale);
        }
        self.state.enabled = false;
    }

    /// Scale the next evaluation would pick, without side effects.
    pub fn decide(&self, avg_fps: f32, now: f64) -> Option<f32> {
        if now - self.state.last_change < self.config.stabilization_delay {
            return None;
        }
        let c = &self.config;
        let current = self.state.current_scale;
        if avg_fps < c.min_fps && current > c.min_scale {
            Some(snap((current - c.scale_step).max(c.min_scale)))
        } else if avg_fps > c.max_fps && current < c.max_scale {
            Some(snap((current + c.scale_step).min(c.max_scale)))
        } else {
            None
        }
    }

    /// One pass of the loop. Writes the render scale first, then the shadow tiers.
    pub fn evaluate_once(
        &mut self,
        now: f64,
        history: &FpsHistory,
        graphics: &mut dyn GraphicsConfig,
    ) -> Option<ScaleChange> {
        let avg_fps = history.average().unwrap_or(self.config.fallback_fps);
        let scale = self.decide(avg_fps, now)?;
        let previous = self.state.current_scale;
        let direction = if scale < previous { ScaleDirection::Down } else { ScaleDirection::Up };

        graphics.set_render_scale(scale);
        self.state.current_scale = scale;
        self.state.last_change = now;
        let tiers = map_scale_to_tiers(scale);
        tiers.apply(graphics);

        match direction {
            ScaleDirection::Down => info!("AUTOSCALE down fps={:.1} scale={:.2}", avg_fps, scale),
            ScaleDirection::Up => info!("AUTOSCALE up fps={:.1} scale={:.2}", avg_fps, scale),
        }
        Some(ScaleChange { previous, scale, avg_fps, direction, tiers })
    }

    /// Manual slider edit: same write path as an evaluation and restarts the grace period.
    pub fn override_scale(&mut self, scale: f32, now: f64, graphics: &mut dyn GraphicsConfig) -> QualityTiers {
        let scale = self.config.clamp_scale(scale);
        graphics.set_render_scale(scale);
        self.state.current_scale = scale;
        self.state.last_change = now;
        let tiers = map_scale_to_tiers(scale);
        tiers.apply(graphics);
        info!("AUTOSCALE override scale={:.2}", scale);
        tiers
    }
}

pub struct AutoScalePlugin;
impl Plugin for AutoScalePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<AutoScaleController>()
            .init_resource::<TaskQueue>()
            .add_systems(Update, drive_auto_scale)
            .add_systems(Last, stop_on_exit);
    }
}

pub fn drive_auto_scale(
    time: Res<Time<Real>>,
    mut queue: ResMut<TaskQueue>,
    mut controller: ResMut<AutoScaleController>,
    telemetry: Res<FrameTelemetry>,
    mut graphics: ResMut<Graphics>,
    widgets: Option<ResMut<SettingsWidgets>>,
) {
    let Some(task) = controller.task() else { return; };
    let now = time.elapsed_seconds_f64();
    if !queue.poll(now).contains(&task) {
        return;
    }
    let change = controller.evaluate_once(
        now,
        telemetry.history(),
        graphics.bypass_change_detection().config_mut(),
    );
    let Some(change) = change else { return; };
    graphics.set_changed();

    // Mirror into the widgets without triggering their edit handlers.
    if let Some(mut widgets) = widgets {
        let w = widgets.bypass_change_detection();
        w.render_scale = change.scale;
        w.shadow_distance = change.tiers.shadow_distance;
        if let Some(quality) = change.tiers.shadow_quality {
            w.shadow_quality = quality;
        }
    }
}

fn stop_on_exit(
    mut exit: EventReader<AppExit>,
    mut controller: ResMut<AutoScaleController>,
    mut telemetry: ResMut<FrameTelemetry>,
    mut queue: ResMut<TaskQueue>,
) {
    if exit.read().next().is_some() {
        controller.disable(&mut telemetry, &mut queue);
    }
}
