// Vegetation quality: tier + distance multiplier -> terrain detail / tree draw distances.
//
// Pipeline:
//  - VegetationQuality (tier, multiplier) changes via the settings façade
//  - apply_vegetation_quality pushes the derived params into every TerrainDetail
//  - cull_trees hides trees beyond the tier's tree distance, using the
//    terrain cross-fade length as the hysteresis band (timed updates)

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::plugins::config::SliderRange;
use crate::plugins::graphics::ScaledOutputCamera;

pub const MAX_VEGETATION_TIER: u8 = 3;

/// Endpoints the tier factor interpolates between.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VegetationTuning {
    pub detail_distance: SliderRange,
    pub detail_density: SliderRange,
    pub tree_distance: SliderRange,
    pub billboard_ratio: f32,
    pub cross_fade_length: f32,
    /// Floor applied to the user multiplier before scaling distances.
    pub min_multiplier: f32,
    /// Seconds between tree culling passes.
    pub cull_interval: f32,
}

impl Default for VegetationTuning {
    fn default() -> Self {
        Self {
            detail_distance: SliderRange::new(25.0, 130.0),
            detail_density: SliderRange::new(0.25, 1.0),
            tree_distance: SliderRange::new(80.0, 650.0),
            billboard_ratio: 0.7,
            cross_fade_length: 20.0,
            min_multiplier: 0.25,
            cull_interval: 0.4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VegetationParams {
    pub detail_distance: f32,
    pub detail_density: f32,
    pub tree_distance: f32,
    pub tree_billboard_distance: f32,
    pub tree_cross_fade_length: f32,
}

impl VegetationTuning {
    /// Deterministic: same tier and multiplier always give the same params.
    pub fn params(&self, tier: u8, multiplier: f32) -> VegetationParams {
        let tier = tier.min(MAX_VEGETATION_TIER);
        let factor = f32::from(tier) / f32::from(MAX_VEGETATION_TIER);
        let multiplier = if multiplier.is_nan() { 1.0 } else { multiplier.max(self.min_multiplier) };
        let tree_distance = self.tree_distance.lerp(factor) * multiplier;
        VegetationParams {
            detail_distance: self.detail_distance.lerp(factor) * multiplier,
            detail_density: self.detail_density.lerp(factor),
            tree_distance,
            tree_billboard_distance: tree_distance * self.billboard_ratio,
            tree_cross_fade_length: self.cross_fade_length,
        }
    }
}

/// Detail/tree settings of one terrain instance.
#[derive(Component, Debug, Clone, Copy, PartialEq, Default)]
pub struct TerrainDetail {
    pub detail_distance: f32,
    pub detail_density: f32,
    pub tree_distance: f32,
    pub tree_billboard_distance: f32,
    pub tree_cross_fade_length: f32,
}

impl TerrainDetail {
    pub fn set_params(&mut self, p: &VegetationParams) {
        self.detail_distance = p.detail_distance;
        self.detail_density = p.detail_density;
        self.tree_distance = p.tree_distance;
        self.tree_billboard_distance = p.tree_billboard_distance;
        self.tree_cross_fade_length = p.tree_cross_fade_length;
    }

    pub fn matches(&self, p: &VegetationParams) -> bool {
        self.detail_distance == p.detail_distance
            && self.detail_density == p.detail_density
            && self.tree_distance == p.tree_distance
            && self.tree_billboard_distance == p.tree_billboard_distance
            && self.tree_cross_fade_length == p.tree_cross_fade_length
    }
}

#[derive(Resource, Debug, Clone)]
pub struct VegetationQuality {
    tier: u8,
    multiplier: f32,
    tuning: VegetationTuning,
}

impl Default for VegetationQuality {
    fn default() -> Self {
        Self::new(VegetationTuning::default(), 2, 1.0)
    }
}

impl VegetationQuality {
    pub fn new(tuning: VegetationTuning, tier: u8, multiplier: f32) -> Self {
        Self {
            tier: tier.min(MAX_VEGETATION_TIER),
            multiplier,
            tuning,
        }
    }

    pub fn tier(&self) -> u8 {
        self.tier
    }

    pub fn multiplier(&self) -> f32 {
        self.multiplier
    }

    pub fn tuning(&self) -> &VegetationTuning {
        &self.tuning
    }

    /// Clamped to `0..=3`; returns the stored tier.
    pub fn set_tier(&mut self, tier: i32) -> u8 {
        self.tier = tier.clamp(0, i32::from(MAX_VEGETATION_TIER)) as u8;
        self.tier
    }

    pub fn set_multiplier(&mut self, multiplier: f32) {
        self.multiplier = multiplier;
    }

    pub fn params(&self) -> VegetationParams {
        self.tuning.params(self.tier, self.multiplier)
    }
}

#[derive(Component)]
pub struct Tree;

#[derive(Component, Default)]
pub struct TreeCulled(pub bool); // true if currently hidden

#[derive(Resource)]
struct TreeCullingState {
    timer: Timer,
}

pub struct VegetationPlugin;
impl Plugin for VegetationPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<VegetationQuality>()
            .add_systems(Startup, init_tree_culling)
            .add_systems(Update, (apply_vegetation_quality, cull_trees).chain());
    }
}

fn init_tree_culling(mut commands: Commands, quality: Res<VegetationQuality>) {
    let interval = quality.tuning().cull_interval.max(0.05);
    commands.insert_resource(TreeCullingState {
        timer: Timer::from_seconds(interval, TimerMode::Repeating),
    });
}

fn apply_vegetation_quality(
    quality: Res<VegetationQuality>,
    mut q_terrain: Query<&mut TerrainDetail>,
) {
    let force = quality.is_changed();
    let params = quality.params();
    let mut updated = 0usize;
    for mut detail in &mut q_terrain {
        if !force && !detail.is_added() {
            continue;
        }
        if !detail.matches(&params) {
            detail.set_params(&params);
            updated += 1;
        }
    }
    if updated > 0 {
        info!(
            "VEGETATION tier={} multiplier={:.2} detail={:.0} density={:.2} trees={:.0} billboard={:.0} terrains={}",
            quality.tier(),
            quality.multiplier(),
            params.detail_distance,
            params.detail_density,
            params.tree_distance,
            params.tree_billboard_distance,
            updated
        );
    }
}

// Distance-based culling pass (runs at coarse interval to amortize cost)
fn cull_trees(
    time: Res<Time>,
    quality: Res<VegetationQuality>,
    state: Option<ResMut<TreeCullingState>>,
    q_cameras: Query<(&Camera, &GlobalTransform), Without<ScaledOutputCamera>>,
    mut q_trees: Query<(&mut Visibility, &GlobalTransform, &mut TreeCulled), With<Tree>>,
) {
    let Some(mut state) = state else { return; };
    let tick = state.timer.tick(time.delta()).just_finished();
    if !tick && !quality.is_changed() {
        return;
    }
    let Some(origin) = q_cameras
        .iter()
        .filter(|(cam, _)| cam.is_active)
        .map(|(_, t)| t.translation())
        .next()
    else {
        return;
    };

    let (hide_r, show_r) = tree_cull_radii(&quality.params());
    let hide_r2 = hide_r * hide_r;
    let show_r2 = show_r * show_r;

    for (mut vis, t, mut culled) in &mut q_trees {
        let d2 = (t.translation() - origin).length_squared();
        if !culled.0 && d2 > hide_r2 {
            *vis = Visibility::Hidden;
            culled.0 = true;
        } else if culled.0 && d2 < show_r2 {
            *vis = Visibility::Inherited;
            culled.0 = false;
        }
    }
}

/// (hide, show) radii: the cross-fade band is split around the tree distance.
pub fn tree_cull_radii(params: &VegetationParams) -> (f32, f32) {
    let h = params.tree_cross_fade_length * 0.5;
    let hide_r = params.tree_distance + h;
    let show_r = (params.tree_distance - h).max(0.0);
    (hide_r, show_r)
}
