//! Per-category view distances pushed into every active camera.
//!
//! Each camera carries a 32-entry [`CategoryCullDistances`] table indexed by
//! cull layer. [`ViewDistanceManager`] fills those tables lazily: a camera is
//! written once per distinct configuration, tracked by a cache of configured
//! cameras plus a dirty flag. Any setter clears the cache and raises the flag,
//! the next pass rewrites every registered camera and then lowers the flag.

use std::collections::HashSet;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::plugins::config::SliderRange;
use crate::plugins::graphics::{Graphics, ScaledOutputCamera};

pub const MAX_CULL_LAYERS: usize = 32;

/// Where the entity and building defaults sit inside their slider ranges.
pub const DEFAULT_DISTANCE_FRACTION: f32 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CullCategory {
    Character,
    Enemy,
    Building,
    Cave,
}

/// Layer index of each category; `None` (or an index past the table) means
/// the layer does not exist in this project and is skipped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CullLayers {
    pub character: Option<u8>,
    pub enemy: Option<u8>,
    pub building: Option<u8>,
    pub cave: Option<u8>,
}

impl Default for CullLayers {
    fn default() -> Self {
        Self {
            character: Some(8),
            enemy: Some(9),
            building: Some(10),
            cave: Some(11),
        }
    }
}

impl CullLayers {
    pub fn layer(&self, category: CullCategory) -> Option<u8> {
        match category {
            CullCategory::Character => self.character,
            CullCategory::Enemy => self.enemy,
            CullCategory::Building => self.building,
            CullCategory::Cave => self.cave,
        }
    }

    pub fn entries(&self) -> [(CullCategory, Option<u8>); 4] {
        [
            (CullCategory::Character, self.character),
            (CullCategory::Enemy, self.enemy),
            (CullCategory::Building, self.building),
            (CullCategory::Cave, self.cave),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewDistanceBounds {
    pub entity: SliderRange,
    pub building: SliderRange,
    pub vegetation_multiplier: SliderRange,
}

impl Default for ViewDistanceBounds {
    fn default() -> Self {
        Self {
            entity: SliderRange::new(60.0, 600.0),
            building: SliderRange::new(80.0, 900.0),
            vegetation_multiplier: SliderRange::new(0.5, 2.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewDistanceConfig {
    pub entity_distance: f32,
    pub building_distance: f32,
    pub vegetation_multiplier: f32,
}

impl ViewDistanceConfig {
    pub fn defaults_for(bounds: &ViewDistanceBounds) -> Self {
        Self {
            entity_distance: bounds.entity.lerp(DEFAULT_DISTANCE_FRACTION),
            building_distance: bounds.building.lerp(DEFAULT_DISTANCE_FRACTION),
            vegetation_multiplier: bounds.vegetation_multiplier.clamp(1.0),
        }
    }
}

/// Per-camera distance table; an entry of 0 means "no category limit".
#[derive(Component, Debug, Clone, PartialEq)]
pub struct CategoryCullDistances {
    pub distances: [f32; MAX_CULL_LAYERS],
    pub spherical: bool,
}

impl Default for CategoryCullDistances {
    fn default() -> Self {
        Self {
            distances: [0.0; MAX_CULL_LAYERS],
            spherical: false,
        }
    }
}

impl CategoryCullDistances {
    pub fn limit(&self, layer: u8) -> Option<f32> {
        self.distances
            .get(usize::from(layer))
            .copied()
            .filter(|d| *d > 0.0)
    }
}

/// Tags an entity with the cull layer its visibility distance comes from.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CullLayer(pub u8);

#[derive(Debug, Default)]
pub struct CullApplicationCache {
    configured: HashSet<Entity>,
    dirty: bool,
}

impl CullApplicationCache {
    pub fn invalidate(&mut self) {
        self.dirty = true;
        self.configured.clear();
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn contains(&self, camera: Entity) -> bool {
        self.configured.contains(&camera)
    }

    pub fn len(&self) -> usize {
        self.configured.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configured.is_empty()
    }
}

/// Cameras known to the culling manager, in registration order.
#[derive(Resource, Debug, Default)]
pub struct CameraRegistry {
    cameras: Vec<Entity>,
}

impl CameraRegistry {
    pub fn register(&mut self, camera: Entity) -> bool {
        if self.cameras.contains(&camera) {
            return false;
        }
        self.cameras.push(camera);
        true
    }

    pub fn unregister(&mut self, camera: Entity) -> bool {
        let before = self.cameras.len();
        self.cameras.retain(|c| *c != camera);
        self.cameras.len() != before
    }

    pub fn contains(&self, camera: Entity) -> bool {
        self.cameras.contains(&camera)
    }

    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.cameras.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.cameras.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cameras.is_empty()
    }
}

#[derive(Resource, Debug)]
pub struct ViewDistanceManager {
    bounds: ViewDistanceBounds,
    layers: CullLayers,
    config: ViewDistanceConfig,
    cache: CullApplicationCache,
}

impl Default for ViewDistanceManager {
    fn default() -> Self {
        Self::new(ViewDistanceBounds::default(), CullLayers::default())
    }
}

impl ViewDistanceManager {
    pub fn new(bounds: ViewDistanceBounds, layers: CullLayers) -> Self {
        let mut cache = CullApplicationCache::default();
        cache.invalidate();
        Self {
            config: ViewDistanceConfig::defaults_for(&bounds),
            bounds,
            layers,
            cache,
        }
    }

    pub fn bounds(&self) -> &ViewDistanceBounds {
        &self.bounds
    }

    pub fn layers(&self) -> &CullLayers {
        &self.layers
    }

    pub fn config(&self) -> ViewDistanceConfig {
        self.config
    }

    pub fn cache(&self) -> &CullApplicationCache {
        &self.cache
    }

    /// Returns the clamped value actually stored.
    pub fn set_entity_distance(&mut self, distance: f32) -> f32 {
        self.config.entity_distance = self.bounds.entity.clamp(distance);
        self.cache.invalidate();
        debug!("VIEWDIST entity={:.0}", self.config.entity_distance);
        self.config.entity_distance
    }

    pub fn set_building_distance(&mut self, distance: f32) -> f32 {
        self.config.building_distance = self.bounds.building.clamp(distance);
        self.cache.invalidate();
        debug!("VIEWDIST building={:.0}", self.config.building_distance);
        self.config.building_distance
    }

    pub fn set_vegetation_multiplier(&mut self, multiplier: f32) -> f32 {
        self.config.vegetation_multiplier = self.bounds.vegetation_multiplier.clamp(multiplier);
        self.cache.invalidate();
        debug!("VIEWDIST vegetation_multiplier={:.2}", self.config.vegetation_multiplier);
        self.config.vegetation_multiplier
    }

    pub fn needs_apply(&self, camera: Entity) -> bool {
        self.cache.dirty || !self.cache.contains(camera)
    }

    /// Writes the category distances into `table` unless this camera already
    /// holds the current configuration. Returns whether anything was written.
    pub fn apply_to(&mut self, camera: Entity, table: &mut CategoryCullDistances, spherical_supported: bool) -> bool {
        if !self.needs_apply(camera) {
            return false;
        }
        for (category, layer) in self.layers.entries() {
            let Some(slot) = layer.and_then(|l| table.distances.get_mut(usize::from(l))) else {
                continue;
            };
            let value = match category {
                CullCategory::Character | CullCategory::Enemy => self.config.entity_distance,
                CullCategory::Building | CullCategory::Cave => self.config.building_distance,
            };
            *slot = value.max(0.0);
        }
        if spherical_supported {
            table.spherical = true;
        }
        self.cache.configured.insert(camera);
        true
    }

    /// End of a frame's pass over all registered cameras.
    pub fn finish_frame(&mut self) {
        self.cache.dirty = false;
    }

    pub fn forget_camera(&mut self, camera: Entity) {
        self.cache.configured.remove(&camera);
    }
}

pub struct ViewDistancePlugin;
impl Plugin for ViewDistancePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CameraRegistry>()
            .init_resource::<ViewDistanceManager>()
            .add_systems(
                PostUpdate,
                (
                    register_cameras,
                    unregister_cameras,
                    apply_cull_distances,
                    cull_by_category,
                )
                    .chain()
                    .before(bevy::render::view::VisibilitySystems::VisibilityPropagate),
            );
    }
}

fn register_cameras(
    mut commands: Commands,
    mut registry: ResMut<CameraRegistry>,
    q_new: Query<(Entity, Has<CategoryCullDistances>), (Added<Camera>, Without<ScaledOutputCamera>)>,
) {
    for (entity, has_table) in &q_new {
        if registry.register(entity) {
            debug!("VIEWDIST camera registered entity={:?}", entity);
        }
        if !has_table {
            commands.entity(entity).insert(CategoryCullDistances::default());
        }
    }
}

fn unregister_cameras(
    mut removed: RemovedComponents<Camera>,
    mut registry: ResMut<CameraRegistry>,
    mut manager: ResMut<ViewDistanceManager>,
) {
    for entity in removed.read() {
        if registry.unregister(entity) {
            manager.forget_camera(entity);
            debug!("VIEWDIST camera unregistered entity={:?}", entity);
        }
    }
}

pub fn apply_cull_distances(
    registry: Res<CameraRegistry>,
    graphics: Res<Graphics>,
    mut manager: ResMut<ViewDistanceManager>,
    mut q_tables: Query<&mut CategoryCullDistances>,
) {
    let spherical = graphics.config().supports_spherical_culling();
    let mut written = 0usize;
    for camera in registry.iter() {
        if !manager.needs_apply(camera) {
            continue;
        }
        let Ok(mut table) = q_tables.get_mut(camera) else { continue; };
        if manager.apply_to(camera, &mut table, spherical) {
            written += 1;
        }
    }
    if manager.cache().is_dirty() {
        manager.finish_frame();
    }
    if written > 0 {
        let cfg = manager.config();
        debug!(
            "VIEWDIST applied cameras={} entity={:.0} building={:.0}",
            written, cfg.entity_distance, cfg.building_distance
        );
    }
}

/// Hides layer-tagged entities no active camera admits under its table.
fn cull_by_category(
    q_cameras: Query<(&Camera, &GlobalTransform, &CategoryCullDistances)>,
    mut q_tagged: Query<(&CullLayer, &GlobalTransform, &mut Visibility)>,
) {
    for (layer, transform, mut vis) in &mut q_tagged {
        let pos = transform.translation();
        let mut any_camera = false;
        let visible = q_cameras.iter().filter(|(cam, _, _)| cam.is_active).any(|(_, cam_t, table)| {
            any_camera = true;
            match table.limit(layer.0) {
                None => true,
                Some(limit) => category_distance(cam_t, pos, table.spherical) <= limit,
            }
        });
        if !any_camera {
            continue;
        }
        let wanted = if visible { Visibility::Inherited } else { Visibility::Hidden };
        if *vis != wanted {
            *vis = wanted;
        }
    }
}

/// Spherical distance, or depth along the camera's forward axis.
pub fn category_distance(camera: &GlobalTransform, point: Vec3, spherical: bool) -> f32 {
    let offset = point - camera.translation();
    if spherical {
        offset.length()
    } else {
        offset.dot(*camera.forward())
    }
}
