use bevy::math::primitives::{Cone, Cuboid, Plane3d};
use bevy::prelude::*;
use rand::prelude::*;

use crate::plugins::config::QualityConfig;
use crate::plugins::graphics::ScaledRenderCamera;
use crate::plugins::vegetation::{TerrainDetail, Tree, TreeCulled};
use crate::plugins::view_distance::{CullCategory, CullLayer};

/// Ground, a field of trees, and characters/buildings tagged with cull layers
/// scattered out to ~1km so every distance setting has a visible effect.
pub struct DemoScenePlugin;

const FIELD_HALF: f32 = 900.0;
const TREE_COUNT: usize = 1500;
const PROP_COUNT: usize = 240;

impl Plugin for DemoScenePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, spawn_demo_scene)
            .add_systems(Update, orbit_demo_camera);
    }
}

#[derive(Component)]
struct DemoCamera;

fn spawn_demo_scene(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    cfg: Res<QualityConfig>,
) {
    let mut rng = thread_rng();

    commands.spawn((
        Camera3dBundle {
            transform: Transform::from_xyz(0.0, 40.0, 120.0).looking_at(Vec3::ZERO, Vec3::Y),
            ..default()
        },
        DemoCamera,
        ScaledRenderCamera,
    ));

    commands.spawn(DirectionalLightBundle {
        directional_light: DirectionalLight {
            illuminance: 12_000.0,
            shadows_enabled: true,
            ..default()
        },
        transform: Transform::from_xyz(60.0, 120.0, 40.0).looking_at(Vec3::ZERO, Vec3::Y),
        ..default()
    });

    // Terrain instance: the vegetation controller writes its detail settings.
    commands.spawn((
        PbrBundle {
            mesh: meshes.add(Plane3d::default().mesh().size(FIELD_HALF * 2.0, FIELD_HALF * 2.0)),
            material: materials.add(Color::srgb(0.22, 0.55, 0.28)),
            ..default()
        },
        TerrainDetail::default(),
    ));

    let tree_mesh = meshes.add(Cone { radius: 2.5, height: 9.0 });
    let tree_mat = materials.add(Color::srgb(0.10, 0.38, 0.16));
    for _ in 0..TREE_COUNT {
        let x = rng.gen_range(-FIELD_HALF..FIELD_HALF);
        let z = rng.gen_range(-FIELD_HALF..FIELD_HALF);
        commands.spawn((
            PbrBundle {
                mesh: tree_mesh.clone(),
                material: tree_mat.clone(),
                transform: Transform::from_xyz(x, 4.5, z),
                ..default()
            },
            Tree,
            TreeCulled(false),
        ));
    }

    let layers = cfg.cull_layers;
    let props = [
        (CullCategory::Character, Cuboid::new(1.0, 2.0, 1.0), Color::srgb(0.85, 0.75, 0.55)),
        (CullCategory::Enemy, Cuboid::new(1.4, 2.2, 1.4), Color::srgb(0.80, 0.20, 0.20)),
        (CullCategory::Building, Cuboid::new(14.0, 18.0, 14.0), Color::srgb(0.65, 0.65, 0.70)),
        (CullCategory::Cave, Cuboid::new(10.0, 6.0, 10.0), Color::srgb(0.30, 0.26, 0.22)),
    ];
    let mut spawned = 0usize;
    for (category, shape, color) in props {
        let Some(layer) = layers.layer(category) else {
            warn!("DEMO layer missing category={:?}", category);
            continue;
        };
        let mesh = meshes.add(shape);
        let material = materials.add(color);
        for _ in 0..PROP_COUNT / 4 {
            let x = rng.gen_range(-FIELD_HALF..FIELD_HALF);
            let z = rng.gen_range(-FIELD_HALF..FIELD_HALF);
            commands.spawn((
                PbrBundle {
                    mesh: mesh.clone(),
                    material: material.clone(),
                    transform: Transform::from_xyz(x, shape.half_size.y, z),
                    ..default()
                },
                CullLayer(layer),
            ));
            spawned += 1;
        }
    }

    info!("DEMO spawned trees={} props={}", TREE_COUNT, spawned);
}

fn orbit_demo_camera(time: Res<Time>, mut q_cam: Query<&mut Transform, With<DemoCamera>>) {
    let Ok(mut t) = q_cam.get_single_mut() else { return; };
    let angle = time.elapsed_seconds() * 0.05;
    let radius = 160.0;
    *t = Transform::from_xyz(angle.cos() * radius, 40.0, angle.sin() * radius).looking_at(Vec3::ZERO, Vec3::Y);
}
