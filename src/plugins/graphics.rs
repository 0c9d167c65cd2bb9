use bevy::pbr::{CascadeShadowConfig, CascadeShadowConfigBuilder};
use bevy::prelude::*;
use bevy::render::camera::{CameraUpdateSystem, RenderTarget};
use bevy::render::render_resource::{
    Extent3d, TextureDescriptor, TextureDimension, TextureFormat, TextureUsages,
};
use bevy::ui::IsDefaultUiCamera;
use bevy::window::PrimaryWindow;

use crate::plugins::quality_tiers::ShadowQuality;

/// Capability interface over the active graphics configuration.
///
/// `render_scale` is optional: a backend without a resolution scale parameter
/// returns `None` and treats `set_render_scale` as a no-op.
pub trait GraphicsConfig: Send + Sync + 'static {
    fn render_scale(&self) -> Option<f32>;
    fn set_render_scale(&mut self, scale: f32);
    fn shadow_distance(&self) -> f32;
    fn set_shadow_distance(&mut self, distance: f32);
    fn shadow_quality(&self) -> ShadowQuality;
    fn set_shadow_quality(&mut self, quality: ShadowQuality);
    /// Whether per-category cull distances may be measured spherically.
    fn supports_spherical_culling(&self) -> bool;
}

/// In-process pipeline settings. Shadows are pushed to lights by
/// `sync_light_shadows`; render scale sizes the [`ScaledRenderTarget`].
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    pub render_scale: f32,
    pub shadow_distance: f32,
    pub shadow_quality: ShadowQuality,
    pub spherical_culling: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            render_scale: 1.0,
            shadow_distance: 100.0,
            shadow_quality: ShadowQuality::All,
            spherical_culling: true,
        }
    }
}

impl GraphicsConfig for PipelineSettings {
    fn render_scale(&self) -> Option<f32> {
        Some(self.render_scale)
    }
    fn set_render_scale(&mut self, scale: f32) {
        self.render_scale = scale;
    }
    fn shadow_distance(&self) -> f32 {
        self.shadow_distance
    }
    fn set_shadow_distance(&mut self, distance: f32) {
        self.shadow_distance = distance.max(0.0);
    }
    fn shadow_quality(&self) -> ShadowQuality {
        self.shadow_quality
    }
    fn set_shadow_quality(&mut self, quality: ShadowQuality) {
        self.shadow_quality = quality;
    }
    fn supports_spherical_culling(&self) -> bool {
        self.spherical_culling
    }
}

/// Stand-in when no pipeline is available; every write is dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullGraphicsConfig;

impl GraphicsConfig for NullGraphicsConfig {
    fn render_scale(&self) -> Option<f32> {
        None
    }
    fn set_render_scale(&mut self, _scale: f32) {}
    fn shadow_distance(&self) -> f32 {
        0.0
    }
    fn set_shadow_distance(&mut self, _distance: f32) {}
    fn shadow_quality(&self) -> ShadowQuality {
        ShadowQuality::Disabled
    }
    fn set_shadow_quality(&mut self, _quality: ShadowQuality) {}
    fn supports_spherical_culling(&self) -> bool {
        false
    }
}

#[derive(Resource)]
pub struct Graphics(Box<dyn GraphicsConfig>);

impl Graphics {
    pub fn new(config: impl GraphicsConfig) -> Self {
        Self(Box::new(config))
    }

    pub fn null() -> Self {
        Self::new(NullGraphicsConfig)
    }

    pub fn config(&self) -> &dyn GraphicsConfig {
        self.0.as_ref()
    }

    pub fn config_mut(&mut self) -> &mut dyn GraphicsConfig {
        self.0.as_mut()
    }
}

impl Default for Graphics {
    fn default() -> Self {
        Self::null()
    }
}

/// 3D camera whose output is rendered at `render_scale` and upscaled to the window.
#[derive(Component, Debug, Default)]
pub struct ScaledRenderCamera;

/// Window camera presenting the scaled image; never a culling viewpoint.
#[derive(Component, Debug)]
pub struct ScaledOutputCamera;

#[derive(Component, Debug)]
pub struct ScaledOutputImage;

/// Offscreen colour target the scaled cameras draw into.
#[derive(Resource, Debug, Default)]
pub struct ScaledRenderTarget {
    image: Option<Handle<Image>>,
}

impl ScaledRenderTarget {
    pub fn image(&self) -> Option<&Handle<Image>> {
        self.image.as_ref()
    }
}

/// Physical target size for a window at `scale`; never below one pixel.
pub fn scaled_target_size(physical: UVec2, scale: f32) -> UVec2 {
    let scale = if scale.is_finite() { scale.max(0.0) } else { 1.0 };
    UVec2::new(
        ((physical.x as f32 * scale).round() as u32).max(1),
        ((physical.y as f32 * scale).round() as u32).max(1),
    )
}

pub struct GraphicsBackendPlugin;
impl Plugin for GraphicsBackendPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Graphics>()
            .init_resource::<ScaledRenderTarget>()
            .add_systems(Startup, report_missing_render_scale)
            .add_systems(
                PostUpdate,
                (sync_light_shadows, apply_render_scale.before(CameraUpdateSystem)),
            );
    }
}

fn report_missing_render_scale(graphics: Res<Graphics>) {
    if graphics.config().render_scale().is_none() {
        warn!("GRAPHICS render_scale=unavailable auto_scale=no_effect");
    }
}

/// Directional lights keep shadows unless disabled; point/spot shadows need `All`.
pub fn shadows_for(quality: ShadowQuality) -> (bool, bool) {
    match quality {
        ShadowQuality::Disabled => (false, false),
        ShadowQuality::HardOnly => (true, false),
        ShadowQuality::All => (true, true),
    }
}

fn sync_light_shadows(
    graphics: Res<Graphics>,
    mut q_directional: Query<(&mut DirectionalLight, Option<&mut CascadeShadowConfig>)>,
    mut q_point: Query<&mut PointLight>,
    mut q_spot: Query<&mut SpotLight>,
) {
    // New lights are brought in line even when the settings did not change.
    let force = graphics.is_changed();
    let cfg = graphics.config();
    let (directional_on, local_on) = shadows_for(cfg.shadow_quality());
    let distance = cfg.shadow_distance();

    for (mut light, cascades) in &mut q_directional {
        if !force && !light.is_added() {
            continue;
        }
        if light.shadows_enabled != directional_on {
            light.shadows_enabled = directional_on;
        }
        if let Some(mut cascades) = cascades {
            if distance > 0.0 {
                *cascades = CascadeShadowConfigBuilder {
                    maximum_distance: distance,
                    first_cascade_far_bound: (distance * 0.1).min(5.0),
                    ..default()
                }
                .build();
            }
        }
    }
    for mut light in &mut q_point {
        if (force || light.is_added()) && light.shadows_enabled != local_on {
            light.shadows_enabled = local_on;
        }
    }
    for mut light in &mut q_spot {
        if (force || light.is_added()) && light.shadows_enabled != local_on {
            light.shadows_enabled = local_on;
        }
    }
    if force {
        debug!(
            "GRAPHICS shadows distance={:.0} quality={:?}",
            distance,
            cfg.shadow_quality()
        );
    }
}

fn render_target_image(size: UVec2) -> Image {
    let extent = Extent3d {
        width: size.x,
        height: size.y,
        depth_or_array_layers: 1,
    };
    let mut image = Image {
        texture_descriptor: TextureDescriptor {
            label: Some("scaled_render_target"),
            size: extent,
            dimension: TextureDimension::D2,
            format: TextureFormat::Bgra8UnormSrgb,
            mip_level_count: 1,
            sample_count: 1,
            usage: TextureUsages::TEXTURE_BINDING
                | TextureUsages::COPY_DST
                | TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        },
        ..default()
    };
    image.resize(extent);
    image
}

fn spawn_scaled_output(commands: &mut Commands, image: Handle<Image>) {
    commands.spawn((
        Camera2dBundle {
            camera: Camera { order: 1, ..default() },
            ..default()
        },
        IsDefaultUiCamera,
        ScaledOutputCamera,
    ));
    commands.spawn((
        ImageBundle {
            style: Style {
                position_type: PositionType::Absolute,
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                ..default()
            },
            image: UiImage::new(image),
            z_index: ZIndex::Global(-1),
            ..default()
        },
        ScaledOutputImage,
    ));
}

/// Keeps the offscreen target at `window * render_scale` and points the
/// scaled cameras at it. Backends without a render scale leave cameras alone.
fn apply_render_scale(
    mut commands: Commands,
    graphics: Res<Graphics>,
    images: Option<ResMut<Assets<Image>>>,
    mut target: ResMut<ScaledRenderTarget>,
    q_window: Query<&Window, With<PrimaryWindow>>,
    mut q_cameras: Query<&mut Camera, With<ScaledRenderCamera>>,
) {
    let Some(scale) = graphics.config().render_scale() else { return; };
    let Some(mut images) = images else { return; };
    let Ok(window) = q_window.get_single() else { return; };
    if q_cameras.is_empty() {
        return;
    }
    let size = scaled_target_size(UVec2::new(window.physical_width(), window.physical_height()), scale);

    let handle = if let Some(handle) = target.image.clone() {
        handle
    } else {
        let handle = images.add(render_target_image(size));
        spawn_scaled_output(&mut commands, handle.clone());
        target.image = Some(handle.clone());
        info!("GRAPHICS render target created size={}x{} scale={:.2}", size.x, size.y, scale);
        handle
    };

    if images.get(&handle).is_some_and(|image| image.size() != size) {
        if let Some(image) = images.get_mut(&handle) {
            image.resize(Extent3d {
                width: size.x,
                height: size.y,
                depth_or_array_layers: 1,
            });
            debug!("GRAPHICS render target resized size={}x{} scale={:.2}", size.x, size.y, scale);
        }
    }

    for mut camera in &mut q_cameras {
        if !matches!(&camera.target, RenderTarget::Image(current) if *current == handle) {
            camera.target = RenderTarget::Image(handle.clone());
        }
    }
}
