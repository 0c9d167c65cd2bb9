use bevy::prelude::*;
use bevy::render::camera::RenderTarget;
use bevy::window::{PrimaryWindow, WindowResolution};
use vibe_settings::plugins::graphics::{scaled_target_size, shadows_for, ScaledOutputCamera};
use vibe_settings::prelude::*;

#[test]
fn target_size_follows_scale() {
    assert_eq!(scaled_target_size(UVec2::new(1920, 1080), 1.0), UVec2::new(1920, 1080));
    assert_eq!(scaled_target_size(UVec2::new(1920, 1080), 0.6), UVec2::new(1152, 648));
    assert_eq!(scaled_target_size(UVec2::new(1, 1), 0.1), UVec2::new(1, 1));
    assert_eq!(scaled_target_size(UVec2::new(800, 600), f32::NAN), UVec2::new(800, 600));
}

#[test]
fn shadow_quality_maps_to_light_kinds() {
    assert_eq!(shadows_for(ShadowQuality::All), (true, true));
    assert_eq!(shadows_for(ShadowQuality::HardOnly), (true, false));
    assert_eq!(shadows_for(ShadowQuality::Disabled), (false, false));
}

fn build_app(graphics: Graphics) -> (App, Entity) {
    let mut app = App::new();
    app.init_resource::<Assets<Image>>()
        .insert_resource(graphics)
        .add_plugins(GraphicsBackendPlugin);
    app.world_mut().spawn((
        Window { resolution: WindowResolution::new(1000.0, 500.0), ..default() },
        PrimaryWindow,
    ));
    let cam = app.world_mut().spawn((Camera::default(), ScaledRenderCamera)).id();
    (app, cam)
}

fn target_size(app: &App) -> UVec2 {
    let handle = app.world().resource::<ScaledRenderTarget>().image().unwrap();
    app.world().resource::<Assets<Image>>().get(handle).unwrap().size()
}

fn renders_to_target(app: &App, cam: Entity) -> bool {
    let handle = app.world().resource::<ScaledRenderTarget>().image().cloned();
    let camera = app.world().get::<Camera>(cam).unwrap();
    matches!((&camera.target, handle), (RenderTarget::Image(current), Some(h)) if *current == h)
}

fn output_cameras(app: &mut App) -> usize {
    let mut q = app.world_mut().query_filtered::<(), With<ScaledOutputCamera>>();
    q.iter(app.world()).count()
}

#[test]
fn render_scale_sizes_the_camera_target() {
    let settings = PipelineSettings { render_scale: 0.5, ..Default::default() };
    let (mut app, cam) = build_app(Graphics::new(settings));
    app.update();
    assert_eq!(target_size(&app), UVec2::new(500, 250));
    assert!(renders_to_target(&app, cam));
    assert_eq!(output_cameras(&mut app), 1);

    app.world_mut().resource_mut::<Graphics>().config_mut().set_render_scale(0.8);
    app.update();
    assert_eq!(target_size(&app), UVec2::new(800, 400));
    assert!(renders_to_target(&app, cam));
    assert_eq!(output_cameras(&mut app), 1);
}

#[test]
fn window_resize_follows_through() {
    let (mut app, _) = build_app(Graphics::new(PipelineSettings::default()));
    app.update();
    assert_eq!(target_size(&app), UVec2::new(1000, 500));

    let mut q = app.world_mut().query_filtered::<&mut Window, With<PrimaryWindow>>();
    q.single_mut(app.world_mut()).resolution.set(640.0, 480.0);
    app.update();
    assert_eq!(target_size(&app), UVec2::new(640, 480));
}

#[test]
fn backend_without_render_scale_leaves_cameras_alone() {
    let (mut app, cam) = build_app(Graphics::null());
    app.update();
    assert!(app.world().resource::<ScaledRenderTarget>().image().is_none());
    assert!(matches!(app.world().get::<Camera>(cam).unwrap().target, RenderTarget::Window(_)));
    assert_eq!(output_cameras(&mut app), 0);
}
