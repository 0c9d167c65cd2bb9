use bevy::prelude::*;

use crate::plugins::auto_scale::AutoScaleController;
use crate::plugins::display::{AntiAliasing, FrameRateCap};
use crate::plugins::quality_tiers::ShadowQuality;
use crate::plugins::settings::{SettingChanged, SettingsWidgets};
use crate::plugins::telemetry::{FpsCounterText, FpsCounterVisible};
use crate::plugins::view_distance::ViewDistanceManager;

#[derive(Resource, Default)]
pub struct SettingsMenuState {
    pub open: bool,
}

#[derive(Component)]
struct SettingsMenuRoot;
#[derive(Component)]
struct SettingsPanel;
#[derive(Component)]
struct GearButton;
#[derive(Component)]
struct CloseButton;
#[derive(Component)]
struct SettingValueText {
    kind: SettingKind,
}
#[derive(Component)]
struct SettingAdjustButton {
    kind: SettingKind,
    delta: f32,
}
#[derive(Component)]
struct SettingToggleButton {
    kind: SettingKind,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SettingKind {
    RenderScale,
    AutoScale,
    EntityDistance,
    BuildingDistance,
    VegetationMultiplier,
    VegetationTier,
    ShadowQuality,
    ShowFps,
    FrameRateCap,
    VSync,
    AntiAliasing,
}

pub struct SettingsMenuPlugin;
impl Plugin for SettingsMenuPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SettingsMenuState>()
            .add_systems(Startup, spawn_settings_ui)
            .add_systems(Update, (
                toggle_panel_hotkey,
                gear_button_interaction,
                close_button_interaction,
                adjust_buttons,
                toggle_buttons,
                refresh_setting_texts,
                sync_panel_visibility,
            ));
    }
}

/// `0.95` -> `95%`
pub fn format_percent(scale: f32) -> String {
    format!("{}%", (scale * 100.0).round() as i32)
}

pub fn format_distance(metres: f32) -> String {
    format!("{}m", metres.round() as i32)
}

pub fn format_multiplier(multiplier: f32) -> String {
    format!("{:.1}x", multiplier)
}

fn on_off(v: bool) -> String {
    if v { "On".into() } else { "Off".into() }
}

pub fn setting_label(kind: SettingKind, w: &SettingsWidgets) -> String {
    match kind {
        SettingKind::RenderScale => format_percent(w.render_scale),
        SettingKind::AutoScale => on_off(w.auto_scale),
        SettingKind::EntityDistance => format_distance(w.entity_distance),
        SettingKind::BuildingDistance => format_distance(w.building_distance),
        SettingKind::VegetationMultiplier => format_multiplier(w.vegetation_multiplier),
        SettingKind::VegetationTier => format!("{}", w.vegetation_tier),
        SettingKind::ShadowQuality => format!("{} ({})", w.shadow_quality.label(), format_distance(w.shadow_distance)),
        SettingKind::ShowFps => on_off(w.show_fps),
        SettingKind::FrameRateCap => w.frame_cap.label().into(),
        SettingKind::VSync => on_off(w.vsync),
        SettingKind::AntiAliasing => w.anti_aliasing.label().into(),
    }
}

/// Edit event for pressing `+`/`-` on a numeric row.
pub fn adjust_event(kind: SettingKind, delta: f32, w: &SettingsWidgets) -> Option<SettingChanged> {
    match kind {
        SettingKind::RenderScale => Some(SettingChanged::RenderScale(w.render_scale + delta)),
        SettingKind::EntityDistance => Some(SettingChanged::EntityDistance(w.entity_distance + delta)),
        SettingKind::BuildingDistance => Some(SettingChanged::BuildingDistance(w.building_distance + delta)),
        SettingKind::VegetationMultiplier => {
            Some(SettingChanged::VegetationMultiplier(w.vegetation_multiplier + delta))
        }
        SettingKind::VegetationTier => {
            Some(SettingChanged::VegetationTier(i32::from(w.vegetation_tier) + delta.round() as i32))
        }
        SettingKind::ShadowQuality => Some(SettingChanged::ShadowQuality(ShadowQuality::from_index(
            i32::from(w.shadow_quality.index()) + delta.round() as i32,
        ))),
        SettingKind::FrameRateCap => Some(SettingChanged::FrameRateCap(FrameRateCap::from_index(
            i32::from(w.frame_cap.index()) + delta.round() as i32,
        ))),
        SettingKind::AntiAliasing => Some(SettingChanged::AntiAliasing(AntiAliasing::from_index(
            i32::from(w.anti_aliasing.index()) + delta.round() as i32,
        ))),
        SettingKind::AutoScale | SettingKind::ShowFps | SettingKind::VSync => None,
    }
}

pub fn toggle_event(kind: SettingKind, w: &SettingsWidgets) -> Option<SettingChanged> {
    match kind {
        SettingKind::AutoScale => Some(SettingChanged::AutoScale(!w.auto_scale)),
        SettingKind::ShowFps => Some(SettingChanged::ShowFps(!w.show_fps)),
        SettingKind::VSync => Some(SettingChanged::VSync(!w.vsync)),
        _ => None,
    }
}

fn spawn_settings_ui(
    mut commands: Commands,
    controller: Option<Res<AutoScaleController>>,
    view: Option<Res<ViewDistanceManager>>,
    fps_visible: Option<Res<FpsCounterVisible>>,
) {
    let scale_step = controller.map(|c| c.config().scale_step).unwrap_or(0.05);
    let (entity_step, building_step) = view
        .map(|v| {
            let b = v.bounds();
            ((b.entity.max - b.entity.min) / 20.0, (b.building.max - b.building.min) / 20.0)
        })
        .unwrap_or((25.0, 40.0));
    let show_fps = fps_visible.map(|v| v.0).unwrap_or(false);

    commands.spawn((
        NodeBundle {
            style: Style {
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                position_type: PositionType::Absolute,
                left: Val::Px(0.0),
                top: Val::Px(0.0),
                ..default()
            },
            background_color: BackgroundColor(Color::NONE),
            ..default()
        },
        SettingsMenuRoot,
    )).with_children(|root| {
        // FPS readout (top-left)
        root.spawn((
            TextBundle::from_section(
                "FPS: --",
                TextStyle { font_size: 18.0, color: Color::srgb(0.9, 1.0, 0.6), ..default() },
            )
            .with_style(Style {
                position_type: PositionType::Absolute,
                top: Val::Px(8.0),
                left: Val::Px(10.0),
                ..default()
            }),
            FpsCounterText,
        ))
        .insert(if show_fps { Visibility::Inherited } else { Visibility::Hidden });

        root.spawn((
            ButtonBundle {
                style: Style {
                    position_type: PositionType::Absolute,
                    bottom: Val::Px(12.0),
                    right: Val::Px(12.0),
                    padding: UiRect::axes(Val::Px(10.0), Val::Px(6.0)),
                    ..default()
                },
                background_color: BackgroundColor(Color::srgb(0.12, 0.12, 0.18)),
                ..default()
            },
            GearButton,
        )).with_children(|b| {
            b.spawn(TextBundle::from_section(
                "Settings",
                TextStyle { font_size: 20.0, color: Color::WHITE, ..default() },
            ));
        });

        // Panel (hidden initially)
        root.spawn((
            NodeBundle {
                style: Style {
                    position_type: PositionType::Absolute,
                    bottom: Val::Px(60.0),
                    right: Val::Px(12.0),
                    width: Val::Px(360.0),
                    flex_direction: FlexDirection::Column,
                    row_gap: Val::Px(4.0),
                    padding: UiRect::all(Val::Px(10.0)),
                    ..default()
                },
                background_color: BackgroundColor(Color::srgba(0.04, 0.05, 0.08, 0.92)),
                visibility: Visibility::Hidden,
                ..default()
            },
            SettingsPanel,
        )).with_children(|panel| {
            panel.spawn(TextBundle::from_section(
                "Graphics",
                TextStyle { font_size: 22.0, color: Color::srgb(0.95, 0.95, 1.0), ..default() },
            ));
            spawn_close_button(panel);

            spawn_section_header(panel, "Resolution");
            spawn_param_row(panel, "Render Scale", SettingKind::RenderScale, scale_step);
            spawn_toggle_row(panel, "Dynamic Performance", SettingKind::AutoScale);

            spawn_section_header(panel, "View Distance");
            spawn_param_row(panel, "Characters", SettingKind::EntityDistance, entity_step);
            spawn_param_row(panel, "Buildings", SettingKind::BuildingDistance, building_step);
            spawn_param_row(panel, "Vegetation", SettingKind::VegetationMultiplier, 0.1);
            spawn_param_row(panel, "Vegetation Quality", SettingKind::VegetationTier, 1.0);

            spawn_section_header(panel, "Shadows & HUD");
            spawn_param_row(panel, "Shadows", SettingKind::ShadowQuality, 1.0);
            spawn_toggle_row(panel, "Show FPS", SettingKind::ShowFps);

            spawn_section_header(panel, "Display");
            spawn_param_row(panel, "Target FPS", SettingKind::FrameRateCap, 1.0);
            spawn_toggle_row(panel, "VSync", SettingKind::VSync);
            spawn_param_row(panel, "Anti-Aliasing", SettingKind::AntiAliasing, 1.0);
        });
    });
}

fn spawn_section_header(parent: &mut ChildBuilder, title: &str) {
    parent.spawn(TextBundle::from_section(
        title,
        TextStyle { font_size: 18.0, color: Color::srgb(0.80, 0.90, 1.0), ..default() },
    ));
}

fn spawn_close_button(parent: &mut ChildBuilder) {
    parent.spawn((
        ButtonBundle {
            style: Style {
                align_self: AlignSelf::FlexEnd,
                margin: UiRect::bottom(Val::Px(6.0)),
                padding: UiRect::axes(Val::Px(8.0), Val::Px(4.0)),
                ..default()
            },
            background_color: BackgroundColor(Color::srgb(0.30, 0.10, 0.10)),
            ..default()
        },
        CloseButton,
    )).with_children(|b| {
        b.spawn(TextBundle::from_section(
            "Close",
            TextStyle { font_size: 16.0, color: Color::WHITE, ..default() },
        ));
    });
}

fn row_style() -> Style {
    Style {
        flex_direction: FlexDirection::Row,
        justify_content: JustifyContent::SpaceBetween,
        align_items: AlignItems::Center,
        column_gap: Val::Px(6.0),
        ..default()
    }
}

fn spawn_param_row(parent: &mut ChildBuilder, label: &str, kind: SettingKind, step: f32) {
    parent.spawn(NodeBundle { style: row_style(), ..default() }).with_children(|row| {
        row.spawn(TextBundle::from_section(
            label,
            TextStyle { font_size: 14.0, color: Color::srgb(0.85, 0.90, 1.0), ..default() },
        ));
        spawn_adjust_button(row, "-", kind, -step, Color::srgb(0.20, 0.15, 0.15));
        row.spawn((
            TextBundle::from_section("--", TextStyle { font_size: 14.0, color: Color::WHITE, ..default() }),
            SettingValueText { kind },
        ));
        spawn_adjust_button(row, "+", kind, step, Color::srgb(0.15, 0.25, 0.20));
    });
}

fn spawn_adjust_button(row: &mut ChildBuilder, glyph: &str, kind: SettingKind, delta: f32, color: Color) {
    row.spawn((
        ButtonBundle {
            style: Style { padding: UiRect::axes(Val::Px(6.0), Val::Px(2.0)), ..default() },
            background_color: BackgroundColor(color),
            ..default()
        },
        SettingAdjustButton { kind, delta },
    )).with_children(|b| {
        b.spawn(TextBundle::from_section(glyph, TextStyle { font_size: 16.0, color: Color::WHITE, ..default() }));
    });
}

fn spawn_toggle_row(parent: &mut ChildBuilder, label: &str, kind: SettingKind) {
    parent.spawn(NodeBundle { style: row_style(), ..default() }).with_children(|row| {
        row.spawn(TextBundle::from_section(
            label,
            TextStyle { font_size: 14.0, color: Color::srgb(0.85, 0.90, 1.0), ..default() },
        ));
        row.spawn((
            ButtonBundle {
                style: Style { padding: UiRect::axes(Val::Px(6.0), Val::Px(2.0)), ..default() },
                background_color: BackgroundColor(Color::srgb(0.18, 0.18, 0.30)),
                ..default()
            },
            SettingToggleButton { kind },
        )).with_children(|b| {
            b.spawn(TextBundle::from_section("Toggle", TextStyle { font_size: 14.0, color: Color::WHITE, ..default() }));
        });
        row.spawn((
            TextBundle::from_section("--", TextStyle { font_size: 14.0, color: Color::WHITE, ..default() }),
            SettingValueText { kind },
        ));
    });
}

fn toggle_panel_hotkey(keys: Option<Res<ButtonInput<KeyCode>>>, mut state: ResMut<SettingsMenuState>) {
    if keys.is_some_and(|k| k.just_pressed(KeyCode::F1)) {
        state.open = !state.open;
    }
}

fn gear_button_interaction(
    mut state: ResMut<SettingsMenuState>,
    q_button: Query<&Interaction, (Changed<Interaction>, With<GearButton>)>,
) {
    for interaction in &q_button {
        if *interaction == Interaction::Pressed {
            state.open = !state.open;
        }
    }
}

fn close_button_interaction(
    mut state: ResMut<SettingsMenuState>,
    q_button: Query<&Interaction, (Changed<Interaction>, With<CloseButton>)>,
) {
    for interaction in &q_button {
        if *interaction == Interaction::Pressed {
            state.open = false;
        }
    }
}

fn sync_panel_visibility(
    state: Res<SettingsMenuState>,
    mut q_panel: Query<&mut Visibility, With<SettingsPanel>>,
) {
    if !state.is_changed() { return; }
    if let Ok(mut vis) = q_panel.get_single_mut() {
        *vis = if state.open { Visibility::Inherited } else { Visibility::Hidden };
    }
}

fn adjust_buttons(
    widgets: Res<SettingsWidgets>,
    q_buttons: Query<(&Interaction, &SettingAdjustButton), (Changed<Interaction>, With<Button>)>,
    mut writer: EventWriter<SettingChanged>,
) {
    for (interaction, btn) in &q_buttons {
        if *interaction != Interaction::Pressed { continue; }
        if let Some(event) = adjust_event(btn.kind, btn.delta, &widgets) {
            writer.send(event);
        }
    }
}

fn toggle_buttons(
    widgets: Res<SettingsWidgets>,
    q_buttons: Query<(&Interaction, &SettingToggleButton), (Changed<Interaction>, With<Button>)>,
    mut writer: EventWriter<SettingChanged>,
) {
    for (interaction, btn) in &q_buttons {
        if *interaction != Interaction::Pressed { continue; }
        if let Some(event) = toggle_event(btn.kind, &widgets) {
            writer.send(event);
        }
    }
}

// Widgets are updated without change detection, so compare text every frame.
fn refresh_setting_texts(
    widgets: Res<SettingsWidgets>,
    mut q_values: Query<(&mut Text, &SettingValueText)>,
) {
    for (mut text, tag) in &mut q_values {
        let s = setting_label(tag.kind, &widgets);
        if text.sections[0].value != s {
            text.sections[0].value = s;
        }
    }
}
