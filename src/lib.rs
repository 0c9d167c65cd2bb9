//! Library entry for integration tests & the demo binary.
//! Exposes plugin modules and a prelude for common types.

pub mod plugins {
    pub mod telemetry;
    pub mod quality_tiers;
    pub mod graphics;
    pub mod display;
    pub mod scheduler;
    pub mod auto_scale;
    pub mod view_distance;
    pub mod vegetation;
    pub mod preferences;
    pub mod config;
    pub mod settings;
    pub mod settings_menu;
    pub mod demo_scene;
}
pub mod prelude;
