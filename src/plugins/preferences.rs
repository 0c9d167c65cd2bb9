use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use bevy::prelude::*;
use thiserror::Error;

pub const DEFAULT_PREFERENCES_PATH: &str = "settings/preferences.ron";

/// Keys under which the settings are persisted.
pub mod keys {
    pub const RENDER_SCALE: &str = "RenderScale";
    pub const ENTITY_VIEW_DISTANCE: &str = "EntityViewDistance";
    pub const BUILDING_VIEW_DISTANCE: &str = "BuildingViewDistance";
    pub const VEGETATION_DISTANCE_MULTIPLIER: &str = "VegetationDistanceMultiplier";
    pub const VEGETATION_QUALITY: &str = "VegetationQuality";
    pub const DYNAMIC_PERFORMANCE: &str = "DynamicPerformance";
    pub const SHOW_FPS: &str = "ShowFPS";
    pub const SHADOW_QUALITY: &str = "ShadowQuality";
    pub const TARGET_FPS: &str = "TargetFPS";
    pub const VSYNC: &str = "VSync";
    pub const ANTI_ALIASING: &str = "AntiAliasing";
}

#[derive(Debug, Error)]
pub enum PreferenceError {
    #[error("failed to read preferences {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write preferences {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse preferences {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: ron::error::SpannedError,
    },
    #[error("failed to serialize preferences: {0}")]
    Serialize(#[source] ron::Error),
}

/// Flat key/float store. Booleans and indices are stored as floats.
pub trait PreferenceStore: Send + Sync + 'static {
    fn get_float(&self, key: &str) -> Option<f32>;
    fn set_float(&mut self, key: &str, value: f32);
    fn save(&mut self) -> Result<(), PreferenceError>;

    fn get_float_or(&self, key: &str, default: f32) -> f32 {
        self.get_float(key).unwrap_or(default)
    }

    fn get_bool_or(&self, key: &str, default: bool) -> bool {
        self.get_float(key).map(|v| v != 0.0).unwrap_or(default)
    }

    fn set_bool(&mut self, key: &str, value: bool) {
        self.set_float(key, if value { 1.0 } else { 0.0 });
    }
}

#[derive(Debug, Default, Clone)]
pub struct MemoryPreferenceStore {
    values: BTreeMap<String, f32>,
    saves: usize,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_values<'a>(values: impl IntoIterator<Item = (&'a str, f32)>) -> Self {
        Self {
            values: values.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
            saves: 0,
        }
    }

    pub fn save_count(&self) -> usize {
        self.saves
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get_float(&self, key: &str) -> Option<f32> {
        self.values.get(key).copied()
    }
    fn set_float(&mut self, key: &str, value: f32) {
        self.values.insert(key.to_string(), value);
    }
    fn save(&mut self) -> Result<(), PreferenceError> {
        self.saves += 1;
        Ok(())
    }
}

/// RON-file backed store: a single `{ "Key": value }` map.
#[derive(Debug)]
pub struct RonPreferenceStore {
    path: PathBuf,
    values: BTreeMap<String, f32>,
}

impl RonPreferenceStore {
    /// A missing file yields an empty store.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PreferenceError> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Ok(Self { path, values: BTreeMap::new() });
        }
        let display = path.display().to_string();
        let content = fs::read_to_string(&path).map_err(|source| PreferenceError::Read {
            path: display.clone(),
            source,
        })?;
        let values = ron::from_str(&content).map_err(|source| PreferenceError::Parse { path: display, source })?;
        Ok(Self { path, values })
    }

    /// Like [`open`](Self::open), but a broken file is logged and replaced on the next save.
    pub fn open_or_empty(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::open(path) {
            Ok(store) => store,
            Err(e) => {
                warn!("PREFS {} (starting empty)", e);
                Self {
                    path: path.to_path_buf(),
                    values: BTreeMap::new(),
                }
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferenceStore for RonPreferenceStore {
    fn get_float(&self, key: &str) -> Option<f32> {
        self.values.get(key).copied()
    }

    fn set_float(&mut self, key: &str, value: f32) {
        self.values.insert(key.to_string(), value);
    }

    fn save(&mut self) -> Result<(), PreferenceError> {
        let display = self.path.display().to_string();
        let content = ron::ser::to_string_pretty(&self.values, ron::ser::PrettyConfig::default())
            .map_err(PreferenceError::Serialize)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| PreferenceError::Write {
                path: display.clone(),
                source,
            })?;
        }
        fs::write(&self.path, content).map_err(|source| PreferenceError::Write { path: display, source })
    }
}

#[derive(Resource)]
pub struct Preferences(Box<dyn PreferenceStore>);

impl Preferences {
    pub fn new(store: impl PreferenceStore) -> Self {
        Self(Box::new(store))
    }

    pub fn store(&self) -> &dyn PreferenceStore {
        self.0.as_ref()
    }

    pub fn store_mut(&mut self) -> &mut dyn PreferenceStore {
        self.0.as_mut()
    }

    /// Writes then saves; a failed save is logged and otherwise ignored.
    pub fn persist(&mut self, key: &str, value: f32) {
        self.0.set_float(key, value);
        if let Err(e) = self.0.save() {
            warn!("PREFS save failed key={} err={}", key, e);
        }
    }
}

impl Default for Preferences {
    fn default() -> Self {
        Self::new(MemoryPreferenceStore::new())
    }
}
