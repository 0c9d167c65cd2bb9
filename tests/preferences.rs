use std::fs;

use vibe_settings::prelude::*;

#[test]
fn memory_store_round_trips_values() {
    let mut store = MemoryPreferenceStore::new();
    assert_eq!(store.get_float(keys::RENDER_SCALE), None);
    assert_eq!(store.get_float_or(keys::RENDER_SCALE, 1.0), 1.0);
    store.set_float(keys::RENDER_SCALE, 0.85);
    store.set_bool(keys::SHOW_FPS, true);
    store.save().unwrap();
    assert_eq!(store.get_float(keys::RENDER_SCALE), Some(0.85));
    assert!(store.get_bool_or(keys::SHOW_FPS, false));
    assert_eq!(store.save_count(), 1);
}

#[test]
fn ron_store_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("prefs.ron");

    let mut store = RonPreferenceStore::open(&path).unwrap();
    store.set_float(keys::ENTITY_VIEW_DISTANCE, 420.0);
    store.set_float(keys::DYNAMIC_PERFORMANCE, 0.0);
    store.save().unwrap();
    assert!(path.exists());

    let reopened = RonPreferenceStore::open(&path).unwrap();
    assert_eq!(reopened.get_float(keys::ENTITY_VIEW_DISTANCE), Some(420.0));
    assert!(!reopened.get_bool_or(keys::DYNAMIC_PERFORMANCE, true));
}

#[test]
fn missing_file_is_an_empty_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = RonPreferenceStore::open(dir.path().join("absent.ron")).unwrap();
    assert_eq!(store.get_float(keys::RENDER_SCALE), None);
}

#[test]
fn corrupt_file_reports_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("prefs.ron");
    fs::write(&path, "{ not ron").unwrap();
    assert!(matches!(RonPreferenceStore::open(&path), Err(PreferenceError::Parse { .. })));

    let mut store = RonPreferenceStore::open_or_empty(&path);
    assert_eq!(store.get_float(keys::RENDER_SCALE), None);
    store.set_float(keys::RENDER_SCALE, 0.9);
    store.save().unwrap();
    assert_eq!(RonPreferenceStore::open(&path).unwrap().get_float(keys::RENDER_SCALE), Some(0.9));
}

#[test]
fn unwritable_path_reports_write_error() {
    let dir = tempfile::tempdir().unwrap();
    // A directory where the file should be.
    let path = dir.path().join("taken");
    fs::create_dir(&path).unwrap();
    let mut store = RonPreferenceStore::open_or_empty(&path);
    store.set_float(keys::RENDER_SCALE, 0.9);
    assert!(matches!(store.save(), Err(PreferenceError::Write { .. })));
}

#[test]
fn persist_writes_through_resource() {
    let mut prefs = Preferences::default();
    prefs.persist(keys::VEGETATION_QUALITY, 3.0);
    assert_eq!(prefs.store().get_float(keys::VEGETATION_QUALITY), Some(3.0));
}
