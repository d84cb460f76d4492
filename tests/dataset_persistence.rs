// Dataset disk round-trip tests
// Create/label/persist/reload cycles against a temporary directory tree

use hitbox::{AudioConfig, Dataset, DatasetError};
use std::collections::HashSet;

fn wave_and_raw(seed: i16) -> (Vec<i16>, Vec<u8>) {
    let wave: Vec<i16> = (0..4096).map(|i| seed.wrapping_add((i % 512) as i16 * 7)).collect();
    let raw = hitbox::audio::samples_to_bytes(&wave);
    (wave, raw)
}

#[test]
fn persisted_samples_survive_reload() {
    let root = tempfile::tempdir().unwrap();
    let audio = AudioConfig::default();

    let mut dataset = Dataset::create(root.path(), "drum").unwrap();
    dataset.new_label("kick").unwrap();
    for seed in 0..3 {
        let (wave, raw) = wave_and_raw(seed);
        dataset.new_sample(wave, raw, None, true, &audio).unwrap();
    }

    for id in 1..=3 {
        assert!(
            root.path().join(format!("drum/kick/{}.wav", id)).is_file(),
            "missing file {}.wav",
            id
        );
    }

    let reloaded = Dataset::load(root.path(), "drum").unwrap();
    assert_eq!(reloaded.count_for("kick"), Some(3));

    // Byte-faithful round trip of each sample
    for index in 0..3 {
        let original = dataset.get_sample("kick", index).unwrap();
        let loaded = reloaded.get_sample("kick", index).unwrap();
        assert_eq!(loaded.id(), original.id());
        assert_eq!(loaded.wave(), original.wave());
        assert_eq!(loaded.raw(), original.raw());
    }
}

#[test]
fn load_is_idempotent_on_unmodified_tree() {
    let root = tempfile::tempdir().unwrap();
    let audio = AudioConfig::default();

    let mut dataset = Dataset::create(root.path(), "drum").unwrap();
    dataset.new_label("kick").unwrap();
    dataset.new_label("snare").unwrap();
    for seed in 0..4 {
        let (wave, raw) = wave_and_raw(seed);
        let label = if seed % 2 == 0 { "kick" } else { "snare" };
        dataset
            .new_sample(wave, raw, Some(label), true, &audio)
            .unwrap();
    }
    drop(dataset);

    let first = Dataset::load(root.path(), "drum").unwrap();
    let second = Dataset::load(root.path(), "drum").unwrap();

    assert_eq!(first.labels(), second.labels());
    for label in first.labels() {
        assert_eq!(first.count_for(label), second.count_for(label));
        let count = first.count_for(label).unwrap();
        for index in 0..count {
            let a = first.get_sample(label, index).unwrap();
            let b = second.get_sample(label, index).unwrap();
            assert_eq!(a.id(), b.id());
            assert_eq!(a.wave(), b.wave());
        }
    }
}

#[test]
fn removed_label_is_gone_from_memory_and_disk() {
    let root = tempfile::tempdir().unwrap();
    let audio = AudioConfig::default();

    let mut dataset = Dataset::create(root.path(), "drum").unwrap();
    dataset.new_label("kick").unwrap();
    let (wave, raw) = wave_and_raw(5);
    dataset.new_sample(wave, raw, None, true, &audio).unwrap();

    dataset.remove_label("kick").unwrap();

    assert!(!dataset.labels().contains(&"kick".to_string()));
    assert!(dataset.count_for("kick").is_none());
    assert!(!root.path().join("drum/kick").exists());

    // Lookups against the removed label fail cleanly
    assert!(matches!(
        dataset.get_sample("kick", 0),
        Err(DatasetError::UnknownLabel(_))
    ));
}

#[test]
fn back_to_back_persisted_writes_never_duplicate_ids() {
    let root = tempfile::tempdir().unwrap();
    let audio = AudioConfig::default();

    let mut dataset = Dataset::create(root.path(), "drum").unwrap();
    dataset.new_label("kick").unwrap();

    let mut seen = HashSet::new();
    for seed in 0..50 {
        let (wave, raw) = wave_and_raw(seed);
        let id = dataset
            .new_sample(wave, raw, None, true, &audio)
            .unwrap()
            .id();
        assert!(seen.insert(id), "duplicate id {}", id);
    }

    // Ids are monotonic 1..=50 and each maps to exactly one file
    assert_eq!(seen.len(), 50);
    let files = std::fs::read_dir(root.path().join("drum/kick"))
        .unwrap()
        .count();
    assert_eq!(files, 50);
}

#[test]
fn failed_lifecycle_operations_leave_state_untouched() {
    let root = tempfile::tempdir().unwrap();

    let mut dataset = Dataset::create(root.path(), "drum").unwrap();
    dataset.new_label("kick").unwrap();

    let labels_before = dataset.labels().to_vec();
    assert!(dataset.new_label("kick").is_err());
    assert_eq!(dataset.labels(), labels_before.as_slice());

    assert!(dataset.remove_label("ghost").is_err());
    assert_eq!(dataset.labels(), labels_before.as_slice());
    assert_eq!(dataset.current_label(), "kick");
}
