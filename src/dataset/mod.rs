// Dataset model
// A named collection of captured samples grouped by label, persisted as
// one directory per label containing sequentially numbered WAV files:
// <root>/<dataset>/<label>/<id>.wav

pub mod sample;

pub use sample::Sample;

use std::collections::HashMap;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::audio::wav::{self, WavError};
use crate::config::AudioConfig;

/// Label every dataset starts with.
pub const DEFAULT_LABEL: &str = "default";

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Dataset not found: {0}")]
    NotFound(String),

    #[error("Dataset already exists: {0}")]
    AlreadyExists(String),

    #[error("Duplicate label: {0}")]
    DuplicateLabel(String),

    #[error("Unknown label: {0}")]
    UnknownLabel(String),

    #[error("No sample at index {index} under label \"{label}\"")]
    NoSuchSample { label: String, index: usize },

    #[error("No data directory available on this platform")]
    NoDataDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Wav(#[from] WavError),
}

/// Default dataset root under the platform data directory.
pub fn default_data_root() -> Result<PathBuf, DatasetError> {
    let data_dir = dirs::data_dir().ok_or(DatasetError::NoDataDir)?;
    let root = data_dir.join("hitbox").join("datasets");
    fs::create_dir_all(&root)?;
    Ok(root)
}

/// A named collection of samples grouped by label.
///
/// Invariant, maintained by every mutation: for each label `l`,
/// `samples_per_label[l] == buckets[l].len()`.
pub struct Dataset {
    name: String,
    dir: PathBuf,
    labels: Vec<String>,
    buckets: HashMap<String, Vec<Sample>>,
    samples_per_label: HashMap<String, usize>,
    current_label: String,
}

impl Dataset {
    /// Create a new dataset directory under `root` with one `default`
    /// label. Fails with `AlreadyExists` if the directory is present.
    pub fn create(root: &Path, name: &str) -> Result<Self, DatasetError> {
        let dir = root.join(name);
        if dir.exists() {
            return Err(DatasetError::AlreadyExists(name.to_string()));
        }

        fs::create_dir_all(dir.join(DEFAULT_LABEL))?;
        log::info!("Created dataset \"{}\" at {}", name, dir.display());

        let mut dataset = Dataset {
            name: name.to_string(),
            dir,
            labels: Vec::new(),
            buckets: HashMap::new(),
            samples_per_label: HashMap::new(),
            current_label: DEFAULT_LABEL.to_string(),
        };
        dataset.insert_bucket(DEFAULT_LABEL);
        Ok(dataset)
    }

    /// Reconstruct a dataset from an existing directory tree. One
    /// subdirectory per label; files are read in ascending id order so
    /// repeated loads of an unmodified tree are identical.
    pub fn load(root: &Path, name: &str) -> Result<Self, DatasetError> {
        let dir = root.join(name);
        if !dir.is_dir() {
            return Err(DatasetError::NotFound(name.to_string()));
        }

        let mut dataset = Dataset {
            name: name.to_string(),
            dir: dir.clone(),
            labels: Vec::new(),
            buckets: HashMap::new(),
            samples_per_label: HashMap::new(),
            current_label: DEFAULT_LABEL.to_string(),
        };

        let mut label_dirs: Vec<PathBuf> = fs::read_dir(&dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_dir())
            .collect();
        label_dirs.sort();

        for label_dir in label_dirs {
            let label = match label_dir.file_name().and_then(OsStr::to_str) {
                Some(name) => name.to_string(),
                None => {
                    log::warn!("Skipping non-UTF8 label directory {}", label_dir.display());
                    continue;
                }
            };

            dataset.insert_bucket(&label);

            let mut files: Vec<(u32, PathBuf)> = Vec::new();
            for entry in fs::read_dir(&label_dir)? {
                let path = entry?.path();
                if !path.is_file() {
                    continue;
                }
                match parse_sample_filename(&path) {
                    Some(id) => files.push((id, path)),
                    None => {
                        log::warn!("Skipping malformed sample file {}", path.display());
                    }
                }
            }
            files.sort_by_key(|(id, _)| *id);

            for (id, path) in files {
                let (samples, raw, _) = match wav::read_wav(&path) {
                    Ok(decoded) => decoded,
                    Err(e) => {
                        log::warn!("Skipping unreadable sample file {}: {}", path.display(), e);
                        continue;
                    }
                };
                dataset
                    .buckets
                    .get_mut(&label)
                    .unwrap()
                    .push(Sample::new(samples, raw, label.clone(), id));
                *dataset.samples_per_label.get_mut(&label).unwrap() += 1;
            }
        }

        // A freshly scanned empty tree still gets an in-memory default
        // bucket; its directory materializes on first persist
        if dataset.labels.is_empty() {
            dataset.insert_bucket(DEFAULT_LABEL);
        }

        dataset.current_label = if dataset.labels.iter().any(|l| l == DEFAULT_LABEL) {
            DEFAULT_LABEL.to_string()
        } else {
            dataset.labels[0].clone()
        };

        log::info!(
            "Loaded dataset \"{}\" ({} samples across {} labels)",
            name,
            dataset.len(),
            dataset.labels.len()
        );
        Ok(dataset)
    }

    /// Create a new label bucket and its directory, and make it current.
    /// Fails with `DuplicateLabel` before touching the filesystem.
    pub fn new_label(&mut self, name: &str) -> Result<(), DatasetError> {
        if self.buckets.contains_key(name) {
            return Err(DatasetError::DuplicateLabel(name.to_string()));
        }

        fs::create_dir_all(self.dir.join(name))?;
        self.insert_bucket(name);
        self.current_label = name.to_string();
        log::info!("Created label \"{}\" in dataset \"{}\"", name, self.name);
        Ok(())
    }

    /// File a captured waveform under `label` (the current label when
    /// `None`). The sample id is the bucket count before insertion plus
    /// one. With `persist`, the raw bytes are written to
    /// `<dataset>/<label>/<id>.wav`, creating the label directory if it
    /// is missing.
    pub fn new_sample(
        &mut self,
        wave: Vec<i16>,
        raw: Vec<u8>,
        label: Option<&str>,
        persist: bool,
        audio: &AudioConfig,
    ) -> Result<&mut Sample, DatasetError> {
        let label = label.unwrap_or(&self.current_label).to_string();
        let id = self.samples_per_label.get(&label).copied().unwrap_or(0) as u32 + 1;

        // Disk first: a failed write leaves no in-memory side effects
        if persist {
            let label_dir = self.dir.join(&label);
            fs::create_dir_all(&label_dir)?;
            let path = label_dir.join(format!("{}.wav", id));
            wav::write_wav(&path, &raw, audio.sample_rate, audio.channels)?;
            log::debug!("Persisted sample to {}", path.display());
        }

        if !self.buckets.contains_key(&label) {
            self.insert_bucket(&label);
        }

        let sample = Sample::new(wave, raw, label.clone(), id);
        let bucket = self.buckets.get_mut(&label).unwrap();
        bucket.push(sample);
        *self.samples_per_label.get_mut(&label).unwrap() += 1;

        Ok(bucket.last_mut().unwrap())
    }

    /// Delete a label bucket and its directory tree. Irreversible.
    pub fn remove_label(&mut self, name: &str) -> Result<(), DatasetError> {
        if !self.buckets.contains_key(name) {
            return Err(DatasetError::UnknownLabel(name.to_string()));
        }

        let label_dir = self.dir.join(name);
        if label_dir.exists() {
            fs::remove_dir_all(&label_dir)?;
        }

        self.labels.retain(|l| l != name);
        self.buckets.remove(name);
        self.samples_per_label.remove(name);
        log::info!("Removed label \"{}\" from dataset \"{}\"", name, self.name);

        if self.current_label == name {
            if self.labels.is_empty() {
                self.insert_bucket(DEFAULT_LABEL);
            }
            self.current_label = self.labels[0].clone();
        }
        Ok(())
    }

    /// Remove one sample from a label bucket, keeping counts consistent.
    /// In-memory only; the persisted file, if any, is untouched.
    pub fn remove_sample(&mut self, label: &str, index: usize) -> Result<Sample, DatasetError> {
        let bucket = self
            .buckets
            .get_mut(label)
            .ok_or_else(|| DatasetError::UnknownLabel(label.to_string()))?;
        if index >= bucket.len() {
            return Err(DatasetError::NoSuchSample {
                label: label.to_string(),
                index,
            });
        }
        let sample = bucket.remove(index);
        *self.samples_per_label.get_mut(label).unwrap() -= 1;
        Ok(sample)
    }

    pub fn get_sample(&self, label: &str, index: usize) -> Result<&Sample, DatasetError> {
        self.buckets
            .get(label)
            .ok_or_else(|| DatasetError::UnknownLabel(label.to_string()))?
            .get(index)
            .ok_or_else(|| DatasetError::NoSuchSample {
                label: label.to_string(),
                index,
            })
    }

    pub fn get_sample_mut(
        &mut self,
        label: &str,
        index: usize,
    ) -> Result<&mut Sample, DatasetError> {
        self.buckets
            .get_mut(label)
            .ok_or_else(|| DatasetError::UnknownLabel(label.to_string()))?
            .get_mut(index)
            .ok_or_else(|| DatasetError::NoSuchSample {
                label: label.to_string(),
                index,
            })
    }

    /// Make an existing label the target for new captures.
    pub fn set_current_label(&mut self, name: &str) -> Result<(), DatasetError> {
        if !self.buckets.contains_key(name) {
            return Err(DatasetError::UnknownLabel(name.to_string()));
        }
        self.current_label = name.to_string();
        Ok(())
    }

    /// Per-label sample counts as display text. Read-only.
    pub fn summary(&self) -> String {
        let mut msg = format!("Dataset: \"{}\", n: {}\n", self.name, self.len());
        msg.push_str("\nCategories   | samples:\n");
        for label in &self.labels {
            msg.push_str(&format!(
                "   {:10}: {}\n",
                label,
                self.samples_per_label.get(label).copied().unwrap_or(0)
            ));
        }
        msg
    }

    /// Delete the entire dataset tree from disk. Irreversible.
    pub fn delete(self) -> Result<(), DatasetError> {
        if self.dir.exists() {
            fs::remove_dir_all(&self.dir)?;
        }
        log::info!("Deleted dataset \"{}\"", self.name);
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Labels in insertion order (load order for reconstructed datasets).
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn current_label(&self) -> &str {
        &self.current_label
    }

    /// Samples filed under one label, in recording order.
    pub fn bucket(&self, label: &str) -> Option<&[Sample]> {
        self.buckets.get(label).map(|b| b.as_slice())
    }

    pub fn count_for(&self, label: &str) -> Option<usize> {
        self.samples_per_label.get(label).copied()
    }

    /// Total sample count across all labels.
    pub fn len(&self) -> usize {
        self.samples_per_label.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn insert_bucket(&mut self, label: &str) {
        self.labels.push(label.to_string());
        self.buckets.insert(label.to_string(), Vec::new());
        self.samples_per_label.insert(label.to_string(), 0);
    }

    #[cfg(test)]
    fn assert_counts_consistent(&self) {
        for label in &self.labels {
            assert_eq!(
                self.samples_per_label[label],
                self.buckets[label].len(),
                "count mismatch for label {}",
                label
            );
        }
    }
}

/// Validate a `<id>.wav` sample filename, returning the numeric id.
/// Both fields are checked explicitly; anything else is rejected.
fn parse_sample_filename(path: &Path) -> Option<u32> {
    let name = path.file_name()?.to_str()?;
    let (stem, ext) = name.rsplit_once('.')?;
    if !ext.eq_ignore_ascii_case("wav") {
        return None;
    }
    stem.parse::<u32>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn audio() -> AudioConfig {
        AudioConfig::default()
    }

    fn wave_and_raw(seed: i16) -> (Vec<i16>, Vec<u8>) {
        let wave: Vec<i16> = (0..256).map(|i| seed.wrapping_mul(i as i16)).collect();
        let raw = crate::audio::samples_to_bytes(&wave);
        (wave, raw)
    }

    #[test]
    fn test_create_makes_default_label_dir() {
        let root = tempfile::tempdir().unwrap();
        let dataset = Dataset::create(root.path(), "drum").unwrap();

        assert_eq!(dataset.labels(), &["default".to_string()]);
        assert_eq!(dataset.current_label(), "default");
        assert!(root.path().join("drum/default").is_dir());
    }

    #[test]
    fn test_create_existing_fails() {
        let root = tempfile::tempdir().unwrap();
        Dataset::create(root.path(), "drum").unwrap();
        assert!(matches!(
            Dataset::create(root.path(), "drum"),
            Err(DatasetError::AlreadyExists(_))
        ));
    }

    #[test]
    fn test_load_missing_fails() {
        let root = tempfile::tempdir().unwrap();
        assert!(matches!(
            Dataset::load(root.path(), "nope"),
            Err(DatasetError::NotFound(_))
        ));
    }

    #[test]
    fn test_new_label_duplicate_fails() {
        let root = tempfile::tempdir().unwrap();
        let mut dataset = Dataset::create(root.path(), "drum").unwrap();
        dataset.new_label("kick").unwrap();
        assert_eq!(dataset.current_label(), "kick");
        assert!(matches!(
            dataset.new_label("kick"),
            Err(DatasetError::DuplicateLabel(_))
        ));
    }

    #[test]
    fn test_sample_ids_are_sequential_per_label() {
        let root = tempfile::tempdir().unwrap();
        let mut dataset = Dataset::create(root.path(), "drum").unwrap();
        dataset.new_label("kick").unwrap();

        for expected in 1..=3u32 {
            let (wave, raw) = wave_and_raw(expected as i16);
            let sample = dataset
                .new_sample(wave, raw, None, false, &audio())
                .unwrap();
            assert_eq!(sample.id(), expected);
            assert_eq!(sample.label(), "kick");
        }

        // A different label has its own id sequence
        let (wave, raw) = wave_and_raw(9);
        let sample = dataset
            .new_sample(wave, raw, Some("default"), false, &audio())
            .unwrap();
        assert_eq!(sample.id(), 1);

        dataset.assert_counts_consistent();
    }

    #[test]
    fn test_new_sample_self_heals_missing_label() {
        let root = tempfile::tempdir().unwrap();
        let mut dataset = Dataset::create(root.path(), "drum").unwrap();

        let (wave, raw) = wave_and_raw(3);
        dataset
            .new_sample(wave, raw, Some("snare"), true, &audio())
            .unwrap();

        assert!(dataset.labels().contains(&"snare".to_string()));
        assert_eq!(dataset.count_for("snare"), Some(1));
        assert!(root.path().join("drum/snare/1.wav").is_file());
        dataset.assert_counts_consistent();
    }

    #[test]
    fn test_counts_stay_consistent_under_mutation() {
        let root = tempfile::tempdir().unwrap();
        let mut dataset = Dataset::create(root.path(), "drum").unwrap();
        dataset.new_label("kick").unwrap();
        dataset.new_label("hat").unwrap();

        for seed in 0..5 {
            let (wave, raw) = wave_and_raw(seed);
            dataset
                .new_sample(wave, raw, Some("kick"), false, &audio())
                .unwrap();
            dataset.assert_counts_consistent();
        }

        dataset.remove_sample("kick", 2).unwrap();
        dataset.assert_counts_consistent();
        assert_eq!(dataset.count_for("kick"), Some(4));

        dataset.remove_label("hat").unwrap();
        dataset.assert_counts_consistent();
        assert!(dataset.count_for("hat").is_none());
    }

    #[test]
    fn test_remove_label_resets_current() {
        let root = tempfile::tempdir().unwrap();
        let mut dataset = Dataset::create(root.path(), "drum").unwrap();
        dataset.new_label("kick").unwrap();
        assert_eq!(dataset.current_label(), "kick");

        dataset.remove_label("kick").unwrap();
        assert_eq!(dataset.current_label(), "default");
        assert!(!root.path().join("drum/kick").exists());
    }

    #[test]
    fn test_get_sample_after_remove_label_fails_cleanly() {
        let root = tempfile::tempdir().unwrap();
        let mut dataset = Dataset::create(root.path(), "drum").unwrap();
        dataset.new_label("kick").unwrap();
        let (wave, raw) = wave_and_raw(1);
        dataset
            .new_sample(wave, raw, None, false, &audio())
            .unwrap();

        dataset.remove_label("kick").unwrap();
        assert!(matches!(
            dataset.get_sample("kick", 0),
            Err(DatasetError::UnknownLabel(_))
        ));
    }

    #[test]
    fn test_summary_lists_labels_with_counts() {
        let root = tempfile::tempdir().unwrap();
        let mut dataset = Dataset::create(root.path(), "drum").unwrap();
        dataset.new_label("kick").unwrap();
        let (wave, raw) = wave_and_raw(1);
        dataset
            .new_sample(wave, raw, None, false, &audio())
            .unwrap();

        let summary = dataset.summary();
        assert!(summary.contains("Dataset: \"drum\", n: 1"));
        assert!(summary.contains("kick"));
        assert!(summary.contains("default"));
    }

    #[test]
    fn test_malformed_filenames_are_skipped_on_load() {
        let root = tempfile::tempdir().unwrap();
        let mut dataset = Dataset::create(root.path(), "drum").unwrap();
        let (wave, raw) = wave_and_raw(2);
        dataset
            .new_sample(wave, raw, None, true, &audio())
            .unwrap();

        // Stray files that violate the <id>.wav contract
        let label_dir = root.path().join("drum/default");
        fs::write(label_dir.join("notes.txt"), b"hello").unwrap();
        fs::write(label_dir.join("abc.wav"), b"not a wav").unwrap();

        let loaded = Dataset::load(root.path(), "drum").unwrap();
        assert_eq!(loaded.count_for("default"), Some(1));
    }

    #[test]
    fn test_unreadable_wav_contents_are_skipped_on_load() {
        let root = tempfile::tempdir().unwrap();
        let mut dataset = Dataset::create(root.path(), "drum").unwrap();
        let (wave, raw) = wave_and_raw(2);
        dataset
            .new_sample(wave, raw, None, true, &audio())
            .unwrap();

        // Well-named file whose contents are not a WAV stream
        let label_dir = root.path().join("drum/default");
        fs::write(label_dir.join("2.wav"), b"garbage bytes").unwrap();

        let loaded = Dataset::load(root.path(), "drum").unwrap();
        assert_eq!(loaded.count_for("default"), Some(1));
        assert_eq!(loaded.get_sample("default", 0).unwrap().id(), 1);
    }

    #[test]
    fn test_delete_removes_tree() {
        let root = tempfile::tempdir().unwrap();
        let dataset = Dataset::create(root.path(), "drum").unwrap();
        let dir = dataset.path().to_path_buf();
        dataset.delete().unwrap();
        assert!(!dir.exists());
    }

    #[test]
    fn test_parse_sample_filename_contract() {
        assert_eq!(parse_sample_filename(Path::new("3.wav")), Some(3));
        assert_eq!(parse_sample_filename(Path::new("12.WAV")), Some(12));
        assert_eq!(parse_sample_filename(Path::new("x.wav")), None);
        assert_eq!(parse_sample_filename(Path::new("3.png")), None);
        assert_eq!(parse_sample_filename(Path::new("3")), None);
        assert_eq!(parse_sample_filename(Path::new("-1.wav")), None);
    }
}
