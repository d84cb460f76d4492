// Capture session wiring
// One cooperative tick loop: poll the detector, file captures into the
// dataset, derive the spectrogram, classify, and fire the MIDI trigger.
// Ticks run to completion before the next begins; nothing overlaps.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::audio::{AudioInput, AudioOutput};
use crate::classifier::Classifier;
use crate::config::{ConfigError, SessionConfig};
use crate::dataset::{Dataset, DatasetError};
use crate::detector::{Detector, DetectorState, Tick};
use crate::midi::{MidiSink, NullSink};

/// What one completed capture produced, for display and logging.
#[derive(Debug, Clone)]
pub struct CaptureOutcome {
    pub label: String,
    pub id: u32,
    pub peak: i32,
    pub class: Option<usize>,
}

/// Owns the device, dataset, and configuration, and drives the
/// detect/record loop. Called from a single thread; the external timer
/// (or `run`) invokes `tick` and each tick finishes before the next.
pub struct Session<D: AudioInput> {
    device: D,
    dataset: Dataset,
    config: SessionConfig,
    detector: Detector,
    classifier: Option<Box<dyn Classifier>>,
    midi: Box<dyn MidiSink>,
    playback: Option<Box<dyn AudioOutput>>,
    persist: bool,
    echo: bool,
    last_class: Option<usize>,
}

impl<D: AudioInput> Session<D> {
    pub fn new(device: D, dataset: Dataset, config: SessionConfig) -> Self {
        Session {
            device,
            dataset,
            config,
            detector: Detector::new(),
            classifier: None,
            midi: Box::new(NullSink),
            playback: None,
            persist: true,
            echo: false,
            last_class: None,
        }
    }

    pub fn set_classifier(&mut self, classifier: Box<dyn Classifier>) {
        self.classifier = Some(classifier);
    }

    pub fn set_midi_sink(&mut self, sink: Box<dyn MidiSink>) {
        self.midi = sink;
    }

    pub fn set_playback(&mut self, playback: Box<dyn AudioOutput>) {
        self.playback = Some(playback);
    }

    /// Whether captures are written to disk as they are filed.
    pub fn set_persist(&mut self, persist: bool) {
        self.persist = persist;
    }

    /// Whether captures are played back after filing.
    pub fn set_echo(&mut self, echo: bool) {
        self.echo = echo;
    }

    /// Run one polling tick. Returns what was captured, if anything.
    /// Config values are read fresh from the session config on every
    /// tick, so runtime tuning takes effect immediately.
    pub fn tick(&mut self) -> Result<Option<CaptureOutcome>, DatasetError> {
        let capture = match self.detector.tick(&mut self.device, &self.config.detector) {
            Tick::Quiet { .. } => return Ok(None),
            Tick::Captured(capture) => capture,
        };

        let peak = capture.peak;
        let sample = self.dataset.new_sample(
            capture.wave,
            capture.raw,
            None,
            self.persist,
            &self.config.audio,
        )?;
        let label = sample.label().to_string();
        let id = sample.id();

        if self.echo {
            if let Some(playback) = &mut self.playback {
                playback.write(sample.wave());
            }
        }

        let class = self.classifier.as_ref().map(|classifier| {
            let spectrogram =
                sample.spectrogram(&self.config.spectrogram, self.config.audio.sample_rate);
            classifier.classify(spectrogram)
        });

        if let Some(index) = class {
            self.midi.send(index);
        }
        self.last_class = class;

        log::info!(
            "Captured sample {}/{} (peak {}, class {:?})",
            label,
            id,
            peak,
            class
        );

        Ok(Some(CaptureOutcome {
            label,
            id,
            peak,
            class,
        }))
    }

    /// Drive ticks until `stop` is raised. Dataset errors abort only the
    /// offending capture; the polling loop keeps going.
    pub fn run(&mut self, stop: &AtomicBool) {
        log::info!("Capture loop started");
        while !stop.load(Ordering::SeqCst) {
            if let Err(e) = self.tick() {
                log::error!("Capture failed: {}", e);
            }
        }
        log::info!("Capture loop stopped");
    }

    /// Update a named parameter, funneling all runtime tuning through one
    /// entry point. Volume changes propagate to the playback sink.
    pub fn set_param(&mut self, name: &str, value: f64) -> Result<(), ConfigError> {
        self.config.set_param(name, value)?;
        if name == "VOLUME" {
            if let Some(playback) = &mut self.playback {
                playback.set_volume(self.config.volume);
            }
        }
        Ok(())
    }

    /// Status text for display: detector state, last peak, collection
    /// counts. Read-only.
    pub fn status(&self) -> String {
        let state = match self.detector.state() {
            DetectorState::WaitingForThreshold => "Waiting for threshold...",
            DetectorState::Recording => "Recording...",
        };
        let mut msg = format!("Status: {}\n", state);
        msg.push_str(&format!("    Signal max: {:4}\n", self.detector.last_peak()));
        msg.push_str(&format!("    Captures: {}\n", self.detector.captures()));
        if let Some(class) = self.last_class {
            msg.push_str(&format!("    Last class: {}\n", class));
        }
        msg.push('\n');
        msg.push_str(&self.dataset.summary());
        msg
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn dataset_mut(&mut self) -> &mut Dataset {
        &mut self.dataset
    }

    pub fn detector(&self) -> &Detector {
        &self.detector
    }

    pub fn last_class(&self) -> Option<usize> {
        self.last_class
    }

    /// Tear down the session, handing the dataset back to the caller.
    pub fn into_dataset(self) -> Dataset {
        self.dataset
    }
}
