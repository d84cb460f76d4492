// Hitbox - audio event capture, spectrogram datasets, live MIDI triggering
// Module declarations

pub mod audio;
pub mod classifier;
pub mod config;
pub mod dataset;
pub mod detector;
pub mod dsp;
pub mod midi;
pub mod session;

pub use audio::{AudioInput, AudioOutput, DeviceError, InputDevice, Playback, WavError};
pub use classifier::{Classifier, NearestCentroid};
pub use config::{AudioConfig, ConfigError, DetectorConfig, SessionConfig, SpectrogramConfig};
pub use dataset::{default_data_root, Dataset, DatasetError, Sample, DEFAULT_LABEL};
pub use detector::{Capture, Detector, DetectorState, Tick};
pub use dsp::{fft, linear_scale, melspectrogram, Spectrogram};
pub use midi::{MidiMap, MidiSink, MidiTrigger, NullSink, WriterSink};
pub use session::{CaptureOutcome, Session};
