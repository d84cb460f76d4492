// Session configuration
// Explicit config structs passed into the detector and DSP functions,
// plus a named-parameter surface for the external configuration UI

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    #[error("Invalid value {value} for parameter {name}")]
    InvalidValue { name: String, value: f64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parameters fixing one capture session on the audio device.
/// Immutable once a stream is open; changing any field requires
/// closing and reopening the device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Sample rate in Hz (e.g., 44100, 48000)
    pub sample_rate: u32,

    /// Number of channels (1 = mono, 2 = stereo)
    pub channels: u16,

    /// Input device index; `None` selects the host default
    pub device_index: Option<usize>,

    /// Samples delivered per driver callback
    pub chunk_size: usize,
}

impl Default for AudioConfig {
    fn default() -> Self {
        AudioConfig {
            sample_rate: 44100,
            channels: 1,
            device_index: None,
            chunk_size: 128,
        }
    }
}

/// Parameters governing the time-frequency transform.
/// User-tunable at runtime; `PartialEq` is the cache-invalidation token:
/// a cached spectrogram is valid only while its stored config compares
/// equal to the requested one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectrogramConfig {
    /// Lowest mel band edge in Hz
    pub low_hz: f32,

    /// Highest mel band edge in Hz
    pub high_hz: f32,

    /// Number of mel frequency bands (spectrogram height)
    pub bands: usize,

    /// Number of time steps (spectrogram width)
    pub timesteps: usize,

    /// FFT window length in samples
    pub fft_length: usize,

    /// Lower decibel clip bound
    pub db_floor: f32,

    /// Upper decibel clip bound
    pub db_ceil: f32,

    /// Min-max normalize the clipped spectrogram to [0, 255]
    pub normalize: bool,
}

impl Default for SpectrogramConfig {
    fn default() -> Self {
        SpectrogramConfig {
            low_hz: 20.0,
            high_hz: 20_000.0,
            bands: 100,
            timesteps: 100,
            fft_length: 2048,
            db_floor: 10.0,
            db_ceil: 120.0,
            normalize: false,
        }
    }
}

/// Detector tuning. Re-read on every tick, so updates take effect
/// between ticks without restarting the polling loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Peak absolute amplitude that triggers a capture
    pub threshold: i16,

    /// Samples per polling read while waiting for the threshold
    pub detection_sample_size: usize,

    /// Samples per full-length capture after a trigger
    pub recording_length: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        DetectorConfig {
            threshold: 100,
            detection_sample_size: 128,
            recording_length: 4096,
        }
    }
}

/// Top-level configuration owned by the session and passed down by
/// reference. All tuning flows through this struct; nothing reads
/// ambient globals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub audio: AudioConfig,
    pub spectrogram: SpectrogramConfig,
    pub detector: DetectorConfig,
    /// Playback volume percentage [0, 100]
    pub volume: u8,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            audio: AudioConfig::default(),
            spectrogram: SpectrogramConfig::default(),
            detector: DetectorConfig::default(),
            volume: 50,
        }
    }
}

impl SessionConfig {
    /// Read a parameter by its external name (the flat numeric-parameter
    /// surface exposed to the configuration UI).
    pub fn get_param(&self, name: &str) -> Result<f64, ConfigError> {
        let value = match name {
            "THRESHOLD" => self.detector.threshold as f64,
            "RECORDING_LENGTH" => self.detector.recording_length as f64,
            "DETECTION_SAMPLE_SIZE" => self.detector.detection_sample_size as f64,
            "SPECTROGRAM_LOW" => self.spectrogram.low_hz as f64,
            "SPECTROGRAM_HIGH" => self.spectrogram.high_hz as f64,
            "FREQUENCY_BANDS" => self.spectrogram.bands as f64,
            "TIMESTEPS" => self.spectrogram.timesteps as f64,
            "FFT_LENGTH" => self.spectrogram.fft_length as f64,
            "NORMALIZE" => {
                if self.spectrogram.normalize {
                    1.0
                } else {
                    0.0
                }
            }
            "SAMPLE_RATE" => self.audio.sample_rate as f64,
            "VOLUME" => self.volume as f64,
            _ => return Err(ConfigError::UnknownParameter(name.to_string())),
        };
        Ok(value)
    }

    /// Write a parameter by its external name. Rejects values that do
    /// not fit the parameter's type or range.
    pub fn set_param(&mut self, name: &str, value: f64) -> Result<(), ConfigError> {
        let invalid = || ConfigError::InvalidValue {
            name: name.to_string(),
            value,
        };

        match name {
            "THRESHOLD" => {
                if !(0.0..=i16::MAX as f64).contains(&value) {
                    return Err(invalid());
                }
                self.detector.threshold = value as i16;
            }
            "RECORDING_LENGTH" => {
                self.detector.recording_length = to_positive_usize(value).ok_or_else(invalid)?;
            }
            "DETECTION_SAMPLE_SIZE" => {
                self.detector.detection_sample_size =
                    to_positive_usize(value).ok_or_else(invalid)?;
            }
            "SPECTROGRAM_LOW" => {
                if value < 0.0 {
                    return Err(invalid());
                }
                self.spectrogram.low_hz = value as f32;
            }
            "SPECTROGRAM_HIGH" => {
                if value <= 0.0 {
                    return Err(invalid());
                }
                self.spectrogram.high_hz = value as f32;
            }
            "FREQUENCY_BANDS" => {
                self.spectrogram.bands = to_positive_usize(value).ok_or_else(invalid)?;
            }
            "TIMESTEPS" => {
                self.spectrogram.timesteps = to_positive_usize(value).ok_or_else(invalid)?;
            }
            "FFT_LENGTH" => {
                self.spectrogram.fft_length = to_positive_usize(value).ok_or_else(invalid)?;
            }
            "NORMALIZE" => {
                self.spectrogram.normalize = value != 0.0;
            }
            "VOLUME" => {
                if !(0.0..=100.0).contains(&value) {
                    return Err(invalid());
                }
                self.volume = value as u8;
            }
            _ => return Err(ConfigError::UnknownParameter(name.to_string())),
        }
        Ok(())
    }

    /// Persist the configuration as JSON.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load a previously saved configuration.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

fn to_positive_usize(value: f64) -> Option<usize> {
    if value >= 1.0 && value.fract() == 0.0 && value <= usize::MAX as f64 {
        Some(value as usize)
    } else {
        None
    }
}
