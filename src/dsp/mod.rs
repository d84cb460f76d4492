// Signal processing
// Pure, stateless transforms from raw waveforms to frequency-domain
// representations. No hidden state: identical input, identical output.

mod fft;
mod mel;

pub use fft::fft;
pub use mel::{linear_scale, melspectrogram};

/// A mel-scaled time-frequency representation, row-major:
/// `bands` rows of `timesteps` values each.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrogram {
    bands: usize,
    timesteps: usize,
    data: Vec<f32>,
}

impl Spectrogram {
    /// Create an all-zero spectrogram of the given shape.
    pub fn zeroed(bands: usize, timesteps: usize) -> Self {
        Spectrogram {
            bands,
            timesteps,
            data: vec![0.0; bands * timesteps],
        }
    }

    /// Shape as `(bands, timesteps)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.bands, self.timesteps)
    }

    /// One frequency band across all time steps.
    pub fn band(&self, band: usize) -> &[f32] {
        let start = band * self.timesteps;
        &self.data[start..start + self.timesteps]
    }

    /// Value at `(band, step)`.
    pub fn get(&self, band: usize, step: usize) -> f32 {
        self.data[band * self.timesteps + step]
    }

    pub(crate) fn set(&mut self, band: usize, step: usize, value: f32) {
        self.data[band * self.timesteps + step] = value;
    }

    /// Flat row-major view of all values.
    pub fn values(&self) -> &[f32] {
        &self.data
    }

    pub(crate) fn values_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }
}
