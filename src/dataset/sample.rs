// A single captured audio event
// Holds the fixed-length waveform, its exact device byte encoding, and a
// lazily computed spectrogram keyed by the config that produced it.

use crate::config::SpectrogramConfig;
use crate::dsp::{melspectrogram, Spectrogram};

#[derive(Debug, Clone)]
struct CachedSpectrogram {
    /// The config the cached value was computed under. Staleness is
    /// detected by comparing against the requested config, never assumed.
    config: SpectrogramConfig,
    spectrogram: Spectrogram,
}

/// One captured event inside a dataset's label bucket.
#[derive(Debug, Clone)]
pub struct Sample {
    wave: Vec<i16>,
    raw: Vec<u8>,
    label: String,
    id: u32,
    cached: Option<CachedSpectrogram>,
}

impl Sample {
    pub(crate) fn new(wave: Vec<i16>, raw: Vec<u8>, label: String, id: u32) -> Self {
        Sample {
            wave,
            raw,
            label,
            id,
            cached: None,
        }
    }

    /// The captured integer waveform.
    pub fn wave(&self) -> &[i16] {
        &self.wave
    }

    /// The exact bytes read from the device, used for byte-faithful
    /// persistence and playback.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Label-scoped sequential id, unique only within this label bucket.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// The spectrogram of this sample under `config`, computed on first
    /// access and cached. A request under a config that differs from the
    /// cached one recomputes from the stored waveform and fully replaces
    /// the cache.
    pub fn spectrogram(&mut self, config: &SpectrogramConfig, sample_rate: u32) -> &Spectrogram {
        let stale = match &self.cached {
            Some(cached) => cached.config != *config,
            None => true,
        };

        if stale {
            let spectrogram = melspectrogram(&self.wave, config, sample_rate);
            self.cached = Some(CachedSpectrogram {
                config: config.clone(),
                spectrogram,
            });
        }

        &self.cached.as_ref().unwrap().spectrogram
    }

    /// The cached spectrogram, if one has been computed. Callers are
    /// responsible for knowing which config produced it.
    pub fn cached_spectrogram(&self) -> Option<&Spectrogram> {
        self.cached.as_ref().map(|c| &c.spectrogram)
    }

    /// Drop the cached spectrogram so the next access recomputes.
    pub fn clear_spectrogram(&mut self) {
        self.cached = None;
    }
}
