// Mel-scaled power spectrogram with a fixed output shape
// The hop length is derived from the waveform length so the output is
// always exactly (bands, timesteps) no matter how long the input is.

use realfft::RealFftPlanner;

use crate::config::SpectrogramConfig;
use crate::dsp::Spectrogram;

/// Power floor before decibel conversion, matching 10*log10(1e-10) = -100 dB
const POWER_FLOOR: f32 = 1e-10;

/// Compute a mel-scaled power spectrogram of `wave`.
///
/// Frames are `config.fft_length` samples wide, Hann-windowed, spaced
/// `wave.len() / (timesteps + 1)` samples apart, and zero-padded past the
/// end of the waveform. Power is projected onto `config.bands` triangular
/// mel filters between `low_hz` and `high_hz`, converted to decibels,
/// clipped to `[db_floor, db_ceil]`, then doubled. With the default clip
/// of [10, 120] the nominal output range is [20, 240].
pub fn melspectrogram(wave: &[i16], config: &SpectrogramConfig, sample_rate: u32) -> Spectrogram {
    let mut spec = Spectrogram::zeroed(config.bands, config.timesteps);
    if config.bands == 0 || config.timesteps == 0 || config.fft_length == 0 {
        return spec;
    }

    let hop = (wave.len() / (config.timesteps + 1)).max(1);

    let mut planner = RealFftPlanner::<f32>::new();
    let plan = planner.plan_fft_forward(config.fft_length);
    let n_bins = config.fft_length / 2 + 1;

    let window = hann_window(config.fft_length);
    let filterbank = mel_filterbank(config, sample_rate, n_bins);

    let mut frame = vec![0.0f32; config.fft_length];
    let mut spectrum = plan.make_output_vec();
    let mut power = vec![0.0f32; n_bins];

    for step in 0..config.timesteps {
        let start = step * hop;

        // Copy what the waveform still covers; the tail stays zero
        frame.iter_mut().for_each(|v| *v = 0.0);
        if start < wave.len() {
            let available = (wave.len() - start).min(config.fft_length);
            for (dst, &src) in frame[..available].iter_mut().zip(&wave[start..start + available]) {
                *dst = src as f32;
            }
        }

        for (value, w) in frame.iter_mut().zip(&window) {
            *value *= w;
        }

        plan.process(&mut frame, &mut spectrum).unwrap();
        for (p, c) in power.iter_mut().zip(&spectrum) {
            *p = c.norm_sqr();
            if !p.is_finite() {
                *p = 0.0;
            }
        }

        for band in 0..config.bands {
            let weights = &filterbank[band * n_bins..(band + 1) * n_bins];
            let mel_power: f32 = weights.iter().zip(&power).map(|(w, p)| w * p).sum();

            let db = 10.0 * mel_power.max(POWER_FLOOR).log10();
            let clipped = db.clamp(config.db_floor, config.db_ceil);
            spec.set(band, step, clipped * 2.0);
        }
    }

    if config.normalize {
        normalize_in_place(spec.values_mut());
    }

    spec
}

/// Min-max normalize an arbitrary array into u8 [0, 255].
/// A zero-width value range (max == min) yields all zeros rather than
/// dividing by zero.
pub fn linear_scale(values: &[f32]) -> Vec<u8> {
    let (min, max) = match min_max(values) {
        Some(bounds) => bounds,
        None => return Vec::new(),
    };

    if max <= min {
        return vec![0; values.len()];
    }

    let range = max - min;
    values
        .iter()
        .map(|&v| (((v - min) / range) * 255.0).round() as u8)
        .collect()
}

fn normalize_in_place(values: &mut [f32]) {
    let (min, max) = match min_max(values) {
        Some(bounds) => bounds,
        None => return,
    };

    if max <= min {
        values.iter_mut().for_each(|v| *v = 0.0);
        return;
    }

    let range = max - min;
    for v in values.iter_mut() {
        *v = (*v - min) / range * 255.0;
    }
}

fn min_max(values: &[f32]) -> Option<(f32, f32)> {
    if values.is_empty() {
        return None;
    }
    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    for &v in values {
        min = min.min(v);
        max = max.max(v);
    }
    Some((min, max))
}

fn hann_window(len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| 0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / len as f32).cos()))
        .collect()
}

fn hz_to_mel(hz: f32) -> f32 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

fn mel_to_hz(mel: f32) -> f32 {
    700.0 * (10.0f32.powf(mel / 2595.0) - 1.0)
}

/// Dense triangular mel filterbank, `bands` rows of `n_bins` weights.
fn mel_filterbank(config: &SpectrogramConfig, sample_rate: u32, n_bins: usize) -> Vec<f32> {
    let bands = config.bands;
    let mut weights = vec![0.0f32; bands * n_bins];

    let high_hz = config.high_hz.min(sample_rate as f32 / 2.0);
    let mel_low = hz_to_mel(config.low_hz);
    let mel_high = hz_to_mel(high_hz);

    // bands + 2 edge points: each filter rises from edge m to m+1 and
    // falls from m+1 to m+2
    let edges: Vec<f32> = (0..bands + 2)
        .map(|i| mel_to_hz(mel_low + (mel_high - mel_low) * i as f32 / (bands + 1) as f32))
        .collect();

    let bin_width = sample_rate as f32 / config.fft_length as f32;

    for band in 0..bands {
        let (left, center, right) = (edges[band], edges[band + 1], edges[band + 2]);
        let rising = (center - left).max(f32::EPSILON);
        let falling = (right - center).max(f32::EPSILON);

        for bin in 0..n_bins {
            let freq = bin as f32 * bin_width;
            let weight = if freq <= center {
                (freq - left) / rising
            } else {
                (right - freq) / falling
            };
            if weight > 0.0 {
                weights[band * n_bins + bin] = weight;
            }
        }
    }

    weights
}
