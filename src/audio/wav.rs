// WAV encode/decode for sample persistence
// Samples are stored as 16-bit signed PCM; the little-endian byte form is
// kept alongside the decoded integers so persistence is byte-faithful.

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WavError {
    #[error("WAV error: {0}")]
    Hound(#[from] hound::Error),

    #[error("Unsupported WAV format: {0}")]
    UnsupportedFormat(String),

    #[error("Raw PCM byte length {0} is not a whole number of 16-bit samples")]
    OddByteLength(usize),
}

/// Decode little-endian 16-bit PCM bytes into samples.
pub fn bytes_to_samples(raw: &[u8]) -> Result<Vec<i16>, WavError> {
    if raw.len() % 2 != 0 {
        return Err(WavError::OddByteLength(raw.len()));
    }
    Ok(raw
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect())
}

/// Encode samples as little-endian 16-bit PCM bytes.
pub fn samples_to_bytes(samples: &[i16]) -> Vec<u8> {
    let mut raw = Vec::with_capacity(samples.len() * 2);
    for sample in samples {
        raw.extend_from_slice(&sample.to_le_bytes());
    }
    raw
}

/// Write raw 16-bit PCM bytes to `path` as an uncompressed WAV file.
pub fn write_wav(
    path: &Path,
    raw: &[u8],
    sample_rate: u32,
    channels: u16,
) -> Result<(), WavError> {
    let samples = bytes_to_samples(raw)?;

    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec)?;
    for sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(())
}

/// Read a 16-bit PCM WAV file, returning the decoded samples, their raw
/// byte encoding, and the file's sample rate.
pub fn read_wav(path: &Path) -> Result<(Vec<i16>, Vec<u8>, u32), WavError> {
    let mut reader = WavReader::open(path)?;
    let spec = reader.spec();

    if spec.sample_format != SampleFormat::Int || spec.bits_per_sample != 16 {
        return Err(WavError::UnsupportedFormat(format!(
            "{:?} {}-bit, expected 16-bit PCM",
            spec.sample_format, spec.bits_per_sample
        )));
    }

    let samples: Vec<i16> = reader.samples::<i16>().collect::<Result<Vec<_>, _>>()?;
    let raw = samples_to_bytes(&samples);
    Ok((samples, raw, spec.sample_rate))
}
