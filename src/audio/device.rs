// Native audio capture using cpal
// The input stream feeds a shared sample queue; `read` blocks until the
// requested count is available. Driver glitches degrade to zero-filled
// data instead of failing the polling loop.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::SampleFormat;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;
use thiserror::Error;

use crate::config::AudioConfig;

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("Audio device unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to get input config: {0}")]
    ConfigError(String),

    #[error("Failed to build input stream: {0}")]
    StreamError(String),
}

/// Blocking sample source consumed by the detector loop.
///
/// `read` returns exactly `n` samples plus their little-endian byte
/// encoding. It must never fail: a driver overflow or stall yields
/// best-effort data padded with zeros, logged and counted rather than
/// surfaced as an error.
pub trait AudioInput {
    fn read(&mut self, n: usize) -> (Vec<i16>, Vec<u8>);
}

/// Names of all input-capable devices on the default host, in index order.
pub fn list_input_devices() -> Vec<String> {
    let host = cpal::default_host();
    match host.input_devices() {
        Ok(devices) => devices
            .map(|d| d.name().unwrap_or_else(|_| "<unknown>".to_string()))
            .collect(),
        Err(e) => {
            log::warn!("Failed to enumerate input devices: {}", e);
            Vec::new()
        }
    }
}

struct SampleQueue {
    samples: Mutex<VecDeque<i16>>,
    available: Condvar,
}

/// How much audio the queue retains, in seconds. Mirrors a hardware
/// buffer: when the host pauses polling without closing the device, the
/// oldest samples are dropped so a resumed read sees current audio
/// instead of an ever-growing backlog.
const QUEUE_RETENTION_SECS: usize = 2;

/// One open cpal input stream on a configured device.
pub struct InputDevice {
    stream: Option<cpal::Stream>,
    queue: Arc<SampleQueue>,
    config: AudioConfig,
    glitches: Arc<AtomicU64>,
}

impl InputDevice {
    /// Open an input stream on the configured device. Fails with
    /// `Unavailable` when the index does not name an input-capable device
    /// or the device cannot be claimed.
    pub fn open(config: &AudioConfig) -> Result<Self, DeviceError> {
        let host = cpal::default_host();

        let device = match config.device_index {
            Some(index) => host
                .input_devices()
                .map_err(|e| DeviceError::Unavailable(e.to_string()))?
                .nth(index)
                .ok_or_else(|| {
                    DeviceError::Unavailable(format!("no input device at index {}", index))
                })?,
            None => host
                .default_input_device()
                .ok_or_else(|| DeviceError::Unavailable("no default input device".to_string()))?,
        };

        let supported = device
            .default_input_config()
            .map_err(|e| DeviceError::ConfigError(e.to_string()))?;
        let sample_format = supported.sample_format();

        let stream_config = cpal::StreamConfig {
            channels: config.channels,
            sample_rate: cpal::SampleRate(config.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let queue = Arc::new(SampleQueue {
            samples: Mutex::new(VecDeque::new()),
            available: Condvar::new(),
        });
        let glitches = Arc::new(AtomicU64::new(0));
        let capacity =
            config.sample_rate as usize * config.channels as usize * QUEUE_RETENTION_SECS;

        let err_glitches = Arc::clone(&glitches);
        let err_fn = move |err: cpal::StreamError| {
            log::warn!("Input stream error: {}", err);
            err_glitches.fetch_add(1, Ordering::Relaxed);
        };

        let stream = match sample_format {
            SampleFormat::I16 => {
                let queue = Arc::clone(&queue);
                let glitches = Arc::clone(&glitches);
                device.build_input_stream(
                    &stream_config,
                    move |data: &[i16], _: &_| {
                        push_samples(&queue, &glitches, capacity, data.iter().copied())
                    },
                    err_fn,
                    None,
                )
            }
            SampleFormat::F32 => {
                let queue = Arc::clone(&queue);
                let glitches = Arc::clone(&glitches);
                device.build_input_stream(
                    &stream_config,
                    move |data: &[f32], _: &_| {
                        push_samples(
                            &queue,
                            &glitches,
                            capacity,
                            data.iter()
                                .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16),
                        )
                    },
                    err_fn,
                    None,
                )
            }
            SampleFormat::U16 => {
                let queue = Arc::clone(&queue);
                let glitches = Arc::clone(&glitches);
                device.build_input_stream(
                    &stream_config,
                    move |data: &[u16], _: &_| {
                        push_samples(
                            &queue,
                            &glitches,
                            capacity,
                            data.iter().map(|&s| (s as i32 - 32_768) as i16),
                        )
                    },
                    err_fn,
                    None,
                )
            }
            other => {
                return Err(DeviceError::ConfigError(format!(
                    "unsupported sample format {:?}",
                    other
                )))
            }
        }
        .map_err(|e| DeviceError::StreamError(e.to_string()))?;

        stream
            .play()
            .map_err(|e| DeviceError::StreamError(e.to_string()))?;

        log::info!(
            "Opened input device (rate {} Hz, {} channel(s))",
            config.sample_rate,
            config.channels
        );

        Ok(InputDevice {
            stream: Some(stream),
            queue,
            config: config.clone(),
            glitches,
        })
    }

    /// Number of recovered glitches (stream errors, read timeouts and
    /// queue overflows) since the device was opened.
    pub fn glitch_count(&self) -> u64 {
        self.glitches.load(Ordering::Relaxed)
    }

    /// Stop and release the stream. Idempotent.
    pub fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            if let Err(e) = stream.pause() {
                log::warn!("Failed to pause input stream: {}", e);
            }
            log::info!("Closed input device");
        }
    }
}

impl Drop for InputDevice {
    fn drop(&mut self) {
        self.close();
    }
}

impl AudioInput for InputDevice {
    fn read(&mut self, n: usize) -> (Vec<i16>, Vec<u8>) {
        // Bounded wait: twice the time the driver needs to produce n
        // samples, with headroom for scheduling jitter
        let expected_ms = n as u64 * 1000 / self.config.sample_rate.max(1) as u64;
        let deadline = Duration::from_millis(expected_ms * 2 + 250);

        let start = std::time::Instant::now();
        let mut samples = self.queue.samples.lock().unwrap();
        while samples.len() < n {
            let elapsed = start.elapsed();
            if elapsed >= deadline {
                break;
            }
            let (guard, _) = self
                .queue
                .available
                .wait_timeout(samples, deadline - elapsed)
                .unwrap();
            samples = guard;
        }

        let got = samples.len().min(n);
        let mut wave: Vec<i16> = samples.drain(..got).collect();
        drop(samples);

        if wave.len() < n {
            log::warn!(
                "Input read returned {}/{} samples, zero-filling the rest",
                wave.len(),
                n
            );
            self.glitches.fetch_add(1, Ordering::Relaxed);
            wave.resize(n, 0);
        }

        let raw = super::wav::samples_to_bytes(&wave);
        (wave, raw)
    }
}

fn push_samples(
    queue: &SampleQueue,
    glitches: &AtomicU64,
    capacity: usize,
    data: impl Iterator<Item = i16>,
) {
    let mut samples = queue.samples.lock().unwrap();
    samples.extend(data);
    if samples.len() > capacity {
        let excess = samples.len() - capacity;
        samples.drain(..excess);
        glitches.fetch_add(1, Ordering::Relaxed);
        log::trace!("Input queue full, dropped {} oldest samples", excess);
    }
    queue.available.notify_one();
}
