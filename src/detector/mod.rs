// Onset detector and recorder state machine
// Polls small chunks from the input device; a peak above the threshold
// triggers a fresh full-length capture in the same tick. The trigger chunk
// itself is discarded: the hardware buffer only retains recent samples,
// so the capture read starts over rather than splicing chunks together.

use crate::audio::AudioInput;
use crate::config::DetectorConfig;

/// Where the detector currently is in its polling cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorState {
    /// Polling small chunks, testing each against the threshold
    WaitingForThreshold,
    /// Performing a full-length capture after a trigger
    Recording,
}

/// One captured event, ready to be filed into a dataset.
#[derive(Debug, Clone)]
pub struct Capture {
    /// Fixed-length integer waveform (recording_length samples)
    pub wave: Vec<i16>,
    /// Exact byte encoding as read from the device
    pub raw: Vec<u8>,
    /// Peak absolute amplitude of the chunk that triggered the capture
    pub peak: i32,
}

/// Outcome of a single polling tick.
#[derive(Debug, Clone)]
pub enum Tick {
    /// Below threshold; the polled chunk's peak is reported for display
    Quiet { peak: i32 },
    /// Threshold crossed; a full-length capture was taken
    Captured(Capture),
}

/// Threshold-triggered recorder. Transient between sessions, never
/// persisted. The config is taken per tick, so threshold and lengths are
/// live-tunable without restarting the loop.
pub struct Detector {
    state: DetectorState,
    last_peak: i32,
    ticks: u64,
    captures: u64,
}

impl Detector {
    pub fn new() -> Self {
        Detector {
            state: DetectorState::WaitingForThreshold,
            last_peak: 0,
            ticks: 0,
            captures: 0,
        }
    }

    pub fn state(&self) -> DetectorState {
        self.state
    }

    /// Peak absolute amplitude of the most recent polled chunk.
    pub fn last_peak(&self) -> i32 {
        self.last_peak
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn captures(&self) -> u64 {
        self.captures
    }

    /// Run one polling tick. Reads a detection-sized chunk; when its peak
    /// exceeds the threshold, immediately issues the full-length capture
    /// read and returns to waiting.
    pub fn tick<D: AudioInput>(&mut self, device: &mut D, config: &DetectorConfig) -> Tick {
        self.ticks += 1;

        let (chunk, _) = device.read(config.detection_sample_size);
        let peak = peak_amplitude(&chunk);
        self.last_peak = peak;

        if peak <= config.threshold as i32 {
            return Tick::Quiet { peak };
        }

        self.state = DetectorState::Recording;
        log::debug!("Threshold crossed (peak {}), capturing", peak);

        let (wave, raw) = device.read(config.recording_length);
        self.state = DetectorState::WaitingForThreshold;
        self.captures += 1;

        Tick::Captured(Capture { wave, raw, peak })
    }
}

impl Default for Detector {
    fn default() -> Self {
        Self::new()
    }
}

/// Largest absolute sample value, widened so i16::MIN cannot overflow.
fn peak_amplitude(chunk: &[i16]) -> i32 {
    chunk.iter().map(|&s| (s as i32).abs()).max().unwrap_or(0)
}
