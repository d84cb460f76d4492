// Waveform playback using rodio
// Blocking writes with a runtime-adjustable volume percentage

use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, Sink};

use crate::config::AudioConfig;
use crate::audio::device::DeviceError;

/// Blocking playback sink for captured waveforms.
pub trait AudioOutput {
    /// Play a waveform to completion, scaled by the current volume.
    fn write(&mut self, samples: &[i16]);

    /// Set output volume as a percentage [0, 100].
    fn set_volume(&mut self, percent: u8);
}

/// Default-output-device playback built on rodio.
pub struct Playback {
    // The stream must stay alive as long as the sink plays through it
    _stream: OutputStream,
    sink: Sink,
    sample_rate: u32,
    channels: u16,
}

impl Playback {
    /// Open the default output device for playback at the session's
    /// sample rate and channel count.
    pub fn open(config: &AudioConfig, volume: u8) -> Result<Self, DeviceError> {
        let (stream, handle) =
            OutputStream::try_default().map_err(|e| DeviceError::Unavailable(e.to_string()))?;
        let sink = Sink::try_new(&handle).map_err(|e| DeviceError::StreamError(e.to_string()))?;
        sink.set_volume(volume.min(100) as f32 / 100.0);

        Ok(Playback {
            _stream: stream,
            sink,
            sample_rate: config.sample_rate,
            channels: config.channels,
        })
    }
}

impl AudioOutput for Playback {
    fn write(&mut self, samples: &[i16]) {
        let buffer = SamplesBuffer::new(self.channels, self.sample_rate, samples.to_vec());
        self.sink.append(buffer);
        self.sink.sleep_until_end();
    }

    fn set_volume(&mut self, percent: u8) {
        self.sink.set_volume(percent.min(100) as f32 / 100.0);
    }
}
