// Audio I/O module
// Device capture, playback, and WAV persistence

pub mod device;
pub mod playback;
pub mod wav;

pub use device::{list_input_devices, AudioInput, DeviceError, InputDevice};
pub use playback::{AudioOutput, Playback};
pub use wav::{bytes_to_samples, read_wav, samples_to_bytes, write_wav, WavError};
