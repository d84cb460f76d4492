// Forward FFT with frequency bin centers
// Non-finite output values are scrubbed to zero so downstream consumers
// never see NaN or Inf, even for degenerate input.

use realfft::num_complex::Complex;
use realfft::RealFftPlanner;

/// Compute the one-sided complex spectrum of `wave` along with the center
/// frequency (Hz) of each bin. Output length is `wave.len() / 2 + 1`.
pub fn fft(wave: &[i16], sample_rate: u32) -> (Vec<Complex<f32>>, Vec<f32>) {
    if wave.is_empty() {
        return (Vec::new(), Vec::new());
    }

    let mut planner = RealFftPlanner::<f32>::new();
    let plan = planner.plan_fft_forward(wave.len());

    let mut input: Vec<f32> = wave.iter().map(|&s| s as f32).collect();
    let mut spectrum = plan.make_output_vec();

    plan.process(&mut input, &mut spectrum).unwrap();

    for value in spectrum.iter_mut() {
        if !value.re.is_finite() {
            value.re = 0.0;
        }
        if !value.im.is_finite() {
            value.im = 0.0;
        }
    }

    let bin_width = sample_rate as f32 / wave.len() as f32;
    let frequencies = (0..spectrum.len()).map(|i| i as f32 * bin_width).collect();

    (spectrum, frequencies)
}
