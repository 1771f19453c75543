//! DSP primitives for the detection path.
//!
//! A one-pole high-pass for rumble and music bass, and an STFT spectral
//! subtraction pass for heavier accompaniment. Both return new buffers; the
//! caller's signal is never modified.

use rustfft::FftPlanner;
use rustfft::num_complex::Complex;

/// One-pole high-pass filter.
///
/// `y[n] = a * (y[n-1] + x[n] - x[n-1])` with `a = rc / (rc + dt)`. Cheap
/// enough to run over a whole clip; attenuation below `cutoff_hz` rolls off
/// at 6 dB per octave.
pub fn high_pass(samples: &[f32], sample_rate: u32, cutoff_hz: f32) -> Vec<f32> {
    if samples.is_empty() || cutoff_hz <= 0.0 {
        return samples.to_vec();
    }
    let rc = 1.0 / (2.0 * std::f32::consts::PI * cutoff_hz);
    let dt = 1.0 / sample_rate as f32;
    let a = rc / (rc + dt);

    let mut out = Vec::with_capacity(samples.len());
    let mut prev_x = samples[0];
    let mut prev_y = samples[0];
    out.push(prev_y);
    for &x in &samples[1..] {
        let y = a * (prev_y + x - prev_x);
        out.push(y);
        prev_x = x;
        prev_y = y;
    }
    out
}

const STFT_SIZE: usize = 1024;
const STFT_HOP: usize = 512;

/// Spectral subtraction over an STFT with a Hann window.
///
/// The per-bin noise floor is estimated from the quietest quarter of the
/// frames (ranked by frame energy), scaled by `strength`, and subtracted from
/// each frame's magnitude, clamping at zero. Frames are resynthesized by
/// overlap-add and normalized by the accumulated window sum. Steady
/// accompaniment dominates the quiet frames, so it lands in the floor while
/// intermittent speech mostly survives.
pub fn spectral_subtract(samples: &[f32], strength: f32) -> Vec<f32> {
    if samples.len() < STFT_SIZE {
        return samples.to_vec();
    }

    let window: Vec<f32> = (0..STFT_SIZE)
        .map(|i| {
            let phase = std::f32::consts::PI * i as f32 / (STFT_SIZE - 1) as f32;
            phase.sin() * phase.sin()
        })
        .collect();

    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(STFT_SIZE);
    let ifft = planner.plan_fft_inverse(STFT_SIZE);

    let frame_count = (samples.len() - STFT_SIZE) / STFT_HOP + 1;
    let mut spectra: Vec<Vec<Complex<f32>>> = Vec::with_capacity(frame_count);
    let mut energies: Vec<(f32, usize)> = Vec::with_capacity(frame_count);

    for f in 0..frame_count {
        let start = f * STFT_HOP;
        let mut buf: Vec<Complex<f32>> = samples[start..start + STFT_SIZE]
            .iter()
            .zip(&window)
            .map(|(&s, &w)| Complex::new(s * w, 0.0))
            .collect();
        fft.process(&mut buf);
        let energy: f32 = buf.iter().map(|c| c.norm_sqr()).sum();
        energies.push((energy, f));
        spectra.push(buf);
    }

    // Noise floor from the quietest quarter of frames, at least one frame.
    energies.sort_by(|a, b| a.0.total_cmp(&b.0));
    let floor_frames = (frame_count / 4).max(1);
    let mut noise_floor = vec![0.0f32; STFT_SIZE];
    for &(_, idx) in &energies[..floor_frames] {
        for (bin, c) in spectra[idx].iter().enumerate() {
            noise_floor[bin] += c.norm();
        }
    }
    for v in &mut noise_floor {
        *v = *v / floor_frames as f32 * strength;
    }

    let mut out = vec![0.0f32; samples.len()];
    let mut window_sum = vec![0.0f32; samples.len()];
    for (f, spectrum) in spectra.iter_mut().enumerate() {
        for (bin, c) in spectrum.iter_mut().enumerate() {
            let mag = c.norm();
            if mag > 0.0 {
                let reduced = (mag - noise_floor[bin]).max(0.0);
                *c *= reduced / mag;
            }
        }
        ifft.process(spectrum);
        let start = f * STFT_HOP;
        for (i, c) in spectrum.iter().enumerate() {
            out[start + i] += c.re / STFT_SIZE as f32 * window[i];
            window_sum[start + i] += window[i] * window[i];
        }
    }
    for (o, w) in out.iter_mut().zip(&window_sum) {
        if *w > 1e-6 {
            *o /= *w;
        }
    }
    out
}
