//! Normalized audio signal buffer.
//!
//! The upstream decoder hands this core a mono f32 sample array at a fixed
//! sample rate; this module owns that contract. Signals are never mutated in
//! place across pipeline stages; filtered copies are distinct values.

use crate::transcript::SpeechInterval;

/// An immutable, normalized audio buffer (mono, fixed sample rate,
/// amplitudes in [-1, 1]).
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSignal {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl AudioSignal {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Extracts an interval with symmetric padding, clamped to the signal
    /// bounds. Returns the padded copy and the actual start sample of the
    /// extract, which the caller needs to remap cue timestamps.
    pub fn extract_padded(&self, interval: SpeechInterval, padding_ms: u32) -> (AudioSignal, usize) {
        let pad = (self.sample_rate as usize * padding_ms as usize) / 1000;
        let start = interval.start_sample.saturating_sub(pad);
        let end = (interval.end_sample + pad).min(self.samples.len());
        let extract = AudioSignal::new(self.samples[start..end].to_vec(), self.sample_rate);
        (extract, start)
    }

    /// Extracts a raw sample range, clamped to the signal bounds.
    pub fn slice(&self, start_sample: usize, end_sample: usize) -> AudioSignal {
        let start = start_sample.min(self.samples.len());
        let end = end_sample.min(self.samples.len());
        AudioSignal::new(self.samples[start..end].to_vec(), self.sample_rate)
    }
}

/// Root Mean Square of a sample slice. 0.0 for silence, ~0.707 for a
/// full-scale sine wave.
pub fn calculate_rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    ((sum_squares / samples.len() as f64).sqrt()) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(len: usize, amplitude: f32) -> Vec<f32> {
        (0..len)
            .map(|i| amplitude * (i as f32 * 0.3).sin())
            .collect()
    }

    #[test]
    fn rms_of_silence_is_zero() {
        assert_eq!(calculate_rms(&vec![0.0; 1000]), 0.0);
    }

    #[test]
    fn rms_of_empty_is_zero() {
        assert_eq!(calculate_rms(&[]), 0.0);
    }

    #[test]
    fn rms_of_full_scale_square_is_one() {
        let square: Vec<f32> = (0..1000).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        assert!((calculate_rms(&square) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn duration_matches_sample_count() {
        let signal = AudioSignal::new(vec![0.0; 16000 * 3], 16000);
        assert_eq!(signal.duration_secs(), 3.0);
    }

    #[test]
    fn extract_padded_clamps_to_bounds() {
        let signal = AudioSignal::new(tone(16000, 0.5), 16000);
        // 200ms padding = 3200 samples; interval starts at 1000 so the left
        // pad clamps to 0.
        let interval = SpeechInterval::new(1000, 15000).unwrap();
        let (extract, start) = signal.extract_padded(interval, 200);
        assert_eq!(start, 0);
        assert_eq!(extract.len(), 16000);
    }

    #[test]
    fn extract_padded_interior_interval() {
        let signal = AudioSignal::new(tone(16000 * 10, 0.5), 16000);
        let interval = SpeechInterval::new(32000, 48000).unwrap();
        let (extract, start) = signal.extract_padded(interval, 200);
        assert_eq!(start, 32000 - 3200);
        assert_eq!(extract.len(), 16000 + 2 * 3200);
    }

    #[test]
    fn extract_is_a_copy_of_the_original() {
        let signal = AudioSignal::new(tone(16000, 0.5), 16000);
        let interval = SpeechInterval::new(100, 200).unwrap();
        let (extract, start) = signal.extract_padded(interval, 0);
        assert_eq!(start, 100);
        assert_eq!(extract.samples(), &signal.samples()[100..200]);
    }

    #[test]
    fn slice_clamps_past_end() {
        let signal = AudioSignal::new(tone(100, 0.5), 16000);
        let sliced = signal.slice(50, 500);
        assert_eq!(sliced.len(), 50);
    }
}
