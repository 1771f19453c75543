//! Optional vocal separation in front of detection.
//!
//! A pluggable seam for an external source-separation model (Demucs or
//! similar). Separated audio feeds segmentation only; the recognizer still
//! receives the original mix. Separation failure is never fatal to a
//! request.

use crate::audio::AudioSignal;
use crate::error::Result;
use tracing::warn;

/// Extracts the vocal stem from a mixed signal.
pub trait VocalSeparator: Send + Sync {
    fn separate(&self, signal: &AudioSignal) -> Result<AudioSignal>;
}

/// Runs the separator, falling back to the unmodified input when it fails.
pub fn separate_or_fallback(separator: &dyn VocalSeparator, signal: &AudioSignal) -> AudioSignal {
    match separator.separate(signal) {
        Ok(vocals) => vocals,
        Err(err) => {
            warn!(error = %err, "vocal separation failed, using original audio for detection");
            signal.clone()
        }
    }
}


#[cfg(test)]
mod tests {
    use super::mock::MockSeparator;
    use super::*;

    #[test]
    fn successful_separation_replaces_detection_audio() {
        let signal = AudioSignal::new(vec![0.8; 1000], 16000);
        let out = separate_or_fallback(&MockSeparator { fail: false }, &signal);
        assert!((out.samples()[0] - 0.4).abs() < 1e-6);
    }

    #[test]
    fn failed_separation_falls_back_to_original() {
        let signal = AudioSignal::new(vec![0.8; 1000], 16000);
        let out = separate_or_fallback(&MockSeparator { fail: true }, &signal);
        assert_eq!(out, signal);
    }
}
