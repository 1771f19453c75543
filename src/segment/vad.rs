//! Voice Activity Detection (VAD) segmenter.
//!
//! Slides a fixed-size, non-overlapping frame window across the signal and
//! asks an external speech-probability oracle for each frame. A two-state
//! machine with a silence hysteresis turns the per-frame probabilities into
//! sample-indexed speech intervals.

use crate::audio::AudioSignal;
use crate::defaults;
use crate::transcript::SpeechInterval;
use tracing::debug;

/// Frame-level speech-probability oracle.
///
/// Given one fixed-size frame of normalized samples, returns the probability
/// in [0, 1] that the frame contains speech. Implementations wrapping neural
/// estimators should use interior mutability for any recurrent state.
pub trait SpeechProbe: Send + Sync {
    fn probability(&self, frame: &[f32]) -> f32;
}

/// Probe backed by a plain function, for tests and simple energy heuristics.
pub struct FnProbe<F: Fn(&[f32]) -> f32 + Send + Sync>(pub F);

impl<F: Fn(&[f32]) -> f32 + Send + Sync> SpeechProbe for FnProbe<F> {
    fn probability(&self, frame: &[f32]) -> f32 {
        (self.0)(frame)
    }
}

/// Configuration for the VAD segmenter.
#[derive(Debug, Clone, Copy)]
pub struct VadConfig {
    /// Probability at or above which a frame counts as speech.
    pub threshold: f32,
    /// Frame size in milliseconds (one oracle call per frame).
    pub frame_ms: u32,
    /// Minimum duration of a speech run before it is emitted (milliseconds).
    pub min_speech_ms: u32,
    /// Sustained silence required before a speech segment is closed (milliseconds).
    pub min_silence_ms: u32,
}

impl Default for VadConfig {
    fn default() -> Self {
        Self {
            threshold: defaults::VAD_THRESHOLD,
            frame_ms: defaults::FRAME_MS,
            min_speech_ms: defaults::MIN_SPEECH_MS,
            min_silence_ms: defaults::MIN_SILENCE_MS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VadState {
    Silence,
    Speech,
}

/// Frame-driven speech segmenter.
pub struct VadSegmenter {
    config: VadConfig,
}

impl VadSegmenter {
    pub fn new(config: VadConfig) -> Self {
        Self { config }
    }

    /// Produces an ordered, non-overlapping list of speech intervals.
    ///
    /// A signal shorter than one frame produces no segments; a single
    /// unbroken speech region produces exactly one. A segment still open at
    /// the end of the signal is closed at the signal end with no
    /// trailing-silence requirement.
    pub fn segment(&self, signal: &AudioSignal, probe: &dyn SpeechProbe) -> Vec<SpeechInterval> {
        let rate = signal.sample_rate() as usize;
        let frame_len = rate * self.config.frame_ms as usize / 1000;
        if frame_len == 0 || signal.len() < frame_len {
            return Vec::new();
        }

        let min_speech = rate * self.config.min_speech_ms as usize / 1000;
        let min_silence = rate * self.config.min_silence_ms as usize / 1000;
        let samples = signal.samples();

        let mut intervals = Vec::new();
        let mut state = VadState::Silence;
        let mut speech_start = 0usize;
        // Sample index where the current silence run began; the segment
        // closes here, not at the frame where the hysteresis ran out.
        let mut silence_start = 0usize;
        let mut silence_samples = 0usize;

        let mut frame_start = 0usize;
        while frame_start + frame_len <= samples.len() {
            let frame = &samples[frame_start..frame_start + frame_len];
            let is_speech = probe.probability(frame) >= self.config.threshold;

            match state {
                VadState::Silence => {
                    if is_speech {
                        state = VadState::Speech;
                        speech_start = frame_start;
                        silence_samples = 0;
                    }
                }
                VadState::Speech => {
                    if is_speech {
                        silence_samples = 0;
                    } else {
                        if silence_samples == 0 {
                            silence_start = frame_start;
                        }
                        silence_samples += frame_len;
                        if silence_samples >= min_silence {
                            if silence_start - speech_start >= min_speech
                                && let Some(iv) = SpeechInterval::new(speech_start, silence_start)
                            {
                                intervals.push(iv);
                            }
                            state = VadState::Silence;
                            silence_samples = 0;
                        }
                    }
                }
            }

            frame_start += frame_len;
        }

        // Signal ended while still in speech: close at the signal end.
        if state == VadState::Speech {
            let end = samples.len();
            if end - speech_start >= min_speech
                && let Some(iv) = SpeechInterval::new(speech_start, end)
            {
                intervals.push(iv);
            }
        }

        debug!(
            intervals = intervals.len(),
            duration_secs = signal.duration_secs(),
            "vad segmentation complete"
        );
        intervals
    }
}
