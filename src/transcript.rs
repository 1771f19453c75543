//! Core value types flowing through the pipeline.
//!
//! `SpeechInterval` is sample-indexed and produced by segmentation;
//! `RecognizedCue` is second-indexed and produced by recognition. Both are
//! immutable values: merging or remapping always builds a new value instead
//! of mutating in place.

use serde::Serialize;

/// A contiguous span of audio classified as containing speech.
///
/// Half-open, sample-indexed: `[start_sample, end_sample)` with
/// `end_sample > start_sample`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeechInterval {
    pub start_sample: usize,
    pub end_sample: usize,
}

impl SpeechInterval {
    /// Builds an interval, returning `None` for empty or inverted spans.
    pub fn new(start_sample: usize, end_sample: usize) -> Option<Self> {
        (end_sample > start_sample).then_some(Self {
            start_sample,
            end_sample,
        })
    }

    pub fn len_samples(&self) -> usize {
        self.end_sample - self.start_sample
    }

    pub fn duration_secs(&self, sample_rate: u32) -> f64 {
        self.len_samples() as f64 / sample_rate as f64
    }

    /// Samples between the end of `self` and the start of `next`.
    /// Zero when they touch or overlap.
    pub fn gap_to(&self, next: &SpeechInterval) -> usize {
        next.start_sample.saturating_sub(self.end_sample)
    }

    /// New interval covering both `self` and `other`.
    pub fn merge(&self, other: &SpeechInterval) -> SpeechInterval {
        SpeechInterval {
            start_sample: self.start_sample.min(other.start_sample),
            end_sample: self.end_sample.max(other.end_sample),
        }
    }
}

/// A single timestamped unit of recognized text.
///
/// Timestamps are in seconds. After the pipeline's remapping step they are
/// always absolute (whole-clip) time; no cue leaves the pipeline in
/// segment-local time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecognizedCue {
    pub text: String,
    pub start_seconds: f64,
    pub end_seconds: f64,
}

impl RecognizedCue {
    /// Builds a cue, returning `None` when the duration is not positive.
    /// Cues that violate `end > start` are dropped, never emitted.
    pub fn new(text: impl Into<String>, start_seconds: f64, end_seconds: f64) -> Option<Self> {
        (end_seconds > start_seconds).then(|| Self {
            text: text.into(),
            start_seconds,
            end_seconds,
        })
    }

    pub fn duration(&self) -> f64 {
        self.end_seconds - self.start_seconds
    }

    /// New cue shifted from local to absolute time.
    pub fn offset(&self, by_seconds: f64) -> RecognizedCue {
        RecognizedCue {
            text: self.text.clone(),
            start_seconds: self.start_seconds + by_seconds,
            end_seconds: self.end_seconds + by_seconds,
        }
    }
}

/// Final output of one transcription request: cues in chronological order
/// plus the derived concatenated text.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TranscriptionResult {
    cues: Vec<RecognizedCue>,
}

impl TranscriptionResult {
    pub fn from_cues(cues: Vec<RecognizedCue>) -> Self {
        Self { cues }
    }

    pub fn cues(&self) -> &[RecognizedCue] {
        &self.cues
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cues.len()
    }

    /// Concatenated text of all cues, single-space separated.
    pub fn text(&self) -> String {
        self.cues
            .iter()
            .map(|c| c.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn into_cues(self) -> Vec<RecognizedCue> {
        self.cues
    }
}
