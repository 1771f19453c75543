//! Default configuration constants for mediascribe.
//!
//! This module provides shared constants used across different configuration types
//! to ensure consistency and eliminate duplication.

/// Default audio sample rate in Hz.
///
/// 16kHz is the standard for speech recognition and is the rate the
/// upstream decoder normalizes everything to before handing audio over.
pub const SAMPLE_RATE: u32 = 16000;

/// Default VAD frame size in milliseconds.
///
/// The speech-probability oracle is invoked once per frame; 32ms matches
/// the native hop of common frame-level VAD models.
pub const FRAME_MS: u32 = 32;

/// Default speech-probability threshold.
///
/// Frames with probability at or above this are treated as speech. Tuned
/// for media audio where dialogue competes with effects and score.
pub const VAD_THRESHOLD: f32 = 0.5;

/// Default minimum speech duration in milliseconds.
///
/// Speech runs shorter than this are rejected as probability blips.
pub const MIN_SPEECH_MS: u32 = 250;

/// Default silence duration in milliseconds before a speech segment is closed.
///
/// The segment ends at the sample where silence began, not where the
/// hysteresis ran out.
pub const MIN_SILENCE_MS: u32 = 500;

/// Default gap below which adjacent speech intervals are merged, in milliseconds.
pub const GAP_THRESHOLD_MS: u32 = 300;

/// Default maximum segment duration in milliseconds.
///
/// Matches the recognizer's single-pass context window; segments are never
/// allowed to exceed it.
pub const MAX_SEGMENT_MS: u32 = 30_000;

/// Default minimum segment duration in milliseconds. Shorter intervals are dropped.
pub const MIN_SEGMENT_MS: u32 = 250;

/// Default padding in milliseconds added around each interval when extracting
/// audio for recognition, so a tight VAD boundary does not clip a word onset.
pub const PADDING_MS: u32 = 200;

/// Default long-form chunk window in milliseconds (recognizer context window).
pub const CHUNK_WINDOW_MS: u32 = 30_000;

/// Default overlap shared between adjacent long-form chunks, in milliseconds.
pub const CHUNK_OVERLAP_MS: u32 = 5_000;

/// Window after a chunk boundary within which a cue with text identical to the
/// previous cue is treated as a duplicate re-recognition, in seconds.
pub const BOUNDARY_DEDUP_SECS: f64 = 3.0;

/// Cues spanning at least this fraction of the recognizer context window are
/// rejected as runaway repetition.
pub const MAX_WINDOW_RATIO: f64 = 0.97;

/// Minimum viable cue duration in milliseconds. Anything shorter is noise.
pub const MIN_CUE_MS: u32 = 200;

/// Cues with very short text below this duration (milliseconds) are rejected.
pub const SHORT_TEXT_MS: u32 = 300;

/// Character count at or below which a cue's text counts as "very short".
pub const SHORT_TEXT_CHARS: usize = 3;

/// Default model identifier loaded on first use.
pub const DEFAULT_MODEL: &str = "base";

/// Language value that triggers automatic language detection.
pub const AUTO_LANGUAGE: &str = "auto";

/// Default idle timeout before the loaded model is released ("0s" disables).
pub const IDLE_TIMEOUT: &str = "120s";

/// FFT window length (samples) used for sparse BGM probing.
pub const BGM_PROBE_WINDOW: usize = 2048;

/// Interval between BGM probe windows, in milliseconds.
///
/// Probing is sparse by design: classification cost stays sub-second no
/// matter how long the clip is.
pub const BGM_PROBE_INTERVAL_MS: u32 = 5_000;

/// Upper edge of the "low frequency" band used for BGM classification, in Hz.
/// Sustained energy below this with low spectral flatness indicates music.
pub const BGM_LOW_FREQ_CUTOFF_HZ: f32 = 300.0;

/// Low-frequency energy ratio above which audio is classified as light BGM.
pub const BGM_LIGHT_RATIO: f32 = 0.40;

/// Low-frequency energy ratio above which audio is classified as heavy BGM.
pub const BGM_HEAVY_RATIO: f32 = 0.55;

/// Spectral flatness below which content counts as tonal/harmonic.
pub const BGM_FLATNESS_CUTOFF: f32 = 0.30;
