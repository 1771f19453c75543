//! Voice-activity segmentation: frame-level detection plus interval cleanup.

pub mod merge;
pub mod vad;

pub use merge::{MergeConfig, merge_intervals};
pub use vad::{FnProbe, SpeechProbe, VadConfig, VadSegmenter};
