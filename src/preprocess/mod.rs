//! Detection-path preprocessing.
//!
//! Everything in this module produces audio consumed by the VAD only. The
//! recognizer always receives the untouched original signal; filtering here
//! exists to keep background music from masking speech onsets during
//! detection.

pub mod bgm;
pub mod filters;
pub mod separation;

pub use bgm::{BgmClass, BgmClassifier, BgmConfig, DetectionPlan};
pub use separation::{VocalSeparator, separate_or_fallback};
