//! Audio sample buffer types and helpers.

pub mod signal;

pub use signal::{AudioSignal, calculate_rms};
