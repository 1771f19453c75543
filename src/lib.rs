//! mediascribe - transcription core for long-form media audio
//!
//! Speech-interval detection, BGM-adaptive preprocessing, long-form
//! chunking with overlap stitching, hallucination filtering, and a
//! concurrency-safe model lifecycle, assembled into one async pipeline.
//! Decoding media containers into normalized samples and serving the
//! result over a protocol are left to the embedding application.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod audio;
pub mod chunk;
pub mod config;
pub mod defaults;
pub mod engine;
pub mod error;
pub mod filter;
pub mod pipeline;
pub mod preprocess;
pub mod segment;
pub mod transcript;

// Core value types
pub use transcript::{RecognizedCue, SpeechInterval, TranscriptionResult};

// Audio buffers
pub use audio::{AudioSignal, calculate_rms};

// Detection
pub use preprocess::{BgmClass, BgmClassifier, VocalSeparator};
pub use segment::{SpeechProbe, VadConfig, VadSegmenter};

// Recognition and lifecycle
pub use engine::{ModelLoader, ModelManager, ModelState, RecognizeOptions, Recognizer};
#[cfg(feature = "whisper")]
pub use engine::{WhisperLoader, WhisperRecognizer};

// Orchestration
pub use pipeline::{Pipeline, RequestOptions, TranscribeMode};

// Filtering
pub use filter::HallucinationFilter;

// Error handling
pub use error::{MediascribeError, Result};

// Config
pub use config::Config;
