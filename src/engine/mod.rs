//! Recognition engine: the recognizer abstraction and model lifecycle.

pub mod manager;
pub mod recognizer;
#[cfg(feature = "whisper")]
pub mod whisper;

pub use manager::{ModelLoader, ModelManager, ModelState, RecognizerHandle};
pub use recognizer::{RecognizeOptions, Recognizer};
#[cfg(feature = "whisper")]
pub use whisper::{WhisperLoader, WhisperRecognizer};
