//! Speech recognizer abstraction.
//!
//! The pipeline talks to the recognizer through this trait only; the
//! concrete backend (whisper.cpp in production, a mock in tests) is chosen
//! by the model loader.

use crate::defaults;
use crate::error::Result;
use crate::transcript::RecognizedCue;

/// Per-request recognition options.
#[derive(Debug, Clone)]
pub struct RecognizeOptions {
    /// BCP-47-ish language hint; `None` or "auto" lets the model detect.
    pub language: Option<String>,
    /// Whether the backend should attach word-or-segment timestamps.
    pub timestamps: bool,
}

impl Default for RecognizeOptions {
    fn default() -> Self {
        Self {
            language: None,
            timestamps: true,
        }
    }
}

impl RecognizeOptions {
    /// The language hint to pass to the backend, with "auto" mapped to no hint.
    pub fn language_hint(&self) -> Option<&str> {
        match self.language.as_deref() {
            None => None,
            Some(lang) if lang.eq_ignore_ascii_case(defaults::AUTO_LANGUAGE) => None,
            Some(lang) => Some(lang),
        }
    }
}

/// A loaded speech recognition model.
///
/// `recognize` is a blocking call; the manager runs it on a blocking thread.
/// Cue timestamps are local to the given samples, starting at zero. An error
/// must not leave partial results anywhere; the call either returns the full
/// cue list or fails.
pub trait Recognizer: Send + Sync {
    fn recognize(&self, samples: &[f32], options: &RecognizeOptions) -> Result<Vec<RecognizedCue>>;

    /// Identifier of the loaded model ("base", "large-v3", ...).
    fn model_id(&self) -> &str;
}

/// Test support: a scriptable in-memory recognizer. Compiled into the
/// library so integration tests and downstream harnesses can use it.
pub mod mock {
    use super::*;
    use crate::error::MediascribeError;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum Scripted {
        Cues(Vec<RecognizedCue>),
        Failure(String),
    }

    /// Recognizer returning scripted responses, for pipeline and manager
    /// tests. Responses are consumed in order; once the script runs out,
    /// every call returns the default response.
    pub struct MockRecognizer {
        script: Mutex<VecDeque<Scripted>>,
        default_response: Vec<RecognizedCue>,
        calls: AtomicUsize,
        model_id: String,
    }

    impl MockRecognizer {
        pub fn new(model_id: impl Into<String>) -> Self {
            Self {
                script: Mutex::new(VecDeque::new()),
                default_response: Vec::new(),
                calls: AtomicUsize::new(0),
                model_id: model_id.into(),
            }
        }

        /// Queues a scripted cue list for the next unanswered call.
        pub fn push_response(&self, cues: Vec<RecognizedCue>) {
            if let Ok(mut script) = self.script.lock() {
                script.push_back(Scripted::Cues(cues));
            }
        }

        /// Queues a scripted failure for the next unanswered call.
        pub fn push_failure(&self, message: impl Into<String>) {
            if let Ok(mut script) = self.script.lock() {
                script.push_back(Scripted::Failure(message.into()));
            }
        }

        pub fn with_default_response(mut self, cues: Vec<RecognizedCue>) -> Self {
            self.default_response = cues;
            self
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Recognizer for MockRecognizer {
        fn recognize(
            &self,
            _samples: &[f32],
            _options: &RecognizeOptions,
        ) -> Result<Vec<RecognizedCue>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let scripted = self.script.lock().ok().and_then(|mut s| s.pop_front());
            match scripted {
                Some(Scripted::Cues(cues)) => Ok(cues),
                Some(Scripted::Failure(message)) => Err(MediascribeError::Inference { message }),
                None => Ok(self.default_response.clone()),
            }
        }

        fn model_id(&self) -> &str {
            &self.model_id
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockRecognizer;
    use super::*;

    #[test]
    fn language_hint_maps_auto_to_none() {
        let auto = RecognizeOptions {
            language: Some("auto".into()),
            timestamps: true,
        };
        assert_eq!(auto.language_hint(), None);

        let ja = RecognizeOptions {
            language: Some("ja".into()),
            timestamps: true,
        };
        assert_eq!(ja.language_hint(), Some("ja"));

        assert_eq!(RecognizeOptions::default().language_hint(), None);
    }

    #[test]
    fn mock_consumes_script_then_falls_back_to_default() {
        let mock = MockRecognizer::new("base").with_default_response(vec![
            RecognizedCue::new("default", 0.0, 1.0).unwrap(),
        ]);
        mock.push_response(vec![RecognizedCue::new("scripted", 0.0, 1.0).unwrap()]);

        let opts = RecognizeOptions::default();
        let first = mock.recognize(&[], &opts).unwrap();
        assert_eq!(first[0].text, "scripted");
        let second = mock.recognize(&[], &opts).unwrap();
        assert_eq!(second[0].text, "default");
        assert_eq!(mock.call_count(), 2);
    }

    #[test]
    fn mock_scripted_failure_surfaces_as_inference_error() {
        let mock = MockRecognizer::new("base");
        mock.push_failure("decoder crashed");
        let err = mock.recognize(&[], &RecognizeOptions::default()).unwrap_err();
        assert!(err.to_string().contains("decoder crashed"));
    }
}
