//! whisper.cpp backend, behind the `whisper` feature.
//!
//! Wraps `whisper-rs` as a `Recognizer` and provides the production
//! `ModelLoader` that maps model identifiers to ggml weight files on disk.

use crate::engine::manager::{ModelLoader, RecognizerHandle};
use crate::engine::recognizer::{RecognizeOptions, Recognizer};
use crate::error::{MediascribeError, Result};
use crate::transcript::RecognizedCue;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Once};
use tracing::{debug, info};
use whisper_rs::{
    FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters, install_logging_hooks,
};

static LOGGING_HOOKS_INSTALLED: Once = Once::new();

/// A resident whisper.cpp model. The context sits behind a mutex so the
/// recognizer is shareable across blocking inference threads.
pub struct WhisperRecognizer {
    context: std::sync::Mutex<WhisperContext>,
    model_id: String,
}

impl WhisperRecognizer {
    /// Loads ggml weights from `path`. Blocking; call from a blocking thread.
    pub fn from_file(path: &Path, model_id: impl Into<String>) -> Result<Self> {
        // Route whisper.cpp's stderr chatter through tracing, once.
        LOGGING_HOOKS_INSTALLED.call_once(|| {
            install_logging_hooks();
        });

        let model_id = model_id.into();
        let path_str = path.to_string_lossy();
        info!(model = %model_id, path = %path_str, "loading whisper weights");
        let context =
            WhisperContext::new_with_params(&path_str, WhisperContextParameters::default())
                .map_err(|err| MediascribeError::ModelLoad {
                    model: model_id.clone(),
                    message: err.to_string(),
                })?;
        Ok(Self {
            context: std::sync::Mutex::new(context),
            model_id,
        })
    }
}

impl Recognizer for WhisperRecognizer {
    fn recognize(&self, samples: &[f32], options: &RecognizeOptions) -> Result<Vec<RecognizedCue>> {
        let context = self
            .context
            .lock()
            .map_err(|err| MediascribeError::Inference {
                message: format!("context lock poisoned: {err}"),
            })?;
        let mut state = context
            .create_state()
            .map_err(|err| MediascribeError::Inference {
                message: format!("create state: {err}"),
            })?;

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_language(options.language_hint());
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);
        params.set_token_timestamps(options.timestamps);

        state
            .full(params, samples)
            .map_err(|err| MediascribeError::Inference {
                message: format!("decode: {err}"),
            })?;

        let mut cues = Vec::new();
        for segment in state.as_iter() {
            let text = segment.to_string();
            let text = text.trim();
            if text.is_empty() {
                continue;
            }
            // whisper timestamps are in centiseconds.
            let start = segment.start_timestamp() as f64 / 100.0;
            let end = segment.end_timestamp() as f64 / 100.0;
            if let Some(cue) = RecognizedCue::new(text, start, end) {
                cues.push(cue);
            }
        }
        debug!(cues = cues.len(), "whisper decode complete");
        Ok(cues)
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

/// Loads whisper models from a directory of `ggml-{id}.bin` files.
pub struct WhisperLoader {
    model_dir: PathBuf,
}

impl WhisperLoader {
    pub fn new(model_dir: impl Into<PathBuf>) -> Self {
        Self {
            model_dir: model_dir.into(),
        }
    }

    fn model_path(&self, model_id: &str) -> PathBuf {
        self.model_dir.join(format!("ggml-{model_id}.bin"))
    }
}

#[async_trait]
impl ModelLoader for WhisperLoader {
    async fn load(&self, model_id: &str) -> Result<RecognizerHandle> {
        let path = self.model_path(model_id);
        if !path.exists() {
            return Err(MediascribeError::ModelNotFound {
                path: path.to_string_lossy().into_owned(),
            });
        }
        let model_id = model_id.to_string();
        let recognizer = tokio::task::spawn_blocking(move || {
            WhisperRecognizer::from_file(&path, model_id)
        })
        .await
        .map_err(|err| MediascribeError::Other(format!("model load task failed: {err}")))??;
        Ok(Arc::new(recognizer) as RecognizerHandle)
    }
}
