//! Model lifecycle management.
//!
//! One recognizer model is resident at a time. The manager serializes
//! load/swap/unload against concurrent inference without holding any lock
//! across a model load or an inference call: in-flight requests keep their
//! own handle to the model they started with, so a swap or idle release
//! never interrupts them.

use crate::engine::recognizer::{RecognizeOptions, Recognizer};
use crate::error::{MediascribeError, Result};
use crate::transcript::RecognizedCue;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Shared handle to a loaded recognizer. In-flight inference owns a clone,
/// so dropping the manager's copy releases the model only once the last
/// request finishes.
pub type RecognizerHandle = Arc<dyn Recognizer>;

/// Produces a recognizer for a model identifier. Loading is expected to be
/// slow (reading gigabytes of weights); the manager never holds its state
/// lock while this runs.
#[async_trait]
pub trait ModelLoader: Send + Sync {
    async fn load(&self, model_id: &str) -> Result<RecognizerHandle>;
}

/// Snapshot of the manager's state, for status endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ModelState {
    Unloaded { model: String },
    Loading { model: String },
    Loaded { model: String },
}

struct Inner {
    handle: Option<RecognizerHandle>,
    /// Current model identifier. On a failed load this keeps the requested
    /// id, so the next lazy reload retries the model the operator asked for.
    model_id: String,
    loading: bool,
}

pub struct ModelManager {
    loader: Arc<dyn ModelLoader>,
    inner: Mutex<Inner>,
    /// Zero disables idle release.
    idle_timeout: Duration,
    /// Monotonic counter that logically cancels stale idle timers: a timer
    /// fires only if no activity bumped the generation since it was armed.
    idle_generation: AtomicU64,
    /// In-flight inference count; idle release refuses to fire while nonzero.
    active: AtomicUsize,
}

impl ModelManager {
    pub fn new(
        loader: Arc<dyn ModelLoader>,
        default_model: impl Into<String>,
        idle_timeout: Duration,
    ) -> Self {
        Self {
            loader,
            inner: Mutex::new(Inner {
                handle: None,
                model_id: default_model.into(),
                loading: false,
            }),
            idle_timeout,
            idle_generation: AtomicU64::new(0),
            active: AtomicUsize::new(0),
        }
    }

    /// Loads `model_id`, releasing the previously resident model first so
    /// peak memory holds one model, not two. Fails fast with
    /// `ModelLoadInProgress` when another load is underway. On failure the
    /// requested id is retained and no model is resident.
    pub async fn load(self: &Arc<Self>, model_id: &str) -> Result<()> {
        {
            let mut inner = self.inner.lock().await;
            if inner.loading {
                return Err(MediascribeError::ModelLoadInProgress);
            }
            inner.loading = true;
            // Release before loading, not after.
            inner.handle = None;
            inner.model_id = model_id.to_string();
        }
        self.idle_generation.fetch_add(1, Ordering::SeqCst);

        info!(model = model_id, "loading model");
        let loaded = self.loader.load(model_id).await;

        let mut inner = self.inner.lock().await;
        inner.loading = false;
        match loaded {
            Ok(handle) => {
                info!(model = model_id, "model loaded");
                inner.handle = Some(handle);
                drop(inner);
                self.arm_idle_timer();
                Ok(())
            }
            Err(err) => {
                warn!(model = model_id, error = %err, "model load failed");
                Err(err)
            }
        }
    }

    /// Releases the resident model. In-flight inference finishes on its own
    /// handle; new requests trigger a lazy reload.
    pub async fn unload(&self) {
        let mut inner = self.inner.lock().await;
        if inner.handle.take().is_some() {
            info!(model = %inner.model_id, "model released");
        }
        self.idle_generation.fetch_add(1, Ordering::SeqCst);
    }

    pub async fn status(&self) -> ModelState {
        let inner = self.inner.lock().await;
        if inner.loading {
            ModelState::Loading {
                model: inner.model_id.clone(),
            }
        } else if inner.handle.is_some() {
            ModelState::Loaded {
                model: inner.model_id.clone(),
            }
        } else {
            ModelState::Unloaded {
                model: inner.model_id.clone(),
            }
        }
    }

    /// Returns a handle to the resident model, loading it first if it was
    /// never loaded or was idle-released. Fails fast when a load started by
    /// another caller is in progress.
    pub async fn ensure_loaded(self: &Arc<Self>) -> Result<RecognizerHandle> {
        let model_id = {
            let inner = self.inner.lock().await;
            if let Some(handle) = &inner.handle {
                return Ok(Arc::clone(handle));
            }
            if inner.loading {
                return Err(MediascribeError::ModelLoadInProgress);
            }
            inner.model_id.clone()
        };
        debug!(model = %model_id, "lazy model reload");
        self.load(&model_id).await?;

        let inner = self.inner.lock().await;
        inner
            .handle
            .as_ref()
            .map(Arc::clone)
            .ok_or(MediascribeError::ModelLoadInProgress)
    }

    /// Runs one inference on the resident model. The blocking backend call
    /// runs on a blocking thread with its own handle clone; no manager lock
    /// is held while it runs.
    pub async fn recognize(
        self: &Arc<Self>,
        samples: Vec<f32>,
        options: RecognizeOptions,
    ) -> Result<Vec<RecognizedCue>> {
        let handle = self.ensure_loaded().await?;

        self.active.fetch_add(1, Ordering::SeqCst);
        self.idle_generation.fetch_add(1, Ordering::SeqCst);
        let result = tokio::task::spawn_blocking(move || handle.recognize(&samples, &options))
            .await
            .map_err(|err| MediascribeError::Inference {
                message: format!("inference task failed: {err}"),
            })
            .and_then(|inner| inner);
        self.active.fetch_sub(1, Ordering::SeqCst);
        self.arm_idle_timer();
        result
    }

    /// Arms the idle-release timer. The timer fires only if no load, unload
    /// or inference bumped the generation while it slept, and never while an
    /// inference is in flight.
    fn arm_idle_timer(self: &Arc<Self>) {
        if self.idle_timeout.is_zero() {
            return;
        }
        let armed_at = self.idle_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(manager.idle_timeout).await;
            if manager.idle_generation.load(Ordering::SeqCst) != armed_at {
                return;
            }
            if manager.active.load(Ordering::SeqCst) > 0 {
                return;
            }
            let mut inner = manager.inner.lock().await;
            if manager.idle_generation.load(Ordering::SeqCst) == armed_at
                && inner.handle.take().is_some()
            {
                info!(model = %inner.model_id, timeout = ?manager.idle_timeout, "idle timeout, model released");
            }
        });
    }
}
