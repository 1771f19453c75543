//! Whole-audio chunking with overlap deduplication.
//!
//! For media longer than the recognizer's context window the clip is walked
//! in fixed windows with a fixed overlap, each chunk is transcribed
//! independently, and the stitcher resolves the duplicated cues the overlap
//! produces.

use crate::defaults;
use crate::transcript::RecognizedCue;
use tracing::debug;

/// Chunk planning parameters.
#[derive(Debug, Clone, Copy)]
pub struct ChunkConfig {
    /// Window size in milliseconds.
    pub window_ms: u32,
    /// Overlap carried into the next window, in milliseconds.
    pub overlap_ms: u32,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            window_ms: defaults::CHUNK_WINDOW_MS,
            overlap_ms: defaults::CHUNK_OVERLAP_MS,
        }
    }
}

/// One planned chunk, half-open in samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkPlan {
    pub start_sample: usize,
    pub end_sample: usize,
}

impl ChunkPlan {
    pub fn start_seconds(&self, sample_rate: u32) -> f64 {
        self.start_sample as f64 / sample_rate as f64
    }
}

/// Plans the chunk windows for a clip of `len` samples.
///
/// Windows advance by `window - overlap`; the final window is clipped to the
/// clip end. Audio shorter than one window yields a single chunk covering
/// the whole clip. An overlap at or above the window size would stall the
/// walk, so it is clamped to half the window.
pub fn plan_chunks(len: usize, sample_rate: u32, config: ChunkConfig) -> Vec<ChunkPlan> {
    if len == 0 {
        return Vec::new();
    }
    let rate = sample_rate as usize;
    let window = (rate * config.window_ms as usize / 1000).max(1);
    let mut overlap = rate * config.overlap_ms as usize / 1000;
    if overlap >= window {
        overlap = window / 2;
    }
    let advance = window - overlap;

    let mut chunks = Vec::new();
    let mut start = 0usize;
    loop {
        let end = (start + window).min(len);
        chunks.push(ChunkPlan {
            start_sample: start,
            end_sample: end,
        });
        if end == len {
            break;
        }
        start += advance;
    }
    debug!(chunks = chunks.len(), len, "planned chunk windows");
    chunks
}

/// Stitches per-chunk cues into a single deduplicated timeline.
///
/// Chunks must be absorbed in order. Cues arrive in chunk-local time and are
/// remapped to absolute time here. Two dedup rules run against the already
/// accepted timeline: a cue starting before the last accepted cue's end is
/// dropped as overlap re-recognition, and a cue whose text exactly matches
/// the previous accepted cue and starts within the boundary window of it is
/// dropped as a boundary duplicate.
pub struct ChunkStitcher {
    boundary_window_secs: f64,
    last_end: f64,
    prev_text: Option<String>,
    cues: Vec<RecognizedCue>,
}

impl ChunkStitcher {
    pub fn new(boundary_window_secs: f64) -> Self {
        Self {
            boundary_window_secs,
            last_end: 0.0,
            prev_text: None,
            cues: Vec::new(),
        }
    }

    /// Absorbs one chunk's cues, remapping from chunk-local to absolute time.
    pub fn absorb(&mut self, chunk_start_secs: f64, cues: Vec<RecognizedCue>) {
        for cue in cues {
            let cue = cue.offset(chunk_start_secs);
            if cue.start_seconds < self.last_end {
                debug!(text = %cue.text, start = cue.start_seconds, "dropping overlap cue");
                continue;
            }
            if self.is_boundary_duplicate(&cue) {
                debug!(text = %cue.text, "dropping boundary duplicate");
                continue;
            }
            self.last_end = cue.end_seconds;
            self.prev_text = Some(cue.text.clone());
            self.cues.push(cue);
        }
    }

    /// Same text as the previous accepted cue, starting within the boundary
    /// window of its end. Exact string match only; fuzzy matching is a
    /// possible refinement but exact repeats are what chunk overlap actually
    /// produces.
    fn is_boundary_duplicate(&self, cue: &RecognizedCue) -> bool {
        match &self.prev_text {
            Some(prev) => {
                *prev == cue.text
                    && cue.start_seconds - self.last_end <= self.boundary_window_secs
            }
            None => false,
        }
    }

    pub fn finish(self) -> Vec<RecognizedCue> {
        self.cues
    }
}

impl Default for ChunkStitcher {
    fn default() -> Self {
        Self::new(defaults::BOUNDARY_DEDUP_SECS)
    }
}
