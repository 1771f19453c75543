//! Interval cleanup between VAD and recognition.
//!
//! Bridges short gaps so one utterance is not split mid-word, then bounds
//! segment length so the recognizer never sees more than its context window,
//! and finally drops fragments too short to carry speech.

use crate::defaults;
use crate::transcript::SpeechInterval;
use tracing::debug;

/// Configuration for segment merging and length bounding.
#[derive(Debug, Clone, Copy)]
pub struct MergeConfig {
    /// Gaps at or below this many milliseconds are bridged.
    pub gap_threshold_ms: u32,
    /// Hard cap on merged segment duration (milliseconds).
    pub max_segment_ms: u32,
    /// Segments shorter than this are dropped (milliseconds).
    pub min_segment_ms: u32,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            gap_threshold_ms: defaults::GAP_THRESHOLD_MS,
            max_segment_ms: defaults::MAX_SEGMENT_MS,
            min_segment_ms: defaults::MIN_SEGMENT_MS,
        }
    }
}

/// Merges adjacent intervals separated by small gaps, then enforces the
/// min/max duration bounds. Single left-to-right pass; a merge is taken only
/// when the combined segment stays within `max_segment_ms`, so a gap small
/// enough to bridge is still left open when bridging would overflow the cap.
///
/// Over-long intervals (possible when the VAD emits one unbroken run) are
/// sliced into exact `max_segment_ms` pieces; a final remainder survives only
/// if it meets `min_segment_ms`.
pub fn merge_intervals(
    intervals: &[SpeechInterval],
    sample_rate: u32,
    config: MergeConfig,
) -> Vec<SpeechInterval> {
    if intervals.is_empty() {
        return Vec::new();
    }

    let rate = sample_rate as usize;
    let gap_max = rate * config.gap_threshold_ms as usize / 1000;
    let seg_max = rate * config.max_segment_ms as usize / 1000;
    let seg_min = rate * config.min_segment_ms as usize / 1000;

    let mut merged: Vec<SpeechInterval> = Vec::with_capacity(intervals.len());
    let mut current = intervals[0];
    for next in &intervals[1..] {
        let combined = current.merge(next);
        if current.gap_to(next) <= gap_max && combined.len_samples() <= seg_max {
            current = combined;
        } else {
            merged.push(current);
            current = *next;
        }
    }
    merged.push(current);

    let mut out = Vec::with_capacity(merged.len());
    for interval in merged {
        if interval.len_samples() > seg_max {
            let mut start = interval.start_sample;
            while start < interval.end_sample {
                let end = (start + seg_max).min(interval.end_sample);
                if end - start >= seg_min
                    && let Some(iv) = SpeechInterval::new(start, end)
                {
                    out.push(iv);
                }
                start = end;
            }
        } else if interval.len_samples() >= seg_min {
            out.push(interval);
        }
    }

    debug!(input = intervals.len(), output = out.len(), "merged speech intervals");
    out
}
