//! Hallucination filtering for recognizer output.
//!
//! Speech recognizers trained on captioned media emit stock phrases over
//! silence and music ("thanks for watching" outros, subtitle credits), and
//! loop on short fragments. This pass removes the known artifacts with a
//! phrase list, structural patterns, and duration heuristics. The pass is
//! idempotent: filtering an already filtered list changes nothing.

use crate::defaults;
use crate::transcript::RecognizedCue;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::debug;

/// Cues consisting only of ellipsis characters.
static ELLIPSIS_ONLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[.…]+\s*$").expect("static pattern compiles"));

/// Cues with no letters or digits at all.
static PUNCT_ONLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\s\p{P}\p{S}]*$").expect("static pattern compiles"));

/// Subtitle attribution lines ("by SomeGroup").
static ATTRIBUTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*by\s+\S+\.?\s*$").expect("static pattern compiles"));

/// Stray one-or-two letter fragments the decoder sheds around music.
static TINY_FRAGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[A-Za-z]{1,2}\s*$").expect("static pattern compiles"));

/// Stock phrases recognizers hallucinate over non-speech audio. Compared
/// lowercased with surrounding whitespace trimmed.
const STOCK_PHRASES: &[&str] = &[
    "ご視聴ありがとうございました",
    "ご視聴ありがとうございました。",
    "ご覧いただきありがとうございます",
    "チャンネル登録お願いします",
    "おやすみなさい",
    "thank you for watching",
    "thank you for watching.",
    "thanks for watching",
    "thanks for watching!",
    "please subscribe",
    "don't forget to like and subscribe",
    "subtitles by the amara.org community",
    "subtitles by amara.org",
    "www.mooji.org",
    "시청해 주셔서 감사합니다",
    "구독과 좋아요 부탁드립니다",
    "谢谢观看",
    "請不吝點讚訂閱轉發打賞支持明鏡與點點欄目",
    "字幕由amara.org社区提供",
];

/// Filter tuning; durations interact with the recognizer context window.
#[derive(Debug, Clone)]
pub struct FilterConfig {
    /// Cues spanning at least this fraction of the recognizer context
    /// window are treated as silence-filling hallucinations.
    pub max_window_ratio: f64,
    /// Recognizer context window length in seconds.
    pub context_window_secs: f64,
    /// Cues shorter than this many milliseconds are dropped.
    pub min_cue_ms: u32,
    /// Very short text below this duration is dropped (milliseconds).
    pub short_text_ms: u32,
    /// "Very short text" means at most this many characters.
    pub short_text_chars: usize,
    /// Deployment-specific phrases to reject in addition to the stock list.
    pub extra_phrases: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            max_window_ratio: defaults::MAX_WINDOW_RATIO,
            context_window_secs: defaults::CHUNK_WINDOW_MS as f64 / 1000.0,
            min_cue_ms: defaults::MIN_CUE_MS,
            short_text_ms: defaults::SHORT_TEXT_MS,
            short_text_chars: defaults::SHORT_TEXT_CHARS,
            extra_phrases: Vec::new(),
        }
    }
}

pub struct HallucinationFilter {
    config: FilterConfig,
    phrases: HashSet<String>,
}

impl HallucinationFilter {
    pub fn new(config: FilterConfig) -> Self {
        let mut phrases: HashSet<String> =
            STOCK_PHRASES.iter().map(|p| p.to_lowercase()).collect();
        phrases.extend(config.extra_phrases.iter().map(|p| p.trim().to_lowercase()));
        Self { config, phrases }
    }

    /// Whether a single cue is a recognizable artifact.
    pub fn is_spurious(&self, cue: &RecognizedCue) -> bool {
        let text = cue.text.trim();
        if text.is_empty() {
            return true;
        }
        if self.phrases.contains(&text.to_lowercase()) {
            return true;
        }
        if ELLIPSIS_ONLY.is_match(text)
            || PUNCT_ONLY.is_match(text)
            || ATTRIBUTION.is_match(text)
            || TINY_FRAGMENT.is_match(text)
        {
            return true;
        }

        let duration = cue.duration();
        // A cue filling nearly the whole context window is the recognizer
        // painting over silence or music with one phrase.
        if duration >= self.config.max_window_ratio * self.config.context_window_secs {
            return true;
        }
        if duration < self.config.min_cue_ms as f64 / 1000.0 {
            return true;
        }
        if text.chars().count() <= self.config.short_text_chars
            && duration < self.config.short_text_ms as f64 / 1000.0
        {
            return true;
        }
        false
    }

    /// Removes spurious cues and collapses consecutive byte-identical
    /// repeats, keeping the first occurrence of each run.
    pub fn filter(&self, cues: Vec<RecognizedCue>) -> Vec<RecognizedCue> {
        let before = cues.len();
        let mut out: Vec<RecognizedCue> = Vec::with_capacity(cues.len());
        for cue in cues {
            if self.is_spurious(&cue) {
                debug!(text = %cue.text, duration = cue.duration(), "dropping spurious cue");
                continue;
            }
            if let Some(prev) = out.last()
                && prev.text == cue.text
            {
                debug!(text = %cue.text, "collapsing repeated cue");
                continue;
            }
            out.push(cue);
        }
        if out.len() != before {
            debug!(before, after = out.len(), "hallucination filter applied");
        }
        out
    }
}

impl Default for HallucinationFilter {
    fn default() -> Self {
        Self::new(FilterConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cue(text: &str, start: f64, end: f64) -> RecognizedCue {
        RecognizedCue::new(text, start, end).unwrap()
    }

    fn filter() -> HallucinationFilter {
        HallucinationFilter::default()
    }

    #[test]
    fn stock_outro_phrase_is_rejected_regardless_of_duration() {
        let f = filter();
        assert!(f.is_spurious(&cue("ご視聴ありがとうございました", 0.0, 2.0)));
        assert!(f.is_spurious(&cue("ご視聴ありがとうございました。", 5.0, 8.0)));
        assert!(f.is_spurious(&cue("Thank you for watching.", 0.0, 2.0)));
    }

    #[test]
    fn phrase_match_is_case_insensitive() {
        assert!(filter().is_spurious(&cue("THANKS FOR WATCHING", 0.0, 2.0)));
    }

    #[test]
    fn subtitle_credit_is_rejected() {
        let f = filter();
        assert!(f.is_spurious(&cue("Subtitles by the Amara.org community", 0.0, 4.0)));
        assert!(f.is_spurious(&cue("by SubGroup.", 0.0, 2.0)));
    }

    #[test]
    fn ellipsis_and_punctuation_only_cues_are_rejected() {
        let f = filter();
        assert!(f.is_spurious(&cue("...", 0.0, 1.0)));
        assert!(f.is_spurious(&cue("…", 0.0, 1.0)));
        assert!(f.is_spurious(&cue("?!—", 0.0, 1.0)));
        assert!(f.is_spurious(&cue("   ", 0.0, 1.0)));
    }

    #[test]
    fn window_filling_cue_is_rejected() {
        // 29.5s of a 30s window exceeds the 97% ratio.
        assert!(filter().is_spurious(&cue("some ordinary sentence here", 0.0, 29.5)));
    }

    #[test]
    fn sub_minimum_duration_cue_is_rejected() {
        assert!(filter().is_spurious(&cue("hello there", 0.0, 0.1)));
    }

    #[test]
    fn tiny_text_with_tiny_duration_is_rejected() {
        assert!(filter().is_spurious(&cue("うん", 0.0, 0.25)));
    }

    #[test]
    fn one_or_two_letter_fragment_is_rejected() {
        let f = filter();
        assert!(f.is_spurious(&cue("a", 0.0, 1.0)));
        assert!(f.is_spurious(&cue("Hm", 0.0, 1.0)));
    }

    #[test]
    fn tiny_text_with_real_duration_is_kept() {
        assert!(!filter().is_spurious(&cue("yes", 0.0, 0.8)));
    }

    #[test]
    fn ordinary_cue_is_kept() {
        assert!(!filter().is_spurious(&cue("the meeting starts at noon", 0.0, 2.5)));
    }

    #[test]
    fn extra_phrases_from_config_are_rejected() {
        let f = HallucinationFilter::new(FilterConfig {
            extra_phrases: vec!["Custom Station Ident".into()],
            ..FilterConfig::default()
        });
        assert!(f.is_spurious(&cue("custom station ident", 0.0, 2.0)));
    }

    #[test]
    fn consecutive_identical_cues_collapse_to_first() {
        let cues = vec![
            cue("looped phrase", 0.0, 1.0),
            cue("looped phrase", 1.0, 2.0),
            cue("looped phrase", 2.0, 3.0),
            cue("something else", 3.0, 4.0),
        ];
        let out = filter().filter(cues);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].start_seconds, 0.0);
        assert_eq!(out[1].text, "something else");
    }

    #[test]
    fn non_consecutive_repeats_are_kept() {
        let cues = vec![
            cue("okay", 0.0, 1.0),
            cue("next point", 1.0, 2.0),
            cue("okay", 2.0, 3.0),
        ];
        assert_eq!(filter().filter(cues).len(), 3);
    }

    #[test]
    fn filter_is_idempotent() {
        let cues = vec![
            cue("looped", 0.0, 1.0),
            cue("looped", 1.0, 2.0),
            cue("...", 2.0, 3.0),
            cue("real content survives", 3.0, 5.0),
        ];
        let f = filter();
        let once = f.filter(cues);
        let twice = f.filter(once.clone());
        assert_eq!(once, twice);
    }
}
