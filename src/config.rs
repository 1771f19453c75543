//! Pipeline configuration.
//!
//! Loaded from TOML; every field has a default so a missing file or a
//! partial file is fine. Environment variables override the model section
//! for containerized deployments.

use crate::chunk::ChunkConfig;
use crate::defaults;
use crate::error::{MediascribeError, Result};
use crate::filter::FilterConfig;
use crate::preprocess::bgm::BgmConfig;
use crate::segment::{MergeConfig, VadConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub segmentation: SegmentationConfig,
    pub merging: MergingConfig,
    pub bgm: BgmSection,
    pub chunking: ChunkingConfig,
    pub filter: FilterSection,
    pub model: ModelConfig,
}

/// VAD segmentation configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SegmentationConfig {
    pub threshold: f32,
    pub frame_ms: u32,
    pub min_speech_ms: u32,
    pub min_silence_ms: u32,
    /// Padding around each interval when extracting recognition audio.
    pub padding_ms: u32,
}

/// Interval merging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MergingConfig {
    pub gap_threshold_ms: u32,
    pub max_segment_ms: u32,
    pub min_segment_ms: u32,
}

/// Background-music classification configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BgmSection {
    pub enabled: bool,
    pub probe_interval_ms: u32,
    pub light_ratio: f32,
    pub heavy_ratio: f32,
}

/// Long-form chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChunkingConfig {
    pub window_ms: u32,
    pub overlap_ms: u32,
    pub boundary_dedup_secs: f64,
}

/// Hallucination filter configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FilterSection {
    pub max_window_ratio: f64,
    pub min_cue_ms: u32,
    pub short_text_ms: u32,
    pub short_text_chars: usize,
    pub extra_phrases: Vec<String>,
}

/// Model lifecycle configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModelConfig {
    pub model: String,
    pub language: String,
    /// Humantime duration string; "0s" disables idle release.
    pub idle_timeout: String,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            threshold: defaults::VAD_THRESHOLD,
            frame_ms: defaults::FRAME_MS,
            min_speech_ms: defaults::MIN_SPEECH_MS,
            min_silence_ms: defaults::MIN_SILENCE_MS,
            padding_ms: defaults::PADDING_MS,
        }
    }
}

impl Default for MergingConfig {
    fn default() -> Self {
        Self {
            gap_threshold_ms: defaults::GAP_THRESHOLD_MS,
            max_segment_ms: defaults::MAX_SEGMENT_MS,
            min_segment_ms: defaults::MIN_SEGMENT_MS,
        }
    }
}

impl Default for BgmSection {
    fn default() -> Self {
        Self {
            enabled: true,
            probe_interval_ms: defaults::BGM_PROBE_INTERVAL_MS,
            light_ratio: defaults::BGM_LIGHT_RATIO,
            heavy_ratio: defaults::BGM_HEAVY_RATIO,
        }
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            window_ms: defaults::CHUNK_WINDOW_MS,
            overlap_ms: defaults::CHUNK_OVERLAP_MS,
            boundary_dedup_secs: defaults::BOUNDARY_DEDUP_SECS,
        }
    }
}

impl Default for FilterSection {
    fn default() -> Self {
        Self {
            max_window_ratio: defaults::MAX_WINDOW_RATIO,
            min_cue_ms: defaults::MIN_CUE_MS,
            short_text_ms: defaults::SHORT_TEXT_MS,
            short_text_chars: defaults::SHORT_TEXT_CHARS,
            extra_phrases: Vec::new(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model: defaults::DEFAULT_MODEL.to_string(),
            language: defaults::AUTO_LANGUAGE.to_string(),
            idle_timeout: defaults::IDLE_TIMEOUT.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file, or return defaults if the file does
    /// not exist. Invalid TOML is still an error.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(e) => {
                if e.downcast_ref::<std::io::Error>()
                    .map(|io_err| io_err.kind() == std::io::ErrorKind::NotFound)
                    .unwrap_or(false)
                {
                    Ok(Self::default())
                } else {
                    Err(e)
                }
            }
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - MEDIASCRIBE_MODEL → model.model
    /// - MEDIASCRIBE_LANGUAGE → model.language
    /// - MEDIASCRIBE_IDLE_TIMEOUT → model.idle_timeout
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(model) = std::env::var("MEDIASCRIBE_MODEL")
            && !model.is_empty()
        {
            self.model.model = model;
        }

        if let Ok(language) = std::env::var("MEDIASCRIBE_LANGUAGE")
            && !language.is_empty()
        {
            self.model.language = language;
        }

        if let Ok(idle) = std::env::var("MEDIASCRIBE_IDLE_TIMEOUT")
            && !idle.is_empty()
        {
            self.model.idle_timeout = idle;
        }

        self
    }

    pub fn vad_config(&self) -> VadConfig {
        VadConfig {
            threshold: self.segmentation.threshold,
            frame_ms: self.segmentation.frame_ms,
            min_speech_ms: self.segmentation.min_speech_ms,
            min_silence_ms: self.segmentation.min_silence_ms,
        }
    }

    pub fn merge_config(&self) -> MergeConfig {
        MergeConfig {
            gap_threshold_ms: self.merging.gap_threshold_ms,
            max_segment_ms: self.merging.max_segment_ms,
            min_segment_ms: self.merging.min_segment_ms,
        }
    }

    pub fn bgm_config(&self) -> BgmConfig {
        BgmConfig {
            probe_interval_ms: self.bgm.probe_interval_ms,
            light_ratio: self.bgm.light_ratio,
            heavy_ratio: self.bgm.heavy_ratio,
            ..BgmConfig::default()
        }
    }

    pub fn chunk_config(&self) -> ChunkConfig {
        ChunkConfig {
            window_ms: self.chunking.window_ms,
            overlap_ms: self.chunking.overlap_ms,
        }
    }

    pub fn filter_config(&self) -> FilterConfig {
        FilterConfig {
            max_window_ratio: self.filter.max_window_ratio,
            context_window_secs: self.chunking.window_ms as f64 / 1000.0,
            min_cue_ms: self.filter.min_cue_ms,
            short_text_ms: self.filter.short_text_ms,
            short_text_chars: self.filter.short_text_chars,
            extra_phrases: self.filter.extra_phrases.clone(),
        }
    }
}

impl ModelConfig {
    /// Parses the idle timeout. `Duration::ZERO` disables idle release.
    pub fn idle_timeout(&self) -> Result<Duration> {
        if self.idle_timeout.trim() == "0" {
            return Ok(Duration::ZERO);
        }
        humantime::parse_duration(self.idle_timeout.trim()).map_err(|e| {
            MediascribeError::ConfigInvalidValue {
                key: "model.idle_timeout".to_string(),
                message: format!("expected a duration like \"120s\": {e}"),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    // Env overrides mutate process state; serialize those tests.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn default_config_has_expected_values() {
        let config = Config::default();
        assert_eq!(config.model.model, "base");
        assert_eq!(config.model.language, "auto");
        assert_eq!(config.segmentation.threshold, 0.5);
        assert_eq!(config.chunking.window_ms, 30_000);
        assert!(config.bgm.enabled);
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_fields() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[model]\nmodel = \"large-v3\"").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.model.model, "large-v3");
        assert_eq!(config.model.language, "auto");
        assert_eq!(config.segmentation.min_silence_ms, 500);
    }

    #[test]
    fn full_file_round_trips() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[segmentation]
threshold = 0.6
min_silence_ms = 700

[chunking]
window_ms = 20000
overlap_ms = 4000

[filter]
extra_phrases = ["station ident"]

[model]
model = "small"
language = "ja"
idle_timeout = "5m"
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.segmentation.threshold, 0.6);
        assert_eq!(config.chunking.window_ms, 20_000);
        assert_eq!(config.filter.extra_phrases, vec!["station ident"]);
        assert_eq!(config.model.language, "ja");
        assert_eq!(
            config.model.idle_timeout().unwrap(),
            Duration::from_secs(300)
        );
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "this is not toml [[[").unwrap();
        assert!(Config::load(file.path()).is_err());
    }

    #[test]
    fn load_or_default_returns_default_for_missing_file() {
        let config = Config::load_or_default(Path::new("/nonexistent/mediascribe.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn load_or_default_propagates_invalid_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not = valid = toml").unwrap();
        assert!(Config::load_or_default(file.path()).is_err());
    }

    #[test]
    fn idle_timeout_parses_and_zero_disables() {
        let mut config = ModelConfig::default();
        assert_eq!(config.idle_timeout().unwrap(), Duration::from_secs(120));

        config.idle_timeout = "0s".to_string();
        assert_eq!(config.idle_timeout().unwrap(), Duration::ZERO);

        config.idle_timeout = "0".to_string();
        assert_eq!(config.idle_timeout().unwrap(), Duration::ZERO);

        config.idle_timeout = "garbage".to_string();
        let err = config.idle_timeout().unwrap_err();
        assert!(err.to_string().contains("model.idle_timeout"));
    }

    #[test]
    fn env_overrides_replace_model_fields() {
        let _guard = ENV_LOCK.lock().unwrap();
        unsafe {
            std::env::set_var("MEDIASCRIBE_MODEL", "large-v3");
            std::env::set_var("MEDIASCRIBE_LANGUAGE", "en");
            std::env::set_var("MEDIASCRIBE_IDLE_TIMEOUT", "10m");
        }

        let config = Config::default().with_env_overrides();
        assert_eq!(config.model.model, "large-v3");
        assert_eq!(config.model.language, "en");
        assert_eq!(config.model.idle_timeout, "10m");

        unsafe {
            std::env::remove_var("MEDIASCRIBE_MODEL");
            std::env::remove_var("MEDIASCRIBE_LANGUAGE");
            std::env::remove_var("MEDIASCRIBE_IDLE_TIMEOUT");
        }
    }

    #[test]
    fn empty_env_values_are_ignored() {
        let _guard = ENV_LOCK.lock().unwrap();
        unsafe {
            std::env::set_var("MEDIASCRIBE_MODEL", "");
        }
        let config = Config::default().with_env_overrides();
        assert_eq!(config.model.model, "base");
        unsafe {
            std::env::remove_var("MEDIASCRIBE_MODEL");
        }
    }

    #[test]
    fn derived_configs_reflect_sections() {
        let mut config = Config::default();
        config.segmentation.threshold = 0.7;
        config.chunking.window_ms = 15_000;

        assert_eq!(config.vad_config().threshold, 0.7);
        assert_eq!(config.chunk_config().window_ms, 15_000);
        // The filter's context window follows the chunk window.
        assert_eq!(config.filter_config().context_window_secs, 15.0);
    }
}
