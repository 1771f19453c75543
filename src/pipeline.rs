//! Request orchestration.
//!
//! Wires the stages together for one transcription request: optional vocal
//! separation and BGM-adaptive filtering feed detection only, the recognizer
//! always receives audio extracted from the untouched original signal, and
//! the hallucination filter runs last on the assembled cue list.

use crate::audio::AudioSignal;
use crate::chunk::{ChunkStitcher, plan_chunks};
use crate::config::Config;
use crate::engine::manager::ModelManager;
use crate::engine::recognizer::RecognizeOptions;
use crate::error::Result;
use crate::filter::HallucinationFilter;
use crate::preprocess::bgm::{BgmClassifier, DetectionPlan};
use crate::preprocess::separation::{VocalSeparator, separate_or_fallback};
use crate::segment::{SpeechProbe, VadSegmenter, merge_intervals};
use crate::transcript::{RecognizedCue, TranscriptionResult};
use std::sync::Arc;
use tracing::{debug, info};

/// How a request's audio is fed to the recognizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TranscribeMode {
    /// VAD-driven: detect speech intervals and recognize each one.
    #[default]
    Segmented,
    /// Fixed overlapping windows over the whole clip, stitched afterwards.
    WholeAudio,
}

/// Per-request options.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Language hint overriding the configured default.
    pub language: Option<String>,
    pub mode: TranscribeMode,
    /// Run the vocal separator (when one is installed) in front of detection.
    pub vocal_separation: bool,
}

/// The transcription pipeline for one deployment: configuration, model
/// lifecycle, the VAD oracle, and an optional vocal separator. Shared across
/// requests; every method takes `&self`.
pub struct Pipeline {
    config: Config,
    manager: Arc<ModelManager>,
    probe: Arc<dyn SpeechProbe>,
    separator: Option<Arc<dyn VocalSeparator>>,
    filter: HallucinationFilter,
}

impl Pipeline {
    pub fn new(config: Config, manager: Arc<ModelManager>, probe: Arc<dyn SpeechProbe>) -> Self {
        let filter = HallucinationFilter::new(config.filter_config());
        Self {
            config,
            manager,
            probe,
            separator: None,
            filter,
        }
    }

    pub fn with_separator(mut self, separator: Arc<dyn VocalSeparator>) -> Self {
        self.separator = Some(separator);
        self
    }

    pub fn manager(&self) -> &Arc<ModelManager> {
        &self.manager
    }

    /// Transcribes one clip. Empty audio and audio with no detected speech
    /// both produce an empty result without touching the model. A recognizer
    /// error fails the whole request; no partial transcript is returned.
    pub async fn transcribe(
        &self,
        audio: &AudioSignal,
        options: &RequestOptions,
    ) -> Result<TranscriptionResult> {
        if audio.is_empty() {
            debug!("empty audio, returning empty result");
            return Ok(TranscriptionResult::default());
        }
        info!(
            duration_secs = audio.duration_secs(),
            mode = ?options.mode,
            "transcription request"
        );

        match options.mode {
            TranscribeMode::Segmented => self.transcribe_segmented(audio, options).await,
            TranscribeMode::WholeAudio => self.transcribe_whole(audio, options).await,
        }
    }

    async fn transcribe_segmented(
        &self,
        audio: &AudioSignal,
        options: &RequestOptions,
    ) -> Result<TranscriptionResult> {
        let plan = self.plan_detection(audio, options).await?;
        let segmenter = VadSegmenter::new(plan.vad);
        let intervals = {
            let probe = Arc::clone(&self.probe);
            let detection = plan.audio;
            tokio::task::spawn_blocking(move || segmenter.segment(&detection, probe.as_ref()))
                .await
                .map_err(|err| crate::error::MediascribeError::Other(format!(
                    "segmentation task failed: {err}"
                )))?
        };
        let intervals = merge_intervals(&intervals, audio.sample_rate(), self.config.merge_config());
        if intervals.is_empty() {
            info!("no speech detected");
            return Ok(TranscriptionResult::default());
        }

        let recognize_options = self.recognize_options(options);
        let rate = audio.sample_rate();
        let padding = self.config.segmentation.padding_ms;
        let mut cues: Vec<RecognizedCue> = Vec::new();
        for interval in intervals {
            // Recognition audio always comes from the original signal.
            let (extract, actual_start) = audio.extract_padded(interval, padding);
            let local = self
                .manager
                .recognize(extract.samples().to_vec(), recognize_options.clone())
                .await?;
            let offset = actual_start as f64 / rate as f64;
            cues.extend(local.into_iter().map(|cue| cue.offset(offset)));
        }

        let cues = self.filter.filter(cues);
        Ok(TranscriptionResult::from_cues(cues))
    }

    async fn transcribe_whole(
        &self,
        audio: &AudioSignal,
        options: &RequestOptions,
    ) -> Result<TranscriptionResult> {
        let chunks = plan_chunks(audio.len(), audio.sample_rate(), self.config.chunk_config());
        let recognize_options = self.recognize_options(options);
        let mut stitcher = ChunkStitcher::new(self.config.chunking.boundary_dedup_secs);
        for chunk in chunks {
            let piece = audio.slice(chunk.start_sample, chunk.end_sample);
            let local = self
                .manager
                .recognize(piece.samples().to_vec(), recognize_options.clone())
                .await?;
            stitcher.absorb(chunk.start_seconds(audio.sample_rate()), local);
        }

        let cues = self.filter.filter(stitcher.finish());
        Ok(TranscriptionResult::from_cues(cues))
    }

    /// Builds the detection plan: optional vocal separation, then BGM
    /// classification and class-driven filtering, all on a blocking thread.
    /// With BGM analysis disabled the detection audio is the input as-is.
    async fn plan_detection(
        &self,
        audio: &AudioSignal,
        options: &RequestOptions,
    ) -> Result<DetectionPlan> {
        let detection = match (&self.separator, options.vocal_separation) {
            (Some(separator), true) => separate_or_fallback(separator.as_ref(), audio),
            _ => audio.clone(),
        };

        let base_vad = self.config.vad_config();
        if !self.config.bgm.enabled {
            return Ok(DetectionPlan {
                class: crate::preprocess::BgmClass::Clean,
                audio: detection,
                vad: base_vad,
            });
        }

        let classifier = BgmClassifier::new(self.config.bgm_config());
        tokio::task::spawn_blocking(move || classifier.plan_detection(&detection, base_vad))
            .await
            .map_err(|err| {
                crate::error::MediascribeError::Other(format!("bgm analysis task failed: {err}"))
            })
    }

    fn recognize_options(&self, options: &RequestOptions) -> RecognizeOptions {
        RecognizeOptions {
            language: options
                .language
                .clone()
                .or_else(|| Some(self.config.model.language.clone())),
            timestamps: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::manager::{ModelLoader, RecognizerHandle};
    use crate::engine::recognizer::mock::MockRecognizer;
    use crate::error::MediascribeError;
    use crate::segment::FnProbe;
    use async_trait::async_trait;
    use std::time::Duration;

    const RATE: u32 = 16000;

    struct FixedLoader(Arc<MockRecognizer>);

    #[async_trait]
    impl ModelLoader for FixedLoader {
        async fn load(&self, _model_id: &str) -> crate::error::Result<RecognizerHandle> {
            Ok(self.0.clone())
        }
    }

    fn energy_probe() -> Arc<dyn SpeechProbe> {
        Arc::new(FnProbe(|frame: &[f32]| {
            if crate::audio::calculate_rms(frame) > 0.01 {
                1.0
            } else {
                0.0
            }
        }))
    }

    fn pipeline_with(mock: Arc<MockRecognizer>) -> Pipeline {
        let mut config = Config::default();
        // Keep BGM analysis out of these tests; covered in preprocess.
        config.bgm.enabled = false;
        let manager = Arc::new(ModelManager::new(
            Arc::new(FixedLoader(mock)),
            "base",
            Duration::ZERO,
        ));
        Pipeline::new(config, manager, energy_probe())
    }

    fn speech_then_silence(speech_secs: usize, silence_secs: usize) -> AudioSignal {
        let mut samples = Vec::new();
        for i in 0..RATE as usize * speech_secs {
            samples.push(0.5 * (i as f32 * 0.5).sin());
        }
        samples.extend(vec![0.0; RATE as usize * silence_secs]);
        AudioSignal::new(samples, RATE)
    }

    #[tokio::test]
    async fn empty_audio_is_an_empty_result_not_an_error() {
        let mock = Arc::new(MockRecognizer::new("base"));
        let pipeline = pipeline_with(mock.clone());
        let result = pipeline
            .transcribe(&AudioSignal::new(Vec::new(), RATE), &RequestOptions::default())
            .await
            .unwrap();
        assert!(result.is_empty());
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn silence_never_reaches_the_recognizer() {
        let mock = Arc::new(MockRecognizer::new("base"));
        let pipeline = pipeline_with(mock.clone());
        let silence = AudioSignal::new(vec![0.0; RATE as usize * 40], RATE);
        let result = pipeline
            .transcribe(&silence, &RequestOptions::default())
            .await
            .unwrap();
        assert!(result.is_empty());
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn segmented_cues_come_back_in_absolute_time() {
        let mock = Arc::new(MockRecognizer::new("base"));
        mock.push_response(vec![RecognizedCue::new("hello world", 0.0, 2.0).unwrap()]);
        let pipeline = pipeline_with(mock.clone());

        // 2s silence, 3s speech, 2s silence: speech starts at 2.0s.
        let mut samples = vec![0.0; RATE as usize * 2];
        for i in 0..RATE as usize * 3 {
            samples.push(0.5 * (i as f32 * 0.5).sin());
        }
        samples.extend(vec![0.0; RATE as usize * 2]);
        let audio = AudioSignal::new(samples, RATE);

        let result = pipeline
            .transcribe(&audio, &RequestOptions::default())
            .await
            .unwrap();
        assert_eq!(result.len(), 1);
        let cue = &result.cues()[0];
        // Padding pulls the extract start slightly before 2.0s.
        assert!(cue.start_seconds > 1.5 && cue.start_seconds < 2.1);
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn recognizer_error_fails_the_whole_request() {
        let mock = Arc::new(MockRecognizer::new("base"));
        mock.push_failure("decoder diverged");
        let pipeline = pipeline_with(mock);

        let audio = speech_then_silence(3, 1);
        let err = pipeline
            .transcribe(&audio, &RequestOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, MediascribeError::Inference { .. }));
    }

    #[tokio::test]
    async fn hallucinated_outro_is_filtered_from_output() {
        let mock = Arc::new(MockRecognizer::new("base"));
        mock.push_response(vec![
            RecognizedCue::new("real sentence", 0.0, 2.0).unwrap(),
            RecognizedCue::new("ご視聴ありがとうございました", 2.0, 2.8).unwrap(),
        ]);
        let pipeline = pipeline_with(mock);

        let audio = speech_then_silence(3, 1);
        let result = pipeline
            .transcribe(&audio, &RequestOptions::default())
            .await
            .unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.cues()[0].text, "real sentence");
    }

    #[tokio::test]
    async fn whole_audio_mode_stitches_chunks() {
        let mock = Arc::new(MockRecognizer::new("base"));
        // 70s clip chunks at 0s, 25s, 50s.
        mock.push_response(vec![RecognizedCue::new("first", 1.0, 3.0).unwrap()]);
        mock.push_response(vec![RecognizedCue::new("second", 5.0, 7.0).unwrap()]);
        mock.push_response(vec![RecognizedCue::new("third", 6.0, 8.0).unwrap()]);
        let pipeline = pipeline_with(mock.clone());

        let audio = AudioSignal::new(vec![0.1; RATE as usize * 70], RATE);
        let result = pipeline
            .transcribe(
                &audio,
                &RequestOptions {
                    mode: TranscribeMode::WholeAudio,
                    ..RequestOptions::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(mock.call_count(), 3);
        assert_eq!(result.len(), 3);
        assert_eq!(result.cues()[1].start_seconds, 30.0);
        assert_eq!(result.cues()[2].start_seconds, 56.0);
    }

    #[tokio::test]
    async fn request_language_overrides_configured_default() {
        let pipeline = pipeline_with(Arc::new(MockRecognizer::new("base")));
        let opts = pipeline.recognize_options(&RequestOptions {
            language: Some("ja".into()),
            ..RequestOptions::default()
        });
        assert_eq!(opts.language.as_deref(), Some("ja"));

        let opts = pipeline.recognize_options(&RequestOptions::default());
        // Config default is "auto", which the recognizer maps to detection.
        assert_eq!(opts.language.as_deref(), Some("auto"));
        assert_eq!(opts.language_hint(), None);
    }
}
