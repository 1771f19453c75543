//! Background-music (BGM) level classification and detection-path tuning.
//!
//! Probes short windows spread across the clip, measures how much spectral
//! energy sits in the music-bass band and how flat the spectrum is, and maps
//! the averaged metrics to a three-level class. The class selects which
//! filtering the VAD input receives and how the VAD thresholds are tuned.

use crate::audio::{AudioSignal, calculate_rms};
use crate::defaults;
use crate::preprocess::filters;
use crate::segment::VadConfig;
use rustfft::FftPlanner;
use rustfft::num_complex::Complex;
use serde::Serialize;
use tracing::{debug, info};

/// How much background music the clip carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BgmClass {
    /// No significant accompaniment; detection runs near-raw.
    Clean,
    /// Audible accompaniment under the speech; mild filtering suffices.
    Light,
    /// Accompaniment loud enough to mask speech onsets.
    Heavy,
}

/// Thresholds for the classifier. Ratios compare energy below
/// `low_freq_cutoff_hz` against total spectral energy.
#[derive(Debug, Clone, Copy)]
pub struct BgmConfig {
    pub probe_window: usize,
    pub probe_interval_ms: u32,
    pub low_freq_cutoff_hz: f32,
    pub light_ratio: f32,
    pub heavy_ratio: f32,
    pub flatness_cutoff: f32,
}

impl Default for BgmConfig {
    fn default() -> Self {
        Self {
            probe_window: defaults::BGM_PROBE_WINDOW,
            probe_interval_ms: defaults::BGM_PROBE_INTERVAL_MS,
            low_freq_cutoff_hz: defaults::BGM_LOW_FREQ_CUTOFF_HZ,
            light_ratio: defaults::BGM_LIGHT_RATIO,
            heavy_ratio: defaults::BGM_HEAVY_RATIO,
            flatness_cutoff: defaults::BGM_FLATNESS_CUTOFF,
        }
    }
}

/// The detection-path plan the classifier produced for one clip: the class,
/// the (possibly filtered) audio the VAD should segment, and the tuned VAD
/// configuration. The recognizer never sees this audio.
pub struct DetectionPlan {
    pub class: BgmClass,
    pub audio: AudioSignal,
    pub vad: VadConfig,
}

pub struct BgmClassifier {
    config: BgmConfig,
}

impl BgmClassifier {
    pub fn new(config: BgmConfig) -> Self {
        Self { config }
    }

    /// Classifies the clip's background-music level.
    ///
    /// Clips too short or too quiet to yield a single usable probe window
    /// degrade to `Clean`, which leaves detection at its least aggressive.
    pub fn classify(&self, signal: &AudioSignal) -> BgmClass {
        let window = self.config.probe_window;
        let stride = (signal.sample_rate() as usize * self.config.probe_interval_ms as usize
            / 1000)
            .max(window);
        let samples = signal.samples();

        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(window);

        let mut ratio_sum = 0.0f64;
        let mut flatness_sum = 0.0f64;
        let mut probes = 0usize;

        let mut start = 0usize;
        while start + window <= samples.len() {
            let frame = &samples[start..start + window];
            start += stride;
            // Near-silent windows carry no spectral information.
            if calculate_rms(frame) < 1e-3 {
                continue;
            }

            let mut buf: Vec<Complex<f32>> =
                frame.iter().map(|&s| Complex::new(s, 0.0)).collect();
            fft.process(&mut buf);

            let bins = window / 2;
            let bin_hz = signal.sample_rate() as f32 / window as f32;
            let cutoff_bin =
                ((self.config.low_freq_cutoff_hz / bin_hz) as usize).clamp(1, bins - 1);

            let mut low_energy = 0.0f64;
            let mut total_energy = 0.0f64;
            let mut log_sum = 0.0f64;
            for (bin, c) in buf[..bins].iter().enumerate() {
                let power = c.norm_sqr() as f64;
                total_energy += power;
                if bin < cutoff_bin {
                    low_energy += power;
                }
                log_sum += (power + 1e-12).ln();
            }
            if total_energy <= 0.0 {
                continue;
            }

            // Spectral flatness: geometric mean over arithmetic mean. Near
            // 1.0 for noise-like spectra, near 0.0 for tonal content.
            let geo_mean = (log_sum / bins as f64).exp();
            let arith_mean = total_energy / bins as f64;
            flatness_sum += geo_mean / arith_mean;
            ratio_sum += low_energy / total_energy;
            probes += 1;
        }

        if probes == 0 {
            debug!("no usable probe windows, assuming clean audio");
            return BgmClass::Clean;
        }

        let ratio = (ratio_sum / probes as f64) as f32;
        let flatness = (flatness_sum / probes as f64) as f32;
        let class = if ratio > self.config.heavy_ratio && flatness < self.config.flatness_cutoff {
            BgmClass::Heavy
        } else if ratio > self.config.light_ratio {
            BgmClass::Light
        } else {
            BgmClass::Clean
        };
        info!(?class, ratio, flatness, probes, "bgm classification");
        class
    }

    /// Builds the detection plan for a clip: classify, filter a copy of the
    /// signal for the VAD, and tune the VAD configuration for the class.
    pub fn plan_detection(&self, signal: &AudioSignal, base: VadConfig) -> DetectionPlan {
        let class = self.classify(signal);
        let audio = apply_class(signal, class);
        let vad = tune(base, class);
        DetectionPlan { class, audio, vad }
    }
}

/// Produces the detection-path copy of the signal for a class.
fn apply_class(signal: &AudioSignal, class: BgmClass) -> AudioSignal {
    let rate = signal.sample_rate();
    let filtered = match class {
        BgmClass::Clean => filters::high_pass(signal.samples(), rate, 80.0),
        BgmClass::Light => filters::high_pass(signal.samples(), rate, 120.0),
        BgmClass::Heavy => {
            let subtracted = filters::spectral_subtract(signal.samples(), 1.2);
            filters::high_pass(&subtracted, rate, 250.0)
        }
    };
    AudioSignal::new(filtered, rate)
}

/// Tunes the VAD thresholds for a class. Clean audio affords a stricter
/// threshold; under heavy accompaniment the filtering above has already
/// stripped most of the music energy, so the bar drops and short utterances
/// over continuous music are admitted.
fn tune(base: VadConfig, class: BgmClass) -> VadConfig {
    match class {
        BgmClass::Clean => VadConfig {
            threshold: (base.threshold + 0.05).min(0.95),
            ..base
        },
        BgmClass::Light => base,
        BgmClass::Heavy => VadConfig {
            threshold: (base.threshold - 0.1).max(0.05),
            min_speech_ms: base.min_speech_ms.saturating_sub(50).max(100),
            ..base
        },
    }
}
