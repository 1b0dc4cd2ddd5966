//! Configuration management for scoring thresholds and session limits
//!
//! This module provides runtime configuration loading from JSON files.
//! Every threshold used by the domain scorers is a named field here whose
//! default matches the documented constant, so deployments can override
//! them without recompilation.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::analysis::frequency::{Algorithm, BandPolicy, CrossingReference, FrequencyBand};
use crate::analysis::peaks::ThresholdMode;
use crate::error::AssessmentError;
use crate::scoring::Domain;

/// Complete screening configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreeningConfig {
    pub voice: VoiceConfig,
    pub tremor: TremorConfig,
    pub gait: GaitConfig,
    pub facial: FacialConfig,
    pub spiral: SpiralConfig,
    pub questionnaire: QuestionnaireConfig,
    pub aggregation: AggregationConfig,
}

/// Voice test parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// Noise-floor calibration phase length
    pub calibration_ms: f64,
    /// Fraction of the quietest calibration readings averaged into the baseline
    pub noise_floor_fraction: f64,
    /// Calibration readings needed for a noise-floor estimate
    pub min_calibration_frames: usize,
    /// Rolling volume buffer length used for stability
    pub rolling_window: usize,
    pub pitch_band: FrequencyBand,
    pub pitch_algorithm: Algorithm,
    /// Below this level the voice is classified as silent
    pub silent_db: f64,
    /// Stability below this value is classified as unstable
    pub unstable_stability: f64,
    /// Above this level the voice is classified as loud
    pub loud_db: f64,
    /// Below this level the voice is classified as quiet
    pub quiet_db: f64,
    pub max_duration_ms: f64,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            calibration_ms: 3000.0,
            noise_floor_fraction: 0.1,
            min_calibration_frames: 10,
            rolling_window: 100,
            pitch_band: FrequencyBand::new(80.0, 400.0, BandPolicy::ZeroOutside),
            pitch_algorithm: Algorithm::ZeroCrossing(CrossingReference::Zero),
            silent_db: -50.0,
            unstable_stability: 70.0,
            loud_db: -20.0,
            quiet_db: -40.0,
            max_duration_ms: 10_000.0,
        }
    }
}

/// Tremor test parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TremorConfig {
    /// Sliding window length
    pub window_ms: f64,
    /// Hard cap on buffered samples
    pub window_capacity: usize,
    /// Samples needed before amplitude/frequency are computed
    pub min_samples: usize,
    /// Rate assumed when timestamps cannot provide one
    pub nominal_rate_hz: f64,
    pub band: FrequencyBand,
    pub algorithm: Algorithm,
    /// Multiplier from input-unit standard deviation to reported amplitude.
    /// Default sqrt(2): inputs in mm, amplitude reported as sinusoid peak mm.
    pub amplitude_scale: f64,
    /// Amplitude sub-score points per reported unit
    pub amplitude_weight: f64,
    /// Frequency sub-score points per Hz
    pub frequency_weight: f64,
    /// Share of the amplitude sub-score in the severity score
    pub amplitude_share: f64,
    /// Share of the frequency sub-score in the severity score
    pub frequency_share: f64,
    pub mild_from: f64,
    pub moderate_from: f64,
    pub severe_from: f64,
    pub max_duration_ms: f64,
}

impl Default for TremorConfig {
    fn default() -> Self {
        Self {
            window_ms: 5000.0,
            window_capacity: 600,
            min_samples: 30,
            nominal_rate_hz: 60.0,
            band: FrequencyBand::new(3.0, 12.0, BandPolicy::Clamp),
            algorithm: Algorithm::ZeroCrossing(CrossingReference::Mean),
            amplitude_scale: std::f64::consts::SQRT_2,
            amplitude_weight: 10.0,
            frequency_weight: 5.0,
            amplitude_share: 0.6,
            frequency_share: 0.4,
            mild_from: 20.0,
            moderate_from: 40.0,
            severe_from: 60.0,
            max_duration_ms: 10_000.0,
        }
    }
}

/// Gait test parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GaitConfig {
    /// Foot-down threshold in normalized landmark space
    pub step_threshold: ThresholdMode,
    /// Minimum spacing between steps of the same foot
    pub step_refractory_ms: f64,
    /// Cadence below this (steps/min) is slow
    pub slow_cadence: f64,
    /// Cadence above this (steps/min) is fast
    pub fast_cadence: f64,
    pub max_duration_ms: f64,
}

impl Default for GaitConfig {
    fn default() -> Self {
        Self {
            step_threshold: ThresholdMode::Absolute(0.15),
            step_refractory_ms: 0.0,
            slow_cadence: 80.0,
            fast_cadence: 120.0,
            max_duration_ms: 20_000.0,
        }
    }
}

/// Facial expression test parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FacialConfig {
    /// Eye-aspect-ratio below which the eyes count as closed
    pub blink_threshold: f64,
    /// Minimum spacing between two blinks
    pub blink_refractory_ms: f64,
    /// Blink rate (per minute) below this is reduced
    pub reduced_blink_rate: f64,
    /// Blink rate (per minute) above this is increased
    pub increased_blink_rate: f64,
    /// Left/right EAR symmetry (percent) below this is asymmetric
    pub min_symmetry: f64,
    pub max_duration_ms: f64,
}

impl Default for FacialConfig {
    fn default() -> Self {
        Self {
            blink_threshold: 0.2,
            blink_refractory_ms: 100.0,
            reduced_blink_rate: 8.0,
            increased_blink_rate: 20.0,
            min_symmetry: 85.0,
            max_duration_ms: 15_000.0,
        }
    }
}

/// Spiral drawing parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpiralConfig {
    /// Tremor index at which the radar value reaches 0
    pub ideal_index: f64,
    /// Points retained for a single stroke
    pub max_points: usize,
    pub max_duration_ms: f64,
}

impl Default for SpiralConfig {
    fn default() -> Self {
        Self {
            ideal_index: 1.0,
            max_points: 20_000,
            max_duration_ms: 30_000.0,
        }
    }
}

/// Questionnaire parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuestionnaireConfig {
    /// Highest allowed answer score
    pub max_score: u8,
    /// Number of items in the form; answers to other items are rejected
    pub item_count: u8,
}

impl Default for QuestionnaireConfig {
    fn default() -> Self {
        Self {
            max_score: 4,
            item_count: 10,
        }
    }
}

/// Overall risk breakpoints on the 0-4 domain score scale
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Mean score below this is low risk
    pub low_below: f64,
    /// Mean score below this (and not low) is moderate risk
    pub moderate_below: f64,
    /// Completed domains needed before a verdict is produced
    pub min_domains: usize,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            low_below: 1.25,
            moderate_below: 2.5,
            min_domains: 2,
        }
    }
}

fn positive(field: &str, value: f64) -> Result<(), AssessmentError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(AssessmentError::invalid_config(
            field,
            format!("{} must be a positive finite number", value),
        ))
    }
}

fn finite(field: &str, value: f64) -> Result<(), AssessmentError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(AssessmentError::invalid_config(field, "must be finite"))
    }
}

fn band(field: &str, band: &FrequencyBand) -> Result<(), AssessmentError> {
    if band.is_valid() {
        Ok(())
    } else {
        Err(AssessmentError::invalid_config(
            field,
            format!("band [{}, {}] Hz is empty or non-positive", band.min_hz, band.max_hz),
        ))
    }
}

fn threshold(field: &str, mode: &ThresholdMode) -> Result<(), AssessmentError> {
    match mode {
        ThresholdMode::Absolute(v) | ThresholdMode::MeanRelative(v) => finite(field, *v),
    }
}

impl VoiceConfig {
    pub fn validate(&self) -> Result<(), AssessmentError> {
        positive("voice.calibration_ms", self.calibration_ms)?;
        positive("voice.max_duration_ms", self.max_duration_ms)?;
        if !(self.noise_floor_fraction > 0.0 && self.noise_floor_fraction <= 1.0) {
            return Err(AssessmentError::invalid_config(
                "voice.noise_floor_fraction",
                "must be in (0, 1]",
            ));
        }
        if self.rolling_window == 0 {
            return Err(AssessmentError::invalid_config(
                "voice.rolling_window",
                "must be at least 1",
            ));
        }
        band("voice.pitch_band", &self.pitch_band)?;
        finite("voice.silent_db", self.silent_db)?;
        finite("voice.loud_db", self.loud_db)?;
        finite("voice.quiet_db", self.quiet_db)?;
        if !(0.0..=100.0).contains(&self.unstable_stability) {
            return Err(AssessmentError::invalid_config(
                "voice.unstable_stability",
                "must be in [0, 100]",
            ));
        }
        Ok(())
    }
}

impl TremorConfig {
    pub fn validate(&self) -> Result<(), AssessmentError> {
        positive("tremor.window_ms", self.window_ms)?;
        positive("tremor.nominal_rate_hz", self.nominal_rate_hz)?;
        positive("tremor.amplitude_scale", self.amplitude_scale)?;
        positive("tremor.max_duration_ms", self.max_duration_ms)?;
        band("tremor.band", &self.band)?;
        if self.min_samples < 2 || self.window_capacity < self.min_samples {
            return Err(AssessmentError::invalid_config(
                "tremor.min_samples",
                format!(
                    "need 2 <= min_samples ({}) <= window_capacity ({})",
                    self.min_samples, self.window_capacity
                ),
            ));
        }
        for (field, value) in [
            ("tremor.amplitude_weight", self.amplitude_weight),
            ("tremor.frequency_weight", self.frequency_weight),
            ("tremor.amplitude_share", self.amplitude_share),
            ("tremor.frequency_share", self.frequency_share),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(AssessmentError::invalid_config(field, "must be non-negative"));
            }
        }
        if !(self.mild_from < self.moderate_from && self.moderate_from < self.severe_from) {
            return Err(AssessmentError::invalid_config(
                "tremor.mild_from",
                "severity breakpoints must be strictly increasing",
            ));
        }
        Ok(())
    }
}

impl GaitConfig {
    pub fn validate(&self) -> Result<(), AssessmentError> {
        threshold("gait.step_threshold", &self.step_threshold)?;
        if !(self.step_refractory_ms.is_finite() && self.step_refractory_ms >= 0.0) {
            return Err(AssessmentError::invalid_config(
                "gait.step_refractory_ms",
                "must be non-negative",
            ));
        }
        positive("gait.slow_cadence", self.slow_cadence)?;
        positive("gait.max_duration_ms", self.max_duration_ms)?;
        if self.fast_cadence <= self.slow_cadence {
            return Err(AssessmentError::invalid_config(
                "gait.fast_cadence",
                "must exceed slow_cadence",
            ));
        }
        Ok(())
    }
}

impl FacialConfig {
    pub fn validate(&self) -> Result<(), AssessmentError> {
        positive("facial.blink_threshold", self.blink_threshold)?;
        positive("facial.max_duration_ms", self.max_duration_ms)?;
        if !(self.blink_refractory_ms.is_finite() && self.blink_refractory_ms >= 0.0) {
            return Err(AssessmentError::invalid_config(
                "facial.blink_refractory_ms",
                "must be non-negative",
            ));
        }
        if self.increased_blink_rate <= self.reduced_blink_rate {
            return Err(AssessmentError::invalid_config(
                "facial.increased_blink_rate",
                "must exceed reduced_blink_rate",
            ));
        }
        if !(0.0..=100.0).contains(&self.min_symmetry) {
            return Err(AssessmentError::invalid_config(
                "facial.min_symmetry",
                "must be in [0, 100]",
            ));
        }
        Ok(())
    }
}

impl SpiralConfig {
    pub fn validate(&self) -> Result<(), AssessmentError> {
        positive("spiral.ideal_index", self.ideal_index)?;
        positive("spiral.max_duration_ms", self.max_duration_ms)?;
        if self.max_points < 3 {
            return Err(AssessmentError::invalid_config(
                "spiral.max_points",
                "must be at least 3",
            ));
        }
        Ok(())
    }
}

impl QuestionnaireConfig {
    pub fn validate(&self) -> Result<(), AssessmentError> {
        if self.max_score == 0 {
            return Err(AssessmentError::invalid_config(
                "questionnaire.max_score",
                "must be at least 1",
            ));
        }
        if self.item_count == 0 {
            return Err(AssessmentError::invalid_config(
                "questionnaire.item_count",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

impl AggregationConfig {
    pub fn validate(&self) -> Result<(), AssessmentError> {
        finite("aggregation.low_below", self.low_below)?;
        finite("aggregation.moderate_below", self.moderate_below)?;
        if self.low_below >= self.moderate_below {
            return Err(AssessmentError::invalid_config(
                "aggregation.low_below",
                "must be below moderate_below",
            ));
        }
        if self.min_domains == 0 {
            return Err(AssessmentError::invalid_config(
                "aggregation.min_domains",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

impl ScreeningConfig {
    /// Validate the section used by `domain`
    pub fn validate_domain(&self, domain: Domain) -> Result<(), AssessmentError> {
        match domain {
            Domain::Voice => self.voice.validate(),
            Domain::Tremor => self.tremor.validate(),
            Domain::Gait => self.gait.validate(),
            Domain::Facial => self.facial.validate(),
            Domain::Spiral => self.spiral.validate(),
            Domain::Questionnaire => self.questionnaire.validate(),
        }
    }

    /// Validate every section
    pub fn validate(&self) -> Result<(), AssessmentError> {
        for domain in Domain::ALL {
            self.validate_domain(domain)?;
        }
        self.aggregation.validate()
    }

    /// Maximum test duration for `domain`, if it has one
    pub fn max_duration_ms(&self, domain: Domain) -> Option<f64> {
        match domain {
            Domain::Voice => Some(self.voice.max_duration_ms),
            Domain::Tremor => Some(self.tremor.max_duration_ms),
            Domain::Gait => Some(self.gait.max_duration_ms),
            Domain::Facial => Some(self.facial.max_duration_ms),
            Domain::Spiral => Some(self.spiral.max_duration_ms),
            Domain::Questionnaire => None,
        }
    }

    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// The parsed configuration, or defaults if the file is missing or the
    /// JSON is invalid. Missing fields fall back to their defaults.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Load configuration from the bundled assets directory
    pub fn load() -> Self {
        Self::load_from_file("assets/screening_config.json")
    }
}
