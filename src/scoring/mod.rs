// Scoring module - per-domain reduction of raw streams to metrics + severity
//
// Architecture:
// - Domain / Severity: the closed sets of test domains and ordinal grades
// - MetricSet: named, always-finite scalar metrics of one domain
// - DomainReport: the frozen result of one finalized test
// - DomainScorer: trait implemented once per domain; owns that domain's
//   window and derived statistics for the lifetime of a test
//
// Each scorer consumes TimedSamples, exposes live metrics while the test
// runs, and produces a DomainReport on finalize. Numerical edge cases never
// surface as errors; too-short tests finalize into a report flagged as a
// fallback.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::ScreeningConfig;
use crate::error::AssessmentError;
use crate::sample::TimedSample;

pub mod facial;
pub mod gait;
pub mod questionnaire;
pub mod spiral;
pub mod tremor;
pub mod voice;

pub use facial::FacialScorer;
pub use gait::GaitScorer;
pub use questionnaire::QuestionnaireScorer;
pub use spiral::SpiralScorer;
pub use tremor::TremorScorer;
pub use voice::VoiceScorer;

/// Screening test domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Voice,
    Tremor,
    Gait,
    Facial,
    Spiral,
    Questionnaire,
}

impl Domain {
    pub const ALL: [Domain; 6] = [
        Domain::Voice,
        Domain::Tremor,
        Domain::Gait,
        Domain::Facial,
        Domain::Spiral,
        Domain::Questionnaire,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Voice => "voice",
            Domain::Tremor => "tremor",
            Domain::Gait => "gait",
            Domain::Facial => "facial",
            Domain::Spiral => "spiral",
            Domain::Questionnaire => "questionnaire",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Domain::ALL
            .into_iter()
            .find(|domain| domain.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown domain '{}'", s))
    }
}

/// Ordinal severity grade
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Normal,
    Mild,
    Moderate,
    Severe,
}

impl Severity {
    /// Position on the 0-3 ordinal scale
    pub fn ordinal(&self) -> u8 {
        match self {
            Severity::Normal => 0,
            Severity::Mild => 1,
            Severity::Moderate => 2,
            Severity::Severe => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Normal => "normal",
            Severity::Mild => "mild",
            Severity::Moderate => "moderate",
            Severity::Severe => "severe",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named scalar metrics of one domain
///
/// Values are always finite: a non-finite value is stored as 0 and logged,
/// so downstream consumers never have to guard against NaN.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricSet(BTreeMap<String, f64>);

impl MetricSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, value: f64) {
        let value = if value.is_finite() {
            value
        } else {
            log::warn!("[MetricSet] Non-finite value for {} replaced by 0", name);
            0.0
        };
        self.0.insert(name.to_string(), value);
    }

    /// Builder-style insert
    pub fn with(mut self, name: &str, value: f64) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(name, value)| (name.as_str(), *value))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Status label of a report built from too few samples
pub const FALLBACK_STATUS: &str = "insufficient";

/// Frozen result of one finalized domain test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainReport {
    pub domain: Domain,
    pub metrics: MetricSet,
    pub severity: Severity,
    /// Domain-specific status label (e.g. "unstable", "slow", "reduced")
    pub status: String,
    /// Score on the 0-4 scale used by the aggregator
    pub score: f64,
    /// Normalized radar value in [0, 1]; higher is healthier
    pub radar: f64,
    pub sample_count: usize,
    /// True when too few samples were collected and documented fallback
    /// values were reported instead of measurements
    pub fallback: bool,
    pub duration_ms: f64,
}

impl DomainReport {
    /// Build a report whose score is the severity ordinal
    pub fn new(
        domain: Domain,
        metrics: MetricSet,
        severity: Severity,
        status: impl Into<String>,
        radar: f64,
    ) -> Self {
        Self {
            domain,
            metrics,
            severity,
            status: status.into(),
            score: severity.ordinal() as f64,
            radar: crate::analysis::stats::clamp_unit(radar),
            sample_count: 0,
            fallback: false,
            duration_ms: 0.0,
        }
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = if score.is_finite() {
            score.clamp(0.0, 4.0)
        } else {
            0.0
        };
        self
    }

    pub fn with_samples(mut self, sample_count: usize, duration_ms: f64) -> Self {
        self.sample_count = sample_count;
        self.duration_ms = duration_ms.max(0.0);
        self
    }

    /// Mark the report as unmeasured
    ///
    /// Every fallback carries the same grade whatever the domain computed
    /// from its placeholder metrics: status "insufficient", severity normal
    /// with a score of 0, and a radar value of 0.
    pub fn as_fallback(mut self) -> Self {
        self.fallback = true;
        self.severity = Severity::Normal;
        self.status = FALLBACK_STATUS.to_string();
        self.score = 0.0;
        self.radar = 0.0;
        self
    }
}

/// Per-domain metric extraction
///
/// Implementations exclusively own their sample window for the duration of
/// a test. `ingest` rejects a sample without changing state; `finalize`
/// never fails.
pub trait DomainScorer: Send {
    fn domain(&self) -> Domain;

    /// Feed one raw sample
    fn ingest(&mut self, sample: &TimedSample) -> Result<(), AssessmentError>;

    /// Metrics over the data collected so far
    fn live_metrics(&self) -> MetricSet;

    /// Produce the final report for a test that lasted `elapsed_ms`
    fn finalize(&mut self, elapsed_ms: f64) -> DomainReport;

    /// Samples accepted so far
    fn sample_count(&self) -> usize;
}

/// Shared rejection checks run before a scorer touches its state
pub(crate) fn check_sample(sample: &TimedSample) -> Result<(), AssessmentError> {
    if !sample.timestamp_ms.is_finite() || !sample.payload.is_finite() {
        return Err(AssessmentError::NonFiniteSample {
            timestamp_ms: sample.timestamp_ms,
        });
    }
    Ok(())
}

pub(crate) fn unexpected(domain: Domain, sample: &TimedSample) -> AssessmentError {
    AssessmentError::UnexpectedSample {
        domain,
        received: sample.payload.kind().to_string(),
    }
}

/// Build the scorer for `domain` after validating its config section
pub fn build_scorer(
    domain: Domain,
    config: &ScreeningConfig,
) -> Result<Box<dyn DomainScorer>, AssessmentError> {
    config.validate_domain(domain)?;
    let scorer: Box<dyn DomainScorer> = match domain {
        Domain::Voice => Box::new(VoiceScorer::new(config.voice.clone())),
        Domain::Tremor => Box::new(TremorScorer::new(config.tremor.clone())),
        Domain::Gait => Box::new(GaitScorer::new(config.gait.clone())),
        Domain::Facial => Box::new(FacialScorer::new(config.facial.clone())),
        Domain::Spiral => Box::new(SpiralScorer::new(config.spiral.clone())),
        Domain::Questionnaire => Box::new(QuestionnaireScorer::new(config.questionnaire.clone())),
    };
    Ok(scorer)
}
