// TremorScorer - amplitude and dominant frequency of hand tremor
//
// Motion vectors (or scalar landmark distances) accumulate in a sliding
// time window. Once enough samples are buffered the axis with the largest
// variance becomes the analysis series:
//   amplitude = stddev(series) * amplitude_scale
//   frequency = band-clamped zero-crossing-about-mean estimate
//   score     = amplitude_share * min(100, amplitude * amplitude_weight)
//             + frequency_share * min(100, frequency * frequency_weight)

use crate::analysis::buffer::SampleBuffer;
use crate::analysis::frequency::FrequencyEstimator;
use crate::analysis::stats::{stddev, variance};
use crate::config::TremorConfig;
use crate::error::AssessmentError;
use crate::sample::{SamplePayload, TimedSample};

use super::{check_sample, unexpected, Domain, DomainReport, DomainScorer, MetricSet, Severity};

/// Metrics computed over one window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TremorReading {
    pub amplitude_mm: f64,
    pub frequency_hz: f64,
    pub amplitude_score: f64,
    pub frequency_score: f64,
    pub severity_score: f64,
    pub window_samples: usize,
}

/// Map a 0-100 tremor score onto the ordinal scale
pub fn severity_for_score(score: f64, config: &TremorConfig) -> Severity {
    if score < config.mild_from {
        Severity::Normal
    } else if score < config.moderate_from {
        Severity::Mild
    } else if score < config.severe_from {
        Severity::Moderate
    } else {
        Severity::Severe
    }
}

/// Combine amplitude and frequency into the bounded severity score
///
/// # Returns
/// `(amplitude_score, frequency_score, severity_score)`, each in [0, 100]
pub fn tremor_score(amplitude: f64, frequency_hz: f64, config: &TremorConfig) -> (f64, f64, f64) {
    let amplitude_score = (amplitude * config.amplitude_weight).clamp(0.0, 100.0);
    let frequency_score = (frequency_hz * config.frequency_weight).clamp(0.0, 100.0);
    let severity = (amplitude_score * config.amplitude_share
        + frequency_score * config.frequency_share)
        .clamp(0.0, 100.0);
    (amplitude_score, frequency_score, severity)
}

pub struct TremorScorer {
    config: TremorConfig,
    estimator: FrequencyEstimator,
    window: SampleBuffer<[f64; 3]>,
    accepted: usize,
}

impl TremorScorer {
    pub fn new(config: TremorConfig) -> Self {
        let estimator = FrequencyEstimator::new(config.algorithm, config.band);
        let window = SampleBuffer::new(config.window_capacity, Some(config.window_ms));
        Self {
            config,
            estimator,
            window,
            accepted: 0,
        }
    }

    /// Component with the largest variance over the window
    fn dominant_axis(&self) -> Vec<f64> {
        let axes: Vec<Vec<f64>> = (0..3)
            .map(|axis| self.window.iter().map(|s| s.value[axis]).collect())
            .collect();
        axes.into_iter()
            .map(|series| (variance(&series), series))
            .fold((f64::NEG_INFINITY, Vec::new()), |best, candidate| {
                if candidate.0 > best.0 {
                    candidate
                } else {
                    best
                }
            })
            .1
    }

    /// Analyse the current window; `None` while fewer than `min_samples`
    pub fn reading(&self) -> Option<TremorReading> {
        if self.window.require(self.config.min_samples).is_err() {
            return None;
        }

        let series = self.dominant_axis();
        let rate_hz = self
            .window
            .observed_rate_hz()
            .unwrap_or(self.config.nominal_rate_hz);

        let amplitude_mm = stddev(&series) * self.config.amplitude_scale;
        let frequency_hz = self.estimator.estimate(&series, rate_hz);
        let (amplitude_score, frequency_score, severity_score) =
            tremor_score(amplitude_mm, frequency_hz, &self.config);

        Some(TremorReading {
            amplitude_mm,
            frequency_hz,
            amplitude_score,
            frequency_score,
            severity_score,
            window_samples: series.len(),
        })
    }

    fn metrics(reading: &TremorReading) -> MetricSet {
        MetricSet::new()
            .with("amplitudeMm", reading.amplitude_mm)
            .with("frequencyHz", reading.frequency_hz)
            .with("severityScore", reading.severity_score)
            .with("amplitudeScore", reading.amplitude_score)
            .with("frequencyScore", reading.frequency_score)
            .with("windowSamples", reading.window_samples as f64)
    }
}

impl DomainScorer for TremorScorer {
    fn domain(&self) -> Domain {
        Domain::Tremor
    }

    fn ingest(&mut self, sample: &TimedSample) -> Result<(), AssessmentError> {
        check_sample(sample)?;
        let axes = match sample.payload {
            SamplePayload::Motion { axes } => axes,
            SamplePayload::Scalar { value } => [value, 0.0, 0.0],
            _ => return Err(unexpected(Domain::Tremor, sample)),
        };
        self.window.push(sample.timestamp_ms, axes)?;
        self.accepted += 1;
        Ok(())
    }

    fn live_metrics(&self) -> MetricSet {
        match self.reading() {
            Some(reading) => Self::metrics(&reading),
            None => MetricSet::new().with("windowSamples", self.window.len() as f64),
        }
    }

    fn finalize(&mut self, elapsed_ms: f64) -> DomainReport {
        match self.reading() {
            Some(reading) => {
                let severity = severity_for_score(reading.severity_score, &self.config);
                log::info!(
                    "[TremorScorer] amplitude={:.2} frequency={:.2}Hz score={:.1} -> {}",
                    reading.amplitude_mm,
                    reading.frequency_hz,
                    reading.severity_score,
                    severity
                );
                DomainReport::new(
                    Domain::Tremor,
                    Self::metrics(&reading),
                    severity,
                    severity.as_str(),
                    1.0 - reading.severity_score / 100.0,
                )
                .with_samples(self.accepted, elapsed_ms)
            }
            None => {
                log::warn!(
                    "[TremorScorer] {} samples buffered (need {}); reporting fallback values",
                    self.window.len(),
                    self.config.min_samples
                );
                let fallback = TremorReading {
                    amplitude_mm: 0.0,
                    frequency_hz: 0.0,
                    amplitude_score: 0.0,
                    frequency_score: 0.0,
                    severity_score: 0.0,
                    window_samples: self.window.len(),
                };
                DomainReport::new(
                    Domain::Tremor,
                    Self::metrics(&fallback),
                    Severity::Normal,
                    super::FALLBACK_STATUS,
                    0.0,
                )
                .with_samples(self.accepted, elapsed_ms)
                .as_fallback()
            }
        }
    }

    fn sample_count(&self) -> usize {
        self.accepted
    }
}
