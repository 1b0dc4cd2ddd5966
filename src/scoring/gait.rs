// GaitScorer - step cadence and left/right symmetry
//
// Each foot is an independent PeakDetector channel; a foot-down event is a
// fall of the vertical landmark position through the step threshold.

use crate::analysis::buffer::SampleBuffer;
use crate::analysis::peaks::{rate_per_minute, Channel, PeakDetector};
use crate::config::GaitConfig;
use crate::error::AssessmentError;
use crate::sample::{SamplePayload, TimedSample};

use super::{check_sample, unexpected, Domain, DomainReport, DomainScorer, MetricSet, Severity};

/// Recent positions kept for live display
const RECENT_POSITIONS: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GaitStatus {
    Standing,
    Slow,
    Fast,
    Normal,
}

impl GaitStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GaitStatus::Standing => "standing",
            GaitStatus::Slow => "slow",
            GaitStatus::Fast => "fast",
            GaitStatus::Normal => "normal",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            GaitStatus::Normal => Severity::Normal,
            GaitStatus::Fast => Severity::Mild,
            GaitStatus::Slow => Severity::Moderate,
            GaitStatus::Standing => Severity::Severe,
        }
    }
}

/// `100 * min / max` of the two step counts; 100 when both are zero
pub fn step_symmetry(left: usize, right: usize) -> f64 {
    let (low, high) = if left <= right { (left, right) } else { (right, left) };
    if high == 0 {
        return 100.0;
    }
    100.0 * low as f64 / high as f64
}

pub fn classify(cadence: f64, config: &GaitConfig) -> GaitStatus {
    if cadence <= 0.0 {
        GaitStatus::Standing
    } else if cadence < config.slow_cadence {
        GaitStatus::Slow
    } else if cadence > config.fast_cadence {
        GaitStatus::Fast
    } else {
        GaitStatus::Normal
    }
}

pub struct GaitScorer {
    config: GaitConfig,
    detector: PeakDetector,
    positions: SampleBuffer<(f64, f64)>,
    first_ms: Option<f64>,
    accepted: usize,
}

impl GaitScorer {
    pub fn new(config: GaitConfig) -> Self {
        let detector =
            PeakDetector::new(config.step_threshold).with_refractory_ms(config.step_refractory_ms);
        Self {
            config,
            detector,
            positions: SampleBuffer::new(RECENT_POSITIONS, None),
            first_ms: None,
            accepted: 0,
        }
    }

    fn cadence_factor(&self, cadence: f64, status: GaitStatus) -> f64 {
        match status {
            GaitStatus::Standing => 0.0,
            GaitStatus::Slow => cadence / self.config.slow_cadence,
            GaitStatus::Fast => self.config.fast_cadence / cadence,
            GaitStatus::Normal => 1.0,
        }
    }

    fn metrics(&self, elapsed_ms: f64) -> (MetricSet, f64, f64) {
        let left = self.detector.count(Channel::Left);
        let right = self.detector.count(Channel::Right);
        let cadence = rate_per_minute(left + right, elapsed_ms);
        let symmetry = step_symmetry(left, right);
        let metrics = MetricSet::new()
            .with("stepCadence", cadence)
            .with("symmetry", symmetry)
            .with("leftSteps", left as f64)
            .with("rightSteps", right as f64)
            .with("totalSteps", (left + right) as f64);
        (metrics, cadence, symmetry)
    }
}

impl DomainScorer for GaitScorer {
    fn domain(&self) -> Domain {
        Domain::Gait
    }

    fn ingest(&mut self, sample: &TimedSample) -> Result<(), AssessmentError> {
        check_sample(sample)?;
        let (left, right) = match sample.payload {
            SamplePayload::Gait { left, right } => (left, right),
            _ => return Err(unexpected(Domain::Gait, sample)),
        };
        let ts = sample.timestamp_ms;
        self.positions.push(ts, (left, right))?;
        self.first_ms.get_or_insert(ts);

        if let Some(event) = self.detector.process(Channel::Left, ts, left) {
            log::debug!("[GaitScorer] Left step at {} ms", event.timestamp_ms);
        }
        if let Some(event) = self.detector.process(Channel::Right, ts, right) {
            log::debug!("[GaitScorer] Right step at {} ms", event.timestamp_ms);
        }
        self.accepted += 1;
        Ok(())
    }

    fn live_metrics(&self) -> MetricSet {
        let elapsed = match (self.first_ms, self.positions.latest()) {
            (Some(first), Some(latest)) => latest.timestamp_ms - first,
            _ => 0.0,
        };
        self.metrics(elapsed).0
    }

    fn finalize(&mut self, elapsed_ms: f64) -> DomainReport {
        let (metrics, cadence, symmetry) = self.metrics(elapsed_ms);
        let status = classify(cadence, &self.config);
        let radar = symmetry / 100.0 * self.cadence_factor(cadence, status);
        let report = DomainReport::new(Domain::Gait, metrics, status.severity(), status.as_str(), radar)
            .with_samples(self.accepted, elapsed_ms);

        if self.accepted < 2 || elapsed_ms <= 0.0 {
            log::warn!(
                "[GaitScorer] {} samples over {} ms; cadence unavailable",
                self.accepted,
                elapsed_ms
            );
            report.as_fallback()
        } else {
            report
        }
    }

    fn sample_count(&self) -> usize {
        self.accepted
    }
}
