// FacialScorer - blink rate and left/right eye symmetry
//
// Blinks are detected on the mean eye-aspect-ratio: one blink per fall
// from >= threshold to < threshold, debounced by a refractory period so a
// single closure never counts twice.

use crate::analysis::buffer::SampleBuffer;
use crate::analysis::peaks::{rate_per_minute, Channel, FallingEdge, PeakDetector, ThresholdMode};
use crate::config::FacialConfig;
use crate::error::AssessmentError;
use crate::sample::{SamplePayload, TimedSample};

use super::{check_sample, unexpected, Domain, DomainReport, DomainScorer, MetricSet, Severity};

const RECENT_FRAMES: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacialStatus {
    Reduced,
    Increased,
    Asymmetric,
    Normal,
}

impl FacialStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FacialStatus::Reduced => "reduced",
            FacialStatus::Increased => "increased",
            FacialStatus::Asymmetric => "asymmetric",
            FacialStatus::Normal => "normal",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            FacialStatus::Normal => Severity::Normal,
            FacialStatus::Increased | FacialStatus::Asymmetric => Severity::Mild,
            FacialStatus::Reduced => Severity::Moderate,
        }
    }
}

/// `100 * min / max` of the mean eye-aspect-ratios; 100 when both are zero
pub fn ear_symmetry(mean_left: f64, mean_right: f64) -> f64 {
    let high = mean_left.max(mean_right);
    if high <= 0.0 {
        return 100.0;
    }
    (100.0 * mean_left.min(mean_right).max(0.0) / high).clamp(0.0, 100.0)
}

pub fn classify(blink_rate: f64, symmetry: f64, config: &FacialConfig) -> FacialStatus {
    if blink_rate < config.reduced_blink_rate {
        FacialStatus::Reduced
    } else if blink_rate > config.increased_blink_rate {
        FacialStatus::Increased
    } else if symmetry < config.min_symmetry {
        FacialStatus::Asymmetric
    } else {
        FacialStatus::Normal
    }
}

pub struct FacialScorer {
    config: FacialConfig,
    detector: PeakDetector,
    frames: SampleBuffer<(f64, f64)>,
    first_ms: Option<f64>,
    left_sum: f64,
    right_sum: f64,
    accepted: usize,
}

impl FacialScorer {
    pub fn new(config: FacialConfig) -> Self {
        let detector = PeakDetector::new(ThresholdMode::Absolute(config.blink_threshold))
            .with_edge(FallingEdge::Below)
            .with_refractory_ms(config.blink_refractory_ms);
        Self {
            config,
            detector,
            frames: SampleBuffer::new(RECENT_FRAMES, None),
            first_ms: None,
            left_sum: 0.0,
            right_sum: 0.0,
            accepted: 0,
        }
    }

    fn symmetry(&self) -> f64 {
        if self.accepted == 0 {
            return 100.0;
        }
        let n = self.accepted as f64;
        ear_symmetry(self.left_sum / n, self.right_sum / n)
    }

    fn metrics(&self, elapsed_ms: f64) -> (MetricSet, f64, f64) {
        let blinks = self.detector.count(Channel::Primary);
        let blink_rate = rate_per_minute(blinks, elapsed_ms);
        let symmetry = self.symmetry();
        let n = self.accepted.max(1) as f64;
        let metrics = MetricSet::new()
            .with("blinkRate", blink_rate)
            .with("blinkCount", blinks as f64)
            .with("symmetry", symmetry)
            .with("meanLeftEar", self.left_sum / n)
            .with("meanRightEar", self.right_sum / n);
        (metrics, blink_rate, symmetry)
    }

    fn blink_factor(&self, blink_rate: f64) -> f64 {
        if blink_rate < self.config.reduced_blink_rate {
            blink_rate / self.config.reduced_blink_rate
        } else if blink_rate > self.config.increased_blink_rate {
            self.config.increased_blink_rate / blink_rate
        } else {
            1.0
        }
    }
}

impl DomainScorer for FacialScorer {
    fn domain(&self) -> Domain {
        Domain::Facial
    }

    fn ingest(&mut self, sample: &TimedSample) -> Result<(), AssessmentError> {
        check_sample(sample)?;
        let (left, right) = match sample.payload {
            SamplePayload::Face {
                left_ear,
                right_ear,
            } => (left_ear, right_ear),
            _ => return Err(unexpected(Domain::Facial, sample)),
        };
        let ts = sample.timestamp_ms;
        self.frames.push(ts, (left, right))?;
        self.first_ms.get_or_insert(ts);

        let ear = (left + right) / 2.0;
        if let Some(event) = self.detector.process(Channel::Primary, ts, ear) {
            log::debug!("[FacialScorer] Blink at {} ms (EAR {:.3})", event.timestamp_ms, ear);
        }
        self.left_sum += left;
        self.right_sum += right;
        self.accepted += 1;
        Ok(())
    }

    fn live_metrics(&self) -> MetricSet {
        let elapsed = match (self.first_ms, self.frames.latest()) {
            (Some(first), Some(latest)) => latest.timestamp_ms - first,
            _ => 0.0,
        };
        self.metrics(elapsed).0
    }

    fn finalize(&mut self, elapsed_ms: f64) -> DomainReport {
        let (metrics, blink_rate, symmetry) = self.metrics(elapsed_ms);
        let status = classify(blink_rate, symmetry, &self.config);
        let radar = symmetry / 100.0 * self.blink_factor(blink_rate);
        let report = DomainReport::new(Domain::Facial, metrics, status.severity(), status.as_str(), radar)
            .with_samples(self.accepted, elapsed_ms);

        if self.accepted < 2 || elapsed_ms <= 0.0 {
            log::warn!(
                "[FacialScorer] {} frames over {} ms; blink rate unavailable",
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
