// SpiralScorer - path geometry of a single drawn stroke
//
// tremorIndex is a smoothness measure: the mean magnitude of the discrete
// second difference (local change of direction and speed) relative to the
// mean segment length. A smooth curve drawn with dense points scores near
// 0; shaky strokes score higher.

use crate::analysis::buffer::SampleBuffer;
use crate::analysis::stats::clamp_unit;
use crate::config::SpiralConfig;
use crate::error::AssessmentError;
use crate::sample::{SamplePayload, TimedSample};

use super::{check_sample, unexpected, Domain, DomainReport, DomainScorer, MetricSet, Severity};

fn distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    ((b.0 - a.0).powi(2) + (b.1 - a.1).powi(2)).sqrt()
}

/// Sum of euclidean distances between consecutive points
pub fn path_length(points: &[(f64, f64)]) -> f64 {
    points.windows(2).map(|pair| distance(pair[0], pair[1])).sum()
}

/// Mean |p[i+1] - 2 p[i] + p[i-1]| divided by the mean segment length
///
/// 0 for fewer than 3 points or a stroke with no movement.
pub fn tremor_index(points: &[(f64, f64)]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mean_segment = path_length(points) / (points.len() - 1) as f64;
    if mean_segment <= f64::EPSILON {
        return 0.0;
    }
    let deviation: f64 = points
        .windows(3)
        .map(|w| {
            let dx = w[2].0 - 2.0 * w[1].0 + w[0].0;
            let dy = w[2].1 - 2.0 * w[1].1 + w[0].1;
            (dx * dx + dy * dy).sqrt()
        })
        .sum::<f64>()
        / (points.len() - 2) as f64;
    deviation / mean_segment
}

/// `max(0, min(1, (ideal - index) / ideal))`
pub fn radar_value(index: f64, ideal_index: f64) -> f64 {
    if ideal_index <= 0.0 {
        return 0.0;
    }
    clamp_unit((ideal_index - index) / ideal_index)
}

pub fn severity_for_radar(radar: f64) -> Severity {
    if radar >= 0.75 {
        Severity::Normal
    } else if radar >= 0.5 {
        Severity::Mild
    } else if radar >= 0.25 {
        Severity::Moderate
    } else {
        Severity::Severe
    }
}

pub struct SpiralScorer {
    config: SpiralConfig,
    stroke: SampleBuffer<(f64, f64)>,
}

impl SpiralScorer {
    pub fn new(config: SpiralConfig) -> Self {
        let stroke = SampleBuffer::new(config.max_points, None);
        Self { config, stroke }
    }

    fn points(&self) -> Vec<(f64, f64)> {
        self.stroke.iter().map(|s| s.value).collect()
    }

    fn metrics(&self) -> (MetricSet, f64) {
        let points = self.points();
        let length = path_length(&points);
        let index = tremor_index(&points);
        let velocity = if points.is_empty() {
            0.0
        } else {
            length / points.len() as f64
        };
        let span_s = self.stroke.span_ms() / 1000.0;
        let speed = if span_s > 0.0 { length / span_s } else { 0.0 };

        let metrics = MetricSet::new()
            .with("pathLength", length)
            .with("velocity", velocity)
            .with("drawingSpeed", speed)
            .with("tremorIndex", index)
            .with("pointCount", points.len() as f64);
        (metrics, index)
    }
}

impl DomainScorer for SpiralScorer {
    fn domain(&self) -> Domain {
        Domain::Spiral
    }

    fn ingest(&mut self, sample: &TimedSample) -> Result<(), AssessmentError> {
        check_sample(sample)?;
        let point = match sample.payload {
            SamplePayload::Pen { x, y } => (x, y),
            _ => return Err(unexpected(Domain::Spiral, sample)),
        };
        self.stroke.push(sample.timestamp_ms, point)?;
        if self.stroke.evicted_count() == 1 {
            log::warn!(
                "[SpiralScorer] Stroke exceeds {} points; oldest points dropped",
                self.config.max_points
            );
        }
        Ok(())
    }

    fn live_metrics(&self) -> MetricSet {
        self.metrics().0
    }

    fn finalize(&mut self, elapsed_ms: f64) -> DomainReport {
        let (metrics, index) = self.metrics();
        let radar = radar_value(index, self.config.ideal_index);
        let severity = severity_for_radar(radar);
        let report = DomainReport::new(Domain::Spiral, metrics, severity, severity.as_str(), radar)
            .with_samples(self.stroke.len(), elapsed_ms);

        if self.stroke.len() < 3 {
            log::warn!(
                "[SpiralScorer] Stroke has {} points; tremor index unavailable",
                self.stroke.len()
            );
            report.as_fallback()
        } else {
            report
        }
    }

    fn sample_count(&self) -> usize {
        self.stroke.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn archimedean(points: usize, jitter: f64, seed: u64) -> Vec<(f64, f64)> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..points)
            .map(|i| {
                let theta = i as f64 * 0.05;
                let r = 5.0 + 4.0 * theta;
                let noise_x = if jitter > 0.0 { rng.gen_range(-jitter..jitter) } else { 0.0 };
                let noise_y = if jitter > 0.0 { rng.gen_range(-jitter..jitter) } else { 0.0 };
                (r * theta.cos() + noise_x, r * theta.sin() + noise_y)
            })
            .collect()
    }

    fn draw(points: &[(f64, f64)]) -> SpiralScorer {
        let mut scorer = SpiralScorer::new(SpiralConfig::default());
        for (i, &(x, y)) in points.iter().enumerate() {
            scorer.ingest(&TimedSample::pen(i as f64 * 10.0, x, y)).unwrap();
        }
        scorer
    }

    #[test]
    fn test_path_length_of_square() {
        let square = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0), (0.0, 0.0)];
        assert_eq!(path_length(&square), 4.0);
        assert_eq!(tremor_index(&[(0.0, 0.0), (1.0, 1.0)]), 0.0);
        assert_eq!(tremor_index(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]), 0.0);
    }

    #[test]
    fn test_smooth_spiral_is_normal() {
        let mut scorer = draw(&archimedean(400, 0.0, 1));
        let report = scorer.finalize(4000.0);
        let index = report.metrics.get("tremorIndex").unwrap();
        assert!(index < 0.1, "index {}", index);
        assert_eq!(report.severity, Severity::Normal);
        assert!(report.radar > 0.9);
    }

    #[test]
    fn test_shaky_spiral_scores_worse() {
        let smooth = draw(&archimedean(400, 0.0, 1)).live_metrics();
        let shaky = draw(&archimedean(400, 2.0, 7)).live_metrics();
        assert!(shaky.get("tremorIndex").unwrap() > smooth.get("tremorIndex").unwrap() * 5.0);
    }

    #[test]
    fn test_deterministic_for_same_points() {
        let points = archimedean(200, 1.0, 3);
        let a = draw(&points).finalize(2000.0);
        let b = draw(&points).finalize(2000.0);
        assert_eq!(a, b);
    }

    #[test]
    fn test_velocity_and_speed() {
        let mut scorer = SpiralScorer::new(SpiralConfig::default());
        for i in 0..5 {
            scorer
                .ingest(&TimedSample::pen(i as f64 * 250.0, i as f64 * 10.0, 0.0))
                .unwrap();
        }
        let metrics = scorer.live_metrics();
        assert_eq!(metrics.get("pathLength"), Some(40.0));
        assert_eq!(metrics.get("velocity"), Some(8.0));
        assert_eq!(metrics.get("drawingSpeed"), Some(40.0));
    }

    #[test]
    fn test_radar_normalization() {
        assert_eq!(radar_value(0.0, 1.0), 1.0);
        assert_eq!(radar_value(0.5, 1.0), 0.5);
        assert_eq!(radar_value(3.0, 1.0), 0.0);
        assert_eq!(severity_for_radar(0.5), Severity::Mild);
        assert_eq!(severity_for_radar(0.1), Severity::Severe);
    }

    #[test]
    fn test_single_point_fallback() {
        let mut scorer = SpiralScorer::new(SpiralConfig::default());
        scorer.ingest(&TimedSample::pen(0.0, 3.0, 4.0)).unwrap();
        let report = scorer.finalize(0.0);
        assert!(report.fallback);
        assert_eq!(report.radar, 0.0);
        assert_eq!(report.metrics.get("pathLength"), Some(0.0));
        assert_eq!(report.metrics.get("velocity"), Some(0.0));
    }
}
