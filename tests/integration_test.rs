//! Integration tests for the screening core public API
//!
//! These tests exercise the numerical primitives, the domain scorers and
//! the session engine together, including:
//! - Fallback behavior of statistics on tiny windows
//! - Frequency and peak estimation on synthetic signals
//! - Status classification boundaries
//! - Session lifecycle and aggregation across domains

use std::f64::consts::PI;
use std::sync::Arc;

use motor_screening::aggregate::{AssessmentAggregator, OverallRisk};
use motor_screening::analysis::stats::{cv_stability, rms, rms_to_db, variance};
use motor_screening::analysis::{
    Algorithm, BandPolicy, CrossingReference, FrequencyBand, FrequencyEstimator, PeakDetector,
    ThresholdMode,
};
use motor_screening::config::VoiceConfig;
use motor_screening::io::{drive, SyntheticTremorSource};
use motor_screening::scoring::gait::step_symmetry;
use motor_screening::scoring::voice::{classify, VoiceStatus};
use motor_screening::telemetry::{AssessmentEvent, TelemetryCollector};
use motor_screening::{
    Domain, DomainReport, IngestOutcome, MetricSet, ScreeningConfig, ScreeningEngine, Severity,
    TimedSample,
};

fn sine(frequency_hz: f64, amplitude: f64, sample_rate_hz: f64, n: usize, phase: f64) -> Vec<f64> {
    (0..n)
        .map(|i| amplitude * (2.0 * PI * frequency_hz * i as f64 / sample_rate_hz + phase).sin())
        .collect()
}

fn engine() -> ScreeningEngine {
    ScreeningEngine::default().with_telemetry(Arc::new(TelemetryCollector::default()))
}

#[test]
fn test_small_windows_fall_back() {
    assert_eq!(variance(&[]), 0.0);
    assert_eq!(variance(&[3.5]), 0.0);
    assert_eq!(cv_stability(&[]), 100.0);
    assert_eq!(cv_stability(&[-42.0]), 100.0);
}

#[test]
fn test_db_monotonic_in_rms() {
    let levels: Vec<f64> = (0..200).map(|i| i as f64 * 0.005).collect();
    for pair in levels.windows(2) {
        assert!(rms_to_db(pair[1]) >= rms_to_db(pair[0]));
    }
    assert!(rms_to_db(0.0).is_finite());
}

#[test]
fn test_rms_of_sine() {
    let signal = sine(50.0, 1.0, 1000.0, 1000, 0.0);
    assert!((rms(&signal) - 1.0 / 2f64.sqrt()).abs() < 1e-3);
}

#[test]
fn test_zero_crossing_estimate_within_ten_percent() {
    let estimator = FrequencyEstimator::new(
        Algorithm::ZeroCrossing(CrossingReference::Mean),
        FrequencyBand::new(0.5, 500.0, BandPolicy::ZeroOutside),
    );
    for &frequency in &[5.0, 12.5, 40.0, 110.0] {
        let signal = sine(frequency, 1.0, 1000.0, 2000, 0.3);
        let estimate = estimator.estimate(&signal, 1000.0);
        assert!(
            (estimate - frequency).abs() <= 0.1 * frequency,
            "{} Hz estimated as {}",
            frequency,
            estimate
        );
    }
}

#[test]
fn test_autocorrelation_estimate_within_ten_percent() {
    let estimator = FrequencyEstimator::new(
        Algorithm::Autocorrelation,
        FrequencyBand::new(80.0, 400.0, BandPolicy::ZeroOutside),
    );
    let signal = sine(150.0, 0.5, 8000.0, 2048, 0.0);
    let estimate = estimator.estimate(&signal, 8000.0);
    assert!((estimate - 150.0).abs() <= 15.0, "estimated {}", estimate);
}

#[test]
fn test_peak_detector_counts_falling_crossings_once() {
    let threshold = ThresholdMode::Absolute(0.5);
    assert_eq!(PeakDetector::count_in(&[0.0, 1.0, 0.0, 1.0, 0.0], threshold), 2);
    assert_eq!(
        PeakDetector::count_in(&[1.0, 0.2, 0.1, 0.0, 1.0, 0.3, 0.2], threshold),
        2
    );
}

#[test]
fn test_gait_symmetry_edges() {
    assert_eq!(step_symmetry(10, 10), 100.0);
    assert_eq!(step_symmetry(0, 0), 100.0);
    assert!(step_symmetry(0, 4).is_finite());
}

#[test]
fn test_voice_classification_order() {
    let config = VoiceConfig::default();
    assert_eq!(classify(-55.0, 100.0, &config), VoiceStatus::Silent);
    assert_eq!(classify(-55.0, 10.0, &config), VoiceStatus::Silent);
    assert_eq!(classify(-30.0, 60.0, &config), VoiceStatus::Unstable);
    assert_eq!(classify(-10.0, 60.0, &config), VoiceStatus::Unstable);
    assert_eq!(classify(-10.0, 95.0, &config), VoiceStatus::Loud);
}

#[test]
fn test_aggregator_risk_bands() {
    let aggregator = AssessmentAggregator::default();
    let normal = DomainReport::new(Domain::Voice, MetricSet::new(), Severity::Normal, "normal", 1.0);
    let mild = DomainReport::new(Domain::Gait, MetricSet::new(), Severity::Mild, "slow", 0.7);

    let none: Vec<DomainReport> = Vec::new();
    assert_eq!(aggregator.aggregate(&none).overall_risk, OverallRisk::Incomplete);
    assert_eq!(
        aggregator.aggregate([&normal]).overall_risk,
        OverallRisk::Incomplete
    );
    assert_eq!(
        aggregator.aggregate([&normal, &mild]).overall_risk,
        OverallRisk::Low
    );
}

#[test]
fn test_single_sample_finalize_every_domain() {
    let samples = [
        (Domain::Voice, TimedSample::audio(0.0, vec![0.1; 512], 16_000)),
        (Domain::Tremor, TimedSample::motion(0.0, 0.4, 0.1, 0.0)),
        (Domain::Gait, TimedSample::gait(0.0, 0.2, 0.0)),
        (Domain::Facial, TimedSample::face(0.0, 0.3, 0.3)),
        (Domain::Spiral, TimedSample::pen(0.0, 10.0, 10.0)),
        (Domain::Questionnaire, TimedSample::answer(0.0, 0, 1)),
    ];

    let mut engine = engine();
    for (domain, sample) in samples {
        let handle = engine.start_session(domain).unwrap();
        assert_eq!(engine.ingest(handle, &sample).unwrap(), IngestOutcome::Accepted);
        let report = engine.finalize(handle).unwrap();
        assert_eq!(report.domain, domain);
        assert!((0.0..=1.0).contains(&report.radar));
        assert!(report.metrics.iter().all(|(_, value)| value.is_finite()));
        if domain != Domain::Questionnaire {
            assert!(report.fallback, "{} should report fallback values", domain);
            assert_eq!(report.status, "insufficient");
            assert_eq!(report.severity, Severity::Normal);
            assert_eq!(report.radar, 0.0);
        }
    }
    assert_eq!(engine.results().len(), 6);

    // Only the answered questionnaire was measured
    let summary = engine.summary();
    assert_eq!(summary.completed_domains, vec![Domain::Questionnaire]);
    assert_eq!(summary.radar.len(), 1);
    assert_eq!(summary.radar.get(Domain::Tremor), None);
    assert_eq!(summary.radar.get(Domain::Gait), None);
    assert_eq!(summary.overall_risk, OverallRisk::Incomplete);
}

#[test]
fn test_five_hz_tremor_end_to_end() {
    let mut engine = engine();
    let handle = engine.start_session(Domain::Tremor).unwrap();
    for i in 0..300 {
        let t = i as f64 / 60.0;
        let x = 2.0 * (2.0 * PI * 5.0 * t).sin();
        engine
            .ingest(handle, &TimedSample::motion(t * 1000.0, x, 0.0, 0.0))
            .unwrap();
    }
    let report = engine.finalize(handle).unwrap();

    let frequency = report.metrics.get("frequencyHz").unwrap();
    let amplitude = report.metrics.get("amplitudeMm").unwrap();
    assert!((4.5..=5.5).contains(&frequency), "frequency {}", frequency);
    assert!((1.5..=2.5).contains(&amplitude), "amplitude {}", amplitude);
    assert!(matches!(report.severity, Severity::Normal | Severity::Mild));
    assert!(!report.fallback);
}

#[test]
fn test_full_screening_summary() {
    let collector = Arc::new(TelemetryCollector::new(64, 64));
    let mut engine = ScreeningEngine::new(ScreeningConfig::default())
        .with_telemetry(Arc::clone(&collector));
    let mut events = collector.subscribe();

    let tremor = engine.start_session(Domain::Tremor).unwrap();
    let mut source = SyntheticTremorSource::new(5.0, 2.0, 5.0, 60.0, 11).with_noise(0.02);
    drive(&mut engine, tremor, &mut source).unwrap();

    let questionnaire = engine.start_session(Domain::Questionnaire).unwrap();
    for item in 0..10u8 {
        engine
            .ingest(questionnaire, &TimedSample::answer(item as f64, item, 0))
            .unwrap();
    }
    engine.finalize(questionnaire).unwrap();

    let summary = engine.summary();
    assert_eq!(summary.completed_domains, vec![Domain::Tremor, Domain::Questionnaire]);
    assert_ne!(summary.overall_risk, OverallRisk::Incomplete);
    assert_eq!(summary.radar.get(Domain::Questionnaire), Some(1.0));

    let first = events.try_recv().unwrap();
    assert!(matches!(first, AssessmentEvent::SessionStarted { .. }));
}
