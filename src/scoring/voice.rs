// VoiceScorer - sustained-phonation volume, pitch and perturbation
//
// Two phases:
// 1. Calibration (first `calibration_ms` of frames): per-frame dB levels are
//    collected and the noise floor is the mean of the quietest fraction.
// 2. Steady state: every frame yields volumeDb, pitchHz and, for voiced
//    frames, jitter/shimmer/HNR. volumeDb feeds a rolling buffer whose
//    coefficient-of-variation is the stability metric.

use crate::analysis::buffer::SampleBuffer;
use crate::analysis::frequency::FrequencyEstimator;
use crate::analysis::perturbation::{hnr_db, jitter_percent, shimmer_percent, Cycles};
use crate::analysis::stats::{cv_stability, mean, mean_of_lowest, rms, rms_to_db};
use crate::config::VoiceConfig;
use crate::error::AssessmentError;
use crate::sample::{SamplePayload, TimedSample};

use super::{check_sample, unexpected, Domain, DomainReport, DomainScorer, MetricSet, Severity};

/// Calibration frames retained at most
const MAX_CALIBRATION_FRAMES: usize = 4096;

/// Voice status label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceStatus {
    Silent,
    Unstable,
    Loud,
    Quiet,
    Normal,
}

impl VoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoiceStatus::Silent => "silent",
            VoiceStatus::Unstable => "unstable",
            VoiceStatus::Loud => "loud",
            VoiceStatus::Quiet => "quiet",
            VoiceStatus::Normal => "normal",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            VoiceStatus::Normal => Severity::Normal,
            VoiceStatus::Loud | VoiceStatus::Quiet => Severity::Mild,
            VoiceStatus::Unstable => Severity::Moderate,
            VoiceStatus::Silent => Severity::Severe,
        }
    }
}

/// Classify a volume/stability pair; the first matching rule wins
///
/// silent, then unstable, then loud, then quiet, else normal.
pub fn classify(volume_db: f64, stability: f64, config: &VoiceConfig) -> VoiceStatus {
    if volume_db < config.silent_db {
        VoiceStatus::Silent
    } else if stability < config.unstable_stability {
        VoiceStatus::Unstable
    } else if volume_db > config.loud_db {
        VoiceStatus::Loud
    } else if volume_db < config.quiet_db {
        VoiceStatus::Quiet
    } else {
        VoiceStatus::Normal
    }
}

/// Per-frame measurements
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReading {
    pub volume_db: f64,
    pub pitch_hz: f64,
    pub jitter_percent: Option<f64>,
    pub shimmer_percent: Option<f64>,
    pub hnr_db: Option<f64>,
}

pub struct VoiceScorer {
    config: VoiceConfig,
    estimator: FrequencyEstimator,
    first_frame_ms: Option<f64>,
    calibration: SampleBuffer<f64>,
    baseline_db: Option<f64>,
    levels: SampleBuffer<f64>,
    last_reading: Option<FrameReading>,
    voiced_pitch: Vec<f64>,
    jitter: Vec<f64>,
    shimmer: Vec<f64>,
    hnr: Vec<f64>,
    frames: usize,
}

impl VoiceScorer {
    pub fn new(config: VoiceConfig) -> Self {
        let estimator = FrequencyEstimator::new(config.pitch_algorithm, config.pitch_band);
        let rolling = config.rolling_window;
        Self {
            config,
            estimator,
            first_frame_ms: None,
            calibration: SampleBuffer::new(MAX_CALIBRATION_FRAMES, None),
            baseline_db: None,
            levels: SampleBuffer::new(rolling, None),
            last_reading: None,
            voiced_pitch: Vec::new(),
            jitter: Vec::new(),
            shimmer: Vec::new(),
            hnr: Vec::new(),
            frames: 0,
        }
    }

    pub fn baseline_db(&self) -> Option<f64> {
        self.baseline_db
    }

    pub fn is_calibrating(&self) -> bool {
        self.baseline_db.is_none()
    }

    /// Measure one audio frame without touching scorer state
    pub fn measure(&self, frame: &[f64], sample_rate_hz: f64) -> FrameReading {
        let volume_db = rms_to_db(rms(frame));
        let pitch_hz = self.estimator.estimate(frame, sample_rate_hz);

        if pitch_hz <= 0.0 {
            return FrameReading {
                volume_db,
                pitch_hz,
                jitter_percent: None,
                shimmer_percent: None,
                hnr_db: None,
            };
        }

        let cycles = Cycles::extract(frame, sample_rate_hz);
        let (jitter, shimmer) = if cycles.len() >= 2 {
            (Some(jitter_percent(&cycles)), Some(shimmer_percent(&cycles)))
        } else {
            (None, None)
        };
        let hnr = self
            .estimator
            .autocorrelation_peak(frame, sample_rate_hz)
            .map(|(_, r)| hnr_db(r));

        FrameReading {
            volume_db,
            pitch_hz,
            jitter_percent: jitter,
            shimmer_percent: shimmer,
            hnr_db: hnr,
        }
    }

    fn establish_baseline(&mut self, current_db: f64) {
        let levels = self.calibration.values();
        let baseline = if levels.len() >= self.config.min_calibration_frames {
            mean_of_lowest(&levels, self.config.noise_floor_fraction).unwrap_or(current_db)
        } else {
            log::warn!(
                "[VoiceScorer] Only {} calibration frames (need {}); using current reading {:.1} dB as baseline",
                levels.len(),
                self.config.min_calibration_frames,
                current_db
            );
            current_db
        };
        log::info!("[VoiceScorer] Noise floor baseline {:.1} dB", baseline);
        self.baseline_db = Some(baseline);
    }

    fn stability(&self) -> f64 {
        cv_stability(&self.levels.values())
    }

    fn mean_volume(&self) -> Option<f64> {
        if self.levels.is_empty() {
            None
        } else {
            Some(mean(&self.levels.values()))
        }
    }

    fn mean_pitch(&self) -> f64 {
        mean(&self.voiced_pitch)
    }
}

impl DomainScorer for VoiceScorer {
    fn domain(&self) -> Domain {
        Domain::Voice
    }

    fn ingest(&mut self, sample: &TimedSample) -> Result<(), AssessmentError> {
        check_sample(sample)?;
        let (samples, sample_rate) = match &sample.payload {
            SamplePayload::Audio {
                samples,
                sample_rate,
            } => (samples, *sample_rate),
            _ => return Err(unexpected(Domain::Voice, sample)),
        };
        if sample_rate == 0 {
            return Err(unexpected(Domain::Voice, sample));
        }

        let frame: Vec<f64> = samples.iter().map(|&s| s as f64).collect();
        let reading = self.measure(&frame, sample_rate as f64);
        let ts = sample.timestamp_ms;
        let first = *self.first_frame_ms.get_or_insert(ts);

        if self.baseline_db.is_none() && ts - first < self.config.calibration_ms {
            self.calibration.push(ts, reading.volume_db)?;
        } else {
            self.levels.push(ts, reading.volume_db)?;
            if self.baseline_db.is_none() {
                self.establish_baseline(reading.volume_db);
            }
            if reading.pitch_hz > 0.0 {
                self.voiced_pitch.push(reading.pitch_hz);
            }
            self.jitter.extend(reading.jitter_percent);
            self.shimmer.extend(reading.shimmer_percent);
            self.hnr.extend(reading.hnr_db);
        }

        self.frames += 1;
        self.last_reading = Some(reading);
        Ok(())
    }

    fn live_metrics(&self) -> MetricSet {
        let reading = self.last_reading;
        MetricSet::new()
            .with("volumeDb", reading.map(|r| r.volume_db).unwrap_or(rms_to_db(0.0)))
            .with("pitchHz", reading.map(|r| r.pitch_hz).unwrap_or(0.0))
            .with("stability", self.stability())
            .with("baselineDb", self.baseline_db.unwrap_or(0.0))
    }

    fn finalize(&mut self, elapsed_ms: f64) -> DomainReport {
        let stability = self.stability();
        let baseline = self.baseline_db.unwrap_or_else(|| {
            // Test ended during calibration: still report a noise floor when possible
            let levels = self.calibration.values();
            if levels.len() >= self.config.min_calibration_frames {
                mean_of_lowest(&levels, self.config.noise_floor_fraction).unwrap_or(0.0)
            } else {
                self.last_reading.map(|r| r.volume_db).unwrap_or(0.0)
            }
        });

        let (volume_db, fallback) = match self.mean_volume() {
            Some(volume) => (volume, false),
            None => {
                log::warn!(
                    "[VoiceScorer] No steady-state frames after {} frames; reporting last reading",
                    self.frames
                );
                (
                    self.last_reading
                        .map(|r| r.volume_db)
                        .unwrap_or_else(|| rms_to_db(0.0)),
                    true,
                )
            }
        };

        let status = classify(volume_db, stability, &self.config);
        let metrics = MetricSet::new()
            .with("volumeDb", volume_db)
            .with("pitchHz", self.mean_pitch())
            .with("stability", stability)
            .with("jitterPercent", mean(&self.jitter))
            .with("shimmerPercent", mean(&self.shimmer))
            .with("hnrDb", mean(&self.hnr))
            .with("baselineDb", baseline)
            .with("frames", self.frames as f64);

        let radar = if status == VoiceStatus::Silent {
            0.0
        } else {
            stability / 100.0
        };

        let report = DomainReport::new(Domain::Voice, metrics, status.severity(), status.as_str(), radar)
            .with_samples(self.frames, elapsed_ms);
        if fallback {
            report.as_fallback()
        } else {
            report
        }
    }

    fn sample_count(&self) -> usize {
        self.frames
    }
}
