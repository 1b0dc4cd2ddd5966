// Perturbation module - cycle-to-cycle voice measures
//
// Jitter and shimmer compare consecutive glottal cycles. Cycles are
// delimited by upward zero crossings (located with linear interpolation);
// each cycle contributes its period and its peak absolute amplitude.
// HNR converts the normalized autocorrelation peak r into a ratio of
// periodic to aperiodic energy.

/// Lower and upper bounds for reported HNR in dB
pub const HNR_FLOOR_DB: f64 = -20.0;
pub const HNR_CEILING_DB: f64 = 40.0;

/// Period (seconds) and peak amplitude of each complete cycle in a frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cycles {
    pub periods_s: Vec<f64>,
    pub peaks: Vec<f64>,
}

impl Cycles {
    /// Split a frame into cycles at upward zero crossings
    pub fn extract(frame: &[f64], sample_rate_hz: f64) -> Self {
        if frame.len() < 3 || sample_rate_hz <= 0.0 {
            return Self::default();
        }

        let mut crossings: Vec<(f64, usize)> = Vec::new();
        for i in 1..frame.len() {
            let (a, b) = (frame[i - 1], frame[i]);
            if a < 0.0 && b >= 0.0 {
                let fraction = if (b - a).abs() > f64::EPSILON {
                    -a / (b - a)
                } else {
                    0.0
                };
                crossings.push(((i - 1) as f64 + fraction, i));
            }
        }

        let mut cycles = Self::default();
        for pair in crossings.windows(2) {
            let (start_pos, start_idx) = pair[0];
            let (end_pos, end_idx) = pair[1];
            cycles.periods_s.push((end_pos - start_pos) / sample_rate_hz);
            let peak = frame[start_idx..end_idx]
                .iter()
                .fold(0.0f64, |acc, v| acc.max(v.abs()));
            cycles.peaks.push(peak);
        }
        cycles
    }

    pub fn len(&self) -> usize {
        self.periods_s.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods_s.is_empty()
    }
}

/// Mean absolute difference between consecutive values relative to their
/// mean, in percent. 0 for fewer than 2 values or a zero mean.
pub fn relative_perturbation_percent(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    if mean.abs() < f64::EPSILON {
        return 0.0;
    }
    let diff_sum: f64 = values.windows(2).map(|pair| (pair[1] - pair[0]).abs()).sum();
    let mean_diff = diff_sum / (values.len() - 1) as f64;
    100.0 * mean_diff / mean.abs()
}

/// Local jitter: cycle-period perturbation in percent
pub fn jitter_percent(cycles: &Cycles) -> f64 {
    relative_perturbation_percent(&cycles.periods_s)
}

/// Local shimmer: cycle-amplitude perturbation in percent
pub fn shimmer_percent(cycles: &Cycles) -> f64 {
    relative_perturbation_percent(&cycles.peaks)
}

/// Harmonics-to-noise ratio from a normalized autocorrelation peak
///
/// `10 * log10(r / (1 - r))`, clamped to [-20, 40] dB.
pub fn hnr_db(r: f64) -> f64 {
    if !r.is_finite() || r <= 0.0 {
        return HNR_FLOOR_DB;
    }
    if r >= 1.0 {
        return HNR_CEILING_DB;
    }
    (10.0 * (r / (1.0 - r)).log10()).clamp(HNR_FLOOR_DB, HNR_CEILING_DB)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(sample_rate: f64, frequency: f64, len: usize) -> Vec<f64> {
        (0..len)
            .map(|i| (2.0 * std::f64::consts::PI * frequency * i as f64 / sample_rate + 0.1).sin())
            .collect()
    }

    #[test]
    fn test_pure_tone_has_negligible_jitter_and_shimmer() {
        let frame = sine(8000.0, 200.0, 2048);
        let cycles = Cycles::extract(&frame, 8000.0);
        assert!(cycles.len() >= 40, "cycles {}", cycles.len());
        for period in &cycles.periods_s {
            assert!((period - 0.005).abs() < 1e-4);
        }
        assert!(jitter_percent(&cycles) < 0.5);
        assert!(shimmer_percent(&cycles) < 1.0);
    }

    #[test]
    fn test_amplitude_modulation_raises_shimmer() {
        let frame: Vec<f64> = sine(8000.0, 200.0, 2048)
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let cycle = i / 40;
                if cycle % 2 == 0 {
                    v * 1.0
                } else {
                    v * 0.6
                }
            })
            .collect();
        let cycles = Cycles::extract(&frame, 8000.0);
        assert!(shimmer_percent(&cycles) > 20.0);
    }

    #[test]
    fn test_short_frame_is_empty() {
        assert!(Cycles::extract(&[0.1, -0.1], 8000.0).is_empty());
        assert_eq!(jitter_percent(&Cycles::default()), 0.0);
    }

    #[test]
    fn test_hnr_mapping() {
        assert_eq!(hnr_db(0.5), 0.0);
        assert!((hnr_db(0.9) - 9.542).abs() < 1e-3);
        assert_eq!(hnr_db(0.0), HNR_FLOOR_DB);
        assert_eq!(hnr_db(1.0), HNR_CEILING_DB);
        assert_eq!(hnr_db(f64::NAN), HNR_FLOOR_DB);
    }
}
