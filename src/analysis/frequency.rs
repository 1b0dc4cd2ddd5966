// FrequencyEstimator - dominant frequency of a windowed series
//
// Two interchangeable algorithms:
// - Zero-crossing rate: count sign changes about zero or the series mean,
//   frequency = crossings / (2 * window duration)
// - Autocorrelation: strongest normalized autocorrelation peak within the
//   lag range implied by the frequency band
//
// The result is then passed through a per-domain FrequencyBand whose policy
// decides what happens to estimates outside the plausible range.

use serde::{Deserialize, Serialize};

use super::fft::Autocorrelator;

/// Reference level for counting sign changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossingReference {
    Zero,
    Mean,
}

/// What to do with an estimate outside the band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BandPolicy {
    /// Out-of-band estimates become 0 (e.g. unvoiced audio)
    ZeroOutside,
    /// Out-of-band estimates are pulled to the nearest band edge.
    /// An estimate of exactly 0 (no oscillation) stays 0.
    Clamp,
}

/// Physiologically plausible frequency range for one domain
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrequencyBand {
    pub min_hz: f64,
    pub max_hz: f64,
    pub policy: BandPolicy,
}

impl FrequencyBand {
    pub fn new(min_hz: f64, max_hz: f64, policy: BandPolicy) -> Self {
        Self {
            min_hz,
            max_hz,
            policy,
        }
    }

    pub fn contains(&self, hz: f64) -> bool {
        hz >= self.min_hz && hz <= self.max_hz
    }

    /// Apply the band policy to a raw estimate
    pub fn apply(&self, hz: f64) -> f64 {
        if !hz.is_finite() || hz <= 0.0 {
            return 0.0;
        }
        if self.contains(hz) {
            return hz;
        }
        match self.policy {
            BandPolicy::ZeroOutside => 0.0,
            BandPolicy::Clamp => hz.clamp(self.min_hz, self.max_hz),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.min_hz.is_finite() && self.max_hz.is_finite() && self.min_hz > 0.0 && self.min_hz < self.max_hz
    }
}

/// Frequency estimation algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    ZeroCrossing(CrossingReference),
    Autocorrelation,
}

/// Count sign changes of `series` relative to the given reference
///
/// A value equal to the reference counts as non-negative.
pub fn zero_crossings(series: &[f64], reference: CrossingReference) -> usize {
    if series.len() < 2 {
        return 0;
    }
    let level = match reference {
        CrossingReference::Zero => 0.0,
        CrossingReference::Mean => series.iter().sum::<f64>() / series.len() as f64,
    };

    series
        .windows(2)
        .filter(|pair| (pair[0] - level >= 0.0) != (pair[1] - level >= 0.0))
        .count()
}

/// Zero-crossing frequency estimate: `crossings / (2 * duration_s)`
///
/// Returns 0 for a flat signal or a non-positive duration.
pub fn zero_crossing_frequency(series: &[f64], duration_s: f64, reference: CrossingReference) -> f64 {
    if duration_s <= 0.0 || !duration_s.is_finite() {
        return 0.0;
    }
    zero_crossings(series, reference) as f64 / (2.0 * duration_s)
}

/// Dominant-frequency detector bound to one algorithm and band
pub struct FrequencyEstimator {
    algorithm: Algorithm,
    band: FrequencyBand,
    autocorrelator: Autocorrelator,
}

impl FrequencyEstimator {
    pub fn new(algorithm: Algorithm, band: FrequencyBand) -> Self {
        Self {
            algorithm,
            band,
            autocorrelator: Autocorrelator::new(),
        }
    }

    pub fn band(&self) -> &FrequencyBand {
        &self.band
    }

    /// Raw (un-banded) estimate in Hz
    ///
    /// # Arguments
    /// * `series` - Windowed signal
    /// * `sample_rate_hz` - Sampling rate of the series; the window duration
    ///   is `series.len() / sample_rate_hz`
    pub fn estimate_raw(&self, series: &[f64], sample_rate_hz: f64) -> f64 {
        if series.len() < 2 || sample_rate_hz <= 0.0 || !sample_rate_hz.is_finite() {
            return 0.0;
        }
        match self.algorithm {
            Algorithm::ZeroCrossing(reference) => {
                let duration_s = series.len() as f64 / sample_rate_hz;
                zero_crossing_frequency(series, duration_s, reference)
            }
            Algorithm::Autocorrelation => self
                .autocorrelation_peak(series, sample_rate_hz)
                .map(|(hz, _)| hz)
                .unwrap_or(0.0),
        }
    }

    /// Banded estimate in Hz (see `BandPolicy`)
    pub fn estimate(&self, series: &[f64], sample_rate_hz: f64) -> f64 {
        self.band.apply(self.estimate_raw(series, sample_rate_hz))
    }

    /// Autocorrelation peak inside the band: `(frequency_hz, r)`
    ///
    /// Shared with the harmonics-to-noise computation, which needs the peak
    /// height as well as its position.
    pub fn autocorrelation_peak(&self, series: &[f64], sample_rate_hz: f64) -> Option<(f64, f64)> {
        let min_lag = (sample_rate_hz / self.band.max_hz).floor() as usize;
        let max_lag = (sample_rate_hz / self.band.min_hz).ceil() as usize;
        self.autocorrelator
            .peak_in_range(series, min_lag, max_lag)
            .map(|(lag, r)| (sample_rate_hz / lag, r))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(sample_rate: f64, frequency: f64, len: usize, phase: f64) -> Vec<f64> {
        (0..len)
            .map(|i| {
                (2.0 * std::f64::consts::PI * frequency * i as f64 / sample_rate + phase).sin()
            })
            .collect()
    }

    #[test]
    fn test_flat_signal_is_zero() {
        let flat = vec![0.25; 120];
        let estimator = FrequencyEstimator::new(
            Algorithm::ZeroCrossing(CrossingReference::Mean),
            FrequencyBand::new(3.0, 12.0, BandPolicy::Clamp),
        );
        assert_eq!(estimator.estimate(&flat, 60.0), 0.0);

        let autocorr = FrequencyEstimator::new(
            Algorithm::Autocorrelation,
            FrequencyBand::new(3.0, 12.0, BandPolicy::Clamp),
        );
        assert_eq!(autocorr.estimate(&flat, 60.0), 0.0);
    }

    #[test]
    fn test_zero_crossings_about_zero_and_mean() {
        let series = [1.0, -1.0, 1.0, -1.0];
        assert_eq!(zero_crossings(&series, CrossingReference::Zero), 3);

        let offset = [11.0, 9.0, 11.0, 9.0];
        assert_eq!(zero_crossings(&offset, CrossingReference::Zero), 0);
        assert_eq!(zero_crossings(&offset, CrossingReference::Mean), 3);
    }

    #[test]
    fn test_sine_within_ten_percent() {
        // (sample rate, frequency) pairs, all sampled at >= 4f
        let cases = [(60.0, 5.0), (60.0, 9.0), (8000.0, 200.0), (44100.0, 120.0)];
        for (rate, freq) in cases {
            let series = sine(rate, freq, (rate * 1.0) as usize, 0.3);
            for algorithm in [
                Algorithm::ZeroCrossing(CrossingReference::Zero),
                Algorithm::ZeroCrossing(CrossingReference::Mean),
                Algorithm::Autocorrelation,
            ] {
                let estimator = FrequencyEstimator::new(
                    algorithm,
                    FrequencyBand::new(freq / 4.0, freq * 2.0, BandPolicy::ZeroOutside),
                );
                let estimate = estimator.estimate(&series, rate);
                assert!(
                    (estimate - freq).abs() <= freq * 0.1,
                    "{:?} estimated {} Hz for {} Hz at {} Hz sampling",
                    algorithm,
                    estimate,
                    freq,
                    rate
                );
            }
        }
    }

    #[test]
    fn test_band_policies() {
        let voice = FrequencyBand::new(80.0, 400.0, BandPolicy::ZeroOutside);
        assert_eq!(voice.apply(50.0), 0.0);
        assert_eq!(voice.apply(500.0), 0.0);
        assert_eq!(voice.apply(150.0), 150.0);

        let tremor = FrequencyBand::new(3.0, 12.0, BandPolicy::Clamp);
        assert_eq!(tremor.apply(1.0), 3.0);
        assert_eq!(tremor.apply(20.0), 12.0);
        assert_eq!(tremor.apply(0.0), 0.0);
        assert_eq!(tremor.apply(f64::NAN), 0.0);
    }

    #[test]
    fn test_band_validity() {
        assert!(FrequencyBand::new(3.0, 12.0, BandPolicy::Clamp).is_valid());
        assert!(!FrequencyBand::new(12.0, 3.0, BandPolicy::Clamp).is_valid());
        assert!(!FrequencyBand::new(0.0, 3.0, BandPolicy::Clamp).is_valid());
    }
}
