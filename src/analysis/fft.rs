// FFT module - autocorrelation via the Wiener-Khinchin theorem
//
// The autocorrelation of a mean-removed series is the inverse FFT of its
// power spectrum. The series is zero-padded to at least twice its length so
// the circular correlation equals the linear one.

use rustfft::{num_complex::Complex, FftPlanner};
use std::sync::{Arc, Mutex};

/// Autocorrelation processor sharing one FFT planner across calls
pub struct Autocorrelator {
    fft_planner: Arc<Mutex<FftPlanner<f64>>>,
}

impl Autocorrelator {
    pub fn new() -> Self {
        Self {
            fft_planner: Arc::new(Mutex::new(FftPlanner::new())),
        }
    }

    /// Normalized autocorrelation `r[lag] / r[0]` for lags `0..series.len()`
    ///
    /// Returns an empty vector for an empty series and all zeros for a
    /// flat (zero-energy) series.
    pub fn normalized(&self, series: &[f64]) -> Vec<f64> {
        let n = series.len();
        if n == 0 {
            return Vec::new();
        }

        let mean = series.iter().sum::<f64>() / n as f64;
        let fft_size = (2 * n).next_power_of_two();

        let mut buffer: Vec<Complex<f64>> = series
            .iter()
            .map(|&v| Complex::new(v - mean, 0.0))
            .collect();
        buffer.resize(fft_size, Complex::new(0.0, 0.0));

        {
            let mut planner = match self.fft_planner.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            let forward = planner.plan_fft_forward(fft_size);
            forward.process(&mut buffer);

            for bin in buffer.iter_mut() {
                *bin = Complex::new(bin.norm_sqr(), 0.0);
            }

            let inverse = planner.plan_fft_inverse(fft_size);
            inverse.process(&mut buffer);
        }

        let energy = buffer[0].re;
        if energy <= f64::EPSILON {
            return vec![0.0; n];
        }

        buffer[..n].iter().map(|c| c.re / energy).collect()
    }

    /// Strongest autocorrelation peak within a lag range
    ///
    /// # Arguments
    /// * `series` - Time-domain series
    /// * `min_lag` / `max_lag` - Inclusive lag bounds in samples
    ///
    /// # Returns
    /// `(lag, r)` with the lag refined by parabolic interpolation, or `None`
    /// if the range is empty or no positive correlation exists in it.
    pub fn peak_in_range(&self, series: &[f64], min_lag: usize, max_lag: usize) -> Option<(f64, f64)> {
        let r = self.normalized(series);
        if r.len() < 3 {
            return None;
        }
        let lo = min_lag.max(1);
        let hi = max_lag.min(r.len() - 2);
        if lo > hi {
            return None;
        }

        let (best_lag, best_r) = (lo..=hi)
            .map(|lag| (lag, r[lag]))
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))?;

        if best_r <= 0.0 {
            return None;
        }

        // Parabolic interpolation around the discrete peak
        let (left, right) = (r[best_lag - 1], r[best_lag + 1]);
        let denom = left - 2.0 * best_r + right;
        let offset = if denom.abs() > f64::EPSILON {
            (0.5 * (left - right) / denom).clamp(-0.5, 0.5)
        } else {
            0.0
        };

        Some((best_lag as f64 + offset, best_r.min(1.0)))
    }
}

impl Default for Autocorrelator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(sample_rate: f64, frequency: f64, len: usize) -> Vec<f64> {
        (0..len)
            .map(|i| (2.0 * std::f64::consts::PI * frequency * i as f64 / sample_rate).sin())
            .collect()
    }

    #[test]
    fn test_zero_lag_is_one() {
        let ac = Autocorrelator::new();
        let r = ac.normalized(&sine(1000.0, 50.0, 200));
        assert!((r[0] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_flat_series() {
        let ac = Autocorrelator::new();
        let r = ac.normalized(&[3.0; 64]);
        assert!(r.iter().all(|&v| v == 0.0));
        assert!(ac.peak_in_range(&[3.0; 64], 2, 30).is_none());
    }

    #[test]
    fn test_peak_at_period() {
        let ac = Autocorrelator::new();
        // 60 Hz sampling, 5 Hz sine -> period of 12 samples
        let series = sine(60.0, 5.0, 300);
        let (lag, r) = ac.peak_in_range(&series, 5, 20).unwrap();
        assert!((lag - 12.0).abs() < 0.5, "lag {}", lag);
        assert!(r > 0.9, "r {}", r);
    }

    #[test]
    fn test_empty_series() {
        let ac = Autocorrelator::new();
        assert!(ac.normalized(&[]).is_empty());
        assert!(ac.peak_in_range(&[], 1, 10).is_none());
    }
}
