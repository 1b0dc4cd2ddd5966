// Statistical summary primitives shared by every scoring domain
//
// All functions are total: empty or degenerate input resolves to a defined
// fallback instead of NaN, infinity or a panic.

/// Floor added to RMS before the dB conversion
pub const DB_EPSILON: f64 = 1e-6;

/// Stability reported for series too short to measure variation
pub const FALLBACK_STABILITY: f64 = 100.0;

/// Arithmetic mean (0.0 for an empty series)
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance (divisor N); 0.0 for fewer than 2 samples
pub fn variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}

/// Population standard deviation
pub fn stddev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// Root-mean-square of a signal (0.0 for an empty signal)
pub fn rms<T: Copy + Into<f64>>(signal: &[T]) -> f64 {
    if signal.is_empty() {
        return 0.0;
    }
    let sum_squares: f64 = signal
        .iter()
        .map(|&sample| {
            let v: f64 = sample.into();
            v * v
        })
        .sum();
    (sum_squares / signal.len() as f64).sqrt()
}

/// Convert an RMS level to decibels: `20 * log10(rms + 1e-6)`
///
/// Monotonic in `rms`; silence maps to -120 dB rather than -infinity.
pub fn rms_to_db(rms: f64) -> f64 {
    20.0 * (rms.max(0.0) + DB_EPSILON).log10()
}

/// Coefficient-of-variation stability: `max(0, 100 - 100 * stddev / |mean|)`
///
/// Series with fewer than 2 samples report 100. A zero mean reports 100 when
/// the series is flat and 0 otherwise.
pub fn cv_stability(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return FALLBACK_STABILITY;
    }
    let sd = stddev(values);
    let m = mean(values).abs();
    if m < f64::EPSILON {
        return if sd < f64::EPSILON {
            FALLBACK_STABILITY
        } else {
            0.0
        };
    }
    (100.0 - 100.0 * sd / m).max(0.0)
}

/// Mean of the lowest `fraction` of values (at least one value)
///
/// Used as a noise-floor estimate. Returns `None` for an empty series.
pub fn mean_of_lowest(values: &[f64], fraction: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let take = ((sorted.len() as f64 * fraction.clamp(0.0, 1.0)).ceil() as usize).max(1);
    Some(mean(&sorted[..take.min(sorted.len())]))
}

/// Clamp to [0, 1], mapping non-finite input to 0
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}
