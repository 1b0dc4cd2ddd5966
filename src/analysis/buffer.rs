// SampleBuffer - bounded, time-ordered window of samples
//
// Every domain scorer owns one of these for the duration of a test. Samples
// must arrive with non-decreasing timestamps; the oldest samples are evicted
// once either the capacity or the time horizon is exceeded.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::error::{AssessmentError, BufferError};

/// One timestamped value inside a window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample<T> {
    pub timestamp_ms: f64,
    pub value: T,
}

/// Sliding window with count and time-horizon eviction
#[derive(Debug, Clone)]
pub struct SampleBuffer<T> {
    samples: VecDeque<Sample<T>>,
    capacity: usize,
    horizon_ms: Option<f64>,
    evicted: u64,
}

impl<T: Clone> SampleBuffer<T> {
    /// Create a new window
    ///
    /// # Arguments
    /// * `capacity` - Maximum number of samples retained (at least 1)
    /// * `horizon_ms` - Samples older than `newest - horizon_ms` are evicted
    pub fn new(capacity: usize, horizon_ms: Option<f64>) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity.min(4096)),
            capacity,
            horizon_ms,
            evicted: 0,
        }
    }

    /// Append a sample, enforcing timestamp monotonicity
    ///
    /// # Returns
    /// * `Ok(())` - Sample appended (older samples possibly evicted)
    /// * `Err(BufferError)` - Sample rejected, window unchanged
    pub fn push(&mut self, timestamp_ms: f64, value: T) -> Result<(), BufferError> {
        if !timestamp_ms.is_finite() {
            return Err(BufferError::NonFiniteSample { timestamp_ms });
        }

        if let Some(last) = self.samples.back() {
            if timestamp_ms < last.timestamp_ms {
                log::debug!(
                    "[SampleBuffer] Rejected sample at {} ms (last {} ms)",
                    timestamp_ms,
                    last.timestamp_ms
                );
                return Err(BufferError::OutOfOrderSample {
                    previous_ms: last.timestamp_ms,
                    received_ms: timestamp_ms,
                });
            }
        }

        self.samples.push_back(Sample {
            timestamp_ms,
            value,
        });
        self.evict(timestamp_ms);
        Ok(())
    }

    fn evict(&mut self, newest_ms: f64) {
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
            self.evicted += 1;
        }

        if let Some(horizon) = self.horizon_ms {
            let cutoff = newest_ms - horizon;
            while self
                .samples
                .front()
                .map(|oldest| oldest.timestamp_ms < cutoff)
                .unwrap_or(false)
            {
                self.samples.pop_front();
                self.evicted += 1;
            }
        }
    }

    /// Copy of the current ordered contents
    pub fn snapshot(&self) -> Vec<Sample<T>> {
        self.samples.iter().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sample<T>> {
        self.samples.iter()
    }

    pub fn latest(&self) -> Option<&Sample<T>> {
        self.samples.back()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total samples dropped by eviction since creation
    pub fn evicted_count(&self) -> u64 {
        self.evicted
    }

    /// Time between the oldest and newest retained sample (0 when < 2 samples)
    pub fn span_ms(&self) -> f64 {
        match (self.samples.front(), self.samples.back()) {
            (Some(first), Some(last)) => last.timestamp_ms - first.timestamp_ms,
            _ => 0.0,
        }
    }

    /// Effective sample rate derived from timestamps, if at least two samples
    /// span a positive interval
    pub fn observed_rate_hz(&self) -> Option<f64> {
        let span = self.span_ms();
        if self.samples.len() >= 2 && span > 0.0 {
            Some((self.samples.len() - 1) as f64 * 1000.0 / span)
        } else {
            None
        }
    }

    /// Ensure at least `required` samples are buffered
    pub fn require(&self, required: usize) -> Result<(), AssessmentError> {
        if self.samples.len() < required {
            return Err(AssessmentError::InsufficientSamples {
                required,
                collected: self.samples.len(),
            });
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

impl SampleBuffer<f64> {
    /// Values of the window in time order
    pub fn values(&self) -> Vec<f64> {
        self.samples.iter().map(|sample| sample.value).collect()
    }
}
