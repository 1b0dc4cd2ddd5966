// PeakDetector - falling-through-threshold events per channel
//
// Used for gait steps (one channel per foot) and eye blinks (one channel
// per eye). An event fires when a channel falls through its threshold,
// after which the channel is refractory for a configurable period.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Independent signal channel tracked by a PeakDetector
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Primary,
    Left,
    Right,
}

/// How the detection threshold is derived
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "value", rename_all = "snake_case")]
pub enum ThresholdMode {
    /// Fixed level
    Absolute(f64),
    /// Running channel mean plus an offset
    MeanRelative(f64),
}

/// Which falling transition counts as an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallingEdge {
    /// previous > threshold and current <= threshold
    AtOrBelow,
    /// previous >= threshold and current < threshold
    Below,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeakEvent {
    pub channel: Channel,
    pub timestamp_ms: f64,
}

#[derive(Debug, Default, Clone)]
struct ChannelState {
    prev: Option<f64>,
    sum: f64,
    count: usize,
    last_event_ms: Option<f64>,
    events: Vec<f64>,
}

/// Falling-through-threshold event counter with per-channel state
///
/// A value that was above the threshold and now sits at or below it emits
/// one event. Consecutive samples that stay below never emit again until the
/// signal rises back above the threshold. Channels never share state, so
/// left/right feet or eyes can be tracked concurrently.
#[derive(Debug, Clone)]
pub struct PeakDetector {
    threshold: ThresholdMode,
    edge: FallingEdge,
    refractory_ms: f64,
    channels: BTreeMap<Channel, ChannelState>,
}

impl PeakDetector {
    pub fn new(threshold: ThresholdMode) -> Self {
        Self {
            threshold,
            edge: FallingEdge::AtOrBelow,
            refractory_ms: 0.0,
            channels: BTreeMap::new(),
        }
    }

    pub fn with_edge(mut self, edge: FallingEdge) -> Self {
        self.edge = edge;
        self
    }

    /// Suppress events closer than `refractory_ms` to the previous event on
    /// the same channel
    pub fn with_refractory_ms(mut self, refractory_ms: f64) -> Self {
        self.refractory_ms = refractory_ms.max(0.0);
        self
    }

    /// Feed one value for `channel`; returns the event if one fired
    pub fn process(&mut self, channel: Channel, timestamp_ms: f64, value: f64) -> Option<PeakEvent> {
        let state = self.channels.entry(channel).or_default();
        state.sum += value;
        state.count += 1;

        let threshold = match self.threshold {
            ThresholdMode::Absolute(level) => level,
            ThresholdMode::MeanRelative(offset) => state.sum / state.count as f64 + offset,
        };

        let crossed = match (state.prev, self.edge) {
            (Some(prev), FallingEdge::AtOrBelow) => prev > threshold && value <= threshold,
            (Some(prev), FallingEdge::Below) => prev >= threshold && value < threshold,
            (None, _) => false,
        };
        state.prev = Some(value);

        if !crossed {
            return None;
        }

        if let Some(last) = state.last_event_ms {
            if timestamp_ms - last < self.refractory_ms {
                return None;
            }
        }

        state.last_event_ms = Some(timestamp_ms);
        state.events.push(timestamp_ms);
        Some(PeakEvent {
            channel,
            timestamp_ms,
        })
    }

    pub fn count(&self, channel: Channel) -> usize {
        self.channels
            .get(&channel)
            .map(|state| state.events.len())
            .unwrap_or(0)
    }

    pub fn total_count(&self) -> usize {
        self.channels.values().map(|state| state.events.len()).sum()
    }

    /// Timestamps of every event on `channel`, oldest first
    pub fn event_times(&self, channel: Channel) -> &[f64] {
        self.channels
            .get(&channel)
            .map(|state| state.events.as_slice())
            .unwrap_or(&[])
    }

    pub fn reset(&mut self) {
        self.channels.clear();
    }

    /// Count falling crossings over a whole series on a single channel
    pub fn count_in(series: &[f64], threshold: ThresholdMode) -> usize {
        let mut detector = PeakDetector::new(threshold);
        series
            .iter()
            .enumerate()
            .filter_map(|(i, &value)| detector.process(Channel::Primary, i as f64, value))
            .count()
    }
}

/// Events per minute over `elapsed_ms` (0 when no time has elapsed)
pub fn rate_per_minute(events: usize, elapsed_ms: f64) -> f64 {
    if elapsed_ms <= 0.0 || !elapsed_ms.is_finite() {
        return 0.0;
    }
    events as f64 / (elapsed_ms / 1000.0) * 60.0
}
