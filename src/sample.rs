//! Raw sample types handed to the core by acquisition collaborators.
//!
//! Every payload is serde-serializable so recorded streams can be replayed
//! from JSON Lines.

use serde::{Deserialize, Serialize};

/// One raw reading from a device or model stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SamplePayload {
    /// Time-domain audio frame
    Audio { samples: Vec<f32>, sample_rate: u32 },
    /// Device motion / acceleration vector (unused axes are zero)
    Motion { axes: [f64; 3] },
    /// Single scalar reading (e.g. a pose-landmark distance)
    Scalar { value: f64 },
    /// Bilateral foot vertical-position signal in normalized coordinates
    Gait { left: f64, right: f64 },
    /// Eye aspect ratio for both eyes
    Face { left_ear: f64, right_ear: f64 },
    /// Pen/touch point of a single stroke
    Pen { x: f64, y: f64 },
    /// Questionnaire answer on a 0-4 scale
    Answer { item: u8, score: u8 },
}

impl SamplePayload {
    pub fn kind(&self) -> &'static str {
        match self {
            SamplePayload::Audio { .. } => "audio",
            SamplePayload::Motion { .. } => "motion",
            SamplePayload::Scalar { .. } => "scalar",
            SamplePayload::Gait { .. } => "gait",
            SamplePayload::Face { .. } => "face",
            SamplePayload::Pen { .. } => "pen",
            SamplePayload::Answer { .. } => "answer",
        }
    }

    /// True when every numeric field is finite
    pub fn is_finite(&self) -> bool {
        match self {
            SamplePayload::Audio { samples, .. } => samples.iter().all(|s| s.is_finite()),
            SamplePayload::Motion { axes } => axes.iter().all(|a| a.is_finite()),
            SamplePayload::Scalar { value } => value.is_finite(),
            SamplePayload::Gait { left, right } => left.is_finite() && right.is_finite(),
            SamplePayload::Face {
                left_ear,
                right_ear,
            } => left_ear.is_finite() && right_ear.is_finite(),
            SamplePayload::Pen { x, y } => x.is_finite() && y.is_finite(),
            SamplePayload::Answer { .. } => true,
        }
    }
}

/// A payload stamped with the wall-clock time it was captured
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedSample {
    pub timestamp_ms: f64,
    #[serde(flatten)]
    pub payload: SamplePayload,
}

impl TimedSample {
    pub fn new(timestamp_ms: f64, payload: SamplePayload) -> Self {
        Self {
            timestamp_ms,
            payload,
        }
    }

    pub fn motion(timestamp_ms: f64, x: f64, y: f64, z: f64) -> Self {
        Self::new(timestamp_ms, SamplePayload::Motion { axes: [x, y, z] })
    }

    pub fn scalar(timestamp_ms: f64, value: f64) -> Self {
        Self::new(timestamp_ms, SamplePayload::Scalar { value })
    }

    pub fn gait(timestamp_ms: f64, left: f64, right: f64) -> Self {
        Self::new(timestamp_ms, SamplePayload::Gait { left, right })
    }

    pub fn face(timestamp_ms: f64, left_ear: f64, right_ear: f64) -> Self {
        Self::new(
            timestamp_ms,
            SamplePayload::Face {
                left_ear,
                right_ear,
            },
        )
    }

    pub fn pen(timestamp_ms: f64, x: f64, y: f64) -> Self {
        Self::new(timestamp_ms, SamplePayload::Pen { x, y })
    }

    pub fn audio(timestamp_ms: f64, samples: Vec<f32>, sample_rate: u32) -> Self {
        Self::new(
            timestamp_ms,
            SamplePayload::Audio {
                samples,
                sample_rate,
            },
        )
    }

    pub fn answer(timestamp_ms: f64, item: u8, score: u8) -> Self {
        Self::new(timestamp_ms, SamplePayload::Answer { item, score })
    }
}
