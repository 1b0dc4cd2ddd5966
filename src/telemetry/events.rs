//! Assessment telemetry event types exposed to CLI surfaces and any
//! external dashboard subscribed to the broadcast stream.

use serde::{Deserialize, Serialize};

use crate::scoring::{Domain, Severity};

/// How a session reached its final state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FinalizeTrigger {
    /// Caller asked for the result
    Explicit,
    /// Maximum test duration elapsed
    Timeout,
    /// A new session started while this one was in flight
    Superseded,
}

/// Lifecycle and data-quality events of assessment sessions
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum AssessmentEvent {
    SessionStarted {
        session_id: u64,
        domain: Domain,
    },
    SessionFinalized {
        session_id: u64,
        domain: Domain,
        severity: Severity,
        fallback: bool,
        trigger: FinalizeTrigger,
    },
    SessionCancelled {
        session_id: u64,
        domain: Domain,
    },
    SampleRejected {
        session_id: u64,
        domain: Domain,
        code: i32,
    },
    DeviceFailure {
        session_id: u64,
        domain: Domain,
        reason: String,
    },
}

impl AssessmentEvent {
    pub fn session_id(&self) -> u64 {
        match self {
            AssessmentEvent::SessionStarted { session_id, .. }
            | AssessmentEvent::SessionFinalized { session_id, .. }
            | AssessmentEvent::SessionCancelled { session_id, .. }
            | AssessmentEvent::SampleRejected { session_id, .. }
            | AssessmentEvent::DeviceFailure { session_id, .. } => *session_id,
        }
    }
}
