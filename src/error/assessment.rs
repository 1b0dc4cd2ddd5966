// Assessment session error types and constants

use crate::error::{BufferError, ErrorCode};
use crate::scoring::Domain;
use log::error;
use std::fmt;

/// Assessment error code constants
///
/// These constants provide a single source of truth for error codes
/// shared with whichever UI or store consumes finalized sessions.
///
/// Error code range: 4001-4009
pub struct AssessmentErrorCodes {}

impl AssessmentErrorCodes {
    /// Sample timestamp precedes the previous sample
    pub const OUT_OF_ORDER_SAMPLE: i32 = 4001;

    /// Too few samples to compute a stable metric
    pub const INSUFFICIENT_SAMPLES: i32 = 4002;

    /// Raw stream acquisition failed (microphone, camera, motion sensor)
    pub const DEVICE_UNAVAILABLE: i32 = 4003;

    /// Threshold or duration outside its valid range
    pub const INVALID_CONFIG: i32 = 4004;

    /// Session has already been finalized or cancelled
    pub const SESSION_FINALIZED: i32 = 4005;

    /// Handle does not refer to the active session
    pub const STALE_HANDLE: i32 = 4006;

    /// No session is active
    pub const NO_ACTIVE_SESSION: i32 = 4007;

    /// Sample payload does not belong to the session's domain
    pub const UNEXPECTED_SAMPLE: i32 = 4008;

    /// Sample carries a NaN or infinite value
    pub const NON_FINITE_SAMPLE: i32 = 4009;
}

/// Log an assessment error with structured context
///
/// This function logs assessment errors with structured fields including:
/// - error_code: Numeric error code for programmatic handling
/// - component: The component where the error occurred
/// - message: Human-readable error message
/// - context: Additional contextual information
pub fn log_assessment_error(err: &AssessmentError, context: &str) {
    error!(
        "Assessment error in {}: code={}, component=AssessmentSession, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Assessment-related errors
///
/// Only device and configuration problems are meant to reach the caller as
/// failures. Numerical edge cases never produce an error; they resolve to
/// documented fallback values inside the analysis primitives.
///
/// Error code range: 4001-4009
#[derive(Debug, Clone, PartialEq)]
pub enum AssessmentError {
    /// Sample rejected because its timestamp precedes the previous one
    OutOfOrderSample { previous_ms: f64, received_ms: f64 },

    /// Too few samples for a stable metric (resolved to a fallback by scorers)
    InsufficientSamples { required: usize, collected: usize },

    /// Raw stream acquisition failed
    DeviceUnavailable { reason: String },

    /// Configuration value outside its valid range
    InvalidConfig { field: String, reason: String },

    /// Session no longer accepts samples
    SessionFinalized,

    /// Handle does not match the active session
    StaleHandle { id: u64 },

    /// No session is active
    NoActiveSession,

    /// Sample payload kind does not match the session's domain
    UnexpectedSample { domain: Domain, received: String },

    /// Sample carries a NaN or infinite value
    NonFiniteSample { timestamp_ms: f64 },
}

impl AssessmentError {
    /// Shorthand for building an `InvalidConfig` error
    pub fn invalid_config(field: &str, reason: impl Into<String>) -> Self {
        AssessmentError::InvalidConfig {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<BufferError> for AssessmentError {
    fn from(err: BufferError) -> Self {
        match err {
            BufferError::OutOfOrderSample {
                previous_ms,
                received_ms,
            } => AssessmentError::OutOfOrderSample {
                previous_ms,
                received_ms,
            },
            BufferError::NonFiniteSample { timestamp_ms } => {
                AssessmentError::NonFiniteSample { timestamp_ms }
            }
        }
    }
}

impl ErrorCode for AssessmentError {
    fn code(&self) -> i32 {
        match self {
            AssessmentError::OutOfOrderSample { .. } => AssessmentErrorCodes::OUT_OF_ORDER_SAMPLE,
            AssessmentError::InsufficientSamples { .. } => {
                AssessmentErrorCodes::INSUFFICIENT_SAMPLES
            }
            AssessmentError::DeviceUnavailable { .. } => AssessmentErrorCodes::DEVICE_UNAVAILABLE,
            AssessmentError::InvalidConfig { .. } => AssessmentErrorCodes::INVALID_CONFIG,
            AssessmentError::SessionFinalized => AssessmentErrorCodes::SESSION_FINALIZED,
            AssessmentError::StaleHandle { .. } => AssessmentErrorCodes::STALE_HANDLE,
            AssessmentError::NoActiveSession => AssessmentErrorCodes::NO_ACTIVE_SESSION,
            AssessmentError::UnexpectedSample { .. } => AssessmentErrorCodes::UNEXPECTED_SAMPLE,
            AssessmentError::NonFiniteSample { .. } => AssessmentErrorCodes::NON_FINITE_SAMPLE,
        }
    }

    fn message(&self) -> String {
        match self {
            AssessmentError::OutOfOrderSample {
                previous_ms,
                received_ms,
            } => format!(
                "Out-of-order sample: {} ms precedes previous sample at {} ms",
                received_ms, previous_ms
            ),
            AssessmentError::InsufficientSamples {
                required,
                collected,
            } => {
                format!("Insufficient samples: need {}, got {}", required, collected)
            }
            AssessmentError::DeviceUnavailable { reason } => {
                format!("Device unavailable: {}", reason)
            }
            AssessmentError::InvalidConfig { field, reason } => {
                format!("Invalid config for {}: {}", field, reason)
            }
            AssessmentError::SessionFinalized => "Session already finalized".to_string(),
            AssessmentError::StaleHandle { id } => {
                format!("Session handle {} is not the active session", id)
            }
            AssessmentError::NoActiveSession => "No active session".to_string(),
            AssessmentError::UnexpectedSample { domain, received } => {
                format!("{} session cannot ingest {} sample", domain, received)
            }
            AssessmentError::NonFiniteSample { timestamp_ms } => {
                format!("Non-finite sample at {} ms", timestamp_ms)
            }
        }
    }
}

impl fmt::Display for AssessmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AssessmentError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for AssessmentError {}
