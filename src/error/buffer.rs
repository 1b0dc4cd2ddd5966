// Sample buffer error types and constants

use crate::error::ErrorCode;
use std::fmt;

/// Sample buffer error code constants
///
/// Error code range: 3001-3002
pub struct BufferErrorCodes {}

impl BufferErrorCodes {
    /// Sample timestamp precedes the newest buffered sample
    pub const OUT_OF_ORDER_SAMPLE: i32 = 3001;

    /// Sample carries a NaN or infinite timestamp/value
    pub const NON_FINITE_SAMPLE: i32 = 3002;
}

/// Errors raised when a sample violates the window invariants
///
/// A rejected sample never alters the buffer's prior contents.
#[derive(Debug, Clone, PartialEq)]
pub enum BufferError {
    /// New sample is older than the newest buffered sample
    OutOfOrderSample { previous_ms: f64, received_ms: f64 },

    /// Timestamp or value is not a finite number
    NonFiniteSample { timestamp_ms: f64 },
}

impl ErrorCode for BufferError {
    fn code(&self) -> i32 {
        match self {
            BufferError::OutOfOrderSample { .. } => BufferErrorCodes::OUT_OF_ORDER_SAMPLE,
            BufferError::NonFiniteSample { .. } => BufferErrorCodes::NON_FINITE_SAMPLE,
        }
    }

    fn message(&self) -> String {
        match self {
            BufferError::OutOfOrderSample {
                previous_ms,
                received_ms,
            } => format!(
                "Out-of-order sample: {} ms precedes last sample at {} ms",
                received_ms, previous_ms
            ),
            BufferError::NonFiniteSample { timestamp_ms } => {
                format!("Non-finite sample at {} ms", timestamp_ms)
            }
        }
    }
}

impl fmt::Display for BufferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BufferError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for BufferError {}
