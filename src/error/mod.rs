// Error types for the motor screening core
//
// This module defines custom error types for sample buffering and assessment
// sessions, providing structured error handling with numeric error codes
// suitable for reporting across a UI or persistence boundary.

mod assessment;
mod buffer;

pub use assessment::{log_assessment_error, AssessmentError, AssessmentErrorCodes};
pub use buffer::{BufferError, BufferErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent error handling for
/// whichever collaborator renders or stores them.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
