// Motor Screening Core - Parkinson's motor-sign screening engine
// Turns raw voice, motion, gait, facial, drawing and questionnaire streams
// into per-domain severity reports and an overall risk summary

// Module declarations
pub mod aggregate;
pub mod analysis;
pub mod config;
pub mod error;
pub mod io;
pub mod sample;
pub mod scoring;
pub mod session;
pub mod telemetry;

// Re-exports for convenience
pub use aggregate::{AssessmentAggregator, AssessmentSummary, OverallRisk, RadarVector};
pub use config::ScreeningConfig;
pub use error::{AssessmentError, BufferError, ErrorCode};
pub use sample::{SamplePayload, TimedSample};
pub use scoring::{Domain, DomainReport, DomainScorer, MetricSet, Severity};
pub use session::{AssessmentSession, IngestOutcome, ScreeningEngine, SessionHandle, SessionState};

/// Install a stderr `tracing` subscriber that also captures `log` records
///
/// Honors `RUST_LOG`; defaults to `info`. Safe to call more than once.
pub fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_structure() {
        init_logging();
        init_logging();
        assert_eq!(Domain::ALL.len(), 6);
        assert!(ScreeningConfig::default().validate().is_ok());
    }
}
