// Offline session driver: pumps a SampleSource into an engine session

use crate::error::AssessmentError;
use crate::scoring::DomainReport;
use crate::session::{IngestOutcome, ScreeningEngine, SessionHandle};

use super::source::SampleSource;

/// Feed `source` into the session behind `handle` until it finalizes
///
/// Rejected samples are skipped; the session finalizes on its own when the
/// maximum duration is reached, or explicitly once the source is exhausted.
/// A source failure cancels the session and returns `DeviceUnavailable`.
pub fn drive(
    engine: &mut ScreeningEngine,
    handle: SessionHandle,
    source: &mut dyn SampleSource,
) -> Result<DomainReport, AssessmentError> {
    let mut fed = 0usize;
    let mut rejected = 0usize;

    loop {
        let sample = match source.next_sample() {
            Ok(Some(sample)) => sample,
            Ok(None) => break,
            Err(AssessmentError::DeviceUnavailable { reason }) => {
                return Err(engine.report_device_failure(handle, reason));
            }
            Err(err) => {
                return Err(engine.report_device_failure(handle, err.to_string()));
            }
        };

        fed += 1;
        match engine.ingest(handle, &sample) {
            Ok(IngestOutcome::Accepted) => {}
            Ok(IngestOutcome::Finalized(report)) => {
                tracing::info!(
                    domain = %handle.domain,
                    fed,
                    rejected,
                    "maximum duration reached before end of source"
                );
                return Ok(report);
            }
            Err(
                err @ (AssessmentError::OutOfOrderSample { .. }
                | AssessmentError::NonFiniteSample { .. }
                | AssessmentError::UnexpectedSample { .. }),
            ) => {
                rejected += 1;
                log::warn!("[Driver] Skipping sample {}: {}", fed, err);
            }
            Err(err) => return Err(err),
        }
    }

    tracing::info!(domain = %handle.domain, fed, rejected, "source exhausted");
    engine.finalize(handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::source::{JsonLinesSource, SyntheticTremorSource};
    use crate::scoring::Domain;
    use std::io::Cursor;

    #[test]
    fn test_drive_synthetic_tremor() {
        let mut engine = ScreeningEngine::default();
        let handle = engine.start_session(Domain::Tremor).unwrap();
        let mut source = SyntheticTremorSource::new(5.0, 2.0, 5.0, 60.0, 3);
        let report = drive(&mut engine, handle, &mut source).unwrap();
        assert!(!report.fallback);
        let frequency = report.metrics.get("frequencyHz").unwrap();
        assert!((4.5..=5.5).contains(&frequency), "frequency {}", frequency);
    }

    #[test]
    fn test_drive_stops_at_max_duration() {
        let mut engine = ScreeningEngine::default();
        let handle = engine.start_session(Domain::Tremor).unwrap();
        // 12 s of samples against a 10 s limit
        let mut source = SyntheticTremorSource::new(5.0, 1.0, 12.0, 30.0, 3);
        let report = drive(&mut engine, handle, &mut source).unwrap();
        assert_eq!(report.duration_ms, 10_000.0);
        assert!(source.next_sample().unwrap().is_some());
    }

    #[test]
    fn test_drive_skips_rejected_samples() {
        let input = "{\"timestamp_ms\":0.0,\"kind\":\"pen\",\"x\":0.0,\"y\":0.0}\n\
                     {\"timestamp_ms\":10.0,\"kind\":\"scalar\",\"value\":1.0}\n\
                     {\"timestamp_ms\":20.0,\"kind\":\"pen\",\"x\":1.0,\"y\":0.0}\n\
                     {\"timestamp_ms\":15.0,\"kind\":\"pen\",\"x\":1.0,\"y\":1.0}\n\
                     {\"timestamp_ms\":30.0,\"kind\":\"pen\",\"x\":1.0,\"y\":1.0}\n";
        let mut engine = ScreeningEngine::default();
        let handle = engine.start_session(Domain::Spiral).unwrap();
        let mut source = JsonLinesSource::from_reader(Cursor::new(input));
        let report = drive(&mut engine, handle, &mut source).unwrap();
        assert_eq!(report.sample_count, 3);
    }

    #[test]
    fn test_drive_source_failure_cancels() {
        let input = "{\"timestamp_ms\":0.0,\"kind\":\"scalar\",\"value\":1.0}\n{broken\n";
        let mut engine = ScreeningEngine::default();
        let handle = engine.start_session(Domain::Tremor).unwrap();
        let mut source = JsonLinesSource::from_reader(Cursor::new(input));
        let err = drive(&mut engine, handle, &mut source).unwrap_err();
        assert!(matches!(err, AssessmentError::DeviceUnavailable { .. }));
        assert!(engine.results().is_empty());
    }
}
