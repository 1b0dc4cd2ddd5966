// ScreeningEngine - one patient's screening across all domains
//
// Owns at most one active AssessmentSession at a time plus every finalized
// report. Callers address the active session through a SessionHandle; a
// handle from an earlier session can still read its frozen report but can
// no longer feed it.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::aggregate::{AssessmentAggregator, AssessmentSummary};
use crate::config::ScreeningConfig;
use crate::error::{log_assessment_error, AssessmentError, ErrorCode};
use crate::io::sink::ResultSink;
use crate::sample::TimedSample;
use crate::scoring::{Domain, DomainReport, MetricSet};
use crate::telemetry::{self, AssessmentEvent, FinalizeTrigger, TelemetryCollector};

use super::{AssessmentSession, IngestOutcome};

/// Identifies one started session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionHandle {
    pub id: u64,
    pub domain: Domain,
}

pub struct ScreeningEngine {
    config: ScreeningConfig,
    active: Option<(SessionHandle, AssessmentSession)>,
    /// Closed sessions: `Some(report)` when finalized, `None` when cancelled
    closed: BTreeMap<u64, Option<DomainReport>>,
    /// Latest finalized report per domain
    results: BTreeMap<Domain, DomainReport>,
    next_id: u64,
    telemetry: Arc<TelemetryCollector>,
}

impl ScreeningEngine {
    pub fn new(config: ScreeningConfig) -> Self {
        Self {
            config,
            active: None,
            closed: BTreeMap::new(),
            results: BTreeMap::new(),
            next_id: 1,
            telemetry: telemetry::hub(),
        }
    }

    /// Publish events to `collector` instead of the global hub
    pub fn with_telemetry(mut self, collector: Arc<TelemetryCollector>) -> Self {
        self.telemetry = collector;
        self
    }

    pub fn config(&self) -> &ScreeningConfig {
        &self.config
    }

    pub fn active_handle(&self) -> Result<SessionHandle, AssessmentError> {
        self.active
            .as_ref()
            .map(|(handle, _)| *handle)
            .ok_or(AssessmentError::NoActiveSession)
    }

    /// Start a test with the engine's configuration
    pub fn start_session(&mut self, domain: Domain) -> Result<SessionHandle, AssessmentError> {
        let config = self.config.clone();
        self.start_session_with(domain, &config)
    }

    /// Start a test with a per-session configuration override
    ///
    /// The configuration is validated before anything else happens; an
    /// in-flight session is then finalized so only one test is ever active.
    pub fn start_session_with(
        &mut self,
        domain: Domain,
        config: &ScreeningConfig,
    ) -> Result<SessionHandle, AssessmentError> {
        let session = match AssessmentSession::start(domain, config) {
            Ok(session) => session,
            Err(err) => {
                log_assessment_error(&err, "start_session");
                return Err(err);
            }
        };

        if let Some((previous, mut in_flight)) = self.active.take() {
            log::warn!(
                "[Session] Finalizing in-flight {} session {} before starting {}",
                previous.domain,
                previous.id,
                domain
            );
            match in_flight.finalize() {
                Ok(report) => self.record(previous, report, FinalizeTrigger::Superseded),
                Err(err) => log_assessment_error(&err, "supersede"),
            }
        }

        let handle = SessionHandle {
            id: self.next_id,
            domain,
        };
        self.next_id += 1;
        self.active = Some((handle, session));
        self.telemetry.publish(AssessmentEvent::SessionStarted {
            session_id: handle.id,
            domain,
        });
        Ok(handle)
    }

    fn active_session(
        &mut self,
        handle: SessionHandle,
    ) -> Result<&mut AssessmentSession, AssessmentError> {
        let matches = matches!(&self.active, Some((active, _)) if *active == handle);
        if !matches {
            return Err(self.inactive_error(handle));
        }
        self.active
            .as_mut()
            .map(|(_, session)| session)
            .ok_or(AssessmentError::NoActiveSession)
    }

    fn inactive_error(&self, handle: SessionHandle) -> AssessmentError {
        if self.closed.contains_key(&handle.id) {
            AssessmentError::SessionFinalized
        } else {
            AssessmentError::StaleHandle { id: handle.id }
        }
    }

    fn record(&mut self, handle: SessionHandle, report: DomainReport, trigger: FinalizeTrigger) {
        self.telemetry.publish(AssessmentEvent::SessionFinalized {
            session_id: handle.id,
            domain: handle.domain,
            severity: report.severity,
            fallback: report.fallback,
            trigger,
        });
        self.closed.insert(handle.id, Some(report.clone()));
        self.results.insert(handle.domain, report);
    }

    fn close_active(&mut self, handle: SessionHandle, report: DomainReport, trigger: FinalizeTrigger) {
        self.active = None;
        self.record(handle, report, trigger);
    }

    /// Feed one sample to the session behind `handle`
    pub fn ingest(
        &mut self,
        handle: SessionHandle,
        sample: &TimedSample,
    ) -> Result<IngestOutcome, AssessmentError> {
        let result = self.active_session(handle)?.ingest(sample);
        match result {
            Ok(IngestOutcome::Finalized(report)) => {
                self.close_active(handle, report.clone(), FinalizeTrigger::Timeout);
                Ok(IngestOutcome::Finalized(report))
            }
            Ok(IngestOutcome::Accepted) => Ok(IngestOutcome::Accepted),
            Err(err) => {
                log::debug!("[Session] Sample rejected: {}", err.message());
                self.telemetry.publish(AssessmentEvent::SampleRejected {
                    session_id: handle.id,
                    domain: handle.domain,
                    code: err.code(),
                });
                Err(err)
            }
        }
    }

    /// Advance the session clock; returns the report on timeout
    pub fn tick(
        &mut self,
        handle: SessionHandle,
        now_ms: f64,
    ) -> Result<Option<DomainReport>, AssessmentError> {
        let outcome = self.active_session(handle)?.tick(now_ms)?;
        if let Some(report) = &outcome {
            self.close_active(handle, report.clone(), FinalizeTrigger::Timeout);
        }
        Ok(outcome)
    }

    /// Live metrics of the active session
    pub fn live_metrics(&mut self, handle: SessionHandle) -> Result<MetricSet, AssessmentError> {
        Ok(self.active_session(handle)?.live_metrics())
    }

    /// Finalize the session behind `handle`
    ///
    /// Finalizing an already finalized session returns its frozen report.
    pub fn finalize(&mut self, handle: SessionHandle) -> Result<DomainReport, AssessmentError> {
        if let Some(closed) = self.closed.get(&handle.id) {
            return closed.clone().ok_or(AssessmentError::SessionFinalized);
        }
        let report = self.active_session(handle)?.finalize()?;
        self.close_active(handle, report.clone(), FinalizeTrigger::Explicit);
        Ok(report)
    }

    /// Stop the session behind `handle` without recording a result
    pub fn cancel(&mut self, handle: SessionHandle) -> Result<(), AssessmentError> {
        let session = self.active_session(handle)?;
        session.cancel();
        self.active = None;
        self.closed.insert(handle.id, None);
        self.telemetry.publish(AssessmentEvent::SessionCancelled {
            session_id: handle.id,
            domain: handle.domain,
        });
        Ok(())
    }

    /// Record an acquisition failure reported by the caller's device layer
    ///
    /// The active session behind `handle` is cancelled (no report). The
    /// returned `DeviceUnavailable` error is meant to be propagated; the
    /// engine makes no retry.
    pub fn report_device_failure(
        &mut self,
        handle: SessionHandle,
        reason: impl Into<String>,
    ) -> AssessmentError {
        let reason = reason.into();
        let err = AssessmentError::DeviceUnavailable {
            reason: reason.clone(),
        };
        log_assessment_error(&err, handle.domain.as_str());
        self.telemetry.publish(AssessmentEvent::DeviceFailure {
            session_id: handle.id,
            domain: handle.domain,
            reason,
        });
        if self.cancel(handle).is_err() {
            log::debug!("[Session] Device failure for inactive session {}", handle.id);
        }
        err
    }

    /// Import a report finalized elsewhere (e.g. loaded from a store)
    pub fn import_report(&mut self, report: DomainReport) {
        log::info!("[Session] Imported {} report", report.domain);
        self.results.insert(report.domain, report);
    }

    /// Latest finalized report per domain
    pub fn results(&self) -> &BTreeMap<Domain, DomainReport> {
        &self.results
    }

    /// Radar vector and overall risk over every finalized domain
    pub fn summary(&self) -> AssessmentSummary {
        AssessmentAggregator::new(self.config.aggregation.clone()).aggregate(self.results.values())
    }

    /// Hand every finalized report to `sink`; returns how many were stored
    pub fn persist(&self, sink: &mut dyn ResultSink) -> std::io::Result<usize> {
        for report in self.results.values() {
            sink.store(report)?;
        }
        Ok(self.results.len())
    }
}

impl Default for ScreeningEngine {
    fn default() -> Self {
        Self::new(ScreeningConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::OverallRisk;
    use crate::io::sink::MemorySink;

    fn engine() -> (ScreeningEngine, Arc<TelemetryCollector>) {
        let collector = Arc::new(TelemetryCollector::new(64, 64));
        (
            ScreeningEngine::default().with_telemetry(Arc::clone(&collector)),
            collector,
        )
    }

    #[test]
    fn test_start_ingest_finalize() {
        let (mut engine, collector) = engine();
        let handle = engine.start_session(Domain::Gait).unwrap();
        for i in 0..60 {
            let ts = i as f64 * 50.0;
            let left = if i % 10 < 5 { 0.3 } else { 0.0 };
            let right = if (i + 5) % 10 < 5 { 0.3 } else { 0.0 };
            engine
                .ingest(handle, &TimedSample::gait(ts, left, right))
                .unwrap();
        }
        let report = engine.finalize(handle).unwrap();
        assert_eq!(report.domain, Domain::Gait);
        assert_eq!(engine.results().len(), 1);
        assert_eq!(engine.finalize(handle).unwrap(), report);

        let events = collector.session_events(handle.id);
        assert!(matches!(events[0], AssessmentEvent::SessionStarted { .. }));
        assert!(matches!(
            events.last(),
            Some(AssessmentEvent::SessionFinalized {
                trigger: FinalizeTrigger::Explicit,
                ..
            })
        ));
    }

    #[test]
    fn test_new_session_finalizes_in_flight() {
        let (mut engine, _) = engine();
        let first = engine.start_session(Domain::Tremor).unwrap();
        engine
            .ingest(first, &TimedSample::motion(0.0, 0.0, 0.0, 0.0))
            .unwrap();
        let second = engine.start_session(Domain::Spiral).unwrap();

        assert_ne!(first.id, second.id);
        assert!(engine.results().contains_key(&Domain::Tremor));
        assert_eq!(
            engine.ingest(first, &TimedSample::motion(1.0, 0.0, 0.0, 0.0)),
            Err(AssessmentError::SessionFinalized)
        );
        assert_eq!(engine.active_handle().unwrap(), second);
    }

    #[test]
    fn test_invalid_config_keeps_in_flight_session() {
        let (mut engine, _) = engine();
        let handle = engine.start_session(Domain::Facial).unwrap();
        let mut bad = ScreeningConfig::default();
        bad.gait.slow_cadence = -1.0;
        assert!(matches!(
            engine.start_session_with(Domain::Gait, &bad),
            Err(AssessmentError::InvalidConfig { .. })
        ));
        assert_eq!(engine.active_handle().unwrap(), handle);
    }

    #[test]
    fn test_stale_and_unknown_handles() {
        let (mut engine, _) = engine();
        let bogus = SessionHandle {
            id: 99,
            domain: Domain::Voice,
        };
        assert_eq!(
            engine.finalize(bogus),
            Err(AssessmentError::StaleHandle { id: 99 })
        );
        assert_eq!(engine.active_handle(), Err(AssessmentError::NoActiveSession));
    }

    #[test]
    fn test_device_failure_cancels_without_report() {
        let (mut engine, collector) = engine();
        let handle = engine.start_session(Domain::Voice).unwrap();
        let err = engine.report_device_failure(handle, "microphone permission denied");
        assert!(matches!(err, AssessmentError::DeviceUnavailable { .. }));
        assert!(engine.results().is_empty());
        assert_eq!(engine.finalize(handle), Err(AssessmentError::SessionFinalized));
        assert!(collector
            .session_events(handle.id)
            .iter()
            .any(|e| matches!(e, AssessmentEvent::DeviceFailure { .. })));
    }

    #[test]
    fn test_rejected_sample_published() {
        let (mut engine, collector) = engine();
        let handle = engine.start_session(Domain::Spiral).unwrap();
        let err = engine
            .ingest(handle, &TimedSample::gait(0.0, 0.1, 0.1))
            .unwrap_err();
        assert!(matches!(err, AssessmentError::UnexpectedSample { .. }));
        assert!(collector.session_events(handle.id).iter().any(|e| matches!(
            e,
            AssessmentEvent::SampleRejected { code: 4008, .. }
        )));
    }

    #[test]
    fn test_tick_timeout_records_report() {
        let (mut engine, _) = engine();
        let handle = engine.start_session(Domain::Facial).unwrap();
        engine.tick(handle, 0.0).unwrap();
        let report = engine.tick(handle, 15_000.0).unwrap().unwrap();
        assert_eq!(report.duration_ms, 15_000.0);
        assert!(engine.active_handle().is_err());
        assert!(engine.results().contains_key(&Domain::Facial));
    }

    #[test]
    fn test_summary_and_persist() {
        let (mut engine, _) = engine();
        let handle = engine.start_session(Domain::Questionnaire).unwrap();
        engine.ingest(handle, &TimedSample::answer(0.0, 0, 0)).unwrap();
        engine.ingest(handle, &TimedSample::answer(1.0, 1, 1)).unwrap();
        engine.finalize(handle).unwrap();

        let summary = engine.summary();
        assert_eq!(summary.overall_risk, OverallRisk::Incomplete);
        assert_eq!(summary.radar.get(Domain::Questionnaire), Some(0.875));

        let mut sink = MemorySink::default();
        assert_eq!(engine.persist(&mut sink).unwrap(), 1);
        assert_eq!(sink.reports().len(), 1);
    }
}
