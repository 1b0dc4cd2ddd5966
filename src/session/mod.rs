// Session module - lifecycle of one domain test
//
// An AssessmentSession owns the DomainScorer of a single test from start
// to finalization. The core holds no timers: an external scheduler drives
// it with samples (`ingest`) and clock ticks (`tick`), and reaching the
// domain's maximum duration on either path finalizes the session.
//
// State machine:
//   Active --finalize/timeout--> Finalized (report frozen)
//   Active --cancel-----------> Cancelled (no report)

pub mod engine;

pub use engine::{ScreeningEngine, SessionHandle};

use crate::config::ScreeningConfig;
use crate::error::AssessmentError;
use crate::sample::TimedSample;
use crate::scoring::{build_scorer, check_sample, Domain, DomainReport, DomainScorer, MetricSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Active,
    Finalized,
    Cancelled,
}

/// Result of feeding one sample
#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    Accepted,
    /// The sample reached the maximum duration; the session finalized
    /// without it
    Finalized(DomainReport),
}

pub struct AssessmentSession {
    domain: Domain,
    scorer: Box<dyn DomainScorer>,
    state: SessionState,
    started_ms: Option<f64>,
    clock_ms: Option<f64>,
    max_duration_ms: Option<f64>,
    report: Option<DomainReport>,
}

impl AssessmentSession {
    /// Validate the domain's config section and create an active session
    pub fn start(domain: Domain, config: &ScreeningConfig) -> Result<Self, AssessmentError> {
        let scorer = build_scorer(domain, config)?;
        tracing::info!(%domain, "assessment session started");
        Ok(Self {
            domain,
            scorer,
            state: SessionState::Active,
            started_ms: None,
            clock_ms: None,
            max_duration_ms: config.max_duration_ms(domain),
            report: None,
        })
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    pub fn sample_count(&self) -> usize {
        self.scorer.sample_count()
    }

    pub fn live_metrics(&self) -> MetricSet {
        self.scorer.live_metrics()
    }

    /// The frozen report once finalized
    pub fn report(&self) -> Option<&DomainReport> {
        self.report.as_ref()
    }

    /// Time since the first sample or tick, if the session has started
    pub fn elapsed_ms(&self) -> f64 {
        match (self.started_ms, self.clock_ms) {
            (Some(start), Some(now)) => (now - start).max(0.0),
            _ => 0.0,
        }
    }

    fn deadline_ms(&self) -> Option<f64> {
        match (self.started_ms, self.max_duration_ms) {
            (Some(start), Some(max)) => Some(start + max),
            _ => None,
        }
    }

    fn ensure_active(&self) -> Result<(), AssessmentError> {
        if self.is_active() {
            Ok(())
        } else {
            Err(AssessmentError::SessionFinalized)
        }
    }

    /// Push one raw sample
    ///
    /// A rejected sample leaves the session unchanged. A sample at or past
    /// the maximum duration finalizes the session instead of being ingested.
    pub fn ingest(&mut self, sample: &TimedSample) -> Result<IngestOutcome, AssessmentError> {
        self.ensure_active()?;
        check_sample(sample)?;

        if let Some(deadline) = self.deadline_ms() {
            if sample.timestamp_ms >= deadline {
                tracing::info!(
                    domain = %self.domain,
                    timestamp_ms = sample.timestamp_ms,
                    "maximum duration reached; finalizing"
                );
                let report = self.freeze(self.max_duration_ms.unwrap_or(0.0));
                return Ok(IngestOutcome::Finalized(report));
            }
        }

        self.scorer.ingest(sample)?;
        self.started_ms.get_or_insert(sample.timestamp_ms);
        self.advance_clock(sample.timestamp_ms);
        Ok(IngestOutcome::Accepted)
    }

    fn advance_clock(&mut self, now_ms: f64) {
        self.clock_ms = Some(match self.clock_ms {
            Some(previous) => previous.max(now_ms),
            None => now_ms,
        });
    }

    /// Scheduler tick; finalizes and returns the report once the maximum
    /// duration has elapsed
    ///
    /// The first tick of a session without samples starts its clock.
    pub fn tick(&mut self, now_ms: f64) -> Result<Option<DomainReport>, AssessmentError> {
        self.ensure_active()?;
        if !now_ms.is_finite() {
            return Err(AssessmentError::NonFiniteSample {
                timestamp_ms: now_ms,
            });
        }
        self.started_ms.get_or_insert(now_ms);
        self.advance_clock(now_ms);

        match self.deadline_ms() {
            Some(deadline) if now_ms >= deadline => {
                tracing::info!(domain = %self.domain, now_ms, "session timed out");
                Ok(Some(self.freeze(self.max_duration_ms.unwrap_or(0.0))))
            }
            _ => Ok(None),
        }
    }

    /// Finalize the session; idempotent once finalized
    ///
    /// # Errors
    /// `SessionFinalized` if the session was cancelled.
    pub fn finalize(&mut self) -> Result<DomainReport, AssessmentError> {
        match self.state {
            SessionState::Active => {
                let elapsed = self.elapsed_ms();
                Ok(self.freeze(elapsed))
            }
            SessionState::Finalized => self
                .report
                .clone()
                .ok_or(AssessmentError::SessionFinalized),
            SessionState::Cancelled => Err(AssessmentError::SessionFinalized),
        }
    }

    /// Stop the session without producing a report
    ///
    /// Returns false if the session was no longer active.
    pub fn cancel(&mut self) -> bool {
        if !self.is_active() {
            return false;
        }
        self.state = SessionState::Cancelled;
        tracing::info!(domain = %self.domain, samples = self.sample_count(), "session cancelled");
        true
    }

    fn freeze(&mut self, elapsed_ms: f64) -> DomainReport {
        let report = self.scorer.finalize(elapsed_ms);
        tracing::info!(
            domain = %self.domain,
            severity = %report.severity,
            status = %report.status,
            fallback = report.fallback,
            elapsed_ms,
            "session finalized"
        );
        self.state = SessionState::Finalized;
        self.report = Some(report.clone());
        report
    }
}
