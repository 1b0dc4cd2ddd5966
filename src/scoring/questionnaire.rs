// QuestionnaireScorer - self-reported symptom items on a 0-4 scale

use std::collections::BTreeMap;

use crate::analysis::buffer::SampleBuffer;
use crate::analysis::stats::mean;
use crate::config::QuestionnaireConfig;
use crate::error::AssessmentError;
use crate::sample::{SamplePayload, TimedSample};

use super::{check_sample, unexpected, Domain, DomainReport, DomainScorer, MetricSet, Severity};

const ANSWER_LOG: usize = 256;

pub fn severity_for_mean(mean_score: f64) -> Severity {
    if mean_score < 0.5 {
        Severity::Normal
    } else if mean_score < 1.5 {
        Severity::Mild
    } else if mean_score < 2.5 {
        Severity::Moderate
    } else {
        Severity::Severe
    }
}

pub struct QuestionnaireScorer {
    config: QuestionnaireConfig,
    log: SampleBuffer<(u8, u8)>,
    answers: BTreeMap<u8, u8>,
}

impl QuestionnaireScorer {
    pub fn new(config: QuestionnaireConfig) -> Self {
        Self {
            config,
            log: SampleBuffer::new(ANSWER_LOG, None),
            answers: BTreeMap::new(),
        }
    }

    fn mean_score(&self) -> f64 {
        let scores: Vec<f64> = self.answers.values().map(|&s| s as f64).collect();
        mean(&scores)
    }

    fn metrics(&self) -> MetricSet {
        let total: u32 = self.answers.values().map(|&s| s as u32).sum();
        MetricSet::new()
            .with("meanScore", self.mean_score())
            .with("totalScore", total as f64)
            .with("answered", self.answers.len() as f64)
            .with("itemCount", self.config.item_count as f64)
    }
}

impl DomainScorer for QuestionnaireScorer {
    fn domain(&self) -> Domain {
        Domain::Questionnaire
    }

    fn ingest(&mut self, sample: &TimedSample) -> Result<(), AssessmentError> {
        check_sample(sample)?;
        let (item, score) = match sample.payload {
            SamplePayload::Answer { item, score } => (item, score),
            _ => return Err(unexpected(Domain::Questionnaire, sample)),
        };
        if score > self.config.max_score || item >= self.config.item_count {
            return Err(AssessmentError::UnexpectedSample {
                domain: Domain::Questionnaire,
                received: format!("answer item {} score {}", item, score),
            });
        }
        self.log.push(sample.timestamp_ms, (item, score))?;
        if let Some(previous) = self.answers.insert(item, score) {
            log::debug!(
                "[QuestionnaireScorer] Item {} revised from {} to {}",
                item,
                previous,
                score
            );
        }
        Ok(())
    }

    fn live_metrics(&self) -> MetricSet {
        self.metrics()
    }

    fn finalize(&mut self, elapsed_ms: f64) -> DomainReport {
        let mean_score = self.mean_score();
        let severity = severity_for_mean(mean_score);
        let radar = 1.0 - mean_score / self.config.max_score as f64;
        let report = DomainReport::new(
            Domain::Questionnaire,
            self.metrics(),
            severity,
            severity.as_str(),
            radar,
        )
        .with_score(mean_score)
        .with_samples(self.answers.len(), elapsed_ms);

        if self.answers.is_empty() {
            log::warn!("[QuestionnaireScorer] No answers recorded");
            report.as_fallback()
        } else {
            report
        }
    }

    fn sample_count(&self) -> usize {
        self.answers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_radar() {
        let mut scorer = QuestionnaireScorer::new(QuestionnaireConfig::default());
        for (i, score) in [0u8, 1, 2, 1].iter().enumerate() {
            scorer
                .ingest(&TimedSample::answer(i as f64, i as u8, *score))
                .unwrap();
        }
        let report = scorer.finalize(4.0);
        assert_eq!(report.score, 1.0);
        assert_eq!(report.radar, 0.75);
        assert_eq!(report.severity, Severity::Mild);
        assert_eq!(report.metrics.get("answered"), Some(4.0));
    }

    #[test]
    fn test_revised_answer_replaces_previous() {
        let mut scorer = QuestionnaireScorer::new(QuestionnaireConfig::default());
        scorer.ingest(&TimedSample::answer(0.0, 3, 4)).unwrap();
        scorer.ingest(&TimedSample::answer(1.0, 3, 0)).unwrap();
        assert_eq!(scorer.sample_count(), 1);
        assert_eq!(scorer.live_metrics().get("meanScore"), Some(0.0));
    }

    #[test]
    fn test_out_of_range_answer_rejected() {
        let mut scorer = QuestionnaireScorer::new(QuestionnaireConfig::default());
        assert!(matches!(
            scorer.ingest(&TimedSample::answer(0.0, 1, 5)),
            Err(AssessmentError::UnexpectedSample { .. })
        ));
        assert!(scorer.ingest(&TimedSample::answer(0.0, 10, 1)).is_err());
        assert_eq!(scorer.sample_count(), 0);
    }

    #[test]
    fn test_unanswered_is_fallback() {
        let mut scorer = QuestionnaireScorer::new(QuestionnaireConfig::default());
        let report = scorer.finalize(0.0);
        assert!(report.fallback);
        assert_eq!(report.score, 0.0);
        assert_eq!(report.radar, 0.0);
        assert_eq!(report.status, "insufficient");
    }
}
