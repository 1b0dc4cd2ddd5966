// AssessmentAggregator - radar vector and overall risk across domains
//
// Radar values come straight from each finalized report (already in
// [0, 1]). Overall risk uses the mean 0-4 score of completed domains.
// Reports flagged as fallbacks carry no measurement: they are not counted
// as completed and their domain stays absent from the radar.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::analysis::stats::clamp_unit;
use crate::config::AggregationConfig;
use crate::scoring::{Domain, DomainReport};

/// Overall screening verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallRisk {
    Low,
    Moderate,
    High,
    /// Fewer completed domains than required for a verdict
    Incomplete,
}

impl fmt::Display for OverallRisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            OverallRisk::Low => "low",
            OverallRisk::Moderate => "moderate",
            OverallRisk::High => "high",
            OverallRisk::Incomplete => "incomplete",
        };
        f.write_str(label)
    }
}

/// Normalized per-domain values in [0, 1]; missing domains are absent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RadarVector(BTreeMap<Domain, f64>);

impl RadarVector {
    pub fn insert(&mut self, domain: Domain, value: f64) {
        self.0.insert(domain, clamp_unit(value));
    }

    pub fn get(&self, domain: Domain) -> Option<f64> {
        self.0.get(&domain).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Domain, f64)> + '_ {
        self.0.iter().map(|(domain, value)| (*domain, *value))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentSummary {
    pub radar: RadarVector,
    pub overall_risk: OverallRisk,
    /// Mean 0-4 score of completed domains, if any
    pub mean_score: Option<f64>,
    pub completed_domains: Vec<Domain>,
}

/// Map a mean 0-4 score to a risk band
pub fn classify_risk(mean_score: f64, config: &AggregationConfig) -> OverallRisk {
    if mean_score < config.low_below {
        OverallRisk::Low
    } else if mean_score < config.moderate_below {
        OverallRisk::Moderate
    } else {
        OverallRisk::High
    }
}

pub struct AssessmentAggregator {
    config: AggregationConfig,
}

impl AssessmentAggregator {
    pub fn new(config: AggregationConfig) -> Self {
        Self { config }
    }

    /// Combine finalized reports; a later report for a domain replaces an
    /// earlier one
    pub fn aggregate<'a, I>(&self, reports: I) -> AssessmentSummary
    where
        I: IntoIterator<Item = &'a DomainReport>,
    {
        let mut latest: BTreeMap<Domain, &DomainReport> = BTreeMap::new();
        for report in reports {
            latest.insert(report.domain, report);
        }

        let mut radar = RadarVector::default();
        let mut completed = Vec::new();
        let mut scores = Vec::new();
        for (domain, report) in &latest {
            if report.fallback {
                log::debug!("[Aggregator] {} has no measurement; left off the radar", domain);
                continue;
            }
            radar.insert(*domain, report.radar);
            completed.push(*domain);
            scores.push(report.score);
        }

        let mean_score = if scores.is_empty() {
            None
        } else {
            Some(scores.iter().sum::<f64>() / scores.len() as f64)
        };

        let overall_risk = match mean_score {
            Some(mean) if completed.len() >= self.config.min_domains => {
                classify_risk(mean, &self.config)
            }
            _ => OverallRisk::Incomplete,
        };

        log::info!(
            "[Aggregator] {} completed domains, mean score {:?} -> {}",
            completed.len(),
            mean_score,
            overall_risk
        );

        AssessmentSummary {
            radar,
            overall_risk,
            mean_score,
            completed_domains: completed,
        }
    }
}

impl Default for AssessmentAggregator {
    fn default() -> Self {
        Self::new(AggregationConfig::default())
    }
}
