use std::collections::BTreeSet;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::analysis;
use crate::assess;
use crate::config::EngineConfig;
use crate::models::{
    AgentPeriodRecord, Channel, Domain, DomainAssessment, Period, RiskLevel, ScoredAgent,
};

#[derive(Debug, Clone, Serialize)]
pub struct TrendPoint {
    pub period: Period,
    pub qa_score: Option<f64>,
    pub qc_rate: Option<f64>,
    pub csat_score: Option<f64>,
    pub quiz_score: Option<f64>,
    pub risk_score: f64,
    pub risk_level: RiskLevel,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DomainCoverage {
    pub qa: bool,
    pub qc: bool,
    pub csat: bool,
    pub quiz: bool,
}

impl DomainCoverage {
    fn mark(&mut self, domain: Domain) {
        match domain {
            Domain::Qa => self.qa = true,
            Domain::Qc => self.qc = true,
            Domain::Csat => self.csat = true,
            Domain::Quiz => self.quiz = true,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProfileError {
    #[error("no records found for agent {0}")]
    UnknownAgent(String),
    #[error("agent {agent_id} has no records in the {months} months ending {end}")]
    EmptyWindow {
        agent_id: String,
        end: Period,
        months: usize,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentProfile {
    pub agent_id: String,
    pub agent_name: Option<String>,
    pub center: String,
    pub service: Option<String>,
    pub channel: Channel,
    pub current: ScoredAgent,
    pub monthly_trend: Vec<TrendPoint>,
    pub domain_coverage: DomainCoverage,
    pub strength_weakness: Vec<DomainAssessment>,
}

/// Score history of one agent over the `months` periods ending at
/// `end_period` (default: the latest period the agent appears in).
///
/// Every point is scored inside its own period's population so the group
/// priors match what the population view reports for that month.
pub fn agent_profile(
    records: &[AgentPeriodRecord],
    agent_id: &str,
    end_period: Option<Period>,
    months: usize,
    config: &EngineConfig,
) -> Result<AgentProfile, ProfileError> {
    let agent_periods: BTreeSet<Period> = records
        .iter()
        .filter(|record| record.agent_id == agent_id)
        .map(|record| record.period)
        .collect();

    let Some(latest) = agent_periods.iter().next_back() else {
        return Err(ProfileError::UnknownAgent(agent_id.to_string()));
    };
    let end = end_period.unwrap_or(*latest);
    let months = months.max(1);

    let mut window = Vec::with_capacity(months);
    let mut period = end;
    for _ in 0..months {
        window.push(period);
        period = period.previous();
    }
    window.reverse();

    let mut scored: Vec<ScoredAgent> = Vec::new();
    for period in window {
        if !agent_periods.contains(&period) {
            continue;
        }
        let request = analysis::AnalysisRequest {
            period,
            center: None,
        };
        let population = analysis::select_records(records, &request);
        let (agents, _) = analysis::score_population(&population, config);
        if let Some(agent) = agents.into_iter().find(|a| a.record.agent_id == agent_id) {
            scored.push(agent);
        }
    }

    let Some(current) = scored.last().cloned() else {
        return Err(ProfileError::EmptyWindow {
            agent_id: agent_id.to_string(),
            end,
            months,
        });
    };
    debug!(agent_id, points = scored.len(), "built agent trend");

    let mut domain_coverage = DomainCoverage::default();
    let monthly_trend = scored
        .iter()
        .map(|agent| {
            for domain in Domain::ALL {
                if agent.record.observation(domain).is_present() {
                    domain_coverage.mark(domain);
                }
            }
            TrendPoint {
                period: agent.record.period,
                qa_score: agent.record.qa.value(),
                qc_rate: agent.record.qc.value(),
                csat_score: agent.record.csat.value(),
                quiz_score: agent.record.quiz.value(),
                risk_score: agent.composite_risk_score,
                risk_level: agent.risk_level,
            }
        })
        .collect();

    let strength_weakness = assess::assess(&current.record, config);

    Ok(AgentProfile {
        agent_id: current.record.agent_id.clone(),
        agent_name: current.record.agent_name.clone(),
        center: current.record.center.clone(),
        service: current.record.service.clone(),
        channel: current.record.channel,
        current,
        monthly_trend,
        domain_coverage,
        strength_weakness,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Observation, Standing};
    use crate::risk::tests::sample_record;

    fn history() -> Vec<AgentPeriodRecord> {
        let mut records = Vec::new();
        for (month, qa) in [(10, 62.0), (11, 70.0), (12, 78.0)] {
            let mut record = sample_record("a-1");
            record.period = Period::new(2025, month).expect("valid period");
            record.qa = Observation::new(Some(qa), Some(4));
            records.push(record);
        }
        let mut latest = sample_record("a-1");
        latest.qa = Observation::new(Some(88.0), Some(4));
        latest.qc = Observation::new(Some(2.0), Some(15));
        records.push(latest);

        let mut peer = sample_record("peer");
        peer.qc = Observation::new(Some(4.0), Some(15));
        records.push(peer);
        records
    }

    #[test]
    fn trend_has_one_point_per_period() {
        let profile = agent_profile(&history(), "a-1", None, 6, &EngineConfig::default())
            .expect("agent exists");
        assert_eq!(profile.monthly_trend.len(), 4);
        assert_eq!(profile.monthly_trend[0].period.to_string(), "2025-10");
        assert_eq!(profile.current.record.period.to_string(), "2026-01");
        assert!(profile
            .monthly_trend
            .windows(2)
            .all(|w| w[0].risk_score > w[1].risk_score));
        assert_eq!(
            profile.domain_coverage,
            DomainCoverage {
                qa: true,
                qc: true,
                csat: false,
                quiz: false
            }
        );
    }

    #[test]
    fn window_limits_history() {
        let end = Period::new(2025, 12);
        let profile = agent_profile(&history(), "a-1", end, 2, &EngineConfig::default())
            .expect("agent exists");
        assert_eq!(profile.monthly_trend.len(), 2);
        assert_eq!(profile.current.record.period.to_string(), "2025-12");
        assert!(!profile.domain_coverage.qc);
    }

    #[test]
    fn latest_point_uses_population_priors() {
        let profile = agent_profile(&history(), "a-1", None, 1, &EngineConfig::default())
            .expect("agent exists");
        assert!(profile.current.qc_adjustment().is_some());
        let qa = profile
            .strength_weakness
            .iter()
            .find(|a| a.domain == Domain::Qa)
            .expect("qa assessed");
        assert_eq!(qa.standing, Standing::Strong);
    }

    #[test]
    fn unknown_agent_has_no_profile() {
        assert_eq!(
            agent_profile(&history(), "nobody", None, 6, &EngineConfig::default()).err(),
            Some(ProfileError::UnknownAgent("nobody".to_string()))
        );
    }

    #[test]
    fn known_agent_outside_window_is_empty_window() {
        let end = Period::new(2025, 6);
        let err = agent_profile(&history(), "a-1", end, 3, &EngineConfig::default())
            .expect_err("no records before 2025-10");
        assert!(matches!(err, ProfileError::EmptyWindow { months: 3, .. }));
        assert_eq!(
            err.to_string(),
            "agent a-1 has no records in the 3 months ending 2025-06"
        );
    }
}
