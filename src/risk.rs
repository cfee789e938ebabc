use serde::Serialize;
use tracing::{debug, warn};

use crate::config::{EngineConfig, RiskThresholds};
use crate::models::{AgentPeriodRecord, Domain, GroupPrior, RiskLevel, ScoredAgent};
use crate::normalize;
use crate::shrinkage::{self, ShrinkageEstimate};
use crate::weights::{self, WeightProfile};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DomainContribution {
    pub domain: Domain,
    pub risk: f64,
    pub weight: f64,
}

/// How a composite score was assembled.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskBreakdown {
    pub contributions: Vec<DomainContribution>,
    pub total_weight: f64,
    pub base_score: f64,
    pub tenure_multiplier: f64,
    pub final_score: f64,
    pub qc_adjustment: Option<ShrinkageEstimate>,
}

/// Weighted risk over the domains the agent actually has data for, amplified
/// by the tenure multiplier and capped at 100. An agent with no usable domain
/// scores 0.
pub fn compute_risk(
    record: &AgentPeriodRecord,
    weights: &WeightProfile,
    prior: Option<&GroupPrior>,
    config: &EngineConfig,
) -> RiskBreakdown {
    let band = config.tenure.band(record.tenure_months);
    let tenure_multiplier = config.tenure.multiplier(band);

    let mut contributions = Vec::with_capacity(Domain::ALL.len());
    let mut qc_adjustment = None;
    let mut weighted_sum = 0.0;
    let mut total_weight = 0.0;

    for domain in Domain::ALL {
        let weight = weights.weight(domain);
        let observation = record.observation(domain);
        let Some(mut value) = observation.value() else {
            continue;
        };
        if weight <= 0.0 {
            continue;
        }

        if domain == Domain::Qc {
            if let Some(prior) = prior {
                let estimate = shrinkage::estimate(
                    value / 100.0,
                    observation.count(),
                    prior.mean_rate / 100.0,
                    config.shrinkage_k,
                );
                value = estimate.adjusted_rate * 100.0;
                qc_adjustment = Some(estimate);
            }
        }

        let risk = normalize::domain_risk(domain, value, config.qc_rate_cap);
        weighted_sum += risk * weight;
        total_weight += weight;
        contributions.push(DomainContribution {
            domain,
            risk,
            weight,
        });
    }

    let base_score = if total_weight > 0.0 {
        weighted_sum / total_weight
    } else {
        0.0
    };
    let final_score = (base_score * tenure_multiplier).clamp(0.0, 100.0);

    RiskBreakdown {
        contributions,
        total_weight,
        base_score,
        tenure_multiplier,
        final_score,
        qc_adjustment,
    }
}

pub fn classify(score: f64, thresholds: &RiskThresholds) -> RiskLevel {
    if score >= thresholds.critical {
        RiskLevel::Critical
    } else if score >= thresholds.high {
        RiskLevel::High
    } else if score >= thresholds.medium {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

/// Scores one agent with the weight profile of its channel and tenure band.
pub fn score_agent(
    record: &AgentPeriodRecord,
    prior: Option<&GroupPrior>,
    config: &EngineConfig,
) -> ScoredAgent {
    let tenure_band = config.tenure.band(record.tenure_months);
    let profile = weights::select_weights(record.channel, tenure_band);

    let suppressed_domains: Vec<Domain> = Domain::ALL
        .into_iter()
        .filter(|domain| record.observation(*domain).is_contract_violation())
        .collect();
    for domain in &suppressed_domains {
        warn!(
            agent_id = %record.agent_id,
            period = %record.period,
            domain = %domain,
            "value reported without samples; treating domain as absent"
        );
    }

    let breakdown = compute_risk(record, &profile, prior, config);
    let risk_level = classify(breakdown.final_score, &config.thresholds);

    debug!(
        agent_id = %record.agent_id,
        band = tenure_band.as_str(),
        domains = breakdown.contributions.len(),
        score = breakdown.final_score,
        shrunk = breakdown.qc_adjustment.is_some(),
        "scored agent"
    );

    ScoredAgent {
        record: record.clone(),
        tenure_band,
        composite_risk_score: breakdown.final_score,
        risk_level,
        breakdown,
        suppressed_domains,
    }
}
