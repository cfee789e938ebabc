use std::time::Instant;

use serde::Serialize;
use tracing::{info, info_span};
use uuid::Uuid;

use crate::aggregate::{self, GroupPriors, PopulationStats};
use crate::config::{self, EngineConfig};
use crate::correlation;
use crate::models::{AgentPeriodRecord, CorrelationResult, Period, ScoredAgent, SingleDomainWeakness};
use crate::risk;

#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub period: Period,
    pub center: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub run_id: Uuid,
    pub period: Period,
    pub center: Option<String>,
    pub agents: Vec<ScoredAgent>,
    pub stats: PopulationStats,
    pub correlations: Vec<CorrelationResult>,
    pub single_domain_weaknesses: Vec<SingleDomainWeakness>,
}

/// Scores a population in two passes.
///
/// Pass one scores every agent without a prior; the error-rate group priors
/// are then built from the whole population and agents whose group has a
/// prior are scored again with shrinkage applied.
pub fn score_population(
    records: &[&AgentPeriodRecord],
    config: &EngineConfig,
) -> (Vec<ScoredAgent>, GroupPriors) {
    let mut agents: Vec<ScoredAgent> = records
        .iter()
        .map(|record| risk::score_agent(record, None, config))
        .collect();

    let priors = aggregate::group_priors(records.iter().copied(), config.min_prior_peers);

    for agent in agents.iter_mut() {
        if let Some(prior) = priors.get(&agent.record.group_key()) {
            *agent = risk::score_agent(&agent.record, Some(prior), config);
        }
    }

    agents.sort_by(|a, b| {
        b.composite_risk_score
            .partial_cmp(&a.composite_risk_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.record.agent_id.cmp(&b.record.agent_id))
    });

    (agents, priors)
}

/// Records of the requested period (and center, when filtered).
pub fn select_records<'a>(
    records: &'a [AgentPeriodRecord],
    request: &AnalysisRequest,
) -> Vec<&'a AgentPeriodRecord> {
    records
        .iter()
        .filter(|record| record.period == request.period)
        .filter(|record| match &request.center {
            Some(center) => config::center_key(&record.center) == config::center_key(center),
            None => true,
        })
        .collect()
}

pub fn analyze(
    request: &AnalysisRequest,
    records: &[AgentPeriodRecord],
    config: &EngineConfig,
) -> AnalysisReport {
    let run_id = Uuid::new_v4();
    let span = info_span!("analysis", run_id = %run_id, period = %request.period);
    let _guard = span.enter();
    let started = Instant::now();

    let selected = select_records(records, request);
    info!(
        agents = selected.len(),
        center = request.center.as_deref().unwrap_or("all"),
        "analysis started"
    );

    let (agents, priors) = score_population(&selected, config);
    let stats = aggregate::population_stats(&agents);
    let correlations = correlation::correlate_domains(
        agents.iter().map(|agent| &agent.record),
        config.min_correlation_sample,
    );
    let single_domain_weaknesses = correlation::single_domain_weaknesses(&agents, config);

    info!(
        priors = priors.len(),
        avg_risk = stats.avg_risk_score,
        critical = stats.risk_distribution.critical,
        isolated_weaknesses = single_domain_weaknesses.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "analysis finished"
    );

    AnalysisReport {
        run_id,
        period: request.period,
        center: request.center.clone(),
        agents,
        stats,
        correlations,
        single_domain_weaknesses,
    }
}
