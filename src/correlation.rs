use tracing::debug;

use crate::assess;
use crate::config::EngineConfig;
use crate::models::{
    AgentPeriodRecord, CorrelationResult, Domain, ScoredAgent, SingleDomainWeakness, Standing,
};

/// Pearson's r for every unordered domain pair, over agents with both values.
///
/// Pairs below `min_sample` report r = 0 with their true sample size.
pub fn correlate_domains<'a, I>(records: I, min_sample: usize) -> Vec<CorrelationResult>
where
    I: IntoIterator<Item = &'a AgentPeriodRecord>,
    I::IntoIter: Clone,
{
    let records = records.into_iter();
    let mut results = Vec::with_capacity(6);

    for (i, domain_a) in Domain::ALL.iter().enumerate() {
        for domain_b in &Domain::ALL[i + 1..] {
            let pairs: Vec<(f64, f64)> = records
                .clone()
                .filter_map(|record| {
                    let a = record.observation(*domain_a).value()?;
                    let b = record.observation(*domain_b).value()?;
                    Some((a, b))
                })
                .collect();

            let reliable = pairs.len() >= min_sample.max(2);
            let pearson_r = if reliable { pearson(&pairs) } else { 0.0 };
            debug!(
                domain_a = %domain_a,
                domain_b = %domain_b,
                sample_size = pairs.len(),
                r = pearson_r,
                "domain correlation"
            );
            results.push(CorrelationResult {
                domain_a: *domain_a,
                domain_b: *domain_b,
                pearson_r,
                sample_size: pairs.len(),
                reliable,
            });
        }
    }

    results
}

/// Zero when either side has no variance.
pub fn pearson(pairs: &[(f64, f64)]) -> f64 {
    let n = pairs.len() as f64;
    if pairs.len() < 2 {
        return 0.0;
    }
    let mean_a = pairs.iter().map(|(a, _)| a).sum::<f64>() / n;
    let mean_b = pairs.iter().map(|(_, b)| b).sum::<f64>() / n;

    let (mut cov, mut var_a, mut var_b) = (0.0, 0.0, 0.0);
    for (a, b) in pairs {
        let da = a - mean_a;
        let db = b - mean_b;
        cov += da * db;
        var_a += da * da;
        var_b += db * db;
    }

    let denominator = (var_a * var_b).sqrt();
    if denominator == 0.0 || !denominator.is_finite() {
        return 0.0;
    }
    (cov / denominator).clamp(-1.0, 1.0)
}

/// Agents weak in exactly one domain while strong or normal in at least one other.
pub fn single_domain_weaknesses(
    agents: &[ScoredAgent],
    config: &EngineConfig,
) -> Vec<SingleDomainWeakness> {
    agents
        .iter()
        .filter_map(|agent| {
            let assessments = assess::assess(&agent.record, config);
            let mut weak = assessments.iter().filter(|a| a.standing == Standing::Weak);
            let only_weak = weak.next()?;
            if weak.next().is_some() {
                return None;
            }
            let has_solid_domain = assessments
                .iter()
                .any(|a| matches!(a.standing, Standing::Strong | Standing::Normal));
            if !has_solid_domain {
                return None;
            }
            Some(SingleDomainWeakness {
                agent_id: agent.record.agent_id.clone(),
                agent_name: agent.record.agent_name.clone(),
                center: agent.record.center.clone(),
                weak_domain: only_weak.domain,
                composite_risk_score: agent.composite_risk_score,
                note: only_weak.note.clone(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Channel, Observation};
    use crate::risk::score_agent;
    use crate::risk::tests::sample_record;

    #[test]
    fn pearson_detects_perfect_relationships() {
        let rising: Vec<(f64, f64)> = (0..6).map(|i| (i as f64, 2.0 * i as f64 + 1.0)).collect();
        assert!((pearson(&rising) - 1.0).abs() < 1e-9);
        let falling: Vec<(f64, f64)> = (0..6).map(|i| (i as f64, -(i as f64))).collect();
        assert!((pearson(&falling) + 1.0).abs() < 1e-9);
        assert_eq!(pearson(&[(1.0, 3.0), (2.0, 3.0), (3.0, 3.0)]), 0.0);
    }

    #[test]
    fn anti_correlated_domains_report_negative_r() {
        let mut records = Vec::new();
        for i in 0..8 {
            let mut record = sample_record(&format!("a-{i}"));
            let qa = 60.0 + 5.0 * i as f64;
            record.qa = Observation::new(Some(qa), Some(3));
            record.qc = Observation::new(Some(12.0 - 1.2 * i as f64 + (i % 2) as f64 * 0.3), Some(10));
            records.push(record);
        }
        // qa without qc: excluded from the pair
        let mut lone = sample_record("lone");
        lone.qa = Observation::new(Some(99.0), Some(2));
        records.push(lone);

        let results = correlate_domains(&records, 5);
        assert_eq!(results.len(), 6);
        let qa_qc = results
            .iter()
            .find(|r| r.domain_a == Domain::Qa && r.domain_b == Domain::Qc)
            .expect("qa-qc pair");
        assert_eq!(qa_qc.sample_size, 8);
        assert!(qa_qc.reliable);
        assert!(qa_qc.pearson_r < -0.9);
    }

    #[test]
    fn small_samples_report_zero_with_size() {
        let mut records = Vec::new();
        for i in 0..3 {
            let mut record = sample_record(&format!("a-{i}"));
            record.channel = Channel::Chat;
            record.qa = Observation::new(Some(70.0 + i as f64), Some(2));
            record.csat = Observation::new(Some(4.0 + 0.1 * i as f64), Some(9));
            records.push(record);
        }
        let results = correlate_domains(&records, 5);
        let qa_csat = results
            .iter()
            .find(|r| r.domain_a == Domain::Qa && r.domain_b == Domain::Csat)
            .expect("qa-csat pair");
        assert_eq!(qa_csat.sample_size, 3);
        assert_eq!(qa_csat.pearson_r, 0.0);
        assert!(!qa_csat.reliable);
    }

    #[test]
    fn finds_isolated_weaknesses() {
        let config = EngineConfig::default();

        let mut isolated = sample_record("isolated");
        isolated.qa = Observation::new(Some(90.0), Some(3));
        isolated.qc = Observation::new(Some(9.0), Some(10));

        let mut general = sample_record("general");
        general.qa = Observation::new(Some(40.0), Some(3));
        general.qc = Observation::new(Some(9.0), Some(10));

        let mut only_one_domain = sample_record("only-one");
        only_one_domain.qc = Observation::new(Some(9.0), Some(10));

        let agents: Vec<ScoredAgent> = [isolated, general, only_one_domain]
            .iter()
            .map(|r| score_agent(r, None, &config))
            .collect();

        let weaknesses = single_domain_weaknesses(&agents, &config);
        assert_eq!(weaknesses.len(), 1);
        assert_eq!(weaknesses[0].agent_id, "isolated");
        assert_eq!(weaknesses[0].weak_domain, Domain::Qc);
    }
}
