use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::models::{AgentPeriodRecord, Domain, GroupKey, GroupPrior, RiskLevel, ScoredAgent};

pub type GroupPriors = HashMap<GroupKey, GroupPrior>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RiskDistribution {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
    pub critical: usize,
}

impl RiskDistribution {
    fn record(&mut self, level: RiskLevel) {
        match level {
            RiskLevel::Low => self.low += 1,
            RiskLevel::Medium => self.medium += 1,
            RiskLevel::High => self.high += 1,
            RiskLevel::Critical => self.critical += 1,
        }
    }

    pub fn count(&self, level: RiskLevel) -> usize {
        match level {
            RiskLevel::Low => self.low,
            RiskLevel::Medium => self.medium,
            RiskLevel::High => self.high,
            RiskLevel::Critical => self.critical,
        }
    }
}

/// Mean raw value per domain, over the agents with data in that domain only.
/// `None` when no agent has the domain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DomainAverages {
    pub qa: Option<f64>,
    pub qc_rate: Option<f64>,
    pub csat: Option<f64>,
    pub quiz: Option<f64>,
}

impl DomainAverages {
    pub fn get(&self, domain: Domain) -> Option<f64> {
        match domain {
            Domain::Qa => self.qa,
            Domain::Qc => self.qc_rate,
            Domain::Csat => self.csat,
            Domain::Quiz => self.quiz,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CenterStats {
    pub center: String,
    pub agents: usize,
    pub avg_risk_score: f64,
    pub risk_distribution: RiskDistribution,
    pub domain_averages: DomainAverages,
}

#[derive(Debug, Clone, Serialize)]
pub struct PopulationStats {
    pub total_agents: usize,
    pub agents_with_data: usize,
    pub avg_risk_score: f64,
    pub risk_distribution: RiskDistribution,
    pub domain_averages: DomainAverages,
    pub centers: Vec<CenterStats>,
}

#[derive(Default)]
struct Accumulator {
    agents: usize,
    risk_sum: f64,
    distribution: RiskDistribution,
    sums: [(f64, usize); 4],
}

impl Accumulator {
    fn add(&mut self, agent: &ScoredAgent) {
        self.agents += 1;
        self.risk_sum += agent.composite_risk_score;
        self.distribution.record(agent.risk_level);
        for (slot, domain) in Domain::ALL.iter().enumerate() {
            if let Some(value) = agent.record.observation(*domain).value() {
                self.sums[slot].0 += value;
                self.sums[slot].1 += 1;
            }
        }
    }

    fn mean(&self, slot: usize) -> Option<f64> {
        let (sum, count) = self.sums[slot];
        (count > 0).then(|| sum / count as f64)
    }

    fn avg_risk(&self) -> f64 {
        if self.agents == 0 {
            0.0
        } else {
            self.risk_sum / self.agents as f64
        }
    }

    fn domain_averages(&self) -> DomainAverages {
        DomainAverages {
            qa: self.mean(0),
            qc_rate: self.mean(1),
            csat: self.mean(2),
            quiz: self.mean(3),
        }
    }
}

pub fn population_stats(agents: &[ScoredAgent]) -> PopulationStats {
    let mut overall = Accumulator::default();
    let mut by_center: BTreeMap<&str, Accumulator> = BTreeMap::new();

    for agent in agents {
        overall.add(agent);
        let center = agent.record.center.trim();
        if center.is_empty() {
            continue;
        }
        by_center.entry(center).or_default().add(agent);
    }

    let centers = by_center
        .into_iter()
        .map(|(center, acc)| CenterStats {
            center: center.to_string(),
            agents: acc.agents,
            avg_risk_score: acc.avg_risk(),
            risk_distribution: acc.distribution,
            domain_averages: acc.domain_averages(),
        })
        .collect();

    PopulationStats {
        total_agents: agents.len(),
        agents_with_data: agents.iter().filter(|a| a.record.has_any_data()).count(),
        avg_risk_score: overall.avg_risk(),
        risk_distribution: overall.distribution,
        domain_averages: overall.domain_averages(),
        centers,
    }
}

/// Mean error rate per (service, channel) group. Groups with fewer than
/// `min_peers` contributing agents are left out, so their members keep the
/// unshrunk rate.
pub fn group_priors<'a, I>(records: I, min_peers: usize) -> GroupPriors
where
    I: IntoIterator<Item = &'a AgentPeriodRecord>,
{
    let mut sums: HashMap<GroupKey, (f64, usize)> = HashMap::new();
    for record in records {
        if let Some(rate) = record.qc.value() {
            let entry = sums.entry(record.group_key()).or_insert((0.0, 0));
            entry.0 += rate;
            entry.1 += 1;
        }
    }

    sums.into_iter()
        .filter(|(_, (_, count))| *count >= min_peers.max(1))
        .map(|(key, (sum, count))| {
            (
                key,
                GroupPrior {
                    mean_rate: sum / count as f64,
                    contributors: count,
                },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::models::{Channel, Observation};
    use crate::risk::score_agent;
    use crate::risk::tests::sample_record;

    #[test]
    fn priors_need_enough_peers() {
        let mut a = sample_record("a");
        a.qc = Observation::new(Some(4.0), Some(10));
        let mut b = sample_record("b");
        b.qc = Observation::new(Some(6.0), Some(10));
        let mut lonely = sample_record("c");
        lonely.service = Some("bike".to_string());
        lonely.qc = Observation::new(Some(9.0), Some(10));
        let mut no_samples = sample_record("d");
        no_samples.service = Some("bike".to_string());
        no_samples.qc = Observation::new(Some(1.0), Some(0));

        let priors = group_priors([&a, &b, &lonely, &no_samples], 2);
        assert_eq!(priors.len(), 1);
        let prior = priors.get(&a.group_key()).expect("taxi voice prior");
        assert_eq!(prior.mean_rate, 5.0);
        assert_eq!(prior.contributors, 2);
        assert!(!priors.contains_key(&lonely.group_key()));
    }

    #[test]
    fn channel_separates_groups() {
        let mut voice = sample_record("a");
        voice.qc = Observation::new(Some(4.0), Some(10));
        let mut chat = sample_record("b");
        chat.channel = Channel::Chat;
        chat.qc = Observation::new(Some(6.0), Some(10));
        assert!(group_priors([&voice, &chat], 2).is_empty());
    }

    #[test]
    fn stats_cover_distribution_and_domains() {
        let config = EngineConfig::default();
        let mut strong = sample_record("a");
        strong.qa = Observation::new(Some(95.0), Some(3));
        let mut weak = sample_record("b");
        weak.center = "Gwangju".to_string();
        weak.qa = Observation::new(Some(20.0), Some(3));
        weak.qc = Observation::new(Some(18.0), Some(3));
        let empty = sample_record("c");

        let agents: Vec<ScoredAgent> = [strong, weak, empty]
            .iter()
            .map(|r| score_agent(r, None, &config))
            .collect();
        let stats = population_stats(&agents);

        assert_eq!(stats.total_agents, 3);
        assert_eq!(stats.agents_with_data, 2);
        assert_eq!(stats.risk_distribution.low, 2);
        assert_eq!(stats.risk_distribution.critical, 1);
        assert_eq!(stats.domain_averages.qa, Some(57.5));
        assert_eq!(stats.domain_averages.qc_rate, Some(18.0));
        assert_eq!(stats.domain_averages.csat, None);

        let expected_avg =
            agents.iter().map(|a| a.composite_risk_score).sum::<f64>() / 3.0;
        assert!((stats.avg_risk_score - expected_avg).abs() < 1e-9);

        assert_eq!(stats.centers.len(), 2);
        let yongsan = stats
            .centers
            .iter()
            .find(|c| c.center == "Yongsan")
            .expect("yongsan stats");
        assert_eq!(yongsan.agents, 2);
        assert_eq!(yongsan.domain_averages.qa, Some(95.0));
    }
}
