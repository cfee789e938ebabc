use crate::config::EngineConfig;
use crate::models::{AgentPeriodRecord, Domain, DomainAssessment, Standing};
use crate::weights;

/// Per-domain standing for one agent, independent of the composite score.
///
/// Structurally unavailable domains (satisfaction on voice, knowledge tests
/// for new hires) and unobserved domains are always `NoData`.
pub fn assess(record: &AgentPeriodRecord, config: &EngineConfig) -> Vec<DomainAssessment> {
    let band = config.tenure.band(record.tenure_months);
    Domain::ALL
        .into_iter()
        .map(|domain| {
            if !weights::is_structurally_available(domain, record.channel, band) {
                return DomainAssessment {
                    domain,
                    standing: Standing::NoData,
                    note: not_applicable_note(domain).to_string(),
                };
            }
            match record.observation(domain).value() {
                Some(value) => assess_value(domain, value, record, config),
                None => DomainAssessment {
                    domain,
                    standing: Standing::NoData,
                    note: missing_note(domain).to_string(),
                },
            }
        })
        .collect()
}

fn assess_value(
    domain: Domain,
    value: f64,
    record: &AgentPeriodRecord,
    config: &EngineConfig,
) -> DomainAssessment {
    let t = &config.standing;
    let (standing, note) = match domain {
        Domain::Qa => {
            let standing = at_least(value, t.qa_strong, t.qa_normal);
            let note = match standing {
                Standing::Weak => format!("evaluation score {value:.1} (below standard)"),
                _ => format!("evaluation score {value:.1}"),
            };
            (standing, note)
        }
        Domain::Qc => {
            let target = config.center_targets.for_center(&record.center).combined();
            let standing = if value <= target {
                Standing::Strong
            } else if value <= target * t.qc_normal_factor {
                Standing::Normal
            } else {
                Standing::Weak
            };
            let note = match standing {
                Standing::Weak => format!("error rate {value:.1}% (target {target:.2}% exceeded)"),
                _ => format!("error rate {value:.1}% (target {target:.2}%)"),
            };
            (standing, note)
        }
        Domain::Csat => {
            let standing = at_least(value, t.csat_strong, t.csat_normal);
            let note = match standing {
                Standing::Weak => format!("satisfaction {value:.2} (low, reference only)"),
                _ => format!("satisfaction {value:.2}"),
            };
            (standing, note)
        }
        Domain::Quiz => {
            let standing = at_least(value, t.quiz_strong, t.quiz_normal);
            let note = match standing {
                Standing::Strong => format!("knowledge test {value:.0} (passed)"),
                Standing::Weak => format!("knowledge test {value:.0} (below pass mark)"),
                _ => format!("knowledge test {value:.0}"),
            };
            (standing, note)
        }
    };
    DomainAssessment {
        domain,
        standing,
        note,
    }
}

fn at_least(value: f64, strong: f64, normal: f64) -> Standing {
    if value >= strong {
        Standing::Strong
    } else if value >= normal {
        Standing::Normal
    } else {
        Standing::Weak
    }
}

fn missing_note(domain: Domain) -> &'static str {
    match domain {
        Domain::Qa => "no evaluations",
        Domain::Qc => "not sampled for error review",
        Domain::Csat => "no reviews",
        Domain::Quiz => "no test taken",
    }
}

fn not_applicable_note(domain: Domain) -> &'static str {
    match domain {
        Domain::Csat => "not collected for this channel",
        Domain::Quiz => "not administered during onboarding",
        Domain::Qa | Domain::Qc => "not applicable",
    }
}
