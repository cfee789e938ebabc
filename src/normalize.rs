//! Maps each domain's raw metric onto a common 0-100 risk scale where 0 is
//! the best possible value and 100 the worst.

use crate::models::Domain;

const QA_MAX: f64 = 100.0;
const CSAT_MIN: f64 = 1.0;
const CSAT_MAX: f64 = 5.0;
const QUIZ_MAX: f64 = 100.0;

/// Evaluation score (0-100, higher is better).
pub fn qa_risk(score: f64) -> f64 {
    clamp_risk(QA_MAX - score)
}

/// Error rate in percent, saturating at `rate_cap` percent.
pub fn qc_risk(rate_percent: f64, rate_cap: f64) -> f64 {
    clamp_risk((rate_percent / rate_cap).min(1.0) * 100.0)
}

/// Satisfaction score (1.0-5.0, higher is better).
pub fn csat_risk(score: f64) -> f64 {
    clamp_risk((CSAT_MAX - score) / (CSAT_MAX - CSAT_MIN) * 100.0)
}

/// Knowledge score (0-100, higher is better).
pub fn quiz_risk(score: f64) -> f64 {
    clamp_risk(QUIZ_MAX - score)
}

pub fn domain_risk(domain: Domain, value: f64, rate_cap: f64) -> f64 {
    match domain {
        Domain::Qa => qa_risk(value),
        Domain::Qc => qc_risk(value, rate_cap),
        Domain::Csat => csat_risk(value),
        Domain::Quiz => quiz_risk(value),
    }
}

fn clamp_risk(risk: f64) -> f64 {
    risk.clamp(0.0, 100.0)
}
