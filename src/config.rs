use std::collections::BTreeMap;
use std::env;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

use crate::models::TenureBand;

/// Tunable policy constants for one analysis run.
#[derive(Debug, Clone, Serialize)]
pub struct EngineConfig {
    /// Error rate (percent) at which the error-rate risk saturates.
    pub qc_rate_cap: f64,
    /// Pseudo-count expressing the strength of the group prior.
    pub shrinkage_k: f64,
    /// Peers with valid error-rate data a group needs before it forms a prior.
    pub min_prior_peers: usize,
    pub thresholds: RiskThresholds,
    pub min_correlation_sample: usize,
    pub tenure: TenurePolicy,
    pub center_targets: CenterTargets,
    pub standing: StandingThresholds,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            qc_rate_cap: 20.0,
            shrinkage_k: 5.0,
            min_prior_peers: 2,
            thresholds: RiskThresholds::default(),
            min_correlation_sample: 5,
            tenure: TenurePolicy::default(),
            center_targets: CenterTargets::default(),
            standing: StandingThresholds::default(),
        }
    }
}

impl EngineConfig {
    /// Loads overrides from the process environment (after reading `.env`).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(cap) = parse_var(&lookup, "RISK_QC_RATE_CAP")? {
            config.qc_rate_cap = cap;
        }
        if let Some(k) = parse_var(&lookup, "RISK_SHRINKAGE_K")? {
            config.shrinkage_k = k;
        }
        if let Some(peers) = parse_var(&lookup, "RISK_MIN_PRIOR_PEERS")? {
            config.min_prior_peers = peers;
        }
        if let Some(medium) = parse_var(&lookup, "RISK_THRESHOLD_MEDIUM")? {
            config.thresholds.medium = medium;
        }
        if let Some(high) = parse_var(&lookup, "RISK_THRESHOLD_HIGH")? {
            config.thresholds.high = high;
        }
        if let Some(critical) = parse_var(&lookup, "RISK_THRESHOLD_CRITICAL")? {
            config.thresholds.critical = critical;
        }
        if let Some(min) = parse_var(&lookup, "RISK_MIN_CORRELATION_SAMPLE")? {
            config.min_correlation_sample = min;
        }
        if let Some(raw) = lookup("RISK_TENURE_MULTIPLIERS") {
            config.tenure.multipliers = TenureMultipliers::parse(&raw)?;
        }
        if let Some(raw) = lookup("RISK_CENTER_TARGETS") {
            config.center_targets = CenterTargets::parse(&raw)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.qc_rate_cap > 0.0) {
            return Err(ConfigError::NonPositiveRateCap(self.qc_rate_cap));
        }
        if !(self.shrinkage_k >= 0.0) {
            return Err(ConfigError::NegativePseudoCount(self.shrinkage_k));
        }
        let t = &self.thresholds;
        if !(t.medium <= t.high && t.high <= t.critical) {
            return Err(ConfigError::ThresholdOrder {
                medium: t.medium,
                high: t.high,
                critical: t.critical,
            });
        }
        if self.tenure.multipliers.new_hire < 1.0 {
            return Err(ConfigError::ProbationMultiplier(
                self.tenure.multipliers.new_hire,
            ));
        }
        Ok(())
    }
}

fn parse_var<T, F>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { var: name, value }),
    }
}

/// Ascending score thresholds for the risk levels.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RiskThresholds {
    pub medium: f64,
    pub high: f64,
    pub critical: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            medium: 30.0,
            high: 50.0,
            critical: 70.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct TenurePolicy {
    /// Bands are upper-exclusive month cutoffs.
    pub new_hire_below: i32,
    pub early_below: i32,
    pub standard_below: i32,
    pub multipliers: TenureMultipliers,
}

impl Default for TenurePolicy {
    fn default() -> Self {
        Self {
            new_hire_below: 2,
            early_below: 6,
            standard_below: 12,
            multipliers: TenureMultipliers::default(),
        }
    }
}

impl TenurePolicy {
    /// Unknown tenure is treated as standard. Negative months clamp to zero.
    pub fn band(&self, tenure_months: Option<i32>) -> TenureBand {
        let Some(months) = tenure_months else {
            return TenureBand::Standard;
        };
        let months = months.max(0);
        if months < self.new_hire_below {
            TenureBand::NewHire
        } else if months < self.early_below {
            TenureBand::Early
        } else if months < self.standard_below {
            TenureBand::Standard
        } else {
            TenureBand::Experienced
        }
    }

    pub fn multiplier(&self, band: TenureBand) -> f64 {
        match band {
            TenureBand::NewHire => self.multipliers.new_hire,
            TenureBand::Early => self.multipliers.early,
            TenureBand::Standard => self.multipliers.standard,
            TenureBand::Experienced => self.multipliers.experienced,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct TenureMultipliers {
    pub new_hire: f64,
    pub early: f64,
    pub standard: f64,
    pub experienced: f64,
}

impl Default for TenureMultipliers {
    fn default() -> Self {
        Self {
            new_hire: 1.2,
            early: 1.1,
            standard: 1.0,
            experienced: 1.05,
        }
    }
}

impl TenureMultipliers {
    /// `new_hire,early,standard,experienced`
    fn parse(raw: &str) -> Result<Self, ConfigError> {
        let invalid = || ConfigError::InvalidValue {
            var: "RISK_TENURE_MULTIPLIERS",
            value: raw.to_string(),
        };
        let values = raw
            .split(',')
            .map(|part| part.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| invalid())?;
        match values.as_slice() {
            [new_hire, early, standard, experienced]
                if values.iter().all(|v| v.is_finite() && *v > 0.0) =>
            {
                Ok(Self {
                    new_hire: *new_hire,
                    early: *early,
                    standard: *standard,
                    experienced: *experienced,
                })
            }
            _ => Err(invalid()),
        }
    }
}

/// Target error rates (percent) for the two error-rate sub-metrics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QcTarget {
    pub attitude: f64,
    pub ops: f64,
}

impl QcTarget {
    /// Target for the combined error rate.
    pub fn combined(&self) -> f64 {
        (self.attitude + self.ops) / 2.0
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CenterTargets {
    by_center: BTreeMap<String, QcTarget>,
    fallback: QcTarget,
}

impl Default for CenterTargets {
    fn default() -> Self {
        let mut by_center = BTreeMap::new();
        by_center.insert(
            "yongsan".to_string(),
            QcTarget {
                attitude: 3.3,
                ops: 3.9,
            },
        );
        by_center.insert(
            "gwangju".to_string(),
            QcTarget {
                attitude: 2.7,
                ops: 1.7,
            },
        );
        Self {
            by_center,
            fallback: QcTarget {
                attitude: 3.0,
                ops: 3.0,
            },
        }
    }
}

/// Lookup key for a center label. The upstream exports use the Korean site
/// names, so those map onto the same key as their romanized form.
pub fn center_key(center: &str) -> String {
    let key = center.trim().to_lowercase();
    match key.as_str() {
        "용산" => "yongsan".to_string(),
        "광주" => "gwangju".to_string(),
        _ => key,
    }
}

impl CenterTargets {
    pub fn for_center(&self, center: &str) -> QcTarget {
        self.by_center
            .get(&center_key(center))
            .copied()
            .unwrap_or(self.fallback)
    }

    /// `center:attitude:ops;...`, where a center named `*` replaces the fallback.
    fn parse(raw: &str) -> Result<Self, ConfigError> {
        let mut targets = Self {
            by_center: BTreeMap::new(),
            fallback: Self::default().fallback,
        };
        for entry in raw.split(';').map(str::trim).filter(|e| !e.is_empty()) {
            let parts: Vec<&str> = entry.split(':').map(str::trim).collect();
            let [center, attitude, ops] = parts.as_slice() else {
                return Err(ConfigError::CenterTargets(entry.to_string()));
            };
            let target = match (attitude.parse::<f64>(), ops.parse::<f64>()) {
                (Ok(attitude), Ok(ops)) if attitude > 0.0 && ops > 0.0 => {
                    QcTarget { attitude, ops }
                }
                _ => return Err(ConfigError::CenterTargets(entry.to_string())),
            };
            if *center == "*" {
                targets.fallback = target;
            } else {
                targets.by_center.insert(center_key(center), target);
            }
        }
        Ok(targets)
    }
}

/// Cutoffs for the per-domain strong/normal/weak standing.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct StandingThresholds {
    pub qa_strong: f64,
    pub qa_normal: f64,
    /// Error rate up to `target * factor` is still normal.
    pub qc_normal_factor: f64,
    pub csat_strong: f64,
    pub csat_normal: f64,
    pub quiz_strong: f64,
    pub quiz_normal: f64,
}

impl Default for StandingThresholds {
    fn default() -> Self {
        Self {
            qa_strong: 85.0,
            qa_normal: 60.0,
            qc_normal_factor: 1.5,
            csat_strong: 4.5,
            csat_normal: 3.5,
            quiz_strong: 90.0,
            quiz_normal: 70.0,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} has an invalid value '{value}'")]
    InvalidValue { var: &'static str, value: String },
    #[error("error-rate cap must be positive, got {0}")]
    NonPositiveRateCap(f64),
    #[error("shrinkage pseudo-count must not be negative, got {0}")]
    NegativePseudoCount(f64),
    #[error("risk thresholds must ascend (medium {medium}, high {high}, critical {critical})")]
    ThresholdOrder { medium: f64, high: f64, critical: f64 },
    #[error("new-hire multiplier must be at least 1.0, got {0}")]
    ProbationMultiplier(f64),
    #[error("malformed center target entry '{0}', expected center:attitude:ops")]
    CenterTargets(String),
}
