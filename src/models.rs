use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Serialize, Serializer};

use crate::risk::RiskBreakdown;
use crate::shrinkage::ShrinkageEstimate;

/// One of the four independent evaluation signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Qa,
    Qc,
    Csat,
    Quiz,
}

impl Domain {
    pub const ALL: [Domain; 4] = [Domain::Qa, Domain::Qc, Domain::Csat, Domain::Quiz];

    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Qa => "qa",
            Domain::Qc => "qc",
            Domain::Csat => "csat",
            Domain::Quiz => "quiz",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Domain::Qa => "evaluation score",
            Domain::Qc => "error rate",
            Domain::Csat => "satisfaction",
            Domain::Quiz => "knowledge test",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Voice,
    Chat,
}

impl Channel {
    /// Accepts the labels used by the upstream exports; `None` for anything else.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "voice" | "phone" | "call" | "유선" => Some(Channel::Voice),
            "chat" | "채팅" => Some(Channel::Chat),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Voice => "voice",
            Channel::Chat => "chat",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Time-in-role bucket. Only `NewHire` switches the weight table; every band
/// carries its own amplification multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TenureBand {
    NewHire,
    Early,
    Standard,
    Experienced,
}

impl TenureBand {
    pub fn as_str(&self) -> &'static str {
        match self {
            TenureBand::NewHire => "new_hire",
            TenureBand::Early => "early",
            TenureBand::Standard => "standard",
            TenureBand::Experienced => "experienced",
        }
    }
}

/// Reporting month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Period {
    year: i32,
    month: u32,
}

impl Period {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|_| Self { year, month })
    }

    /// Parses `YYYY-MM` (a trailing day, `YYYY-MM-DD`, is tolerated).
    pub fn parse(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        let date = NaiveDate::parse_from_str(&format!("{trimmed}-01"), "%Y-%m-%d")
            .or_else(|_| NaiveDate::parse_from_str(trimmed, "%Y-%m-%d"))
            .ok()?;
        Self::new(date.year(), date.month())
    }

    pub fn previous(&self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    /// Whole months elapsed from `date` to the first day of this period.
    pub fn months_since(&self, date: NaiveDate) -> i32 {
        let mut months = (self.year - date.year()) * 12 + self.month as i32 - date.month() as i32;
        if date.day() > 1 {
            months -= 1;
        }
        months
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for Period {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A domain measurement together with the number of samples behind it.
///
/// A value only counts as observed when at least one sample supports it; a
/// value reported with a zero count is kept around so it can be flagged, but
/// [`Observation::value`] hides it from every scoring path.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Observation {
    raw: Option<f64>,
    count: u32,
}

impl Observation {
    pub fn new(value: Option<f64>, count: Option<u32>) -> Self {
        Self {
            raw: value.filter(|v| v.is_finite()),
            count: count.unwrap_or(0),
        }
    }

    pub fn is_present(&self) -> bool {
        self.raw.is_some() && self.count > 0
    }

    pub fn value(&self) -> Option<f64> {
        if self.is_present() {
            self.raw
        } else {
            None
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Value reported without any supporting sample.
    pub fn is_contract_violation(&self) -> bool {
        self.raw.is_some() && self.count == 0
    }
}

/// Raw per-agent, per-period input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentPeriodRecord {
    pub period: Period,
    pub agent_id: String,
    pub agent_name: Option<String>,
    pub center: String,
    pub service: Option<String>,
    pub channel: Channel,
    pub tenure_months: Option<i32>,
    pub qa: Observation,
    pub qc: Observation,
    pub csat: Observation,
    pub quiz: Observation,
}

impl AgentPeriodRecord {
    pub fn observation(&self, domain: Domain) -> &Observation {
        match domain {
            Domain::Qa => &self.qa,
            Domain::Qc => &self.qc,
            Domain::Csat => &self.csat,
            Domain::Quiz => &self.quiz,
        }
    }

    pub fn has_any_data(&self) -> bool {
        Domain::ALL
            .iter()
            .any(|domain| self.observation(*domain).is_present())
    }

    pub fn group_key(&self) -> GroupKey {
        GroupKey {
            service: self.service.clone().unwrap_or_default(),
            channel: self.channel,
        }
    }

    pub fn display_name(&self) -> &str {
        self.agent_name.as_deref().unwrap_or(&self.agent_id)
    }
}

/// Peer group used for the error-rate prior.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct GroupKey {
    pub service: String,
    pub channel: Channel,
}

/// Mean error rate (percent) of the agents in a group with valid error-rate data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GroupPrior {
    pub mean_rate: f64,
    pub contributors: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 4] = [
        RiskLevel::Low,
        RiskLevel::Medium,
        RiskLevel::High,
        RiskLevel::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Standing {
    Strong,
    Normal,
    Weak,
    NoData,
}

impl Standing {
    pub fn as_str(&self) -> &'static str {
        match self {
            Standing::Strong => "strong",
            Standing::Normal => "normal",
            Standing::Weak => "weak",
            Standing::NoData => "no-data",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainAssessment {
    pub domain: Domain,
    pub standing: Standing,
    pub note: String,
}

/// Finalized result for one agent-period.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredAgent {
    pub record: AgentPeriodRecord,
    pub tenure_band: TenureBand,
    pub composite_risk_score: f64,
    pub risk_level: RiskLevel,
    pub breakdown: RiskBreakdown,
    pub suppressed_domains: Vec<Domain>,
}

impl ScoredAgent {
    pub fn qc_adjustment(&self) -> Option<&ShrinkageEstimate> {
        self.breakdown.qc_adjustment.as_ref()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationResult {
    pub domain_a: Domain,
    pub domain_b: Domain,
    pub pearson_r: f64,
    pub sample_size: usize,
    pub reliable: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SingleDomainWeakness {
    pub agent_id: String,
    pub agent_name: Option<String>,
    pub center: String,
    pub weak_domain: Domain,
    pub composite_risk_score: f64,
    pub note: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observation_requires_samples() {
        assert!(Observation::new(Some(80.0), Some(3)).is_present());
        let zero = Observation::new(Some(80.0), Some(0));
        assert!(!zero.is_present());
        assert!(zero.is_contract_violation());
        assert_eq!(zero.value(), None);
        assert!(!Observation::new(None, Some(4)).is_present());
        assert!(!Observation::new(Some(f64::NAN), Some(4)).is_present());
    }

    #[test]
    fn channel_parses_known_labels() {
        assert_eq!(Channel::parse("Chat"), Some(Channel::Chat));
        assert_eq!(Channel::parse("채팅"), Some(Channel::Chat));
        assert_eq!(Channel::parse(" 유선 "), Some(Channel::Voice));
        assert_eq!(Channel::parse("email"), None);
    }

    #[test]
    fn period_parses_and_steps_back() {
        let period = Period::parse("2026-01").expect("valid period");
        assert_eq!(period.to_string(), "2026-01");
        assert_eq!(period.previous().to_string(), "2025-12");
        assert!(Period::parse("2026-13").is_none());
        assert!(Period::parse("january").is_none());
    }

    #[test]
    fn months_since_counts_whole_months() {
        let period = Period::new(2026, 3).expect("valid period");
        let hired = NaiveDate::from_ymd_opt(2026, 1, 1).expect("valid date");
        assert_eq!(period.months_since(hired), 2);
        let mid_month = NaiveDate::from_ymd_opt(2026, 1, 15).expect("valid date");
        assert_eq!(period.months_since(mid_month), 1);
        let future = NaiveDate::from_ymd_opt(2026, 5, 1).expect("valid date");
        assert!(period.months_since(future) < 0);
    }
}
