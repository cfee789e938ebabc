use std::io::{Read, Write};
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::models::{AgentPeriodRecord, Channel, Observation, Period};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read metrics: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to write metrics: {0}")]
    Io(#[from] std::io::Error),
}

/// One exported row of per-agent, per-period metrics.
///
/// Unparsable numbers read as missing so one bad cell only costs that
/// domain; the hire date is kept raw and validated in [`MetricRow::into_record`].
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MetricRow {
    pub period: String,
    pub agent_id: String,
    pub agent_name: Option<String>,
    pub center: Option<String>,
    pub service: Option<String>,
    pub channel: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub tenure_months: Option<i32>,
    pub hire_date: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub qa_score: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub qa_eval_count: Option<u32>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub qc_attitude_rate: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub qc_ops_rate: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub qc_eval_count: Option<u32>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub csat_avg_score: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub csat_review_count: Option<u32>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub knowledge_score: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub knowledge_test_count: Option<u32>,
}

impl MetricRow {
    /// `None` when the row cannot be attributed to an agent and period.
    pub fn into_record(self) -> Option<AgentPeriodRecord> {
        let agent_id = self.agent_id.trim().to_string();
        if agent_id.is_empty() {
            warn!(period = %self.period, "skipping row without agent id");
            return None;
        }
        let Some(period) = Period::parse(&self.period) else {
            warn!(agent_id = %agent_id, period = %self.period, "skipping row with unparsable period");
            return None;
        };

        let channel = match self.channel.as_deref().and_then(Channel::parse) {
            Some(channel) => channel,
            None => {
                warn!(
                    agent_id = %agent_id,
                    channel = ?self.channel,
                    "unknown channel, scoring as voice"
                );
                Channel::Voice
            }
        };

        let hire_date = self
            .hire_date
            .as_deref()
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .and_then(|raw| match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
                Ok(date) => Some(date),
                Err(_) => {
                    warn!(agent_id = %agent_id, hire_date = raw, "ignoring invalid hire date");
                    None
                }
            });

        let tenure_months = self
            .tenure_months
            .or_else(|| hire_date.map(|hired| period.months_since(hired)))
            .map(|months| {
                if months < 0 {
                    warn!(agent_id = %agent_id, months, "negative tenure clamped to zero");
                }
                months.max(0)
            });

        // combined error rate is the mean of the two sub-rates
        let qc_rate = match (self.qc_attitude_rate, self.qc_ops_rate) {
            (Some(attitude), Some(ops)) => Some((attitude + ops) / 2.0),
            _ => None,
        };

        Some(AgentPeriodRecord {
            period,
            agent_id,
            agent_name: self.agent_name.filter(|name| !name.trim().is_empty()),
            center: self.center.unwrap_or_default().trim().to_string(),
            service: self.service.filter(|service| !service.trim().is_empty()),
            channel,
            tenure_months,
            qa: Observation::new(self.qa_score, self.qa_eval_count),
            qc: Observation::new(qc_rate, self.qc_eval_count),
            csat: Observation::new(self.csat_avg_score, self.csat_review_count),
            quiz: Observation::new(self.knowledge_score, self.knowledge_test_count),
        })
    }
}

pub fn read_records<R: Read>(reader: R) -> Result<Vec<AgentPeriodRecord>, SourceError> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut records = Vec::new();
    let mut skipped = 0usize;

    for result in reader.deserialize::<MetricRow>() {
        let row = match result {
            Ok(row) => row,
            Err(err) if err.is_io_error() => return Err(err.into()),
            Err(err) => {
                warn!(
                    line = err.position().map(|pos| pos.line()),
                    error = %err,
                    "skipping malformed row"
                );
                skipped += 1;
                continue;
            }
        };
        match row.into_record() {
            Some(record) => records.push(record),
            None => skipped += 1,
        }
    }

    info!(loaded = records.len(), skipped, "metric rows loaded");
    Ok(records)
}

pub fn load_csv(path: &Path) -> Result<Vec<AgentPeriodRecord>, SourceError> {
    let file = std::fs::File::open(path)?;
    read_records(file)
}

/// Writes a demo dataset covering both channels, both centers and every
/// tenure band over three months.
pub fn write_sample<W: Write>(writer: W) -> Result<usize, SourceError> {
    let agents = [
        ("ys-001", "Avery Lee", "Yongsan", "taxi", "voice", Some(14)),
        ("ys-002", "Jules Moreno", "Yongsan", "taxi", "voice", Some(7)),
        ("ys-003", "Kiara Patel", "Yongsan", "taxi", "voice", Some(1)),
        ("ys-004", "Noah Kim", "Yongsan", "parking", "chat", Some(9)),
        ("ys-005", "Mina Park", "Yongsan", "parking", "chat", Some(3)),
        ("gj-001", "Theo Grant", "Gwangju", "bike", "chat", Some(20)),
        ("gj-002", "Lena Cho", "Gwangju", "bike", "chat", Some(0)),
        ("gj-003", "Sam Rivera", "Gwangju", "taxi", "voice", None),
        ("gj-004", "Iris Han", "Gwangju", "bike", "chat", Some(11)),
    ];
    let periods = ["2025-11", "2025-12", "2026-01"];

    let mut writer = csv::Writer::from_writer(writer);
    let mut rows = 0usize;

    for (month, period) in periods.iter().enumerate() {
        let drift = month as f64;
        for (index, (id, name, center, service, channel, tenure)) in agents.iter().enumerate() {
            let spread = index as f64;
            let is_chat = *channel == "chat";
            let tenure = tenure.map(|months| months + month as i32);
            let new_hire = tenure.is_some_and(|months| months < 2);

            let mut row = MetricRow {
                period: period.to_string(),
                agent_id: id.to_string(),
                agent_name: Some(name.to_string()),
                center: Some(center.to_string()),
                service: Some(service.to_string()),
                channel: Some(channel.to_string()),
                tenure_months: tenure,
                qa_score: Some(94.0 - spread * 3.5 + drift),
                qa_eval_count: Some(4),
                qc_attitude_rate: Some(1.5 + spread * 0.6 - drift * 0.2),
                qc_ops_rate: Some(2.0 + spread * 0.5 - drift * 0.1),
                qc_eval_count: Some(if index % 3 == 2 { 3 } else { 18 + index as u32 }),
                ..MetricRow::default()
            };
            if is_chat {
                row.csat_avg_score = Some((4.8 - spread * 0.12 + drift * 0.02).min(5.0));
                row.csat_review_count = Some(20 + 3 * index as u32);
            }
            if !new_hire {
                row.knowledge_score = Some(95.0 - spread * 4.0);
                row.knowledge_test_count = Some(1);
            }
            // one agent skipped error review this month
            if index == 7 && month == 1 {
                row.qc_attitude_rate = None;
                row.qc_ops_rate = None;
                row.qc_eval_count = None;
            }

            writer.serialize(&row)?;
            rows += 1;
        }
    }

    writer.flush()?;
    Ok(rows)
}
