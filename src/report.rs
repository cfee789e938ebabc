use std::fmt::Write;

use crate::aggregate::DomainAverages;
use crate::analysis::AnalysisReport;
use crate::models::{Domain, RiskLevel};
use crate::trend::AgentProfile;

pub fn build_report(report: &AnalysisReport, top: usize) -> String {
    let mut output = String::new();
    let center_label = report.center.as_deref().unwrap_or("all centers");
    let stats = &report.stats;

    let _ = writeln!(output, "# Agent Risk Report");
    let _ = writeln!(
        output,
        "Generated for {} ({}), run {}",
        center_label, report.period, report.run_id
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Overview");
    let _ = writeln!(
        output,
        "- {} agents, {} with data, average risk {:.1}",
        stats.total_agents, stats.agents_with_data, stats.avg_risk_score
    );
    for level in RiskLevel::ALL {
        let _ = writeln!(
            output,
            "- {}: {}",
            level.as_str(),
            stats.risk_distribution.count(level)
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Domain Averages");
    write_domain_averages(&mut output, &stats.domain_averages);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Center Comparison");
    if stats.centers.is_empty() {
        let _ = writeln!(output, "No center attribution in this population.");
    } else {
        let _ = writeln!(output, "| center | agents | avg risk | qa | qc rate | csat | quiz |");
        let _ = writeln!(output, "|---|---|---|---|---|---|---|");
        for center in &stats.centers {
            let averages = &center.domain_averages;
            let _ = writeln!(
                output,
                "| {} | {} | {:.1} | {} | {} | {} | {} |",
                center.center,
                center.agents,
                center.avg_risk_score,
                format_mean(averages.qa, 1),
                format_mean(averages.qc_rate, 2),
                format_mean(averages.csat, 2),
                format_mean(averages.quiz, 1),
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Highest Risk Agents");
    if report.agents.is_empty() {
        let _ = writeln!(output, "No agents in this period.");
    } else {
        for agent in report.agents.iter().take(top) {
            let record = &agent.record;
            let _ = write!(
                output,
                "- {} ({}, {}, {}) score {:.1} [{}]",
                record.display_name(),
                record.agent_id,
                record.center,
                record.channel,
                agent.composite_risk_score,
                agent.risk_level.as_str()
            );
            if let Some(adjustment) = agent.qc_adjustment() {
                let _ = write!(
                    output,
                    ", error rate {:.1}% adjusted to {:.1}% ({} confidence)",
                    adjustment.raw_rate * 100.0,
                    adjustment.adjusted_rate * 100.0,
                    adjustment.confidence.as_str()
                );
            }
            let _ = writeln!(output);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Domain Correlations");
    for correlation in &report.correlations {
        let marker = if correlation.reliable {
            ""
        } else {
            " (insufficient sample)"
        };
        let _ = writeln!(
            output,
            "- {} vs {}: r = {:.2}, n = {}{}",
            correlation.domain_a, correlation.domain_b, correlation.pearson_r,
            correlation.sample_size, marker
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Weak In A Single Domain");
    if report.single_domain_weaknesses.is_empty() {
        let _ = writeln!(output, "No isolated weaknesses found.");
    } else {
        for weakness in &report.single_domain_weaknesses {
            let _ = writeln!(
                output,
                "- {} ({}): {} - {}",
                weakness.agent_name.as_deref().unwrap_or(&weakness.agent_id),
                weakness.center,
                weakness.weak_domain.label(),
                weakness.note
            );
        }
    }

    output
}

pub fn build_profile(profile: &AgentProfile) -> String {
    let mut output = String::new();
    let name = profile.agent_name.as_deref().unwrap_or(&profile.agent_id);

    let _ = writeln!(output, "# {} ({})", name, profile.agent_id);
    let _ = writeln!(
        output,
        "{} / {} / {}, {} tenure",
        profile.center,
        profile.service.as_deref().unwrap_or("-"),
        profile.channel,
        profile.current.tenure_band.as_str()
    );
    let _ = writeln!(
        output,
        "Current score {:.1} [{}] for {}",
        profile.current.composite_risk_score,
        profile.current.risk_level.as_str(),
        profile.current.record.period
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Trend");
    let _ = writeln!(output, "| period | qa | qc rate | csat | quiz | risk |");
    let _ = writeln!(output, "|---|---|---|---|---|---|");
    for point in &profile.monthly_trend {
        let _ = writeln!(
            output,
            "| {} | {} | {} | {} | {} | {:.1} ({}) |",
            point.period,
            format_mean(point.qa_score, 1),
            format_mean(point.qc_rate, 2),
            format_mean(point.csat_score, 2),
            format_mean(point.quiz_score, 0),
            point.risk_score,
            point.risk_level.as_str()
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Strengths And Weaknesses");
    for assessment in &profile.strength_weakness {
        let _ = writeln!(
            output,
            "- {}: {} ({})",
            assessment.domain.label(),
            assessment.standing.as_str(),
            assessment.note
        );
    }

    output
}

fn write_domain_averages(output: &mut String, averages: &DomainAverages) {
    for domain in Domain::ALL {
        let precision = match domain {
            Domain::Qc | Domain::Csat => 2,
            Domain::Qa | Domain::Quiz => 1,
        };
        let _ = writeln!(
            output,
            "- {}: {}",
            domain.label(),
            format_mean(averages.get(domain), precision)
        );
    }
}

fn format_mean(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(value) => format!("{value:.precision$}"),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{analyze, AnalysisRequest};
    use crate::config::EngineConfig;
    use crate::models::{Observation, Period};
    use crate::risk::tests::sample_record;
    use crate::trend::agent_profile;

    fn sample_report() -> AnalysisReport {
        let mut strong = sample_record("a-1");
        strong.qa = Observation::new(Some(92.0), Some(3));
        strong.qc = Observation::new(Some(1.0), Some(20));
        let mut weak = sample_record("a-2");
        weak.agent_name = Some("Jules Moreno".to_string());
        weak.qa = Observation::new(Some(91.0), Some(3));
        weak.qc = Observation::new(Some(12.0), Some(3));

        let request = AnalysisRequest {
            period: Period::new(2026, 1).expect("valid period"),
            center: None,
        };
        analyze(&request, &[strong, weak], &EngineConfig::default())
    }

    #[test]
    fn report_lists_sections() {
        let output = build_report(&sample_report(), 10);
        assert!(output.starts_with("# Agent Risk Report"));
        assert!(output.contains("## Center Comparison"));
        assert!(output.contains("| Yongsan | 2 |"));
        assert!(output.contains("qa vs qc: r = 0.00, n = 2 (insufficient sample)"));
        assert!(output.contains("- satisfaction: -"));
        assert!(output.contains("Jules Moreno (Yongsan): error rate"));
        assert!(output.contains("adjusted to"));
    }

    #[test]
    fn top_limits_agent_list() {
        let output = build_report(&sample_report(), 1);
        let section = output
            .split("## Highest Risk Agents")
            .nth(1)
            .and_then(|rest| rest.split("##").next())
            .expect("agent section");
        assert_eq!(section.lines().filter(|l| l.starts_with("- ")).count(), 1);
    }

    #[test]
    fn profile_renders_trend_rows() {
        let mut record = sample_record("a-1");
        record.qa = Observation::new(Some(80.0), Some(2));
        let profile = agent_profile(&[record], "a-1", None, 3, &EngineConfig::default())
            .expect("profile exists");
        let output = build_profile(&profile);
        assert!(output.starts_with("# Avery Lee (a-1)"));
        assert!(output.contains("| 2026-01 | 80.0 | - | - | - |"));
        assert!(output.contains("- satisfaction: no-data"));
    }
}
