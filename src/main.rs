use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};

mod aggregate;
mod analysis;
mod assess;
mod config;
mod correlation;
mod models;
mod normalize;
mod report;
mod risk;
mod shrinkage;
mod source;
mod telemetry;
mod trend;
mod weights;

use analysis::AnalysisRequest;
use config::EngineConfig;
use models::{AgentPeriodRecord, Period};

#[derive(Parser)]
#[command(name = "agent-risk")]
#[command(about = "Composite risk scoring and cross-domain analytics for contact-center agents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score every agent for a period
    Score {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, value_parser = parse_period)]
        period: Period,
        #[arg(long)]
        center: Option<String>,
        #[arg(long, default_value_t = 10)]
        limit: usize,
        #[arg(long)]
        json: bool,
    },
    /// Generate a markdown report for a period
    Report {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, value_parser = parse_period)]
        period: Period,
        #[arg(long)]
        center: Option<String>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Show domain correlations and single-domain weaknesses
    Cross {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, value_parser = parse_period)]
        period: Period,
        #[arg(long)]
        center: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Show one agent's monthly trend and strengths
    Profile {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        agent: String,
        #[arg(long, value_parser = parse_period)]
        period: Option<Period>,
        #[arg(long, default_value_t = 6)]
        months: usize,
        #[arg(long)]
        json: bool,
    },
    /// Write a sample metrics file
    Sample {
        #[arg(long, default_value = "sample.csv")]
        out: PathBuf,
    },
}

fn parse_period(value: &str) -> Result<Period, String> {
    Period::parse(value).ok_or_else(|| format!("'{value}' is not a YYYY-MM period"))
}

fn load(input: &Path) -> anyhow::Result<Vec<AgentPeriodRecord>> {
    source::load_csv(input).with_context(|| format!("failed to load {}", input.display()))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    telemetry::init().context("failed to initialise logging")?;
    let config = EngineConfig::from_env().context("invalid engine configuration")?;

    match cli.command {
        Commands::Score {
            input,
            period,
            center,
            limit,
            json,
        } => {
            let records = load(&input)?;
            let report = analysis::analyze(&AnalysisRequest { period, center }, &records, &config);

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
                return Ok(());
            }
            if report.agents.is_empty() {
                println!("No agents found for {period}.");
                return Ok(());
            }

            println!("Top agents by risk score ({period}):");
            for agent in report.agents.iter().take(limit) {
                println!(
                    "- {} ({}, {}, {}) score {:.1} [{}] across {} domains",
                    agent.record.display_name(),
                    agent.record.agent_id,
                    agent.record.center,
                    agent.record.channel,
                    agent.composite_risk_score,
                    agent.risk_level.as_str(),
                    agent.breakdown.contributions.len()
                );
            }
        }
        Commands::Report {
            input,
            period,
            center,
            out,
        } => {
            let records = load(&input)?;
            let report = analysis::analyze(&AnalysisRequest { period, center }, &records, &config);
            std::fs::write(&out, report::build_report(&report, 10))
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Cross {
            input,
            period,
            center,
            json,
        } => {
            let records = load(&input)?;
            let report = analysis::analyze(&AnalysisRequest { period, center }, &records, &config);

            if json {
                let payload = serde_json::json!({
                    "run_id": report.run_id,
                    "period": report.period,
                    "correlations": report.correlations,
                    "weak_in_only_one": report.single_domain_weaknesses,
                    "risk_distribution": report.stats.risk_distribution,
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
                return Ok(());
            }

            println!("Domain correlations ({period}):");
            for correlation in &report.correlations {
                let note = if correlation.reliable { "" } else { " (insufficient sample)" };
                println!(
                    "- {} vs {}: r = {:.2}, n = {}{}",
                    correlation.domain_a,
                    correlation.domain_b,
                    correlation.pearson_r,
                    correlation.sample_size,
                    note
                );
            }
            println!("Weak in a single domain:");
            if report.single_domain_weaknesses.is_empty() {
                println!("- none");
            }
            for weakness in &report.single_domain_weaknesses {
                println!(
                    "- {} ({}): {}",
                    weakness.agent_id,
                    weakness.weak_domain.label(),
                    weakness.note
                );
            }
        }
        Commands::Profile {
            input,
            agent,
            period,
            months,
            json,
        } => {
            let records = load(&input)?;
            let profile = match trend::agent_profile(&records, &agent, period, months, &config) {
                Ok(profile) => profile,
                Err(err) => {
                    println!("{err}.");
                    return Ok(());
                }
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&profile)?);
            } else {
                print!("{}", report::build_profile(&profile));
            }
        }
        Commands::Sample { out } => {
            let file = std::fs::File::create(&out)
                .with_context(|| format!("failed to create {}", out.display()))?;
            let rows = source::write_sample(file)?;
            println!("Wrote {rows} sample rows to {}.", out.display());
        }
    }

    Ok(())
}
