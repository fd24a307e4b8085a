use anyhow::Context;
use clap::{Parser, Subcommand};
use hostconf::entity::set::HostSummary;
use hostconf::{Policy, RecordSet, RetentionData, ValidationReport};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

pub type Result<T> = anyhow::Result<T>;

#[derive(Parser)]
#[command(name = "hostconf")]
#[command(about = "Validate monitored host configuration", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one validation pass and print its diagnostics.
    Check {
        /// JSON document of raw entity records.
        #[arg(long)]
        records: PathBuf,

        /// JSON policy document. Defaults apply when omitted.
        #[arg(long)]
        policy: Option<PathBuf>,

        /// JSON map of host name to retained state.
        #[arg(long)]
        retention: Option<PathBuf>,

        /// Write the full report as JSON.
        #[arg(long)]
        report: Option<PathBuf>,

        /// Exit with an error when the configuration is not correct.
        #[arg(long)]
        strict: bool,
    },
}

#[derive(Serialize)]
struct ReportFile<'a> {
    #[serde(flatten)]
    report: &'a ValidationReport,
    hosts: Vec<HostSummary>,
    restored: Vec<String>,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hostconf=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_retention(path: &Path) -> Result<BTreeMap<String, RetentionData>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read retention file: {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("failed to parse retention file: {}", path.display()))
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.cmd {
        Commands::Check {
            records,
            policy,
            retention,
            report,
            strict,
        } => {
            let records = RecordSet::load(&records)?;
            let policy = match policy {
                Some(path) => Policy::load(&path)?,
                None => Policy::default(),
            };

            let mut validated = hostconf::validate(&records, &policy)?;

            let restored = match retention {
                Some(path) => {
                    let store = load_retention(&path)?;
                    validated.entities.restore_retention(&store)
                }
                None => Vec::new(),
            };

            for diagnostic in validated.report.diagnostics() {
                println!("{}", diagnostic);
            }
            let correct = validated.conf_is_correct();
            if correct {
                println!("configuration is correct");
            } else {
                println!("configuration is NOT correct");
            }

            if let Some(out) = report {
                let file = ReportFile {
                    report: &validated.report,
                    hosts: validated.entities.host_summaries(),
                    restored,
                };
                let json = serde_json::to_string_pretty(&file)?;
                std::fs::write(&out, json)
                    .with_context(|| format!("failed to write report: {}", out.display()))?;
            }

            if strict && !correct {
                anyhow::bail!("configuration is NOT correct");
            }
        }
    }

    Ok(())
}
