use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use salesreport::{open_report, InputFormat, ReportingPeriod, SalesReporter, Settings};
use salesreport_import::infer_period;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

const CONFIG_FILE: &str = "salesreport.toml";

#[derive(Parser)]
#[command(name = "salesreport")]
#[command(about = "Monthly sales report generator with simulated distribution", version)]
struct Cli {
    /// Settings file (TOML). Defaults to salesreport.toml in the data directory
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Root for reports, outbox and the distribution log
    #[arg(long, global = true, env = "SALESREPORT_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the PDF report for one month of sales
    Generate {
        /// CSV, TSV or JSON sales file
        file: PathBuf,

        /// Input format; guessed from the extension when omitted
        #[arg(long)]
        format: Option<InputFormat>,

        /// Reporting month as YYYY-MM; guessed from the file name when omitted
        #[arg(long)]
        period: Option<ReportingPeriod>,

        /// Also send the report once it is written
        #[arg(long)]
        send: bool,
    },

    /// Send an existing report
    Send {
        report: PathBuf,

        #[arg(long)]
        period: Option<ReportingPeriod>,
    },

    /// List every report sent so far
    Sent,

    /// List sample input files
    Samples {
        /// Directory to list instead of the configured samples directory
        dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_deref(), cli.data_dir.as_deref())?;
    let reporter = SalesReporter::open(settings)
        .await
        .context("Failed to open distribution log")?;

    match cli.command {
        Commands::Generate {
            file,
            format,
            period,
            send,
        } => {
            let format = match format.or_else(|| InputFormat::from_path(&file)) {
                Some(f) => f,
                None => bail!("Cannot tell the format of {}; pass --format", file.display()),
            };
            let Some(period) = period.or_else(|| infer_period(&file)) else {
                bail!("Cannot tell which month {} covers; pass --period YYYY-MM", file.display());
            };

            if send {
                let (output, record) = reporter.generate_and_send(&file, format, period).await?;
                emit(cli.json, &(&output, &record), || {
                    format!(
                        "Report written to {}\nSent to {} (log entry {})",
                        output.report.path.display(),
                        record.destination,
                        record.id
                    )
                })?;
            } else {
                let output = reporter.generate(&file, format, period)?;
                emit(cli.json, &output, || {
                    format!(
                        "Report written to {}\nTotal revenue {} across {} rows",
                        output.report.path.display(),
                        output.summary.total_revenue.grouped(),
                        output.summary.record_count
                    )
                })?;
            }
        }
        Commands::Send { report, period } => {
            let report = open_report(&report, period)?;
            let record = reporter.record_send(&report).await?;
            emit(cli.json, &record, || {
                format!(
                    "Sent {} to {} (log entry {})",
                    report.file_name(),
                    record.destination,
                    record.id
                )
            })?;
        }
        Commands::Sent => {
            let sent = reporter.list_sent().await?;
            emit(cli.json, &sent, || {
                if sent.is_empty() {
                    return "No reports sent yet".to_string();
                }
                sent.iter()
                    .map(|r| {
                        format!(
                            "{:>4}  {}  {}  {}  {}",
                            r.id,
                            r.sent_at.format("%Y-%m-%d %H:%M:%S"),
                            r.source_month,
                            r.destination,
                            r.stored_path.display()
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })?;
        }
        Commands::Samples { dir } => {
            let files = reporter
                .list_samples(dir.as_deref())
                .context("Failed to list sample files")?;
            emit(cli.json, &files, || {
                files
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join("\n")
            })?;
        }
    }

    Ok(())
}

/// `--config`, else `<data_dir>/salesreport.toml` when present, else defaults.
fn load_settings(config: Option<&Path>, data_dir: Option<&Path>) -> anyhow::Result<Settings> {
    let data_dir = match data_dir {
        Some(dir) => dir.to_path_buf(),
        None => directories::ProjectDirs::from("com", "salesreport", "SalesReport")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .context("Failed to get app directory; pass --data-dir")?,
    };
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;

    let default_config = data_dir.join(CONFIG_FILE);
    let settings = match config {
        Some(path) => Settings::load(path, &data_dir)?,
        None if default_config.is_file() => Settings::load(&default_config, &data_dir)?,
        None => Settings::for_data_dir(&data_dir),
    };
    tracing::debug!(data_dir = %data_dir.display(), "settings loaded");
    Ok(settings)
}

fn emit<T: Serialize>(json: bool, value: &T, text: impl FnOnce() -> String) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", text());
    }
    Ok(())
}
