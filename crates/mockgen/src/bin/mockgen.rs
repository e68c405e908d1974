use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use mockgen::config::load_config;
use mockgen::logging::{self, LogFormat};
use mockgen::{MockupService, StatusReader};

#[derive(Parser, Debug)]
#[command(name = "mockgen", version, about = "Generate mockup templates for product variants")]
struct Cli {
    /// Configuration file (JSON).
    #[arg(long, short, default_value = "mockgen.json")]
    config: PathBuf,

    /// Log output format: text or json.
    #[arg(long, default_value = "text")]
    log_format: LogFormat,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render mockups for every variant that lacks one.
    Run,
    /// Show the status of a run (the latest when no id is given).
    Status {
        #[arg(long)]
        job_id: Option<String>,
    },
    /// Count variants still waiting for a mockup.
    Pending,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.log_format);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> mockgen::Result<ExitCode> {
    let config = load_config(&cli.config)?;

    match cli.cmd {
        Command::Run => cmd_run(&MockupService::from_config(&config)?).await,
        Command::Status { job_id } => {
            cmd_status(&StatusReader::from_config(&config)?, job_id.as_deref())
        }
        Command::Pending => {
            println!("{}", StatusReader::from_config(&config)?.count_pending()?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn cmd_run(service: &MockupService) -> mockgen::Result<ExitCode> {
    let run = service.run_now();
    tokio::pin!(run);

    let summary = tokio::select! {
        summary = &mut run => summary?,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, finishing the current group before stopping");
            service.cancel();
            run.await?
        }
    };

    for skip in &summary.skipped {
        warn!("Skipped variant {}: {}", skip.variant_id, skip.reason);
    }
    info!(
        job_id = %summary.job_id,
        status = %summary.status,
        processed = summary.processed_count,
        failed = summary.failed_count,
        "Run finished"
    );
    println!("{}", summary.job_id);

    if summary.status == mockgen::JobStatus::Failed {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn cmd_status(reader: &StatusReader, job_id: Option<&str>) -> mockgen::Result<ExitCode> {
    match reader.get_status(job_id)? {
        Some(view) => {
            println!("{}", serde_json::to_string_pretty(&view)?);
            Ok(ExitCode::SUCCESS)
        }
        None => {
            eprintln!("No mockup generation job found");
            Ok(ExitCode::FAILURE)
        }
    }
}
