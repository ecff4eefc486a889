mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::commands::CliError;

#[derive(Parser, Debug)]
#[command(name = "zoneplan", about = "Inspect and re-fit zone plan snapshots")]
struct Cli {
    /// Editor policy file (JSON).
    #[arg(long, global = true, env = "ZONEPLAN_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print counts and integrity issues; fails if any issue exists.
    Check {
        file: PathBuf,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Re-fit every zone around its blocks and write the snapshot.
    Fit {
        file: PathBuf,
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(%err, "zoneplan failed");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = commands::load_config(cli.config.as_deref())?;
    match cli.command {
        Command::Check { file, json } => {
            let snapshot = commands::read_snapshot(&file)?;
            let report = commands::check(&snapshot);
            let text = if json { serde_json::to_string_pretty(&report)? } else { report.render() };
            commands::write_output(None, &text)?;
            if report.is_clean() {
                Ok(())
            } else {
                Err(CliError::Integrity { count: report.issues.len() })
            }
        }
        Command::Fit { file, output } => {
            let snapshot = commands::read_snapshot(&file)?;
            let (fitted, _) = commands::fit(snapshot, config);
            commands::write_output(output.as_deref(), &fitted.to_json_pretty()?)
        }
    }
}
