//! cap-worker entry point.
//!
//! Thin: parses the command line, loads `.env` files, and dispatches to the
//! handlers in `commands/`. A fatal loop error propagates out of `main`, so
//! the process exits non-zero and the supervisor restarts it.

mod commands;
mod telemetry;
mod wiring;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "cap-worker")]
#[command(about = "Capacity telemetry reconciliation worker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the ingestion loop
    Run {
        /// Layered config paths in merge order
        #[arg(long = "config", required = true)]
        config_paths: Vec<String>,

        /// Process a single batch and exit
        #[arg(long, default_value_t = false)]
        once: bool,

        /// Fail on config keys the worker does not read
        #[arg(long = "strict-config", default_value_t = false)]
        strict_config: bool,
    },

    /// Inspect or move the persisted stream offset
    Offset {
        #[command(subcommand)]
        cmd: OffsetCmd,
    },

    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order
        #[arg(long = "config", required = true)]
        config_paths: Vec<String>,
    },
}

#[derive(Subcommand)]
enum OffsetCmd {
    /// Print the persisted offset and the position the next batch reads from
    Show {
        /// Layered config paths (defaults apply when omitted)
        #[arg(long = "config")]
        config_paths: Vec<String>,
    },

    /// Mark a position as the last processed record
    Set {
        offset: i64,

        /// Layered config paths (defaults apply when omitted)
        #[arg(long = "config")]
        config_paths: Vec<String>,

        /// Acknowledge a rewind (records after the new offset are reprocessed)
        #[arg(long, default_value_t = false)]
        yes: bool,
    },

    /// Forget all progress so the next batch reads from record 0
    Reset {
        /// Layered config paths (defaults apply when omitted)
        #[arg(long = "config")]
        config_paths: Vec<String>,

        /// Acknowledge that every record is reprocessed
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Dev convenience; production injects env vars directly. Neither file
    // overrides variables already set.
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Run {
            config_paths,
            once,
            strict_config,
        } => commands::run::run(&config_paths, once, strict_config).await,
        Commands::Offset { cmd } => match cmd {
            OffsetCmd::Show { config_paths } => commands::offset::show(&config_paths),
            OffsetCmd::Set {
                offset,
                config_paths,
                yes,
            } => commands::offset::set(offset, &config_paths, yes),
            OffsetCmd::Reset { config_paths, yes } => commands::offset::reset(&config_paths, yes),
        },
        Commands::ConfigHash { config_paths } => commands::config_hash(&config_paths),
    }
}
