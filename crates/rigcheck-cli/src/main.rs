//! rigcheck CLI - Validate and repair rig state against saved validators

mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{capture, repair, show, validate};
use config::RigcheckConfig;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rigcheck")]
#[command(about = "Capture, validate and repair rig state", long_about = None)]
#[command(version)]
struct Cli {
    /// Log at debug level unless RIGCHECK_LOG or the config sets a filter
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Extra config file, applied over the global and project configs
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a scene snapshot against a validator document
    Validate {
        /// Path to validator document
        document: String,

        /// Path to scene snapshot
        #[arg(long)]
        scene: String,

        /// Only validate this validator
        #[arg(long)]
        validator: Option<String>,

        /// Output format (text or json)
        #[arg(long, default_value = "text", value_parser = ["text", "json"])]
        format: String,

        /// Save the resulting statuses back to the document
        #[arg(long)]
        write: bool,
    },

    /// Repair a scene snapshot so it matches its validators
    Repair {
        /// Path to validator document
        document: String,

        /// Path to scene snapshot
        #[arg(long)]
        scene: String,

        /// Only repair against this validator
        #[arg(long)]
        validator: Option<String>,

        /// Preview repairs without applying
        #[arg(long)]
        dry_run: bool,

        /// Save the repaired scene back to its snapshot
        #[arg(long)]
        write_scene: bool,
    },

    /// Show the validators in a document
    Show {
        /// Path to validator document
        document: String,

        /// Only show this validator
        #[arg(long)]
        validator: Option<String>,
    },

    /// Capture an object's current state into a validator
    Capture {
        /// Path to validator document (created if missing)
        document: String,

        /// Path to scene snapshot
        #[arg(long)]
        scene: String,

        /// Long name of the source object
        #[arg(long)]
        source: String,

        /// Attribute to capture as a default value (repeatable)
        #[arg(long = "attr")]
        attrs: Vec<String>,

        /// Connection to capture as SRC_ATTR=DEST_PLUG (repeatable)
        #[arg(long)]
        connect: Vec<String>,

        /// Validator name (defaults to the scene name)
        #[arg(long)]
        validator: Option<String>,

        /// Replace an existing source node with the same long name
        #[arg(long)]
        force: bool,
    },
}

fn init_tracing(filter: Option<&str>, verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = filter
        .and_then(|f| EnvFilter::try_new(f).ok())
        .unwrap_or_else(|| EnvFilter::new(fallback));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = RigcheckConfig::load(cli.config.as_deref())?;
    init_tracing(config.log_filter.as_deref(), cli.verbose);
    let options = config.reconcile_options();

    match cli.command {
        Commands::Validate {
            document,
            scene,
            validator,
            format,
            write,
        } => validate::run(
            validate::ValidateArgs {
                document,
                scene,
                validator,
                format,
                write,
            },
            options,
        ),
        Commands::Repair {
            document,
            scene,
            validator,
            dry_run,
            write_scene,
        } => repair::run(
            repair::RepairArgs {
                document,
                scene,
                validator,
                dry_run,
                write_scene,
            },
            options,
        ),
        Commands::Show {
            document,
            validator,
        } => show::run(show::ShowArgs {
            document,
            validator,
        }),
        Commands::Capture {
            document,
            scene,
            source,
            attrs,
            connect,
            validator,
            force,
        } => capture::run(capture::CaptureArgs {
            document,
            scene,
            source,
            attrs,
            connect,
            validator,
            force,
        }),
    }
}
