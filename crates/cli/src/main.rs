//! `pacesync`: keep a One Pace library and its canonical sidecar
//! repository in step.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dialoguer::console::Term;
use pacesync_cli::detect::DetectOptions;
use pacesync_cli::import::ImportOptions;
use pacesync_cli::sync::SyncOptions;
use pacesync_cli::update::UpdateOptions;
use pacesync_cli::{AppConfig, RunContext, RunFlags, Summary, detect, import, logging, sync, update};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "pacesync.toml", global = true)]
    config: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log intended changes without touching any file
    #[arg(long, global = true)]
    dry_run: bool,

    /// Skip yes/no confirmations (overwrites are still confirmed)
    #[arg(long, global = true)]
    force: bool,

    /// Never prompt; missing answers become per-file errors
    #[arg(long, global = true)]
    non_interactive: bool,

    /// Library root, overriding the config file
    #[arg(short, long, global = true)]
    library: Option<PathBuf>,

    /// Canonical repository root, overriding the config file
    #[arg(long, global = true)]
    repository: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve new videos, file them into the library and write sidecars
    Import {
        /// Folder with the videos to import
        #[arg(short, long, default_value = ".")]
        directory: PathBuf,

        /// Scan subfolders too
        #[arg(short, long)]
        recursive: bool,

        /// Keep source videos after importing them
        #[arg(long)]
        no_delete_processed: bool,
    },
    /// Rebuild every canonical sidecar in the repository
    UpdateRepo {
        /// Only this part of the repository
        #[arg(short, long)]
        directory: Option<PathBuf>,

        /// Only the top folder, not season subfolders
        #[arg(long)]
        no_recursive: bool,
    },
    /// Copy show sidecars into the library and rename legacy videos
    Sync {
        /// Place sidecars next to videos instead of renaming them
        #[arg(long)]
        keep_original: bool,
    },
    /// Report obsolete originals and files without metadata
    Detect {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            error!(error = %format!("{e:#}"), "pacesync failed");
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    let mut config = AppConfig::from_file(&cli.config)
        .with_context(|| format!("failed to load config from {}", cli.config.display()))?;
    if let Some(library) = &cli.library {
        config.library_path = Some(library.clone());
    }
    if let Some(repository) = &cli.repository {
        config.repository_path = repository.clone();
    }

    let level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        config.logging.level.as_str()
    };
    logging::init(level, config.logging.json)?;
    info!(config_file = %cli.config.display(), "pacesync starting");

    let flags = RunFlags {
        dry_run: cli.dry_run,
        force: cli.force,
        interactive: !cli.non_interactive && Term::stderr().is_term(),
    };
    let mut ctx = RunContext::from_config(config, flags)?;

    let summary = match cli.command {
        Command::Import {
            directory,
            recursive,
            no_delete_processed,
        } => import::run(
            &mut ctx,
            &ImportOptions {
                directory,
                recursive,
                delete_processed: !no_delete_processed,
            },
        )?,
        Command::UpdateRepo {
            directory,
            no_recursive,
        } => update::run(
            &mut ctx,
            &UpdateOptions {
                directory,
                recursive: !no_recursive,
            },
        )?,
        Command::Sync { keep_original } => sync::run(&mut ctx, &SyncOptions { keep_original })?,
        Command::Detect { json } => {
            let (report, rendered) = detect::run(&ctx, &DetectOptions { json })?;
            print!("{rendered}");
            return Ok(if report.has_issues() {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            });
        }
    };
    Ok(finish(&summary))
}

fn finish(summary: &Summary) -> ExitCode {
    eprint!("{summary}");
    if summary.failed > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
