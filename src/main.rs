//! jailsync CLI - keep a chroot jail in sync with a declared set of files

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use jailsync::{ops, ChangeReport, Config, Error, State};

#[derive(Parser)]
#[command(name = "jailsync")]
#[command(about = "idempotent chroot jail synchronizer")]
#[command(version)]
struct Cli {
    /// toml file with the run configuration; flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// present or absent
    #[arg(short, long)]
    state: Option<String>,

    /// jail root directory
    #[arg(short, long)]
    jail_directory: Option<PathBuf>,

    /// executable to make available in the jail (repeatable)
    #[arg(long = "command", value_name = "PATH")]
    commands: Vec<String>,

    /// extra file to copy (repeatable)
    #[arg(long = "other-file", value_name = "PATH")]
    other_files: Vec<String>,

    /// extra directory to copy recursively (repeatable)
    #[arg(long = "dir", value_name = "PATH")]
    dirs: Vec<String>,

    /// only show what would change
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// record of managed paths
    #[arg(long, env = "JAILSYNC_MANIFEST")]
    manifest: Option<PathBuf>,

    /// dynamic-dependency inspector program
    #[arg(long, env = "JAILSYNC_INSPECTOR")]
    inspector: Option<String>,

    /// verbose logging on stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if cli.verbose { "debug" } else { "warn" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    match run(cli) {
        Ok(report) => match print_json(&report) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("error: {}", e);
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            eprintln!("error: {}", e);
            if let Error::ActionFailed {
                completed, failed, ..
            } = &e
            {
                let partial = serde_json::json!({
                    "changed": !completed.is_empty(),
                    "messages": completed,
                    "failed": failed,
                });
                println!("{}", partial);
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> jailsync::Result<ChangeReport> {
    let config = build_config(cli)?;
    ops::sync(&config)
}

/// config file first, then command-line overrides
fn build_config(cli: Cli) -> jailsync::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    if let Some(state) = cli.state {
        config.state = state.parse::<State>()?;
    }
    if let Some(jail) = cli.jail_directory {
        config.jail_directory = Some(jail);
    }
    if !cli.commands.is_empty() {
        config.commands = cli.commands;
    }
    if !cli.other_files.is_empty() {
        config.other_files = cli.other_files;
    }
    if !cli.dirs.is_empty() {
        config.dirs = cli.dirs;
    }
    if cli.dry_run {
        config.dry_run = true;
    }
    if let Some(manifest) = cli.manifest {
        config.manifest_path = manifest;
    }
    if let Some(inspector) = cli.inspector {
        config.inspector = inspector;
    }

    Ok(config)
}

fn print_json(report: &ChangeReport) -> jailsync::Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}
