//! Command line parsing, logging setup and startup.

use crate::config::{
    AppConfig, generate_example_config, generate_json_schema, load_config_file, load_or_default,
};
use crate::session::Session;
use crate::tui::{App, run_tui};
use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "gview")]
#[command(version)]
#[command(about = "Command-driven FITS image viewer", long_about = None)]
#[command(after_help = "EXAMPLES:
    # Open two images, each in its own viewer
    gview m31.fits m51.fits

    # Debug logging to a file
    gview --loglevel 10 --log /tmp/gview.log

Inside gview type `help` for the list of commands.")]
pub struct Cli {
    /// Logging level (0 trace, 10 debug, 20 info, 30 warn, 40 error)
    #[arg(long, value_name = "LEVEL", default_value_t = 20)]
    pub loglevel: u32,

    /// Copy log output to standard error
    #[arg(long)]
    pub stderr: bool,

    /// Write log output to FILE
    #[arg(long, value_name = "FILE")]
    pub log: Option<PathBuf>,

    /// Discard all log output
    #[arg(long)]
    pub lognull: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Print the JSON schema of the configuration file and exit
    #[arg(long)]
    pub config_schema: bool,

    /// Print an example configuration file and exit
    #[arg(long)]
    pub print_config: bool,

    /// FITS files to open, one viewer each
    #[arg(value_name = "FILES")]
    pub files: Vec<PathBuf>,
}

/// Map a numeric log level onto a tracing level.
pub const fn level_filter(loglevel: u32) -> LevelFilter {
    match loglevel {
        0 => LevelFilter::TRACE,
        1..=10 => LevelFilter::DEBUG,
        11..=20 => LevelFilter::INFO,
        21..=30 => LevelFilter::WARN,
        _ => LevelFilter::ERROR,
    }
}

/// Install the global subscriber. `RUST_LOG` overrides `--loglevel`.
///
/// With neither `--log` nor `--stderr` nothing is written: the terminal
/// belongs to the UI.
pub fn init_logging(cli: &Cli) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_filter(cli.loglevel).to_string()));

    let file_layer = match (&cli.log, cli.lognull) {
        (Some(path), false) => {
            let file = File::create(path)
                .with_context(|| format!("cannot open log file {}", path.display()))?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        _ => None,
    };
    let stderr_layer = (cli.stderr && !cli.lognull).then(|| fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .context("failed to install log subscriber")?;
    Ok(())
}

/// Load the configuration named on the command line, or discover one.
pub fn load_config(cli: &Cli) -> Result<AppConfig> {
    match &cli.config {
        Some(path) => load_config_file(path)
            .with_context(|| format!("invalid configuration file {}", path.display())),
        None => {
            let (config, path) = load_or_default(None);
            if let Some(path) = path {
                tracing::info!("loaded configuration from {}", path.display());
            }
            Ok(config)
        }
    }
}

/// Run gview with parsed arguments.
pub fn run(cli: Cli) -> Result<()> {
    if cli.config_schema {
        println!("{}", generate_json_schema());
        return Ok(());
    }
    if cli.print_config {
        print!("{}", generate_example_config());
        return Ok(());
    }

    init_logging(&cli)?;
    let config = load_config(&cli)?;
    let tui_config = config.tui.clone();
    tracing::info!(files = cli.files.len(), "starting gview");

    let mut session = Session::new(config);
    for path in &cli.files {
        if let Err(e) = session.open_file(path) {
            tracing::error!("failed to load {}: {e}", path.display());
            session.log(&format!("!! Error loading '{}': {e}", path.display()));
        }
    }

    let mut app = App::new(session);
    run_tui(&mut app, &tui_config).context("terminal UI failed")?;
    tracing::info!("exiting");
    Ok(())
}
