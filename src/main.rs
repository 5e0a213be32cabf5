//! gview: command-driven FITS image viewer

use anyhow::Result;
use clap::Parser;
use gview::cli::{self, Cli};

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli::run(cli)
}
