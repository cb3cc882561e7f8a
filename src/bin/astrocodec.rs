// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! # Astrocodec CLI
//!
//! Command-line tool for astronomical tables.
//!
//! ## Usage
//!
//! ```sh
//! # Show tables, columns, roles and diagnostics
//! astrocodec inspect catalog.vot
//!
//! # Write ICRS positions and TCB times with the raw cells
//! astrocodec convert sources.fits -o sources.jsonl --format jsonl
//!
//! # Print the detected format
//! astrocodec detect table.tsv
//! ```

mod cmd;
mod common;

use std::path::PathBuf;
use std::process;

use clap::{ArgAction, Parser, Subcommand};
use cmd::{ConvertCmd, DetectCmd, InspectCmd};
use common::{setup_logging, Result};

/// Astrocodec - astronomical table reader
///
/// Reads VOTable, Astrores, CSV/TSV and FITS tables and reports positions
/// in ICRS and times in TCB.
#[derive(Parser, Clone)]
#[command(name = "astrocodec")]
#[command(about = "Astronomical table reader for VOTable, CSV and FITS", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "ArcheBase")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Parser configuration file (TOML)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// CSV field separators, e.g. ',' or '\t'
    #[arg(long, global = true, value_name = "CHARS")]
    separator: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Clone)]
enum Commands {
    /// Show tables, fields, roles, record counts and diagnostics
    Inspect(InspectCmd),

    /// Write canonical positions and times with the raw cells
    Convert(ConvertCmd),

    /// Print the detected input format
    Detect(DetectCmd),
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let options = common::ConfigOptions {
        config: cli.config,
        separator: cli.separator,
    };
    match cli.command {
        Commands::Inspect(cmd) => cmd.run(&options),
        Commands::Convert(cmd) => cmd.run(&options),
        Commands::Detect(cmd) => cmd.run(),
    }
}

fn main() {
    let result = run();

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
