// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Detect command - print the format of a file.

use std::path::PathBuf;

use clap::Args;

use crate::common::{read_head, Result};
use astrocodec::io::detection::{detect_format, sniff_separators};
use astrocodec::TableFormat;

/// Print the detected format.
#[derive(Args, Clone, Debug)]
pub struct DetectCmd {
    /// Input file
    #[arg(value_name = "FILE")]
    input: PathBuf,
}

impl DetectCmd {
    pub fn run(self) -> Result<()> {
        let format = detect_format(&self.input)?;
        match format {
            TableFormat::Csv => {
                let separator = match sniff_separators(&read_head(&self.input)?) {
                    "\t" => "tab",
                    "," => "comma",
                    "|" => "pipe",
                    ";" => "semicolon",
                    _ => "whitespace",
                };
                println!("{}\t{} (separator: {separator})", self.input.display(), format.as_str());
            }
            TableFormat::Unknown => {
                anyhow::bail!("{}: unrecognised format", self.input.display());
            }
            _ => println!("{}\t{}", self.input.display(), format.as_str()),
        }
        Ok(())
    }
}
