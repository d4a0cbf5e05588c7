// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Command-line interface for the reference host.

use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser, Debug)]
#[command(
    name = "regforge",
    version = VERSION,
    about = "Register-machine program runner: compiles, executes, and persists line programs"
)]
pub struct Cli {
    /// Program source file, or a definition document with --load.
    pub input: PathBuf,
    #[arg(
        long = "name",
        long_help = "Program name used in listings and saved definitions. Defaults to the \
                     input file stem; ignored with --load (the document carries the name)."
    )]
    pub name: Option<String>,
    #[arg(
        long = "ticks",
        default_value_t = 1,
        long_help = "How many times to invoke run. A completed pass resets the program \
                     counter, so each tick restarts from the first instruction."
    )]
    pub ticks: u32,
    #[arg(
        long = "max-steps",
        value_name = "N",
        long_help = "Bound each tick to N executed instructions. Without this, a program \
                     with a backward jump never returns."
    )]
    pub max_steps: Option<usize>,
    #[arg(long = "format", value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
    #[arg(
        long = "dump",
        action = ArgAction::SetTrue,
        long_help = "Print the compiled listing and exit without running."
    )]
    pub dump: bool,
    #[arg(
        long = "load",
        action = ArgAction::SetTrue,
        long_help = "Treat the input as a persisted definition document instead of source."
    )]
    pub load: bool,
    #[arg(
        long = "save",
        value_name = "FILE",
        long_help = "Write the program's definition document to FILE before running."
    )]
    pub save: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
