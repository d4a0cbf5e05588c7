// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

// CLI entrypoint for the regForge reference host.

use std::fs;
use std::process::ExitCode;

use clap::Parser;
use serde_json::json;

use regforge::cli::{Cli, OutputFormat};
use regforge::codec;
use regforge::core::message::Message;
use regforge::core::program::{Program, RunOutcome};

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(code) => code,
        Err(message) => {
            eprintln!("regforge: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<ExitCode, String> {
    let text = fs::read_to_string(&cli.input)
        .map_err(|err| format!("{}: {err}", cli.input.display()))?;
    let mut program = if cli.load {
        codec::decode_program_str(&text).map_err(|err| err.to_string())?
    } else {
        Program::compile(&text, program_name(cli))
    };

    if let Some(path) = &cli.save {
        let document = codec::encode_program_string(&program);
        fs::write(path, document + "\n").map_err(|err| format!("{}: {err}", path.display()))?;
    }

    if cli.dump {
        println!("{program}");
        return Ok(ExitCode::SUCCESS);
    }

    let mut exhausted = false;
    for _ in 0..cli.ticks {
        match cli.max_steps {
            Some(limit) => {
                if program.run_bounded(limit) == RunOutcome::OutOfSteps {
                    exhausted = true;
                }
            }
            None => program.run(),
        }
        if program.error().is_some() {
            break;
        }
    }

    Ok(report(cli, &program, exhausted))
}

fn program_name(cli: &Cli) -> String {
    if let Some(name) = &cli.name {
        return name.clone();
    }
    cli.input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "program".to_string())
}

fn report(cli: &Cli, program: &Program, exhausted: bool) -> ExitCode {
    match cli.format {
        OutputFormat::Text => {
            println!("program: {}", program.name());
            let rendered: Vec<String> = program
                .registers()
                .iter()
                .map(|value| value.to_string())
                .collect();
            println!("registers: [{}]", rendered.join(", "));
            if let Some(log) = program.log_message() {
                println!("log: {log}");
            }
            if exhausted {
                println!("note: step budget exhausted before the program completed");
            }
            if let Some(error) = program.error() {
                println!("error: {error}");
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
        OutputFormat::Json => {
            let value = json!({
                "name": program.name(),
                "registers": program.registers().to_vec(),
                "log": program.log_message().map(Message::to_value),
                "error": program.error().map(Message::to_value),
                "exhausted": exhausted,
            });
            println!("{value}");
            if program.error().is_some() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
    }
}
