//! The Samsara command-line interface.
//!
//! This module is the entry point for all CLI commands and orchestrates the
//! core library functions. Errors print as full miette reports and exit
//! non-zero.

use std::fs;
use std::path::Path;
use std::process::ExitCode;

use clap::Parser;

use crate::cli::args::{Command, SamsaraArgs};
use crate::diagnostics::{print_error, SourceContext};
use crate::engine::Engine;
use crate::syntax;

pub mod args;
pub mod output;

/// The main entry point for the CLI.
pub fn run() -> ExitCode {
    let args = SamsaraArgs::parse();

    let result = match args.command {
        Command::Run { file, max_depth } => handle_run(&file, max_depth),
        Command::Expand { file, json } => handle_expand(&file, json),
        Command::Ast { file } => handle_ast(&file),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(CliError::Io(message)) => {
            eprintln!("Error: {}", message);
            ExitCode::FAILURE
        }
        Err(CliError::Engine(error)) => {
            print_error(error);
            ExitCode::FAILURE
        }
    }
}

enum CliError {
    Io(String),
    Engine(crate::diagnostics::EngineError),
}

impl From<crate::diagnostics::EngineError> for CliError {
    fn from(error: crate::diagnostics::EngineError) -> Self {
        CliError::Engine(error)
    }
}

fn read_script(path: &Path) -> Result<(String, String), CliError> {
    let name = path.display().to_string();
    let text = fs::read_to_string(path)
        .map_err(|e| CliError::Io(format!("cannot read {}: {}", name, e)))?;
    Ok((name, text))
}

fn handle_run(path: &Path, max_depth: Option<usize>) -> Result<(), CliError> {
    let (name, text) = read_script(path)?;
    let mut engine = Engine::new();
    if let Some(depth) = max_depth {
        engine.set_max_depth(depth);
    }
    let value = engine.eval_source(&name, &text)?;
    output::print_result(&value);
    Ok(())
}

fn handle_expand(path: &Path, json: bool) -> Result<(), CliError> {
    let (name, text) = read_script(path)?;
    let engine = Engine::new();
    let forms = engine.expand_source(&name, &text)?;
    if json {
        let rendered = serde_json::to_string_pretty(&forms)
            .map_err(|e| CliError::Io(format!("cannot serialize AST: {}", e)))?;
        output::print_plain(&rendered);
    } else {
        for form in &forms {
            output::print_plain(&form.value.pretty());
        }
    }
    Ok(())
}

fn handle_ast(path: &Path) -> Result<(), CliError> {
    let (name, text) = read_script(path)?;
    let source = SourceContext::from_source(&name, &text);
    let forms = syntax::parse(&text, &source)?;
    let rendered = serde_json::to_string_pretty(&forms)
        .map_err(|e| CliError::Io(format!("cannot serialize AST: {}", e)))?;
    output::print_plain(&rendered);
    Ok(())
}
