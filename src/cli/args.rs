//! Defines the command-line arguments and subcommands for the Samsara CLI.
//!
//! This module uses the `clap` crate with its "derive" feature to create a
//! declarative and type-safe argument parsing structure.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "samsara",
    version,
    about = "A continuation-passing evaluation engine with proper tail calls."
)]
pub struct SamsaraArgs {
    #[command(subcommand)]
    pub command: Command,
}

/// An enumeration of all available CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Full pipeline: parse, CPS-transform, evaluate, and print the result.
    Run {
        /// The path to the Samsara script file to run.
        #[arg(required = true)]
        file: PathBuf,
        /// Bound on direct (non-trampolined) call nesting.
        #[arg(long)]
        max_depth: Option<usize>,
    },
    /// Print the CPS-transformed code without evaluating it.
    Expand {
        /// The path to the Samsara script file to expand.
        #[arg(required = true)]
        file: PathBuf,
        /// Emit the transformed AST as JSON instead of surface syntax.
        #[arg(long)]
        json: bool,
    },
    /// Show the parsed Abstract Syntax Tree (AST) for a script, as JSON.
    Ast {
        /// The path to the Samsara script file to parse.
        #[arg(required = true)]
        file: PathBuf,
    },
}
