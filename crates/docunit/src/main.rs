//! docunit CLI - document conversion and border-number editing.
//!
//! Provides commands for:
//! - `convert`: Convert a source document and print its stored elements
//! - `reconvert`: Convert a source document again, replacing stored edits
//! - `inspect`: Print the intermediate form of a source document as JSON
//! - `border-numbers add|remove|remove-one|join`: Edit border numbers

mod commands;
mod error;
mod output;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{BorderNumbersCommand, ConvertArgs, InspectArgs, ReconvertArgs};
use error::CliError;
use output::Output;

/// docunit - converts `.docx` documents into editable HTML element sequences.
#[derive(Parser)]
#[command(name = "docunit", version, about)]
struct Cli {
    /// Enable verbose output (info-level logs).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a document and print its stored elements.
    Convert(ConvertArgs),
    /// Convert a document again, discarding stored edits.
    Reconvert(ReconvertArgs),
    /// Print the intermediate form of a document as JSON.
    Inspect(InspectArgs),
    /// Border-number editing commands.
    #[command(subcommand)]
    BorderNumbers(BorderNumbersCommand),
}

impl Commands {
    async fn execute(self, output: &Output) -> Result<(), CliError> {
        match self {
            Self::Convert(args) => args.execute(output).await,
            Self::Reconvert(args) => args.execute(output).await,
            Self::Inspect(args) => args.execute(output),
            Self::BorderNumbers(cmd) => cmd.execute(output).await,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = tokio::runtime::Runtime::new()
        .map_err(CliError::from)
        .and_then(|rt| rt.block_on(cli.command.execute(&output)));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output.error(&format!("Error: {err}"));
            ExitCode::FAILURE
        }
    }
}
