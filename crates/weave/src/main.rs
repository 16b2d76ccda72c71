//! Weave CLI - document inclusion resolver.
//!
//! Provides commands for:
//! - `resolve`: Expand include directives and write the result to stdout
//! - `check`: Resolve documents and fail on unresolved directives

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{CheckArgs, ResolveArgs};
use output::Output;

/// Weave - document inclusion resolver.
#[derive(Parser)]
#[command(name = "weave", version, about)]
struct Cli {
    /// Enable info-level logging (otherwise `RUST_LOG` applies).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve documents and write the expanded markup to stdout.
    Resolve(ResolveArgs),
    /// Resolve documents and report unresolved directives.
    Check(CheckArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Resolve(args) => args.execute(&output),
        Commands::Check(args) => args.execute(&output),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
