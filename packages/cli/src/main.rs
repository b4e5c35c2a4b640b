mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{citations, init, render, CitationsArgs, InitArgs, RenderArgs};
use tracing_subscriber::EnvFilter;

/// Folio CLI - static rendering and citation checks for Folio documents
#[derive(Parser, Debug)]
#[command(name = "folio")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log engine diagnostics (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a folio.config.json and an example document
    Init(InitArgs),

    /// Render markdown documents to HTML, text or JSON
    Render(RenderArgs),

    /// List the [[…]] citations in markdown documents
    Citations(CitationsArgs),
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = std::env::current_dir()
        .map(|cwd| cwd.display().to_string())
        .map_err(anyhow::Error::from)
        .and_then(|cwd| match cli.command {
            Command::Init(args) => init(args, &cwd),
            Command::Render(args) => render(args, &cwd),
            Command::Citations(args) => citations(args, &cwd),
        });

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
