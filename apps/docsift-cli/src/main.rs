//! docsift CLI
//!
//! Ingests business documents into a local corpus and runs corpus analytics.

mod app;
mod cli;
mod commands;
mod output;
mod telemetry;

use clap::Parser;
use colored::Colorize;
use std::process::ExitCode;
use tracing::error;

use crate::app::{load_config, App};
use crate::cli::{Args, Commands};
use crate::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables from .env file if it exists
    dotenv::dotenv().ok();

    let args = Args::parse();

    if args.no_color {
        colored::control::set_override(false);
    }

    if let Err(e) = init_telemetry(&args) {
        eprintln!("{}: {:#}", "Error".red().bold(), e);
        return ExitCode::FAILURE;
    }

    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("{}: {}", "Error".red().bold(), e);
            if args.verbose {
                for cause in e.chain().skip(1) {
                    eprintln!("{}: {}", "Caused by".yellow(), cause);
                }
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &Args) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?;

    match &args.command {
        Commands::Config(cmd) => commands::config::run(&config, cmd.clone(), args.format),
        Commands::Ingest { paths, recursive } => {
            let app = App::open(config).await?;
            commands::ingest::run(&app, paths, *recursive, args.format).await
        }
        Commands::List { limit } => {
            let app = App::open(config).await?;
            commands::documents::list(&app, *limit, args.format).await
        }
        Commands::Show { id, text } => {
            let app = App::open(config).await?;
            commands::documents::show(&app, id, *text, args.format).await
        }
        Commands::Analytics(cmd) => {
            let app = App::open(config).await?;
            commands::analytics::run(&app, cmd.clone(), args.format).await
        }
    }
}
