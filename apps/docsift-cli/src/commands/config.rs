//! Configuration commands

use anyhow::{bail, Result};
use colored::Colorize;

use docsift_core::AppConfig;

use crate::cli::ConfigCommands;
use crate::output::{self, OutputFormat};

pub fn run(config: &AppConfig, cmd: ConfigCommands, format: OutputFormat) -> Result<()> {
    match cmd {
        ConfigCommands::Show => show_config(config, format),
        ConfigCommands::Validate => validate_config(config),
    }
}

fn show_config(config: &AppConfig, format: OutputFormat) -> Result<()> {
    let config = redacted(config);
    // Text output is the TOML a user would put in a config file
    let rendered = match output::format_structured(&config, format)? {
        Some(rendered) => rendered,
        None => toml::to_string_pretty(&config)?,
    };
    println!("{}", rendered.trim_end());
    Ok(())
}

fn validate_config(config: &AppConfig) -> Result<()> {
    match config.validate() {
        Ok(()) => {
            output::success("Configuration is valid");
            Ok(())
        }
        Err(e) => {
            eprintln!("{} Invalid configuration: {}", "✗".red(), e);
            bail!("Configuration validation failed");
        }
    }
}

fn redacted(config: &AppConfig) -> AppConfig {
    let mut config = config.clone();
    if config.summarizer.api_token.is_some() {
        config.summarizer.api_token = Some("[redacted]".to_string());
    }
    config
}
