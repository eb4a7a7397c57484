//! Command definitions and dispatch.

mod check;
mod extract;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use holerite::config::Config;
use holerite::utils::normalize_date;

use super::icons::arrow;
use extract::ExtractArgs;

#[derive(Parser)]
#[command(name = "holerite")]
#[command(about = "Extract Brazilian payslip fields into reviewable drafts")]
#[command(version)]
struct Cli {
    /// Config file (TOML, YAML or JSON). Discovered automatically when omitted.
    #[arg(short, long, global = true, env = "HOLERITE_CONFIG")]
    config: Option<PathBuf>,

    /// Log progress details
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract draft records from payslip PDFs and images
    Extract {
        /// Documents to process
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Documents processed concurrently (defaults to the configured value)
        #[arg(short, long)]
        workers: Option<usize>,

        /// Submitter email stored on every draft
        #[arg(long)]
        user_email: Option<String>,

        /// Payment date used when a slip has none (YYYY-MM-DD or DD/MM/YYYY)
        #[arg(long, value_parser = parse_date)]
        data_pagamento: Option<String>,

        /// Allow cloud analysis when local tiers fall short
        #[arg(long, overrides_with = "no_cloud")]
        cloud: bool,

        /// Never send documents to the cloud
        #[arg(long, overrides_with = "cloud")]
        no_cloud: bool,

        /// Run every tier and merge all candidates
        #[arg(long)]
        cross_validate: bool,

        /// Write one pretty-printed JSON array instead of JSON lines
        #[arg(long)]
        pretty: bool,

        /// Write results to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check local tools, OCR languages, and cloud configuration
    Check,
}

fn parse_date(s: &str) -> Result<String, String> {
    normalize_date(s).ok_or_else(|| format!("invalid date '{}', expected YYYY-MM-DD", s))
}

/// Whether `-v`/`--verbose` was passed, checked before clap runs so logging
/// can be set up first.
pub fn is_verbose() -> bool {
    std::env::args().skip(1).any(|arg| {
        arg == "--verbose"
            || (arg.starts_with('-') && !arg.starts_with("--") && arg[1..].contains('v'))
    })
}

async fn load_config(path: Option<&PathBuf>) -> anyhow::Result<Config> {
    match path {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            Config::load_from_path(path)
                .await
                .map_err(|e| anyhow::anyhow!("{}: {}", path.display(), e))
        }
        None => Ok(Config::load().await),
    }
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref()).await?;
    if cli.verbose {
        match &config.source_path {
            Some(path) => eprintln!("{} Config: {}", arrow(), path.display()),
            None => eprintln!("{} Config: defaults", arrow()),
        }
    }

    match cli.command {
        Commands::Extract {
            files,
            workers,
            user_email,
            data_pagamento,
            cloud,
            no_cloud,
            cross_validate,
            pretty,
            output,
        } => {
            let cloud = if cloud {
                Some(true)
            } else if no_cloud {
                Some(false)
            } else {
                None
            };
            extract::cmd_extract(
                config,
                ExtractArgs {
                    files,
                    workers,
                    user_email,
                    data_pagamento,
                    cloud,
                    cross_validate,
                    pretty,
                    output,
                },
            )
            .await
        }
        Commands::Check => check::cmd_check(&config).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_accepts_both_formats() {
        assert_eq!(parse_date("2024-08-05").unwrap(), "2024-08-05");
        assert_eq!(parse_date("05/08/2024").unwrap(), "2024-08-05");
        assert!(parse_date("31/02/2024").is_err());
    }

    #[test]
    fn test_cloud_flags_override_each_other() {
        let cli = Cli::parse_from(["holerite", "extract", "a.pdf", "--no-cloud", "--cloud"]);
        match cli.command {
            Commands::Extract {
                cloud, no_cloud, ..
            } => {
                assert!(cloud);
                assert!(!no_cloud);
            }
            Commands::Check => panic!("expected extract"),
        }
    }

    #[test]
    fn test_extract_requires_files() {
        assert!(Cli::try_parse_from(["holerite", "extract"]).is_err());
    }
}
