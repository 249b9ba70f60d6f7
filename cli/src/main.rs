// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # AEGIS Learning CLI
//!
//! The `aegis-learn` binary inspects and maintains per-agent learning data.
//!
//! ## Commands
//!
//! - `aegis-learn show <AGENT>` - Summarize an agent's learning data
//! - `aegis-learn export|import <FILE>` - Move learning data through a single file
//! - `aegis-learn clear <AGENT> --confirm <TOKEN>` - Delete an agent's data
//! - `aegis-learn select <AGENT> --type <TYPE>` - Preview strategy selection
//! - `aegis-learn shared <AGENT>` - List knowledge other agents could share

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing::debug;

use aegis_learning::domain::agent::AgentId;
use aegis_learning::domain::config::{LearningConfig, CONFIG_PATH_ENV, DATA_DIR_ENV};
use aegis_learning::LearningSystem;

mod commands;

/// AEGIS Learning - Inspect and maintain agent learning data
#[derive(Parser)]
#[command(name = "aegis-learn")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(short, long, global = true, env = CONFIG_PATH_ENV, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Root learning directory (overrides configuration)
    #[arg(long, global = true, env = DATA_DIR_ENV, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "AEGIS_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize an agent's learning data
    Show {
        agent: AgentId,

        /// Print the full learning data as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export learning data to a single file
    Export {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Only export this agent
        #[arg(long)]
        agent: Option<AgentId>,
    },

    /// Import learning data from an export file
    Import {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Delete all learning data for an agent
    Clear {
        agent: AgentId,

        /// Confirmation token (CONFIRM_CLEAR_LEARNING_DATA)
        #[arg(long, value_name = "TOKEN")]
        confirm: String,
    },

    /// Preview which strategy would be selected for an investigation
    Select {
        agent: AgentId,

        /// Investigation type, e.g. security-audit
        #[arg(long = "type", value_name = "TYPE")]
        investigation_type: String,

        #[arg(long)]
        framework: Option<String>,

        #[arg(long)]
        language: Option<String>,

        /// Scope tags
        #[arg(long, num_args = 1..)]
        scope: Vec<String>,
    },

    /// List knowledge other agents hold above a confidence floor
    Shared {
        agent: AgentId,

        #[arg(long, value_name = "CONFIDENCE")]
        min_confidence: Option<f64>,

        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log_level)?;

    let Some(command) = cli.command else {
        eprintln!("{}", "No command specified. Use --help for usage.".yellow());
        std::process::exit(1);
    };

    let config = load_config(cli.config, cli.data_dir)?;
    debug!(root_dir = %config.storage.root_dir.display(), "Using learning directory");
    let system = LearningSystem::from_config(&config).context("Failed to initialize learning system")?;

    match command {
        Commands::Show { agent, json } => commands::data::show(&system, agent, json).await,
        Commands::Export { file, agent } => commands::data::export(&system, &file, agent).await,
        Commands::Import { file } => commands::data::import(&system, &file).await,
        Commands::Clear { agent, confirm } => commands::data::clear(&system, agent, &confirm).await,
        Commands::Select {
            agent,
            investigation_type,
            framework,
            language,
            scope,
        } => {
            commands::select::select(&system, agent, investigation_type, framework, language, scope).await
        }
        Commands::Shared {
            agent,
            min_confidence,
            json,
        } => commands::shared::shared(&system, agent, min_confidence, json).await,
    }
}

fn load_config(path: Option<PathBuf>, data_dir: Option<PathBuf>) -> Result<LearningConfig> {
    let mut config = LearningConfig::load_or_default(path).context("Failed to load configuration")?;
    if let Some(dir) = data_dir {
        config.storage.root_dir = dir;
    }
    Ok(config)
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    Ok(())
}
