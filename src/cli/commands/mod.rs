//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod analyze;
mod config_cmd;
mod llm;
mod platforms;
mod transform;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use nasha::config::Config;

#[derive(Parser)]
#[command(name = "nasha")]
#[command(about = "Convert a master product catalog into listing-platform import files")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// LLM model (overrides config and environment)
    #[arg(long, global = true, env = "NASHA_LLM_MODEL")]
    model: Option<String>,

    /// LLM endpoint URL (overrides config and environment)
    #[arg(long, global = true, env = "NASHA_LLM_ENDPOINT")]
    endpoint: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Classify every row and print the subcategory histogram
    Analyze {
        /// Master catalog CSV
        file: PathBuf,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Convert the catalog into a platform's import CSV
    Transform {
        /// Master catalog CSV
        file: PathBuf,
        /// Target platform (weedmaps, iheartjane, leafly, squarespace)
        #[arg(short, long, required_unless_present = "all")]
        platform: Option<String>,
        /// Output file (defaults to {output_dir}/{prefix}_{platform}.csv)
        #[arg(short, long, conflicts_with = "all")]
        output: Option<PathBuf>,
        /// Convert for every platform
        #[arg(short, long)]
        all: bool,
    },

    /// List supported platforms
    Platforms {
        /// Show each platform's column layout
        #[arg(long)]
        columns: bool,
    },

    /// LLM backend commands
    Llm {
        #[command(subcommand)]
        command: LlmCommands,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum LlmCommands {
    /// Show the configured backend and whether it is reachable
    Status,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the effective configuration
    Show,
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match cli.config {
        Some(ref path) => Config::load_from_path(path)
            .await
            .map_err(anyhow::Error::msg)?,
        None => Config::load().await,
    };
    config.apply_llm_overrides(cli.model, cli.endpoint);

    match cli.command {
        Commands::Analyze { file, json } => analyze::cmd_analyze(&config, &file, json).await,
        Commands::Transform {
            file,
            platform,
            output,
            all,
        } => {
            if all {
                transform::cmd_transform_all(&config, &file).await
            } else {
                let platform = platform.unwrap_or_default();
                transform::cmd_transform(&config, &file, &platform, output).await
            }
        }
        Commands::Platforms { columns } => platforms::cmd_platforms(columns),
        Commands::Llm { command } => match command {
            LlmCommands::Status => llm::cmd_llm_status(&config).await,
        },
        Commands::Config { command } => match command {
            ConfigCommands::Show => config_cmd::cmd_config_show(&config),
        },
    }
}
