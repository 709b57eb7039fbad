use std::fmt::Display;

use anyhow::bail;
use clap::{Parser, Subcommand};

use crate::config_provider::ConfigProvider;
use crate::log_record::{Level, LogContext};

/// Top-level CLI for the trading ecosystem logging runtime
#[derive(Parser)]
#[command(
    name = "ecosystem",
    version,
    about = "Trading ecosystem structured logging"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the resolved configuration and remote store availability
    Config,

    /// Emit one record through an ecosystem logger
    Log {
        #[arg(short, long)]
        component: String,
        #[arg(long)]
        agent_id: Option<String>,
        /// INFO, WARNING, ERROR or CRITICAL
        #[arg(short, long, default_value = "info")]
        level: String,
        #[arg(short, long)]
        message: String,
        /// Correlation field as key=value (agent_id, strategy_id, trade_id)
        #[arg(long = "context", value_parser = parse_key_val)]
        context: Vec<(String, String)>,
        /// Failure cause, only valid with --level error
        #[arg(long)]
        cause: Option<String>,
    },
}

/// Parse a `key=value` argument
pub fn parse_key_val(input: &str) -> Result<(String, String), String> {
    let (key, value) = input
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{input}'"))?;
    if key.trim().is_empty() {
        return Err(format!("missing key in '{input}'"));
    }
    Ok((key.trim().to_string(), value.to_string()))
}

pub fn run(cli: Cli, provider: &ConfigProvider) -> anyhow::Result<()> {
    match cli.command {
        Commands::Config => {
            println!("{}", provider.config().summary_string());
            println!(
                "remote_store={}",
                if provider.has_remote_store() {
                    "available"
                } else {
                    "unavailable (local mode)"
                }
            );
        }
        Commands::Log {
            component,
            agent_id,
            level,
            message,
            context,
            cause,
        } => {
            let level: Level = level.parse()?;
            let context = LogContext::from_pairs(context)?;
            let logger = provider.logger(&component, agent_id)?;

            match (level, cause) {
                (Level::Error, cause) => {
                    logger.error(&message, cause.as_ref().map(|c| c as &dyn Display), context)?
                }
                (_, Some(_)) => bail!("--cause is only valid with --level error"),
                (level, None) => logger.log(level, &message, context)?,
            }
        }
    }

    Ok(())
}
