//! Mantaray command line tool
//!
//! Drives a deployed network the way the data-science notebooks do: list
//! the simulated users, fund them from the faucet, publish assets and
//! search the metadata store.

use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};
use mantaray_core::config::config_file_path;
use mantaray_core::MantarayConfig;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "mantaray")]
#[command(author, version, about = "Simulated users, publishing and search on an Ocean network")]
struct Cli {
    /// Config file path
    #[arg(short, long, global = true, env = "OCEAN_CONFIG_PATH")]
    config: Option<PathBuf>,

    /// CSV file with `address,password` rows
    #[arg(short, long, global = true, env = "MANTARAY_PASSWORDS")]
    passwords: Option<PathBuf>,

    /// Log filter, overrides RUST_LOG
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the configuration and the accounts on the node
    Check,

    /// List the simulated users with their balances
    Users,

    /// Request tokens for every unlocked user without any
    Fund {
        /// Largest amount requested per user
        #[arg(long, default_value_t = 10)]
        max_amount: u64,
    },

    /// Request tokens for one account
    RequestTokens {
        /// Account address
        address: String,

        /// Whole tokens to request
        amount: u64,
    },

    /// Publish an asset based on the sample weather dataset
    Publish {
        /// Asset name
        #[arg(long)]
        name: Option<String>,

        /// Asset description
        #[arg(long)]
        description: Option<String>,

        /// Price in whole tokens
        #[arg(long)]
        price: Option<u64>,

        /// Access timeout in seconds
        #[arg(long, default_value_t = 600)]
        timeout: u64,

        /// Publishing account, a random unlocked data owner by default
        #[arg(long)]
        owner: Option<String>,
    },

    /// Search published assets
    Search {
        /// Lowest price, inclusive
        #[arg(long)]
        price_min: Option<u64>,

        /// Highest price, inclusive
        #[arg(long)]
        price_max: Option<u64>,

        /// Text to match in names and descriptions
        #[arg(long)]
        text: Vec<String>,

        /// Raw JSON query
        #[arg(long)]
        query: Option<String>,

        /// Results per page, 0 for everything
        #[arg(long, default_value_t = 0)]
        offset: usize,

        /// Page number, needs --offset
        #[arg(long, default_value_t = 0)]
        page: usize,
    },

    /// List every registered DID
    List,

    /// Print the record of one asset
    Show {
        /// Asset DID
        did: String,
    },

    /// Remove the metadata record of an asset
    Retire {
        /// Asset DID
        did: String,
    },
}

fn load_config(cli: &Cli) -> Result<MantarayConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            MantarayConfig::from_file(path)
                .with_context(|| format!("Invalid configuration file {}", path.display()))?
        }
        None => load_default_config(&std::env::current_dir()?)?,
    };

    if let Some(passwords) = &cli.passwords {
        config.resources.passwords_path = Some(passwords.clone());
    }

    Ok(config)
}

/// The deployment's default file under `project_dir`, or local defaults when it is absent
fn load_default_config(project_dir: &Path) -> Result<MantarayConfig> {
    let path = config_file_path(project_dir);
    if !path.exists() {
        warn!("{} not found, using local defaults", path.display());
        return Ok(MantarayConfig::local());
    }

    info!("Loading configuration from {}", path.display());
    MantarayConfig::from_file(&path)
        .with_context(|| format!("Invalid configuration file {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize logging
    let env = env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "info");
    let mut logger = env_logger::Builder::from_env(env);
    if let Some(level) = &cli.log_level {
        logger.parse_filters(level);
    }
    logger.init();

    let config = load_config(&cli)?;

    match cli.command {
        Commands::Check => commands::check(config).await,
        Commands::Users => commands::users(config).await,
        Commands::Fund { max_amount } => commands::fund(config, max_amount).await,
        Commands::RequestTokens { address, amount } => {
            commands::request_tokens(config, &address, amount).await
        }
        Commands::Publish {
            name,
            description,
            price,
            timeout,
            owner,
        } => {
            let metadata = commands::publish_metadata(name, description, price);
            commands::publish(config, metadata, timeout, owner.as_deref()).await
        }
        Commands::Search {
            price_min,
            price_max,
            text,
            query,
            offset,
            page,
        } => {
            let query = commands::build_query(
                query.as_deref(),
                price_min,
                price_max,
                &text,
                offset,
                page,
            )?;
            commands::search(config, query).await
        }
        Commands::List => commands::list(config).await,
        Commands::Show { did } => commands::show(config, &did).await,
        Commands::Retire { did } => commands::retire(config, &did).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use tempfile::tempdir;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_search() {
        let cli = Cli::try_parse_from([
            "mantaray", "search", "--price-max", "20", "--text", "weather", "--text", "rain",
        ])
        .unwrap();

        match cli.command {
            Commands::Search {
                price_min,
                price_max,
                text,
                ..
            } => {
                assert_eq!(price_min, None);
                assert_eq!(price_max, Some(20));
                assert_eq!(text, vec!["weather", "rain"]);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "mantaray", "fund", "--max-amount", "5", "--config", "config_local.ini",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("config_local.ini")));
        assert!(matches!(cli.command, Commands::Fund { max_amount: 5 }));
    }

    #[test]
    fn test_missing_explicit_config_is_an_error() {
        let cli = Cli::try_parse_from([
            "mantaray",
            "--config",
            "/nonexistent/config_local.ini",
            "list",
        ])
        .unwrap();

        assert!(load_config(&cli).is_err());
    }

    #[test]
    fn test_explicit_config_and_passwords() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config_nile.ini");
        std::fs::write(&path, "[resources]\naquarius.url = http://aquarius:5000\n").unwrap();

        let cli = Cli::try_parse_from([
            "mantaray",
            "--config",
            path.to_str().unwrap(),
            "--passwords",
            "passwords.csv",
            "list",
        ])
        .unwrap();
        let config = load_config(&cli).unwrap();

        assert_eq!(config.resources.aquarius_url, "http://aquarius:5000");
        assert_eq!(config.resources.passwords_path, Some(PathBuf::from("passwords.csv")));
    }

    #[test]
    fn test_absent_default_config_uses_local_defaults() {
        let dir = tempdir().unwrap();

        assert_eq!(load_default_config(dir.path()).unwrap(), MantarayConfig::local());
    }

    #[test]
    fn test_request_tokens_needs_amount() {
        assert!(Cli::try_parse_from(["mantaray", "request-tokens", "0x00"]).is_err());
    }
}
