pub mod cli;
pub mod core;
pub mod providers;
pub mod workflow;

use crate::core::config::AppConfig;
use crate::core::{Fiat, PriceProvider};
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

pub enum AppCommand {
    /// Interactive panel on stdin/stdout
    Panel,
    /// One-shot lookup of one or more coins
    Rate {
        coins: Vec<String>,
        fiat: Option<Fiat>,
    },
    /// One-shot fetch and convert
    Convert {
        amount: String,
        coin: Option<String>,
        fiat: Option<Fiat>,
    },
}

fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");
    Ok(config)
}

fn create_provider(config: &AppConfig) -> Result<Arc<dyn PriceProvider>> {
    let coingecko = &config.providers.coingecko;
    let provider =
        providers::CoinGeckoProvider::new(&coingecko.base_url, coingecko.timeout())?;
    Ok(Arc::new(provider))
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Crypto panel starting...");

    let config = load_config(config_path)?;
    let provider = create_provider(&config)?;

    match command {
        AppCommand::Panel => {
            let workflow =
                workflow::RateWorkflow::new(provider, config.fiat, config.done_delay());
            let mut panel = cli::panel::Panel::new(workflow, &config.coin, std::io::stdout());
            let input = tokio::io::BufReader::new(tokio::io::stdin());
            panel.run(input).await
        }
        AppCommand::Rate { coins, fiat } => {
            let coins = if coins.is_empty() {
                vec![config.coin.clone()]
            } else {
                coins
            };
            cli::rate::run(provider.as_ref(), &coins, fiat.unwrap_or(config.fiat)).await
        }
        AppCommand::Convert { amount, coin, fiat } => {
            let coin = coin.unwrap_or_else(|| config.coin.clone());
            cli::convert::run(
                provider.as_ref(),
                &amount,
                &coin,
                fiat.unwrap_or(config.fiat),
            )
            .await
        }
    }
}
