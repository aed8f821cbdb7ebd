use anyhow::Result;
use clap::{Parser, Subcommand};
use cryptopanel::core::Fiat;
use cryptopanel::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Start the interactive panel (default)
    Panel,
    /// Print the current rate of one or more coins
    Rate {
        /// Tickers (btc, eth, ...) or CoinGecko ids
        coins: Vec<String>,
        /// Fiat currency: usd, eur or rub
        #[arg(short, long)]
        fiat: Option<Fiat>,
    },
    /// Fetch a rate and convert an amount with it
    Convert {
        /// Amount of the coin to convert
        amount: String,
        /// Ticker or CoinGecko id
        #[arg(long)]
        coin: Option<String>,
        /// Fiat currency: usd, eur or rub
        #[arg(short, long)]
        fiat: Option<Fiat>,
    },
}

impl From<Commands> for cryptopanel::AppCommand {
    fn from(cmd: Commands) -> cryptopanel::AppCommand {
        match cmd {
            Commands::Panel => cryptopanel::AppCommand::Panel,
            Commands::Rate { coins, fiat } => cryptopanel::AppCommand::Rate { coins, fiat },
            Commands::Convert { amount, coin, fiat } => {
                cryptopanel::AppCommand::Convert { amount, coin, fiat }
            }
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => cryptopanel::cli::setup::setup(),
        Some(cmd) => cryptopanel::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            cryptopanel::run_command(cryptopanel::AppCommand::Panel, cli.config_path.as_deref())
                .await
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
