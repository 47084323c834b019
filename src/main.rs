mod config;
mod engine;
mod error;
mod indicators;
mod market;
mod ml;
mod sentiment;
mod types;
mod web;

#[cfg(test)]
mod testing;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use config::AppConfig;
use engine::ServiceContext;
use types::Ticker;
use web::{start_server, AppState};

#[derive(Parser)]
#[command(name = "tickercast")]
#[command(author = "Tickercast")]
#[command(version = "0.1.0")]
#[command(about = "Volatility forecasts and news sentiment for stock tickers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the prediction API
    Serve {
        /// Listen port (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Print the volatility forecast and sentiment report for a ticker
    Predict {
        ticker: String,
    },
    /// Print only the sentiment report for a ticker
    Sentiment {
        ticker: String,
    },
    /// Inspect cached tuned parameters
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// List tickers with cached parameters
    List,
    /// Show the cached record for a ticker
    Show {
        ticker: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG takes precedence over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    if cli.json_logs {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    }

    let mut config = AppConfig::load(&cli.config)?;
    if let Err(errors) = config.validate() {
        for e in &errors {
            error!("Config: {}", e);
        }
        return Err(anyhow!("invalid configuration ({} problems)", errors.len()));
    }

    match cli.command {
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            info!("Tickercast v{}", env!("CARGO_PKG_VERSION"));
            let context = ServiceContext::from_config(&config)?;
            start_server(AppState::new(context, config)).await?;
        }
        Commands::Predict { ticker } => {
            let ticker = Ticker::parse(&ticker)?;
            let context = ServiceContext::from_config(&config)?;
            let prediction = context.predict(&ticker).await?;
            println!("{}", serde_json::to_string_pretty(&prediction)?);
        }
        Commands::Sentiment { ticker } => {
            let ticker = Ticker::parse(&ticker)?;
            let context = ServiceContext::from_config(&config)?;
            let report = context.sentiment.run(&ticker).await;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Cache { action } => {
            let context = ServiceContext::from_config(&config)?;
            show_cache(&context, action)?;
        }
    }

    Ok(())
}

fn show_cache(context: &ServiceContext, action: CacheAction) -> Result<()> {
    let store = context.store();
    match action {
        CacheAction::List => {
            let tickers = store.cached_tickers()?;
            println!("{} cached tickers in {}", tickers.len(), store.describe());
            let now = chrono::Utc::now();
            for ticker in tickers {
                let Some(record) = store.load(&ticker)? else {
                    continue;
                };
                let trained = record
                    .trained_on
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "unknown".to_string());
                let status = if store.is_stale(&record, now) { "stale" } else { "fresh" };
                println!("  {:<10} trained {} ({})", ticker, trained, status);
            }
        }
        CacheAction::Show { ticker } => {
            let ticker = Ticker::parse(&ticker)?;
            match store.load(ticker.as_str())? {
                Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
                None => println!("No cached parameters for {}", ticker),
            }
        }
    }
    Ok(())
}
