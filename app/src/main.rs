// In app/src/main.rs

use std::str::FromStr;
use std::sync::Arc;

use analytics::add_moving_average;
use anyhow::Result;
use api_client::{ApiClient, CandleRequest, MarketData, MarketDataCache, StaticUniverse, UniverseSource};
use app_config::Settings;
use clap::{Args, Parser, Subcommand};
use core_types::Symbol;
use scanner::{ScanRequest, ScanService, Scanner};
use tokio::sync::watch;
use tracing_subscriber::prelude::*;
use web_server::AppState;

mod report;

// --- Command-Line Interface Definition ---

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = "Screens a universe of symbols for sustained moving-average trends.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scans symbols for a moving-average trend and checks whether it cleared.
    Scan(ScanArgs),

    /// Prints the candles of one symbol with their moving average.
    Candles {
        /// The symbol to fetch (e.g., "RELIANCE").
        #[arg(short, long)]
        symbol: String,

        /// Days of history, ignored for intraday intervals.
        #[arg(long, default_value_t = 70)]
        days: u32,

        /// The candle interval (e.g., "15m", "1d").
        #[arg(short, long, default_value = "1d")]
        interval: String,

        /// Length of the simple moving average.
        #[arg(long, default_value_t = 44)]
        window: usize,
    },

    /// Serves the candle and scan endpoints over HTTP.
    Serve,
}

#[derive(Args, Debug)]
struct ScanArgs {
    /// Comma-separated symbols. Defaults to the configured universe.
    #[arg(long, value_delimiter = ',')]
    symbols: Vec<String>,

    /// End of the scanned window, RFC 3339 or YYYY-MM-DD. Defaults to now.
    #[arg(long)]
    end_date: Option<String>,

    /// The candle interval, overriding `scan.interval`.
    #[arg(short, long)]
    interval: Option<String>,

    /// Also require the candle-conditions breakout rule.
    #[arg(long)]
    check_v2: bool,

    /// Skip the placement breakout rule.
    #[arg(long)]
    no_check_v3: bool,

    /// Serve candles from the cache when possible.
    #[arg(long)]
    use_cached: bool,

    /// How many symbols to fetch at once.
    #[arg(long)]
    concurrency: Option<usize>,

    /// Print the report as JSON.
    #[arg(long)]
    json: bool,
}

// --- Main Application Entry Point ---

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from a .env file, if it exists.
    dotenvy::dotenv().ok();

    let settings = app_config::load_settings()?;

    let default_level = tracing::Level::from_str(&settings.app.log_level).unwrap_or(tracing::Level::INFO);
    let fmt_layer = tracing_subscriber::fmt::layer().with_filter(
        tracing_subscriber::filter::Targets::new()
            .with_target("hyper_util", tracing::Level::WARN)
            .with_target("reqwest", tracing::Level::WARN)
            .with_default(default_level),
    );
    tracing_subscriber::registry().with(fmt_layer).init();

    // Parse command-line arguments.
    let cli = Cli::parse();

    tracing::info!(environment = %settings.app.environment, "Starting trend scanner");

    match cli.command {
        Commands::Scan(args) => handle_scan(settings, args).await?,
        Commands::Candles {
            symbol,
            days,
            interval,
            window,
        } => handle_candles(settings, symbol, days, interval, window).await?,
        Commands::Serve => handle_serve(settings).await?,
    }

    Ok(())
}

/// The components every subcommand is built from.
struct Services {
    market_data: MarketData,
    scan_service: ScanService,
}

impl Services {
    fn build(settings: &Settings) -> Result<Self> {
        let client = Arc::new(ApiClient::new(&settings.market_data)?);
        let cache = Arc::new(MarketDataCache::from_settings(&settings.market_data));
        let market_data = MarketData::new(client.clone(), cache);

        // A configured universe endpoint wins over the static list.
        let universe: Arc<dyn UniverseSource> = if settings.market_data.universe_url.is_some() {
            client
        } else {
            Arc::new(StaticUniverse::from_settings(&settings.universe)?)
        };

        let scan_service = ScanService::new(Scanner::new(market_data.clone()), universe);
        Ok(Self {
            market_data,
            scan_service,
        })
    }
}

// --- "Scan" Subcommand Logic ---

async fn handle_scan(settings: Settings, args: ScanArgs) -> Result<()> {
    let services = Services::build(&settings)?;

    let mut scan_settings = settings.scan.clone();
    if let Some(interval) = args.interval {
        scan_settings.interval = interval;
    }
    if args.check_v2 {
        scan_settings.check_v2 = true;
    }
    if args.no_check_v3 {
        scan_settings.check_v3 = false;
    }
    if args.use_cached {
        scan_settings.use_cached = true;
    }
    if let Some(concurrency) = args.concurrency {
        scan_settings.concurrency = concurrency;
    }

    let end_date = args.end_date.as_deref().map(scanner::parse_date).transpose()?;
    let request = ScanRequest::new(scan_settings).with_end_date(end_date);
    let symbols = (!args.symbols.is_empty())
        .then(|| args.symbols.iter().map(|s| Symbol::from(s.trim().to_uppercase())).collect());

    // Ctrl-C stops the scan from starting new symbols; the partial report is still printed.
    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling scan...");
            cancel_tx.send_replace(true);
        }
    });

    let report = services.scan_service.run(symbols, &request, Some(cancel_rx)).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        report::print_scan_report(&report);
    }
    Ok(())
}

// --- "Candles" Subcommand Logic ---

async fn handle_candles(settings: Settings, symbol: String, days: u32, interval: String, window: usize) -> Result<()> {
    app_config::validate_interval(&interval)?;
    let services = Services::build(&settings)?;

    let days = if app_config::is_intraday(&interval) { 2 } else { days };
    let request = CandleRequest::new(Symbol::from(symbol.trim().to_uppercase()), days, interval);
    let series = services.market_data.candles(&request, false).await?;

    let key = format!("sma{window}");
    if series.len() < window {
        tracing::warn!(candles = series.len(), window, "Not enough candles for the moving average.");
        report::print_candles(&series, &key);
    } else {
        let enriched = add_moving_average(&series, core_types::PriceField::Close, window, &key)?;
        report::print_candles(&enriched, &key);
    }
    Ok(())
}

// --- "Serve" Subcommand Logic ---

async fn handle_serve(settings: Settings) -> Result<()> {
    let services = Services::build(&settings)?;
    let state = AppState {
        market_data: services.market_data,
        scan_service: services.scan_service,
        scan_defaults: settings.scan.clone(),
    };

    web_server::run(settings.server.clone(), state).await?;
    Ok(())
}
