// In crates/web-server/src/lib.rs

use analytics::add_moving_average;
use api_client::{CandleRequest, MarketData};
use app_config::types::ServerSettings;
use app_config::{is_intraday, validate_interval, ScanSettings};
use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Query, State},
    response::Json,
    routing::{get, post},
    Router,
};
use core_types::{CandleSeries, Symbol};
use scanner::{parse_date, ScanRequest, ScanService};
use tokio::net::TcpListener;
use types::{CandleQuery, ScanInvocation, ScanResponse};

pub mod error;
pub mod types;

// Re-export our custom error type for convenience.
pub use error::{Error, Result};

/// The shared application state that is available to all API handlers.
#[derive(Clone)]
pub struct AppState {
    pub market_data: MarketData,
    pub scan_service: ScanService,
    /// Applied to every scan invocation before its own overrides.
    pub scan_defaults: ScanSettings,
}

/// Creates the main application router with all routes and middleware.
pub fn create_router(app_state: AppState) -> Router {
    // In a production environment, you would restrict the origin to your actual frontend domain.
    let cors = tower_http::cors::CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any);

    let api_router = Router::new()
        .route("/candles", get(get_candles_handler))
        .route("/scan", post(scan_handler));

    Router::new()
        .route("/health", get(health_check_handler))
        .nest("/api", api_router)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

/// A simple health check handler.
async fn health_check_handler() -> &'static str {
    "OK"
}

/// The handler for `GET /api/candles`.
///
/// Returns the candle series for one symbol, enriched with a moving average
/// when the series is at least one window long. Always served through the
/// market-data cache.
async fn get_candles_handler(
    State(state): State<AppState>,
    query: std::result::Result<Query<CandleQuery>, QueryRejection>,
) -> Result<Json<CandleSeries>> {
    let Query(query) = query?;

    let symbol = query
        .symbol
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::BadRequest("Symbol is required".into()))?;
    validate_interval(&query.interval)?;
    if query.window == 0 {
        return Err(Error::BadRequest("window must be greater than 0".into()));
    }

    // Intraday data is only served for the last couple of days.
    let days = if is_intraday(&query.interval) { 2 } else { query.days };
    let start = query.start_date.as_deref().map(parse_date).transpose()?;
    let end = query.end_date.as_deref().map(parse_date).transpose()?;

    let request = CandleRequest::new(Symbol::from(symbol), days, query.interval.clone()).with_range(start, end);
    let series = state.market_data.candles(&request, true).await?;

    if series.len() < query.window {
        tracing::debug!(symbol, candles = series.len(), window = query.window, "Too few candles for the moving average.");
        return Ok(Json(series));
    }

    let key = query.key.clone().unwrap_or_else(|| format!("sma{}", query.window));
    let enriched = add_moving_average(&series, query.source, query.window, &key)?;
    Ok(Json(enriched))
}

/// The handler for `POST /api/scan`.
async fn scan_handler(
    State(state): State<AppState>,
    body: std::result::Result<Json<ScanInvocation>, JsonRejection>,
) -> Result<Json<ScanResponse>> {
    let Json(invocation) = body?;

    let end_date = invocation.end_date_new.as_deref().map(parse_date).transpose()?;
    let request = ScanRequest::new(invocation.settings(&state.scan_defaults)).with_end_date(end_date);
    let symbols = invocation
        .stock_list
        .as_ref()
        .map(|list| list.iter().map(|s| Symbol::from(s.trim().to_uppercase())).collect());

    let report = state.scan_service.run(symbols, &request, None).await?;
    Ok(Json(ScanResponse::new(report, invocation)))
}

/// The main entry point for running the web server.
///
/// This function sets up the TCP listener and serves the application router.
/// It will run forever until the process is terminated.
pub async fn run(settings: ServerSettings, app_state: AppState) -> Result<()> {
    let app = create_router(app_state);

    let address = format!("{}:{}", settings.host, settings.port);
    tracing::info!("Web server listening on {}", address);

    let listener = TcpListener::bind(&address).await.map_err(Error::ServerBindError)?;

    axum::serve(listener, app.into_make_service())
        .await
        .map_err(Error::ServeError)?;

    Ok(())
}
