// In crates/app-config/src/lib.rs

use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;

pub mod error;
pub mod types;

// Re-export the most important types for easy access.
pub use error::{Error, Result};
pub use types::{
    is_intraday, validate_interval, AppSettings, MarketDataSettings, ScanSettings, ServerSettings, Settings,
    UniverseSettings, MAX_LOOKBACK_DAYS,
};

/// Loads the application settings from the `config/` directory.
///
/// This function orchestrates the layered configuration loading:
/// 1. Reads from a default `base.toml` file.
/// 2. Merges settings from an environment-specific file (e.g., `development.toml`).
/// 3. Merges settings from environment variables.
pub fn load_settings() -> Result<Settings> {
    load_settings_from("config")
}

/// Same as [`load_settings`], reading the TOML files from `dir`.
pub fn load_settings_from(dir: impl AsRef<Path>) -> Result<Settings> {
    let dir = dir.as_ref();
    // Get the current environment. Default to "development" if not set.
    let environment = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "development".into());

    let settings = Config::builder()
        .add_source(File::with_name(&dir.join("base").to_string_lossy()))
        .add_source(File::with_name(&dir.join(&environment).to_string_lossy()).required(false))
        // Settings from environment variables (e.g., `APP__SERVER__PORT=8080`).
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let settings: Settings = settings.try_deserialize()?;
    settings.scan.validate()?;

    Ok(settings)
}

#[derive(Deserialize)]
struct UniverseFile {
    symbols: Vec<String>,
}

/// Reads a universe file: a TOML document with a top-level `symbols` array.
pub fn load_universe_file(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    let file: UniverseFile = toml::from_str(&content)?;
    Ok(file.symbols)
}
