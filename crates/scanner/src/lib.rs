// In crates/scanner/src/lib.rs

//! Multi-symbol trend scanning on top of the analytics core.

pub mod error;
pub mod scanner;
pub mod service;
pub mod types;

pub use error::{Result, ScanError};
pub use scanner::Scanner;
pub use service::ScanService;
pub use types::{parse_date, ScanReport, ScanRequest, ScanSummary, SkipReason, SymbolIssue, SymbolOutcome};
