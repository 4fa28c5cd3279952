// In app/src/report.rs

use core_types::Candle;
use scanner::ScanReport;

/// Prints a scan report as a plain-text table.
pub fn print_scan_report(report: &ScanReport) {
    println!("\n--- Scan Complete ---");
    println!(
        "{:<14} {:<8} {:>7} {:>8} {:>10} {:>10} {:>10}",
        "Symbol", "Trend", "Streak", "Cleared", "Close", "MA", "Time"
    );
    println!("{}", "-".repeat(74));

    for result in &report.results {
        let ma = result
            .metrics
            .moving_average
            .map(|v| format!("{v:.2}"))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<14} {:<8} {:>7} {:>8} {:>10.2} {:>10} {:>10}",
            result.symbol,
            result.trend_label,
            result.streak_length,
            if result.cleared { "yes" } else { "no" },
            result.metrics.close,
            ma,
            result.metrics.time.format("%m-%d %H:%M").to_string(),
        );
    }

    if !report.skipped.is_empty() {
        println!("\nSkipped:");
        for issue in &report.skipped {
            println!("  - {}: {}", issue.symbol, issue.reason);
        }
    }
    if !report.failures.is_empty() {
        println!("\nFailed:");
        for issue in &report.failures {
            println!("  - {}: {}", issue.symbol, issue.reason);
        }
    }

    let summary = &report.summary;
    println!(
        "\nRequested: {} | Scanned: {} | Skipped: {} | Failed: {}{}",
        summary.requested,
        summary.scanned,
        summary.skipped,
        summary.failed,
        if summary.cancelled { " | CANCELLED" } else { "" }
    );
}

/// Prints candles with the moving average stored under `key`.
pub fn print_candles(series: &[Candle], key: &str) {
    println!(
        "{:<20} {:>10} {:>10} {:>10} {:>10} {:>12} {:>10}",
        "Time", "Open", "High", "Low", "Close", "Volume", key
    );
    for candle in series {
        let ma = candle
            .indicator(key)
            .map(|v| format!("{v:.2}"))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<20} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>12.0} {:>10}",
            candle.time.format("%Y-%m-%d %H:%M").to_string(),
            candle.open,
            candle.high,
            candle.low,
            candle.close,
            candle.volume,
            ma
        );
    }
}
