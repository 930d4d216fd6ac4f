//! Report rendering
//!
//! Human output is one line per currency:
//!
//! ```text
//! US Dollar              (USD) – minimum value:  74.5000 on 03/01/2023; maximum value:  76.0000 on 04/01/2023; average value:  75.1667
//! ```

use crate::aggregator::{AggregateReport, CurrencyStats, SkippedDate};
use crate::window::format_date;
use serde::Serialize;
use std::fmt::Write as _;

/// Width the currency key is padded to in human output
pub const CODE_WIDTH: usize = 22;

/// Format one currency line
pub fn format_line(stats: &CurrencyStats) -> String {
    format!(
        "{:<width$} ({}) – minimum value: {:8.4} on {}; maximum value: {:8.4} on {}; average value: {:8.4}",
        stats.code,
        stats.display_name,
        stats.min.rate,
        format_date(stats.min.date),
        stats.max.rate,
        format_date(stats.max.date),
        stats.average,
        width = CODE_WIDTH,
    )
}

/// Render every currency, one line each, in first-seen order
pub fn render_human(report: &AggregateReport) -> String {
    report.stats().iter().fold(String::new(), |mut out, stats| {
        let _ = writeln!(out, "{}", format_line(stats));
        out
    })
}

#[derive(Serialize)]
struct JsonReport<'a> {
    currencies: Vec<CurrencyStats>,
    skipped: &'a [SkippedDate],
}

/// Render the report as a JSON document
pub fn render_json(report: &AggregateReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&JsonReport {
        currencies: report.stats(),
        skipped: report.skipped(),
    })
}
