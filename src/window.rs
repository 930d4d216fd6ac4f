//! Date window generation and date string utilities
//!
//! The upstream feed and the report both speak `DD/MM/YYYY`; the CLI also
//! accepts ISO `YYYY-MM-DD`. All conversions live here as plain functions.

use crate::CalendarDate;
use chrono::{Days, NaiveDate};

/// Date format used in upstream query strings and report lines
pub const DATE_FORMAT: &str = "%d/%m/%Y";

/// ISO date format accepted on the command line
pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// Window errors
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum WindowError {
    /// Period is negative or the window runs past the supported calendar
    #[error("invalid range: {0}")]
    InvalidRange(String),
}

/// Contiguous span of days following a start date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    start: CalendarDate,
    period: u32,
}

impl DateWindow {
    /// Create a window covering `start + 1 ..= start + period` days
    pub fn new(start: CalendarDate, period: i64) -> Result<Self, WindowError> {
        if period < 0 {
            return Err(WindowError::InvalidRange(format!(
                "period must be non-negative, got {period}"
            )));
        }

        let period = u32::try_from(period).map_err(|_| {
            WindowError::InvalidRange(format!("period {period} is too large"))
        })?;

        if start.checked_add_days(Days::new(u64::from(period))).is_none() {
            return Err(WindowError::InvalidRange(format!(
                "window of {period} days after {} exceeds the calendar",
                format_date(start)
            )));
        }

        Ok(Self { start, period })
    }

    /// Start date (excluded from the window)
    pub fn start(&self) -> CalendarDate {
        self.start
    }

    /// Number of days in the window
    pub fn period(&self) -> u32 {
        self.period
    }

    /// Ordered dates in the window, one day apart, starting the day after `start`
    pub fn dates(&self) -> Vec<CalendarDate> {
        (1..=u64::from(self.period))
            .filter_map(|offset| self.start.checked_add_days(Days::new(offset)))
            .collect()
    }
}

/// Produce the dates `start + 1 ..= start + period`
pub fn generate(start: CalendarDate, period: i64) -> Result<Vec<CalendarDate>, WindowError> {
    Ok(DateWindow::new(start, period)?.dates())
}

/// Format a date as `DD/MM/YYYY`
pub fn format_date(date: CalendarDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parse a date in either `YYYY-MM-DD` or `DD/MM/YYYY` form
pub fn parse_date(input: &str) -> Result<CalendarDate, String> {
    let input = input.trim();

    NaiveDate::parse_from_str(input, ISO_DATE_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(input, DATE_FORMAT))
        .map_err(|_| {
            format!("invalid date '{input}': expected YYYY-MM-DD or DD/MM/YYYY")
        })
}
