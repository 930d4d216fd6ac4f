//! Per-currency aggregation
//!
//! Records from every snapshot in the window are merged into one
//! [`CurrencyAggregate`] per currency key. Statistics are derived once, at
//! report time, from the full observation list. Currencies keep the order in
//! which they were first merged.

use crate::window::format_date;
use crate::{CalendarDate, CurrencyRecord};
use serde::Serialize;
use indexmap::IndexMap;

/// Mapping from currency key to its aggregate, in first-seen order
pub type AggregateMap = IndexMap<String, CurrencyAggregate>;

/// A single rate observed on a given day
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Observation {
    /// Observed rate
    pub rate: f64,
    /// Snapshot day
    pub date: CalendarDate,
}

/// All observations for one currency across the window
#[derive(Debug, Clone, PartialEq)]
pub struct CurrencyAggregate {
    display_name: String,
    observations: Vec<Observation>,
}

impl CurrencyAggregate {
    fn new(display_name: String, first: Observation) -> Self {
        Self {
            display_name,
            observations: vec![first],
        }
    }

    /// Display name from the first record merged for this currency
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Observations in merge order (never empty)
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// Derive min, max and average.
    ///
    /// Observations are ordered by date first so that ties on the extrema
    /// resolve to the earliest day regardless of merge order.
    pub fn stats(&self, code: &str) -> CurrencyStats {
        let mut ordered = self.observations.clone();
        ordered.sort_by_key(|o| o.date);

        // Invariant: an aggregate is created with one observation and only grows
        let first = ordered[0];
        let (min, max, sum) = ordered[1..].iter().fold(
            (first, first, first.rate),
            |(min, max, sum), o| {
                (
                    if o.rate < min.rate { *o } else { min },
                    if o.rate > max.rate { *o } else { max },
                    sum + o.rate,
                )
            },
        );

        CurrencyStats {
            code: code.to_string(),
            display_name: self.display_name.clone(),
            min,
            max,
            average: sum / ordered.len() as f64,
            samples: ordered.len(),
        }
    }
}

/// Summary statistics for one currency
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrencyStats {
    /// Currency key
    pub code: String,
    /// Display name
    pub display_name: String,
    /// Lowest rate and the earliest day it was seen
    pub min: Observation,
    /// Highest rate and the earliest day it was seen
    pub max: Observation,
    /// Arithmetic mean of all observed rates
    pub average: f64,
    /// Number of observations
    pub samples: usize,
}

/// A day excluded from the report under the skip failure policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedDate {
    /// Day that failed
    pub date: CalendarDate,
    /// Error that caused the skip
    pub reason: String,
}

/// Accumulates records from many snapshots
///
/// Owned by a single merge stage; concurrent producers hand it their batches
/// rather than sharing it.
#[derive(Debug, Default)]
pub struct Aggregator {
    currencies: AggregateMap,
    skipped: Vec<SkippedDate>,
}

impl Aggregator {
    /// Create an empty aggregator
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one snapshot's records
    ///
    /// New keys take the record's display name; existing keys only gain an
    /// observation and keep the name they were first seen with.
    pub fn merge<I>(&mut self, records: I)
    where
        I: IntoIterator<Item = CurrencyRecord>,
    {
        merge(&mut self.currencies, records);
    }

    /// Record a day that was left out of the report
    pub fn skip(&mut self, date: CalendarDate, reason: impl Into<String>) {
        self.skipped.push(SkippedDate {
            date,
            reason: reason.into(),
        });
    }

    /// Freeze into the final report
    pub fn finish(mut self) -> AggregateReport {
        self.skipped.sort_by_key(|s| s.date);
        AggregateReport {
            currencies: self.currencies,
            skipped: self.skipped,
        }
    }
}

/// Merge records into an existing mapping in place
pub fn merge<I>(existing: &mut AggregateMap, records: I)
where
    I: IntoIterator<Item = CurrencyRecord>,
{
    for record in records {
        let observation = Observation {
            rate: record.rate,
            date: record.observed_date,
        };

        match existing.get_mut(&record.code) {
            Some(aggregate) => aggregate.observations.push(observation),
            None => {
                existing.insert(
                    record.code,
                    CurrencyAggregate::new(record.display_name, observation),
                );
            }
        }
    }
}

/// Final result of a run
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateReport {
    currencies: AggregateMap,
    skipped: Vec<SkippedDate>,
}

impl AggregateReport {
    /// Aggregates keyed by currency
    pub fn currencies(&self) -> &AggregateMap {
        &self.currencies
    }

    /// Aggregate for one currency
    pub fn get(&self, code: &str) -> Option<&CurrencyAggregate> {
        self.currencies.get(code)
    }

    /// Statistics for every currency, in first-seen order
    pub fn stats(&self) -> Vec<CurrencyStats> {
        self.currencies
            .iter()
            .map(|(code, aggregate)| aggregate.stats(code))
            .collect()
    }

    /// Days left out under the skip policy, in date order
    pub fn skipped(&self) -> &[SkippedDate] {
        &self.skipped
    }

    /// Number of currencies in the report
    pub fn len(&self) -> usize {
        self.currencies.len()
    }

    /// Whether the report holds no currencies
    pub fn is_empty(&self) -> bool {
        self.currencies.is_empty()
    }
}

impl std::fmt::Display for SkippedDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", format_date(self.date), self.reason)
    }
}
