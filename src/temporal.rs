//! Timestamp parsing and calendar-bucket aggregation.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDateTime};
use polars::prelude::*;

use crate::error::Error;
use crate::Result;

/// Source timestamp layout, e.g. `01/05/2015 01:00:00 AM`. Parsing accepts
/// the lower-cased am/pm the cleaner produces.
pub const TIMESTAMP_FORMAT: &str = "%m/%d/%Y %I:%M:%S %p";

/// Incident count for one (year, month) bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthlyCount {
    pub year: i32,
    pub month: u32,
    pub count: usize,
}

/// One year of the year-by-month table; `by_month` runs Jan..Dec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearRow {
    pub year: i32,
    pub by_month: [usize; 12],
}

/// Parse the `Date` column under [`TIMESTAMP_FORMAT`].
///
/// A null or non-conforming value is a defect introduced upstream, so it
/// fails the run with [`Error::Parse`] instead of being dropped.
pub fn parse_timestamps(df: &DataFrame) -> Result<Vec<NaiveDateTime>> {
    let dates = df.column("Date")?;
    let ca = dates.utf8().map_err(|_| Error::Parse {
        row: 0,
        value: format!("Date column of type {}", dates.dtype()),
        expected: String::from("text timestamps"),
    })?;

    let mut parsed = Vec::with_capacity(ca.len());
    for (row, value) in ca.into_iter().enumerate() {
        let raw = value.ok_or_else(|| Error::Parse {
            row,
            value: String::from("<null>"),
            expected: TIMESTAMP_FORMAT.to_string(),
        })?;
        let stamp = NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT).map_err(|_| {
            Error::Parse {
                row,
                value: raw.to_string(),
                expected: TIMESTAMP_FORMAT.to_string(),
            }
        })?;
        parsed.push(stamp);
    }
    log::debug!("parsed {} timestamps", parsed.len());
    Ok(parsed)
}

/// Month-level incident counts in chronological order.
///
/// Months with no incidents are absent from the series; callers needing a
/// dense calendar must fill zeros themselves.
pub fn monthly_counts(stamps: &[NaiveDateTime]) -> Vec<MonthlyCount> {
    let mut buckets: BTreeMap<(i32, u32), usize> = BTreeMap::new();
    for stamp in stamps {
        *buckets.entry((stamp.year(), stamp.month())).or_insert(0) += 1;
    }
    buckets
        .into_iter()
        .map(|((year, month), count)| MonthlyCount { year, month, count })
        .collect()
}

/// Per-year incident counts in chronological order.
pub fn yearly_counts(stamps: &[NaiveDateTime]) -> Vec<(i32, usize)> {
    let mut buckets: BTreeMap<i32, usize> = BTreeMap::new();
    for stamp in stamps {
        *buckets.entry(stamp.year()).or_insert(0) += 1;
    }
    buckets.into_iter().collect()
}

/// Year-by-month cross-tabulation, months as a fixed Jan..Dec cycle
/// independent of year.
pub fn month_crosstab(stamps: &[NaiveDateTime]) -> Vec<YearRow> {
    let mut rows: BTreeMap<i32, [usize; 12]> = BTreeMap::new();
    for stamp in stamps {
        rows.entry(stamp.year()).or_insert([0; 12])[stamp.month0() as usize] += 1;
    }
    rows.into_iter()
        .map(|(year, by_month)| YearRow { year, by_month })
        .collect()
}
