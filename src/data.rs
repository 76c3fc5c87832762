//! CSV ingestion and row-level cleaning.
//!
//! Cleaning is a chain of pure transforms over the loaded frame; each step
//! returns a new `DataFrame` so the stages stay independently testable.

use std::path::Path;

use polars::prelude::*;

use crate::error::Error;
use crate::Result;

/// Columns every incident extract must carry.
pub const REQUIRED_COLUMNS: [&str; 4] = ["Year", "Date", "Latitude", "Longitude"];

/// Placeholder tokens treated as missing once text has been lower-cased.
pub const PLACEHOLDER_TOKENS: [&str; 2] = ["na", "unknown"];

/// Read a comma-delimited incident extract with a header row.
///
/// Fails with [`Error::FileFormat`] when the file cannot be read or parsed,
/// or when any of [`REQUIRED_COLUMNS`] is absent. An unreadable file is never
/// silently turned into an empty dataset.
pub fn load_dataset(path: &Path) -> Result<DataFrame> {
    let file_format = |reason: String| Error::FileFormat {
        path: path.to_path_buf(),
        reason,
    };

    let df = CsvReader::from_path(path)
        .map_err(|e| file_format(e.to_string()))?
        .has_header(true)
        .finish()
        .map_err(|e| file_format(e.to_string()))?;

    let names = df.get_column_names();
    for required in REQUIRED_COLUMNS {
        if !names.contains(&required) {
            return Err(file_format(format!("missing expected column {required:?}")));
        }
    }

    log::debug!(
        "loaded {} rows x {} columns from {}",
        df.height(),
        df.width(),
        path.display()
    );
    Ok(df)
}

/// Run the full cleaning chain: dedup, drop incomplete rows, lower-case
/// text, blank placeholder tokens.
///
/// Placeholder blanking runs after the incomplete-row drop, so a row whose
/// only missing values are introduced by that final step stays in the frame
/// with nulls in place of the tokens.
pub fn clean_dataset(df: &DataFrame) -> Result<DataFrame> {
    let deduped = drop_duplicates(df)?;
    let complete = drop_missing(&deduped)?;
    let lowered = lowercase_text(&complete)?;
    let cleaned = blank_placeholders(&lowered)?;
    log::debug!("cleaned: {} of {} rows kept", cleaned.height(), df.height());
    Ok(cleaned)
}

/// Remove rows that are exact duplicates of an earlier row, keeping first
/// occurrence order.
pub fn drop_duplicates(df: &DataFrame) -> Result<DataFrame> {
    Ok(df.unique_stable(None, UniqueKeepStrategy::First, None)?)
}

/// Remove rows containing a null in any column.
pub fn drop_missing(df: &DataFrame) -> Result<DataFrame> {
    let mut mask: Option<BooleanChunked> = None;
    for column in df.get_columns() {
        let not_null = column.is_not_null();
        mask = Some(match mask {
            Some(acc) => &acc & &not_null,
            None => not_null,
        });
    }
    match mask {
        Some(mask) => Ok(df.filter(&mask)?),
        None => Ok(df.clone()),
    }
}

/// Lower-case every string-typed column's values. Other dtypes pass through.
pub fn lowercase_text(df: &DataFrame) -> Result<DataFrame> {
    let columns = df
        .get_columns()
        .iter()
        .map(|series| {
            if series.dtype() == &DataType::Utf8 {
                let mut lowered = series.utf8()?.to_lowercase();
                lowered.rename(series.name());
                Ok(lowered.into_series())
            } else {
                Ok(series.clone())
            }
        })
        .collect::<PolarsResult<Vec<Series>>>()?;
    Ok(DataFrame::new(columns)?)
}

/// Replace values exactly equal to a placeholder token with null.
pub fn blank_placeholders(df: &DataFrame) -> Result<DataFrame> {
    let columns = df
        .get_columns()
        .iter()
        .map(|series| {
            if series.dtype() == &DataType::Utf8 {
                let mut blanked: Utf8Chunked = series
                    .utf8()?
                    .into_iter()
                    .map(|value| value.filter(|v| !PLACEHOLDER_TOKENS.contains(v)))
                    .collect();
                blanked.rename(series.name());
                Ok(blanked.into_series())
            } else {
                Ok(series.clone())
            }
        })
        .collect::<PolarsResult<Vec<Series>>>()?;
    Ok(DataFrame::new(columns)?)
}
