use crate::core::{ColumnType, ConfigProvider, Dataset, Value};
use crate::utils::error::{ConvertError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::collections::{BTreeSet, HashMap};

pub const DATETIME_COLUMN: &str = "datetime";
pub const SOURCE_TYPE_COLUMN: &str = "source_type";
pub const DATE_COLUMN: &str = "Date";
pub const TYPE_COLUMN: &str = "Type";
pub const UNKNOWN_TYPE: &str = "Unknown";

/// Month and day without zero padding, e.g. `1/5/2024 09:30`.
pub const OUTPUT_DATE_FORMAT: &str = "%-m/%-d/%Y %H:%M";

/// Layouts tried, in order, when no date format is configured. The first one
/// matching the first non-empty value is used for the whole column.
const INFERRED_DATE_FORMATS: &[&str] = &[
    "%+",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
];

/// Renames columns, then derives `Date` from `datetime` and `Type` from
/// `source_type`. Row count and the order of existing columns are preserved.
pub fn transform<C: ConfigProvider + ?Sized>(data: Dataset, config: &C) -> Result<Dataset> {
    let data = rename_columns(data, config.column_map())?;
    let dates = convert_dates(&data, config.date_format())?;
    let types = map_types(&data, config.type_map())?;

    data.with_column(DATE_COLUMN, ColumnType::Str, dates)?
        .with_column(TYPE_COLUMN, ColumnType::Str, types)
}

pub fn rename_columns(data: Dataset, mapping: &HashMap<String, String>) -> Result<Dataset> {
    // 依鍵排序，讓錯誤訊息與結果可重現
    let mut pairs: Vec<(&str, &str)> = mapping
        .iter()
        .map(|(from, to)| (from.as_str(), to.as_str()))
        .collect();
    pairs.sort_unstable();

    data.rename(pairs).inspect_err(|e| match e {
        ConvertError::MissingColumn { column } => tracing::error!(
            "Error: Column '{}' specified in [mapping.columns] not found in source data. Please check your configuration file and source CSV.",
            column
        ),
        other => tracing::error!("Error: column rename failed: {}", other),
    })
}

/// Parses `datetime` with `format` and renders it as [`OUTPUT_DATE_FORMAT`].
///
/// Cells that do not parse become null. Fails only when there is at least one
/// non-empty cell and none of them parse.
pub fn convert_dates(data: &Dataset, format: &str) -> Result<Vec<Value>> {
    let cells = data
        .column_values(DATETIME_COLUMN)
        .ok_or_else(|| missing_column(DATETIME_COLUMN))?;
    let raw: Vec<Option<String>> = cells
        .map(|v| (!v.is_null()).then(|| v.to_string()))
        .collect();

    let format = if format.is_empty() {
        let inferred = raw
            .iter()
            .flatten()
            .next()
            .and_then(|first| {
                INFERRED_DATE_FORMATS
                    .iter()
                    .find(|f| parse_datetime(first, f).is_some())
            })
            .copied();
        if let Some(f) = inferred {
            tracing::debug!("Inferred date format '{}' for '{}'", f, DATETIME_COLUMN);
        }
        inferred.unwrap_or("")
    } else {
        format
    };

    let mut non_empty = 0usize;
    let mut parsed = 0usize;
    let values: Vec<Value> = raw
        .iter()
        .map(|cell| match cell {
            None => Value::Null,
            Some(text) => {
                non_empty += 1;
                match parse_datetime(text, format) {
                    Some(dt) => {
                        parsed += 1;
                        Value::Str(dt.format(OUTPUT_DATE_FORMAT).to_string())
                    }
                    None => Value::Null,
                }
            }
        })
        .collect();

    if non_empty > 0 && parsed == 0 {
        tracing::error!(
            "Error: Failed to parse dates in '{}' column with format '{}'. Check dates.format in the configuration file and source data values.",
            DATETIME_COLUMN,
            format
        );
        return Err(ConvertError::DateParseError {
            format: format.to_string(),
            column: DATETIME_COLUMN.to_string(),
        });
    }

    if parsed < non_empty {
        tracing::warn!(
            "{} of {} values in '{}' did not match '{}' and were left empty",
            non_empty - parsed,
            non_empty,
            DATETIME_COLUMN,
            format
        );
    }

    Ok(values)
}

/// Maps `source_type` through `mapping`; anything unmapped becomes `Unknown`.
pub fn map_types(data: &Dataset, mapping: &HashMap<String, String>) -> Result<Vec<Value>> {
    let cells = data
        .column_values(SOURCE_TYPE_COLUMN)
        .ok_or_else(|| missing_column(SOURCE_TYPE_COLUMN))?;

    let mut unmapped = BTreeSet::new();
    let values = cells
        .map(|cell| {
            let label = if cell.is_null() {
                None
            } else {
                let key = cell.to_string();
                let label = mapping.get(&key).cloned();
                if label.is_none() {
                    unmapped.insert(key);
                }
                label
            };
            Value::Str(label.unwrap_or_else(|| UNKNOWN_TYPE.to_string()))
        })
        .collect();

    if !unmapped.is_empty() {
        tracing::warn!(
            "Transaction types without a mapping (written as '{}'): {}",
            UNKNOWN_TYPE,
            unmapped.into_iter().collect::<Vec<_>>().join(", ")
        );
    }

    Ok(values)
}

fn missing_column(column: &str) -> ConvertError {
    tracing::error!(
        "Error: Column '{}' not found in source data. Please check [mapping.columns] in the configuration file and the source CSV.",
        column
    );
    ConvertError::MissingColumn {
        column: column.to_string(),
    }
}

/// Offsets are normalised to UTC; date-only layouts parse as midnight.
fn parse_datetime(text: &str, format: &str) -> Option<NaiveDateTime> {
    if format.is_empty() {
        return None;
    }
    if format == "%+" {
        if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
            return Some(dt.naive_utc());
        }
    }
    DateTime::parse_from_str(text, format)
        .map(|dt| dt.naive_utc())
        .or_else(|_| NaiveDateTime::parse_from_str(text, format))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(text, format)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}
