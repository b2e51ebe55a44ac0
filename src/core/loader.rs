use crate::config::{SOURCE_CSV_FIELD, TEMPLATE_CSV_FIELD};
use crate::core::{Column, ColumnType, Dataset, Value};
use crate::utils::error::{ConvertError, Result};
use csv::{Reader, ReaderBuilder};
use std::collections::HashSet;
use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;

/// Number of leading data rows consulted when inferring column types.
///
/// Rows past this window are never looked at for inference, so a column that
/// only turns non-numeric late in the file is still typed as a number. Such
/// cells are kept verbatim as strings and a warning is logged.
pub const INFER_SCHEMA_LENGTH: usize = 1000;

/// Loads the source CSV, optionally keeping only `columns`.
///
/// Selected columns keep their file order.
pub fn load_source<P: AsRef<Path>>(path: P, columns: Option<&[String]>) -> Result<Dataset> {
    let path = path.as_ref();
    let mut reader = open_csv(path, "Source", SOURCE_CSV_FIELD)?;

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let selected: Vec<usize> = match columns {
        Some(wanted) => {
            let mut indices = Vec::with_capacity(wanted.len());
            for name in wanted {
                let idx = headers.iter().position(|h| h == name).ok_or_else(|| {
                    tracing::error!(
                        "Error: column '{}' requested from '{}' does not exist. Please check columns.source_subset in the configuration file.",
                        name,
                        path.display()
                    );
                    ConvertError::MissingColumn {
                        column: name.clone(),
                    }
                })?;
                indices.push(idx);
            }
            indices.sort_unstable();
            indices.dedup();
            indices
        }
        None => (0..headers.len()).collect(),
    };

    let mut raw_rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record?;
        raw_rows.push(
            selected
                .iter()
                .map(|&i| record.get(i).unwrap_or_default().to_string())
                .collect(),
        );
    }

    let mut schema = Vec::with_capacity(selected.len());
    for (pos, &idx) in selected.iter().enumerate() {
        let dtype = infer_column_type(
            raw_rows
                .iter()
                .take(INFER_SCHEMA_LENGTH)
                .map(|row| row[pos].as_str()),
        );
        tracing::debug!("Column '{}' inferred as {:?}", headers[idx], dtype);
        schema.push(Column {
            name: headers[idx].clone(),
            dtype,
        });
    }

    let mut warned: HashSet<usize> = HashSet::new();
    let rows: Vec<Vec<Value>> = raw_rows
        .into_iter()
        .enumerate()
        .map(|(row_no, row)| {
            row.into_iter()
                .enumerate()
                .map(|(pos, raw)| match Value::parse_as(&raw, schema[pos].dtype) {
                    Some(value) => value,
                    None => {
                        if warned.insert(pos) {
                            tracing::warn!(
                                "Column '{}' was inferred as {:?} from the first {} rows, but row {} holds '{}'; keeping such values as text",
                                schema[pos].name,
                                schema[pos].dtype,
                                INFER_SCHEMA_LENGTH,
                                row_no + 1,
                                raw
                            );
                        }
                        Value::Str(raw)
                    }
                })
                .collect()
        })
        .collect();

    let dataset = Dataset::new(schema, rows)?;
    tracing::debug!(
        "Loaded {} rows x {} columns from '{}'",
        dataset.row_count(),
        dataset.columns().len(),
        path.display()
    );
    Ok(dataset)
}

/// Reads only the header line of the template CSV.
pub fn load_header<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let path = path.as_ref();
    let mut reader = open_csv(path, "Template", TEMPLATE_CSV_FIELD)?;
    let headers = reader.headers()?.iter().map(str::to_string).collect();
    Ok(headers)
}

fn open_csv(path: &Path, label: &str, field: &str) -> Result<Reader<File>> {
    match File::open(path) {
        Ok(file) => Ok(ReaderBuilder::new().has_headers(true).from_reader(file)),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::error!(
                "Error: {} CSV file not found at '{}'. Please check {} in the configuration file.",
                label,
                path.display(),
                field
            );
            Err(ConvertError::FileNotFound {
                path: path.display().to_string(),
                field: field.to_string(),
            })
        }
        Err(e) => Err(ConvertError::IoError(e)),
    }
}

/// Narrowest type every non-empty sample fits: Bool, then Int, then Float.
/// Numbers that would not print back unchanged make the column `Str`.
fn infer_column_type<'a>(samples: impl Iterator<Item = &'a str>) -> ColumnType {
    let mut seen = false;
    let (mut is_bool, mut is_int, mut is_float) = (true, true, true);

    for raw in samples.filter(|s| !s.is_empty()) {
        seen = true;
        is_bool &= Value::parse_as(raw, ColumnType::Bool).is_some();
        is_int &= Value::parse_as(raw, ColumnType::Int).is_some();
        is_float &= Value::parse_as(raw, ColumnType::Float).is_some();
        if !(is_bool || is_int || is_float) {
            break;
        }
    }

    match (seen, is_bool, is_int, is_float) {
        (false, ..) => ColumnType::Str,
        (true, true, _, _) => ColumnType::Bool,
        (true, _, true, _) => ColumnType::Int,
        (true, _, _, true) => ColumnType::Float,
        _ => ColumnType::Str,
    }
}
