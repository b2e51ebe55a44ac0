use std::collections::HashSet;
use std::fmt;

use crate::utils::error::{ConvertError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Int,
    Float,
    Bool,
    Str,
}

/// A single typed cell. Empty CSV fields load as `Null`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Parses raw CSV text as `dtype`. `None` means the text does not fit.
    ///
    /// Numbers only fit when they print back to the same text, so values that
    /// would lose digits (20-digit ids, wei-scale amounts, `007`) stay text.
    pub fn parse_as(raw: &str, dtype: ColumnType) -> Option<Value> {
        if raw.is_empty() {
            return Some(Value::Null);
        }
        match dtype {
            ColumnType::Int => raw
                .parse::<i64>()
                .ok()
                .filter(|i| i.to_string() == raw)
                .map(Value::Int),
            ColumnType::Float => {
                let x = raw.parse::<f64>().ok().filter(|x| x.is_finite())?;
                let value = Value::Float(x);
                (x.to_string() == raw || value.to_string() == raw).then_some(value)
            }
            ColumnType::Bool => {
                if raw.eq_ignore_ascii_case("true") {
                    Some(Value::Bool(true))
                } else if raw.eq_ignore_ascii_case("false") {
                    Some(Value::Bool(false))
                } else {
                    None
                }
            }
            ColumnType::Str => Some(Value::Str(raw.to_string())),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Int(i) => write!(f, "{}", i),
            // 整數值的浮點數保留一位小數 (2.0 而不是 2)
            Value::Float(x) if x.is_finite() && x.fract() == 0.0 => {
                write!(f, "{:.1}", x)
            }
            Value::Float(x) => write!(f, "{}", x),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Str(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub dtype: ColumnType,
}

/// In-memory table threaded through load, transform and write.
///
/// Every row holds exactly one value per column, in column order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    columns: Vec<Column>,
    rows: Vec<Vec<Value>>,
}

impl Dataset {
    pub fn new(columns: Vec<Column>, rows: Vec<Vec<Value>>) -> Result<Self> {
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(ConvertError::DuplicateColumn {
                    column: column.name.clone(),
                });
            }
        }

        if let Some(pos) = rows.iter().position(|row| row.len() != columns.len()) {
            return Err(ConvertError::ProcessingError {
                message: format!(
                    "row {} has {} values but the dataset has {} columns",
                    pos,
                    rows[pos].len(),
                    columns.len()
                ),
            });
        }

        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    /// Values of one column, top to bottom.
    pub fn column_values(&self, name: &str) -> Option<impl Iterator<Item = &Value> + '_> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| &row[idx]))
    }

    /// Renames columns according to `(from, to)` pairs, all at once.
    ///
    /// Every `from` must exist. Columns not mentioned keep their name.
    pub fn rename<'a, I>(mut self, mapping: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut new_names: Vec<String> = self.columns.iter().map(|c| c.name.clone()).collect();

        for (from, to) in mapping {
            let idx = self
                .column_index(from)
                .ok_or_else(|| ConvertError::MissingColumn {
                    column: from.to_string(),
                })?;
            new_names[idx] = to.to_string();
        }

        let mut seen = HashSet::new();
        for name in &new_names {
            if !seen.insert(name.as_str()) {
                return Err(ConvertError::DuplicateColumn {
                    column: name.clone(),
                });
            }
        }

        for (column, name) in self.columns.iter_mut().zip(new_names) {
            column.name = name;
        }
        Ok(self)
    }

    /// Replaces the column called `name` in place, or appends it.
    pub fn with_column(mut self, name: &str, dtype: ColumnType, values: Vec<Value>) -> Result<Self> {
        if values.len() != self.rows.len() {
            return Err(ConvertError::ProcessingError {
                message: format!(
                    "column '{}' has {} values but the dataset has {} rows",
                    name,
                    values.len(),
                    self.rows.len()
                ),
            });
        }

        match self.column_index(name) {
            Some(idx) => {
                self.columns[idx].dtype = dtype;
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[idx] = value;
                }
            }
            None => {
                self.columns.push(Column {
                    name: name.to_string(),
                    dtype,
                });
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
        Ok(self)
    }

    /// Projects the dataset onto `header`, in header order.
    ///
    /// Header columns the dataset lacks come back as all-null `Str` columns;
    /// dataset columns outside the header are dropped.
    ///
    /// A header naming the same column twice fails with `DuplicateColumn`.
    pub fn conform_to(&self, header: &[String]) -> Result<Self> {
        let sources: Vec<Option<usize>> = header.iter().map(|h| self.column_index(h)).collect();

        let columns: Vec<Column> = header
            .iter()
            .zip(&sources)
            .map(|(name, src)| Column {
                name: name.clone(),
                dtype: src.map(|i| self.columns[i].dtype).unwrap_or(ColumnType::Str),
            })
            .collect();

        let rows: Vec<Vec<Value>> = self
            .rows
            .iter()
            .map(|row| {
                sources
                    .iter()
                    .map(|src| src.map(|i| row[i].clone()).unwrap_or(Value::Null))
                    .collect()
            })
            .collect();

        Self::new(columns, rows)
    }

    /// Header columns with no counterpart in this dataset.
    pub fn missing_columns<'a>(&self, header: &'a [String]) -> Vec<&'a str> {
        header
            .iter()
            .filter(|h| !self.has_column(h))
            .map(String::as_str)
            .collect()
    }
}
