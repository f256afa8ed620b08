// In-memory tabular representation shared by the loader, the normalizers,
// and the persistence sink. Columns are ordered; cells are dynamically typed
// with an explicit missing marker so sentinel substitution and
// missing-propagating arithmetic stay first-class.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;

use crate::error::LoaderError;

// ============================================================================
// CELL VALUES
// ============================================================================

/// One cell of a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Missing,
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

static MISSING: Value = Value::Missing;

impl Value {
    pub fn text(s: &str) -> Value {
        Value::Text(s.to_string())
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    /// Missing-propagating addition: a sum with a missing operand is missing.
    pub fn add(&self, other: &Value) -> Value {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => Value::Number(a + b),
            _ => Value::Missing,
        }
    }

    /// First day of the month for date values, missing for everything else.
    pub fn month_start(&self) -> Value {
        match self {
            Value::Date(d) => Value::Date(
                NaiveDate::from_ymd_opt(d.year(), d.month(), 1).unwrap_or(*d),
            ),
            _ => Value::Missing,
        }
    }

    /// Canonical text form, used for fingerprinting and diagnostics.
    /// Whole numbers render without a decimal point so an identifier that
    /// arrived as `522322315.0` round-trips to its digit form.
    pub fn render(&self) -> String {
        match self {
            Value::Missing => String::new(),
            Value::Text(s) => s.clone(),
            Value::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
            Value::Date(d) => d.format("%Y-%m-%d").to_string(),
        }
    }
}

// ============================================================================
// ROW VIEW
// ============================================================================

/// Borrowed view of one row, with cells addressable by column name.
pub struct RowView<'a> {
    columns: &'a [String],
    cells: &'a [Value],
}

impl<'a> RowView<'a> {
    /// Cell for `name`; unknown columns read as missing.
    pub fn get(&self, name: &str) -> &'a Value {
        match self.columns.iter().position(|c| c == name) {
            Some(idx) => &self.cells[idx],
            None => &MISSING,
        }
    }
}

// ============================================================================
// TABLE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Table {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    fn require_column(&self, name: &str) -> Result<usize, LoaderError> {
        self.column_index(name).ok_or_else(|| LoaderError::UnknownColumn {
            column: name.to_string(),
        })
    }

    pub fn push_row(&mut self, row: Vec<Value>) -> Result<(), LoaderError> {
        if row.len() != self.columns.len() {
            return Err(LoaderError::RowArity {
                expected: self.columns.len(),
                found: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|cells| &cells[idx])
    }

    /// Exact ordered column-set check against a documented source schema.
    pub fn check_columns(
        &self,
        dataset: &'static str,
        expected: &[&str],
    ) -> Result<(), LoaderError> {
        if self.columns.iter().map(String::as_str).eq(expected.iter().copied()) {
            return Ok(());
        }
        Err(LoaderError::SchemaMismatch {
            dataset,
            expected: expected.iter().map(|c| c.to_string()).collect(),
            found: self.columns.clone(),
        })
    }

    /// Rename columns through a fixed lookup table. Names not present in the
    /// mapping are kept as-is.
    pub fn rename_columns(&mut self, mapping: &[(&str, &str)]) {
        for column in &mut self.columns {
            if let Some((_, to)) = mapping.iter().find(|(from, _)| from == column) {
                *column = to.to_string();
            }
        }
    }

    /// Keep only rows matching the predicate.
    pub fn retain_rows<F>(&mut self, predicate: F)
    where
        F: Fn(&RowView) -> bool,
    {
        let columns = std::mem::take(&mut self.columns);
        self.rows.retain(|cells| {
            predicate(&RowView {
                columns: &columns,
                cells,
            })
        });
        self.columns = columns;
    }

    /// Rewrite one column cell by cell.
    pub fn apply<F>(&mut self, column: &str, f: F) -> Result<(), LoaderError>
    where
        F: Fn(&Value) -> Value,
    {
        let idx = self.require_column(column)?;
        for row in &mut self.rows {
            row[idx] = f(&row[idx]);
        }
        Ok(())
    }

    /// Fallible form of `apply`, for the identifier repair functions. The
    /// first cell that fails aborts the whole transform.
    pub fn try_apply<F>(&mut self, column: &str, f: F) -> Result<(), LoaderError>
    where
        F: Fn(&Value) -> Result<Value, LoaderError>,
    {
        let idx = self.require_column(column)?;
        for row in &mut self.rows {
            row[idx] = f(&row[idx])?;
        }
        Ok(())
    }

    /// Append a computed column. The closure sees each row through a
    /// `RowView`; an explicit loop produces the new column.
    pub fn derive<F>(&mut self, name: &str, f: F)
    where
        F: Fn(&RowView) -> Value,
    {
        let mut derived = Vec::with_capacity(self.rows.len());
        for cells in &self.rows {
            derived.push(f(&RowView {
                columns: &self.columns,
                cells,
            }));
        }
        self.columns.push(name.to_string());
        for (row, value) in self.rows.iter_mut().zip(derived) {
            row.push(value);
        }
    }

    /// Map every text cell equal to one of the sentinel tokens to missing.
    pub fn replace_all(&mut self, sentinels: &[&str]) {
        for row in &mut self.rows {
            for cell in row.iter_mut() {
                if let Value::Text(s) = cell {
                    if sentinels.contains(&s.as_str()) {
                        *cell = Value::Missing;
                    }
                }
            }
        }
    }

    /// Drop exact-duplicate rows (all cells equal), keeping first occurrence.
    pub fn dedup_rows(&mut self) {
        let mut seen = HashSet::new();
        self.rows.retain(|cells| seen.insert(fingerprint(cells)));
    }

    /// Project to the given columns, in the given order.
    pub fn select(&self, columns: &[&str]) -> Result<Table, LoaderError> {
        let mut indices = Vec::with_capacity(columns.len());
        for name in columns {
            indices.push(self.require_column(name)?);
        }
        let rows = self
            .rows
            .iter()
            .map(|cells| indices.iter().map(|&i| cells[i].clone()).collect())
            .collect();
        Ok(Table {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
        })
    }
}

/// Row identity for exact-duplicate detection. The tag byte keeps a text
/// cell distinct from a number that renders to the same digits.
fn fingerprint(cells: &[Value]) -> String {
    let mut hasher = Sha256::new();
    for cell in cells {
        let tag = match cell {
            Value::Missing => "m",
            Value::Text(_) => "t",
            Value::Number(_) => "n",
            Value::Date(_) => "d",
        };
        hasher.update(tag);
        hasher.update(cell.render());
        hasher.update([0x1f]);
    }
    format!("{:x}", hasher.finalize())
}

// ============================================================================
// TESTS
// ============================================================================
