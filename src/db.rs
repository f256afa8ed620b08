// Persistence sink: connection factory plus the generic append.
//
// Policy: a constraint violation on a single row (duplicate primary key) is
// counted, logged as a truncated diagnostic, and swallowed; the batch call
// still returns Ok. Every other store error aborts the call. The skipped
// count in `AppendReport` is the structured partial-failure surface.

use anyhow::{Context, Result};
use rusqlite::{params_from_iter, Connection, ErrorCode};
use tracing::warn;

use crate::config::LoaderConfig;
use crate::error::LoaderError;
use crate::table::{Table, Value};

/// Outcome of one batch append. `skipped` counts rows the store rejected
/// with a constraint violation; those do not fail the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppendReport {
    pub inserted: usize,
    pub skipped: usize,
}

/// Open the configured store fresh for one invocation. Connections are not
/// pooled or reused across calls.
pub fn connect(config: &LoaderConfig) -> Result<Connection> {
    Connection::open(&config.database)
        .with_context(|| format!("failed to open database: {}", config.database.display()))
}

/// Append every row of `data` to `destination`, creating the table with an
/// inferred schema when it does not exist yet.
pub fn append_table(
    conn: &Connection,
    data: &Table,
    destination: &str,
) -> Result<AppendReport> {
    if destination.trim().is_empty() {
        return Err(LoaderError::InvalidDestination.into());
    }

    let quoted_columns: Vec<String> =
        data.columns().iter().map(|c| quote_ident(c)).collect();

    let column_defs = quoted_columns
        .iter()
        .enumerate()
        .map(|(idx, name)| format!("{} {}", name, infer_sql_type(data, idx)))
        .collect::<Vec<_>>()
        .join(", ");
    conn.execute(
        &format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            quote_ident(destination),
            column_defs
        ),
        [],
    )
    .with_context(|| format!("failed to create destination table '{}'", destination))?;

    let placeholders = (1..=data.width())
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ");
    let mut stmt = conn
        .prepare(&format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(destination),
            quoted_columns.join(", "),
            placeholders
        ))
        .with_context(|| format!("failed to prepare insert for '{}'", destination))?;

    let mut report = AppendReport {
        inserted: 0,
        skipped: 0,
    };
    for row in data.rows() {
        let result = stmt.execute(params_from_iter(row.iter().map(bind_value)));
        match result {
            Ok(_) => report.inserted += 1,
            Err(rusqlite::Error::SqliteFailure(err, message))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                report.skipped += 1;
                warn!(
                    destination,
                    diagnostic = %truncate_diagnostic(
                        message.as_deref().unwrap_or("constraint violation")
                    ),
                    "row rejected by store constraint"
                );
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("failed to append row to '{}'", destination))
            }
        }
    }
    Ok(report)
}

fn bind_value(value: &Value) -> rusqlite::types::Value {
    match value {
        Value::Missing => rusqlite::types::Value::Null,
        Value::Text(s) => rusqlite::types::Value::Text(s.clone()),
        Value::Number(n) => rusqlite::types::Value::Real(*n),
        Value::Date(d) => rusqlite::types::Value::Text(d.format("%Y-%m-%d").to_string()),
    }
}

/// First non-missing value in the column decides the affinity; an entirely
/// missing column falls back to TEXT.
fn infer_sql_type(data: &Table, column: usize) -> &'static str {
    for row in data.rows() {
        match &row[column] {
            Value::Number(_) => return "REAL",
            Value::Date(_) => return "DATE",
            Value::Text(_) => return "TEXT",
            Value::Missing => continue,
        }
    }
    "TEXT"
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Store diagnostics repeat the failing statement after the first line;
/// keep only the short form.
fn truncate_diagnostic(message: &str) -> String {
    const MAX_LEN: usize = 120;
    let first_line = message.lines().next().unwrap_or(message);
    if first_line.len() > MAX_LEN {
        let prefix: String = first_line.chars().take(MAX_LEN).collect();
        format!("{}...", prefix)
    } else {
        first_line.to_string()
    }
}

// ============================================================================
// TESTS
// ============================================================================
