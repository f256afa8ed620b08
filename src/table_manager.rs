// Table lifecycle: sequential execution of raw DDL statements from a
// directory of .sql files. Provisioning only; the load paths never call
// this, and a failing statement does not roll back the ones before it.

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::LoaderConfig;
use crate::db::connect;

/// Split a .sql file into its individual statements. Statements end with
/// ';'; whatever trails the last semicolon is dropped.
pub fn process_sql_statements(path: &Path) -> Result<Vec<String>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read sql file: {}", path.display()))?;
    let statements = raw
        .replace('\n', " ")
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();
    Ok(statements)
}

/// Run every statement of every file, in order.
pub fn execute_sql_from_files(conn: &Connection, files: &[PathBuf]) -> Result<()> {
    for file in files {
        let statements = process_sql_statements(file)?;
        for statement in &statements {
            conn.execute_batch(statement)
                .with_context(|| format!("statement failed in {}", file.display()))?;
        }
        info!(file = %file.display(), statements = statements.len(), "sql file executed");
    }
    Ok(())
}

pub fn create_tables(config: &LoaderConfig) -> Result<()> {
    let conn = connect(config)?;
    let files = ddl_files_matching(config, "create")?;
    execute_sql_from_files(&conn, &files)
}

pub fn drop_tables(config: &LoaderConfig) -> Result<()> {
    let conn = connect(config)?;
    let files = ddl_files_matching(config, "drop")?;
    execute_sql_from_files(&conn, &files)
}

fn ddl_files_matching(config: &LoaderConfig, needle: &str) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(&config.ddl_directory).with_context(|| {
        format!(
            "failed to read ddl directory: {}",
            config.ddl_directory.display()
        )
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        let is_sql = path
            .extension()
            .map(|e| e.eq_ignore_ascii_case("sql"))
            .unwrap_or(false);
        if is_sql && name.contains(needle) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

// ============================================================================
// TESTS
// ============================================================================
