// Error taxonomy for the loader pipeline.
// Everything here is fatal and bubbles to the entry-point caller; the one
// store-level exception (constraint violations) is handled inside db.rs.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("input file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error(
        "dataset '{dataset}': loaded columns do not match the documented schema\n  expected: {expected:?}\n  found:    {found:?}"
    )]
    SchemaMismatch {
        dataset: &'static str,
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("malformed identifier '{value}': expected a single '-' separating prefix and suffix")]
    Format { value: String },

    /// Post-repair width invariant broken. A logic fault, never corrected.
    #[error("identifier repair produced an invalid width: {detail}")]
    InternalConsistency { detail: String },

    #[error("table has no column named '{column}'")]
    UnknownColumn { column: String },

    #[error("row has {found} cells but the table has {expected} columns")]
    RowArity { expected: usize, found: usize },

    #[error("destination table name must not be empty")]
    InvalidDestination,

    #[error("workbook has no readable sheet: {}", path.display())]
    EmptyWorkbook { path: PathBuf },

    #[error("failed to parse delimited file: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to read workbook: {0}")]
    Workbook(#[from] calamine::Error),
}
