// Tabular loader. One read path for delimited text and one for spreadsheet
// workbooks; both land in the same `Table` representation. The only
// per-dataset knowledge here is the column type coercion map. No row
// filtering and no renaming, that is the normalizers' job.

use calamine::{open_workbook_auto, Data, DataType, Reader};
use chrono::NaiveDate;
use csv::ReaderBuilder;
use std::path::Path;

use crate::error::LoaderError;
use crate::table::{Table, Value};

// ============================================================================
// DATASETS
// ============================================================================

/// The five source extracts the loader understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dataset {
    Buildings,
    ElecUsage,
    ElecAccounts,
    GasUsage,
    GasAccounts,
}

impl Dataset {
    pub fn name(&self) -> &'static str {
        match self {
            Dataset::Buildings => "buildings",
            Dataset::ElecUsage => "electricity usage",
            Dataset::ElecAccounts => "electricity accounts",
            Dataset::GasUsage => "natural gas usage",
            Dataset::GasAccounts => "natural gas accounts",
        }
    }

    /// Columns that must keep their raw text form. Statement and account
    /// numbers look numeric but carry leading zeros.
    fn text_columns(&self) -> &'static [&'static str] {
        match self {
            Dataset::Buildings => &[
                "zipcode",
                "gr_sq_ft_location2",
                "nrel_bca_leed_analysis",
                "nrel_renewable_reopt_analysis",
                "retrocommision",
                "energy_assessment",
            ],
            Dataset::ElecUsage => &["STATEMENTNO"],
            Dataset::ElecAccounts => &["account_number"],
            Dataset::GasUsage => &["Account Number", "New Account Number"],
            Dataset::GasAccounts => &["account_number", "ert_number"],
        }
    }

    /// Columns parsed as calendar dates.
    fn date_columns(&self) -> &'static [&'static str] {
        match self {
            Dataset::Buildings => &[],
            Dataset::ElecUsage => &[
                "INVOICEDATE",
                "SERVICE_PERIOD_START",
                "SERVICE_PERIOD_STOP",
                "BILL MO",
                "ACCTG MO",
            ],
            Dataset::ElecAccounts => &[],
            Dataset::GasUsage => &["Start Date", "End Date"],
            Dataset::GasAccounts => &["install_date", "ert_install_date"],
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Coercion {
    Default,
    Text,
    Date,
}

fn column_coercions(headers: &[String], dataset: Dataset) -> Vec<Coercion> {
    headers
        .iter()
        .map(|header| {
            if dataset.text_columns().contains(&header.as_str()) {
                Coercion::Text
            } else if dataset.date_columns().contains(&header.as_str()) {
                Coercion::Date
            } else {
                Coercion::Default
            }
        })
        .collect()
}

// ============================================================================
// READ PATHS
// ============================================================================

/// Read a source extract into a `Table`, comma-delimited for text files.
pub fn read_data(path: &Path, dataset: Dataset) -> Result<Table, LoaderError> {
    read_data_with_delimiter(path, dataset, b',')
}

/// Same as `read_data` with a caller-specified delimiter for text files.
/// The delimiter is ignored for workbook formats.
pub fn read_data_with_delimiter(
    path: &Path,
    dataset: Dataset,
    delimiter: u8,
) -> Result<Table, LoaderError> {
    if !path.exists() {
        return Err(LoaderError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let delimited = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            e.eq_ignore_ascii_case("csv")
                || e.eq_ignore_ascii_case("tsv")
                || e.eq_ignore_ascii_case("txt")
        })
        .unwrap_or(false);

    if delimited {
        read_delimited(path, dataset, delimiter)
    } else {
        read_workbook(path, dataset)
    }
}

fn read_delimited(
    path: &Path,
    dataset: Dataset,
    delimiter: u8,
) -> Result<Table, LoaderError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .from_path(path)?;

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    let coercions = column_coercions(&headers, dataset);

    let mut table = Table::new(headers);
    for record in reader.records() {
        let record = record?;
        let row = record
            .iter()
            .zip(&coercions)
            .map(|(cell, coercion)| coerce_text(cell.trim(), *coercion))
            .collect();
        table.push_row(row)?;
    }
    Ok(table)
}

fn read_workbook(path: &Path, dataset: Dataset) -> Result<Table, LoaderError> {
    // calamine auto-detects the format: xls, xlsx, xlsb, ods
    let mut workbook = open_workbook_auto(path)?;
    let sheet_names = workbook.sheet_names().to_vec();
    let first_sheet = sheet_names.first().ok_or_else(|| LoaderError::EmptyWorkbook {
        path: path.to_path_buf(),
    })?;
    let range = workbook.worksheet_range(first_sheet)?;

    let mut rows = range.rows();
    let header_cells = rows.next().ok_or_else(|| LoaderError::EmptyWorkbook {
        path: path.to_path_buf(),
    })?;
    let headers: Vec<String> = header_cells
        .iter()
        .map(|cell| match cell {
            Data::String(s) => s.trim().to_string(),
            Data::Empty => String::new(),
            other => format!("{}", other),
        })
        .collect();
    let coercions = column_coercions(&headers, dataset);

    let mut table = Table::new(headers);
    for cells in rows {
        let row = cells
            .iter()
            .zip(&coercions)
            .map(|(cell, coercion)| coerce_cell(cell, *coercion))
            .collect();
        table.push_row(row)?;
    }
    Ok(table)
}

// ============================================================================
// CELL COERCION
// ============================================================================

/// Delimited-text cell: empty → missing; forced-text columns keep the raw
/// string; date columns parse when they can and pass the text through when
/// they cannot, so sentinel tokens survive until the normalizer maps them;
/// everything else becomes a number if it parses as one.
fn coerce_text(cell: &str, coercion: Coercion) -> Value {
    if cell.is_empty() {
        return Value::Missing;
    }
    match coercion {
        Coercion::Text => Value::Text(cell.to_string()),
        Coercion::Date => match parse_date(cell) {
            Some(d) => Value::Date(d),
            None => Value::Text(cell.to_string()),
        },
        Coercion::Default => match cell.parse::<f64>() {
            Ok(n) => Value::Number(n),
            Err(_) => Value::Text(cell.to_string()),
        },
    }
}

/// Workbook cell: typed cells map directly, with the same coercion
/// overrides as the text path.
fn coerce_cell(cell: &Data, coercion: Coercion) -> Value {
    if matches!(coercion, Coercion::Date) {
        if let Some(d) = cell.as_date() {
            return Value::Date(d);
        }
    }
    match cell {
        Data::Empty | Data::Error(_) => Value::Missing,
        Data::String(s) => coerce_text(s.trim(), coercion),
        Data::Float(f) => match coercion {
            Coercion::Text => Value::Text(Value::Number(*f).render()),
            _ => Value::Number(*f),
        },
        Data::Int(i) => match coercion {
            Coercion::Text => Value::Text(i.to_string()),
            _ => Value::Number(*i as f64),
        },
        Data::Bool(b) => Value::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ndt) => Value::Date(ndt.date()),
            None => Value::Missing,
        },
        Data::DateTimeIso(s) => match parse_date(s) {
            Some(d) => Value::Date(d),
            None => Value::Text(s.clone()),
        },
        Data::DurationIso(s) => Value::Text(s.clone()),
    }
}

fn parse_date(cell: &str) -> Option<NaiveDate> {
    for format in ["%Y-%m-%d", "%m/%d/%Y", "%m/%d/%y"] {
        if let Ok(d) = NaiveDate::parse_from_str(cell, format) {
            return Some(d);
        }
    }
    None
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".csv")
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let result = read_data(Path::new("/no/such/extract.csv"), Dataset::Buildings);
        assert!(matches!(result, Err(LoaderError::NotFound { .. })));
    }

    #[test]
    fn test_statement_number_stays_text() {
        let file = write_csv(
            "ACCOUNTID,STATEMENTNO,SUPPLY CHARGES\n77,0012345,100.5\n",
        );
        let table = read_data(file.path(), Dataset::ElecUsage).unwrap();
        assert_eq!(table.get(0, "STATEMENTNO"), Some(&Value::text("0012345")));
        assert_eq!(table.get(0, "ACCOUNTID"), Some(&Value::Number(77.0)));
        assert_eq!(table.get(0, "SUPPLY CHARGES"), Some(&Value::Number(100.5)));
    }

    #[test]
    fn test_date_coercion_parses_and_passes_sentinels_through() {
        let file = write_csv(
            "Account Number,Start Date,End Date\n123,2023-04-01,-\n",
        );
        let table = read_data(file.path(), Dataset::GasUsage).unwrap();
        assert_eq!(
            table.get(0, "Start Date"),
            Some(&Value::Date(NaiveDate::from_ymd_opt(2023, 4, 1).unwrap()))
        );
        // The "-" sentinel survives as text for the normalizer to map.
        assert_eq!(table.get(0, "End Date"), Some(&Value::text("-")));
        assert_eq!(table.get(0, "Account Number"), Some(&Value::text("123")));
    }

    #[test]
    fn test_empty_cells_are_missing() {
        let file = write_csv("account_number,account_name,service_address,rate,vendor\n42,,HQ,,\n");
        let table = read_data(file.path(), Dataset::ElecAccounts).unwrap();
        assert!(table.get(0, "account_name").unwrap().is_missing());
        assert!(table.get(0, "rate").unwrap().is_missing());
        assert_eq!(table.get(0, "account_number"), Some(&Value::text("42")));
    }

    #[test]
    fn test_us_date_format_parses() {
        let file = write_csv("Account Number,Start Date,End Date\n1,04/01/2023,04/30/2023\n");
        let table = read_data(file.path(), Dataset::GasUsage).unwrap();
        assert_eq!(
            table.get(0, "End Date"),
            Some(&Value::Date(NaiveDate::from_ymd_opt(2023, 4, 30).unwrap()))
        );
    }

    #[test]
    fn test_caller_specified_delimiter() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        file.write_all(b"a|b\n1|2\n").unwrap();
        let table =
            read_data_with_delimiter(file.path(), Dataset::Buildings, b'|').unwrap();
        assert_eq!(table.columns(), &["a".to_string(), "b".to_string()]);
        assert_eq!(table.get(0, "b"), Some(&Value::Number(2.0)));
    }
}
