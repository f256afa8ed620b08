// Natural gas extracts: billing lines and the account registry. Gas
// accounts were renumbered to a hyphenated 10-5 form partway through the
// portfolio's history, so every usage row carries both the original and
// (optionally) the new number; `current_account_number` coalesces them.

use anyhow::Result;
use std::path::Path;
use tracing::info;

use crate::config::LoaderConfig;
use crate::db::{append_table, connect, AppendReport};
use crate::error::LoaderError;
use crate::identifiers::{fix_new_account_number, restore_leading_zeros};
use crate::reader::{read_data, Dataset};
use crate::table::Table;

/// Source header → canonical name, in documented column order.
pub const NGAS_USAGE_COLUMNS: [(&str, &str); 10] = [
    ("ADDRESS", "address"),
    ("Address 2", "address2"),
    ("City", "city"),
    ("Account Number", "account_number"),
    ("New Account Number", "new_account_number"),
    ("Start Date", "service_period_start"),
    ("End Date", "service_period_stop"),
    ("Therms", "therms"),
    ("Utility Amount", "utility_amount"),
    ("Supplier Amount", "supplier_amount"),
];

const NGAS_USAGE_ORDER: [&str; 13] = [
    "account_number",
    "new_account_number",
    "current_account_number",
    "bill_month",
    "service_period_start",
    "service_period_stop",
    "therms",
    "utility_amount",
    "supplier_amount",
    "total_amount",
    "address",
    "address2",
    "city",
];

pub const NGAS_ACCOUNTS_COLUMNS: [&str; 6] = [
    "account_number",
    "ert_number",
    "install_date",
    "ert_install_date",
    "address",
    "city",
];

/// Tokens the gas vendor uses for "no value", in any column.
const NGAS_SENTINELS: [&str; 3] = ["-", "N/A", "#N/A"];

/// Clean a natural gas usage extract into its canonical 13-column form.
pub fn normalize_natural_gas(mut data: Table) -> Result<Table, LoaderError> {
    let expected: Vec<&str> = NGAS_USAGE_COLUMNS.iter().map(|(src, _)| *src).collect();
    data.check_columns("natural gas usage", &expected)?;

    data.rename_columns(&NGAS_USAGE_COLUMNS);
    data.replace_all(&NGAS_SENTINELS);

    data.apply("account_number", |v| restore_leading_zeros(v, 13))?;
    data.try_apply("new_account_number", fix_new_account_number)?;

    data.derive("bill_month", |row| {
        row.get("service_period_stop").month_start()
    });
    data.derive("total_amount", |row| {
        row.get("utility_amount").add(row.get("supplier_amount"))
    });
    // First non-missing candidate wins: the renumbered account when the
    // vendor issued one, the original otherwise.
    data.derive("current_account_number", |row| {
        let renumbered = row.get("new_account_number");
        if renumbered.is_missing() {
            row.get("account_number").clone()
        } else {
            renumbered.clone()
        }
    });

    data.dedup_rows();
    data.select(&NGAS_USAGE_ORDER)
}

/// Clean a natural gas account registry extract.
pub fn normalize_gas_accounts(mut data: Table) -> Result<Table, LoaderError> {
    data.check_columns("natural gas accounts", &NGAS_ACCOUNTS_COLUMNS)?;
    data.apply("account_number", |v| restore_leading_zeros(v, 13))?;
    data.apply("ert_number", |v| restore_leading_zeros(v, 9))?;
    data.dedup_rows();
    Ok(data)
}

/// Load a natural gas usage extract and append it to `ngas_usage`.
pub fn natural_gas_data_to_db(
    filepath: &Path,
    config: &LoaderConfig,
) -> Result<AppendReport> {
    let data = read_data(filepath, Dataset::GasUsage)?;
    let cleaned = normalize_natural_gas(data)?;
    let conn = connect(config)?;
    let report = append_table(&conn, &cleaned, "ngas_usage")?;
    info!(
        rows = cleaned.len(),
        inserted = report.inserted,
        skipped = report.skipped,
        "natural gas usage batch appended"
    );
    Ok(report)
}

/// Load a natural gas accounts extract and append it to `ngas_accounts`.
pub fn ngas_accounts_to_db(filepath: &Path, config: &LoaderConfig) -> Result<AppendReport> {
    let data = read_data(filepath, Dataset::GasAccounts)?;
    let cleaned = normalize_gas_accounts(data)?;
    let conn = connect(config)?;
    let report = append_table(&conn, &cleaned, "ngas_accounts")?;
    info!(
        rows = cleaned.len(),
        inserted = report.inserted,
        skipped = report.skipped,
        "natural gas accounts batch appended"
    );
    Ok(report)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Value;
    use chrono::NaiveDate;

    fn raw_usage_table() -> Table {
        let sources: Vec<&str> = NGAS_USAGE_COLUMNS.iter().map(|(src, _)| *src).collect();
        Table::new(sources)
    }

    fn usage_row(
        account: &str,
        new_account: Value,
        stop: Value,
        utility: Value,
        supplier: Value,
    ) -> Vec<Value> {
        vec![
            Value::text("200 E Randolph St"),
            Value::Missing,
            Value::text("Chicago"),
            Value::text(account),
            new_account,
            Value::Date(NaiveDate::from_ymd_opt(2023, 3, 2).unwrap()),
            stop,
            Value::Number(40.0),
            utility,
            supplier,
        ]
    }

    #[test]
    fn test_normalize_gas_canonical_shape() {
        let mut data = raw_usage_table();
        data.push_row(usage_row(
            "5120616155807",
            Value::text("522322315-2"),
            Value::Date(NaiveDate::from_ymd_opt(2023, 3, 28).unwrap()),
            Value::Number(100.0),
            Value::Number(25.0),
        ))
        .unwrap();

        let cleaned = normalize_natural_gas(data).unwrap();
        assert_eq!(cleaned.width(), 13);
        assert_eq!(
            cleaned.columns(),
            &[
                "account_number",
                "new_account_number",
                "current_account_number",
                "bill_month",
                "service_period_start",
                "service_period_stop",
                "therms",
                "utility_amount",
                "supplier_amount",
                "total_amount",
                "address",
                "address2",
                "city",
            ]
        );
        assert_eq!(
            cleaned.get(0, "new_account_number"),
            Some(&Value::text("0522322315-00002"))
        );
        assert_eq!(
            cleaned.get(0, "bill_month"),
            Some(&Value::Date(NaiveDate::from_ymd_opt(2023, 3, 1).unwrap()))
        );
        assert_eq!(cleaned.get(0, "total_amount"), Some(&Value::Number(125.0)));
    }

    #[test]
    fn test_current_account_number_prefers_renumbered() {
        let mut data = raw_usage_table();
        data.push_row(usage_row(
            "5120616155807",
            Value::text("522322315-244"),
            Value::Date(NaiveDate::from_ymd_opt(2023, 3, 28).unwrap()),
            Value::Number(1.0),
            Value::Number(1.0),
        ))
        .unwrap();

        let cleaned = normalize_natural_gas(data).unwrap();
        assert_eq!(
            cleaned.get(0, "current_account_number"),
            Some(&Value::text("0522322315-00244"))
        );
    }

    #[test]
    fn test_missing_supplier_amount_scenario() {
        // utility_amount = 100, supplier_amount missing: the total is
        // missing and the current account falls back to account_number.
        let mut data = raw_usage_table();
        data.push_row(usage_row(
            "616155807",
            Value::Missing,
            Value::Date(NaiveDate::from_ymd_opt(2023, 3, 28).unwrap()),
            Value::Number(100.0),
            Value::Missing,
        ))
        .unwrap();

        let cleaned = normalize_natural_gas(data).unwrap();
        assert!(cleaned.get(0, "total_amount").unwrap().is_missing());
        assert_eq!(
            cleaned.get(0, "current_account_number"),
            Some(&Value::text("0000616155807"))
        );
    }

    #[test]
    fn test_sentinels_replaced_everywhere() {
        let mut data = raw_usage_table();
        data.push_row(usage_row(
            "1",
            Value::Missing,
            Value::text("N/A"),
            Value::text("#N/A"),
            Value::Number(5.0),
        ))
        .unwrap();

        let cleaned = normalize_natural_gas(data).unwrap();
        // The sentinel period-stop no longer yields a bill month.
        assert!(cleaned.get(0, "bill_month").unwrap().is_missing());
        assert!(cleaned.get(0, "utility_amount").unwrap().is_missing());
        assert!(cleaned.get(0, "total_amount").unwrap().is_missing());
    }

    #[test]
    fn test_exact_duplicates_removed_after_cleaning() {
        let mut data = raw_usage_table();
        let stop = Value::Date(NaiveDate::from_ymd_opt(2023, 3, 28).unwrap());
        data.push_row(usage_row(
            "1",
            Value::Missing,
            stop.clone(),
            Value::Number(1.0),
            Value::Number(2.0),
        ))
        .unwrap();
        data.push_row(usage_row(
            "1",
            Value::Missing,
            stop.clone(),
            Value::Number(1.0),
            Value::Number(2.0),
        ))
        .unwrap();
        data.push_row(usage_row(
            "1",
            Value::Missing,
            stop,
            Value::Number(1.0),
            Value::Number(3.0),
        ))
        .unwrap();

        let cleaned = normalize_natural_gas(data).unwrap();
        assert_eq!(cleaned.len(), 2);
    }

    #[test]
    fn test_schema_mismatch_names_dataset() {
        let data = Table::new(["ADDRESS", "City"]);
        let err = normalize_natural_gas(data).unwrap_err();
        match err {
            LoaderError::SchemaMismatch { dataset, .. } => {
                assert_eq!(dataset, "natural gas usage")
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_normalize_gas_accounts_pads_both_identifiers() {
        let mut data = Table::new(NGAS_ACCOUNTS_COLUMNS);
        let install = Value::Date(NaiveDate::from_ymd_opt(2019, 8, 1).unwrap());
        let row = vec![
            Value::text("616155807"),
            Value::Number(1234567.0),
            install.clone(),
            install,
            Value::text("200 E Randolph St"),
            Value::text("Chicago"),
        ];
        data.push_row(row.clone()).unwrap();
        data.push_row(row).unwrap();

        let cleaned = normalize_gas_accounts(data).unwrap();
        assert_eq!(cleaned.len(), 1);
        assert_eq!(
            cleaned.get(0, "account_number"),
            Some(&Value::text("0000616155807"))
        );
        assert_eq!(cleaned.get(0, "ert_number"), Some(&Value::text("001234567")));
    }
}
