// Electricity extracts: the invoice-line usage file and the account
// registry. Usage rows flagged for discard never reach the store; after
// cleaning, `invoice_id` is the batch key and is expected to be unique
// (enforced downstream by the destination's primary key).

use anyhow::Result;
use std::path::Path;
use tracing::info;

use crate::config::LoaderConfig;
use crate::db::{append_table, connect, AppendReport};
use crate::error::LoaderError;
use crate::identifiers::{fix_invoice_id, restore_leading_zeros};
use crate::reader::{read_data, Dataset};
use crate::table::{Table, Value};

/// Source header → canonical name, in documented column order.
pub const ELEC_USAGE_COLUMNS: [(&str, &str); 20] = [
    ("Funds", "funds"),
    ("NonConsec?", "nonconsec"),
    ("Discard?", "discard"),
    ("Num", "num"),
    ("ACCOUNTID", "account_id"),
    ("STATEMENTNO", "statement_number"),
    ("UDCACCTID", "account_number"),
    ("INVOICEID", "invoice_id"),
    ("INVOICEDATE", "invoice_date"),
    ("SERVICE_PERIOD_START", "service_period_start"),
    ("SERVICE_PERIOD_STOP", "service_period_stop"),
    ("BILLEDKWH", "billed_khw"),
    ("Peak kW", "peak_kw"),
    ("SUPPLY CHARGES", "supply_charges"),
    ("UDC CHARGES", "udc_charges"),
    ("Acctnum", "acctnum"),
    ("Cancel / Rebill?", "rebill"),
    ("STATENUM", "statenum"),
    ("BILL MO", "bill_month"),
    ("ACCTG MO", "acctg_month"),
];

/// Canonical output order; `total_charges` is derived on top of these.
const ELEC_USAGE_ORDER: [&str; 12] = [
    "invoice_id",
    "statement_number",
    "account_number",
    "bill_month",
    "acctg_month",
    "service_period_start",
    "service_period_stop",
    "rebill",
    "billed_khw",
    "peak_kw",
    "supply_charges",
    "udc_charges",
];

pub const ELEC_ACCOUNTS_COLUMNS: [&str; 5] = [
    "account_number",
    "account_name",
    "service_address",
    "rate",
    "vendor",
];

/// Vendor token for a demand reading spread over several meters.
const MULTIPLE_DEMANDS: &str = "Multiple Demands";

/// Clean an electricity usage extract into its canonical 13-column form.
pub fn normalize_electricity(mut data: Table) -> Result<Table, LoaderError> {
    let expected: Vec<&str> = ELEC_USAGE_COLUMNS.iter().map(|(src, _)| *src).collect();
    data.check_columns("electricity usage", &expected)?;

    // Rows the vendor flagged for removal are dropped before anything else.
    data.retain_rows(|row| !matches!(row.get("Discard?"), Value::Text(s) if s == "Y"));

    data.rename_columns(&ELEC_USAGE_COLUMNS);

    data.apply("account_number", |v| restore_leading_zeros(v, 10))?;
    data.try_apply("invoice_id", fix_invoice_id)?;
    data.apply("peak_kw", |v| match v {
        Value::Text(s) if s == MULTIPLE_DEMANDS => Value::Missing,
        other => other.clone(),
    })?;

    let mut data = data.select(&ELEC_USAGE_ORDER)?;
    data.derive("total_charges", |row| {
        row.get("supply_charges").add(row.get("udc_charges"))
    });
    Ok(data)
}

/// Clean an electricity account registry extract.
pub fn normalize_elec_accounts(mut data: Table) -> Result<Table, LoaderError> {
    data.check_columns("electricity accounts", &ELEC_ACCOUNTS_COLUMNS)?;
    data.apply("account_number", |v| restore_leading_zeros(v, 10))?;
    data.dedup_rows();
    Ok(data)
}

/// Load an electricity usage extract and append it to `elec_usage`.
pub fn electricity_data_to_db(
    filepath: &Path,
    config: &LoaderConfig,
) -> Result<AppendReport> {
    let data = read_data(filepath, Dataset::ElecUsage)?;
    let cleaned = normalize_electricity(data)?;
    let conn = connect(config)?;
    let report = append_table(&conn, &cleaned, "elec_usage")?;
    info!(
        rows = cleaned.len(),
        inserted = report.inserted,
        skipped = report.skipped,
        "electricity usage batch appended"
    );
    Ok(report)
}

/// Load an electricity accounts extract and append it to `elec_accounts`.
pub fn elec_accounts_to_db(filepath: &Path, config: &LoaderConfig) -> Result<AppendReport> {
    let data = read_data(filepath, Dataset::ElecAccounts)?;
    let cleaned = normalize_elec_accounts(data)?;
    let conn = connect(config)?;
    let report = append_table(&conn, &cleaned, "elec_accounts")?;
    info!(
        rows = cleaned.len(),
        inserted = report.inserted,
        skipped = report.skipped,
        "electricity accounts batch appended"
    );
    Ok(report)
}

// ============================================================================
// TESTS
// ============================================================================
