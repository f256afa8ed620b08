// Facilities Dataloader - Core Library
// Batch transform-and-append pipeline for facilities portfolio extracts:
// buildings, electricity and natural gas invoices, and account registries.

pub mod buildings;
pub mod config;
pub mod db;
pub mod electricity;
pub mod error;
pub mod identifiers;
pub mod natural_gas;
pub mod reader;
pub mod table;
pub mod table_manager;

// Re-export commonly used types
pub use buildings::{buildings_data_to_db, normalize_buildings};
pub use config::LoaderConfig;
pub use db::{append_table, connect, AppendReport};
pub use electricity::{
    elec_accounts_to_db, electricity_data_to_db, normalize_elec_accounts,
    normalize_electricity,
};
pub use error::LoaderError;
pub use identifiers::{fix_invoice_id, fix_new_account_number, restore_leading_zeros};
pub use natural_gas::{
    natural_gas_data_to_db, ngas_accounts_to_db, normalize_gas_accounts,
    normalize_natural_gas,
};
pub use reader::{read_data, read_data_with_delimiter, Dataset};
pub use table::{RowView, Table, Value};
pub use table_manager::{create_tables, drop_tables, process_sql_statements};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
