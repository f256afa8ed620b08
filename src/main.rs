use anyhow::Result;
use clap::Parser;
use std::io::{self, Write};
use std::path::PathBuf;

use facilities_dataloader::{
    buildings_data_to_db, create_tables, drop_tables, elec_accounts_to_db,
    electricity_data_to_db, natural_gas_data_to_db, ngas_accounts_to_db, AppendReport,
    LoaderConfig,
};

/// Upload facilities operations building and energy use data.
#[derive(Parser, Debug)]
#[command(name = "facilities-dataloader", version)]
struct Args {
    /// Path to the loader configuration (TOML)
    #[arg(long, default_value = "loader.toml")]
    config: PathBuf,

    /// Create destination tables from the configured DDL directory
    #[arg(long)]
    create_tables: bool,

    /// Drop destination tables (asks for confirmation first)
    #[arg(long)]
    drop_tables: bool,

    /// Load a buildings extract
    #[arg(long, value_name = "FILE")]
    load_buildings: Option<PathBuf>,

    /// Load an electricity usage extract
    #[arg(long, value_name = "FILE")]
    load_elec: Option<PathBuf>,

    /// Load an electricity accounts extract
    #[arg(long, value_name = "FILE")]
    load_elec_accounts: Option<PathBuf>,

    /// Load a natural gas usage extract
    #[arg(long, value_name = "FILE")]
    load_ngas: Option<PathBuf>,

    /// Load a natural gas accounts extract
    #[arg(long, value_name = "FILE")]
    load_ngas_accounts: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = LoaderConfig::from_file(&args.config)?;

    if args.create_tables {
        create_tables(&config)?;
        println!("✓ Destination tables created");
    }

    if args.drop_tables {
        if confirm_drop()? {
            drop_tables(&config)?;
            println!("✓ Destination tables dropped");
        } else {
            println!("Process killed.");
        }
    }

    if let Some(path) = &args.load_buildings {
        report("buildings", buildings_data_to_db(path, &config)?);
    }

    if let Some(path) = &args.load_elec {
        report("elec_usage", electricity_data_to_db(path, &config)?);
    }

    if let Some(path) = &args.load_elec_accounts {
        report("elec_accounts", elec_accounts_to_db(path, &config)?);
    }

    if let Some(path) = &args.load_ngas {
        report("ngas_usage", natural_gas_data_to_db(path, &config)?);
    }

    if let Some(path) = &args.load_ngas_accounts {
        report("ngas_accounts", ngas_accounts_to_db(path, &config)?);
    }

    Ok(())
}

fn report(destination: &str, outcome: AppendReport) {
    println!(
        "✓ {}: {} rows appended, {} rejected by the store",
        destination, outcome.inserted, outcome.skipped
    );
}

fn confirm_drop() -> Result<bool> {
    print!(
        "WARNING: you are about to drop the buildings, usage, and account tables, \
         are you sure you want to continue? [y/n] "
    );
    io::stdout().flush()?;
    let mut response = String::new();
    io::stdin().read_line(&mut response)?;
    Ok(matches!(response.trim(), "y" | "Y" | "Yes"))
}
