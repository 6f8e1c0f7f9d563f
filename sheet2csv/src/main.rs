use anyhow::{Context, Result};
use clap::Parser;
use sheetprice_core::export;
use sheetprice_core::logging::{LogConfig, init_logging};
use sheetprice_core::read_table;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sheet2csv")]
#[command(about = "Export one worksheet of an Excel/ODS file to CSV", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the Excel/ODS file
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Output CSV file
    #[arg(short, long, default_value = "products.csv")]
    output: PathBuf,

    /// Worksheet to export (defaults to the first sheet)
    #[arg(short, long)]
    sheet: Option<String>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&LogConfig::from_verbosity(cli.verbose));

    let table = read_table(&cli.file, cli.sheet.as_deref())
        .with_context(|| format!("Failed to read file: {}", cli.file.display()))?;

    let rows = export::export_csv(&table, &cli.output)
        .with_context(|| format!("Failed to write {}", cli.output.display()))?;

    println!(
        "✓ Exported sheet '{}' ({} rows) to {}",
        table.sheet,
        rows,
        cli.output.display()
    );
    Ok(())
}
