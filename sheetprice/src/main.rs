use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use sheetprice_core::logging::{LogConfig, LogFormat, init_logging};
use sheetprice_core::{
    CatalogStore, Checkpoint, CheckpointTarget, ColumnLayout, ConnectionSettings, ImportConfig,
    MySqlCatalog, ReconcileOptions, Reconciler, RowEvent, RunSummary, Table, read_table,
};
use std::path::{Path, PathBuf};

mod formatter;

#[derive(Parser)]
#[command(name = "sheetprice")]
#[command(about = "Apply spreadsheet variant prices to a MySQL product catalog", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the Excel/ODS file with prices
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Path to configuration file (TOML)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Header naming convention of the sheet
    #[arg(short, long, value_enum)]
    layout: Option<LayoutArg>,

    /// Worksheet to read (defaults to the first sheet)
    #[arg(short, long)]
    sheet: Option<String>,

    /// Look up every row but write nothing
    #[arg(long)]
    dry_run: bool,

    /// Rows per transaction (0 commits once at the end)
    #[arg(long, value_name = "ROWS")]
    commit_every: Option<usize>,

    /// Checkpoint file recording the last committed row
    #[arg(long, value_name = "PATH")]
    checkpoint: Option<PathBuf>,

    /// Continue after the row recorded in the checkpoint
    #[arg(long)]
    resume: bool,

    /// Trim whitespace around product names and variant values
    #[arg(long)]
    trim_keys: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "human")]
    format: OutputFormat,

    /// Diagnostic log format (stderr)
    #[arg(long, value_enum, default_value = "compact")]
    log_format: LogFormatArg,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, ValueEnum)]
enum LayoutArg {
    /// Nombre, Variante, Precio Ciudad, Precio Interior, Precio Especial
    Catalog,
    /// Descripción del modelo, Descripcion, ciudad, interior, especial
    PriceList,
}

impl From<LayoutArg> for ColumnLayout {
    fn from(arg: LayoutArg) -> Self {
        match arg {
            LayoutArg::Catalog => ColumnLayout::Catalog,
            LayoutArg::PriceList => ColumnLayout::PriceList,
        }
    }
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable colored output
    Human,
    /// JSON summary for scripting
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormatArg {
    Compact,
    Json,
}

fn load_config(cli: &Cli) -> Result<ImportConfig> {
    let mut config = if let Some(config_path) = &cli.config {
        ImportConfig::from_file(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?
    } else {
        // Try to load default config from current directory if it exists
        let default_config_path = PathBuf::from("sheetprice.toml");
        if default_config_path.exists() {
            ImportConfig::from_file(&default_config_path).with_context(|| {
                format!(
                    "Failed to load config from {}",
                    default_config_path.display()
                )
            })?
        } else {
            ImportConfig::default()
        }
    };

    if let Some(layout) = cli.layout {
        config.layout = layout.into();
    }
    if let Some(sheet) = &cli.sheet {
        config.sheet = Some(sheet.clone());
    }
    if let Some(commit_every) = cli.commit_every {
        config.commit_every = commit_every;
    }
    if let Some(checkpoint) = &cli.checkpoint {
        config.checkpoint = Some(checkpoint.clone());
    }
    if cli.trim_keys {
        config.trim_keys = true;
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Absolute form of the input path, so checkpoints match however the file is named
fn checkpoint_source(file: &Path) -> Result<PathBuf> {
    std::fs::canonicalize(file).with_context(|| format!("Failed to resolve {}", file.display()))
}

/// Reconcile `table` against `store`, closing the store whether or not the run succeeds
async fn run_import<S, F>(
    store: &mut S,
    table: &Table,
    options: ReconcileOptions,
    on_event: F,
) -> Result<RunSummary>
where
    S: CatalogStore,
    F: FnMut(&RowEvent<'_>),
{
    let result = Reconciler::new(store, options).run(table, on_event).await;

    if let Err(e) = store.close().await {
        tracing::warn!(error = %e, "failed to close database connection");
    }
    Ok(result?)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();

    let log_format = match cli.log_format {
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    init_logging(&LogConfig::from_verbosity(cli.verbose).with_format(log_format));

    let config = load_config(&cli)?;

    if cli.resume && config.checkpoint.is_none() {
        anyhow::bail!("--resume needs a checkpoint file. Use --checkpoint <PATH> or set `checkpoint` in the config.");
    }

    let settings = ConnectionSettings::from_env(&config.database_url_env)
        .context("Invalid database configuration")?;

    let table = read_table(&cli.file, config.sheet.as_deref())
        .with_context(|| format!("Failed to read file: {}", cli.file.display()))?;

    let human = matches!(cli.format, OutputFormat::Human);
    if human {
        println!("Sheet: {}", table.sheet);
        println!("Total rows: {}", table.len());
    }

    let mut options = ReconcileOptions::from_config(&config);
    options.dry_run = cli.dry_run;
    if let Some(path) = &config.checkpoint {
        let source = checkpoint_source(&cli.file)?;
        if cli.resume {
            let checkpoint = Checkpoint::load_for(path, &source, &table.sheet)
                .context("Failed to load checkpoint")?;
            if let Some(checkpoint) = checkpoint {
                tracing::info!(row = checkpoint.last_committed_row, "resuming from checkpoint");
                if human {
                    println!(
                        "Resuming after row {} ({})",
                        checkpoint.last_committed_row,
                        path.display()
                    );
                }
                options.resume_after = Some(checkpoint.last_committed_row);
            }
        }
        if !cli.dry_run {
            options.checkpoint = Some(CheckpointTarget {
                path: path.clone(),
                source,
            });
        }
    }

    let mut store = MySqlCatalog::connect(&settings)
        .await
        .with_context(|| format!("Failed to connect to {}", settings))?;

    let printer = formatter::ProgressPrinter::new(config.not_found_details);
    let summary = run_import(&mut store, &table, options, |event| {
        if human {
            printer.print(event);
        }
    })
    .await
    .with_context(|| format!("Import of {} failed", cli.file.display()))?;

    match cli.format {
        OutputFormat::Human => formatter::print_human(&cli.file, &summary),
        OutputFormat::Json => formatter::print_json(&cli.file, &summary)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheetprice_core::{CellValue, InMemoryCatalog, PriceSet};

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    fn price_table(rows: &[(&str, &str)]) -> Table {
        let mut all = vec![vec![
            text("Nombre"),
            text("Variante"),
            text("Precio Ciudad"),
            text("Precio Interior"),
            text("Precio Especial"),
        ]];
        for (name, variant) in rows {
            all.push(vec![
                text(name),
                text(variant),
                CellValue::Number(10.0),
                CellValue::Number(9.0),
                CellValue::Number(8.0),
            ]);
        }
        Table::new("Hoja1", all)
    }

    fn options() -> ReconcileOptions {
        ReconcileOptions::from_config(&ImportConfig::default())
    }

    #[tokio::test]
    async fn test_misses_past_limit_are_counted_but_not_printed() {
        let table = price_table(&[
            ("Sofa", "A"),
            ("Sofa", "B"),
            ("Sofa", "C"),
            ("Sofa", "D"),
            ("Sofa", "E"),
            ("Sofa", "F"),
        ]);
        let mut store = InMemoryCatalog::default();
        let printer = formatter::ProgressPrinter::new(5);
        let mut lines = Vec::new();

        let summary = run_import(&mut store, &table, options(), |event| {
            if let RowEvent::NotFound { record, count } = event {
                lines.extend(printer.not_found_line(record, *count));
            }
        })
        .await
        .unwrap();

        assert_eq!(summary.not_found, 6);
        assert_eq!(lines.len(), 5);
        assert!(lines[4].contains("Sofa - E"));
    }

    #[tokio::test]
    async fn test_store_is_closed_after_failed_run() {
        let table = price_table(&[("Silla", "Roja"), ("Mesa", "Grande")]);
        let mut store = InMemoryCatalog::default()
            .with_variant("v-roja", "Silla", "Roja", PriceSet::default())
            .fail_on("Mesa", "Grande");

        let result = run_import(&mut store, &table, options(), |_| {}).await;

        assert!(result.is_err());
        assert!(store.is_closed());
    }

    #[tokio::test]
    async fn test_store_is_closed_after_successful_run() {
        let table = price_table(&[("Silla", "Roja")]);
        let mut store = InMemoryCatalog::default()
            .with_variant("v-roja", "Silla", "Roja", PriceSet::default());

        let summary = run_import(&mut store, &table, options(), |_| {}).await.unwrap();

        assert_eq!(summary.updated, 1);
        assert!(store.is_closed());
    }

    #[test]
    fn test_checkpoint_source_ignores_path_spelling() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        let file = dir.path().join("precios.xlsx");
        std::fs::write(&file, b"").unwrap();

        let direct = checkpoint_source(&file).unwrap();
        let dotted = checkpoint_source(&dir.path().join("sub/../precios.xlsx")).unwrap();
        let current = checkpoint_source(&dir.path().join("./precios.xlsx")).unwrap();

        assert_eq!(direct, dotted);
        assert_eq!(direct, current);
        assert!(direct.is_absolute());
    }

    #[test]
    fn test_checkpoint_source_requires_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(checkpoint_source(&dir.path().join("missing.xlsx")).is_err());
    }
}
