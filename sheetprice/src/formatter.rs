//! Console output for import runs

use anyhow::Result;
use colored::*;
use sheetprice_core::record::{PriceRecord, PriceSet};
use sheetprice_core::reader::table::format_number;
use sheetprice_core::{RowEvent, RunSummary};
use std::path::Path;

/// Prints per-row progress, limiting "not found" details
pub struct ProgressPrinter {
    not_found_details: usize,
}

impl ProgressPrinter {
    pub fn new(not_found_details: usize) -> Self {
        Self { not_found_details }
    }

    pub fn print(&self, event: &RowEvent<'_>) {
        match event {
            RowEvent::Columns(header) => {
                println!("{} {}", "Columns found:".bold(), header.names().join(", "));
            }
            RowEvent::Updated {
                record,
                variant,
                dry_run,
            } => {
                let marker = if *dry_run {
                    "~".yellow().bold()
                } else {
                    "✓".green().bold()
                };
                println!(
                    "{} {} - {}: {}",
                    marker,
                    variant.product_name,
                    record.variant_value,
                    format_prices(&record.prices)
                );
            }
            RowEvent::NotFound { record, count } => {
                if let Some(line) = self.not_found_line(record, *count) {
                    println!("{}", line);
                }
            }
            RowEvent::Ambiguous { record, matches } => {
                println!(
                    "{} {} - {} matches {} variants, skipped",
                    "!".yellow().bold(),
                    record.product_name,
                    record.variant_value,
                    matches
                );
            }
            RowEvent::SkippedEmptyKey { .. } => {}
            RowEvent::Committed { through_row } => {
                println!("{}", format!("  committed through row {}", through_row).bright_black());
            }
        }
    }

    /// Detail line for the `count`-th miss, or `None` once the limit is reached
    pub fn not_found_line(&self, record: &PriceRecord, count: usize) -> Option<String> {
        (count <= self.not_found_details).then(|| {
            format!(
                "{} {} {} - {}",
                "✗".red().bold(),
                "Not found:".red(),
                record.product_name,
                record.variant_value
            )
        })
    }
}

fn format_prices(prices: &PriceSet) -> String {
    let show = |p: Option<f64>| p.map_or_else(|| "-".to_string(), |v| format!("${}", format_number(v)));
    format!(
        "{} / {} / {}",
        show(prices.city),
        show(prices.interior),
        show(prices.special)
    )
}

/// Print the run summary in human-readable format
pub fn print_human(file_path: &Path, summary: &RunSummary) {
    let rule = "=".repeat(60);
    println!();
    println!("{}", rule);
    println!("{}", format!("Import: {}", file_path.display()).bold());
    if summary.dry_run {
        println!("{}", "Dry run: no changes were written".yellow().bold());
    }

    let updated_label = if summary.dry_run {
        "Variants that would be updated:"
    } else {
        "Variants updated:"
    };
    println!("  {} {}", updated_label.green().bold(), summary.updated);
    println!("  {} {}", "Not found:".red().bold(), summary.not_found);
    if summary.ambiguous > 0 {
        println!("  {} {}", "Ambiguous:".yellow().bold(), summary.ambiguous);
    }
    if summary.skipped_empty_key > 0 {
        println!(
            "  {} {}",
            "Skipped (empty key):".bright_black(),
            summary.skipped_empty_key
        );
    }
    if summary.skipped_resumed > 0 {
        println!(
            "  {} {}",
            "Skipped (already committed):".bright_black(),
            summary.skipped_resumed
        );
    }
    println!("{}", rule);
}

/// Print the run summary in JSON format
pub fn print_json(file_path: &Path, summary: &RunSummary) -> Result<()> {
    let output = serde_json::json!({
        "file": file_path.display().to_string(),
        "summary": summary,
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_prices() {
        let prices = PriceSet {
            city: Some(100.0),
            interior: Some(90.5),
            special: None,
        };
        assert_eq!(format_prices(&prices), "$100 / $90.5 / -");
    }

    #[test]
    fn test_not_found_details_are_limited() {
        let printer = ProgressPrinter::new(5);
        let record = PriceRecord {
            row: 2,
            product_name: "Sofa".to_string(),
            variant_value: "Gris".to_string(),
            prices: PriceSet::default(),
        };

        for count in 1..=5 {
            let line = printer.not_found_line(&record, count);
            assert!(line.is_some_and(|l| l.contains("Sofa - Gris")));
        }
        assert_eq!(printer.not_found_line(&record, 6), None);
        assert_eq!(ProgressPrinter::new(0).not_found_line(&record, 1), None);
    }
}
