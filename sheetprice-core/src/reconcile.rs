//! Row reconciliation: match spreadsheet rows to catalog variants and apply prices
//!
//! Rows are processed in sheet order. Work is committed every `commit_every`
//! processed rows so a failure only loses the batch in flight; with a
//! checkpoint configured, the last committed row is persisted after every
//! commit and the file is removed once the run completes.

use crate::checkpoint::Checkpoint;
use crate::config::{ColumnNames, ImportConfig, NullPricePolicy};
use crate::error::{Error, Result};
use crate::header::HeaderMap;
use crate::reader::Table;
use crate::record::{PriceRecord, RowLayout};
use crate::store::{CatalogStore, Lookup, VariantMatch};
use serde::Serialize;
use std::path::PathBuf;

/// Options for one reconciliation run
#[derive(Debug, Clone)]
pub struct ReconcileOptions {
    pub columns: ColumnNames,
    pub trim_keys: bool,
    pub null_prices: NullPricePolicy,
    /// Rows per transaction; 0 commits once at the end
    pub commit_every: usize,
    pub dry_run: bool,
    /// Rows up to and including this sheet row were committed by an earlier run
    pub resume_after: Option<usize>,
    pub checkpoint: Option<CheckpointTarget>,
}

impl ReconcileOptions {
    pub fn from_config(config: &ImportConfig) -> Self {
        Self {
            columns: config.column_names(),
            trim_keys: config.trim_keys,
            null_prices: config.null_prices,
            commit_every: config.commit_every,
            dry_run: false,
            resume_after: None,
            checkpoint: None,
        }
    }
}

/// Where and for which input checkpoints are written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointTarget {
    pub path: PathBuf,
    pub source: PathBuf,
}

/// Counters accumulated across a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub rows_read: usize,
    pub updated: usize,
    pub not_found: usize,
    pub ambiguous: usize,
    pub skipped_empty_key: usize,
    pub skipped_resumed: usize,
    pub commits: usize,
    pub last_committed_row: Option<usize>,
    pub dry_run: bool,
}

/// Progress notifications emitted while rows are processed
#[derive(Debug)]
pub enum RowEvent<'a> {
    Columns(&'a HeaderMap),
    Updated {
        record: &'a PriceRecord,
        variant: &'a VariantMatch,
        dry_run: bool,
    },
    NotFound {
        record: &'a PriceRecord,
        /// Running not-found count including this row
        count: usize,
    },
    Ambiguous {
        record: &'a PriceRecord,
        matches: usize,
    },
    SkippedEmptyKey {
        row: usize,
    },
    Committed {
        through_row: usize,
    },
}

pub struct Reconciler<'s, S> {
    store: &'s mut S,
    options: ReconcileOptions,
}

impl<'s, S: CatalogStore> Reconciler<'s, S> {
    pub fn new(store: &'s mut S, options: ReconcileOptions) -> Self {
        Self { store, options }
    }

    /// Process every data row of `table`, calling `on_event` as rows complete.
    ///
    /// Required columns are validated before the first store call. On error the
    /// uncommitted batch is rolled back; earlier batches stay committed.
    pub async fn run<F>(&mut self, table: &Table, mut on_event: F) -> Result<RunSummary>
    where
        F: FnMut(&RowEvent<'_>),
    {
        let header = HeaderMap::from_row(table.header().unwrap_or_default());
        on_event(&RowEvent::Columns(&header));
        let columns = self.options.columns.clone();
        let indices = header.resolve(&columns)?;

        let layout = RowLayout {
            indices,
            names: &columns,
            trim_keys: self.options.trim_keys,
        };

        tracing::info!(
            sheet = %table.sheet,
            rows = table.len(),
            dry_run = self.options.dry_run,
            "reconciling rows"
        );

        let mut summary = RunSummary {
            dry_run: self.options.dry_run,
            ..Default::default()
        };
        let mut batch = Batch::default();

        for (row_number, row) in table.data_rows() {
            summary.rows_read += 1;

            if self
                .options
                .resume_after
                .is_some_and(|resumed| row_number <= resumed)
            {
                summary.skipped_resumed += 1;
                continue;
            }

            let outcome = match layout.extract(row_number, row) {
                Ok(Some(record)) => {
                    batch.statements += 1;
                    self.apply(&record, &mut summary, &mut on_event).await
                }
                Ok(None) => {
                    tracing::debug!(row = row_number, "empty product or variant, skipping");
                    summary.skipped_empty_key += 1;
                    on_event(&RowEvent::SkippedEmptyKey { row: row_number });
                    Ok(())
                }
                Err(e) => Err(e),
            };
            if let Err(e) = outcome {
                self.abandon_batch(&batch).await;
                return Err(e);
            }

            batch.push(row_number);
            if !self.options.dry_run
                && self.options.commit_every > 0
                && batch.rows >= self.options.commit_every
            {
                self.commit(&mut batch, &mut summary, table, &mut on_event)
                    .await?;
            }
        }

        if self.options.dry_run {
            if batch.statements > 0 {
                self.store.rollback().await?;
            }
        } else {
            self.commit(&mut batch, &mut summary, table, &mut on_event)
                .await?;
            if let Some(target) = &self.options.checkpoint {
                Checkpoint::remove(&target.path)?;
            }
        }

        tracing::info!(
            updated = summary.updated,
            not_found = summary.not_found,
            ambiguous = summary.ambiguous,
            skipped = summary.skipped_empty_key,
            "reconciliation finished"
        );
        Ok(summary)
    }

    async fn apply<F>(
        &mut self,
        record: &PriceRecord,
        summary: &mut RunSummary,
        on_event: &mut F,
    ) -> Result<()>
    where
        F: FnMut(&RowEvent<'_>),
    {
        let row = record.row;
        let lookup = self
            .store
            .find_variant(&record.product_name, &record.variant_value)
            .await
            .map_err(|source| Error::RowStore { row, source })?;

        match lookup {
            Lookup::Found(variant) => {
                if !self.options.dry_run {
                    self.store
                        .update_prices(&variant.variant_id, &record.prices, self.options.null_prices)
                        .await
                        .map_err(|source| Error::RowStore { row, source })?;
                }
                summary.updated += 1;
                tracing::debug!(row, variant = %variant.variant_id, "prices updated");
                on_event(&RowEvent::Updated {
                    record,
                    variant: &variant,
                    dry_run: self.options.dry_run,
                });
            }
            Lookup::NotFound => {
                summary.not_found += 1;
                tracing::debug!(
                    row,
                    product = %record.product_name,
                    variant = %record.variant_value,
                    "variant not found"
                );
                on_event(&RowEvent::NotFound {
                    record,
                    count: summary.not_found,
                });
            }
            Lookup::Ambiguous(matches) => {
                summary.ambiguous += 1;
                tracing::warn!(
                    row,
                    product = %record.product_name,
                    variant = %record.variant_value,
                    matches,
                    "ambiguous variant key, not updated"
                );
                on_event(&RowEvent::Ambiguous { record, matches });
            }
        }
        Ok(())
    }

    async fn commit<F>(
        &mut self,
        batch: &mut Batch,
        summary: &mut RunSummary,
        table: &Table,
        on_event: &mut F,
    ) -> Result<()>
    where
        F: FnMut(&RowEvent<'_>),
    {
        let Some(through_row) = batch.last_row else {
            return Ok(());
        };
        if batch.statements > 0 {
            self.store.commit().await?;
            summary.commits += 1;
        }
        summary.last_committed_row = Some(through_row);
        tracing::info!(through_row, rows = batch.rows, "batch committed");

        if let Some(target) = &self.options.checkpoint {
            Checkpoint {
                source: target.source.clone(),
                sheet: table.sheet.clone(),
                last_committed_row: through_row,
            }
            .save(&target.path)?;
        }

        *batch = Batch::default();
        on_event(&RowEvent::Committed { through_row });
        Ok(())
    }

    async fn abandon_batch(&mut self, batch: &Batch) {
        if batch.statements == 0 {
            return;
        }
        if let Err(e) = self.store.rollback().await {
            tracing::warn!(error = %e, rows = batch.rows, "rollback of failed batch failed");
        } else {
            tracing::warn!(rows = batch.rows, "uncommitted batch rolled back");
        }
    }
}

/// Rows processed since the last commit
#[derive(Debug, Default)]
struct Batch {
    rows: usize,
    /// Rows in this batch that reached the store
    statements: usize,
    last_row: Option<usize>,
}

impl Batch {
    fn push(&mut self, row: usize) {
        self.rows += 1;
        self.last_row = Some(row);
    }
}
