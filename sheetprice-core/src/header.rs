//! Header row mapping

use crate::config::ColumnNames;
use crate::error::{Error, Result};
use crate::reader::CellValue;
use std::collections::HashMap;

static EMPTY: CellValue = CellValue::Empty;

/// Trimmed column name to 1-based column position
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    positions: HashMap<String, usize>,
}

impl HeaderMap {
    /// Build the map from the first row. Repeated names keep the last position.
    pub fn from_row(cells: &[CellValue]) -> Self {
        let mut positions = HashMap::new();
        for (index, cell) in cells.iter().enumerate() {
            let text = cell.to_string();
            let name = text.trim();
            if name.is_empty() {
                continue;
            }
            if let Some(previous) = positions.insert(name.to_string(), index + 1) {
                tracing::warn!(
                    column = name,
                    previous,
                    position = index + 1,
                    "duplicate header, using the last occurrence"
                );
            }
        }
        Self { positions }
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    /// Column names ordered by position
    pub fn names(&self) -> Vec<&str> {
        let mut entries: Vec<_> = self.positions.iter().collect();
        entries.sort_by_key(|(_, position)| **position);
        entries.into_iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Resolve every required column, reporting all missing names at once
    pub fn resolve(&self, columns: &ColumnNames) -> Result<ColumnIndices> {
        let missing: Vec<String> = columns
            .roles()
            .iter()
            .filter(|(_, name)| self.position(name).is_none())
            .map(|(_, name)| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(Error::MissingColumns(missing));
        }

        let at = |name: &str| self.position(name).unwrap_or_default();
        Ok(ColumnIndices {
            product: at(&columns.product),
            variant: at(&columns.variant),
            price_city: at(&columns.price_city),
            price_interior: at(&columns.price_interior),
            price_special: at(&columns.price_special),
        })
    }
}

/// Resolved 1-based positions of the required columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnIndices {
    pub product: usize,
    pub variant: usize,
    pub price_city: usize,
    pub price_interior: usize,
    pub price_special: usize,
}

impl ColumnIndices {
    /// Cell at a 1-based position; short rows read as empty
    pub fn cell(row: &[CellValue], position: usize) -> &CellValue {
        position
            .checked_sub(1)
            .and_then(|index| row.get(index))
            .unwrap_or(&EMPTY)
    }
}
