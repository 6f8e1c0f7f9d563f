//! Price records extracted from data rows

use crate::config::ColumnNames;
use crate::error::{Error, Result};
use crate::header::ColumnIndices;
use crate::reader::CellValue;
use serde::Serialize;

/// City, interior, and special prices of one variant
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PriceSet {
    pub city: Option<f64>,
    pub interior: Option<f64>,
    pub special: Option<f64>,
}

/// One data row ready for lookup
#[derive(Debug, Clone, PartialEq)]
pub struct PriceRecord {
    /// 1-based sheet row
    pub row: usize,
    pub product_name: String,
    pub variant_value: String,
    pub prices: PriceSet,
}

/// How keys are read from a row
#[derive(Debug, Clone, Copy)]
pub struct RowLayout<'a> {
    pub indices: ColumnIndices,
    pub names: &'a ColumnNames,
    pub trim_keys: bool,
}

impl RowLayout<'_> {
    /// Extract a record, or `None` when the product or variant key is empty
    pub fn extract(&self, row_number: usize, row: &[CellValue]) -> Result<Option<PriceRecord>> {
        let Some(product_name) = self.key(row, self.indices.product) else {
            return Ok(None);
        };
        let Some(variant_value) = self.key(row, self.indices.variant) else {
            return Ok(None);
        };

        let price = |position: usize, column: &str| {
            parse_price(ColumnIndices::cell(row, position)).map_err(|value| Error::InvalidPrice {
                row: row_number,
                column: column.to_string(),
                value,
            })
        };

        Ok(Some(PriceRecord {
            row: row_number,
            product_name,
            variant_value,
            prices: PriceSet {
                city: price(self.indices.price_city, &self.names.price_city)?,
                interior: price(self.indices.price_interior, &self.names.price_interior)?,
                special: price(self.indices.price_special, &self.names.price_special)?,
            },
        }))
    }

    fn key(&self, row: &[CellValue], position: usize) -> Option<String> {
        let key = ColumnIndices::cell(row, position).as_key()?;
        if self.trim_keys {
            let trimmed = key.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        } else {
            Some(key)
        }
    }
}

/// Parse a price cell. Blank cells are `None`; the error carries the offending text.
pub fn parse_price(cell: &CellValue) -> std::result::Result<Option<f64>, String> {
    match cell {
        CellValue::Empty => Ok(None),
        CellValue::Number(n) => Ok(Some(*n)),
        CellValue::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            let digits = trimmed.strip_prefix('$').unwrap_or(trimmed).trim_start();
            digits
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .map(Some)
                .ok_or_else(|| s.clone())
        }
        other => Err(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ColumnLayout;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    fn layout(names: &ColumnNames, trim_keys: bool) -> RowLayout<'_> {
        RowLayout {
            indices: ColumnIndices {
                product: 1,
                variant: 2,
                price_city: 3,
                price_interior: 4,
                price_special: 5,
            },
            names,
            trim_keys,
        }
    }

    #[test]
    fn test_extract_record() {
        let names = ColumnLayout::Catalog.column_names();
        let row = vec![
            text("Silla"),
            text("Roja"),
            CellValue::Number(100.0),
            text(" $90.50 "),
            CellValue::Empty,
        ];

        let record = layout(&names, false).extract(2, &row).unwrap().unwrap();
        assert_eq!(record.row, 2);
        assert_eq!(record.product_name, "Silla");
        assert_eq!(record.variant_value, "Roja");
        assert_eq!(
            record.prices,
            PriceSet {
                city: Some(100.0),
                interior: Some(90.5),
                special: None,
            }
        );
    }

    #[test]
    fn test_empty_keys_skip_before_price_parsing() {
        let names = ColumnLayout::Catalog.column_names();
        let row = vec![CellValue::Empty, text("Roja"), text("not a price")];
        assert_eq!(layout(&names, false).extract(3, &row).unwrap(), None);

        let row = vec![text("Silla"), text(""), text("not a price")];
        assert_eq!(layout(&names, false).extract(3, &row).unwrap(), None);
    }

    #[test]
    fn test_key_trimming_is_opt_in() {
        let names = ColumnLayout::Catalog.column_names();
        let row = vec![text(" Silla "), text("  ")];

        let literal = layout(&names, false).extract(4, &row).unwrap().unwrap();
        assert_eq!(literal.product_name, " Silla ");
        assert_eq!(literal.variant_value, "  ");

        assert_eq!(layout(&names, true).extract(4, &row).unwrap(), None);
    }

    #[test]
    fn test_invalid_price_names_row_and_column() {
        let names = ColumnLayout::Catalog.column_names();
        let row = vec![text("Silla"), text("Roja"), text("cien")];

        match layout(&names, false).extract(7, &row) {
            Err(Error::InvalidPrice { row, column, value }) => {
                assert_eq!(row, 7);
                assert_eq!(column, "Precio Ciudad");
                assert_eq!(value, "cien");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price(&CellValue::Empty), Ok(None));
        assert_eq!(parse_price(&text("   ")), Ok(None));
        assert_eq!(parse_price(&text("$ 12")), Ok(Some(12.0)));
        assert_eq!(parse_price(&CellValue::Number(0.0)), Ok(Some(0.0)));
        assert!(parse_price(&text("1.234,50")).is_err());
        assert!(parse_price(&text("NaN")).is_err());
        assert!(parse_price(&CellValue::Boolean(true)).is_err());
        assert!(parse_price(&CellValue::Error("#N/A".into())).is_err());
    }
}
