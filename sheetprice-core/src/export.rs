//! CSV export of a worksheet

use crate::error::{Error, Result};
use crate::reader::Table;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Write every row of the table, header included, as CSV records.
/// Returns the number of records written.
pub fn write_csv<W: Write>(table: &Table, writer: W) -> Result<usize> {
    let mut csv = csv::Writer::from_writer(writer);
    for row in &table.rows {
        csv.write_record(row.iter().map(|cell| cell.to_string()))?;
    }
    csv.flush().map_err(csv::Error::from)?;
    Ok(table.len())
}

/// Export the table to `path`, replacing any existing file
pub fn export_csv<P: AsRef<Path>>(table: &Table, path: P) -> Result<usize> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|source| Error::Output {
        path: path.to_path_buf(),
        source,
    })?;
    let written = write_csv(table, file)?;
    tracing::info!(
        sheet = %table.sheet,
        rows = written,
        output = %path.display(),
        "exported CSV"
    );
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::CellValue;

    fn sample() -> Table {
        Table::new(
            "Hoja1",
            vec![
                vec![
                    CellValue::Text("Nombre".into()),
                    CellValue::Text("Variante".into()),
                    CellValue::Text("Precio Ciudad".into()),
                ],
                vec![
                    CellValue::Text("Silla".into()),
                    CellValue::Text("Roja, mate".into()),
                    CellValue::Number(100.0),
                ],
                vec![
                    CellValue::Text("Mesa".into()),
                    CellValue::Empty,
                    CellValue::Number(12.5),
                ],
            ],
        )
    }

    #[test]
    fn test_rows_and_fields_preserved() {
        let mut out = Vec::new();
        let written = write_csv(&sample(), &mut out).unwrap();
        assert_eq!(written, 3);

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Nombre,Variante,Precio Ciudad",
                "Silla,\"Roja, mate\",100",
                "Mesa,,12.5",
            ]
        );

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(text.as_bytes());
        for record in reader.records() {
            assert_eq!(record.unwrap().len(), 3);
        }
    }

    #[test]
    fn test_export_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("products.csv");
        std::fs::write(&path, "stale content that is longer than the export\n".repeat(10)).unwrap();

        export_csv(&sample(), &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 3);
        assert!(!text.contains("stale"));
    }

    #[test]
    fn test_unwritable_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("products.csv");
        assert!(matches!(
            export_csv(&sample(), &path),
            Err(Error::Output { .. })
        ));
    }
}
