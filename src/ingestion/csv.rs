//! CSV ingestion implementation.
//!
//! A CSV file is read as a single-sheet [`Workbook`] named after the file stem. Every record,
//! the header included, becomes a table row; records may have different lengths.

use std::path::Path;

use crate::error::LangResult;
use crate::types::{Sheet, Table, Workbook};

/// Read a CSV file into a one-sheet [`Workbook`].
pub fn read_csv_from_path(path: impl AsRef<Path>, delimiter: u8) -> LangResult<Workbook> {
    let path = path.as_ref();
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_path(path)?;
    let table = read_csv_from_reader(&mut rdr)?;

    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Sheet1");
    Ok(Workbook::new(vec![Sheet::new(name, table)]))
}

/// Read all records of an existing CSV reader into a [`Table`].
///
/// The reader should be built with `has_headers(false)` so the header record is kept as row 0.
pub fn read_csv_from_reader<R: std::io::Read>(rdr: &mut csv::Reader<R>) -> LangResult<Table> {
    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        rows.push(record.iter().map(str::to_owned).collect());
    }
    Ok(Table::new(rows))
}
