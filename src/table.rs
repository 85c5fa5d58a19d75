//! Table validation: header row + key column extraction.

use crate::error::{LangError, LangResult};
use crate::types::Table;

/// A validated table: the header row plus the data rows below it.
///
/// Data rows keep their original table index, so `data_row(i)` for `i >= 1` addresses the same
/// row as `table.rows[i]`. Row indices stored in tree leaves use this numbering.
#[derive(Debug, Clone, Copy)]
pub struct ParsedTable<'a> {
    table: &'a Table,
}

impl<'a> ParsedTable<'a> {
    /// Header cells (column 0 is the `key` header).
    pub fn header(&self) -> &'a [String] {
        &self.table.rows[0]
    }

    /// Number of columns in the header row.
    pub fn column_count(&self) -> usize {
        self.header().len()
    }

    /// Iterate `(row_index, cells)` over data rows, in table order.
    pub fn data_rows(&self) -> impl Iterator<Item = (usize, &'a [String])> {
        self.table
            .rows
            .iter()
            .enumerate()
            .skip(1)
            .map(|(i, r)| (i, r.as_slice()))
    }

    /// Iterate `(row_index, cells)` over every row, header included.
    pub fn rows(&self) -> impl Iterator<Item = (usize, &'a [String])> {
        self.table.rows.iter().enumerate().map(|(i, r)| (i, r.as_slice()))
    }

    /// Key cell of a row (`""` when absent).
    pub fn key(&self, row: usize) -> &'a str {
        self.table.cell(row, 0)
    }

    /// Cell lookup by table row index and column.
    pub fn cell(&self, row: usize, col: usize) -> &'a str {
        self.table.cell(row, col)
    }

    /// The underlying table.
    pub fn table(&self) -> &'a Table {
        self.table
    }
}

/// Validate a table's shape and return a [`ParsedTable`] view over it.
///
/// Fails with [`LangError::MalformedTable`] when:
/// - the table is empty
/// - the header row is empty or its first cell is not `key` (case-insensitive)
/// - the table has no data rows
/// - the header row has no language columns
pub fn parse_table(table: &Table) -> LangResult<ParsedTable<'_>> {
    let header = table
        .rows
        .first()
        .ok_or_else(|| LangError::malformed("table is empty"))?;

    match header.first() {
        Some(first) if first.eq_ignore_ascii_case("key") => {}
        _ => return Err(LangError::malformed("must have key column")),
    }

    if table.rows.len() <= 1 {
        return Err(LangError::malformed("table has no data rows"));
    }
    if header.len() <= 1 {
        return Err(LangError::malformed("header row has no language columns"));
    }

    Ok(ParsedTable { table })
}
