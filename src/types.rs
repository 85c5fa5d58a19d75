//! Core data model types.
//!
//! Ingestion reads a file into a [`Workbook`]: an ordered list of named [`Sheet`]s, each holding
//! a plain string [`Table`]. Everything downstream (tree building, routing, picking) works on
//! these types only.

/// A row-major grid of string cells.
///
/// Rows may be ragged; a cell that is missing from a short row is treated exactly like an empty
/// cell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    /// Row-major cell storage. Row 0 is the header row.
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Create a table from rows.
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    /// Build a table from string slices; handy for literals.
    pub fn from_rows<R, C>(rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Self {
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
        }
    }

    /// Number of rows, header included.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Returns the cell at `(row, col)`, or `""` when it is absent.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// A single named sheet of a workbook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sheet {
    /// Sheet (tab) name. Used as the file name in namespace mode.
    pub name: String,
    /// Sheet contents.
    pub table: Table,
}

impl Sheet {
    /// Create a sheet.
    pub fn new(name: impl Into<String>, table: Table) -> Self {
        Self {
            name: name.into(),
            table,
        }
    }
}

/// All sheets of an input file, in workbook order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Workbook {
    /// Ordered sheets.
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    /// Create a workbook from sheets.
    pub fn new(sheets: Vec<Sheet>) -> Self {
        Self { sheets }
    }

    /// Sheet names in workbook order.
    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.sheets.iter().map(|s| s.name.as_str())
    }

    /// Find a sheet by exact name.
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    /// `true` when the workbook holds more than one sheet (namespace mode).
    pub fn is_multi_sheet(&self) -> bool {
        self.sheets.len() > 1
    }
}
