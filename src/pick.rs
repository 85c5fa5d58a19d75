//! Row lookup by key, rendered as tab-separated text for pasting into another spreadsheet.
//!
//! Queries come in two forms:
//!
//! - `/pattern/`, `/pattern/g`, `/pattern/i`: regex over the key column; every matching row
//!   is returned in table order, rows joined by `\n`. `i` makes the match case-insensitive;
//!   `g` is accepted and changes nothing since all matches are collected anyway.
//! - anything else: the first row whose key equals the query exactly.
//!
//! The header row is searched like any other, so `key` (or `/^k/`) copies the header.

use regex::{Regex, RegexBuilder};

use crate::clipboard::ClipboardSink;
use crate::error::{LangError, LangResult};
use crate::observability::{Diagnostic, EventContext, LangObserver};
use crate::table::ParsedTable;

/// A parsed pick query.
#[derive(Debug, Clone)]
pub enum PickQuery {
    /// Literal key.
    Exact(String),
    /// `/pattern/flags` query.
    Pattern {
        /// The query as typed.
        source: String,
        regex: Regex,
    },
}

impl PickQuery {
    /// Parse user input.
    ///
    /// Input starting with `/` must be `/pattern/`, `/pattern/g` or `/pattern/i`, otherwise it
    /// fails with [`LangError::InvalidRegex`]; so does a pattern that does not compile.
    pub fn parse(query: &str) -> LangResult<Self> {
        if !query.starts_with('/') {
            return Ok(Self::Exact(query.to_string()));
        }

        let invalid = |message: String| LangError::InvalidRegex {
            query: query.to_string(),
            message,
        };

        let (pattern, case_insensitive) = if query.len() >= 3 && query.ends_with("/i") {
            (&query[1..query.len() - 2], true)
        } else if query.len() >= 3 && query.ends_with("/g") {
            (&query[1..query.len() - 2], false)
        } else if query.len() >= 2 && query.ends_with('/') {
            (&query[1..query.len() - 1], false)
        } else {
            return Err(invalid(
                "expected /pattern/, /pattern/g or /pattern/i".to_string(),
            ));
        };

        let regex = RegexBuilder::new(pattern)
            .case_insensitive(case_insensitive)
            .build()
            .map_err(|e| invalid(e.to_string()))?;

        Ok(Self::Pattern {
            source: query.to_string(),
            regex,
        })
    }

    /// The query as typed.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Exact(s) => s,
            Self::Pattern { source, .. } => source,
        }
    }
}

/// One matched row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickedRow {
    /// 1-based row number as shown by spreadsheet applications.
    pub row: usize,
    pub key: String,
    /// Tab-joined cells.
    pub text: String,
}

/// Result of a successful pick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickResult {
    /// Matches in table order (at most one for exact queries).
    pub rows: Vec<PickedRow>,
    /// Row texts joined by `\n`; what goes to the clipboard.
    pub text: String,
}

/// Find rows of `table` matching `query`.
///
/// Every row is searched, header included. With `include_key` the key cell is the first field
/// of each rendered row; otherwise it is left out. Fails with [`LangError::NotFound`] when nothing
/// matches.
pub fn pick(
    table: &ParsedTable<'_>,
    query: &PickQuery,
    include_key: bool,
) -> LangResult<PickResult> {
    let render = |row: usize, cells: &[String]| PickedRow {
        row: row + 1,
        key: table.key(row).to_string(),
        text: render_row(cells, include_key),
    };

    let rows: Vec<PickedRow> = match query {
        PickQuery::Exact(key) => table
            .rows()
            .find(|(row, _)| table.key(*row) == key)
            .map(|(row, cells)| render(row, cells))
            .into_iter()
            .collect(),
        PickQuery::Pattern { regex, .. } => table
            .rows()
            .filter(|(row, _)| regex.is_match(table.key(*row)))
            .map(|(row, cells)| render(row, cells))
            .collect(),
    };

    if rows.is_empty() {
        return Err(LangError::NotFound {
            query: query.as_str().to_string(),
        });
    }

    let text = rows
        .iter()
        .map(|r| r.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    Ok(PickResult { rows, text })
}

/// [`pick`], then hand the text to `sink`.
///
/// Every match is reported to `observer` as [`Diagnostic::Matched`].
pub fn pick_to_clipboard(
    table: &ParsedTable<'_>,
    query: &PickQuery,
    include_key: bool,
    sink: &dyn ClipboardSink,
    observer: &dyn LangObserver,
    ctx: &EventContext,
) -> LangResult<PickResult> {
    let result = pick(table, query, include_key)?;
    for r in &result.rows {
        observer.on_diagnostic(
            ctx,
            &Diagnostic::Matched {
                row: r.row,
                key: r.key.clone(),
            },
        );
    }
    sink.set_text(&result.text)?;
    Ok(result)
}

fn render_row(cells: &[String], include_key: bool) -> String {
    let skip = if include_key { 0 } else { 1 };
    cells
        .iter()
        .skip(skip)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("\t")
}
