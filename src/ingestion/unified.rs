//! Unified workbook loading.
//!
//! Most callers should use [`load_workbook`], which reads a file into a
//! [`crate::types::Workbook`]. If [`IngestionOptions::format`] is `None`, the format is inferred
//! from the file extension.

use std::path::{Path, PathBuf};

use crate::error::{LangError, LangResult};
use crate::types::Workbook;

use super::csv;

/// Supported input formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestionFormat {
    /// Comma-separated values (single sheet).
    Csv,
    /// Spreadsheet/workbook formats (feature-gated behind `excel`).
    Excel,
}

impl IngestionFormat {
    /// Parse an ingestion format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" | "tsv" => Some(Self::Csv),
            "xlsx" | "xls" | "xlsm" | "xlsb" | "ods" => Some(Self::Excel),
            _ => None,
        }
    }
}

/// Options controlling workbook loading.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestionOptions {
    /// If `None`, auto-detect format from file extension.
    pub format: Option<IngestionFormat>,
    /// Field delimiter for CSV input. `None` picks tab for `.tsv`, comma otherwise.
    pub csv_delimiter: Option<u8>,
    /// Sheets to read from a workbook, in order. `None` reads all sheets.
    pub sheets: Option<Vec<String>>,
}

/// Resolve a user-supplied input name.
///
/// A name without a recognized extension that does not exist as given is looked up with
/// `.xlsx` appended, so `lang-util trans strings` finds `strings.xlsx`.
pub fn resolve_input_path(name: impl AsRef<Path>) -> PathBuf {
    let path = name.as_ref();
    let known = path
        .extension()
        .and_then(|e| e.to_str())
        .and_then(IngestionFormat::from_extension)
        .is_some();
    if known || path.exists() {
        return path.to_path_buf();
    }
    let mut with_ext = path.as_os_str().to_owned();
    with_ext.push(".xlsx");
    PathBuf::from(with_ext)
}

/// Load every sheet of `path` into a [`Workbook`].
///
/// ```no_run
/// use lang_util::ingestion::{load_workbook, IngestionOptions};
///
/// # fn main() -> Result<(), lang_util::LangError> {
/// let wb = load_workbook("strings.xlsx", &IngestionOptions::default())?;
/// for name in wb.sheet_names() {
///     println!("{name}");
/// }
/// # Ok(())
/// # }
/// ```
pub fn load_workbook(path: impl AsRef<Path>, options: &IngestionOptions) -> LangResult<Workbook> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(LangError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("file '{}' not found", path.display()),
        )));
    }

    let fmt = match options.format {
        Some(f) => f,
        None => infer_format_from_path(path)?,
    };

    match fmt {
        IngestionFormat::Csv => {
            let is_tsv = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("tsv"));
            let delimiter = options
                .csv_delimiter
                .unwrap_or(if is_tsv { b'\t' } else { b',' });
            csv::read_csv_from_path(path, delimiter)
        }
        IngestionFormat::Excel => load_excel_dispatch(path, options.sheets.as_deref()),
    }
}

fn infer_format_from_path(path: &Path) -> LangResult<IngestionFormat> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .ok_or_else(|| LangError::UnsupportedFormat {
            message: format!(
                "cannot infer format: path has no extension ({})",
                path.display()
            ),
        })?;

    IngestionFormat::from_extension(ext).ok_or_else(|| LangError::UnsupportedFormat {
        message: format!(
            "cannot infer format from extension '{ext}' for path ({})",
            path.display()
        ),
    })
}

fn load_excel_dispatch(path: &Path, sheets: Option<&[String]>) -> LangResult<Workbook> {
    // Avoid unused warnings when the feature is off.
    let _ = (path, sheets);

    #[cfg(feature = "excel")]
    {
        let refs: Option<Vec<&str>> = sheets.map(|s| s.iter().map(String::as_str).collect());
        super::excel::read_excel_from_path(path, refs.as_deref())
    }

    #[cfg(not(feature = "excel"))]
    {
        Err(LangError::UnsupportedFormat {
            message: "excel input not enabled (enable cargo feature 'excel')".to_string(),
        })
    }
}
