//! Input loading.
//!
//! Most callers should use [`load_workbook`] (from [`unified`]) which auto-detects the format
//! by file extension (or you can override it via [`IngestionOptions`]) and returns every sheet
//! as a string [`crate::types::Table`].
//!
//! Format-specific functions are also available under:
//! - [`csv`]
//! - `excel` (requires the Cargo feature `excel`, on by default)

pub mod csv;
#[cfg(feature = "excel")]
pub mod excel;
pub mod unified;

pub use unified::{IngestionFormat, IngestionOptions, load_workbook, resolve_input_path};
