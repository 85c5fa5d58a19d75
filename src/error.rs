use thiserror::Error;

/// Convenience result type used throughout the crate.
pub type LangResult<T> = Result<T, LangError>;

/// Error type returned by ingestion, transformation, picking and keymap operations.
///
/// A single enum shared by every module, so callers can match on the failure kind and print a
/// distinct message per kind.
#[derive(Debug, Error)]
pub enum LangError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "excel")]
    /// Workbook reading error (feature-gated behind `excel`).
    #[error("excel error: {0}")]
    Excel(#[from] calamine::Error),

    /// CSV reading error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON (de)serialization error for keymaps, config or output files.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The input cannot be read with any supported format.
    #[error("unsupported input: {message}")]
    UnsupportedFormat { message: String },

    /// The table does not have the `key` header / minimum shape.
    #[error("malformed table: {message}")]
    MalformedTable { message: String },

    /// A column header has no entry in the keymap in use.
    #[error("column '{header}' has no entry in keymap '{keymap}'")]
    UnknownKeymapEntry { header: String, keymap: String },

    /// A `/pattern/flags` query could not be turned into a regex.
    #[error("invalid regex query '{query}': {message}")]
    InvalidRegex { query: String, message: String },

    /// No row matched a pick query.
    #[error("cannot find key: {query}")]
    NotFound { query: String },

    /// The named keymap does not exist in the store.
    #[error("keymap '{name}' not found")]
    KeymapNotFound { name: String },

    /// A keymap with this name already exists.
    #[error("keymap '{name}' already exists")]
    KeymapExists { name: String },

    /// The keymap name cannot be used as a file name.
    #[error("invalid keymap name '{name}'")]
    InvalidKeymapName { name: String },

    /// A keymap id cannot be used as an output file or directory name.
    #[error("keymap id '{id}' for column '{header}' is not a valid file name")]
    InvalidOutputId { header: String, id: String },

    /// A `HEADER=id` pair could not be parsed.
    #[error("invalid keymap entry '{pair}' (expected HEADER=id)")]
    InvalidKeymapEntry { pair: String },

    /// The clipboard could not be written.
    #[error("clipboard error: {message}")]
    Clipboard { message: String },
}

impl LangError {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedTable {
            message: message.into(),
        }
    }
}
