//! `lang-util` turns spreadsheet translation tables into per-language JSON files.
//!
//! A translation sheet has a `key` column followed by one column per language:
//!
//! | key          | ENG     | CHS  |
//! |--------------|---------|------|
//! | login.title  | Sign in | 登录 |
//! | login.submit | Go      |      |
//! | logout       | Bye     | 再见 |
//!
//! Dotted keys become nested objects, and a keymap (`{"ENG": "en", "CHS": "zh"}`) decides
//! which file each column goes to. The table above produces `en.json`:
//!
//! ```json
//! {
//!     "login": {
//!         "title": "Sign in",
//!         "submit": "Go"
//!     },
//!     "logout": "Bye"
//! }
//! ```
//!
//! and `zh.json`, where the empty `login.submit` cell is left out (or replaced by a
//! placeholder, see [`config::TransOptions::placeholder`]).
//!
//! Workbooks with several sheets are written in namespace mode: `<out>/<id>/<sheet>.json`.
//!
//! ## Quick example: transform in memory
//!
//! ```rust
//! use lang_util::keymap::Keymap;
//! use lang_util::router::transform_workbook;
//! use lang_util::config::TransOptions;
//! use lang_util::types::{Sheet, Table, Workbook};
//!
//! # fn main() -> Result<(), lang_util::LangError> {
//! let out = tempfile::tempdir()?;
//! let workbook = Workbook::new(vec![Sheet::new(
//!     "Sheet1",
//!     Table::from_rows([vec!["key", "ENG"], vec!["a.b", "1"], vec!["d", "3"]]),
//! )]);
//! let keymap = Keymap::from_pairs([("ENG", "en")]);
//! let opts = TransOptions {
//!     output_dir: out.path().to_path_buf(),
//!     ..Default::default()
//! };
//!
//! let report = transform_workbook(&workbook, "default", &keymap, &opts)?;
//! assert!(report.is_success());
//! assert!(out.path().join("en.json").is_file());
//! # Ok(())
//! # }
//! ```
//!
//! ## Picking rows
//!
//! ```rust
//! use lang_util::pick::{pick, PickQuery};
//! use lang_util::table::parse_table;
//! use lang_util::types::Table;
//!
//! let table = Table::from_rows([
//!     vec!["key", "ENG", "CHS"],
//!     vec!["ENG1", "one", "yi"],
//!     vec!["FR", "deux", "er"],
//! ]);
//! let parsed = parse_table(&table).unwrap();
//! let hit = pick(&parsed, &PickQuery::parse("/^eng/i").unwrap(), false).unwrap();
//! assert_eq!(hit.text, "one\tyi");
//! ```
//!
//! ## Modules
//!
//! - [`ingestion`]: reading `.xlsx`/`.ods`/`.csv` files into a [`types::Workbook`]
//! - [`table`]: header/key validation
//! - [`tree`]: dotted keys -> nested tree, per-column fill
//! - [`router`]: keymap resolution and file output
//! - [`pick`]: row lookup and clipboard delivery
//! - [`keymap`]: keymap documents and their store
//! - [`config`]: transform options and persisted CLI settings
//! - [`observability`]: observer hooks for diagnostics and failures
//! - [`error`]: the shared error type

pub mod clipboard;
pub mod config;
pub mod error;
pub mod ingestion;
pub mod keymap;
pub mod observability;
pub mod output;
pub mod pick;
pub mod router;
pub mod table;
pub mod tree;
pub mod types;

pub use error::{LangError, LangResult};
