//! Keymap-driven fan-out of translation trees to output files.
//!
//! - A workbook with one sheet is written in **flat mode**: every language column becomes
//!   `<out>/<id>.json`, where `id` is the keymap entry for the column header.
//! - A workbook with several sheets is written in **namespace mode**: every language column of
//!   every sheet becomes `<out>/<ns>/<sheet name>.json`, where `ns` is the keymap entry for the
//!   column header.
//!
//! Failures are isolated per column (unknown header, write error) and per sheet (malformed
//! table). They are reported to the observer and collected in the [`TransReport`]; files that
//! were already written stay in place. Existing files are overwritten, with a
//! [`Diagnostic::Overwrite`] emitted first.

use std::path::{Path, PathBuf};

use crate::config::TransOptions;
use crate::error::{LangError, LangResult};
use crate::ingestion::{IngestionOptions, load_workbook};
use crate::keymap::{Keymap, KeymapStore, is_file_stem};
use crate::observability::{Diagnostic, EventContext, LangObserver, NoopObserver, report_failure};
use crate::output::{ensure_dir, write_atomic};
use crate::table::parse_table;
use crate::tree::Skeleton;
use crate::types::{Sheet, Workbook};

/// How output paths are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// `<out>/<id>.json`
    Flat,
    /// `<out>/<ns>/<sheet>.json`
    Namespaced,
}

impl OutputMode {
    /// Flat for single-sheet workbooks, namespaced otherwise.
    pub fn for_workbook(workbook: &Workbook) -> Self {
        if workbook.is_multi_sheet() {
            Self::Namespaced
        } else {
            Self::Flat
        }
    }
}

/// Where one column of one sheet is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTarget {
    /// Directory holding the file; created before writing.
    pub dir: PathBuf,
    /// Full file path.
    pub path: PathBuf,
}

/// Resolves column headers to output targets.
#[derive(Debug, Clone, Copy)]
pub struct Router<'a> {
    keymap_name: &'a str,
    keymap: &'a Keymap,
    output_dir: &'a Path,
    mode: OutputMode,
}

impl<'a> Router<'a> {
    pub fn new(
        keymap_name: &'a str,
        keymap: &'a Keymap,
        output_dir: &'a Path,
        mode: OutputMode,
    ) -> Self {
        Self {
            keymap_name,
            keymap,
            output_dir,
            mode,
        }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Output target for `header` in `sheet_name`.
    ///
    /// Fails with [`LangError::UnknownKeymapEntry`] when the header is not in the keymap, and
    /// with [`LangError::InvalidOutputId`] when its id would not land directly under the output
    /// directory (empty, hidden, or containing a path separator).
    pub fn target(&self, sheet_name: &str, header: &str) -> LangResult<OutputTarget> {
        let id = self
            .keymap
            .get(header)
            .ok_or_else(|| LangError::UnknownKeymapEntry {
                header: header.to_string(),
                keymap: self.keymap_name.to_string(),
            })?;
        if !is_file_stem(id) {
            return Err(LangError::InvalidOutputId {
                header: header.to_string(),
                id: id.to_string(),
            });
        }

        Ok(match self.mode {
            OutputMode::Flat => OutputTarget {
                dir: self.output_dir.to_path_buf(),
                path: self.output_dir.join(format!("{id}.json")),
            },
            OutputMode::Namespaced => {
                let dir = self.output_dir.join(id);
                let path = dir.join(format!("{sheet_name}.json"));
                OutputTarget { dir, path }
            }
        })
    }
}

/// A column or sheet that could not be written.
#[derive(Debug)]
pub struct TransFailure {
    pub context: EventContext,
    pub error: LangError,
}

/// Outcome of a transform.
#[derive(Debug, Default)]
pub struct TransReport {
    /// Files written, in processing order.
    pub written: Vec<PathBuf>,
    /// Per-sheet / per-column failures, in processing order.
    pub failures: Vec<TransFailure>,
}

impl TransReport {
    /// `true` when nothing failed.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Transform a file: load the keymap, read the workbook, write every sheet/column.
///
/// The keymap is `options.keymap_name`, or `default_keymap` when that is `None`. A missing
/// keymap or unreadable input fails the whole call before anything is written.
pub fn trans_from_path(
    input: impl AsRef<Path>,
    store: &dyn KeymapStore,
    default_keymap: &str,
    options: &TransOptions,
) -> LangResult<TransReport> {
    let keymap_name = options.keymap_name.as_deref().unwrap_or(default_keymap);
    let keymap = store.get(keymap_name)?;
    let workbook = load_workbook(input, &IngestionOptions::default())?;
    transform_workbook(&workbook, keymap_name, &keymap, options)
}

/// Write every language column of every sheet of `workbook`.
///
/// Returns `Err` only when the workbook is empty or the output root cannot be created;
/// everything else is collected in the report.
pub fn transform_workbook(
    workbook: &Workbook,
    keymap_name: &str,
    keymap: &Keymap,
    options: &TransOptions,
) -> LangResult<TransReport> {
    if workbook.sheets.is_empty() {
        return Err(LangError::malformed("workbook has no sheets"));
    }
    ensure_dir(&options.output_dir)?;

    let noop = NoopObserver;
    let observer: &dyn LangObserver = match options.observer.as_deref() {
        Some(o) => o,
        None => &noop,
    };

    let router = Router::new(
        keymap_name,
        keymap,
        &options.output_dir,
        OutputMode::for_workbook(workbook),
    );
    let mut report = TransReport::default();
    for sheet in &workbook.sheets {
        transform_sheet(sheet, &router, options, observer, &mut report);
    }
    Ok(report)
}

fn transform_sheet(
    sheet: &Sheet,
    router: &Router<'_>,
    options: &TransOptions,
    observer: &dyn LangObserver,
    report: &mut TransReport,
) {
    let ctx = EventContext::sheet(&sheet.name);
    let parsed = match parse_table(&sheet.table) {
        Ok(p) => p,
        Err(error) => {
            report_failure(observer, &ctx, &error, options.alert_at_or_above);
            report.failures.push(TransFailure { context: ctx, error });
            return;
        }
    };

    let skeleton = Skeleton::build(&parsed, options.flat);
    for diagnostic in skeleton.diagnostics() {
        observer.on_diagnostic(&ctx, diagnostic);
    }

    for (col, header) in parsed.header().iter().enumerate().skip(1) {
        let col_ctx = ctx.with_column(header);
        let result = router.target(&sheet.name, header).and_then(|target| {
            let bytes = skeleton
                .fill(&parsed, col, options.placeholder())
                .to_json_pretty()?;
            ensure_dir(&target.dir)?;
            if target.path.exists() {
                observer.on_diagnostic(
                    &col_ctx,
                    &Diagnostic::Overwrite {
                        path: target.path.clone(),
                    },
                );
            }
            write_atomic(&target.path, &bytes)?;
            Ok(target.path)
        });

        match result {
            Ok(path) => {
                observer.on_written(&col_ctx, &path);
                report.written.push(path);
            }
            Err(error) => {
                report_failure(observer, &col_ctx, &error, options.alert_at_or_above);
                report.failures.push(TransFailure {
                    context: col_ctx,
                    error,
                });
            }
        }
    }
}
