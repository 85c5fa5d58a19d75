//! Observer hooks for transform/pick outcomes.
//!
//! Nothing in the core prints directly; diagnostics (skipped rows, shadowed keys, overwritten
//! files), successful writes and failures are reported to a [`LangObserver`].

use std::error::Error as StdError;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::LangError;

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Informational event.
    Info,
    /// Warning-level event (non-fatal).
    Warning,
    /// Error-level event (operation failed).
    Error,
    /// Critical error (typically I/O or other infrastructure failures).
    Critical,
}

/// Where an event happened.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventContext {
    /// Sheet name, when known.
    pub sheet: Option<String>,
    /// Column header, when the event concerns a single column.
    pub column: Option<String>,
}

impl EventContext {
    /// Context for a whole sheet.
    pub fn sheet(name: impl Into<String>) -> Self {
        Self {
            sheet: Some(name.into()),
            column: None,
        }
    }

    /// Narrow this context to one column.
    pub fn with_column(&self, column: impl Into<String>) -> Self {
        Self {
            sheet: self.sheet.clone(),
            column: Some(column.into()),
        }
    }
}

impl fmt::Display for EventContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.sheet, &self.column) {
            (Some(s), Some(c)) => write!(f, "sheet={s} column={c}"),
            (Some(s), None) => write!(f, "sheet={s}"),
            (None, Some(c)) => write!(f, "column={c}"),
            (None, None) => f.write_str("-"),
        }
    }
}

/// Non-fatal events raised while building trees or writing output.
///
/// Row numbers are 1-based, as shown by spreadsheet applications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A data row has an empty key cell and was skipped.
    EmptyKey { row: usize },
    /// A dotted key starts with `.` and was skipped.
    IllegalKey { row: usize, key: String },
    /// Two rows claim the same tree position (or one is a prefix of the other); the later
    /// row replaced the earlier one.
    ShadowedKey { key: String, row: usize, by_row: usize },
    /// An output file already existed and is being replaced.
    Overwrite { path: PathBuf },
    /// A row matched a pick query.
    Matched { row: usize, key: String },
}

impl Diagnostic {
    /// Severity of this diagnostic.
    pub fn severity(&self) -> Severity {
        match self {
            Diagnostic::EmptyKey { .. }
            | Diagnostic::IllegalKey { .. }
            | Diagnostic::ShadowedKey { .. } => Severity::Warning,
            Diagnostic::Overwrite { .. } | Diagnostic::Matched { .. } => Severity::Info,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::EmptyKey { row } => write!(f, "empty key name at row {row}, row skipped"),
            Diagnostic::IllegalKey { row, key } => {
                write!(f, "illegal key name at row {row}: '{key}', row skipped")
            }
            Diagnostic::ShadowedKey { key, row, by_row } => {
                write!(f, "key '{key}' at row {row} is replaced by row {by_row}")
            }
            Diagnostic::Overwrite { path } => write!(f, "overwriting {}", path.display()),
            Diagnostic::Matched { row, key } => write!(f, "found '{key}' in row {row}"),
        }
    }
}

/// Observer interface for transform and pick outcomes.
///
/// All methods have no-op defaults; implementors override what they care about.
pub trait LangObserver: Send + Sync {
    /// Called for every non-fatal diagnostic.
    fn on_diagnostic(&self, _ctx: &EventContext, _diagnostic: &Diagnostic) {}

    /// Called after an output file was written.
    fn on_written(&self, _ctx: &EventContext, _path: &Path) {}

    /// Called when a column, sheet or whole operation fails.
    fn on_failure(&self, _ctx: &EventContext, _severity: Severity, _error: &LangError) {}

    /// Called when a failure meets an alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_failure`].
    fn on_alert(&self, ctx: &EventContext, severity: Severity, error: &LangError) {
        self.on_failure(ctx, severity, error)
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl LangObserver for NoopObserver {}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn LangObserver>>,
}

impl CompositeObserver {
    /// Create a new composite observer from a list of observers.
    pub fn new(observers: Vec<Arc<dyn LangObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl LangObserver for CompositeObserver {
    fn on_diagnostic(&self, ctx: &EventContext, diagnostic: &Diagnostic) {
        for o in &self.observers {
            o.on_diagnostic(ctx, diagnostic);
        }
    }

    fn on_written(&self, ctx: &EventContext, path: &Path) {
        for o in &self.observers {
            o.on_written(ctx, path);
        }
    }

    fn on_failure(&self, ctx: &EventContext, severity: Severity, error: &LangError) {
        for o in &self.observers {
            o.on_failure(ctx, severity, error);
        }
    }

    fn on_alert(&self, ctx: &EventContext, severity: Severity, error: &LangError) {
        for o in &self.observers {
            o.on_alert(ctx, severity, error);
        }
    }
}

/// Logs events to stderr.
///
/// Diagnostics below `min_severity` are dropped; writes and failures are always printed.
#[derive(Debug, Clone, Copy)]
pub struct StdErrObserver {
    pub min_severity: Severity,
}

impl Default for StdErrObserver {
    fn default() -> Self {
        Self {
            min_severity: Severity::Warning,
        }
    }
}

impl LangObserver for StdErrObserver {
    fn on_diagnostic(&self, ctx: &EventContext, diagnostic: &Diagnostic) {
        let sev = diagnostic.severity();
        if sev >= self.min_severity {
            eprintln!("[lang][{sev:?}] {ctx} {diagnostic}");
        }
    }

    fn on_written(&self, ctx: &EventContext, path: &Path) {
        eprintln!("[lang][ok] {ctx} wrote {}", path.display());
    }

    fn on_failure(&self, ctx: &EventContext, severity: Severity, error: &LangError) {
        eprintln!("[lang][{severity:?}] {ctx} err={error}");
    }

    fn on_alert(&self, ctx: &EventContext, severity: Severity, error: &LangError) {
        eprintln!("[ALERT][lang][{severity:?}] {ctx} err={error}");
    }
}

/// Appends events to a local log file.
#[derive(Debug)]
pub struct FileObserver {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileObserver {
    /// Create a file observer that appends events to `path`.
    ///
    /// Writes are best-effort; failures to open/write the log file are ignored.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    fn append_line(&self, line: &str) {
        let _guard = self.lock.lock().ok();
        if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(&self.path) {
            let _ = writeln!(f, "{line}");
        }
    }
}

impl LangObserver for FileObserver {
    fn on_diagnostic(&self, ctx: &EventContext, diagnostic: &Diagnostic) {
        self.append_line(&format!(
            "{} diag severity={:?} {ctx} {diagnostic}",
            unix_ts(),
            diagnostic.severity()
        ));
    }

    fn on_written(&self, ctx: &EventContext, path: &Path) {
        self.append_line(&format!("{} ok {ctx} path={}", unix_ts(), path.display()));
    }

    fn on_failure(&self, ctx: &EventContext, severity: Severity, error: &LangError) {
        self.append_line(&format!(
            "{} fail severity={severity:?} {ctx} err={error}",
            unix_ts()
        ));
    }

    fn on_alert(&self, ctx: &EventContext, severity: Severity, error: &LangError) {
        self.append_line(&format!(
            "{} ALERT severity={severity:?} {ctx} err={error}",
            unix_ts()
        ));
    }
}

/// Classify an error for observer callbacks.
pub fn severity_for_error(e: &LangError) -> Severity {
    match e {
        LangError::Io(_) => Severity::Critical,
        LangError::Json(err) if err.is_io() => Severity::Critical,
        LangError::Csv(err) => match err.kind() {
            ::csv::ErrorKind::Io(_) => Severity::Critical,
            _ => Severity::Error,
        },
        #[cfg(feature = "excel")]
        LangError::Excel(err) => {
            if error_chain_contains_io(err) {
                Severity::Critical
            } else {
                Severity::Error
            }
        }
        LangError::Clipboard { .. } => Severity::Critical,
        _ => Severity::Error,
    }
}

#[cfg_attr(not(feature = "excel"), allow(dead_code))]
fn error_chain_contains_io(e: &(dyn StdError + 'static)) -> bool {
    let mut cur: Option<&(dyn StdError + 'static)> = Some(e);
    while let Some(err) = cur {
        if err.is::<std::io::Error>() {
            return true;
        }
        cur = err.source();
    }
    false
}

/// Report a failure to `observer`, escalating to `on_alert` at or above `alert_at_or_above`.
pub fn report_failure(
    observer: &dyn LangObserver,
    ctx: &EventContext,
    error: &LangError,
    alert_at_or_above: Severity,
) {
    let sev = severity_for_error(error);
    observer.on_failure(ctx, sev, error);
    if sev >= alert_at_or_above {
        observer.on_alert(ctx, sev, error);
    }
}

fn unix_ts() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counting {
        failures: Mutex<Vec<Severity>>,
        alerts: Mutex<Vec<Severity>>,
    }

    impl LangObserver for Counting {
        fn on_failure(&self, _ctx: &EventContext, severity: Severity, _error: &LangError) {
            self.failures.lock().unwrap().push(severity);
        }

        fn on_alert(&self, _ctx: &EventContext, severity: Severity, _error: &LangError) {
            self.alerts.lock().unwrap().push(severity);
        }
    }

    #[test]
    fn io_errors_are_critical_and_alert() {
        let obs = Counting::default();
        let err = LangError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        report_failure(&obs, &EventContext::default(), &err, Severity::Critical);
        assert_eq!(*obs.failures.lock().unwrap(), vec![Severity::Critical]);
        assert_eq!(*obs.alerts.lock().unwrap(), vec![Severity::Critical]);
    }

    #[test]
    fn domain_errors_do_not_alert_at_critical_threshold() {
        let obs = Counting::default();
        let err = LangError::UnknownKeymapEntry {
            header: "DE".to_string(),
            keymap: "default".to_string(),
        };
        report_failure(&obs, &EventContext::default(), &err, Severity::Critical);
        assert_eq!(*obs.failures.lock().unwrap(), vec![Severity::Error]);
        assert!(obs.alerts.lock().unwrap().is_empty());
    }

    #[test]
    fn file_observer_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("lang.log");
        let obs = FileObserver::new(&log);
        let ctx = EventContext::sheet("common").with_column("ENG");
        obs.on_diagnostic(&ctx, &Diagnostic::EmptyKey { row: 3 });
        obs.on_written(&ctx, Path::new("out/en.json"));

        let text = std::fs::read_to_string(&log).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("sheet=common column=ENG empty key name at row 3"));
        assert!(lines[1].contains("ok sheet=common column=ENG path=out/en.json"));
    }
}
