use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use lang_util::LangError;
use lang_util::config::TransOptions;
use lang_util::keymap::Keymap;
use lang_util::observability::{Diagnostic, EventContext, LangObserver, Severity};
use lang_util::router::transform_workbook;
use lang_util::types::{Sheet, Table, Workbook};

#[derive(Default)]
struct RecordingObserver {
    diagnostics: Mutex<Vec<(EventContext, Diagnostic)>>,
    written: Mutex<Vec<PathBuf>>,
    failures: Mutex<Vec<Severity>>,
    alerts: Mutex<Vec<Severity>>,
}

impl LangObserver for RecordingObserver {
    fn on_diagnostic(&self, ctx: &EventContext, diagnostic: &Diagnostic) {
        self.diagnostics
            .lock()
            .unwrap()
            .push((ctx.clone(), diagnostic.clone()));
    }

    fn on_written(&self, _ctx: &EventContext, path: &Path) {
        self.written.lock().unwrap().push(path.to_path_buf());
    }

    fn on_failure(&self, _ctx: &EventContext, severity: Severity, _error: &LangError) {
        self.failures.lock().unwrap().push(severity);
    }

    fn on_alert(&self, _ctx: &EventContext, severity: Severity, _error: &LangError) {
        self.alerts.lock().unwrap().push(severity);
    }
}

fn run(wb: &Workbook, km: &Keymap, out: &Path, obs: Arc<RecordingObserver>) {
    let opts = TransOptions {
        output_dir: out.to_path_buf(),
        observer: Some(obs),
        alert_at_or_above: Severity::Critical,
        ..Default::default()
    };
    transform_workbook(wb, "default", km, &opts).unwrap();
}

#[test]
fn skipped_keys_are_reported_with_sheet_context() {
    let out = tempfile::tempdir().unwrap();
    let obs = Arc::new(RecordingObserver::default());
    let wb = Workbook::new(vec![Sheet::new(
        "Sheet1",
        Table::from_rows([
            vec!["key", "ENG"],
            vec!["", "orphan"],
            vec![".bad", "x"],
            vec!["good", "y"],
        ]),
    )]);

    run(&wb, &Keymap::from_pairs([("ENG", "en")]), out.path(), obs.clone());

    let diags = obs.diagnostics.lock().unwrap().clone();
    assert_eq!(
        diags,
        vec![
            (EventContext::sheet("Sheet1"), Diagnostic::EmptyKey { row: 2 }),
            (
                EventContext::sheet("Sheet1"),
                Diagnostic::IllegalKey {
                    row: 3,
                    key: ".bad".to_string()
                }
            ),
        ]
    );
    assert_eq!(*obs.written.lock().unwrap(), vec![out.path().join("en.json")]);
}

#[test]
fn overwrite_is_announced_before_replacing() {
    let out = tempfile::tempdir().unwrap();
    std::fs::write(out.path().join("en.json"), "{}").unwrap();
    let obs = Arc::new(RecordingObserver::default());
    let wb = Workbook::new(vec![Sheet::new(
        "Sheet1",
        Table::from_rows([vec!["key", "ENG"], vec!["a", "1"]]),
    )]);

    run(&wb, &Keymap::from_pairs([("ENG", "en")]), out.path(), obs.clone());

    let diags = obs.diagnostics.lock().unwrap().clone();
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].0, EventContext::sheet("Sheet1").with_column("ENG"));
    assert_eq!(
        diags[0].1,
        Diagnostic::Overwrite {
            path: out.path().join("en.json")
        }
    );
}

#[test]
fn unknown_header_is_a_non_critical_failure() {
    let out = tempfile::tempdir().unwrap();
    let obs = Arc::new(RecordingObserver::default());
    let wb = Workbook::new(vec![Sheet::new(
        "Sheet1",
        Table::from_rows([vec!["key", "ENG", "DE"], vec!["a", "1", "2"]]),
    )]);

    run(&wb, &Keymap::from_pairs([("ENG", "en")]), out.path(), obs.clone());

    assert_eq!(*obs.failures.lock().unwrap(), vec![Severity::Error]);
    assert!(obs.alerts.lock().unwrap().is_empty());
    assert_eq!(obs.written.lock().unwrap().len(), 1);
}
