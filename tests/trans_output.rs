use std::fs;
use std::path::Path;

use lang_util::LangError;
use lang_util::config::TransOptions;
use lang_util::keymap::{FsKeymapStore, Keymap, MemoryKeymapStore};
use lang_util::router::{trans_from_path, transform_workbook};
use lang_util::types::{Sheet, Table, Workbook};

fn opts(out: &Path) -> TransOptions {
    TransOptions {
        output_dir: out.to_path_buf(),
        ..Default::default()
    }
}

fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

fn strings_table() -> Table {
    Table::from_rows([
        vec!["key", "ENG", "CHS"],
        vec!["login.title", "Sign in", "登录"],
        vec!["login.submit", "Go", ""],
        vec!["logout", "Bye", "再见"],
    ])
}

#[test]
fn single_sheet_writes_one_file_per_language() {
    let out = tempfile::tempdir().unwrap();
    let wb = Workbook::new(vec![Sheet::new("Sheet1", strings_table())]);
    let km = Keymap::from_pairs([("ENG", "en"), ("CHS", "zh")]);

    let report = transform_workbook(&wb, "default", &km, &opts(out.path())).unwrap();

    assert!(report.is_success());
    assert_eq!(
        report.written,
        vec![out.path().join("en.json"), out.path().join("zh.json")]
    );
    assert_eq!(
        read_json(&out.path().join("en.json")),
        serde_json::json!({"login": {"title": "Sign in", "submit": "Go"}, "logout": "Bye"})
    );
    assert_eq!(
        read_json(&out.path().join("zh.json")),
        serde_json::json!({"login": {"title": "登录"}, "logout": "再见"})
    );
}

#[test]
fn output_is_pretty_printed_in_key_order() {
    let out = tempfile::tempdir().unwrap();
    let wb = Workbook::new(vec![Sheet::new(
        "Sheet1",
        Table::from_rows([vec!["key", "ENG"], vec!["z", "1"], vec!["a.b", "2"]]),
    )]);
    let km = Keymap::from_pairs([("ENG", "en")]);
    transform_workbook(&wb, "default", &km, &opts(out.path())).unwrap();

    let text = fs::read_to_string(out.path().join("en.json")).unwrap();
    assert_eq!(text, "{\n    \"z\": \"1\",\n    \"a\": {\n        \"b\": \"2\"\n    }\n}");
}

#[test]
fn multi_sheet_writes_namespaced_files() {
    let out = tempfile::tempdir().unwrap();
    let wb = Workbook::new(vec![
        Sheet::new(
            "common",
            Table::from_rows([vec!["key", "ENG"], vec!["ok", "OK"]]),
        ),
        Sheet::new(
            "auth",
            Table::from_rows([vec!["key", "ENG"], vec!["login", "Log in"]]),
        ),
    ]);
    let km = Keymap::from_pairs([("ENG", "en")]);

    let report = transform_workbook(&wb, "default", &km, &opts(out.path())).unwrap();

    assert!(report.is_success());
    let common = out.path().join("en").join("common.json");
    let auth = out.path().join("en").join("auth.json");
    assert_eq!(report.written, vec![common.clone(), auth.clone()]);
    assert_eq!(read_json(&common), serde_json::json!({"ok": "OK"}));
    assert_eq!(read_json(&auth), serde_json::json!({"login": "Log in"}));
}

#[test]
fn unknown_header_fails_only_that_column() {
    let out = tempfile::tempdir().unwrap();
    let wb = Workbook::new(vec![Sheet::new("Sheet1", strings_table())]);
    let km = Keymap::from_pairs([("CHS", "zh")]);

    let report = transform_workbook(&wb, "site", &km, &opts(out.path())).unwrap();

    assert_eq!(report.written, vec![out.path().join("zh.json")]);
    assert_eq!(report.failures.len(), 1);
    let failure = &report.failures[0];
    assert_eq!(failure.context.column.as_deref(), Some("ENG"));
    assert!(matches!(
        &failure.error,
        LangError::UnknownKeymapEntry { header, keymap } if header == "ENG" && keymap == "site"
    ));
    // No malformed file name is ever produced.
    let names: Vec<String> = fs::read_dir(out.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["zh.json"]);
}

#[test]
fn malformed_sheet_does_not_stop_siblings() {
    let out = tempfile::tempdir().unwrap();
    let wb = Workbook::new(vec![
        Sheet::new("broken", Table::from_rows([vec!["id", "ENG"], vec!["a", "1"]])),
        Sheet::new("good", Table::from_rows([vec!["key", "ENG"], vec!["a", "1"]])),
    ]);
    let km = Keymap::from_pairs([("ENG", "en")]);

    let report = transform_workbook(&wb, "default", &km, &opts(out.path())).unwrap();

    assert_eq!(report.written, vec![out.path().join("en").join("good.json")]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].context.sheet.as_deref(), Some("broken"));
    assert!(matches!(report.failures[0].error, LangError::MalformedTable { .. }));
}

#[test]
fn existing_files_are_replaced() {
    let out = tempfile::tempdir().unwrap();
    fs::write(out.path().join("en.json"), "stale").unwrap();
    let wb = Workbook::new(vec![Sheet::new(
        "Sheet1",
        Table::from_rows([vec!["key", "ENG"], vec!["a", "fresh"]]),
    )]);
    let km = Keymap::from_pairs([("ENG", "en")]);

    transform_workbook(&wb, "default", &km, &opts(out.path())).unwrap();

    assert_eq!(
        read_json(&out.path().join("en.json")),
        serde_json::json!({"a": "fresh"})
    );
}

#[test]
fn placeholder_and_flat_options_apply_to_every_file() {
    let out = tempfile::tempdir().unwrap();
    let wb = Workbook::new(vec![Sheet::new("Sheet1", strings_table())]);
    let km = Keymap::from_pairs([("ENG", "en"), ("CHS", "zh")]);
    let options = TransOptions {
        flat: true,
        placeholder: Some("N/A".to_string()),
        ..opts(out.path())
    };

    transform_workbook(&wb, "default", &km, &options).unwrap();

    assert_eq!(
        read_json(&out.path().join("zh.json")),
        serde_json::json!({"login.title": "登录", "login.submit": "N/A", "logout": "再见"})
    );
}

#[test]
fn output_directory_is_created() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("nested").join("locales");
    let wb = Workbook::new(vec![Sheet::new(
        "Sheet1",
        Table::from_rows([vec!["key", "ENG"], vec!["a", "1"]]),
    )]);
    let km = Keymap::from_pairs([("ENG", "en")]);

    transform_workbook(&wb, "default", &km, &opts(&out)).unwrap();

    assert!(out.join("en.json").is_file());
}

#[test]
fn empty_workbook_is_rejected() {
    let out = tempfile::tempdir().unwrap();
    let err = transform_workbook(
        &Workbook::default(),
        "default",
        &Keymap::default(),
        &opts(out.path()),
    )
    .unwrap_err();
    assert!(matches!(err, LangError::MalformedTable { .. }));
}

#[test]
fn trans_from_csv_path_with_fs_store() {
    let tmp = tempfile::tempdir().unwrap();
    let input = tmp.path().join("strings.csv");
    fs::write(&input, "Key,English\nhome.title,Home\nhome.empty,\n").unwrap();

    let store = FsKeymapStore::new(tmp.path().join("keymap"));
    store
        .create("site", &Keymap::from_pairs([("English", "en-US")]))
        .unwrap();

    let out = tmp.path().join("out");
    let options = TransOptions {
        keymap_name: Some("site".to_string()),
        ..opts(&out)
    };
    let report = trans_from_path(&input, &store, "default", &options).unwrap();

    assert!(report.is_success());
    assert_eq!(
        read_json(&out.join("en-US.json")),
        serde_json::json!({"home": {"title": "Home"}})
    );
}

#[test]
fn trans_from_path_fails_fast_on_missing_keymap() {
    let tmp = tempfile::tempdir().unwrap();
    let input = tmp.path().join("strings.csv");
    fs::write(&input, "key,ENG\na,1\n").unwrap();
    let out = tmp.path().join("out");

    let store = MemoryKeymapStore::new();
    let err = trans_from_path(&input, &store, "default", &opts(&out)).unwrap_err();

    assert!(matches!(err, LangError::KeymapNotFound { ref name } if name == "default"));
    assert!(!out.exists());
}
