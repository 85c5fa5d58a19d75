// lang-util CLI: spreadsheet translations -> JSON files, row picking, keymap management.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use lang_util::LangError;
use lang_util::clipboard::SystemClipboard;
use lang_util::config::{AppPaths, CliConfig, TransOptions};
use lang_util::ingestion::{IngestionOptions, load_workbook, resolve_input_path};
use lang_util::keymap::{FsKeymapStore, KeymapStore, parse_keymap_entries};
use lang_util::observability::{
    CompositeObserver, EventContext, FileObserver, LangObserver, Severity, StdErrObserver,
};
use lang_util::pick::{PickQuery, pick_to_clipboard};
use lang_util::router::trans_from_path;
use lang_util::table::parse_table;
use lang_util::types::{Sheet, Workbook};

/// Success.
const EXIT_SUCCESS: u8 = 0;
/// General error.
const EXIT_ERROR: u8 = 1;
/// Bad arguments or unparsable user input.
const EXIT_USAGE: u8 = 2;
/// Input file, keymap or key not found.
const EXIT_NOT_FOUND: u8 = 3;
/// Transform finished but some sheets/columns failed.
const EXIT_PARTIAL: u8 = 4;

#[derive(Parser)]
#[command(name = "lang-util")]
#[command(about = "Turn spreadsheet translation tables into JSON files")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Transform a workbook into JSON files
    #[command(after_help = "\
Examples:
  lang-util trans strings.xlsx -o locales
  lang-util trans strings -o locales -p N/A -u site
  lang-util trans flat.csv --flat")]
    Trans {
        /// Input file (.xlsx/.xls/.ods/.csv); `.xlsx` is appended when missing
        filename: String,

        /// Keep dots in keys literal instead of nesting
        #[arg(long, short = 'f')]
        flat: bool,

        /// Output directory (default: current directory)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Value for empty cells (default: leave the entry out)
        #[arg(long, short = 'p')]
        placeholder: Option<String>,

        /// Keymap to use instead of the selected one
        #[arg(long = "use", short = 'u')]
        keymap: Option<String>,

        /// Also append events to this log file
        #[arg(long)]
        log_file: Option<PathBuf>,

        /// Print informational events too
        #[arg(long, short = 'v')]
        verbose: bool,
    },

    /// Copy rows matching a key to the clipboard as tab-separated text
    #[command(after_help = "\
Queries:
  home.title     exact key, first match
  /^home\\./      regex, all matches
  /^home/i       case-insensitive regex

Without --query, keys are read interactively (!q quits, !b goes back to sheet choice).")]
    Pick {
        /// Input file (.xlsx/.xls/.ods/.csv); `.xlsx` is appended when missing
        filename: String,

        /// Include the key column in the copied text
        #[arg(long, short = 'k')]
        key: bool,

        /// Sheet to pick from (default: ask when the workbook has several)
        #[arg(long, short = 's')]
        sheet: Option<String>,

        /// Pick once with this query instead of prompting
        #[arg(long, short = 'q')]
        query: Option<String>,
    },

    /// Manage keymaps (column header -> output name)
    #[command(subcommand)]
    Keymap(KeymapCommands),
}

#[derive(Subcommand)]
enum KeymapCommands {
    /// List keymaps; the one in use is marked
    List,

    /// Select the keymap used by `trans`
    Use { name: String },

    /// Create a keymap from `HEADER=id` pairs, e.g. "ENG=en,CHS=zh"
    Set {
        name: String,
        content: String,

        /// Also select it
        #[arg(long = "use")]
        use_it: bool,
    },

    /// Merge `HEADER=id` pairs into a keymap (created when missing)
    Update { name: String, content: String },

    /// Print a keymap (default: the one in use)
    Print { name: Option<String> },

    /// Delete a keymap
    Delete {
        name: String,

        /// Do not ask for confirmation
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

#[derive(Debug)]
struct CliError {
    code: u8,
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(code: u8, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            hint: None,
        }
    }

    fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<LangError> for CliError {
    fn from(e: LangError) -> Self {
        let code = match &e {
            LangError::KeymapNotFound { .. } | LangError::NotFound { .. } => EXIT_NOT_FOUND,
            LangError::Io(err) if err.kind() == io::ErrorKind::NotFound => EXIT_NOT_FOUND,
            LangError::InvalidKeymapEntry { .. }
            | LangError::InvalidKeymapName { .. }
            | LangError::InvalidOutputId { .. }
            | LangError::InvalidRegex { .. }
            | LangError::UnsupportedFormat { .. } => EXIT_USAGE,
            _ => EXIT_ERROR,
        };
        let err = CliError::new(code, e.to_string());
        match e {
            LangError::KeymapNotFound { .. } => {
                err.with_hint(concat!(
                    "use 'lang-util keymap set' to create it, ",
                    "'lang-util keymap list' to see existing ones"
                ))
            }
            LangError::UnknownKeymapEntry { .. } => {
                err.with_hint("use 'lang-util keymap update' to add the column")
            }
            LangError::InvalidOutputId { .. } => {
                err.with_hint("use 'lang-util keymap update' to give the column a plain file name")
            }
            _ => err,
        }
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        LangError::Io(e).into()
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Trans {
            filename,
            flat,
            output,
            placeholder,
            keymap,
            log_file,
            verbose,
        } => cmd_trans(filename, flat, output, placeholder, keymap, log_file, verbose),
        Commands::Pick {
            filename,
            key,
            sheet,
            query,
        } => cmd_pick(filename, key, sheet, query),
        Commands::Keymap(cmd) => cmd_keymap(cmd),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

fn init_app() -> Result<(AppPaths, CliConfig, FsKeymapStore), CliError> {
    let paths = AppPaths::resolve()?;
    let (config, store) = paths.init()?;
    Ok((paths, config, store))
}

fn cmd_trans(
    filename: String,
    flat: bool,
    output: Option<PathBuf>,
    placeholder: Option<String>,
    keymap: Option<String>,
    log_file: Option<PathBuf>,
    verbose: bool,
) -> Result<(), CliError> {
    let (_, config, store) = init_app()?;

    let stderr = StdErrObserver {
        min_severity: if verbose { Severity::Info } else { Severity::Warning },
    };
    let mut observers: Vec<Arc<dyn LangObserver>> = vec![Arc::new(stderr)];
    if let Some(log) = log_file {
        observers.push(Arc::new(FileObserver::new(log)));
    }

    let options = TransOptions {
        flat,
        placeholder,
        keymap_name: keymap,
        output_dir: output.unwrap_or_else(|| PathBuf::from(".")),
        observer: Some(Arc::new(CompositeObserver::new(observers))),
        alert_at_or_above: Severity::Critical,
    };

    let input = resolve_input_path(&filename);
    let report = trans_from_path(&input, &store, &config.use_keymap, &options)?;

    println!(
        "{} file(s) written, {} failure(s)",
        report.written.len(),
        report.failures.len()
    );
    if report.is_success() {
        Ok(())
    } else {
        let first = &report.failures[0];
        Err(CliError::new(
            EXIT_PARTIAL,
            format!(
                "transform incomplete; first failure at {}: {}",
                first.context, first.error
            ),
        ))
    }
}

enum PickFlow {
    Back,
    Quit,
}

fn cmd_pick(
    filename: String,
    include_key: bool,
    sheet: Option<String>,
    query: Option<String>,
) -> Result<(), CliError> {
    let input = resolve_input_path(&filename);
    let workbook = load_workbook(&input, &IngestionOptions::default())?;
    if workbook.sheets.is_empty() {
        return Err(CliError::new(EXIT_ERROR, "empty sheets"));
    }
    let chosen = preselected_sheet(&workbook, sheet.as_deref())?;
    let query_target = match &query {
        Some(_) => Some(query_sheet(&workbook, chosen)?),
        None => None,
    };

    let clipboard = SystemClipboard::detect()?;
    let observer = StdErrObserver {
        min_severity: Severity::Info,
    };

    if let (Some(q), Some(target)) = (query, query_target) {
        let parsed = parse_table(&target.table)?;
        let ctx = EventContext::sheet(&target.name);
        let query = PickQuery::parse(&q)?;
        let res = pick_to_clipboard(&parsed, &query, include_key, &clipboard, &observer, &ctx)?;
        println!("Success! {} row(s) copied to clipboard", res.rows.len());
        return Ok(());
    }

    let mut prompter = Prompter::new()?;

    if let Some(target) = chosen {
        pick_loop(target, include_key, false, &clipboard, &observer, &mut prompter)?;
        return Ok(());
    }

    loop {
        let Some(name) = prompter.ask(
            "There is more than one sheet; which one do you want to pick from?\n\
             (!l lists sheet names, !q quits)",
        )?
        else {
            return Ok(());
        };
        match name.as_str() {
            "" => continue,
            "!q" => return Ok(()),
            "!l" => {
                for n in workbook.sheet_names() {
                    println!("{n}");
                }
            }
            other => match workbook.sheet(other) {
                Some(target) => {
                    let flow =
                        pick_loop(target, include_key, true, &clipboard, &observer, &mut prompter)?;
                    if let PickFlow::Quit = flow {
                        return Ok(());
                    }
                }
                None => eprintln!("sheet '{other}' not found"),
            },
        }
    }
}

fn sheet_list_hint(workbook: &Workbook) -> String {
    format!("sheets: {}", workbook.sheet_names().collect::<Vec<_>>().join(", "))
}

/// The sheet named with `--sheet`, or the only sheet of a single-sheet workbook.
fn preselected_sheet<'w>(
    workbook: &'w Workbook,
    sheet: Option<&str>,
) -> Result<Option<&'w Sheet>, CliError> {
    match sheet {
        Some(name) => workbook.sheet(name).map(Some).ok_or_else(|| {
            CliError::new(EXIT_NOT_FOUND, format!("sheet '{name}' not found"))
                .with_hint(sheet_list_hint(workbook))
        }),
        None if !workbook.is_multi_sheet() => Ok(workbook.sheets.first()),
        None => Ok(None),
    }
}

/// Non-interactive picks cannot ask which sheet to use.
fn query_sheet<'w>(
    workbook: &'w Workbook,
    chosen: Option<&'w Sheet>,
) -> Result<&'w Sheet, CliError> {
    chosen.ok_or_else(|| {
        CliError::new(
            EXIT_USAGE,
            "workbook has several sheets; choose one with --sheet",
        )
        .with_hint(sheet_list_hint(workbook))
    })
}

fn pick_loop(
    sheet: &Sheet,
    include_key: bool,
    can_go_back: bool,
    clipboard: &SystemClipboard,
    observer: &dyn LangObserver,
    prompter: &mut Prompter,
) -> Result<PickFlow, CliError> {
    let parsed = match parse_table(&sheet.table) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("sheet '{}': {e}", sheet.name);
            return Ok(PickFlow::Back);
        }
    };
    let ctx = EventContext::sheet(&sheet.name);
    let question = if can_go_back {
        "Which key do you want to pick?\n(!b goes back, !q quits)"
    } else {
        "Which key do you want to pick?\n(!q quits)"
    };

    loop {
        let Some(input) = prompter.ask(question)? else {
            return Ok(PickFlow::Quit);
        };
        match input.as_str() {
            "" => continue,
            "!q" => return Ok(PickFlow::Quit),
            "!b" if can_go_back => return Ok(PickFlow::Back),
            q => {
                let outcome = PickQuery::parse(q).and_then(|query| {
                    pick_to_clipboard(&parsed, &query, include_key, clipboard, observer, &ctx)
                });
                match outcome {
                    Ok(res) => println!("Success! {} row(s) copied to clipboard", res.rows.len()),
                    Err(e) => eprintln!("Fail! {e}"),
                }
            }
        }
    }
}

/// Line editor for interactive questions; keeps a history of answers for the session.
struct Prompter {
    editor: DefaultEditor,
}

impl Prompter {
    fn new() -> Result<Self, CliError> {
        let editor = DefaultEditor::new().map_err(|e| {
            CliError::new(EXIT_ERROR, format!("failed to create line editor: {e}"))
        })?;
        Ok(Self { editor })
    }

    /// Print `question`, read one trimmed line. `None` on Ctrl-C or end of input.
    fn ask(&mut self, question: &str) -> Result<Option<String>, CliError> {
        println!("{question}");
        let answer = read_answer(self.editor.readline("> "))?;
        if let Some(line) = answer.as_deref().filter(|l| !l.is_empty()) {
            let _ = self.editor.add_history_entry(line);
        }
        Ok(answer)
    }
}

fn read_answer(line: Result<String, ReadlineError>) -> Result<Option<String>, CliError> {
    match line {
        Ok(line) => Ok(Some(line.trim().to_string())),
        Err(ReadlineError::Interrupted | ReadlineError::Eof) => Ok(None),
        Err(e) => Err(CliError::new(EXIT_ERROR, format!("failed to read input: {e}"))),
    }
}

fn cmd_keymap(cmd: KeymapCommands) -> Result<(), CliError> {
    let (paths, mut config, store) = init_app()?;

    match cmd {
        KeymapCommands::List => {
            for name in store.list()? {
                if name == config.use_keymap {
                    println!("{name} <--");
                } else {
                    println!("{name}");
                }
            }
        }
        KeymapCommands::Use { name } => {
            if !store.exists(&name) {
                return Err(LangError::KeymapNotFound { name }.into());
            }
            config.use_keymap = name.clone();
            config.save(&paths.config_file())?;
            println!("using keymap '{name}'");
        }
        KeymapCommands::Set {
            name,
            content,
            use_it,
        } => {
            let keymap = parse_keymap_entries(&content)?;
            store.create(&name, &keymap)?;
            if use_it {
                config.use_keymap = name.clone();
                config.save(&paths.config_file())?;
            }
            println!("set keymap '{name}'");
            print_json(&keymap)?;
        }
        KeymapCommands::Update { name, content } => {
            let entries = parse_keymap_entries(&content)?;
            let merged = store.update(&name, &entries)?;
            println!("updated keymap '{name}'");
            print_json(&merged)?;
        }
        KeymapCommands::Print { name } => {
            let name = name.unwrap_or_else(|| config.use_keymap.clone());
            let keymap = store.get(&name)?;
            println!("keymap name: {name}\n");
            print_json(&keymap)?;
        }
        KeymapCommands::Delete { name, yes } => {
            if !store.exists(&name) {
                return Err(CliError::from(LangError::KeymapNotFound { name })
                    .with_hint("use 'lang-util keymap list' to list all keymaps"));
            }
            if !yes {
                let answer = Prompter::new()?
                    .ask(&format!("Are you sure you want to delete keymap '{name}'? (y/N)"))?;
                if !matches!(answer.as_deref(), Some("y" | "Y")) {
                    println!("aborted");
                    return Ok(());
                }
            }
            store.delete(&name)?;
            if config.use_keymap == name {
                config = CliConfig::default();
                config.save(&paths.config_file())?;
            }
            println!("deleted keymap '{name}'");
        }
    }
    Ok(())
}

fn print_json(value: &impl serde::Serialize) -> Result<(), CliError> {
    let text = serde_json::to_string_pretty(value).map_err(LangError::from)?;
    println!("{text}");
    Ok(())
}
