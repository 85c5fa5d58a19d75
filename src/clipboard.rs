//! Clipboard sinks for picked rows.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::Mutex;

use crate::error::{LangError, LangResult};

/// Receives the text of a successful pick.
pub trait ClipboardSink {
    fn set_text(&self, text: &str) -> LangResult<()>;
}

/// Keeps the last text in memory.
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    contents: Mutex<Option<String>>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last text set, if any.
    pub fn contents(&self) -> Option<String> {
        self.contents.lock().ok().and_then(|c| c.clone())
    }
}

impl ClipboardSink for MemoryClipboard {
    fn set_text(&self, text: &str) -> LangResult<()> {
        let mut guard = self.contents.lock().map_err(|_| LangError::Clipboard {
            message: "clipboard lock poisoned".to_string(),
        })?;
        *guard = Some(text.to_string());
        Ok(())
    }
}

/// Copies text through the platform's clipboard utility (`pbcopy`, `clip`, `wl-copy`, `xclip`
/// or `xsel`), fed on stdin.
#[derive(Debug, Clone)]
pub struct SystemClipboard {
    program: PathBuf,
    args: Vec<&'static str>,
}

impl SystemClipboard {
    /// Find the first available clipboard utility on `PATH`.
    pub fn detect() -> LangResult<Self> {
        let candidates: Vec<(&str, Vec<&'static str>)> = if cfg!(target_os = "macos") {
            vec![("pbcopy", vec![])]
        } else if cfg!(windows) {
            vec![("clip", vec![])]
        } else {
            vec![
                ("wl-copy", vec![]),
                ("xclip", vec!["-selection", "clipboard"]),
                ("xsel", vec!["--clipboard", "--input"]),
            ]
        };

        for (name, args) in &candidates {
            if let Ok(program) = which::which(name) {
                return Ok(Self {
                    program,
                    args: args.clone(),
                });
            }
        }

        let names: Vec<&str> = candidates.iter().map(|(n, _)| *n).collect();
        Err(LangError::Clipboard {
            message: format!("no clipboard utility found (tried {})", names.join(", ")),
        })
    }
}

impl ClipboardSink for SystemClipboard {
    fn set_text(&self, text: &str) -> LangResult<()> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| LangError::Clipboard {
                message: format!("failed to run {}: {e}", self.program.display()),
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes())?;
        }

        let output = child.wait_with_output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(LangError::Clipboard {
                message: format!(
                    "{} failed (exit {}): {}",
                    self.program.display(),
                    output.status.code().unwrap_or(-1),
                    stderr.trim()
                ),
            });
        }
        Ok(())
    }
}
