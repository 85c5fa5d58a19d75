//! Transform options and the persisted CLI configuration.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{LangError, LangResult};
use crate::keymap::FsKeymapStore;
use crate::observability::{LangObserver, Severity};
use crate::output::write_atomic;

/// Name of the keymap used when nothing else is configured.
pub const DEFAULT_KEYMAP_NAME: &str = "default";

/// Environment variable overriding the application directory.
pub const HOME_ENV: &str = "LANG_UTIL_HOME";

/// Options controlling a transform.
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct TransOptions {
    /// Treat every key as a literal top-level key, ignoring dots.
    pub flat: bool,
    /// Value written for empty cells. `None` (or an empty string) drops the entry instead.
    pub placeholder: Option<String>,
    /// Keymap to use. `None` means the one selected in [`CliConfig`].
    pub keymap_name: Option<String>,
    /// Root directory for output files.
    pub output_dir: PathBuf,
    /// Optional observer for diagnostics/logging.
    pub observer: Option<Arc<dyn LangObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: Severity,
}

impl fmt::Debug for TransOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransOptions")
            .field("flat", &self.flat)
            .field("placeholder", &self.placeholder)
            .field("keymap_name", &self.keymap_name)
            .field("output_dir", &self.output_dir)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for TransOptions {
    fn default() -> Self {
        Self {
            flat: false,
            placeholder: None,
            keymap_name: None,
            output_dir: PathBuf::from("."),
            observer: None,
            alert_at_or_above: Severity::Critical,
        }
    }
}

impl TransOptions {
    /// Placeholder, if set and non-empty.
    pub fn placeholder(&self) -> Option<&str> {
        self.placeholder.as_deref().filter(|p| !p.is_empty())
    }
}

/// Settings persisted between CLI runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CliConfig {
    /// Keymap used by `trans` when `--use` is not given.
    pub use_keymap: String,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            use_keymap: DEFAULT_KEYMAP_NAME.to_string(),
        }
    }
}

impl CliConfig {
    /// Load from `path`; a missing file yields the default config.
    pub fn load(path: &Path) -> LangResult<Self> {
        match fs::read_to_string(path) {
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, path: &Path) -> LangResult<()> {
        let json = serde_json::to_vec_pretty(self)?;
        write_atomic(path, &json)
    }
}

/// Locations of the application's on-disk state.
///
/// ```text
/// <root>/config.json
/// <root>/keymap/<name>.json
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub root: PathBuf,
}

impl AppPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `$LANG_UTIL_HOME` if set, else `<config dir>/lang-util`.
    pub fn resolve() -> LangResult<Self> {
        if let Some(home) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
            return Ok(Self::new(PathBuf::from(home)));
        }
        let base = dirs::config_dir().ok_or_else(|| {
            LangError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("cannot determine config directory; set {HOME_ENV}"),
            ))
        })?;
        Ok(Self::new(base.join("lang-util")))
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join("config.json")
    }

    pub fn keymap_dir(&self) -> PathBuf {
        self.root.join("keymap")
    }

    /// Create the directory layout, the default keymap and config file when missing, then load
    /// the config.
    pub fn init(&self) -> LangResult<(CliConfig, FsKeymapStore)> {
        let store = FsKeymapStore::new(self.keymap_dir());
        store.ensure_default()?;

        let config_file = self.config_file();
        let config = CliConfig::load(&config_file)?;
        if !config_file.exists() {
            config.save(&config_file)?;
        }
        Ok((config, store))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keymap::KeymapStore;

    #[test]
    fn init_creates_layout_once() {
        let dir = tempfile::tempdir().unwrap();
        let paths = AppPaths::new(dir.path());

        let (config, store) = paths.init().unwrap();
        assert_eq!(config.use_keymap, DEFAULT_KEYMAP_NAME);
        assert!(store.exists(DEFAULT_KEYMAP_NAME));
        assert!(paths.config_file().is_file());

        let changed = CliConfig {
            use_keymap: "site".to_string(),
        };
        changed.save(&paths.config_file()).unwrap();
        let (config, _) = paths.init().unwrap();
        assert_eq!(config, changed);
    }

    #[test]
    fn config_uses_camel_case_on_disk() {
        let json = serde_json::to_string(&CliConfig::default()).unwrap();
        assert_eq!(json, r#"{"useKeymap":"default"}"#);
    }

    #[test]
    fn empty_placeholder_is_ignored() {
        let opts = TransOptions {
            placeholder: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(opts.placeholder(), None);
    }
}
