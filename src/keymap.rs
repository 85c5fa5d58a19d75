//! Keymaps: column header -> output identifier.
//!
//! A keymap says which spreadsheet column becomes which output file (flat mode) or which
//! output sub-directory (namespace mode), e.g. `{"ENG": "en", "CHS": "zh"}`. Keymaps are
//! stored as named JSON documents; [`FsKeymapStore`] keeps them as `<dir>/<name>.json`.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{LangError, LangResult};
use crate::output::write_atomic;

/// Header -> output identifier mapping, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Keymap {
    entries: IndexMap<String, String>,
}

impl Keymap {
    /// Build a keymap from `(header, id)` pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Output identifier for a column header (exact match).
    pub fn get(&self, header: &str) -> Option<&str> {
        self.entries.get(header).map(String::as_str)
    }

    /// Insert or replace one entry.
    pub fn insert(&mut self, header: impl Into<String>, id: impl Into<String>) {
        self.entries.insert(header.into(), id.into());
    }

    /// Merge `other` into `self`; entries of `other` win.
    pub fn merge(&mut self, other: &Keymap) {
        for (k, v) in &other.entries {
            self.entries.insert(k.clone(), v.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Keymap written by [`FsKeymapStore::ensure_default`] when the store is first created.
pub fn default_keymap() -> Keymap {
    Keymap::from_pairs([("ENG", "en"), ("CHS", "zh")])
}

/// Parse user input of the form `ENG=en,CHS=zh` or `ENG=en CHS=zh`.
///
/// Pairs may be separated by commas or whitespace; blank pairs are ignored. Header and id are
/// trimmed. A pair missing either side is rejected.
pub fn parse_keymap_entries(input: &str) -> LangResult<Keymap> {
    let mut keymap = Keymap::default();
    for pair in input.split(|c: char| c == ',' || c.is_whitespace()) {
        if pair.trim().is_empty() {
            continue;
        }
        let mut parts = pair.splitn(2, '=');
        let header = parts.next().unwrap_or("").trim();
        let id = parts.next().unwrap_or("").trim();
        if header.is_empty() || id.contains('=') || !is_file_stem(id) {
            return Err(LangError::InvalidKeymapEntry {
                pair: pair.to_string(),
            });
        }
        keymap.insert(header, id);
    }
    if keymap.is_empty() {
        return Err(LangError::InvalidKeymapEntry {
            pair: input.to_string(),
        });
    }
    Ok(keymap)
}

/// Read access to named keymaps; all the transform needs.
pub trait KeymapStore {
    /// Load a keymap by name, failing with [`LangError::KeymapNotFound`] when absent.
    fn get(&self, name: &str) -> LangResult<Keymap>;

    /// `true` when a keymap named `name` exists.
    fn exists(&self, name: &str) -> bool {
        self.get(name).is_ok()
    }
}

/// In-memory store, mostly for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MemoryKeymapStore {
    keymaps: IndexMap<String, Keymap>,
}

impl MemoryKeymapStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a named keymap.
    pub fn with(mut self, name: impl Into<String>, keymap: Keymap) -> Self {
        self.keymaps.insert(name.into(), keymap);
        self
    }
}

impl KeymapStore for MemoryKeymapStore {
    fn get(&self, name: &str) -> LangResult<Keymap> {
        self.keymaps
            .get(name)
            .cloned()
            .ok_or_else(|| LangError::KeymapNotFound {
                name: name.to_string(),
            })
    }
}

/// Keymaps stored as `<dir>/<name>.json`.
#[derive(Debug, Clone)]
pub struct FsKeymapStore {
    dir: PathBuf,
}

impl FsKeymapStore {
    /// Store rooted at `dir`. The directory is not created until [`Self::ensure_default`] or
    /// a write.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File path for a keymap name, rejecting names that are not plain file names.
    pub fn path_for(&self, name: &str) -> LangResult<PathBuf> {
        validate_name(name)?;
        Ok(self.dir.join(format!("{name}.json")))
    }

    /// Create the store directory and a `default` keymap if they are missing.
    pub fn ensure_default(&self) -> LangResult<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(crate::config::DEFAULT_KEYMAP_NAME)?;
        if !path.exists() {
            write_keymap(&path, &default_keymap())?;
        }
        Ok(())
    }

    /// Names of all stored keymaps, sorted.
    pub fn list(&self) -> LangResult<Vec<String>> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }
        let pattern = format!(
            "{}/*.json",
            glob::Pattern::escape(&self.dir.to_string_lossy())
        );

        let mut names = Vec::new();
        let paths = glob::glob(&pattern)
            .map_err(|e| LangError::Io(std::io::Error::other(e.to_string())))?;
        for path in paths.flatten() {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Store a new keymap; fails with [`LangError::KeymapExists`] if the name is taken.
    pub fn create(&self, name: &str, keymap: &Keymap) -> LangResult<()> {
        let path = self.path_for(name)?;
        if path.exists() {
            return Err(LangError::KeymapExists {
                name: name.to_string(),
            });
        }
        fs::create_dir_all(&self.dir)?;
        write_keymap(&path, keymap)
    }

    /// Merge `entries` into the named keymap and return the result.
    ///
    /// A missing keymap is created from `entries`.
    pub fn update(&self, name: &str, entries: &Keymap) -> LangResult<Keymap> {
        let path = self.path_for(name)?;
        let mut keymap = if path.exists() {
            read_keymap(&path)?
        } else {
            Keymap::default()
        };
        keymap.merge(entries);
        fs::create_dir_all(&self.dir)?;
        write_keymap(&path, &keymap)?;
        Ok(keymap)
    }

    /// Delete the named keymap.
    pub fn delete(&self, name: &str) -> LangResult<()> {
        let path = self.path_for(name)?;
        if !path.exists() {
            return Err(LangError::KeymapNotFound {
                name: name.to_string(),
            });
        }
        fs::remove_file(path)?;
        Ok(())
    }
}

impl KeymapStore for FsKeymapStore {
    fn get(&self, name: &str) -> LangResult<Keymap> {
        let path = self.path_for(name)?;
        if !path.is_file() {
            return Err(LangError::KeymapNotFound {
                name: name.to_string(),
            });
        }
        read_keymap(&path)
    }

    fn exists(&self, name: &str) -> bool {
        self.path_for(name).map(|p| p.is_file()).unwrap_or(false)
    }
}

/// `true` when `name` can be used as a single path component inside a directory we own.
pub(crate) fn is_file_stem(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name
            .chars()
            .any(|c| matches!(c, '/' | '\\' | ':' | '\0' | '*' | '?' | '[' | ']'))
}

fn validate_name(name: &str) -> LangResult<()> {
    if !is_file_stem(name) {
        return Err(LangError::InvalidKeymapName {
            name: name.to_string(),
        });
    }
    Ok(())
}

fn read_keymap(path: &Path) -> LangResult<Keymap> {
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

fn write_keymap(path: &Path, keymap: &Keymap) -> LangResult<()> {
    let json = serde_json::to_vec_pretty(keymap)?;
    write_atomic(path, &json)
}
