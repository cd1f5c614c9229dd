use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use parking_lot::Mutex;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::i18n::Language;

pub const LANGUAGE_KEY: &str = "appLang";

/// Process-local durable key-value store.
pub trait PreferenceStore: Send + Sync {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;
}

/// Preferences kept as a JSON object in a single file.
#[derive(Debug)]
pub struct FilePreferences {
    path: PathBuf,
}

impl FilePreferences {
    pub fn open(data_dir: &Path) -> anyhow::Result<Self> {
        fs::create_dir_all(data_dir)
            .with_context(|| format!("failed to create {}", data_dir.display()))?;
        Ok(Self {
            path: data_dir.join("prefs.json"),
        })
    }

    fn load(&self) -> anyhow::Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("failed reading {}", self.path.display()))?;
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&raw).with_context(|| format!("failed parsing {}", self.path.display()))
    }
}

impl PreferenceStore for FilePreferences {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.load()?.remove(key))
    }

    #[tracing::instrument(skip(self, value))]
    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let mut map = self.load()?;
        map.insert(key.to_string(), value.to_string());
        let payload = serde_json::to_string_pretty(&map)?;
        write_atomic(&self.path, payload.as_bytes())?;
        debug!(file = %self.path.display(), "saved preference");
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryPreferences {
    map: Mutex<BTreeMap<String, String>>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferences {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.map.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.map.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Reads the language once; anything missing or unreadable falls back to English.
pub fn load_language(prefs: &dyn PreferenceStore) -> Language {
    match prefs.get(LANGUAGE_KEY) {
        Ok(Some(code)) => code.parse().unwrap_or_else(|err| {
            warn!(error = %err, "ignoring stored language preference");
            Language::default()
        }),
        Ok(None) => Language::default(),
        Err(err) => {
            warn!(error = %err, "failed to read language preference");
            Language::default()
        }
    }
}

pub fn save_language(prefs: &dyn PreferenceStore, lang: Language) -> anyhow::Result<()> {
    prefs.set(LANGUAGE_KEY, lang.code())
}

pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(bytes)?;
    temp.flush()?;
    temp.persist(path)
        .map_err(|err| anyhow!("failed to persist {}: {}", path.display(), err))?;
    Ok(())
}
