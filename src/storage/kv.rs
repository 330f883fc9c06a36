use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

fn sanitize_filename(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct StoreSettings {
    /// Logical store name; also the snapshot file stem.
    pub name: String,
    /// Optional persistence settings. `None` keeps the store purely in memory.
    #[serde(default)]
    pub persistence: Option<PersistenceSettings>,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self { name: "local-storage".into(), persistence: None }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct PersistenceSettings {
    /// Write the whole store to disk after every mutation.
    #[serde(default = "PersistenceSettings::default_enabled")]
    pub enabled: bool,
    /// Pretty-print the snapshot (handy when inspecting a profile by hand).
    #[serde(default)]
    pub pretty: bool,
}

impl PersistenceSettings {
    fn default_enabled() -> bool { true }
}

impl Default for PersistenceSettings {
    fn default() -> Self { Self { enabled: true, pretty: false } }
}

#[derive(Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    saved_at: chrono::DateTime<chrono::Utc>,
    entries: BTreeMap<String, String>,
}

/// Durable string key-value store with `localStorage` semantics.
///
/// Values are plain strings; typed callers go through [`KvStore::get_json`] and
/// [`KvStore::set_json`]. When persistence is enabled every mutation rewrites the
/// snapshot file (`<dir>/<name>.json`) via a temp file + rename, so a crash never
/// leaves a half-written profile behind.
#[derive(Clone)]
pub struct KvStore {
    pub(crate) settings: StoreSettings,
    dir: Option<PathBuf>,
    map: Arc<parking_lot::RwLock<BTreeMap<String, String>>>,
    /// Serializes snapshot writes so two mutations never race on the temp file
    write_lock: Arc<parking_lot::Mutex<()>>,
}

impl KvStore {
    /// A store that lives only as long as the process.
    pub fn in_memory(name: &str) -> Self {
        let settings = StoreSettings { name: name.to_string(), persistence: None };
        Self {
            settings,
            dir: None,
            map: Arc::new(parking_lot::RwLock::new(BTreeMap::new())),
            write_lock: Arc::new(parking_lot::Mutex::new(())),
        }
    }

    /// Open (or create) a durable store under `dir`, loading an existing snapshot.
    pub fn open(dir: impl AsRef<Path>, name: &str) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir).with_context(|| format!("creating storage dir {}", dir.display()))?;
        let settings = StoreSettings { name: name.to_string(), persistence: Some(PersistenceSettings::default()) };
        let s = Self {
            settings,
            dir: Some(dir),
            map: Arc::new(parking_lot::RwLock::new(BTreeMap::new())),
            write_lock: Arc::new(parking_lot::Mutex::new(())),
        };
        s.load_snapshot()?;
        Ok(s)
    }

    pub fn name(&self) -> &str { &self.settings.name }

    fn persistent(&self) -> bool {
        self.dir.is_some() && self.settings.persistence.as_ref().map(|p| p.enabled).unwrap_or(false)
    }

    fn snapshot_path(&self) -> Option<PathBuf> {
        self.dir.as_ref().map(|d| d.join(format!("{}.json", sanitize_filename(&self.settings.name))))
    }

    /// Load snapshot from disk into memory. A missing file is an empty store.
    pub fn load_snapshot(&self) -> Result<()> {
        let Some(path) = self.snapshot_path() else { return Ok(()); };
        if !path.exists() { return Ok(()); }
        let bytes = std::fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
        let snap: Snapshot = match serde_json::from_slice(&bytes) {
            Ok(s) => s,
            Err(e) => {
                // A corrupt profile should not lock the user out; start empty instead
                warn!(target: "libris::storage", "ignoring unreadable snapshot {}: {}", path.display(), e);
                return Ok(());
            }
        };
        let mut w = self.map.write();
        *w = snap.entries;
        debug!(target: "libris::storage", "loaded {} keys from {}", w.len(), path.display());
        Ok(())
    }

    fn save_snapshot(&self) -> Result<()> {
        if !self.persistent() { return Ok(()); }
        let Some(path) = self.snapshot_path() else { return Ok(()); };
        let _guard = self.write_lock.lock();
        let snap = Snapshot { version: 1, saved_at: chrono::Utc::now(), entries: self.map.read().clone() };
        let pretty = self.settings.persistence.as_ref().map(|p| p.pretty).unwrap_or(false);
        let bytes = if pretty { serde_json::to_vec_pretty(&snap)? } else { serde_json::to_vec(&snap)? };
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, bytes).with_context(|| format!("writing {}", tmp.display()))?;
        std::fs::rename(&tmp, &path).with_context(|| format!("replacing {}", path.display()))?;
        Ok(())
    }

    pub fn get_item(&self, key: &str) -> Option<String> { self.map.read().get(key).cloned() }

    pub fn set_item(&self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        self.map.write().insert(key.into(), value.into());
        self.save_snapshot()
    }

    /// Remove a key. Returns whether it existed.
    pub fn remove_item(&self, key: &str) -> Result<bool> {
        let existed = self.map.write().remove(key).is_some();
        if existed { self.save_snapshot()?; }
        Ok(existed)
    }

    /// Decode a JSON value stored under `key`. Undecodable values read as absent.
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.get_item(key)?;
        match serde_json::from_str(&raw) {
            Ok(v) => Some(v),
            Err(e) => {
                debug!(target: "libris::storage", "key '{}' holds malformed JSON: {}", key, e);
                None
            }
        }
    }

    pub fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.set_item(key, raw)
    }

    pub fn clear(&self) -> Result<()> {
        self.map.write().clear();
        self.save_snapshot()
    }

    pub fn len(&self) -> usize { self.map.read().len() }
    pub fn is_empty(&self) -> bool { self.map.read().is_empty() }
    /// Return a snapshot of all keys in this store
    pub fn keys(&self) -> Vec<String> { self.map.read().keys().cloned().collect() }
}
