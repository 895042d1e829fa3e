use crate::snapshot::Snapshot;
use color_eyre::eyre::{
    Result,
    WrapErr,
    eyre,
};
use std::{
    collections::HashMap,
    fs,
    io::ErrorKind,
    path::{
        Path,
        PathBuf,
    },
    sync::{
        Arc,
        Mutex,
    },
};
use tracing::{
    debug,
    warn,
};

pub const STATE_KEY: &str = "family-bingo-state";

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    fn remove(&mut self, key: &str) -> Result<()>;
}

/// One `<key>.json` file per key inside a state directory.
#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.exists() {
            fs::create_dir_all(&root).wrap_err_with(|| {
                format!("Failed to create state directory {}", root.display())
            })?;
        }
        Ok(Self { root })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(eyre!("Invalid store key {key:?}"));
        }
        Ok(self.root.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.entry_path(key)?;
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err)
                .wrap_err_with(|| format!("Failed to read {}", path.display())),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.entry_path(key)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)
            .wrap_err_with(|| format!("Failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &path)
            .wrap_err_with(|| format!("Failed to replace {}", path.display()))?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let path = self.entry_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err)
                .wrap_err_with(|| format!("Failed to remove {}", path.display())),
        }
    }
}

/// Shared in-memory map. Clones see the same entries.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(key: &str, value: &str) -> Self {
        let store = Self::new();
        if let Ok(mut entries) = store.entries.lock() {
            entries.insert(key.to_string(), value.to_string());
        }
        store
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| eyre!("memory store lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| eyre!("memory store lock poisoned"))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| eyre!("memory store lock poisoned"))?;
        entries.remove(key);
        Ok(())
    }
}

/// Reads and writes the game snapshot under [`STATE_KEY`].
#[derive(Debug)]
pub struct SnapshotRepository<S> {
    store: S,
}

impl<S: KeyValueStore> SnapshotRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Loads the stored snapshot. Unreadable or corrupt state is logged and
    /// replaced by the default snapshot.
    pub fn load(&self) -> Snapshot {
        let raw = match self.store.get(STATE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("no saved game found");
                return Snapshot::default();
            }
            Err(err) => {
                warn!(?err, "failed to read saved game; starting fresh");
                return Snapshot::default();
            }
        };
        match Snapshot::from_json(&raw) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(%err, "saved game is corrupt; starting fresh");
                Snapshot::default()
            }
        }
    }

    pub fn save(&mut self, snapshot: &Snapshot) -> Result<()> {
        let json = snapshot
            .to_json()
            .wrap_err("Failed to serialize game snapshot")?;
        self.store
            .set(STATE_KEY, &json)
            .wrap_err("Failed to persist game snapshot")
    }
}
