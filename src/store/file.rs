use std::collections::BTreeMap;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use file_lock::{FileLock, FileOptions};
use log::{debug, warn};

use crate::dirs::ensure_parent_exists;

use super::TokenStore;

/// A token store backed by a JSON object file, e.g. `{"refresh_token": "..."}`.
///
/// Every access takes an exclusive file lock, so concurrent invocations never see a half
/// written file or lose each other's updates.
pub struct FileTokenStore {
    path: PathBuf,

    // OS file locks are held per process, they do not exclude threads sharing this store.
    guard: Mutex<()>,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<BTreeMap<String, String>> {
        let lock_opts = FileOptions::new().read(true);
        let mut lock = match FileLock::lock(&self.path, true, lock_opts) {
            Ok(lock) => lock,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("lock token file '{}'", self.path.display()))
            }
        };

        let mut data = Vec::new();
        lock.file
            .read_to_end(&mut data)
            .with_context(|| format!("read token file '{}'", self.path.display()))?;
        Ok(Self::decode(&data))
    }

    /// Apply `update` to the stored map while holding the lock for the whole
    /// read-modify-write cycle.
    fn update<F>(&self, update: F) -> Result<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let _guard = self
            .guard
            .lock()
            .map_err(|_| anyhow!("token file guard poisoned"))?;
        ensure_parent_exists(&self.path).context("ensure token file directory")?;

        let lock_opts = FileOptions::new().read(true).write(true).create(true);
        let mut lock = FileLock::lock(&self.path, true, lock_opts)
            .with_context(|| format!("lock token file '{}'", self.path.display()))?;

        let mut data = Vec::new();
        lock.file
            .read_to_end(&mut data)
            .with_context(|| format!("read token file '{}'", self.path.display()))?;
        let mut tokens = Self::decode(&data);

        update(&mut tokens);

        let data = serde_json::to_vec_pretty(&tokens).context("encode token file")?;
        lock.file.set_len(0)?;
        lock.file.seek(SeekFrom::Start(0))?;
        lock.file
            .write_all(&data)
            .with_context(|| format!("write token file '{}'", self.path.display()))?;
        lock.file.flush()?;
        Ok(())
    }

    fn decode(data: &[u8]) -> BTreeMap<String, String> {
        if data.is_empty() {
            return BTreeMap::new();
        }
        match serde_json::from_slice(data) {
            Ok(tokens) => tokens,
            Err(_) => {
                warn!("Token file has invalid data, we will ignore it");
                BTreeMap::new()
            }
        }
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let mut tokens = self.read()?;
        Ok(tokens.remove(key).filter(|value| !value.is_empty()))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        debug!("Save '{key}' to token file '{}'", self.path.display());
        self.update(|tokens| {
            tokens.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        if !self.path.exists() {
            return Ok(());
        }
        debug!("Remove '{key}' from token file '{}'", self.path.display());
        self.update(|tokens| {
            tokens.remove(key);
        })
    }
}
