//! Registry Store - durable URL → entry mapping
//!
//! The JSON file is the system of record; nothing is cached in memory.
//! Every read parses the file under a shared lock. Every write takes the
//! exclusive lock, re-reads the file, mutates and replaces it atomically
//! (temp file, fsync, rename), so readers never see a partial registry and
//! concurrent writers never lose an update.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use tracing::{debug, info};

use crate::models::errors::{AppError, AppResult};
use crate::models::types::MaliciousUrlEntry;

pub struct RegistryStore {
    path: PathBuf,
    /// Serializes file access inside this process
    lock: RwLock<()>,
    closed: AtomicBool,
}

impl RegistryStore {
    /// Open the registry at `path`, creating an empty `[]` file if absent.
    ///
    /// Fails when the existing file cannot be read or is not a JSON array of
    /// entries.
    pub fn open(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                AppError::registry_io(format!("Cannot create {}", parent.display()), e)
            })?;
        }

        let store = Self {
            path,
            lock: RwLock::new(()),
            closed: AtomicBool::new(false),
        };

        if store.path.exists() {
            let entries = store.load()?;
            info!("📒 Registry opened: {} ({} entries)", store.path.display(), entries.len());
        } else {
            store.persist(&[])?;
            info!("📒 Registry created: {}", store.path.display());
        }

        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Mark the store closed; later operations fail with `REGISTRY_CLOSED`
    pub fn close(&self) {
        let _guard = self.lock.write();
        if !self.closed.swap(true, Ordering::SeqCst) {
            info!("📒 Registry closed: {}", self.path.display());
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Full registry in insertion order, as of the latest completed write
    pub fn read(&self) -> AppResult<Vec<MaliciousUrlEntry>> {
        let _guard = self.lock.read();
        self.ensure_open()?;
        self.load()
    }

    /// Append `entry`, or replace the entry with the same exact `url` in place
    pub fn upsert(&self, entry: MaliciousUrlEntry) -> AppResult<()> {
        let _guard = self.lock.write();
        self.ensure_open()?;

        let mut entries = self.load()?;
        match entries.iter_mut().find(|e| e.url == entry.url) {
            Some(existing) => {
                debug!(url = %entry.url, "replacing registry entry");
                *existing = entry;
            }
            None => {
                debug!(url = %entry.url, "appending registry entry");
                entries.push(entry);
            }
        }

        self.persist(&entries)
    }

    /// Store a community report.
    ///
    /// Like `upsert`, but an existing entry keeps its `verified` flag: only
    /// `set_verified` changes it. Returns the entry as stored.
    pub fn report(&self, mut entry: MaliciousUrlEntry) -> AppResult<MaliciousUrlEntry> {
        let _guard = self.lock.write();
        self.ensure_open()?;

        let mut entries = self.load()?;
        match entries.iter_mut().find(|e| e.url == entry.url) {
            Some(existing) => {
                debug!(url = %entry.url, verified = existing.verified, "re-report of known url");
                entry.verified = existing.verified;
                *existing = entry.clone();
            }
            None => entries.push(entry.clone()),
        }

        self.persist(&entries)?;
        Ok(entry)
    }

    /// Set `verified` on the entry keyed by `url`.
    ///
    /// Returns whether an entry was found; an absent url leaves the file
    /// untouched.
    pub fn set_verified(&self, url: &str, verified: bool) -> AppResult<bool> {
        let _guard = self.lock.write();
        self.ensure_open()?;

        let mut entries = self.load()?;
        let Some(entry) = entries.iter_mut().find(|e| e.url == url) else {
            return Ok(false);
        };

        entry.verified = verified;
        self.persist(&entries)?;
        Ok(true)
    }

    fn ensure_open(&self) -> AppResult<()> {
        if self.is_closed() {
            return Err(AppError::registry_closed());
        }
        Ok(())
    }

    fn load(&self) -> AppResult<Vec<MaliciousUrlEntry>> {
        let content = fs::read_to_string(&self.path).map_err(|e| {
            AppError::registry_io(format!("Cannot read {}", self.path.display()), e)
        })?;

        serde_json::from_str(&content).map_err(|e| {
            AppError::registry_corrupt(format!("Invalid registry file {}", self.path.display()), e)
        })
    }

    fn persist(&self, entries: &[MaliciousUrlEntry]) -> AppResult<()> {
        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| AppError::registry_corrupt("Cannot serialize registry", e))?;

        let tmp_path = self.tmp_path();
        let write_tmp = || -> std::io::Result<()> {
            let mut file = File::create(&tmp_path)?;
            file.write_all(json.as_bytes())?;
            file.sync_all()
        };
        write_tmp().map_err(|e| {
            AppError::registry_io(format!("Cannot write {}", tmp_path.display()), e)
        })?;

        fs::rename(&tmp_path, &self.path).map_err(|e| {
            AppError::registry_io(format!("Cannot replace {}", self.path.display()), e)
        })
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".tmp");
        PathBuf::from(name)
    }
}

impl std::fmt::Debug for RegistryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryStore")
            .field("path", &self.path)
            .field("closed", &self.is_closed())
            .finish()
    }
}
