//! Directory-backed session store shared between processes.
//!
//! Layout under the configured directory:
//!
//! ```text
//! <id>.json        one pretty-printed SessionRecord per session
//! .locks/NN.lock   advisory lock stripes (fs2), NN = fnv1a(id) % 64
//! ```
//!
//! Writers take the stripe lock exclusively, write a temp file, fsync it and
//! rename it over the record, so readers never see a torn record.  Readers
//! take the stripe lock shared.  Every service process pointed at the same
//! directory therefore sees a single, linearizable copy of each session.
//! Lock files are never deleted: unlinking a lock another process has open
//! would silently split the lock.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;

use sb_domain::config::MAX_FILE_ID_LEN;
use sb_domain::error::{Error, Result};

use crate::id::SessionId;
use crate::record::SessionRecord;
use crate::store::{CasOutcome, SessionStore};

const LOCK_STRIPES: u64 = 64;

pub struct FileStore {
    dir: PathBuf,
    lock_dir: PathBuf,
}

#[derive(Clone, Copy)]
enum LockMode {
    Shared,
    Exclusive,
}

/// Holds a stripe lock until dropped.
struct StripeGuard {
    file: File,
}

impl Drop for StripeGuard {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

fn unavailable(path: &Path, e: io::Error) -> Error {
    Error::StoreUnavailable(format!("{}: {e}", path.display()))
}

fn stripe(id: &SessionId) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for b in id.as_str().bytes() {
        hash ^= u64::from(b);
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    hash % LOCK_STRIPES
}

impl FileStore {
    /// Open (creating if needed) the store rooted at `dir`.
    pub fn open(dir: &Path) -> Result<Self> {
        let lock_dir = dir.join(".locks");
        fs::create_dir_all(&lock_dir).map_err(|e| unavailable(&lock_dir, e))?;

        let store = Self {
            dir: dir.to_path_buf(),
            lock_dir,
        };

        tracing::info!(
            sessions = store.len()?,
            path = %dir.display(),
            "file session store opened"
        );

        Ok(store)
    }

    fn record_path(&self, id: &SessionId) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    fn lock(&self, id: &SessionId, mode: LockMode) -> Result<StripeGuard> {
        let path = self.lock_dir.join(format!("{:02}.lock", stripe(id)));
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|e| unavailable(&path, e))?;
        let locked = match mode {
            LockMode::Shared => FileExt::lock_shared(&file),
            LockMode::Exclusive => FileExt::lock_exclusive(&file),
        };
        locked.map_err(|e| unavailable(&path, e))?;
        Ok(StripeGuard { file })
    }

    /// Read a record file.  Caller holds the stripe lock.
    fn read_record(&self, id: &SessionId) -> Result<Option<SessionRecord>> {
        let path = self.record_path(id);
        match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).map(Some).map_err(|e| {
                Error::StoreUnavailable(format!("corrupt session file {}: {e}", path.display()))
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(unavailable(&path, e)),
        }
    }

    /// Atomically replace a record file.  Caller holds the stripe lock
    /// exclusively.
    fn write_record(&self, record: &SessionRecord, version: u64) -> Result<()> {
        let mut stored = record.clone();
        stored.version = version;
        let json = serde_json::to_vec_pretty(&stored)?;

        let path = self.record_path(&record.id);
        let tmp = self
            .dir
            .join(format!(".{}.{:016x}.tmp", record.id, rand::random::<u64>()));

        let written = File::create(&tmp).and_then(|mut f| {
            f.write_all(&json)?;
            f.sync_all()
        });
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp);
            return Err(unavailable(&tmp, e));
        }

        fs::rename(&tmp, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            unavailable(&path, e)
        })
    }

    /// Remove temp files left by writers that died between write and rename.
    /// No write holds its temp file longer than a session's idle lifetime,
    /// so anything last modified before `cutoff` is abandoned.
    fn remove_stale_temp_files(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let entries = fs::read_dir(&self.dir).map_err(|e| unavailable(&self.dir, e))?;
        let mut removed = 0;
        for entry in entries {
            let entry = entry.map_err(|e| unavailable(&self.dir, e))?;
            let name = entry.file_name();
            let is_temp = name
                .to_str()
                .is_some_and(|n| n.starts_with('.') && n.ends_with(".tmp"));
            if !is_temp {
                continue;
            }
            let stale = entry
                .metadata()
                .and_then(|m| m.modified())
                .map(|modified| DateTime::<Utc>::from(modified) < cutoff)
                .unwrap_or(false);
            if !stale {
                continue;
            }
            match fs::remove_file(entry.path()) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(path = %entry.path().display(), error = %e, "failed to remove stale temp file");
                }
            }
        }
        Ok(removed)
    }

    /// Ids of every record file in the directory.  Foreign files are skipped.
    fn ids(&self) -> Result<Vec<SessionId>> {
        let entries = fs::read_dir(&self.dir).map_err(|e| unavailable(&self.dir, e))?;
        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| unavailable(&self.dir, e))?;
            let name = entry.file_name();
            let Some(stem) = name.to_str().and_then(|n| n.strip_suffix(".json")) else {
                continue;
            };
            if let Ok(id) = SessionId::parse(stem, usize::MAX) {
                ids.push(id);
            }
        }
        Ok(ids)
    }
}

impl SessionStore for FileStore {
    fn backend(&self) -> &'static str {
        "file"
    }

    fn get(&self, id: &SessionId) -> Result<SessionRecord> {
        let _guard = self.lock(id, LockMode::Shared)?;
        self.read_record(id)?
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    fn put(&self, record: &SessionRecord) -> Result<()> {
        let _guard = self.lock(&record.id, LockMode::Exclusive)?;
        let next = self.read_record(&record.id)?.map_or(0, |r| r.version) + 1;
        self.write_record(record, next)
    }

    fn delete(&self, id: &SessionId) -> Result<()> {
        let _guard = self.lock(id, LockMode::Exclusive)?;
        let path = self.record_path(id);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(Error::NotFound(id.to_string())),
            Err(e) => Err(unavailable(&path, e)),
        }
    }

    fn compare_and_swap(
        &self,
        record: &SessionRecord,
        expected: Option<u64>,
    ) -> Result<CasOutcome> {
        let _guard = self.lock(&record.id, LockMode::Exclusive)?;
        let current = self.read_record(&record.id)?.map(|r| r.version);
        if current != expected {
            return Ok(CasOutcome::Conflict);
        }
        let next = expected.unwrap_or(0) + 1;
        self.write_record(record, next)?;
        Ok(CasOutcome::Stored(next))
    }

    fn purge_expired(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let mut removed = 0;
        for id in self.ids()? {
            let _guard = self.lock(&id, LockMode::Exclusive)?;
            match self.read_record(&id) {
                Ok(Some(record)) if record.last_accessed_at < cutoff => {
                    let path = self.record_path(&id);
                    match fs::remove_file(&path) {
                        Ok(()) => removed += 1,
                        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                        Err(e) => return Err(unavailable(&path, e)),
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(session_id = %id, error = %e, "skipping unreadable session during purge");
                }
            }
        }

        let temp_files = self.remove_stale_temp_files(cutoff)?;
        if temp_files > 0 {
            tracing::info!(temp_files, "removed abandoned session temp files");
        }
        Ok(removed)
    }

    fn len(&self) -> Result<usize> {
        Ok(self.ids()?.len())
    }

    fn max_id_len(&self) -> Option<usize> {
        Some(MAX_FILE_ID_LEN)
    }
}
