//! Lock-scoped read-modify-write over one kind's JSONL file.
//!
//! Writers serialize on an exclusive OS file lock over a sibling
//! `<file>.lock`, held from load through save. The lock file itself is never
//! removed; the kernel drops the lock when its holder closes the file or
//! dies. Readers never lock; the rename-based writes in [`crate::jsonl`] keep
//! them consistent.

use crate::entity::Entity;
use crate::jsonl::{JsonlError, read_entities_from_path, write_entities_to_path};
use chrono::Utc;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions, TryLockError};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(10);

/// `<file>.lock` next to the entity file.
pub fn lock_path(entities_path: &Path) -> PathBuf {
    let mut name = OsString::from(entities_path.as_os_str());
    name.push(".lock");
    PathBuf::from(name)
}

/// How long to wait for a busy lock, and how to pace the retries.
#[derive(Debug, Clone)]
pub struct LockOptions {
    pub timeout: Duration,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for LockOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_LOCK_TIMEOUT,
            initial_backoff: Duration::from_millis(5),
            max_backoff: Duration::from_millis(200),
        }
    }
}

/// Failure of a locked mutation. `Rejected` carries the mutator's own error.
#[derive(Debug, thiserror::Error)]
pub enum MutationError<E> {
    #[error("state lock busy after {}ms: {}", .waited.as_millis(), .lock.display())]
    LockBusy { lock: PathBuf, waited: Duration },

    #[error("failed to acquire state lock {}: {source}", .lock.display())]
    LockIo {
        lock: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Store(#[from] JsonlError),

    #[error("{0}")]
    Rejected(E),
}

/// Load a kind's entities, treating a missing file as empty.
pub fn load_entities(path: &Path) -> Result<Vec<Entity>, JsonlError> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "state file absent, starting empty");
        return Ok(Vec::new());
    }
    let entities = read_entities_from_path(path)?;
    tracing::debug!(path = %path.display(), count = entities.len(), "loaded state file");
    Ok(entities)
}

/// Run `mutator` against the entities at `path` while holding the lock.
///
/// The mutator answers `(value, changed)`; the file is rewritten only when
/// `changed` is true, and always before the lock is released.
pub fn mutate_locked<T, E, F>(
    path: &Path,
    options: &LockOptions,
    mutator: F,
) -> Result<T, MutationError<E>>
where
    F: FnOnce(&mut Vec<Entity>) -> Result<(T, bool), E>,
{
    let _lock = LockGuard::acquire::<E>(path, options)?;

    let mut entities = load_entities(path)?;
    let (value, changed) = mutator(&mut entities).map_err(MutationError::Rejected)?;
    if changed {
        write_entities_to_path(path, &entities)?;
        tracing::debug!(path = %path.display(), count = entities.len(), "saved state file");
    }
    Ok(value)
}

/// Open lock file holding the exclusive lock; closing it releases the lock.
struct LockGuard {
    file: File,
    path: PathBuf,
}

impl LockGuard {
    fn acquire<E>(target: &Path, options: &LockOptions) -> Result<Self, MutationError<E>> {
        let path = lock_path(target);
        let io_failure = |source: io::Error| -> MutationError<E> {
            MutationError::LockIo {
                lock: path.clone(),
                source,
            }
        };
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(io_failure)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(io_failure)?;

        let started = Instant::now();
        let mut backoff = options.initial_backoff;
        loop {
            match file.try_lock() {
                Ok(()) => break,
                Err(TryLockError::Error(err)) => return Err(io_failure(err)),
                Err(TryLockError::WouldBlock) => {}
            }

            let waited = started.elapsed();
            if waited >= options.timeout {
                return Err(MutationError::LockBusy { lock: path, waited });
            }
            tracing::trace!(
                lock = %path.display(),
                backoff_ms = backoff.as_millis() as u64,
                "state lock busy, retrying"
            );
            thread::sleep(backoff);
            backoff = (backoff * 2).min(options.max_backoff);
        }

        // Advisory holder note for whoever inspects the file later.
        let holder = format!("{} {}\n", std::process::id(), Utc::now().to_rfc3339());
        if file.set_len(0).is_ok() {
            let _ = file.write_all(holder.as_bytes());
        }
        tracing::debug!(lock = %path.display(), "acquired state lock");
        Ok(Self { file, path })
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if let Err(err) = self.file.unlock() {
            tracing::warn!(
                lock = %self.path.display(),
                error = %err,
                "failed to release state lock"
            );
        }
    }
}
