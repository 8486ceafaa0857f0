//! Session store: the on-disk repository for every entity kind.
//!
//! A session root is always supplied by the caller. Each kind lives in its
//! own JSONL file beneath it, created lazily on first write.

use crate::atomic_store::{LockOptions, MutationError, load_entities, mutate_locked};
use crate::entity::{Entity, EntityKind};
use crate::jsonl::JsonlError;
use std::path::{Path, PathBuf};

/// Errors raised while reading or writing session state.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Jsonl(#[from] JsonlError),

    #[error("state lock busy after {waited_ms}ms: {lock_path}")]
    LockBusy { lock_path: String, waited_ms: u128 },

    #[error("failed to acquire state lock {lock_path}: {source}")]
    LockIo {
        lock_path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no {kind} numbers left to allocate")]
    NumbersExhausted { kind: EntityKind },
}

/// Repository over one session root.
#[derive(Debug, Clone)]
pub struct SessionStore {
    root: PathBuf,
    lock: LockOptions,
}

impl SessionStore {
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            lock: LockOptions::default(),
        }
    }

    pub fn with_lock_options(mut self, lock: LockOptions) -> Self {
        self.lock = lock;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Storage file for one kind.
    pub fn path_for(&self, kind: EntityKind) -> PathBuf {
        self.root.join(kind.file_name())
    }

    /// All entities of `kind` in creation order. Empty when nothing exists yet.
    pub fn load(&self, kind: EntityKind) -> Result<Vec<Entity>, StoreError> {
        Ok(load_entities(&self.path_for(kind))?)
    }

    /// Replace the full set for `kind`.
    ///
    /// Takes the kind's lock for the duration of the write.
    pub fn save(&self, kind: EntityKind, entities: &[Entity]) -> Result<(), StoreError> {
        self.mutate(kind, |current| {
            *current = entities.to_vec();
            Ok::<_, StoreError>(((), true))
        })
    }

    /// Load, modify and save `kind` while holding its lock.
    ///
    /// The mutator returns `(value, changed)`; nothing is written unless
    /// `changed` is true.
    pub fn mutate<T, E, F>(&self, kind: EntityKind, mutator: F) -> Result<T, E>
    where
        F: FnOnce(&mut Vec<Entity>) -> Result<(T, bool), E>,
        E: From<StoreError>,
    {
        mutate_locked(&self.path_for(kind), &self.lock, mutator).map_err(|err| match err {
            MutationError::Rejected(inner) => inner,
            MutationError::Store(source) => E::from(StoreError::Jsonl(source)),
            MutationError::LockBusy { lock, waited } => E::from(StoreError::LockBusy {
                lock_path: lock.display().to_string(),
                waited_ms: waited.as_millis(),
            }),
            MutationError::LockIo { lock, source } => E::from(StoreError::LockIo {
                lock_path: lock.display().to_string(),
                source,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn load_of_untouched_kind_is_empty() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let store = SessionStore::open(dir.path().join("session"));

        assert_eq!(store.load(EntityKind::PullRequest).expect("load"), vec![]);
        assert!(!store.root().exists(), "reads must not create the session root");
    }

    #[test]
    fn save_creates_root_lazily_and_keeps_kinds_apart() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let store = SessionStore::open(dir.path().join("session"));
        let pr = Entity::new(1, "PR", "");

        store
            .save(EntityKind::PullRequest, std::slice::from_ref(&pr))
            .expect("save should succeed");

        assert!(store.path_for(EntityKind::PullRequest).exists());
        assert!(!store.path_for(EntityKind::Issue).exists());
        assert_eq!(store.load(EntityKind::PullRequest).expect("load"), vec![pr]);
        assert_eq!(store.load(EntityKind::Issue).expect("load"), vec![]);
    }

    #[test]
    fn save_replaces_prior_content() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let store = SessionStore::open(dir.path());

        store
            .save(EntityKind::Issue, &[Entity::new(1, "a", ""), Entity::new(2, "b", "")])
            .expect("first save");
        store
            .save(EntityKind::Issue, &[Entity::new(3, "c", "")])
            .expect("second save");

        let titles: Vec<String> = store
            .load(EntityKind::Issue)
            .expect("load")
            .into_iter()
            .map(|e| e.title)
            .collect();
        assert_eq!(titles, vec!["c".to_string()]);
    }

    #[test]
    fn corrupt_file_is_a_storage_error() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let store = SessionStore::open(dir.path());
        std::fs::write(store.path_for(EntityKind::PullRequest), "{\"number\":\n")
            .expect("fixture should write");

        let err = store
            .load(EntityKind::PullRequest)
            .expect_err("corrupt state must fail loudly");
        assert!(matches!(err, StoreError::Jsonl(JsonlError::Parse { line: 1, .. })));
    }
}
