//! # ghmock-store
//!
//! Session state for the `gh` double.
//!
//! This crate provides:
//! - `Entity` and `EntityKind` (pull requests and issues)
//! - JSONL read/write with atomic temp-file replacement
//! - `SessionStore` (per-kind files under a caller-supplied root,
//!   lock-scoped mutation)
//! - identifier allocation derived from persisted entities
//! - the `Lifecycle` engine (create/list/view/merge)
//! - table and field-restricted JSON projection
//!
//! ## Data model
//!
//! ```text
//! <session root>/pulls.jsonl   one JSON object per pull request
//! <session root>/issues.jsonl  one JSON object per issue
//!     ↕  load / lock + mutate + atomic rename
//! SessionStore → Lifecycle → projection
//! ```

pub mod allocator;
pub mod atomic_store;
pub mod entity;
pub mod jsonl;
pub mod lifecycle;
pub mod projection;
pub mod store;

pub use allocator::next_number;
pub use atomic_store::{
    DEFAULT_LOCK_TIMEOUT, LockOptions, MutationError, load_entities, lock_path, mutate_locked,
};
pub use entity::{Entity, EntityKind, EntityState, RepoRef, UnknownState};
pub use jsonl::{
    JsonlError, encode_entities, parse_entities, read_entities_from_path, write_entities_to_path,
};
pub use lifecycle::{Created, Lifecycle, LifecycleError, ListQuery, MergeReceipt, NewEntity};
pub use projection::{
    Field, ISSUE_FIELDS, PULL_REQUEST_FIELDS, ProjectionError, parse_fields, project,
    render_json, render_json_object, render_table, standard_fields,
};
pub use store::{SessionStore, StoreError};
