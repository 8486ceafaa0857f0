//! Identifier allocation derived from persisted entities.
//!
//! There is no counter file: the next number is always one past the highest
//! number on disk, so allocation cannot drift from what was actually saved.

use crate::entity::{Entity, EntityKind};
use crate::store::{SessionStore, StoreError};

/// One greater than the highest number present, or 1 for an empty kind.
///
/// `None` once the highest number is `u64::MAX`.
pub fn next_number(entities: &[Entity]) -> Option<u64> {
    entities
        .iter()
        .map(|e| e.number)
        .max()
        .unwrap_or(0)
        .checked_add(1)
}

impl SessionStore {
    /// Peek at the number the next create of `kind` would receive.
    ///
    /// Unlocked; creates allocate inside the kind's lock instead.
    pub fn next_number(&self, kind: EntityKind) -> Result<u64, StoreError> {
        next_number(&self.load(kind)?).ok_or(StoreError::NumbersExhausted { kind })
    }
}
