//! Entity lifecycle: create, list, view and merge over a session store.
//!
//! Pull requests move `OPEN -> MERGED` and never back. Issues stay `OPEN`.
//! Every mutation runs inside the kind's lock so allocation and save are
//! one step.

use crate::allocator::next_number;
use crate::entity::{Entity, EntityKind, EntityState, RepoRef};
use crate::store::{SessionStore, StoreError};
use chrono::Utc;

/// Errors surfaced by lifecycle operations.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("{0}")]
    Validation(String),

    #[error("no {kind} found with number {number}")]
    NotFound { kind: EntityKind, number: u64 },

    #[error("pull request #{number} was already merged")]
    Conflict { number: u64 },

    #[error("{0}")]
    InvalidState(String),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// Input for a create.
#[derive(Debug, Clone, Default)]
pub struct NewEntity {
    pub title: String,
    pub body: String,
    pub base_ref_name: Option<String>,
    pub head_ref_name: Option<String>,
}

impl NewEntity {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            ..Self::default()
        }
    }
}

/// Listing constraints. Both default to "everything".
#[derive(Debug, Clone, Copy, Default)]
pub struct ListQuery {
    pub state: Option<EntityState>,
    pub limit: Option<usize>,
}

/// A created entity together with its rendered reference.
#[derive(Debug, Clone)]
pub struct Created {
    pub entity: Entity,
    pub url: String,
}

/// Confirmation of a successful merge.
#[derive(Debug, Clone)]
pub struct MergeReceipt {
    pub number: u64,
    pub title: String,
    pub url: String,
}

impl MergeReceipt {
    pub fn message(&self) -> String {
        format!("Merged pull request #{} ({})", self.number, self.title)
    }
}

/// Lifecycle operations bound to one session and repository.
#[derive(Debug, Clone)]
pub struct Lifecycle {
    store: SessionStore,
    repo: RepoRef,
}

impl Lifecycle {
    pub fn new(store: SessionStore, repo: RepoRef) -> Self {
        Self { store, repo }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn repo(&self) -> &RepoRef {
        &self.repo
    }

    /// Allocate the next number for `kind`, append an open entity and persist.
    ///
    /// The title is stored as given; only an all-whitespace title is refused.
    /// Number and `createdAt` are both assigned under the kind's lock, so
    /// creation order on disk matches timestamp order.
    pub fn create(&self, kind: EntityKind, input: NewEntity) -> Result<Created, LifecycleError> {
        if input.title.trim().is_empty() {
            return Err(LifecycleError::Validation(format!(
                "title must not be blank when creating a {kind}"
            )));
        }

        let mut entity = Entity::new(0, input.title, input.body);
        if kind == EntityKind::PullRequest {
            entity.base_ref_name = Some(
                input
                    .base_ref_name
                    .filter(|b| !b.is_empty())
                    .unwrap_or_else(|| "main".to_string()),
            );
            entity.head_ref_name = input.head_ref_name.filter(|h| !h.is_empty());
        }

        let entity = self.store.mutate(
            kind,
            |all: &mut Vec<Entity>| -> Result<(Entity, bool), LifecycleError> {
                entity.number = next_number(all).ok_or(StoreError::NumbersExhausted { kind })?;
                entity.created_at = Utc::now();
                all.push(entity.clone());
                Ok((entity, true))
            },
        )?;

        tracing::info!(kind = %kind, number = entity.number, "created entity");
        let url = self.repo.entity_url(kind, entity.number);
        Ok(Created { entity, url })
    }

    /// Stored entities of `kind` in creation order, filtered by `query`.
    pub fn list(&self, kind: EntityKind, query: ListQuery) -> Result<Vec<Entity>, LifecycleError> {
        if let Some(state) = query.state
            && !kind.admits(state)
        {
            return Err(LifecycleError::Validation(format!(
                "state {state} does not apply to {kind}s"
            )));
        }

        let entities = self
            .store
            .load(kind)?
            .into_iter()
            .filter(|e| query.state.is_none_or(|s| e.state == s))
            .take(query.limit.unwrap_or(usize::MAX))
            .collect();
        Ok(entities)
    }

    /// One entity by number.
    pub fn view(&self, kind: EntityKind, number: u64) -> Result<Entity, LifecycleError> {
        self.store
            .load(kind)?
            .into_iter()
            .find(|e| e.number == number)
            .ok_or(LifecycleError::NotFound { kind, number })
    }

    /// Transition a pull request from `OPEN` to `MERGED`.
    ///
    /// A second merge is rejected with [`LifecycleError::Conflict`] and
    /// leaves the stored state untouched.
    pub fn merge(&self, number: u64) -> Result<MergeReceipt, LifecycleError> {
        let receipt = self.store.mutate(EntityKind::PullRequest, |all| {
            let pr = all
                .iter_mut()
                .find(|e| e.number == number)
                .ok_or_else(|| {
                    LifecycleError::InvalidState(format!(
                        "cannot merge pull request #{number}: it does not exist"
                    ))
                })?;

            match pr.state {
                EntityState::Open => {}
                EntityState::Merged => return Err(LifecycleError::Conflict { number }),
                EntityState::Closed => {
                    return Err(LifecycleError::InvalidState(format!(
                        "cannot merge pull request #{number}: it is closed"
                    )));
                }
            }

            pr.state = EntityState::Merged;
            pr.merged_at = Some(Utc::now());
            let receipt = MergeReceipt {
                number,
                title: pr.title.clone(),
                url: self.repo.entity_url(EntityKind::PullRequest, number),
            };
            Ok((receipt, true))
        })?;

        tracing::info!(number, "merged pull request");
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lifecycle(dir: &tempfile::TempDir) -> Lifecycle {
        Lifecycle::new(SessionStore::open(dir.path()), RepoRef::default())
    }

    #[test]
    fn create_assigns_increasing_numbers_per_kind() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let engine = lifecycle(&dir);

        let first = engine
            .create(EntityKind::PullRequest, NewEntity::new("My PR", "Fixes stuff"))
            .expect("create should succeed");
        let second = engine
            .create(EntityKind::PullRequest, NewEntity::new("Another", ""))
            .expect("create should succeed");
        let issue = engine
            .create(EntityKind::Issue, NewEntity::new("Bug report", "It broke"))
            .expect("create should succeed");

        assert_eq!(first.entity.number, 1);
        assert_eq!(second.entity.number, 2);
        assert_eq!(issue.entity.number, 1);
        assert_eq!(first.url, "https://github.com/mock-owner/mock-repo/pull/1");
        assert_eq!(issue.url, "https://github.com/mock-owner/mock-repo/issues/1");
        assert_eq!(first.entity.state, EntityState::Open);
        assert_eq!(first.entity.base_ref_name.as_deref(), Some("main"));
        assert_eq!(issue.entity.base_ref_name, None);
    }

    #[test]
    fn create_rejects_blank_title_without_writing() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let engine = lifecycle(&dir);

        let err = engine
            .create(EntityKind::Issue, NewEntity::new("   ", "body"))
            .expect_err("blank title must fail");
        assert!(matches!(err, LifecycleError::Validation(_)));
        assert!(!engine.store().path_for(EntityKind::Issue).exists());
    }

    #[test]
    fn title_is_stored_verbatim() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let engine = lifecycle(&dir);

        let created = engine
            .create(EntityKind::Issue, NewEntity::new("  Padded title ", ""))
            .expect("create should succeed");
        assert_eq!(created.entity.title, "  Padded title ");

        let viewed = engine
            .view(EntityKind::Issue, created.entity.number)
            .expect("view should succeed");
        assert_eq!(viewed.title, "  Padded title ");
    }

    #[test]
    fn created_at_is_stamped_once_the_lock_is_held() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let engine = lifecycle(&dir);
        let lock = crate::atomic_store::lock_path(&engine.store().path_for(EntityKind::Issue));
        let holder = std::fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock)
            .expect("lock file should open");
        holder.lock().expect("lock should be acquired");

        let (created, released_at) = std::thread::scope(|scope| {
            let waiting =
                scope.spawn(|| engine.create(EntityKind::Issue, NewEntity::new("late", "")));
            std::thread::sleep(std::time::Duration::from_millis(50));
            let released_at = Utc::now();
            drop(holder);
            let created = waiting
                .join()
                .expect("create thread should not panic")
                .expect("create should succeed");
            (created, released_at)
        });

        assert!(
            created.entity.created_at >= released_at,
            "createdAt {} predates lock release {released_at}",
            created.entity.created_at
        );
    }

    #[test]
    fn exhausted_numbers_fail_instead_of_wrapping() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let engine = lifecycle(&dir);
        engine
            .store()
            .save(EntityKind::PullRequest, &[Entity::new(u64::MAX, "last", "")])
            .expect("seed should save");

        let err = engine
            .create(EntityKind::PullRequest, NewEntity::new("one too many", ""))
            .expect_err("no number is left to allocate");
        assert!(matches!(
            err,
            LifecycleError::Storage(StoreError::NumbersExhausted {
                kind: EntityKind::PullRequest
            })
        ));
        let stored = engine
            .store()
            .load(EntityKind::PullRequest)
            .expect("load should succeed");
        assert_eq!(stored.len(), 1);
    }

    #[test]
    fn numbers_are_never_reused_after_gaps() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let engine = lifecycle(&dir);
        engine
            .store()
            .save(EntityKind::Issue, &[Entity::new(3, "seeded", "")])
            .expect("seed should save");

        let created = engine
            .create(EntityKind::Issue, NewEntity::new("next", ""))
            .expect("create should succeed");
        assert_eq!(created.entity.number, 4);
    }

    #[test]
    fn list_preserves_creation_order_and_filters() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let engine = lifecycle(&dir);
        for title in ["one", "two", "three"] {
            engine
                .create(EntityKind::PullRequest, NewEntity::new(title, ""))
                .expect("create should succeed");
        }
        engine.merge(2).expect("merge should succeed");

        let all = engine
            .list(EntityKind::PullRequest, ListQuery::default())
            .expect("list should succeed");
        let titles: Vec<&str> = all.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["one", "two", "three"]);

        let open = engine
            .list(
                EntityKind::PullRequest,
                ListQuery {
                    state: Some(EntityState::Open),
                    limit: None,
                },
            )
            .expect("list should succeed");
        let numbers: Vec<u64> = open.iter().map(|e| e.number).collect();
        assert_eq!(numbers, vec![1, 3]);

        let limited = engine
            .list(
                EntityKind::PullRequest,
                ListQuery {
                    state: None,
                    limit: Some(2),
                },
            )
            .expect("list should succeed");
        assert_eq!(limited.len(), 2);
    }

    #[test]
    fn list_rejects_state_foreign_to_kind() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let err = lifecycle(&dir)
            .list(
                EntityKind::Issue,
                ListQuery {
                    state: Some(EntityState::Merged),
                    limit: None,
                },
            )
            .expect_err("issues are never merged");
        assert!(matches!(err, LifecycleError::Validation(_)));
    }

    #[test]
    fn view_round_trips_created_entity() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let engine = lifecycle(&dir);
        let created = engine
            .create(
                EntityKind::PullRequest,
                NewEntity {
                    title: "My PR".to_string(),
                    body: "Fixes stuff".to_string(),
                    base_ref_name: Some("develop".to_string()),
                    head_ref_name: Some("fix/stuff".to_string()),
                },
            )
            .expect("create should succeed");

        let viewed = engine
            .view(EntityKind::PullRequest, created.entity.number)
            .expect("view should succeed");
        assert_eq!(viewed, created.entity);

        let missing = engine
            .view(EntityKind::PullRequest, 99)
            .expect_err("unknown number must fail");
        assert!(matches!(
            missing,
            LifecycleError::NotFound { number: 99, .. }
        ));
    }

    #[test]
    fn merge_is_one_way_and_rejects_repeats() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let engine = lifecycle(&dir);
        engine
            .create(EntityKind::PullRequest, NewEntity::new("My PR", "Fixes stuff"))
            .expect("create should succeed");

        let receipt = engine.merge(1).expect("first merge should succeed");
        assert_eq!(receipt.message(), "Merged pull request #1 (My PR)");

        let merged = engine
            .view(EntityKind::PullRequest, 1)
            .expect("view should succeed");
        assert_eq!(merged.state, EntityState::Merged);
        assert!(merged.merged_at.is_some());

        let err = engine.merge(1).expect_err("second merge must fail");
        assert!(matches!(err, LifecycleError::Conflict { number: 1 }));

        let after = engine
            .view(EntityKind::PullRequest, 1)
            .expect("view should succeed");
        assert_eq!(after, merged);
    }

    #[test]
    fn merge_of_missing_pull_request_is_invalid_state() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let err = lifecycle(&dir)
            .merge(5)
            .expect_err("missing pull request cannot merge");
        assert!(matches!(err, LifecycleError::InvalidState(_)));
        assert!(err.to_string().contains("#5"));
    }
}
