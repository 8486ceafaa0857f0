//! Entity types: pull requests and issues as stored in a session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Entity category. Each kind has its own identifier namespace and file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    PullRequest,
    Issue,
}

impl EntityKind {
    /// Storage file name under the session root.
    pub fn file_name(self) -> &'static str {
        match self {
            EntityKind::PullRequest => "pulls.jsonl",
            EntityKind::Issue => "issues.jsonl",
        }
    }

    /// Path segment used in rendered references.
    pub fn url_segment(self) -> &'static str {
        match self {
            EntityKind::PullRequest => "pull",
            EntityKind::Issue => "issues",
        }
    }

    /// Human label, singular.
    pub fn label(self) -> &'static str {
        match self {
            EntityKind::PullRequest => "pull request",
            EntityKind::Issue => "issue",
        }
    }

    /// Whether `state` is reachable for this kind.
    pub fn admits(self, state: EntityState) -> bool {
        match self {
            EntityKind::PullRequest => {
                matches!(state, EntityState::Open | EntityState::Merged)
            }
            EntityKind::Issue => matches!(state, EntityState::Open | EntityState::Closed),
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Lifecycle state. Serialized in the client's upper-case form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityState {
    Open,
    Merged,
    Closed,
}

impl EntityState {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityState::Open => "OPEN",
            EntityState::Merged => "MERGED",
            EntityState::Closed => "CLOSED",
        }
    }
}

impl fmt::Display for EntityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A state name that is none of `open`, `merged` or `closed`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown state `{0}`")]
pub struct UnknownState(pub String);

impl FromStr for EntityState {
    type Err = UnknownState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "open" => Ok(EntityState::Open),
            "merged" => Ok(EntityState::Merged),
            "closed" => Ok(EntityState::Closed),
            _ => Err(UnknownState(s.to_string())),
        }
    }
}

/// A stored pull request or issue.
///
/// The kind is not part of the record: it is implied by the file the
/// record lives in. `url` is derived at read time and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    // ── Identity ──
    pub number: u64,

    // ── Content ──
    pub title: String,
    #[serde(default)]
    pub body: String,

    // ── Lifecycle ──
    pub state: EntityState,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merged_at: Option<DateTime<Utc>>,

    // ── Branch refs (pull requests only) ──
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_ref_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head_ref_name: Option<String>,
}

impl Entity {
    /// A freshly created, open entity.
    pub fn new(number: u64, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            number,
            title: title.into(),
            body: body.into(),
            state: EntityState::Open,
            created_at: Utc::now(),
            merged_at: None,
            base_ref_name: None,
            head_ref_name: None,
        }
    }
}

/// Repository coordinates used to render entity references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub host: String,
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            host: "github.com".to_string(),
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Canonical reference, e.g. `https://github.com/o/r/pull/3`.
    pub fn entity_url(&self, kind: EntityKind, number: u64) -> String {
        format!(
            "https://{}/{}/{}/{}/{number}",
            self.host,
            self.owner,
            self.name,
            kind.url_segment()
        )
    }
}

impl Default for RepoRef {
    fn default() -> Self {
        Self::new("mock-owner", "mock-repo")
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_serializes_upper_case() {
        let encoded = serde_json::to_string(&EntityState::Merged).expect("state should encode");
        assert_eq!(encoded, "\"MERGED\"");
        assert_eq!("merged".parse::<EntityState>(), Ok(EntityState::Merged));
        assert_eq!("Closed".parse::<EntityState>(), Ok(EntityState::Closed));

        let err = "Draft".parse::<EntityState>().expect_err("draft is not a state");
        assert_eq!(err, UnknownState("Draft".to_string()));
        assert_eq!(err.to_string(), "unknown state `Draft`");
    }

    #[test]
    fn kinds_admit_their_own_states() {
        assert!(EntityKind::PullRequest.admits(EntityState::Merged));
        assert!(!EntityKind::PullRequest.admits(EntityState::Closed));
        assert!(EntityKind::Issue.admits(EntityState::Closed));
        assert!(!EntityKind::Issue.admits(EntityState::Merged));
    }

    #[test]
    fn entity_url_embeds_kind_and_number() {
        let repo = RepoRef::new("acme", "widgets");
        assert_eq!(
            repo.entity_url(EntityKind::PullRequest, 1),
            "https://github.com/acme/widgets/pull/1"
        );
        assert_eq!(
            repo.entity_url(EntityKind::Issue, 12),
            "https://github.com/acme/widgets/issues/12"
        );
    }

    #[test]
    fn optional_fields_are_omitted_until_set() {
        let entity = Entity::new(1, "Title", "");
        let value = serde_json::to_value(&entity).expect("entity should encode");
        let object = value.as_object().expect("entity encodes as object");
        assert!(object.contains_key("createdAt"));
        assert!(!object.contains_key("mergedAt"));
        assert!(!object.contains_key("headRefName"));
    }
}
