use crate::cli::StateArg;
use ghmock_store::{
    EntityKind, EntityState, Field, Lifecycle, RepoRef, SessionStore, parse_fields,
};
use regex::Regex;
use std::fmt::Display;
use std::path::Path;
use std::sync::OnceLock;

pub const STATE_DIR_ENV: &str = "GHMOCK_STATE_DIR";

fn repo_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(?:(?P<host>[A-Za-z0-9.-]+)/)?(?P<owner>[A-Za-z0-9_.-]+)/(?P<name>[A-Za-z0-9_.-]+)$",
        )
        .expect("repository regex must compile")
    })
}

fn reference_url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^https?://[^/]+/[^/]+/[^/]+/(?P<segment>pull|issues)/(?P<number>\d+)/?$")
            .expect("reference url regex must compile")
    })
}

pub fn fail(message: impl Display) -> ! {
    eprintln!("error: {message}");
    std::process::exit(1);
}

/// Build the lifecycle engine for an explicit session root.
pub fn lifecycle_or_exit(state_dir: Option<&Path>, repo: &str) -> Lifecycle {
    let root = match state_dir {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => fail(format!(
            "no session root: pass --state-dir or set {STATE_DIR_ENV}"
        )),
    };
    let repo = parse_repo(repo).unwrap_or_else(|e| fail(e));
    tracing::debug!(root = %root.display(), repo = %repo, "opening session");
    Lifecycle::new(SessionStore::open(root), repo)
}

/// Parse `[HOST/]OWNER/REPO`.
pub fn parse_repo(raw: &str) -> Result<RepoRef, String> {
    let captures = repo_re()
        .captures(raw.trim())
        .ok_or_else(|| format!("expected the \"[HOST/]OWNER/REPO\" format, got {raw:?}"))?;
    let mut repo = RepoRef::new(&captures["owner"], &captures["name"]);
    if let Some(host) = captures.name("host") {
        repo.host = host.as_str().to_string();
    }
    Ok(repo)
}

/// Parse a number given as `N`, `#N`, or a reference URL of the same kind.
pub fn parse_number(kind: EntityKind, raw: &str) -> Result<u64, String> {
    let raw = raw.trim();
    if let Some(captures) = reference_url_re().captures(raw) {
        if captures["segment"] != *kind.url_segment() {
            return Err(format!("{raw} does not refer to a {kind}"));
        }
        return captures["number"]
            .parse()
            .map_err(|_| format!("invalid {kind} number in {raw}"));
    }

    raw.strip_prefix('#')
        .unwrap_or(raw)
        .parse::<u64>()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| format!("invalid {kind} number: {raw:?}"))
}

pub fn number_or_exit(kind: EntityKind, raw: &str) -> u64 {
    parse_number(kind, raw).unwrap_or_else(|e| fail(e))
}

/// `None` when `--json` was not given; all standard fields when it was
/// given without a value.
pub fn json_fields_or_exit(kind: EntityKind, json: Option<&str>) -> Option<Option<Vec<Field>>> {
    let list = json?.trim();
    if list.is_empty() {
        return Some(None);
    }
    Some(Some(parse_fields(kind, list).unwrap_or_else(|e| fail(e))))
}

pub fn state_filter(state: StateArg) -> Option<EntityState> {
    match state {
        StateArg::Open => Some(EntityState::Open),
        StateArg::Closed => Some(EntityState::Closed),
        StateArg::Merged => Some(EntityState::Merged),
        StateArg::All => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_repo_accepts_optional_host() {
        let repo = parse_repo("acme/widgets").expect("slug should parse");
        assert_eq!(repo, RepoRef::new("acme", "widgets"));

        let repo = parse_repo("ghe.example.com/acme/widgets").expect("slug should parse");
        assert_eq!(repo.host, "ghe.example.com");
        assert_eq!(
            repo.entity_url(EntityKind::Issue, 2),
            "https://ghe.example.com/acme/widgets/issues/2"
        );

        assert!(parse_repo("widgets").is_err());
        assert!(parse_repo("a/b/c/d").is_err());
    }

    #[test]
    fn parse_number_accepts_plain_hash_and_url() {
        assert_eq!(parse_number(EntityKind::PullRequest, "3"), Ok(3));
        assert_eq!(parse_number(EntityKind::PullRequest, "#3"), Ok(3));
        assert_eq!(
            parse_number(
                EntityKind::PullRequest,
                "https://github.com/mock-owner/mock-repo/pull/14"
            ),
            Ok(14)
        );
        assert!(
            parse_number(
                EntityKind::PullRequest,
                "https://github.com/mock-owner/mock-repo/issues/14"
            )
            .is_err()
        );
        assert!(parse_number(EntityKind::Issue, "0").is_err());
        assert!(parse_number(EntityKind::Issue, "abc").is_err());
    }
}
