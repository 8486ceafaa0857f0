//! Review workflow configuration.

use crate::error::ConfigError;
use figment::Figment;
use figment::providers::{Env, Format, Json};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_PREFIX: &str = "WIGGUM_";
pub const ENV_APPROVED_USER_IDS: &str = "WIGGUM_APPROVED_USER_IDS";
pub const ENV_FIX_MAX_ITERATIONS: &str = "WIGGUM_PR_FIX_MAX_ITERATIONS";
pub const ENV_FIX_MAX_TURNS: &str = "WIGGUM_PR_FIX_MAX_TURNS";
pub const ENV_AUTO_COMMIT_AFTER_FIX: &str = "WIGGUM_AUTO_COMMIT_AFTER_FIX";

pub const DEFAULT_FIX_MAX_ITERATIONS: u32 = 10;
pub const DEFAULT_FIX_MAX_TURNS: u32 = 50;
pub const DEFAULT_AUTO_COMMIT_AFTER_FIX: bool = true;

pub const CONFIG_FILE_RELATIVE_PATH: &str = "config/config.json";

/// Setting keys paired with the environment variable that overrides them.
const ENV_KEYS: [(&str, &str); 4] = [
    ("approved_user_ids", ENV_APPROVED_USER_IDS),
    ("fix_max_iterations", ENV_FIX_MAX_ITERATIONS),
    ("fix_max_turns", ENV_FIX_MAX_TURNS),
    ("auto_commit_after_fix", ENV_AUTO_COMMIT_AFTER_FIX),
];

/// Effective review settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewConfig {
    /// Reviewer identifiers whose comments the fix loop acts on.
    pub approved_user_ids: Vec<String>,
    pub fix_max_iterations: u32,
    pub fix_max_turns: u32,
    pub auto_commit_after_fix: bool,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            approved_user_ids: Vec::new(),
            fix_max_iterations: DEFAULT_FIX_MAX_ITERATIONS,
            fix_max_turns: DEFAULT_FIX_MAX_TURNS,
            auto_commit_after_fix: DEFAULT_AUTO_COMMIT_AFTER_FIX,
        }
    }
}

impl ReviewConfig {
    /// `NAME=value` pairs for descendant processes.
    pub fn exports(&self) -> Vec<(&'static str, String)> {
        vec![
            (ENV_APPROVED_USER_IDS, self.approved_user_ids.join(",")),
            (ENV_FIX_MAX_ITERATIONS, self.fix_max_iterations.to_string()),
            (ENV_FIX_MAX_TURNS, self.fix_max_turns.to_string()),
            (
                ENV_AUTO_COMMIT_AFTER_FIX,
                self.auto_commit_after_fix.to_string(),
            ),
        ]
    }
}

/// One source's view of the settings. `None` means the key is absent.
///
/// Values are read leniently so the same shape serves both the JSON file
/// and raw environment strings: counts may be numbers or numeric text,
/// flags may be booleans, `0`/`1`, or `yes`/`no`/`on`/`off`, and an empty
/// value counts as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ReviewLayer {
    #[serde(default, deserialize_with = "deserialize_user_ids")]
    pub approved_user_ids: Option<Vec<String>>,
    #[serde(default, deserialize_with = "deserialize_count")]
    pub fix_max_iterations: Option<u32>,
    #[serde(default, deserialize_with = "deserialize_count")]
    pub fix_max_turns: Option<u32>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub auto_commit_after_fix: Option<bool>,
}

/// Merge layers key by key: environment, then file, then defaults.
pub fn resolve(env: &ReviewLayer, file: &ReviewLayer, defaults: &ReviewConfig) -> ReviewConfig {
    ReviewConfig {
        approved_user_ids: env
            .approved_user_ids
            .clone()
            .or_else(|| file.approved_user_ids.clone())
            .unwrap_or_else(|| defaults.approved_user_ids.clone()),
        fix_max_iterations: env
            .fix_max_iterations
            .or(file.fix_max_iterations)
            .unwrap_or(defaults.fix_max_iterations),
        fix_max_turns: env
            .fix_max_turns
            .or(file.fix_max_turns)
            .unwrap_or(defaults.fix_max_turns),
        auto_commit_after_fix: env
            .auto_commit_after_fix
            .or(file.auto_commit_after_fix)
            .unwrap_or(defaults.auto_commit_after_fix),
    }
}

/// The `WIGGUM_*` variables, renamed to setting keys. Others are ignored.
pub fn env_provider() -> Env {
    Env::prefixed(ENV_PREFIX).filter_map(|key| {
        let name = format!("{ENV_PREFIX}{}", key.as_str()).to_ascii_uppercase();
        ENV_KEYS
            .iter()
            .find(|(_, var)| *var == name)
            .map(|(setting, _)| (*setting).into())
    })
}

/// Read the environment layer from the process environment.
///
/// Malformed values are errors rather than silently falling through to a
/// lower layer.
pub fn env_layer() -> Result<ReviewLayer, ConfigError> {
    Figment::from(env_provider()).extract().map_err(|source: figment::Error| {
        let name = source
            .path
            .last()
            .and_then(|key| ENV_KEYS.iter().find(|(setting, _)| *setting == key.as_str()))
            .map_or(ENV_PREFIX, |(_, var)| *var);
        ConfigError::InvalidEnv {
            name: name.to_string(),
            source,
        }
    })
}

/// Read the file layer: the `review` table of the JSON file at `path`.
///
/// A missing file, or one without a `review` table, is an empty layer.
pub fn file_layer(path: &Path) -> Result<ReviewLayer, ConfigError> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no review config file");
    }
    Figment::from(Json::file_exact(path))
        .focus("review")
        .extract()
        .map_err(|source| ConfigError::File {
            path: path.display().to_string(),
            source,
        })
}

pub fn config_file_path(home: &Path) -> PathBuf {
    home.join(CONFIG_FILE_RELATIVE_PATH)
}

/// Resolve review settings from the process environment and `home`.
pub fn load_review_config(home: &Path) -> Result<ReviewConfig, ConfigError> {
    let env = env_layer()?;
    let file = file_layer(&config_file_path(home))?;
    let config = resolve(&env, &file, &ReviewConfig::default());
    tracing::debug!(?config, "resolved review config");
    Ok(config)
}

fn split_ids(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

/// Any scalar a file or environment variable may carry.
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Flag(bool),
    Whole(u64),
    Negative(i64),
    Text(String),
}

fn deserialize_count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let expected = |found: String| D::Error::custom(format!("expected a count, found {found}"));
    match Option::<Scalar>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Scalar::Whole(n)) => u32::try_from(n)
            .map(Some)
            .map_err(|_| expected(n.to_string())),
        Some(Scalar::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(Scalar::Text(text)) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| expected(format!("{text:?}"))),
        Some(Scalar::Negative(n)) => Err(expected(n.to_string())),
        Some(Scalar::Flag(b)) => Err(expected(b.to_string())),
    }
}

fn deserialize_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let expected =
        |found: String| D::Error::custom(format!("expected true or false, found {found}"));
    match Option::<Scalar>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Scalar::Flag(b)) => Ok(Some(b)),
        Some(Scalar::Whole(1)) => Ok(Some(true)),
        Some(Scalar::Whole(0)) => Ok(Some(false)),
        Some(Scalar::Text(text)) => match text.trim().to_ascii_lowercase().as_str() {
            "" => Ok(None),
            "true" | "1" | "yes" | "on" => Ok(Some(true)),
            "false" | "0" | "no" | "off" => Ok(Some(false)),
            _ => Err(expected(format!("{text:?}"))),
        },
        Some(Scalar::Whole(n)) => Err(expected(n.to_string())),
        Some(Scalar::Negative(n)) => Err(expected(n.to_string())),
    }
}

/// Accept an array of ids (numbers or strings), one comma-separated string,
/// or a single numeric id.
fn deserialize_user_ids<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Number(u64),
        Text(String),
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Ids {
        List(Vec<Id>),
        One(Id),
    }

    let ids = match Option::<Ids>::deserialize(deserializer)? {
        None => return Ok(None),
        Some(Ids::One(Id::Text(raw))) if raw.trim().is_empty() => return Ok(None),
        Some(Ids::One(Id::Text(raw))) => split_ids(&raw),
        Some(Ids::One(Id::Number(n))) => vec![n.to_string()],
        Some(Ids::List(list)) => list
            .into_iter()
            .map(|id| match id {
                Id::Number(n) => n.to_string(),
                Id::Text(text) => text.trim().to_string(),
            })
            .filter(|id| !id.is_empty())
            .collect(),
    };
    Ok(Some(ids))
}
