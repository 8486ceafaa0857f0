//! JSONL persistence: one entity per line.
//!
//! Files are replaced, never edited in place. New content is staged in a
//! sibling `*.tmp.<pid>.<nanos>` file, synced, and renamed over the target,
//! so a reader sees either the old file or the new one.

use crate::entity::Entity;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Errors from reading or writing a state file.
#[derive(Debug, thiserror::Error)]
pub enum JsonlError {
    #[error("{path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("{path}: line {line}: {message}")]
    Parse {
        path: String,
        line: usize,
        message: String,
    },

    #[error("cannot encode entity #{number}: {message}")]
    Encode { number: u64, message: String },

    #[error("corrupted state file {path}: {reason}")]
    Corrupt { path: String, reason: &'static str },
}

/// Decode JSONL text. Blank lines are skipped; `origin` labels errors.
///
/// Numbers start at 1, so a record numbered 0 is rejected.
pub fn parse_entities(origin: &Path, text: &str) -> Result<Vec<Entity>, JsonlError> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            let parse_error = |message: String| JsonlError::Parse {
                path: origin.display().to_string(),
                line: index + 1,
                message,
            };
            let entity: Entity =
                serde_json::from_str(line.trim()).map_err(|e| parse_error(e.to_string()))?;
            if entity.number == 0 {
                return Err(parse_error("number must be positive".to_string()));
            }
            Ok(entity)
        })
        .collect()
}

/// Encode entities as JSONL, each record newline-terminated.
pub fn encode_entities(entities: &[Entity]) -> Result<String, JsonlError> {
    let mut out = String::new();
    for entity in entities {
        let line = serde_json::to_string(entity).map_err(|e| JsonlError::Encode {
            number: entity.number,
            message: e.to_string(),
        })?;
        out.push_str(&line);
        out.push('\n');
    }
    Ok(out)
}

/// Read every entity stored at `path`.
///
/// A missing file is an I/O error here; [`crate::atomic_store::load_entities`]
/// treats absence as an empty kind.
pub fn read_entities_from_path(path: impl AsRef<Path>) -> Result<Vec<Entity>, JsonlError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(io_error(path))?;
    if bytes.contains(&0) {
        return Err(corrupt(path, "contains NUL bytes"));
    }
    let text = String::from_utf8(bytes).map_err(|_| corrupt(path, "not valid UTF-8"))?;
    parse_entities(path, &text)
}

/// Replace the file at `path` with `entities`, creating parent directories.
pub fn write_entities_to_path(
    path: impl AsRef<Path>,
    entities: &[Entity],
) -> Result<(), JsonlError> {
    let path = path.as_ref();
    let payload = encode_entities(entities)?;
    let dir = path.parent().filter(|d| !d.as_os_str().is_empty());
    if let Some(dir) = dir {
        fs::create_dir_all(dir).map_err(io_error(dir))?;
    }

    let staged = staging_path(path);
    let replaced = stage(&staged, payload.as_bytes())
        .and_then(|()| fs::rename(&staged, path).map_err(io_error(path)));
    if let Err(err) = replaced {
        let _ = fs::remove_file(&staged);
        return Err(err);
    }

    // The rename is only durable once the directory entry is synced.
    if let Some(dir) = dir {
        File::open(dir)
            .and_then(|handle| handle.sync_all())
            .map_err(io_error(dir))?;
    }
    Ok(())
}

fn stage(staged: &Path, payload: &[u8]) -> Result<(), JsonlError> {
    let mut file = File::create(staged).map_err(io_error(staged))?;
    file.write_all(payload).map_err(io_error(staged))?;
    file.sync_all().map_err(io_error(staged))
}

fn staging_path(path: &Path) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos())
        .unwrap_or(0);
    let mut name = OsString::from(path.as_os_str());
    name.push(format!(".tmp.{}.{nanos}", std::process::id()));
    PathBuf::from(name)
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> JsonlError + use<> {
    let path = path.display().to_string();
    move |source| JsonlError::Io { path, source }
}

fn corrupt(path: &Path, reason: &'static str) -> JsonlError {
    JsonlError::Corrupt {
        path: path.display().to_string(),
        reason,
    }
}
