//! Query/projection layer: aligned tables and field-restricted JSON.
//!
//! Field selection is parsed once into [`Field`] values, so the typed
//! entity is only ever read through one exhaustive match.

use crate::entity::{Entity, EntityKind, RepoRef};
use serde_json::{Map, Value};
use std::fmt;

/// Fields a pull request exposes to `--json`.
pub const PULL_REQUEST_FIELDS: &[Field] = &[
    Field::Number,
    Field::Title,
    Field::Body,
    Field::State,
    Field::Url,
    Field::CreatedAt,
    Field::MergedAt,
    Field::BaseRefName,
    Field::HeadRefName,
];

/// Fields an issue exposes to `--json`.
pub const ISSUE_FIELDS: &[Field] = &[
    Field::Number,
    Field::Title,
    Field::Body,
    Field::State,
    Field::Url,
    Field::CreatedAt,
];

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ProjectionError {
    #[error("Unknown JSON field: {field:?}\nAvailable fields:\n{available}")]
    UnknownField { field: String, available: String },

    #[error("empty field name in JSON field list")]
    EmptyField,

    #[error("serialization error: {0}")]
    Serialize(String),
}

/// A projectable entity field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Number,
    /// Alias of `number` keyed as `id`.
    Id,
    Title,
    Body,
    State,
    Url,
    CreatedAt,
    MergedAt,
    BaseRefName,
    HeadRefName,
}

impl Field {
    pub fn key(self) -> &'static str {
        match self {
            Field::Number => "number",
            Field::Id => "id",
            Field::Title => "title",
            Field::Body => "body",
            Field::State => "state",
            Field::Url => "url",
            Field::CreatedAt => "createdAt",
            Field::MergedAt => "mergedAt",
            Field::BaseRefName => "baseRefName",
            Field::HeadRefName => "headRefName",
        }
    }

    /// Every field `kind` accepts, including aliases.
    pub fn available(kind: EntityKind) -> Vec<Field> {
        let mut fields = standard_fields(kind).to_vec();
        fields.push(Field::Id);
        fields
    }

    /// Resolve one field name for `kind`.
    pub fn parse(kind: EntityKind, name: &str) -> Result<Field, ProjectionError> {
        Field::available(kind)
            .into_iter()
            .find(|f| f.key() == name)
            .ok_or_else(|| {
                let mut names: Vec<&str> =
                    Field::available(kind).iter().map(|f| f.key()).collect();
                names.sort_unstable();
                ProjectionError::UnknownField {
                    field: name.to_string(),
                    available: names
                        .iter()
                        .map(|n| format!("  {n}"))
                        .collect::<Vec<_>>()
                        .join("\n"),
                }
            })
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// The fields rendered when the caller names none.
pub fn standard_fields(kind: EntityKind) -> &'static [Field] {
    match kind {
        EntityKind::PullRequest => PULL_REQUEST_FIELDS,
        EntityKind::Issue => ISSUE_FIELDS,
    }
}

/// Parse a comma-separated field list, keeping caller order.
///
/// Repeated names collapse onto their first position.
pub fn parse_fields(kind: EntityKind, list: &str) -> Result<Vec<Field>, ProjectionError> {
    let mut fields = Vec::new();
    for name in list.split(',').map(str::trim) {
        if name.is_empty() {
            return Err(ProjectionError::EmptyField);
        }
        let field = Field::parse(kind, name)?;
        if !fields.contains(&field) {
            fields.push(field);
        }
    }
    Ok(fields)
}

/// Project one entity onto `fields`, in order.
pub fn project(
    kind: EntityKind,
    entity: &Entity,
    fields: &[Field],
    repo: &RepoRef,
) -> Result<Map<String, Value>, ProjectionError> {
    let mut object = Map::with_capacity(fields.len());
    for field in fields {
        let value = match field {
            Field::Number | Field::Id => Value::from(entity.number),
            Field::Title => Value::from(entity.title.clone()),
            Field::Body => Value::from(entity.body.clone()),
            Field::State => Value::from(entity.state.as_str()),
            Field::Url => Value::from(repo.entity_url(kind, entity.number)),
            Field::CreatedAt => to_value(&entity.created_at)?,
            Field::MergedAt => to_value(&entity.merged_at)?,
            Field::BaseRefName => Value::from(entity.base_ref_name.clone().unwrap_or_default()),
            Field::HeadRefName => Value::from(entity.head_ref_name.clone().unwrap_or_default()),
        };
        object.insert(field.key().to_string(), value);
    }
    Ok(object)
}

/// Render `entities` as a JSON array. `None` selects the standard fields.
///
/// An empty input renders `[]`.
pub fn render_json(
    kind: EntityKind,
    entities: &[Entity],
    fields: Option<&[Field]>,
    repo: &RepoRef,
) -> Result<String, ProjectionError> {
    let fields = fields.unwrap_or_else(|| standard_fields(kind));
    let items = entities
        .iter()
        .map(|entity| project(kind, entity, fields, repo).map(Value::Object))
        .collect::<Result<Vec<_>, _>>()?;
    serde_json::to_string_pretty(&items).map_err(|e| ProjectionError::Serialize(e.to_string()))
}

/// Render a single entity as a JSON object.
pub fn render_json_object(
    kind: EntityKind,
    entity: &Entity,
    fields: Option<&[Field]>,
    repo: &RepoRef,
) -> Result<String, ProjectionError> {
    let fields = fields.unwrap_or_else(|| standard_fields(kind));
    let object = project(kind, entity, fields, repo)?;
    serde_json::to_string_pretty(&Value::Object(object))
        .map_err(|e| ProjectionError::Serialize(e.to_string()))
}

/// Render `ID  TITLE  STATE` columns in input order.
///
/// An empty input renders an empty string.
pub fn render_table(entities: &[Entity]) -> String {
    if entities.is_empty() {
        return String::new();
    }

    let rows: Vec<[String; 3]> = entities
        .iter()
        .map(|e| {
            [
                e.number.to_string(),
                single_line(&e.title),
                e.state.as_str().to_string(),
            ]
        })
        .collect();
    let headers = ["ID", "TITLE", "STATE"];

    let mut widths = headers.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    std::iter::once(headers.map(str::to_string))
        .chain(rows)
        .map(|row| {
            format!(
                "{:<id$}  {:<title$}  {}",
                row[0],
                row[1],
                row[2],
                id = widths[0],
                title = widths[1]
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn single_line(text: &str) -> String {
    text.split(['\n', '\r', '\t'])
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn to_value<T: serde::Serialize>(value: &T) -> Result<Value, ProjectionError> {
    serde_json::to_value(value).map_err(|e| ProjectionError::Serialize(e.to_string()))
}
