//! Subcommands shared by every entity kind.

use crate::cli::{CreateArgs, ListArgs, ViewArgs};
use crate::support::{fail, json_fields_or_exit, number_or_exit, state_filter};
use ghmock_store::{
    Entity, EntityKind, Lifecycle, ListQuery, NewEntity, render_json, render_json_object,
    render_table,
};

pub fn run_create(
    engine: &Lifecycle,
    kind: EntityKind,
    args: CreateArgs,
    base: Option<String>,
    head: Option<String>,
) {
    let input = NewEntity {
        title: args.title,
        body: args.body,
        base_ref_name: base,
        head_ref_name: head,
    };
    let created = engine.create(kind, input).unwrap_or_else(|e| fail(e));
    println!("{}", created.url);
}

pub fn run_list(engine: &Lifecycle, kind: EntityKind, args: ListArgs) {
    let fields = json_fields_or_exit(kind, args.json.as_deref());
    let query = ListQuery {
        state: state_filter(args.state),
        limit: args.limit,
    };
    let entities = engine.list(kind, query).unwrap_or_else(|e| fail(e));

    if let Some(fields) = fields {
        let rendered = render_json(kind, &entities, fields.as_deref(), engine.repo())
            .unwrap_or_else(|e| fail(e));
        println!("{rendered}");
        return;
    }

    if entities.is_empty() {
        eprintln!("no {}s match your search in {}", kind, engine.repo());
        return;
    }
    println!("{}", render_table(&entities));
}

pub fn run_view(engine: &Lifecycle, kind: EntityKind, args: ViewArgs) {
    let fields = json_fields_or_exit(kind, args.json.as_deref());
    let number = number_or_exit(kind, &args.number);
    let entity = engine.view(kind, number).unwrap_or_else(|e| fail(e));

    match fields {
        Some(fields) => {
            let rendered = render_json_object(kind, &entity, fields.as_deref(), engine.repo())
                .unwrap_or_else(|e| fail(e));
            println!("{rendered}");
        }
        None => print!("{}", detail(engine, kind, &entity)),
    }
}

/// `key:\tvalue` lines, a `--` separator, then the body.
fn detail(engine: &Lifecycle, kind: EntityKind, entity: &Entity) -> String {
    let mut lines = vec![
        format!("title:\t{}", entity.title),
        format!("state:\t{}", entity.state),
        format!("number:\t{}", entity.number),
        format!("url:\t{}", engine.repo().entity_url(kind, entity.number)),
        format!("created:\t{}", entity.created_at.to_rfc3339()),
    ];
    if kind == EntityKind::PullRequest {
        if let Some(base) = &entity.base_ref_name {
            lines.push(format!("base:\t{base}"));
        }
        if let Some(head) = &entity.head_ref_name {
            lines.push(format!("head:\t{head}"));
        }
        if let Some(merged_at) = entity.merged_at {
            lines.push(format!("merged:\t{}", merged_at.to_rfc3339()));
        }
    }
    lines.push("--".to_string());
    lines.push(entity.body.clone());

    let mut out = lines.join("\n");
    out.push('\n');
    out
}
