use crate::cli::PrCommands;
use crate::commands::entity::{run_create, run_list, run_view};
use crate::support::{fail, lifecycle_or_exit, number_or_exit};
use ghmock_store::{EntityKind, Lifecycle};
use std::path::Path;

pub fn run(command: PrCommands, state_dir: Option<&Path>, repo: &str) {
    let engine = lifecycle_or_exit(state_dir, repo);
    let kind = EntityKind::PullRequest;

    match command {
        PrCommands::Create {
            entity,
            base,
            head,
            draft,
            label,
        } => {
            tracing::debug!(draft, labels = label.len(), "ignoring pull request extras");
            run_create(&engine, kind, entity, base, head)
        }

        PrCommands::List(args) => run_list(&engine, kind, args),

        PrCommands::View(args) => run_view(&engine, kind, args),

        PrCommands::Merge {
            number,
            merge,
            squash,
            rebase,
            delete_branch,
        } => {
            tracing::debug!(merge, squash, rebase, delete_branch, "ignoring merge strategy");
            run_merge(&engine, &number)
        }
    }
}

fn run_merge(engine: &Lifecycle, raw: &str) {
    let number = number_or_exit(EntityKind::PullRequest, raw);
    let receipt = engine.merge(number).unwrap_or_else(|e| fail(e));
    println!("✓ {}", receipt.message());
}
