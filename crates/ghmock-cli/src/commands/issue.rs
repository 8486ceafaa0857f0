use crate::cli::IssueCommands;
use crate::commands::entity::{run_create, run_list, run_view};
use crate::support::lifecycle_or_exit;
use ghmock_store::EntityKind;
use std::path::Path;

pub fn run(command: IssueCommands, state_dir: Option<&Path>, repo: &str) {
    let engine = lifecycle_or_exit(state_dir, repo);
    let kind = EntityKind::Issue;

    match command {
        IssueCommands::Create { entity, label } => {
            tracing::debug!(labels = label.len(), "ignoring issue labels");
            run_create(&engine, kind, entity, None, None)
        }

        IssueCommands::List(args) => run_list(&engine, kind, args),

        IssueCommands::View(args) => run_view(&engine, kind, args),
    }
}
