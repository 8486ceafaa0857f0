//! ghmock CLI: the `gh` command.

mod cli;
mod commands;
mod support;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Pr { command } => {
            commands::pr::run(command, cli.state_dir.as_deref(), &cli.repo)
        }

        Commands::Issue { command } => {
            commands::issue::run(command, cli.state_dir.as_deref(), &cli.repo)
        }

        Commands::ReviewConfig { home, json } => commands::review_config::run(&home, json),
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_env("GHMOCK_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
    {
        eprintln!("warning: failed to initialize logging: {e}");
    }
}
