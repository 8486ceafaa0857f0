use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "gh",
    about = "Offline double of the code-review platform CLI: pull requests and issues over a local session",
    version
)]
pub struct Cli {
    /// Session root holding all emulated state
    #[arg(long, global = true, env = "GHMOCK_STATE_DIR", value_name = "DIR")]
    pub state_dir: Option<PathBuf>,

    /// Repository used in rendered references, as [HOST/]OWNER/REPO
    #[arg(
        short = 'R',
        long,
        global = true,
        env = "GH_REPO",
        default_value = "mock-owner/mock-repo"
    )]
    pub repo: String,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create, list, view and merge pull requests
    Pr {
        #[command(subcommand)]
        command: PrCommands,
    },

    /// Create, list and view issues
    Issue {
        #[command(subcommand)]
        command: IssueCommands,
    },

    /// Print the resolved review workflow settings
    ReviewConfig {
        /// Installation root containing config/config.json
        #[arg(long, env = "WIGGUM_HOME", default_value = ".")]
        home: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand, Clone, Debug)]
pub enum PrCommands {
    /// Create a pull request
    Create {
        #[command(flatten)]
        entity: CreateArgs,

        /// Branch the pull request merges into
        #[arg(short = 'B', long)]
        base: Option<String>,

        /// Branch holding the changes
        #[arg(short = 'H', long)]
        head: Option<String>,

        /// Accepted for compatibility; not interpreted
        #[arg(short, long)]
        draft: bool,

        /// Accepted for compatibility; not interpreted
        #[arg(short, long)]
        label: Vec<String>,
    },

    /// List pull requests in creation order
    List(ListArgs),

    /// Show one pull request
    View(ViewArgs),

    /// Merge an open pull request
    Merge {
        /// Pull request number, `#N`, or URL
        number: String,

        /// Accepted for compatibility; not interpreted
        #[arg(short, long)]
        merge: bool,

        /// Accepted for compatibility; not interpreted
        #[arg(short, long)]
        squash: bool,

        /// Accepted for compatibility; not interpreted
        #[arg(short, long)]
        rebase: bool,

        /// Accepted for compatibility; not interpreted
        #[arg(short, long)]
        delete_branch: bool,
    },
}

#[derive(Subcommand, Clone, Debug)]
pub enum IssueCommands {
    /// Create an issue
    Create {
        #[command(flatten)]
        entity: CreateArgs,

        /// Accepted for compatibility; not interpreted
        #[arg(short, long)]
        label: Vec<String>,
    },

    /// List issues in creation order
    List(ListArgs),

    /// Show one issue
    View(ViewArgs),
}

#[derive(Args, Clone, Debug)]
pub struct CreateArgs {
    /// Title
    #[arg(short, long)]
    pub title: String,

    /// Body text
    #[arg(short, long, default_value = "")]
    pub body: String,
}

#[derive(Args, Clone, Debug)]
pub struct ListArgs {
    /// Filter by state
    #[arg(short, long, value_enum, default_value = "all")]
    pub state: StateArg,

    /// Maximum number of rows
    #[arg(short = 'L', long)]
    pub limit: Option<usize>,

    /// Output JSON with the given comma-separated fields (all when empty)
    #[arg(long, value_name = "FIELDS", num_args = 0..=1, default_missing_value = "")]
    pub json: Option<String>,
}

#[derive(Args, Clone, Debug)]
pub struct ViewArgs {
    /// Number, `#N`, or URL
    pub number: String,

    /// Output JSON with the given comma-separated fields (all when empty)
    #[arg(long, value_name = "FIELDS", num_args = 0..=1, default_missing_value = "")]
    pub json: Option<String>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum StateArg {
    Open,
    Closed,
    Merged,
    All,
}
