use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

use crate::assembly::selection::SelectionStrategy;
use crate::orchestrator::DiffMethod;
use crate::publish::QuietCommentPolicy;

#[derive(Parser, Debug)]
#[command(name = "stackdiff")]
#[command(about = "CloudFormation stack diff classifier and pull-request comment reporter", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Diff synthesized stacks against their deployed state and publish comments
    Report {
        /// Diff snapshot file produced at synthesis time
        #[arg(long, default_value = "stackdiff.snapshot.json")]
        snapshot: PathBuf,

        /// Configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Resource types allowed to be destroyed without failing the build
        #[arg(long = "allowed-destroy-types", value_delimiter = ',')]
        allowed_destroy_types: Option<Vec<String>>,

        /// Report destructive changes without failing the build
        #[arg(long = "no-fail-on-destructive")]
        no_fail_on_destructive: bool,

        /// Stages whose destructive changes never fail the build
        #[arg(long = "ignore-destructive-stages", value_delimiter = ',')]
        ignore_destructive_stages: Option<Vec<String>>,

        /// Glob patterns selecting which stacks to diff ('!' prefix excludes)
        #[arg(long = "stacks", value_delimiter = ',')]
        stack_selector_patterns: Option<Vec<String>>,

        /// How selector patterns are applied
        #[arg(long = "selection-strategy", value_enum)]
        stack_selection_strategy: Option<SelectionStrategy>,

        /// How the deployed side of the diff is obtained
        #[arg(long = "diff-method", value_enum)]
        diff_method: Option<DiffMethod>,

        /// Heading prepended to every published comment
        #[arg(long)]
        title: Option<String>,

        /// What to do for stacks with no changes
        #[arg(long = "quiet-comments", value_enum)]
        quiet_comment_policy: Option<QuietCommentPolicy>,

        /// Commit id named in the comment attribution footer
        #[arg(long, env = "STACKDIFF_COMMIT", default_value = "HEAD")]
        commit: String,

        /// Write comments into this directory instead of printing them
        #[arg(long = "out-dir")]
        out_dir: Option<PathBuf>,

        /// ASCII-only output (no emoji)
        #[arg(long)]
        plain: bool,

        /// Increase verbosity level (can be repeated: -v, -vv)
        #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
        verbosity: u8,
    },

    /// Initialize configuration file
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}
