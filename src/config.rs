//! Configuration surface.
//!
//! Options come from an optional `stackdiff.toml` with CLI flags layered on
//! top by the command handlers. Every field has a default so an empty file
//! and a missing file behave identically.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::assembly::selection::{SelectionStrategy, StackSelector};
use crate::orchestrator::DiffMethod;
use crate::publish::QuietCommentPolicy;

pub const DEFAULT_CONFIG_FILE: &str = "stackdiff.toml";

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Resource types whose destruction is acceptable. Allow-listed types
    /// still count toward the change totals but never fail the build.
    pub allowed_destroy_types: Vec<String>,

    /// Fail the build when disallowed destructive changes are detected.
    pub fail_on_destructive_changes: bool,

    /// Stages whose destructive changes are excluded from the pass/fail
    /// decision. The rendered warnings stay factual.
    pub no_fail_on_destructive_changes: Vec<String>,

    /// Glob patterns selecting which stacks a run covers; `!` excludes.
    pub stack_selector_patterns: Vec<String>,

    pub stack_selection_strategy: SelectionStrategy,

    pub diff_method: DiffMethod,

    /// Display name for the synthetic stage holding top-level stacks.
    pub default_stage_display_name: String,

    /// Optional heading prepended to every published comment. Part of the
    /// comment identity: changing it starts a fresh comment thread.
    pub title: Option<String>,

    pub quiet_comment_policy: QuietCommentPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            allowed_destroy_types: Vec::new(),
            fail_on_destructive_changes: true,
            no_fail_on_destructive_changes: Vec::new(),
            stack_selector_patterns: Vec::new(),
            stack_selection_strategy: SelectionStrategy::All,
            diff_method: DiffMethod::TemplateOnly,
            default_stage_display_name: "DefaultStage".to_string(),
            title: None,
            quiet_comment_policy: QuietCommentPolicy::DeleteStale,
        }
    }
}

impl Config {
    /// Load from `path`, or from `./stackdiff.toml` when present, or fall
    /// back to defaults. An explicitly named file must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if !default.exists() {
                    return Ok(Self::default());
                }
                default.to_path_buf()
            }
        };

        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        StackSelector::new(&self.stack_selector_patterns, self.stack_selection_strategy)?;
        if self.default_stage_display_name.is_empty() {
            bail!("default_stage_display_name must not be empty");
        }
        Ok(())
    }

    /// Commented starter file written by `stackdiff init`.
    pub fn starter_toml() -> &'static str {
        r#"# stackdiff configuration

# Resource types allowed to be destroyed without failing the build.
# allowed_destroy_types = ["AWS::CloudWatch::Dashboard"]

# Fail the build when destructive changes are detected (default: true).
# fail_on_destructive_changes = true

# Stages whose destructive changes never fail the build.
# no_fail_on_destructive_changes = ["dev"]

# Glob patterns selecting which stacks to diff; prefix with '!' to exclude.
# stack_selector_patterns = ["prod/*", "!*-canary"]
# stack_selection_strategy = "pattern-match"   # all | pattern-match | pattern-must-match

# diff_method = "template-only"                # template-only | change-set

# Display name for the synthetic stage holding top-level stacks.
# default_stage_display_name = "DefaultStage"

# Heading prepended to every published comment.
# title = "Infrastructure diff"

# What to do for stacks with no changes: delete-stale | post-no-changes
# quiet_comment_policy = "delete-stale"
"#
    }
}
