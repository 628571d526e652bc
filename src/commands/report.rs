//! The report command: wire configuration to the collaborators, run one
//! orchestrated pass, and translate the outcome into an exit code.

use std::path::PathBuf;

use anyhow::Result;

use crate::assembly::selection::SelectionStrategy;
use crate::bindings::{DryRunStore, FileStore, SnapshotFile, UnifiedDiffFormatter};
use crate::config::Config;
use crate::orchestrator::{DiffMethod, RunReport, StageOrchestrator};
use crate::publish::{Attribution, CommentPublisher, CommentStore, QuietCommentPolicy};
use crate::render::RenderStyle;

pub struct ReportConfig {
    pub snapshot: PathBuf,
    pub config: Option<PathBuf>,
    pub allowed_destroy_types: Option<Vec<String>>,
    pub no_fail_on_destructive: bool,
    pub ignore_destructive_stages: Option<Vec<String>>,
    pub stack_selector_patterns: Option<Vec<String>>,
    pub stack_selection_strategy: Option<SelectionStrategy>,
    pub diff_method: Option<DiffMethod>,
    pub title: Option<String>,
    pub quiet_comment_policy: Option<QuietCommentPolicy>,
    pub commit: String,
    pub out_dir: Option<PathBuf>,
    pub plain: bool,
}

pub fn run_report(options: ReportConfig) -> Result<i32> {
    let mut config = Config::load(options.config.as_deref())?;
    apply_overrides(&mut config, &options);
    config.validate()?;

    let snapshot = SnapshotFile::open(&options.snapshot)?;
    let formatter = UnifiedDiffFormatter;
    let publisher = CommentPublisher::new(
        config.quiet_comment_policy,
        Attribution::new(options.commit.clone()),
    );
    let style = if options.plain {
        RenderStyle::plain()
    } else {
        RenderStyle::default()
    };
    let store: Box<dyn CommentStore> = match &options.out_dir {
        Some(dir) => Box::new(FileStore::new(dir.clone())),
        None => Box::new(DryRunStore),
    };

    let mut orchestrator =
        StageOrchestrator::new(&config, &snapshot, &snapshot, &formatter, publisher, style);

    let runtime = tokio::runtime::Runtime::new()?;
    let report = runtime.block_on(orchestrator.run(store.as_ref()))?;

    summarize(&report);
    if report.has_destructive_changes() {
        log::warn!("destructive changes detected");
        if config.fail_on_destructive_changes {
            return Ok(1);
        }
    }
    Ok(0)
}

fn apply_overrides(config: &mut Config, options: &ReportConfig) {
    if let Some(types) = &options.allowed_destroy_types {
        config.allowed_destroy_types = types.clone();
    }
    if options.no_fail_on_destructive {
        config.fail_on_destructive_changes = false;
    }
    if let Some(stages) = &options.ignore_destructive_stages {
        config.no_fail_on_destructive_changes = stages.clone();
    }
    if let Some(patterns) = &options.stack_selector_patterns {
        config.stack_selector_patterns = patterns.clone();
    }
    if let Some(strategy) = options.stack_selection_strategy {
        config.stack_selection_strategy = strategy;
    }
    if let Some(method) = options.diff_method {
        config.diff_method = method;
    }
    if let Some(title) = &options.title {
        config.title = Some(title.clone());
    }
    if let Some(policy) = options.quiet_comment_policy {
        config.quiet_comment_policy = policy;
    }
}

fn summarize(report: &RunReport) {
    for stage in &report.stages {
        log::info!(
            "stage `{}`: {} change(s), {} destructive ({} counted)",
            stage.stage_id,
            stage.record.total_change_count,
            stage.record.destructive_count,
            stage.net_destructive_count,
        );
    }
}
