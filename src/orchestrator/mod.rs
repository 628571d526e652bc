//! Stage orchestration.
//!
//! One run walks the stage tree, classifies every stack's diff, renders the
//! comment bodies, and hands the publish plans to the comment publisher. The
//! run returns an explicit report owned by the caller; nothing is kept in
//! global state between runs.

use std::collections::HashMap;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::assembly::selection::StackSelector;
use crate::assembly::{build_stage_tree, AssemblySource};
use crate::classify::ChangeClassifier;
use crate::config::Config;
use crate::core::{CommentRecord, StackUnit, TemplateDiff};
use crate::errors::Error;
use crate::fingerprint::{stage_fingerprint, unit_fingerprint};
use crate::publish::{CommentPublisher, CommentStore, GroupCommentPlan, UnitCommentPlan};
use crate::render::{CommentRenderer, DiffFormatter, RenderStyle};

/// How the engine obtains the deployed side of the diff.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum DiffMethod {
    /// Compare against the stored deployed template only.
    #[default]
    TemplateOnly,
    /// Create a change set through the deploy role for precise impacts.
    ChangeSet,
}

/// Computes per-stack diffs for the whole tree in one batched request. The
/// engine may throttle or retry internally; this layer never retries it.
pub trait DiffEngine {
    fn compute_diffs(
        &self,
        units: &[StackUnit],
        method: DiffMethod,
    ) -> anyhow::Result<HashMap<String, TemplateDiff>>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Diffing,
    Classified,
    Commented,
    Done,
}

/// Per-stage outcome of a run.
#[derive(Clone, Debug)]
pub struct StageReport {
    pub stage_id: String,
    pub record: CommentRecord,
    /// Destructive count feeding the pass/fail decision: zero for stages in
    /// the ignore list, the factual count otherwise.
    pub net_destructive_count: usize,
}

/// The run's result object, owned by the caller.
#[derive(Clone, Debug, Default)]
pub struct RunReport {
    pub stages: Vec<StageReport>,
}

impl RunReport {
    /// The single signal the surrounding CI layer turns into pass/fail.
    pub fn has_destructive_changes(&self) -> bool {
        self.stages.iter().any(|stage| stage.net_destructive_count > 0)
    }
}

pub struct StageOrchestrator<'a> {
    config: &'a Config,
    assembly: &'a dyn AssemblySource,
    engine: &'a dyn DiffEngine,
    renderer: CommentRenderer<'a>,
    publisher: CommentPublisher,
    state: RunState,
}

impl<'a> StageOrchestrator<'a> {
    pub fn new(
        config: &'a Config,
        assembly: &'a dyn AssemblySource,
        engine: &'a dyn DiffEngine,
        formatter: &'a dyn DiffFormatter,
        publisher: CommentPublisher,
        style: RenderStyle,
    ) -> Self {
        Self {
            config,
            assembly,
            engine,
            renderer: CommentRenderer::new(formatter, style),
            publisher,
            state: RunState::Idle,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Execute one full run: diff, classify, render, publish.
    ///
    /// Any failure while loading, selecting, diffing, or publishing aborts
    /// the whole run; there is no partial-success mode.
    pub async fn run(&mut self, store: &dyn CommentStore) -> Result<RunReport, Error> {
        self.state = RunState::Diffing;
        let units = self.assembly.load_units().map_err(Error::Assembly)?;
        let selector = StackSelector::new(
            &self.config.stack_selector_patterns,
            self.config.stack_selection_strategy,
        )?;
        let groups = selector.filter(build_stage_tree(
            units,
            &self.config.default_stage_display_name,
        ))?;

        let all_units: Vec<StackUnit> = groups
            .iter()
            .flat_map(|group| group.units.iter().cloned())
            .collect();
        log::info!(
            "diffing {} stack(s) across {} stage(s) via {:?}",
            all_units.len(),
            groups.len(),
            self.config.diff_method
        );
        let mut diffs = self
            .engine
            .compute_diffs(&all_units, self.config.diff_method)
            .map_err(Error::Diff)?;

        self.state = RunState::Classified;
        let classifier =
            ChangeClassifier::new(self.config.allowed_destroy_types.iter().cloned().collect());
        let title = self.config.title.as_deref();

        let mut plans = Vec::with_capacity(groups.len());
        let mut stages = Vec::with_capacity(groups.len());
        for group in &groups {
            let mut unit_bodies = Vec::with_capacity(group.units.len());
            let mut unit_plans = Vec::with_capacity(group.units.len());
            let mut stage_destructive = 0;
            let mut stage_total = 0;

            for unit in &group.units {
                // A stack the engine reported nothing for is simply quiet.
                let diff = diffs.remove(&unit.id).unwrap_or_default();
                let classification = classifier.classify(&unit.id, &diff);
                let body = self.renderer.render_unit(&unit.id, &diff, &classification);

                stage_destructive += classification.destructive.len();
                stage_total += classification.total_changes();
                unit_plans.push(UnitCommentPlan {
                    stack_id: unit.id.clone(),
                    record: CommentRecord {
                        fingerprint: unit_fingerprint(&group.id, &unit.id, title),
                        body_lines: self.renderer.with_title(title, body.clone()),
                        destructive_count: classification.destructive.len(),
                        total_change_count: classification.total_changes(),
                    },
                });
                unit_bodies.push(body);
            }

            let record = CommentRecord {
                fingerprint: stage_fingerprint(&group.id, title, &group.unit_ids()),
                body_lines: self.renderer.render_group(
                    &group.id,
                    &unit_bodies,
                    stage_destructive,
                    title,
                ),
                destructive_count: stage_destructive,
                total_change_count: stage_total,
            };

            // Ignored stages keep their factual warning text; only the
            // pass/fail contribution is suppressed.
            let ignored = self
                .config
                .no_fail_on_destructive_changes
                .contains(&group.id);
            if ignored && stage_destructive > 0 {
                log::info!(
                    "stage `{}`: {} destructive change(s) ignored for the pass/fail decision",
                    group.id,
                    stage_destructive
                );
            }

            stages.push(StageReport {
                stage_id: group.id.clone(),
                record: record.clone(),
                net_destructive_count: if ignored { 0 } else { stage_destructive },
            });
            plans.push(GroupCommentPlan {
                stage_id: group.id.clone(),
                record,
                units: unit_plans,
            });
        }

        self.state = RunState::Commented;
        self.publisher.publish(&plans, store).await?;

        self.state = RunState::Done;
        Ok(RunReport { stages })
    }
}
