//! Idempotent comment publishing.
//!
//! Each comment identity is located by its fingerprint marker: an existing
//! comment is updated in place, a missing one is created, and a stale one for
//! a now-quiet identity is deleted. Stage comments that exceed the host's
//! body-size limit fall back to one comment per stack, published
//! concurrently with a wait-all-settled join.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use clap::ValueEnum;
use futures::future;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::CommentRecord;
use crate::errors::Error;

/// Hard upper bound on a comment body accepted by the host.
pub const MAX_COMMENT_BODY: usize = 65536;

/// Store failures, typed at the boundary so callers branch on a kind rather
/// than inspecting transport error payloads.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("comment body exceeds the maximum size")]
    BodyTooLong,
    #[error("comment store request failed: {0}")]
    Api(String),
}

/// Remote comment operations. Implementations prepend the fingerprint marker
/// line to the body so `find_previous` can locate the comment next run.
#[async_trait]
pub trait CommentStore: Send + Sync {
    async fn find_previous(&self, fingerprint: &str) -> Result<Option<String>, StoreError>;
    async fn create_comment(&self, fingerprint: &str, lines: &[String]) -> Result<(), StoreError>;
    async fn update_comment(
        &self,
        comment_id: &str,
        fingerprint: &str,
        lines: &[String],
    ) -> Result<(), StoreError>;
    async fn delete_comment(&self, comment_id: &str) -> Result<(), StoreError>;
}

/// Marker line embedded in every published body.
pub fn fingerprint_marker(fingerprint: &str) -> String {
    format!("<!-- stackdiff fingerprint: {fingerprint} -->")
}

/// What to do for an identity whose diff has zero changes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum QuietCommentPolicy {
    /// Delete any previous comment and post nothing.
    #[default]
    DeleteStale,
    /// Keep posting an explicit "no changes" comment.
    PostNoChanges,
}

/// Footer context naming the commit a run reported on.
#[derive(Clone, Debug)]
pub struct Attribution {
    pub commit: String,
    pub generated_at: DateTime<Utc>,
}

impl Attribution {
    pub fn new(commit: impl Into<String>) -> Self {
        Self {
            commit: commit.into(),
            generated_at: Utc::now(),
        }
    }

    fn line(&self) -> String {
        format!(
            "*Diff generated for commit `{}` at {}*",
            self.commit,
            self.generated_at.to_rfc3339()
        )
    }
}

/// One stack's comment in fallback mode.
#[derive(Clone, Debug)]
pub struct UnitCommentPlan {
    pub stack_id: String,
    pub record: CommentRecord,
}

/// One stage's aggregate comment plus its per-stack fallback plans.
#[derive(Clone, Debug)]
pub struct GroupCommentPlan {
    pub stage_id: String,
    pub record: CommentRecord,
    pub units: Vec<UnitCommentPlan>,
}

pub struct CommentPublisher {
    quiet_policy: QuietCommentPolicy,
    attribution: Attribution,
}

impl CommentPublisher {
    pub fn new(quiet_policy: QuietCommentPolicy, attribution: Attribution) -> Self {
        Self {
            quiet_policy,
            attribution,
        }
    }

    /// Publish every stage plan. The size check is lazy per stage, so small
    /// stages keep their single aggregate comment even when another stage
    /// overflows.
    pub async fn publish(
        &self,
        plans: &[GroupCommentPlan],
        store: &dyn CommentStore,
    ) -> Result<(), Error> {
        for plan in plans {
            if self.assembled_size(&plan.record) <= MAX_COMMENT_BODY {
                match self.publish_record(&plan.record, store).await {
                    Ok(()) => continue,
                    // The proactive check can disagree with the host by the
                    // transport's own overhead; treat its verdict as final.
                    Err(StoreError::BodyTooLong) => {
                        log::warn!(
                            "stage `{}`: store rejected the aggregate comment as too long; splitting",
                            plan.stage_id
                        );
                    }
                    Err(source) => {
                        return Err(Error::Store {
                            target: plan.stage_id.clone(),
                            source,
                        });
                    }
                }
            } else {
                log::info!(
                    "stage `{}`: aggregate comment exceeds {} characters; publishing {} per-stack comments",
                    plan.stage_id,
                    MAX_COMMENT_BODY,
                    plan.units.len()
                );
            }
            self.publish_units(&plan.units, store).await?;
        }
        Ok(())
    }

    // Fire every per-stack publish together, wait for all of them, then
    // aggregate failures. Partial transport success is allowed; the run as a
    // whole still fails if any stack failed.
    async fn publish_units(
        &self,
        units: &[UnitCommentPlan],
        store: &dyn CommentStore,
    ) -> Result<(), Error> {
        let outcomes =
            future::join_all(units.iter().map(|unit| self.publish_unit(unit, store))).await;

        let mut failures: Vec<Error> = outcomes.into_iter().filter_map(Result::err).collect();
        match failures.len() {
            0 => Ok(()),
            1 => Err(failures.remove(0)),
            failed => Err(Error::Publish {
                failed,
                total: units.len(),
                failures: failures.iter().map(Error::to_string).collect(),
            }),
        }
    }

    async fn publish_unit(
        &self,
        unit: &UnitCommentPlan,
        store: &dyn CommentStore,
    ) -> Result<(), Error> {
        if self.assembled_size(&unit.record) > MAX_COMMENT_BODY {
            return Err(Error::UnitCommentTooLong {
                stack_id: unit.stack_id.clone(),
            });
        }
        self.publish_record(&unit.record, store)
            .await
            .map_err(|source| match source {
                StoreError::BodyTooLong => Error::UnitCommentTooLong {
                    stack_id: unit.stack_id.clone(),
                },
                source => Error::Store {
                    target: unit.stack_id.clone(),
                    source,
                },
            })
    }

    // Create/update/delete one comment identity.
    async fn publish_record(
        &self,
        record: &CommentRecord,
        store: &dyn CommentStore,
    ) -> Result<(), StoreError> {
        let previous = store.find_previous(&record.fingerprint).await?;

        if record.total_change_count == 0 && self.quiet_policy == QuietCommentPolicy::DeleteStale {
            if let Some(comment_id) = previous {
                log::debug!("deleting stale comment {comment_id} for quiet identity");
                store.delete_comment(&comment_id).await?;
            }
            return Ok(());
        }

        let lines = self.lines_with_footer(&record.body_lines);
        match previous {
            Some(comment_id) => {
                store
                    .update_comment(&comment_id, &record.fingerprint, &lines)
                    .await
            }
            None => store.create_comment(&record.fingerprint, &lines).await,
        }
    }

    fn lines_with_footer(&self, body_lines: &[String]) -> Vec<String> {
        let mut lines = body_lines.to_vec();
        lines.push(String::new());
        lines.push(self.attribution.line());
        lines
    }

    // Size of the body as the store will assemble it: marker line, content,
    // footer, newline-joined.
    fn assembled_size(&self, record: &CommentRecord) -> usize {
        let marker = fingerprint_marker(&record.fingerprint);
        let lines = self.lines_with_footer(&record.body_lines);
        marker.chars().count()
            + lines
                .iter()
                .map(|line| 1 + line.chars().count())
                .sum::<usize>()
    }
}
