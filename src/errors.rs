//! Error taxonomy for a reporting run.
//!
//! Selection and configuration problems abort before diffing; diff-engine
//! failures abort the run without retries; store failures carry a typed
//! kind so callers branch on conditions instead of transport payloads.
//! Classification itself never fails. Command handlers bridge to
//! `anyhow::Result` at the top level.

use thiserror::Error;

use crate::publish::StoreError;

#[derive(Debug, Error)]
pub enum Error {
    /// A must-match pattern set selected no stack at all.
    #[error("no stack matched the selection patterns: {patterns:?}")]
    Selection { patterns: Vec<String> },

    /// Configuration file or option validation failures.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The assembly source could not enumerate the deployment tree.
    #[error("failed to load the deployment tree")]
    Assembly(#[source] anyhow::Error),

    /// The external diff engine failed; not retried at this layer.
    #[error("diff computation failed")]
    Diff(#[source] anyhow::Error),

    /// Even a single stack's comment exceeds the host's size limit, so no
    /// further splitting can help. Named per stack so operators know the
    /// stack's diff itself is the problem, not the grouping policy.
    #[error("comment for stack `{stack_id}` is too long")]
    UnitCommentTooLong { stack_id: String },

    /// Any other comment-store failure.
    #[error("comment store error for `{target}`")]
    Store {
        target: String,
        #[source]
        source: StoreError,
    },

    /// Aggregate of per-stack publish failures after a wait-all-settled join.
    #[error("failed to publish {failed} of {total} stack comment(s): {}", .failures.join("; "))]
    Publish {
        failed: usize,
        total: usize,
        failures: Vec<String>,
    },
}
