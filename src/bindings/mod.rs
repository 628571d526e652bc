//! File-backed collaborator bindings.
//!
//! The cloud transports behind the assembly, diff, and comment seams live
//! outside this crate. These bindings make the binary runnable end to end: a
//! JSON snapshot written at synthesis time feeds the assembly and diff seams,
//! and a dry-run store renders would-be comments to stdout.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::assembly::AssemblySource;
use crate::core::{StackUnit, TemplateDiff};
use crate::orchestrator::{DiffEngine, DiffMethod};
use crate::publish::{fingerprint_marker, CommentStore, StoreError};
use crate::render::DiffFormatter;

/// On-disk snapshot: every synthesized stack with its precomputed diff.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DiffSnapshot {
    pub stacks: Vec<SnapshotStack>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SnapshotStack {
    pub id: String,
    #[serde(default)]
    pub stage: Option<String>,
    #[serde(default)]
    pub diff: TemplateDiff,
}

/// Serves both the assembly and diff seams from one snapshot file.
pub struct SnapshotFile {
    snapshot: DiffSnapshot,
}

impl SnapshotFile {
    pub fn open(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read diff snapshot {}", path.display()))?;
        let snapshot = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse diff snapshot {}", path.display()))?;
        Ok(Self { snapshot })
    }

    pub fn from_snapshot(snapshot: DiffSnapshot) -> Self {
        Self { snapshot }
    }
}

impl AssemblySource for SnapshotFile {
    fn load_units(&self) -> Result<Vec<StackUnit>> {
        Ok(self
            .snapshot
            .stacks
            .iter()
            .map(|stack| StackUnit {
                id: stack.id.clone(),
                stage_id: stack.stage.clone(),
            })
            .collect())
    }
}

impl DiffEngine for SnapshotFile {
    fn compute_diffs(
        &self,
        units: &[StackUnit],
        method: DiffMethod,
    ) -> Result<HashMap<String, TemplateDiff>> {
        // Diffs were computed at synthesis time; the method only matters to
        // live engines.
        log::debug!(
            "serving {} precomputed diff(s) ({method:?} requested)",
            units.len()
        );
        let wanted: HashSet<&str> = units.iter().map(|unit| unit.id.as_str()).collect();
        Ok(self
            .snapshot
            .stacks
            .iter()
            .filter(|stack| wanted.contains(stack.id.as_str()))
            .map(|stack| (stack.id.clone(), stack.diff.clone()))
            .collect())
    }
}

/// Minimal shell-style rendering for the fenced code block: one
/// `+`/`-`/`~` line per resource difference.
pub struct UnifiedDiffFormatter;

impl DiffFormatter for UnifiedDiffFormatter {
    fn format_human(&self, diff: &TemplateDiff) -> String {
        let mut lines = Vec::with_capacity(diff.len());
        for difference in &diff.resources {
            let sigil = if difference.is_addition() {
                '+'
            } else if difference.is_removal() {
                '-'
            } else {
                '~'
            };
            let resource_type = difference.resource_type().unwrap_or("<unknown type>");
            let mut line = format!(
                "{sigil} {} {} [{}]",
                difference.logical_id, resource_type, difference.impact
            );
            if difference.is_update() && !difference.changed_properties.is_empty() {
                line.push_str(&format!(" ({})", difference.changed_properties.join(", ")));
            }
            lines.push(line);
        }
        lines.join("\n")
    }
}

/// Publishes comments as files in a directory, one per fingerprint. Gives CI
/// jobs a durable artifact and exercises the full create/update/delete cycle
/// across runs.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn path_for(&self, fingerprint: &str) -> PathBuf {
        self.dir.join(format!("{fingerprint}.md"))
    }
}

fn assemble_body(fingerprint: &str, lines: &[String]) -> String {
    let mut body = fingerprint_marker(fingerprint);
    for line in lines {
        body.push('\n');
        body.push_str(line);
    }
    body
}

fn io_error(error: std::io::Error) -> StoreError {
    StoreError::Api(error.to_string())
}

#[async_trait]
impl CommentStore for FileStore {
    async fn find_previous(&self, fingerprint: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(fingerprint);
        Ok(path.exists().then(|| path.to_string_lossy().into_owned()))
    }

    async fn create_comment(&self, fingerprint: &str, lines: &[String]) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).map_err(io_error)?;
        fs::write(self.path_for(fingerprint), assemble_body(fingerprint, lines)).map_err(io_error)
    }

    async fn update_comment(
        &self,
        comment_id: &str,
        fingerprint: &str,
        lines: &[String],
    ) -> Result<(), StoreError> {
        fs::write(Path::new(comment_id), assemble_body(fingerprint, lines)).map_err(io_error)
    }

    async fn delete_comment(&self, comment_id: &str) -> Result<(), StoreError> {
        fs::remove_file(Path::new(comment_id)).map_err(io_error)
    }
}

/// Prints every store operation instead of talking to a host.
pub struct DryRunStore;

#[async_trait]
impl CommentStore for DryRunStore {
    async fn find_previous(&self, _fingerprint: &str) -> Result<Option<String>, StoreError> {
        Ok(None)
    }

    async fn create_comment(&self, fingerprint: &str, lines: &[String]) -> Result<(), StoreError> {
        println!("{}", fingerprint_marker(fingerprint));
        for line in lines {
            println!("{line}");
        }
        println!();
        Ok(())
    }

    async fn update_comment(
        &self,
        comment_id: &str,
        fingerprint: &str,
        lines: &[String],
    ) -> Result<(), StoreError> {
        println!("(would update comment {comment_id})");
        self.create_comment(fingerprint, lines).await
    }

    async fn delete_comment(&self, comment_id: &str) -> Result<(), StoreError> {
        println!("(would delete comment {comment_id})");
        Ok(())
    }
}
