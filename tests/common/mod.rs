//! Shared doubles for the integration tests: a recording comment store and
//! static assembly/diff collaborators.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use stackdiff::publish::fingerprint_marker;
use stackdiff::{
    AssemblySource, ChangeImpact, CommentStore, DiffEngine, DiffMethod, ResourceDifference,
    ResourceSnapshot, StackUnit, StoreError, TemplateDiff,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreCall {
    Find(String),
    Create(String),
    Update(String),
    Delete(String),
}

#[derive(Default)]
struct StoreState {
    // fingerprint -> assembled body; the comment id is the fingerprint itself
    comments: HashMap<String, String>,
    calls: Vec<StoreCall>,
}

/// In-memory comment store recording every call.
#[derive(Default)]
pub struct RecordingStore {
    state: Mutex<StoreState>,
    max_body: Option<usize>,
    failing: Vec<String>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject assembled bodies larger than `max` with `BodyTooLong`.
    pub fn with_max_body(mut self, max: usize) -> Self {
        self.max_body = Some(max);
        self
    }

    /// Fail create/update for these fingerprints with a generic API error.
    pub fn with_failing(mut self, fingerprints: Vec<String>) -> Self {
        self.failing = fingerprints;
        self
    }

    /// Pretend a previous run left this comment behind.
    pub fn seed_comment(&self, fingerprint: &str, body: &str) {
        let mut state = self.state.lock().unwrap();
        state.comments.insert(fingerprint.to_string(), body.to_string());
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn creates(&self) -> usize {
        self.count(|call| matches!(call, StoreCall::Create(_)))
    }

    pub fn updates(&self) -> usize {
        self.count(|call| matches!(call, StoreCall::Update(_)))
    }

    pub fn deletes(&self) -> usize {
        self.count(|call| matches!(call, StoreCall::Delete(_)))
    }

    pub fn body(&self, fingerprint: &str) -> Option<String> {
        self.state.lock().unwrap().comments.get(fingerprint).cloned()
    }

    fn count(&self, predicate: impl Fn(&StoreCall) -> bool) -> usize {
        self.state.lock().unwrap().calls.iter().filter(|c| predicate(c)).count()
    }

    fn check_write(&self, fingerprint: &str, lines: &[String]) -> Result<String, StoreError> {
        if self.failing.iter().any(|f| f == fingerprint) {
            return Err(StoreError::Api("injected failure".to_string()));
        }
        let body = assemble(fingerprint, lines);
        if self.max_body.is_some_and(|max| body.chars().count() > max) {
            return Err(StoreError::BodyTooLong);
        }
        Ok(body)
    }
}

fn assemble(fingerprint: &str, lines: &[String]) -> String {
    let mut body = fingerprint_marker(fingerprint);
    for line in lines {
        body.push('\n');
        body.push_str(line);
    }
    body
}

#[async_trait]
impl CommentStore for RecordingStore {
    async fn find_previous(&self, fingerprint: &str) -> Result<Option<String>, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(StoreCall::Find(fingerprint.to_string()));
        Ok(state
            .comments
            .contains_key(fingerprint)
            .then(|| fingerprint.to_string()))
    }

    async fn create_comment(&self, fingerprint: &str, lines: &[String]) -> Result<(), StoreError> {
        let body = self.check_write(fingerprint, lines)?;
        let mut state = self.state.lock().unwrap();
        state.calls.push(StoreCall::Create(fingerprint.to_string()));
        state.comments.insert(fingerprint.to_string(), body);
        Ok(())
    }

    async fn update_comment(
        &self,
        comment_id: &str,
        fingerprint: &str,
        lines: &[String],
    ) -> Result<(), StoreError> {
        let body = self.check_write(fingerprint, lines)?;
        let mut state = self.state.lock().unwrap();
        state.calls.push(StoreCall::Update(comment_id.to_string()));
        state.comments.insert(comment_id.to_string(), body);
        Ok(())
    }

    async fn delete_comment(&self, comment_id: &str) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(StoreCall::Delete(comment_id.to_string()));
        state.comments.remove(comment_id);
        Ok(())
    }
}

/// Assembly source serving a fixed unit list.
pub struct StaticAssembly {
    pub units: Vec<StackUnit>,
}

impl AssemblySource for StaticAssembly {
    fn load_units(&self) -> anyhow::Result<Vec<StackUnit>> {
        Ok(self.units.clone())
    }
}

/// Diff engine serving fixed diffs and counting invocations.
#[derive(Default)]
pub struct StaticDiffEngine {
    pub diffs: HashMap<String, TemplateDiff>,
    pub fail: bool,
    calls: Mutex<usize>,
}

impl StaticDiffEngine {
    pub fn new(diffs: HashMap<String, TemplateDiff>) -> Self {
        Self {
            diffs,
            fail: false,
            calls: Mutex::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

impl DiffEngine for StaticDiffEngine {
    fn compute_diffs(
        &self,
        units: &[StackUnit],
        _method: DiffMethod,
    ) -> anyhow::Result<HashMap<String, TemplateDiff>> {
        *self.calls.lock().unwrap() += 1;
        if self.fail {
            anyhow::bail!("deployed template lookup failed");
        }
        Ok(units
            .iter()
            .filter_map(|unit| {
                self.diffs
                    .get(&unit.id)
                    .map(|diff| (unit.id.clone(), diff.clone()))
            })
            .collect())
    }
}

pub fn stack(id: &str, stage: Option<&str>) -> StackUnit {
    StackUnit {
        id: id.to_string(),
        stage_id: stage.map(str::to_string),
    }
}

pub fn update_diff(logical_id: &str, resource_type: &str, impact: ChangeImpact) -> TemplateDiff {
    TemplateDiff {
        resources: vec![ResourceDifference {
            logical_id: logical_id.to_string(),
            old: Some(ResourceSnapshot::new(resource_type)),
            new: Some(ResourceSnapshot::new(resource_type)),
            impact,
            changed_properties: vec!["RoleName".to_string()],
        }],
    }
}

pub fn removal_diff(logical_id: &str, resource_type: &str) -> TemplateDiff {
    TemplateDiff {
        resources: vec![ResourceDifference {
            logical_id: logical_id.to_string(),
            old: Some(ResourceSnapshot::new(resource_type)),
            new: None,
            impact: ChangeImpact::NoChange,
            changed_properties: vec![],
        }],
    }
}
