use serde::{Deserialize, Serialize};

/// Effect a resource difference has on the deployed resource.
///
/// Mirrors the change-set impact reported by the underlying diff engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeImpact {
    NoChange,
    WillUpdate,
    WillReplace,
    MayReplace,
    WillDestroy,
    WillOrphan,
}

impl ChangeImpact {
    /// Whether this impact implies the existing resource (and its data) may be lost.
    pub fn is_destructive(self) -> bool {
        matches!(
            self,
            ChangeImpact::WillReplace
                | ChangeImpact::MayReplace
                | ChangeImpact::WillDestroy
                | ChangeImpact::WillOrphan
        )
    }
}

impl std::fmt::Display for ChangeImpact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ChangeImpact::NoChange => "NO_CHANGE",
            ChangeImpact::WillUpdate => "WILL_UPDATE",
            ChangeImpact::WillReplace => "WILL_REPLACE",
            ChangeImpact::MayReplace => "MAY_REPLACE",
            ChangeImpact::WillDestroy => "WILL_DESTROY",
            ChangeImpact::WillOrphan => "WILL_ORPHAN",
        };
        f.write_str(label)
    }
}

/// One side of a resource difference: the template fragment before or after.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ResourceSnapshot {
    /// CloudFormation resource type, e.g. `AWS::IAM::Role`. May be absent in
    /// malformed templates; classification degrades gracefully without it.
    #[serde(default, rename = "type")]
    pub resource_type: Option<String>,
    #[serde(default)]
    pub properties: serde_json::Value,
}

impl ResourceSnapshot {
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: Some(resource_type.into()),
            properties: serde_json::Value::Null,
        }
    }
}

/// A single per-resource difference as produced by the diff engine.
///
/// Addition/removal/update are mutually exclusive by construction: exactly one
/// of `old`/`new` is absent for additions and removals.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResourceDifference {
    pub logical_id: String,
    #[serde(default)]
    pub old: Option<ResourceSnapshot>,
    #[serde(default)]
    pub new: Option<ResourceSnapshot>,
    #[serde(default = "default_impact")]
    pub impact: ChangeImpact,
    /// Names of the top-level properties that changed, in template order.
    #[serde(default)]
    pub changed_properties: Vec<String>,
}

fn default_impact() -> ChangeImpact {
    ChangeImpact::NoChange
}

impl ResourceDifference {
    /// Resource type resolved from the old snapshot when present, else the new one.
    pub fn resource_type(&self) -> Option<&str> {
        self.old
            .as_ref()
            .and_then(|s| s.resource_type.as_deref())
            .or_else(|| self.new.as_ref().and_then(|s| s.resource_type.as_deref()))
    }

    pub fn is_addition(&self) -> bool {
        self.old.is_none() && self.new.is_some()
    }

    pub fn is_removal(&self) -> bool {
        self.old.is_some() && self.new.is_none()
    }

    pub fn is_update(&self) -> bool {
        self.old.is_some() && self.new.is_some()
    }
}

/// Opaque collection of per-resource differences for one stack.
///
/// Owned by the diff engine's output; never mutated by this crate.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TemplateDiff {
    #[serde(default)]
    pub resources: Vec<ResourceDifference>,
}

impl TemplateDiff {
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }
}

/// A deployable stack as enumerated by the assembly source.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackUnit {
    pub id: String,
    /// Stage the stack is deployed under; `None` for top-level stacks, which
    /// land in the synthetic default stage.
    #[serde(default)]
    pub stage_id: Option<String>,
}

/// A stage: the set of stacks deployed together. Built once per run and
/// immutable after population.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StageGroup {
    pub id: String,
    pub units: Vec<StackUnit>,
}

impl StageGroup {
    pub fn unit_ids(&self) -> Vec<String> {
        self.units.iter().map(|u| u.id.clone()).collect()
    }
}

/// A destructive change surfaced by classification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestructiveChange {
    pub stack_id: String,
    pub logical_id: String,
    pub impact: ChangeImpact,
}

/// Aggregate classification for one stack's diff. Computed once, never mutated.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub created: usize,
    pub updated: usize,
    pub removed: usize,
    /// Destructive entries in diff-iteration order. Allow-listed resource
    /// types never appear here, though they still count in the totals above.
    pub destructive: Vec<DestructiveChange>,
}

impl ClassificationResult {
    pub fn total_changes(&self) -> usize {
        self.created + self.updated + self.removed
    }

    pub fn has_changes(&self) -> bool {
        self.total_changes() > 0
    }
}

/// A rendered comment awaiting publication. Created fresh every run; only the
/// fingerprint is stable across runs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommentRecord {
    pub fingerprint: String,
    pub body_lines: Vec<String>,
    pub destructive_count: usize,
    pub total_change_count: usize,
}
