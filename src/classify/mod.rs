//! Destructive-change classification.
//!
//! Turns one stack's raw template diff into aggregate created/updated/removed
//! counts plus the list of destructive changes, applying the allow-list and
//! noise-suppression rules. Pure CPU-bound logic; no I/O.

use std::collections::HashSet;

use crate::core::{
    ChangeImpact, ClassificationResult, DestructiveChange, ResourceDifference, TemplateDiff,
};

/// Resource type emitted purely for construct-tree bookkeeping. Carries no
/// deployed behavior, so differences on it are dropped entirely.
pub const METADATA_RESOURCE_TYPE: &str = "AWS::CDK::Metadata";

/// Resource types whose code-pointer churn is a deployment artifact rather
/// than a semantic change.
const FUNCTION_RESOURCE_TYPES: &[&str] = &["AWS::Lambda::Function"];

/// Properties that change on every synthesis of a function-like resource.
const ARTIFACT_PROPERTIES: &[&str] = &["Code", "Metadata"];

pub type NoisePredicate = Box<dyn Fn(&ResourceDifference) -> bool + Send + Sync>;

/// Classifies per-resource differences for one stack at a time.
pub struct ChangeClassifier {
    allowed_destroy_types: HashSet<String>,
    noise: NoisePredicate,
}

impl ChangeClassifier {
    pub fn new(allowed_destroy_types: HashSet<String>) -> Self {
        Self {
            allowed_destroy_types,
            noise: Box::new(is_deployment_artifact),
        }
    }

    /// Replace the default noise rule. The predicate returns true for
    /// differences that should be excluded from counts and classification.
    pub fn with_noise_predicate<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&ResourceDifference) -> bool + Send + Sync + 'static,
    {
        self.noise = Box::new(predicate);
        self
    }

    /// Classify every difference in `diff`.
    ///
    /// Destructive entries preserve diff-iteration order. Differences with no
    /// resolvable resource type never match the allow-list or the default
    /// noise rule and fall through to plain count classification.
    pub fn classify(&self, stack_id: &str, diff: &TemplateDiff) -> ClassificationResult {
        let mut result = ClassificationResult::default();

        for difference in &diff.resources {
            if (self.noise)(difference) {
                continue;
            }

            if difference.is_addition() {
                result.created += 1;
            } else if difference.is_removal() {
                result.removed += 1;
            } else {
                result.updated += 1;
            }

            if self.is_allowed_destroy(difference) {
                continue;
            }

            // The diff engine does not report a meaningful impact for
            // removals, so removals are pinned to WILL_DESTROY.
            let impact = if difference.is_removal() {
                Some(ChangeImpact::WillDestroy)
            } else if difference.impact.is_destructive() {
                Some(difference.impact)
            } else {
                None
            };

            if let Some(impact) = impact {
                result.destructive.push(DestructiveChange {
                    stack_id: stack_id.to_string(),
                    logical_id: difference.logical_id.clone(),
                    impact,
                });
            }
        }

        result
    }

    fn is_allowed_destroy(&self, difference: &ResourceDifference) -> bool {
        difference
            .resource_type()
            .is_some_and(|t| self.allowed_destroy_types.contains(t))
    }
}

/// Default noise rule: metadata marker resources, and function-like resources
/// whose update touches nothing beyond the code pointer and metadata.
pub fn is_deployment_artifact(difference: &ResourceDifference) -> bool {
    let Some(resource_type) = difference.resource_type() else {
        return false;
    };

    if resource_type == METADATA_RESOURCE_TYPE {
        return true;
    }

    FUNCTION_RESOURCE_TYPES.contains(&resource_type)
        && difference.is_update()
        && !difference.changed_properties.is_empty()
        && difference.changed_properties.len() <= 2
        && difference
            .changed_properties
            .iter()
            .all(|p| ARTIFACT_PROPERTIES.contains(&p.as_str()))
}
