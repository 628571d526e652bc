//! Stack selection patterns.
//!
//! Glob-style patterns prune which stages and stacks a run covers. A leading
//! `!` marks an exclusion. Patterns match either the bare stack id or the
//! qualified `stage/stack` form.

use clap::ValueEnum;
use glob::Pattern;
use serde::{Deserialize, Serialize};

use crate::core::StageGroup;
use crate::errors::Error;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SelectionStrategy {
    /// Keep every stack; patterns are ignored.
    #[default]
    All,
    /// Keep stacks matching the patterns; an empty result is acceptable.
    PatternMatch,
    /// Keep stacks matching the patterns; error when nothing matches.
    PatternMustMatch,
}

#[derive(Debug)]
pub struct StackSelector {
    includes: Vec<Pattern>,
    excludes: Vec<Pattern>,
    raw_patterns: Vec<String>,
    strategy: SelectionStrategy,
}

impl StackSelector {
    pub fn new(patterns: &[String], strategy: SelectionStrategy) -> Result<Self, Error> {
        let mut includes = Vec::new();
        let mut excludes = Vec::new();
        for raw in patterns {
            let (target, source) = match raw.strip_prefix('!') {
                Some(rest) => (&mut excludes, rest),
                None => (&mut includes, raw.as_str()),
            };
            let pattern = Pattern::new(source)
                .map_err(|e| Error::Configuration(format!("invalid stack pattern `{raw}`: {e}")))?;
            target.push(pattern);
        }
        Ok(Self {
            includes,
            excludes,
            raw_patterns: patterns.to_vec(),
            strategy,
        })
    }

    /// Apply the selection to a stage tree, dropping stages left empty.
    pub fn filter(&self, groups: Vec<StageGroup>) -> Result<Vec<StageGroup>, Error> {
        if self.strategy == SelectionStrategy::All {
            return Ok(groups);
        }

        let filtered: Vec<StageGroup> = groups
            .into_iter()
            .filter_map(|mut group| {
                let stage_id = group.id.clone();
                group.units.retain(|unit| self.matches(&stage_id, &unit.id));
                (!group.units.is_empty()).then_some(group)
            })
            .collect();

        if self.strategy == SelectionStrategy::PatternMustMatch && filtered.is_empty() {
            return Err(Error::Selection {
                patterns: self.raw_patterns.clone(),
            });
        }

        Ok(filtered)
    }

    fn matches(&self, stage_id: &str, unit_id: &str) -> bool {
        let qualified = format!("{stage_id}/{unit_id}");
        let hit = |pattern: &Pattern| pattern.matches(unit_id) || pattern.matches(&qualified);

        if self.excludes.iter().any(|pattern| hit(pattern)) {
            return false;
        }
        self.includes.is_empty() || self.includes.iter().any(|pattern| hit(pattern))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StackUnit;

    fn group(stage: &str, stacks: &[&str]) -> StageGroup {
        StageGroup {
            id: stage.to_string(),
            units: stacks
                .iter()
                .map(|id| StackUnit {
                    id: id.to_string(),
                    stage_id: Some(stage.to_string()),
                })
                .collect(),
        }
    }

    fn patterns(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn all_strategy_bypasses_patterns() {
        let selector = StackSelector::new(&patterns(&["nothing-matches"]), SelectionStrategy::All).unwrap();
        let kept = selector.filter(vec![group("prod", &["api"])]).unwrap();
        assert_eq!(kept[0].unit_ids(), vec!["api"]);
    }

    #[test]
    fn include_patterns_match_bare_and_qualified_names() {
        let selector =
            StackSelector::new(&patterns(&["prod/*"]), SelectionStrategy::PatternMatch).unwrap();
        let kept = selector
            .filter(vec![group("prod", &["api", "db"]), group("staging", &["api"])])
            .unwrap();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "prod");
        assert_eq!(kept[0].unit_ids(), vec!["api", "db"]);
    }

    #[test]
    fn exclusions_apply_on_top_of_includes() {
        let selector =
            StackSelector::new(&patterns(&["prod/*", "!*db*"]), SelectionStrategy::PatternMatch).unwrap();
        let kept = selector.filter(vec![group("prod", &["api", "db"])]).unwrap();
        assert_eq!(kept[0].unit_ids(), vec!["api"]);
    }

    #[test]
    fn exclusion_only_patterns_keep_the_rest() {
        let selector =
            StackSelector::new(&patterns(&["!legacy-*"]), SelectionStrategy::PatternMatch).unwrap();
        let kept = selector
            .filter(vec![group("prod", &["api", "legacy-queue"])])
            .unwrap();
        assert_eq!(kept[0].unit_ids(), vec!["api"]);
    }

    #[test]
    fn must_match_errors_when_nothing_matches() {
        let selector =
            StackSelector::new(&patterns(&["absent-*"]), SelectionStrategy::PatternMustMatch).unwrap();
        let err = selector.filter(vec![group("prod", &["api"])]).unwrap_err();
        assert!(matches!(err, Error::Selection { .. }));
    }

    #[test]
    fn invalid_pattern_is_a_configuration_error() {
        let err = StackSelector::new(&patterns(&["[broken"]), SelectionStrategy::PatternMatch).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }
}
