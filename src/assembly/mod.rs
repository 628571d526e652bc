//! Stage/stack hierarchy handling.
//!
//! The assembly source enumerates deployable stacks; this module arranges
//! them into stages (synthesizing a default stage for top-level stacks) and
//! applies the caller's selection patterns.

pub mod selection;

use anyhow::Result;

use crate::core::{StackUnit, StageGroup};

/// Reads the synthesized deployment tree. Concrete manifest parsing is
/// external; `bindings::SnapshotFile` ships as the file-backed default.
pub trait AssemblySource {
    fn load_units(&self) -> Result<Vec<StackUnit>>;
}

/// Group stacks by stage in first-seen order. Stacks with no stage land in a
/// synthetic stage named `default_stage_name`.
pub fn build_stage_tree(units: Vec<StackUnit>, default_stage_name: &str) -> Vec<StageGroup> {
    let mut groups: Vec<StageGroup> = Vec::new();
    for unit in units {
        let stage_id = unit
            .stage_id
            .clone()
            .unwrap_or_else(|| default_stage_name.to_string());
        match groups.iter_mut().find(|group| group.id == stage_id) {
            Some(group) => group.units.push(unit),
            None => groups.push(StageGroup {
                id: stage_id,
                units: vec![unit],
            }),
        }
    }
    groups
}
