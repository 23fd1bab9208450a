//! Selection Merging
//!
//! Folds the expanded target records into a single ordered plan.
//! Exclusions remove earlier selections, duplicate selections merge in
//! place (forced wins over timestamped, method over tag over output),
//! and a step selected after its dependents is slotted in just before
//! the earliest of them via a real-valued position key. The final plan
//! is checked for steps producing the same normalized output.

use indexmap::IndexMap;
use log::debug;

use crate::error::Error;
use crate::select::target::{BuildMode, MatchKind};
use crate::select::SelectedStep;
use crate::workflow::tree::ParseTree;

/// Gap left before an earliest dependent when slotting a step in.
/// A monotonic tiebreaker, sufficient for realistic workflow sizes.
const POS_EPSILON: f64 = 1e-7;

/// One expanded target occurrence, in user order.
#[derive(Debug, Clone)]
pub(crate) struct TargetedStep {
    pub index: usize,
    pub build: BuildMode,
    pub kind: MatchKind,
}

#[derive(Debug, Clone)]
struct Selected {
    index: usize,
    build: BuildMode,
    kind: MatchKind,
    pos: f64,
}

/// Match kinds merge by specificity: method beats tag beats output.
fn merge_kind(a: MatchKind, b: MatchKind) -> MatchKind {
    if a == MatchKind::Method || b == MatchKind::Method {
        MatchKind::Method
    } else if a == MatchKind::Tag || b == MatchKind::Tag {
        MatchKind::Tag
    } else {
        MatchKind::Output
    }
}

/// Folds expanded records into the final ordered selection.
pub(crate) fn merge_steps(
    tree: &ParseTree,
    expanded: Vec<TargetedStep>,
) -> Result<Vec<SelectedStep>, Error> {
    let mut selected: IndexMap<usize, Selected> = IndexMap::new();
    let mut pos = 0.0_f64;

    for record in expanded {
        if record.build == BuildMode::Exclude {
            if selected.shift_remove(&record.index).is_some() {
                debug!("excluded step {}", record.index);
            }
            pos += 1.0;
            continue;
        }

        if let Some(existing) = selected.get_mut(&record.index) {
            if record.build == BuildMode::Forced {
                existing.build = BuildMode::Forced;
            }
            existing.kind = merge_kind(existing.kind, record.kind);
            continue;
        }

        // Already-selected dependents force this step in front of the
        // earliest of them.
        let dag = tree.dag()?;
        let dependents = dag.down_set(record.index);
        let earliest = dependents
            .iter()
            .filter_map(|dependent| selected.get(dependent))
            .map(|dependent| dependent.pos)
            .reduce(f64::min);
        let new_pos = match earliest {
            Some(earliest) => earliest - POS_EPSILON,
            None => pos,
        };

        selected.insert(
            record.index,
            Selected {
                index: record.index,
                build: record.build,
                kind: record.kind,
                pos: new_pos,
            },
        );
        pos += 1.0;
    }

    let mut plan: Vec<Selected> = selected.into_values().collect();
    plan.sort_by(|a, b| a.pos.total_cmp(&b.pos));

    verify_unique_outputs(tree, &plan)?;

    Ok(plan
        .into_iter()
        .map(|step| SelectedStep {
            index: step.index,
            build: step.build,
            kind: step.kind,
        })
        .collect())
}

/// No two selected steps may produce the same normalized output.
fn verify_unique_outputs(tree: &ParseTree, plan: &[Selected]) -> Result<(), Error> {
    let mut frequencies: IndexMap<&str, usize> = IndexMap::new();
    for step in plan {
        for output in &tree.steps[step.index].norm_outputs {
            *frequencies.entry(output.as_str()).or_insert(0) += 1;
        }
    }

    let duplicated: Vec<String> = frequencies
        .iter()
        .filter(|(_, &count)| count > 1)
        .map(|(output, _)| output.to_string())
        .collect();

    if duplicated.is_empty() {
        Ok(())
    } else {
        Err(Error::DuplicatedOutputs(duplicated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::fs::LocalFileSystem;
    use crate::workflow::model::{Step, Workflow};

    fn build_tree(steps: Vec<Step>) -> ParseTree {
        ParseTree::build(
            Workflow::from_steps(steps),
            Box::new(LocalFileSystem::new("/work")),
            &Config::default(),
        )
        .unwrap()
    }

    /// a -> b -> c
    fn chain() -> ParseTree {
        build_tree(vec![
            Step::new().with_output("a"),
            Step::new().with_input("a").with_output("b"),
            Step::new().with_input("b").with_output("c"),
        ])
    }

    fn record(index: usize, build: BuildMode, kind: MatchKind) -> TargetedStep {
        TargetedStep { index, build, kind }
    }

    fn timestamped(index: usize) -> TargetedStep {
        record(index, BuildMode::Timestamped, MatchKind::Output)
    }

    fn indices(plan: &[SelectedStep]) -> Vec<usize> {
        plan.iter().map(|step| step.index).collect()
    }

    #[test]
    fn test_records_keep_user_order() {
        let tree = chain();
        let plan =
            merge_steps(&tree, vec![timestamped(0), timestamped(1), timestamped(2)]).unwrap();
        assert_eq!(indices(&plan), vec![0, 1, 2]);
    }

    #[test]
    fn test_dependency_inserted_before_dependent() {
        let tree = chain();
        // Descendants-first arrival, as ordered down-expansion produces.
        let plan =
            merge_steps(&tree, vec![timestamped(2), timestamped(1), timestamped(0)]).unwrap();
        assert_eq!(indices(&plan), vec![0, 1, 2]);
    }

    #[test]
    fn test_exclusion_removes_earlier_selection() {
        let tree = chain();
        let plan = merge_steps(
            &tree,
            vec![
                timestamped(0),
                timestamped(1),
                timestamped(2),
                record(1, BuildMode::Exclude, MatchKind::Output),
            ],
        )
        .unwrap();
        assert_eq!(indices(&plan), vec![0, 2]);
    }

    #[test]
    fn test_exclusion_of_unselected_is_noop() {
        let tree = chain();
        let plan = merge_steps(
            &tree,
            vec![
                timestamped(0),
                record(2, BuildMode::Exclude, MatchKind::Output),
            ],
        )
        .unwrap();
        assert_eq!(indices(&plan), vec![0]);
    }

    #[test]
    fn test_reselection_after_exclusion() {
        let tree = chain();
        let plan = merge_steps(
            &tree,
            vec![
                timestamped(1),
                record(1, BuildMode::Exclude, MatchKind::Output),
                timestamped(1),
            ],
        )
        .unwrap();
        assert_eq!(indices(&plan), vec![1]);
    }

    #[test]
    fn test_duplicate_upgrades_to_forced() {
        let tree = chain();
        let plan = merge_steps(
            &tree,
            vec![
                timestamped(1),
                record(1, BuildMode::Forced, MatchKind::Output),
            ],
        )
        .unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].build, BuildMode::Forced);
    }

    #[test]
    fn test_forced_not_downgraded() {
        let tree = chain();
        let plan = merge_steps(
            &tree,
            vec![
                record(1, BuildMode::Forced, MatchKind::Output),
                timestamped(1),
            ],
        )
        .unwrap();
        assert_eq!(plan[0].build, BuildMode::Forced);
    }

    #[test]
    fn test_kind_specificity_order() {
        let tree = chain();
        let plan = merge_steps(
            &tree,
            vec![
                record(1, BuildMode::Timestamped, MatchKind::Output),
                record(1, BuildMode::Timestamped, MatchKind::Tag),
            ],
        )
        .unwrap();
        assert_eq!(plan[0].kind, MatchKind::Tag);

        let plan = merge_steps(
            &tree,
            vec![
                record(1, BuildMode::Timestamped, MatchKind::Method),
                record(1, BuildMode::Timestamped, MatchKind::Tag),
            ],
        )
        .unwrap();
        assert_eq!(plan[0].kind, MatchKind::Method);
    }

    #[test]
    fn test_duplicate_keeps_position() {
        let tree = chain();
        let plan = merge_steps(
            &tree,
            vec![
                timestamped(0),
                timestamped(2),
                record(0, BuildMode::Forced, MatchKind::Output),
            ],
        )
        .unwrap();
        assert_eq!(indices(&plan), vec![0, 2]);
        assert_eq!(plan[0].build, BuildMode::Forced);
    }

    #[test]
    fn test_independent_steps_keep_arrival_order() {
        let tree = build_tree(vec![
            Step::new().with_output("x"),
            Step::new().with_output("y"),
        ]);
        let plan = merge_steps(&tree, vec![timestamped(1), timestamped(0)]).unwrap();
        assert_eq!(indices(&plan), vec![1, 0]);
    }

    #[test]
    fn test_duplicated_outputs_rejected() {
        let tree = build_tree(vec![
            Step::new().with_output("x"),
            Step::new().with_output("x"),
        ]);
        let err = merge_steps(&tree, vec![timestamped(0), timestamped(1)]).unwrap_err();
        assert_eq!(err.to_string(), "duplicated outputs: /work/x");
    }

    #[test]
    fn test_duplicated_outputs_across_path_forms() {
        let tree = build_tree(vec![
            Step::new().with_output("data//x"),
            Step::new().with_output("data/x"),
        ]);
        let err = merge_steps(&tree, vec![timestamped(0), timestamped(1)]).unwrap_err();
        assert_eq!(err.to_string(), "duplicated outputs: /work/data/x");
    }

    #[test]
    fn test_excluded_duplicate_does_not_conflict() {
        let tree = build_tree(vec![
            Step::new().with_output("x"),
            Step::new().with_output("x"),
        ]);
        let plan = merge_steps(
            &tree,
            vec![
                timestamped(0),
                timestamped(1),
                record(0, BuildMode::Exclude, MatchKind::Output),
            ],
        )
        .unwrap();
        assert_eq!(indices(&plan), vec![1]);
    }

    #[test]
    fn test_empty_selection() {
        let tree = chain();
        let plan = merge_steps(&tree, vec![]).unwrap();
        assert!(plan.is_empty());
    }
}
