//! Tree Expansion
//!
//! Spreads a matched step across its dependency tree: up to ancestors,
//! down to descendants, or not at all. Two variants exist: a set-based
//! one over the DAG (optionally intersected with a restriction set) and
//! an order-preserving recursive walk used when the caller needs a
//! sequence. The walk carries the active chain so a cyclic workflow
//! fails with a readable trace.

use std::collections::HashSet;

use crate::error::Error;
use crate::select::target::TreeMode;
use crate::workflow::model::Step;
use crate::workflow::tree::ParseTree;

/// Expands `index` into the set of selected indices, ascending.
///
/// With a restriction set, the expansion is intersected with it; a
/// restricted expansion of a step outside the set is empty.
pub fn expand_step(
    tree: &ParseTree,
    index: usize,
    mode: TreeMode,
    valid: Option<&HashSet<usize>>,
) -> Result<Vec<usize>, Error> {
    if let Some(valid) = valid {
        if !valid.contains(&index) {
            return Ok(Vec::new());
        }
    }

    if mode == TreeMode::Only {
        return Ok(vec![index]);
    }

    let dag = tree.dag()?;
    let mut set = match mode {
        TreeMode::Up => dag.ancestors(index),
        TreeMode::Down => dag.descendants(index),
        TreeMode::Only => unreachable!(),
    };
    set.push(index);
    set.sort_unstable();
    if let Some(valid) = valid {
        set.retain(|candidate| valid.contains(candidate));
    }
    Ok(set)
}

/// Expands `index` into an ordered sequence.
///
/// Down-tree yields descendants first (depth-first through children)
/// and the step itself last; up-tree yields roots first and the step
/// itself last. The merger's insert-before-dependent rule relies on
/// this ordering.
pub fn expand_step_ordered(
    tree: &ParseTree,
    index: usize,
    mode: TreeMode,
) -> Result<Vec<usize>, Error> {
    if mode == TreeMode::Only {
        return Ok(vec![index]);
    }
    let mut expanded = Vec::new();
    let mut chain = Vec::new();
    walk(&tree.steps, index, mode, &mut chain, &mut expanded)?;
    Ok(expanded)
}

/// Depth-first walk over the parent or child adjacency lists, yielding
/// each visited step after its relatives.
fn walk(
    steps: &[Step],
    index: usize,
    mode: TreeMode,
    chain: &mut Vec<usize>,
    out: &mut Vec<usize>,
) -> Result<(), Error> {
    if chain.contains(&index) {
        chain.push(index);
        return Err(Error::CycleDetected(render_chain(steps, chain)));
    }
    chain.push(index);

    let relatives = match mode {
        TreeMode::Down => &steps[index].children,
        _ => &steps[index].parents,
    };
    for &relative in relatives {
        walk(steps, relative, mode, chain, out)?;
    }

    chain.pop();
    out.push(index);
    Ok(())
}

/// Builds the cycle error for a step known to sit on a cycle.
///
/// DAG construction delegates here so both failure paths render the
/// same chain format.
pub(crate) fn cycle_error(steps: &[Step], start: usize) -> Error {
    let mut chain = Vec::new();
    let mut out = Vec::new();
    match walk(steps, start, TreeMode::Down, &mut chain, &mut out) {
        Err(err) => err,
        Ok(()) => Error::CycleDetected(step_label(steps, start)),
    }
}

fn render_chain(steps: &[Step], chain: &[usize]) -> String {
    chain
        .iter()
        .map(|&index| step_label(steps, index))
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Human-readable step name: its outputs, falling back to tags, then to
/// the step position for steps declaring neither.
fn step_label(steps: &[Step], index: usize) -> String {
    let step = &steps[index];
    if !step.outputs.is_empty() {
        return step.outputs.join(", ");
    }
    if !step.output_tags.is_empty() {
        return step
            .output_tags
            .iter()
            .map(|tag| format!("%{}", tag))
            .collect::<Vec<_>>()
            .join(", ");
    }
    format!("step {}", index)
}
