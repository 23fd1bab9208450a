//! Step Selection Module
//!
//! Resolves user target expressions against an indexed parse tree and
//! produces the ordered list of steps to run.
//!
//! # Structure
//!
//! - [`target`]: target expression parsing (build/tree qualifiers, match kinds)
//! - [`matcher`]: resolving a target to step indices
//! - [`expand`]: up-tree/down-tree expansion with cycle detection
//! - [`dag`]: the dependency DAG backing expansion queries
//! - `merge`: folding expansions into one ordered, conflict-checked plan

pub mod dag;
pub mod expand;
pub mod matcher;
mod merge;
pub mod target;

use log::{debug, info};

use crate::error::Error;
use crate::workflow::tree::ParseTree;

pub use target::{BuildMode, MatchKind, Target, TreeMode};

use merge::TargetedStep;

/// One entry of a selection plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedStep {
    /// Index into the parse tree's step sequence.
    pub index: usize,

    /// How the executor should treat the step; never
    /// [`BuildMode::Exclude`] in a returned plan.
    pub build: BuildMode,

    /// How the step entered the selection. Steps pulled in purely by
    /// expansion carry [`MatchKind::Output`].
    pub kind: MatchKind,
}

/// Computes the ordered list of steps to run for the given targets.
///
/// Each target is parsed, matched against the tree's lookup maps, and
/// expanded across the dependency tree; the expansions are folded in
/// user order with exclusion and forced-build precedence. The returned
/// plan is topologically valid: a step always precedes the steps that
/// consume its outputs.
///
/// Unqualified targets select the matched step and everything it
/// depends on; `^` selects the step and its dependents, `=` the step
/// alone. Unqualified exclusions remove exactly the matched steps.
///
/// # Example
///
/// ```
/// use datamake::{select_steps, Config, LocalFileSystem, ParseTree, Step, Workflow};
///
/// let workflow = Workflow::from_steps(vec![
///     Step::new().with_output("raw.csv"),
///     Step::new().with_input("raw.csv").with_output("clean.csv"),
/// ]);
/// let tree = ParseTree::build(
///     workflow,
///     Box::new(LocalFileSystem::new("/data")),
///     &Config::default(),
/// )?;
///
/// let plan = select_steps(&tree, &["clean.csv"])?;
/// let indices: Vec<usize> = plan.iter().map(|s| s.index).collect();
/// assert_eq!(indices, vec![0, 1]);
/// # Ok::<(), datamake::Error>(())
/// ```
pub fn select_steps<S: AsRef<str>>(
    tree: &ParseTree,
    targets: &[S],
) -> Result<Vec<SelectedStep>, Error> {
    let mut expanded = Vec::new();

    for raw in targets {
        let target = Target::parse(raw.as_ref());
        let matched = matcher::match_target(tree, &target)?;

        let mode = match (target.build, target.tree) {
            (BuildMode::Exclude, None) => TreeMode::Only,
            (_, None) => TreeMode::Up,
            (_, Some(mode)) => mode,
        };
        debug!(
            "target {} matched {} steps, expanding {:?}",
            target.name,
            matched.len(),
            mode
        );

        for origin in matched {
            for index in expand::expand_step_ordered(tree, origin, mode)? {
                let kind = if index == origin {
                    target.kind
                } else {
                    MatchKind::Output
                };
                expanded.push(TargetedStep {
                    index,
                    build: target.build,
                    kind,
                });
            }
        }
    }

    let plan = merge::merge_steps(tree, expanded)?;
    info!("selected {} of {} steps", plan.len(), tree.len());
    Ok(plan)
}
