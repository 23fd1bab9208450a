//! Parse Tree Indexing
//!
//! Turns an ordered step sequence into a [`ParseTree`]: the steps plus
//! the reverse-lookup maps target matching runs against, with every step
//! annotated with its parent and child indices.
//!
//! All maps preserve insertion order so regex matching and merge
//! tie-breaking stay deterministic across runs.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;
use log::{debug, info};

use crate::config::Config;
use crate::error::Error;
use crate::fs::{slash_clean, FileSystem};
use crate::select::dag::Dag;
use crate::workflow::dirs;
use crate::workflow::model::{Step, Workflow};

/// Reverse-lookup map: key to step indices, values deduplicated
/// preserving first appearance.
pub type StepLookup = IndexMap<String, Vec<usize>>;

/// An indexed workflow ready for step selection.
///
/// Built once from a [`Workflow`]; the auxiliary maps are immutable
/// thereafter. The dependency DAG is constructed lazily on first
/// expansion and cached for the lifetime of the tree.
///
/// Selection is single-threaded: a tree is not shareable across
/// threads, so concurrent hosts should build one tree per thread.
#[derive(Debug)]
pub struct ParseTree {
    /// Steps in declaration order, annotated with derived fields.
    pub steps: Vec<Step>,

    /// Output path to producing steps, under the union of raw,
    /// slash-cleaned, and normalized forms. Used for literal matching.
    pub output_lookup: StepLookup,

    /// Output path to producing steps, under raw and slash-cleaned forms
    /// only, so regex targets match paths as the user declared them.
    pub output_regex_lookup: StepLookup,

    /// Output tag to steps carrying it.
    pub by_output_tag: StepLookup,

    /// Input tag to steps consuming it.
    pub by_input_tag: StepLookup,

    /// Method name to steps using it.
    pub by_method: StepLookup,

    /// Canonical output path to producing steps.
    pub by_norm_output: StepLookup,

    /// Canonical input path to consuming steps.
    pub by_norm_input: StepLookup,

    fs: Box<dyn FileSystem>,
    dag: RefCell<Option<Rc<Dag>>>,
}

/// Builds one reverse multimap over the steps.
fn reverse_multimap<F>(steps: &[Step], keys: F) -> StepLookup
where
    F: Fn(&Step) -> Vec<String>,
{
    let mut map = StepLookup::new();
    for (index, step) in steps.iter().enumerate() {
        for key in keys(step) {
            let entry = map.entry(key).or_default();
            if !entry.contains(&index) {
                entry.push(index);
            }
        }
    }
    map
}

/// Unions per-key index lists left-to-right, preserving first appearance.
fn merge_distinct<I>(maps: I) -> StepLookup
where
    I: IntoIterator<Item = StepLookup>,
{
    let mut merged = StepLookup::new();
    for map in maps {
        for (key, indices) in map {
            let entry = merged.entry(key).or_default();
            for index in indices {
                if !entry.contains(&index) {
                    entry.push(index);
                }
            }
        }
    }
    merged
}

/// Appends indices not yet present, preserving order.
fn push_distinct(into: &mut Vec<usize>, from: &[usize]) {
    for &index in from {
        if !into.contains(&index) {
            into.push(index);
        }
    }
}

impl ParseTree {
    /// Indexes a workflow into a parse tree.
    ///
    /// Fills each step's expanded and normalized path forms, builds the
    /// reverse-lookup maps, derives parent/child edges from normalized
    /// path equality and tag wiring, and assigns per-step working
    /// directories under `config.tmpdir`.
    pub fn build(
        workflow: Workflow,
        fs: Box<dyn FileSystem>,
        config: &Config,
    ) -> Result<Self, Error> {
        let mut steps = workflow.steps;

        for step in &mut steps {
            if step.outputs.is_empty() {
                step.outputs = step.raw_outputs.clone();
            }
            if step.inputs.is_empty() {
                step.inputs = step.raw_inputs.clone();
            }
            step.norm_outputs = step.outputs.iter().map(|o| fs.normalize(o)).collect();
            step.norm_inputs = step.inputs.iter().map(|i| fs.normalize(i)).collect();
        }

        let by_output_tag = reverse_multimap(&steps, |s| s.output_tags.clone());
        let by_input_tag = reverse_multimap(&steps, |s| s.input_tags.clone());
        let by_method = reverse_multimap(&steps, |s| s.method.iter().cloned().collect());
        let by_norm_output = reverse_multimap(&steps, |s| s.norm_outputs.clone());
        let by_norm_input = reverse_multimap(&steps, |s| s.norm_inputs.clone());

        let output_regex_lookup = merge_distinct([
            reverse_multimap(&steps, |s| s.raw_outputs.clone()),
            reverse_multimap(&steps, |s| {
                s.raw_outputs.iter().map(|o| slash_clean(o)).collect()
            }),
            reverse_multimap(&steps, |s| s.outputs.clone()),
            reverse_multimap(&steps, |s| {
                s.outputs.iter().map(|o| slash_clean(o)).collect()
            }),
        ]);
        let output_lookup =
            merge_distinct([output_regex_lookup.clone(), by_norm_output.clone()]);

        for index in 0..steps.len() {
            let mut parents = Vec::new();
            for norm_input in &steps[index].norm_inputs {
                if let Some(producers) = by_norm_output.get(norm_input) {
                    push_distinct(&mut parents, producers);
                }
            }
            for tag in &steps[index].input_tags {
                if let Some(producers) = by_output_tag.get(tag) {
                    push_distinct(&mut parents, producers);
                }
            }

            let mut children = Vec::new();
            for norm_output in &steps[index].norm_outputs {
                if let Some(consumers) = by_norm_input.get(norm_output) {
                    push_distinct(&mut children, consumers);
                }
            }
            for tag in &steps[index].output_tags {
                if let Some(consumers) = by_input_tag.get(tag) {
                    push_distinct(&mut children, consumers);
                }
            }

            debug!(
                "step {} has {} parents, {} children",
                index,
                parents.len(),
                children.len()
            );
            steps[index].parents = parents;
            steps[index].children = children;
        }

        dirs::assign_dirs(&mut steps, fs.as_ref(), config)?;

        info!(
            "indexed {} steps ({} distinct outputs, {} tags, {} methods)",
            steps.len(),
            by_norm_output.len(),
            by_output_tag.len(),
            by_method.len()
        );

        Ok(Self {
            steps,
            output_lookup,
            output_regex_lookup,
            by_output_tag,
            by_input_tag,
            by_method,
            by_norm_output,
            by_norm_input,
            fs,
            dag: RefCell::new(None),
        })
    }

    /// Returns the number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns true if the tree has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The filesystem adapter the tree was built with. Target matching
    /// must normalize through the same adapter.
    pub fn fs(&self) -> &dyn FileSystem {
        self.fs.as_ref()
    }

    /// Returns the dependency DAG, building it on first use.
    pub fn dag(&self) -> Result<Rc<Dag>, Error> {
        if let Some(dag) = self.dag.borrow().as_ref() {
            return Ok(Rc::clone(dag));
        }
        let dag = Rc::new(Dag::build(&self.steps)?);
        *self.dag.borrow_mut() = Some(Rc::clone(&dag));
        Ok(dag)
    }
}
