//! Dependency DAG
//!
//! A directed acyclic graph over step indices with an edge `i -> j`
//! whenever step `j` consumes an output of step `i`. Built from the
//! parent/child annotations of an indexed parse tree and cached there;
//! construction rejects cyclic workflows.
//!
//! Uses petgraph for graph storage and traversal.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Dfs, Reversed};

use crate::error::Error;
use crate::select::expand;
use crate::workflow::model::Step;

/// Dependency graph over step indices.
#[derive(Debug)]
pub struct Dag {
    graph: DiGraph<usize, ()>,
    down_sets: RefCell<HashMap<usize, Rc<Vec<usize>>>>,
}

impl Dag {
    /// Builds the graph from indexed steps, one vertex per step.
    ///
    /// Fails with the rendered dependency chain if the child relation
    /// loops.
    pub fn build(steps: &[Step]) -> Result<Self, Error> {
        let mut graph = DiGraph::new();
        for index in 0..steps.len() {
            graph.add_node(index);
        }
        for (index, step) in steps.iter().enumerate() {
            for &child in &step.children {
                graph.add_edge(NodeIndex::new(index), NodeIndex::new(child), ());
            }
        }

        if let Err(cycle) = toposort(&graph, None) {
            return Err(expand::cycle_error(steps, cycle.node_id().index()));
        }

        Ok(Self {
            graph,
            down_sets: RefCell::new(HashMap::new()),
        })
    }

    /// All strict ancestors of `index`, ascending.
    pub fn ancestors(&self, index: usize) -> Vec<usize> {
        let reversed = Reversed(&self.graph);
        let start = NodeIndex::new(index);
        let mut found = Vec::new();
        let mut dfs = Dfs::new(reversed, start);
        while let Some(node) = dfs.next(reversed) {
            if node != start {
                found.push(node.index());
            }
        }
        found.sort_unstable();
        found
    }

    /// All strict descendants of `index`, ascending.
    pub fn descendants(&self, index: usize) -> Vec<usize> {
        let start = NodeIndex::new(index);
        let mut found = Vec::new();
        let mut dfs = Dfs::new(&self.graph, start);
        while let Some(node) = dfs.next(&self.graph) {
            if node != start {
                found.push(node.index());
            }
        }
        found.sort_unstable();
        found
    }

    /// Descendants of `index` including `index` itself, memoized per
    /// index so repeated merge queries cost one traversal each.
    pub fn down_set(&self, index: usize) -> Rc<Vec<usize>> {
        if let Some(set) = self.down_sets.borrow().get(&index) {
            return Rc::clone(set);
        }
        let mut set = self.descendants(index);
        set.push(index);
        set.sort_unstable();
        let set = Rc::new(set);
        self.down_sets.borrow_mut().insert(index, Rc::clone(&set));
        set
    }
}
