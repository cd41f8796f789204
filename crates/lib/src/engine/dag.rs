//! Dependency ordering for planned steps.
//!
//! Edges run from a prerequisite to the node that needs it, so a topological
//! order lists everything a node depends on before the node itself.

use std::collections::{BTreeMap, HashMap, HashSet};

use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};

use super::GraphError;

/// A directed graph over artifact and task names.
#[derive(Debug, Default)]
pub struct StepDag {
  graph: DiGraph<String, ()>,
  nodes: HashMap<String, NodeIndex>,
}

impl StepDag {
  pub fn new() -> Self {
    Self::default()
  }

  /// Add a node, returning the existing index if the name is already present.
  pub fn add_node(&mut self, name: &str) -> NodeIndex {
    if let Some(&idx) = self.nodes.get(name) {
      return idx;
    }
    let idx = self.graph.add_node(name.to_string());
    self.nodes.insert(name.to_string(), idx);
    idx
  }

  /// Record that `dependent` needs `prerequisite`.
  pub fn add_dependency(&mut self, prerequisite: &str, dependent: &str) {
    let from = self.add_node(prerequisite);
    let to = self.add_node(dependent);
    if !self.graph.contains_edge(from, to) {
      self.graph.add_edge(from, to, ());
    }
  }

  /// Names in an order where prerequisites come first.
  pub fn topological_order(&self) -> Result<Vec<String>, GraphError> {
    let sorted = toposort(&self.graph, None)
      .map_err(|cycle| GraphError::CycleDetected(self.graph[cycle.node_id()].clone()))?;

    Ok(sorted.into_iter().map(|idx| self.graph[idx].clone()).collect())
  }

  /// Level of every node: 0 for nodes without prerequisites, otherwise one
  /// more than the deepest prerequisite. Nodes on the same level do not
  /// depend on each other.
  pub fn levels(&self) -> Result<BTreeMap<String, usize>, GraphError> {
    let mut in_degree: HashMap<NodeIndex, usize> = self
      .graph
      .node_indices()
      .map(|idx| (idx, self.graph.neighbors_directed(idx, Direction::Incoming).count()))
      .collect();
    let mut remaining: HashSet<NodeIndex> = self.graph.node_indices().collect();
    let mut levels = BTreeMap::new();
    let mut level = 0;

    while !remaining.is_empty() {
      let ready: Vec<NodeIndex> = remaining.iter().filter(|&&idx| in_degree[&idx] == 0).copied().collect();

      if ready.is_empty() {
        let stuck = remaining.iter().map(|&idx| self.graph[idx].clone()).min().unwrap_or_default();
        return Err(GraphError::CycleDetected(stuck));
      }

      for idx in ready {
        remaining.remove(&idx);
        levels.insert(self.graph[idx].clone(), level);
        for next in self.graph.neighbors_directed(idx, Direction::Outgoing) {
          if let Some(deg) = in_degree.get_mut(&next) {
            *deg = deg.saturating_sub(1);
          }
        }
      }

      level += 1;
    }

    Ok(levels)
  }
}
