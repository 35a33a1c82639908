//! Inclusion graph of manifests.
//!
//! Nodes are manifest paths (canonical where the file exists), edges point
//! from a manifest to each manifest it lists in `included_manifests`. The graph
//! records references, so a node exists for a missing manifest too.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use petgraph::Direction;
use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, NodeIndex};

#[derive(Debug, Default, Clone)]
pub struct ManifestGraph {
  graph: DiGraph<PathBuf, ()>,
  nodes: HashMap<PathBuf, NodeIndex>,
}

impl ManifestGraph {
  pub fn new() -> Self {
    Self::default()
  }

  fn node(&mut self, path: &Path) -> NodeIndex {
    if let Some(&idx) = self.nodes.get(path) {
      return idx;
    }
    let idx = self.graph.add_node(path.to_path_buf());
    self.nodes.insert(path.to_path_buf(), idx);
    idx
  }

  /// Register a manifest that was read.
  pub fn add_manifest(&mut self, path: &Path) {
    self.node(path);
  }

  /// Record that `from` includes `to`. Repeated references collapse into one edge.
  pub fn add_include(&mut self, from: &Path, to: &Path) {
    let from = self.node(from);
    let to = self.node(to);
    self.graph.update_edge(from, to, ());
  }

  /// Manifests read or referenced so far.
  pub fn manifest_count(&self) -> usize {
    self.graph.node_count()
  }

  /// Manifests included by `path`, in the order they were first listed.
  pub fn includes(&self, path: &Path) -> Vec<&Path> {
    let Some(&idx) = self.nodes.get(path) else {
      return Vec::new();
    };
    // petgraph yields the most recently added edge first
    let mut children: Vec<&Path> = self
      .graph
      .neighbors_directed(idx, Direction::Outgoing)
      .map(|child| self.graph[child].as_path())
      .collect();
    children.reverse();
    children
  }

  /// All manifests in the order they were first seen.
  pub fn manifests(&self) -> impl Iterator<Item = &Path> {
    self.graph.node_indices().map(|idx| self.graph[idx].as_path())
  }

  pub fn has_cycle(&self) -> bool {
    is_cyclic_directed(&self.graph)
  }
}
