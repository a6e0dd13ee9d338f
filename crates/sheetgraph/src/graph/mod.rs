//! In-memory formula dependency graph backed by petgraph.
//!
//! # Edge Direction Convention
//!
//! Edges point from **dependent -> dependency**, mirroring the formula:
//! if `Sheet1!A1` contains `=B1*2`, the edge is `Sheet1!A1 -> Sheet1!B1`.
//!
//! - Outgoing edges of a node are its *dependencies* (precedents).
//! - Incoming edges of a node are its *dependents*.
//!
//! petgraph stores each edge once and indexes it from both endpoints, so the
//! dependency and dependent views of a node can never disagree. All edge
//! mutation goes through the private `link`/`unlink` pair, which also
//! invalidates the cached topological order.
//!
//! # Cycles
//!
//! Cycles are allowed. [`DependencyGraph::detect_cycles`] reports them as
//! data, while [`DependencyGraph::topological_sort`] fails on them with
//! [`crate::error::Error::CircularDependency`]. Both behaviors are relied upon by callers.
//!
//! # Ordering
//!
//! Nodes are visited in arena order (insertion order until a removed cell's
//! slot is reused) and neighbors in edge insertion order, so every query
//! result is deterministic for a given sequence of mutations.
//!
//! # Thread Safety
//!
//! The graph has no internal locking. Wrap it (or the analyzer owning it) in
//! a lock before sharing it between tasks; see [`crate::session`].

mod algorithms;
mod dot;

use crate::domain::{CellAddress, CellDegree, CellNode, CircularDependency, GraphStats};
use crate::error::Result;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::Direction;
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::{debug, trace};

/// Default length of the most-complex / most-influential ranking lists.
pub const DEFAULT_TOP_CELLS: usize = 10;

/// Node weight: the cell and its last known formula.
#[derive(Debug, Clone)]
pub(crate) struct CellEntry {
    pub(crate) cell: CellAddress,
    pub(crate) formula: Option<String>,
}

pub(crate) type CellGraph = StableDiGraph<CellEntry, ()>;

/// Directed graph of formula references between cells.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// Stable indices survive node removal, so `node_map` never goes stale.
    graph: CellGraph,

    /// Address to node lookup. Every node in `graph` has exactly one entry.
    node_map: HashMap<CellAddress, NodeIndex>,

    /// Memoized topological order; reset on every mutation.
    topo_cache: OnceLock<Vec<CellAddress>>,
}

impl DependencyGraph {
    /// Create an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ========== Mutation ==========

    /// Record that `from` reads from `to`.
    ///
    /// Creates either node if needed. Adding an existing edge is a no-op
    /// apart from the formula overwrite. Cycles are not rejected.
    pub fn add_dependency(&mut self, from: &CellAddress, to: &CellAddress, formula: Option<&str>) {
        let from_node = self.ensure_node(from);
        let to_node = self.ensure_node(to);

        if let Some(formula) = formula {
            self.graph[from_node].formula = Some(formula.to_string());
        }

        self.link(from_node, to_node);
        trace!(from = %from, to = %to, "Added dependency");
    }

    /// Remove the edge `from -> to` if it exists. Unknown cells are ignored.
    pub fn remove_dependency(&mut self, from: &CellAddress, to: &CellAddress) {
        let (Some(&from_node), Some(&to_node)) = (self.node_map.get(from), self.node_map.get(to))
        else {
            return;
        };

        if self.unlink(from_node, to_node) {
            trace!(from = %from, to = %to, "Removed dependency");
        }
    }

    /// Drop every outgoing edge of `cell` along with its recorded formula.
    ///
    /// Used when a cell's formula is replaced and its references must be
    /// rediscovered. The node survives while other cells still read from it.
    /// Former targets left without edges or formula are removed.
    pub fn clear_dependencies(&mut self, cell: &CellAddress) {
        let Some(&node) = self.node_map.get(cell) else {
            return;
        };

        let targets = algorithms::neighbors(&self.graph, node, Direction::Outgoing);
        for &target in &targets {
            self.unlink(node, target);
        }
        self.graph[node].formula = None;

        for target in targets {
            if target != node {
                self.prune_if_orphaned(target);
            }
        }
        self.prune_if_orphaned(node);
        self.invalidate();
    }

    /// Overwrite the formula of an existing node. Unknown cells are ignored.
    pub fn set_formula(&mut self, cell: &CellAddress, formula: &str) {
        if let Some(&node) = self.node_map.get(cell) {
            self.graph[node].formula = Some(formula.to_string());
        }
    }

    /// Remove `cell` and every edge touching it. Returns whether it existed.
    pub fn remove_cell(&mut self, cell: &CellAddress) -> bool {
        let Some(node) = self.node_map.remove(cell) else {
            return false;
        };

        // StableGraph drops incident edges in both directions with the node.
        self.graph.remove_node(node);
        self.invalidate();
        debug!(cell = %cell, "Removed cell from dependency graph");
        true
    }

    /// Remove every node and edge.
    pub fn clear(&mut self) {
        self.graph.clear();
        self.node_map.clear();
        self.invalidate();
    }

    fn ensure_node(&mut self, cell: &CellAddress) -> NodeIndex {
        if let Some(&node) = self.node_map.get(cell) {
            return node;
        }

        let node = self.graph.add_node(CellEntry {
            cell: cell.clone(),
            formula: None,
        });
        self.node_map.insert(cell.clone(), node);
        self.invalidate();
        node
    }

    /// The single place edges are created.
    fn link(&mut self, from: NodeIndex, to: NodeIndex) {
        if self.graph.find_edge(from, to).is_none() {
            self.graph.add_edge(from, to, ());
        }
        self.invalidate();
    }

    /// The single place edges are removed.
    fn unlink(&mut self, from: NodeIndex, to: NodeIndex) -> bool {
        let removed = match self.graph.find_edge(from, to) {
            Some(edge) => self.graph.remove_edge(edge).is_some(),
            None => false,
        };
        self.invalidate();
        removed
    }

    fn prune_if_orphaned(&mut self, node: NodeIndex) {
        let isolated = self.graph[node].formula.is_none()
            && self.graph.neighbors_undirected(node).next().is_none();
        if isolated && let Some(entry) = self.graph.remove_node(node) {
            self.node_map.remove(&entry.cell);
            trace!(cell = %entry.cell, "Pruned orphaned cell");
        }
    }

    fn invalidate(&mut self) {
        self.topo_cache.take();
    }

    // ========== Node Queries ==========

    /// Whether `cell` is a node of the graph.
    #[must_use]
    pub fn contains(&self, cell: &CellAddress) -> bool {
        self.node_map.contains_key(cell)
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// Whether the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// All node addresses in arena order.
    pub fn cells(&self) -> impl Iterator<Item = &CellAddress> + '_ {
        self.graph
            .node_indices()
            .map(move |node| &self.graph[node].cell)
    }

    /// Last formula recorded for `cell`.
    #[must_use]
    pub fn formula(&self, cell: &CellAddress) -> Option<&str> {
        let node = *self.node_map.get(cell)?;
        self.graph[node].formula.as_deref()
    }

    /// Snapshot of a single node with its direct edges.
    #[must_use]
    pub fn node(&self, cell: &CellAddress) -> Option<CellNode> {
        let node = *self.node_map.get(cell)?;
        let entry = &self.graph[node];

        Some(CellNode {
            cell: entry.cell.clone(),
            dependencies: self.addresses(node, Direction::Outgoing),
            dependents: self.addresses(node, Direction::Incoming),
            formula: entry.formula.clone(),
        })
    }

    /// Cells `cell` reads from directly.
    #[must_use]
    pub fn direct_dependencies(&self, cell: &CellAddress) -> Vec<CellAddress> {
        self.node_map
            .get(cell)
            .map(|&node| self.addresses(node, Direction::Outgoing))
            .unwrap_or_default()
    }

    /// Cells that read from `cell` directly (the exact first impact layer).
    #[must_use]
    pub fn direct_dependents(&self, cell: &CellAddress) -> Vec<CellAddress> {
        self.node_map
            .get(cell)
            .map(|&node| self.addresses(node, Direction::Incoming))
            .unwrap_or_default()
    }

    fn addresses(&self, node: NodeIndex, direction: Direction) -> Vec<CellAddress> {
        algorithms::neighbors(&self.graph, node, direction)
            .into_iter()
            .map(|n| self.graph[n].cell.clone())
            .collect()
    }

    // ========== Traversal ==========

    /// Every cell that transitively depends on `cell`, in BFS discovery order.
    ///
    /// The starting cell is excluded and each cell appears once, even when
    /// the graph has cycles. The order is not a recalculation order; use
    /// [`topological_sort`](Self::topological_sort) for that.
    #[must_use]
    pub fn affected_cells(&self, cell: &CellAddress) -> Vec<CellAddress> {
        self.reachable(cell, Direction::Incoming)
    }

    /// Every cell `cell` transitively depends on, in BFS discovery order.
    #[must_use]
    pub fn dependencies(&self, cell: &CellAddress) -> Vec<CellAddress> {
        self.reachable(cell, Direction::Outgoing)
    }

    fn reachable(&self, cell: &CellAddress, direction: Direction) -> Vec<CellAddress> {
        let Some(&start) = self.node_map.get(cell) else {
            return Vec::new();
        };

        algorithms::breadth_first(&self.graph, start, direction)
            .into_iter()
            .map(|node| self.graph[node].cell.clone())
            .collect()
    }

    /// Longest chain of dependencies below `cell` (0 for leaves and unknown cells).
    #[must_use]
    pub fn dependency_depth(&self, cell: &CellAddress) -> usize {
        self.node_map.get(cell).map_or(0, |&node| {
            algorithms::chain_depth(&self.graph, node, Direction::Outgoing)
        })
    }

    /// Longest chain of dependents above `cell` (0 when nothing reads from it).
    #[must_use]
    pub fn dependent_depth(&self, cell: &CellAddress) -> usize {
        self.node_map.get(cell).map_or(0, |&node| {
            algorithms::chain_depth(&self.graph, node, Direction::Incoming)
        })
    }

    // ========== Whole-Graph Algorithms ==========

    /// Find circular references.
    ///
    /// Every node is tried as a DFS root unless an earlier search already
    /// reached it. Each root reports at most the first cycle it runs into,
    /// so independent cycles elsewhere are found from their own roots.
    #[must_use]
    pub fn detect_cycles(&self) -> Vec<CircularDependency> {
        let cycles: Vec<CircularDependency> = algorithms::find_cycles(&self.graph)
            .into_iter()
            .map(|nodes| {
                CircularDependency::new(
                    nodes
                        .into_iter()
                        .map(|node| self.graph[node].cell.clone())
                        .collect(),
                )
            })
            .collect();

        debug!(cycles = cycles.len(), "Cycle detection complete");
        cycles
    }

    /// Order every cell so that dependencies come before their dependents.
    ///
    /// The result is cached until the next mutation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CircularDependency`](crate::error::Error::CircularDependency)
    /// naming the first cell found on a cycle.
    pub fn topological_sort(&self) -> Result<&[CellAddress]> {
        if let Some(order) = self.topo_cache.get() {
            return Ok(order);
        }

        let order = algorithms::topological_order(&self.graph)?;
        debug!(cells = order.len(), "Computed topological order");
        Ok(self.topo_cache.get_or_init(|| order))
    }

    /// Summary statistics with the default ranking length.
    #[must_use]
    pub fn stats(&self) -> GraphStats {
        self.stats_with_limit(DEFAULT_TOP_CELLS)
    }

    /// Summary statistics, keeping `top` entries in each ranking list.
    #[must_use]
    pub fn stats_with_limit(&self, top: usize) -> GraphStats {
        let mut formula_cells = 0;
        let mut complexity = Vec::with_capacity(self.len());
        let mut influence = Vec::with_capacity(self.len());

        for node in self.graph.node_indices() {
            let entry = &self.graph[node];
            if entry.formula.is_some() {
                formula_cells += 1;
            }
            complexity.push(CellDegree {
                cell: entry.cell.clone(),
                count: self
                    .graph
                    .neighbors_directed(node, Direction::Outgoing)
                    .count(),
            });
            influence.push(CellDegree {
                cell: entry.cell.clone(),
                count: self
                    .graph
                    .neighbors_directed(node, Direction::Incoming)
                    .count(),
            });
        }

        // Stable sorts keep arena order among ties.
        complexity.sort_by(|a, b| b.count.cmp(&a.count));
        influence.sort_by(|a, b| b.count.cmp(&a.count));
        complexity.truncate(top);
        influence.truncate(top);

        GraphStats {
            total_cells: self.len(),
            formula_cells,
            total_dependencies: self.edge_count(),
            max_depth: algorithms::max_chain_depth(&self.graph, Direction::Outgoing),
            most_complex_cells: complexity,
            most_influential_cells: influence,
        }
    }

    /// Render the graph in Graphviz DOT format.
    ///
    /// Formula cells are filled; value-only cells use the default style. The
    /// output depends only on the current graph state.
    #[must_use]
    pub fn to_dot(&self) -> String {
        dot::DotGraph::new(&self.graph).to_string()
    }
}
