//! Graph algorithms over the cell graph.
//!
//! Every traversal here uses an explicit work stack or queue instead of
//! recursion, so workbooks with very long reference chains (tens of thousands
//! of cells) cannot overflow the call stack.
//!
//! Edge direction reminder: `Outgoing` walks dependencies, `Incoming` walks
//! dependents.

use super::CellGraph;
use crate::domain::CellAddress;
use crate::error::{Error, Result};
use petgraph::stable_graph::NodeIndex;
use petgraph::Direction;
use std::collections::{HashMap, HashSet, VecDeque};

/// Neighbors of `node` in edge insertion order.
///
/// petgraph yields the most recently added edge first, so the list is
/// reversed to keep traversal order aligned with the order formulas were read.
pub(super) fn neighbors(graph: &CellGraph, node: NodeIndex, direction: Direction) -> Vec<NodeIndex> {
    let mut out: Vec<NodeIndex> = graph.neighbors_directed(node, direction).collect();
    out.reverse();
    out
}

/// One DFS stack entry: a node, its neighbors and how far we got through them.
struct Frame {
    node: NodeIndex,
    children: Vec<NodeIndex>,
    cursor: usize,
    deepest: Option<usize>,
}

impl Frame {
    fn new(graph: &CellGraph, node: NodeIndex, direction: Direction) -> Self {
        Self {
            node,
            children: neighbors(graph, node, direction),
            cursor: 0,
            deepest: None,
        }
    }

    fn next_child(&mut self) -> Option<NodeIndex> {
        let child = self.children.get(self.cursor).copied();
        if child.is_some() {
            self.cursor += 1;
        }
        child
    }

    fn record_child_depth(&mut self, depth: usize) {
        self.deepest = Some(self.deepest.map_or(depth, |d| d.max(depth)));
    }

    /// 0 for a node without children, otherwise one more than its deepest child.
    fn depth(&self) -> usize {
        if self.children.is_empty() {
            0
        } else {
            self.deepest.unwrap_or(0) + 1
        }
    }
}

/// Breadth-first search from `start`, excluding `start` itself.
pub(super) fn breadth_first(
    graph: &CellGraph,
    start: NodeIndex,
    direction: Direction,
) -> Vec<NodeIndex> {
    let mut result = Vec::new();
    let mut visited = HashSet::from([start]);
    let mut queue = VecDeque::from([start]);

    while let Some(current) = queue.pop_front() {
        for next in neighbors(graph, current, direction) {
            if visited.insert(next) {
                result.push(next);
                queue.push_back(next);
            }
        }
    }

    result
}

/// Find cycles, reporting at most one per DFS root.
///
/// `visited` is shared across roots so each node starts at most one search.
/// The path and recursion stack belong to a single root.
pub(super) fn find_cycles(graph: &CellGraph) -> Vec<Vec<NodeIndex>> {
    let mut visited = HashSet::new();
    let mut cycles = Vec::new();

    for root in graph.node_indices() {
        if visited.contains(&root) {
            continue;
        }
        if let Some(cycle) = first_cycle_from(graph, root, &mut visited) {
            cycles.push(cycle);
        }
    }

    cycles
}

fn first_cycle_from(
    graph: &CellGraph,
    root: NodeIndex,
    visited: &mut HashSet<NodeIndex>,
) -> Option<Vec<NodeIndex>> {
    let mut path = vec![root];
    let mut on_path = HashSet::from([root]);
    let mut stack = vec![Frame::new(graph, root, Direction::Outgoing)];
    visited.insert(root);

    while let Some(frame) = stack.last_mut() {
        let Some(child) = frame.next_child() else {
            let done = frame.node;
            stack.pop();
            path.pop();
            on_path.remove(&done);
            continue;
        };

        if on_path.contains(&child) {
            // Slice from the first occurrence of the repeated node to the current node.
            let start = path.iter().position(|&n| n == child).unwrap_or(0);
            return Some(path[start..].to_vec());
        }

        if visited.insert(child) {
            path.push(child);
            on_path.insert(child);
            stack.push(Frame::new(graph, child, Direction::Outgoing));
        }
    }

    None
}

/// Post-order DFS: each cell lands after everything it depends on.
///
/// Fails on the first node reached while it is still on the DFS stack.
pub(super) fn topological_order(graph: &CellGraph) -> Result<Vec<CellAddress>> {
    let mut done = HashSet::new();
    let mut on_stack = HashSet::new();
    let mut order = Vec::with_capacity(graph.node_count());

    for root in graph.node_indices() {
        if done.contains(&root) {
            continue;
        }

        on_stack.insert(root);
        let mut stack = vec![Frame::new(graph, root, Direction::Outgoing)];

        while let Some(frame) = stack.last_mut() {
            let Some(child) = frame.next_child() else {
                let finished = frame.node;
                stack.pop();
                on_stack.remove(&finished);
                done.insert(finished);
                order.push(graph[finished].cell.clone());
                continue;
            };

            if on_stack.contains(&child) {
                return Err(Error::CircularDependency {
                    cell: graph[child].cell.to_string(),
                });
            }

            if !done.contains(&child) {
                on_stack.insert(child);
                stack.push(Frame::new(graph, child, Direction::Outgoing));
            }
        }
    }

    Ok(order)
}

/// Longest chain from `start` following `direction`.
///
/// A neighbor already on the current branch contributes depth 0 instead of
/// being walked again. When no cycle is reachable this equals the memoized
/// longest path; otherwise an exhaustive branch-by-branch walk is used.
pub(super) fn chain_depth(graph: &CellGraph, start: NodeIndex, direction: Direction) -> usize {
    let mut memo = HashMap::new();
    memoized_depth(graph, start, direction, &mut memo)
        .unwrap_or_else(|| branch_depth(graph, start, direction))
}

/// Maximum [`chain_depth`] over every node, sharing the memo between roots.
pub(super) fn max_chain_depth(graph: &CellGraph, direction: Direction) -> usize {
    let mut memo = HashMap::new();
    graph
        .node_indices()
        .map(|node| {
            memoized_depth(graph, node, direction, &mut memo)
                .unwrap_or_else(|| branch_depth(graph, node, direction))
        })
        .max()
        .unwrap_or(0)
}

/// Longest path below `start`, memoizing finished nodes.
///
/// Returns `None` as soon as a cycle is reachable, because branch-local
/// visited sets make depths depend on the path taken and memoization would
/// be wrong. Memo entries written before that point are still valid: every
/// finished node's reachable subgraph is acyclic.
fn memoized_depth(
    graph: &CellGraph,
    start: NodeIndex,
    direction: Direction,
    memo: &mut HashMap<NodeIndex, usize>,
) -> Option<usize> {
    if let Some(&depth) = memo.get(&start) {
        return Some(depth);
    }

    let mut on_path = HashSet::from([start]);
    let mut stack = vec![Frame::new(graph, start, direction)];

    while let Some(frame) = stack.last_mut() {
        if let Some(child) = frame.next_child() {
            if on_path.contains(&child) {
                return None;
            }
            if let Some(&depth) = memo.get(&child) {
                frame.record_child_depth(depth);
            } else {
                on_path.insert(child);
                stack.push(Frame::new(graph, child, direction));
            }
            continue;
        }

        let depth = frame.depth();
        let finished = frame.node;
        stack.pop();
        on_path.remove(&finished);
        memo.insert(finished, depth);

        if let Some(parent) = stack.last_mut() {
            parent.record_child_depth(depth);
        }
    }

    memo.get(&start).copied()
}

/// Exhaustive longest chain where the visited set is the current branch.
///
/// Exponential on dense cyclic graphs; only used when a cycle is reachable.
fn branch_depth(graph: &CellGraph, start: NodeIndex, direction: Direction) -> usize {
    let mut on_path = HashSet::from([start]);
    let mut stack = vec![Frame::new(graph, start, direction)];
    let mut result = 0;

    while let Some(frame) = stack.last_mut() {
        if let Some(child) = frame.next_child() {
            if on_path.contains(&child) {
                frame.record_child_depth(0);
            } else {
                on_path.insert(child);
                stack.push(Frame::new(graph, child, direction));
            }
            continue;
        }

        let depth = frame.depth();
        let finished = frame.node;
        stack.pop();
        on_path.remove(&finished);

        match stack.last_mut() {
            Some(parent) => parent.record_child_depth(depth),
            None => result = depth,
        }
    }

    result
}
