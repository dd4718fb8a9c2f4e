//! Structural checks over the node graph formed by `children` and `slots`.

use crate::diagnostic::Issue;
use crate::limits::ValidationLimits;
use dui_parser::Document;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    Unvisited,
    OnPath,
    Done,
}

struct Frame<'a> {
    id: &'a str,
    depth: usize,
    next_child: usize,
}

struct GraphWalk<'a> {
    adjacency: HashMap<&'a str, Vec<&'a str>>,
    state: HashMap<&'a str, Visit>,
    max_depth: usize,
    issues: Vec<Issue>,
}

impl<'a> GraphWalk<'a> {
    fn new(document: &'a Document) -> Self {
        let declared: HashSet<&str> = document.nodes.iter().map(|n| n.id.as_str()).collect();

        // Nodes sharing an id contribute their edges to one vertex.
        let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
        for node in &document.nodes {
            adjacency
                .entry(node.id.as_str())
                .or_default()
                .extend(node.child_refs().filter(|child| declared.contains(child)));
        }

        Self {
            adjacency,
            state: declared.iter().map(|id| (*id, Visit::Unvisited)).collect(),
            max_depth: 0,
            issues: Vec::new(),
        }
    }

    fn state(&self, id: &str) -> Visit {
        self.state.get(id).copied().unwrap_or(Visit::Unvisited)
    }

    /// Enter `id` at `depth`. Returns a frame when the node should be expanded.
    fn enter(&mut self, id: &'a str, depth: usize, track_depth: bool) -> Option<Frame<'a>> {
        if track_depth {
            self.max_depth = self.max_depth.max(depth);
        }
        match self.state(id) {
            Visit::OnPath => {
                self.issues.push(Issue::error(
                    "graph.cycle",
                    format!("Cycle detected at node '{}'", id),
                    format!("nodes[{}]", id),
                ));
                None
            }
            Visit::Done => None,
            Visit::Unvisited => {
                self.state.insert(id, Visit::OnPath);
                Some(Frame {
                    id,
                    depth,
                    next_child: 0,
                })
            }
        }
    }

    /// Depth-first walk from `start` using an explicit stack.
    fn walk(&mut self, start: &'a str, track_depth: bool) {
        let mut stack: Vec<Frame<'a>> = self.enter(start, 1, track_depth).into_iter().collect();

        while let Some(frame) = stack.last_mut() {
            let child = self
                .adjacency
                .get(frame.id)
                .and_then(|children| children.get(frame.next_child))
                .copied();

            match child {
                Some(child) => {
                    frame.next_child += 1;
                    let depth = frame.depth + 1;
                    if let Some(next) = self.enter(child, depth, track_depth) {
                        stack.push(next);
                    }
                }
                None => {
                    let id = frame.id;
                    stack.pop();
                    self.state.insert(id, Visit::Done);
                }
            }
        }
    }
}

/// Validate roots, cycles, depth and reachability of the node graph.
///
/// Edges come from `children` and every slot, restricted to declared targets;
/// dangling references are reported by the schema rules instead.
pub fn validate_graph(document: &Document, limits: &ValidationLimits) -> Vec<Issue> {
    if document.nodes.is_empty() {
        return vec![Issue::error(
            "graph.empty",
            "Document must contain at least one node",
            "nodes",
        )];
    }

    let mut walk = GraphWalk::new(document);

    let mut in_degree: HashMap<&str, usize> =
        document.nodes.iter().map(|n| (n.id.as_str(), 0)).collect();
    for targets in walk.adjacency.values() {
        for target in targets {
            *in_degree.entry(*target).or_insert(0) += 1;
        }
    }

    let mut seen = HashSet::new();
    let roots: Vec<&str> = document
        .nodes
        .iter()
        .map(|n| n.id.as_str())
        .filter(|id| in_degree.get(id).copied().unwrap_or(0) == 0)
        .filter(|id| seen.insert(*id))
        .collect();

    if roots.is_empty() {
        walk.issues.push(Issue::error(
            "graph.no_root",
            "Document graph has no root node",
            "nodes",
        ));
    }

    for root in &roots {
        walk.walk(root, true);
    }

    if walk.max_depth > limits.max_depth {
        walk.issues.push(Issue::error(
            "graph.depth_exceeded",
            format!("Graph depth {} exceeds limit {}", walk.max_depth, limits.max_depth),
            "nodes",
        ));
    }

    // Nodes no root reaches still get scanned so closed cycles are reported.
    let mut seen = HashSet::new();
    let unreachable: Vec<(usize, &str)> = document
        .nodes
        .iter()
        .enumerate()
        .map(|(index, n)| (index, n.id.as_str()))
        .filter(|(_, id)| walk.state(id) == Visit::Unvisited && seen.insert(*id))
        .collect();

    if !roots.is_empty() {
        for (index, id) in &unreachable {
            walk.issues.push(Issue::warning(
                "graph.unreachable",
                format!("Node '{}' is not reachable from any root", id),
                format!("nodes[{}]", index),
            ));
        }
    }

    for (_, id) in unreachable {
        walk.walk(id, false);
    }

    walk.issues
}
