//! Spanning-tree decomposition and fundamental loops.
//!
//! Components are split into tree branches and chords (links) with a
//! union-find pass in priority order, then every chord gets a row of the loop
//! matrix describing the signed tree path that closes its fundamental loop.
//!
//! This is a diagnostic layer: the equation builder does not consume it.

use std::collections::BTreeSet;
use std::fmt::Write as _;

use nalgebra::DMatrix;
use serde::Serialize;

use crate::circuit::Circuit;
use crate::component::Component;
use crate::diagnostic::Diagnostic;
use crate::node::NodeId;

/// Parent-pointer union-find over node indices.
#[derive(Debug, Clone)]
pub struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    /// `n` singleton sets `0..n`.
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    /// Representative of the set containing `i`.
    pub fn find(&self, mut i: usize) -> usize {
        while self.parent[i] != i {
            i = self.parent[i];
        }
        i
    }

    /// Merge the sets of `a` and `b`. Returns false if they were already joined.
    pub fn union(&mut self, a: usize, b: usize) -> bool {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return false;
        }
        self.parent[ra] = rb;
        true
    }

    pub fn connected(&self, a: usize, b: usize) -> bool {
        self.find(a) == self.find(b)
    }
}

/// Result of the tree/chord partition.
#[derive(Debug, Clone)]
pub struct Topology {
    /// Component indices of tree branches, in the order they were accepted.
    pub tree: Vec<usize>,
    /// Component indices of chords, in the order they were rejected.
    pub links: Vec<usize>,
    /// `links.len() x tree.len()`, entries in {-1, 0, 1}.
    pub loop_matrix: DMatrix<i8>,
    /// Nodes with no branch path to ground, ascending.
    pub floating: Vec<NodeId>,
    /// Chords whose endpoints have no connecting tree path.
    pub diagnostics: Vec<Diagnostic>,
}

/// One step of a tree path: which branch, and in which direction.
#[derive(Debug, Clone, Copy)]
struct PathStep {
    tree_pos: usize,
    sign: i8,
}

/// Partition the circuit's components into tree and chords.
///
/// Marks every component's tree flag and returns the partition together with
/// the fundamental loop matrix. Never fails; a chord without a tree path gets
/// an all-zero row and a [`Diagnostic::DisconnectedChord`].
pub fn analyze(circuit: &mut Circuit) -> Topology {
    let slots = circuit
        .max_node()
        .map_or(1, |n| n.index() + 1)
        .max(circuit.node_count());

    let mut order: Vec<usize> = (0..circuit.len()).collect();
    // Stable: components of equal kind keep list order.
    order.sort_by_key(|&i| circuit.components()[i].kind.tree_priority());

    let mut sets = DisjointSet::new(slots);
    let mut tree = Vec::new();
    let mut links = Vec::new();

    for idx in order {
        let comp = &mut circuit.components_mut()[idx];
        let in_tree = sets.union(comp.node1.index(), comp.node2.index());
        comp.mark_tree_branch(in_tree);
        if in_tree {
            tree.push(idx);
        } else {
            links.push(idx);
        }
    }

    let components = circuit.components();
    let floating = floating_nodes(components, &sets);
    if !floating.is_empty() {
        log::warn!(
            "{} node(s) have no path to ground: {}",
            floating.len(),
            floating.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
        );
    }
    log::info!(
        "tree branches ({}): {}",
        tree.len(),
        join_names(components, &tree)
    );
    log::info!("chords ({}): {}", links.len(), join_names(components, &links));

    let adjacency = TreeAdjacency::new(components, &tree, slots);
    let mut loop_matrix = DMatrix::<i8>::zeros(links.len(), tree.len());
    let mut diagnostics = Vec::new();

    for (row, &link) in links.iter().enumerate() {
        let chord = &components[link];
        match adjacency.path(chord.node2, chord.node1) {
            Some(steps) => {
                for step in steps {
                    loop_matrix[(row, step.tree_pos)] = step.sign;
                }
            }
            None => {
                let diagnostic = Diagnostic::DisconnectedChord {
                    component: chord.name.clone(),
                };
                diagnostic.log();
                diagnostics.push(diagnostic);
            }
        }
    }

    Topology {
        tree,
        links,
        loop_matrix,
        floating,
        diagnostics,
    }
}

fn floating_nodes(components: &[Component], sets: &DisjointSet) -> Vec<NodeId> {
    let ground = NodeId::GROUND.index();
    components
        .iter()
        .flat_map(|c| [c.node1, c.node2])
        .filter(|n| !sets.connected(n.index(), ground))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn join_names(components: &[Component], indices: &[usize]) -> String {
    indices
        .iter()
        .map(|&i| components[i].name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Incidence lists restricted to tree branches.
struct TreeAdjacency {
    /// Per node: `(tree position, neighbour node, sign when leaving this node)`.
    edges: Vec<Vec<(usize, usize, i8)>>,
}

impl TreeAdjacency {
    fn new(components: &[Component], tree: &[usize], slots: usize) -> Self {
        let mut edges = vec![Vec::new(); slots];
        for (pos, &idx) in tree.iter().enumerate() {
            let c = &components[idx];
            let (a, b) = (c.node1.index(), c.node2.index());
            edges[a].push((pos, b, 1));
            edges[b].push((pos, a, -1));
        }
        Self { edges }
    }

    /// Signed tree path from `start` to `end`, found by iterative DFS.
    ///
    /// A step is +1 when the branch is walked from its node1 to its node2.
    fn path(&self, start: NodeId, end: NodeId) -> Option<Vec<PathStep>> {
        let (start, end) = (start.index(), end.index());
        if start == end {
            return Some(Vec::new());
        }

        let mut visited = vec![false; self.edges.len()];
        // How each visited node was reached: (previous node, step taken).
        let mut came_from: Vec<Option<(usize, PathStep)>> = vec![None; self.edges.len()];
        let mut stack = vec![start];
        visited[start] = true;

        while let Some(node) = stack.pop() {
            if node == end {
                let mut steps = Vec::new();
                let mut cur = end;
                while let Some((prev, step)) = came_from[cur] {
                    steps.push(step);
                    cur = prev;
                }
                steps.reverse();
                return Some(steps);
            }
            for &(tree_pos, next, sign) in &self.edges[node] {
                if !visited[next] {
                    visited[next] = true;
                    came_from[next] = Some((node, PathStep { tree_pos, sign }));
                    stack.push(next);
                }
            }
        }
        None
    }
}

impl Topology {
    /// Number of fundamental loops.
    pub fn num_loops(&self) -> usize {
        self.links.len()
    }

    /// Whether every node reaches ground through some branch.
    pub fn is_connected(&self) -> bool {
        self.floating.is_empty()
    }

    /// Loop matrix as a fixed-width table, `.` for zero entries.
    pub fn render_loop_table(&self, components: &[Component]) -> String {
        let mut out = String::from("      ");
        for &t in &self.tree {
            let _ = write!(out, "{:<7}", components[t].name);
        }
        out.push('\n');
        for (row, &l) in self.links.iter().enumerate() {
            let _ = write!(out, "{:<6}", components[l].name);
            for col in 0..self.tree.len() {
                let cell = match self.loop_matrix[(row, col)] {
                    0 => ".",
                    v if v > 0 => "1",
                    _ => "-1",
                };
                let _ = write!(out, "{cell:<7}");
            }
            out.push('\n');
        }
        out
    }

    /// Name-keyed, serializable view of the partition.
    pub fn report(&self, components: &[Component]) -> TopologyReport {
        let names = |ids: &[usize]| ids.iter().map(|&i| components[i].name.clone()).collect();
        TopologyReport {
            tree: names(&self.tree),
            links: names(&self.links),
            loop_matrix: self
                .loop_matrix
                .row_iter()
                .map(|r| r.iter().copied().collect())
                .collect(),
            floating: self.floating.clone(),
        }
    }
}

/// Serializable form of [`Topology`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopologyReport {
    pub tree: Vec<String>,
    pub links: Vec<String>,
    pub loop_matrix: Vec<Vec<i8>>,
    pub floating: Vec<NodeId>,
}
