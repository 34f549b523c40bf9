//! Layered placement of graph nodes on a fixed grid.
//!
//! Layers come from a breadth-first walk starting at the roots (nodes with no
//! incoming edge). Nodes inside a layer are ordered by id so the output is
//! stable for a given graph.

use std::collections::{BTreeMap, HashMap, VecDeque};

use crate::graph::{Direction, Graph};

pub const NODE_W: i64 = 240;
pub const NODE_H: i64 = 96;
pub const H_GAP: i64 = 200;
pub const V_GAP: i64 = 160;

/// Layer index → node ids in that layer, already sorted.
pub type Layers = BTreeMap<usize, Vec<String>>;

/// Result of laying out a graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub direction: Direction,
    /// Top-left corner of every node.
    pub positions: HashMap<String, (i64, i64)>,
}

impl Layout {
    /// Largest x and y over all positions, `(0, 0)` for an empty layout.
    pub fn extent(&self) -> (i64, i64) {
        self.positions
            .values()
            .fold((0, 0), |(mx, my), &(x, y)| (mx.max(x), my.max(y)))
    }
}

/// Groups nodes by their BFS distance from the nearest root.
///
/// Every node lands in exactly one layer. A node the walk never reaches
/// (a cycle with no root while other components have one) goes to layer 0.
pub fn compute_layers(graph: &Graph) -> Layers {
    let nodes = graph.nodes();
    let mut layers = Layers::new();
    if nodes.is_empty() {
        return layers;
    }

    let mut outgoing: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut indegree: HashMap<&str, usize> =
        nodes.iter().map(|n| (n.id.as_str(), 0)).collect();
    for edge in graph.edges() {
        if !graph.contains(&edge.from) || !graph.contains(&edge.to) {
            continue;
        }
        outgoing
            .entry(edge.from.as_str())
            .or_default()
            .push(edge.to.as_str());
        *indegree.entry(edge.to.as_str()).or_default() += 1;
    }

    let mut ranks: HashMap<&str, usize> = HashMap::new();
    let mut queue: VecDeque<&str> = nodes
        .iter()
        .map(|n| n.id.as_str())
        .filter(|id| indegree.get(id).copied().unwrap_or(0) == 0)
        .collect();
    if queue.is_empty() {
        queue.push_back(nodes[0].id.as_str());
    }
    for &root in &queue {
        ranks.insert(root, 0);
    }

    while let Some(node) = queue.pop_front() {
        let rank = ranks.get(node).copied().unwrap_or(0);
        for &next in outgoing.get(node).into_iter().flatten() {
            if !ranks.contains_key(next) {
                ranks.insert(next, rank + 1);
                queue.push_back(next);
            }
        }
    }

    for node in nodes {
        let rank = ranks.get(node.id.as_str()).copied().unwrap_or(0);
        layers.entry(rank).or_default().push(node.id.clone());
    }
    for ids in layers.values_mut() {
        ids.sort();
    }
    layers
}

/// `LeftRight` when the widest layer holds more nodes than there are layers.
pub fn choose_direction(layers: &Layers) -> Direction {
    let widest = layers.values().map(Vec::len).max().unwrap_or(0);
    if widest > layers.len() {
        Direction::LeftRight
    } else {
        Direction::TopDown
    }
}

/// Places each layer on its own row (`TopDown`) or column (`LeftRight`).
pub fn assign_coordinates(layers: &Layers, direction: Direction) -> HashMap<String, (i64, i64)> {
    let step_across = NODE_W + H_GAP;
    let step_down = NODE_H + V_GAP;

    let mut positions = HashMap::new();
    for (&layer, ids) in layers {
        let layer = layer as i64;
        for (i, id) in ids.iter().enumerate() {
            let i = i as i64;
            let pos = match direction {
                Direction::TopDown => (i * step_across, layer * step_down),
                Direction::LeftRight => (layer * step_across, i * step_down),
            };
            positions.insert(id.clone(), pos);
        }
    }
    positions
}

/// Lays out `graph`. The direction is the override if given, else
/// [`choose_direction`].
pub fn layout(graph: &Graph, direction_override: Option<Direction>) -> Layout {
    let layers = compute_layers(graph);
    let direction = direction_override.unwrap_or_else(|| choose_direction(&layers));
    let positions = assign_coordinates(&layers, direction);
    log::debug!(
        direction = direction.as_str(),
        layers = layers.len(),
        nodes = positions.len();
        "Layout computed"
    );
    Layout {
        direction,
        positions,
    }
}
