//! Generic node/edge graph that every diagram kind is lowered into.

mod builder;

pub use builder::GraphBuilder;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Node shapes understood by the serializer's structural defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    #[default]
    Rect,
    Round,
    Rhombus,
}

impl ShapeKind {
    /// Parses a schema shape name. Unknown names fall back to `Rect`.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "round" => ShapeKind::Round,
            "rhombus" => ShapeKind::Rhombus,
            _ => ShapeKind::Rect,
        }
    }
}

/// What a node stands for in its diagram kind. Drives style preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeRole {
    #[default]
    Default,
    Entity,
    Class,
    Actor,
    UseCase,
    Participant,
    State,
    Activity,
}

/// Direction of the layered layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum Direction {
    #[serde(rename = "TD")]
    #[value(name = "TD")]
    TopDown,
    #[serde(rename = "LR")]
    #[value(name = "LR")]
    LeftRight,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::TopDown => "TD",
            Direction::LeftRight => "LR",
        }
    }
}

/// A vertex of the diagram
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: String,
    /// Rich-text label, already escaped for embedding as markup.
    pub label: String,
    pub shape: ShapeKind,
    pub role: NodeRole,
    pub style: Option<String>,
}

impl Node {
    pub fn new(id: impl Into<String>, label: impl Into<String>, shape: ShapeKind) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            shape,
            role: NodeRole::Default,
            style: None,
        }
    }

    pub fn with_role(mut self, role: NodeRole) -> Self {
        self.role = role;
        self
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }
}

/// A directed connection between two nodes
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub from: String,
    pub to: String,
    pub label: String,
    pub style: Option<String>,
}

impl Edge {
    pub fn new(from: impl Into<String>, to: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            label: label.into(),
            style: None,
        }
    }
}

/// A complete diagram graph.
///
/// Nodes keep declaration order; ids are unique. Only [`GraphBuilder`]
/// mutates a graph.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    pub title: String,
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
    edges: Vec<Edge>,
}

impl Graph {
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Adds a node unless one with the same id exists. Returns whether it was
    /// added.
    pub(crate) fn add_node(&mut self, node: Node) -> bool {
        if self.index.contains_key(&node.id) {
            return false;
        }
        self.index.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node);
        true
    }

    pub(crate) fn add_edge(&mut self, edge: Edge) {
        self.edges.push(edge);
    }
}
