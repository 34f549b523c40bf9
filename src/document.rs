//! draw.io document output.
//!
//! Every node becomes a vertex cell and every edge an edge cell inside a
//! single-page `mxfile`. Labels arrive markup-escaped from the graph builder
//! and are attribute-escaped here, so the file decodes back to the rich-text
//! label draw.io renders.

use serde::Deserialize;

use crate::graph::{Edge, Graph, Node, NodeRole, ShapeKind};
use crate::layout::{Layout, NODE_H, NODE_W};
use crate::schema::DiagramKind;
use crate::style::{StyleLibrary, ensure_flag};
use crate::xml::{escape_attr, escape_markup};

const MIN_PAGE_W: i64 = 1920;
const MIN_PAGE_H: i64 = 1080;
const PAGE_MARGIN: i64 = 80;
const FIRST_EDGE_ID: u64 = 100_000;
const DRAWIO_VERSION: &str = "24.7.1";

pub const DEFAULT_EDGE_STYLE: &str =
    "edgeStyle=orthogonalEdgeStyle;rounded=1;orthogonalLoop=1;jettySize=auto;html=1;";

/// Structural fallback style for a vertex shape.
pub fn default_vertex_style(shape: ShapeKind) -> &'static str {
    match shape {
        ShapeKind::Rhombus => "shape=rhombus;rounded=0;whiteSpace=wrap;html=1;",
        ShapeKind::Round => "rounded=1;whiteSpace=wrap;html=1;",
        ShapeKind::Rect => "rounded=0;whiteSpace=wrap;html=1;",
    }
}

/// Style references that beat library preferences. Each slot holds either a
/// literal style or a library key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StyleOverrides {
    pub er_entity: Option<String>,
    pub er_edge: Option<String>,
    pub class: Option<String>,
    pub class_edge: Option<String>,
    pub actor: Option<String>,
    pub usecase: Option<String>,
    pub vertex: Option<String>,
    pub edge: Option<String>,
}

impl StyleOverrides {
    /// Fills every empty slot from `fallback`.
    pub fn or(self, fallback: StyleOverrides) -> StyleOverrides {
        StyleOverrides {
            er_entity: self.er_entity.or(fallback.er_entity),
            er_edge: self.er_edge.or(fallback.er_edge),
            class: self.class.or(fallback.class),
            class_edge: self.class_edge.or(fallback.class_edge),
            actor: self.actor.or(fallback.actor),
            usecase: self.usecase.or(fallback.usecase),
            vertex: self.vertex.or(fallback.vertex),
            edge: self.edge.or(fallback.edge),
        }
    }
}

/// Key token lists tried in order against the library.
type Preferences = &'static [&'static [&'static str]];

const ER_ENTITY_PREFS: Preferences = &[
    &["er.entity"],
    &["entity"],
    &["table"],
    &["erd"],
    &["sql"],
    &["db"],
];
const CLASS_PREFS: Preferences = &[&["uml.class"], &["class"]];
const ACTOR_PREFS: Preferences = &[&["uml.actor"], &["actor"], &["stickman"], &["person"]];
const USECASE_PREFS: Preferences = &[&["usecase"], &["ellipse"], &["oval"]];
const VERTEX_PREFS: Preferences = &[&["shape.rect"]];

const ER_EDGE_PREFS: Preferences = &[
    &["edge.entityrelation"],
    &["entityrelation"],
    &["er.edge"],
    &["relationship"],
];
const CLASS_EDGE_PREFS: Preferences = &[&["edge.uml"], &["association"], &["edge.orthogonal"]];
const USECASE_EDGE_PREFS: Preferences =
    &[&["edge.association"], &["edge.uml"], &["edge.orthogonal"]];
const EDGE_PREFS: Preferences = &[&["edge.orthogonal"]];

/// Vertex keys must not look like edge styles.
const VERTEX_EXCLUDE: &[&str] = &["edge"];

/// Builds the draw.io document for a laid-out graph.
pub struct DocumentSerializer<'a> {
    library: &'a StyleLibrary,
    overrides: &'a StyleOverrides,
    page_id: Option<String>,
}

impl<'a> DocumentSerializer<'a> {
    pub fn new(library: &'a StyleLibrary, overrides: &'a StyleOverrides) -> Self {
        Self {
            library,
            overrides,
            page_id: None,
        }
    }

    /// Uses a fixed page id instead of a random UUID.
    pub fn with_page_id(mut self, page_id: impl Into<String>) -> Self {
        self.page_id = Some(page_id.into());
        self
    }

    pub fn serialize(&self, graph: &Graph, layout: &Layout, kind: DiagramKind) -> String {
        let (max_x, max_y) = layout.extent();
        let page_w = MIN_PAGE_W.max(max_x + NODE_W + PAGE_MARGIN);
        let page_h = MIN_PAGE_H.max(max_y + NODE_H + PAGE_MARGIN);
        let page_id = self
            .page_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let page_name = if graph.title.trim().is_empty() {
            "Page-1"
        } else {
            graph.title.as_str()
        };

        let mut doc = String::new();
        doc.push_str(&format!(
            "<mxfile host=\"mxforge\" modified=\"1\" agent=\"mxforge/{}\" version=\"{}\" pages=\"1\">\n",
            env!("CARGO_PKG_VERSION"),
            DRAWIO_VERSION
        ));
        doc.push_str(&format!(
            "  <diagram id=\"{}\" name=\"{}\">\n",
            escape_attr(&page_id),
            escape_attr(page_name)
        ));
        doc.push_str(&format!(
            "    <mxGraphModel dx=\"2000\" dy=\"2000\" grid=\"1\" gridSize=\"10\" guides=\"1\" \
             tooltips=\"1\" connect=\"1\" arrows=\"1\" fold=\"1\" page=\"1\" pageScale=\"1\" \
             pageWidth=\"{page_w}\" pageHeight=\"{page_h}\" math=\"0\" shadow=\"0\">\n"
        ));
        doc.push_str("      <root>\n");
        doc.push_str("        <mxCell id=\"0\"/><mxCell id=\"1\" parent=\"0\"/>\n");

        for node in graph.nodes() {
            let (x, y) = layout.positions.get(&node.id).copied().unwrap_or((0, 0));
            let value = if node.label.is_empty() {
                escape_markup(&node.id)
            } else {
                node.label.clone()
            };
            doc.push_str(&format!(
                "        <mxCell id=\"{}\" value=\"{}\" style=\"{}\" vertex=\"1\" parent=\"1\">\n",
                escape_attr(&node.id),
                escape_attr(&value),
                escape_attr(&self.vertex_style(node))
            ));
            doc.push_str(&format!(
                "          <mxGeometry x=\"{x}\" y=\"{y}\" width=\"{NODE_W}\" height=\"{NODE_H}\" as=\"geometry\"/>\n"
            ));
            doc.push_str("        </mxCell>\n");
        }

        let mut next_id = FIRST_EDGE_ID;
        for edge in graph.edges() {
            let mut id = format!("e{next_id}");
            while graph.contains(&id) {
                next_id += 1;
                id = format!("e{next_id}");
            }
            next_id += 1;

            doc.push_str(&format!(
                "        <mxCell id=\"{}\" value=\"{}\" style=\"{}\" edge=\"1\" parent=\"1\" source=\"{}\" target=\"{}\">\n",
                id,
                escape_attr(&edge.label),
                escape_attr(&self.edge_style(edge, kind)),
                escape_attr(&edge.from),
                escape_attr(&edge.to)
            ));
            doc.push_str("          <mxGeometry relative=\"1\" as=\"geometry\"/>\n");
            doc.push_str("        </mxCell>\n");
        }

        doc.push_str("      </root>\n");
        doc.push_str("    </mxGraphModel>\n");
        doc.push_str("  </diagram>\n");
        doc.push_str("</mxfile>");

        log::debug!(
            nodes = graph.nodes().len(),
            edges = graph.edges().len(),
            page_w,
            page_h;
            "Document serialized"
        );
        doc
    }

    fn vertex_style(&self, node: &Node) -> String {
        let (slot, prefs) = match node.role {
            NodeRole::Entity => (&self.overrides.er_entity, ER_ENTITY_PREFS),
            NodeRole::Class => (&self.overrides.class, CLASS_PREFS),
            NodeRole::Actor => (&self.overrides.actor, ACTOR_PREFS),
            NodeRole::UseCase => (&self.overrides.usecase, USECASE_PREFS),
            _ => (&self.overrides.vertex, VERTEX_PREFS),
        };
        self.resolve_style([node.style.as_deref(), slot.as_deref()], prefs, VERTEX_EXCLUDE)
            .unwrap_or_else(|| default_vertex_style(node.shape).to_string())
    }

    fn edge_style(&self, edge: &Edge, kind: DiagramKind) -> String {
        let (slot, prefs) = match kind {
            DiagramKind::Er => (&self.overrides.er_edge, ER_EDGE_PREFS),
            DiagramKind::Class => (&self.overrides.class_edge, CLASS_EDGE_PREFS),
            DiagramKind::UseCase => (&self.overrides.edge, USECASE_EDGE_PREFS),
            _ => (&self.overrides.edge, EDGE_PREFS),
        };
        self.resolve_style([edge.style.as_deref(), slot.as_deref()], prefs, &[])
            .unwrap_or_else(|| DEFAULT_EDGE_STYLE.to_string())
    }

    /// First resolvable reference (element's own, then the override slot),
    /// then the preference lists in order.
    fn resolve_style(
        &self,
        references: [Option<&str>; 2],
        prefs: Preferences,
        exclude: &[&str],
    ) -> Option<String> {
        for reference in references.into_iter().flatten() {
            match self.library.resolve(reference) {
                Some(style) => return Some(ensure_flag(style, "html=1")),
                None => log::warn!(reference; "Style reference not found in library, ignoring"),
            }
        }
        prefs
            .iter()
            .find_map(|include| self.library.find_best_match(include, exclude))
            .map(|style| ensure_flag(style, "html=1"))
    }
}
