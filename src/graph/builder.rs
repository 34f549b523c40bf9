use std::collections::HashMap;

use super::{Edge, Graph, Node, NodeRole, ShapeKind};
use crate::schema::{
    ActivitySpec, ClassSpec, DiagramSpec, ErSpec, GenericSpec, SequenceSpec, StateSpec,
    UseCaseSpec,
};
use crate::xml::escape_markup;

/// Lowers a [`DiagramSpec`] into a [`Graph`].
///
/// Labels are composed as draw.io rich text with every piece of user text
/// markup-escaped once. Edges are never dropped: an endpoint that matches no
/// declared node gets a placeholder node.
pub struct GraphBuilder {
    graph: Graph,
    /// Declared name → node id, for kinds that reference nodes by name.
    names: HashMap<String, String>,
}

impl GraphBuilder {
    fn new(title: &str) -> Self {
        Self {
            graph: Graph {
                title: title.to_string(),
                ..Graph::default()
            },
            names: HashMap::new(),
        }
    }

    pub fn build(spec: &DiagramSpec) -> Graph {
        let mut builder = Self::new(spec.title());
        match spec {
            DiagramSpec::Generic(s) => builder.generic(s),
            DiagramSpec::Er(s) => builder.er(s),
            DiagramSpec::Class(s) => builder.class(s),
            DiagramSpec::Sequence(s) => builder.sequence(s),
            DiagramSpec::State(s) => builder.state(s),
            DiagramSpec::Activity(s) => builder.activity(s),
            DiagramSpec::UseCase(s) => builder.use_case(s),
        }
        log::debug!(
            kind = spec.kind().as_str(),
            nodes = builder.graph.nodes().len(),
            edges = builder.graph.edges().len();
            "Graph built"
        );
        builder.graph
    }

    /// Declares a node reachable by `name`. The first declaration of a name
    /// keeps it.
    fn declare(&mut self, name: &str, node: Node) {
        self.names
            .entry(name.to_string())
            .or_insert_with(|| node.id.clone());
        self.graph.add_node(node);
    }

    /// Node id for a name. An undeclared name gets a placeholder node whose
    /// id is the name itself, suffixed when that id is already taken.
    fn resolve(&mut self, name: &str) -> String {
        if let Some(id) = self.names.get(name) {
            return id.clone();
        }
        let mut id = name.to_string();
        let mut suffix = 1;
        while self.graph.contains(&id) {
            id = format!("{name}_{suffix}");
            suffix += 1;
        }
        log::debug!(name, id = id.as_str(); "Adding placeholder node for undeclared endpoint");
        self.declare(name, Node::new(id.clone(), escape_markup(name), ShapeKind::Rect));
        id
    }

    /// Adds an edge between two names, creating placeholders as needed.
    fn connect(&mut self, from: &str, to: &str, label: &str, style: Option<&str>) {
        let from = self.resolve(from);
        let to = self.resolve(to);
        let mut edge = Edge::new(from, to, escape_markup(label));
        edge.style = style.map(str::to_string);
        self.graph.add_edge(edge);
    }

    fn generic(&mut self, spec: &GenericSpec) {
        for node in &spec.nodes {
            let label = node.label.as_deref().unwrap_or(&node.id);
            let shape = node
                .shape
                .as_deref()
                .map_or(ShapeKind::Rect, ShapeKind::from_name);
            let mut built = Node::new(node.id.clone(), escape_markup(label), shape);
            if let Some(style) = &node.style {
                built = built.with_style(style.as_str());
            }
            self.declare(&node.id, built);
        }
        for edge in &spec.edges {
            self.connect(&edge.from, &edge.to, &edge.label, edge.style.as_deref());
        }
    }

    fn er(&mut self, spec: &ErSpec) {
        for (i, entity) in spec.entities.iter().enumerate() {
            let rows: Vec<String> = entity
                .attributes
                .iter()
                .map(|a| {
                    let mut flags = Vec::new();
                    if a.pk {
                        flags.push("PK");
                    }
                    if a.unique {
                        flags.push("UQ");
                    }
                    if !a.nullable {
                        flags.push("NOT NULL");
                    }
                    let flags = if flags.is_empty() {
                        String::new()
                    } else {
                        format!(" ({})", flags.join(", "))
                    };
                    format!(
                        "{}: {}{}",
                        escape_markup(&a.name),
                        escape_markup(&a.data_type),
                        flags
                    )
                })
                .collect();
            let label = format!(
                "<b>{}</b><hr/>{}",
                escape_markup(&entity.name),
                join_rows(&rows, "(no attributes)")
            );
            let node =
                Node::new(format!("E{}", i + 1), label, ShapeKind::Rect).with_role(NodeRole::Entity);
            self.declare(&entity.name, node);
        }

        for relation in &spec.relations {
            let label = er_edge_label(&relation.name, &relation.cardinality);
            self.connect(
                entity_part(&relation.from),
                entity_part(&relation.to),
                &label,
                None,
            );
        }
    }

    fn class(&mut self, spec: &ClassSpec) {
        for (i, class) in spec.classes.iter().enumerate() {
            let attributes: Vec<String> = class
                .attributes
                .iter()
                .map(|a| {
                    format!(
                        "{} {}: {}",
                        escape_markup(&a.visibility),
                        escape_markup(&a.name),
                        escape_markup(&a.data_type)
                    )
                    .trim()
                    .to_string()
                })
                .collect();
            let methods: Vec<String> = class
                .methods
                .iter()
                .map(|m| {
                    format!(
                        "{} {}",
                        escape_markup(&m.visibility),
                        escape_markup(&m.signature)
                    )
                })
                .collect();
            let label = format!(
                "<b>{}</b><hr/>{}<hr/>{}",
                escape_markup(&class.name),
                join_rows(&attributes, "(no attributes)"),
                join_rows(&methods, "(no methods)")
            );
            let node =
                Node::new(format!("C{}", i + 1), label, ShapeKind::Rect).with_role(NodeRole::Class);
            self.declare(&class.name, node);
        }

        for relation in &spec.relations {
            let label = non_empty_or(&relation.label, &relation.relation_type);
            self.connect(&relation.from, &relation.to, label, None);
        }
    }

    fn sequence(&mut self, spec: &SequenceSpec) {
        for (i, participant) in spec.participants.iter().enumerate() {
            let node = Node::new(
                format!("P{}", i + 1),
                escape_markup(participant),
                ShapeKind::Round,
            )
            .with_role(NodeRole::Participant);
            self.declare(participant, node);
        }
        for message in &spec.messages {
            self.connect(&message.from, &message.to, &message.label, message.style.as_deref());
        }
    }

    fn state(&mut self, spec: &StateSpec) {
        if let Some(start) = &spec.start {
            let node = Node::new("S0", "● Start", ShapeKind::Round).with_role(NodeRole::State);
            self.declare(start, node);
        }
        if let Some(end) = &spec.end {
            let node = Node::new("SE", "■ End", ShapeKind::Rect).with_role(NodeRole::State);
            self.declare(end, node);
        }

        let mut next = 1;
        for state in &spec.states {
            if self.names.contains_key(state) {
                continue;
            }
            let node = Node::new(format!("S{next}"), escape_markup(state), ShapeKind::Round)
                .with_role(NodeRole::State);
            next += 1;
            self.declare(state, node);
        }

        for transition in &spec.transitions {
            self.connect(
                &transition.from,
                &transition.to,
                &transition.label,
                transition.style.as_deref(),
            );
        }
    }

    fn activity(&mut self, spec: &ActivitySpec) {
        for (i, activity) in spec.activities.iter().enumerate() {
            let shape = match activity.kind.trim().to_ascii_lowercase().as_str() {
                "start" | "end" => ShapeKind::Round,
                "decision" | "merge" => ShapeKind::Rhombus,
                _ => ShapeKind::Rect,
            };
            let label = activity.label.as_deref().unwrap_or(&activity.id);
            let node = Node::new(format!("A{}", i + 1), escape_markup(label), shape)
                .with_role(NodeRole::Activity);
            self.declare(&activity.id, node);
        }
        for edge in &spec.edges {
            self.connect(&edge.from, &edge.to, &edge.label, edge.style.as_deref());
        }
    }

    fn use_case(&mut self, spec: &UseCaseSpec) {
        for (i, actor) in spec.actors.iter().enumerate() {
            let node = Node::new(format!("A{}", i + 1), escape_markup(actor), ShapeKind::Round)
                .with_role(NodeRole::Actor);
            self.declare(actor, node);
        }
        for (i, use_case) in spec.usecases.iter().enumerate() {
            let label = format!("<i>{}</i>", escape_markup(use_case));
            let node =
                Node::new(format!("U{}", i + 1), label, ShapeKind::Round).with_role(NodeRole::UseCase);
            self.declare(use_case, node);
        }
        for relation in &spec.relations {
            let label = non_empty_or(&relation.label, &relation.relation_type);
            self.connect(&relation.from, &relation.to, label, None);
        }
    }
}

/// `Users.id` → `Users`
fn entity_part(reference: &str) -> &str {
    reference
        .split_once('.')
        .map_or(reference, |(entity, _)| entity)
        .trim()
}

fn er_edge_label(name: &str, cardinality: &str) -> String {
    match (name.trim(), cardinality.trim()) {
        ("", card) => card.to_string(),
        (name, "") => name.to_string(),
        (name, card) => format!("{name} ({card})"),
    }
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() { fallback } else { value }
}

fn join_rows(rows: &[String], empty: &str) -> String {
    if rows.is_empty() {
        format!("<i>{empty}</i>")
    } else {
        rows.join("<br/>")
    }
}
