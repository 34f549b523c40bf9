//! Structured diagram descriptions, one schema per diagram kind.
//!
//! These are what a specification provider hands back. Missing optional
//! fields take the defaults below; scalar values where text is expected
//! (`"cardinality": 1`) are accepted and stringified. Anything else that does
//! not fit the schema is an [`Error::Schema`].

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::{Error, Result};

/// The diagram kinds a prompt can be turned into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagramKind {
    Er,
    Class,
    Sequence,
    State,
    Activity,
    UseCase,
    Generic,
}

/// Keyword table used by [`DiagramKind::infer`], checked in this order.
const KIND_KEYWORDS: &[(DiagramKind, &[&str])] = &[
    (
        DiagramKind::Er,
        &[
            "der", "e-r", "er", "erd", "entidade", "entidades", "entity", "entities", "tabela",
            "tabelas", "table", "tables", "relacionamento", "cardinalidade", "cardinality",
        ],
    ),
    (
        DiagramKind::Class,
        &["classe", "classes", "class", "uml class", "class diagram"],
    ),
    (
        DiagramKind::Sequence,
        &[
            "sequência", "sequencia", "sequence", "lifeline", "mensagem", "mensagens",
            "message", "messages",
        ],
    ),
    (
        DiagramKind::State,
        &["estado", "estados", "state", "states", "state diagram", "statechart"],
    ),
    (
        DiagramKind::Activity,
        &["atividade", "atividades", "activity", "fluxo", "flow", "flowchart", "workflow", "bpmn"],
    ),
    (
        DiagramKind::UseCase,
        &["use case", "use cases", "caso de uso", "casos de uso", "ator", "atores", "actor", "actors"],
    ),
];

impl DiagramKind {
    /// Guesses the kind from prompt keywords (English and Portuguese).
    /// Keywords match whole words or word sequences; no match means
    /// [`DiagramKind::Generic`].
    pub fn infer(prompt: &str) -> Self {
        let lowered = prompt.to_lowercase();
        let words: Vec<&str> = lowered
            .split(|c: char| !(c.is_alphanumeric() || c == '-'))
            .filter(|w| !w.is_empty())
            .collect();
        let padded = format!(" {} ", words.join(" "));

        KIND_KEYWORDS
            .iter()
            .find(|(_, keywords)| {
                keywords
                    .iter()
                    .any(|kw| padded.contains(&format!(" {kw} ")))
            })
            .map_or(DiagramKind::Generic, |(kind, _)| *kind)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DiagramKind::Er => "er",
            DiagramKind::Class => "class",
            DiagramKind::Sequence => "sequence",
            DiagramKind::State => "state",
            DiagramKind::Activity => "activity",
            DiagramKind::UseCase => "usecase",
            DiagramKind::Generic => "generic",
        }
    }

    /// Instructions describing the JSON shape a provider must return.
    pub fn schema_prompt(self) -> &'static str {
        match self {
            DiagramKind::Generic => GENERIC_PROMPT,
            DiagramKind::Er => ER_PROMPT,
            DiagramKind::Class => CLASS_PROMPT,
            DiagramKind::Sequence => SEQUENCE_PROMPT,
            DiagramKind::State => STATE_PROMPT,
            DiagramKind::Activity => ACTIVITY_PROMPT,
            DiagramKind::UseCase => USECASE_PROMPT,
        }
    }
}

impl std::fmt::Display for DiagramKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

const GENERIC_PROMPT: &str = r#"Return ONLY valid JSON describing a graph:
{
  "title": "optional",
  "nodes": [{"id": "n1", "label": "Text", "shape": "rect|round|rhombus"}],
  "edges": [{"from": "n1", "to": "n2", "label": "optional"}]
}
Rules:
- Short ids without spaces; shape defaults to rect; decisions are rhombus; start/end are round.
- No markdown or comments outside the JSON.
"#;

const ER_PROMPT: &str = r#"Return ONLY valid JSON describing an entity-relationship diagram:
{
  "title": "optional",
  "entities": [
    {"name": "Users", "attributes": [
      {"name": "id", "type": "uuid", "pk": true, "unique": true, "nullable": false},
      {"name": "email", "type": "varchar(255)", "unique": true, "nullable": false}
    ]}
  ],
  "relations": [
    {"from": "Users.id", "to": "Auth.user_id", "cardinality": "1:N", "name": "has_auth"}
  ]
}
Rules:
- Types, PK/UNIQUE/NULL as booleans.
- Cardinality: "1", "0..1", "1..*", "*", "1:N", "N:1", "N:M".
- No markdown or comments outside the JSON.
"#;

const CLASS_PROMPT: &str = r#"Return ONLY valid JSON describing a UML class diagram:
{
  "title": "optional",
  "classes": [
    {"name": "User",
     "attributes": [{"visibility": "+|-|#", "name": "email", "type": "string"}],
     "methods": [{"visibility": "+|-|#", "signature": "resetPassword(token: string): bool"}]}
  ],
  "relations": [
    {"from": "User", "to": "AuthService", "type": "association|aggregation|composition|inheritance|dependency", "label": "optional"}
  ]
}
Rules:
- visibility defaults to "+";
- type defaults to "association";
- No markdown or comments outside the JSON.
"#;

const SEQUENCE_PROMPT: &str = r#"Return ONLY valid JSON describing a UML sequence diagram:
{
  "title": "optional",
  "participants": ["Client", "API", "DB"],
  "messages": [
    {"from": "Client", "to": "API", "label": "login()"},
    {"from": "API", "to": "DB", "label": "SELECT user"}
  ]
}
No markdown or comments outside the JSON.
"#;

const STATE_PROMPT: &str = r#"Return ONLY valid JSON describing a state diagram:
{
  "title": "optional",
  "states": ["Idle", "EnteringPIN", "Locked"],
  "transitions": [{"from": "Idle", "to": "EnteringPIN", "label": "cardInserted"}],
  "start": "Idle",
  "end": "Locked"
}
No markdown or comments outside the JSON.
"#;

const ACTIVITY_PROMPT: &str = r#"Return ONLY valid JSON describing an activity diagram:
{
  "title": "optional",
  "activities": [{"id": "a1", "label": "Start", "kind": "start|action|decision|merge|end"}],
  "edges": [{"from": "a1", "to": "a2", "label": "optional guard"}]
}
No markdown or comments outside the JSON.
"#;

const USECASE_PROMPT: &str = r#"Return ONLY valid JSON describing a use case diagram:
{
  "title": "optional",
  "actors": ["User", "Admin"],
  "usecases": ["Login", "Reset Password"],
  "relations": [
    {"from": "User", "to": "Login", "type": "association"},
    {"from": "Login", "to": "MFA", "type": "include|extend", "label": "include"}
  ]
}
No markdown or comments outside the JSON.
"#;

/// A validated description of one diagram.
#[derive(Debug, Clone, PartialEq)]
pub enum DiagramSpec {
    Generic(GenericSpec),
    Er(ErSpec),
    Class(ClassSpec),
    Sequence(SequenceSpec),
    State(StateSpec),
    Activity(ActivitySpec),
    UseCase(UseCaseSpec),
}

impl DiagramSpec {
    /// Parses provider JSON as the given kind, applies defaults and validates.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schema`] if the JSON is malformed or does not fit the
    /// kind's schema.
    pub fn from_json(kind: DiagramKind, json: &str) -> Result<Self> {
        let spec = match kind {
            DiagramKind::Generic => DiagramSpec::Generic(parse(kind, json)?),
            DiagramKind::Er => DiagramSpec::Er(parse(kind, json)?),
            DiagramKind::Class => DiagramSpec::Class(parse(kind, json)?),
            DiagramKind::Sequence => DiagramSpec::Sequence(parse(kind, json)?),
            DiagramKind::State => DiagramSpec::State(parse(kind, json)?),
            DiagramKind::Activity => DiagramSpec::Activity(parse(kind, json)?),
            DiagramKind::UseCase => DiagramSpec::UseCase(parse(kind, json)?),
        };
        spec.with_defaults().validated()
    }

    pub fn kind(&self) -> DiagramKind {
        match self {
            DiagramSpec::Generic(_) => DiagramKind::Generic,
            DiagramSpec::Er(_) => DiagramKind::Er,
            DiagramSpec::Class(_) => DiagramKind::Class,
            DiagramSpec::Sequence(_) => DiagramKind::Sequence,
            DiagramSpec::State(_) => DiagramKind::State,
            DiagramSpec::Activity(_) => DiagramKind::Activity,
            DiagramSpec::UseCase(_) => DiagramKind::UseCase,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            DiagramSpec::Generic(s) => &s.title,
            DiagramSpec::Er(s) => &s.title,
            DiagramSpec::Class(s) => &s.title,
            DiagramSpec::Sequence(s) => &s.title,
            DiagramSpec::State(s) => &s.title,
            DiagramSpec::Activity(s) => &s.title,
            DiagramSpec::UseCase(s) => &s.title,
        }
    }

    /// Fills in the placeholder content used when a description is empty.
    fn with_defaults(mut self) -> Self {
        match &mut self {
            DiagramSpec::Generic(s) if s.nodes.is_empty() => s.nodes.push(GenericNode {
                id: "n1".to_string(),
                label: Some("Start".to_string()),
                shape: Some("round".to_string()),
                style: None,
            }),
            DiagramSpec::Er(s) if s.entities.is_empty() => s.entities.push(ErEntity {
                name: "Entity".to_string(),
                attributes: vec![ErAttribute {
                    name: "id".to_string(),
                    data_type: "uuid".to_string(),
                    pk: true,
                    unique: true,
                    nullable: false,
                }],
            }),
            DiagramSpec::Class(s) if s.classes.is_empty() => s.classes.push(ClassDef {
                name: "Class".to_string(),
                attributes: Vec::new(),
                methods: Vec::new(),
            }),
            DiagramSpec::Sequence(s) if s.participants.is_empty() => {
                s.participants = vec!["A".to_string(), "B".to_string()];
            }
            _ => {}
        }
        self
    }

    fn validated(self) -> Result<Self> {
        if let DiagramSpec::Generic(s) = &self {
            if let Some(pos) = s.nodes.iter().position(|n| n.id.trim().is_empty()) {
                return Err(Error::schema(format!("generic node #{} has an empty id", pos + 1)));
            }
        }
        if let DiagramSpec::Activity(s) = &self {
            if let Some(pos) = s.activities.iter().position(|a| a.id.trim().is_empty()) {
                return Err(Error::schema(format!("activity #{} has an empty id", pos + 1)));
            }
        }

        let (list, endpoints): (&str, Vec<(&str, &str)>) = match &self {
            DiagramSpec::Generic(s) => ("edge", link_endpoints(&s.edges)),
            DiagramSpec::Er(s) => (
                "relation",
                s.relations.iter().map(|r| (r.from.as_str(), r.to.as_str())).collect(),
            ),
            DiagramSpec::Class(s) => ("relation", relation_endpoints(&s.relations)),
            DiagramSpec::Sequence(s) => ("message", link_endpoints(&s.messages)),
            DiagramSpec::State(s) => ("transition", link_endpoints(&s.transitions)),
            DiagramSpec::Activity(s) => ("edge", link_endpoints(&s.edges)),
            DiagramSpec::UseCase(s) => ("relation", relation_endpoints(&s.relations)),
        };
        for (pos, (from, to)) in endpoints.into_iter().enumerate() {
            if from.trim().is_empty() || to.trim().is_empty() {
                return Err(Error::schema(format!(
                    "{} {list} #{} needs both `from` and `to`",
                    self.kind(),
                    pos + 1
                )));
            }
        }
        Ok(self)
    }
}

fn link_endpoints(links: &[Link]) -> Vec<(&str, &str)> {
    links.iter().map(|l| (l.from.as_str(), l.to.as_str())).collect()
}

fn relation_endpoints(relations: &[ClassRelation]) -> Vec<(&str, &str)> {
    relations.iter().map(|r| (r.from.as_str(), r.to.as_str())).collect()
}

fn parse<T: for<'de> Deserialize<'de>>(kind: DiagramKind, json: &str) -> Result<T> {
    serde_json::from_str(json)
        .map_err(|e| Error::schema(format!("invalid {kind} specification: {e}")))
}

/// Accepts any JSON scalar where text is expected.
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Null => Ok(String::new()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(D::Error::custom(format!("expected text, found {other}"))),
    }
}

fn lenient_opt_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    lenient_string(deserializer).map(|s| if s.is_empty() { None } else { Some(s) })
}

fn lenient_string_list<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<String>, D::Error> {
    let values = Vec::<Value>::deserialize(deserializer)?;
    values
        .into_iter()
        .map(|v| lenient_string(v).map_err(D::Error::custom))
        .collect()
}

fn default_entity_name() -> String {
    "Entity".to_string()
}
fn default_attribute_name() -> String {
    "id".to_string()
}
fn default_attribute_type() -> String {
    "text".to_string()
}
fn default_true() -> bool {
    true
}
fn default_cardinality() -> String {
    "1:N".to_string()
}
fn default_class_name() -> String {
    "Class".to_string()
}
fn default_visibility() -> String {
    "+".to_string()
}
fn default_member_name() -> String {
    "attr".to_string()
}
fn default_signature() -> String {
    "method(): void".to_string()
}
fn default_relation_type() -> String {
    "association".to_string()
}
fn default_activity_kind() -> String {
    "action".to_string()
}

// ============================================
// Generic graph
// ============================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GenericSpec {
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default)]
    pub nodes: Vec<GenericNode>,
    #[serde(default)]
    pub edges: Vec<Link>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GenericNode {
    #[serde(deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub label: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub shape: Option<String>,
    /// Literal style or library key for this node only.
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub style: Option<String>,
}

/// A labelled connection between two named things.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Link {
    #[serde(deserialize_with = "lenient_string")]
    pub from: String,
    #[serde(deserialize_with = "lenient_string")]
    pub to: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub label: String,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub style: Option<String>,
}

// ============================================
// Entity-relationship
// ============================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ErSpec {
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default)]
    pub entities: Vec<ErEntity>,
    #[serde(default)]
    pub relations: Vec<ErRelation>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ErEntity {
    #[serde(default = "default_entity_name", deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default)]
    pub attributes: Vec<ErAttribute>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ErAttribute {
    #[serde(default = "default_attribute_name", deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(
        rename = "type",
        default = "default_attribute_type",
        deserialize_with = "lenient_string"
    )]
    pub data_type: String,
    #[serde(default)]
    pub pk: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default = "default_true")]
    pub nullable: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ErRelation {
    /// `Entity` or `Entity.column`
    #[serde(deserialize_with = "lenient_string")]
    pub from: String,
    #[serde(deserialize_with = "lenient_string")]
    pub to: String,
    #[serde(default = "default_cardinality", deserialize_with = "lenient_string")]
    pub cardinality: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
}

// ============================================
// UML class
// ============================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClassSpec {
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default)]
    pub classes: Vec<ClassDef>,
    #[serde(default)]
    pub relations: Vec<ClassRelation>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClassDef {
    #[serde(default = "default_class_name", deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default)]
    pub attributes: Vec<ClassAttribute>,
    #[serde(default)]
    pub methods: Vec<ClassMethod>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClassAttribute {
    #[serde(default = "default_visibility", deserialize_with = "lenient_string")]
    pub visibility: String,
    #[serde(default = "default_member_name", deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(rename = "type", default, deserialize_with = "lenient_string")]
    pub data_type: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClassMethod {
    #[serde(default = "default_visibility", deserialize_with = "lenient_string")]
    pub visibility: String,
    #[serde(default = "default_signature", deserialize_with = "lenient_string")]
    pub signature: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClassRelation {
    #[serde(deserialize_with = "lenient_string")]
    pub from: String,
    #[serde(deserialize_with = "lenient_string")]
    pub to: String,
    #[serde(
        rename = "type",
        default = "default_relation_type",
        deserialize_with = "lenient_string"
    )]
    pub relation_type: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub label: String,
}

// ============================================
// Sequence
// ============================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SequenceSpec {
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_string_list")]
    pub participants: Vec<String>,
    #[serde(default)]
    pub messages: Vec<Link>,
}

// ============================================
// State
// ============================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StateSpec {
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_string_list")]
    pub states: Vec<String>,
    #[serde(default)]
    pub transitions: Vec<Link>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub start: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub end: Option<String>,
}

// ============================================
// Activity
// ============================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ActivitySpec {
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default)]
    pub activities: Vec<Activity>,
    #[serde(default)]
    pub edges: Vec<Link>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Activity {
    #[serde(deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub label: Option<String>,
    #[serde(default = "default_activity_kind", deserialize_with = "lenient_string")]
    pub kind: String,
}

// ============================================
// Use case
// ============================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UseCaseSpec {
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_string_list")]
    pub actors: Vec<String>,
    #[serde(default, deserialize_with = "lenient_string_list")]
    pub usecases: Vec<String>,
    #[serde(default)]
    pub relations: Vec<ClassRelation>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_kind_from_keywords() {
        assert_eq!(DiagramKind::infer("DER 2FA com usuários"), DiagramKind::Er);
        assert_eq!(DiagramKind::infer("ERD for a blog with tables"), DiagramKind::Er);
        assert_eq!(
            DiagramKind::infer("Class diagram of users and AuthService"),
            DiagramKind::Class
        );
        assert_eq!(
            DiagramKind::infer("Login sequence between client and API"),
            DiagramKind::Sequence
        );
        assert_eq!(DiagramKind::infer("ATM statechart"), DiagramKind::State);
        assert_eq!(DiagramKind::infer("Order approval workflow"), DiagramKind::Activity);
        assert_eq!(
            DiagramKind::infer("Casos de uso de Login"),
            DiagramKind::UseCase
        );
        assert_eq!(DiagramKind::infer("Network of services"), DiagramKind::Generic);
    }

    #[test]
    fn test_infer_matches_whole_words_only() {
        // "order" and "render" contain "der", "classroom" contains "class".
        assert_eq!(DiagramKind::infer("render the order pipeline"), DiagramKind::Generic);
        assert_eq!(DiagramKind::infer("a classroom seating map"), DiagramKind::Generic);
    }

    #[test]
    fn test_generic_defaults() {
        let spec = DiagramSpec::from_json(DiagramKind::Generic, r#"{"edges": []}"#).unwrap();
        let DiagramSpec::Generic(g) = spec else {
            panic!("Expected generic spec");
        };
        assert_eq!(g.title, "");
        assert_eq!(g.nodes.len(), 1);
        assert_eq!(g.nodes[0].id, "n1");
        assert_eq!(g.nodes[0].shape.as_deref(), Some("round"));
    }

    #[test]
    fn test_generic_edge_without_endpoint_is_schema_error() {
        let err = DiagramSpec::from_json(
            DiagramKind::Generic,
            r#"{"nodes": [{"id": "a"}], "edges": [{"from": "a"}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Schema(_)), "got {err:?}");
    }

    #[test]
    fn test_null_or_blank_endpoints_are_schema_errors() {
        let cases = [
            (DiagramKind::Generic, r#"{"nodes": [{"id": "a"}], "edges": [{"from": null, "to": "a"}]}"#),
            (DiagramKind::Generic, r#"{"nodes": [{"id": "a"}], "edges": [{"from": "a", "to": "  "}]}"#),
            (DiagramKind::Er, r#"{"entities": [{"name": "Users"}], "relations": [{"from": "Users", "to": null}]}"#),
            (DiagramKind::Class, r#"{"classes": [{"name": "User"}], "relations": [{"from": "", "to": "User"}]}"#),
            (DiagramKind::Sequence, r#"{"participants": ["A"], "messages": [{"from": "A", "to": null}]}"#),
            (DiagramKind::State, r#"{"states": ["Idle"], "transitions": [{"from": null, "to": "Idle"}]}"#),
            (DiagramKind::Activity, r#"{"activities": [{"id": "a"}], "edges": [{"from": "a", "to": ""}]}"#),
            (DiagramKind::UseCase, r#"{"actors": ["User"], "relations": [{"from": "User", "to": null}]}"#),
        ];
        for (kind, json) in cases {
            let err = DiagramSpec::from_json(kind, json).unwrap_err();
            assert!(matches!(err, Error::Schema(_)), "{kind}: got {err:?}");
        }
    }

    #[test]
    fn test_malformed_json_is_schema_error() {
        let err = DiagramSpec::from_json(DiagramKind::Er, "{not json").unwrap_err();
        assert!(matches!(err, Error::Schema(_)));

        let err = DiagramSpec::from_json(DiagramKind::Er, r#"{"entities": "Users"}"#).unwrap_err();
        assert!(matches!(err, Error::Schema(_)));
    }

    #[test]
    fn test_er_attribute_defaults_and_lenient_scalars() {
        let json = r#"{
            "entities": [{"name": "Users", "attributes": [{"name": "id", "pk": true}, {}]}],
            "relations": [{"from": "Users.id", "to": "Auth.user_id", "cardinality": 1}]
        }"#;
        let DiagramSpec::Er(er) = DiagramSpec::from_json(DiagramKind::Er, json).unwrap() else {
            panic!("Expected ER spec");
        };
        let attrs = &er.entities[0].attributes;
        assert_eq!(attrs[0].data_type, "text");
        assert!(attrs[0].pk);
        assert!(attrs[0].nullable);
        assert_eq!(attrs[1].name, "id");
        assert_eq!(er.relations[0].cardinality, "1");
        assert_eq!(er.relations[0].name, "");
    }

    #[test]
    fn test_empty_er_gets_placeholder_entity() {
        let DiagramSpec::Er(er) = DiagramSpec::from_json(DiagramKind::Er, "{}").unwrap() else {
            panic!("Expected ER spec");
        };
        assert_eq!(er.entities.len(), 1);
        assert_eq!(er.entities[0].name, "Entity");
        assert!(!er.entities[0].attributes[0].nullable);
    }

    #[test]
    fn test_class_member_defaults() {
        let json = r#"{"classes": [{"name": "User", "attributes": [{"name": "email"}], "methods": [{}]}],
                       "relations": [{"from": "User", "to": "Auth"}]}"#;
        let DiagramSpec::Class(c) = DiagramSpec::from_json(DiagramKind::Class, json).unwrap() else {
            panic!("Expected class spec");
        };
        assert_eq!(c.classes[0].attributes[0].visibility, "+");
        assert_eq!(c.classes[0].methods[0].signature, "method(): void");
        assert_eq!(c.relations[0].relation_type, "association");
    }

    #[test]
    fn test_sequence_defaults_participants() {
        let DiagramSpec::Sequence(s) =
            DiagramSpec::from_json(DiagramKind::Sequence, r#"{"title": "Login"}"#).unwrap()
        else {
            panic!("Expected sequence spec");
        };
        assert_eq!(s.participants, vec!["A", "B"]);
        assert_eq!(s.title, "Login");
    }

    #[test]
    fn test_state_start_and_end_are_optional() {
        let json = r#"{"states": ["Idle", 2], "start": null}"#;
        let DiagramSpec::State(s) = DiagramSpec::from_json(DiagramKind::State, json).unwrap() else {
            panic!("Expected state spec");
        };
        assert_eq!(s.states, vec!["Idle", "2"]);
        assert_eq!(s.start, None);
        assert_eq!(s.end, None);
    }

    #[test]
    fn test_activity_requires_ids() {
        let err = DiagramSpec::from_json(
            DiagramKind::Activity,
            r#"{"activities": [{"id": " ", "kind": "start"}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Schema(_)));
    }
}
