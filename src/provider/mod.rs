//! Sources of structured diagram descriptions.
//!
//! A provider turns a free-text prompt into a validated [`DiagramSpec`] for
//! a given [`DiagramKind`]. [`LlmProvider`] asks a language model;
//! [`FileProvider`] reads a prepared JSON document.

mod llm;

pub use llm::{DEFAULT_MODEL, LlmProvider};

use std::fs;
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::schema::{DiagramKind, DiagramSpec};

pub trait SpecProvider {
    /// # Errors
    ///
    /// Transport failures are [`Error::Provider`]; replies that do not fit
    /// the kind's schema are [`Error::Schema`].
    fn provide(&self, prompt: &str, kind: DiagramKind) -> Result<DiagramSpec>;
}

/// Cuts the JSON object out of a model reply: drops a surrounding code
/// fence (with or without a `json` tag) and keeps the outermost `{ ... }`.
///
/// # Errors
///
/// Returns [`Error::Schema`] when the text holds no object.
pub fn strip_to_json(text: &str) -> Result<&str> {
    let mut body = text.trim();
    if body.starts_with("```") {
        body = body.trim_matches('`');
        if body
            .get(..4)
            .is_some_and(|tag| tag.eq_ignore_ascii_case("json"))
        {
            body = body[4..].trim_start();
        }
    }

    match (body.find('{'), body.rfind('}')) {
        (Some(start), Some(end)) if end > start => Ok(&body[start..=end]),
        _ => Err(Error::schema("provider reply contains no JSON object")),
    }
}

/// Extracts and parses a provider reply as `kind`.
///
/// # Errors
///
/// Returns [`Error::Schema`] if no JSON object is found or it does not
/// validate.
pub fn parse_spec(kind: DiagramKind, text: &str) -> Result<DiagramSpec> {
    let json = strip_to_json(text)?;
    DiagramSpec::from_json(kind, json)
}

/// Reads the description from a JSON file; the prompt is only used for
/// naming the output.
#[derive(Debug, Clone)]
pub struct FileProvider {
    path: PathBuf,
}

impl FileProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SpecProvider for FileProvider {
    fn provide(&self, _prompt: &str, kind: DiagramKind) -> Result<DiagramSpec> {
        let text = fs::read_to_string(&self.path).map_err(|e| {
            Error::Input(format!(
                "Failed to read specification file {}: {}",
                self.path.display(),
                e
            ))
        })?;
        log::debug!(path:? = self.path, kind = kind.as_str(); "Loaded specification file");
        parse_spec(kind, &text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_plain_object() {
        assert_eq!(strip_to_json(r#"{"a": 1}"#).unwrap(), r#"{"a": 1}"#);
    }

    #[test]
    fn test_strip_code_fence_and_tag() {
        let reply = "```json\n{\"nodes\": []}\n```";
        assert_eq!(strip_to_json(reply).unwrap(), "{\"nodes\": []}");

        let reply = "```JSON\n{\"x\": {\"y\": 2}}\n```";
        assert_eq!(strip_to_json(reply).unwrap(), "{\"x\": {\"y\": 2}}");
    }

    #[test]
    fn test_strip_surrounding_chatter() {
        let reply = "Sure! Here it is: {\"title\": \"T\"} Hope that helps.";
        assert_eq!(strip_to_json(reply).unwrap(), "{\"title\": \"T\"}");
    }

    #[test]
    fn test_strip_without_object_is_schema_error() {
        assert!(matches!(strip_to_json("no json here"), Err(Error::Schema(_))));
        assert!(matches!(strip_to_json("} backwards {"), Err(Error::Schema(_))));
    }

    #[test]
    fn test_parse_spec_validates_kind() {
        let spec = parse_spec(DiagramKind::Sequence, "```\n{\"participants\": [\"A\"]}\n```").unwrap();
        assert_eq!(spec.kind(), DiagramKind::Sequence);

        let err = parse_spec(DiagramKind::Generic, r#"{"nodes": "oops"}"#).unwrap_err();
        assert!(matches!(err, Error::Schema(_)));
    }

    #[test]
    fn test_file_provider_reads_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spec.json");
        fs::write(&path, r#"{"actors": ["User"], "usecases": ["Login"]}"#).unwrap();

        let spec = FileProvider::new(&path)
            .provide("ignored", DiagramKind::UseCase)
            .unwrap();
        let DiagramSpec::UseCase(u) = spec else {
            panic!("Expected use case spec");
        };
        assert_eq!(u.actors, vec!["User"]);
    }

    #[test]
    fn test_file_provider_missing_file_is_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileProvider::new(dir.path().join("missing.json"))
            .provide("x", DiagramKind::Er)
            .unwrap_err();
        assert!(matches!(err, Error::Input(_)));
    }
}
