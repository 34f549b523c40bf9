//! Persisted style library and reference resolution.
//!
//! The library file is a flat JSON object mapping a readable key
//! (`uml.class`, `edge.entityrelation`, `shape.ellipse-2`, ...) to a draw.io
//! style string. Entry order is preserved from the file and is part of the
//! lookup contract: [`StyleLibrary::find_best_match`] returns the first hit.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;

use indexmap::IndexMap;
use serde_json::Value;

use super::harvest::normalize;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Default)]
pub struct StyleLibrary {
    entries: IndexMap<String, String>,
    /// Normalized style → first key holding it.
    fingerprints: HashMap<String, String>,
}

impl StyleLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a library file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the file cannot be read or is not a flat
    /// JSON object of string values.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Failed to read style library {}: {}",
                path.display(),
                e
            ))
        })?;
        let library = Self::from_json(&content)
            .map_err(|e| Error::config(format!("{}: {}", path.display(), e)))?;
        log::debug!(path:? = path, entries = library.len(); "Loaded style library");
        Ok(library)
    }

    /// Parses library JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the text is not a flat object of strings.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: IndexMap<String, Value> = serde_json::from_str(json)
            .map_err(|e| Error::config(format!("style library is not a JSON object: {e}")))?;

        let mut library = Self::new();
        for (key, value) in raw {
            match value {
                Value::String(style) => library.insert_entry(key, style),
                other => {
                    return Err(Error::config(format!(
                        "style library entry `{key}` is not a string: {other}"
                    )));
                }
            }
        }
        Ok(library)
    }

    /// Serializes the library as pretty-printed JSON, keeping entry order.
    pub fn to_json(&self) -> String {
        // A map of strings to strings always serializes.
        serde_json::to_string_pretty(&self.entries).unwrap_or_else(|_| "{}".to_string())
    }

    /// Writes the library file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be written.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.to_json()).map_err(|e| {
            Error::Io(io::Error::new(
                e.kind(),
                format!("Failed to write {}: {}", path.display(), e),
            ))
        })?;
        log::info!(path:? = path, entries = self.len(); "Style library written");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Entries in library order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Key of the first entry whose normalized style equals `fingerprint`.
    pub(crate) fn key_for_fingerprint(&self, fingerprint: &str) -> Option<&str> {
        self.fingerprints.get(fingerprint).map(String::as_str)
    }

    pub(crate) fn insert_entry(&mut self, key: String, style: String) {
        self.fingerprints
            .entry(normalize(&style))
            .or_insert_with(|| key.clone());
        self.entries.insert(key, style);
    }

    /// Resolves a style reference.
    ///
    /// A reference that starts with `shape=` or contains `;` is a literal style
    /// and comes back unchanged. Anything else is looked up as an exact key.
    pub fn resolve<'a>(&'a self, reference: &'a str) -> Option<&'a str> {
        let reference = reference.trim();
        if reference.is_empty() {
            return None;
        }
        if is_literal_style(reference) {
            return Some(reference);
        }
        self.get(reference)
    }

    /// Returns the style of the first key, in library order, that contains
    /// every `include` token and none of the `exclude` tokens. Matching is a
    /// case-insensitive substring test.
    pub fn find_best_match(&self, include: &[&str], exclude: &[&str]) -> Option<&str> {
        let include: Vec<String> = include.iter().map(|t| t.to_lowercase()).collect();
        let exclude: Vec<String> = exclude.iter().map(|t| t.to_lowercase()).collect();

        self.entries
            .iter()
            .find(|(key, _)| {
                let key = key.to_lowercase();
                include.iter().all(|tok| key.contains(tok.as_str()))
                    && !exclude.iter().any(|tok| key.contains(tok.as_str()))
            })
            .map(|(_, style)| style.as_str())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for StyleLibrary {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut library = Self::new();
        for (key, style) in iter {
            library.insert_entry(key.into(), style.into());
        }
        library
    }
}

fn is_literal_style(reference: &str) -> bool {
    reference.to_ascii_lowercase().starts_with("shape=") || reference.contains(';')
}

/// Appends `flag` (for example `html=1`) unless the style already carries it
/// as a whole pair.
pub fn ensure_flag(style: &str, flag: &str) -> String {
    if style.split(';').any(|pair| pair.trim() == flag) {
        return style.to_string();
    }
    let base = style.trim_end_matches(';');
    if base.trim().is_empty() {
        format!("{flag};")
    } else {
        format!("{base};{flag};")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> StyleLibrary {
        [
            ("uml.class", "swimlane;fontStyle=1;"),
            ("er.entity", "shape=table;startSize=30;"),
            ("edge.entityrelation", "edgeStyle=entityRelationEdgeStyle;"),
            ("er.entity-2", "shape=table;startSize=40;"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_load_flat_library() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("styles.json");
        fs::write(&path, r#"{"b.key": "rounded=1;", "a.key": "ellipse;"}"#).unwrap();

        let library = StyleLibrary::load(&path).unwrap();
        let keys: Vec<&str> = library.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b.key", "a.key"]);
        assert_eq!(library.get("a.key"), Some("ellipse;"));
    }

    #[test]
    fn test_load_missing_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = StyleLibrary::load(dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, Error::Config(_)), "got {err:?}");
    }

    #[test]
    fn test_load_rejects_non_flat_json() {
        assert!(matches!(
            StyleLibrary::from_json(r#"["shape=rect;"]"#),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            StyleLibrary::from_json(r#"{"a": {"nested": "x"}}"#),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            StyleLibrary::from_json(r#"{"a": 1}"#),
            Err(Error::Config(_))
        ));
        assert!(matches!(StyleLibrary::from_json("not json"), Err(Error::Config(_))));
    }

    #[test]
    fn test_save_roundtrip_keeps_order_and_unicode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        let library: StyleLibrary = [("z", "label=Ação;"), ("a", "rounded=1;")]
            .into_iter()
            .collect();
        library.save(&path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("Ação"));
        assert!(text.starts_with("{\n  \"z\""));

        let loaded = StyleLibrary::load(&path).unwrap();
        let keys: Vec<&str> = loaded.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["z", "a"]);
    }

    #[test]
    fn test_resolve_literal_key_and_missing() {
        let library = sample();
        assert_eq!(library.resolve("shape=rect;"), Some("shape=rect;"));
        assert_eq!(library.resolve("  Shape=ellipse"), Some("Shape=ellipse"));
        assert_eq!(library.resolve("rounded=1;html=1"), Some("rounded=1;html=1"));
        assert_eq!(library.resolve("uml.class"), Some("swimlane;fontStyle=1;"));
        assert_eq!(library.resolve("uml.missing"), None);
        assert_eq!(library.resolve("   "), None);
    }

    #[test]
    fn test_best_match_is_first_in_library_order() {
        let library = sample();
        assert_eq!(
            library.find_best_match(&["ENTITY"], &[]),
            Some("shape=table;startSize=30;")
        );
        assert_eq!(
            library.find_best_match(&["entity"], &["er."]),
            Some("edgeStyle=entityRelationEdgeStyle;")
        );
        assert_eq!(
            library.find_best_match(&["er.", "entity"], &["edge"]),
            Some("shape=table;startSize=30;")
        );
        assert_eq!(library.find_best_match(&["actor"], &[]), None);
    }

    #[test]
    fn test_ensure_flag_is_idempotent() {
        assert_eq!(ensure_flag("rounded=1", "html=1"), "rounded=1;html=1;");
        assert_eq!(ensure_flag("rounded=1;", "html=1"), "rounded=1;html=1;");
        let once = ensure_flag("rounded=1;", "html=1");
        assert_eq!(ensure_flag(&once, "html=1"), once);
        assert_eq!(ensure_flag("html=1;rounded=1;", "html=1"), "html=1;rounded=1;");
        assert_eq!(ensure_flag("", "html=1"), "html=1;");
    }

    #[test]
    fn test_ensure_flag_requires_whole_pair() {
        assert_eq!(ensure_flag("xhtml=1;", "html=1"), "xhtml=1;html=1;");
        assert_eq!(ensure_flag("html=10;", "html=1"), "html=10;html=1;");
    }
}
