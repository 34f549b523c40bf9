//! Best-effort scanner for draw.io documents.
//!
//! This is deliberately not an XML parser. It looks for `<mxCell ...>` opening
//! tags and `<mxlibrary>` payloads with plain patterns, so truncated files,
//! unbalanced tags and stray bytes still yield whatever cells are readable.
//! Nothing here guarantees the input was well formed.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::xml::decode_entities;

static MXCELL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<mxCell([^>]*)>").expect("mxCell pattern is valid"));
static STYLE_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:^|\s)style\s*=\s*"([^"]*)""#).expect("style attribute pattern is valid")
});
static EDGE_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:^|\s)edge\s*=\s*"1""#).expect("edge attribute pattern is valid")
});
static MXLIBRARY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<mxlibrary>(.*?)</mxlibrary>").expect("mxlibrary pattern is valid")
});

/// A style string found on one cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCell {
    pub style: String,
    pub is_edge: bool,
}

/// Extracts every styled cell from raw document text, including the
/// mini-graphs embedded in `<mxlibrary>` JSON payloads.
pub fn extract_cells(text: &str) -> Vec<RawCell> {
    let mut cells = extract_cell_tags(text);
    for payload in MXLIBRARY_RE.captures_iter(text) {
        if let Some(body) = payload.get(1) {
            cells.extend(extract_library_payload(body.as_str()));
        }
    }
    cells
}

fn extract_cell_tags(text: &str) -> Vec<RawCell> {
    let mut cells = Vec::new();
    for tag in MXCELL_RE.captures_iter(text) {
        let Some(attrs) = tag.get(1).map(|m| m.as_str()) else {
            continue;
        };
        let Some(style) = STYLE_ATTR_RE.captures(attrs).and_then(|c| c.get(1)) else {
            continue;
        };
        let style = decode_entities(style.as_str()).trim().to_string();
        if style.is_empty() {
            continue;
        }
        cells.push(RawCell {
            style,
            is_edge: EDGE_ATTR_RE.is_match(attrs),
        });
    }
    cells
}

/// A library payload is a JSON array whose items carry an `xml` string with a
/// miniature diagram. Each of those goes back through [`extract_cells`].
fn extract_library_payload(body: &str) -> Vec<RawCell> {
    let json = decode_entities(body);
    let items: Vec<Value> = match serde_json::from_str(json.trim()) {
        Ok(Value::Array(items)) => items,
        Ok(_) => {
            log::debug!("Library payload is not a JSON array, skipping");
            return Vec::new();
        }
        Err(err) => {
            log::debug!(error:% = err; "Library payload is not valid JSON, skipping");
            return Vec::new();
        }
    };

    items
        .iter()
        .filter_map(|item| item.get("xml").and_then(Value::as_str))
        .flat_map(extract_cells)
        .collect()
}
