//! Harvesting styles from draw.io corpora into a [`StyleLibrary`].

use std::fs;
use std::path::{Path, PathBuf};

use super::library::StyleLibrary;
use super::scan::{RawCell, extract_cells};
use super::{style_pairs, style_value};
use crate::error::Result;

/// Canonical form of a style used as its fingerprint: pairs sorted by
/// case-insensitive key, values trimmed, joined with `;` and terminated by
/// `;`. The order of distinct keys does not matter; repeated keys keep their
/// relative order.
pub fn normalize(style: &str) -> String {
    let mut pairs: Vec<(&str, &str)> = style_pairs(style)
        .into_iter()
        .map(|(k, v)| (k.trim(), v.trim()))
        .filter(|(k, _)| !k.is_empty())
        .collect();
    // Stable, so repeated keys keep their source order.
    pairs.sort_by_key(|(key, _)| key.to_lowercase());

    let mut out = String::with_capacity(style.len());
    for (key, value) in pairs {
        out.push_str(key);
        out.push('=');
        out.push_str(value);
        out.push(';');
    }
    out
}

/// Picks a readable base key for a style.
///
/// - `shape=mxgraph.er.entity` → `er.entity`
/// - `shape=ellipse` → `shape.ellipse`
/// - `edgeStyle=entityRelationEdgeStyle` → `edge.entityRelation`
/// - `endArrow=block` → `edge.block`
/// - otherwise `shape.rect` or `edge.orthogonal`
pub fn classify(style: &str, is_edge: bool) -> String {
    if !is_edge {
        return match style_value(style, "shape") {
            Some(shape) if shape.starts_with("mxgraph.") => shape["mxgraph.".len()..].to_string(),
            Some(shape) if !shape.is_empty() => format!("shape.{shape}"),
            _ => "shape.rect".to_string(),
        };
    }

    if let Some(edge_style) = style_value(style, "edgeStyle").filter(|v| !v.is_empty()) {
        let name = edge_style.strip_suffix("EdgeStyle").unwrap_or(edge_style);
        return format!("edge.{name}");
    }
    let arrow = style_value(style, "endArrow")
        .filter(|v| !v.is_empty())
        .or_else(|| style_value(style, "startArrow").filter(|v| !v.is_empty()));
    match arrow {
        Some(arrow) => format!("edge.{arrow}"),
        None => "edge.orthogonal".to_string(),
    }
}

/// Lowercases a key and collapses every run of characters outside
/// `[a-z0-9_.-]` into one `-`. Never returns an empty key.
pub fn sanitize_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for c in key.trim().to_lowercase().chars() {
        let allowed = c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '_' | '.' | '-');
        let c = if allowed { c } else { '-' };
        if c == '-' && out.ends_with('-') {
            continue;
        }
        out.push(c);
    }

    let trimmed = out.trim_matches('-');
    if trimmed.is_empty() {
        "style".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Inserts `style` under a key derived from `base_key` and returns the key
/// that now holds it.
///
/// A style whose fingerprint already exists in the library is not inserted
/// again; the existing key is returned. Otherwise the sanitized key is used
/// if free, or the first free `-1`, `-2`, ... suffix.
pub fn insert_unique(library: &mut StyleLibrary, base_key: &str, style: &str) -> String {
    let fingerprint = normalize(style);
    if let Some(existing) = library.key_for_fingerprint(&fingerprint) {
        return existing.to_string();
    }

    let key = sanitize_key(base_key);
    if !library.contains_key(&key) {
        library.insert_entry(key.clone(), style.to_string());
        return key;
    }

    let mut i = 1usize;
    loop {
        let candidate = format!("{key}-{i}");
        match library.get(&candidate) {
            Some(existing) if normalize(existing) == fingerprint => return candidate,
            Some(_) => i += 1,
            None => {
                library.insert_entry(candidate.clone(), style.to_string());
                return candidate;
            }
        }
    }
}

/// Counters and the resulting library of a harvesting run.
#[derive(Debug)]
pub struct HarvestReport {
    pub files: usize,
    pub files_with_styles: usize,
    pub cells: usize,
    pub failed_files: usize,
    pub library: StyleLibrary,
}

/// Accumulates styles from many documents into one library.
///
/// The library is handed in at construction and handed back by
/// [`StyleHarvester::finish`]; the harvester is its only writer meanwhile.
pub struct StyleHarvester {
    library: StyleLibrary,
    files: usize,
    files_with_styles: usize,
    cells: usize,
    failed_files: usize,
}

impl Default for StyleHarvester {
    fn default() -> Self {
        Self::new(StyleLibrary::new())
    }
}

impl StyleHarvester {
    pub fn new(library: StyleLibrary) -> Self {
        Self {
            library,
            files: 0,
            files_with_styles: 0,
            cells: 0,
            failed_files: 0,
        }
    }

    /// Classifies and inserts the given cells. Returns how many were seen.
    pub fn add_cells(&mut self, cells: &[RawCell]) -> usize {
        for cell in cells {
            let base_key = classify(&cell.style, cell.is_edge);
            let key = insert_unique(&mut self.library, &base_key, &cell.style);
            log::trace!(key = key.as_str(), edge = cell.is_edge; "Harvested style");
        }
        self.cells += cells.len();
        cells.len()
    }

    /// Scans raw document text. Never fails.
    pub fn harvest_text(&mut self, text: &str) -> usize {
        let cells = extract_cells(text);
        self.files += 1;
        if !cells.is_empty() {
            self.files_with_styles += 1;
        }
        self.add_cells(&cells)
    }

    /// Reads one file (invalid UTF-8 is decoded lossily) and scans it.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Io`] if the file cannot be read.
    pub fn harvest_file(&mut self, path: &Path) -> Result<usize> {
        let bytes = fs::read(path)?;
        let text = String::from_utf8_lossy(&bytes);
        let count = self.harvest_text(&text);
        log::debug!(path:? = path, cells = count; "Scanned file");
        Ok(count)
    }

    /// Harvests every file, skipping the ones that cannot be read.
    pub fn harvest_files(&mut self, files: &[PathBuf]) {
        for path in files {
            if let Err(err) = self.harvest_file(path) {
                self.failed_files += 1;
                log::debug!(path:? = path, error:% = err; "Skipping unreadable file");
            }
        }
    }

    pub fn finish(self) -> HarvestReport {
        HarvestReport {
            files: self.files,
            files_with_styles: self.files_with_styles,
            cells: self.cells,
            failed_files: self.failed_files,
            library: self.library,
        }
    }
}
