//! Prompt-to-document generation.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use sha2::{Digest, Sha256};

use crate::document::{DocumentSerializer, StyleOverrides};
use crate::error::{Error, Result};
use crate::graph::{Direction, GraphBuilder};
use crate::layout::layout;
use crate::provider::SpecProvider;
use crate::schema::DiagramKind;
use crate::style::StyleLibrary;

/// Everything one generation run needs besides the provider.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    /// `None` infers the kind from the prompt.
    pub kind: Option<DiagramKind>,
    pub direction: Option<Direction>,
    /// Output path without extension.
    pub out: PathBuf,
    pub add_hash: bool,
    pub styles: Option<PathBuf>,
    pub overrides: StyleOverrides,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            kind: None,
            direction: None,
            out: PathBuf::from("diagram"),
            add_hash: true,
            styles: None,
            overrides: StyleOverrides::default(),
        }
    }
}

pub struct Generator<P> {
    provider: P,
    page_id: Option<String>,
}

impl<P: SpecProvider> Generator<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            page_id: None,
        }
    }

    /// Fixes the page id written into documents.
    pub fn with_page_id(mut self, page_id: impl Into<String>) -> Self {
        self.page_id = Some(page_id.into());
        self
    }

    /// Runs the whole pipeline and returns the written file's path.
    ///
    /// Nothing is written unless every step succeeds.
    ///
    /// # Errors
    ///
    /// Propagates provider, schema, style library and I/O failures.
    pub fn run(&self, request: &GenerationRequest) -> Result<PathBuf> {
        let kind = request.kind.unwrap_or_else(|| {
            let inferred = DiagramKind::infer(&request.prompt);
            log::info!(kind = inferred.as_str(); "Inferred diagram kind from prompt");
            inferred
        });

        let library = match &request.styles {
            Some(path) => StyleLibrary::load(path)?,
            None => StyleLibrary::new(),
        };

        let spec = self.provider.provide(&request.prompt, kind)?;
        log::info!(kind = kind.as_str(); "Specification ready");

        let graph = GraphBuilder::build(&spec);
        let layout = layout(&graph, request.direction);

        let mut serializer = DocumentSerializer::new(&library, &request.overrides);
        if let Some(page_id) = &self.page_id {
            serializer = serializer.with_page_id(page_id.as_str());
        }
        let document = serializer.serialize(&graph, &layout, kind);

        let path = if request.add_hash {
            hashed_output_path(&request.out, &output_hash(&request.prompt, kind))
        } else {
            request.out.with_extension("drawio")
        };
        fs::write(&path, document).map_err(|e| {
            Error::Io(io::Error::new(
                e.kind(),
                format!("Failed to write {}: {}", path.display(), e),
            ))
        })?;
        log::info!(path:? = path, nodes = graph.nodes().len(), edges = graph.edges().len(); "Diagram written");
        Ok(path)
    }
}

/// First 8 hex digits of SHA-256 over `prompt|kind|unix-nanos`.
fn output_hash(prompt: &str, kind: DiagramKind) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let digest = Sha256::digest(format!("{prompt}|{kind}|{nanos}").as_bytes());
    let hex = format!("{digest:x}");
    hex[..8].to_string()
}

/// `out/diagram` + `1a2b3c4d` → `out/diagram_1a2b3c4d.drawio`
fn hashed_output_path(prefix: &Path, hash: &str) -> PathBuf {
    let stem = prefix.with_extension("");
    let name = stem
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "diagram".to_string());
    stem.with_file_name(format!("{name}_{hash}.drawio"))
}
