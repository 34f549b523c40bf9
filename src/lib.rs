//! Native draw.io diagram generation.
//!
//! Two halves share this crate:
//!
//! - [`style`] harvests style strings from existing draw.io documents and
//!   shape libraries into a [`StyleLibrary`] persisted as flat JSON.
//! - [`pipeline`] turns a prompt into a `.drawio` file: a [`SpecProvider`]
//!   produces a [`DiagramSpec`], [`GraphBuilder`] lowers it to a graph,
//!   [`layout`](mod@layout) places the nodes and [`DocumentSerializer`] writes the
//!   document with styles resolved from the library.

pub mod config;
pub mod discover;
pub mod document;
pub mod error;
pub mod graph;
pub mod layout;
pub mod pipeline;
pub mod provider;
pub mod schema;
pub mod style;
pub mod xml;

pub use config::Config;
pub use document::{DocumentSerializer, StyleOverrides};
pub use error::{Error, Result};
pub use graph::{Direction, Graph, GraphBuilder};
pub use pipeline::{GenerationRequest, Generator};
pub use provider::{FileProvider, LlmProvider, SpecProvider};
pub use schema::{DiagramKind, DiagramSpec};
pub use style::{HarvestReport, StyleHarvester, StyleLibrary};
