//! pscloud-core: metric aggregation engine for the PS Cloud exporter.
//!
//! Provides:
//! - `document`: defensive navigation over untyped JSON response documents
//! - `source`: backend source adapter boundary and the GraphQL implementation
//! - `processor`: per-domain processors turning documents into gauge values
//! - `metrics`: the metric catalogue and dynamically named quota families
//! - `exporter`: the scrape orchestrator, exposed as a prometheus `Collector`

pub mod document;
pub mod exporter;
pub mod metrics;
pub mod processor;
pub mod source;

pub use exporter::{Exporter, ExporterError, ScrapeConfig};
pub use source::{SourceAdapter, SourceError, SourceKind, SourceResult};

/// Crate version, shared by the exporter binary.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Short git SHA embedded at compile time.
pub const BUILD: &str = env!("GIT_SHA");

/// Version with build id, as printed by `--version`.
pub const LONG_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_SHA"), ")");
