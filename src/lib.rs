//! # validate-dasta Library
//!
//! Validates DASTA medical-exchange documents against the DTD or XML Schema
//! set resolved for their declared version. The schema artifact is never
//! named outright: it is found through an ordered chain of sources (explicit
//! override, local path, schema directory, the remote version mapping table
//! and repository) with a safe empty fallback, then handed to libxml2 for
//! the actual validation.

pub mod assembler;
pub mod cli;
pub mod coordinator;
pub mod document;
pub mod error;
pub mod http_client;
pub mod libxml2;
pub mod locator;
pub mod output;
pub mod version_table;

pub use assembler::{CompositeSchema, assemble, target_namespace};
pub use cli::{Cli, Config, DEFAULT_SCHEMA_URL, DEFAULT_TABLE_URL, StyleArg};
pub use coordinator::{
    EngineReport, SchemaArtifact, ValidationCoordinator, ValidationEngine, ValidationOutcome,
};
pub use document::{Document, SchemaIdentity, SchemaStyle};
pub use error::ValidateError;
pub use http_client::{HttpClient, HttpClientConfig};
pub use libxml2::LibXml2Engine;
pub use locator::{ArtifactOrigin, ResolvedArtifact, SchemaReference, SourceLocator};
pub use output::Diagnostics;
pub use version_table::{
    HttpVersionTable, MappingTable, StaticVersionTable, VersionTableClient, VersionTableSource,
};
