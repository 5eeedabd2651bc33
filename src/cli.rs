use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::document::SchemaStyle;

/// Default remote repository base for schema files.
pub const DEFAULT_SCHEMA_URL: &str = "http://ciselniky.dasta.mzcr.cz/CD_DS3/dtd/historie/";

/// Default version mapping page.
pub const DEFAULT_TABLE_URL: &str = "http://ciselniky.dasta.mzcr.cz/hypertext/verze_ds.htm";

/// Schema style selection on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StyleArg {
    /// Pick by document shape: a DOCTYPE or a bare root selects dtd,
    /// a namespaced root or schemaLocation selects xsd
    Auto,
    /// Single DTD artifact
    Dtd,
    /// Per-namespace XML Schema set
    Xsd,
}

/// Validate a DASTA document against the schema resolved for its declared version
#[derive(Parser, Debug, Clone)]
#[command(name = "validate-dasta")]
#[command(about = "Validate a DASTA document against its version-appropriate DTD or XML Schema set")]
#[command(version)]
pub struct Cli {
    /// Document to validate; use '-' for standard input
    pub src: PathBuf,

    /// Explicit schema file to validate against, skipping resolution
    #[arg(long = "schema")]
    pub schema_file: Option<PathBuf>,

    /// Local directory searched for schema files
    #[arg(long = "schema-dir", default_value = "./schema")]
    pub schema_dir: PathBuf,

    /// Remote repository base URL for schema files
    #[arg(long = "schema-url", default_value = DEFAULT_SCHEMA_URL)]
    pub schema_url: String,

    /// Version mapping page URL
    #[arg(long = "table-url", default_value = DEFAULT_TABLE_URL)]
    pub table_url: String,

    /// Schema style
    #[arg(long = "style", value_enum, default_value = "auto")]
    pub style: StyleArg,

    /// Network timeout in seconds for schema and mapping-page fetches
    #[arg(long = "timeout", default_value = "30")]
    pub timeout: u64,

    /// Increase diagnostic detail (repeatable, up to -vvv)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Main application configuration derived from CLI.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub src: PathBuf,
    pub schema_file: Option<PathBuf>,
    pub schema_dir: PathBuf,
    pub schema_url: String,
    pub table_url: String,
    /// None means auto-detect from the document shape.
    pub style: Option<SchemaStyle>,
    pub timeout_seconds: u64,
    pub verbosity: u8,
}

impl Config {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            src: cli.src.clone(),
            schema_file: cli.schema_file.clone(),
            schema_dir: cli.schema_dir.clone(),
            schema_url: cli.schema_url.clone(),
            table_url: cli.table_url.clone(),
            style: match cli.style {
                StyleArg::Auto => None,
                StyleArg::Dtd => Some(SchemaStyle::SingleArtifact),
                StyleArg::Xsd => Some(SchemaStyle::MultiNamespace),
            },
            timeout_seconds: cli.timeout,
            verbosity: cli.verbose.min(3),
        }
    }
}
