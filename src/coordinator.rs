//! Validation orchestration.
//!
//! One linear pass per document:
//! Start -> Parsed -> Identified -> Resolved -> Validated | Failed.
//! Parse failures and underivable identities are terminal errors; an
//! exhausted resolution chain becomes the `NotResolvable` outcome, kept
//! strictly apart from a validation pass.

use serde::{Deserialize, Serialize};

use crate::assembler;
use crate::document::{Document, SchemaIdentity, SchemaStyle};
use crate::error::Result;
use crate::locator::{ResolvedArtifact, SchemaReference, SourceLocator};
use crate::output::Diagnostics;
use crate::version_table::{self, VersionTableClient};

/// Grammar handed to the validation engine.
#[derive(Debug, Clone)]
pub enum SchemaArtifact {
    /// Raw DTD bytes; zero length means "no constraints".
    Dtd(Vec<u8>),
    /// Assembled composite XML Schema text.
    Xsd(String),
}

/// Engine verdict for one document/grammar pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineReport {
    pub valid: bool,
    pub diagnostics: Vec<String>,
}

/// External validation engine seam.
pub trait ValidationEngine {
    fn validate(&self, document: &[u8], artifact: &SchemaArtifact) -> Result<EngineReport>;
}

/// Final outcome of one validation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationOutcome {
    Valid,
    Invalid { diagnostics: Vec<String> },
    /// No usable schema could be located; distinct from a validation pass.
    NotResolvable { detail: String },
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationOutcome::Valid)
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            ValidationOutcome::Valid => 0,
            ValidationOutcome::Invalid { .. } => 1,
            ValidationOutcome::NotResolvable { .. } => 2,
        }
    }
}

/// Drives introspection, resolution, assembly and validation for one
/// document.
pub struct ValidationCoordinator {
    locator: SourceLocator,
    versions: VersionTableClient,
    engine: Box<dyn ValidationEngine>,
    /// None means auto-detect from the document shape.
    style: Option<SchemaStyle>,
}

impl ValidationCoordinator {
    pub fn new(
        locator: SourceLocator,
        versions: VersionTableClient,
        engine: Box<dyn ValidationEngine>,
        style: Option<SchemaStyle>,
    ) -> Self {
        Self {
            locator,
            versions,
            engine,
            style,
        }
    }

    /// Validate one document.
    pub async fn run(&self, bytes: Vec<u8>, diag: &Diagnostics) -> Result<ValidationOutcome> {
        let document = Document::parse(bytes)?;
        diag.say(1, "document parsed");

        let style = self.style.unwrap_or_else(|| document.detect_style());

        // An explicit override names the schema outright; the document's own
        // identity is not consulted.
        let set = if self.locator.has_explicit_override() {
            let artifact = self.locator.resolve("", diag).await?;
            vec![(
                SchemaReference {
                    namespace: None,
                    location: artifact.location.clone(),
                },
                artifact,
            )]
        } else {
            let identity = document.identify(style)?;
            self.resolve(style, &identity, diag).await?
        };
        self.validate(&document, style, set, diag)
    }

    async fn resolve(
        &self,
        style: SchemaStyle,
        identity: &SchemaIdentity,
        diag: &Diagnostics,
    ) -> Result<Vec<(SchemaReference, ResolvedArtifact)>> {
        match identity {
            SchemaIdentity::SystemId(id) => {
                diag.say(2, &format!("system identifier {id}"));
                let artifact = self.locator.resolve(id, diag).await?;
                Ok(vec![(
                    SchemaReference {
                        namespace: None,
                        location: id.clone(),
                    },
                    artifact,
                )])
            }
            SchemaIdentity::VersionCode(code) => {
                diag.say(2, &format!("declared version {code}"));
                let entries = self.versions.lookup(code, diag).await;
                match style {
                    SchemaStyle::SingleArtifact => {
                        let file = entries
                            .last()
                            .and_then(|entry| version_table::dtd_file_name(entry))
                            .unwrap_or_else(|| version_table::dtd_name_from_version(code));
                        diag.say(2, &format!("version {code} maps to {file}"));
                        let artifact = self.locator.resolve(&file, diag).await?;
                        Ok(vec![(
                            SchemaReference {
                                namespace: None,
                                location: file,
                            },
                            artifact,
                        )])
                    }
                    SchemaStyle::MultiNamespace => {
                        let mut set = Vec::new();
                        for entry in &entries {
                            let artifact = self.locator.resolve(entry, diag).await?;
                            if artifact.is_empty_fallback() {
                                diag.say(1, &format!("schema {entry} not found, skipping"));
                                continue;
                            }
                            match assembler::target_namespace(&artifact.content, entry) {
                                Ok(namespace) => {
                                    diag.say(
                                        2,
                                        &format!(
                                            "XML schema involved: ns={}, uri={}",
                                            namespace.as_deref().unwrap_or("-"),
                                            artifact.location
                                        ),
                                    );
                                    set.push((
                                        SchemaReference {
                                            namespace,
                                            location: artifact.location.clone(),
                                        },
                                        artifact,
                                    ));
                                }
                                Err(err) => {
                                    diag.say(1, &format!("schema {entry} skipped: {err}"));
                                }
                            }
                        }
                        Ok(set)
                    }
                }
            }
            SchemaIdentity::ExplicitReferences(references) => {
                let mut set = Vec::new();
                for reference in references {
                    let artifact = self.locator.resolve(&reference.location, diag).await?;
                    diag.say(
                        2,
                        &format!(
                            "XML schema involved: ns={}, uri={}",
                            reference.namespace.as_deref().unwrap_or("-"),
                            artifact.location
                        ),
                    );
                    set.push((reference.clone(), artifact));
                }
                Ok(set)
            }
        }
    }

    fn validate(
        &self,
        document: &Document,
        style: SchemaStyle,
        set: Vec<(SchemaReference, ResolvedArtifact)>,
        diag: &Diagnostics,
    ) -> Result<ValidationOutcome> {
        match style {
            SchemaStyle::SingleArtifact => {
                let Some((reference, artifact)) = set.into_iter().next() else {
                    return Ok(ValidationOutcome::NotResolvable {
                        detail: "no schema located".to_string(),
                    });
                };
                if artifact.is_empty_fallback() {
                    return Ok(ValidationOutcome::NotResolvable {
                        detail: format!("schema {} not found in any source", reference.location),
                    });
                }
                diag.say(2, &format!("resolved {} via {}", reference.location, artifact.origin));
                let report = self
                    .engine
                    .validate(document.bytes(), &SchemaArtifact::Dtd(artifact.content))?;
                Ok(outcome_from_report(report, diag))
            }
            SchemaStyle::MultiNamespace => {
                let composite = assembler::assemble(&set)?;
                diag.say(3, composite.text());
                if composite.imports() == 0 {
                    return Ok(ValidationOutcome::NotResolvable {
                        detail: "no schema located".to_string(),
                    });
                }
                let report = self
                    .engine
                    .validate(document.bytes(), &SchemaArtifact::Xsd(composite.into_text()))?;
                Ok(outcome_from_report(report, diag))
            }
        }
    }
}

fn outcome_from_report(report: EngineReport, diag: &Diagnostics) -> ValidationOutcome {
    if report.valid {
        ValidationOutcome::Valid
    } else {
        for detail in &report.diagnostics {
            diag.say(3, detail);
        }
        ValidationOutcome::Invalid {
            diagnostics: report.diagnostics,
        }
    }
}
