//! Document introspection.
//!
//! Extracts the schema identity embedded in a document head: the DOCTYPE
//! external-subset system identifier, the `verze_ds` version attribute, and
//! the `xsi:schemaLocation` namespace/location pairs. Parsing also serves as
//! the well-formedness gate: the whole input is streamed once up front, so a
//! malformed document fails before any resolution work starts.

use std::collections::HashMap;
use std::sync::OnceLock;

use quick_xml::Reader;
use quick_xml::events::Event;
use regex::Regex;

use crate::error::{Result, ValidateError};
use crate::locator::SchemaReference;

/// XML Schema instance namespace carrying `schemaLocation` attributes.
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Root attribute naming the declared data-standard version.
pub const VERSION_ATTRIBUTE: &str = "verze_ds";

/// Cached regex for the DOCTYPE system identifier.
static SYSTEM_ID_REGEX: OnceLock<Regex> = OnceLock::new();

fn system_id_regex() -> &'static Regex {
    SYSTEM_ID_REGEX.get_or_init(|| {
        Regex::new(r#"(?:SYSTEM|PUBLIC\s+["'][^"']*["'])\s+["']([^"']+)["']"#)
            .expect("Failed to compile DOCTYPE system id regex")
    })
}

/// Schema style of a document, selecting which resolution flow applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaStyle {
    /// One grammar artifact with no namespace partitioning (DTD).
    SingleArtifact,
    /// Cooperating per-namespace artifacts assembled into a composite schema.
    MultiNamespace,
}

/// Schema identity declared by a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaIdentity {
    /// Explicit `xsi:schemaLocation` namespace/location pairs.
    ExplicitReferences(Vec<SchemaReference>),
    /// Declared version code, to be mapped through the version table.
    VersionCode(String),
    /// DOCTYPE external-subset system identifier.
    SystemId(String),
}

/// Parsed document handle: the raw bytes plus the introspected head data.
#[derive(Debug)]
pub struct Document {
    bytes: Vec<u8>,
    system_id: Option<String>,
    root_has_namespace: bool,
    attributes: HashMap<String, String>,
}

impl Document {
    /// Parse a document from raw bytes.
    ///
    /// Only the DOCTYPE declaration and the root element's attributes are
    /// retained; the rest of the stream is consumed to prove
    /// well-formedness.
    pub fn parse(bytes: Vec<u8>) -> Result<Self> {
        let mut reader = Reader::from_reader(bytes.as_slice());
        let mut buf = Vec::new();

        let mut system_id = None;
        let mut attributes = HashMap::new();
        let mut root_has_namespace = false;
        let mut saw_root = false;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::DocType(text)) => {
                    let text = String::from_utf8_lossy(&text).into_owned();
                    if let Some(caps) = system_id_regex().captures(&text) {
                        system_id = Some(caps[1].to_string());
                    }
                }
                Ok(Event::Start(root)) | Ok(Event::Empty(root)) if !saw_root => {
                    saw_root = true;
                    for attribute in root.attributes() {
                        let attribute = attribute.map_err(|e| ValidateError::Parse {
                            details: e.to_string(),
                        })?;
                        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
                        let value = attribute
                            .unescape_value()
                            .map_err(|e| ValidateError::Parse {
                                details: e.to_string(),
                            })?
                            .into_owned();
                        attributes.insert(key, value);
                    }
                    let name = String::from_utf8_lossy(root.name().as_ref()).into_owned();
                    root_has_namespace = attributes.contains_key("xmlns")
                        || name
                            .split_once(':')
                            .is_some_and(|(prefix, _)| attributes.contains_key(&format!("xmlns:{prefix}")));
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => {
                    return Err(ValidateError::Parse {
                        details: e.to_string(),
                    });
                }
            }
            buf.clear();
        }

        if !saw_root {
            return Err(ValidateError::Parse {
                details: "no root element found".to_string(),
            });
        }

        Ok(Self {
            bytes,
            system_id,
            root_has_namespace,
            attributes,
        })
    }

    /// Raw document bytes, as handed to the validation engine.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// DOCTYPE external-subset system identifier, if declared.
    pub fn system_id(&self) -> Option<&str> {
        self.system_id.as_deref()
    }

    /// Root-element attribute lookup by its name as written.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Value of `schemaLocation` under whatever prefix binds the XSI
    /// namespace on the root element.
    fn schema_location(&self) -> Option<&str> {
        let prefix = self.attributes.iter().find_map(|(key, value)| {
            if value == XSI_NAMESPACE {
                key.strip_prefix("xmlns:")
            } else {
                None
            }
        })?;
        self.attribute(&format!("{prefix}:schemaLocation"))
    }

    /// Namespace/location pairs split from `xsi:schemaLocation` in strict
    /// pairs; an odd token count is a malformed-document error, raised
    /// before any network or filesystem access.
    pub fn schema_location_hints(&self) -> Result<Vec<SchemaReference>> {
        let Some(raw) = self.schema_location() else {
            return Ok(Vec::new());
        };
        let tokens: Vec<&str> = raw.split_whitespace().collect();
        if tokens.len() % 2 != 0 {
            return Err(ValidateError::Resolution {
                details: format!(
                    "xsi:schemaLocation holds {} tokens, expected namespace/location pairs",
                    tokens.len()
                ),
            });
        }
        Ok(tokens
            .chunks(2)
            .map(|pair| SchemaReference {
                namespace: Some(pair[0].to_string()),
                location: pair[1].to_string(),
            })
            .collect())
    }

    /// Pick the resolution flow when the caller did not force one.
    pub fn detect_style(&self) -> SchemaStyle {
        if self.system_id.is_some() {
            return SchemaStyle::SingleArtifact;
        }
        if self.schema_location().is_some() || self.root_has_namespace {
            SchemaStyle::MultiNamespace
        } else {
            SchemaStyle::SingleArtifact
        }
    }

    /// Derive the declared schema identity for the given style.
    ///
    /// Single-artifact documents prefer the DOCTYPE system identifier over
    /// the version attribute; multi-namespace documents prefer explicit
    /// `xsi:schemaLocation` pairs. A document exposing none of these cannot
    /// be resolved at all.
    pub fn identify(&self, style: SchemaStyle) -> Result<SchemaIdentity> {
        match style {
            SchemaStyle::SingleArtifact => {
                if let Some(id) = self.system_id() {
                    return Ok(SchemaIdentity::SystemId(id.to_string()));
                }
            }
            SchemaStyle::MultiNamespace => {
                let hints = self.schema_location_hints()?;
                if !hints.is_empty() {
                    return Ok(SchemaIdentity::ExplicitReferences(hints));
                }
            }
        }
        if let Some(code) = self.attribute(VERSION_ATTRIBUTE) {
            return Ok(SchemaIdentity::VersionCode(code.to_string()));
        }
        Err(ValidateError::Resolution {
            details: format!(
                "document declares no system identifier, no {VERSION_ATTRIBUTE} attribute and no schema location"
            ),
        })
    }
}
