//! Composite schema assembly.

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, Event};

use crate::error::{Result, ValidateError};
use crate::locator::{ResolvedArtifact, SchemaReference};

/// XML Schema namespace of the composite root.
pub const XML_SCHEMA_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

/// One synthetic schema document importing each resolved per-namespace
/// schema.
#[derive(Debug, Clone)]
pub struct CompositeSchema {
    text: String,
    imports: usize,
}

impl CompositeSchema {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }

    pub fn imports(&self) -> usize {
        self.imports
    }
}

/// Build the composite schema for a resolved schema set, preserving input
/// order.
///
/// Each import's location is the artifact's local path or remote URL so the
/// validation engine can re-resolve it. Empty-fallback artifacts have no
/// such location and are left out; a composite without imports validates
/// anything, which the caller reports as "no schema located".
pub fn assemble(references: &[(SchemaReference, ResolvedArtifact)]) -> Result<CompositeSchema> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    let mut root = BytesStart::new("schema");
    root.push_attribute(("xmlns", XML_SCHEMA_NAMESPACE));
    root.push_attribute(("elementFormDefault", "qualified"));
    root.push_attribute(("version", "1.0.0"));
    writer.write_event(Event::Start(root))?;

    let mut imports = 0;
    for (reference, artifact) in references {
        if artifact.is_empty_fallback() {
            continue;
        }
        let mut import = BytesStart::new("import");
        if let Some(namespace) = &reference.namespace {
            import.push_attribute(("namespace", namespace.as_str()));
        }
        import.push_attribute(("schemaLocation", artifact.location.as_str()));
        writer.write_event(Event::Empty(import))?;
        imports += 1;
    }

    writer.write_event(Event::End(BytesEnd::new("schema")))?;

    let text = String::from_utf8(writer.into_inner())?;
    Ok(CompositeSchema { text, imports })
}

/// Read the `targetNamespace` declared by a schema document's root element.
pub fn target_namespace(content: &[u8], source: &str) -> Result<Option<String>> {
    let mut reader = Reader::from_reader(content);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(root)) | Ok(Event::Empty(root)) => {
                for attribute in root.attributes() {
                    let attribute = attribute.map_err(|e| ValidateError::SchemaMalformed {
                        schema: source.to_string(),
                        details: e.to_string(),
                    })?;
                    if attribute.key.as_ref() == b"targetNamespace" {
                        let value =
                            attribute
                                .unescape_value()
                                .map_err(|e| ValidateError::SchemaMalformed {
                                    schema: source.to_string(),
                                    details: e.to_string(),
                                })?;
                        return Ok(Some(value.into_owned()));
                    }
                }
                return Ok(None);
            }
            Ok(Event::Eof) => {
                return Err(ValidateError::SchemaMalformed {
                    schema: source.to_string(),
                    details: "no root element".to_string(),
                });
            }
            Ok(_) => {}
            Err(e) => {
                return Err(ValidateError::SchemaMalformed {
                    schema: source.to_string(),
                    details: e.to_string(),
                });
            }
        }
        buf.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::ArtifactOrigin;

    fn artifact(location: &str, origin: ArtifactOrigin) -> ResolvedArtifact {
        ResolvedArtifact {
            content: b"<schema/>".to_vec(),
            origin,
            location: location.to_string(),
        }
    }

    fn reference(namespace: Option<&str>, location: &str) -> SchemaReference {
        SchemaReference {
            namespace: namespace.map(str::to_string),
            location: location.to_string(),
        }
    }

    #[test]
    fn test_assemble_empty_set() {
        let composite = assemble(&[]).unwrap();
        assert_eq!(composite.imports(), 0);
        assert!(composite.text().contains("elementFormDefault=\"qualified\""));
        assert!(!composite.text().contains("<import"));
    }

    #[test]
    fn test_assemble_preserves_order() {
        let set = vec![
            (
                reference(Some("urn:a"), "a.xsd"),
                artifact("/schema/a.xsd", ArtifactOrigin::CacheDir),
            ),
            (
                reference(Some("urn:b"), "b.xsd"),
                artifact("http://example.com/b.xsd", ArtifactOrigin::RemoteUrl),
            ),
        ];
        let composite = assemble(&set).unwrap();
        assert_eq!(composite.imports(), 2);
        let a = composite.text().find("urn:a").unwrap();
        let b = composite.text().find("urn:b").unwrap();
        assert!(a < b);
        assert!(composite.text().contains("schemaLocation=\"/schema/a.xsd\""));
        assert!(
            composite
                .text()
                .contains("schemaLocation=\"http://example.com/b.xsd\"")
        );
    }

    #[test]
    fn test_assemble_skips_empty_fallback() {
        let set = vec![
            (
                reference(Some("urn:a"), "a.xsd"),
                artifact("/schema/a.xsd", ArtifactOrigin::CacheDir),
            ),
            (
                reference(Some("urn:gone"), "gone.xsd"),
                ResolvedArtifact {
                    content: Vec::new(),
                    origin: ArtifactOrigin::EmptyFallback,
                    location: "http://example.com/gone.xsd".to_string(),
                },
            ),
        ];
        let composite = assemble(&set).unwrap();
        assert_eq!(composite.imports(), 1);
        assert!(!composite.text().contains("urn:gone"));
    }

    #[test]
    fn test_import_without_namespace() {
        let set = vec![(
            reference(None, "plain.xsd"),
            artifact("/schema/plain.xsd", ArtifactOrigin::CacheDir),
        )];
        let composite = assemble(&set).unwrap();
        assert!(!composite.text().contains("namespace="));
        assert!(
            composite
                .text()
                .contains("schemaLocation=\"/schema/plain.xsd\"")
        );
    }

    #[test]
    fn test_target_namespace() {
        let schema = br#"<?xml version="1.0"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
           targetNamespace="urn:cz-mzcr:ns:dasta:ds4:ds_type">
</xs:schema>"#;
        assert_eq!(
            target_namespace(schema, "ds_type.xsd").unwrap(),
            Some("urn:cz-mzcr:ns:dasta:ds4:ds_type".to_string())
        );

        let schema = br#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"/>"#;
        assert_eq!(target_namespace(schema, "bare.xsd").unwrap(), None);
    }

    #[test]
    fn test_target_namespace_malformed_schema() {
        let result = target_namespace(b"not a schema", "broken.xsd");
        match result.unwrap_err() {
            ValidateError::SchemaMalformed { schema, .. } => assert_eq!(schema, "broken.xsd"),
            other => panic!("expected SchemaMalformed, got {other:?}"),
        }
    }
}
