use thiserror::Error;

/// Main application error type that encompasses all failure modes.
///
/// A document failing validation is deliberately not represented here: that
/// is a normal negative outcome (`ValidationOutcome::Invalid`), not an error.
#[derive(Error, Debug)]
pub enum ValidateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("document cannot be parsed: {details}")]
    Parse { details: String },

    #[error("schema identity cannot be derived: {details}")]
    Resolution { details: String },

    #[error("schema {schema} cannot be parsed: {details}")]
    SchemaMalformed { schema: String, details: String },

    #[error("validation engine failure: {details}")]
    Engine { details: String },
}

/// Result type alias for convenience.
pub type Result<T> = std::result::Result<T, ValidateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let error = ValidateError::Parse {
            details: "unexpected end of stream".to_string(),
        };
        assert!(error.to_string().contains("document cannot be parsed"));
        assert!(error.to_string().contains("unexpected end of stream"));
    }

    #[test]
    fn test_resolution_error_display() {
        let error = ValidateError::Resolution {
            details: "no version attribute".to_string(),
        };
        assert!(error.to_string().contains("schema identity"));
        assert!(error.to_string().contains("no version attribute"));
    }

    #[test]
    fn test_schema_malformed_display() {
        let error = ValidateError::SchemaMalformed {
            schema: "ds_type.xsd".to_string(),
            details: "mismatched tag".to_string(),
        };
        assert!(error.to_string().contains("ds_type.xsd"));
        assert!(error.to_string().contains("mismatched tag"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let error: ValidateError = io_error.into();
        match error {
            ValidateError::Io(_) => (),
            other => panic!("expected Io, got {other:?}"),
        }
    }

    #[test]
    fn test_http_status_display() {
        let error = ValidateError::HttpStatus {
            url: "http://example.com/ds4.dtd".to_string(),
            status: 404,
        };
        assert!(error.to_string().contains("404"));
        assert!(error.to_string().contains("http://example.com/ds4.dtd"));
    }
}
