//! LibXML2 FFI wrapper: the external parse/validate engine.
//!
//! The Rust ecosystem has no mature library for runtime DTD or XML Schema
//! validation (roxmltree and quick-xml parse only), so the engine wraps
//! libxml2 directly. Parser globals are initialized exactly once; each
//! validation call builds and frees its own contexts. Validation here is
//! single-document and single-threaded, so the global structured error
//! handler can be installed for the duration of one call.

use std::ffi::CStr;
use std::sync::Once;

use libc::{c_char, c_int, c_void};

use crate::coordinator::{EngineReport, SchemaArtifact, ValidationEngine};
use crate::error::{Result, ValidateError};

static LIBXML2_INIT: Once = Once::new();

// Opaque libxml2 structures.
#[repr(C)]
pub struct XmlDoc {
    _private: [u8; 0],
}

#[repr(C)]
pub struct XmlDtd {
    _private: [u8; 0],
}

#[repr(C)]
pub struct XmlValidCtxt {
    _private: [u8; 0],
}

#[repr(C)]
pub struct XmlSchema {
    _private: [u8; 0],
}

#[repr(C)]
pub struct XmlSchemaParserCtxt {
    _private: [u8; 0],
}

#[repr(C)]
pub struct XmlSchemaValidCtxt {
    _private: [u8; 0],
}

#[repr(C)]
pub struct XmlParserInputBuffer {
    _private: [u8; 0],
}

#[repr(C)]
pub struct xmlError {
    pub domain: c_int,
    pub code: c_int,
    pub message: *const c_char,
    pub level: c_int,
    pub file: *const c_char,
    pub line: c_int,
    pub str1: *const c_char,
    pub str2: *const c_char,
    pub str3: *const c_char,
    pub int1: c_int,
    pub int2: c_int,
    pub ctxt: *mut c_void,
    pub node: *mut c_void,
}

pub type XmlStructuredErrorFunc =
    Option<unsafe extern "C" fn(user_data: *mut c_void, error: *mut xmlError)>;

// Parser options: keep libxml2 from writing to stderr on its own.
const XML_PARSE_NOERROR: c_int = 1 << 6;
const XML_PARSE_NOWARNING: c_int = 1 << 7;

// xmlCharEncoding values. All fetched artifacts are re-encoded to UTF-8
// before they reach the engine.
const XML_CHAR_ENCODING_NONE: c_int = 0;
const XML_CHAR_ENCODING_UTF8: c_int = 1;

#[cfg_attr(target_os = "windows", link(name = "libxml2"))]
#[cfg_attr(not(target_os = "windows"), link(name = "xml2"))]
unsafe extern "C" {
    fn xmlInitParser();
    fn xmlInitGlobals();

    fn xmlReadMemory(
        buffer: *const c_char,
        size: c_int,
        url: *const c_char,
        encoding: *const c_char,
        options: c_int,
    ) -> *mut XmlDoc;
    fn xmlFreeDoc(doc: *mut XmlDoc);

    fn xmlSetStructuredErrorFunc(ctx: *mut c_void, handler: XmlStructuredErrorFunc);

    // DTD validity
    fn xmlParserInputBufferCreateMem(
        mem: *const c_char,
        size: c_int,
        enc: c_int,
    ) -> *mut XmlParserInputBuffer;
    fn xmlIOParseDTD(
        sax: *mut c_void,
        input: *mut XmlParserInputBuffer,
        enc: c_int,
    ) -> *mut XmlDtd;
    fn xmlFreeDtd(dtd: *mut XmlDtd);
    fn xmlNewValidCtxt() -> *mut XmlValidCtxt;
    fn xmlFreeValidCtxt(ctxt: *mut XmlValidCtxt);
    fn xmlValidateDtd(ctxt: *mut XmlValidCtxt, doc: *mut XmlDoc, dtd: *mut XmlDtd) -> c_int;

    // XML Schema validation
    fn xmlSchemaNewMemParserCtxt(buffer: *const c_char, size: c_int) -> *mut XmlSchemaParserCtxt;
    fn xmlSchemaParse(ctxt: *const XmlSchemaParserCtxt) -> *mut XmlSchema;
    fn xmlSchemaFreeParserCtxt(ctxt: *mut XmlSchemaParserCtxt);
    fn xmlSchemaFree(schema: *mut XmlSchema);
    fn xmlSchemaNewValidCtxt(schema: *const XmlSchema) -> *mut XmlSchemaValidCtxt;
    fn xmlSchemaFreeValidCtxt(ctxt: *mut XmlSchemaValidCtxt);
    fn xmlSchemaValidateDoc(ctxt: *const XmlSchemaValidCtxt, doc: *mut XmlDoc) -> c_int;
    fn xmlSchemaSetValidStructuredErrors(
        ctxt: *mut XmlSchemaValidCtxt,
        serror: XmlStructuredErrorFunc,
        ctx: *mut c_void,
    );
}

/// Callback for libxml2 to report errors into a `Vec<String>`.
unsafe extern "C" fn structured_error_callback(user_data: *mut c_void, error: *mut xmlError) {
    let errors = unsafe { &mut *(user_data as *mut Vec<String>) };

    if !error.is_null() {
        let msg_ptr = unsafe { (*error).message };
        if !msg_ptr.is_null() {
            let c_str = unsafe { CStr::from_ptr(msg_ptr) };
            if let Ok(s) = c_str.to_str() {
                errors.push(s.trim().to_string());
            }
        }
    }
}

/// Parsed document pointer, freed on drop.
struct DocGuard(*mut XmlDoc);

impl Drop for DocGuard {
    fn drop(&mut self) {
        if !self.0.is_null() {
            unsafe { xmlFreeDoc(self.0) }
        }
    }
}

/// Validation engine backed by libxml2.
pub struct LibXml2Engine;

impl LibXml2Engine {
    /// Create the engine, initializing libxml2 exactly once.
    ///
    /// libxml2's initialization functions are not thread-safe, so they are
    /// protected by `std::sync::Once`.
    pub fn new() -> Self {
        LIBXML2_INIT.call_once(|| unsafe {
            xmlInitParser();
            xmlInitGlobals();
        });
        Self
    }

    fn parse_document(&self, bytes: &[u8]) -> Result<DocGuard> {
        let doc = unsafe {
            xmlReadMemory(
                bytes.as_ptr() as *const c_char,
                bytes.len() as c_int,
                c"document.xml".as_ptr(),
                std::ptr::null(),
                XML_PARSE_NOERROR | XML_PARSE_NOWARNING,
            )
        };
        if doc.is_null() {
            return Err(ValidateError::Parse {
                details: "libxml2 cannot parse the document".to_string(),
            });
        }
        Ok(DocGuard(doc))
    }

    fn validate_dtd(&self, doc: &DocGuard, dtd_bytes: &[u8]) -> Result<EngineReport> {
        // A zero-length grammar constrains nothing.
        if dtd_bytes.is_empty() {
            return Ok(EngineReport {
                valid: true,
                diagnostics: Vec::new(),
            });
        }

        unsafe {
            let input = xmlParserInputBufferCreateMem(
                dtd_bytes.as_ptr() as *const c_char,
                dtd_bytes.len() as c_int,
                XML_CHAR_ENCODING_NONE,
            );
            if input.is_null() {
                return Err(ValidateError::Engine {
                    details: "cannot allocate DTD input buffer".to_string(),
                });
            }

            // xmlIOParseDTD consumes the input buffer.
            let dtd = xmlIOParseDTD(std::ptr::null_mut(), input, XML_CHAR_ENCODING_UTF8);
            if dtd.is_null() {
                return Err(ValidateError::SchemaMalformed {
                    schema: "DTD".to_string(),
                    details: "libxml2 cannot parse the DTD".to_string(),
                });
            }

            let ctxt = xmlNewValidCtxt();
            if ctxt.is_null() {
                xmlFreeDtd(dtd);
                return Err(ValidateError::Engine {
                    details: "cannot allocate validity context".to_string(),
                });
            }

            let mut errors: Vec<String> = Vec::new();
            xmlSetStructuredErrorFunc(
                &mut errors as *mut Vec<String> as *mut c_void,
                Some(structured_error_callback),
            );
            let code = xmlValidateDtd(ctxt, doc.0, dtd);
            xmlSetStructuredErrorFunc(std::ptr::null_mut(), None);

            xmlFreeValidCtxt(ctxt);
            xmlFreeDtd(dtd);

            Ok(EngineReport {
                valid: code == 1,
                diagnostics: errors,
            })
        }
    }

    fn validate_schema(&self, doc: &DocGuard, schema_text: &str) -> Result<EngineReport> {
        let bytes = schema_text.as_bytes();

        unsafe {
            let parser_ctxt =
                xmlSchemaNewMemParserCtxt(bytes.as_ptr() as *const c_char, bytes.len() as c_int);
            if parser_ctxt.is_null() {
                return Err(ValidateError::Engine {
                    details: "cannot allocate schema parser context".to_string(),
                });
            }

            let schema = xmlSchemaParse(parser_ctxt);
            xmlSchemaFreeParserCtxt(parser_ctxt);
            if schema.is_null() {
                return Err(ValidateError::SchemaMalformed {
                    schema: "composite schema".to_string(),
                    details: "libxml2 cannot parse the assembled schema".to_string(),
                });
            }

            let valid_ctxt = xmlSchemaNewValidCtxt(schema);
            if valid_ctxt.is_null() {
                xmlSchemaFree(schema);
                return Err(ValidateError::Engine {
                    details: "cannot allocate schema validation context".to_string(),
                });
            }

            let mut errors: Vec<String> = Vec::new();
            xmlSchemaSetValidStructuredErrors(
                valid_ctxt,
                Some(structured_error_callback),
                &mut errors as *mut Vec<String> as *mut c_void,
            );

            let code = xmlSchemaValidateDoc(valid_ctxt, doc.0);

            xmlSchemaFreeValidCtxt(valid_ctxt);
            xmlSchemaFree(schema);

            if code < 0 {
                return Err(ValidateError::Engine {
                    details: format!("libxml2 internal error {code}"),
                });
            }

            Ok(EngineReport {
                valid: code == 0,
                diagnostics: errors,
            })
        }
    }
}

impl Default for LibXml2Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationEngine for LibXml2Engine {
    fn validate(&self, document: &[u8], artifact: &SchemaArtifact) -> Result<EngineReport> {
        let doc = self.parse_document(document)?;
        match artifact {
            SchemaArtifact::Dtd(bytes) => self.validate_dtd(&doc, bytes),
            SchemaArtifact::Xsd(text) => self.validate_schema(&doc, text),
        }
    }
}
