//! Exercises the built binary end to end, offline.

use std::fs;
use std::process::Command;

use tempfile::TempDir;

fn validate_dasta() -> Command {
    Command::new(env!("CARGO_BIN_EXE_validate-dasta"))
}

#[test]
fn valid_document_with_explicit_schema_exits_zero() {
    let dir = TempDir::new().unwrap();
    let doc = dir.path().join("note.xml");
    let dtd = dir.path().join("note.dtd");
    fs::write(&doc, b"<note>hello</note>").unwrap();
    fs::write(&dtd, b"<!ELEMENT note (#PCDATA)>").unwrap();

    let output = validate_dasta()
        .arg(&doc)
        .arg("--schema")
        .arg(&dtd)
        .arg("--style")
        .arg("dtd")
        .arg("-v")
        .output()
        .unwrap();

    assert_eq!(
        output.status.code(),
        Some(0),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("document is valid"));
}

#[test]
fn invalid_document_exits_one() {
    let dir = TempDir::new().unwrap();
    let doc = dir.path().join("note.xml");
    let dtd = dir.path().join("note.dtd");
    fs::write(&doc, b"<note><ne/></note>").unwrap();
    fs::write(&dtd, b"<!ELEMENT note (#PCDATA)>").unwrap();

    let output = validate_dasta()
        .arg(&doc)
        .arg("--schema")
        .arg(&dtd)
        .arg("--style")
        .arg("dtd")
        .arg("-v")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("document is not valid"));
}

#[test]
fn unparsable_document_exits_two() {
    let dir = TempDir::new().unwrap();
    let doc = dir.path().join("broken.xml");
    fs::write(&doc, b"this is not xml").unwrap();

    let output = validate_dasta().arg(&doc).output().unwrap();

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error:"));
}

#[test]
fn missing_input_file_exits_two() {
    let dir = TempDir::new().unwrap();
    let output = validate_dasta()
        .arg(dir.path().join("does-not-exist.xml"))
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
}
