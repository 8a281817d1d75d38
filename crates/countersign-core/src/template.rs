// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Docx package codec.
//!
//! A docx file is a ZIP archive of XML parts; the user-visible text lives
//! in `word/document.xml`. Substitution edits that part's text and the
//! archive is rebuilt around it with every other part carried over
//! byte-for-byte. Splicing replacement text into the raw archive bytes
//! would invalidate the entry offsets, so decode/re-encode is mandatory.

use regex::Regex;
use std::collections::HashMap;
use std::io::{Cursor, Read, Write};
use std::sync::LazyLock;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{Error, Result};

/// Archive part holding the document markup.
pub const MARKUP_PART: &str = "word/document.xml";

/// Placeholder token syntax: `{{fieldName}}`, whitespace-tolerant inside
/// the braces.
static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([A-Za-z0-9_]+)\s*\}\}").expect("placeholder regex"));

/// One part of the package, held decompressed in archive order.
#[derive(Debug, Clone)]
struct PackagePart {
    name: String,
    bytes: Vec<u8>,
    is_dir: bool,
}

/// A decoded document package with its markup part singled out for
/// template substitution.
#[derive(Debug, Clone)]
pub struct TemplateDocument {
    parts: Vec<PackagePart>,
    markup: usize,
}

impl TemplateDocument {
    /// Open a package and locate the markup part.
    ///
    /// Fails with `MalformedPackage` if the bytes are not a readable ZIP
    /// archive or the markup part is absent.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| Error::MalformedPackage(format!("not a valid package archive: {e}")))?;

        let mut parts = Vec::with_capacity(archive.len());
        let mut markup = None;
        for index in 0..archive.len() {
            let mut entry = archive.by_index(index).map_err(|e| {
                Error::MalformedPackage(format!("unreadable archive entry {index}: {e}"))
            })?;
            let name = entry.name().to_string();
            let is_dir = entry.is_dir();
            let mut bytes = Vec::with_capacity(entry.size() as usize);
            if !is_dir {
                entry.read_to_end(&mut bytes).map_err(|e| {
                    Error::MalformedPackage(format!("failed to read part '{name}': {e}"))
                })?;
            }
            if name == MARKUP_PART {
                markup = Some(parts.len());
            }
            parts.push(PackagePart { name, bytes, is_dir });
        }

        let markup = markup.ok_or_else(|| {
            Error::MalformedPackage(format!("package has no {MARKUP_PART} part"))
        })?;
        Ok(Self { parts, markup })
    }

    /// The markup part's text.
    pub fn markup_text(&self) -> Result<&str> {
        std::str::from_utf8(&self.parts[self.markup].bytes)
            .map_err(|e| Error::MalformedPackage(format!("markup part is not UTF-8: {e}")))
    }

    /// Bind every `{{field}}` token in the markup to its value.
    ///
    /// A token naming a field absent from the mapping fails the whole
    /// render; partially substituted output is never produced. A document
    /// with no remaining tokens renders as a no-op.
    pub fn substitute(&mut self, fields: &HashMap<String, String>) -> Result<()> {
        let markup = self.markup_text()?.to_string();
        for caps in PLACEHOLDER.captures_iter(&markup) {
            let field = &caps[1];
            if !fields.contains_key(field) {
                return Err(Error::TemplateRender(format!(
                    "no value supplied for template field '{field}'"
                )));
            }
        }
        let rendered =
            PLACEHOLDER.replace_all(&markup, |caps: &regex::Captures<'_>| fields[&caps[1]].clone());
        self.parts[self.markup].bytes = rendered.into_owned().into_bytes();
        Ok(())
    }

    /// Re-serialize into a valid package byte stream.
    ///
    /// Entry options are fixed (Deflated, epoch timestamp), so encoding
    /// the same document twice yields identical bytes.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(zip::DateTime::default());
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for part in &self.parts {
            if part.is_dir {
                writer.add_directory(part.name.as_str(), options).map_err(|e| {
                    Error::MalformedPackage(format!(
                        "failed to re-add directory '{}': {e}",
                        part.name
                    ))
                })?;
                continue;
            }
            writer.start_file(part.name.as_str(), options).map_err(|e| {
                Error::MalformedPackage(format!("failed to re-add part '{}': {e}", part.name))
            })?;
            writer.write_all(&part.bytes).map_err(|e| {
                Error::MalformedPackage(format!("failed to write part '{}': {e}", part.name))
            })?;
        }
        let cursor = writer
            .finish()
            .map_err(|e| Error::MalformedPackage(format!("failed to finalize package: {e}")))?;
        Ok(cursor.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="xml" ContentType="application/xml"/>
</Types>"#;

    fn minimal_docx(markup: &str) -> Vec<u8> {
        let options = SimpleFileOptions::default();
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in [
            ("[Content_Types].xml", CONTENT_TYPES),
            ("_rels/.rels", "<Relationships/>"),
            (MARKUP_PART, markup),
        ] {
            writer.start_file(name, options).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    fn signer_fields(name: &str) -> HashMap<String, String> {
        HashMap::from([("signerName".to_string(), name.to_string())])
    }

    #[test]
    fn test_substitute_fills_placeholder() {
        let bytes = minimal_docx("<w:t>Signed by {{signerName}}</w:t>");
        let mut doc = TemplateDocument::decode(&bytes).unwrap();
        doc.substitute(&signer_fields("Dana Levi")).unwrap();

        let markup = doc.markup_text().unwrap();
        assert!(markup.contains("Signed by Dana Levi"));
        assert!(!markup.contains("{{"));
    }

    #[test]
    fn test_substitute_is_whitespace_tolerant() {
        let bytes = minimal_docx("<w:t>{{ signerName }}</w:t>");
        let mut doc = TemplateDocument::decode(&bytes).unwrap();
        doc.substitute(&signer_fields("Dana")).unwrap();
        assert_eq!(doc.markup_text().unwrap(), "<w:t>Dana</w:t>");
    }

    #[test]
    fn test_unresolved_field_fails_the_render() {
        let bytes = minimal_docx("<w:t>{{signerName}} on {{signedDate}}</w:t>");
        let mut doc = TemplateDocument::decode(&bytes).unwrap();
        let err = doc.substitute(&signer_fields("Dana")).unwrap_err();
        assert!(matches!(err, Error::TemplateRender(_)));
        // No partial output: the markup still carries both tokens.
        assert!(doc.markup_text().unwrap().contains("{{signerName}}"));
    }

    #[test]
    fn test_substitute_twice_with_same_fields_is_a_no_op() {
        let bytes = minimal_docx("<w:t>{{signerName}}</w:t>");
        let mut doc = TemplateDocument::decode(&bytes).unwrap();
        doc.substitute(&signer_fields("Dana")).unwrap();
        let once = doc.encode().unwrap();
        doc.substitute(&signer_fields("Dana")).unwrap();
        assert_eq!(doc.encode().unwrap(), once);
    }

    #[test]
    fn test_round_trip_preserves_non_markup_parts() {
        let bytes = minimal_docx("<w:t>{{signerName}}</w:t>");
        let first = TemplateDocument::decode(&bytes).unwrap();
        let second = TemplateDocument::decode(&first.encode().unwrap()).unwrap();

        assert_eq!(first.parts.len(), second.parts.len());
        for (a, b) in first.parts.iter().zip(&second.parts) {
            assert_eq!(a.name, b.name);
            assert_eq!(a.bytes, b.bytes);
        }
    }

    #[test]
    fn test_encode_is_deterministic() {
        let bytes = minimal_docx("<w:t>stable</w:t>");
        let doc = TemplateDocument::decode(&bytes).unwrap();
        assert_eq!(doc.encode().unwrap(), doc.encode().unwrap());
    }

    #[test]
    fn test_decode_rejects_non_archive_bytes() {
        assert!(matches!(
            TemplateDocument::decode(b"this is not a zip"),
            Err(Error::MalformedPackage(_))
        ));
    }

    #[test]
    fn test_decode_rejects_archive_without_markup_part() {
        let options = SimpleFileOptions::default();
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer.start_file("readme.txt", options).unwrap();
        writer.write_all(b"no markup here").unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        assert!(matches!(
            TemplateDocument::decode(&bytes),
            Err(Error::MalformedPackage(_))
        ));
    }
}
