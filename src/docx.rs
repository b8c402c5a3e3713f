//! Word-document plumbing: paragraph extraction from uploaded `.docx`
//! files and export of the generated memo.
//!
//! A `.docx` file is an OPC zip package; the document body lives in
//! `word/document.xml`. Reading walks `w:p`/`w:t` elements only, which
//! covers body text but not headers, footers, or tables. Export writes
//! the minimal package a word processor needs to open the file; byte
//! fidelity with Word's own output is not a goal.

use crate::error::{Error, Result};
use quick_xml::Reader;
use quick_xml::events::Event;
use std::io::{Cursor, Read, Write};
use zip::ZipArchive;
use zip::write::{SimpleFileOptions, ZipWriter};

/// Extracts the text of every paragraph in document order.
///
/// Empty paragraphs are preserved as empty strings so blank lines
/// survive the round trip into the extraction buffer.
///
/// # Errors
///
/// Returns [`Error::Extraction`] if the bytes are not a zip package,
/// `word/document.xml` is missing, or the XML cannot be parsed.
pub(crate) fn read_paragraphs(name: &str, bytes: &[u8]) -> Result<Vec<String>> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| Error::extraction(name, format!("not a docx package: {e}")))?;

    let mut document_xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| Error::extraction(name, format!("missing word/document.xml: {e}")))?
        .read_to_string(&mut document_xml)
        .map_err(|e| Error::extraction(name, format!("unreadable document.xml: {e}")))?;

    parse_paragraphs(name, &document_xml)
}

fn parse_paragraphs(name: &str, document_xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(document_xml);
    let mut buf = Vec::new();

    let mut paragraphs = Vec::new();
    let mut current: Option<String> = None;
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"w:p" => current = Some(String::new()),
                b"w:t" => in_text = current.is_some(),
                _ => {}
            },
            Ok(Event::Empty(ref e)) => {
                // Explicit line breaks inside a run
                if e.name().as_ref() == b"w:br" {
                    if let Some(p) = current.as_mut() {
                        p.push('\n');
                    }
                }
            }
            Ok(Event::Text(ref t)) if in_text => {
                let text = t
                    .unescape()
                    .map_err(|e| Error::extraction(name, format!("bad XML text: {e}")))?;
                if let Some(p) = current.as_mut() {
                    p.push_str(&text);
                }
            }
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"w:p" => {
                    if let Some(p) = current.take() {
                        paragraphs.push(p);
                    }
                }
                b"w:t" => in_text = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::extraction(name, format!("XML parse error: {e}")));
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(paragraphs)
}

/// Serializes a memo into a downloadable `.docx` artifact.
///
/// The document carries one heading paragraph and the memo text as a
/// single paragraph, newlines rendered as line breaks.
///
/// # Errors
///
/// Returns [`Error::Export`] if the zip package cannot be written.
pub(crate) fn write_memo(heading: &str, body: &str) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();

    write_entry(&mut zip, "[Content_Types].xml", CONTENT_TYPES_XML, options)?;
    write_entry(&mut zip, "_rels/.rels", PACKAGE_RELS_XML, options)?;
    write_entry(&mut zip, "docProps/core.xml", &core_properties(heading), options)?;
    write_entry(&mut zip, "word/document.xml", &document_xml(heading, body), options)?;

    let cursor = zip
        .finish()
        .map_err(|e| Error::export(format!("failed to finalize package: {e}")))?;
    Ok(cursor.into_inner())
}

fn write_entry(
    zip: &mut ZipWriter<Cursor<Vec<u8>>>,
    path: &str,
    content: &str,
    options: SimpleFileOptions,
) -> Result<()> {
    zip.start_file(path, options)
        .map_err(|e| Error::export(format!("failed to add '{path}': {e}")))?;
    zip.write_all(content.as_bytes())
        .map_err(|e| Error::export(format!("failed to write '{path}': {e}")))?;
    Ok(())
}

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
<Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>
</Types>"#;

const PACKAGE_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>
</Relationships>"#;

fn core_properties(title: &str) -> String {
    let created = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
<dc:title>{}</dc:title>
<dcterms:created xsi:type="dcterms:W3CDTF">{created}</dcterms:created>
</cp:coreProperties>"#,
        escape_xml(title)
    )
}

fn document_xml(heading: &str, body: &str) -> String {
    let mut body_runs = String::new();
    for (i, line) in body.lines().enumerate() {
        if i > 0 {
            body_runs.push_str("<w:br/>");
        }
        body_runs.push_str(&format!(
            "<w:t xml:space=\"preserve\">{}</w:t>",
            escape_xml(line)
        ));
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
<w:body>
<w:p><w:r><w:rPr><w:b/><w:sz w:val="32"/></w:rPr><w:t xml:space="preserve">{}</w:t></w:r></w:p>
<w:p><w:r>{body_runs}</w:r></w:p>
</w:body>
</w:document>"#,
        escape_xml(heading)
    )
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_zip_entry(bytes: &[u8], path: &str) -> String {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut content = String::new();
        archive
            .by_name(path)
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        content
    }

    #[test]
    fn test_parse_paragraphs_in_document_order() {
        let xml = r#"<w:document xmlns:w="ns"><w:body>
            <w:p><w:r><w:t>First paragraph</w:t></w:r></w:p>
            <w:p></w:p>
            <w:p><w:r><w:t>Second </w:t></w:r><w:r><w:t>paragraph</w:t></w:r></w:p>
        </w:body></w:document>"#;

        let paragraphs = parse_paragraphs("test.docx", xml).unwrap();
        assert_eq!(
            paragraphs,
            vec!["First paragraph", "", "Second paragraph"]
        );
    }

    #[test]
    fn test_parse_paragraphs_unescapes_entities() {
        let xml = r#"<w:document><w:body>
            <w:p><w:r><w:t>Smith &amp; Co</w:t></w:r></w:p>
        </w:body></w:document>"#;

        let paragraphs = parse_paragraphs("test.docx", xml).unwrap();
        assert_eq!(paragraphs, vec!["Smith & Co"]);
    }

    #[test]
    fn test_parse_paragraphs_ignores_text_outside_runs() {
        let xml = r#"<w:document><w:body>
            stray text
            <w:p><w:r><w:t>kept</w:t></w:r></w:p>
        </w:body></w:document>"#;

        let paragraphs = parse_paragraphs("test.docx", xml).unwrap();
        assert_eq!(paragraphs, vec!["kept"]);
    }

    #[test]
    fn test_read_paragraphs_rejects_non_docx() {
        let err = read_paragraphs("plain.docx", b"just text").unwrap_err();
        assert!(err.to_string().contains("plain.docx"));
    }

    #[test]
    fn test_write_memo_round_trip() {
        let bytes = write_memo("Non-Material Change Memo", "Line one\nLine two").unwrap();

        let document = read_zip_entry(&bytes, "word/document.xml");
        assert!(document.contains("Non-Material Change Memo"));
        assert!(document.contains("Line one"));
        assert!(document.contains("<w:br/>"));

        // The memo body must come back out through the reader
        let paragraphs = read_paragraphs("memo.docx", &bytes).unwrap();
        assert_eq!(paragraphs.len(), 2);
        assert_eq!(paragraphs[0], "Non-Material Change Memo");
        assert_eq!(paragraphs[1], "Line one\nLine two");
    }

    #[test]
    fn test_write_memo_package_parts() {
        let bytes = write_memo("Memo", "Body").unwrap();

        let types = read_zip_entry(&bytes, "[Content_Types].xml");
        assert!(types.contains("wordprocessingml.document.main+xml"));

        let rels = read_zip_entry(&bytes, "_rels/.rels");
        assert!(rels.contains("word/document.xml"));

        let core = read_zip_entry(&bytes, "docProps/core.xml");
        assert!(core.contains("<dc:title>Memo</dc:title>"));
    }

    #[test]
    fn test_write_memo_escapes_markup() {
        let bytes = write_memo("A & B", "x < y").unwrap();
        let document = read_zip_entry(&bytes, "word/document.xml");
        assert!(document.contains("A &amp; B"));
        assert!(document.contains("x &lt; y"));
    }
}
