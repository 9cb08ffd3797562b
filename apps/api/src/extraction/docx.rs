use std::io::{Cursor, Read};

use bytes::Bytes;
use quick_xml::events::Event;
use quick_xml::Reader;

use super::ExtractionError;

const DOCUMENT_PART: &str = "word/document.xml";

/// Raw-text conversion of `.docx` files: text runs only, no formatting.
pub struct WordEngine;

impl WordEngine {
    pub fn new() -> Self {
        Self
    }

    pub async fn extract(&self, bytes: Bytes) -> Result<String, ExtractionError> {
        tokio::task::spawn_blocking(move || extract_raw_text(&bytes))
            .await
            .map_err(|e| ExtractionError::Worker(e.to_string()))?
    }
}

fn malformed(reason: impl ToString) -> ExtractionError {
    ExtractionError::Malformed {
        format: "Word",
        reason: reason.to_string(),
    }
}

fn extract_raw_text(bytes: &[u8]) -> Result<String, ExtractionError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(malformed)?;
    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| malformed(format!("{DOCUMENT_PART}: {e}")))?
        .read_to_string(&mut xml)
        .map_err(malformed)?;
    document_xml_to_text(&xml)
}

/// Walks the WordprocessingML body: `w:t` text is kept, tabs and breaks
/// become `\t` / `\n`, and every paragraph ends with a blank line.
fn document_xml_to_text(xml: &str) -> Result<String, ExtractionError> {
    let mut reader = Reader::from_str(xml);
    let mut out = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if e.name().as_ref() == b"w:t" {
                    in_text = true;
                }
            }
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"w:tab" => out.push('\t'),
                b"w:br" | b"w:cr" => out.push('\n'),
                b"w:p" => out.push_str("\n\n"),
                _ => {}
            },
            Ok(Event::Text(e)) if in_text => {
                out.push_str(&e.unescape().map_err(malformed)?);
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => out.push_str("\n\n"),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(malformed(e)),
            _ => {}
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn body(paragraphs: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{paragraphs}</w:body></w:document>"#
        )
    }

    fn docx_with(xml: &str) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file(DOCUMENT_PART, zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_paragraphs_and_runs() {
        let xml = body(
            r#"<w:p><w:r><w:t>Acme </w:t></w:r><w:r><w:t>Corp</w:t></w:r></w:p><w:p><w:r><w:t>Q3 &amp; Q4</w:t></w:r></w:p>"#,
        );
        assert_eq!(document_xml_to_text(&xml).unwrap(), "Acme Corp\n\nQ3 & Q4\n\n");
    }

    #[test]
    fn test_tabs_breaks_and_empty_paragraphs() {
        let xml = body(
            r#"<w:p><w:r><w:t>a</w:t><w:tab/><w:t>b</w:t><w:br/><w:t>c</w:t></w:r></w:p><w:p/>"#,
        );
        assert_eq!(document_xml_to_text(&xml).unwrap(), "a\tb\nc\n\n\n\n");
    }

    #[test]
    fn test_non_text_elements_ignored() {
        let xml = body(
            r#"<w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:rPr><w:b/></w:rPr><w:t>Title</w:t></w:r></w:p>"#,
        );
        assert_eq!(document_xml_to_text(&xml).unwrap(), "Title\n\n");
    }

    #[test]
    fn test_full_container_round() {
        let bytes = docx_with(&body(r#"<w:p><w:r><w:t>Portfolio</w:t></w:r></w:p>"#));
        assert_eq!(extract_raw_text(&bytes).unwrap(), "Portfolio\n\n");
    }

    #[test]
    fn test_not_a_zip() {
        let err = extract_raw_text(b"plain text pretending").unwrap_err();
        assert!(matches!(err, ExtractionError::Malformed { format: "Word", .. }));
    }

    #[test]
    fn test_zip_without_document_part() {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("other.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"<x/>").unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let err = extract_raw_text(&bytes).unwrap_err();
        assert!(err.to_string().contains(DOCUMENT_PART));
    }

    #[tokio::test]
    async fn test_engine_extracts_off_runtime_thread() {
        let bytes = docx_with(&body(r#"<w:p><w:r><w:t>CV</w:t></w:r></w:p>"#));
        let text = WordEngine::new().extract(Bytes::from(bytes)).await.unwrap();
        assert_eq!(text, "CV\n\n");
    }
}
