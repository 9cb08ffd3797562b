use std::collections::BTreeMap;
use std::sync::Arc;

use bytes::Bytes;
use lopdf::content::Content;
use lopdf::Object;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use super::ExtractionError;

/// PDF text extraction. Parsing is CPU-bound, so it runs on the blocking
/// pool with at most `workers` documents in flight.
pub struct PdfEngine {
    permits: Arc<Semaphore>,
}

impl PdfEngine {
    pub fn new(workers: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(workers.max(1))),
        }
    }

    pub async fn extract(&self, bytes: Bytes) -> Result<String, ExtractionError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| ExtractionError::Worker(e.to_string()))?;

        tokio::task::spawn_blocking(move || extract_pages(&bytes))
            .await
            .map_err(|e| ExtractionError::Worker(e.to_string()))?
    }
}

fn extract_pages(bytes: &[u8]) -> Result<String, ExtractionError> {
    let doc = lopdf::Document::load_mem(bytes).map_err(|e| ExtractionError::Malformed {
        format: "PDF",
        reason: e.to_string(),
    })?;

    // BTreeMap keyed by page number, so iteration is 1..N.
    let mut pages = Vec::new();
    let mut failed = Vec::new();
    for (page_num, page_id) in doc.get_pages() {
        match page_fragments(&doc, page_id) {
            Ok(fragments) => pages.push(fragments),
            Err(e) => {
                warn!("Page {page_num}: content could not be decoded: {e}");
                failed.push(page_num);
                pages.push(Vec::new());
            }
        }
    }

    let no_text = pages.iter().all(Vec::is_empty);
    if !pages.is_empty() && (no_text || !failed.is_empty()) {
        debug!("Per-page pass incomplete; retrying whole document with pdf-extract");
        if let Some(text) = whole_document_text(bytes) {
            return Ok(join_pages(&[fallback_fragments(&text)]));
        }
        if !failed.is_empty() {
            return Err(ExtractionError::Malformed {
                format: "PDF",
                reason: format!("no readable text on pages {failed:?}"),
            });
        }
    }

    Ok(join_pages(&pages))
}

/// One fragment per text-showing operator, decoded with the font selected
/// by the most recent `Tf`. Blank fragments are dropped.
fn page_fragments(
    doc: &lopdf::Document,
    page_id: lopdf::ObjectId,
) -> Result<Vec<String>, lopdf::Error> {
    let encodings: BTreeMap<Vec<u8>, &str> = doc
        .get_page_fonts(page_id)
        .into_iter()
        .map(|(name, font)| (name, font.get_font_encoding()))
        .collect();
    let content = Content::decode(&page_content(doc, page_id)?)?;

    let mut encoding = None;
    let mut fragments = Vec::new();
    for op in &content.operations {
        let shown = match op.operator.as_str() {
            "Tf" => {
                encoding = op
                    .operands
                    .first()
                    .and_then(|name| name.as_name().ok())
                    .and_then(|name| encodings.get(name).copied());
                continue;
            }
            "Tj" | "TJ" | "'" => op.operands.first(),
            "\"" => op.operands.get(2),
            _ => continue,
        };
        let mut text = String::new();
        if let Some(operand) = shown {
            push_shown_text(&mut text, encoding, operand);
        }
        let text = text.trim();
        if !text.is_empty() {
            fragments.push(text.to_string());
        }
    }
    Ok(fragments)
}

/// Concatenated content streams of a page. Unlike lopdf's own reader, a
/// stream whose filters cannot be decoded is an error rather than raw bytes.
fn page_content(
    doc: &lopdf::Document,
    page_id: lopdf::ObjectId,
) -> Result<Vec<u8>, lopdf::Error> {
    let mut data = Vec::new();
    for stream_id in doc.get_page_contents(page_id) {
        let stream = doc.get_object(stream_id).and_then(Object::as_stream)?;
        if stream.dict.has(b"Filter") {
            data.extend(stream.decompressed_content()?);
        } else {
            data.extend_from_slice(&stream.content);
        }
        data.push(b'\n');
    }
    Ok(data)
}

/// A `TJ` array kerning more than 100 units to the left counts as a space.
fn push_shown_text(out: &mut String, encoding: Option<&str>, operand: &Object) {
    match operand {
        Object::String(bytes, _) => out.push_str(&lopdf::Document::decode_text(encoding, bytes)),
        Object::Array(items) => {
            for item in items {
                push_shown_text(out, encoding, item);
            }
        }
        Object::Integer(offset) if *offset < -100 => out.push(' '),
        Object::Real(offset) if *offset < -100.0 => out.push(' '),
        _ => {}
    }
}

/// pdf-extract over the whole document. `None` when it fails, panics or
/// finds nothing.
fn whole_document_text(bytes: &[u8]) -> Option<String> {
    // pdf-extract panics on some inputs it cannot decode.
    match std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes)) {
        Ok(Ok(text)) if !text.trim().is_empty() => Some(text),
        Ok(Ok(_)) => None,
        Ok(Err(e)) => {
            warn!("pdf-extract fallback failed: {e}");
            None
        }
        Err(_) => {
            warn!("pdf-extract fallback panicked");
            None
        }
    }
}

/// pdf-extract lays text out in lines; each non-blank line is a fragment.
fn fallback_fragments(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

/// Joins each page's fragments with single spaces and terminates every page
/// with a newline.
fn join_pages(pages: &[Vec<String>]) -> String {
    pages
        .iter()
        .map(|fragments| fragments.join(" ") + "\n")
        .collect()
}
