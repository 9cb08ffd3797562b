//! Document Extractor: turns an uploaded file into plain text.
//!
//! Dispatch is by file extension: `.pdf` and `.docx` go to their engines,
//! everything else is decoded as UTF-8 text. The engines are installed by
//! `ExtractorEngines::load`, which `main` runs in the background; a request
//! that arrives before its engine is ready fails with `EngineNotLoaded`.

pub mod docx;
pub mod pdf;

use std::sync::OnceLock;

use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use self::docx::WordEngine;
use self::pdf::PdfEngine;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("{0} library not loaded yet.")]
    EngineNotLoaded(&'static str),

    #[error("Error parsing {format}: {reason}")]
    Malformed {
        format: &'static str,
        reason: String,
    },

    #[error("Extraction worker failed: {0}")]
    Worker(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Pdf,
    Word,
    PlainText,
}

impl DocumentKind {
    /// Picks the extraction path from the text after the last `.`,
    /// case-insensitively. Names without a dot are plain text.
    pub fn from_file_name(file_name: &str) -> Self {
        let extension = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase());
        match extension.as_deref() {
            Some("pdf") => DocumentKind::Pdf,
            Some("docx") => DocumentKind::Word,
            _ => DocumentKind::PlainText,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct EngineStatus {
    pub pdf: bool,
    pub word: bool,
}

/// The PDF and Word engines, each installed at most once.
#[derive(Default)]
pub struct ExtractorEngines {
    pdf: OnceLock<PdfEngine>,
    word: OnceLock<WordEngine>,
}

impl ExtractorEngines {
    /// Creates the registry with no engine installed yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs both engines. The PDF engine needs its worker count before use.
    pub async fn load(&self, pdf_workers: usize) {
        if self.pdf.set(PdfEngine::new(pdf_workers)).is_ok() {
            info!("PDF engine loaded ({pdf_workers} workers)");
        }
        if self.word.set(WordEngine::new()).is_ok() {
            info!("Word engine loaded");
        }
    }

    pub fn status(&self) -> EngineStatus {
        EngineStatus {
            pdf: self.pdf.get().is_some(),
            word: self.word.get().is_some(),
        }
    }

    /// Extracts plain text from `bytes`, choosing the path from `file_name`.
    pub async fn extract(&self, file_name: &str, bytes: Bytes) -> Result<String, ExtractionError> {
        let kind = DocumentKind::from_file_name(file_name);
        debug!("Extracting {file_name} ({} bytes) as {kind:?}", bytes.len());

        match kind {
            DocumentKind::Pdf => {
                let engine = self.pdf.get().ok_or(ExtractionError::EngineNotLoaded("PDF"))?;
                engine.extract(bytes).await
            }
            DocumentKind::Word => {
                let engine = self
                    .word
                    .get()
                    .ok_or(ExtractionError::EngineNotLoaded("Word"))?;
                engine.extract(bytes).await
            }
            DocumentKind::PlainText => Ok(String::from_utf8_lossy(&bytes).into_owned()),
        }
    }
}
