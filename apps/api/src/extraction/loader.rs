//! PDF document loader: validates input, opens it with bounded retries and
//! exposes per-page positioned text.
//!
//! # Retry
//! Up to `max_attempts` opens with a fixed `retry_delay` between them. Each
//! parse runs under `spawn_blocking`; a panicking parser counts as a failed
//! attempt. Encrypted documents are not retried. The cancel flag is checked
//! before every attempt.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use lopdf::content::Content;
use lopdf::{Dictionary, Object, ObjectId};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::extraction::assembler::PdfDocument;
use crate::extraction::cancel::CancelFlag;
use crate::extraction::content::{text_items, PageResources};
use crate::extraction::error::{ExtractionError, LoadFailure, PageError};
use crate::extraction::glyph::RawTextItem;
use crate::extraction::inspect::DocumentInfo;

/// Every PDF starts with this signature.
pub const PDF_MAGIC: &[u8] = b"%PDF";

/// 10 MiB.
pub const DEFAULT_MAX_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct LoaderConfig {
    pub max_bytes: usize,
    pub max_attempts: u32,
    pub retry_delay: Duration,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BYTES,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }
}

/// Why a backend refused to open a document.
#[derive(Debug, Clone, Error)]
pub enum OpenError {
    #[error("encrypted document: {0}")]
    Encrypted(String),

    #[error("malformed document: {0}")]
    Corrupt(String),
}

impl OpenError {
    /// Sorts a parser error message into encrypted vs. corrupt.
    pub fn classify(detail: String) -> Self {
        let lower = detail.to_lowercase();
        if lower.contains("encrypt") || lower.contains("decrypt") || lower.contains("password") {
            OpenError::Encrypted(detail)
        } else {
            OpenError::Corrupt(detail)
        }
    }
}

/// The parsing library behind the loader.
pub trait PdfBackend: Send + Sync {
    fn open(&self, bytes: &[u8]) -> Result<Box<dyn PdfDocument>, OpenError>;
}

/// Size and signature checks, run before any parsing work.
pub fn validate_pdf_bytes(bytes: &[u8], max_bytes: usize) -> Result<(), ExtractionError> {
    if bytes.len() > max_bytes {
        return Err(ExtractionError::TooLarge {
            size: bytes.len(),
            limit: max_bytes,
        });
    }
    if !bytes.starts_with(PDF_MAGIC) {
        return Err(ExtractionError::InvalidFormat);
    }
    Ok(())
}

#[derive(Clone)]
pub struct PdfDocumentLoader {
    backend: Arc<dyn PdfBackend>,
    config: LoaderConfig,
}

impl PdfDocumentLoader {
    pub fn new(backend: Arc<dyn PdfBackend>, config: LoaderConfig) -> Self {
        Self { backend, config }
    }

    pub async fn load(
        &self,
        bytes: Bytes,
        cancel: &CancelFlag,
    ) -> Result<Box<dyn PdfDocument>, ExtractionError> {
        validate_pdf_bytes(&bytes, self.config.max_bytes)?;

        let max_attempts = self.config.max_attempts.max(1);
        let mut last_failure = (LoadFailure::Backend, String::from("no attempt made"));

        for attempt in 1..=max_attempts {
            if attempt > 1 {
                warn!(
                    "PDF open attempt {} failed, retrying after {}ms...",
                    attempt - 1,
                    self.config.retry_delay.as_millis()
                );
                tokio::time::sleep(self.config.retry_delay).await;
            }
            if cancel.is_cancelled() {
                return Err(ExtractionError::Cancelled);
            }

            let backend = Arc::clone(&self.backend);
            let data = bytes.clone();
            let outcome = tokio::task::spawn_blocking(move || backend.open(&data)).await;

            match outcome {
                Ok(Ok(document)) => {
                    info!(
                        attempt,
                        pages = document.page_count(),
                        size = bytes.len(),
                        "PDF opened"
                    );
                    return Ok(document);
                }
                Ok(Err(OpenError::Encrypted(detail))) => {
                    warn!("PDF is encrypted, not retrying: {detail}");
                    return Err(ExtractionError::LoadFailed {
                        attempts: attempt,
                        cause: LoadFailure::Encrypted,
                        detail,
                    });
                }
                Ok(Err(OpenError::Corrupt(detail))) => {
                    debug!(attempt, "PDF open failed: {detail}");
                    last_failure = (LoadFailure::Corrupt, detail);
                }
                Err(join_error) => {
                    debug!(attempt, "PDF parser task failed: {join_error}");
                    last_failure = (LoadFailure::Backend, format!("parser task failed: {join_error}"));
                }
            }
        }

        let (cause, detail) = last_failure;
        Err(ExtractionError::LoadFailed {
            attempts: max_attempts,
            cause,
            detail,
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// lopdf backend
// ────────────────────────────────────────────────────────────────────────────

/// Production backend built on `lopdf`.
pub struct LopdfBackend;

impl PdfBackend for LopdfBackend {
    fn open(&self, bytes: &[u8]) -> Result<Box<dyn PdfDocument>, OpenError> {
        let document =
            lopdf::Document::load_mem(bytes).map_err(|e| OpenError::classify(e.to_string()))?;
        Ok(Box::new(LopdfDocument::new(document)))
    }
}

pub struct LopdfDocument {
    document: lopdf::Document,
    pages: BTreeMap<u32, ObjectId>,
}

impl LopdfDocument {
    pub fn new(document: lopdf::Document) -> Self {
        let pages = document.get_pages();
        Self { document, pages }
    }

    fn resolve<'a>(&'a self, object: &'a Object) -> Option<&'a Object> {
        self.document.dereference(object).ok().map(|(_, resolved)| resolved)
    }

    fn info_text(&self, info: &Dictionary, key: &[u8]) -> Option<String> {
        let value = self.resolve(info.get(key).ok()?)?;
        let text = lopdf::decode_text_string(value).ok()?;
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }
}

impl PdfDocument for LopdfDocument {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn page_items(&self, page_number: u32) -> Result<Vec<RawTextItem>, PageError> {
        let page_id = self
            .pages
            .get(&page_number)
            .ok_or(PageError::Missing(page_number))?;
        let raw = self
            .document
            .get_page_content(*page_id)
            .map_err(|e| PageError::Content {
                page: page_number,
                detail: e.to_string(),
            })?;
        let content = Content::decode(&raw).map_err(|e| PageError::Content {
            page: page_number,
            detail: e.to_string(),
        })?;
        let resources = PageResources::for_page(&self.document, *page_id);
        Ok(text_items(&content.operations, &resources))
    }

    fn is_encrypted(&self) -> bool {
        self.document.is_encrypted()
    }

    fn info(&self) -> DocumentInfo {
        let Some(info) = self
            .document
            .trailer
            .get(b"Info")
            .ok()
            .and_then(|info| self.resolve(info))
            .and_then(|info| info.as_dict().ok())
        else {
            return DocumentInfo::default();
        };

        DocumentInfo {
            title: self.info_text(info, b"Title"),
            author: self.info_text(info, b"Author"),
            subject: self.info_text(info, b"Subject"),
            keywords: self.info_text(info, b"Keywords"),
            creator: self.info_text(info, b"Creator"),
            producer: self.info_text(info, b"Producer"),
            creation_date: self.info_text(info, b"CreationDate"),
            modification_date: self.info_text(info, b"ModDate"),
        }
    }
}
