//! Text extraction strategies.
//!
//! `LayoutExtractor` rebuilds lines from positioned glyphs and is the primary
//! path. `PlainTextExtractor` asks `pdf-extract` for whole-document text and
//! is only used when the layout path fails for a reason other than the input
//! itself. `FallbackExtractor` composes the two.
//!
//! `AppState` holds an `Arc<dyn TextExtractor>` built once at startup.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::{error, info, warn};

use crate::extraction::assembler::{ExtractionResult, ExtractionStrategy, PageTextAssembler};
use crate::extraction::cancel::CancelFlag;
use crate::extraction::error::{ExtractionError, LoadFailure, NoTextHint};
use crate::extraction::loader::{validate_pdf_bytes, OpenError, PdfDocumentLoader};
use crate::extraction::sanitizer::{require_usable, sanitize};

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// Turns document bytes into sanitized, usable text.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(
        &self,
        bytes: Bytes,
        cancel: &CancelFlag,
    ) -> Result<ExtractionResult, ExtractionError>;

    /// Short backend name for logs.
    fn name(&self) -> &'static str;
}

// ────────────────────────────────────────────────────────────────────────────
// LayoutExtractor
// ────────────────────────────────────────────────────────────────────────────

pub struct LayoutExtractor {
    loader: PdfDocumentLoader,
    assembler: PageTextAssembler,
}

impl LayoutExtractor {
    pub fn new(loader: PdfDocumentLoader, assembler: PageTextAssembler) -> Self {
        Self { loader, assembler }
    }
}

#[async_trait]
impl TextExtractor for LayoutExtractor {
    async fn extract(
        &self,
        bytes: Bytes,
        cancel: &CancelFlag,
    ) -> Result<ExtractionResult, ExtractionError> {
        let document = self.loader.load(bytes, cancel).await?;

        // Page walking is CPU-bound; keep it off the async executor.
        let assembler = self.assembler;
        let flag = cancel.clone();
        let assembled = tokio::task::spawn_blocking(move || assembler.assemble(document.as_ref(), &flag))
            .await
            .map_err(|e| {
                error!("page assembly task failed: {e}");
                ExtractionError::NoExtractableText {
                    hint: NoTextHint::Unreadable,
                }
            })??;

        let text = require_usable(sanitize(&assembled.text))?;
        Ok(ExtractionResult { text, ..assembled })
    }

    fn name(&self) -> &'static str {
        "layout"
    }
}

// ────────────────────────────────────────────────────────────────────────────
// PlainTextExtractor
// ────────────────────────────────────────────────────────────────────────────

/// Whole-document text via `pdf-extract`. No positions, no per-page
/// accounting: a success is reported as one processed page.
pub struct PlainTextExtractor {
    max_bytes: usize,
}

impl PlainTextExtractor {
    pub fn new(max_bytes: usize) -> Self {
        Self { max_bytes }
    }
}

#[async_trait]
impl TextExtractor for PlainTextExtractor {
    async fn extract(
        &self,
        bytes: Bytes,
        cancel: &CancelFlag,
    ) -> Result<ExtractionResult, ExtractionError> {
        validate_pdf_bytes(&bytes, self.max_bytes)?;
        if cancel.is_cancelled() {
            return Err(ExtractionError::Cancelled);
        }

        let outcome = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes)).await;
        let raw = match outcome {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => {
                let cause = match OpenError::classify(e.to_string()) {
                    OpenError::Encrypted(_) => LoadFailure::Encrypted,
                    OpenError::Corrupt(_) => LoadFailure::Corrupt,
                };
                return Err(ExtractionError::LoadFailed {
                    attempts: 1,
                    cause,
                    detail: e.to_string(),
                });
            }
            Err(join_error) => {
                return Err(ExtractionError::LoadFailed {
                    attempts: 1,
                    cause: LoadFailure::Backend,
                    detail: format!("pdf-extract task failed: {join_error}"),
                });
            }
        };

        let text = sanitize(&raw);
        if text.is_empty() {
            return Err(ExtractionError::NoExtractableText {
                hint: NoTextHint::LikelyScanned,
            });
        }
        let text = require_usable(text)?;

        Ok(ExtractionResult {
            text,
            pages_processed: 1,
            pages_failed: 0,
            strategy: ExtractionStrategy::PlainText,
        })
    }

    fn name(&self) -> &'static str {
        "plain_text"
    }
}

// ────────────────────────────────────────────────────────────────────────────
// FallbackExtractor
// ────────────────────────────────────────────────────────────────────────────

/// Tries `primary`, then `fallback`. Input rejections are returned as-is.
/// When both fail the primary error is reported.
pub struct FallbackExtractor {
    primary: Arc<dyn TextExtractor>,
    fallback: Arc<dyn TextExtractor>,
}

impl FallbackExtractor {
    pub fn new(primary: Arc<dyn TextExtractor>, fallback: Arc<dyn TextExtractor>) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl TextExtractor for FallbackExtractor {
    async fn extract(
        &self,
        bytes: Bytes,
        cancel: &CancelFlag,
    ) -> Result<ExtractionResult, ExtractionError> {
        let primary_error = match self.primary.extract(bytes.clone(), cancel).await {
            Ok(result) => return Ok(result),
            Err(e) if e.is_input_rejection() => return Err(e),
            Err(e) => e,
        };

        warn!(
            "{} extraction failed ({primary_error}), falling back to {}",
            self.primary.name(),
            self.fallback.name()
        );

        match self.fallback.extract(bytes, cancel).await {
            Ok(result) => {
                info!(
                    strategy = self.fallback.name(),
                    chars = result.text.len(),
                    "fallback extraction succeeded"
                );
                Ok(result)
            }
            Err(ExtractionError::Cancelled) => Err(ExtractionError::Cancelled),
            Err(fallback_error) => {
                warn!("{} extraction also failed: {fallback_error}", self.fallback.name());
                Err(primary_error)
            }
        }
    }

    fn name(&self) -> &'static str {
        "fallback"
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Plain-text uploads
// ────────────────────────────────────────────────────────────────────────────

/// Decodes an uploaded text file (lossy UTF-8) into canonical text.
pub fn decode_text_upload(bytes: &[u8], max_bytes: usize) -> Result<ExtractionResult, ExtractionError> {
    if bytes.len() > max_bytes {
        return Err(ExtractionError::TooLarge {
            size: bytes.len(),
            limit: max_bytes,
        });
    }
    let text = require_usable(sanitize(&String::from_utf8_lossy(bytes)))?;
    Ok(ExtractionResult {
        text,
        pages_processed: 1,
        pages_failed: 0,
        strategy: ExtractionStrategy::TextUpload,
    })
}
