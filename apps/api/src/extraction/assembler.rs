//! Page text assembler: runs line reconstruction page by page and joins the
//! results in document order.
//!
//! A failing page is logged and counted, never fatal; only a document where
//! no page produced text fails.

use serde::Serialize;
use tracing::{debug, warn};

use crate::extraction::cancel::CancelFlag;
use crate::extraction::error::{ExtractionError, NoTextHint, PageError};
use crate::extraction::glyph::RawTextItem;
use crate::extraction::inspect::DocumentInfo;
use crate::extraction::lines::LineReconstructor;
use crate::extraction::sanitizer::PAGE_BREAK_MARKER;

/// An opened document that can hand out positioned text page by page.
pub trait PdfDocument: Send {
    fn page_count(&self) -> u32;

    /// Positioned text items of a 1-based page.
    fn page_items(&self, page_number: u32) -> Result<Vec<RawTextItem>, PageError>;

    fn is_encrypted(&self) -> bool {
        false
    }

    fn info(&self) -> DocumentInfo {
        DocumentInfo::default()
    }
}

/// Which strategy produced an extraction result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStrategy {
    Layout,
    PlainText,
    /// Upload was already plain text.
    TextUpload,
}

/// Output of the extraction pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionResult {
    pub text: String,
    pub pages_processed: u32,
    pub pages_failed: u32,
    pub strategy: ExtractionStrategy,
}

#[derive(Debug, Clone, Copy)]
pub struct PageTextAssembler {
    reconstructor: LineReconstructor,
    page_markers: bool,
}

impl PageTextAssembler {
    pub fn new(reconstructor: LineReconstructor, page_markers: bool) -> Self {
        Self {
            reconstructor,
            page_markers,
        }
    }

    /// Assembles the whole document. The returned text is not yet sanitized.
    pub fn assemble(
        &self,
        document: &dyn PdfDocument,
        cancel: &CancelFlag,
    ) -> Result<ExtractionResult, ExtractionError> {
        let page_count = document.page_count();
        if page_count == 0 {
            return Err(ExtractionError::EmptyDocument);
        }

        let mut pages: Vec<String> = Vec::new();
        let mut retrieval_failures = 0u32;
        let mut textless_pages = 0u32;

        for page_number in 1..=page_count {
            if cancel.is_cancelled() {
                debug!(page_number, "extraction cancelled before page");
                return Err(ExtractionError::Cancelled);
            }

            let items = match document.page_items(page_number) {
                Ok(items) => items,
                Err(e) => {
                    warn!(page_number, "skipping page: {e}");
                    retrieval_failures += 1;
                    continue;
                }
            };

            let text = self.reconstructor.page_text(&items);
            debug!(page_number, chars = text.len(), "page reconstructed");
            if text.trim().is_empty() {
                textless_pages += 1;
                continue;
            }
            pages.push(text);
        }

        let pages_processed = pages.len() as u32;
        if pages_processed == 0 {
            let hint = if document.is_encrypted() {
                NoTextHint::LikelyEncrypted
            } else if textless_pages > 0 {
                NoTextHint::LikelyScanned
            } else {
                NoTextHint::Unreadable
            };
            warn!(retrieval_failures, textless_pages, ?hint, "no page yielded text");
            return Err(ExtractionError::NoExtractableText { hint });
        }

        let separator = if self.page_markers {
            format!("\n\n{PAGE_BREAK_MARKER}\n\n")
        } else {
            "\n\n".to_string()
        };

        Ok(ExtractionResult {
            text: pages.join(&separator),
            pages_processed,
            pages_failed: page_count - pages_processed,
            strategy: ExtractionStrategy::Layout,
        })
    }
}
