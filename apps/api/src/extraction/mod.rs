// PDF text extraction pipeline.
// loader → content → glyph → lines → assembler → sanitizer, driven by strategy.
// inspect answers page count, /Info and searchability without reconstruction.
// All page walking is CPU-bound and runs inside tokio::task::spawn_blocking.

pub mod assembler;
pub mod cancel;
pub mod content;
pub mod error;
pub mod glyph;
pub mod inspect;
pub mod lines;
pub mod loader;
pub mod sanitizer;
pub mod strategy;

use std::sync::Arc;
use std::time::Duration;

pub use assembler::{ExtractionResult, ExtractionStrategy, PageTextAssembler};
pub use cancel::CancelFlag;
pub use error::ExtractionError;
pub use inspect::{PdfInspection, PdfInspector};
pub use strategy::{decode_text_upload, TextExtractor};

use crate::config::ExtractionConfig;
use lines::LineReconstructor;
use loader::{LoaderConfig, LopdfBackend, PdfDocumentLoader};
use strategy::{FallbackExtractor, LayoutExtractor, PlainTextExtractor};

/// Builds the production extractor: layout reconstruction with a
/// `pdf-extract` fallback.
pub fn build_extractor(config: &ExtractionConfig) -> Arc<dyn TextExtractor> {
    let assembler = PageTextAssembler::new(
        LineReconstructor::new(config.line_tolerance).with_join_gap(config.line_join_gap),
        config.page_break_markers,
    );

    Arc::new(FallbackExtractor::new(
        Arc::new(LayoutExtractor::new(build_loader(config), assembler)),
        Arc::new(PlainTextExtractor::new(config.max_upload_bytes)),
    ))
}

pub fn build_inspector(config: &ExtractionConfig) -> PdfInspector {
    PdfInspector::new(build_loader(config))
}

fn build_loader(config: &ExtractionConfig) -> PdfDocumentLoader {
    PdfDocumentLoader::new(
        Arc::new(LopdfBackend),
        LoaderConfig {
            max_bytes: config.max_upload_bytes,
            max_attempts: config.load_attempts,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        },
    )
}
