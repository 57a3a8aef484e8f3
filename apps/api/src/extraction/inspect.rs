//! Document inspection: page count, the `/Info` dictionary and whether the
//! first pages carry any text layer at all. Cheap compared to a full
//! extraction; no line reconstruction or sanitizing happens here.

use bytes::Bytes;
use serde::Serialize;
use tracing::{error, info};

use crate::extraction::assembler::PdfDocument;
use crate::extraction::cancel::CancelFlag;
use crate::extraction::error::{ExtractionError, LoadFailure};
use crate::extraction::loader::PdfDocumentLoader;

/// Pages looked at when deciding whether a document is searchable.
pub const SEARCHABILITY_PAGES: u32 = 3;

/// Entries of the document information dictionary. Blank values are `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DocumentInfo {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub keywords: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    /// Raw PDF date string, e.g. `D:20240131120000Z`.
    pub creation_date: Option<String>,
    pub modification_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PdfInspection {
    pub page_count: u32,
    pub encrypted: bool,
    /// Some of the first `SEARCHABILITY_PAGES` pages show non-blank text.
    pub searchable: bool,
    pub info: DocumentInfo,
}

impl PdfInspection {
    pub fn of(document: &dyn PdfDocument) -> Self {
        Self {
            page_count: document.page_count(),
            encrypted: document.is_encrypted(),
            searchable: is_searchable(document),
            info: document.info(),
        }
    }
}

/// A page that fails to decode counts as having no text.
pub fn is_searchable(document: &dyn PdfDocument) -> bool {
    let last = document.page_count().min(SEARCHABILITY_PAGES);
    (1..=last).any(|page_number| {
        document
            .page_items(page_number)
            .is_ok_and(|items| items.iter().any(|item| !item.text.trim().is_empty()))
    })
}

#[derive(Clone)]
pub struct PdfInspector {
    loader: PdfDocumentLoader,
}

impl PdfInspector {
    pub fn new(loader: PdfDocumentLoader) -> Self {
        Self { loader }
    }

    pub async fn inspect(
        &self,
        bytes: Bytes,
        cancel: &CancelFlag,
    ) -> Result<PdfInspection, ExtractionError> {
        let document = self.loader.load(bytes, cancel).await?;

        let inspection = tokio::task::spawn_blocking(move || PdfInspection::of(document.as_ref()))
            .await
            .map_err(|e| {
                error!("inspection task failed: {e}");
                ExtractionError::LoadFailed {
                    attempts: 1,
                    cause: LoadFailure::Backend,
                    detail: format!("inspection task failed: {e}"),
                }
            })?;

        info!(
            pages = inspection.page_count,
            searchable = inspection.searchable,
            "PDF inspected"
        );
        Ok(inspection)
    }
}
