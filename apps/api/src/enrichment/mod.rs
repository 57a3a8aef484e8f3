//! Résumé enrichment: turns canonical text into the structured fields and
//! keyword list the scoring engine consumes.
//!
//! Default: `FallbackEnricher(LlmEnricher → HeuristicEnricher)` when an API key
//! is configured, `HeuristicEnricher` alone otherwise.
//!
//! `AppState` holds an `Arc<dyn ResumeEnricher>`, chosen at startup.

pub mod heuristic;
pub mod llm;
pub mod prompts;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::warn;

use crate::errors::AppError;
use crate::scoring::ParsedResumeFields;

pub use heuristic::HeuristicEnricher;
pub use llm::LlmEnricher;

// ────────────────────────────────────────────────────────────────────────────
// Output data model
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentSource {
    Llm,
    Heuristic,
}

/// Collaborator data for scoring. Either part may be absent, which only means
/// it contributes nothing to the score.
#[derive(Debug, Clone, PartialEq)]
pub struct Enrichment {
    pub fields: Option<ParsedResumeFields>,
    pub keywords: Option<Vec<String>>,
    pub source: EnrichmentSource,
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait ResumeEnricher: Send + Sync {
    async fn enrich(&self, text: &str) -> Result<Enrichment, AppError>;
}

// ────────────────────────────────────────────────────────────────────────────
// FallbackEnricher
// ────────────────────────────────────────────────────────────────────────────

/// Tries `primary`; any error switches to `fallback`.
pub struct FallbackEnricher {
    primary: Arc<dyn ResumeEnricher>,
    fallback: Arc<dyn ResumeEnricher>,
}

impl FallbackEnricher {
    pub fn new(primary: Arc<dyn ResumeEnricher>, fallback: Arc<dyn ResumeEnricher>) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl ResumeEnricher for FallbackEnricher {
    async fn enrich(&self, text: &str) -> Result<Enrichment, AppError> {
        match self.primary.enrich(text).await {
            Ok(enrichment) => Ok(enrichment),
            Err(e) => {
                warn!("primary enricher failed, using fallback: {e}");
                self.fallback.enrich(text).await
            }
        }
    }
}
