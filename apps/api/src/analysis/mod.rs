//! Analysis pipeline: extraction result → enrichment → scoring → report.

pub mod handlers;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::enrichment::{EnrichmentSource, ResumeEnricher};
use crate::errors::AppError;
use crate::extraction::{ExtractionResult, ExtractionStrategy};
use crate::scoring::{total_experience_years, AtsScoringEngine, ScoreBreakdown};

/// Characters of canonical text echoed back in a report.
pub const TEXT_PREVIEW_CHARS: usize = 1000;

#[derive(Debug, Clone, Serialize)]
pub struct ExtractionSummary {
    pub pages_processed: u32,
    pub pages_failed: u32,
    pub strategy: ExtractionStrategy,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub analysis_id: Uuid,
    pub file_name: Option<String>,
    pub analyzed_at: DateTime<Utc>,
    pub score: ScoreBreakdown,
    pub extraction: ExtractionSummary,
    pub enrichment_source: EnrichmentSource,
    pub keywords: Vec<String>,
    pub experience_years: u32,
    pub text_preview: String,
}

/// Enriches and scores already extracted text.
pub async fn analyze_extracted(
    extraction: ExtractionResult,
    file_name: Option<String>,
    enricher: &dyn ResumeEnricher,
    scorer: &AtsScoringEngine,
    today: NaiveDate,
) -> Result<AnalysisReport, AppError> {
    let enrichment = enricher.enrich(&extraction.text).await?;

    let score = scorer.score(
        &extraction.text,
        enrichment.fields.as_ref(),
        enrichment.keywords.as_deref(),
    );
    let experience_years = enrichment
        .fields
        .as_ref()
        .map_or(0, |f| total_experience_years(&f.experiences, today));

    let report = AnalysisReport {
        analysis_id: Uuid::new_v4(),
        file_name,
        analyzed_at: Utc::now(),
        score,
        extraction: ExtractionSummary {
            pages_processed: extraction.pages_processed,
            pages_failed: extraction.pages_failed,
            strategy: extraction.strategy,
        },
        enrichment_source: enrichment.source,
        keywords: enrichment.keywords.unwrap_or_default(),
        experience_years,
        text_preview: extraction.text.chars().take(TEXT_PREVIEW_CHARS).collect(),
    };

    info!(
        analysis_id = %report.analysis_id,
        total = report.score.total,
        strategy = ?report.extraction.strategy,
        source = ?report.enrichment_source,
        "analysis complete"
    );
    Ok(report)
}
