use std::sync::Arc;

use crate::config::Config;
use crate::enrichment::{FallbackEnricher, HeuristicEnricher, LlmEnricher, ResumeEnricher};
use crate::extraction::{build_extractor, build_inspector, PdfInspector, TextExtractor};
use crate::llm_client::LlmClient;
use crate::scoring::AtsScoringEngine;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Layout extraction with a `pdf-extract` fallback.
    pub extractor: Arc<dyn TextExtractor>,
    pub inspector: PdfInspector,
    /// LLM with heuristic fallback when a key is configured, heuristics otherwise.
    pub enricher: Arc<dyn ResumeEnricher>,
    pub scorer: AtsScoringEngine,
    /// `None` without `ANTHROPIC_API_KEY`; `/reformat` is then unavailable.
    pub llm: Option<LlmClient>,
}

impl AppState {
    pub fn from_config(config: Config) -> Self {
        let llm = config.anthropic_api_key.clone().map(LlmClient::new);
        let heuristic: Arc<dyn ResumeEnricher> = Arc::new(HeuristicEnricher);
        let enricher: Arc<dyn ResumeEnricher> = match &llm {
            Some(client) => Arc::new(FallbackEnricher::new(
                Arc::new(LlmEnricher::new(client.clone())),
                heuristic,
            )),
            None => heuristic,
        };

        Self {
            extractor: build_extractor(&config.extraction),
            inspector: build_inspector(&config.extraction),
            enricher,
            scorer: AtsScoringEngine,
            llm,
            config,
        }
    }
}
