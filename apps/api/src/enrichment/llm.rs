//! LLM-backed enrichment: one call for the structured résumé, one for keywords.
//!
//! The calls run concurrently at extraction temperature. An answer that is not
//! usable JSON leaves that part absent; only when neither call got an answer
//! at all is the enrichment an error (the caller then falls back to heuristics).

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::enrichment::prompts::{KEYWORD_PROMPT_TEMPLATE, RESUME_PARSE_PROMPT_TEMPLATE, RESUME_SCHEMA};
use crate::enrichment::{Enrichment, EnrichmentSource, ResumeEnricher};
use crate::errors::AppError;
use crate::llm_client::prompts::fill;
use crate::llm_client::{CallOptions, LlmClient, LlmError};
use crate::scoring::ParsedResumeFields;

pub struct LlmEnricher {
    llm: LlmClient,
}

impl LlmEnricher {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl ResumeEnricher for LlmEnricher {
    async fn enrich(&self, text: &str) -> Result<Enrichment, AppError> {
        let parse_prompt = fill(
            RESUME_PARSE_PROMPT_TEMPLATE,
            &[("schema", RESUME_SCHEMA), ("resume_text", text)],
        );
        let keyword_prompt = fill(KEYWORD_PROMPT_TEMPLATE, &[("resume_text", text)]);

        let (parsed, keywords) = tokio::join!(
            self.llm.complete_json(&parse_prompt, CallOptions::EXTRACTION),
            self.llm.complete_json(&keyword_prompt, CallOptions::EXTRACTION),
        );

        if let (Err(parse_err), Err(keyword_err)) = (&parsed, &keywords) {
            if unanswered(parse_err) && unanswered(keyword_err) {
                return Err(AppError::Llm(format!(
                    "résumé parse: {parse_err}; keyword extraction: {keyword_err}"
                )));
            }
        }

        let fields = match parsed {
            Ok(value) => fields_from_value(value),
            Err(e) => {
                warn!("résumé parse call failed: {e}");
                None
            }
        };
        let keywords = match keywords {
            Ok(value) => keywords_from_value(value),
            Err(e) => {
                warn!("keyword call failed: {e}");
                None
            }
        };

        debug!(
            has_fields = fields.is_some(),
            keyword_count = keywords.as_ref().map_or(0, Vec::len),
            "LLM enrichment complete"
        );

        Ok(Enrichment {
            fields,
            keywords,
            source: EnrichmentSource::Llm,
        })
    }
}

fn unanswered(error: &LlmError) -> bool {
    !matches!(error, LlmError::InvalidJson(_))
}

/// `None` unless the answer is a JSON object.
pub fn fields_from_value(value: Value) -> Option<ParsedResumeFields> {
    match value {
        Value::Object(_) => Some(ParsedResumeFields::from_value(value)),
        _ => {
            warn!("résumé parse answer is not a JSON object");
            None
        }
    }
}

/// Accepts `{"extracted_keywords": [...]}` or a bare array. Non-string and
/// duplicate entries are dropped.
pub fn keywords_from_value(value: Value) -> Option<Vec<String>> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("extracted_keywords") {
            Some(Value::Array(items)) => items,
            _ => return None,
        },
        _ => return None,
    };

    let mut keywords: Vec<String> = Vec::new();
    for item in items {
        if let Value::String(s) = item {
            let s = s.trim().to_string();
            if !s.is_empty() && !keywords.iter().any(|k| k.eq_ignore_ascii_case(&s)) {
                keywords.push(s);
            }
        }
    }
    Some(keywords)
}
