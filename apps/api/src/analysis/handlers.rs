use axum::{
    extract::{Multipart, State},
    Json,
};
use bytes::Bytes;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::analysis::{analyze_extracted, AnalysisReport};
use crate::enrichment::prompts::{REFORMAT_PROMPT_TEMPLATE, REFORMAT_SYSTEM_TEMPLATE};
use crate::errors::AppError;
use crate::extraction::{decode_text_upload, CancelFlag, ExtractionResult, PdfInspection};
use crate::llm_client::prompts::fill;
use crate::llm_client::CallOptions;
use crate::scoring::{ParsedResumeFields, ScoreBreakdown};
use crate::state::AppState;

/// Multipart part that carries the résumé.
const FILE_FIELD: &str = "file";

#[derive(Deserialize)]
pub struct AnalyzeTextRequest {
    pub text: String,
    pub file_name: Option<String>,
}

#[derive(Deserialize)]
pub struct ScoreRequest {
    pub text: String,
    pub parsed_fields: Option<ParsedResumeFields>,
    pub keywords: Option<Vec<String>>,
}

#[derive(Deserialize)]
pub struct ReformatRequest {
    pub resume_text: String,
    pub template_name: String,
    pub prompt: String,
}

#[derive(Serialize)]
pub struct ReformatResponse {
    pub reformatted_text: String,
    pub template_name: String,
}

struct Upload {
    file_name: Option<String>,
    content_type: Option<String>,
    data: Bytes,
}

impl Upload {
    fn is_plain_text(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.starts_with("text/plain"))
            || self
                .file_name
                .as_deref()
                .is_some_and(|n| n.to_ascii_lowercase().ends_with(".txt"))
    }
}

/// POST /api/v1/analyze
/// Multipart upload (`file` part, PDF or plain text) → full analysis report.
pub async fn handle_analyze(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<AnalysisReport>, AppError> {
    let upload = read_upload(multipart).await?;
    debug!(
        file_name = ?upload.file_name,
        content_type = ?upload.content_type,
        size = upload.data.len(),
        "upload received"
    );

    let extraction = if upload.is_plain_text() {
        decode_text_upload(&upload.data, state.config.extraction.max_upload_bytes)?
    } else {
        extract_pdf(&state, upload.data).await?
    };

    let report = analyze_extracted(
        extraction,
        upload.file_name,
        state.enricher.as_ref(),
        &state.scorer,
        Utc::now().date_naive(),
    )
    .await?;
    Ok(Json(report))
}

/// POST /api/v1/inspect
/// Multipart PDF upload → page count, `/Info` metadata and whether the first
/// pages carry text. Nothing is reconstructed or scored.
pub async fn handle_inspect(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<PdfInspection>, AppError> {
    let upload = read_upload(multipart).await?;

    let cancel = CancelFlag::new();
    let guard = cancel.drop_guard();
    let inspection = state.inspector.inspect(upload.data, &cancel).await;
    guard.disarm();
    Ok(Json(inspection?))
}

/// POST /api/v1/analyze/text
pub async fn handle_analyze_text(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeTextRequest>,
) -> Result<Json<AnalysisReport>, AppError> {
    let extraction = decode_text_upload(req.text.as_bytes(), state.config.extraction.max_upload_bytes)?;
    let report = analyze_extracted(
        extraction,
        req.file_name,
        state.enricher.as_ref(),
        &state.scorer,
        Utc::now().date_naive(),
    )
    .await?;
    Ok(Json(report))
}

/// POST /api/v1/score
/// Pure engine call on caller-supplied text and collaborator data.
pub async fn handle_score(
    State(state): State<AppState>,
    Json(req): Json<ScoreRequest>,
) -> Result<Json<ScoreBreakdown>, AppError> {
    Ok(Json(state.scorer.score(
        &req.text,
        req.parsed_fields.as_ref(),
        req.keywords.as_deref(),
    )))
}

/// POST /api/v1/reformat
pub async fn handle_reformat(
    State(state): State<AppState>,
    Json(req): Json<ReformatRequest>,
) -> Result<Json<ReformatResponse>, AppError> {
    let llm = state.llm.as_ref().ok_or(AppError::LlmUnavailable)?;
    if req.resume_text.trim().is_empty() {
        return Err(AppError::Validation("resume_text must not be empty".to_string()));
    }

    info!("reformatting resume with template '{}'", req.template_name);
    let system = fill(
        REFORMAT_SYSTEM_TEMPLATE,
        &[
            ("template_name", req.template_name.as_str()),
            ("prompt", req.prompt.as_str()),
        ],
    );
    let prompt = fill(REFORMAT_PROMPT_TEMPLATE, &[("resume_text", req.resume_text.as_str())]);

    let reformatted_text = llm
        .complete(&prompt, &system, CallOptions::REWRITE)
        .await
        .map_err(|e| AppError::Llm(e.to_string()))?;

    Ok(Json(ReformatResponse {
        reformatted_text,
        template_name: req.template_name,
    }))
}

/// Runs the configured extractor. Dropping this future (client went away)
/// cancels the extraction at its next checkpoint.
async fn extract_pdf(state: &AppState, data: Bytes) -> Result<ExtractionResult, AppError> {
    let cancel = CancelFlag::new();
    let guard = cancel.drop_guard();
    let result = state.extractor.extract(data, &cancel).await;
    guard.disarm();
    Ok(result?)
}

async fn read_upload(mut multipart: Multipart) -> Result<Upload, AppError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await?;
        return Ok(Upload {
            file_name,
            content_type,
            data,
        });
    }
    Err(AppError::Validation(format!(
        "multipart body has no '{FILE_FIELD}' part"
    )))
}
