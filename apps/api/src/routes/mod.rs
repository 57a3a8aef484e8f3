pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::analysis::handlers;
use crate::state::AppState;

/// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.extraction.max_upload_bytes + MULTIPART_OVERHEAD_BYTES;

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/analyze", post(handlers::handle_analyze))
        .route("/api/v1/analyze/text", post(handlers::handle_analyze_text))
        .route("/api/v1/inspect", post(handlers::handle_inspect))
        .route("/api/v1/score", post(handlers::handle_score))
        .route("/api/v1/reformat", post(handlers::handle_reformat))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::config::{Config, ExtractionConfig};
    use crate::extraction::loader::tests::build_pdf;

    const BOUNDARY: &str = "atscan-test-boundary";
    const RESUME_TEXT: &str = "Jane Smith\njane@example.com (555) 987-6543\n\nExperience\n- Led software development for data analysis tools";

    fn app() -> Router {
        let config = Config {
            anthropic_api_key: None,
            port: 0,
            rust_log: "info".to_string(),
            extraction: ExtractionConfig {
                retry_delay_ms: 0,
                ..ExtractionConfig::default()
            },
        };
        build_router(AppState::from_config(config))
    }

    fn multipart_body(file_name: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn upload(file_name: &str, content_type: &str, data: &[u8]) -> Request<Body> {
        upload_to("/api/v1/analyze", file_name, content_type, data)
    }

    fn upload_to(uri: &str, file_name: &str, content_type: &str, data: &[u8]) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart_body(file_name, content_type, data)))
            .unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn send(request: Request<Body>) -> (StatusCode, Value) {
        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(Request::get("/health").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["llm_enabled"], false);
    }

    #[tokio::test]
    async fn test_analyze_pdf_upload() {
        let pdf = build_pdf(&[vec![
            ("Jane Smith", 72, 720),
            ("jane@example.com", 72, 700),
            ("(555) 987-6543", 200, 700),
            ("Experience: software development and data analysis", 72, 660),
        ]]);
        let (status, body) = send(upload("cv.pdf", "application/pdf", &pdf)).await;

        assert_eq!(status, StatusCode::OK, "body: {body}");
        assert_eq!(body["file_name"], "cv.pdf");
        assert_eq!(body["extraction"]["strategy"], "layout");
        assert_eq!(body["extraction"]["pages_processed"], 1);
        assert_eq!(body["enrichment_source"], "heuristic");
        assert_eq!(body["score"]["components"]["contact"], 10);
        assert!(body["text_preview"]
            .as_str()
            .unwrap()
            .starts_with("Jane Smith\njane@example.com (555) 987-6543"));
    }

    #[tokio::test]
    async fn test_analyze_text_upload() {
        let (status, body) = send(upload("cv.txt", "text/plain", RESUME_TEXT.as_bytes())).await;
        assert_eq!(status, StatusCode::OK, "body: {body}");
        assert_eq!(body["extraction"]["strategy"], "text_upload");
        assert_eq!(body["text_preview"], RESUME_TEXT);
    }

    #[tokio::test]
    async fn test_analyze_rejects_non_pdf() {
        let (status, body) = send(upload("cv.docx", "application/octet-stream", b"PK\x03\x04 not a pdf")).await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(body["error"]["code"], "INVALID_FORMAT");
    }

    #[tokio::test]
    async fn test_analyze_requires_file_part() {
        let body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"note\"\r\n\r\nhello\r\n--{BOUNDARY}--\r\n"
        );
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/analyze")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_inspect_pdf_upload() {
        let pdf = build_pdf(&[vec![("Jane Smith", 72, 720)], vec![], vec![]]);
        let (status, body) = send(upload_to("/api/v1/inspect", "cv.pdf", "application/pdf", &pdf)).await;

        assert_eq!(status, StatusCode::OK, "body: {body}");
        assert_eq!(body["page_count"], 3);
        assert_eq!(body["searchable"], true);
        assert_eq!(body["encrypted"], false);
        assert_eq!(body["info"]["title"], "Jane Smith CV");
        assert_eq!(body["info"]["author"], Value::Null);
    }

    #[tokio::test]
    async fn test_inspect_rejects_non_pdf() {
        let (status, body) = send(upload_to("/api/v1/inspect", "cv.txt", "text/plain", b"Jane Smith")).await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(body["error"]["code"], "INVALID_FORMAT");
    }

    #[tokio::test]
    async fn test_analyze_text_endpoint_enforces_floor() {
        let (status, body) = send(post_json("/api/v1/analyze/text", json!({ "text": "too short" }))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "INSUFFICIENT_TEXT");
        assert_eq!(body["error"]["details"]["minimum"], 50);
    }

    #[tokio::test]
    async fn test_analyze_text_endpoint() {
        let (status, body) = send(post_json(
            "/api/v1/analyze/text",
            json!({ "text": RESUME_TEXT, "file_name": "pasted" }),
        ))
        .await;
        assert_eq!(status, StatusCode::OK, "body: {body}");
        assert_eq!(body["file_name"], "pasted");
        assert!(body["score"]["total"].as_u64().unwrap() <= 100);
    }

    #[tokio::test]
    async fn test_score_endpoint_uses_supplied_fields() {
        let (status, body) = send(post_json(
            "/api/v1/score",
            json!({
                "text": "no contact details here",
                "parsed_fields": {
                    "personal_data": { "name": "Jane", "email": "jane@example.com", "phone": "555" },
                    "experiences": "malformed"
                },
                "keywords": ["a", "b", "c", "d", "e"]
            }),
        ))
        .await;
        assert_eq!(status, StatusCode::OK, "body: {body}");
        assert_eq!(body["components"]["contact"], 10);
        assert_eq!(body["components"]["keywords"], 12);
        assert_eq!(body["components"]["format"], 0);
    }

    #[tokio::test]
    async fn test_reformat_without_key_is_unavailable() {
        let (status, body) = send(post_json(
            "/api/v1/reformat",
            json!({ "resume_text": RESUME_TEXT, "template_name": "modern", "prompt": "Bold headings" }),
        ))
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"]["code"], "LLM_UNAVAILABLE");
    }
}
