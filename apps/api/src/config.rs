use std::str::FromStr;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Startup fails if a variable is present but malformed.
#[derive(Debug, Clone)]
pub struct Config {
    /// Without a key the LLM enricher and `/reformat` are disabled.
    pub anthropic_api_key: Option<String>,
    pub port: u16,
    pub rust_log: String,
    pub extraction: ExtractionConfig,
}

/// Tunables of the PDF extraction pipeline.
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    pub max_upload_bytes: usize,
    pub load_attempts: u32,
    pub retry_delay_ms: u64,
    pub line_tolerance: f64,
    pub page_break_markers: bool,
    /// Horizontal gap under which adjacent runs are glued into one word;
    /// unset keeps one space between every pair of runs.
    pub line_join_gap: Option<f64>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: 10 * 1024 * 1024,
            load_attempts: 3,
            retry_delay_ms: 1000,
            line_tolerance: 5.0,
            page_break_markers: false,
            line_join_gap: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = ExtractionConfig::default();

        Ok(Config {
            anthropic_api_key: optional_env("ANTHROPIC_API_KEY"),
            port: parse_env("PORT", 8080u16)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            extraction: ExtractionConfig {
                max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", defaults.max_upload_bytes)?,
                load_attempts: parse_env("PDF_LOAD_ATTEMPTS", defaults.load_attempts)?,
                retry_delay_ms: parse_env("PDF_RETRY_DELAY_MS", defaults.retry_delay_ms)?,
                line_tolerance: parse_env("LINE_TOLERANCE", defaults.line_tolerance)?,
                page_break_markers: parse_env("PAGE_BREAK_MARKERS", defaults.page_break_markers)?,
                line_join_gap: parse_optional_env("LINE_JOIN_GAP")?,
            },
        })
    }
}

/// Unset or blank counts as absent.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: '{raw}'")),
        None => Ok(default),
    }
}

/// Like `parse_env`, but absence yields `None` instead of a default.
fn parse_optional_env<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    optional_env(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .with_context(|| format!("Environment variable '{key}' has an invalid value: '{raw}'"))
        })
        .transpose()
}
