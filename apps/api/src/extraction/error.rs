use serde::Serialize;
use thiserror::Error;

/// Why the loader could not open a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadFailure {
    /// The file structure could not be parsed (broken xref, truncated body, ...).
    Corrupt,
    /// The file is encrypted and could not be opened without a password.
    Encrypted,
    /// The parser itself crashed or its worker could not be started.
    Backend,
}

/// Best guess at why a structurally valid document yielded no text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoTextHint {
    /// Pages were readable but carried no text runs, usually image-only content.
    LikelyScanned,
    /// The document declares encryption.
    LikelyEncrypted,
    /// Every page failed to decode.
    Unreadable,
}

/// Document-level extraction failures.
///
/// Carries kind plus cause only; the HTTP layer owns the wording shown to users.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExtractionError {
    #[error("input is not a PDF document")]
    InvalidFormat,

    #[error("input is {size} bytes, limit is {limit} bytes")]
    TooLarge { size: usize, limit: usize },

    #[error("document could not be opened after {attempts} attempt(s) ({cause:?}): {detail}")]
    LoadFailed {
        attempts: u32,
        cause: LoadFailure,
        detail: String,
    },

    #[error("document has no pages")]
    EmptyDocument,

    #[error("no page yielded extractable text ({hint:?})")]
    NoExtractableText { hint: NoTextHint },

    #[error("extracted text has {chars} characters, at least {minimum} required")]
    InsufficientText { chars: usize, minimum: usize },

    #[error("extraction cancelled")]
    Cancelled,
}

impl ExtractionError {
    /// Failures caused by the input itself (or the caller) rather than by the
    /// extraction strategy. A different strategy cannot do better on these.
    pub fn is_input_rejection(&self) -> bool {
        matches!(
            self,
            ExtractionError::InvalidFormat
                | ExtractionError::TooLarge { .. }
                | ExtractionError::Cancelled
        )
    }
}

/// Failure to read a single page. Recovered by the assembler, never fatal on its own.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PageError {
    #[error("page {0} does not exist")]
    Missing(u32),

    #[error("page {page}: {detail}")]
    Content { page: u32, detail: String },
}
