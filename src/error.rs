//! Error types for the llm-reply-json library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ExtractError`]: **Per-reply**: one model reply could not be turned
//!   into a valid result (empty, unparseable, or wrong shape). The pipeline
//!   returns it as a value and never retries on its own; the caller decides
//!   whether to ask the model again, show the message, or fall back.
//!
//! * [`RequestError`]: **Fatal** for a request: the chat provider is not
//!   configured, the API failed in a non-retryable way, or every attempt was
//!   used up. Returned from [`crate::request::request`] and friends.
//!
//! Every variant that comes from a model reply keeps the raw text so it can be
//! logged, but the `Display` output only names the problem and the
//! violations, never the whole reply.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Coarse classification of an [`ExtractError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    EmptyInput,
    ParseFailure,
    SchemaMismatch,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::EmptyInput => "empty input",
            ErrorKind::ParseFailure => "parse failure",
            ErrorKind::SchemaMismatch => "schema mismatch",
        };
        f.write_str(s)
    }
}

/// One reason a parsed reply does not satisfy its schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "violation", rename_all = "snake_case")]
pub enum Violation {
    /// Required field absent or `null`.
    Missing { field: String },

    /// Field present but of the wrong shape.
    WrongShape {
        field: String,
        expected: String,
        found: String,
    },

    /// The reply parsed, but not to a JSON object.
    NotAnObject { found: String },

    /// The reply parsed, but not to the JSON array its schema expects.
    NotAnArray { found: String },

    /// Structurally valid, but a nested value could not be read into the
    /// typed result.
    Malformed { detail: String },
}

impl Violation {
    /// Name of the offending field, if the violation is tied to one.
    pub fn field(&self) -> Option<&str> {
        match self {
            Violation::Missing { field } | Violation::WrongShape { field, .. } => Some(field),
            Violation::NotAnObject { .. }
            | Violation::NotAnArray { .. }
            | Violation::Malformed { .. } => None,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::Missing { field } => write!(f, "{field} (missing)"),
            Violation::WrongShape {
                field,
                expected,
                found,
            } => write!(f, "{field} (expected {expected}, found {found})"),
            Violation::NotAnObject { found } => {
                write!(f, "top-level value is {found}, expected object")
            }
            Violation::NotAnArray { found } => {
                write!(f, "top-level value is {found}, expected array")
            }
            Violation::Malformed { detail } => write!(f, "malformed value: {detail}"),
        }
    }
}

/// Join violations into a single `a; b; c` summary line.
pub fn summarize(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// A reply that could not be turned into a valid result.
///
/// Stored and returned as a value so callers can retry with a fresh reply.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ExtractError {
    /// The reply was empty or whitespace only.
    #[error("Model reply is empty")]
    EmptyInput { raw: String },

    /// No parse strategy produced valid JSON.
    #[error("Model reply is not valid JSON: {reason}")]
    ParseFailure { reason: String, raw: String },

    /// JSON parsed, but required fields are missing or mis-shaped.
    #[error("Model reply does not match the '{schema}' schema: {}", summarize(.violations))]
    SchemaMismatch {
        schema: String,
        violations: Vec<Violation>,
        raw: String,
    },
}

impl ExtractError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExtractError::EmptyInput { .. } => ErrorKind::EmptyInput,
            ExtractError::ParseFailure { .. } => ErrorKind::ParseFailure,
            ExtractError::SchemaMismatch { .. } => ErrorKind::SchemaMismatch,
        }
    }

    /// The original model reply, for diagnostic logging.
    pub fn raw_reply(&self) -> &str {
        match self {
            ExtractError::EmptyInput { raw }
            | ExtractError::ParseFailure { raw, .. }
            | ExtractError::SchemaMismatch { raw, .. } => raw,
        }
    }

    /// Whether asking the model again is likely to help: the reply held no
    /// usable JSON at all. A reply with wrong fields usually repeats them.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::EmptyInput | ErrorKind::ParseFailure)
    }

    /// Schema violations; empty for non-schema failures.
    pub fn violations(&self) -> &[Violation] {
        match self {
            ExtractError::SchemaMismatch { violations, .. } => violations,
            _ => &[],
        }
    }
}

/// Fatal errors of the request layer.
#[derive(Debug, Clone, Error)]
pub enum RequestError {
    // ── Provider errors ───────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The chat API returned an error.
    #[error("LLM API error: {message}")]
    LlmApiError { message: String },

    /// The chat call did not answer in time.
    #[error("LLM call timed out after {secs}s")]
    ApiTimeout { secs: u64 },

    /// 401/403 from the provider; not retried.
    #[error("Authentication error from provider '{provider}': {detail}")]
    AuthError { provider: String, detail: String },

    // ── Reply errors ──────────────────────────────────────────────────────
    /// A reply failure the retry policy chose not to retry.
    #[error(transparent)]
    Extract(#[from] ExtractError),

    /// Every attempt failed; `last` is the error of the final one.
    #[error("Failed after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        last: Box<RequestError>,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RequestError {
    /// Whether a fresh attempt could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            RequestError::LlmApiError { .. } | RequestError::ApiTimeout { .. }
        )
    }

    /// The reply failure behind this error, looking through
    /// [`RequestError::RetriesExhausted`] to the final attempt.
    pub fn extract_error(&self) -> Option<&ExtractError> {
        match self {
            RequestError::Extract(e) => Some(e),
            RequestError::RetriesExhausted { last, .. } => last.extract_error(),
            _ => None,
        }
    }
}
