//! # llm-reply-json
//!
//! Turn free-form LLM replies into validated, typed JSON results.
//!
//! ## Why this crate?
//!
//! Asking a model for "JSON only" works most of the time. The rest of the
//! time the object arrives wrapped in a ```` ```json ```` fence, preceded by
//! "Here is the result:", with a trailing comma, double-escaped quotes, or a
//! stray control character. Sometimes a required field is missing, or a
//! link is blank. This crate recovers what it can, tells you precisely what
//! it could not, and can ask the model again when a reply is unusable.
//!
//! ## Pipeline Overview
//!
//! ```text
//! reply text
//!  │
//!  ├─ 1. Fence      pull the body out of a ```json block
//!  ├─ 2. Parse      strict → sanitized → first '{' .. last '}' (or '[' .. ']')
//!  ├─ 3. Validate   root shape, required fields, every violation collected
//!  ├─ 4. Type       serde into the schema struct (lenient field readers)
//!  └─ 5. Normalize  defaults, "N/A", fallback search links
//! ```
//!
//! Steps 1–5 are pure and synchronous ([`extract`]). The async
//! [`request`] layer wraps them in a bounded retry loop around a
//! [`ChatSession`].
//!
//! ## Quick Start
//!
//! ```rust
//! use llm_reply_json::{extract, schema::AtsAnalysis};
//!
//! let reply = "Here is the result:\n```json\n{\"JDMatch\": \"82%\", \"MissingKeywords\": [\"Docker\"], \"ProfileSummary\": \"Good fit\", \"ScoreBreakdown\": {}}\n```";
//! let ats: AtsAnalysis = extract(reply).unwrap();
//! assert_eq!(ats.jd_match, "82%");
//! ```
//!
//! Asking a model, with retries:
//!
//! ```rust,no_run
//! use llm_reply_json::{prompts, request, schema::Roadmap, ExtractConfig, ProviderSession};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / …
//!     let config = ExtractConfig::default();
//!     let session = ProviderSession::from_config(&config)?;
//!     let prompt = prompts::career_roadmap("Python, SQL", "Data Engineer");
//!     let outcome = request::<Roadmap, _>(&session, &prompt, &config).await?;
//!     for step in &outcome.value.steps {
//!         println!("{} ({})", step.title, step.time_estimate);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `reply2json` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! llm-reply-json = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod extract;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod request;
pub mod schema;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{Backoff, ExtractConfig, ExtractConfigBuilder, RetryOn};
pub use error::{ErrorKind, ExtractError, RequestError, Violation};
pub use extract::{extract, extract_value, extract_with, parse_reply};
pub use pipeline::normalize::NormalizeOptions;
pub use pipeline::validate::{FieldShape, FieldSpec, RootShape, SchemaDescriptor};
pub use progress::{NoopProgressCallback, ProgressCallback, RequestProgressCallback};
pub use request::{
    request, request_many, request_sync, ChatReply, ChatSession, ProviderSession, RequestOutcome,
};
pub use schema::ReplySchema;
