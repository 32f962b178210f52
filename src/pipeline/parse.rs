//! Parser with a three-step fallback chain.
//!
//! ```text
//! candidate ──▶ strict ──✗──▶ sanitize+parse ──✗──▶ boundary slice of raw reply
//!                 │                │                  (sanitized) ──✗──▶ ParseFailure
//!                 ✓                ✓                      ✓
//! ```
//!
//! The boundary slice follows the expected root: first `{` .. last `}` for
//! object replies, first `[` .. last `]` for array replies. Object replies
//! never try brackets, so a list inside an object is not mistaken for the
//! whole reply.
//!
//! The chain only moves forward: once a strategy fails it is never retried
//! with different parameters. Strict parsing comes first so a reply that is
//! already clean JSON is returned exactly as the model wrote it; sanitizing
//! it could only lose information (e.g. escaped quotes inside strings).

use crate::error::ExtractError;
use crate::pipeline::sanitize::sanitize;
use crate::pipeline::validate::RootShape;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use tracing::debug;

/// Which link of the fallback chain produced the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParseStrategy {
    /// Candidate parsed as-is.
    Strict,
    /// Candidate parsed after [`sanitize`].
    Sanitized,
    /// First `{` .. last `}` of the raw reply, sanitized.
    BraceBoundary,
    /// First `[` .. last `]` of the raw reply, sanitized. Array roots only.
    BracketBoundary,
}

impl fmt::Display for ParseStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ParseStrategy::Strict => "strict",
            ParseStrategy::Sanitized => "sanitized",
            ParseStrategy::BraceBoundary => "brace-boundary",
            ParseStrategy::BracketBoundary => "bracket-boundary",
        };
        f.write_str(s)
    }
}

/// Parse `candidate`, falling back to sanitizing it and then to slicing the
/// outermost braces (or brackets, for an array `root`) out of `raw`.
///
/// `raw` is the untouched model reply; `candidate` is what the fence
/// stripper made of it (possibly identical).
pub fn parse_with_fallback(
    candidate: &str,
    raw: &str,
    root: RootShape,
) -> Result<(Value, ParseStrategy), ExtractError> {
    let strict_err = match serde_json::from_str::<Value>(candidate) {
        Ok(v) => return Ok((v, ParseStrategy::Strict)),
        Err(e) => e,
    };
    debug!("strict parse failed: {}", strict_err);

    let sanitized_err = match serde_json::from_str::<Value>(&sanitize(candidate)) {
        Ok(v) => {
            debug!("parsed after sanitizing candidate");
            return Ok((v, ParseStrategy::Sanitized));
        }
        Err(e) => e,
    };
    debug!("sanitized parse failed: {}", sanitized_err);

    let (slice, strategy, wanted) = match root {
        RootShape::Object => (brace_slice(raw), ParseStrategy::BraceBoundary, "object"),
        RootShape::ObjectArray => (bracket_slice(raw), ParseStrategy::BracketBoundary, "array"),
    };
    let Some(slice) = slice else {
        return Err(ExtractError::ParseFailure {
            reason: format!("no JSON {wanted} found in reply (last error: {sanitized_err})"),
            raw: raw.to_string(),
        });
    };

    match serde_json::from_str::<Value>(&sanitize(slice)) {
        Ok(v) => {
            debug!("parsed {} slice of {} bytes", strategy, slice.len());
            Ok((v, strategy))
        }
        Err(e) => Err(ExtractError::ParseFailure {
            reason: e.to_string(),
            raw: raw.to_string(),
        }),
    }
}

/// Slice from the first `{` to the last `}` inclusive, if they are in order.
pub fn brace_slice(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}

/// Slice from the first `[` to the last `]` inclusive, if they are in order.
pub fn bracket_slice(raw: &str) -> Option<&str> {
    let start = raw.find('[')?;
    let end = raw.rfind(']')?;
    (end > start).then(|| &raw[start..=end])
}
