//! Normalization: fill defaults so consumers never branch on absence.
//!
//! Runs on the typed result after validation. Optional scalars get fixed
//! sentinel strings, optional sequences are already empty vectors thanks to
//! `#[serde(default)]`, and resource links the model left out or made up are
//! replaced with a search-engine query built from the resource's name and
//! type. Every resource therefore ends up clickable.

use once_cell::sync::Lazy;
use url::Url;

/// Sentinel for optional scalar fields the model left out.
pub const NOT_AVAILABLE: &str = "N/A";

/// Default search endpoint for fallback resource links.
pub const DEFAULT_SEARCH_BASE: &str = "https://www.google.com/search";

static DEFAULT_SEARCH_URL: Lazy<Url> =
    Lazy::new(|| Url::parse(DEFAULT_SEARCH_BASE).expect("valid default search URL"));

/// Settings for the normalization pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizeOptions {
    /// Search endpoint; the query is appended as `q=<name type>`.
    pub search_base: Url,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            search_base: DEFAULT_SEARCH_URL.clone(),
        }
    }
}

/// Types that can fill their own defaults.
pub trait Normalize {
    fn normalize(&mut self, opts: &NormalizeOptions);
}

/// Whether `url` is an absolute http(s) link worth keeping.
///
/// Empty strings, whitespace, the literal `n/a` and relative or
/// scheme-less text all count as unusable.
pub fn is_usable_url(url: &str) -> bool {
    let url = url.trim();
    if url.is_empty() || url.eq_ignore_ascii_case("n/a") {
        return false;
    }
    match Url::parse(url) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https") && parsed.has_host(),
        Err(_) => false,
    }
}

/// Build the deterministic fallback link for a resource.
pub fn fallback_search_url(base: &Url, name: &str, kind: &str) -> String {
    let query = format!("{} {}", name.trim(), kind.trim());
    let mut url = base.clone();
    url.query_pairs_mut().append_pair("q", query.trim());
    url.into()
}

/// Replace an empty/whitespace-only value with `default`.
pub fn or_default(value: &mut String, default: &str) {
    if value.trim().is_empty() {
        *value = default.to_string();
    }
}
