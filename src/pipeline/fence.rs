//! Fence stripping: isolate a ```` ```json ```` block from surrounding prose.
//!
//! Models asked for "JSON only" still like to answer
//! `Here is the result:\n```json\n{...}\n```\nLet me know!`. When a
//! `json`-tagged fence is present its body is the candidate; otherwise the
//! reply passes through untouched and the brace-boundary fallback in
//! [`super::parse`] gets a chance later. Absence of a fence is not an error.

use once_cell::sync::Lazy;
use regex::Regex;

/// Opening fence tagged `json` (any case), body captured lazily up to the
/// next closing fence that starts a line.
///
/// JSON strings cannot hold a raw newline, so backticks inside a string value
/// (a markdown snippet, say) never close the block.
static RE_JSON_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```[ \t]*(?i:json)[ \t]*\r?\n(.*?)\r?\n[ \t]*```")
        .expect("valid fence regex")
});

/// Return the body of the first `json` fence, trimmed, or `raw` unchanged.
pub fn strip_fence(raw: &str) -> &str {
    match RE_JSON_FENCE.captures(raw).and_then(|caps| caps.get(1)) {
        Some(body) => body.as_str().trim(),
        None => raw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_fence_with_prose_around() {
        let raw = "Here is the result:\n```json\n{\"a\": 1}\n```\nHope it helps.";
        assert_eq!(strip_fence(raw), "{\"a\": 1}");
    }

    #[test]
    fn tag_is_case_insensitive() {
        let raw = "```JSON\n[1, 2]\n```";
        assert_eq!(strip_fence(raw), "[1, 2]");
    }

    #[test]
    fn crlf_after_tag() {
        let raw = "```json\r\n{\"a\": 1}\r\n```";
        assert_eq!(strip_fence(raw), "{\"a\": 1}");
    }

    #[test]
    fn first_fence_wins() {
        let raw = "```json\n{\"first\": true}\n```\n```json\n{\"second\": true}\n```";
        assert_eq!(strip_fence(raw), "{\"first\": true}");
    }

    #[test]
    fn untagged_fence_passes_through() {
        let raw = "```\n{\"a\": 1}\n```";
        assert_eq!(strip_fence(raw), raw);
    }

    #[test]
    fn no_fence_passthrough() {
        let raw = "{\"a\": 1}";
        assert_eq!(strip_fence(raw), raw);
    }

    #[test]
    fn backticks_inside_string_do_not_close_fence() {
        let body = r#"{"fileName": "README.md", "keyComponents": [{"name": "usage", "codeSnippet": "```sh\ncargo run -- \"input.txt\"\n```"}]}"#;
        let raw = format!("Here you go:\n```json\n{body}\n```\nAnything else?");
        assert_eq!(strip_fence(&raw), body);
    }

    #[test]
    fn indented_closing_fence() {
        let raw = "```json\n{\n  \"a\": 1\n}\n  ```";
        assert_eq!(strip_fence(raw), "{\n  \"a\": 1\n}");
    }

    #[test]
    fn closing_fence_on_same_line_passes_through() {
        let raw = "```json\n{\"a\": 1}```";
        assert_eq!(strip_fence(raw), raw);
    }

    #[test]
    fn unterminated_fence_passes_through() {
        let raw = "```json\n{\"a\": 1}";
        assert_eq!(strip_fence(raw), raw);
    }
}
