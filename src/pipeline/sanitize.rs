//! Lenient sanitizer: textual repair of almost-JSON.
//!
//! Models produce JSON that is *nearly* right: a stray control byte pasted in
//! from the source document, quotes escaped one time too many because the
//! model thought it was writing a string literal, literal `\n` where it meant
//! a line break, and the classic trailing comma before `}`. These passes fix
//! those without looking at the JSON structure at all, so they are a
//! best-effort repair, not a validity guarantee.
//!
//! ## Rule Order
//!
//! Control characters go first so nothing later has to skip around them.
//! Quotes are unescaped before escape sequences are expanded, and every kind
//! of whitespace produced by the expansion is collapsed before trailing
//! commas are removed. Each rule only ever removes or shrinks its own
//! pattern and never creates one an earlier rule handles, which is what makes
//! [`sanitize`] idempotent.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply every sanitizer rule to `input`.
///
/// Rules (applied in order):
/// 1. Remove control and invisible format characters (CR, LF, TAB survive)
/// 2. Unescape doubly escaped quotes: `\"` → `"`, `\'` → `'`
/// 3. Expand literal `\n`, `\t`, `\r` into real whitespace
/// 4. Collapse all line endings and whitespace runs into one space
/// 5. Remove trailing commas before `}` or `]`
pub fn sanitize(input: &str) -> String {
    let s = remove_control_chars(input);
    let s = unescape_quotes(&s);
    let s = expand_escape_sequences(&s);
    let s = collapse_whitespace(&s);
    let s = remove_trailing_commas(&s);
    s.trim().to_string()
}

// ── Rule 1: Remove control characters ────────────────────────────────────────

fn remove_control_chars(input: &str) -> String {
    input
        .chars()
        .filter(|&c| {
            let control = c.is_control() && !matches!(c, '\n' | '\r' | '\t');
            let invisible = matches!(
                c,
                '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{2060}' | '\u{FEFF}' | '\u{00AD}'
            );
            !control && !invisible
        })
        .collect()
}

// ── Rule 2: Unescape doubly escaped quotes ───────────────────────────────────

static RE_ESCAPED_QUOTE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"\\+(["'])"#).unwrap());

fn unescape_quotes(input: &str) -> String {
    RE_ESCAPED_QUOTE.replace_all(input, "$1").into_owned()
}

// ── Rule 3: Expand literal escape sequences ──────────────────────────────────

static RE_LITERAL_ESCAPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\+([ntr])").unwrap());

fn expand_escape_sequences(input: &str) -> String {
    RE_LITERAL_ESCAPE
        .replace_all(input, |caps: &regex::Captures<'_>| match &caps[1] {
            "n" => "\n",
            "t" => "\t",
            _ => "\r",
        })
        .into_owned()
}

// ── Rule 4: Collapse line endings and whitespace ─────────────────────────────

static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

fn collapse_whitespace(input: &str) -> String {
    RE_WHITESPACE.replace_all(input, " ").into_owned()
}

// ── Rule 5: Remove trailing commas ───────────────────────────────────────────

static RE_TRAILING_COMMA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:\s*,)+(\s*[}\]])").unwrap());

fn remove_trailing_commas(input: &str) -> String {
    RE_TRAILING_COMMA.replace_all(input, "$1").into_owned()
}

// ── Tests ────────────────────────────────────────────────────────────────────
