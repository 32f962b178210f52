//! Synchronous extraction entry points.
//!
//! These run the whole pipeline on one reply that the caller already has in
//! hand. They do no I/O and keep no state between calls; to ask the model
//! again after a failure use [`crate::request::request`], which wraps these
//! in a bounded retry loop.

use crate::error::{ExtractError, Violation};
use crate::pipeline::normalize::NormalizeOptions;
use crate::pipeline::parse::{parse_with_fallback, ParseStrategy};
use crate::pipeline::validate::{validate, RootShape, SchemaDescriptor};
use crate::pipeline::fence;
use crate::schema::ReplySchema;
use serde_json::Value;
use tracing::debug;

/// Extract a typed, normalised result from a model reply.
///
/// # Errors
/// - [`ExtractError::EmptyInput`]: reply is empty or whitespace
/// - [`ExtractError::ParseFailure`]: no JSON could be recovered
/// - [`ExtractError::SchemaMismatch`]: JSON found, required fields wrong
///
/// # Example
/// ```rust
/// use llm_reply_json::{extract, schema::Roadmap};
///
/// let reply = r#"{"steps": [{"title": "Learn Git", "resources": [{"name": "Pro Git", "type": "book"}]},]}"#;
/// let roadmap: Roadmap = extract(reply).unwrap();
/// assert!(roadmap.steps[0].resources[0].url.starts_with("https://"));
/// ```
pub fn extract<T: ReplySchema>(raw: &str) -> Result<T, ExtractError> {
    extract_with(raw, &NormalizeOptions::default())
}

/// [`extract`] with explicit normalization settings.
pub fn extract_with<T: ReplySchema>(raw: &str, opts: &NormalizeOptions) -> Result<T, ExtractError> {
    let value = extract_value(raw, &T::DESCRIPTOR)?;
    let mut typed: T = serde_json::from_value(value).map_err(|e| {
        ExtractError::SchemaMismatch {
            schema: T::DESCRIPTOR.name.to_string(),
            violations: vec![Violation::Malformed {
                detail: e.to_string(),
            }],
            raw: raw.to_string(),
        }
    })?;
    typed.normalize(opts);
    Ok(typed)
}

/// Run strip → parse → validate against an arbitrary descriptor and return
/// the validated value without typing it.
///
/// The descriptor's root shape picks the boundary fallback: an
/// array-of-objects schema recovers `[` .. `]` from surrounding prose.
pub fn extract_value(raw: &str, schema: &SchemaDescriptor) -> Result<Value, ExtractError> {
    let (value, strategy) = parse_root(raw, schema.root)?;
    debug!("'{}' reply parsed via {} strategy", schema.name, strategy);
    validate(value, schema, raw)
}

/// Strip and parse only; no schema check.
pub fn parse_reply(raw: &str) -> Result<Value, ExtractError> {
    parse_reply_with_strategy(raw).map(|(value, _)| value)
}

/// Strip and parse, also reporting which fallback produced the value.
///
/// Expects an object reply; see [`extract_value`] for array replies.
pub fn parse_reply_with_strategy(raw: &str) -> Result<(Value, ParseStrategy), ExtractError> {
    parse_root(raw, RootShape::Object)
}

fn parse_root(raw: &str, root: RootShape) -> Result<(Value, ParseStrategy), ExtractError> {
    if raw.trim().is_empty() {
        return Err(ExtractError::EmptyInput {
            raw: raw.to_string(),
        });
    }
    let candidate = fence::strip_fence(raw);
    parse_with_fallback(candidate, raw, root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::schema::{
        AnalysisComparison, AtsAnalysis, FileAnalysis, KeywordTopics, PaperAnalysis, Roadmap,
    };
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn empty_input_fails_fast() {
        for raw in ["", "   ", "\n\t"] {
            let err = parse_reply(raw).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::EmptyInput);
        }
    }

    #[test]
    fn fenced_equals_unfenced() {
        let body = r#"{"a": [1, {"b": null}], "c": "d"}"#;
        let fenced = format!("Result below\n```json\n{body}\n```\nThanks");
        assert_eq!(parse_reply(&fenced).unwrap(), parse_reply(body).unwrap());
        assert_eq!(
            parse_reply_with_strategy(&fenced).unwrap().1,
            ParseStrategy::Strict
        );
    }

    #[test]
    fn ats_reply_in_fence() {
        let raw = "Here is the result:\n```json\n{\"JDMatch\": \"82%\", \"MissingKeywords\": [\"Docker\"], \"ProfileSummary\": \"Good fit\", \"ScoreBreakdown\": {\"KeywordMatch\":\"80%\",\"ExperienceMatch\":\"85%\",\"SkillsMatch\":\"75%\",\"EducationMatch\":\"90%\"}}\n```";
        let ats: AtsAnalysis = extract(raw).unwrap();
        assert_eq!(ats.jd_match, "82%");
        assert_eq!(ats.missing_keywords, vec!["Docker"]);
        assert_eq!(ats.score_breakdown.education_match, "90%");
    }

    #[test]
    fn ats_partial_breakdown_defaults() {
        let raw = r#"{"JDMatch": 70, "MissingKeywords": [], "ProfileSummary": "ok", "ScoreBreakdown": {"SkillsMatch": "60%"}}"#;
        let ats: AtsAnalysis = extract(raw).unwrap();
        assert_eq!(ats.jd_match, "70");
        assert_eq!(ats.score_breakdown.skills_match, "60%");
        assert_eq!(ats.score_breakdown.keyword_match, "N/A");
    }

    #[test]
    fn paper_missing_fields_are_all_named() {
        let raw = r#"{"Summary": "s", "KeyPoints": "not a list"}"#;
        let err = extract::<PaperAnalysis>(raw).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("KeyPoints (expected array, found string)"), "got: {msg}");
        assert!(msg.contains("PaperAnalysis (missing)"), "got: {msg}");
        assert!(msg.contains("Topics (missing)"), "got: {msg}");
    }

    #[test]
    fn file_analysis_component_must_be_objects() {
        let raw = json!({
            "fileName": "main.rs", "fileType": "Rust", "purpose": "entry",
            "keyComponents": ["main"], "technologiesUsed": ["tokio"],
            "complexityLevel": "Low", "briefExplanation": "starts the app"
        })
        .to_string();
        let err = extract::<FileAnalysis>(&raw).unwrap_err();
        assert_eq!(err.violations()[0].field(), Some("keyComponents"));
    }

    #[test]
    fn nested_object_where_text_expected_is_malformed() {
        let raw = r#"{"steps": [{"title": {"en": "Git"}}]}"#;
        let err = extract::<Roadmap>(raw).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SchemaMismatch);
        assert!(matches!(err.violations()[0], Violation::Malformed { .. }));
    }

    #[test]
    fn keyword_topics_drop_empty_groups() {
        let raw = r#"Sure: {"categories": {"Cloud": ["AWS", ""], "Empty": []}}"#;
        let topics: KeywordTopics = extract(raw).unwrap();
        assert_eq!(topics.categories.len(), 1);
        assert_eq!(topics.categories["Cloud"], vec!["AWS"]);
    }

    #[test]
    fn extract_value_with_custom_descriptor() {
        use crate::pipeline::validate::{FieldShape, FieldSpec};
        const CAREER: SchemaDescriptor = SchemaDescriptor::new(
            "career-suggestion",
            &[
                FieldSpec::new("careerPath", FieldShape::Scalar),
                FieldSpec::new("courses", FieldShape::Array),
            ],
        );
        let value = extract_value(r#"{"careerPath": "SRE", "courses": ["k8s"]}"#, &CAREER).unwrap();
        assert_eq!(value["careerPath"], "SRE");
    }

    #[test]
    fn backticks_in_fenced_snippet_survive() {
        let body = json!({
            "fileName": "README.md", "fileType": "Markdown", "purpose": "docs",
            "keyComponents": [{"name": "Usage", "description": "how to run",
                "codeSnippet": "```bash\ncargo run\n```"}],
            "technologiesUsed": ["cargo"], "complexityLevel": "Low",
            "briefExplanation": "project readme"
        })
        .to_string();
        let fenced = format!("Analysis:\n```json\n{body}\n```\nDone.");

        let (_, strategy) = parse_reply_with_strategy(&fenced).unwrap();
        assert_eq!(strategy, ParseStrategy::Strict);

        let from_fence: FileAnalysis = extract(&fenced).unwrap();
        let direct: FileAnalysis = extract(&body).unwrap();
        assert_eq!(from_fence, direct);
        assert_eq!(from_fence.key_components[0].code_snippet, "```bash\ncargo run\n```");
    }

    #[test]
    fn comparison_array_in_fence() {
        let raw = "```json\n[{\"criteria\": \"Overall Quality\", \"ratings\": {\"1\": \"7/10\", \"2\": \"9/10\"}, \"notes\": \"2 is sharper\"}]\n```";
        let (_, strategy) = parse_root(raw, RootShape::ObjectArray).unwrap();
        assert_eq!(strategy, ParseStrategy::Strict);

        let comparison: AnalysisComparison = extract(raw).unwrap();
        assert_eq!(comparison.criteria.len(), 1);
        assert_eq!(comparison.best_analysis(), Some("2"));
    }

    #[test]
    fn object_where_array_expected_is_schema_mismatch() {
        let raw = r#"{"criteria": "Overall Quality", "ratings": {"1": "7/10"}}"#;
        let err = extract::<AnalysisComparison>(raw).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SchemaMismatch);
        assert!(matches!(err.violations()[0], Violation::NotAnArray { .. }));
    }

    fn json_object() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i32>().prop_map(|n| json!(n)),
            "[a-zA-Z0-9 \"\\\\{},]{0,12}".prop_map(Value::String),
        ];
        let nested = leaf.prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                prop::collection::btree_map("[a-z]{1,6}", inner, 0..4)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        });
        prop::collection::btree_map("[a-z]{1,6}", nested, 0..5)
            .prop_map(|m| Value::Object(m.into_iter().collect()))
    }

    proptest! {
        #[test]
        fn clean_json_round_trips_unchanged(value in json_object()) {
            let text = serde_json::to_string(&value).unwrap();
            let (parsed, strategy) = parse_reply_with_strategy(&text).unwrap();
            prop_assert_eq!(strategy, ParseStrategy::Strict);
            prop_assert_eq!(parsed, value);
        }
    }
}
