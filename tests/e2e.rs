//! End-to-end tests for llm-reply-json.
//!
//! The reply-level tests run the full pipeline on canned model replies and
//! need no network. The `live_*` tests make real LLM API calls and are gated
//! behind the `E2E_ENABLED` environment variable so they do not run in CI
//! unless explicitly requested.
//!
//! Run with:
//!   E2E_ENABLED=1 cargo test --test e2e -- --nocapture

use llm_reply_json::pipeline::normalize::is_usable_url;
use llm_reply_json::pipeline::sanitize::sanitize;
use llm_reply_json::schema::{AnalysisComparison, AtsAnalysis, KeywordTopics, Roadmap};
use llm_reply_json::{
    extract, extract_value, parse_reply, prompts, request, ErrorKind, ExtractConfig,
    ProviderSession, SchemaDescriptor,
};

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Skip this test if E2E_ENABLED is not set.
macro_rules! e2e_skip_unless_enabled {
    () => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP: set E2E_ENABLED=1 to run e2e tests");
            return;
        }
    }};
}

/// Route library logs to the test output for the live tests.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("llm_reply_json=debug"))
        .with_test_writer()
        .try_init();
}

/// Descriptor of the built-in schema named `name`.
fn descriptor(name: &str) -> &'static SchemaDescriptor {
    llm_reply_json::schema::descriptor_by_name(name)
        .unwrap_or_else(|| panic!("no schema named {name}"))
}

// ── Reply scenarios ──────────────────────────────────────────────────────────

#[test]
fn fenced_ats_reply_with_preamble() {
    let raw = "Here is the result:\n```json\n{\"JDMatch\": \"82%\", \"MissingKeywords\": [\"Docker\"], \"ProfileSummary\": \"Good fit\", \"ScoreBreakdown\": {\"KeywordMatch\":\"80%\",\"ExperienceMatch\":\"85%\",\"SkillsMatch\":\"75%\",\"EducationMatch\":\"90%\"}}\n```";

    let ats: AtsAnalysis = extract(raw).expect("valid ATS reply");
    assert_eq!(ats.jd_match, "82%");
    assert_eq!(ats.missing_keywords, vec!["Docker".to_string()]);
    assert_eq!(ats.profile_summary, "Good fit");

    let json = serde_json::to_value(&ats).unwrap();
    assert_eq!(json["ScoreBreakdown"]["ExperienceMatch"], "85%");
}

#[test]
fn roadmap_with_trailing_comma_and_missing_url() {
    let raw = r#"{"steps": [{"title":"Learn Git","description":"...","resources":[{"name":"Pro Git","type":"book"}],"timeEstimate":"1 week"},]}"#;

    let roadmap: Roadmap = extract(raw).expect("repaired roadmap");
    assert_eq!(roadmap.steps.len(), 1);

    let step = &roadmap.steps[0];
    assert_eq!(step.title, "Learn Git");
    assert_eq!(step.time_estimate, "1 week");
    assert_eq!(step.resources.len(), 1);
    assert_eq!(step.resources[0].kind, "book");
    assert_eq!(
        step.resources[0].url,
        "https://www.google.com/search?q=Pro+Git+book"
    );
}

#[test]
fn refusal_is_a_parse_failure() {
    let err = extract::<Roadmap>("I cannot comply with this request.").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ParseFailure);
    assert_eq!(err.raw_reply(), "I cannot comply with this request.");
}

#[test]
fn steps_as_string_is_a_schema_mismatch() {
    let err = extract::<Roadmap>(r#"{"steps": "Learn Git, then Docker"}"#).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SchemaMismatch);
    assert_eq!(err.violations().len(), 1);
    assert_eq!(err.violations()[0].field(), Some("steps"));
    assert!(err.to_string().contains("steps"));
}

#[test]
fn fenced_comparison_array() {
    let raw = r#"```json
[
  {"criteria": "Comprehensiveness of Summary", "ratings": {"1": "8/10", "2": "6/10"}, "notes": "1 covers the method"},
  {"criteria": "Overall Quality", "ratings": {"1": "7/10", "2": "8.5/10"}, "notes": "2 is more precise"}
]
```"#;

    let comparison: AnalysisComparison = extract(raw).expect("valid comparison reply");
    assert_eq!(comparison.criteria.len(), 2);
    assert_eq!(comparison.criteria[0].score("1"), Some(8.0));
    assert_eq!(comparison.overall().and_then(|c| c.score("2")), Some(8.5));
    assert_eq!(comparison.best_analysis(), Some("2"));

    let json = serde_json::to_value(&comparison).unwrap();
    assert!(json.is_array());
    assert_eq!(json[1]["ratings"]["1"], "7/10");
}

#[test]
fn comparison_array_inside_prose() {
    let raw = "Here is my comparison of the two analyses:\n[{\"criteria\": \"Overall Quality\", \"ratings\": {\"1\": \"9/10\", \"2\": \"4/10\"},},]\nLet me know if you need anything else [happy to help].";

    let comparison: AnalysisComparison = extract(raw).expect("bracket-boundary recovery");
    assert_eq!(comparison.criteria.len(), 1);
    assert_eq!(comparison.criteria[0].notes, "");
    assert_eq!(comparison.best_analysis(), Some("1"));

    // Object parsing slices braces, so it only sees the first element.
    let object = parse_reply(raw).unwrap();
    assert_eq!(object["criteria"], "Overall Quality");
}

#[test]
fn comparison_element_violations_are_indexed() {
    let raw = r#"[{"criteria": "Overall Quality", "ratings": {"1": "7/10"}}, {"criteria": "Depth"}]"#;
    let err = extract::<AnalysisComparison>(raw).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SchemaMismatch);
    assert_eq!(err.violations()[0].field(), Some("[1].ratings"));
}

// ── Pipeline properties on realistic replies ─────────────────────────────────

#[test]
fn clean_json_passes_through_unchanged() {
    let raw = r#"{"categories": {"Cloud": ["AWS", "GCP"], "Containers": ["Docker"]}}"#;
    let expected: serde_json::Value = serde_json::from_str(raw).unwrap();
    assert_eq!(parse_reply(raw).unwrap(), expected);
}

#[test]
fn fence_is_transparent() {
    let body = r#"{"Summary": "s", "KeyPoints": ["a"], "PaperAnalysis": "p", "Topics": ["t"]}"#;
    let fenced = format!("Sure!\n```JSON\n{body}\n```\nLet me know if you need more.");
    assert_eq!(parse_reply(&fenced).unwrap(), parse_reply(body).unwrap());
}

#[test]
fn trailing_commas_are_repaired() {
    let value = parse_reply(r#"{"a": [1, 2,], "b": {"c": 3,},}"#).unwrap();
    assert_eq!(value, serde_json::json!({"a": [1, 2], "b": {"c": 3}}));
}

#[test]
fn escaped_reply_is_recovered() {
    let raw = r#"{\"categories\": {\"Data\": [\"SQL\", \"Spark\"]}}"#;
    let topics: KeywordTopics = extract(raw).unwrap();
    assert_eq!(topics.categories["Data"], vec!["SQL", "Spark"]);
}

#[test]
fn sanitizer_is_idempotent_on_messy_replies() {
    let samples = [
        "{\"a\": \"x\\\\\\\"y\",\u{200B} \"b\": [1,,],\r\n}",
        "\u{FEFF}```json\n{\\n\\t\"k\": \\'v\\',}\n```",
        "\x07{\"t\":\t\"tab\"}\x00",
    ];
    for s in samples {
        let once = sanitize(s);
        assert_eq!(sanitize(&once), once, "not idempotent for {s:?}");
    }
}

#[test]
fn fallback_urls_are_always_usable() {
    let raw = r#"{"steps": [{"title": "Rust", "resources": [
        {"name": "The Book", "url": "", "type": "book"},
        {"name": "Rustlings", "url": "n/a", "type": "course"},
        {"name": "Docs", "url": "docs.rs", "type": "documentation"},
        {"name": "Blog", "url": "https://blog.rust-lang.org/", "type": "article"},
        {"url": null}
    ]}]}"#;
    let roadmap: Roadmap = extract(raw).unwrap();
    let resources = &roadmap.steps[0].resources;
    assert_eq!(resources.len(), 5);
    for r in resources {
        assert!(is_usable_url(&r.url), "unusable url {:?}", r.url);
        assert!(r.url.starts_with("https://"));
    }
    assert_eq!(resources[3].url, "https://blog.rust-lang.org/");
    assert_eq!(resources[4].name, "Unnamed Resource");
    assert_eq!(resources[4].kind, "link");
}

#[test]
fn every_missing_field_is_reported() {
    let err = extract_value("{}", descriptor("ats-analysis")).unwrap_err();
    let fields: Vec<_> = err.violations().iter().filter_map(|v| v.field()).collect();
    assert_eq!(
        fields,
        vec!["JDMatch", "MissingKeywords", "ProfileSummary", "ScoreBreakdown"]
    );
}

#[test]
fn prompt_builders_name_schema_fields() {
    let prompt = prompts::ats_analysis("resume", "jd");
    for field in descriptor("ats-analysis").fields {
        assert!(prompt.contains(field.name), "prompt lacks {}", field.name);
    }
}

// ── Live provider tests ──────────────────────────────────────────────────────

#[tokio::test]
async fn live_roadmap_request() {
    e2e_skip_unless_enabled!();
    init_tracing();

    let config = ExtractConfig::builder()
        .retry_delay_ms(1000)
        .build()
        .expect("config");
    let session = ProviderSession::from_config(&config).expect("provider");
    let prompt = prompts::career_roadmap("Python, SQL", "Data Engineer");

    let outcome = request::<Roadmap, _>(&session, &prompt, &config)
        .await
        .expect("roadmap request");

    println!(
        "attempts={} tokens={}/{} {}ms",
        outcome.attempts, outcome.prompt_tokens, outcome.completion_tokens, outcome.duration_ms
    );
    assert!(!outcome.value.steps.is_empty());
    for step in &outcome.value.steps {
        assert!(!step.title.is_empty());
        for r in &step.resources {
            assert!(is_usable_url(&r.url), "unusable url {:?}", r.url);
        }
    }
}

#[tokio::test]
async fn live_keyword_topics_request() {
    e2e_skip_unless_enabled!();
    init_tracing();

    let config = ExtractConfig::default();
    let session = ProviderSession::from_config(&config).expect("provider");
    let keywords: Vec<String> = ["AWS", "Kubernetes", "Terraform", "Pandas", "Tableau"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    let outcome = request::<KeywordTopics, _>(&session, &prompts::keyword_topics(&keywords), &config)
        .await
        .expect("topics request");
    assert!(!outcome.value.categories.is_empty());
}
