//! Prompt builders that ask the model for JSON-only replies.
//!
//! Every builder spells out the exact key layout its schema's descriptor
//! checks, so the prompt and the validator cannot drift apart silently: the
//! tests below parse the example embedded in each prompt through the real
//! pipeline.
//!
//! Callers can override the system prompt via
//! [`crate::config::ExtractConfig::system_prompt`]; the user prompts here are
//! plain strings and can be replaced wholesale.

use crate::schema::PaperAnalysis;
use serde_json::{json, Value};

/// Default system prompt sent ahead of every request.
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are a precise assistant that answers with a single JSON value.

Rules:
1. Output ONLY the JSON value requested by the user
2. Do NOT wrap it in ```json fences
3. Do NOT add commentary before or after it
4. Use double quotes for every key and string
5. Never leave a trailing comma
6. When you do not know a value, use an empty string instead of omitting the key"#;

const JSON_ONLY: &str = "Respond with ONLY the JSON object, with no additional text or markdown.";

/// Resume vs. job description analysis ([`crate::schema::AtsAnalysis`]).
pub fn ats_analysis(resume_text: &str, job_description: &str) -> String {
    format!(
        r#"Act as an applicant tracking system with deep knowledge of software engineering, data science and data engineering roles. Compare the resume with the job description and return:
{{
  "JDMatch": "overall match as a percentage string, e.g. \"82%\"",
  "MissingKeywords": ["important keywords from the job description missing in the resume"],
  "ProfileSummary": "detailed assessment of the candidate",
  "ScoreBreakdown": {{
    "KeywordMatch": "percentage string",
    "ExperienceMatch": "percentage string",
    "SkillsMatch": "percentage string",
    "EducationMatch": "percentage string"
  }}
}}

Resume:
"""{resume_text}"""

Job description:
"""{job_description}"""

{JSON_ONLY}"#
    )
}

/// Group missing keywords into study topics ([`crate::schema::KeywordTopics`]).
pub fn keyword_topics(missing_keywords: &[String]) -> String {
    format!(
        r#"Group these technologies and skills into 3 to 7 meaningful professional categories (for example "Cloud Platforms" or "Data Analysis Tools"):
{keywords}

Return:
{{
  "categories": {{
    "Category name": ["keyword", "keyword"]
  }}
}}

{JSON_ONLY}"#,
        keywords = missing_keywords.join(", ")
    )
}

/// Research paper summary ([`crate::schema::PaperAnalysis`]).
pub fn paper_analysis(paper_text: &str) -> String {
    format!(
        r#"Act as a research scientist. Analyse the paper below and return:
{{
  "Summary": "concise summary of the paper",
  "KeyPoints": ["key findings"],
  "PaperAnalysis": "assessment of the paper's contribution and limitations",
  "Topics": ["3 to 5 topics for further reading"]
}}

Paper:
"""{paper_text}"""

{JSON_ONLY}"#
    )
}

/// Learning roadmap from current skills to a target role
/// ([`crate::schema::Roadmap`]).
pub fn career_roadmap(current_skills: &str, desired_role: &str) -> String {
    roadmap(&format!(
        "Create a 4 to 6 step learning roadmap that takes a student with these skills:\n{current_skills}\n\nto the role \"{desired_role}\". Focus on closing the gap."
    ))
}

/// Learning roadmap for one topic of missing keywords
/// ([`crate::schema::Roadmap`]).
pub fn topic_roadmap(topic: &str, keywords: &[String], job_description: &str) -> String {
    roadmap(&format!(
        "Create a learning roadmap for the topic \"{topic}\", covering these keywords: {}.\n\nThe learner is targeting this job:\n\"\"\"{job_description}\"\"\"",
        keywords.join(", ")
    ))
}

fn roadmap(task: &str) -> String {
    format!(
        r#"{task}

For every step give a title, a description of what to learn and why, 2 or 3 resources (name, type such as book, course, tutorial, documentation or article, and a full https URL), and a realistic time estimate.

Return:
{{
  "steps": [
    {{
      "title": "Step title",
      "description": "What to learn and why",
      "resources": [
        {{"name": "Resource name", "url": "https://...", "type": "course"}}
      ],
      "timeEstimate": "1-2 weeks"
    }}
  ]
}}

{JSON_ONLY}"#
    )
}

/// Explanation of one source file ([`crate::schema::FileAnalysis`]).
pub fn file_analysis(file_name: &str, content: &str) -> String {
    format!(
        r#"Explain the source file below. Return:
{{
  "fileName": "{file_name}",
  "fileType": "language or file type",
  "purpose": "main purpose of the file",
  "keyComponents": [
    {{"name": "function or type", "description": "what it does", "codeSnippet": "short excerpt"}}
  ],
  "technologiesUsed": ["library or technology and how it is used"],
  "complexityLevel": "Low, Medium or High",
  "briefExplanation": "one-paragraph summary"
}}

Code:
"""{content}"""

{JSON_ONLY}"#
    )
}

/// Overview of a repository from a handful of its files
/// ([`crate::schema::ProjectOverview`]).
///
/// Only the first `max_files` entries are included to keep the prompt small.
pub fn project_overview(files: &[(String, String)], max_files: usize) -> String {
    let listing = files
        .iter()
        .take(max_files)
        .map(|(name, content)| format!("File: {name}\n\"\"\"{content}\"\"\""))
        .collect::<Vec<_>>()
        .join("\n\n");
    format!(
        r#"Describe the project these files belong to. Return:
{{
  "projectName": "name of the project",
  "purpose": "main objective",
  "keyFeatures": ["feature"],
  "technologiesUsed": ["technology"],
  "complexity": "Low, Medium or High"
}}

{listing}

{JSON_ONLY}"#
    )
}

/// Criteria the comparison prompt asks the model to rate, in order.
pub const COMPARISON_CRITERIA: [&str; 4] = [
    "Comprehensiveness of Summary",
    "Quality of Key Points",
    "Usefulness of Topics",
    crate::schema::OVERALL_QUALITY,
];

/// Side-by-side rating of several paper analyses
/// ([`crate::schema::AnalysisComparison`]).
///
/// Analyses are numbered from 1 in slice order; the reply's rating keys use
/// the same ids.
pub fn paper_comparison(analyses: &[PaperAnalysis]) -> String {
    let listing = Value::Array(
        analyses
            .iter()
            .enumerate()
            .map(|(i, a)| {
                json!({
                    "id": i + 1,
                    "summary": a.summary,
                    "keyPoints": a.key_points,
                    "topics": a.topics,
                })
            })
            .collect(),
    );
    let ratings = (1..=analyses.len())
        .map(|id| format!("\"{id}\": \"rating out of 10\""))
        .collect::<Vec<_>>()
        .join(", ");
    let rows = COMPARISON_CRITERIA
        .iter()
        .map(|criterion| {
            format!(
                "  {{\n    \"criteria\": \"{criterion}\",\n    \"ratings\": {{{ratings}}},\n    \"notes\": \"how the analyses differ on this criterion\"\n  }}"
            )
        })
        .collect::<Vec<_>>()
        .join(",\n");
    format!(
        r#"Act as a research reviewer. Compare the paper analyses below and rate each one from 1 to 10 on every criterion. Return a JSON array with one object per criterion:
[
{rows}
]

Analyses:
{listing}

Respond with ONLY the JSON array, with no additional text or markdown."#
    )
}
