use super::{lenient, ReplySchema};
use crate::pipeline::normalize::{or_default, Normalize, NormalizeOptions, NOT_AVAILABLE};
use crate::pipeline::validate::{FieldShape, FieldSpec, SchemaDescriptor};
use serde::{Deserialize, Serialize};

/// Resume vs. job-description match produced by an ATS-style prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtsAnalysis {
    /// Overall match, usually a percentage string such as `"82%"`.
    #[serde(rename = "JDMatch", deserialize_with = "lenient::text")]
    pub jd_match: String,

    #[serde(rename = "MissingKeywords", deserialize_with = "lenient::text_list")]
    pub missing_keywords: Vec<String>,

    #[serde(rename = "ProfileSummary", deserialize_with = "lenient::text")]
    pub profile_summary: String,

    #[serde(rename = "ScoreBreakdown")]
    pub score_breakdown: ScoreBreakdown,
}

/// Per-dimension scores. Any dimension the model skipped reads `"N/A"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    #[serde(rename = "KeywordMatch", default, deserialize_with = "lenient::text")]
    pub keyword_match: String,

    #[serde(rename = "ExperienceMatch", default, deserialize_with = "lenient::text")]
    pub experience_match: String,

    #[serde(rename = "SkillsMatch", default, deserialize_with = "lenient::text")]
    pub skills_match: String,

    #[serde(rename = "EducationMatch", default, deserialize_with = "lenient::text")]
    pub education_match: String,
}

impl ReplySchema for AtsAnalysis {
    const DESCRIPTOR: SchemaDescriptor = SchemaDescriptor::new(
        "ats-analysis",
        &[
            FieldSpec::new("JDMatch", FieldShape::Scalar),
            FieldSpec::new("MissingKeywords", FieldShape::Array),
            FieldSpec::new("ProfileSummary", FieldShape::Scalar),
            FieldSpec::new("ScoreBreakdown", FieldShape::Object),
        ],
    );
}

impl Normalize for AtsAnalysis {
    fn normalize(&mut self, _opts: &NormalizeOptions) {
        self.missing_keywords.retain(|k| !k.trim().is_empty());
        let b = &mut self.score_breakdown;
        for score in [
            &mut b.keyword_match,
            &mut b.experience_match,
            &mut b.skills_match,
            &mut b.education_match,
        ] {
            or_default(score, NOT_AVAILABLE);
        }
    }
}
