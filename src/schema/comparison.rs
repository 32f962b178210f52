use super::{lenient, ReplySchema};
use crate::pipeline::normalize::{or_default, Normalize, NormalizeOptions};
use crate::pipeline::validate::{FieldShape, FieldSpec, SchemaDescriptor};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Name of the criterion that ranks analyses against each other.
pub const OVERALL_QUALITY: &str = "Overall Quality";

static RE_RATING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+(?:\.\d+)?").expect("valid rating regex"));

/// Side-by-side rating of several [`super::PaperAnalysis`] results.
///
/// The model answers with a bare JSON array, one element per criterion:
///
/// ```json
/// [{"criteria": "Overall Quality", "ratings": {"1": "7/10", "2": "9/10"}, "notes": "..."}]
/// ```
///
/// Ratings are keyed by the analysis id used in the prompt (1-based).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnalysisComparison {
    pub criteria: Vec<ComparisonCriterion>,
}

/// One row of an [`AnalysisComparison`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonCriterion {
    #[serde(deserialize_with = "lenient::text")]
    pub criteria: String,

    /// Analysis id → rating as written, e.g. `"8/10"` or `"8"`.
    #[serde(deserialize_with = "lenient::text_map")]
    pub ratings: BTreeMap<String, String>,

    #[serde(default, deserialize_with = "lenient::text")]
    pub notes: String,
}

/// First number in a rating such as `"8/10"`, `"7.5 out of 10"` or `"9"`.
pub fn rating_value(rating: &str) -> Option<f64> {
    RE_RATING.find(rating)?.as_str().parse().ok()
}

impl ComparisonCriterion {
    /// Numeric rating given to analysis `id`.
    pub fn score(&self, id: &str) -> Option<f64> {
        self.ratings.get(id).and_then(|r| rating_value(r))
    }
}

impl AnalysisComparison {
    /// Criterion named `name`, ignoring case and surrounding whitespace.
    pub fn criterion(&self, name: &str) -> Option<&ComparisonCriterion> {
        self.criteria
            .iter()
            .find(|c| c.criteria.trim().eq_ignore_ascii_case(name))
    }

    /// The [`OVERALL_QUALITY`] row, if the model produced one.
    pub fn overall(&self) -> Option<&ComparisonCriterion> {
        self.criterion(OVERALL_QUALITY)
    }

    /// Id of the analysis with the highest overall score. Ties go to the
    /// lowest id.
    pub fn best_analysis(&self) -> Option<&str> {
        let overall = self.overall()?;
        let mut best: Option<(&str, f64)> = None;
        for id in sorted_ids(&overall.ratings) {
            let Some(score) = overall.score(id) else {
                continue;
            };
            if best.map_or(true, |(_, top)| score > top) {
                best = Some((id, score));
            }
        }
        best.map(|(id, _)| id)
    }
}

/// Ids in numeric order when they are numbers, so `"10"` sorts after `"9"`.
fn sorted_ids(ratings: &BTreeMap<String, String>) -> Vec<&str> {
    let mut ids: Vec<&str> = ratings.keys().map(String::as_str).collect();
    ids.sort_by_key(|id| (id.parse::<u64>().unwrap_or(u64::MAX), *id));
    ids
}

impl ReplySchema for AnalysisComparison {
    const DESCRIPTOR: SchemaDescriptor = SchemaDescriptor::array_of(
        "analysis-comparison",
        &[
            FieldSpec::new("criteria", FieldShape::Scalar),
            FieldSpec::new("ratings", FieldShape::Object),
        ],
    );
}

impl Normalize for AnalysisComparison {
    fn normalize(&mut self, _opts: &NormalizeOptions) {
        for criterion in &mut self.criteria {
            or_default(&mut criterion.criteria, "Unnamed Criterion");
            criterion.ratings.retain(|_, r| !r.trim().is_empty());
            criterion.notes = criterion.notes.trim().to_string();
        }
    }
}
