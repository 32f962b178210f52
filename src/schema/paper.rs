use super::{lenient, ReplySchema};
use crate::pipeline::normalize::{Normalize, NormalizeOptions};
use crate::pipeline::validate::{FieldShape, FieldSpec, SchemaDescriptor};
use serde::{Deserialize, Serialize};

/// Research-paper summary. `topics` seed follow-up paper searches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperAnalysis {
    #[serde(rename = "Summary", deserialize_with = "lenient::text")]
    pub summary: String,

    #[serde(rename = "KeyPoints", deserialize_with = "lenient::text_list")]
    pub key_points: Vec<String>,

    #[serde(rename = "PaperAnalysis", deserialize_with = "lenient::text")]
    pub paper_analysis: String,

    #[serde(rename = "Topics", deserialize_with = "lenient::text_list")]
    pub topics: Vec<String>,
}

impl ReplySchema for PaperAnalysis {
    const DESCRIPTOR: SchemaDescriptor = SchemaDescriptor::new(
        "paper-analysis",
        &[
            FieldSpec::new("Summary", FieldShape::Scalar),
            FieldSpec::new("KeyPoints", FieldShape::Array),
            FieldSpec::new("PaperAnalysis", FieldShape::Scalar),
            FieldSpec::new("Topics", FieldShape::Array),
        ],
    );
}

impl Normalize for PaperAnalysis {
    fn normalize(&mut self, _opts: &NormalizeOptions) {
        self.key_points.retain(|p| !p.trim().is_empty());
        self.topics.retain(|t| !t.trim().is_empty());
    }
}
