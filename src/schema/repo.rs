use super::{lenient, ReplySchema};
use crate::pipeline::normalize::{or_default, Normalize, NormalizeOptions, NOT_AVAILABLE};
use crate::pipeline::validate::{FieldShape, FieldSpec, SchemaDescriptor};
use serde::{Deserialize, Serialize};

/// Explanation of a single source file from a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileAnalysis {
    #[serde(deserialize_with = "lenient::text")]
    pub file_name: String,

    #[serde(deserialize_with = "lenient::text")]
    pub file_type: String,

    #[serde(deserialize_with = "lenient::text")]
    pub purpose: String,

    #[serde(deserialize_with = "lenient::object_list")]
    pub key_components: Vec<KeyComponent>,

    #[serde(deserialize_with = "lenient::text_list")]
    pub technologies_used: Vec<String>,

    /// `Low`, `Medium` or `High` as the model wrote it.
    #[serde(deserialize_with = "lenient::text")]
    pub complexity_level: String,

    #[serde(deserialize_with = "lenient::text")]
    pub brief_explanation: String,
}

/// A function, type or block called out in a [`FileAnalysis`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyComponent {
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: String,

    #[serde(default, deserialize_with = "lenient::text")]
    pub description: String,

    /// May legitimately be empty.
    #[serde(default, deserialize_with = "lenient::text")]
    pub code_snippet: String,
}

/// Summary of a whole repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectOverview {
    #[serde(deserialize_with = "lenient::text")]
    pub project_name: String,

    #[serde(deserialize_with = "lenient::text")]
    pub purpose: String,

    #[serde(deserialize_with = "lenient::text_list")]
    pub key_features: Vec<String>,

    #[serde(deserialize_with = "lenient::text_list")]
    pub technologies_used: Vec<String>,

    #[serde(deserialize_with = "lenient::text")]
    pub complexity: String,
}

impl ReplySchema for FileAnalysis {
    const DESCRIPTOR: SchemaDescriptor = SchemaDescriptor::new(
        "file-analysis",
        &[
            FieldSpec::new("fileName", FieldShape::Scalar),
            FieldSpec::new("fileType", FieldShape::Scalar),
            FieldSpec::new("purpose", FieldShape::Scalar),
            FieldSpec::new("keyComponents", FieldShape::ObjectArray),
            FieldSpec::new("technologiesUsed", FieldShape::Array),
            FieldSpec::new("complexityLevel", FieldShape::Scalar),
            FieldSpec::new("briefExplanation", FieldShape::Scalar),
        ],
    );
}

impl ReplySchema for ProjectOverview {
    const DESCRIPTOR: SchemaDescriptor = SchemaDescriptor::new(
        "project-overview",
        &[
            FieldSpec::new("projectName", FieldShape::Scalar),
            FieldSpec::new("purpose", FieldShape::Scalar),
            FieldSpec::new("keyFeatures", FieldShape::Array),
            FieldSpec::new("technologiesUsed", FieldShape::Array),
            FieldSpec::new("complexity", FieldShape::Scalar),
        ],
    );
}

impl Normalize for FileAnalysis {
    fn normalize(&mut self, _opts: &NormalizeOptions) {
        or_default(&mut self.complexity_level, NOT_AVAILABLE);
        self.technologies_used.retain(|t| !t.trim().is_empty());
        for component in &mut self.key_components {
            or_default(&mut component.name, "Unnamed Component");
            or_default(&mut component.description, "No description provided.");
        }
    }
}

impl Normalize for ProjectOverview {
    fn normalize(&mut self, _opts: &NormalizeOptions) {
        or_default(&mut self.complexity, NOT_AVAILABLE);
        self.key_features.retain(|f| !f.trim().is_empty());
        self.technologies_used.retain(|t| !t.trim().is_empty());
    }
}
