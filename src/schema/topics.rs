use super::{lenient, ReplySchema};
use crate::pipeline::normalize::{Normalize, NormalizeOptions};
use crate::pipeline::validate::{FieldShape, FieldSpec, SchemaDescriptor};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Missing resume keywords grouped into study topics, e.g.
/// `{"Cloud": ["AWS", "Terraform"]}`. Each topic can seed a [`super::Roadmap`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordTopics {
    #[serde(deserialize_with = "lenient::text_list_map")]
    pub categories: BTreeMap<String, Vec<String>>,
}

impl ReplySchema for KeywordTopics {
    const DESCRIPTOR: SchemaDescriptor = SchemaDescriptor::new(
        "keyword-topics",
        &[FieldSpec::new("categories", FieldShape::Object)],
    );
}

impl Normalize for KeywordTopics {
    fn normalize(&mut self, _opts: &NormalizeOptions) {
        for keywords in self.categories.values_mut() {
            keywords.retain(|k| !k.trim().is_empty());
        }
        self.categories
            .retain(|topic, keywords| !topic.trim().is_empty() && !keywords.is_empty());
    }
}
