use super::{lenient, ReplySchema};
use crate::pipeline::normalize::{
    fallback_search_url, is_usable_url, or_default, Normalize, NormalizeOptions, NOT_AVAILABLE,
};
use crate::pipeline::validate::{FieldShape, FieldSpec, SchemaDescriptor};
use serde::{Deserialize, Serialize};

/// Ordered learning plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roadmap {
    #[serde(deserialize_with = "lenient::object_list")]
    pub steps: Vec<RoadmapStep>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadmapStep {
    #[serde(default, deserialize_with = "lenient::text")]
    pub title: String,

    #[serde(default, deserialize_with = "lenient::text")]
    pub description: String,

    #[serde(default, deserialize_with = "lenient::object_list")]
    pub resources: Vec<Resource>,

    /// Free-form duration such as `"1-2 weeks"`; `"N/A"` when omitted.
    #[serde(default, deserialize_with = "lenient::text")]
    pub time_estimate: String,
}

/// A book, course, article… recommended for a step.
///
/// After normalization `url` is always an absolute http(s) link.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: String,

    #[serde(default, deserialize_with = "lenient::text")]
    pub url: String,

    #[serde(rename = "type", default, deserialize_with = "lenient::text")]
    pub kind: String,
}

impl ReplySchema for Roadmap {
    const DESCRIPTOR: SchemaDescriptor = SchemaDescriptor::new(
        "roadmap",
        &[FieldSpec::new("steps", FieldShape::ObjectArray)],
    );
}

impl Normalize for Roadmap {
    fn normalize(&mut self, opts: &NormalizeOptions) {
        for step in &mut self.steps {
            step.normalize(opts);
        }
    }
}

impl Normalize for RoadmapStep {
    fn normalize(&mut self, opts: &NormalizeOptions) {
        or_default(&mut self.title, "Untitled Step");
        or_default(&mut self.description, "No description provided.");
        or_default(&mut self.time_estimate, NOT_AVAILABLE);
        for resource in &mut self.resources {
            resource.normalize(opts);
        }
    }
}

impl Normalize for Resource {
    fn normalize(&mut self, opts: &NormalizeOptions) {
        // The fallback query uses what the model actually wrote for the type,
        // before the "link" default kicks in.
        if is_usable_url(&self.url) {
            self.url = self.url.trim().to_string();
        } else {
            let name = if self.name.trim().is_empty() {
                "resource"
            } else {
                self.name.as_str()
            };
            self.url = fallback_search_url(&opts.search_base, name, &self.kind);
        }
        or_default(&mut self.name, "Unnamed Resource");
        or_default(&mut self.kind, "link");
    }
}
