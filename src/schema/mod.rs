//! Typed reply schemas.
//!
//! Each reply kind the application asks the model for has a static
//! [`SchemaDescriptor`] (what the validator checks) and a typed struct (what
//! callers get back). Untyped JSON never leaves the pipeline: once the
//! descriptor is satisfied the value is deserialised into the struct and
//! normalised, so downstream code only sees fully populated Rust values.
//!
//! | Schema | Descriptor name | Used for |
//! |--------|-----------------|----------|
//! | [`AtsAnalysis`] | `ats-analysis` | resume vs. job description match |
//! | [`KeywordTopics`] | `keyword-topics` | grouping missing keywords into topics |
//! | [`PaperAnalysis`] | `paper-analysis` | research paper summary |
//! | [`Roadmap`] | `roadmap` | step-by-step learning plan |
//! | [`FileAnalysis`] | `file-analysis` | one source file of a repository |
//! | [`ProjectOverview`] | `project-overview` | a whole repository |
//! | [`AnalysisComparison`] | `analysis-comparison` | rating several paper analyses (top-level array) |

pub mod lenient;

mod ats;
mod comparison;
mod paper;
mod repo;
mod roadmap;
mod topics;

pub use ats::{AtsAnalysis, ScoreBreakdown};
pub use comparison::{rating_value, AnalysisComparison, ComparisonCriterion, OVERALL_QUALITY};
pub use paper::PaperAnalysis;
pub use repo::{FileAnalysis, KeyComponent, ProjectOverview};
pub use roadmap::{Resource, Roadmap, RoadmapStep};
pub use topics::KeywordTopics;

use crate::pipeline::normalize::Normalize;
use crate::pipeline::validate::SchemaDescriptor;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// A reply kind with a static descriptor and a typed, normalisable result.
pub trait ReplySchema: DeserializeOwned + Serialize + Normalize {
    /// Root shape and required fields checked before deserialisation.
    const DESCRIPTOR: SchemaDescriptor;
}

/// Descriptors of every built-in schema, in table order.
pub const ALL_DESCRIPTORS: &[SchemaDescriptor] = &[
    AtsAnalysis::DESCRIPTOR,
    KeywordTopics::DESCRIPTOR,
    PaperAnalysis::DESCRIPTOR,
    Roadmap::DESCRIPTOR,
    FileAnalysis::DESCRIPTOR,
    ProjectOverview::DESCRIPTOR,
    AnalysisComparison::DESCRIPTOR,
];

/// Look up a built-in descriptor by name.
pub fn descriptor_by_name(name: &str) -> Option<&'static SchemaDescriptor> {
    ALL_DESCRIPTORS.iter().find(|d| d.name == name)
}
