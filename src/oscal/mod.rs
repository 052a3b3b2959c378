//! OSCAL Document Model
//!
//! Typed subset of OSCAL 1.1 covering component definitions, assessment
//! results, and back-matter resources.

mod document;
mod types;

pub use document::{DocumentError, OscalDocument};
pub use types::{
    AssessmentResult, AssessmentResults, BackMatter, ComponentDefinition, ControlImplementation,
    DefinedComponent, Finding, FindingTarget, ImplementedRequirement, Link, Metadata,
    ObjectiveStatus, Observation, Property, RelatedObservation, RelevantEvidence, Resource,
    ResourceLink, VALIDATION_LINK_REL, VALIDATION_PROP, VALIDATION_PROP_VALUE,
};

/// Wildcard resource fragment selecting every resource behind an href
pub const WILDCARD: &str = "*";

/// Strip the local-reference `#` prefix from an href or fragment
pub fn trim_id_prefix(id: &str) -> &str {
    id.strip_prefix('#').unwrap_or(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim_id_prefix() {
        assert_eq!(trim_id_prefix("#abc"), "abc");
        assert_eq!(trim_id_prefix("abc"), "abc");
        assert_eq!(trim_id_prefix("https://x/y.yaml"), "https://x/y.yaml");
    }
}
