//! OSCAL Model Subset
//!
//! The slice of the OSCAL 1.1 model that composition and result
//! reconciliation operate on. Field names serialize in kebab-case to match
//! the OSCAL JSON and YAML encodings; unknown fields are ignored on input.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Property name marking a back-matter resource as a validation
pub const VALIDATION_PROP: &str = "type";

/// Property value marking a back-matter resource as a validation
pub const VALIDATION_PROP_VALUE: &str = "validation";

/// Link relation used for validation references
pub const VALIDATION_LINK_REL: &str = "lula";

/// Document metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Metadata {
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,

    #[serde(default)]
    pub version: String,

    #[serde(default)]
    pub oscal_version: String,
}

/// Name/value annotation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Property {
    pub name: String,
    pub value: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ns: Option<String>,
}

impl Property {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            ns: None,
        }
    }
}

/// Reference from a model element to a resource
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Link {
    /// URI or local fragment (`#<uuid>`)
    pub href: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rel: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,

    /// Specific resource id within the href, or `*` for all of them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_fragment: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Link {
    /// Create a link with only an href
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            ..Default::default()
        }
    }

    /// Create a validation link pointing at a resource in the back matter
    pub fn local_validation(uuid: &str) -> Self {
        Self {
            href: format!("#{}", uuid),
            rel: Some(VALIDATION_LINK_REL.to_string()),
            ..Default::default()
        }
    }

    /// Set the resource fragment
    pub fn with_fragment(mut self, fragment: impl Into<String>) -> Self {
        self.resource_fragment = Some(fragment.into());
        self
    }

    /// Set the link relation
    pub fn with_rel(mut self, rel: impl Into<String>) -> Self {
        self.rel = Some(rel.into());
        self
    }

    /// Whether this link references a validation
    pub fn is_validation(&self) -> bool {
        self.rel.as_deref() == Some(VALIDATION_LINK_REL)
    }
}

/// Link inside a resource pointing at its content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ResourceLink {
    pub href: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
}

/// Back-matter resource
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Resource {
    pub uuid: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Payload for validations: the validation document itself
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub props: Vec<Property>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rlinks: Vec<ResourceLink>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

impl Resource {
    /// Whether the resource carries the validation type property
    pub fn is_validation(&self) -> bool {
        self.props
            .iter()
            .any(|p| p.name == VALIDATION_PROP && p.value == VALIDATION_PROP_VALUE)
    }
}

/// Supporting resources of a document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BackMatter {
    #[serde(default)]
    pub resources: Vec<Resource>,
}

// =============================================================================
// Component Definition
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ComponentDefinition {
    pub uuid: String,
    pub metadata: Metadata,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<DefinedComponent>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub back_matter: Option<BackMatter>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DefinedComponent {
    pub uuid: String,

    #[serde(rename = "type", default)]
    pub component_type: String,

    pub title: String,

    #[serde(default)]
    pub description: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub control_implementations: Vec<ControlImplementation>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ControlImplementation {
    pub uuid: String,
    pub source: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub implemented_requirements: Vec<ImplementedRequirement>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ImplementedRequirement {
    pub uuid: String,
    pub control_id: String,

    #[serde(default)]
    pub description: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<Link>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

// =============================================================================
// Assessment Results
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AssessmentResults {
    pub uuid: String,
    pub metadata: Metadata,

    #[serde(default)]
    pub results: Vec<AssessmentResult>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub back_matter: Option<BackMatter>,
}

/// One evaluation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AssessmentResult {
    pub uuid: String,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub description: String,

    pub start: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub props: Vec<Property>,

    #[serde(default)]
    pub findings: Vec<Finding>,

    #[serde(default)]
    pub observations: Vec<Observation>,
}

impl AssessmentResult {
    /// Whether this result is marked as the comparison threshold
    pub fn is_threshold(&self) -> bool {
        self.props
            .iter()
            .any(|p| p.name == "threshold" && p.value == "true")
    }
}

/// Per-control assessment outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Finding {
    pub uuid: String,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub description: String,

    pub target: FindingTarget,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related_observations: Vec<RelatedObservation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FindingTarget {
    #[serde(rename = "type", default)]
    pub target_type: String,

    pub target_id: String,

    pub status: ObjectiveStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ObjectiveStatus {
    /// `satisfied` or `not-satisfied`
    pub state: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RelatedObservation {
    pub observation_uuid: String,
}

/// Outcome of a single executed check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Observation {
    pub uuid: String,

    /// Stable name of the check across runs
    pub description: String,

    #[serde(default)]
    pub methods: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relevant_evidence: Vec<RelevantEvidence>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collected: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RelevantEvidence {
    /// Carries the satisfaction token, e.g. `Result: satisfied`
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}
