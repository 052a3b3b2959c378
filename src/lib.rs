//! # Assay
//!
//! Compliance-as-code engine for OSCAL documents.
//!
//! Two halves share the OSCAL data model in [`oscal`]:
//!
//! - **[`composition`]**: resolves the validation links of a component
//!   definition (local `#uuid` references, relative files, remote URLs),
//!   fetching each source once, and inlines the resolved validations into
//!   the document's back matter.
//! - **[`result`]**: reconciles two assessment-result runs control by
//!   control and observation by observation, and reports what changed.
//!
//! ## Quick Start
//!
//! ```ignore
//! use assay::composition::Composer;
//! use assay::result::{evaluate, select_runs};
//! use assay::oscal::OscalDocument;
//! use assay::ComposeConfig;
//!
//! assay::observability::init(&assay::ObservabilityConfig::from_env())?;
//!
//! let composer = Composer::new(ComposeConfig::from_env())?;
//! let (definition, summary) =
//!     composer.compose_from_path("component.yaml", &composer.fetch_context())?;
//!
//! let results = OscalDocument::from_file("assessment-results.yaml")?
//!     .into_assessment_results()?;
//! if let Some((latest, threshold)) = select_runs(&results.results) {
//!     let outcome = evaluate(latest, threshold);
//!     println!("passed: {}", outcome.passed());
//! }
//! ```

mod config;
mod parse;

pub mod composition;
pub mod observability;
pub mod oscal;
pub mod result;

// Re-exports
pub use config::{ComposeConfig, ComposeConfigBuilder};
pub use observability::{ObservabilityConfig, ObservabilityConfigBuilder, ObservabilityError};
pub use parse::parse_duration;
