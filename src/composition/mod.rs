//! Document Composition
//!
//! Resolves the validation references of an OSCAL document into a single,
//! deduplicated resource set.
//!
//! # Usage
//!
//! ```ignore
//! use assay::composition::Composer;
//! use assay::ComposeConfig;
//!
//! let composer = Composer::new(ComposeConfig::from_env())?;
//! let ctx = composer.fetch_context();
//! let (definition, summary) = composer.compose_from_path("component.yaml", &ctx)?;
//! println!("fetched {} validations", summary.fetched_resources);
//! ```
//!
//! # Resolution
//!
//! - Back-matter resources are registered as *existing* and always win over
//!   fetched resources with the same uuid
//! - Each href is fetched at most once per [`ResourceStore`]
//! - Failures are classified by [`ResolveError`] so callers can tell fetch,
//!   render, parse, and not-found failures apart

mod composer;
mod error;
mod fetch;
mod render;
mod store;
mod validation;

pub use composer::{ComposeSummary, Composer};
pub use error::{ComposeError, ResolveError};
pub use fetch::{DefaultFetcher, FetchContext, FetchError, Fetcher};
pub use render::{RenderError, RenderType, Renderer, TemplateData, TemplateRenderer, Variable, MASK};
pub use store::{ResourceStore, ValidationRendering};
pub use validation::{parse_validations, ParseError, ValidationDefinition, ValidationMetadata};
