//! Error types for composition

use std::path::PathBuf;

use thiserror::Error;

use super::fetch::FetchError;
use super::render::RenderError;
use super::validation::ParseError;
use crate::oscal::DocumentError;

/// Failure resolving a single link.
///
/// Each variant carries the offending href so callers can report it and
/// decide whether to abort or continue with partial results.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("invalid link '{href}': {reason}")]
    InvalidLink { href: String, reason: &'static str },

    #[error("resource '{id}' not found for link '{href}'")]
    NotFound { href: String, id: String },

    #[error("error fetching remote resource '{href}': {source}")]
    FetchFailure {
        href: String,
        #[source]
        source: FetchError,
    },

    #[error("error rendering remote resource '{href}': {source}")]
    RenderFailure {
        href: String,
        #[source]
        source: RenderError,
    },

    #[error("unable to read validations from '{href}': {source}")]
    ParseFailure {
        href: String,
        #[source]
        source: ParseError,
    },
}

impl ResolveError {
    /// The href of the link that failed
    pub fn href(&self) -> &str {
        match self {
            Self::InvalidLink { href, .. }
            | Self::NotFound { href, .. }
            | Self::FetchFailure { href, .. }
            | Self::RenderFailure { href, .. }
            | Self::ParseFailure { href, .. } => href,
        }
    }
}

/// Failure composing a document
#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("input file {path} does not exist - unable to digest document")]
    MissingInput { path: PathBuf },

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to render document {path}: {source}")]
    Render {
        path: PathBuf,
        #[source]
        source: RenderError,
    },

    #[error("invalid template configuration: {0}")]
    Template(#[from] RenderError),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error("failed to resolve validation for control {control_id}: {source}")]
    Resolve {
        control_id: String,
        #[source]
        source: ResolveError,
    },
}
