//! Composition configuration
//!
//! Provides a builder-pattern configuration for document composition:
//! template rendering of documents and fetched validations, and the fetch
//! timeout applied to every remote resource.

use std::time::Duration;

use tracing::warn;

use crate::composition::{RenderType, TemplateData};
use crate::parse::{parse_duration, parse_flag};

/// Configuration for a [`Composer`](crate::composition::Composer).
///
/// # Example
///
/// ```ignore
/// use assay::ComposeConfig;
///
/// // Load from environment variables
/// let config = ComposeConfig::from_env();
///
/// // Or build programmatically
/// let config = ComposeConfig::builder()
///     .render("all", true)
///     .fetch_timeout(Duration::from_secs(10))
///     .constant("namespace", "istio-system")
///     .build();
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComposeConfig {
    /// Render mode for the composed document; `None` disables rendering
    pub render_type: Option<RenderType>,

    /// Also render validations fetched while resolving links.
    /// Only honored when `render_type` is set.
    pub render_validations: bool,

    /// Upper bound for each individual fetch
    pub fetch_timeout: Option<Duration>,

    /// Values substituted into templates
    pub template_data: TemplateData,
}

impl ComposeConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `ASSAY_RENDER`: "constants", "non-sensitive", "all", "masked" (default: unset, no rendering)
    /// - `ASSAY_RENDER_VALIDATIONS`: "true"/"false" (default: "false")
    /// - `ASSAY_FETCH_TIMEOUT`: e.g., "30s", "2m" (default: unset, no timeout)
    pub fn from_env() -> Self {
        let render = std::env::var("ASSAY_RENDER").unwrap_or_default();
        let render_validations = std::env::var("ASSAY_RENDER_VALIDATIONS")
            .map(|s| parse_flag(&s))
            .unwrap_or(false);

        let mut builder = Self::builder().render(&render, render_validations);

        if let Ok(value) = std::env::var("ASSAY_FETCH_TIMEOUT") {
            match parse_duration(&value) {
                Some(timeout) => builder = builder.fetch_timeout(timeout),
                None => warn!(value = %value, "Ignoring invalid ASSAY_FETCH_TIMEOUT"),
            }
        }

        builder.build()
    }

    /// Create a new builder for programmatic configuration.
    pub fn builder() -> ComposeConfigBuilder {
        ComposeConfigBuilder::default()
    }

    /// Whether fetched validations are rendered before parsing
    pub fn renders_validations(&self) -> bool {
        self.render_type.is_some() && self.render_validations
    }
}

/// Builder for ComposeConfig
#[derive(Debug, Clone, Default)]
pub struct ComposeConfigBuilder {
    config: ComposeConfig,
}

impl ComposeConfigBuilder {
    /// Apply render settings given as user input.
    ///
    /// An empty render type disables rendering entirely (and ignores
    /// `render_validations`); an unknown one falls back to non-sensitive.
    pub fn render(mut self, render_type: &str, render_validations: bool) -> Self {
        if render_type.trim().is_empty() {
            if render_validations {
                warn!("`render` not specified, `render-validations` will be ignored");
            }
            self.config.render_type = None;
            self.config.render_validations = false;
            return self;
        }

        let mode = render_type.parse().unwrap_or_else(|e| {
            warn!(error = %e, "Invalid render type, defaulting to non-sensitive");
            RenderType::NonSensitive
        });
        self.config.render_type = Some(mode);
        self.config.render_validations = render_validations;
        self
    }

    pub fn render_type(mut self, mode: RenderType) -> Self {
        self.config.render_type = Some(mode);
        self
    }

    pub fn render_validations(mut self, enabled: bool) -> Self {
        self.config.render_validations = enabled;
        self
    }

    pub fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.config.fetch_timeout = Some(timeout);
        self
    }

    pub fn template_data(mut self, data: TemplateData) -> Self {
        self.config.template_data = data;
        self
    }

    pub fn constant(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.template_data.constants.insert(key.into(), value.into());
        self
    }

    pub fn variable(mut self, key: impl Into<String>, value: impl Into<String>, sensitive: bool) -> Self {
        self.config.template_data = self.config.template_data.with_variable(key, value, sensitive);
        self
    }

    pub fn build(self) -> ComposeConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_disables_rendering() {
        let config = ComposeConfig::default();
        assert!(config.render_type.is_none());
        assert!(!config.renders_validations());
        assert!(config.fetch_timeout.is_none());
    }

    #[test]
    fn test_render_validations_ignored_without_render_type() {
        let config = ComposeConfig::builder().render("", true).build();
        assert!(config.render_type.is_none());
        assert!(!config.render_validations);
    }

    #[test]
    fn test_invalid_render_type_falls_back() {
        let config = ComposeConfig::builder().render("bogus", true).build();
        assert_eq!(config.render_type, Some(RenderType::NonSensitive));
        assert!(config.renders_validations());
    }

    #[test]
    fn test_builder() {
        let config = ComposeConfig::builder()
            .render("masked", false)
            .fetch_timeout(Duration::from_secs(5))
            .constant("namespace", "prod")
            .variable("token", "x", true)
            .build();

        assert_eq!(config.render_type, Some(RenderType::Masked));
        assert!(!config.renders_validations());
        assert_eq!(config.fetch_timeout, Some(Duration::from_secs(5)));
        assert_eq!(config.template_data.constants["namespace"], "prod");
        assert!(config.template_data.variables["token"].sensitive);
    }
}
