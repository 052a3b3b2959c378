//! Document Composer
//!
//! Owns the configuration and collaborators for composing a document:
//! it builds one [`ResourceStore`] per document from the back matter,
//! resolves every validation link through it, and folds the fetched
//! validations back into the document.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use super::error::ComposeError;
use super::fetch::{DefaultFetcher, FetchContext, Fetcher};
use super::render::{Renderer, TemplateRenderer};
use super::store::{ResourceStore, ValidationRendering};
use crate::config::ComposeConfig;
use crate::oscal::{BackMatter, ComponentDefinition, Link, OscalDocument};

/// Counts from one composition
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComposeSummary {
    /// Validation links resolved
    pub resolved_links: usize,
    /// Resources added to the back matter
    pub fetched_resources: usize,
}

/// Composes OSCAL documents by resolving their validation references
pub struct Composer {
    config: ComposeConfig,
    fetcher: Arc<dyn Fetcher>,
    renderer: Arc<dyn TemplateRenderer>,
}

impl std::fmt::Debug for Composer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Composer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Composer {
    /// Create a composer with the default fetcher and a renderer over the
    /// configured template data
    pub fn new(config: ComposeConfig) -> Result<Self, ComposeError> {
        let renderer = Renderer::new(config.template_data.clone())?;
        Ok(Self {
            config,
            fetcher: Arc::new(DefaultFetcher::new()),
            renderer: Arc::new(renderer),
        })
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn TemplateRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn config(&self) -> &ComposeConfig {
        &self.config
    }

    /// A fresh fetch context carrying the configured timeout
    pub fn fetch_context(&self) -> FetchContext {
        match self.config.fetch_timeout {
            Some(timeout) => FetchContext::new().with_timeout(timeout),
            None => FetchContext::new(),
        }
    }

    /// Build the resource store for a document's back matter
    pub fn resource_store(&self, back_matter: Option<&BackMatter>) -> ResourceStore {
        let store = ResourceStore::from_back_matter(back_matter, Arc::clone(&self.fetcher));
        match self.config.render_type {
            Some(mode) if self.config.render_validations => store.with_rendering(ValidationRendering {
                renderer: Arc::clone(&self.renderer),
                mode,
            }),
            _ => store,
        }
    }

    /// Load, render, and compose a component definition from disk.
    ///
    /// Relative validation hrefs resolve against the document's directory.
    pub fn compose_from_path(
        &self,
        path: impl AsRef<Path>,
        ctx: &FetchContext,
    ) -> Result<(ComponentDefinition, ComposeSummary), ComposeError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ComposeError::MissingInput {
                path: path.to_path_buf(),
            });
        }

        let absolute = std::fs::canonicalize(path).map_err(|e| ComposeError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let base_dir = absolute
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let raw = std::fs::read_to_string(&absolute).map_err(|e| ComposeError::Read {
            path: absolute.clone(),
            source: e,
        })?;

        let content = match self.config.render_type {
            Some(mode) => {
                debug!(path = %absolute.display(), %mode, "Rendering document");
                self.renderer
                    .render(&raw, mode)
                    .map_err(|e| ComposeError::Render {
                        path: absolute.clone(),
                        source: e,
                    })?
            }
            None => raw,
        };

        let mut definition = OscalDocument::from_slice(content.as_bytes())?.into_component_definition()?;
        let summary = self.compose_component_definition(&mut definition, &base_dir, ctx)?;
        Ok((definition, summary))
    }

    /// Resolve every validation link in a component definition.
    ///
    /// Each validation link is replaced by local `#uuid` links to the
    /// resources it resolved to, and fetched resources are appended to the
    /// back matter. Fails on the first link that cannot be resolved.
    pub fn compose_component_definition(
        &self,
        definition: &mut ComponentDefinition,
        base_dir: &Path,
        ctx: &FetchContext,
    ) -> Result<ComposeSummary, ComposeError> {
        let store = self.resource_store(definition.back_matter.as_ref());
        let mut summary = ComposeSummary::default();

        let requirements = definition
            .components
            .iter_mut()
            .flat_map(|c| c.control_implementations.iter_mut())
            .flat_map(|ci| ci.implemented_requirements.iter_mut());

        for requirement in requirements {
            if !requirement.links.iter().any(Link::is_validation) {
                continue;
            }

            let mut links = Vec::with_capacity(requirement.links.len());
            for link in requirement.links.drain(..) {
                if !link.is_validation() {
                    links.push(link);
                    continue;
                }

                let ids = store
                    .resolve(&link, base_dir, ctx)
                    .map_err(|e| ComposeError::Resolve {
                        control_id: requirement.control_id.clone(),
                        source: e,
                    })?;
                summary.resolved_links += 1;

                for id in ids {
                    let mut local = Link::local_validation(&id);
                    local.text = link.text.clone();
                    if !links.contains(&local) {
                        links.push(local);
                    }
                }
            }
            requirement.links = links;
        }

        let fetched = store.all_fetched();
        summary.fetched_resources = fetched.len();
        if !fetched.is_empty() {
            definition
                .back_matter
                .get_or_insert_with(BackMatter::default)
                .resources
                .extend(fetched);
        }

        definition.metadata.last_modified = Some(Utc::now());
        info!(
            resolved_links = summary.resolved_links,
            fetched_resources = summary.fetched_resources,
            "Composed component definition"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composition::error::ResolveError;
    use crate::oscal::{ControlImplementation, DefinedComponent, ImplementedRequirement, Metadata, Resource};

    const VALIDATION: &str = r#"
metadata:
  name: "{{ .const.check }}"
  uuid: 61ec8808-f0f4-4b35-9a5b-4d7516053534
domain:
  type: kubernetes
provider:
  type: opa
"#;

    fn definition(links: Vec<Link>) -> ComponentDefinition {
        ComponentDefinition {
            uuid: "c5f2c1a4-7a2e-4a53-8a46-4c8f4f1a1c10".to_string(),
            metadata: Metadata {
                title: "Component".to_string(),
                ..Default::default()
            },
            components: vec![DefinedComponent {
                uuid: "d1".to_string(),
                component_type: "software".to_string(),
                title: "app".to_string(),
                control_implementations: vec![ControlImplementation {
                    uuid: "ci1".to_string(),
                    source: "https://example.com/catalog.json".to_string(),
                    implemented_requirements: vec![ImplementedRequirement {
                        uuid: "ir1".to_string(),
                        control_id: "ac-1".to_string(),
                        links,
                        ..Default::default()
                    }],
                    ..Default::default()
                }],
                ..Default::default()
            }],
            back_matter: None,
        }
    }

    fn composer(config: ComposeConfig) -> Composer {
        Composer::new(config).unwrap()
    }

    #[test]
    fn test_compose_rewrites_links_and_extends_back_matter() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("validation.yaml"),
            VALIDATION.replace("{{ .const.check }}", "check-ac-1"),
        )
        .unwrap();

        let mut def = definition(vec![
            Link::new("validation.yaml").with_rel("lula"),
            Link::new("https://example.com/docs").with_rel("reference"),
        ]);

        let summary = composer(ComposeConfig::default())
            .compose_component_definition(&mut def, dir.path(), &FetchContext::new())
            .unwrap();

        assert_eq!(summary.resolved_links, 1);
        assert_eq!(summary.fetched_resources, 1);

        let links = &def.components[0].control_implementations[0].implemented_requirements[0].links;
        assert_eq!(links[0].href, "https://example.com/docs");
        assert_eq!(links[1].href, "#61ec8808-f0f4-4b35-9a5b-4d7516053534");

        let resources = &def.back_matter.as_ref().unwrap().resources;
        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].title.as_deref(), Some("check-ac-1"));
        assert!(def.metadata.last_modified.is_some());
    }

    #[test]
    fn test_compose_keeps_inline_resources() {
        let mut def = definition(vec![Link::local_validation("inline-1")]);
        def.back_matter = Some(BackMatter {
            resources: vec![Resource {
                uuid: "inline-1".to_string(),
                ..Default::default()
            }],
        });

        let summary = composer(ComposeConfig::default())
            .compose_component_definition(&mut def, Path::new("."), &FetchContext::new())
            .unwrap();

        assert_eq!(summary.resolved_links, 1);
        assert_eq!(summary.fetched_resources, 0);
        assert_eq!(def.back_matter.unwrap().resources.len(), 1);
    }

    #[test]
    fn test_compose_propagates_resolution_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut def = definition(vec![Link::new("missing.yaml").with_rel("lula")]);

        let err = composer(ComposeConfig::default())
            .compose_component_definition(&mut def, dir.path(), &FetchContext::new())
            .unwrap_err();

        match err {
            ComposeError::Resolve { control_id, source } => {
                assert_eq!(control_id, "ac-1");
                assert!(matches!(source, ResolveError::FetchFailure { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_compose_renders_fetched_validations_when_enabled() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("validation.yaml"), VALIDATION).unwrap();

        let config = ComposeConfig::builder()
            .render("constants", true)
            .constant("check", "rendered-check")
            .build();

        let mut def = definition(vec![Link::new("validation.yaml").with_rel("lula")]);
        composer(config)
            .compose_component_definition(&mut def, dir.path(), &FetchContext::new())
            .unwrap();

        let resources = def.back_matter.unwrap().resources;
        assert_eq!(resources[0].title.as_deref(), Some("rendered-check"));
    }

    #[test]
    fn test_compose_from_path_resolves_relative_to_document() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("validation.yaml"),
            VALIDATION.replace("{{ .const.check }}", "check-ac-1"),
        )
        .unwrap();

        let doc = OscalDocument::ComponentDefinition(definition(vec![
            Link::new("validation.yaml").with_rel("lula"),
        ]));
        let path = dir.path().join("component.json");
        doc.write_to(&path).unwrap();

        let (composed, summary) = composer(ComposeConfig::default())
            .compose_from_path(&path, &FetchContext::new())
            .unwrap();
        assert_eq!(summary.fetched_resources, 1);
        assert_eq!(composed.back_matter.unwrap().resources.len(), 1);
    }

    #[test]
    fn test_compose_from_missing_path() {
        let err = composer(ComposeConfig::default())
            .compose_from_path("/nonexistent/component.yaml", &FetchContext::new())
            .unwrap_err();
        assert!(matches!(err, ComposeError::MissingInput { .. }));
    }

    #[test]
    fn test_fetch_context_carries_timeout() {
        let config = ComposeConfig::builder()
            .fetch_timeout(std::time::Duration::from_secs(3))
            .build();
        assert_eq!(
            composer(config).fetch_context().timeout(),
            Some(std::time::Duration::from_secs(3))
        );
    }
}
