//! Resource Store
//!
//! Holds every resource known to one composition unit: the resources
//! declared inline in the document's back matter ("existing") and those
//! pulled in while resolving links ("fetched"). Each href is fetched at most
//! once per store; later links to the same href are answered from the
//! href cache.
//!
//! All mutable state sits behind one mutex that [`ResourceStore::resolve`]
//! holds for the whole lookup-fetch-register sequence, so concurrent
//! resolutions of the same href still trigger a single fetch.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::error::ResolveError;
use super::fetch::{FetchContext, Fetcher};
use super::render::{RenderType, TemplateRenderer};
use super::validation::parse_validations;
use crate::oscal::{trim_id_prefix, BackMatter, Link, Resource, WILDCARD};

/// Rendering applied to fetched validations before parsing
#[derive(Clone)]
pub struct ValidationRendering {
    pub renderer: Arc<dyn TemplateRenderer>,
    pub mode: RenderType,
}

impl std::fmt::Debug for ValidationRendering {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationRendering")
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
struct StoreState {
    existing: HashMap<String, Resource>,
    fetched: HashMap<String, Resource>,
    /// href -> every resource id its content produced
    href_ids: HashMap<String, Vec<String>>,
}

impl StoreState {
    fn has(&self, id: &str) -> bool {
        self.existing.contains_key(id) || self.fetched.contains_key(id)
    }
}

/// Store of back-matter and fetched resources
pub struct ResourceStore {
    state: Mutex<StoreState>,
    fetcher: Arc<dyn Fetcher>,
    rendering: Option<ValidationRendering>,
}

impl std::fmt::Debug for ResourceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ResourceStore")
            .field("existing", &state.existing.len())
            .field("fetched", &state.fetched.len())
            .field("hrefs", &state.href_ids.len())
            .field("rendering", &self.rendering)
            .finish()
    }
}

impl ResourceStore {
    /// Create an empty store
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            state: Mutex::new(StoreState::default()),
            fetcher,
            rendering: None,
        }
    }

    /// Create a store seeded with a document's back-matter resources
    pub fn from_back_matter(back_matter: Option<&BackMatter>, fetcher: Arc<dyn Fetcher>) -> Self {
        let store = Self::new(fetcher);
        if let Some(back_matter) = back_matter {
            for resource in &back_matter.resources {
                store.add_existing(resource.clone());
            }
        }
        store
    }

    /// Render fetched validations before parsing them
    pub fn with_rendering(mut self, rendering: ValidationRendering) -> Self {
        self.rendering = Some(rendering);
        self
    }

    /// Register a resource declared in the back matter
    pub fn add_existing(&self, resource: Resource) {
        self.state
            .lock()
            .existing
            .insert(resource.uuid.clone(), resource);
    }

    /// Register a resource retrieved from a remote source
    pub fn add_fetched(&self, resource: Resource) {
        self.state
            .lock()
            .fetched
            .insert(resource.uuid.clone(), resource);
    }

    pub fn get_existing(&self, id: &str) -> Option<Resource> {
        self.state.lock().existing.get(id).cloned()
    }

    pub fn get_fetched(&self, id: &str) -> Option<Resource> {
        self.state.lock().fetched.get(id).cloned()
    }

    /// Look up a resource; back-matter resources shadow fetched ones
    pub fn get(&self, id: &str) -> Option<Resource> {
        let state = self.state.lock();
        state
            .existing
            .get(id)
            .or_else(|| state.fetched.get(id))
            .cloned()
    }

    pub fn has(&self, id: &str) -> bool {
        self.state.lock().has(id)
    }

    /// Snapshot of the fetched resources, ordered by uuid
    pub fn all_fetched(&self) -> Vec<Resource> {
        let mut resources: Vec<Resource> = self.state.lock().fetched.values().cloned().collect();
        resources.sort_by(|a, b| a.uuid.cmp(&b.uuid));
        resources
    }

    /// Every resource id produced by an href, if it has been fetched
    pub fn href_ids(&self, href: &str) -> Option<Vec<String>> {
        self.state.lock().href_ids.get(href).cloned()
    }

    /// Resolve a link into the ids of the resources it references.
    ///
    /// A link whose target id is already known resolves without I/O, as
    /// does any href fetched earlier in this store's lifetime. Otherwise the
    /// href is fetched relative to `base_dir`, optionally rendered, parsed,
    /// and every validation in it registered as fetched.
    pub fn resolve(
        &self,
        link: &Link,
        base_dir: &Path,
        ctx: &FetchContext,
    ) -> Result<Vec<String>, ResolveError> {
        let href = link.href.trim();
        if href.is_empty() {
            return Err(ResolveError::InvalidLink {
                href: link.href.clone(),
                reason: "href is empty",
            });
        }

        let wanted = link
            .resource_fragment
            .as_deref()
            .map(trim_id_prefix)
            .filter(|f| !f.is_empty());
        let id = match wanted {
            Some(fragment) if fragment != WILDCARD => fragment,
            _ => trim_id_prefix(href),
        };

        let mut state = self.state.lock();

        if state.has(id) {
            debug!(id, "Resource already in store");
            return Ok(vec![id.to_string()]);
        }

        if let Some(ids) = state.href_ids.get(href) {
            debug!(href, "Href already fetched");
            return select(href, ids, wanted);
        }

        if href.starts_with('#') {
            return Err(ResolveError::NotFound {
                href: href.to_string(),
                id: id.to_string(),
            });
        }

        info!(href, "Fetching remote validations");
        let bytes = self
            .fetcher
            .fetch(href, base_dir, ctx)
            .map_err(|e| ResolveError::FetchFailure {
                href: href.to_string(),
                source: e,
            })?;

        let bytes = match self.rendering {
            Some(ref rendering) => rendering
                .renderer
                .render_bytes(&bytes, rendering.mode)
                .map_err(|e| ResolveError::RenderFailure {
                    href: href.to_string(),
                    source: e,
                })?,
            None => bytes,
        };

        let parse_failure = |e| ResolveError::ParseFailure {
            href: href.to_string(),
            source: e,
        };
        let validations = parse_validations(&bytes).map_err(parse_failure)?;

        let mut ids = Vec::with_capacity(validations.len());
        for validation in &validations {
            let resource = validation.to_resource().map_err(parse_failure)?;
            let uuid = resource.uuid.clone();

            if state.existing.contains_key(&uuid) {
                debug!(uuid, href, "Fetched validation shadowed by back matter");
            } else {
                state.fetched.entry(uuid.clone()).or_insert(resource);
            }
            ids.push(uuid);
        }

        state.href_ids.insert(href.to_string(), ids.clone());
        select(href, &ids, wanted)
    }
}

/// Pick the ids a link asks for out of everything its href produced.
///
/// A specific fragment that matches nothing still resolves to the only
/// validation of a single-validation document.
fn select(href: &str, ids: &[String], wanted: Option<&str>) -> Result<Vec<String>, ResolveError> {
    let selected: Vec<String> = match wanted {
        Some(WILDCARD) => ids.to_vec(),
        Some(id) if ids.iter().any(|i| i == id) => vec![id.to_string()],
        _ if ids.len() == 1 => {
            if let Some(id) = wanted {
                warn!(
                    href,
                    requested = id,
                    resolved = %ids[0],
                    "Requested resource not found; using the only validation in the document"
                );
            }
            ids.to_vec()
        }
        _ => Vec::new(),
    };

    if selected.is_empty() {
        return Err(ResolveError::NotFound {
            href: href.to_string(),
            id: wanted.unwrap_or(href).to_string(),
        });
    }
    Ok(selected)
}
