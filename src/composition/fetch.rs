//! Remote Content Fetching
//!
//! The [`Fetcher`] trait is the only way the resource store reaches the
//! outside world. [`DefaultFetcher`] handles local paths, `file://` URIs and,
//! with the `http-fetch` feature, `http(s)://` URIs.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

/// Errors retrieving raw content
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("fetch of {uri} was cancelled")]
    Cancelled { uri: String },

    #[error("fetch of {uri} timed out after {timeout:?}")]
    TimedOut { uri: String, timeout: Duration },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("request to {uri} failed: {message}")]
    Http { uri: String, message: String },

    #[error("unsupported URI scheme: {uri}")]
    UnsupportedScheme { uri: String },
}

/// Per-call fetch settings shared from the composition entry point down to
/// every fetch.
///
/// Clones share the cancellation flag, so cancelling any clone cancels
/// all pending and future fetches made with it.
#[derive(Debug, Clone, Default)]
pub struct FetchContext {
    timeout: Option<Duration>,
    cancelled: Arc<AtomicBool>,
}

impl FetchContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound each fetch made with this context
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Cancel every fetch that has not started yet
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Fail with [`FetchError::Cancelled`] if the context was cancelled
    pub fn check(&self, uri: &str) -> Result<(), FetchError> {
        if self.is_cancelled() {
            return Err(FetchError::Cancelled {
                uri: uri.to_string(),
            });
        }
        Ok(())
    }
}

/// Retrieves raw bytes for a URI
pub trait Fetcher: Send + Sync {
    /// Fetch `uri`, resolving relative paths against `base_dir`
    fn fetch(&self, uri: &str, base_dir: &Path, ctx: &FetchContext) -> Result<Vec<u8>, FetchError>;
}

/// Fetcher for local files and, with `http-fetch`, http(s) URLs
#[derive(Debug, Clone, Default)]
pub struct DefaultFetcher;

impl DefaultFetcher {
    pub fn new() -> Self {
        Self
    }
}

impl Fetcher for DefaultFetcher {
    fn fetch(&self, uri: &str, base_dir: &Path, ctx: &FetchContext) -> Result<Vec<u8>, FetchError> {
        ctx.check(uri)?;

        if is_remote(uri) {
            return fetch_http(uri, ctx);
        }

        let path = resolve_local_path(uri, base_dir)?;
        debug!(path = %path.display(), "Reading local resource");
        std::fs::read(&path).map_err(|e| FetchError::Io { path, source: e })
    }
}

fn is_remote(uri: &str) -> bool {
    uri.starts_with("http://") || uri.starts_with("https://")
}

/// Map a non-remote URI onto a filesystem path
fn resolve_local_path(uri: &str, base_dir: &Path) -> Result<PathBuf, FetchError> {
    let raw = match uri.split_once("://") {
        Some(("file", rest)) => rest,
        Some(_) => {
            return Err(FetchError::UnsupportedScheme {
                uri: uri.to_string(),
            })
        }
        None => uri,
    };

    let path = Path::new(raw);
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(base_dir.join(path))
    }
}

#[cfg(feature = "http-fetch")]
fn fetch_http(uri: &str, ctx: &FetchContext) -> Result<Vec<u8>, FetchError> {
    let mut builder = reqwest::blocking::Client::builder();
    if let Some(timeout) = ctx.timeout() {
        builder = builder.timeout(timeout);
    }
    let client = builder.build().map_err(|e| FetchError::Http {
        uri: uri.to_string(),
        message: e.to_string(),
    })?;

    debug!(uri, "Requesting remote resource");
    let map_err = |e: reqwest::Error| match ctx.timeout() {
        Some(timeout) if e.is_timeout() => FetchError::TimedOut {
            uri: uri.to_string(),
            timeout,
        },
        _ => FetchError::Http {
            uri: uri.to_string(),
            message: e.to_string(),
        },
    };

    let response = client
        .get(uri)
        .send()
        .and_then(|r| r.error_for_status())
        .map_err(map_err)?;
    let body = response.bytes().map_err(map_err)?;

    // Honor a cancellation that arrived while the request was in flight
    ctx.check(uri)?;
    Ok(body.to_vec())
}

#[cfg(not(feature = "http-fetch"))]
fn fetch_http(uri: &str, _ctx: &FetchContext) -> Result<Vec<u8>, FetchError> {
    Err(FetchError::UnsupportedScheme {
        uri: uri.to_string(),
    })
}
