//! Observability
//!
//! Library code logs through the standard `tracing` macros and never
//! installs a subscriber itself. Binaries call [`init`] once at startup.
//!
//! # Usage
//!
//! ```ignore
//! use assay::observability::{init, LogFormat, ObservabilityConfig};
//!
//! // From environment variables
//! init(&ObservabilityConfig::from_env())?;
//!
//! // Or programmatically
//! let config = ObservabilityConfig::builder()
//!     .log_format(LogFormat::Json)
//!     .log_filter("assay=debug")
//!     .build();
//! init(&config)?;
//! ```

mod config;
mod providers;

pub use config::{LogFormat, ObservabilityConfig, ObservabilityConfigBuilder};

use tracing::debug;

/// Initialize the global tracing subscriber.
///
/// # Errors
///
/// Returns an error if the log filter does not parse or a global
/// subscriber is already installed.
pub fn init(config: &ObservabilityConfig) -> Result<(), ObservabilityError> {
    providers::init_tracing(config)?;

    debug!(
        log_format = %config.log_format,
        log_filter = %config.log_filter,
        "Observability initialized"
    );

    Ok(())
}

/// Observability initialization errors
#[derive(Debug, thiserror::Error)]
pub enum ObservabilityError {
    #[error("invalid log filter '{filter}': {message}")]
    Filter { filter: String, message: String },

    #[error("failed to install tracing subscriber: {0}")]
    Subscriber(String),
}
