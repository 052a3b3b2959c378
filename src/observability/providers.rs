//! Subscriber installation
//!
//! Logs go to stderr so command output on stdout stays machine-readable.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use super::{LogFormat, ObservabilityConfig, ObservabilityError};

fn build_filter(config: &ObservabilityConfig) -> Result<EnvFilter, ObservabilityError> {
    if config.respect_rust_log {
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            return Ok(filter);
        }
    }

    EnvFilter::try_new(&config.log_filter).map_err(|e| ObservabilityError::Filter {
        filter: config.log_filter.clone(),
        message: e.to_string(),
    })
}

/// Install the global subscriber for the configured format
pub fn init_tracing(config: &ObservabilityConfig) -> Result<(), ObservabilityError> {
    let filter = build_filter(config)?;
    let subscriber = tracing_subscriber::registry().with(filter);

    let installed = match config.log_format {
        LogFormat::Pretty => subscriber
            .with(
                fmt::layer()
                    .pretty()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_file(false),
            )
            .try_init(),
        LogFormat::Json => subscriber
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .try_init(),
        LogFormat::Compact => subscriber
            .with(
                fmt::layer()
                    .compact()
                    .with_writer(std::io::stderr)
                    .with_target(false),
            )
            .try_init(),
    };

    installed.map_err(|e| ObservabilityError::Subscriber(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_filter_is_rejected() {
        let config = ObservabilityConfig::builder()
            .log_filter("assay=verbose")
            .respect_rust_log(false)
            .build();

        let err = build_filter(&config).unwrap_err();
        assert!(matches!(err, ObservabilityError::Filter { .. }));
    }

    #[test]
    fn test_valid_filter() {
        let config = ObservabilityConfig::builder()
            .log_filter("assay=debug,reqwest=warn")
            .respect_rust_log(false)
            .build();

        assert!(build_filter(&config).is_ok());
    }
}
