//! Configuration parsing for assay.toml
//!
//! The file is optional. It carries the log level, template constants and
//! variables, and fetch settings; command-line flags take precedence.
//!
//! ```toml
//! log_level = "info"
//!
//! [constants]
//! type = "software"
//!
//! [constants.resources]
//! name = "istio-system"
//!
//! [[variables]]
//! key = "api_token"
//! default = "changeme"
//! sensitive = true
//!
//! [fetch]
//! timeout = "30s"
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use assay::composition::TemplateData;
use assay::{parse_duration, ComposeConfig};

use crate::error::{CliError, Result};

/// Root configuration structure for assay.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AssayConfig {
    /// Log filter directive, overridden by `--log-level`
    pub log_level: Option<String>,

    /// Template constants; nested tables flatten to dotted keys
    pub constants: toml::Table,

    /// Template variables
    pub variables: Vec<VariableConfig>,

    pub fetch: FetchConfig,
}

/// One template variable declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableConfig {
    pub key: String,

    #[serde(default)]
    pub default: Option<String>,

    /// Sensitive values only render in `all` mode
    #[serde(default)]
    pub sensitive: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Per-fetch timeout, e.g. "30s" or "2m"
    pub timeout: Option<String>,
}

impl AssayConfig {
    /// Load configuration from a file path. A missing file yields defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| CliError::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::from_str(&content, path)
    }

    /// Parse configuration from a string
    pub fn from_str(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| CliError::ConfigParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Template data from the file, with `--set` overrides applied on top
    pub fn template_data(&self, overrides: &[String]) -> Result<TemplateData> {
        let mut data = TemplateData::new();

        let mut constants = Vec::new();
        flatten_table("", &self.constants, &mut constants);
        for (key, value) in constants {
            data = data.with_constant(key, value);
        }

        for variable in &self.variables {
            if variable.key.trim().is_empty() {
                return Err(CliError::invalid("variables.key", "variable key must not be empty"));
            }
            data = data.with_variable(
                variable.key.clone(),
                variable.default.clone().unwrap_or_default(),
                variable.sensitive,
            );
        }

        for spec in overrides {
            data.apply_override(spec)?;
        }

        Ok(data)
    }

    /// Build the composition config for one invocation
    pub fn compose_config(
        &self,
        render: &str,
        render_validations: bool,
        overrides: &[String],
    ) -> Result<ComposeConfig> {
        let mut builder = ComposeConfig::builder()
            .render(render, render_validations)
            .template_data(self.template_data(overrides)?);

        if let Some(ref timeout) = self.fetch.timeout {
            let parsed = parse_duration(timeout).ok_or_else(|| {
                CliError::invalid("fetch.timeout", format!("cannot parse '{}' as a duration", timeout))
            })?;
            builder = builder.fetch_timeout(parsed);
        }

        Ok(builder.build())
    }
}

fn flatten_table(prefix: &str, table: &toml::Table, out: &mut Vec<(String, String)>) {
    for (key, value) in table {
        let key = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        match value {
            toml::Value::Table(nested) => flatten_table(&key, nested, out),
            toml::Value::String(s) => out.push((key, s.clone())),
            other => out.push((key, other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assay::composition::RenderType;
    use std::time::Duration;

    const SAMPLE: &str = r#"
log_level = "debug"

[constants]
type = "software"
replicas = 3

[constants.resources]
name = "istio-system"

[[variables]]
key = "api_token"
default = "hunter2"
sensitive = true

[[variables]]
key = "region"
default = "us-east-1"

[fetch]
timeout = "30s"
"#;

    fn sample() -> AssayConfig {
        AssayConfig::from_str(SAMPLE, Path::new("assay.toml")).unwrap()
    }

    #[test]
    fn test_parse_sample() {
        let config = sample();
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.variables.len(), 2);
        assert!(config.variables[0].sensitive);
        assert!(!config.variables[1].sensitive);
    }

    #[test]
    fn test_constants_flatten() {
        let data = sample().template_data(&[]).unwrap();
        assert_eq!(data.constants["type"], "software");
        assert_eq!(data.constants["replicas"], "3");
        assert_eq!(data.constants["resources.name"], "istio-system");
        assert!(data.variables["api_token"].sensitive);
        assert_eq!(data.variables["region"].value, "us-east-1");
    }

    #[test]
    fn test_overrides_win() {
        let overrides = vec![
            ".const.type=service".to_string(),
            ".var.api_token=secret".to_string(),
        ];
        let data = sample().template_data(&overrides).unwrap();
        assert_eq!(data.constants["type"], "service");
        assert_eq!(data.variables["api_token"].value, "secret");
        assert!(data.variables["api_token"].sensitive);
    }

    #[test]
    fn test_bad_override_rejected() {
        let err = sample().template_data(&["type=service".to_string()]).unwrap_err();
        assert!(matches!(err, CliError::Template(_)));
    }

    #[test]
    fn test_compose_config() {
        let config = sample().compose_config("masked", true, &[]).unwrap();
        assert_eq!(config.render_type, Some(RenderType::Masked));
        assert!(config.render_validations);
        assert_eq!(config.fetch_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_invalid_timeout() {
        let mut config = sample();
        config.fetch.timeout = Some("soon".to_string());
        let err = config.compose_config("", false, &[]).unwrap_err();
        assert!(matches!(err, CliError::InvalidValue { .. }));

        config.fetch.timeout = Some("99999999999999999h".to_string());
        let err = config.compose_config("", false, &[]).unwrap_err();
        assert!(matches!(err, CliError::InvalidValue { .. }));
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = AssayConfig::load(dir.path().join("assay.toml")).unwrap();
        assert!(config.log_level.is_none());
        assert!(config.constants.is_empty());
    }

    #[test]
    fn test_parse_error() {
        let err = AssayConfig::from_str("log_level = [", Path::new("assay.toml")).unwrap_err();
        assert!(matches!(err, CliError::ConfigParse { .. }));
    }
}
