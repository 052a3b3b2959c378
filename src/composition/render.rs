//! Template Rendering
//!
//! Documents and fetched validations may carry `{{ .const.KEY }}` and
//! `{{ .var.KEY }}` placeholders. Constants are always safe to render;
//! variables may be flagged sensitive, and the [`RenderType`] decides what
//! happens to them.

use std::collections::BTreeMap;
use std::fmt;

use regex::Regex;
use thiserror::Error;

/// Replacement text for sensitive values in [`RenderType::Masked`] mode
pub const MASK: &str = "********";

const PLACEHOLDER_PATTERN: &str = r"\{\{\s*\.(const|var)\.([A-Za-z0-9_\-.]+)\s*\}\}";

/// Errors rendering templates
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template references unknown key .{scope}.{key}")]
    UnknownKey { scope: &'static str, key: String },

    #[error("invalid template override '{value}': expected .const.KEY=VALUE or .var.KEY=VALUE")]
    InvalidOverride { value: String },

    #[error("unknown render type '{value}'. Valid options: constants, non-sensitive, all, masked")]
    InvalidRenderType { value: String },

    #[error("template content is not valid UTF-8")]
    InvalidUtf8,

    #[error("invalid template pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Which placeholders get rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderType {
    /// Constants only; variables stay as placeholders
    Constants,
    /// Constants and non-sensitive variables
    #[default]
    NonSensitive,
    /// Everything, including sensitive variables
    All,
    /// Everything, with sensitive variables replaced by [`MASK`]
    Masked,
}

impl RenderType {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Constants => "constants",
            Self::NonSensitive => "non-sensitive",
            Self::All => "all",
            Self::Masked => "masked",
        }
    }
}

impl fmt::Display for RenderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for RenderType {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "constants" => Ok(Self::Constants),
            "non-sensitive" | "nonsensitive" => Ok(Self::NonSensitive),
            "all" => Ok(Self::All),
            "masked" => Ok(Self::Masked),
            _ => Err(RenderError::InvalidRenderType {
                value: s.to_string(),
            }),
        }
    }
}

/// A template variable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    pub value: String,
    pub sensitive: bool,
}

/// Values available to templates
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateData {
    pub constants: BTreeMap<String, String>,
    pub variables: BTreeMap<String, Variable>,
}

impl TemplateData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_constant(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.constants.insert(key.into(), value.into());
        self
    }

    pub fn with_variable(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
        sensitive: bool,
    ) -> Self {
        self.variables.insert(
            key.into(),
            Variable {
                value: value.into(),
                sensitive,
            },
        );
        self
    }

    /// Apply a `.const.KEY=VALUE` or `.var.KEY=VALUE` override.
    ///
    /// Overriding a variable keeps its sensitivity flag.
    pub fn apply_override(&mut self, spec: &str) -> Result<(), RenderError> {
        let invalid = || RenderError::InvalidOverride {
            value: spec.to_string(),
        };

        let (path, value) = spec.split_once('=').ok_or_else(invalid)?;
        let path = path.trim();

        if let Some(key) = path.strip_prefix(".const.").filter(|k| !k.is_empty()) {
            self.constants.insert(key.to_string(), value.to_string());
        } else if let Some(key) = path.strip_prefix(".var.").filter(|k| !k.is_empty()) {
            let sensitive = self.variables.get(key).is_some_and(|v| v.sensitive);
            self.variables.insert(
                key.to_string(),
                Variable {
                    value: value.to_string(),
                    sensitive,
                },
            );
        } else {
            return Err(invalid());
        }
        Ok(())
    }
}

/// Renders template text
pub trait TemplateRenderer: Send + Sync {
    fn render(&self, text: &str, mode: RenderType) -> Result<String, RenderError>;

    /// Render raw bytes, which must be UTF-8
    fn render_bytes(&self, bytes: &[u8], mode: RenderType) -> Result<Vec<u8>, RenderError> {
        let text = std::str::from_utf8(bytes).map_err(|_| RenderError::InvalidUtf8)?;
        Ok(self.render(text, mode)?.into_bytes())
    }
}

/// Placeholder-substituting renderer backed by [`TemplateData`]
#[derive(Debug, Clone)]
pub struct Renderer {
    data: TemplateData,
    pattern: Regex,
}

impl Renderer {
    pub fn new(data: TemplateData) -> Result<Self, RenderError> {
        Ok(Self {
            data,
            pattern: Regex::new(PLACEHOLDER_PATTERN)?,
        })
    }

    /// Resolve one placeholder, or `None` to leave it in place
    fn substitute(
        &self,
        scope: &str,
        key: &str,
        mode: RenderType,
    ) -> Result<Option<String>, RenderError> {
        if scope == "const" {
            return self
                .data
                .constants
                .get(key)
                .cloned()
                .map(Some)
                .ok_or_else(|| RenderError::UnknownKey {
                    scope: "const",
                    key: key.to_string(),
                });
        }

        if mode == RenderType::Constants {
            return Ok(None);
        }

        let variable = self
            .data
            .variables
            .get(key)
            .ok_or_else(|| RenderError::UnknownKey {
                scope: "var",
                key: key.to_string(),
            })?;

        Ok(match (mode, variable.sensitive) {
            (_, false) | (RenderType::All, true) => Some(variable.value.clone()),
            (RenderType::Masked, true) => Some(MASK.to_string()),
            _ => None,
        })
    }
}

impl TemplateRenderer for Renderer {
    fn render(&self, text: &str, mode: RenderType) -> Result<String, RenderError> {
        let mut out = String::with_capacity(text.len());
        let mut last = 0;

        for caps in self.pattern.captures_iter(text) {
            let (Some(whole), Some(scope), Some(key)) = (caps.get(0), caps.get(1), caps.get(2))
            else {
                continue;
            };

            out.push_str(&text[last..whole.start()]);
            match self.substitute(scope.as_str(), key.as_str(), mode)? {
                Some(value) => out.push_str(&value),
                None => out.push_str(whole.as_str()),
            }
            last = whole.end();
        }

        out.push_str(&text[last..]);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn renderer() -> Renderer {
        let data = TemplateData::new()
            .with_constant("namespace", "istio-system")
            .with_variable("region", "us-east-1", false)
            .with_variable("token", "s3cr3t", true);
        Renderer::new(data).unwrap()
    }

    const TEMPLATE: &str = "ns: {{ .const.namespace }}\nregion: {{.var.region}}\ntoken: {{ .var.token }}";

    #[test]
    fn test_render_constants_only() {
        let out = renderer().render(TEMPLATE, RenderType::Constants).unwrap();
        assert_eq!(
            out,
            "ns: istio-system\nregion: {{.var.region}}\ntoken: {{ .var.token }}"
        );
    }

    #[test]
    fn test_render_non_sensitive_leaves_secrets() {
        let out = renderer().render(TEMPLATE, RenderType::NonSensitive).unwrap();
        assert_eq!(
            out,
            "ns: istio-system\nregion: us-east-1\ntoken: {{ .var.token }}"
        );
    }

    #[test]
    fn test_render_all() {
        let out = renderer().render(TEMPLATE, RenderType::All).unwrap();
        assert_eq!(out, "ns: istio-system\nregion: us-east-1\ntoken: s3cr3t");
    }

    #[test]
    fn test_render_masked() {
        let out = renderer().render(TEMPLATE, RenderType::Masked).unwrap();
        assert_eq!(out, "ns: istio-system\nregion: us-east-1\ntoken: ********");
    }

    #[test]
    fn test_unknown_key_is_error() {
        let err = renderer()
            .render("{{ .const.missing }}", RenderType::All)
            .unwrap_err();
        assert!(matches!(err, RenderError::UnknownKey { scope: "const", .. }));
    }

    #[test]
    fn test_text_without_placeholders_is_unchanged() {
        let text = "plain: {{ not a placeholder }}";
        assert_eq!(renderer().render(text, RenderType::All).unwrap(), text);
    }

    #[test]
    fn test_render_type_parse() {
        assert_eq!("all".parse::<RenderType>().unwrap(), RenderType::All);
        assert_eq!(
            "Non-Sensitive".parse::<RenderType>().unwrap(),
            RenderType::NonSensitive
        );
        assert!("everything".parse::<RenderType>().is_err());
    }

    #[test]
    fn test_apply_override() {
        let mut data = TemplateData::new().with_variable("token", "old", true);
        data.apply_override(".const.namespace=prod").unwrap();
        data.apply_override(".var.token=new").unwrap();

        assert_eq!(data.constants["namespace"], "prod");
        assert_eq!(
            data.variables["token"],
            Variable {
                value: "new".to_string(),
                sensitive: true
            }
        );
        assert!(data.apply_override("namespace=prod").is_err());
        assert!(data.apply_override(".const.=x").is_err());
    }
}
