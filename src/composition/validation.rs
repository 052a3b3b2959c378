//! Validation Documents
//!
//! A validation file holds one or more YAML documents, each describing a
//! domain (where resources come from) and a provider (how they are judged).
//! The resource store only needs to parse them and turn each into a
//! back-matter [`Resource`]; the domain and provider bodies are carried
//! opaquely.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::oscal::{Property, Resource, VALIDATION_PROP, VALIDATION_PROP_VALUE};

/// Namespace for UUIDs derived from validation content
const VALIDATION_NAMESPACE: Uuid = Uuid::from_u128(0x6c0f_1c8e_3b5d_4a43_9d0e_2b7a_91f4_c5d2);

const DEFAULT_TITLE: &str = "lula-validation";

/// Errors parsing validation documents
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("validation document {index} is invalid: {source}")]
    Yaml {
        index: usize,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("validation '{name}' has an invalid uuid '{value}'")]
    InvalidUuid { name: String, value: String },

    #[error("failed to serialize validation '{name}': {source}")]
    Serialize {
        name: String,
        #[source]
        source: serde_yaml::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationMetadata {
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
}

/// One parsed validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ValidationDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lula_version: Option<String>,

    #[serde(default)]
    pub metadata: ValidationMetadata,

    pub domain: serde_yaml::Value,

    pub provider: serde_yaml::Value,
}

impl ValidationDefinition {
    pub fn name(&self) -> &str {
        if self.metadata.name.is_empty() {
            DEFAULT_TITLE
        } else {
            &self.metadata.name
        }
    }

    /// Identity of this validation.
    ///
    /// An explicit `metadata.uuid` wins; otherwise a UUIDv5 is derived from
    /// the document content, so the same validation always gets the same id.
    pub fn uuid(&self) -> Result<String, ParseError> {
        if let Some(ref value) = self.metadata.uuid {
            return Uuid::parse_str(value)
                .map(|u| u.to_string())
                .map_err(|_| ParseError::InvalidUuid {
                    name: self.name().to_string(),
                    value: value.clone(),
                });
        }

        let canonical = serde_yaml::to_string(self).map_err(|e| ParseError::Serialize {
            name: self.name().to_string(),
            source: e,
        })?;
        Ok(Uuid::new_v5(&VALIDATION_NAMESPACE, canonical.as_bytes()).to_string())
    }

    /// Convert into a back-matter resource whose description is the
    /// validation itself, with its uuid pinned.
    pub fn to_resource(&self) -> Result<Resource, ParseError> {
        let uuid = self.uuid()?;

        let mut pinned = self.clone();
        pinned.metadata.uuid = Some(uuid.clone());
        let description = serde_yaml::to_string(&pinned).map_err(|e| ParseError::Serialize {
            name: self.name().to_string(),
            source: e,
        })?;

        Ok(Resource {
            uuid,
            title: Some(self.name().to_string()),
            description: Some(description),
            props: vec![Property::new(VALIDATION_PROP, VALIDATION_PROP_VALUE)],
            ..Default::default()
        })
    }
}

/// Parse every validation in a (possibly multi-document) YAML payload.
///
/// Empty documents are skipped.
pub fn parse_validations(bytes: &[u8]) -> Result<Vec<ValidationDefinition>, ParseError> {
    let mut validations = Vec::new();

    for (index, document) in serde_yaml::Deserializer::from_slice(bytes).enumerate() {
        let value = serde_yaml::Value::deserialize(document)
            .map_err(|e| ParseError::Yaml { index, source: e })?;
        if value.is_null() {
            continue;
        }
        let validation = serde_yaml::from_value(value)
            .map_err(|e| ParseError::Yaml { index, source: e })?;
        validations.push(validation);
    }

    Ok(validations)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_VALIDATIONS: &str = r#"
metadata:
  name: check-pods-labeled
  uuid: 88AB3470-B96B-4D7C-BC36-02BF9563C46F
domain:
  type: kubernetes
  kubernetes-spec:
    resources:
      - name: podsvt
        resource-rule:
          version: v1
          resource: pods
provider:
  type: opa
  opa-spec:
    rego: |
      package validate
      default validate := false
---
metadata:
  name: check-istio
domain:
  type: kubernetes
provider:
  type: opa
"#;

    #[test]
    fn test_parse_multi_document() {
        let validations = parse_validations(TWO_VALIDATIONS.as_bytes()).unwrap();
        assert_eq!(validations.len(), 2);
        assert_eq!(validations[0].name(), "check-pods-labeled");
        assert_eq!(validations[1].name(), "check-istio");
    }

    #[test]
    fn test_explicit_uuid_is_normalized() {
        let validations = parse_validations(TWO_VALIDATIONS.as_bytes()).unwrap();
        assert_eq!(
            validations[0].uuid().unwrap(),
            "88ab3470-b96b-4d7c-bc36-02bf9563c46f"
        );
    }

    #[test]
    fn test_derived_uuid_is_deterministic() {
        let first = parse_validations(TWO_VALIDATIONS.as_bytes()).unwrap();
        let second = parse_validations(TWO_VALIDATIONS.as_bytes()).unwrap();
        assert_eq!(first[1].uuid().unwrap(), second[1].uuid().unwrap());
        assert_ne!(first[0].uuid().unwrap(), first[1].uuid().unwrap());
    }

    #[test]
    fn test_to_resource_pins_uuid() {
        let validations = parse_validations(TWO_VALIDATIONS.as_bytes()).unwrap();
        let resource = validations[1].to_resource().unwrap();

        assert!(resource.is_validation());
        assert_eq!(resource.title.as_deref(), Some("check-istio"));

        let embedded = parse_validations(resource.description.unwrap().as_bytes()).unwrap();
        assert_eq!(embedded[0].metadata.uuid.as_deref(), Some(resource.uuid.as_str()));
        assert_eq!(embedded[0].uuid().unwrap(), resource.uuid);
    }

    #[test]
    fn test_invalid_uuid() {
        let yaml = "metadata:\n  name: bad\n  uuid: not-a-uuid\ndomain: {}\nprovider: {}\n";
        let validations = parse_validations(yaml.as_bytes()).unwrap();
        assert!(matches!(
            validations[0].uuid(),
            Err(ParseError::InvalidUuid { .. })
        ));
    }

    #[test]
    fn test_missing_provider_is_parse_error() {
        let yaml = "metadata:\n  name: half\ndomain:\n  type: kubernetes\n";
        let err = parse_validations(yaml.as_bytes()).unwrap_err();
        assert!(matches!(err, ParseError::Yaml { index: 0, .. }));
    }

    #[test]
    fn test_non_yaml_is_parse_error() {
        assert!(parse_validations(b"<html>404</html>").is_err());
    }

    #[test]
    fn test_empty_payload_has_no_validations() {
        assert!(parse_validations(b"").unwrap().is_empty());
    }
}
