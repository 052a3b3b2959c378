//! OSCAL Document Loading
//!
//! Reads and writes OSCAL documents wrapped in their model key, e.g.
//! `{"assessment-results": {...}}`. JSON and YAML encodings are both
//! accepted; the encoding is sniffed from content on read and chosen from
//! the file extension on write.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::types::{AssessmentResults, ComponentDefinition};

/// Errors loading or writing OSCAL documents
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid OSCAL JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid OSCAL YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("expected a {expected} document, found {found}")]
    UnexpectedModel {
        expected: &'static str,
        found: &'static str,
    },
}

/// A top-level OSCAL document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OscalDocument {
    ComponentDefinition(ComponentDefinition),
    AssessmentResults(AssessmentResults),
}

impl OscalDocument {
    /// Model key of this document
    pub fn model_name(&self) -> &'static str {
        match self {
            Self::ComponentDefinition(_) => "component-definition",
            Self::AssessmentResults(_) => "assessment-results",
        }
    }

    /// Parse a document from raw bytes (JSON or YAML)
    pub fn from_slice(data: &[u8]) -> Result<Self, DocumentError> {
        if looks_like_json(data) {
            Ok(serde_json::from_slice(data)?)
        } else {
            Ok(serde_yaml::from_slice(data)?)
        }
    }

    /// Load a document from a file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DocumentError> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|e| DocumentError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_slice(&data)
    }

    /// Write the document, as YAML for `.yaml`/`.yml` paths and JSON otherwise
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<(), DocumentError> {
        let path = path.as_ref();
        let content = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => serde_yaml::to_string(self)?,
            _ => serde_json::to_string_pretty(self)?,
        };
        std::fs::write(path, content).map_err(|e| DocumentError::Write {
            path: path.to_path_buf(),
            source: e,
        })
    }

    pub fn into_component_definition(self) -> Result<ComponentDefinition, DocumentError> {
        match self {
            Self::ComponentDefinition(c) => Ok(c),
            other => Err(DocumentError::UnexpectedModel {
                expected: "component-definition",
                found: other.model_name(),
            }),
        }
    }

    pub fn into_assessment_results(self) -> Result<AssessmentResults, DocumentError> {
        match self {
            Self::AssessmentResults(a) => Ok(a),
            other => Err(DocumentError::UnexpectedModel {
                expected: "assessment-results",
                found: other.model_name(),
            }),
        }
    }
}

fn looks_like_json(data: &[u8]) -> bool {
    data.iter()
        .find(|b| !b.is_ascii_whitespace())
        .is_some_and(|b| *b == b'{')
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESULTS_YAML: &str = r#"
assessment-results:
  uuid: 5e0d2a76-6a7e-4d38-9b4c-2f0b3c9e1d01
  metadata:
    title: Assessment
    version: "0.1"
    oscal-version: 1.1.2
  results:
    - uuid: 0f5b7a1c-31a5-4b0e-8d0e-6a8b3c1f2e10
      title: run
      start: 2024-05-01T12:00:00Z
      findings:
        - uuid: 7f1c0d2e-0c34-4bde-a4a6-96f1c2f0d8a1
          target:
            type: objective-id
            target-id: ac-1
            status:
              state: satisfied
          related-observations:
            - observation-uuid: 9a1b2c3d-0000-4000-8000-000000000001
      observations:
        - uuid: 9a1b2c3d-0000-4000-8000-000000000001
          description: "[TEST]: check-pods"
          methods: [TEST]
          relevant-evidence:
            - description: "Result: satisfied"
              remarks: all pods labeled
"#;

    #[test]
    fn test_parse_yaml_assessment_results() {
        let doc = OscalDocument::from_slice(RESULTS_YAML.as_bytes()).unwrap();
        let results = doc.into_assessment_results().unwrap();
        assert_eq!(results.results.len(), 1);

        let run = &results.results[0];
        assert_eq!(run.findings[0].target.target_id, "ac-1");
        assert_eq!(run.findings[0].target.status.state, "satisfied");
        assert_eq!(
            run.observations[0].relevant_evidence[0].remarks.as_deref(),
            Some("all pods labeled")
        );
    }

    #[test]
    fn test_json_roundtrip_keeps_model_key() {
        let doc = OscalDocument::from_slice(RESULTS_YAML.as_bytes()).unwrap();
        let json = serde_json::to_string(&doc).unwrap();
        assert!(json.starts_with("{\"assessment-results\""));

        let parsed = OscalDocument::from_slice(json.as_bytes()).unwrap();
        assert_eq!(parsed, doc);
    }

    #[test]
    fn test_unexpected_model() {
        let doc = OscalDocument::from_slice(RESULTS_YAML.as_bytes()).unwrap();
        let err = doc.into_component_definition().unwrap_err();
        assert!(matches!(
            err,
            DocumentError::UnexpectedModel {
                expected: "component-definition",
                found: "assessment-results"
            }
        ));
    }

    #[test]
    fn test_write_to_picks_encoding_from_extension() {
        let dir = tempfile::tempdir().unwrap();
        let doc = OscalDocument::from_slice(RESULTS_YAML.as_bytes()).unwrap();

        let yaml_path = dir.path().join("out.yaml");
        doc.write_to(&yaml_path).unwrap();
        let yaml = std::fs::read_to_string(&yaml_path).unwrap();
        assert!(yaml.starts_with("assessment-results:"));

        let json_path = dir.path().join("out.json");
        doc.write_to(&json_path).unwrap();
        assert_eq!(OscalDocument::from_file(&json_path).unwrap(), doc);
    }
}
