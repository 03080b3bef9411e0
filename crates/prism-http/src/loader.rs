//! Loading operation lists from disk.
//!
//! Operations arrive already resolved: one YAML or JSON document holding a
//! list of [`HttpOperation`]s with dereferenced schemas.

use crate::types::{HttpOperation, HttpRequest};
use anyhow::Context;
use std::path::Path;
use tracing::info;

/// Read a YAML or JSON list of operations.
pub fn load_operations<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<HttpOperation>> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read operations from {}", path.display()))?;
    let operations: Vec<HttpOperation> = serde_yaml::from_str(&contents)
        .with_context(|| format!("Failed to parse operations in {}", path.display()))?;
    info!(
        count = operations.len(),
        "Loaded operations from {}",
        path.display()
    );
    Ok(operations)
}

/// Read one request from a YAML or JSON file.
pub fn load_request<P: AsRef<Path>>(path: P) -> anyhow::Result<HttpRequest> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read request from {}", path.display()))?;
    serde_yaml::from_str(&contents)
        .with_context(|| format!("Failed to parse request in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_yaml_operations() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
- method: get
  path: /pet/{{petId}}
  servers:
    - url: http://example.com/api
  request:
    path:
      - name: petId
        required: true
        schema: {{ type: integer }}
  responses:
    - code: "200"
      contents:
        - mediaType: application/json
          examples:
            - key: dog
              value: {{ name: doggie }}
"#
        )
        .unwrap();

        let operations = load_operations(file.path()).unwrap();
        assert_eq!(operations.len(), 1);
        assert_eq!(operations[0].label(), "GET /pet/{petId}");
        assert_eq!(operations[0].request.path[0].name, "petId");
        assert_eq!(operations[0].responses[0].contents[0].examples[0].key(), "dog");
    }

    #[test]
    fn test_load_json_request() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"method": "get", "url": {{"path": "/pet/1", "query": {{"tags": ["a", "b"]}}}}, "headers": {{"Accept": "application/json"}}}}"#
        )
        .unwrap();

        let request = load_request(file.path()).unwrap();
        assert_eq!(request.url.path, "/pet/1");
        assert_eq!(request.header("accept"), Some("application/json"));
    }

    #[test]
    fn test_missing_file_names_the_path() {
        let error = load_operations("/does/not/exist.yaml").unwrap_err();
        assert!(error.to_string().contains("/does/not/exist.yaml"));
    }

    #[test]
    fn test_invalid_document() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "method: get").unwrap();
        let error = load_operations(file.path()).unwrap_err();
        assert!(error.to_string().contains("Failed to parse operations"));
    }
}
