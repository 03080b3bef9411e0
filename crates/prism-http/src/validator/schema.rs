//! JSON Schema validation capability.

use crate::types::Schema;
use prism_core::Diagnostic;
use serde_json::Value;

/// Validates one value against one schema.
///
/// `prefix` is prepended to the location of every diagnostic, e.g.
/// `["query", "status"]` or `["body"]`. Implementations must be reentrant.
pub trait SchemaValidator: Send + Sync {
    fn validate(&self, schema: &Schema, instance: &Value, prefix: &[&str]) -> Vec<Diagnostic>;
}

/// [`SchemaValidator`] backed by the `jsonschema` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSchemaValidator;

impl SchemaValidator for JsonSchemaValidator {
    fn validate(&self, schema: &Schema, instance: &Value, prefix: &[&str]) -> Vec<Diagnostic> {
        let validator = match jsonschema::validator_for(schema) {
            Ok(validator) => validator,
            Err(err) => {
                return vec![Diagnostic::error("schema", format!("Invalid schema: {err}"))
                    .with_path(prefix.iter().copied())];
            }
        };

        validator
            .iter_errors(instance)
            .map(|err| {
                let keyword = keyword_of(&err.schema_path.to_string());
                let location = prefix
                    .iter()
                    .map(|segment| segment.to_string())
                    .chain(pointer_segments(&err.instance_path.to_string()))
                    .collect::<Vec<_>>();
                Diagnostic::error(keyword, err.to_string()).with_path(location)
            })
            .collect()
    }
}

/// Last segment of a schema path: the failing keyword.
fn keyword_of(schema_path: &str) -> String {
    schema_path
        .rsplit('/')
        .find(|segment| !segment.is_empty() && segment.parse::<usize>().is_err())
        .unwrap_or("schema")
        .to_string()
}

/// Split a JSON pointer into unescaped segments.
fn pointer_segments(pointer: &str) -> Vec<String> {
    pointer
        .split('/')
        .skip(1)
        .map(|segment| segment.replace("~1", "/").replace("~0", "~"))
        .collect()
}
