//! Path, query, header and cookie parameter validation.
//!
//! Raw parameter values are strings; before schema validation they are
//! coerced to the type the schema declares so that `?limit=10` satisfies
//! `{"type": "integer"}`.

use super::schema::SchemaValidator;
use crate::types::{Parameter, Schema};
use prism_core::Diagnostic;
use serde_json::Value;

/// Where a parameter is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
}

impl ParameterLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterLocation::Path => "path",
            ParameterLocation::Query => "query",
            ParameterLocation::Header => "header",
            ParameterLocation::Cookie => "cookie",
        }
    }
}

/// Validate `specs` against the raw values found by `lookup`.
///
/// `lookup` returns every value supplied for a parameter name, or `None`
/// when the parameter is absent.
pub fn validate_parameters<'a, F>(
    validator: &dyn SchemaValidator,
    location: ParameterLocation,
    specs: &[Parameter],
    lookup: F,
) -> Vec<Diagnostic>
where
    F: Fn(&str) -> Option<Vec<&'a str>>,
{
    let mut diagnostics = Vec::new();
    for spec in specs {
        let Some(values) = lookup(&spec.name) else {
            if spec.required {
                diagnostics.push(
                    Diagnostic::error(
                        "required",
                        format!("must have required property '{}'", spec.name),
                    )
                    .with_path([location.as_str(), spec.name.as_str()]),
                );
            }
            continue;
        };

        if spec.deprecated {
            diagnostics.push(
                Diagnostic::warning(
                    "deprecated",
                    format!("{} param {} is deprecated", location.as_str(), spec.name),
                )
                .with_path([location.as_str(), spec.name.as_str()]),
            );
        }

        if let Some(schema) = &spec.schema {
            let value = coerce(schema, &values);
            diagnostics.extend(validator.validate(
                schema,
                &value,
                &[location.as_str(), spec.name.as_str()],
            ));
        }
    }
    diagnostics
}

/// Convert raw string values into the JSON shape `schema` expects.
pub fn coerce(schema: &Schema, values: &[&str]) -> Value {
    match schema_type(schema) {
        Some("array") => {
            let items = schema.get("items").cloned().unwrap_or(Value::Null);
            let raw: Vec<&str> = match values {
                [single] => single.split(',').collect(),
                many => many.to_vec(),
            };
            Value::Array(raw.iter().map(|value| coerce_scalar(&items, value)).collect())
        }
        _ => coerce_scalar(schema, values.first().copied().unwrap_or_default()),
    }
}

fn coerce_scalar(schema: &Schema, value: &str) -> Value {
    let coerced = match schema_type(schema) {
        Some("integer") => value.parse::<i64>().ok().map(Value::from),
        Some("number") => value
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number),
        Some("boolean") => value.parse::<bool>().ok().map(Value::Bool),
        Some("null") if value.is_empty() => Some(Value::Null),
        _ => None,
    };
    coerced.unwrap_or_else(|| Value::String(value.to_string()))
}

fn schema_type(schema: &Schema) -> Option<&str> {
    match schema.get("type")? {
        Value::String(kind) => Some(kind.as_str()),
        // `["integer", "null"]`: the first non-null type drives coercion
        Value::Array(kinds) => kinds
            .iter()
            .filter_map(Value::as_str)
            .find(|kind| *kind != "null"),
        _ => None,
    }
}

/// Parse a `Cookie` header into name/value pairs.
pub fn parse_cookies(header: &str) -> Vec<(&str, &str)> {
    header
        .split(';')
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            Some((name.trim(), value.trim()))
        })
        .collect()
}
