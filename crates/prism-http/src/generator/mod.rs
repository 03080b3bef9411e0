//! Payload generation from JSON Schema.
//!
//! Two generators share one schema walker and differ only in how they pick
//! leaf values:
//!
//! - [`StaticGenerator`]: deterministic, example-like data (`const`,
//!   `examples`, `default`, first `enum` value, fixed placeholders)
//! - [`DynamicGenerator`]: random schema-conformant data via `fake` and `rand`
//!
//! Schemas arrive dereferenced; a leftover `$ref` is a generation error.

mod faker;
mod sampler;

pub use faker::DynamicGenerator;
pub use sampler::StaticGenerator;

use crate::config::HttpConfig;
use crate::types::Schema;
use serde_json::{Map, Value};

/// Nesting depth after which the walker stops descending.
const MAX_DEPTH: usize = 16;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GenerationError {
    #[error("Unresolved reference '{0}'")]
    UnresolvedReference(String),
    #[error("Unsupported schema type '{0}'")]
    UnsupportedType(String),
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),
}

/// Produces a value conforming to a schema. Implementations are pure.
pub trait PayloadGenerator: Send + Sync {
    fn generate(&self, schema: &Schema) -> Result<Value, GenerationError>;
}

/// The generator `config` asks for.
pub fn for_config(config: &HttpConfig) -> &'static dyn PayloadGenerator {
    if config.is_dynamic() {
        &DynamicGenerator
    } else {
        &StaticGenerator
    }
}

/// Leaf decisions a generator makes while walking a schema.
trait Sampler {
    /// A value taken verbatim from the schema (`example`, `default`...).
    fn literal(&self, schema: &Map<String, Value>) -> Option<Value>;
    fn choose<'v>(&self, options: &'v [Value]) -> Option<&'v Value>;
    fn string(&self, schema: &Map<String, Value>) -> String;
    fn integer(&self, min: Option<i64>, max: Option<i64>) -> i64;
    fn number(&self, min: Option<Bound>, max: Option<Bound>) -> f64;
    fn boolean(&self) -> bool;
    fn item_count(&self, min: usize, max: Option<usize>) -> usize;
    fn include_optional(&self) -> bool;
}

fn walk<S: Sampler>(sampler: &S, schema: &Value, depth: usize) -> Result<Value, GenerationError> {
    let schema = match schema {
        Value::Object(schema) => schema,
        Value::Bool(true) => return Ok(Value::Null),
        Value::Bool(false) => {
            return Err(GenerationError::InvalidSchema(
                "no value satisfies the `false` schema".to_string(),
            ))
        }
        other => {
            return Err(GenerationError::InvalidSchema(format!(
                "expected an object, got {other}"
            )))
        }
    };

    if let Some(reference) = schema.get("$ref") {
        return Err(GenerationError::UnresolvedReference(
            reference.as_str().unwrap_or_default().to_string(),
        ));
    }
    if depth > MAX_DEPTH {
        return Ok(Value::Null);
    }
    if let Some(value) = schema.get("const") {
        return Ok(value.clone());
    }
    if let Some(value) = sampler.literal(schema) {
        return Ok(value);
    }
    if let Some(Value::Array(options)) = schema.get("enum") {
        if let Some(value) = sampler.choose(options) {
            return Ok(value.clone());
        }
    }

    if let Some(Value::Array(parts)) = schema.get("allOf") {
        return merge_all_of(sampler, schema, parts, depth);
    }
    for keyword in ["oneOf", "anyOf"] {
        if let Some(Value::Array(options)) = schema.get(keyword) {
            if let Some(option) = sampler.choose(options) {
                return walk(sampler, option, depth + 1);
            }
        }
    }

    match schema_type(schema)?.as_deref() {
        Some("object") => object(sampler, schema, depth),
        Some("array") => array(sampler, schema, depth),
        Some("string") => Ok(Value::String(sampler.string(schema))),
        Some("integer") => Ok(Value::from(sampler.integer(
            lower_bound(schema).map(Bound::least_integer),
            upper_bound(schema).map(Bound::greatest_integer),
        ))),
        Some("number") => {
            let number = sampler.number(lower_bound(schema), upper_bound(schema));
            Ok(serde_json::Number::from_f64(number)
                .map(Value::Number)
                .unwrap_or(Value::Null))
        }
        Some("boolean") => Ok(Value::Bool(sampler.boolean())),
        Some("null") | None => Ok(Value::Null),
        Some(other) => Err(GenerationError::UnsupportedType(other.to_string())),
    }
}

/// Declared or inferred type; for `["string", "null"]` the first non-null.
fn schema_type(schema: &Map<String, Value>) -> Result<Option<String>, GenerationError> {
    match schema.get("type") {
        Some(Value::String(kind)) => Ok(Some(kind.clone())),
        Some(Value::Array(kinds)) => Ok(kinds
            .iter()
            .filter_map(Value::as_str)
            .find(|kind| *kind != "null")
            .or_else(|| kinds.iter().filter_map(Value::as_str).next())
            .map(str::to_string)),
        Some(other) => Err(GenerationError::InvalidSchema(format!(
            "`type` must be a string or an array, got {other}"
        ))),
        None if schema.contains_key("properties") => Ok(Some("object".to_string())),
        None if schema.contains_key("items") => Ok(Some("array".to_string())),
        None => Ok(None),
    }
}

/// A numeric limit; an exclusive one does not admit its own value.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Bound {
    value: f64,
    exclusive: bool,
}

impl Bound {
    fn inclusive(value: f64) -> Self {
        Self {
            value,
            exclusive: false,
        }
    }

    fn exclusive(value: f64) -> Self {
        Self {
            value,
            exclusive: true,
        }
    }

    /// Whether `value` satisfies this bound read as a minimum.
    fn admits_above(self, value: f64) -> bool {
        if self.exclusive {
            value > self.value
        } else {
            value >= self.value
        }
    }

    /// Whether `value` satisfies this bound read as a maximum.
    fn admits_below(self, value: f64) -> bool {
        if self.exclusive {
            value < self.value
        } else {
            value <= self.value
        }
    }

    fn least_integer(self) -> i64 {
        if self.exclusive {
            (self.value.floor() as i64).saturating_add(1)
        } else {
            self.value.ceil() as i64
        }
    }

    fn greatest_integer(self) -> i64 {
        if self.exclusive {
            (self.value.ceil() as i64).saturating_sub(1)
        } else {
            self.value.floor() as i64
        }
    }
}

fn lower_bound(schema: &Map<String, Value>) -> Option<Bound> {
    bound(schema, "minimum", "exclusiveMinimum", |exclusive, inclusive| {
        exclusive >= inclusive
    })
}

fn upper_bound(schema: &Map<String, Value>) -> Option<Bound> {
    bound(schema, "maximum", "exclusiveMaximum", |exclusive, inclusive| {
        exclusive <= inclusive
    })
}

/// Reads both `exclusiveMinimum: true` next to `minimum` and the numeric
/// `exclusiveMinimum: 3` form; when both limits are given the tighter wins.
fn bound<F>(
    schema: &Map<String, Value>,
    inclusive: &str,
    exclusive: &str,
    tighter: F,
) -> Option<Bound>
where
    F: Fn(f64, f64) -> bool,
{
    let limit = schema.get(inclusive).and_then(Value::as_f64);
    match schema.get(exclusive) {
        Some(Value::Bool(true)) => limit.map(Bound::exclusive),
        Some(Value::Number(number)) => match (number.as_f64(), limit) {
            (Some(open), Some(closed)) if !tighter(open, closed) => Some(Bound::inclusive(closed)),
            (Some(open), _) => Some(Bound::exclusive(open)),
            (None, closed) => closed.map(Bound::inclusive),
        },
        _ => limit.map(Bound::inclusive),
    }
}

/// A value strictly past `value` in `direction` (1.0 up, -1.0 down).
fn step_past(value: f64, direction: f64) -> f64 {
    value + direction * (value.abs() * f64::EPSILON).max(1.0)
}

fn object<S: Sampler>(
    sampler: &S,
    schema: &Map<String, Value>,
    depth: usize,
) -> Result<Value, GenerationError> {
    let required: Vec<&str> = schema
        .get("required")
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let mut object = Map::new();
    if let Some(Value::Object(properties)) = schema.get("properties") {
        for (name, property) in properties {
            let write_only = property
                .get("writeOnly")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            if write_only {
                continue;
            }
            if required.contains(&name.as_str()) || sampler.include_optional() {
                object.insert(name.clone(), walk(sampler, property, depth + 1)?);
            }
        }
    }
    Ok(Value::Object(object))
}

fn array<S: Sampler>(
    sampler: &S,
    schema: &Map<String, Value>,
    depth: usize,
) -> Result<Value, GenerationError> {
    let Some(items) = schema.get("items") else {
        return Ok(Value::Array(Vec::new()));
    };
    let min = schema
        .get("minItems")
        .and_then(Value::as_u64)
        .unwrap_or(0) as usize;
    let max = schema
        .get("maxItems")
        .and_then(Value::as_u64)
        .map(|max| max as usize);

    let count = sampler.item_count(min, max);
    (0..count)
        .map(|_| walk(sampler, items, depth + 1))
        .collect::<Result<Vec<_>, _>>()
        .map(Value::Array)
}

fn merge_all_of<S: Sampler>(
    sampler: &S,
    schema: &Map<String, Value>,
    parts: &[Value],
    depth: usize,
) -> Result<Value, GenerationError> {
    let mut merged = Map::new();
    let mut rest = schema.clone();
    rest.remove("allOf");

    let mut last = None;
    for part in parts.iter().chain(std::iter::once(&Value::Object(rest))) {
        match walk(sampler, part, depth + 1)? {
            Value::Object(fields) => merged.extend(fields),
            Value::Null => {}
            other => last = Some(other),
        }
    }
    Ok(last.unwrap_or(Value::Object(merged)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unresolved_reference() {
        let error = StaticGenerator
            .generate(&json!({"$ref": "#/components/schemas/Pet"}))
            .unwrap_err();
        assert_eq!(
            error,
            GenerationError::UnresolvedReference("#/components/schemas/Pet".to_string())
        );
    }

    #[test]
    fn test_unsupported_type() {
        let error = DynamicGenerator
            .generate(&json!({"type": "file"}))
            .unwrap_err();
        assert!(matches!(error, GenerationError::UnsupportedType(_)));
    }

    #[test]
    fn test_invalid_type_keyword() {
        let error = StaticGenerator.generate(&json!({"type": 7})).unwrap_err();
        assert!(matches!(error, GenerationError::InvalidSchema(_)));
    }

    #[test]
    fn test_const_wins() {
        for generator in [&StaticGenerator as &dyn PayloadGenerator, &DynamicGenerator] {
            let value = generator
                .generate(&json!({"type": "string", "const": "fixed"}))
                .unwrap();
            assert_eq!(value, json!("fixed"));
        }
    }

    #[test]
    fn test_for_config() {
        let config = HttpConfig::mocking(crate::config::HttpMockOptions {
            dynamic: true,
            ..Default::default()
        });
        let value = for_config(&config)
            .generate(&json!({"type": "integer", "minimum": 5, "maximum": 5}))
            .unwrap();
        assert_eq!(value, json!(5));
    }
}
