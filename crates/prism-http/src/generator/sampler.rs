use super::{step_past, walk, Bound, GenerationError, PayloadGenerator, Sampler};
use crate::types::Schema;
use serde_json::{Map, Value};

/// Deterministic generator: the same schema always yields the same value.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticGenerator;

impl PayloadGenerator for StaticGenerator {
    fn generate(&self, schema: &Schema) -> Result<Value, GenerationError> {
        walk(self, schema, 0)
    }
}

impl Sampler for StaticGenerator {
    fn literal(&self, schema: &Map<String, Value>) -> Option<Value> {
        if let Some(example) = schema.get("example") {
            return Some(example.clone());
        }
        if let Some(Value::Array(examples)) = schema.get("examples") {
            if let Some(example) = examples.first() {
                return Some(example.clone());
            }
        }
        schema.get("default").cloned()
    }

    fn choose<'v>(&self, options: &'v [Value]) -> Option<&'v Value> {
        options.first()
    }

    fn string(&self, schema: &Map<String, Value>) -> String {
        let placeholder = match schema.get("format").and_then(Value::as_str) {
            Some("date-time") => "2019-08-24T14:15:22Z",
            Some("date") => "2019-08-24",
            Some("time") => "14:15:22Z",
            Some("email") => "user@example.com",
            Some("uuid") => "095be615-a8ad-4c33-8e9c-c7612fbf6c9f",
            Some("uri") | Some("url") => "http://example.com",
            Some("hostname") => "example.com",
            Some("ipv4") => "192.168.0.1",
            Some("ipv6") => "2001:db8::1",
            Some("byte") => "U3dhZ2dlciByb2Nrcw==",
            _ => "string",
        };
        fit_length(placeholder, schema)
    }

    fn integer(&self, min: Option<i64>, max: Option<i64>) -> i64 {
        match (min, max) {
            (Some(min), _) => min,
            (None, Some(max)) if max < 0 => max,
            _ => 0,
        }
    }

    fn number(&self, min: Option<Bound>, max: Option<Bound>) -> f64 {
        let candidate = match (min, max) {
            (Some(min), _) if min.exclusive => step_past(min.value, 1.0),
            (Some(min), _) => min.value,
            (None, Some(max)) if max.admits_below(0.0) => 0.0,
            (None, Some(max)) if max.exclusive => step_past(max.value, -1.0),
            (None, Some(max)) => max.value,
            (None, None) => 0.0,
        };
        match (min, max) {
            (Some(min), Some(max)) if !max.admits_below(candidate) => (min.value + max.value) / 2.0,
            _ => candidate,
        }
    }

    fn boolean(&self) -> bool {
        true
    }

    fn item_count(&self, min: usize, max: Option<usize>) -> usize {
        let count = min.max(1);
        max.map_or(count, |max| count.min(max))
    }

    fn include_optional(&self) -> bool {
        true
    }
}

/// Pad or cut `value` to the schema's `minLength`/`maxLength`.
pub(super) fn fit_length(value: &str, schema: &Map<String, Value>) -> String {
    let min = schema
        .get("minLength")
        .and_then(Value::as_u64)
        .unwrap_or(0) as usize;
    let max = schema
        .get("maxLength")
        .and_then(Value::as_u64)
        .map(|max| max as usize);

    let mut value = value.to_string();
    if value.is_empty() && min > 0 {
        value.push('x');
    }
    while value.chars().count() < min {
        value.push_str(&value.clone());
    }
    if let Some(max) = max {
        value = value.chars().take(max).collect();
    }
    value
}
