use super::sampler::fit_length;
use super::{walk, Bound, GenerationError, PayloadGenerator, Sampler, StaticGenerator};
use crate::types::Schema;
use fake::faker::chrono::en::{Date, DateTime, Time};
use fake::faker::internet::en::{DomainSuffix, IPv4, IPv6, SafeEmail};
use fake::faker::lorem::en::Word;
use fake::Fake;
use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::{Map, Value};

/// Upper bound used when a numeric schema leaves the range open.
const DEFAULT_SPAN: i64 = 1000;

/// Random generator: every call may yield a different conforming value.
#[derive(Debug, Clone, Copy, Default)]
pub struct DynamicGenerator;

impl PayloadGenerator for DynamicGenerator {
    fn generate(&self, schema: &Schema) -> Result<Value, GenerationError> {
        walk(self, schema, 0)
    }
}

impl Sampler for DynamicGenerator {
    fn literal(&self, _schema: &Map<String, Value>) -> Option<Value> {
        None
    }

    fn choose<'v>(&self, options: &'v [Value]) -> Option<&'v Value> {
        options.choose(&mut rand::thread_rng())
    }

    fn string(&self, schema: &Map<String, Value>) -> String {
        let value: String = match schema.get("format").and_then(Value::as_str) {
            Some("date-time") => DateTime()
                .fake::<chrono::DateTime<chrono::Utc>>()
                .to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            Some("date") => Date().fake::<chrono::NaiveDate>().to_string(),
            Some("time") => Time().fake::<chrono::NaiveTime>().format("%H:%M:%S").to_string(),
            Some("email") => SafeEmail().fake(),
            Some("uuid") => uuid::Uuid::new_v4().to_string(),
            Some("uri") | Some("url") => format!(
                "https://{}.{}",
                Word().fake::<String>(),
                DomainSuffix().fake::<String>()
            ),
            Some("hostname") => format!(
                "{}.{}",
                Word().fake::<String>(),
                DomainSuffix().fake::<String>()
            ),
            Some("ipv4") => IPv4().fake(),
            Some("ipv6") => IPv6().fake(),
            _ => Word().fake(),
        };
        fit_length(&value, schema)
    }

    fn integer(&self, min: Option<i64>, max: Option<i64>) -> i64 {
        let (min, max) = match (min, max) {
            (Some(min), Some(max)) => (min, max),
            (Some(min), None) => (min, min.saturating_add(DEFAULT_SPAN)),
            (None, Some(max)) => (max.saturating_sub(DEFAULT_SPAN), max),
            (None, None) => (0, DEFAULT_SPAN),
        };
        if min >= max {
            return min;
        }
        rand::thread_rng().gen_range(min..=max)
    }

    fn number(&self, min: Option<Bound>, max: Option<Bound>) -> f64 {
        let span = DEFAULT_SPAN as f64;
        let (mut low, mut high) = match (min, max) {
            (Some(min), Some(max)) => (min.value, max.value),
            (Some(min), None) => (min.value, min.value + span),
            (None, Some(max)) => (max.value - span, max.value),
            (None, None) => (0.0, span),
        };
        if !(high - low).is_finite() {
            low = low.max(-span);
            high = high.min(span);
        }
        if low >= high {
            return StaticGenerator.number(min, max);
        }

        let mut rng = rand::thread_rng();
        let value = if max.is_some_and(|max| max.exclusive) {
            rng.gen_range(low..high)
        } else {
            rng.gen_range(low..=high)
        };
        if min.is_some_and(|min| !min.admits_above(value)) {
            (low + high) / 2.0
        } else {
            value
        }
    }

    fn boolean(&self) -> bool {
        rand::thread_rng().gen_bool(0.5)
    }

    fn item_count(&self, min: usize, max: Option<usize>) -> usize {
        let upper = max.unwrap_or(min + 3).max(min);
        rand::thread_rng().gen_range(min.max(1).min(upper)..=upper)
    }

    fn include_optional(&self) -> bool {
        rand::thread_rng().gen_bool(0.5)
    }
}
