//! Mocked response assembly.
//!
//! Body precedence: a literal example as is, then a value generated from the
//! schema, then no body. Each declared header takes its first literal
//! example or a generated value; a generated empty object is dropped rather
//! than sent. `Content-Type` is always the negotiated media type.

use crate::config::HttpConfig;
use crate::errors::GENERATION_ERROR;
use crate::generator::{self, GenerationError, PayloadGenerator};
use crate::headers::Headers;
use crate::negotiator::{negotiate, NegotiationResult};
use crate::types::{Example, HttpOperation, HttpRequest, HttpResponse, Parameter};
use prism_core::{Mocker, PrismInput, ProblemDetail};
use serde_json::Value;
use tracing::{debug, info};

/// Mocker for [`HttpOperation`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpMocker;

impl HttpMocker {
    pub fn new() -> Self {
        Self
    }
}

impl Mocker<HttpOperation, HttpRequest, HttpResponse, HttpConfig> for HttpMocker {
    fn mock(
        &self,
        operation: &HttpOperation,
        input: &PrismInput<HttpRequest>,
        config: &HttpConfig,
    ) -> Result<HttpResponse, ProblemDetail> {
        let result = negotiate(operation, input, config)?;
        let mut response = assemble(&result, generator::for_config(config))
            .map_err(|error| ProblemDetail::from_template(&GENERATION_ERROR, error.to_string()))?;

        if config.cors {
            apply_cors(&mut response.headers, input.data.header("origin"));
        }

        info!(
            "Responding with the requested status code {}",
            response.status_code
        );
        Ok(response)
    }
}

/// Build the response a negotiation result describes.
pub fn assemble(
    result: &NegotiationResult,
    generator: &dyn PayloadGenerator,
) -> Result<HttpResponse, GenerationError> {
    let body = compute_body(result, generator)?;
    let mut headers = compute_headers(&result.headers, generator)?;
    headers.insert("Content-Type", result.media_type.as_str());

    Ok(HttpResponse {
        status_code: result.status,
        headers,
        body,
    })
}

fn compute_body(
    result: &NegotiationResult,
    generator: &dyn PayloadGenerator,
) -> Result<Option<Value>, GenerationError> {
    match (&result.body_example, &result.schema) {
        // An example without a value means "no body"
        (Some(Example::Literal { value, .. }), _) => Ok(value.clone()),
        (_, Some(schema)) => {
            debug!("Generating the body from the schema");
            generator.generate(schema).map(Some)
        }
        (_, None) => Ok(None),
    }
}

fn compute_headers(
    specs: &[Parameter],
    generator: &dyn PayloadGenerator,
) -> Result<Headers, GenerationError> {
    let mut headers = Headers::new();
    for spec in specs {
        let Some(schema) = &spec.schema else {
            continue;
        };
        let value = match spec.examples.first() {
            Some(example) => example.literal_value().cloned(),
            None => Some(generator.generate(schema)?).filter(|value| !is_empty_object(value)),
        };
        if let Some(value) = value.and_then(header_text) {
            headers.insert(spec.name.as_str(), value);
        }
    }
    Ok(headers)
}

fn is_empty_object(value: &Value) -> bool {
    value.as_object().is_some_and(|object| object.is_empty())
}

fn header_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text),
        other => Some(other.to_string()),
    }
}

fn apply_cors(headers: &mut Headers, origin: Option<&str>) {
    headers.insert("Access-Control-Allow-Origin", origin.unwrap_or("*"));
    headers.insert("Access-Control-Allow-Headers", "*");
    headers.insert("Access-Control-Allow-Credentials", "true");
    headers.insert("Access-Control-Expose-Headers", "*");
}
