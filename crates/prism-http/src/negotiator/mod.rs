//! Response negotiation.
//!
//! Picks the one declared response (status, media type, example, headers)
//! a mocked request answers with. A request carrying any input diagnostic is
//! negotiated in error mode: a declared client-error response when there is
//! one, otherwise a synthesized 401/403/422 problem.

pub mod media_type;

use crate::config::{HttpConfig, HttpMockOptions};
use crate::errors::{
    FORBIDDEN, NOT_ACCEPTABLE, NOT_FOUND, NO_RESPONSE_DEFINED, UNAUTHORIZED, UNPROCESSABLE_ENTITY,
};
use crate::types::{Example, HttpOperation, HttpRequest, HttpResponseSpec, Parameter, Schema};
use prism_core::{Diagnostic, PrismInput, ProblemDetail};
use tracing::{debug, info, warn};

/// Media type of responses that declare no content.
pub const TEXT_PLAIN: &str = "text/plain";

/// The response a mocked request answers with.
#[derive(Debug, Clone, PartialEq)]
pub struct NegotiationResult {
    /// Concrete status code; a declared `2XX` or `default` becomes 200
    pub status: u16,
    pub media_type: String,
    pub schema: Option<Schema>,
    pub body_example: Option<Example>,
    pub headers: Vec<Parameter>,
}

/// Negotiate the response for `input` against `operation`.
pub fn negotiate(
    operation: &HttpOperation,
    input: &PrismInput<HttpRequest>,
    config: &HttpConfig,
) -> Result<NegotiationResult, ProblemDetail> {
    let options = config.mock_options().cloned().unwrap_or_default();
    let accept = input
        .data
        .header("accept")
        .filter(|accept| !accept.trim().is_empty());
    if let Some(accept) = accept {
        if options.media_types.is_none() {
            info!("Request contains an accept header: {accept}");
        }
    }

    if input.is_valid() {
        info!("The request passed the validation rules. Looking for the best response");
        negotiate_valid(operation, &options, accept)
    } else {
        warn!("Request did not pass the validation rules");
        negotiate_invalid(operation, input.diagnostics(), &options, accept)
    }
}

/// Success mode: status from config or the lowest 2xx, then media type, then example.
pub fn negotiate_valid(
    operation: &HttpOperation,
    options: &HttpMockOptions,
    accept: Option<&str>,
) -> Result<NegotiationResult, ProblemDetail> {
    let (status, response) = select_success_status(operation, options)?;
    debug!(status, operation = %operation.label(), "Selected status code");
    negotiate_content(status, response, options, accept, options.example_key.as_deref())
}

/// Error mode: a declared client-error response, or a synthesized problem.
pub fn negotiate_invalid(
    operation: &HttpOperation,
    diagnostics: &[Diagnostic],
    options: &HttpMockOptions,
    accept: Option<&str>,
) -> Result<NegotiationResult, ProblemDetail> {
    let security = diagnostics
        .iter()
        .find(|diagnostic| matches!(diagnostic.code.status(), Some(401) | Some(403)));

    let declared = match security.and_then(|diagnostic| diagnostic.code.status()) {
        Some(status) => find_declared(&operation.responses, status),
        None => select_client_error(&operation.responses),
    };

    if let Some((status, response)) = declared {
        match negotiate_content(status, response, options, accept, None) {
            Ok(result) => {
                debug!(status = result.status, "Using the declared error response");
                return Ok(result);
            }
            Err(error) => debug!(kind = error.kind(), "Declared error response not negotiable"),
        }
    }

    Err(match security {
        Some(diagnostic) => {
            let template = if diagnostic.code.status() == Some(401) {
                &UNAUTHORIZED
            } else {
                &FORBIDDEN
            };
            let problem = ProblemDetail::from_template(template, "");
            if diagnostic.tags.is_empty() {
                problem
            } else {
                problem.with_header("WWW-Authenticate", diagnostic.tags.join(","))
            }
        }
        None => ProblemDetail::from_template(
            &UNPROCESSABLE_ENTITY,
            "Your request is not valid and no HTTP validation response was found in the spec, so Prism is generating this error for you.",
        )
        .with_validation(diagnostics),
    })
}

/// Concrete status for a declared code: `"201"` -> 201, `"2XX"` -> 200.
/// `default` has no status of its own.
fn concrete_status(code: &str) -> Option<u16> {
    if let Ok(status) = code.parse::<u16>() {
        return Some(status);
    }
    match code.as_bytes() {
        [class @ b'1'..=b'5', x1, x2]
            if x1.eq_ignore_ascii_case(&b'x') && x2.eq_ignore_ascii_case(&b'x') =>
        {
            Some(u16::from(class - b'0') * 100)
        }
        _ => None,
    }
}

fn is_pattern(code: &str) -> bool {
    code.parse::<u16>().is_err()
}

/// Lowest declared response whose concrete status satisfies `keep`;
/// an exact code beats a pattern resolving to the same status.
fn lowest_where<F>(responses: &[HttpResponseSpec], keep: F) -> Option<(u16, &HttpResponseSpec)>
where
    F: Fn(u16) -> bool,
{
    responses
        .iter()
        .filter_map(|response| concrete_status(&response.code).map(|status| (status, response)))
        .filter(|(status, _)| keep(*status))
        .min_by_key(|(status, response)| (*status, is_pattern(&response.code)))
}

fn find_declared(responses: &[HttpResponseSpec], status: u16) -> Option<(u16, &HttpResponseSpec)> {
    responses
        .iter()
        .find(|response| response.code == status.to_string())
        .or_else(|| {
            let range = format!("{}XX", status / 100);
            responses
                .iter()
                .find(|response| response.code.eq_ignore_ascii_case(&range))
        })
        .map(|response| (status, response))
}

fn select_success_status<'a>(
    operation: &'a HttpOperation,
    options: &HttpMockOptions,
) -> Result<(u16, &'a HttpResponseSpec), ProblemDetail> {
    let responses = &operation.responses;
    if responses.is_empty() {
        return Err(ProblemDetail::from_template(
            &NO_RESPONSE_DEFINED,
            format!("No response defined for {}", operation.label()),
        ));
    }

    if let Some(code) = options.code {
        if let Some(found) = find_declared(responses, code) {
            return Ok(found);
        }
        warn!(
            code,
            operation = %operation.label(),
            "Requested status code is not defined in the document, falling back"
        );
    }

    if let Some(found) = lowest_where(responses, |status| (200..300).contains(&status)) {
        return Ok(found);
    }
    if let Some(found) = lowest_where(responses, |_| true) {
        return Ok(found);
    }
    responses
        .iter()
        .find(|response| response.code.eq_ignore_ascii_case("default"))
        .map(|response| (200, response))
        .ok_or_else(|| {
            ProblemDetail::from_template(
                &NO_RESPONSE_DEFINED,
                format!("No usable response defined for {}", operation.label()),
            )
        })
}

/// Client error response for an invalid request: 422, then 400, then the
/// lowest other 4xx.
fn select_client_error(responses: &[HttpResponseSpec]) -> Option<(u16, &HttpResponseSpec)> {
    [422u16, 400]
        .into_iter()
        .find_map(|status| {
            responses
                .iter()
                .find(|response| response.code == status.to_string())
                .map(|response| (status, response))
        })
        .or_else(|| lowest_where(responses, |status| (400..500).contains(&status)))
}

fn negotiate_content(
    status: u16,
    response: &HttpResponseSpec,
    options: &HttpMockOptions,
    accept: Option<&str>,
    example_key: Option<&str>,
) -> Result<NegotiationResult, ProblemDetail> {
    if response.contents.is_empty() {
        debug!(status, "Response declares no content");
        return Ok(NegotiationResult {
            status,
            media_type: TEXT_PLAIN.to_string(),
            schema: None,
            body_example: None,
            headers: response.headers.clone(),
        });
    }

    let declared: Vec<&str> = response
        .contents
        .iter()
        .map(|content| content.media_type.as_str())
        .collect();

    let ranges = match (&options.media_types, accept) {
        (Some(allowed), _) => Some(allowed.clone()),
        (None, Some(accept)) => Some(media_type::parse_accept(accept)),
        (None, None) => None,
    };

    let chosen = match &ranges {
        Some(ranges) => media_type::best_match(&declared, ranges).ok_or_else(|| {
            ProblemDetail::from_template(
                &NOT_ACCEPTABLE,
                format!(
                    "Unable to find content for {}. Available: {}",
                    ranges.join(", "),
                    declared.join(", ")
                ),
            )
        })?,
        None => declared[0],
    };

    let content = response
        .contents
        .iter()
        .find(|content| content.media_type == chosen)
        .unwrap_or(&response.contents[0]);
    debug!(status, media_type = %content.media_type, "Selected media type");

    let body_example = match example_key {
        Some(key) => Some(
            content
                .examples
                .iter()
                .find(|example| example.key() == key)
                .cloned()
                .ok_or_else(|| {
                    ProblemDetail::from_template(
                        &NOT_FOUND,
                        format!(
                            "Response for contentType: {} and exampleKey: {key} does not exist.",
                            content.media_type
                        ),
                    )
                })?,
        ),
        None if options.dynamic && content.schema.is_some() => None,
        None => content.examples.first().cloned(),
    };

    Ok(NegotiationResult {
        status,
        media_type: content.media_type.clone(),
        schema: content.schema.clone(),
        body_example,
        headers: response.headers.clone(),
    })
}
