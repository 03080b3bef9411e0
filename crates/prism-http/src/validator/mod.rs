//! Request and response validation.
//!
//! The validator never fails: every finding becomes a [`Diagnostic`] and the
//! pipeline decides what to do with them. Schema checks go through the
//! [`SchemaValidator`] capability.

pub mod params;
pub mod schema;
pub mod security;

pub use params::{coerce, parse_cookies, validate_parameters, ParameterLocation};
pub use schema::{JsonSchemaValidator, SchemaValidator};
pub use security::validate_security;

use crate::config::HttpConfig;
use crate::negotiator::media_type;
use crate::router::match_path;
use crate::types::{HttpOperation, HttpRequest, HttpResponse, HttpResponseSpec, MediaTypeContent};
use prism_core::{Diagnostic, Validator};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Validator for [`HttpOperation`]s.
#[derive(Clone)]
pub struct HttpValidator {
    schemas: Arc<dyn SchemaValidator>,
}

impl Default for HttpValidator {
    fn default() -> Self {
        Self::new(Arc::new(JsonSchemaValidator))
    }
}

impl HttpValidator {
    pub fn new(schemas: Arc<dyn SchemaValidator>) -> Self {
        Self { schemas }
    }

    fn validate_body(&self, operation: &HttpOperation, request: &HttpRequest) -> Vec<Diagnostic> {
        let Some(spec) = &operation.request.body else {
            return Vec::new();
        };

        let Some(body) = &request.body else {
            if spec.required {
                return vec![Diagnostic::error("required", "Body parameter is required")
                    .with_path(["body"])];
            }
            return Vec::new();
        };

        let content = match request.header("content-type") {
            Some(content_type) => find_content(&spec.contents, content_type),
            None => spec.contents.first(),
        };
        let Some(content) = content else {
            return vec![Diagnostic::error(
                415u16,
                format!(
                    "Supported content types: {}",
                    spec.contents
                        .iter()
                        .map(|content| content.media_type.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            )
            .with_path(["header", "content-type"])];
        };

        match &content.schema {
            Some(schema) => {
                let body = parse_json_string(&content.media_type, body);
                self.schemas.validate(schema, &body, &["body"])
            }
            None => Vec::new(),
        }
    }
}

impl Validator<HttpOperation, HttpRequest, HttpResponse, HttpConfig> for HttpValidator {
    fn validate_input(
        &self,
        operation: &HttpOperation,
        request: &HttpRequest,
        config: &HttpConfig,
    ) -> Vec<Diagnostic> {
        let schemas = self.schemas.as_ref();
        let spec = &operation.request;
        let mut diagnostics = Vec::new();

        if operation.deprecated {
            diagnostics.push(Diagnostic::warning(
                "deprecated",
                format!("Operation {} is deprecated", operation.label()),
            ));
        }

        let path_params = match_path(&request.url.path, &operation.path).unwrap_or_default();
        diagnostics.extend(validate_parameters(
            schemas,
            ParameterLocation::Path,
            &spec.path,
            |name| {
                path_params
                    .iter()
                    .find(|(key, _)| key == name)
                    .map(|(_, value)| vec![value.as_str()])
            },
        ));

        diagnostics.extend(validate_parameters(
            schemas,
            ParameterLocation::Query,
            &spec.query,
            |name| {
                request
                    .url
                    .query
                    .as_ref()
                    .and_then(|query| query.get(name))
                    .map(|value| value.values())
            },
        ));

        diagnostics.extend(validate_parameters(
            schemas,
            ParameterLocation::Header,
            &spec.headers,
            |name| {
                request
                    .headers
                    .as_ref()
                    .and_then(|headers| headers.get(name))
                    .map(|value| value.values())
            },
        ));

        let cookies = request.header("cookie").map(parse_cookies).unwrap_or_default();
        diagnostics.extend(validate_parameters(
            schemas,
            ParameterLocation::Cookie,
            &spec.cookie,
            |name| {
                let values: Vec<&str> = cookies
                    .iter()
                    .filter(|(key, _)| *key == name)
                    .map(|(_, value)| *value)
                    .collect();
                (!values.is_empty()).then_some(values)
            },
        ));

        diagnostics.extend(self.validate_body(operation, request));

        if config.security {
            diagnostics.extend(validate_security(&operation.security, request));
        }

        if diagnostics.is_empty() {
            debug!(operation = %operation.label(), "Request passed the validation rules");
        } else {
            debug!(
                operation = %operation.label(),
                diagnostics = diagnostics.len(),
                "Request did not pass the validation rules"
            );
        }
        diagnostics
    }

    fn validate_output(
        &self,
        operation: &HttpOperation,
        response: &HttpResponse,
        _config: &HttpConfig,
    ) -> Vec<Diagnostic> {
        let Some(spec) = find_response_spec(&operation.responses, response.status_code) else {
            return vec![Diagnostic::error(
                "status",
                format!(
                    "Unable to match the returned status code {} with those defined in the document: {}",
                    response.status_code,
                    operation
                        .responses
                        .iter()
                        .map(|response| response.code.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            )
            .with_path(["status"])];
        };

        let mut diagnostics = Vec::new();

        let content = match response.content_type() {
            Some(content_type) if !spec.contents.is_empty() => {
                let content = find_content(&spec.contents, content_type);
                if content.is_none() {
                    diagnostics.push(
                        Diagnostic::error(
                            "mediaType",
                            format!(
                                "The received media type \"{content_type}\" does not match the one specified in the document"
                            ),
                        )
                        .with_path(["header", "content-type"]),
                    );
                }
                content
            }
            _ => spec.contents.first(),
        };

        diagnostics.extend(validate_parameters(
            self.schemas.as_ref(),
            ParameterLocation::Header,
            &spec.headers,
            |name| response.headers.get(name).map(|value| value.values()),
        ));

        if let (Some(content), Some(body)) = (content, &response.body) {
            if let Some(schema) = &content.schema {
                let body = parse_json_string(&content.media_type, body);
                diagnostics.extend(self.schemas.validate(schema, &body, &["body"]));
            }
        }

        debug!(
            operation = %operation.label(),
            status = response.status_code,
            diagnostics = diagnostics.len(),
            "Response validated"
        );
        diagnostics
    }
}

/// Declared response for `status`: exact code, then `2XX` style range, then
/// `default`.
pub fn find_response_spec(responses: &[HttpResponseSpec], status: u16) -> Option<&HttpResponseSpec> {
    let exact = status.to_string();
    let range = format!("{}XX", status / 100);
    responses
        .iter()
        .find(|response| response.code == exact)
        .or_else(|| {
            responses
                .iter()
                .find(|response| response.code.eq_ignore_ascii_case(&range))
        })
        .or_else(|| {
            responses
                .iter()
                .find(|response| response.code.eq_ignore_ascii_case("default"))
        })
}

fn find_content<'a>(contents: &'a [MediaTypeContent], content_type: &str) -> Option<&'a MediaTypeContent> {
    let wanted = media_type::essence(content_type);
    contents
        .iter()
        .find(|content| media_type::essence(&content.media_type) == wanted)
        .or_else(|| {
            contents
                .iter()
                .find(|content| media_type::range_matches(&content.media_type, &wanted).is_some())
        })
}

/// JSON payloads that arrive as raw text are parsed before validation.
fn parse_json_string(media_type: &str, body: &Value) -> Value {
    match body {
        Value::String(raw) if media_type::is_json(media_type) => {
            serde_json::from_str(raw).unwrap_or_else(|_| body.clone())
        }
        _ => body.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headers::Headers;
    use crate::types::{Parameter, RequestBody};
    use serde_json::json;

    fn find_by_status() -> HttpOperation {
        serde_json::from_value(json!({
            "method": "get",
            "path": "/pet/findByStatus",
            "request": {
                "query": [{
                    "name": "status",
                    "required": true,
                    "schema": {"type": "array", "items": {"type": "string", "enum": ["available", "pending", "sold"]}}
                }],
                "headers": [{"name": "api_key", "required": true, "schema": {"type": "string"}}]
            },
            "responses": [{
                "code": "200",
                "contents": [{
                    "mediaType": "application/json",
                    "schema": {"type": "array", "items": {"type": "object", "required": ["name"]}}
                }],
                "headers": [{"name": "X-Rate-Limit", "required": true, "schema": {"type": "integer"}}]
            }]
        }))
        .unwrap()
    }

    fn validate_input(operation: &HttpOperation, request: &HttpRequest) -> Vec<Diagnostic> {
        HttpValidator::default().validate_input(operation, request, &HttpConfig::default())
    }

    #[test]
    fn test_valid_request() {
        let request = HttpRequest::get("/pet/findByStatus")
            .with_query("status", vec!["available", "sold"])
            .with_header("API_KEY", "secret");
        assert!(validate_input(&find_by_status(), &request).is_empty());
    }

    #[test]
    fn test_missing_query_and_header() {
        let diagnostics = validate_input(&find_by_status(), &HttpRequest::get("/pet/findByStatus"));
        let paths: Vec<_> = diagnostics.iter().map(|d| d.path.join(".")).collect();
        assert_eq!(paths, vec!["query.status", "header.api_key"]);
        assert!(diagnostics.iter().all(|d| d.code == "required".into()));
    }

    #[test]
    fn test_query_enum_violation() {
        let request = HttpRequest::get("/pet/findByStatus")
            .with_query("status", "lost")
            .with_header("api_key", "secret");
        let diagnostics = validate_input(&find_by_status(), &request);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, "enum".into());
        assert_eq!(diagnostics[0].path, vec!["query", "status", "0"]);
    }

    #[test]
    fn test_path_parameter_coercion() {
        let operation = HttpOperation {
            method: "get".to_string(),
            path: "/pet/{petId}".to_string(),
            request: crate::types::HttpRequestSpec {
                path: vec![Parameter {
                    name: "petId".to_string(),
                    required: true,
                    schema: Some(json!({"type": "integer"})),
                    ..Default::default()
                }],
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(validate_input(&operation, &HttpRequest::get("/pet/10")).is_empty());

        let diagnostics = validate_input(&operation, &HttpRequest::get("/pet/abc"));
        assert_eq!(diagnostics[0].path, vec!["path", "petId"]);
        assert_eq!(diagnostics[0].code, "type".into());
    }

    #[test]
    fn test_cookie_parameter() {
        let operation = HttpOperation {
            method: "get".to_string(),
            path: "/session".to_string(),
            request: crate::types::HttpRequestSpec {
                cookie: vec![Parameter {
                    name: "session".to_string(),
                    required: true,
                    ..Default::default()
                }],
                ..Default::default()
            },
            ..Default::default()
        };
        let request = HttpRequest::get("/session").with_header("Cookie", "session=abc");
        assert!(validate_input(&operation, &request).is_empty());
        assert_eq!(validate_input(&operation, &HttpRequest::get("/session")).len(), 1);
    }

    fn create_pet() -> HttpOperation {
        HttpOperation {
            method: "post".to_string(),
            path: "/pet".to_string(),
            request: crate::types::HttpRequestSpec {
                body: Some(RequestBody {
                    required: true,
                    contents: vec![MediaTypeContent {
                        media_type: "application/json".to_string(),
                        schema: Some(json!({"type": "object", "required": ["name"]})),
                        examples: vec![],
                    }],
                }),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_required_body() {
        let diagnostics = validate_input(&create_pet(), &HttpRequest::new("post", "/pet"));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].path, vec!["body"]);
    }

    #[test]
    fn test_body_schema() {
        let request = HttpRequest::new("post", "/pet")
            .with_header("Content-Type", "application/json; charset=utf-8")
            .with_body(json!({"id": 1}));
        let diagnostics = validate_input(&create_pet(), &request);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, "required".into());

        let request = HttpRequest::new("post", "/pet").with_body(json!("{\"name\": \"doggie\"}"));
        assert!(validate_input(&create_pet(), &request).is_empty());
    }

    #[test]
    fn test_unsupported_body_media_type() {
        let request = HttpRequest::new("post", "/pet")
            .with_header("Content-Type", "application/xml")
            .with_body(json!("<pet/>"));
        let diagnostics = validate_input(&create_pet(), &request);
        assert_eq!(diagnostics[0].code.status(), Some(415));
    }

    #[test]
    fn test_security_toggle() {
        let mut operation = find_by_status();
        operation.request.headers.clear();
        operation.security = vec![vec![crate::types::SecurityScheme::Http {
            key: "bearer".to_string(),
            scheme: "bearer".to_string(),
        }]];
        let request = HttpRequest::get("/pet/findByStatus").with_query("status", "sold");

        let diagnostics = validate_input(&operation, &request);
        assert_eq!(diagnostics[0].code.status(), Some(401));

        let config = HttpConfig {
            security: false,
            ..Default::default()
        };
        assert!(HttpValidator::default()
            .validate_input(&operation, &request, &config)
            .is_empty());
    }

    fn response(status: u16, headers: &[(&str, &str)], body: Option<Value>) -> HttpResponse {
        HttpResponse {
            status_code: status,
            headers: headers.iter().map(|(k, v)| (*k, *v)).collect::<Headers>(),
            body,
        }
    }

    fn validate_output(response: &HttpResponse) -> Vec<Diagnostic> {
        HttpValidator::default().validate_output(&find_by_status(), response, &HttpConfig::default())
    }

    #[test]
    fn test_valid_response() {
        let response = response(
            200,
            &[("content-type", "application/json"), ("x-rate-limit", "10")],
            Some(json!([{"name": "doggie"}])),
        );
        assert!(validate_output(&response).is_empty());
    }

    #[test]
    fn test_undeclared_status() {
        let diagnostics = validate_output(&response(500, &[], None));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].path, vec!["status"]);
    }

    #[test]
    fn test_response_violations() {
        let response = response(
            200,
            &[("content-type", "text/html")],
            Some(json!("[{}]")),
        );
        let codes: Vec<String> = validate_output(&response)
            .iter()
            .map(|d| d.code.to_string())
            .collect();
        assert_eq!(codes, vec!["mediaType", "required"]);
    }

    #[test]
    fn test_json_text_body_is_parsed() {
        let response = response(
            200,
            &[("Content-Type", "application/json"), ("X-Rate-Limit", "1")],
            Some(json!("[{\"id\": 1}]")),
        );
        let diagnostics = validate_output(&response);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].path, vec!["body", "0"]);
    }

    #[test]
    fn test_find_response_spec_patterns() {
        let responses: Vec<HttpResponseSpec> = serde_json::from_value(json!([
            {"code": "200"}, {"code": "4XX"}, {"code": "default"}
        ]))
        .unwrap();
        assert_eq!(find_response_spec(&responses, 200).unwrap().code, "200");
        assert_eq!(find_response_spec(&responses, 404).unwrap().code, "4XX");
        assert_eq!(find_response_spec(&responses, 503).unwrap().code, "default");
    }
}
