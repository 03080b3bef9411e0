//! Type definitions for the HTTP instantiation of the pipeline.
//!
//! Operations are produced by an external document loader and consumed
//! read-only here. Requests and responses are transient, one per call.

use crate::headers::Headers;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// JSON Schema fragment, already dereferenced by the loader.
pub type Schema = Value;

fn is_false(b: &bool) -> bool {
    !*b
}

// ============================================================================
// Operation Model
// ============================================================================

/// One API operation: a method on a path template.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpOperation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub method: String,
    /// Path template, e.g. `/pet/{petId}`
    pub path: String,
    #[serde(default)]
    pub servers: Vec<Server>,
    #[serde(default)]
    pub request: HttpRequestSpec,
    #[serde(default)]
    pub responses: Vec<HttpResponseSpec>,
    /// Alternatives (OR) of scheme groups that must all be satisfied (AND)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security: Vec<Vec<SecurityScheme>>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub deprecated: bool,
}

impl HttpOperation {
    /// `GET /pet/{petId}` style label for logs.
    pub fn label(&self) -> String {
        format!("{} {}", self.method.to_uppercase(), self.path)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    /// URL template, e.g. `{scheme}://example.com/api`
    pub url: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub variables: BTreeMap<String, ServerVariable>,
}

impl Server {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            variables: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerVariable {
    pub default: String,
    #[serde(default, rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpRequestSpec {
    #[serde(default)]
    pub path: Vec<Parameter>,
    #[serde(default)]
    pub query: Vec<Parameter>,
    #[serde(default)]
    pub headers: Vec<Parameter>,
    #[serde(default)]
    pub cookie: Vec<Parameter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<RequestBody>,
}

/// A path, query, header or cookie parameter; also used for response headers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    pub name: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<Example>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub deprecated: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestBody {
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub contents: Vec<MediaTypeContent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaTypeContent {
    pub media_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<Example>,
}

/// A declared response: status code (`200`, `4XX`, `default`) and its contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpResponseSpec {
    pub code: String,
    #[serde(default)]
    pub contents: Vec<MediaTypeContent>,
    #[serde(default)]
    pub headers: Vec<Parameter>,
}

/// A named example: an inline value or a reference to an external document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Example {
    External {
        #[serde(default)]
        key: String,
        #[serde(rename = "externalValue")]
        external_value: String,
    },
    Literal {
        #[serde(default)]
        key: String,
        /// `None` when the example declares no value at all
        #[serde(
            default,
            deserialize_with = "deserialize_present",
            skip_serializing_if = "Option::is_none"
        )]
        value: Option<Value>,
    },
}

impl Example {
    pub fn key(&self) -> &str {
        match self {
            Example::External { key, .. } | Example::Literal { key, .. } => key,
        }
    }

    /// Inline value, if this is a literal example that has one.
    pub fn literal_value(&self) -> Option<&Value> {
        match self {
            Example::Literal { value, .. } => value.as_ref(),
            Example::External { .. } => None,
        }
    }
}

/// Keeps an explicit `null` as `Some(Value::Null)`; a missing field stays `None`.
fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiKeyLocation {
    Header,
    Query,
    Cookie,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SecurityScheme {
    #[serde(rename = "apiKey")]
    ApiKey {
        key: String,
        name: String,
        #[serde(rename = "in")]
        location: ApiKeyLocation,
    },
    #[serde(rename = "http")]
    Http { key: String, scheme: String },
    #[serde(rename = "oauth2")]
    OAuth2 { key: String },
    #[serde(rename = "openIdConnect")]
    OpenIdConnect { key: String },
}

impl SecurityScheme {
    pub fn key(&self) -> &str {
        match self {
            SecurityScheme::ApiKey { key, .. }
            | SecurityScheme::Http { key, .. }
            | SecurityScheme::OAuth2 { key }
            | SecurityScheme::OpenIdConnect { key } => key,
        }
    }
}

// ============================================================================
// Request / Response
// ============================================================================

/// A query parameter value: one string or a repeated parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryValue {
    Single(String),
    Multiple(Vec<String>),
}

impl QueryValue {
    pub fn values(&self) -> Vec<&str> {
        match self {
            QueryValue::Single(value) => vec![value.as_str()],
            QueryValue::Multiple(values) => values.iter().map(String::as_str).collect(),
        }
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::Single(value.to_string())
    }
}

impl From<Vec<&str>> for QueryValue {
    fn from(values: Vec<&str>) -> Self {
        QueryValue::Multiple(values.into_iter().map(str::to_string).collect())
    }
}

pub type HttpQuery = BTreeMap<String, QueryValue>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpUrl {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<HttpQuery>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HttpRequest {
    pub method: String,
    pub url: HttpUrl,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<Headers>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl HttpRequest {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: HttpUrl {
                path: path.into(),
                ..Default::default()
            },
            headers: None,
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new("get", path)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.url.base_url = Some(base_url.into());
        self
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.url
            .query
            .get_or_insert_with(HttpQuery::new)
            .insert(name.into(), value.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(Headers::new)
            .insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// First value of a request header, case-insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.as_ref().and_then(|h| h.get_str(name))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpResponse {
    pub status_code: u16,
    #[serde(default)]
    pub headers: Headers,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl HttpResponse {
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get_str("content-type")
    }
}
