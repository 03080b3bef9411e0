//! Structural errors.
//!
//! Every terminal failure of the pipeline is a [`ProblemDetail`]: routing
//! failures, negotiation failures, forwarding failures, invalid requests that
//! have no declared error response. The transport layer maps it onto an
//! RFC 7807 style body via [`ProblemDetail::to_problem_json`].

use crate::diagnostic::{Diagnostic, DiagnosticCode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Prefix of every error type URI.
pub const ERROR_TYPE_BASE: &str = "https://stoplight.io/prism/errors#";

/// Static description of an error kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorTemplate {
    pub kind: &'static str,
    pub title: &'static str,
    pub status: u16,
}

impl ErrorTemplate {
    pub const fn new(kind: &'static str, title: &'static str, status: u16) -> Self {
        Self {
            kind,
            title,
            status,
        }
    }

    /// Full type URI, e.g. `https://stoplight.io/prism/errors#NOT_FOUND`.
    pub fn type_uri(&self) -> String {
        format!("{ERROR_TYPE_BASE}{}", self.kind)
    }
}

const UNKNOWN: ErrorTemplate = ErrorTemplate::new("UNKNOWN", "Unexpected error", 500);

/// One entry of the `validation` list attached to 422 problems.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationDetail {
    pub location: Vec<String>,
    pub severity: String,
    pub code: DiagnosticCode,
    pub message: String,
}

impl From<&Diagnostic> for ValidationDetail {
    fn from(diagnostic: &Diagnostic) -> Self {
        Self {
            location: diagnostic.path.clone(),
            severity: diagnostic.severity.to_string(),
            code: diagnostic.code.clone(),
            message: diagnostic.message.clone(),
        }
    }
}

/// Extra context carried by a problem.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProblemContext {
    /// Headers the transport layer should attach to the error response
    pub headers: BTreeMap<String, String>,
    pub validation: Vec<ValidationDetail>,
}

/// Serializable problem body: `{type, title, status, detail}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemJson {
    #[serde(rename = "type")]
    pub type_uri: String,
    pub title: String,
    pub status: u16,
    pub detail: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validation: Vec<ValidationDetail>,
}

/// A terminal pipeline error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{title}")]
pub struct ProblemDetail {
    /// Error type URI
    pub name: String,
    pub title: String,
    pub status: u16,
    pub detail: String,
    pub context: ProblemContext,
}

impl ProblemDetail {
    pub fn from_template(template: &ErrorTemplate, detail: impl Into<String>) -> Self {
        Self {
            name: template.type_uri(),
            title: template.title.to_string(),
            status: template.status,
            detail: detail.into(),
            context: ProblemContext::default(),
        }
    }

    /// Wrap any other error as an `UNKNOWN` problem.
    pub fn unknown(error: &dyn std::error::Error) -> Self {
        Self::from_template(&UNKNOWN, error.to_string())
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_validation(mut self, diagnostics: &[Diagnostic]) -> Self {
        self.context.validation = diagnostics.iter().map(ValidationDetail::from).collect();
        self
    }

    /// Whether this problem was built from `template`.
    pub fn is(&self, template: &ErrorTemplate) -> bool {
        self.name == template.type_uri()
    }

    /// The `#KIND` fragment of the type URI.
    pub fn kind(&self) -> &str {
        self.name
            .rsplit_once('#')
            .map(|(_, kind)| kind)
            .unwrap_or(&self.name)
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.context.headers
    }

    pub fn validation(&self) -> &[ValidationDetail] {
        &self.context.validation
    }

    pub fn to_problem_json(&self) -> ProblemJson {
        ProblemJson {
            type_uri: self.name.clone(),
            title: self.title.clone(),
            status: self.status,
            detail: self.detail.clone(),
            validation: self.context.validation.clone(),
        }
    }
}
