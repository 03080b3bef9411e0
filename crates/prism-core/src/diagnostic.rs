//! Diagnostics and the envelopes that carry them through the pipeline.
//!
//! Diagnostics are the recoverable channel: validation failures are collected
//! here and never thrown. Structural failures use [`crate::ProblemDetail`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticSeverity {
    Error,
    Warning,
    Information,
    Hint,
}

impl DiagnosticSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticSeverity::Error => "Error",
            DiagnosticSeverity::Warning => "Warning",
            DiagnosticSeverity::Information => "Information",
            DiagnosticSeverity::Hint => "Hint",
        }
    }
}

impl fmt::Display for DiagnosticSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Diagnostic code: either an HTTP-like status (401, 403, 404, 422) or a
/// keyword such as `required` or `type`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DiagnosticCode {
    Status(u16),
    Keyword(String),
}

impl DiagnosticCode {
    /// Returns the numeric status when this code is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            DiagnosticCode::Status(status) => Some(*status),
            DiagnosticCode::Keyword(_) => None,
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticCode::Status(status) => write!(f, "{status}"),
            DiagnosticCode::Keyword(keyword) => f.write_str(keyword),
        }
    }
}

impl From<u16> for DiagnosticCode {
    fn from(status: u16) -> Self {
        DiagnosticCode::Status(status)
    }
}

impl From<&str> for DiagnosticCode {
    fn from(keyword: &str) -> Self {
        DiagnosticCode::Keyword(keyword.to_string())
    }
}

impl From<String> for DiagnosticCode {
    fn from(keyword: String) -> Self {
        DiagnosticCode::Keyword(keyword)
    }
}

/// A single validation finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub message: String,
    pub severity: DiagnosticSeverity,
    /// Location of the offending value, e.g. `["query", "status"]`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<String>,
    /// Error type URI when the diagnostic stands in for a structural error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Security scheme challenges for 401/403 diagnostics
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl Diagnostic {
    pub fn new(
        code: impl Into<DiagnosticCode>,
        message: impl Into<String>,
        severity: DiagnosticSeverity,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            severity,
            path: Vec::new(),
            source: None,
            tags: Vec::new(),
        }
    }

    pub fn error(code: impl Into<DiagnosticCode>, message: impl Into<String>) -> Self {
        Self::new(code, message, DiagnosticSeverity::Error)
    }

    pub fn warning(code: impl Into<DiagnosticCode>, message: impl Into<String>) -> Self {
        Self::new(code, message, DiagnosticSeverity::Warning)
    }

    pub fn with_path<I, S>(mut self, path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.path = path.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }
}

/// Input and output diagnostics of one pipeline run.
///
/// Both lists are always serialized, even when empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationResults {
    #[serde(default)]
    pub input: Vec<Diagnostic>,
    #[serde(default)]
    pub output: Vec<Diagnostic>,
}

impl ValidationResults {
    pub fn is_empty(&self) -> bool {
        self.input.is_empty() && self.output.is_empty()
    }
}

/// Input validations attached to a request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputValidations {
    #[serde(default)]
    pub input: Vec<Diagnostic>,
}

/// A request together with the diagnostics raised while validating it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrismInput<I> {
    pub data: I,
    pub validations: InputValidations,
}

impl<I> PrismInput<I> {
    pub fn new(data: I, input: Vec<Diagnostic>) -> Self {
        Self {
            data,
            validations: InputValidations { input },
        }
    }

    /// Diagnostics raised against the request.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.validations.input
    }

    pub fn is_valid(&self) -> bool {
        self.validations.input.is_empty()
    }
}

/// The single value returned by a successful pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrismOutput<I, O> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<I>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<O>,
    pub validations: ValidationResults,
}
