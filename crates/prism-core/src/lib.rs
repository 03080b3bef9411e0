//! Protocol-agnostic request pipeline for Prism.
//!
//! A request travels through a fixed sequence of components:
//!
//! ```text
//! Router -> Validator(input) -> Mocker | Forwarder -> Validator(output)
//! ```
//!
//! Each component is a trait parameterised over the resource, input, output
//! and config types, so the same [`Prism`] pipeline drives HTTP mocking and
//! any sibling protocol that supplies its own components.
//!
//! # Module Structure
//!
//! - `diagnostic` - Diagnostics and the input/output envelopes
//! - `error` - `ProblemDetail`, the single structural error type
//! - `components` - Component traits and the `PrismConfig` seam
//! - `pipeline` - The `Prism` orchestrator

mod components;
mod diagnostic;
mod error;
mod pipeline;

pub use components::{Forwarder, Mocker, PrismComponents, PrismConfig, Router, Validator};
pub use diagnostic::{
    Diagnostic, DiagnosticCode, DiagnosticSeverity, InputValidations, PrismInput, PrismOutput,
    ValidationResults,
};
pub use error::{
    ErrorTemplate, ProblemContext, ProblemDetail, ProblemJson, ValidationDetail, ERROR_TYPE_BASE,
};
pub use pipeline::REQUEST_CANCELLED;
pub use pipeline::Prism;

/// Cancellation handle accepted by [`Prism::process_with_cancellation`].
pub use tokio_util::sync::CancellationToken;
