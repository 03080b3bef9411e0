//! Component seams of the pipeline.
//!
//! Each stage is a trait generic over the resource (`R`), input (`I`),
//! output (`O`) and config (`C`) types of one protocol instantiation.

use crate::diagnostic::{Diagnostic, PrismInput};
use crate::error::ProblemDetail;
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Switches the pipeline reads from a protocol config.
pub trait PrismConfig: Clone + Send + Sync {
    /// `true` when responses are mocked, `false` when requests are forwarded.
    fn is_mocking(&self) -> bool;
    fn validate_request(&self) -> bool;
    fn validate_response(&self) -> bool;
}

/// Selects the single resource a request targets.
pub trait Router<R, I, C>: Send + Sync {
    fn route<'a>(&self, resources: &'a [R], input: &I, config: &C)
        -> Result<&'a R, ProblemDetail>;
}

/// Produces diagnostics for requests and responses.
pub trait Validator<R, I, O, C>: Send + Sync {
    fn validate_input(&self, resource: &R, input: &I, config: &C) -> Vec<Diagnostic>;
    fn validate_output(&self, resource: &R, output: &O, config: &C) -> Vec<Diagnostic>;
}

/// Builds a mocked output for a validated input.
pub trait Mocker<R, I, O, C>: Send + Sync {
    fn mock(&self, resource: &R, input: &PrismInput<I>, config: &C) -> Result<O, ProblemDetail>;
}

/// Sends the input to a live server.
///
/// `resource` is `None` when routing failed in proxy mode.
#[async_trait]
pub trait Forwarder<R, I, O, C>: Send + Sync
where
    R: Sync,
    I: Sync,
    O: Send,
    C: Sync,
{
    async fn forward(
        &self,
        resource: Option<&R>,
        input: &PrismInput<I>,
        config: &C,
        cancel: &CancellationToken,
    ) -> Result<O, ProblemDetail>;
}

/// The set of components a [`crate::Prism`] instance runs.
pub struct PrismComponents<R, I, O, C> {
    pub router: Arc<dyn Router<R, I, C>>,
    pub validator: Arc<dyn Validator<R, I, O, C>>,
    pub mocker: Arc<dyn Mocker<R, I, O, C>>,
    pub forwarder: Arc<dyn Forwarder<R, I, O, C>>,
}

impl<R, I, O, C> Clone for PrismComponents<R, I, O, C> {
    fn clone(&self) -> Self {
        Self {
            router: Arc::clone(&self.router),
            validator: Arc::clone(&self.validator),
            mocker: Arc::clone(&self.mocker),
            forwarder: Arc::clone(&self.forwarder),
        }
    }
}
