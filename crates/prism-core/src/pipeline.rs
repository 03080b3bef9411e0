//! The `Prism` orchestrator.
//!
//! One run is a linear chain of fallible steps:
//!
//! ```text
//! Start -> Routed -> InputValidated -> Mocked | Forwarded -> [OutputValidated] -> Done
//! ```
//!
//! The instance holds no per-request state, so concurrent runs on separate
//! requests share it freely.

use crate::components::{PrismComponents, PrismConfig};
use crate::diagnostic::{Diagnostic, PrismInput, PrismOutput, ValidationResults};
use crate::error::{ErrorTemplate, ProblemDetail};
use futures::future::{self, Either};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info_span, warn, Instrument};

pub const REQUEST_CANCELLED: ErrorTemplate =
    ErrorTemplate::new("REQUEST_CANCELLED", "The request was cancelled", 499);

/// A pipeline instance: components plus the config used when a call
/// does not bring its own.
pub struct Prism<R, I, O, C> {
    components: PrismComponents<R, I, O, C>,
    default_config: C,
}

impl<R, I, O, C> Clone for Prism<R, I, O, C>
where
    C: Clone,
{
    fn clone(&self) -> Self {
        Self {
            components: self.components.clone(),
            default_config: self.default_config.clone(),
        }
    }
}

impl<R, I, O, C> Prism<R, I, O, C>
where
    R: Send + Sync,
    I: Send + Sync,
    O: Send,
    C: PrismConfig,
{
    pub fn new(components: PrismComponents<R, I, O, C>, default_config: C) -> Self {
        Self {
            components,
            default_config,
        }
    }

    pub fn default_config(&self) -> &C {
        &self.default_config
    }

    /// Run one request through the pipeline.
    ///
    /// Rejects with a [`ProblemDetail`] on structural failure; validation
    /// problems are reported in the returned envelope instead.
    pub async fn process(
        &self,
        input: I,
        resources: &[R],
        config: Option<C>,
    ) -> Result<PrismOutput<I, O>, ProblemDetail> {
        self.process_with_cancellation(input, resources, config, &CancellationToken::new())
            .await
    }

    /// Same as [`Prism::process`], aborting when `cancel` fires.
    ///
    /// Cancellation is checked before the mock/forward dispatch and raced
    /// against the outbound call while forwarding.
    pub async fn process_with_cancellation(
        &self,
        input: I,
        resources: &[R],
        config: Option<C>,
        cancel: &CancellationToken,
    ) -> Result<PrismOutput<I, O>, ProblemDetail> {
        let config = config.unwrap_or_else(|| self.default_config.clone());
        let span = info_span!(
            "prism.process",
            mocking = config.is_mocking(),
            resources = resources.len()
        );
        self.run(input, resources, &config, cancel)
            .instrument(span)
            .await
    }

    async fn run(
        &self,
        input: I,
        resources: &[R],
        config: &C,
        cancel: &CancellationToken,
    ) -> Result<PrismOutput<I, O>, ProblemDetail> {
        let mut input_validations = Vec::new();

        let resource = match self.components.router.route(resources, &input, config) {
            Ok(resource) => Some(resource),
            Err(error) => {
                warn!(kind = error.kind(), "Route not resolved: {}", error.title);
                if config.is_mocking() {
                    return Err(error);
                }
                // Forwarding can still reach the upstream without an operation
                input_validations.push(
                    Diagnostic::warning(error.status, error.title.clone())
                        .with_source(error.name.clone()),
                );
                None
            }
        };

        if let Some(resource) = resource {
            if config.validate_request() {
                input_validations.extend(
                    self.components
                        .validator
                        .validate_input(resource, &input, config),
                );
            }
        }

        let prism_input = PrismInput::new(input, input_validations);
        debug!(
            diagnostics = prism_input.diagnostics().len(),
            "Input validation finished"
        );

        if cancel.is_cancelled() {
            return Err(ProblemDetail::from_template(&REQUEST_CANCELLED, ""));
        }

        let output = match resource {
            Some(resource) if config.is_mocking() => {
                self.components.mocker.mock(resource, &prism_input, config)?
            }
            resource => {
                let forward =
                    self.components
                        .forwarder
                        .forward(resource, &prism_input, config, cancel);
                let cancelled = cancel.cancelled();
                futures::pin_mut!(cancelled);
                match future::select(forward, cancelled).await {
                    Either::Left((result, _)) => result?,
                    Either::Right(_) => {
                        warn!("Request cancelled while forwarding");
                        return Err(ProblemDetail::from_template(&REQUEST_CANCELLED, ""));
                    }
                }
            }
        };

        let mut output_validations = Vec::new();
        if !config.is_mocking() && config.validate_response() {
            if let Some(resource) = resource {
                output_validations = self
                    .components
                    .validator
                    .validate_output(resource, &output, config);
            }
        }

        let PrismInput { data, validations } = prism_input;
        Ok(PrismOutput {
            input: Some(data),
            output: Some(output),
            validations: ValidationResults {
                input: validations.input,
                output: output_validations,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Forwarder, Mocker, Router, Validator};
    use crate::diagnostic::DiagnosticSeverity;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const NO_MATCH: ErrorTemplate = ErrorTemplate::new("NO_MATCH", "Nothing matched", 404);

    #[derive(Clone)]
    struct TestConfig {
        mock: bool,
        validate_request: bool,
        validate_response: bool,
    }

    impl TestConfig {
        fn mocking() -> Self {
            Self {
                mock: true,
                validate_request: true,
                validate_response: true,
            }
        }

        fn forwarding() -> Self {
            Self {
                mock: false,
                ..Self::mocking()
            }
        }
    }

    impl PrismConfig for TestConfig {
        fn is_mocking(&self) -> bool {
            self.mock
        }
        fn validate_request(&self) -> bool {
            self.validate_request
        }
        fn validate_response(&self) -> bool {
            self.validate_response
        }
    }

    struct ExactRouter;

    impl Router<String, String, TestConfig> for ExactRouter {
        fn route<'a>(
            &self,
            resources: &'a [String],
            input: &String,
            _config: &TestConfig,
        ) -> Result<&'a String, ProblemDetail> {
            resources
                .iter()
                .find(|r| *r == input)
                .ok_or_else(|| ProblemDetail::from_template(&NO_MATCH, ""))
        }
    }

    /// Flags inputs starting with "bad".
    struct PrefixValidator;

    impl Validator<String, String, String, TestConfig> for PrefixValidator {
        fn validate_input(&self, _: &String, input: &String, _: &TestConfig) -> Vec<Diagnostic> {
            if input.starts_with("bad") {
                vec![Diagnostic::error("prefix", "input is bad")]
            } else {
                vec![]
            }
        }

        fn validate_output(&self, _: &String, output: &String, _: &TestConfig) -> Vec<Diagnostic> {
            vec![Diagnostic::error("output", format!("saw {output}"))]
        }
    }

    struct EchoMocker;

    impl Mocker<String, String, String, TestConfig> for EchoMocker {
        fn mock(
            &self,
            resource: &String,
            input: &PrismInput<String>,
            _: &TestConfig,
        ) -> Result<String, ProblemDetail> {
            Ok(format!(
                "mocked {resource} with {} diagnostics",
                input.diagnostics().len()
            ))
        }
    }

    #[derive(Default)]
    struct CountingForwarder {
        calls: AtomicUsize,
        hang: bool,
    }

    #[async_trait]
    impl Forwarder<String, String, String, TestConfig> for CountingForwarder {
        async fn forward(
            &self,
            resource: Option<&String>,
            input: &PrismInput<String>,
            _: &TestConfig,
            _: &CancellationToken,
        ) -> Result<String, ProblemDetail> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.hang {
                future::pending::<()>().await;
            }
            Ok(format!(
                "forwarded {} for {:?}",
                input.data,
                resource.map(String::as_str)
            ))
        }
    }

    fn prism(forwarder: Arc<CountingForwarder>) -> Prism<String, String, String, TestConfig> {
        Prism::new(
            PrismComponents {
                router: Arc::new(ExactRouter),
                validator: Arc::new(PrefixValidator),
                mocker: Arc::new(EchoMocker),
                forwarder,
            },
            TestConfig::mocking(),
        )
    }

    fn resources() -> Vec<String> {
        vec!["pets".to_string(), "bad-pets".to_string()]
    }

    #[tokio::test]
    async fn test_mocking_returns_output() {
        let prism = prism(Arc::default());
        let result = prism
            .process("pets".to_string(), &resources(), None)
            .await
            .unwrap();

        assert_eq!(result.input.as_deref(), Some("pets"));
        assert_eq!(result.output.as_deref(), Some("mocked pets with 0 diagnostics"));
        assert!(result.validations.is_empty());
    }

    #[tokio::test]
    async fn test_routing_failure_is_terminal_while_mocking() {
        let prism = prism(Arc::default());
        let error = prism
            .process("unknown".to_string(), &resources(), None)
            .await
            .unwrap_err();
        assert!(error.is(&NO_MATCH));
    }

    #[tokio::test]
    async fn test_input_diagnostics_reach_the_mocker() {
        let prism = prism(Arc::default());
        let result = prism
            .process("bad-pets".to_string(), &resources(), None)
            .await
            .unwrap();

        assert_eq!(result.output.as_deref(), Some("mocked bad-pets with 1 diagnostics"));
        assert_eq!(result.validations.input.len(), 1);
        // Output validation never runs while mocking
        assert!(result.validations.output.is_empty());
    }

    #[tokio::test]
    async fn test_request_validation_can_be_disabled() {
        let prism = prism(Arc::default());
        let config = TestConfig {
            validate_request: false,
            ..TestConfig::mocking()
        };
        let result = prism
            .process("bad-pets".to_string(), &resources(), Some(config))
            .await
            .unwrap();
        assert!(result.validations.input.is_empty());
    }

    #[tokio::test]
    async fn test_routing_failure_downgrades_when_forwarding() {
        let forwarder = Arc::new(CountingForwarder::default());
        let prism = prism(Arc::clone(&forwarder));
        let result = prism
            .process(
                "unknown".to_string(),
                &resources(),
                Some(TestConfig::forwarding()),
            )
            .await
            .unwrap();

        assert_eq!(forwarder.calls.load(Ordering::SeqCst), 1);
        assert_eq!(result.output.as_deref(), Some("forwarded unknown for None"));
        assert_eq!(result.validations.input.len(), 1);

        let warning = &result.validations.input[0];
        assert_eq!(warning.severity, DiagnosticSeverity::Warning);
        assert_eq!(warning.code.status(), Some(404));
        assert_eq!(warning.message, "Nothing matched");
        assert_eq!(warning.source.as_deref(), Some(NO_MATCH.type_uri().as_str()));
        // No resource, nothing to validate the output against
        assert!(result.validations.output.is_empty());
    }

    #[tokio::test]
    async fn test_output_validation_when_forwarding() {
        let prism = prism(Arc::default());
        let result = prism
            .process("pets".to_string(), &resources(), Some(TestConfig::forwarding()))
            .await
            .unwrap();
        assert_eq!(result.validations.output.len(), 1);
        assert_eq!(result.validations.output[0].message, "saw forwarded pets for Some(\"pets\")");

        let config = TestConfig {
            validate_response: false,
            ..TestConfig::forwarding()
        };
        let result = prism
            .process("pets".to_string(), &resources(), Some(config))
            .await
            .unwrap();
        assert!(result.validations.output.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_before_dispatch() {
        let forwarder = Arc::new(CountingForwarder::default());
        let prism = prism(Arc::clone(&forwarder));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let error = prism
            .process_with_cancellation(
                "pets".to_string(),
                &resources(),
                Some(TestConfig::forwarding()),
                &cancel,
            )
            .await
            .unwrap_err();
        assert!(error.is(&REQUEST_CANCELLED));
        assert_eq!(forwarder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cancelled_while_forwarding() {
        let forwarder = Arc::new(CountingForwarder {
            hang: true,
            ..Default::default()
        });
        let prism = prism(Arc::clone(&forwarder));
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let error = prism
            .process_with_cancellation(
                "pets".to_string(),
                &resources(),
                Some(TestConfig::forwarding()),
                &cancel,
            )
            .await
            .unwrap_err();
        assert!(error.is(&REQUEST_CANCELLED));
        assert_eq!(forwarder.calls.load(Ordering::SeqCst), 1);
    }
}
