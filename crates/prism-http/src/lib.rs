//! Prism HTTP: contract-driven mocking and validating proxying of HTTP
//! requests on top of the `prism-core` pipeline.
//!
//! # Module Structure
//!
//! - `types` / `headers` - Operation, request and response model
//! - `config` - `HttpConfig` and mock options
//! - `router` - Path, method and server matching
//! - `validator` - Parameter, body, security and response validation
//! - `negotiator` - Response, media type and example selection
//! - `generator` - Static and dynamic payload generation from JSON Schema
//! - `mocker` - Mocked response assembly
//! - `forwarder` - Forwarding to a live server
//! - `instance` - `create_instance`, the wired-up pipeline
//! - `loader` - Reading operations and requests from disk
//!
//! # Example
//!
//! ```no_run
//! use prism_http::{create_instance, load_operations, HttpConfig, HttpRequest};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let operations = load_operations("petstore.yaml")?;
//! let prism = create_instance(HttpConfig::default());
//! let result = prism
//!     .process(HttpRequest::get("/pet/1"), &operations, None)
//!     .await?;
//! println!("{:?}", result.output);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod errors;
pub mod forwarder;
pub mod generator;
pub mod headers;
pub mod instance;
pub mod loader;
pub mod mocker;
pub mod negotiator;
pub mod router;
pub mod types;
pub mod validator;

pub use config::{HttpConfig, HttpMockOptions};
pub use forwarder::HttpForwarder;
pub use headers::{HeaderValue, Headers};
pub use instance::{create_instance, create_instance_with_forwarder, HttpPrism};
pub use loader::{load_operations, load_request};
pub use mocker::HttpMocker;
pub use router::HttpRouter;
pub use types::{
    Example, HttpOperation, HttpRequest, HttpResponse, HttpResponseSpec, MediaTypeContent,
    Parameter, SecurityScheme, Server,
};
pub use validator::HttpValidator;
