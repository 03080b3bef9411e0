//! A ready-to-use HTTP pipeline.

use crate::config::HttpConfig;
use crate::forwarder::HttpForwarder;
use crate::mocker::HttpMocker;
use crate::router::HttpRouter;
use crate::types::{HttpOperation, HttpRequest, HttpResponse};
use crate::validator::HttpValidator;
use prism_core::{Prism, PrismComponents};
use std::sync::Arc;

pub type HttpPrism = Prism<HttpOperation, HttpRequest, HttpResponse, HttpConfig>;

/// Wire the HTTP components into a pipeline.
pub fn create_instance(default_config: HttpConfig) -> HttpPrism {
    let forwarder = match default_config.upstream_timeout() {
        Some(timeout) => HttpForwarder::with_timeout(timeout),
        None => HttpForwarder::new(),
    };
    create_instance_with_forwarder(default_config, forwarder)
}

/// Same as [`create_instance`] with a caller-configured forwarder.
pub fn create_instance_with_forwarder(
    default_config: HttpConfig,
    forwarder: HttpForwarder,
) -> HttpPrism {
    Prism::new(
        PrismComponents {
            router: Arc::new(HttpRouter::new()),
            validator: Arc::new(HttpValidator::default()),
            mocker: Arc::new(HttpMocker::new()),
            forwarder: Arc::new(forwarder),
        },
        default_config,
    )
}
