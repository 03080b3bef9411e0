//! Outbound HTTP client used for forwarding.

use std::time::Duration;
use tracing::{info, warn};

/// Default timeout for a forwarded request when the config sets none.
pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

/// Create the pooled client shared by every forwarded request.
///
/// Per-request timeouts from the config are applied on the request builder,
/// so `timeout` here is only the fallback.
pub fn create_http_client(timeout: Duration) -> reqwest::Client {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .build();

    match client {
        Ok(client) => {
            info!(timeout_ms = timeout.as_millis() as u64, "HTTP client initialized");
            client
        }
        Err(error) => {
            warn!("Falling back to the default HTTP client: {}", error);
            reqwest::Client::new()
        }
    }
}
