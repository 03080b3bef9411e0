//! Operation routing.
//!
//! Selects the one operation a request targets:
//!
//! 1. keep operations whose method (case-insensitive) and path template match
//!    the request; none left is `NO_PATH_MATCHED_ERROR`
//! 2. without a request base URL the first candidate wins
//! 3. with a base URL, the first candidate declaring a matching server wins;
//!    candidates that declare no servers at all give `NO_BASE_URL_ERROR`,
//!    otherwise a miss is `NO_SERVER_MATCHED_ERROR`

pub mod path;
pub mod server;

pub use path::{match_path, PathParams};
pub use server::{resolve_server_url, server_matches, BaseUrl};

use crate::config::HttpConfig;
use crate::errors::{NO_BASE_URL_ERROR, NO_PATH_MATCHED_ERROR, NO_SERVER_MATCHED_ERROR};
use crate::types::{HttpOperation, HttpRequest};
use prism_core::{ProblemDetail, Router};
use tracing::debug;

/// Router over [`HttpOperation`]s. Stateless.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpRouter;

impl HttpRouter {
    pub fn new() -> Self {
        Self
    }
}

impl Router<HttpOperation, HttpRequest, HttpConfig> for HttpRouter {
    fn route<'a>(
        &self,
        resources: &'a [HttpOperation],
        input: &HttpRequest,
        _config: &HttpConfig,
    ) -> Result<&'a HttpOperation, ProblemDetail> {
        route_request(resources, input)
    }
}

/// Route `request` to one of `operations`.
pub fn route_request<'a>(
    operations: &'a [HttpOperation],
    request: &HttpRequest,
) -> Result<&'a HttpOperation, ProblemDetail> {
    let request_path = request.url.path.as_str();
    let candidates: Vec<&HttpOperation> = operations
        .iter()
        .filter(|operation| operation.method.eq_ignore_ascii_case(&request.method))
        .filter(|operation| match_path(request_path, &operation.path).is_some())
        .collect();

    let Some(&first) = candidates.first() else {
        return Err(ProblemDetail::from_template(
            &NO_PATH_MATCHED_ERROR,
            format!(
                "The route {} {} hasn't been found in the specification file",
                request.method.to_uppercase(),
                request_path
            ),
        ));
    };

    let Some(base_url) = request.url.base_url.as_deref() else {
        debug!(operation = %first.label(), "Routed without server validation");
        return Ok(first);
    };

    if candidates.iter().all(|operation| operation.servers.is_empty()) {
        return Err(ProblemDetail::from_template(
            &NO_BASE_URL_ERROR,
            format!(
                "The server url {base_url} cannot be checked: the operation declares no servers"
            ),
        ));
    }

    let no_server = || {
        ProblemDetail::from_template(
            &NO_SERVER_MATCHED_ERROR,
            format!("The server url {base_url} hasn't been matched with any of the provided servers"),
        )
    };

    let parsed = BaseUrl::parse(base_url).map_err(|_| no_server())?;
    candidates
        .into_iter()
        .find(|operation| {
            operation
                .servers
                .iter()
                .any(|server| server_matches(server, &parsed))
        })
        .inspect(|operation| debug!(operation = %operation.label(), base_url, "Routed"))
        .ok_or_else(no_server)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Server;

    fn operation(method: &str, path: &str, servers: &[&str]) -> HttpOperation {
        HttpOperation {
            id: Some(format!("{method} {path}")),
            method: method.to_string(),
            path: path.to_string(),
            servers: servers.iter().map(|url| Server::new(*url)).collect(),
            ..Default::default()
        }
    }

    fn route<'a>(
        operations: &'a [HttpOperation],
        request: &HttpRequest,
    ) -> Result<&'a HttpOperation, ProblemDetail> {
        HttpRouter::new().route(operations, request, &HttpConfig::default())
    }

    #[test]
    fn test_no_path_matched() {
        let operations = vec![operation("get", "/pet", &[])];
        let error = route(&operations, &HttpRequest::get("/store")).unwrap_err();
        assert!(error.is(&NO_PATH_MATCHED_ERROR));
        assert_eq!(error.status, 404);
    }

    #[test]
    fn test_method_must_match() {
        let operations = vec![operation("post", "/pet", &[])];
        let error = route(&operations, &HttpRequest::get("/pet")).unwrap_err();
        assert!(error.is(&NO_PATH_MATCHED_ERROR));
    }

    #[test]
    fn test_method_is_case_insensitive() {
        let operations = vec![operation("GET", "/pet/{petId}", &[])];
        let routed = route(&operations, &HttpRequest::new("get", "/pet/1")).unwrap();
        assert_eq!(routed.path, "/pet/{petId}");
    }

    #[test]
    fn test_first_declared_operation_wins() {
        let operations = vec![
            operation("get", "/pet/{petId}", &[]),
            operation("get", "/pet/findByStatus", &[]),
        ];
        let routed = route(&operations, &HttpRequest::get("/pet/findByStatus")).unwrap();
        assert_eq!(routed.path, "/pet/{petId}");
    }

    #[test]
    fn test_no_base_url_skips_server_check() {
        let operations = vec![operation("get", "/pet", &["http://example.com/api"])];
        assert!(route(&operations, &HttpRequest::get("/pet")).is_ok());
    }

    #[test]
    fn test_server_matched() {
        let operations = vec![
            operation("get", "/pet", &["http://acme.com"]),
            operation("get", "/pet", &["http://example.com/api"]),
        ];
        let request = HttpRequest::get("/pet").with_base_url("https://example.com/api");
        let routed = route(&operations, &request).unwrap();
        assert_eq!(routed.servers[0].url, "http://example.com/api");
    }

    #[test]
    fn test_no_server_matched() {
        let operations = vec![operation("get", "/pet", &["http://example.com/api"])];
        let request = HttpRequest::get("/pet").with_base_url("http://example.com/v2");
        let error = route(&operations, &request).unwrap_err();
        assert!(error.is(&NO_SERVER_MATCHED_ERROR));
    }

    #[test]
    fn test_unparsable_base_url() {
        let operations = vec![operation("get", "/pet", &["http://example.com/api"])];
        let request = HttpRequest::get("/pet").with_base_url("example");
        let error = route(&operations, &request).unwrap_err();
        assert!(error.is(&NO_SERVER_MATCHED_ERROR));
    }

    #[test]
    fn test_no_servers_declared() {
        let operations = vec![operation("get", "/pet", &[])];
        let request = HttpRequest::get("/pet").with_base_url("http://example.com");
        let error = route(&operations, &request).unwrap_err();
        assert!(error.is(&NO_BASE_URL_ERROR));
    }
}
