//! Security scheme checks.
//!
//! An operation's `security` list is a disjunction of scheme groups; a
//! request passes when every scheme of at least one group is satisfied.
//! Failures are reported as 401/403 diagnostics tagged with the challenges
//! the client should answer (`WWW-Authenticate` values).

use super::params::parse_cookies;
use crate::types::{ApiKeyLocation, HttpRequest, SecurityScheme};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use prism_core::Diagnostic;

/// Why a single scheme was not satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Failure {
    /// No credentials were supplied: 401
    Missing,
    /// Credentials were supplied but are malformed: 403
    Invalid,
}

/// Check `request` against the operation's security requirements.
pub fn validate_security(
    requirements: &[Vec<SecurityScheme>],
    request: &HttpRequest,
) -> Vec<Diagnostic> {
    if requirements.is_empty() || requirements.iter().any(|group| group.is_empty()) {
        return Vec::new();
    }

    let mut failed_groups = Vec::new();
    for group in requirements {
        let failures: Vec<(&SecurityScheme, Failure)> = group
            .iter()
            .filter_map(|scheme| check_scheme(scheme, request).err().map(|f| (scheme, f)))
            .collect();
        if failures.is_empty() {
            return Vec::new();
        }
        failed_groups.push(failures);
    }

    let failures: Vec<(&SecurityScheme, Failure)> = failed_groups.into_iter().flatten().collect();
    let forbidden = failures
        .iter()
        .any(|(_, failure)| *failure == Failure::Invalid);

    let mut tags: Vec<String> = Vec::new();
    for (scheme, _) in &failures {
        let challenge = challenge(scheme);
        if !tags.contains(&challenge) {
            tags.push(challenge);
        }
    }

    let diagnostic = if forbidden {
        Diagnostic::error(403u16, "Invalid security scheme credentials")
    } else {
        Diagnostic::error(401u16, "Invalid security scheme used")
    };
    vec![diagnostic.with_tags(tags)]
}

fn check_scheme(scheme: &SecurityScheme, request: &HttpRequest) -> Result<(), Failure> {
    match scheme {
        SecurityScheme::ApiKey { name, location, .. } => {
            let present = match location {
                ApiKeyLocation::Header => request.header(name).is_some(),
                ApiKeyLocation::Query => request
                    .url
                    .query
                    .as_ref()
                    .is_some_and(|query| query.contains_key(name)),
                ApiKeyLocation::Cookie => request.header("cookie").is_some_and(|cookies| {
                    parse_cookies(cookies)
                        .iter()
                        .any(|(key, _)| *key == name.as_str())
                }),
            };
            present.then_some(()).ok_or(Failure::Missing)
        }
        SecurityScheme::Http { scheme, .. } => {
            let authorization = request.header("authorization").ok_or(Failure::Missing)?;
            check_authorization(scheme, authorization)
        }
        SecurityScheme::OAuth2 { .. } | SecurityScheme::OpenIdConnect { .. } => {
            let authorization = request.header("authorization").ok_or(Failure::Missing)?;
            check_authorization("bearer", authorization)
        }
    }
}

fn check_authorization(scheme: &str, authorization: &str) -> Result<(), Failure> {
    let (given, credentials) = authorization
        .split_once(' ')
        .unwrap_or((authorization, ""));
    if !given.eq_ignore_ascii_case(scheme) {
        return Err(Failure::Missing);
    }

    let credentials = credentials.trim();
    if scheme.eq_ignore_ascii_case("basic") {
        let decoded = STANDARD.decode(credentials).map_err(|_| Failure::Invalid)?;
        let decoded = String::from_utf8(decoded).map_err(|_| Failure::Invalid)?;
        return match decoded.split_once(':') {
            Some((user, _)) if !user.is_empty() => Ok(()),
            _ => Err(Failure::Invalid),
        };
    }

    if credentials.is_empty() {
        return Err(Failure::Invalid);
    }
    Ok(())
}

/// `WWW-Authenticate` challenge advertised for a scheme.
fn challenge(scheme: &SecurityScheme) -> String {
    match scheme {
        SecurityScheme::Http { scheme, .. } if scheme.eq_ignore_ascii_case("basic") => {
            "Basic realm=\"*\"".to_string()
        }
        SecurityScheme::Http { scheme, .. } => capitalize(scheme),
        SecurityScheme::ApiKey { key, .. } => key.clone(),
        SecurityScheme::OAuth2 { .. } => "OAuth2".to_string(),
        SecurityScheme::OpenIdConnect { .. } => "OpenID".to_string(),
    }
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
