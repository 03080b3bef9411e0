//! Server (base URL) matching.
//!
//! A request base URL matches a declared server when their host and base
//! path agree; the scheme is ignored. Server URLs may contain `{variable}`
//! placeholders, which match the variable's enum values or, without an
//! enum, any text.

use crate::types::Server;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use regex::Regex;
use std::collections::HashMap;
use url::Url;

static SCHEME_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[A-Za-z][A-Za-z0-9+.\-]*|\{[^}]+\})://")
        .expect("scheme prefix pattern is a valid regex")
});

/// Compiled server patterns, keyed by their expression.
static SERVER_PATTERNS: Lazy<RwLock<HashMap<String, Regex>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Host and base path of a request base URL, e.g. `example.com:8080/api`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseUrl {
    pub scheme: String,
    pub authority: String,
    pub base_path: String,
}

impl BaseUrl {
    pub fn parse(base_url: &str) -> Result<Self, url::ParseError> {
        let url = Url::parse(base_url)?;
        let host = url.host_str().unwrap_or_default();
        let authority = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        Ok(Self {
            scheme: url.scheme().to_string(),
            authority,
            base_path: url.path().trim_end_matches('/').to_string(),
        })
    }

    fn host_and_path(&self) -> String {
        format!("{}{}", self.authority, self.base_path)
    }
}

/// Whether `server` declares the host and base path of `base_url`.
pub fn server_matches(server: &Server, base_url: &BaseUrl) -> bool {
    match server_pattern(server).and_then(|expression| compiled(&expression)) {
        Some(regex) => regex.is_match(&base_url.host_and_path()),
        None => false,
    }
}

/// The concrete URL of a server with every variable set to its default.
pub fn resolve_server_url(server: &Server) -> String {
    let mut resolved = server.url.clone();
    for (name, variable) in &server.variables {
        resolved = resolved.replace(&format!("{{{name}}}"), &variable.default);
    }
    resolved.trim_end_matches('/').to_string()
}

fn compiled(expression: &str) -> Option<Regex> {
    {
        let cache = SERVER_PATTERNS.read();
        if let Some(regex) = cache.get(expression) {
            return Some(regex.clone());
        }
    }

    let regex = Regex::new(expression).ok()?;
    SERVER_PATTERNS
        .write()
        .insert(expression.to_string(), regex.clone());
    Some(regex)
}

/// Anchored regex source matching the host and base path a server declares.
fn server_pattern(server: &Server) -> Option<String> {
    let template = SCHEME_PREFIX.replace(&server.url, "");
    let template = template.trim_end_matches('/');

    let mut expression = String::from("^");
    if template.starts_with('/') || template.is_empty() {
        // Relative server URL: any host
        expression.push_str("[^/]*");
    }

    let mut rest = template;
    while let Some(start) = rest.find('{') {
        expression.push_str(&regex::escape(&rest[..start]));
        let end = rest[start..].find('}')? + start;
        let name = &rest[start + 1..end];
        match server.variables.get(name) {
            Some(variable) if !variable.enum_values.is_empty() => {
                let alternatives: Vec<String> = variable
                    .enum_values
                    .iter()
                    .map(|value| regex::escape(value.trim_end_matches('/')))
                    .collect();
                expression.push_str(&format!("(?:{})", alternatives.join("|")));
            }
            _ => expression.push_str(".*?"),
        }
        rest = &rest[end + 1..];
    }
    expression.push_str(&regex::escape(rest));
    expression.push('$');
    Some(expression)
}
