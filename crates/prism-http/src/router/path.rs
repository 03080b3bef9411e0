//! Path template matching.
//!
//! Templates bind variables positionally, one variable per template
//! segment or part of a segment (`/files/{name}.{ext}`). A template never
//! matches a prefix of a longer path.

use regex::Regex;

/// Variables bound while matching, in template order.
pub type PathParams = Vec<(String, String)>;

/// Match `path` against `template`, returning the bound variables.
pub fn match_path(path: &str, template: &str) -> Option<PathParams> {
    let path_segments = segments(path);
    let template_segments = segments(template);
    if path_segments.len() != template_segments.len() {
        return None;
    }

    let mut params = PathParams::new();
    for (segment, pattern) in path_segments.iter().zip(&template_segments) {
        if !pattern.contains('{') {
            if segment != pattern {
                return None;
            }
            continue;
        }
        params.extend(match_segment(segment, pattern)?);
    }
    Some(params)
}

fn segments(path: &str) -> Vec<&str> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
    if trimmed.is_empty() {
        return Vec::new();
    }
    trimmed.split('/').collect()
}

fn match_segment(segment: &str, pattern: &str) -> Option<PathParams> {
    let (regex, names) = compile_segment(pattern)?;
    let captures = regex.captures(segment)?;
    let params = names
        .into_iter()
        .enumerate()
        .filter_map(|(index, name)| {
            let raw = captures.get(index + 1)?.as_str();
            let value = urlencoding::decode(raw)
                .map(|decoded| decoded.into_owned())
                .unwrap_or_else(|_| raw.to_string());
            Some((name, value))
        })
        .collect();
    Some(params)
}

/// Turn `{name}.{ext}` into `^([^/]+?)\.([^/]+?)$` plus the variable names.
fn compile_segment(pattern: &str) -> Option<(Regex, Vec<String>)> {
    let mut expression = String::from("^");
    let mut names = Vec::new();
    let mut rest = pattern;

    while let Some(start) = rest.find('{') {
        expression.push_str(&regex::escape(&rest[..start]));
        let end = rest[start..].find('}')? + start;
        names.push(rest[start + 1..end].to_string());
        expression.push_str("([^/]+?)");
        rest = &rest[end + 1..];
    }
    expression.push_str(&regex::escape(rest));
    expression.push('$');

    Regex::new(&expression).ok().map(|regex| (regex, names))
}
