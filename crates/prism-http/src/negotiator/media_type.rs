//! Media type helpers: essences, `Accept` parsing and range matching.

/// How precisely a media range matched a media type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Specificity {
    /// `*/*`
    Any,
    /// `type/*`
    Type,
    /// `type/subtype`
    Exact,
}

/// `Application/JSON; charset=utf-8` -> `application/json`.
pub fn essence(media_type: &str) -> String {
    media_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

pub fn is_json(media_type: &str) -> bool {
    let essence = essence(media_type);
    essence == "application/json" || essence.ends_with("+json")
}

/// Media ranges of an `Accept` header, in header order, without parameters.
/// Ranges with `q=0` are dropped; a blank header accepts anything.
pub fn parse_accept(header: &str) -> Vec<String> {
    if header.trim().is_empty() {
        return vec!["*/*".to_string()];
    }
    header
        .split(',')
        .filter(|token| !token.trim().is_empty())
        .filter(|token| !is_refused(token))
        .map(essence)
        .collect()
}

fn is_refused(token: &str) -> bool {
    token.split(';').skip(1).any(|param| {
        let Some((name, value)) = param.split_once('=') else {
            return false;
        };
        name.trim().eq_ignore_ascii_case("q")
            && value.trim().parse::<f32>().is_ok_and(|q| q == 0.0)
    })
}

/// How `range` (possibly a wildcard) matches `media_type`, if at all.
pub fn range_matches(range: &str, media_type: &str) -> Option<Specificity> {
    let range = essence(range);
    let media_type = essence(media_type);

    if range == "*/*" || range == "*" {
        return Some(Specificity::Any);
    }
    if range == media_type {
        return Some(Specificity::Exact);
    }

    let (range_type, range_subtype) = range.split_once('/')?;
    let (main_type, _) = media_type.split_once('/')?;
    (range_subtype == "*" && range_type == main_type).then_some(Specificity::Type)
}

/// Pick the first of `declared` satisfying the most specific of `ranges`.
pub fn best_match<'a>(declared: &[&'a str], ranges: &[String]) -> Option<&'a str> {
    let mut best: Option<(Specificity, &'a str)> = None;
    for &media_type in declared {
        let specificity = ranges
            .iter()
            .filter_map(|range| range_matches(range, media_type))
            .max();
        if let Some(specificity) = specificity {
            if best.map_or(true, |(current, _)| specificity > current) {
                best = Some((specificity, media_type));
            }
        }
    }
    best.map(|(_, media_type)| media_type)
}
