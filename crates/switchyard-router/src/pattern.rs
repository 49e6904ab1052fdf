//! Route segment parsing.
//!
//! Every strategy turns a registered path into a list of [`Pattern`]s with
//! [`parse_path`]. Parsing is a pure function of the segment text, so
//! results are cached process-wide and constraint regexes are compiled once
//! no matter how many routers share a route set.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, LazyLock};

use parking_lot::RwLock;
use regex_lite::Regex;

use crate::error::RouterError;
use crate::path::split_route;

/// Regex source used for an unconstrained parameter.
pub const LABEL_REGEX: &str = "[^/]+";

/// A parsed path segment.
#[derive(Debug, Clone)]
pub enum Pattern {
    /// Literal text, matched exactly.
    Static(String),
    /// `:name`, one or more non-slash characters.
    Param { name: String },
    /// `:name{regex}`.
    Constrained { name: String, constraint: Constraint },
    /// `*`: zero or more trailing segments, or exactly one mid-path.
    Wildcard,
}

impl Pattern {
    /// Parameter name bound by this segment, if any.
    pub fn name(&self) -> Option<&str> {
        match self {
            Pattern::Param { name } | Pattern::Constrained { name, .. } => Some(name),
            Pattern::Static(_) | Pattern::Wildcard => None,
        }
    }

    /// Whether the segment matches anything other than its own text.
    pub fn is_dynamic(&self) -> bool {
        !matches!(self, Pattern::Static(_))
    }

    /// The segment as it was written in the route.
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Static(text) => f.write_str(text),
            Pattern::Param { name } => write!(f, ":{name}"),
            Pattern::Constrained { name, constraint } => {
                write!(f, ":{name}{{{}}}", constraint.source())
            }
            Pattern::Wildcard => f.write_str("*"),
        }
    }
}

/// A compiled `{regex}` parameter constraint.
///
/// The constraint is anchored on both ends of the text it binds. It may bind
/// text containing `/` only when the regex itself admits a slash.
#[derive(Debug, Clone)]
pub struct Constraint {
    source: String,
    anchored: Regex,
    groups: usize,
}

impl Constraint {
    fn new(source: &str) -> Result<Self, regex_lite::Error> {
        let anchored = Regex::new(&format!("^(?:{source})$"))?;
        let groups = anchored.captures_len() - 1;
        Ok(Self {
            source: source.to_string(),
            anchored,
            groups,
        })
    }

    /// The regex exactly as written by the route author.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether `text` is fully matched by the constraint.
    pub fn is_match(&self, text: &str) -> bool {
        self.anchored.is_match(text)
    }

    /// Number of capturing groups inside the constraint itself.
    pub fn groups(&self) -> usize {
        self.groups
    }
}

/// Parsed route segments keyed by raw text. Grows with the route set only.
static SEGMENT_CACHE: LazyLock<RwLock<HashMap<String, Arc<Pattern>>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

/// Parse one raw segment of a registered route.
///
/// Results are cached for the life of the process and the cache is never
/// evicted. Only route patterns may be passed here, never request paths.
pub fn parse_segment(raw: &str) -> Result<Arc<Pattern>, RouterError> {
    if let Some(cached) = SEGMENT_CACHE.read().get(raw) {
        return Ok(Arc::clone(cached));
    }

    let pattern = Arc::new(parse_uncached(raw)?);
    SEGMENT_CACHE
        .write()
        .entry(raw.to_string())
        .or_insert_with(|| Arc::clone(&pattern));
    Ok(pattern)
}

fn parse_uncached(raw: &str) -> Result<Pattern, RouterError> {
    if raw == "*" {
        return Ok(Pattern::Wildcard);
    }

    let Some(body) = raw.strip_prefix(':') else {
        return Ok(Pattern::Static(raw.to_string()));
    };

    let (name, constraint) = match body.find('{') {
        Some(open) if body.ends_with('}') && open + 1 < body.len() - 1 => {
            (&body[..open], Some(&body[open + 1..body.len() - 1]))
        }
        Some(_) => return Ok(Pattern::Static(raw.to_string())),
        None => (body, None),
    };

    if name.is_empty() || name.contains('}') {
        return Ok(Pattern::Static(raw.to_string()));
    }

    match constraint {
        None => Ok(Pattern::Param {
            name: name.to_string(),
        }),
        Some(source) => {
            let constraint =
                Constraint::new(source).map_err(|e| RouterError::InvalidConstraint {
                    segment: raw.to_string(),
                    reason: e.to_string(),
                })?;
            Ok(Pattern::Constrained {
                name: name.to_string(),
                constraint,
            })
        }
    }
}

/// Parse every segment of a registered path.
///
/// Rejects a parameter name bound twice in the same path. Nothing is
/// registered anywhere, so callers can parse before mutating their state.
pub fn parse_path(path: &str) -> Result<Vec<Arc<Pattern>>, RouterError> {
    let segments = split_route(path)
        .into_iter()
        .map(parse_segment)
        .collect::<Result<Vec<_>, _>>()?;

    let mut seen = HashSet::new();
    for name in segments.iter().filter_map(|p| p.name()) {
        if !seen.insert(name) {
            return Err(RouterError::DuplicateParam {
                name: name.to_string(),
                path: path.to_string(),
            });
        }
    }

    Ok(segments)
}

/// Whether a path contains any dynamic segment or optional parameter.
pub fn is_dynamic_path(segments: &[Arc<Pattern>]) -> bool {
    segments.iter().any(|p| p.is_dynamic())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> Pattern {
        parse_segment(raw).expect("segment parses").as_ref().clone()
    }

    #[test]
    fn parses_static_segment() {
        assert!(matches!(parse("users"), Pattern::Static(s) if s == "users"));
        assert!(matches!(parse(""), Pattern::Static(s) if s.is_empty()));
    }

    #[test]
    fn parses_named_param() {
        assert!(matches!(parse(":id"), Pattern::Param { name } if name == "id"));
    }

    #[test]
    fn parses_constrained_param() {
        match parse(":id{[0-9]+}") {
            Pattern::Constrained { name, constraint } => {
                assert_eq!(name, "id");
                assert_eq!(constraint.source(), "[0-9]+");
                assert!(constraint.is_match("123"));
                assert!(!constraint.is_match("12a"));
                assert_eq!(constraint.groups(), 0);
            }
            other => panic!("expected Constrained, got {other:?}"),
        }
    }

    #[test]
    fn constraint_is_anchored_on_both_ends() {
        match parse(":v{a|b}") {
            Pattern::Constrained { constraint, .. } => {
                assert!(constraint.is_match("a"));
                assert!(!constraint.is_match("ab"));
                assert!(!constraint.is_match("xa"));
            }
            other => panic!("expected Constrained, got {other:?}"),
        }
    }

    #[test]
    fn counts_groups_inside_constraint() {
        match parse(":file{([a-z]+)\\.(js|css)}") {
            Pattern::Constrained { constraint, .. } => assert_eq!(constraint.groups(), 2),
            other => panic!("expected Constrained, got {other:?}"),
        }
    }

    #[test]
    fn parses_wildcard() {
        assert!(matches!(parse("*"), Pattern::Wildcard));
        assert!(matches!(parse("*.js"), Pattern::Static(_)));
    }

    #[test]
    fn malformed_param_is_literal() {
        assert!(matches!(parse(":"), Pattern::Static(s) if s == ":"));
        assert!(matches!(parse(":{x}"), Pattern::Static(_)));
    }

    #[test]
    fn invalid_constraint_is_a_definition_error() {
        let err = parse_segment(":id{[0-9}").expect_err("constraint must not compile");
        assert!(matches!(err, RouterError::InvalidConstraint { .. }));
        assert!(!err.is_unsupported());
    }

    #[test]
    fn label_round_trips_the_raw_segment() {
        for raw in ["users", ":id", ":id{[0-9]+}", "*"] {
            assert_eq!(parse(raw).label(), raw);
        }
    }

    #[test]
    fn cache_returns_shared_pattern() {
        let a = parse_segment(":cached{[a-z]+}").expect("parses");
        let b = parse_segment(":cached{[a-z]+}").expect("parses");
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn duplicate_param_name_rejected() {
        let err = parse_path("/:id/:id").expect_err("duplicate name");
        assert_eq!(
            err,
            RouterError::DuplicateParam {
                name: "id".into(),
                path: "/:id/:id".into()
            }
        );
        assert!(parse_path("/:id/x/:id{[0-9]+}").is_err());
        assert!(parse_path("/:id/:name").is_ok());
    }

    #[test]
    fn dynamic_path_detection() {
        assert!(!is_dynamic_path(&parse_path("/a/b").expect("parses")));
        assert!(is_dynamic_path(&parse_path("/a/:b").expect("parses")));
        assert!(is_dynamic_path(&parse_path("/a/*").expect("parses")));
    }
}
