//! Ordered scan over one anchored regex per route.

use std::sync::Arc;

use regex_lite::Regex;

use crate::error::RouterError;
use crate::path::expand_optional;
use crate::pattern::{parse_path, Pattern, LABEL_REGEX};
use crate::{Match, Params, RouteMatcher, METHOD_ALL};

/// Linear router. Lookup cost grows with the route count, but any route
/// set whose regexes compile is accepted.
#[derive(Debug)]
pub struct LinearMatcher<H> {
    routes: Vec<LinearRoute<H>>,
}

#[derive(Debug)]
struct LinearRoute<H> {
    method: String,
    handler: H,
    variants: Vec<CompiledPath>,
}

#[derive(Debug)]
struct CompiledPath {
    regex: Regex,
    /// `(name, capture group)` in path order.
    params: Vec<(String, usize)>,
}

impl CompiledPath {
    fn new(path: &str, segments: &[Arc<Pattern>]) -> Result<Self, RouterError> {
        let last = segments.len().saturating_sub(1);
        let mut source = String::from("^");
        let mut params = Vec::new();
        let mut group = 1;

        for (i, pattern) in segments.iter().enumerate() {
            let sep = if i > 0 { "/" } else { "" };
            match pattern.as_ref() {
                Pattern::Static(text) => {
                    source.push_str(sep);
                    source.push_str(&regex_lite::escape(text));
                }
                Pattern::Param { name } => {
                    source.push_str(&format!("{sep}({LABEL_REGEX})"));
                    params.push((name.clone(), group));
                    group += 1;
                }
                Pattern::Constrained { name, constraint } => {
                    source.push_str(&format!("{sep}({})", constraint.source()));
                    params.push((name.clone(), group));
                    group += 1 + constraint.groups();
                }
                Pattern::Wildcard if i < last => {
                    source.push_str(&format!("{sep}{LABEL_REGEX}"));
                }
                Pattern::Wildcard if i == 0 => source.push_str(".*"),
                Pattern::Wildcard => source.push_str("(?:/.*)?"),
            }
        }
        source.push('$');

        let regex = Regex::new(&source).map_err(|e| {
            tracing::debug!(path, error = %e, "route regex rejected");
            RouterError::UnsupportedPath(path.to_string())
        })?;
        Ok(Self { regex, params })
    }
}

impl<H> Default for LinearMatcher<H> {
    fn default() -> Self {
        Self { routes: Vec::new() }
    }
}

impl<H> LinearMatcher<H> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<H: Clone + Send + Sync> RouteMatcher<H> for LinearMatcher<H> {
    fn name(&self) -> &'static str {
        "linear"
    }

    fn add(&mut self, method: &str, path: &str, handler: H) -> Result<(), RouterError> {
        let expanded = expand_optional(path).unwrap_or_else(|| vec![path.to_string()]);
        let mut variants = Vec::with_capacity(expanded.len());
        for variant in &expanded {
            let segments = parse_path(variant)?;
            variants.push(CompiledPath::new(variant, &segments)?);
        }

        self.routes.push(LinearRoute {
            method: method.to_string(),
            handler,
            variants,
        });
        Ok(())
    }

    fn lookup(&self, method: &str, path: &str) -> Result<Option<Match<H>>, RouterError> {
        let mut handlers = Vec::new();
        let mut params = Params::new();

        for route in &self.routes {
            if route.method != method && route.method != METHOD_ALL {
                continue;
            }
            // Every matching variant binds; the registration counts once.
            let mut matched = false;
            for compiled in &route.variants {
                let Some(captures) = compiled.regex.captures(path) else {
                    continue;
                };
                matched = true;
                for (name, group) in &compiled.params {
                    if let Some(value) = captures.get(*group) {
                        params.insert_first(name, value.as_str());
                    }
                }
            }
            if matched {
                handlers.push(route.handler.clone());
            }
        }

        if handlers.is_empty() {
            return Ok(None);
        }
        Ok(Some(Match { handlers, params }))
    }
}
