//! Exact-match router for route sets without dynamic segments.

use std::collections::HashMap;

use crate::error::RouterError;
use crate::pattern::{is_dynamic_path, parse_path};
use crate::{Match, Params, RouteMatcher, METHOD_ALL};

/// Hash lookup on the full path. Any parameter, wildcard or optional
/// segment is refused with [`RouterError::UnsupportedPath`].
#[derive(Debug)]
pub struct StaticMatcher<H> {
    paths: HashMap<String, Vec<(String, H)>>,
}

impl<H> Default for StaticMatcher<H> {
    fn default() -> Self {
        Self {
            paths: HashMap::new(),
        }
    }
}

impl<H> StaticMatcher<H> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<H: Clone + Send + Sync> RouteMatcher<H> for StaticMatcher<H> {
    fn name(&self) -> &'static str {
        "static"
    }

    fn add(&mut self, method: &str, path: &str, handler: H) -> Result<(), RouterError> {
        let segments = parse_path(path)?;
        if is_dynamic_path(&segments) {
            return Err(RouterError::UnsupportedPath(path.to_string()));
        }

        self.paths
            .entry(path.to_string())
            .or_default()
            .push((method.to_string(), handler));
        Ok(())
    }

    fn lookup(&self, method: &str, path: &str) -> Result<Option<Match<H>>, RouterError> {
        let Some(entries) = self.paths.get(path) else {
            return Ok(None);
        };

        let handlers: Vec<H> = entries
            .iter()
            .filter(|(m, _)| m == method || m == METHOD_ALL)
            .map(|(_, handler)| handler.clone())
            .collect();

        if handlers.is_empty() {
            return Ok(None);
        }
        Ok(Some(Match {
            handlers,
            params: Params::new(),
        }))
    }
}
