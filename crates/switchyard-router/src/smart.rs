//! Adaptive strategy selection.
//!
//! [`SmartMatcher`] buffers registrations and, on the first lookup, replays
//! them into each candidate strategy in turn. The first candidate that
//! accepts the whole route set serves every later lookup directly.

use std::sync::OnceLock;

use parking_lot::Mutex;

use crate::error::RouterError;
use crate::path::expand_optional;
use crate::pattern::parse_path;
use crate::{Match, RegExpMatcher, RouteMatcher, TrieMatcher};

/// Router that commits to the first candidate strategy able to serve the
/// registered route set.
pub struct SmartMatcher<H> {
    state: Mutex<Resolution<H>>,
    active: OnceLock<Box<dyn RouteMatcher<H>>>,
}

enum Resolution<H> {
    Pending {
        routes: Vec<(String, String, H)>,
        candidates: Vec<Box<dyn RouteMatcher<H>>>,
    },
    Committed,
    Failed(RouterError),
}

impl<H: Clone + Send + Sync + 'static> Default for SmartMatcher<H> {
    /// Compiled regex first, trie as the fallback.
    fn default() -> Self {
        Self::new(vec![
            Box::new(RegExpMatcher::new()),
            Box::new(TrieMatcher::new()),
        ])
    }
}

impl<H> std::fmt::Debug for SmartMatcher<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmartMatcher")
            .field("active", &self.active.get().map(|m| m.name()))
            .finish()
    }
}

impl<H: Clone + Send + Sync + 'static> SmartMatcher<H> {
    /// Create a selector over fresh, empty candidates in preference order.
    pub fn new(candidates: Vec<Box<dyn RouteMatcher<H>>>) -> Self {
        Self {
            state: Mutex::new(Resolution::Pending {
                routes: Vec::new(),
                candidates,
            }),
            active: OnceLock::new(),
        }
    }

    fn resolve(&self, method: &str, path: &str) -> Result<Option<Match<H>>, RouterError> {
        let mut state = self.state.lock();

        // Another caller may have committed while we waited for the lock.
        if let Some(active) = self.active.get() {
            return active.lookup(method, path);
        }

        let (routes, candidates) = match std::mem::replace(&mut *state, Resolution::Committed) {
            Resolution::Pending { routes, candidates } => (routes, candidates),
            Resolution::Failed(err) => {
                *state = Resolution::Failed(err.clone());
                return Err(err);
            }
            // `active` is always set before the state moves to Committed.
            Resolution::Committed => return Ok(None),
        };

        let mut rejected_path = path.to_string();
        for mut candidate in candidates {
            let strategy = candidate.name();
            match replay(candidate.as_mut(), &routes, method, path) {
                Ok(found) => {
                    tracing::info!(
                        event = "strategy_selected",
                        strategy,
                        routes = routes.len(),
                        "routing strategy selected"
                    );
                    let _ = self.active.set(candidate);
                    return Ok(found);
                }
                Err(RouterError::UnsupportedPath(unsupported)) => {
                    tracing::debug!(strategy, path = %unsupported, "routing strategy rejected route set");
                    rejected_path = unsupported;
                }
                Err(err) => {
                    *state = Resolution::Failed(err.clone());
                    return Err(err);
                }
            }
        }

        tracing::warn!(
            routes = routes.len(),
            path = %rejected_path,
            "no routing strategy accepted the route set"
        );
        let err = RouterError::NoStrategy {
            path: rejected_path,
        };
        *state = Resolution::Failed(err.clone());
        Err(err)
    }
}

fn replay<H: Clone>(
    candidate: &mut dyn RouteMatcher<H>,
    routes: &[(String, String, H)],
    method: &str,
    path: &str,
) -> Result<Option<Match<H>>, RouterError> {
    for (route_method, route_path, handler) in routes {
        candidate.add(route_method, route_path, handler.clone())?;
    }
    candidate.lookup(method, path)
}

impl<H: Clone + Send + Sync + 'static> RouteMatcher<H> for SmartMatcher<H> {
    fn name(&self) -> &'static str {
        "smart"
    }

    fn add(&mut self, method: &str, path: &str, handler: H) -> Result<(), RouterError> {
        let Resolution::Pending { routes, .. } = self.state.get_mut() else {
            return Err(RouterError::MatcherAlreadyBuilt);
        };

        let variants = expand_optional(path).unwrap_or_else(|| vec![path.to_string()]);
        for variant in &variants {
            parse_path(variant)?;
        }

        routes.push((method.to_string(), path.to_string(), handler));
        Ok(())
    }

    fn lookup(&self, method: &str, path: &str) -> Result<Option<Match<H>>, RouterError> {
        match self.active.get() {
            Some(active) => active.lookup(method, path),
            None => self.resolve(method, path),
        }
    }

    fn active(&self) -> Option<&'static str> {
        self.active.get().map(|m| m.name())
    }
}
