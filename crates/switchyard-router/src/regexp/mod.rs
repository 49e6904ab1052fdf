//! Compiled-regex router.
//!
//! Registrations are only recorded by `add`. The first lookup flattens the
//! whole route set into one regex per method plus a static lookup table and
//! freezes the matcher. Route sets whose flattened form would be ambiguous
//! are refused with [`RouterError::UnsupportedPath`] so a caller such as
//! [`crate::SmartMatcher`] can fall back to another strategy.

mod tree;

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use regex_lite::Regex;

use crate::error::RouterError;
use crate::path::expand_optional;
use crate::pattern::{parse_path, Pattern};
use crate::{Match, Params, RouteMatcher, METHOD_ALL};

use self::tree::{covers, is_static, to_steps, Step, Tree};

/// Router backed by a single compiled regex per method.
pub struct RegExpMatcher<H> {
    routes: Vec<Route<H>>,
    built: OnceLock<HashMap<String, MethodMatcher<H>>>,
}

struct Route<H> {
    method: String,
    handler: H,
    /// `(path, segments)` per optional variant.
    variants: Vec<(String, Vec<Arc<Pattern>>)>,
}

/// Everything needed to answer lookups for one method.
struct MethodMatcher<H> {
    statics: HashMap<String, Match<H>>,
    regex: Option<Regex>,
    leaf_groups: Vec<(usize, usize)>,
    leaves: Vec<DynamicLeaf<H>>,
}

struct DynamicLeaf<H> {
    handlers: Vec<H>,
    /// `(name, capture group)` in binding order.
    params: Vec<(String, usize)>,
}

/// A distinct registered path during a build.
struct LeafPlan<'a> {
    path: &'a str,
    steps: &'a [Step],
    /// `(route, variant)` of every registration variant matching this leaf,
    /// in registration order.
    owners: Vec<(usize, usize)>,
}

impl<H> Default for RegExpMatcher<H> {
    fn default() -> Self {
        Self {
            routes: Vec::new(),
            built: OnceLock::new(),
        }
    }
}

impl<H> std::fmt::Debug for RegExpMatcher<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegExpMatcher")
            .field("routes", &self.routes.len())
            .field("built", &self.built.get().is_some())
            .finish()
    }
}

impl<H: Clone> RegExpMatcher<H> {
    pub fn new() -> Self {
        Self::default()
    }

    fn matchers(&self) -> Result<&HashMap<String, MethodMatcher<H>>, RouterError> {
        if let Some(built) = self.built.get() {
            return Ok(built);
        }
        let built = self.build()?;
        Ok(self.built.get_or_init(|| built))
    }

    fn build(&self) -> Result<HashMap<String, MethodMatcher<H>>, RouterError> {
        let mut methods: Vec<&str> = vec![METHOD_ALL];
        for route in &self.routes {
            if !methods.contains(&route.method.as_str()) {
                methods.push(&route.method);
            }
        }

        let mut built = HashMap::with_capacity(methods.len());
        for method in methods {
            built.insert(method.to_string(), self.build_method(method)?);
        }
        Ok(built)
    }

    fn build_method(&self, method: &str) -> Result<MethodMatcher<H>, RouterError> {
        let routes: Vec<&Route<H>> = self
            .routes
            .iter()
            .filter(|r| r.method == method || r.method == METHOD_ALL)
            .collect();

        let steps = routes
            .iter()
            .map(|route| {
                route
                    .variants
                    .iter()
                    .map(|(path, segments)| to_steps(path, segments))
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut leaves: Vec<LeafPlan<'_>> = Vec::new();
        for (route, variants) in routes.iter().zip(&steps) {
            for ((path, _), variant_steps) in route.variants.iter().zip(variants) {
                if !leaves.iter().any(|leaf| leaf.path == path) {
                    leaves.push(LeafPlan {
                        path,
                        steps: variant_steps,
                        owners: Vec::new(),
                    });
                }
            }
        }

        for leaf in &mut leaves {
            for (r, route) in routes.iter().enumerate() {
                for (v, ((path, _), s)) in route.variants.iter().zip(&steps[r]).enumerate() {
                    if path == leaf.path || covers(s, leaf.steps) {
                        leaf.owners.push((r, v));
                    }
                }
            }
        }

        let (statics, dynamics): (Vec<&LeafPlan<'_>>, Vec<&LeafPlan<'_>>) =
            leaves.iter().partition(|leaf| is_static(leaf.steps));

        let mut tree = Tree::new();
        let mut trails = Vec::with_capacity(dynamics.len());
        for (id, leaf) in dynamics.iter().enumerate() {
            let trail = tree
                .insert(leaf.steps, id)
                .map_err(|_| RouterError::UnsupportedPath(leaf.path.to_string()))?;
            trails.push(trail);
        }
        for leaf in &statics {
            tree.check_static(leaf.steps)
                .map_err(|_| RouterError::UnsupportedPath(leaf.path.to_string()))?;
        }

        let static_map: HashMap<String, Match<H>> = statics
            .iter()
            .map(|leaf| {
                let matched = Match {
                    handlers: handlers_of(&routes, &leaf.owners),
                    params: Params::new(),
                };
                (leaf.path.to_string(), matched)
            })
            .collect();

        if dynamics.is_empty() {
            tracing::debug!(method, static_paths = static_map.len(), "compiled route table");
            return Ok(MethodMatcher {
                statics: static_map,
                regex: None,
                leaf_groups: Vec::new(),
                leaves: Vec::new(),
            });
        }

        let emitted = tree.emit();
        let regex = Regex::new(&emitted.source).map_err(|e| {
            tracing::debug!(method, error = %e, "combined route regex rejected");
            RouterError::UnsupportedPath(dynamics[0].path.to_string())
        })?;

        let leaves = dynamics
            .iter()
            .zip(&trails)
            .map(|(leaf, trail)| {
                let mut params: Vec<(String, usize)> = Vec::new();
                for &(r, v) in &leaf.owners {
                    for (step, node) in steps[r][v].iter().zip(trail) {
                        let Some(name) = step.name.as_deref() else {
                            continue;
                        };
                        let Some(&group) = emitted.capture_groups.get(node) else {
                            continue;
                        };
                        if !params.iter().any(|(n, _)| n == name) {
                            params.push((name.to_string(), group));
                        }
                    }
                }
                DynamicLeaf {
                    handlers: handlers_of(&routes, &leaf.owners),
                    params,
                }
            })
            .collect();

        tracing::debug!(
            method,
            static_paths = static_map.len(),
            dynamic_paths = dynamics.len(),
            regex_len = emitted.source.len(),
            "compiled route table"
        );

        Ok(MethodMatcher {
            statics: static_map,
            regex: Some(regex),
            leaf_groups: emitted.leaf_groups,
            leaves,
        })
    }
}

/// One handler per owning registration, however many of its variants match.
fn handlers_of<H: Clone>(routes: &[&Route<H>], owners: &[(usize, usize)]) -> Vec<H> {
    let mut handlers = Vec::with_capacity(owners.len());
    let mut previous = None;
    for &(r, _) in owners {
        if previous != Some(r) {
            handlers.push(routes[r].handler.clone());
            previous = Some(r);
        }
    }
    handlers
}

impl<H: Clone> MethodMatcher<H> {
    fn find(&self, path: &str) -> Option<Match<H>> {
        if let Some(matched) = self.statics.get(path) {
            return Some(matched.clone());
        }

        let captures = self.regex.as_ref()?.captures(path)?;
        let &(_, leaf) = self
            .leaf_groups
            .iter()
            .find(|(group, _)| captures.get(*group).is_some())?;
        let leaf = self.leaves.get(leaf)?;

        let params = leaf
            .params
            .iter()
            .filter_map(|(name, group)| captures.get(*group).map(|m| (name.as_str(), m.as_str())))
            .collect();

        Some(Match {
            handlers: leaf.handlers.clone(),
            params,
        })
    }
}

impl<H: Clone + Send + Sync> RouteMatcher<H> for RegExpMatcher<H> {
    fn name(&self) -> &'static str {
        "regexp"
    }

    fn add(&mut self, method: &str, path: &str, handler: H) -> Result<(), RouterError> {
        if self.built.get().is_some() {
            return Err(RouterError::MatcherAlreadyBuilt);
        }

        let expanded = expand_optional(path).unwrap_or_else(|| vec![path.to_string()]);
        let mut variants = Vec::with_capacity(expanded.len());
        for variant in expanded {
            let segments = parse_path(&variant)?;
            variants.push((variant, segments));
        }

        self.routes.push(Route {
            method: method.to_string(),
            handler,
            variants,
        });
        Ok(())
    }

    fn lookup(&self, method: &str, path: &str) -> Result<Option<Match<H>>, RouterError> {
        let matchers = self.matchers()?;
        let Some(matcher) = matchers.get(method).or_else(|| matchers.get(METHOD_ALL)) else {
            return Ok(None);
        };
        Ok(matcher.find(path))
    }
}
