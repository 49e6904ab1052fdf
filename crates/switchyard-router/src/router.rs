//! Configured router entry point.

use std::borrow::Cow;

use crate::config::{ConfigError, RouterConfig};
use crate::error::RouterError;
use crate::path::{canonical_method, normalize_path, normalize_route};
use crate::{Match, RouteMatcher, SmartMatcher};

/// Router built from a [`RouterConfig`].
///
/// Upper-cases methods and, unless `strict` is set, normalizes both route
/// patterns and request paths so `/book` and `/book/` are the same route.
///
/// # Example
///
/// ```
/// use switchyard_router::Router;
///
/// let mut router = Router::new();
/// router.add("ALL", "*", "logger").unwrap();
/// router.add("GET", "/users/:id", "show_user").unwrap();
///
/// let found = router.lookup("get", "/users/42/").unwrap().unwrap();
/// assert_eq!(found.handlers, vec!["logger", "show_user"]);
/// assert_eq!(found.params.get("id"), Some("42"));
/// ```
pub struct Router<H> {
    config: RouterConfig,
    matcher: Box<dyn RouteMatcher<H>>,
}

impl<H: Clone + Send + Sync + 'static> Router<H> {
    /// Create a router with the default configuration.
    pub fn new() -> Self {
        Self::from_valid(RouterConfig::default())
    }

    /// Create a router from an explicit configuration.
    pub fn with_config(config: RouterConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_valid(config))
    }

    fn from_valid(config: RouterConfig) -> Self {
        let matcher: Box<dyn RouteMatcher<H>> = match config.strategies.as_slice() {
            [single] => single.build(),
            many => Box::new(SmartMatcher::new(many.iter().map(|s| s.build()).collect())),
        };
        Self { config, matcher }
    }

    /// Register `handler` for `method` and `path`.
    pub fn add(&mut self, method: &str, path: &str, handler: H) -> Result<(), RouterError> {
        let method = canonical_method(method);
        if self.config.strict {
            self.matcher.add(&method, path, handler)
        } else {
            self.matcher.add(&method, &normalize_route(path), handler)
        }
    }

    /// Find every handler for a request.
    pub fn lookup(&self, method: &str, path: &str) -> Result<Option<Match<H>>, RouterError> {
        let method = canonical_method(method);
        let path = if self.config.strict {
            Cow::Borrowed(path)
        } else {
            normalize_path(path)
        };
        self.matcher.lookup(&method, &path)
    }

    /// Name of the configured matcher (`"smart"` when several strategies
    /// are configured).
    pub fn name(&self) -> &'static str {
        self.matcher.name()
    }

    /// Strategy actually serving lookups, once known.
    pub fn strategy(&self) -> Option<&'static str> {
        self.matcher.active()
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }
}

impl<H: Clone + Send + Sync + 'static> Default for Router<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> std::fmt::Debug for Router<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("config", &self.config)
            .field("matcher", &self.matcher.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Strategy;

    #[test]
    fn trailing_slash_ignored_by_default() {
        let mut router = Router::new();
        router.add("GET", "/book", "book").expect("registers");
        for path in ["/book", "/book/", "//book"] {
            let m = router.lookup("GET", path).expect("lookup").expect("match");
            assert_eq!(m.handlers, vec!["book"]);
        }
    }

    #[test]
    fn trailing_slash_on_route_is_normalized() {
        let mut router = Router::new();
        router.add("GET", "/book/", "book").expect("registers");
        assert!(router.lookup("GET", "/book").expect("lookup").is_some());
    }

    #[test]
    fn strict_mode_matches_verbatim() {
        let config = RouterConfig::new().with_strict(true);
        let mut router = Router::with_config(config).expect("valid config");
        router.add("GET", "/book", "book").expect("registers");
        assert!(router.lookup("GET", "/book").expect("lookup").is_some());
        assert!(router.lookup("GET", "/book/").expect("lookup").is_none());
    }

    #[test]
    fn methods_are_case_insensitive() {
        let mut router = Router::new();
        router.add("get", "/a", "a").expect("registers");
        router.add("all", "/b", "b").expect("registers");
        assert!(router.lookup("GET", "/a").expect("lookup").is_some());
        assert!(router.lookup("delete", "/b").expect("lookup").is_some());
    }

    #[test]
    fn single_strategy_is_used_directly() {
        let config = RouterConfig::new().with_strategies([Strategy::Trie]);
        let router: Router<&'static str> = Router::with_config(config).expect("valid config");
        assert_eq!(router.name(), "trie");
        assert_eq!(router.strategy(), Some("trie"));
    }

    #[test]
    fn several_strategies_are_selected_lazily() {
        let mut router = Router::new();
        assert_eq!(router.name(), "smart");
        router.add("GET", "/:user/entries", "entries").expect("registers");
        router.add("GET", "/entry/:name", "entry").expect("registers");
        assert_eq!(router.strategy(), None);

        router.lookup("GET", "/entry/1").expect("lookup");
        assert_eq!(router.strategy(), Some("trie"));
    }

    #[test]
    fn invalid_config_rejected() {
        let config = RouterConfig::new().with_strategies([]);
        assert!(matches!(
            Router::<&'static str>::with_config(config),
            Err(ConfigError::EmptyStrategies)
        ));
    }

    #[test]
    fn optional_params_through_the_facade() {
        let mut router = Router::new();
        router.add("GET", "/api/animals/:type?", "animals").expect("registers");
        let bare = router.lookup("GET", "/api/animals/").expect("lookup").expect("match");
        assert!(bare.params.get("type").is_none());
        let typed = router.lookup("GET", "/api/animals/dog").expect("lookup").expect("match");
        assert_eq!(typed.params.get("type"), Some("dog"));
    }
}
