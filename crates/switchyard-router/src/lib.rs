//! Multi-strategy HTTP request router.
//!
//! Matches `(method, path)` pairs against registered route patterns and
//! returns every matching handler in registration order, plus the path
//! parameters they bind. Four strategies implement [`RouteMatcher`]:
//!
//! - [`TrieMatcher`]: segment trie walked per request; accepts any route set.
//! - [`RegExpMatcher`]: flattens the route set into one regex per method
//!   plus a static lookup table; refuses ambiguous route sets.
//! - [`LinearMatcher`]: one standalone regex per route, scanned in order.
//! - [`StaticMatcher`]: exact lookup, literal paths only.
//!
//! [`SmartMatcher`] tries an ordered list of strategies on the first lookup
//! and commits to the first one that accepts the whole route set.
//! [`Router`] is the configured entry point applications embed.
//!
//! # Path syntax
//!
//! `:name`, `:name{regex}`, a trailing `:name?`, `*` (one segment mid-path,
//! zero or more at the end) and an optional `host/` literal prefix. The
//! method [`METHOD_ALL`] matches every verb.

pub mod config;
pub mod error;
pub mod linear;
pub mod path;
pub mod pattern;
pub mod regexp;
pub mod router;
pub mod smart;
pub mod static_map;
pub mod trie;

pub use config::{ConfigError, RouterConfig, Strategy};
pub use error::RouterError;
pub use linear::LinearMatcher;
pub use pattern::{parse_path, parse_segment, Pattern};
pub use regexp::RegExpMatcher;
pub use router::Router;
pub use smart::SmartMatcher;
pub use static_map::StaticMatcher;
pub use trie::TrieMatcher;

/// Method sentinel matching every HTTP verb.
pub const METHOD_ALL: &str = "ALL";

/// Path parameters bound by a match, in binding order.
///
/// A name appears once; the earliest-registered matching route decides its
/// value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(Vec<(String, String)>);

impl Params {
    /// Create an empty parameter map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Value bound to `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Bind `name` unless it is already bound.
    pub fn insert_first(&mut self, name: &str, value: &str) {
        if self.get(name).is_none() {
            self.0.push((name.to_string(), value.to_string()));
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate `(name, value)` pairs in binding order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for Params {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (name, value) in iter {
            params.insert_first(name, value);
        }
        params
    }
}

/// The result of a successful lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct Match<H> {
    /// Matching handlers in registration order. Never empty.
    pub handlers: Vec<H>,
    /// Parameters bound by the matched routes.
    pub params: Params,
}

/// A routing strategy.
///
/// `add` is a setup-phase operation; `lookup` may be called concurrently
/// once setup is done. Strategies that build lazily freeze on their first
/// lookup and reject later registrations with
/// [`RouterError::MatcherAlreadyBuilt`].
pub trait RouteMatcher<H>: Send + Sync {
    /// Short strategy name, e.g. `"trie"`.
    fn name(&self) -> &'static str;

    /// Register a handler for `method` and `path`.
    fn add(&mut self, method: &str, path: &str, handler: H) -> Result<(), RouterError>;

    /// Find every handler matching `method` and `path`.
    ///
    /// `Ok(None)` means no route matched.
    fn lookup(&self, method: &str, path: &str) -> Result<Option<Match<H>>, RouterError>;

    /// Name of the strategy actually serving lookups.
    fn active(&self) -> Option<&'static str> {
        Some(self.name())
    }
}
