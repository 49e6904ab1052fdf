//! Router configuration.

use serde::Deserialize;
use thiserror::Error;

use crate::{LinearMatcher, RegExpMatcher, RouteMatcher, StaticMatcher, TrieMatcher};

/// A concrete matching strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// One compiled regex per method plus a static table.
    Regexp,
    /// Segment trie.
    Trie,
    /// Ordered scan of per-route regexes.
    Linear,
    /// Exact lookup, literal paths only.
    Static,
}

impl Strategy {
    /// Name used in config files and reported by the matcher.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Regexp => "regexp",
            Self::Trie => "trie",
            Self::Linear => "linear",
            Self::Static => "static",
        }
    }

    /// Create a fresh, empty matcher for this strategy.
    pub fn build<H>(&self) -> Box<dyn RouteMatcher<H>>
    where
        H: Clone + Send + Sync + 'static,
    {
        match self {
            Self::Regexp => Box::new(RegExpMatcher::new()),
            Self::Trie => Box::new(TrieMatcher::new()),
            Self::Linear => Box::new(LinearMatcher::new()),
            Self::Static => Box::new(StaticMatcher::new()),
        }
    }
}

/// Errors from an invalid [`RouterConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("at least one routing strategy must be configured")]
    EmptyStrategies,

    #[error("strategy '{0}' is listed more than once")]
    DuplicateStrategy(&'static str),
}

/// Router configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Match paths verbatim. When false (default), duplicate slashes
    /// collapse and a trailing slash is ignored.
    pub strict: bool,

    /// Candidate strategies in preference order (default: regexp, trie).
    pub strategies: Vec<Strategy>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            strict: false,
            strategies: vec![Strategy::Regexp, Strategy::Trie],
        }
    }
}

impl RouterConfig {
    /// Create a new router config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set strict path matching.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Set the candidate strategies.
    pub fn with_strategies(mut self, strategies: impl IntoIterator<Item = Strategy>) -> Self {
        self.strategies = strategies.into_iter().collect();
        self
    }

    /// Check the strategy list is non-empty and free of repeats.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.strategies.is_empty() {
            return Err(ConfigError::EmptyStrategies);
        }
        for (i, strategy) in self.strategies.iter().enumerate() {
            if self.strategies[..i].contains(strategy) {
                return Err(ConfigError::DuplicateStrategy(strategy.as_str()));
            }
        }
        Ok(())
    }
}
