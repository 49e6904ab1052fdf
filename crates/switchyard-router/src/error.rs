use thiserror::Error;

/// Errors produced while registering routes or resolving a match.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouterError {
    /// The strategy cannot express this route set. Recoverable: the
    /// adaptive selector moves on to its next candidate.
    #[error("unsupported path: {0}")]
    UnsupportedPath(String),

    /// Every candidate strategy rejected the route set.
    #[error("no routing strategy can handle the route set (last rejected path: {path})")]
    NoStrategy { path: String },

    /// A parameter name is bound twice within one registered path.
    #[error("duplicate param name '{name}' in {path}")]
    DuplicateParam { name: String, path: String },

    /// A `:name{regex}` constraint does not compile.
    #[error("invalid constraint in segment '{segment}': {reason}")]
    InvalidConstraint { segment: String, reason: String },

    /// Routes were added after the matcher froze on its first lookup.
    #[error("can not add a route since the matcher is already built")]
    MatcherAlreadyBuilt,
}

impl RouterError {
    /// Whether this error is the recoverable "unsupported path" signal.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, RouterError::UnsupportedPath(_))
    }
}
