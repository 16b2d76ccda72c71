//! Error types for inclusion resolution.

use weave_source::{Locator, SourceError};

/// Why a single directive could not be resolved.
///
/// These never abort a run; the resolver turns them into diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum IncludeError {
    /// Neither `href` nor a selector was given.
    #[error("include has neither href nor selector")]
    MissingTarget,

    /// Nesting went deeper than the configured limit.
    #[error("include depth limit of {max} exceeded at {identity}")]
    MaxDepthExceeded {
        /// Directive that would have gone too deep.
        identity: String,
        /// Configured limit.
        max: usize,
    },

    /// The directive includes something that is currently being resolved.
    #[error("cyclic inclusion of {0}")]
    CyclicInclusion(String),

    /// Fetching, decoding, parsing or selecting failed.
    #[error("failed to resolve {identity}: {message}")]
    ResolutionFailed {
        /// Failed directive.
        identity: String,
        /// Underlying cause.
        message: String,
    },
}

impl IncludeError {
    pub(crate) fn failed(identity: &str, cause: &impl std::fmt::Display) -> Self {
        Self::ResolutionFailed {
            identity: identity.to_owned(),
            message: cause.to_string(),
        }
    }
}

/// The root document of a load could not be read.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum LoadError {
    /// Fetching or parsing the root document failed.
    #[error("failed to load {locator}: {source}")]
    Root {
        /// Root locator.
        locator: Locator,
        /// Underlying source error.
        #[source]
        source: SourceError,
    },
}
