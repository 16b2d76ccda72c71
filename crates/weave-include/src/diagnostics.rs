//! Diagnostic records for directives that did not resolve cleanly.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::IncludeError;

/// Category of a [`Diagnostic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticKind {
    /// See [`IncludeError::MissingTarget`].
    MissingTarget,
    /// See [`IncludeError::MaxDepthExceeded`].
    MaxDepthExceeded,
    /// See [`IncludeError::CyclicInclusion`].
    CyclicInclusion,
    /// See [`IncludeError::ResolutionFailed`].
    ResolutionFailed,
    /// The referenced resource or fragment does not exist.
    NotFound,
}

impl DiagnosticKind {
    /// Stable kebab-case name, also used as the marker's `kind` attribute.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MissingTarget => "missing-target",
            Self::MaxDepthExceeded => "max-depth-exceeded",
            Self::CyclicInclusion => "cyclic-inclusion",
            Self::ResolutionFailed => "resolution-failed",
            Self::NotFound => "not-found",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&IncludeError> for DiagnosticKind {
    fn from(err: &IncludeError) -> Self {
        match err {
            IncludeError::MissingTarget => Self::MissingTarget,
            IncludeError::MaxDepthExceeded { .. } => Self::MaxDepthExceeded,
            IncludeError::CyclicInclusion(_) => Self::CyclicInclusion,
            IncludeError::ResolutionFailed { .. } => Self::ResolutionFailed,
        }
    }
}

/// One directive that failed or found nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Directive identity (`href`, `href#selector` or `#selector`).
    pub identity: String,
    /// Locator of the document holding the directive.
    pub document: String,
    /// Category.
    pub kind: DiagnosticKind,
    /// Human-readable message.
    pub message: String,
    /// Whether the directive sat inside included content rather than in
    /// the root document.
    pub nested: bool,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} [{}]", self.document, self.message, self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_error() {
        let err = IncludeError::CyclicInclusion("a.xml".to_owned());
        assert_eq!(DiagnosticKind::from(&err), DiagnosticKind::CyclicInclusion);
        assert_eq!(
            DiagnosticKind::from(&IncludeError::MissingTarget).as_str(),
            "missing-target"
        );
    }

    #[test]
    fn test_display() {
        let diagnostic = Diagnostic {
            identity: "nav.xml".to_owned(),
            document: "index.xml".to_owned(),
            kind: DiagnosticKind::NotFound,
            message: "NOT FOUND: nav.xml".to_owned(),
            nested: false,
        };
        assert_eq!(
            diagnostic.to_string(),
            "index.xml: NOT FOUND: nav.xml [not-found]"
        );
    }
}
