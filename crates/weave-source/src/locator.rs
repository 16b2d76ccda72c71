//! Resource locators.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Reference to a resource: a relative path, a rooted path or a URI.
///
/// Locators are compared as strings, so two spellings of the same file
/// (`a/./b.xml` and `a/b.xml`) only compare equal after [`Locator::resolve`]
/// has normalized them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Locator(String);

impl Locator {
    /// Wrap a locator string as-is.
    #[must_use]
    pub fn new(locator: impl Into<String>) -> Self {
        Self(locator.into())
    }

    /// The locator text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// URI scheme (`http`, `file`, ...), if any.
    ///
    /// Single-letter prefixes are not schemes, so `C:/docs` stays a path.
    #[must_use]
    pub fn scheme(&self) -> Option<&str> {
        scheme_of(&self.0)
    }

    /// Whether the locator carries a scheme and so refers to a remote resource.
    #[must_use]
    pub fn is_remote(&self) -> bool {
        self.scheme().is_some()
    }

    /// Everything up to and including the last `/`.
    #[must_use]
    pub fn directory(&self) -> &str {
        self.0.rfind('/').map_or("", |i| &self.0[..=i])
    }

    /// Resolve `href` relative to this locator.
    ///
    /// References with a scheme are returned untouched. Rooted references
    /// (`/x.xml`) are kept rooted, or attached to the authority of a remote
    /// base. Anything else is joined with this locator's directory. Dot
    /// segments are normalized in the result.
    #[must_use]
    pub fn resolve(&self, href: &str) -> Self {
        if scheme_of(href).is_some() {
            return Self::new(href);
        }

        match split_authority(&self.0) {
            Some((authority, path)) => {
                let joined = if href.starts_with('/') {
                    href.to_owned()
                } else {
                    format!("{}{href}", directory_of(path))
                };
                Self(format!("{authority}{}", normalize_path(&joined)))
            }
            None if href.starts_with('/') => Self(normalize_path(href)),
            None => Self(normalize_path(&format!("{}{href}", self.directory()))),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Locator {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Locator {
    fn from(locator: &str) -> Self {
        Self::new(locator)
    }
}

impl From<String> for Locator {
    fn from(locator: String) -> Self {
        Self(locator)
    }
}

fn scheme_of(s: &str) -> Option<&str> {
    let (scheme, _) = s.split_once(':')?;
    let mut chars = scheme.chars();
    let valid = scheme.len() > 1
        && chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    valid.then_some(scheme)
}

/// Split `scheme://authority` from the path of a hierarchical URI.
fn split_authority(s: &str) -> Option<(&str, &str)> {
    scheme_of(s)?;
    let start = s.find("://")? + 3;
    let end = s[start..].find('/').map_or(s.len(), |i| start + i);
    Some(s.split_at(end))
}

fn directory_of(path: &str) -> &str {
    path.rfind('/').map_or("/", |i| &path[..=i])
}

/// Collapse `.` and `..` segments and repeated slashes.
///
/// Leading `..` segments of a relative path are kept; on a rooted path they
/// are dropped.
fn normalize_path(path: &str) -> String {
    let rooted = path.starts_with('/');
    let trailing = path.ends_with('/') && path.len() > 1;

    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&last) if last != ".." => {
                    segments.pop();
                }
                _ if !rooted => segments.push(".."),
                _ => {}
            },
            other => segments.push(other),
        }
    }

    let mut result = segments.join("/");
    if rooted {
        result.insert(0, '/');
    }
    if trailing && !result.ends_with('/') {
        result.push('/');
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_sibling() {
        let base = Locator::new("pages/index.xml");
        assert_eq!(base.resolve("nav.xml").as_str(), "pages/nav.xml");
    }

    #[test]
    fn test_resolve_without_directory() {
        let base = Locator::new("index.xml");
        assert_eq!(base.resolve("nav.xml").as_str(), "nav.xml");
    }

    #[test]
    fn test_resolve_normalizes_dot_segments() {
        let base = Locator::new("pages/sub/index.xml");
        assert_eq!(base.resolve("../shared/./nav.xml").as_str(), "pages/shared/nav.xml");
        assert_eq!(base.resolve("../../../up.xml").as_str(), "../up.xml");
    }

    #[test]
    fn test_resolve_rooted_href() {
        let base = Locator::new("pages/index.xml");
        assert_eq!(base.resolve("/shared/nav.xml").as_str(), "/shared/nav.xml");
        assert_eq!(base.resolve("/../nav.xml").as_str(), "/nav.xml");
    }

    #[test]
    fn test_resolve_remote_href_untouched() {
        let base = Locator::new("pages/index.xml");
        let href = "https://example.com/a/../b.xml";
        assert_eq!(base.resolve(href).as_str(), href);
    }

    #[test]
    fn test_resolve_against_remote_base() {
        let base = Locator::new("https://example.com/docs/index.xml");
        assert_eq!(
            base.resolve("../nav.xml").as_str(),
            "https://example.com/nav.xml"
        );
        assert_eq!(
            base.resolve("/root.xml").as_str(),
            "https://example.com/root.xml"
        );
    }

    #[test]
    fn test_scheme_detection() {
        assert_eq!(Locator::new("http://x/y").scheme(), Some("http"));
        assert_eq!(Locator::new("urn:isbn:1").scheme(), Some("urn"));
        assert!(Locator::new("C:/docs/a.xml").scheme().is_none());
        assert!(!Locator::new("a/b.xml").is_remote());
    }

    #[test]
    fn test_directory() {
        assert_eq!(Locator::new("a/b/c.xml").directory(), "a/b/");
        assert_eq!(Locator::new("c.xml").directory(), "");
    }
}
