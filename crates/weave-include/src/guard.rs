//! Recursion tracking for a resolution run.

use crate::cache::ResolutionKey;

/// Keys currently being resolved, innermost last.
///
/// The root key stays active for the whole run but does not count towards
/// the depth.
#[derive(Debug)]
pub struct RecursionGuard {
    root: ResolutionKey,
    active: Vec<ResolutionKey>,
}

impl RecursionGuard {
    /// Create a guard for a run rooted at `root`.
    #[must_use]
    pub fn new(root: ResolutionKey) -> Self {
        Self {
            root,
            active: Vec::new(),
        }
    }

    /// Number of nested resolutions in progress.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.active.len()
    }

    /// Whether `key` is the root or is being resolved further up the stack.
    #[must_use]
    pub fn is_active(&self, key: &ResolutionKey) -> bool {
        *key == self.root || self.active.contains(key)
    }

    /// Mark `key` as being resolved.
    pub fn enter(&mut self, key: ResolutionKey) {
        self.active.push(key);
    }

    /// Leave the innermost resolution.
    pub fn leave(&mut self) {
        self.active.pop();
    }
}

#[cfg(test)]
mod tests {
    use weave_source::Locator;

    use super::*;

    fn key(locator: &str) -> ResolutionKey {
        ResolutionKey::markup(Locator::new(locator), "/")
    }

    #[test]
    fn test_root_is_active_at_depth_zero() {
        let guard = RecursionGuard::new(key("index.xml"));
        assert_eq!(guard.depth(), 0);
        assert!(guard.is_active(&key("index.xml")));
        assert!(!guard.is_active(&key("nav.xml")));
    }

    #[test]
    fn test_enter_and_leave() {
        let mut guard = RecursionGuard::new(key("index.xml"));

        guard.enter(key("a.xml"));
        guard.enter(key("b.xml"));
        assert_eq!(guard.depth(), 2);
        assert!(guard.is_active(&key("a.xml")));

        guard.leave();
        assert!(!guard.is_active(&key("b.xml")));
        assert_eq!(guard.depth(), 1);
    }
}
