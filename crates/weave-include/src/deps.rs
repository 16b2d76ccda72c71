//! Dependency tracking.

use std::collections::HashSet;

use weave_source::Locator;

/// Ordered set of locators read during a run.
///
/// Locators that were requested but did not exist are recorded too: creating
/// them later changes the output.
#[derive(Debug, Default)]
pub struct DependencyTracker {
    order: Vec<Locator>,
    seen: HashSet<Locator>,
}

impl DependencyTracker {
    /// Create an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a locator. Repeats are ignored.
    pub fn record(&mut self, locator: &Locator) {
        if self.seen.insert(locator.clone()) {
            self.order.push(locator.clone());
        }
    }

    /// Record several locators.
    pub fn extend<'a>(&mut self, locators: impl IntoIterator<Item = &'a Locator>) {
        for locator in locators {
            self.record(locator);
        }
    }

    /// Whether `locator` was recorded.
    #[must_use]
    pub fn contains(&self, locator: &Locator) -> bool {
        self.seen.contains(locator)
    }

    /// Recorded locators in first-seen order.
    #[must_use]
    pub fn into_vec(self) -> Vec<Locator> {
        self.order
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_keeps_first_seen_order_without_duplicates() {
        let mut deps = DependencyTracker::new();
        let a = Locator::new("a.xml");
        let b = Locator::new("b.xml");

        deps.record(&a);
        deps.extend([&b, &a]);

        assert!(deps.contains(&b));
        assert_eq!(deps.into_vec(), vec![a, b]);
    }
}
