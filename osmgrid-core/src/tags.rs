//! Tag-key allow-list deciding way eligibility.

use crate::way::Way;

/// Ordered allow-list of tag keys.
///
/// A way is accepted when it carries at least one listed key. An empty list
/// accepts every way.
///
/// # Examples
/// ```
/// use osmgrid_core::{TagWhitelist, Tags, Way};
///
/// let whitelist = TagWhitelist::new(["highway"]);
/// let road = Way::new(["1", "2"], Tags::from([("highway".into(), "residential".into())]));
/// let house = Way::new(["3", "4"], Tags::from([("building".into(), "yes".into())]));
///
/// assert!(whitelist.accepts(&road));
/// assert!(!whitelist.accepts(&house));
/// assert!(TagWhitelist::default().accepts(&house));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagWhitelist {
    keys: Vec<String>,
}

impl TagWhitelist {
    /// Build a whitelist from tag keys, dropping blanks and duplicates while
    /// keeping first-seen order.
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut collected: Vec<String> = Vec::new();
        for key in keys {
            let key = key.into();
            let trimmed = key.trim();
            if trimmed.is_empty() || collected.iter().any(|existing| existing == trimmed) {
                continue;
            }
            collected.push(trimmed.to_owned());
        }
        Self { keys: collected }
    }

    /// Parse a comma-separated key list such as `"highway,railway"`.
    #[must_use]
    pub fn from_csv(raw: &str) -> Self {
        Self::new(raw.split(','))
    }

    /// Whether the way carries at least one listed key.
    #[must_use]
    pub fn accepts(&self, way: &Way) -> bool {
        self.is_empty() || self.keys.iter().any(|key| way.tags.contains_key(key))
    }

    /// Whether the whitelist disables tag filtering.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Listed keys in configuration order.
    #[must_use]
    pub fn keys(&self) -> &[String] {
        &self.keys
    }
}
