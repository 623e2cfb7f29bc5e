//! Way records: ordered node references plus free-form tags.

use std::collections::HashMap;
use std::fmt;

use crate::point::NodeId;

/// OpenStreetMap-style key/value tags.
pub type Tags = HashMap<String, String>;

/// A finalised way record.
///
/// The node sequence may be empty, contain a single entry, or repeat
/// identifiers. Tag keys are unique; inserting a duplicate key replaces the
/// earlier value.
///
/// # Examples
/// ```
/// use osmgrid_core::Way;
///
/// let mut way = Way::default();
/// way.push_node_ref("1");
/// way.push_node_ref("2");
/// way.push_node_ref("1");
/// way.insert_tag("highway", "residential");
///
/// assert!(way.is_circular());
/// assert_eq!(way.node_pairs().count(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Way {
    /// Referenced node identifiers in path order.
    pub node_refs: Vec<NodeId>,
    /// Tags attached to the way.
    pub tags: Tags,
}

impl Way {
    /// Construct a way from its node references and tags.
    pub fn new<I, S>(node_refs: I, tags: Tags) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<NodeId>,
    {
        Self {
            node_refs: node_refs.into_iter().map(Into::into).collect(),
            tags,
        }
    }

    /// Append a node reference.
    pub fn push_node_ref(&mut self, id: impl Into<NodeId>) {
        self.node_refs.push(id.into());
    }

    /// Insert a tag, replacing any previous value for the key.
    pub fn insert_tag(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.tags.insert(key.into(), value.into());
    }

    /// Number of node references.
    #[must_use]
    pub fn len(&self) -> usize {
        self.node_refs.len()
    }

    /// Whether the way references no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.node_refs.is_empty()
    }

    /// Whether the way closes on itself.
    ///
    /// A way is circular when it has at least two references and the first
    /// equals the last.
    #[must_use]
    pub fn is_circular(&self) -> bool {
        match (self.node_refs.first(), self.node_refs.last()) {
            (Some(first), Some(last)) if self.node_refs.len() >= 2 => first == last,
            _ => false,
        }
    }

    /// Consecutive node pairs along the way.
    pub fn node_pairs(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.node_refs.windows(2).filter_map(|pair| match pair {
            [from, to] => Some((from.as_str(), to.as_str())),
            _ => None,
        })
    }
}

impl fmt::Display for Way {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "way with {} nodes", self.len())?;
        if self.is_circular() {
            write!(f, " (circular)")?;
        }
        Ok(())
    }
}
