//! Tag key frequency tabulation.

use std::collections::HashMap;

use crate::way::Way;

/// A tag key with the number of ways carrying it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagCount {
    /// Tag key.
    pub key: String,
    /// Ways carrying the key.
    pub count: u64,
}

/// Running count of tag keys across ways.
#[derive(Debug, Clone, Default)]
pub struct TagTally {
    counts: HashMap<String, u64>,
}

impl TagTally {
    /// Count every tag key of `way` once.
    pub fn observe(&mut self, way: &Way) {
        for key in way.tags.keys() {
            match self.counts.get_mut(key) {
                Some(count) => *count += 1,
                None => {
                    self.counts.insert(key.clone(), 1);
                }
            }
        }
    }

    /// Number of distinct keys seen.
    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Whether no keys were seen.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Keys by descending count, ties broken alphabetically.
    #[must_use]
    pub fn sorted_desc(&self) -> Vec<TagCount> {
        let mut sorted: Vec<TagCount> = self
            .counts
            .iter()
            .map(|(key, count)| TagCount {
                key: key.clone(),
                count: *count,
            })
            .collect();
        sorted.sort_by(|left, right| {
            right
                .count
                .cmp(&left.count)
                .then_with(|| left.key.cmp(&right.key))
        });
        sorted
    }
}
