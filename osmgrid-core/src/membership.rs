//! Accepted-node membership indices.
//!
//! Points that pass the spatial filter are recorded here so that way
//! processing can decide which node pairs become edges. Two interchangeable
//! implementations exist:
//! - [`ExactIndex`] keeps every identifier in a hash set;
//! - [`BloomIndex`] wraps a `bloomfilter` bit array whose memory does not
//!   depend on identifier length, at the cost of a bounded false-positive rate.
//!
//! Records are irreversible: neither index supports removal.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use bloomfilter::Bloom;
use log::debug;

use crate::error::ConfigError;

/// Default capacity hint, sized for a city-scale extract.
pub const DEFAULT_EXPECTED_ITEMS: usize = 60_000;

/// Default Bloom filter false-positive rate.
pub const DEFAULT_FALSE_POSITIVE_RATE: f64 = 0.01;

/// Set of accepted node identifiers.
pub trait MembershipIndex {
    /// Mark an identifier as accepted.
    fn record(&mut self, id: &str);

    /// Whether the identifier may have been recorded.
    ///
    /// Never returns `false` for a recorded identifier. Approximate
    /// implementations may return `true` for identifiers never recorded.
    fn might_contain(&self, id: &str) -> bool;

    /// Number of `record` calls that added a new identifier.
    ///
    /// Approximate implementations count insertions the filter did not
    /// already report as present, so duplicates are ignored but a false
    /// positive can hide a genuinely new identifier.
    fn recorded(&self) -> usize;
}

/// Hash-set backed index with no false positives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExactIndex {
    ids: HashSet<String>,
}

impl ExactIndex {
    /// Create an empty index with room for `capacity` identifiers.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            ids: HashSet::with_capacity(capacity),
        }
    }
}

impl MembershipIndex for ExactIndex {
    fn record(&mut self, id: &str) {
        if !self.ids.contains(id) {
            self.ids.insert(id.to_owned());
        }
    }

    fn might_contain(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    fn recorded(&self) -> usize {
        self.ids.len()
    }
}

/// Bloom filter over identifier strings, backed by [`bloomfilter::Bloom`].
///
/// # Examples
/// ```
/// use osmgrid_core::{BloomIndex, MembershipIndex};
///
/// # fn main() -> Result<(), osmgrid_core::ConfigError> {
/// let mut index = BloomIndex::new(1_000, 0.01)?;
/// index.record("123");
/// assert!(index.might_contain("123"));
/// # Ok(())
/// # }
/// ```
pub struct BloomIndex {
    filter: Bloom<str>,
    inserted: usize,
}

impl BloomIndex {
    /// Size a filter for `expected_items` at the target false-positive rate.
    ///
    /// The rate must lie in the open interval `(0, 1)`; use [`ExactIndex`]
    /// when false positives are unacceptable.
    pub fn new(expected_items: usize, false_positive_rate: f64) -> Result<Self, ConfigError> {
        if expected_items == 0 {
            return Err(ConfigError::ZeroExpectedItems);
        }
        if !(false_positive_rate > 0.0 && false_positive_rate < 1.0) {
            return Err(ConfigError::InvalidFalsePositiveRate {
                rate: false_positive_rate,
            });
        }
        let filter = Bloom::new_for_fp_rate(expected_items, false_positive_rate);
        debug!(
            "sized Bloom filter: {} bits, {} hashes for {expected_items} items at p={false_positive_rate}",
            filter.number_of_bits(),
            filter.number_of_hash_functions()
        );
        Ok(Self {
            filter,
            inserted: 0,
        })
    }

    /// Number of bits in the filter.
    #[must_use]
    pub fn bit_count(&self) -> u64 {
        self.filter.number_of_bits()
    }

    /// Number of hash functions applied per identifier.
    #[must_use]
    pub fn hash_count(&self) -> u32 {
        self.filter.number_of_hash_functions()
    }
}

impl fmt::Debug for BloomIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BloomIndex")
            .field("bits", &self.bit_count())
            .field("hashes", &self.hash_count())
            .field("inserted", &self.inserted)
            .finish()
    }
}

impl MembershipIndex for BloomIndex {
    fn record(&mut self, id: &str) {
        if !self.filter.check_and_set(id) {
            self.inserted += 1;
        }
    }

    fn might_contain(&self, id: &str) -> bool {
        self.filter.check(id)
    }

    fn recorded(&self) -> usize {
        self.inserted
    }
}

/// Selects the membership index implementation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MembershipMode {
    /// Hash-set membership without false positives.
    Exact,
    /// Bloom-filter membership with a bounded false-positive rate.
    #[default]
    Approximate,
}

impl FromStr for MembershipMode {
    type Err = ConfigError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "exact" => Ok(Self::Exact),
            "approximate" | "bloom" => Ok(Self::Approximate),
            _ => Err(ConfigError::UnknownMembershipMode(raw.to_owned())),
        }
    }
}

/// Membership index settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MembershipConfig {
    mode: MembershipMode,
    expected_items: usize,
    false_positive_rate: f64,
}

impl Default for MembershipConfig {
    fn default() -> Self {
        Self {
            mode: MembershipMode::Approximate,
            expected_items: DEFAULT_EXPECTED_ITEMS,
            false_positive_rate: DEFAULT_FALSE_POSITIVE_RATE,
        }
    }
}

impl MembershipConfig {
    /// Exact membership with a capacity hint.
    #[must_use]
    pub const fn exact(expected_items: usize) -> Self {
        Self {
            mode: MembershipMode::Exact,
            expected_items,
            false_positive_rate: 0.0,
        }
    }

    /// Approximate membership sized for `expected_items` at `false_positive_rate`.
    ///
    /// A rate of exactly zero is accepted and resolves to an exact index when
    /// built, since no Bloom filter can guarantee it.
    pub fn approximate(expected_items: usize, false_positive_rate: f64) -> Result<Self, ConfigError> {
        if expected_items == 0 {
            return Err(ConfigError::ZeroExpectedItems);
        }
        if !(0.0..1.0).contains(&false_positive_rate) {
            return Err(ConfigError::InvalidFalsePositiveRate {
                rate: false_positive_rate,
            });
        }
        Ok(Self {
            mode: MembershipMode::Approximate,
            expected_items,
            false_positive_rate,
        })
    }

    /// Configured mode.
    #[must_use]
    pub const fn mode(&self) -> MembershipMode {
        self.mode
    }

    /// Expected number of accepted identifiers.
    #[must_use]
    pub const fn expected_items(&self) -> usize {
        self.expected_items
    }

    /// Target false-positive rate (zero for exact mode).
    #[must_use]
    pub const fn false_positive_rate(&self) -> f64 {
        self.false_positive_rate
    }
}

/// The accepted-node set selected by a [`MembershipConfig`].
#[derive(Debug)]
pub enum AcceptedNodes {
    /// Exact hash-set membership.
    Exact(ExactIndex),
    /// Bloom-filter membership.
    Approximate(BloomIndex),
}

impl Default for AcceptedNodes {
    fn default() -> Self {
        Self::Exact(ExactIndex::default())
    }
}

impl AcceptedNodes {
    /// Build the index described by `config`.
    pub fn from_config(config: &MembershipConfig) -> Result<Self, ConfigError> {
        match config.mode {
            MembershipMode::Exact => Ok(Self::Exact(ExactIndex::with_capacity(
                config.expected_items,
            ))),
            MembershipMode::Approximate if config.false_positive_rate == 0.0 => {
                debug!("false-positive rate 0 requested; using exact membership");
                Ok(Self::Exact(ExactIndex::with_capacity(config.expected_items)))
            }
            MembershipMode::Approximate => Ok(Self::Approximate(BloomIndex::new(
                config.expected_items,
                config.false_positive_rate,
            )?)),
        }
    }
}

impl MembershipIndex for AcceptedNodes {
    fn record(&mut self, id: &str) {
        match self {
            Self::Exact(index) => index.record(id),
            Self::Approximate(index) => index.record(id),
        }
    }

    fn might_contain(&self, id: &str) -> bool {
        match self {
            Self::Exact(index) => index.might_contain(id),
            Self::Approximate(index) => index.might_contain(id),
        }
    }

    fn recorded(&self) -> usize {
        match self {
            Self::Exact(index) => index.recorded(),
            Self::Approximate(index) => index.recorded(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn exact_index_has_no_false_positives() {
        let mut index = ExactIndex::default();
        index.record("1");
        index.record("1");
        assert!(index.might_contain("1"));
        assert!(!index.might_contain("2"));
        assert_eq!(index.recorded(), 1);
    }

    #[rstest]
    fn bloom_index_never_forgets() {
        let mut index = BloomIndex::new(500, 0.01).expect("valid filter");
        let ids: Vec<String> = (0..500).map(|n| n.to_string()).collect();
        for id in &ids {
            index.record(id);
        }
        assert!(ids.iter().all(|id| index.might_contain(id)));
    }

    #[rstest]
    fn bloom_index_counts_repeated_records_once() {
        let mut index = BloomIndex::new(100, 0.01).expect("valid filter");
        index.record("42");
        index.record("42");
        index.record("43");
        assert_eq!(index.recorded(), 2);
    }

    #[rstest]
    fn bloom_false_positive_rate_stays_near_target() {
        let mut index = BloomIndex::new(10_000, 0.01).expect("valid filter");
        for n in 0..10_000 {
            index.record(&format!("node-{n}"));
        }
        let false_positives = (0..10_000)
            .filter(|n| index.might_contain(&format!("other-{n}")))
            .count();
        // 1% target; allow generous slack to keep the test deterministic-safe.
        assert!(
            false_positives < 300,
            "observed {false_positives} false positives out of 10000"
        );
    }

    #[rstest]
    fn bloom_sizing_matches_reference_parameters() {
        let index = BloomIndex::new(60_000, 0.01).expect("valid filter");
        assert_eq!(index.hash_count(), 7);
        assert!((575_000..576_000).contains(&index.bit_count()));
    }

    #[rstest]
    #[case(0.0)]
    #[case(1.0)]
    #[case(-0.5)]
    #[case(f64::NAN)]
    fn bloom_rejects_invalid_rates(#[case] rate: f64) {
        assert!(matches!(
            BloomIndex::new(10, rate),
            Err(ConfigError::InvalidFalsePositiveRate { .. })
        ));
    }

    #[rstest]
    fn bloom_rejects_zero_capacity() {
        assert_eq!(BloomIndex::new(0, 0.1), Err(ConfigError::ZeroExpectedItems));
    }

    #[rstest]
    fn zero_rate_resolves_to_exact_index() {
        let config = MembershipConfig::approximate(100, 0.0).expect("zero rate allowed");
        let index = AcceptedNodes::from_config(&config).expect("build index");
        assert!(matches!(index, AcceptedNodes::Exact(_)));
    }

    #[rstest]
    fn positive_rate_resolves_to_bloom_index() {
        let config = MembershipConfig::approximate(100, 0.05).expect("valid config");
        let index = AcceptedNodes::from_config(&config).expect("build index");
        assert!(matches!(index, AcceptedNodes::Approximate(_)));
    }

    #[rstest]
    #[case("exact", MembershipMode::Exact)]
    #[case("Approximate", MembershipMode::Approximate)]
    #[case(" bloom ", MembershipMode::Approximate)]
    fn parses_mode_names(#[case] raw: &str, #[case] expected: MembershipMode) {
        assert_eq!(raw.parse::<MembershipMode>(), Ok(expected));
    }

    #[rstest]
    fn rejects_unknown_mode_names() {
        assert!(matches!(
            "fuzzy".parse::<MembershipMode>(),
            Err(ConfigError::UnknownMembershipMode(_))
        ));
    }
}
