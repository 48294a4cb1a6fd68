//! Topology labels and their tally.

use crate::rules::{Lineage, LineageRules};
use std::fmt;

/// Which pair of ingroup lineages are sisters in a rooted tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Topology {
    PairAB,
    PairAC,
    PairBC,
    /// No pair forms a clade (or the tree could not be classified).
    Unknown,
}

impl Topology {
    pub const ALL: [Topology; 4] =
        [Topology::PairAB, Topology::PairAC, Topology::PairBC, Topology::Unknown];

    /// Resolved pairs in the order they are tested.
    pub const PAIRS: [Topology; 3] = [Topology::PairAB, Topology::PairAC, Topology::PairBC];

    /// The two sister lineages, `None` for [`Topology::Unknown`].
    pub fn pair(self) -> Option<(Lineage, Lineage)> {
        match self {
            Topology::PairAB => Some((Lineage::A, Lineage::B)),
            Topology::PairAC => Some((Lineage::A, Lineage::C)),
            Topology::PairBC => Some((Lineage::B, Lineage::C)),
            Topology::Unknown => None,
        }
    }

    /// Short code used in tabular output ("12top", "13top", "23top").
    pub fn code(self) -> &'static str {
        match self {
            Topology::PairAB => "12top",
            Topology::PairAC => "13top",
            Topology::PairBC => "23top",
            Topology::Unknown => "Unknown",
        }
    }

    /// Human readable description using the lineage names of `rules`,
    /// e.g. "B. str and C. rub sister".
    pub fn describe(self, rules: &LineageRules) -> String {
        match self.pair() {
            Some((x, y)) => {
                format!("{} and {} sister", rules.display_name(x), rules.display_name(y))
            }
            None => "Unknown topologies".to_string(),
        }
    }

    #[inline]
    fn slot(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Topology::PairAB => "PairAB",
            Topology::PairAC => "PairAC",
            Topology::PairBC => "PairBC",
            Topology::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

/// Count of trees per [`Topology`], all four labels starting at zero.
///
/// Tallies from independent workers combine with [`Tally::merge`], which is
/// commutative and associative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    counts: [usize; 4],
}

impl Tally {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn increment(&mut self, topology: Topology) {
        self.counts[topology.slot()] += 1;
    }

    #[inline]
    pub fn get(&self, topology: Topology) -> usize {
        self.counts[topology.slot()]
    }

    /// Number of trees counted.
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Number of trees with a resolved sister pair.
    pub fn resolved(&self) -> usize {
        self.total() - self.get(Topology::Unknown)
    }

    pub fn merge(mut self, other: Tally) -> Tally {
        for (a, b) in self.counts.iter_mut().zip(other.counts) {
            *a += b;
        }
        self
    }

    /// `(label, count)` for all four labels, in [`Topology::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (Topology, usize)> + '_ {
        Topology::ALL.into_iter().map(|t| (t, self.get(t)))
    }

    /// Plain-text summary with one line per label.
    pub fn summary(&self, rules: &LineageRules) -> String {
        let mut out = String::from("--- Topology Summary ---\n");
        for (topology, count) in self.iter() {
            out.push_str(&format!("{}: {}\n", topology.describe(rules), count));
        }
        out
    }
}

impl Extend<Topology> for Tally {
    fn extend<I: IntoIterator<Item = Topology>>(&mut self, iter: I) {
        for topology in iter {
            self.increment(topology);
        }
    }
}

impl FromIterator<Topology> for Tally {
    fn from_iter<I: IntoIterator<Item = Topology>>(iter: I) -> Self {
        let mut tally = Tally::new();
        tally.extend(iter);
        tally
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tally_counts() {
        let tally: Tally = [Topology::PairAB, Topology::Unknown, Topology::PairAB]
            .into_iter()
            .collect();
        assert_eq!(tally.get(Topology::PairAB), 2);
        assert_eq!(tally.get(Topology::PairAC), 0);
        assert_eq!(tally.get(Topology::Unknown), 1);
        assert_eq!(tally.total(), 3);
        assert_eq!(tally.resolved(), 2);
    }

    #[test]
    fn test_merge_is_order_independent() {
        let a: Tally = [Topology::PairAB, Topology::PairBC].into_iter().collect();
        let b: Tally = [Topology::PairBC, Topology::Unknown].into_iter().collect();
        let c: Tally = [Topology::PairAC].into_iter().collect();
        assert_eq!(a.merge(b), b.merge(a));
        assert_eq!(a.merge(b).merge(c), a.merge(b.merge(c)));
        assert_eq!(a.merge(Tally::new()), a);
        assert_eq!(a.merge(b).merge(c).total(), 5);
    }

    #[test]
    fn test_iter_lists_all_labels() {
        let tally = Tally::new();
        let labels: Vec<(Topology, usize)> = tally.iter().collect();
        assert_eq!(labels.len(), 4);
        assert!(labels.iter().all(|&(_, n)| n == 0));
    }

    #[test]
    fn test_summary_uses_lineage_names() {
        let tally: Tally = [Topology::PairBC, Topology::PairBC].into_iter().collect();
        let summary = tally.summary(&LineageRules::default());
        assert!(summary.starts_with("--- Topology Summary ---\n"));
        assert!(summary.contains("C. rub and A. tha sister: 2\n"));
        assert!(summary.contains("B. str and C. rub sister: 0\n"));
        assert!(summary.contains("B. str and A. tha sister: 0\n"));
        assert!(summary.contains("Unknown topologies: 0\n"));
    }

    #[test]
    fn test_codes_and_display() {
        assert_eq!(Topology::PairAB.code(), "12top");
        assert_eq!(Topology::PairBC.to_string(), "PairBC");
        assert_eq!(Topology::Unknown.pair(), None);
    }
}
