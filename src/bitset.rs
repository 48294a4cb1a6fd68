//! Compact bitset representation for sets of tips.
//!
//! # Overview
//! Every tip of a tree gets a dense index; a clade (or any query set of tips)
//! is then a bitset where bit `i` says whether tip `i` belongs to it.
//!
//! # Example
//! For a tree with tips [Es_1, Bs_1, Cr_1, At_1] mapped to indices [0, 1, 2, 3]:
//! - Clade {Cr_1, At_1} → bitset `0b1100` (bits 2 and 3 set)
//! - Clade {Bs_1, Cr_1, At_1} → bitset `0b1110` (bits 1, 2, 3 set)

/// A compact bitset over tip indices.
///
/// Bits are stored in `Vec<u64>` words so trees of any size fit; each word
/// holds 64 tip indices. Two bitsets built with the same number of words
/// compare equal exactly when they contain the same tips.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Bitset(pub Vec<u64>);

impl Bitset {
    /// Creates a new bitset with all bits set to 0.
    ///
    /// # Parameters
    /// - `words`: Number of u64 words needed. Use [`Bitset::words_for`].
    ///
    /// # Example
    /// ```
    /// # use locus_topology::bitset::Bitset;
    /// let bs = Bitset::zeros(Bitset::words_for(100));
    /// assert_eq!(bs.0.len(), 2);
    /// assert!(bs.is_empty());
    /// ```
    pub fn zeros(words: usize) -> Self {
        Bitset(vec![0u64; words])
    }

    /// Number of words needed to hold `num_tips` bits.
    #[inline]
    pub fn words_for(num_tips: usize) -> usize {
        num_tips.div_ceil(64).max(1)
    }

    /// Builds a bitset from tip indices.
    ///
    /// # Example
    /// ```
    /// # use locus_topology::bitset::Bitset;
    /// let bs = Bitset::from_indices(1, [0, 3]);
    /// assert_eq!(bs.0[0], 0b1001);
    /// ```
    pub fn from_indices<I: IntoIterator<Item = usize>>(words: usize, indices: I) -> Self {
        let mut bs = Bitset::zeros(words);
        for idx in indices {
            bs.set(idx);
        }
        bs
    }

    /// Sets the bit at the given index to 1.
    ///
    /// # Example
    /// ```
    /// # use locus_topology::bitset::Bitset;
    /// let mut bs = Bitset::zeros(1);
    /// bs.set(0);
    /// bs.set(5);
    /// assert_eq!(bs.0[0], 0b00100001);
    /// ```
    #[inline]
    pub fn set(&mut self, idx: usize) {
        let word = idx >> 6;
        let bit = idx & 63;
        self.0[word] |= 1u64 << bit;
    }

    /// Performs bitwise OR with another bitset (union).
    ///
    /// # Example
    /// ```
    /// # use locus_topology::bitset::Bitset;
    /// let mut left = Bitset::from_indices(1, [0]);
    /// let right = Bitset::from_indices(1, [1]);
    /// left.or_assign(&right);
    /// assert_eq!(left.0[0], 0b11);
    /// ```
    #[inline]
    pub fn or_assign(&mut self, other: &Bitset) {
        for (a, b) in self.0.iter_mut().zip(&other.0) {
            *a |= *b;
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|&w| w == 0)
    }
}
