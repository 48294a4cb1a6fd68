//! Monophyly tests over memoized clade bitsets.
//!
//! # Overview
//! A [`CladeIndex`] is built once per rooted tree. Tips are numbered in
//! [`Tree::terminals`] order, then a single post-order pass ORs child bitsets
//! into their parents, so every node ends up with the bitset of the tips below
//! it. A set of tips is monophyletic iff its bitset equals one of those.
//!
//! ```text
//!          root            {Es,Bs,Cr,At} 0b1111
//!         /    \
//!      Es_1    n1          {Bs,Cr,At}    0b1110
//!             /  \
//!          Bs_1   n2       {Cr,At}       0b1100
//!                /  \
//!             Cr_1  At_1
//! ```

use crate::bitset::Bitset;
use crate::tree::{NodeId, Tree};
use std::collections::{HashMap, HashSet};

/// Descendant-tip sets of every node of one rooted tree.
#[derive(Debug, Clone)]
pub struct CladeIndex {
    /// Tip node id → bit position
    tip_index: HashMap<NodeId, usize>,
    /// All clade bitsets, for O(1) membership queries
    clade_set: HashSet<Bitset>,
    words: usize,
}

impl CladeIndex {
    /// Computes the clade of every node of `tree` in one post-order pass.
    pub fn new(tree: &Tree) -> Self {
        let tip_index: HashMap<NodeId, usize> = tree
            .terminals()
            .into_iter()
            .enumerate()
            .map(|(idx, id)| (id, idx))
            .collect();
        let words = Bitset::words_for(tip_index.len());

        let mut clades = vec![Bitset::zeros(words); tree.len()];
        // reversed pre-order visits children before their parents
        for id in tree.preorder().into_iter().rev() {
            if let Some(&idx) = tip_index.get(&id) {
                clades[id].set(idx);
                continue;
            }
            let mut clade = Bitset::zeros(words);
            for &child in tree.children(id) {
                clade.or_assign(&clades[child]);
            }
            clades[id] = clade;
        }

        let clade_set = clades.into_iter().filter(|c| !c.is_empty()).collect();
        CladeIndex { tip_index, clade_set, words }
    }

    /// Bitset of the given tips, or `None` if any id is not a tip.
    pub fn tip_set(&self, tips: &[NodeId]) -> Option<Bitset> {
        let indices = tips
            .iter()
            .map(|id| self.tip_index.get(id).copied())
            .collect::<Option<Vec<usize>>>()?;
        Some(Bitset::from_indices(self.words, indices))
    }

    /// Whether exactly `tips` (as a set) are the descendants of some node.
    ///
    /// An empty set is never a clade; ids that are not tips make the answer
    /// `false`. Repeated ids are treated as one.
    pub fn is_monophyletic(&self, tips: &[NodeId]) -> bool {
        if tips.is_empty() {
            return false;
        }
        self.tip_set(tips)
            .is_some_and(|set| self.clade_set.contains(&set))
    }
}

/// One-off monophyly test. Prefer building a [`CladeIndex`] when asking
/// several questions about the same tree.
pub fn is_monophyletic(tree: &Tree, tips: &[NodeId]) -> bool {
    CladeIndex::new(tree).is_monophyletic(tips)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::newick::parse_newick;

    fn tips(tree: &Tree, labels: &[&str]) -> Vec<NodeId> {
        labels
            .iter()
            .map(|l| tree.find_tip(|t| t == *l).unwrap())
            .collect()
    }

    #[test]
    fn test_pairs_in_caterpillar() {
        let tree = parse_newick("(Es_1,(Bs_1,(Cr_1,At_1)));").unwrap();
        let index = CladeIndex::new(&tree);
        assert!(index.is_monophyletic(&tips(&tree, &["Cr_1", "At_1"])));
        assert!(index.is_monophyletic(&tips(&tree, &["At_1", "Cr_1"])));
        assert!(!index.is_monophyletic(&tips(&tree, &["Bs_1", "Cr_1"])));
        assert!(!index.is_monophyletic(&tips(&tree, &["Bs_1", "At_1"])));
        assert!(index.is_monophyletic(&tips(&tree, &["Bs_1", "Cr_1", "At_1"])));
        assert!(!index.is_monophyletic(&tips(&tree, &["Es_1", "Bs_1"])));
    }

    #[test]
    fn test_trivial_sets() {
        let tree = parse_newick("(Es_1,(Bs_1,(Cr_1,At_1)));").unwrap();
        let index = CladeIndex::new(&tree);
        for label in ["Es_1", "Bs_1", "Cr_1", "At_1"] {
            assert!(index.is_monophyletic(&tips(&tree, &[label])));
        }
        assert!(index.is_monophyletic(&tree.terminals()));
        assert!(!index.is_monophyletic(&[]));
    }

    #[test]
    fn test_non_tip_ids() {
        let tree = parse_newick("(Es_1,(Bs_1,(Cr_1,At_1)));").unwrap();
        let inner = tree.children(tree.root())[1];
        assert!(!is_monophyletic(&tree, &[inner]));
        assert!(!is_monophyletic(&tree, &[1000]));
    }

    #[test]
    fn test_multifurcation_has_no_pair_clade() {
        let tree = parse_newick("(Es_1,(Bs_1,Cr_1,At_1));").unwrap();
        let index = CladeIndex::new(&tree);
        assert!(!index.is_monophyletic(&tips(&tree, &["Bs_1", "Cr_1"])));
        assert!(!index.is_monophyletic(&tips(&tree, &["Bs_1", "At_1"])));
        assert!(!index.is_monophyletic(&tips(&tree, &["Cr_1", "At_1"])));
        assert!(index.is_monophyletic(&tips(&tree, &["Bs_1", "Cr_1", "At_1"])));
    }

    #[test]
    fn test_tip_sets() {
        let tree = parse_newick("(Es_1,(Bs_1,(Cr_1,At_1)));").unwrap();
        let index = CladeIndex::new(&tree);
        let bits = |ids: Vec<NodeId>| index.tip_set(&ids).unwrap().0[0];
        assert_eq!(bits(tree.terminals()), 0b1111);
        assert_eq!(bits(tips(&tree, &["Bs_1", "Cr_1", "At_1"])), 0b1110);
        assert_eq!(bits(tips(&tree, &["At_1", "Cr_1"])), 0b1100);
        assert_eq!(bits(tips(&tree, &["Cr_1", "Cr_1"])), 0b0100);
        let inner = tree.children(tree.root())[1];
        assert!(index.tip_set(&[inner]).is_none());
    }

    #[test]
    fn test_more_than_64_tips() {
        let labels: Vec<String> = (0..70).map(|i| format!("t{i}")).collect();
        let text = format!("(({},{}),({}));", labels[68], labels[69], labels[..68].join(","));
        let tree = parse_newick(&text).unwrap();
        let index = CladeIndex::new(&tree);
        assert!(index.is_monophyletic(&tips(&tree, &["t68", "t69"])));
        let first: Vec<&str> = labels[..68].iter().map(String::as_str).collect();
        assert!(index.is_monophyletic(&tips(&tree, &first)));
        assert!(!index.is_monophyletic(&tips(&tree, &["t0", "t69"])));
    }
}
