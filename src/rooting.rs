//! Outgroup rooting.
//!
//! # Algorithm
//! 1. Forget the current root: view the tree as an undirected graph. A root
//!    with two children is suppressed and its two edges are merged into one
//!    (lengths summed); a root with a single child is dropped.
//! 2. Take the edge between the outgroup tip and its only neighbour and put
//!    a new root at its midpoint.
//! 3. Rebuild the tree from the new root, orienting every edge away from it.
//!
//! ```text
//!   unrooted input            rooted on Es_1
//!
//!   Es_1   Cr_1                  root
//!      \   /                    /    \
//!       n--n                 Es_1     n
//!      /    \                        / \
//!   Bs_1    At_1                  Bs_1  n
//!                                      / \
//!                                   Cr_1 At_1
//! ```

use crate::tree::{NodeId, Tree};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RootingError {
    #[error("node {0} is not a tip of the tree")]
    NotATip(NodeId),
    #[error("tree has {0} tip(s), at least two are needed to root it")]
    TooFewTips(usize),
}

/// Undirected adjacency list: `(neighbour, length of the connecting edge)`.
type Adjacency = Vec<Vec<(NodeId, Option<f64>)>>;

/// Returns a copy of `tree` rooted on the edge leading to `outgroup`.
///
/// The new root has exactly two children: the outgroup tip and the node that
/// carries all remaining tips. The outgroup edge is split in half. Labels and
/// branch lengths of all other nodes are kept.
///
/// If `outgroup` already hangs directly off a bifurcating root, the tree is
/// returned unchanged.
///
/// # Errors
/// - [`RootingError::NotATip`] if `outgroup` is not a tip of `tree`
/// - [`RootingError::TooFewTips`] if the tree has fewer than two tips
///
/// # Example
/// ```
/// # use locus_topology::newick::parse_newick;
/// # use locus_topology::rooting::root_with_outgroup;
/// let tree = parse_newick("(Bs_1,Es_1,(Cr_1,At_1));").unwrap();
/// let es = tree.find_tip(|l| l == "Es_1").unwrap();
/// let rooted = root_with_outgroup(&tree, es).unwrap();
/// assert_eq!(rooted.to_newick(), "(Es_1,(Bs_1,(Cr_1,At_1)));");
/// ```
pub fn root_with_outgroup(tree: &Tree, outgroup: NodeId) -> Result<Tree, RootingError> {
    if !tree.is_leaf(outgroup) || tree.len() <= 1 {
        return Err(RootingError::NotATip(outgroup));
    }
    let num_tips = tree.terminals().len();
    if num_tips < 2 {
        return Err(RootingError::TooFewTips(num_tips));
    }

    if tree.parent(outgroup) == Some(tree.root()) && tree.is_bifurcating_root() {
        return Ok(tree.clone());
    }

    let adjacency = unrooted_adjacency(tree);
    let &[(neighbour, edge_length)] = adjacency[outgroup].as_slice() else {
        return Err(RootingError::TooFewTips(num_tips));
    };
    let half = edge_length.map(|l| l / 2.0);

    let mut rooted = Tree::new();
    let root = rooted.root();
    rooted.add_child(root, tree.node(outgroup).and_then(|n| n.label.clone()), half);
    copy_away_from(tree, &adjacency, &mut rooted, root, neighbour, outgroup, half);
    Ok(rooted)
}

/// Builds the undirected view of `tree` with the old root suppressed when it
/// has degree two or less. Each node lists its children first, in order,
/// followed by its parent.
fn unrooted_adjacency(tree: &Tree) -> Adjacency {
    let old_root = tree.root();
    let root_children = tree.children(old_root);
    let drop_root = root_children.len() <= 2;

    let mut adjacency: Adjacency = vec![Vec::new(); tree.len()];
    for id in tree.preorder() {
        if id == old_root && drop_root {
            continue;
        }
        for &child in tree.children(id) {
            adjacency[id].push((child, tree.branch_length(child)));
        }
        if let Some(parent) = tree.parent(id) {
            if !(parent == old_root && drop_root) {
                adjacency[id].push((parent, tree.branch_length(id)));
            }
        }
    }

    if let &[left, right] = root_children {
        let merged = merge_lengths(tree.branch_length(left), tree.branch_length(right));
        adjacency[left].push((right, merged));
        adjacency[right].push((left, merged));
    }
    adjacency
}

fn merge_lengths(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (None, None) => None,
        (a, b) => Some(a.unwrap_or(0.0) + b.unwrap_or(0.0)),
    }
}

/// Copies the part of the old tree reachable from `old` without passing
/// through `from`, attaching it under `new_parent`.
///
/// Walks depth-first with an explicit stack, so node ids come out in
/// pre-order and children keep their adjacency order.
fn copy_away_from(
    tree: &Tree,
    adjacency: &Adjacency,
    rooted: &mut Tree,
    new_parent: NodeId,
    old: NodeId,
    from: NodeId,
    branch_length: Option<f64>,
) {
    // (parent in the new tree, node of the old tree, node we came from, edge length)
    let mut stack = vec![(new_parent, old, from, branch_length)];
    while let Some((parent, old, from, length)) = stack.pop() {
        let label = tree.node(old).and_then(|n| n.label.clone());
        let id = rooted.add_child(parent, label, length);
        stack.extend(
            adjacency[old]
                .iter()
                .rev()
                .filter(|&&(next, _)| next != from)
                .map(|&(next, length)| (id, next, old, length)),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::newick::parse_newick;

    fn rooted_on(text: &str, outgroup: &str) -> Tree {
        let tree = parse_newick(text).unwrap();
        let tip = tree.find_tip(|l| l == outgroup).unwrap();
        root_with_outgroup(&tree, tip).unwrap()
    }

    #[test]
    fn test_outgroup_is_basal_split() {
        let rooted = rooted_on("((Bs_1,Es_1),(Cr_1,At_1));", "Es_1");
        let root = rooted.root();
        assert!(rooted.is_bifurcating_root());
        let [left, right] = rooted.children(root) else { panic!("root must bifurcate") };
        assert_eq!(rooted.label(*left), Some("Es_1"));
        assert_eq!(rooted.children(*right).len(), 2);
        assert_eq!(rooted.to_newick(), "(Es_1,(Bs_1,(Cr_1,At_1)));");
    }

    #[test]
    fn test_unrooted_trifurcation() {
        let rooted = rooted_on("(Bs_1,(Cr_1,At_1),Es_1);", "Es_1");
        assert_eq!(rooted.to_newick(), "(Es_1,(Bs_1,(Cr_1,At_1)));");
    }

    #[test]
    fn test_outgroup_deep_inside() {
        let rooted = rooted_on("(Bs_1,(Cr_1,(At_1,Es_1)));", "Es_1");
        assert_eq!(rooted.to_newick(), "(Es_1,(At_1,(Cr_1,Bs_1)));");
        assert_eq!(rooted.tip_labels().len(), 4);
    }

    #[test]
    fn test_branch_lengths_split_and_merged() {
        let rooted = rooted_on(
            "((Bs_1:1,Es_1:4)80:0.5,(Cr_1:1,At_1:1)90:1.5);",
            "Es_1",
        );
        let es = rooted.find_tip(|l| l == "Es_1").unwrap();
        assert_eq!(rooted.branch_length(es), Some(2.0));
        let ingroup = rooted.children(rooted.root())[1];
        assert_eq!(rooted.branch_length(ingroup), Some(2.0));
        assert_eq!(rooted.label(ingroup), Some("80"));
        // the two root edges become one edge of length 2.0
        let inner = rooted.children(ingroup)[1];
        assert_eq!(rooted.label(inner), Some("90"));
        assert_eq!(rooted.branch_length(inner), Some(2.0));
        assert_eq!(
            rooted.to_newick(),
            "(Es_1:2,(Bs_1:1,(Cr_1:1,At_1:1)90:2)80:2);"
        );
    }

    #[test]
    fn test_already_rooted_is_noop() {
        let tree = parse_newick("(Es_1:0.2,(Bs_1,(Cr_1,At_1)):0.3);").unwrap();
        let es = tree.find_tip(|l| l == "Es_1").unwrap();
        let rooted = root_with_outgroup(&tree, es).unwrap();
        assert_eq!(rooted, tree);
    }

    #[test]
    fn test_rooting_twice_is_stable() {
        let once = rooted_on("(Bs_1,(Cr_1,At_1),Es_1);", "Es_1");
        let es = once.find_tip(|l| l == "Es_1").unwrap();
        let twice = root_with_outgroup(&once, es).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_errors() {
        let tree = parse_newick("(Es_1,(Bs_1,Cr_1));").unwrap();
        let inner = tree.children(tree.root())[1];
        assert_eq!(root_with_outgroup(&tree, inner), Err(RootingError::NotATip(inner)));
        assert_eq!(root_with_outgroup(&tree, 99), Err(RootingError::NotATip(99)));

        let single = parse_newick("(Es_1);").unwrap();
        let es = single.find_tip(|l| l == "Es_1").unwrap();
        assert_eq!(root_with_outgroup(&single, es), Err(RootingError::TooFewTips(1)));
    }
}
