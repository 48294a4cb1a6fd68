//! Arena-backed phylogenetic tree model.
//!
//! # Overview
//! A [`Tree`] owns all of its [`Node`]s in a single `Vec`; nodes refer to each
//! other by [`NodeId`] (an index into that vector). Every node knows its parent,
//! which is what re-rooting needs, and its ordered children.
//!
//! ```text
//!          root (0)
//!         /        \
//!     Es_1 (1)    node (2)
//!                 /      \
//!             Bs_1 (3)  Cr_1 (4)
//! ```
//!
//! Tips are the nodes without children. A tip always carries a label; internal
//! nodes may carry one too (tree-inference tools write support values there).

/// Index of a node inside its [`Tree`].
pub type NodeId = usize;

/// A single node of a [`Tree`].
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Tip name, or an optional internal label such as a support value.
    pub label: Option<String>,
    /// Length of the edge leading to this node from its parent.
    pub branch_length: Option<f64>,
}

impl Node {
    fn new(parent: Option<NodeId>, label: Option<String>, branch_length: Option<f64>) -> Self {
        Node { parent, children: Vec::new(), label, branch_length }
    }
}

/// A rooted view of a phylogenetic tree.
///
/// Unrooted trees (e.g. a trifurcating top-level group in a Newick string) are
/// stored with their top-level group as the root; [`crate::rooting`] turns them
/// into properly rooted trees.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// Creates a tree consisting of a single unlabeled root node.
    ///
    /// # Example
    /// ```
    /// # use locus_topology::tree::Tree;
    /// let mut tree = Tree::new();
    /// let root = tree.root();
    /// tree.add_leaf(root, "Es_1", None);
    /// let inner = tree.add_child(root, None, Some(0.1));
    /// tree.add_leaf(inner, "Bs_1", Some(0.2));
    /// tree.add_leaf(inner, "Cr_1", Some(0.3));
    ///
    /// assert_eq!(tree.tip_labels(), vec!["Es_1", "Bs_1", "Cr_1"]);
    /// ```
    pub fn new() -> Self {
        Tree { nodes: vec![Node::new(None, None, None)], root: 0 }
    }

    /// Appends a new child under `parent` and returns its id.
    ///
    /// # Panics
    /// Panics if `parent` is not a node of this tree.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        label: Option<String>,
        branch_length: Option<f64>,
    ) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node::new(Some(parent), label, branch_length));
        self.nodes[parent].children.push(id);
        id
    }

    /// Appends a labeled tip under `parent`.
    pub fn add_leaf(&mut self, parent: NodeId, label: &str, branch_length: Option<f64>) -> NodeId {
        self.add_child(parent, Some(label.to_string()), branch_length)
    }

    pub fn set_label(&mut self, id: NodeId, label: Option<String>) {
        self.nodes[id].label = label;
    }

    pub fn set_branch_length(&mut self, id: NodeId, branch_length: Option<f64>) {
        self.nodes[id].branch_length = branch_length;
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Total number of nodes (tips and internal nodes).
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    #[inline]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    #[inline]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|n| n.parent)
    }

    #[inline]
    pub fn label(&self, id: NodeId) -> Option<&str> {
        self.nodes.get(id).and_then(|n| n.label.as_deref())
    }

    #[inline]
    pub fn branch_length(&self, id: NodeId) -> Option<f64> {
        self.nodes.get(id).and_then(|n| n.branch_length)
    }

    /// A node is a tip when it has no children. The root of a one-node tree
    /// counts as a tip.
    #[inline]
    pub fn is_leaf(&self, id: NodeId) -> bool {
        self.nodes.get(id).is_some_and(|n| n.children.is_empty())
    }

    /// Whether the root has exactly two children.
    pub fn is_bifurcating_root(&self) -> bool {
        self.children(self.root).len() == 2
    }

    /// All nodes reachable from the root in pre-order (parents before
    /// children, children left to right).
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.children(id).iter().rev());
        }
        order
    }

    /// All tips reachable from the root, left to right.
    ///
    /// The order is the Newick reading order and is stable across calls.
    pub fn terminals(&self) -> Vec<NodeId> {
        self.preorder().into_iter().filter(|&id| self.is_leaf(id)).collect()
    }

    /// First tip in [`terminals`](Self::terminals) order whose label satisfies
    /// `predicate`. Unlabeled tips are never matched.
    pub fn find_tip<P>(&self, mut predicate: P) -> Option<NodeId>
    where
        P: FnMut(&str) -> bool,
    {
        self.terminals()
            .into_iter()
            .find(|&id| self.label(id).is_some_and(&mut predicate))
    }

    /// Labels of all tips in [`terminals`](Self::terminals) order.
    pub fn tip_labels(&self) -> Vec<&str> {
        self.terminals()
            .into_iter()
            .filter_map(|id| self.label(id))
            .collect()
    }

    /// Serializes the tree as a Newick string terminated by `;`.
    pub fn to_newick(&self) -> String {
        crate::newick::write_newick(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// ```text
    ///        root
    ///      /  |   \
    ///   Es_1 Bs_1  n1
    ///             /  \
    ///          Cr_1  At_1
    /// ```
    fn unrooted_four_taxa() -> Tree {
        let mut tree = Tree::new();
        let root = tree.root();
        tree.add_leaf(root, "Es_1", Some(0.5));
        tree.add_leaf(root, "Bs_1", Some(0.1));
        let n1 = tree.add_child(root, Some("98".to_string()), Some(0.05));
        tree.add_leaf(n1, "Cr_1", Some(0.2));
        tree.add_leaf(n1, "At_1", Some(0.3));
        tree
    }

    #[test]
    fn test_terminals_are_left_to_right() {
        let tree = unrooted_four_taxa();
        assert_eq!(tree.tip_labels(), vec!["Es_1", "Bs_1", "Cr_1", "At_1"]);
        assert_eq!(tree.terminals(), tree.terminals());
        assert_eq!(tree.len(), 6);
    }

    #[test]
    fn test_find_tip() {
        let tree = unrooted_four_taxa();
        let cr = tree.find_tip(|l| l.starts_with("Cr_")).unwrap();
        assert_eq!(tree.label(cr), Some("Cr_1"));
        assert!(tree.is_leaf(cr));
        assert_eq!(tree.branch_length(cr), Some(0.2));
        assert!(tree.find_tip(|l| l.contains("Zz_")).is_none());
        // internal labels are not tips
        assert!(tree.find_tip(|l| l == "98").is_none());
    }

    #[test]
    fn test_parent_links() {
        let tree = unrooted_four_taxa();
        let at = tree.find_tip(|l| l == "At_1").unwrap();
        let n1 = tree.parent(at).unwrap();
        assert_eq!(tree.label(n1), Some("98"));
        assert_eq!(tree.parent(n1), Some(tree.root()));
        assert_eq!(tree.parent(tree.root()), None);
        assert!(!tree.is_bifurcating_root());
    }

    #[test]
    fn test_single_node_tree() {
        let tree = Tree::new();
        assert!(tree.is_leaf(tree.root()));
        assert!(tree.tip_labels().is_empty());
        assert_eq!(tree.terminals(), vec![tree.root()]);
    }
}
