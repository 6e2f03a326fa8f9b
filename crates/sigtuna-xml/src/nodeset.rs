#![forbid(unsafe_code)]

//! NodeSet type for document-subset serialization.
//!
//! A `NodeSet` records which nodes of a parsed document are part of the
//! output. Filter transforms prune a document by subtracting whole
//! subtrees from the set; the canonical serializer then skips every node
//! that is not a member. This produces the same bytes as removing the
//! nodes from the tree, without mutating the tree.

use std::collections::HashSet;

/// A set of XML document nodes, identified by their `roxmltree` node index.
#[derive(Debug, Clone, Default)]
pub struct NodeSet {
    nodes: HashSet<usize>,
}

impl NodeSet {
    /// Create an empty node set.
    pub fn new() -> Self {
        Self {
            nodes: HashSet::new(),
        }
    }

    /// Create a node set containing every node of the document,
    /// including the root node itself.
    pub fn all(doc: &roxmltree::Document<'_>) -> Self {
        let nodes = doc
            .root()
            .descendants()
            .map(|n| n.id().get_usize())
            .collect();
        Self { nodes }
    }

    /// Check membership of a node.
    pub fn contains(&self, node: roxmltree::Node<'_, '_>) -> bool {
        self.nodes.contains(&node.id().get_usize())
    }

    /// Remove a node and all of its descendants from the set.
    pub fn remove_subtree(&mut self, node: roxmltree::Node<'_, '_>) {
        for n in node.descendants() {
            self.nodes.remove(&n.id().get_usize());
        }
    }

    /// Number of nodes in the set.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_covers_every_node() {
        let doc = roxmltree::Document::parse("<r><a><b/></a><c/></r>").unwrap();
        let set = NodeSet::all(&doc);
        for node in doc.root().descendants() {
            assert!(set.contains(node));
        }
    }

    #[test]
    fn remove_subtree_removes_descendants() {
        let doc = roxmltree::Document::parse("<r><a><b/></a><c/></r>").unwrap();
        let mut set = NodeSet::all(&doc);
        let a = doc
            .descendants()
            .find(|n| n.has_tag_name("a"))
            .unwrap();
        set.remove_subtree(a);

        let b = doc.descendants().find(|n| n.has_tag_name("b")).unwrap();
        let c = doc.descendants().find(|n| n.has_tag_name("c")).unwrap();
        assert!(!set.contains(a));
        assert!(!set.contains(b));
        assert!(set.contains(c));
    }
}
