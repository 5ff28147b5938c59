//! Round-robin block placement over a fixed set of logical nodes.
//!
//! Nodes are labels, not endpoints: the assignment decides where a block
//! *would* live and feeds logs and bookkeeping, while retrieval is keyed by
//! `(base key, index)` alone. Changing the node list between a distribute and
//! a later reconstruct therefore changes what gets logged, never which bytes
//! are fetched.

use std::fmt;

/// A logical storage target label.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Node(String);

impl Node {
    /// Create a node label.
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// The label as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Node {
    fn from(label: &str) -> Self {
        Self::new(label)
    }
}

impl From<String> for Node {
    fn from(label: String) -> Self {
        Self::new(label)
    }
}

/// A validated, non-empty, ordered list of nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSet(Vec<Node>);

impl NodeSet {
    /// Build a node set from an ordered list of labels.
    ///
    /// Returns `None` for an empty list; placement over zero nodes is a
    /// configuration error the caller surfaces before any operation starts.
    pub fn new<I>(nodes: I) -> Option<Self>
    where
        I: IntoIterator,
        I::Item: Into<Node>,
    {
        let nodes: Vec<Node> = nodes.into_iter().map(Into::into).collect();
        (!nodes.is_empty()).then_some(Self(nodes))
    }

    /// Number of nodes in the set.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set is empty. Always `false` for a constructed set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Deterministic round-robin assignment: `nodes[index mod len]`.
    pub fn assign(&self, index: u64) -> &Node {
        let slot = (index % self.0.len() as u64) as usize;
        &self.0[slot]
    }
}
