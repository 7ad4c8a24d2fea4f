//! Node identifiers for the circuit graph.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of an electrically common connection point.
///
/// Node 0 is the fixed reference (ground). All other nodes are arbitrary
/// positive integers assigned by whoever produced the component list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// The ground node (node 0).
    pub const GROUND: NodeId = NodeId(0);

    /// Create a new NodeId from a raw value.
    pub fn new(id: u32) -> Self {
        NodeId(id)
    }

    /// Get the raw node ID value.
    pub fn as_u32(self) -> u32 {
        self.0
    }

    /// Raw value as an index into per-node tables (union-find parents etc).
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Check if this is the ground node.
    pub fn is_ground(self) -> bool {
        self.0 == 0
    }

    /// Row/column of this node in an MNA matrix.
    ///
    /// Ground is not part of the matrix, so node `n` lives at `n - 1`.
    pub fn mna_index(self) -> Option<usize> {
        if self.is_ground() {
            None
        } else {
            Some(self.0 as usize - 1)
        }
    }
}

impl From<u32> for NodeId {
    fn from(id: u32) -> Self {
        NodeId(id)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_ground() {
            write!(f, "GND")
        } else {
            write!(f, "{}", self.0)
        }
    }
}
