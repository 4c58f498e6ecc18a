//! Lifetime management for nodes.
//!
//! Nodes are reference-counted.  The two states a node can be in map onto handles like
//! this:
//!
//! * **Anchored**: something outside the tree holds a [`Node`] handle to it.  An anchored
//!   node stays alive even after it is removed from its parent; this is how a caller keeps
//!   a detached node around to insert it elsewhere.  [`Node::anchor`] is the same as
//!   cloning the handle and [`Node::release`] the same as dropping it.
//!
//! * **Reachable**: the node is linked into a tree whose top is anchored.  Parents own
//!   their children, so a reachable node needs no handle of its own.
//!
//! When a node is neither, it is finalized: its data is dropped, which detaches its
//! children (finalizing them too unless they are anchored) and decrements the document's
//! [`live_node_count`](crate::Document::live_node_count).  Finalization happens at the
//! moment the last strong reference goes away; there is no deferred collection pass.
//!
//! Links that must not keep a node alive, like the one from a node to its parent, use
//! [`SoftPtr`].

use std::fmt;

use crate::node::{Node, NodeData};

/// A weak reference to a node.
///
/// A `SoftPtr` does not keep its target alive.  [`get()`](SoftPtr::get) returns `None`
/// once the target has been finalized.
#[derive(Default)]
pub struct SoftPtr(Option<rctree::WeakNode<NodeData>>);

impl SoftPtr {
    pub fn new(node: &Node) -> SoftPtr {
        SoftPtr(Some(node.0.downgrade()))
    }

    pub fn null() -> SoftPtr {
        SoftPtr(None)
    }

    /// Returns the target if it is still alive.
    pub fn get(&self) -> Option<Node> {
        self.0.as_ref().and_then(|weak| weak.upgrade()).map(Node)
    }

    pub fn set(&mut self, node: Option<&Node>) {
        self.0 = node.map(|n| n.0.downgrade());
    }

    pub fn clear(&mut self) {
        self.0 = None;
    }

    /// Whether the pointer is null or its target has been finalized.
    pub fn is_null(&self) -> bool {
        self.get().is_none()
    }
}

impl Clone for SoftPtr {
    fn clone(&self) -> SoftPtr {
        match self.get() {
            Some(node) => SoftPtr::new(&node),
            None => SoftPtr::null(),
        }
    }
}

impl fmt::Debug for SoftPtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Some(node) => write!(f, "SoftPtr({})", node),
            None => write!(f, "SoftPtr(null)"),
        }
    }
}

impl Node {
    /// Returns a weak reference to this node.
    pub fn downgrade(&self) -> SoftPtr {
        SoftPtr::new(self)
    }

    /// Returns another strong handle that keeps the node alive.
    pub fn anchor(&self) -> Node {
        self.clone()
    }

    /// Gives up this handle.  The node is finalized if nothing else keeps it alive.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for NodeData {
    fn drop(&mut self) {
        self.doc.node_finalized(self.subtree_registrations());
    }
}
