//! Error types.

use std::error;
use std::fmt;

/// Errors returned by operations that mutate a tree.
///
/// Some requests are deliberately lenient and are not errors at all: setting the content
/// of an element or document node, or setting an attribute on a node that is not an
/// element, silently does nothing and returns `Ok(())`.  This lets callers treat all node
/// kinds uniformly.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// The operation does not make sense for the nodes involved.
    ///
    /// For example, removing a node that is not a child of the node it is removed from,
    /// inserting after a sibling that belongs to another parent, or calling
    /// `set_position()` on a node without a parent.
    InvalidOperation(String),

    /// Tried to link a node that belongs to a different document.
    ///
    /// Nodes must be copied into the target document with
    /// [`Node::duplicate`](crate::Node::duplicate) first.
    CrossDocument,

    /// A mutation was attempted while observer callbacks were nested too deeply.
    ///
    /// See [`MAX_NOTIFICATION_DEPTH`](crate::limits::MAX_NOTIFICATION_DEPTH).
    ObserverProtocol(String),
}

impl TreeError {
    pub(crate) fn invalid(s: &str) -> TreeError {
        TreeError::InvalidOperation(s.to_string())
    }
}

impl error::Error for TreeError {}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            TreeError::InvalidOperation(ref s) => write!(f, "invalid operation: {}", s),
            TreeError::CrossDocument => {
                write!(f, "node belongs to another document; duplicate it first")
            }
            TreeError::ObserverProtocol(ref s) => write!(f, "observer protocol violation: {}", s),
        }
    }
}
