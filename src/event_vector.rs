//! Table-of-callbacks listeners.
//!
//! Older code listens to nodes by filling in a [`NodeEventVector`] with plain functions
//! and registering it together with a piece of user data.  Each registration is wrapped
//! in a [`NodeObserver`] that forwards to the table, so listeners and observers are
//! notified in the same passes and the same order.

use std::any::Any;
use std::rc::Rc;

use crate::attributes::AttributeValue;
use crate::names::Name;
use crate::node::Node;
use crate::observer::NodeObserver;

/// User data passed back to every callback of a listener.
///
/// Listeners registered with the same data (the same allocation, not equal values) are
/// removed together by [`Node::remove_listener_by_data`].
pub type ListenerData = Rc<dyn Any>;

pub type ChildFn = fn(node: &Node, child: &Node, prev: Option<&Node>, data: &ListenerData);

/// `is_interactive` is always `false`.
pub type AttributeFn = fn(
    node: &Node,
    key: &str,
    old_value: Option<&str>,
    new_value: Option<&str>,
    is_interactive: bool,
    data: &ListenerData,
);

pub type ContentFn =
    fn(node: &Node, old_content: Option<&str>, new_content: Option<&str>, data: &ListenerData);

pub type OrderFn = fn(
    node: &Node,
    child: &Node,
    old_prev: Option<&Node>,
    new_prev: Option<&Node>,
    data: &ListenerData,
);

/// Callbacks for each kind of change; `None` entries are skipped.
#[derive(Clone, Copy, Default)]
pub struct NodeEventVector {
    pub child_added: Option<ChildFn>,
    pub child_removed: Option<ChildFn>,
    pub attribute_changed: Option<AttributeFn>,
    pub content_changed: Option<ContentFn>,
    pub order_changed: Option<OrderFn>,
}

struct VectorObserver {
    vector: NodeEventVector,
    data: ListenerData,
}

impl NodeObserver for VectorObserver {
    fn notify_child_added(&self, node: &Node, child: &Node, prev: Option<&Node>) {
        if let Some(f) = self.vector.child_added {
            f(node, child, prev, &self.data);
        }
    }

    fn notify_child_removed(&self, node: &Node, child: &Node, prev: Option<&Node>) {
        if let Some(f) = self.vector.child_removed {
            f(node, child, prev, &self.data);
        }
    }

    fn notify_child_order_changed(
        &self,
        node: &Node,
        child: &Node,
        old_prev: Option<&Node>,
        new_prev: Option<&Node>,
    ) {
        if let Some(f) = self.vector.order_changed {
            f(node, child, old_prev, new_prev, &self.data);
        }
    }

    fn notify_content_changed(
        &self,
        node: &Node,
        old_content: Option<&str>,
        new_content: Option<&str>,
    ) {
        if let Some(f) = self.vector.content_changed {
            f(node, old_content, new_content, &self.data);
        }
    }

    fn notify_attribute_changed(
        &self,
        node: &Node,
        key: &Name,
        old_value: Option<&AttributeValue>,
        new_value: Option<&AttributeValue>,
    ) {
        if let Some(f) = self.vector.attribute_changed {
            f(
                node,
                key.as_str(),
                old_value.map(|v| &**v),
                new_value.map(|v| &**v),
                false,
                &self.data,
            );
        }
    }
}

impl Node {
    /// Registers `vector` as a direct listener on this node.
    pub fn add_listener(&self, vector: &NodeEventVector, data: ListenerData) {
        let observer = VectorObserver {
            vector: *vector,
            data: data.clone(),
        };

        self.add_tagged_observer(Rc::new(observer), data);
    }

    /// Removes every listener registered with `data`, and returns how many there were.
    pub fn remove_listener_by_data(&self, data: &ListenerData) -> usize {
        self.remove_tagged_observers(data)
    }

    /// Like [`synthesize_events()`](Node::synthesize_events), for a table of callbacks.
    pub fn synthesize_events_vector(&self, vector: &NodeEventVector, data: &ListenerData) {
        let observer = VectorObserver {
            vector: *vector,
            data: data.clone(),
        };

        self.synthesize_events(&observer);
    }
}
