//! The change-notification protocol.
//!
//! Every mutation of a [`Node`] is reported synchronously, before the mutating call
//! returns, to the [`NodeObserver`]s interested in that node.  There are two kinds of
//! registrations:
//!
//! * Direct observers, added with [`Node::add_observer`], hear about changes to the node
//!   itself: its attributes, its content, and its list of children.
//!
//! * Subtree observers, added with [`Node::add_subtree_observer`], additionally hear about
//!   changes anywhere below the node.
//!
//! For a single mutation the direct observers of the mutated node are notified first.
//! Then the subtree observers are notified, starting with those of the mutated node
//! itself and walking up through its ancestors to the root.  Within one list, observers
//! are notified in registration order.
//!
//! Observer lists are copied before a notification pass starts, so observers may add or
//! remove registrations, or mutate the tree, from inside their callbacks.  An observer
//! that is removed during a pass will not be called for the rest of that pass.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::attributes::AttributeValue;
use crate::names::Name;
use crate::node::Node;

/// Receives notifications about changes to nodes.
///
/// All methods have empty default implementations, so observers only need to implement
/// the notifications they care about.
///
/// For the child notifications, `node` is the parent whose list of children changed.
/// The `prev` arguments name the sibling that precedes `child`, or `None` when `child` is
/// (or was) the first child.
pub trait NodeObserver {
    fn notify_child_added(&self, _node: &Node, _child: &Node, _prev: Option<&Node>) {}

    fn notify_child_removed(&self, _node: &Node, _child: &Node, _prev: Option<&Node>) {}

    fn notify_child_order_changed(
        &self,
        _node: &Node,
        _child: &Node,
        _old_prev: Option<&Node>,
        _new_prev: Option<&Node>,
    ) {
    }

    fn notify_content_changed(
        &self,
        _node: &Node,
        _old_content: Option<&str>,
        _new_content: Option<&str>,
    ) {
    }

    fn notify_attribute_changed(
        &self,
        _node: &Node,
        _key: &Name,
        _old_value: Option<&AttributeValue>,
        _new_value: Option<&AttributeValue>,
    ) {
    }
}

/// An owned copy of one notification.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeEvent {
    ChildAdded {
        node: Node,
        child: Node,
        prev: Option<Node>,
    },
    ChildRemoved {
        node: Node,
        child: Node,
        prev: Option<Node>,
    },
    ChildOrderChanged {
        node: Node,
        child: Node,
        old_prev: Option<Node>,
        new_prev: Option<Node>,
    },
    ContentChanged {
        node: Node,
        old_content: Option<String>,
        new_content: Option<String>,
    },
    AttributeChanged {
        node: Node,
        key: Name,
        old_value: Option<AttributeValue>,
        new_value: Option<AttributeValue>,
    },
}

impl NodeEvent {
    /// The node whose state the event describes.
    pub fn node(&self) -> &Node {
        match *self {
            NodeEvent::ChildAdded { ref node, .. }
            | NodeEvent::ChildRemoved { ref node, .. }
            | NodeEvent::ChildOrderChanged { ref node, .. }
            | NodeEvent::ContentChanged { ref node, .. }
            | NodeEvent::AttributeChanged { ref node, .. } => node,
        }
    }

    /// Delivers this event to `observer` as if it had just happened.
    pub fn replay(&self, observer: &dyn NodeObserver) {
        match *self {
            NodeEvent::ChildAdded {
                ref node,
                ref child,
                ref prev,
            } => observer.notify_child_added(node, child, prev.as_ref()),

            NodeEvent::ChildRemoved {
                ref node,
                ref child,
                ref prev,
            } => observer.notify_child_removed(node, child, prev.as_ref()),

            NodeEvent::ChildOrderChanged {
                ref node,
                ref child,
                ref old_prev,
                ref new_prev,
            } => observer.notify_child_order_changed(
                node,
                child,
                old_prev.as_ref(),
                new_prev.as_ref(),
            ),

            NodeEvent::ContentChanged {
                ref node,
                ref old_content,
                ref new_content,
            } => observer.notify_content_changed(
                node,
                old_content.as_deref(),
                new_content.as_deref(),
            ),

            NodeEvent::AttributeChanged {
                ref node,
                ref key,
                ref old_value,
                ref new_value,
            } => observer.notify_attribute_changed(
                node,
                key,
                old_value.as_ref(),
                new_value.as_ref(),
            ),
        }
    }
}

/// An observer that keeps a log of every notification it receives.
///
/// Note that the recorded events hold strong references to the nodes they mention.
#[derive(Default)]
pub struct EventRecorder {
    events: RefCell<Vec<NodeEvent>>,
}

impl EventRecorder {
    pub fn new() -> Rc<EventRecorder> {
        Rc::new(EventRecorder::default())
    }

    pub fn events(&self) -> Vec<NodeEvent> {
        self.events.borrow().clone()
    }

    /// Returns the recorded events and clears the log.
    pub fn take(&self) -> Vec<NodeEvent> {
        self.events.take()
    }

    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    fn push(&self, event: NodeEvent) {
        self.events.borrow_mut().push(event);
    }
}

impl NodeObserver for EventRecorder {
    fn notify_child_added(&self, node: &Node, child: &Node, prev: Option<&Node>) {
        self.push(NodeEvent::ChildAdded {
            node: node.clone(),
            child: child.clone(),
            prev: prev.cloned(),
        });
    }

    fn notify_child_removed(&self, node: &Node, child: &Node, prev: Option<&Node>) {
        self.push(NodeEvent::ChildRemoved {
            node: node.clone(),
            child: child.clone(),
            prev: prev.cloned(),
        });
    }

    fn notify_child_order_changed(
        &self,
        node: &Node,
        child: &Node,
        old_prev: Option<&Node>,
        new_prev: Option<&Node>,
    ) {
        self.push(NodeEvent::ChildOrderChanged {
            node: node.clone(),
            child: child.clone(),
            old_prev: old_prev.cloned(),
            new_prev: new_prev.cloned(),
        });
    }

    fn notify_content_changed(
        &self,
        node: &Node,
        old_content: Option<&str>,
        new_content: Option<&str>,
    ) {
        self.push(NodeEvent::ContentChanged {
            node: node.clone(),
            old_content: old_content.map(String::from),
            new_content: new_content.map(String::from),
        });
    }

    fn notify_attribute_changed(
        &self,
        node: &Node,
        key: &Name,
        old_value: Option<&AttributeValue>,
        new_value: Option<&AttributeValue>,
    ) {
        self.push(NodeEvent::AttributeChanged {
            node: node.clone(),
            key: key.clone(),
            old_value: old_value.cloned(),
            new_value: new_value.cloned(),
        });
    }
}

/// Compares two `Rc`s by the address of their allocation, ignoring vtables.
pub(crate) fn same_rc<A: ?Sized, B: ?Sized>(a: &Rc<A>, b: &Rc<B>) -> bool {
    Rc::as_ptr(a) as *const () == Rc::as_ptr(b) as *const ()
}

/// One entry in an [`ObserverList`].
#[derive(Clone)]
pub(crate) struct Registration {
    observer: Rc<dyn NodeObserver>,
    tag: Option<Rc<dyn Any>>,
    active: Rc<Cell<bool>>,
}

impl Registration {
    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    pub fn observer(&self) -> &dyn NodeObserver {
        &*self.observer
    }
}

/// List of observers registered on a node.
#[derive(Default)]
pub(crate) struct ObserverList {
    entries: Vec<Registration>,
}

impl ObserverList {
    pub fn add(&mut self, observer: Rc<dyn NodeObserver>) {
        self.add_tagged(observer, None);
    }

    pub fn add_tagged(&mut self, observer: Rc<dyn NodeObserver>, tag: Option<Rc<dyn Any>>) {
        self.entries.push(Registration {
            observer,
            tag,
            active: Rc::new(Cell::new(true)),
        });
    }

    /// Removes the first registration of `observer`.  Returns whether one was found.
    pub fn remove<O: NodeObserver + ?Sized>(&mut self, observer: &Rc<O>) -> bool {
        match self
            .entries
            .iter()
            .position(|r| same_rc(&r.observer, observer))
        {
            Some(idx) => {
                let reg = self.entries.remove(idx);
                reg.active.set(false);
                true
            }
            None => false,
        }
    }

    /// Removes every registration made with `tag`.  Returns how many were removed.
    pub fn remove_tagged(&mut self, tag: &Rc<dyn Any>) -> usize {
        let before = self.entries.len();

        self.entries.retain(|r| {
            let matches = r.tag.as_ref().map_or(false, |t| same_rc(t, tag));
            if matches {
                r.active.set(false);
            }
            !matches
        });

        before - self.entries.len()
    }

    pub fn snapshot(&self) -> Vec<Registration> {
        self.entries.clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
