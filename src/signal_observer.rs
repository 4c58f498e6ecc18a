//! An observer that turns structural and attribute changes into one "changed" signal.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::attributes::AttributeValue;
use crate::names::Name;
use crate::node::Node;
use crate::observer::NodeObserver;

/// Identifies a handler connected with [`SignalObserver::connect_changed`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

type Handler = Rc<dyn Fn()>;

#[derive(Default)]
struct Handlers {
    next_id: Cell<u64>,
    list: RefCell<Vec<(HandlerId, Handler)>>,
}

impl Handlers {
    fn emit(&self) {
        // Handlers may connect or disconnect while we iterate.
        let handlers: Vec<Handler> = self.list.borrow().iter().map(|(_, h)| h.clone()).collect();

        for handler in handlers {
            handler();
        }
    }
}

struct Forwarder {
    handlers: Weak<Handlers>,
}

impl Forwarder {
    fn emit(&self) {
        if let Some(handlers) = self.handlers.upgrade() {
            handlers.emit();
        }
    }
}

impl NodeObserver for Forwarder {
    fn notify_child_added(&self, _node: &Node, _child: &Node, _prev: Option<&Node>) {
        self.emit();
    }

    fn notify_child_removed(&self, _node: &Node, _child: &Node, _prev: Option<&Node>) {
        self.emit();
    }

    fn notify_child_order_changed(
        &self,
        _node: &Node,
        _child: &Node,
        _old_prev: Option<&Node>,
        _new_prev: Option<&Node>,
    ) {
        self.emit();
    }

    // Content changes are not forwarded.

    fn notify_attribute_changed(
        &self,
        _node: &Node,
        _key: &Name,
        _old_value: Option<&AttributeValue>,
        _new_value: Option<&AttributeValue>,
    ) {
        self.emit();
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Scope {
    Node,
    Subtree,
}

/// Emits a parameterless "changed" signal whenever the observed node gains, loses or
/// reorders children, or has an attribute changed.
///
/// Changes of text content are not reported.  With [`set_subtree`](Self::set_subtree),
/// changes anywhere below the node are reported too.
///
/// While attached, the observer keeps its node alive.  Dropping the observer detaches it.
pub struct SignalObserver {
    handlers: Rc<Handlers>,
    forwarder: Rc<dyn NodeObserver>,
    attached: RefCell<Option<(Node, Scope)>>,
}

impl SignalObserver {
    pub fn new() -> SignalObserver {
        let handlers = Rc::new(Handlers::default());
        let forwarder = Rc::new(Forwarder {
            handlers: Rc::downgrade(&handlers),
        });

        SignalObserver {
            handlers,
            forwarder,
            attached: RefCell::new(None),
        }
    }

    /// Starts observing `node`, after detaching from the node observed before.
    ///
    /// `None` just detaches.
    pub fn set(&self, node: Option<&Node>) {
        self.attach(node, Scope::Node);
    }

    /// Like [`set`](Self::set), but observes `node`'s whole subtree.
    pub fn set_subtree(&self, node: Option<&Node>) {
        self.attach(node, Scope::Subtree);
    }

    /// The node currently observed.
    pub fn node(&self) -> Option<Node> {
        self.attached.borrow().as_ref().map(|(node, _)| node.clone())
    }

    pub fn connect_changed<F>(&self, f: F) -> HandlerId
    where
        F: Fn() + 'static,
    {
        let id = HandlerId(self.handlers.next_id.get());
        self.handlers.next_id.set(id.0 + 1);

        self.handlers.list.borrow_mut().push((id, Rc::new(f)));
        id
    }

    /// Disconnects a handler.  Returns `false` if it was not connected.
    pub fn disconnect(&self, id: HandlerId) -> bool {
        let mut list = self.handlers.list.borrow_mut();

        match list.iter().position(|(i, _)| *i == id) {
            Some(idx) => {
                list.remove(idx);
                true
            }
            None => false,
        }
    }

    fn attach(&self, node: Option<&Node>, scope: Scope) {
        let old = self.attached.borrow_mut().take();

        if let Some((old_node, old_scope)) = old {
            match old_scope {
                Scope::Node => old_node.remove_observer(&self.forwarder),
                Scope::Subtree => old_node.remove_subtree_observer(&self.forwarder),
            };
        }

        if let Some(node) = node {
            match scope {
                Scope::Node => node.add_observer(self.forwarder.clone()),
                Scope::Subtree => node.add_subtree_observer(self.forwarder.clone()),
            }

            *self.attached.borrow_mut() = Some((node.clone(), scope));
        }
    }
}

impl Default for SignalObserver {
    fn default() -> SignalObserver {
        SignalObserver::new()
    }
}

impl Drop for SignalObserver {
    fn drop(&mut self) {
        self.attach(None, Scope::Node);
    }
}

impl fmt::Debug for SignalObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalObserver")
            .field("node", &self.node())
            .field("handlers", &self.handlers.list.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::session::Session;

    fn counter(observer: &SignalObserver) -> Rc<Cell<usize>> {
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        observer.connect_changed(move || c.set(c.get() + 1));
        count
    }

    #[test]
    fn coalesces_everything_but_content() {
        let doc = Document::new_with_session(Session::new_for_test_suite());
        let g = doc.create_element("svg:g");
        let text = doc.create_text("a");
        let observer = SignalObserver::new();
        let count = counter(&observer);

        observer.set(Some(&g));

        g.set_attribute("id", Some("g")).unwrap();
        g.append_child(&text).unwrap();
        text.set_content(Some("b")).unwrap();
        g.remove_child(&text).unwrap();

        assert_eq!(count.get(), 3);
    }

    #[test]
    fn set_moves_between_nodes() {
        let doc = Document::new_with_session(Session::new_for_test_suite());
        let a = doc.create_element("a");
        let b = doc.create_element("b");
        let observer = SignalObserver::new();
        let count = counter(&observer);

        observer.set(Some(&a));
        observer.set(Some(&b));
        observer.set(Some(&b));

        assert_eq!(a.observer_count(), 0);
        assert_eq!(b.observer_count(), 1);

        a.set_attribute("x", Some("1")).unwrap();
        b.set_attribute("x", Some("1")).unwrap();
        assert_eq!(count.get(), 1);

        observer.set(None);
        assert_eq!(b.observer_count(), 0);
        assert!(observer.node().is_none());
    }

    #[test]
    fn dropping_detaches() {
        let doc = Document::new_with_session(Session::new_for_test_suite());
        let g = doc.create_element("svg:g");

        {
            let observer = SignalObserver::new();
            observer.set_subtree(Some(&g));
            assert_eq!(g.subtree_observer_count(), 1);
        }

        assert_eq!(g.subtree_observer_count(), 0);
        g.set_attribute("id", Some("still fine")).unwrap();
    }

    #[test]
    fn subtree_mode_sees_descendants() {
        let doc = Document::new_with_session(Session::new_for_test_suite());
        let g = doc.create_element("svg:g");
        let rect = doc.create_element("svg:rect");
        g.append_child(&rect).unwrap();

        let observer = SignalObserver::new();
        let count = counter(&observer);
        observer.set_subtree(Some(&g));

        rect.set_attribute("width", Some("10")).unwrap();
        assert_eq!(count.get(), 1);

        let id = observer.connect_changed(|| ());
        assert!(observer.disconnect(id));
        assert!(!observer.disconnect(id));
    }
}
