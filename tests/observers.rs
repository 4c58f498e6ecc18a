//! Tests for change notifications.

use pretty_assertions::assert_eq;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use xmlrepr::limits::MAX_NOTIFICATION_DEPTH;
use xmlrepr::{
    AttributeValue, Document, EventRecorder, Name, Node, NodeEvent, NodeObserver, Session,
    SignalObserver, TreeError,
};

fn document() -> Document {
    Document::new_with_session(Session::new_for_test_suite())
}

/// Appends its label to a shared log on every notification.
struct Labeled {
    label: &'static str,
    log: Rc<RefCell<Vec<&'static str>>>,
}

impl Labeled {
    fn record(&self) {
        self.log.borrow_mut().push(self.label);
    }
}

impl NodeObserver for Labeled {
    fn notify_child_added(&self, _node: &Node, _child: &Node, _prev: Option<&Node>) {
        self.record();
    }

    fn notify_attribute_changed(
        &self,
        _node: &Node,
        _key: &Name,
        _old: Option<&AttributeValue>,
        _new: Option<&AttributeValue>,
    ) {
        self.record();
    }
}

fn labeled(label: &'static str, log: &Rc<RefCell<Vec<&'static str>>>) -> Rc<Labeled> {
    Rc::new(Labeled {
        label,
        log: log.clone(),
    })
}

#[test]
fn reports_each_kind_of_mutation() {
    let d = document();
    let g = d.create_element("svg:g");
    let a = d.create_element("a");
    let b = d.create_element("b");
    let text = d.create_text("one");

    let recorder = EventRecorder::new();
    g.add_observer(recorder.clone());
    text.add_observer(recorder.clone());

    g.append_child(&a).unwrap();
    g.add_child(&b, Some(&a)).unwrap();
    g.change_order(&b, None).unwrap();
    g.remove_child(&a).unwrap();
    g.set_attribute("id", Some("g1")).unwrap();
    g.set_attribute("id", None).unwrap();
    text.set_content(Some("two")).unwrap();

    let id = d.intern("id");

    assert_eq!(
        recorder.take(),
        vec![
            NodeEvent::ChildAdded {
                node: g.clone(),
                child: a.clone(),
                prev: None,
            },
            NodeEvent::ChildAdded {
                node: g.clone(),
                child: b.clone(),
                prev: Some(a.clone()),
            },
            NodeEvent::ChildOrderChanged {
                node: g.clone(),
                child: b.clone(),
                old_prev: Some(a.clone()),
                new_prev: None,
            },
            NodeEvent::ChildRemoved {
                node: g.clone(),
                child: a.clone(),
                prev: Some(b.clone()),
            },
            NodeEvent::AttributeChanged {
                node: g.clone(),
                key: id.clone(),
                old_value: None,
                new_value: Some(AttributeValue::from("g1")),
            },
            NodeEvent::AttributeChanged {
                node: g.clone(),
                key: id,
                old_value: Some(AttributeValue::from("g1")),
                new_value: None,
            },
            NodeEvent::ContentChanged {
                node: text.clone(),
                old_content: Some(String::from("one")),
                new_content: Some(String::from("two")),
            },
        ]
    );
}

#[test]
fn direct_observers_fire_before_subtree_observers() {
    let d = document();
    let parent = d.create_element("svg:g");
    let x = d.create_element("svg:rect");
    parent.append_child(&x).unwrap();

    let log = Rc::new(RefCell::new(Vec::new()));
    parent.add_subtree_observer(labeled("B", &log));
    x.add_subtree_observer(labeled("own-subtree", &log));
    x.add_observer(labeled("A", &log));

    x.set_attribute("width", Some("10")).unwrap();

    assert_eq!(*log.borrow(), vec!["A", "own-subtree", "B"]);
}

#[test]
fn subtree_observers_walk_up_to_the_root() {
    let d = document();
    let root = d.create_element("svg:svg");
    let layer = d.create_element("svg:g");
    let leaf = d.create_element("svg:rect");
    d.append_child(&root).unwrap();
    root.append_child(&layer).unwrap();
    layer.append_child(&leaf).unwrap();

    let log = Rc::new(RefCell::new(Vec::new()));
    d.as_node().add_subtree_observer(labeled("document", &log));
    root.add_subtree_observer(labeled("root-1", &log));
    root.add_subtree_observer(labeled("root-2", &log));
    layer.add_observer(labeled("layer-direct", &log));
    layer.add_subtree_observer(labeled("layer", &log));

    leaf.set_attribute("x", Some("1")).unwrap();

    assert_eq!(*log.borrow(), vec!["layer", "root-1", "root-2", "document"]);
}

#[test]
fn removing_an_observer_twice_is_harmless() {
    let d = document();
    let g = d.create_element("svg:g");
    let recorder = EventRecorder::new();

    g.add_observer(recorder.clone());
    assert!(g.remove_observer(&recorder));
    assert!(!g.remove_observer(&recorder));

    g.add_subtree_observer(recorder.clone());
    assert!(g.remove_subtree_observer(&recorder));
    assert!(!g.remove_subtree_observer(&recorder));

    g.set_attribute("id", Some("x")).unwrap();
    assert!(recorder.is_empty());
}

/// Removes itself, and a sibling observer, the first time it is notified.
struct SelfRemoving {
    node: Node,
    me: RefCell<Option<Rc<dyn NodeObserver>>>,
    victim: Rc<dyn NodeObserver>,
    calls: Cell<usize>,
}

impl NodeObserver for SelfRemoving {
    fn notify_attribute_changed(
        &self,
        _node: &Node,
        _key: &Name,
        _old: Option<&AttributeValue>,
        _new: Option<&AttributeValue>,
    ) {
        self.calls.set(self.calls.get() + 1);

        if let Some(me) = self.me.borrow_mut().take() {
            assert!(self.node.remove_observer(&me));
        }
        self.node.remove_observer(&self.victim);
    }
}

#[test]
fn observers_can_remove_themselves_during_dispatch() {
    let d = document();
    let g = d.create_element("svg:g");

    let victim = EventRecorder::new();
    let remover = Rc::new(SelfRemoving {
        node: g.clone(),
        me: RefCell::new(None),
        victim: victim.clone(),
        calls: Cell::new(0),
    });
    let as_observer: Rc<dyn NodeObserver> = remover.clone();
    *remover.me.borrow_mut() = Some(as_observer.clone());

    g.add_observer(as_observer);
    g.add_observer(victim.clone());

    g.set_attribute("a", Some("1")).unwrap();
    g.set_attribute("a", Some("2")).unwrap();

    assert_eq!(remover.calls.get(), 1);
    assert!(victim.is_empty());
    assert_eq!(g.observer_count(), 0);
}

/// Adds a child to the mutated node whenever an attribute changes.
struct Reacting {
    doc: Document,
}

impl NodeObserver for Reacting {
    fn notify_attribute_changed(
        &self,
        node: &Node,
        _key: &Name,
        _old: Option<&AttributeValue>,
        _new: Option<&AttributeValue>,
    ) {
        node.append_child(&self.doc.create_element("svg:title"))
            .unwrap();
    }
}

#[test]
fn observers_may_mutate_the_tree() {
    let d = document();
    let g = d.create_element("svg:g");
    let recorder = EventRecorder::new();

    g.add_observer(Rc::new(Reacting { doc: d.clone() }));
    g.add_observer(recorder.clone());

    g.set_attribute("id", Some("g1")).unwrap();

    let events = recorder.take();
    assert_eq!(events.len(), 2);
    assert!(matches!(events[0], NodeEvent::ChildAdded { .. }));
    assert!(matches!(events[1], NodeEvent::AttributeChanged { .. }));
    assert_eq!(g.child_count(), 1);
}

/// Bumps a counter attribute every time it changes, forever.
struct Runaway {
    depth: Cell<usize>,
    error: RefCell<Option<TreeError>>,
}

impl NodeObserver for Runaway {
    fn notify_attribute_changed(
        &self,
        node: &Node,
        _key: &Name,
        _old: Option<&AttributeValue>,
        _new: Option<&AttributeValue>,
    ) {
        let depth = self.depth.get() + 1;
        self.depth.set(depth);

        if let Err(e) = node.set_attribute("n", Some(depth.to_string().as_str())) {
            self.error.borrow_mut().get_or_insert(e);
        }
    }
}

#[test]
fn runaway_observers_are_stopped() {
    let d = document();
    let g = d.create_element("svg:g");
    let runaway = Rc::new(Runaway {
        depth: Cell::new(0),
        error: RefCell::new(None),
    });

    g.add_observer(runaway.clone());
    g.set_attribute("n", Some("0")).unwrap();

    assert_eq!(runaway.depth.get(), MAX_NOTIFICATION_DEPTH);
    assert!(matches!(
        *runaway.error.borrow(),
        Some(TreeError::ObserverProtocol(_))
    ));

    // the document is usable again once the passes have unwound
    g.remove_observer(&runaway);
    g.set_attribute("n", Some("done")).unwrap();
    assert_eq!(g.attribute("n").as_deref(), Some("done"));
}

/// Rebuilds the state of a node purely from notifications.
#[derive(Default)]
struct Shadow {
    attributes: RefCell<HashMap<String, String>>,
    content: RefCell<Option<String>>,
    children: RefCell<Vec<Node>>,
}

impl NodeObserver for Shadow {
    fn notify_child_added(&self, _node: &Node, child: &Node, prev: Option<&Node>) {
        let mut children = self.children.borrow_mut();
        let idx = match prev {
            Some(p) => children.iter().position(|c| c == p).unwrap() + 1,
            None => 0,
        };
        children.insert(idx, child.clone());
    }

    fn notify_content_changed(&self, _node: &Node, _old: Option<&str>, new: Option<&str>) {
        *self.content.borrow_mut() = new.map(String::from);
    }

    fn notify_attribute_changed(
        &self,
        _node: &Node,
        key: &Name,
        _old: Option<&AttributeValue>,
        new: Option<&AttributeValue>,
    ) {
        let mut attributes = self.attributes.borrow_mut();
        match new {
            Some(v) => attributes.insert(key.to_string(), v.to_string()),
            None => attributes.remove(key.as_str()),
        };
    }
}

fn assert_shadow_matches(node: &Node) {
    let shadow = Shadow::default();
    node.synthesize_events(&shadow);

    let attributes: HashMap<String, String> = node
        .attribute_list()
        .into_iter()
        .map(|r| (r.key.to_string(), r.value.to_string()))
        .collect();

    assert_eq!(*shadow.attributes.borrow(), attributes);
    assert_eq!(*shadow.content.borrow(), node.content());
    assert_eq!(
        *shadow.children.borrow(),
        node.children().collect::<Vec<_>>()
    );

    for child in node.children() {
        assert_shadow_matches(&child);
    }
}

#[test]
fn synthesized_events_rebuild_the_tree() {
    let d = document();
    let svg = d.create_element("svg:svg");
    svg.set_attribute("width", Some("100")).unwrap();
    svg.set_attribute("height", Some("50")).unwrap();

    let text = d.create_element("svg:text");
    text.set_attribute("x", Some("5")).unwrap();
    text.append_child(&d.create_text("label")).unwrap();

    svg.append_child(&d.create_comment("generated")).unwrap();
    svg.append_child(&text).unwrap();
    svg.append_child(&d.create_element("svg:rect")).unwrap();
    d.append_child(&svg).unwrap();

    assert_shadow_matches(d.as_node());
}

#[test]
fn synthesized_events_come_in_order() {
    let d = document();
    let g = d.create_element("svg:g");
    let a = d.create_element("a");
    let b = d.create_element("b");
    g.append_child(&a).unwrap();
    g.append_child(&b).unwrap();
    g.set_attribute("id", Some("g1")).unwrap();

    let recorder = EventRecorder::new();
    g.synthesize_events(&*recorder);

    assert_eq!(
        recorder.events(),
        vec![
            NodeEvent::AttributeChanged {
                node: g.clone(),
                key: d.intern("id"),
                old_value: None,
                new_value: Some(AttributeValue::from("g1")),
            },
            NodeEvent::ChildAdded {
                node: g.clone(),
                child: a.clone(),
                prev: None,
            },
            NodeEvent::ChildAdded {
                node: g.clone(),
                child: b,
                prev: Some(a),
            },
        ]
    );
}

#[test]
fn replayed_events_reach_other_observers() {
    let d = document();
    let g = d.create_element("svg:g");
    let recorder = EventRecorder::new();
    g.add_observer(recorder.clone());

    g.set_attribute("id", Some("g1")).unwrap();
    g.append_child(&d.create_element("svg:rect")).unwrap();

    let copy = EventRecorder::new();
    for event in recorder.events() {
        assert_eq!(event.node(), &g);
        event.replay(&*copy);
    }

    assert_eq!(copy.events(), recorder.events());
}

#[test]
fn signal_observer_on_node() {
    let d = document();
    let g = d.create_element("svg:g");
    let count = Rc::new(Cell::new(0));

    let observer = SignalObserver::new();
    let c = count.clone();
    observer.connect_changed(move || c.set(c.get() + 1));
    observer.set(Some(&g));

    let text = d.create_text("hi");
    g.append_child(&text).unwrap();
    assert_eq!(count.get(), 1);

    text.set_content(Some("changed")).unwrap();
    assert_eq!(count.get(), 1);

    let rect = d.create_element("svg:rect");
    g.append_child(&rect).unwrap();
    rect.set_attribute("x", Some("1")).unwrap();
    assert_eq!(count.get(), 2);
}

#[test]
fn signal_observer_on_subtree() {
    let d = document();
    let g = d.create_element("svg:g");
    let text = d.create_text("hi");
    let rect = d.create_element("svg:rect");
    g.append_child(&text).unwrap();
    g.append_child(&rect).unwrap();

    let count = Rc::new(Cell::new(0));
    let observer = SignalObserver::new();
    let c = count.clone();
    observer.connect_changed(move || c.set(c.get() + 1));
    observer.set_subtree(Some(&g));

    text.set_content(Some("changed")).unwrap();
    assert_eq!(count.get(), 0);

    rect.set_attribute("x", Some("1")).unwrap();
    rect.append_child(&d.create_element("svg:title")).unwrap();
    assert_eq!(count.get(), 2);

    observer.set(Some(&g));
    assert_eq!(g.subtree_observer_count(), 0);
    assert_eq!(g.observer_count(), 1);

    rect.set_attribute("x", Some("2")).unwrap();
    assert_eq!(count.get(), 2);
}
