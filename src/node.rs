//! Tree nodes, the representation of XML constructs.
//!
//! Xmlrepr uses the [rctree crate][rctree] to link nodes into a tree.  Its
//! [`rctree::Node`] struct provides a generic, reference-counted node; xmlrepr puts a
//! private `NodeData` in it and wraps the result in [`Node`].
//!
//! A parent holds strong references to its children, and each child holds a weak
//! reference back to its parent.  A [`Node`] handle is itself a strong reference, so
//! holding a handle keeps the node (and its subtree) alive even after it has been removed
//! from its parent.  See the [`gc`](crate::gc) module for the ownership rules.
//!
//! Nodes are not constructed directly by callers; use the factory methods of
//! [`Document`] such as [`Document::create_element`].
//!
//! All mutating methods report their changes to the registered
//! [`NodeObserver`](crate::NodeObserver)s before returning; see the
//! [`observer`](crate::observer) module for the dispatch order.
//!
//! [rctree]: https://crates.io/crates/rctree

use std::cell::Ref;
use std::fmt;
use std::rc::Rc;

use crate::attributes::{AttributeRecord, AttributeValue, Attributes};
use crate::document::{Document, DocumentShared};
use crate::error::TreeError;
use crate::limits;
use crate::names::{Name, NameCode};
use crate::observer::{NodeObserver, ObserverList};
use crate::repr_log;
use crate::repr_util;

/// The kind of XML construct a node stands for.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum NodeType {
    Document,
    Element,
    Text,
    Comment,
    ProcessingInstruction,
}

impl NodeType {
    /// Whether `content()` is meaningful for this kind of node.
    pub fn has_content(self) -> bool {
        matches!(
            self,
            NodeType::Text | NodeType::Comment | NodeType::ProcessingInstruction
        )
    }

    pub fn can_have_children(self) -> bool {
        matches!(self, NodeType::Document | NodeType::Element)
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            NodeType::Document => "document",
            NodeType::Element => "element",
            NodeType::Text => "text",
            NodeType::Comment => "comment",
            NodeType::ProcessingInstruction => "processing instruction",
        };

        f.write_str(s)
    }
}

/// Data for a single node.
///
/// `name` is the element name for elements and the target for processing instructions.
/// `content` is only meaningful for text, comment and processing instruction nodes;
/// `attributes` only for elements.
pub(crate) struct NodeData {
    pub(crate) doc: Rc<DocumentShared>,
    node_type: NodeType,
    name: Option<Name>,
    content: Option<String>,
    attributes: Attributes,
    observers: ObserverList,
    subtree_observers: ObserverList,
}

impl NodeData {
    pub(crate) fn subtree_registrations(&self) -> usize {
        self.subtree_observers.len()
    }
}

/// Strong reference to a node in a document tree.
///
/// Cloning a `Node` is cheap and yields another handle to the same node; two handles
/// compare equal when they refer to the same node.
#[derive(Clone)]
pub struct Node(pub(crate) rctree::Node<NodeData>);

impl PartialEq for Node {
    fn eq(&self, other: &Node) -> bool {
        self.0 == other.0
    }
}

impl Eq for Node {}

impl Node {
    pub(crate) fn new_in(
        doc: &Rc<DocumentShared>,
        node_type: NodeType,
        name: Option<Name>,
        content: Option<String>,
    ) -> Node {
        doc.node_created();

        Node(rctree::Node::new(NodeData {
            doc: doc.clone(),
            node_type,
            name,
            content,
            attributes: Attributes::new(),
            observers: ObserverList::default(),
            subtree_observers: ObserverList::default(),
        }))
    }

    fn data(&self) -> Ref<'_, NodeData> {
        self.0.borrow()
    }

    fn data_mut<R>(&self, f: impl FnOnce(&mut NodeData) -> R) -> R {
        let mut link = self.0.clone();
        let mut data = link.borrow_mut();
        f(&mut *data)
    }

    pub(crate) fn shared(&self) -> Rc<DocumentShared> {
        self.data().doc.clone()
    }

    pub(crate) fn same_document(&self, other: &Node) -> bool {
        Rc::ptr_eq(&self.data().doc, &other.data().doc)
    }

    pub fn node_type(&self) -> NodeType {
        self.data().node_type
    }

    /// The element name, or `None` for nodes that are not elements.
    pub fn name(&self) -> Option<Name> {
        let data = self.data();

        match data.node_type {
            NodeType::Element => data.name.clone(),
            _ => None,
        }
    }

    /// The interned code of the element name, or `None` for nodes that are not elements.
    pub fn code(&self) -> Option<NameCode> {
        self.name().map(|n| n.code())
    }

    /// The target of a processing instruction, or `None` for other nodes.
    pub fn target(&self) -> Option<Name> {
        let data = self.data();

        match data.node_type {
            NodeType::ProcessingInstruction => data.name.clone(),
            _ => None,
        }
    }

    /// Rewrites the name of an element to the one interned as `code`.
    ///
    /// This bypasses every check that normally protects a node's identity, and exists
    /// only for one-off fixups like promoting unprefixed elements into a namespace (see
    /// [`repr_util::promote_to_namespace`]).  Observers are not notified.
    ///
    /// # Panics
    ///
    /// Panics if the node is not an element, or if `code` was not interned in this
    /// node's document.
    pub fn set_code_unsafe(&self, code: NameCode) {
        let doc = self.shared();
        let name = doc
            .lookup_name(code)
            .unwrap_or_else(|| panic!("name code {:?} is not interned in this document", code));

        self.data_mut(|d| {
            assert!(
                d.node_type == NodeType::Element,
                "set_code_unsafe() called on a {} node",
                d.node_type
            );
            d.name = Some(name);
        });
    }

    /// The document this node belongs to.
    pub fn document(&self) -> Document {
        Document::from_node(self.shared().document_node())
    }

    pub fn parent(&self) -> Option<Node> {
        self.0.parent().map(Node)
    }

    pub fn next(&self) -> Option<Node> {
        self.0.next_sibling().map(Node)
    }

    pub fn prev(&self) -> Option<Node> {
        self.0.previous_sibling().map(Node)
    }

    pub fn first_child(&self) -> Option<Node> {
        self.0.first_child().map(Node)
    }

    pub fn last_child(&self) -> Option<Node> {
        self.0.last_child().map(Node)
    }

    pub fn nth_child(&self, index: usize) -> Option<Node> {
        self.children().nth(index)
    }

    pub fn children(&self) -> Children {
        Children {
            next: self.first_child(),
        }
    }

    pub fn child_count(&self) -> usize {
        self.children().count()
    }

    /// Returns the node's index among its siblings.
    ///
    /// A node without a parent has position 0; asking for it is logged as a diagnostic.
    pub fn position(&self) -> usize {
        if self.parent().is_none() {
            let doc = self.shared();
            repr_log!(
                doc.session(),
                "position() called on {} which has no parent",
                self
            );
            return 0;
        }

        let mut pos = 0;
        let mut sibling = self.prev();

        while let Some(s) = sibling {
            pos += 1;
            sibling = s.prev();
        }

        pos
    }

    /// Returns the root element of the tree this node is in.
    ///
    /// For a node inside a document this is the document's root element.  For a detached
    /// hierarchy it is the topmost ancestor if that is an element, or `None` otherwise.
    pub fn root(&self) -> Option<Node> {
        let mut top = self.clone();

        while let Some(parent) = top.parent() {
            top = parent;
        }

        match top.node_type() {
            NodeType::Document => top.children().find(|c| c.node_type() == NodeType::Element),
            NodeType::Element => Some(top),
            _ => None,
        }
    }

    /// Whether `self` is a strict ancestor of `other`.
    pub fn is_ancestor_of(&self, other: &Node) -> bool {
        let mut ancestor = other.parent();

        while let Some(a) = ancestor {
            if a == *self {
                return true;
            }

            ancestor = a.parent();
        }

        false
    }

    pub fn content(&self) -> Option<String> {
        self.data().content.clone()
    }

    /// Returns the value of attribute `key`, or `None` if it is not set.
    ///
    /// The returned value is a copy; it does not change if the attribute is set again.
    pub fn attribute(&self, key: &str) -> Option<AttributeValue> {
        let data = self.data();
        let name = data.doc.find_name(key)?;

        data.attributes.get(name.code()).cloned()
    }

    /// Returns a snapshot of the node's attributes in iteration order.
    pub fn attribute_list(&self) -> Vec<AttributeRecord> {
        self.data().attributes.to_vec()
    }

    pub fn attribute_count(&self) -> usize {
        self.data().attributes.len()
    }

    /// Whether the name of any attribute contains `partial`.
    ///
    /// This is a loose substring test: `match_attribute_name("id")` is true for an element
    /// that has a `hidden` attribute and no `id` at all.
    pub fn match_attribute_name(&self, partial: &str) -> bool {
        self.data().attributes.contains_name_substring(partial)
    }

    /// Sets attribute `key` to `value`, or removes it if `value` is `None` or empty.
    ///
    /// Replacing the value of an existing attribute keeps its position in
    /// [`attribute_list()`](Self::attribute_list).  Observers are notified only if the
    /// value actually changed.  On nodes that are not elements this does nothing.
    pub fn set_attribute(&self, key: &str, value: Option<&str>) -> Result<(), TreeError> {
        self.set_attribute_interactive(key, value, false)
    }

    /// Like [`set_attribute()`](Self::set_attribute), with the editor's `is_interactive`
    /// flag.
    ///
    /// The flag is accepted for callers that pass it through, but has no effect.
    pub fn set_attribute_interactive(
        &self,
        key: &str,
        value: Option<&str>,
        _is_interactive: bool,
    ) -> Result<(), TreeError> {
        let doc = self.shared();

        if key.is_empty() {
            return Err(self.reject(&doc, TreeError::invalid("attribute name is empty")));
        }

        if self.node_type() != NodeType::Element {
            return Ok(());
        }

        self.check_dispatch_depth(&doc)?;

        let name = doc.intern(key);
        let new_value = value.filter(|v| !v.is_empty()).map(AttributeValue::from);

        let old_value = self.data_mut(|d| match new_value {
            Some(ref v) => d.attributes.set(name.clone(), v.clone()),
            None => d.attributes.remove(name.code()),
        });

        if old_value != new_value {
            self.notify(|o| {
                o.notify_attribute_changed(self, &name, old_value.as_ref(), new_value.as_ref())
            });
        }

        Ok(())
    }

    /// Sets the text of a text, comment or processing instruction node.
    ///
    /// On element and document nodes this does nothing.
    pub fn set_content(&self, content: Option<&str>) -> Result<(), TreeError> {
        if !self.node_type().has_content() {
            return Ok(());
        }

        let doc = self.shared();
        self.check_dispatch_depth(&doc)?;

        let new_content = content.map(String::from);
        let old_content = self.data_mut(|d| std::mem::replace(&mut d.content, new_content.clone()));

        if old_content != new_content {
            self.notify(|o| {
                o.notify_content_changed(self, old_content.as_deref(), new_content.as_deref())
            });
        }

        Ok(())
    }

    /// Inserts `child` after the existing child `after`, or as the first child if `after`
    /// is `None`.
    ///
    /// `child` must belong to the same document as `self` and must not have a parent.
    ///
    /// Checking that `child` is not an ancestor of `self` walks up from `self`, but only
    /// when `child` has children of its own, so building a tree one new node at a time
    /// stays cheap at any depth.
    pub fn add_child(&self, child: &Node, after: Option<&Node>) -> Result<(), TreeError> {
        let doc = self.shared();

        self.check_dispatch_depth(&doc)?;
        self.check_can_adopt(&doc, child)?;

        match after {
            Some(after) => {
                self.check_is_child(&doc, after)?;
                let mut link = after.0.clone();
                link.insert_after(child.0.clone());
            }

            None => {
                let mut link = self.0.clone();
                link.prepend(child.0.clone());
            }
        }

        self.notify(|o| o.notify_child_added(self, child, after));

        Ok(())
    }

    /// Inserts `child` as the last child.
    pub fn append_child(&self, child: &Node) -> Result<(), TreeError> {
        let last = self.last_child();
        self.add_child(child, last.as_ref())
    }

    /// Detaches `child` from this node.
    ///
    /// The child is not destroyed; it stays alive for as long as the caller holds a
    /// handle to it, and may be inserted somewhere else.
    pub fn remove_child(&self, child: &Node) -> Result<(), TreeError> {
        let doc = self.shared();

        self.check_dispatch_depth(&doc)?;
        self.check_is_child(&doc, child)?;

        let prev = child.prev();

        let mut link = child.0.clone();
        link.detach();

        self.notify(|o| o.notify_child_removed(self, child, prev.as_ref()));

        Ok(())
    }

    /// Moves `child` so that it comes right after `after`, or first if `after` is `None`.
    pub fn change_order(&self, child: &Node, after: Option<&Node>) -> Result<(), TreeError> {
        let doc = self.shared();

        self.check_dispatch_depth(&doc)?;
        self.check_is_child(&doc, child)?;

        if let Some(after) = after {
            self.check_is_child(&doc, after)?;

            if after == child {
                return Err(self.reject(&doc, TreeError::invalid("cannot move a node after itself")));
            }
        }

        let old_prev = child.prev();

        if old_prev.as_ref() == after {
            return Ok(());
        }

        let mut link = child.0.clone();
        link.detach();

        match after {
            Some(after) => {
                let mut after_link = after.0.clone();
                after_link.insert_after(child.0.clone());
            }

            None => {
                let mut parent_link = self.0.clone();
                parent_link.prepend(child.0.clone());
            }
        }

        self.notify(|o| o.notify_child_order_changed(self, child, old_prev.as_ref(), after));

        Ok(())
    }

    /// Moves this node to index `pos` among its siblings, or to the end for `None`.
    ///
    /// Indexes past the end also move the node to the end.
    pub fn set_position(&self, pos: Option<usize>) -> Result<(), TreeError> {
        let parent = match self.parent() {
            Some(p) => p,
            None => {
                let doc = self.shared();
                return Err(self.reject(&doc, TreeError::invalid("node has no parent")));
            }
        };

        let mut remaining = pos.unwrap_or(usize::MAX);
        let mut after = None;
        let mut sibling = parent.first_child();

        while let Some(s) = sibling {
            if remaining == 0 {
                break;
            }

            if s != *self {
                remaining -= 1;
                after = Some(s.clone());
            }

            sibling = s.next();
        }

        parent.change_order(self, after.as_ref())
    }

    /// Makes a deep copy of this node and its subtree in `doc`.
    ///
    /// The copy has no parent and no observers.  `doc` may be a different document than
    /// the one this node belongs to; names are interned again in the target document.
    pub fn duplicate(&self, doc: &Document) -> Node {
        self.duplicate_in(&doc.shared())
    }

    pub(crate) fn duplicate_in(&self, doc: &Rc<DocumentShared>) -> Node {
        let top = self.copy_without_children(doc);

        // Pairs of (source node, parent of its copy).
        let mut pending = Vec::new();
        push_children_reversed(&mut pending, self, &top);

        while let Some((source, parent)) = pending.pop() {
            let copy = source.copy_without_children(doc);
            let mut link = parent.0.clone();
            link.append(copy.0.clone());

            push_children_reversed(&mut pending, &source, &copy);
        }

        top
    }

    fn copy_without_children(&self, doc: &Rc<DocumentShared>) -> Node {
        let data = self.data();

        let name = data.name.as_ref().map(|n| doc.intern(n.as_str()));
        let copy = Node::new_in(doc, data.node_type, name, data.content.clone());

        let mut attributes = Attributes::new();
        for (key, value) in data.attributes.iter() {
            attributes.set(doc.intern(key.as_str()), AttributeValue::from(value));
        }

        copy.data_mut(|d| d.attributes = attributes);
        copy
    }

    /// Merges the subtree of `src` into this node.
    ///
    /// At every level, children of `src` are matched with children of `self` that have
    /// the same value for attribute `key`; matched pairs are merged recursively.  Children
    /// of `src` without a match, or without a `key` attribute, are copied and appended.
    /// Children of `self` that have no counterpart are left alone.  Finally the content
    /// and attributes of `src` are copied over, replacing existing values.
    ///
    /// `src` may belong to another document.
    pub fn merge_from(&self, src: &Node, key: &str) -> Result<(), TreeError> {
        let doc = self.shared();

        if src == self {
            return Err(self.reject(&doc, TreeError::invalid("cannot merge a node into itself")));
        }

        let mut pending = vec![(self.clone(), src.clone())];

        while let Some((dst, src)) = pending.pop() {
            let src_content = src.content();
            dst.set_content(src_content.as_deref())?;

            let src_children: Vec<Node> = src.children().collect();

            for src_child in src_children {
                let counterpart = src_child
                    .attribute(key)
                    .and_then(|value| repr_util::lookup_child(&dst, key, &value));

                match counterpart {
                    Some(child) => pending.push((child, src_child)),
                    None => {
                        let copy = src_child.duplicate_in(&doc);
                        dst.append_child(&copy)?;
                    }
                }
            }

            for record in src.attribute_list() {
                dst.set_attribute(record.key.as_str(), Some(&*record.value))?;
            }
        }

        Ok(())
    }

    /// Registers an observer for changes to this node only.
    pub fn add_observer(&self, observer: Rc<dyn NodeObserver>) {
        self.data_mut(|d| d.observers.add(observer));
    }

    /// Removes one registration of `observer` made with [`add_observer()`](Self::add_observer).
    ///
    /// Returns `false` if the observer was not registered; removing twice is harmless.
    pub fn remove_observer<O: NodeObserver + ?Sized>(&self, observer: &Rc<O>) -> bool {
        self.data_mut(|d| d.observers.remove(observer))
    }

    /// Registers an observer for changes to this node and all of its descendants.
    pub fn add_subtree_observer(&self, observer: Rc<dyn NodeObserver>) {
        self.data_mut(|d| d.subtree_observers.add(observer));
        self.shared().subtree_registration_added();
    }

    pub fn remove_subtree_observer<O: NodeObserver + ?Sized>(&self, observer: &Rc<O>) -> bool {
        let removed = self.data_mut(|d| d.subtree_observers.remove(observer));

        if removed {
            self.shared().subtree_registrations_removed(1);
        }

        removed
    }

    pub fn observer_count(&self) -> usize {
        self.data().observers.len()
    }

    pub fn subtree_observer_count(&self) -> usize {
        self.data().subtree_observers.len()
    }

    pub(crate) fn add_tagged_observer(
        &self,
        observer: Rc<dyn NodeObserver>,
        tag: Rc<dyn std::any::Any>,
    ) {
        self.data_mut(|d| d.observers.add_tagged(observer, Some(tag)));
    }

    pub(crate) fn remove_tagged_observers(&self, tag: &Rc<dyn std::any::Any>) -> usize {
        self.data_mut(|d| d.observers.remove_tagged(tag))
    }

    /// Sends `observer` the notifications needed to build the node's current state from
    /// nothing.
    ///
    /// These are one `notify_attribute_changed` per attribute with no old value, one
    /// `notify_content_changed` if the node has content, and one `notify_child_added` per
    /// child in order.
    pub fn synthesize_events(&self, observer: &dyn NodeObserver) {
        for record in self.attribute_list() {
            observer.notify_attribute_changed(self, &record.key, None, Some(&record.value));
        }

        if let Some(content) = self.content() {
            observer.notify_content_changed(self, None, Some(&content));
        }

        let children: Vec<Node> = self.children().collect();
        let mut prev: Option<Node> = None;

        for child in children {
            observer.notify_child_added(self, &child, prev.as_ref());
            prev = Some(child);
        }
    }

    fn notify<F>(&self, f: F)
    where
        F: Fn(&dyn NodeObserver),
    {
        let doc = self.shared();
        let _pass = doc.begin_dispatch();

        let direct = self.data().observers.snapshot();
        for registration in direct.iter().filter(|r| r.is_active()) {
            f(registration.observer());
        }

        if !doc.has_subtree_observers() {
            return;
        }

        let mut node = Some(self.clone());

        while let Some(n) = node {
            let subtree = n.data().subtree_observers.snapshot();
            for registration in subtree.iter() {
                if registration.is_active() {
                    f(registration.observer());
                }
            }

            node = n.parent();
        }
    }

    fn check_dispatch_depth(&self, doc: &DocumentShared) -> Result<(), TreeError> {
        if doc.dispatch_depth() >= limits::MAX_NOTIFICATION_DEPTH {
            Err(self.reject(
                doc,
                TreeError::ObserverProtocol(format!(
                    "notifications nested more than {} levels deep",
                    limits::MAX_NOTIFICATION_DEPTH
                )),
            ))
        } else {
            Ok(())
        }
    }

    fn check_is_child(&self, doc: &DocumentShared, node: &Node) -> Result<(), TreeError> {
        if node.parent().as_ref() == Some(self) {
            Ok(())
        } else {
            Err(self.reject(
                doc,
                TreeError::InvalidOperation(format!("{} is not a child of {}", node, self)),
            ))
        }
    }

    fn check_can_adopt(&self, doc: &DocumentShared, child: &Node) -> Result<(), TreeError> {
        if !self.same_document(child) {
            return Err(self.reject(doc, TreeError::CrossDocument));
        }

        let parent_type = self.node_type();
        let child_type = child.node_type();

        let problem = if !parent_type.can_have_children() {
            Some(format!("{} nodes cannot have children", parent_type))
        } else if child_type == NodeType::Document {
            Some(String::from("a document node cannot be a child"))
        } else if child.parent().is_some() {
            Some(format!("{} already has a parent", child))
        } else if child == self
            || (child.first_child().is_some() && child.is_ancestor_of(self))
        {
            Some(format!("cannot insert {} into its own subtree", child))
        } else if parent_type == NodeType::Document && child_type == NodeType::Text {
            Some(String::from("a document node cannot contain text"))
        } else if parent_type == NodeType::Document
            && child_type == NodeType::Element
            && self.children().any(|c| c.node_type() == NodeType::Element)
        {
            Some(String::from("the document already has a root element"))
        } else {
            None
        };

        match problem {
            Some(s) => Err(self.reject(doc, TreeError::InvalidOperation(s))),
            None => Ok(()),
        }
    }

    fn reject(&self, doc: &DocumentShared, err: TreeError) -> TreeError {
        repr_log!(doc.session(), "rejected mutation of {}: {}", self, err);
        err
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.data();

        match (data.node_type, data.name.as_ref()) {
            (NodeType::Element, Some(name)) => write!(f, "<{}>", name),
            (NodeType::ProcessingInstruction, Some(target)) => write!(f, "<?{}?>", target),
            (NodeType::Document, _) => write!(f, "#document"),
            (NodeType::Text, _) => write!(f, "#text"),
            (NodeType::Comment, _) => write!(f, "#comment"),
            (node_type, None) => write!(f, "#{}", node_type),
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({})", self)
    }
}

fn push_children_reversed(pending: &mut Vec<(Node, Node)>, source: &Node, copy: &Node) {
    let mut child = source.last_child();

    while let Some(c) = child {
        child = c.prev();
        pending.push((c, copy.clone()));
    }
}

/// Iterator over the children of a node, from [`Node::children`].
pub struct Children {
    next: Option<Node>,
}

impl Iterator for Children {
    type Item = Node;

    fn next(&mut self) -> Option<Node> {
        let node = self.next.take()?;
        self.next = node.next();
        Some(node)
    }
}
