//! Main document type and the state shared by all of its nodes.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::error::TreeError;
use crate::gc::SoftPtr;
use crate::names::{Name, NameCode, NameTable};
use crate::node::{Node, NodeType};
use crate::repr_log;
use crate::session::Session;

/// State of a document that every node in it can reach.
///
/// Each node holds a strong reference to this, so the document outlives every one of its
/// nodes.  This only holds a weak reference to the document node, which is owned by the
/// [`Document`] handles; if those all go away while other nodes are still alive, the
/// document node is finalized and a fresh, empty one is made the next time somebody asks
/// for it.
pub(crate) struct DocumentShared {
    names: RefCell<NameTable>,
    session: Session,
    live_nodes: Cell<usize>,
    dispatch_depth: Cell<usize>,
    subtree_registrations: Cell<usize>,
    document_node: RefCell<SoftPtr>,
}

impl DocumentShared {
    fn new(session: Session) -> Rc<DocumentShared> {
        Rc::new(DocumentShared {
            names: RefCell::new(NameTable::new()),
            session,
            live_nodes: Cell::new(0),
            dispatch_depth: Cell::new(0),
            subtree_registrations: Cell::new(0),
            document_node: RefCell::new(SoftPtr::null()),
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn intern(&self, s: &str) -> Name {
        self.names.borrow_mut().intern(s)
    }

    pub fn find_name(&self, s: &str) -> Option<Name> {
        self.names.borrow().find(s)
    }

    pub fn lookup_name(&self, code: NameCode) -> Option<Name> {
        self.names.borrow().lookup(code)
    }

    pub fn node_created(&self) {
        self.live_nodes.set(self.live_nodes.get() + 1);
    }

    /// Called when a node's data is dropped, with the number of subtree observers that
    /// were still registered on it.
    pub fn node_finalized(&self, subtree_registrations: usize) {
        self.live_nodes.set(self.live_nodes.get() - 1);
        self.subtree_registrations_removed(subtree_registrations);
    }

    pub fn live_nodes(&self) -> usize {
        self.live_nodes.get()
    }

    pub fn subtree_registration_added(&self) {
        self.subtree_registrations
            .set(self.subtree_registrations.get() + 1);
    }

    pub fn subtree_registrations_removed(&self, n: usize) {
        self.subtree_registrations
            .set(self.subtree_registrations.get() - n);
    }

    /// Whether any node of this document has a subtree observer.  When none does,
    /// notifications do not need to walk up the ancestors.
    pub fn has_subtree_observers(&self) -> bool {
        self.subtree_registrations.get() > 0
    }

    pub fn dispatch_depth(&self) -> usize {
        self.dispatch_depth.get()
    }

    /// Marks the start of a notification pass; the pass ends when the guard is dropped.
    pub fn begin_dispatch(self: &Rc<Self>) -> DispatchPass {
        self.dispatch_depth.set(self.dispatch_depth.get() + 1);

        DispatchPass { doc: self.clone() }
    }

    /// Returns the document node, creating an empty one if the previous one was
    /// finalized.
    pub fn document_node(self: &Rc<Self>) -> Node {
        let existing = self.document_node.borrow().get();

        if let Some(node) = existing {
            return node;
        }

        if self.live_nodes() > 0 {
            repr_log!(
                self.session(),
                "document node was finalized while {} nodes are alive; making a new one",
                self.live_nodes()
            );
        }

        let node = Node::new_in(self, NodeType::Document, None, None);
        self.document_node.borrow_mut().set(Some(&node));
        node
    }
}

/// Guard for one notification pass, from [`DocumentShared::begin_dispatch`].
pub(crate) struct DispatchPass {
    doc: Rc<DocumentShared>,
}

impl Drop for DispatchPass {
    fn drop(&mut self) {
        let depth = self.doc.dispatch_depth.get();
        self.doc.dispatch_depth.set(depth - 1);
    }
}

/// An XML document: the factory for its nodes and the owner of its name table.
///
/// A `Document` is a handle to the document node, the invisible node at the top of the
/// tree whose children are the root element and any top-level comments or processing
/// instructions.  Cloning the handle does not copy the document.
///
/// The handles own the document node, and through it the whole tree.  The rest of the
/// document (its identity and its name table) lives for as long as any of its nodes does,
/// so [`Node::document`] always works.  If every `Document` handle is dropped, the
/// document node goes away and its children are left without a parent; asking a
/// surviving node for its document then yields the same document with a new, empty
/// document node.
#[derive(Clone)]
pub struct Document {
    node: Node,
}

impl Document {
    /// Creates an empty document with the default [`Session`].
    pub fn new() -> Document {
        Document::new_with_session(Session::default())
    }

    pub fn new_with_session(session: Session) -> Document {
        let shared = DocumentShared::new(session);
        let node = shared.document_node();

        repr_log!(shared.session(), "created document");

        Document { node }
    }

    pub(crate) fn from_node(node: Node) -> Document {
        assert!(node.node_type() == NodeType::Document);

        Document { node }
    }

    pub(crate) fn shared(&self) -> Rc<DocumentShared> {
        self.node.shared()
    }

    /// The document node itself, for use with the generic [`Node`] API.
    pub fn as_node(&self) -> &Node {
        &self.node
    }

    /// The root element, if the document has one.
    pub fn root(&self) -> Option<Node> {
        self.node
            .children()
            .find(|c| c.node_type() == NodeType::Element)
    }

    /// Appends a top-level node; see [`Node::append_child`].
    ///
    /// A document can hold at most one element, and no text.
    pub fn append_child(&self, child: &Node) -> Result<(), TreeError> {
        self.node.append_child(child)
    }

    /// Creates a parentless element named `name`, such as `"svg:rect"`.
    ///
    /// # Panics
    ///
    /// Panics if `name` is empty.
    pub fn create_element(&self, name: &str) -> Node {
        assert!(!name.is_empty(), "element name must not be empty");

        let shared = self.shared();
        let name = shared.intern(name);
        Node::new_in(&shared, NodeType::Element, Some(name), None)
    }

    pub fn create_text(&self, content: &str) -> Node {
        Node::new_in(
            &self.shared(),
            NodeType::Text,
            None,
            Some(content.to_string()),
        )
    }

    pub fn create_comment(&self, content: &str) -> Node {
        Node::new_in(
            &self.shared(),
            NodeType::Comment,
            None,
            Some(content.to_string()),
        )
    }

    /// Creates a processing instruction like `<?xml-stylesheet href="a.css"?>`.
    pub fn create_pi(&self, target: &str, content: &str) -> Node {
        let shared = self.shared();
        let target = shared.intern(target);

        Node::new_in(
            &shared,
            NodeType::ProcessingInstruction,
            Some(target),
            Some(content.to_string()),
        )
    }

    /// Interns `s` in this document's name table.
    pub fn intern(&self, s: &str) -> Name {
        self.shared().intern(s)
    }

    pub fn name_for_code(&self, code: NameCode) -> Option<Name> {
        self.shared().lookup_name(code)
    }

    /// Number of nodes of this document that have not been finalized yet, counting the
    /// document node itself.
    pub fn live_node_count(&self) -> usize {
        self.shared().live_nodes()
    }

    pub fn session(&self) -> Session {
        self.shared().session().clone()
    }
}

impl Default for Document {
    fn default() -> Document {
        Document::new()
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Document) -> bool {
        self.node.same_document(&other.node)
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("root", &self.root())
            .field("live_nodes", &self.live_node_count())
            .finish()
    }
}
