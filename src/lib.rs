//! An observable tree of XML nodes, as used by a vector graphics editor to hold its
//! documents.
//!
//! # Some interesting parts of xmlrepr
//!
//! * The [`Document`] struct owns a tree of nodes and interns the element and attribute
//! names used in it.  It is the factory for new nodes.
//!
//! * The [`node`] module provides the [`Node`] handle, with the whole read and mutation
//! API of a node: navigation, attributes, content, and the child-list operations.
//!
//! * The [`observer`] module defines the [`NodeObserver`] trait.  Every mutation is
//! reported synchronously to the observers registered on the mutated node and on its
//! ancestors.
//!
//! * The [`gc`] module describes how node lifetimes work, and provides the [`SoftPtr`]
//! weak reference.
//!
//! * The [`SignalObserver`] struct is a small adapter that turns all structural and
//! attribute changes on a node into a single "changed" callback.
//!
//! * The [`repr_util`] module has lookups and typed attribute accessors built on the node
//! API.
//!
//! # Example
//!
//! ```
//! use xmlrepr::{Document, EventRecorder};
//!
//! let doc = Document::new();
//! let svg = doc.create_element("svg:svg");
//! doc.append_child(&svg).unwrap();
//!
//! let recorder = EventRecorder::new();
//! svg.add_observer(recorder.clone());
//!
//! let rect = doc.create_element("svg:rect");
//! svg.append_child(&rect).unwrap();
//! svg.set_attribute("width", Some("100")).unwrap();
//!
//! assert_eq!(recorder.len(), 2);
//! assert_eq!(svg.attribute("width").as_deref(), Some("100"));
//! ```

#![warn(nonstandard_style, rust_2018_idioms, unused)]
#![warn(trivial_casts, trivial_numeric_casts)]
#![allow(clippy::clone_on_ref_ptr)]
#![allow(clippy::type_complexity)]

pub use crate::attributes::{AttributeRecord, AttributeValue, Attributes, AttributesIter};

pub use crate::document::Document;

pub use crate::error::TreeError;

pub use crate::event_vector::{ListenerData, NodeEventVector};

pub use crate::gc::SoftPtr;

pub use crate::names::{Name, NameCode, NameTable};

pub use crate::node::{Children, Node, NodeType};

pub use crate::observer::{EventRecorder, NodeEvent, NodeObserver};

pub use crate::session::Session;

pub use crate::signal_observer::{HandlerId, SignalObserver};

pub mod attributes;
mod document;
pub mod error;
pub mod event_vector;
pub mod gc;
pub mod limits;
mod log;
pub mod names;
pub mod namespaces;
pub mod node;
pub mod observer;
pub mod repr_util;
mod session;
mod signal_observer;
