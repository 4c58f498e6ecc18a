//! Namespace prefixes used in SVG documents written by the editor.
//!
//! Names in a tree are kept as prefixed strings like `"svg:rect"` or `"inkscape:label"`;
//! the prefix is resolved to a namespace URI only when needed, through the fixed table of
//! well known prefixes here.

use markup5ever::{namespace_url, ns, LocalName, Namespace, Prefix, QualName};
use once_cell::sync::Lazy;

use crate::node::{Node, NodeType};

pub const SODIPODI_NS_URI: &str = "http://sodipodi.sourceforge.net/DTD/sodipodi-0.dtd";
pub const INKSCAPE_NS_URI: &str = "http://www.inkscape.org/namespaces/inkscape";
pub const RDF_NS_URI: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const CC_NS_URI: &str = "http://creativecommons.org/ns#";
pub const DC_NS_URI: &str = "http://purl.org/dc/elements/1.1/";

static KNOWN_PREFIXES: Lazy<Vec<(&'static str, Namespace)>> = Lazy::new(|| {
    vec![
        ("svg", ns!(svg)),
        ("xlink", ns!(xlink)),
        ("xml", ns!(xml)),
        ("xmlns", ns!(xmlns)),
        ("sodipodi", Namespace::from(SODIPODI_NS_URI)),
        ("inkscape", Namespace::from(INKSCAPE_NS_URI)),
        ("rdf", Namespace::from(RDF_NS_URI)),
        ("cc", Namespace::from(CC_NS_URI)),
        ("dc", Namespace::from(DC_NS_URI)),
    ]
});

/// Returns the prefix of a qualified name, or `None` if it has no colon.
pub fn qname_prefix(name: &str) -> Option<&str> {
    name.split_once(':').map(|(prefix, _)| prefix)
}

/// Returns the part of a qualified name after the colon, or the whole name.
pub fn qname_local_name(name: &str) -> &str {
    match name.split_once(':') {
        Some((_, local)) => local,
        None => name,
    }
}

pub fn uri_for_prefix(prefix: &str) -> Option<Namespace> {
    KNOWN_PREFIXES
        .iter()
        .find(|(p, _)| *p == prefix)
        .map(|(_, ns)| ns.clone())
}

pub fn prefix_for_uri(uri: &str) -> Option<&'static str> {
    KNOWN_PREFIXES
        .iter()
        .find(|(_, ns)| &**ns == uri)
        .map(|(p, _)| *p)
}

/// Builds a [`QualName`] from a prefixed name string.
///
/// Unknown prefixes are kept, with an empty namespace.
pub fn qual_name(name: &str) -> QualName {
    let local = LocalName::from(qname_local_name(name));

    match qname_prefix(name) {
        Some(prefix) => QualName::new(
            Some(Prefix::from(prefix)),
            uri_for_prefix(prefix).unwrap_or_else(|| ns!()),
            local,
        ),
        None => QualName::new(None, ns!(), local),
    }
}

impl Node {
    /// The element name resolved against the well known prefixes.
    pub fn qual_name(&self) -> Option<QualName> {
        match self.node_type() {
            NodeType::Element => self.name().map(|n| qual_name(n.as_str())),
            _ => None,
        }
    }
}
