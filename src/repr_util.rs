//! Lookups, typed attribute accessors and other helpers built on the [`Node`] API.

use std::cmp::Ordering;

use crate::error::TreeError;
use crate::namespaces::qname_prefix;
use crate::node::{Node, NodeType};

/// Finds the first element named `name` in `node`'s subtree, in document order.
///
/// `node` itself is checked first.  A `max_depth` of `Some(0)` checks only `node`; `None`
/// searches the whole subtree.
pub fn lookup_name(node: &Node, name: &str, max_depth: Option<usize>) -> Option<Node> {
    // Children are pushed last to first, so they are visited in document order.
    let mut pending = vec![(node.clone(), max_depth)];

    while let Some((n, depth)) = pending.pop() {
        if n.name().map_or(false, |nm| nm == name) {
            return Some(n);
        }

        let child_depth = match depth {
            Some(0) => continue,
            Some(d) => Some(d - 1),
            None => None,
        };

        let mut child = n.last_child();
        while let Some(c) = child {
            child = c.prev();
            pending.push((c, child_depth));
        }
    }

    None
}

/// Finds the first child of `node` whose attribute `key` has the value `value`.
pub fn lookup_child(node: &Node, key: &str, value: &str) -> Option<Node> {
    node.children()
        .find(|child| child.attribute(key).map_or(false, |v| &*v == value))
}

/// Removes `node` from its parent, if it has one.
pub fn unparent(node: &Node) -> Result<(), TreeError> {
    match node.parent() {
        Some(parent) => parent.remove_child(node),
        None => Ok(()),
    }
}

/// Returns the deepest node that is an ancestor of both `a` and `b`.
///
/// A node counts as its own ancestor here, so the result may be `a` or `b` themselves.
pub fn lowest_common_ancestor(a: &Node, b: &Node) -> Option<Node> {
    let path_a = path_from_top(a);
    let path_b = path_from_top(b);

    path_a
        .iter()
        .zip(path_b.iter())
        .take_while(|(x, y)| x == y)
        .last()
        .map(|(x, _)| x.clone())
}

// `node` and its ancestors, topmost first.
fn path_from_top(node: &Node) -> Vec<Node> {
    let mut path = Vec::new();
    let mut n = Some(node.clone());

    while let Some(node) = n {
        n = node.parent();
        path.push(node);
    }

    path.reverse();
    path
}

/// Compares the document order of two nodes.
///
/// An ancestor sorts before its descendants.  Returns `None` if the nodes are not in the
/// same tree.
pub fn compare_position(a: &Node, b: &Node) -> Option<Ordering> {
    if a == b {
        return Some(Ordering::Equal);
    }

    let ancestor = lowest_common_ancestor(a, b)?;

    if ancestor == *a {
        return Some(Ordering::Less);
    }

    if ancestor == *b {
        return Some(Ordering::Greater);
    }

    let a_branch = child_on_path(&ancestor, a)?;
    let b_branch = child_on_path(&ancestor, b)?;

    Some(a_branch.position().cmp(&b_branch.position()))
}

// The child of `ancestor` that `node` descends from, or `node` itself.
fn child_on_path(ancestor: &Node, node: &Node) -> Option<Node> {
    let mut n = node.clone();

    loop {
        let parent = n.parent()?;

        if parent == *ancestor {
            return Some(n);
        }

        n = parent;
    }
}

/// Puts every unprefixed element in `node`'s subtree into the namespace of `prefix`.
///
/// `<rect>` becomes `<svg:rect>` for a prefix of `"svg"`.  Elements that already have a
/// prefix keep their names.
pub fn promote_to_namespace(node: &Node, prefix: &str) {
    let doc = node.shared();
    let mut pending = vec![node.clone()];

    while let Some(n) = pending.pop() {
        if n.node_type() != NodeType::Element {
            continue;
        }

        if let Some(name) = n.name() {
            if qname_prefix(name.as_str()).is_none() {
                let promoted = doc.intern(&format!("{}:{}", prefix, name));
                n.set_code_unsafe(promoted.code());
            }
        }

        pending.extend(n.children());
    }
}

/// Reads a boolean attribute.
///
/// `"true"`, `"yes"`, `"y"` and nonzero integers are true; any other value is false.
/// Returns `None` if the attribute is not set.
pub fn get_boolean(node: &Node, key: &str) -> Option<bool> {
    let value = node.attribute(key)?;
    let v = value.trim();

    let b = if v.eq_ignore_ascii_case("true")
        || v.eq_ignore_ascii_case("yes")
        || v.eq_ignore_ascii_case("y")
    {
        true
    } else {
        v.parse::<i64>().map_or(false, |i| i != 0)
    };

    Some(b)
}

pub fn set_boolean(node: &Node, key: &str, value: bool) -> Result<(), TreeError> {
    node.set_attribute(key, Some(if value { "true" } else { "false" }))
}

/// Reads an integer attribute; `None` if it is not set or does not parse.
pub fn get_int(node: &Node, key: &str) -> Option<i32> {
    node.attribute(key)?.trim().parse().ok()
}

pub fn set_int(node: &Node, key: &str, value: i32) -> Result<(), TreeError> {
    node.set_attribute(key, Some(value.to_string().as_str()))
}

/// Reads a floating-point attribute; `None` if it is not set or is not a finite number.
pub fn get_double(node: &Node, key: &str) -> Option<f64> {
    node.attribute(key)?
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|d| d.is_finite())
}

/// Writes `value` with the fewest digits that read back as the same number.
pub fn set_double(node: &Node, key: &str, value: f64) -> Result<(), TreeError> {
    node.set_attribute(key, Some(value.to_string().as_str()))
}
