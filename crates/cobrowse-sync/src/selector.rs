//! Stable, serializable element addresses.
//!
//! A [`Selector`] names an element so the peer can find the structurally
//! equivalent one in its own document. Three forms are produced, most
//! specific first:
//!
//! - `#id` when the element has a unique, selector-safe id
//! - `#parentId > tag:nth-child(n)` when the immediate parent has one
//! - `tag:nth-child(n) > … > tag:nth-child(n)` walking down from the root
//!
//! `n` is 1-based among all element children of the parent. `:root`
//! addresses the document node itself.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::page::{Document, NodeId};

const ROOT_SELECTOR: &str = ":root";
const NTH_CHILD: &str = ":nth-child(";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selector(String);

impl Selector {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Selector {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Selector {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Resolve
// ---------------------------------------------------------------------------

/// Build a selector for `node`.
///
/// A node that is not attached to `doc` yields an empty selector, which
/// [`locate`] never matches.
pub fn resolve<D: Document + ?Sized>(doc: &D, node: NodeId) -> Selector {
    if node == doc.root() {
        return Selector::from(ROOT_SELECTOR);
    }
    if let Some(id) = unique_id(doc, node) {
        return Selector(format!("#{id}"));
    }

    let Some((parent, step)) = step_of(doc, node) else {
        return Selector(String::new());
    };
    if let Some(pid) = unique_id(doc, parent) {
        return Selector(format!("#{pid} > {step}"));
    }

    // Only the immediate parent is tried as an anchor.
    let mut steps = vec![step];
    let mut current = parent;
    while current != doc.root() {
        let Some((parent, step)) = step_of(doc, current) else {
            return Selector(String::new());
        };
        steps.push(step);
        current = parent;
    }
    steps.reverse();
    Selector(steps.join(" > "))
}

/// `tag:nth-child(n)` for `node` plus its parent.
fn step_of<D: Document + ?Sized>(doc: &D, node: NodeId) -> Option<(NodeId, String)> {
    let tag = doc.tag(node)?;
    let parent = doc.parent(node)?;
    let index = doc.children(parent).iter().position(|c| *c == node)?;
    Some((parent, format!("{tag}{NTH_CHILD}{})", index + 1)))
}

/// The element's id if it is safe to embed in a selector and addresses
/// exactly this element.
fn unique_id<D: Document + ?Sized>(doc: &D, node: NodeId) -> Option<String> {
    let id = doc.element_id(node)?;
    if !is_selector_safe(&id) {
        return None;
    }
    (doc.find_by_id(&id) == Some(node)).then_some(id)
}

fn is_selector_safe(id: &str) -> bool {
    let mut chars = id.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '-' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

// ---------------------------------------------------------------------------
// Locate
// ---------------------------------------------------------------------------

/// Find the element `selector` addresses. Malformed or unmatched
/// selectors yield `None`.
pub fn locate<D: Document + ?Sized>(doc: &D, selector: &Selector) -> Option<NodeId> {
    let raw = selector.as_str().trim();
    if raw.is_empty() {
        return None;
    }
    if raw == ROOT_SELECTOR {
        return Some(doc.root());
    }

    let mut parts = raw.split('>').map(str::trim);
    let first = parts.next()?;

    let mut current = if let Some(id) = first.strip_prefix('#') {
        if !is_selector_safe(id) {
            return None;
        }
        doc.find_by_id(id)?
    } else {
        descend(doc, doc.root(), first)?
    };

    for part in parts {
        current = descend(doc, current, part)?;
    }
    Some(current)
}

/// Follow one `tag:nth-child(n)` step down from `parent`.
fn descend<D: Document + ?Sized>(doc: &D, parent: NodeId, step: &str) -> Option<NodeId> {
    let (tag, rest) = step.split_once(NTH_CHILD)?;
    let n: usize = rest.strip_suffix(')')?.trim().parse().ok()?;
    if tag.is_empty() || n == 0 {
        return None;
    }
    let child = *doc.children(parent).get(n - 1)?;
    (doc.tag(child)?.eq_ignore_ascii_case(tag)).then_some(child)
}
