// ABOUTME: Arena tree node types shared by the HTML and XML parse paths.
// ABOUTME: Provides NodeData, ElementData, deep subtree copy and structural comparison.

use ego_tree::{NodeId, Tree};

/// The tree type used for every loaded document.
pub type MarkupTree = Tree<NodeData>;

/// Element name plus attributes in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    pub name: String,
    pub attrs: Vec<(String, String)>,
}

impl ElementData {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
        }
    }

    /// Returns the value of the named attribute, if present.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Sets an attribute, replacing any existing value.
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| k == name) {
            Some(entry) => entry.1 = value,
            None => self.attrs.push((name.to_string(), value)),
        }
    }
}

/// One node of a parsed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    /// The document node, always the arena root.
    Document,
    /// `<!DOCTYPE …>` with its name token.
    Doctype(String),
    Element(ElementData),
    Text(String),
    Comment(String),
    ProcessingInstruction { target: String, data: String },
}

impl NodeData {
    pub fn as_element(&self) -> Option<&ElementData> {
        match self {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut ElementData> {
        match self {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            NodeData::Text(t) => Some(t),
            _ => None,
        }
    }
}

/// Deep-copies the subtree rooted at `src_id` under `dst_parent` in another
/// tree. The source tree is untouched. Returns the id of the copied root.
pub fn copy_subtree(
    src: &MarkupTree,
    src_id: NodeId,
    dst: &mut MarkupTree,
    dst_parent: NodeId,
) -> Option<NodeId> {
    let src_node = src.get(src_id)?;
    let new_id = dst.get_mut(dst_parent)?.append(src_node.value().clone()).id();
    for child in src_node.children() {
        copy_subtree(src, child.id(), dst, new_id)?;
    }
    Some(new_id)
}

/// Compares two subtrees by value and shape, ignoring arena identity.
pub fn structural_eq(a: &MarkupTree, a_id: NodeId, b: &MarkupTree, b_id: NodeId) -> bool {
    let (a_node, b_node) = match (a.get(a_id), b.get(b_id)) {
        (Some(x), Some(y)) => (x, y),
        _ => return false,
    };
    if a_node.value() != b_node.value() {
        return false;
    }
    let mut a_children = a_node.children();
    let mut b_children = b_node.children();
    loop {
        match (a_children.next(), b_children.next()) {
            (Some(x), Some(y)) => {
                if !structural_eq(a, x.id(), b, y.id()) {
                    return false;
                }
            }
            (None, None) => return true,
            _ => return false,
        }
    }
}
