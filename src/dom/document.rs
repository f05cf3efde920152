//! Arena-backed mutable DOM document

use super::element::ElementKind;
use super::node::{ElementData, Node, NodeData, NodeId};

/// Quirks mode determined by the parser from the doctype
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuirksMode {
    #[default]
    NoQuirks,
    LimitedQuirks,
    Quirks,
}

/// The DOM document.
///
/// Nodes live in an arena and are addressed by [`NodeId`]. Removing a node
/// detaches its subtree from the tree; the handles stay valid until the
/// document is dropped. Handles must not be mixed between documents.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    quirks_mode: QuirksMode,
    doctype: Option<String>,
}

impl Document {
    /// Create a new empty document (root node only)
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(NodeData::Document)],
            quirks_mode: QuirksMode::default(),
            doctype: None,
        }
    }

    /// Handle of the document root
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn quirks_mode(&self) -> QuirksMode {
        self.quirks_mode
    }

    pub(crate) fn set_quirks_mode(&mut self, mode: QuirksMode) {
        self.quirks_mode = mode;
    }

    /// Doctype name recorded by the parser, if any
    pub fn doctype(&self) -> Option<&str> {
        self.doctype.as_deref()
    }

    pub(crate) fn set_doctype(&mut self, name: String) {
        self.doctype = Some(name);
    }

    /// Number of nodes ever created in this document
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    // --- node access ---

    /// Node payload
    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0].data
    }

    /// Element data if the node is an element
    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        self.nodes[id.0].data.as_element()
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match &mut self.nodes[id.0].data {
            NodeData::Element(data) => Some(data),
            _ => None,
        }
    }

    /// Element kind, or `None` for non-element nodes
    pub fn kind(&self, id: NodeId) -> Option<ElementKind> {
        self.element(id).map(ElementData::kind)
    }

    /// Lowercase tag name for element nodes
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(ElementData::tag_name)
    }

    /// Attribute lookup shorthand
    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|e| e.attr(name))
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Position of a node among its parent's children
    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|c| *c == id)
    }

    // --- creation ---

    fn push_node(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(data));
        id
    }

    /// Create a detached element node
    pub fn create_element(&mut self, tag_name: &str) -> NodeId {
        self.push_node(NodeData::Element(ElementData::new(tag_name)))
    }

    /// Create a detached element with attributes
    pub fn create_element_with_attrs<'a, I>(&mut self, tag_name: &str, attrs: I) -> NodeId
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut data = ElementData::new(tag_name);
        for (name, value) in attrs {
            data.set_attr_if_missing(name, value);
        }
        self.push_node(NodeData::Element(data))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push_node(NodeData::Text(text.into()))
    }

    /// Create a detached comment node
    pub fn create_comment(&mut self, text: impl Into<String>) -> NodeId {
        self.push_node(NodeData::Comment(text.into()))
    }

    /// Create a detached doctype node
    pub(crate) fn create_doctype(&mut self, name: impl Into<String>) -> NodeId {
        self.push_node(NodeData::Doctype { name: name.into() })
    }

    // --- mutation ---

    /// Append `child` as the last child of `parent`, detaching it first.
    ///
    /// Appending a node into its own subtree is refused.
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        if self.would_cycle(parent, child) {
            log::warn!("refusing to append node into its own subtree");
            return;
        }
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Insert `new` immediately before `sibling` under the same parent.
    /// Returns false when `sibling` has no parent.
    pub fn insert_before(&mut self, sibling: NodeId, new: NodeId) -> bool {
        let Some(parent) = self.parent(sibling) else {
            return false;
        };
        if self.would_cycle(parent, new) {
            log::warn!("refusing to insert node into its own subtree");
            return false;
        }
        self.detach(new);
        let pos = self.nodes[parent.0]
            .children
            .iter()
            .position(|c| *c == sibling)
            .unwrap_or(self.nodes[parent.0].children.len());
        self.nodes[new.0].parent = Some(parent);
        self.nodes[parent.0].children.insert(pos, new);
        true
    }

    /// Detach a node (and its subtree) from its parent
    pub fn remove(&mut self, id: NodeId) {
        self.detach(id);
    }

    /// Replace an existing child with another node.
    /// Returns false when `old` has no parent.
    pub fn replace(&mut self, old: NodeId, new: NodeId) -> bool {
        if !self.insert_before(old, new) {
            return false;
        }
        self.detach(old);
        true
    }

    /// Detach all children of `parent` and attach `children` instead
    pub fn replace_children(&mut self, parent: NodeId, children: Vec<NodeId>) {
        let old: Vec<NodeId> = self.nodes[parent.0].children.drain(..).collect();
        for child in old {
            self.nodes[child.0].parent = None;
        }
        for child in children {
            self.append(parent, child);
        }
    }

    /// Move all children of `from` onto the end of `to`'s child list
    pub fn reparent_children(&mut self, from: NodeId, to: NodeId) {
        let moved: Vec<NodeId> = self.nodes[from.0].children.drain(..).collect();
        for child in &moved {
            self.nodes[child.0].parent = Some(to);
        }
        self.nodes[to.0].children.extend(moved);
    }

    /// Overwrite the content of a text node. No-op for other node kinds.
    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) {
        if let NodeData::Text(content) = &mut self.nodes[id.0].data {
            *content = text.into();
        }
    }

    fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|c| *c != id);
        }
    }

    fn would_cycle(&self, parent: NodeId, child: NodeId) -> bool {
        parent == child || self.ancestors(parent).any(|a| a == child)
    }

    /// Deep-copy a subtree from another document, returning the detached root
    /// of the copy. Used by fragment parsing (`innerHTML`).
    pub fn import_subtree(&mut self, src: &Document, src_id: NodeId) -> NodeId {
        let copy = self.push_node(src.data(src_id).clone());
        let children: Vec<NodeId> = src.children(src_id).to_vec();
        for child in children {
            let imported = self.import_subtree(src, child);
            self.append(copy, imported);
        }
        copy
    }

    // --- traversal ---

    /// Depth-first iterator over a subtree in document order, starting with
    /// (and including) `id`
    pub fn subtree(&self, id: NodeId) -> Subtree<'_> {
        Subtree {
            doc: self,
            stack: vec![id],
        }
    }

    /// Ancestors of a node, nearest first, excluding the node itself
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            doc: self,
            next: self.parent(id),
        }
    }

    /// All element nodes in document order
    pub fn elements(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.subtree(self.root())
            .filter(|id| self.data(*id).is_element())
    }

    /// The `<html>` element, when present
    pub fn document_element(&self) -> Option<NodeId> {
        self.children(self.root())
            .iter()
            .copied()
            .find(|id| self.data(*id).is_element())
    }

    /// The `<head>` element, when present
    pub fn head(&self) -> Option<NodeId> {
        self.find_child_element(self.document_element()?, ElementKind::Head)
    }

    /// The `<body>` element, when present
    pub fn body(&self) -> Option<NodeId> {
        self.find_child_element(self.document_element()?, ElementKind::Body)
    }

    fn find_child_element(&self, parent: NodeId, kind: ElementKind) -> Option<NodeId> {
        self.children(parent)
            .iter()
            .copied()
            .find(|id| self.kind(*id) == Some(kind))
    }

    /// First element with a matching `id` attribute, in document order
    pub fn get_element_by_id(&self, id_value: &str) -> Option<NodeId> {
        self.elements()
            .find(|id| self.element(*id).and_then(ElementData::id) == Some(id_value))
    }

    /// All elements with the given tag name, in document order
    pub fn get_elements_by_tag_name(&self, tag: &str) -> Vec<NodeId> {
        let tag = tag.to_ascii_lowercase();
        self.elements()
            .filter(|id| self.tag_name(*id) == Some(tag.as_str()))
            .collect()
    }

    /// All elements carrying the given class, in document order
    pub fn get_elements_by_class_name(&self, class: &str) -> Vec<NodeId> {
        self.elements()
            .filter(|id| self.element(*id).is_some_and(|e| e.has_class(class)))
            .collect()
    }

    /// Concatenated descendant text, without any display filtering
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        for node in self.subtree(id) {
            if let NodeData::Text(text) = self.data(node) {
                out.push_str(text);
            }
        }
        out
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Depth-first document-order iterator
pub struct Subtree<'a> {
    doc: &'a Document,
    stack: Vec<NodeId>,
}

impl Iterator for Subtree<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        let children = self.doc.children(id);
        self.stack.extend(children.iter().rev());
        Some(id)
    }
}

/// Nearest-first ancestor iterator
pub struct Ancestors<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.next?;
        self.next = self.doc.parent(id);
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Document, NodeId, NodeId, NodeId) {
        let mut doc = Document::new();
        let html = doc.create_element("html");
        let body = doc.create_element("body");
        let div = doc.create_element("div");
        doc.element_mut(div).unwrap().set_attr("id", "main");
        let text = doc.create_text("Hello");
        doc.append(doc.root(), html);
        doc.append(html, body);
        doc.append(body, div);
        doc.append(div, text);
        (doc, html, body, div)
    }

    #[test]
    fn test_tree_links() {
        let (doc, html, body, div) = sample();
        assert_eq!(doc.parent(div), Some(body));
        assert_eq!(doc.parent(html), Some(doc.root()));
        assert_eq!(doc.children(body), &[div]);
        assert_eq!(doc.index_in_parent(div), Some(0));
    }

    #[test]
    fn test_document_order_traversal() {
        let (doc, _, body, _) = sample();
        let tags: Vec<&str> = doc
            .subtree(doc.root())
            .filter_map(|id| doc.tag_name(id))
            .collect();
        assert_eq!(tags, vec!["html", "body", "div"]);
        let ancestors: Vec<NodeId> = doc.ancestors(body).collect();
        assert_eq!(ancestors.len(), 2);
    }

    #[test]
    fn test_get_element_by_id() {
        let (doc, _, _, div) = sample();
        assert_eq!(doc.get_element_by_id("main"), Some(div));
        assert_eq!(doc.get_element_by_id("nope"), None);
    }

    #[test]
    fn test_remove_detaches_subtree() {
        let (mut doc, _, body, div) = sample();
        doc.remove(div);
        assert!(doc.children(body).is_empty());
        assert_eq!(doc.parent(div), None);
        // Handle stays valid after detach
        assert_eq!(doc.tag_name(div), Some("div"));
    }

    #[test]
    fn test_insert_before() {
        let (mut doc, _, body, div) = sample();
        let p = doc.create_element("p");
        assert!(doc.insert_before(div, p));
        assert_eq!(doc.children(body), &[p, div]);
    }

    #[test]
    fn test_replace_children() {
        let (mut doc, _, body, div) = sample();
        let span = doc.create_element("span");
        doc.replace_children(body, vec![span]);
        assert_eq!(doc.children(body), &[span]);
        assert_eq!(doc.parent(div), None);
    }

    #[test]
    fn test_cycle_refused() {
        let (mut doc, _, body, div) = sample();
        doc.append(div, body);
        // body must still be the parent of div
        assert_eq!(doc.parent(div), Some(body));
    }

    #[test]
    fn test_text_content_ignores_display() {
        let (mut doc, _, body, _) = sample();
        let hidden = doc.create_element("span");
        doc.element_mut(hidden).unwrap().set_attr("style", "display:none");
        let t = doc.create_text(" World");
        doc.append(hidden, t);
        doc.append(body, hidden);
        assert_eq!(doc.text_content(body), "Hello World");
    }

    #[test]
    fn test_import_subtree() {
        let (src, _, _, div) = sample();
        let mut dst = Document::new();
        let copy = dst.import_subtree(&src, div);
        assert_eq!(dst.tag_name(copy), Some("div"));
        assert_eq!(dst.text_content(copy), "Hello");
        assert_eq!(dst.parent(copy), None);
    }
}
