//! html5ever TreeSink writing directly into the arena document

use crate::dom::{Document, NodeData, NodeId, QuirksMode};
use html5ever::tendril::StrTendril;
use html5ever::tree_builder::ElementFlags;
use html5ever::{local_name, ns, QualName};
use markup5ever::interface::tree_builder::{NodeOrText, TreeSink};
use markup5ever::Attribute;
use std::borrow::Cow;
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Sink that builds a [`Document`] as the tree builder emits nodes.
///
/// Handles are [`NodeId`]s straight out of the arena, so the finished
/// document needs no conversion pass and keeps whitespace-only text nodes
/// (visible-text collapsing happens at serialization time).
pub struct DocumentSink {
    doc: RefCell<Document>,
    /// Qualified names for elements, boxed so references handed out by
    /// `elem_name` stay valid while the map grows
    names: RefCell<HashMap<NodeId, Box<QualName>>>,
}

impl DocumentSink {
    pub fn new() -> Self {
        Self {
            doc: RefCell::new(Document::new()),
            names: RefCell::new(HashMap::new()),
        }
    }

    pub fn into_document(self) -> Document {
        self.doc.into_inner()
    }
}

impl Default for DocumentSink {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeSink for DocumentSink {
    type Handle = NodeId;
    type Output = Self;
    type ElemName<'a>
        = &'a QualName
    where
        Self: 'a;

    fn finish(self) -> Self::Output {
        self
    }

    fn parse_error(&self, msg: Cow<'static, str>) {
        log::debug!("html parse error (recovered): {msg}");
    }

    fn get_document(&self) -> NodeId {
        self.doc.borrow().root()
    }

    fn elem_name<'a>(&'a self, target: &'a NodeId) -> Self::ElemName<'a> {
        let names = self.names.borrow();
        if let Some(name) = names.get(target) {
            let ptr: *const QualName = &**name;
            // SAFETY: the boxed QualName is heap-allocated and is neither
            // mutated nor removed from the map while the sink is alive, so
            // the allocation outlives the returned reference even if the
            // map itself reallocates.
            return unsafe { &*ptr };
        }
        static DEFAULT_QNAME: OnceLock<QualName> = OnceLock::new();
        DEFAULT_QNAME.get_or_init(|| QualName::new(None, ns!(html), local_name!("")))
    }

    fn create_element(&self, name: QualName, attrs: Vec<Attribute>, _flags: ElementFlags) -> NodeId {
        let mut doc = self.doc.borrow_mut();
        let id = doc.create_element(&name.local);
        if let Some(data) = doc.element_mut(id) {
            // Duplicate attributes: first occurrence wins
            for attr in &attrs {
                data.set_attr_if_missing(attr.name.local.to_string(), attr.value.to_string());
            }
        }
        self.names.borrow_mut().insert(id, Box::new(name));
        id
    }

    fn create_comment(&self, text: StrTendril) -> NodeId {
        self.doc.borrow_mut().create_comment(text.to_string())
    }

    fn create_pi(&self, target: StrTendril, data: StrTendril) -> NodeId {
        // HTML treats processing instructions as bogus comments
        self.doc
            .borrow_mut()
            .create_comment(format!("?{target} {data}"))
    }

    fn append(&self, parent: &NodeId, child: NodeOrText<NodeId>) {
        let mut doc = self.doc.borrow_mut();
        match child {
            NodeOrText::AppendNode(node) => doc.append(*parent, node),
            NodeOrText::AppendText(text) => {
                // The tokenizer may deliver one text run in several pieces
                if let Some(&last) = doc.children(*parent).last() {
                    if let NodeData::Text(existing) = doc.data(last) {
                        let merged = format!("{existing}{text}");
                        doc.set_text(last, merged);
                        return;
                    }
                }
                let node = doc.create_text(text.to_string());
                doc.append(*parent, node);
            }
        }
    }

    fn append_based_on_parent_node(&self, element: &NodeId, prev: &NodeId, child: NodeOrText<NodeId>) {
        let has_parent = self.doc.borrow().parent(*element).is_some();
        if has_parent {
            self.append_before_sibling(element, child);
        } else {
            self.append(prev, child);
        }
    }

    fn append_doctype_to_document(&self, name: StrTendril, _public: StrTendril, _system: StrTendril) {
        let mut doc = self.doc.borrow_mut();
        doc.set_doctype(name.to_string());
        let doctype = doc.create_doctype(name.to_string());
        let root = doc.root();
        doc.append(root, doctype);
    }

    fn get_template_contents(&self, target: &NodeId) -> NodeId {
        *target
    }

    fn same_node(&self, x: &NodeId, y: &NodeId) -> bool {
        x == y
    }

    fn set_quirks_mode(&self, mode: html5ever::tree_builder::QuirksMode) {
        use html5ever::tree_builder::QuirksMode as Html5Quirks;
        let mapped = match mode {
            Html5Quirks::Quirks => QuirksMode::Quirks,
            Html5Quirks::LimitedQuirks => QuirksMode::LimitedQuirks,
            Html5Quirks::NoQuirks => QuirksMode::NoQuirks,
        };
        self.doc.borrow_mut().set_quirks_mode(mapped);
    }

    fn append_before_sibling(&self, sibling: &NodeId, new_node: NodeOrText<NodeId>) {
        let mut doc = self.doc.borrow_mut();
        let node = match new_node {
            NodeOrText::AppendNode(node) => node,
            NodeOrText::AppendText(text) => doc.create_text(text.to_string()),
        };
        doc.insert_before(*sibling, node);
    }

    fn add_attrs_if_missing(&self, target: &NodeId, attrs: Vec<Attribute>) {
        let mut doc = self.doc.borrow_mut();
        if let Some(data) = doc.element_mut(*target) {
            for attr in &attrs {
                data.set_attr_if_missing(attr.name.local.to_string(), attr.value.to_string());
            }
        }
    }

    fn remove_from_parent(&self, target: &NodeId) {
        self.doc.borrow_mut().remove(*target);
    }

    fn reparent_children(&self, node: &NodeId, new_parent: &NodeId) {
        self.doc.borrow_mut().reparent_children(*node, *new_parent);
    }
}
