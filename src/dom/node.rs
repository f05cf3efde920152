//! Node data stored in the document arena

use super::element::ElementKind;

/// Handle to a node in a [`super::Document`] arena.
///
/// Handles are stable for the lifetime of the document: removing a node
/// detaches it from the tree but never invalidates other handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Raw index value, used by the JS bridge to key element proxies
    pub fn as_usize(self) -> usize {
        self.0
    }
}

/// Node kinds in the DOM
#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    /// Document root
    Document,
    /// Doctype declaration (e.g. `<!DOCTYPE html>`)
    Doctype { name: String },
    /// Element node (e.g. `<div>`)
    Element(ElementData),
    /// Text node
    Text(String),
    /// Comment node
    Comment(String),
}

impl NodeData {
    /// Get element data if this is an element
    pub fn as_element(&self) -> Option<&ElementData> {
        match self {
            Self::Element(data) => Some(data),
            _ => None,
        }
    }

    /// Text content if this is a text node
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn is_element(&self) -> bool {
        matches!(self, Self::Element(_))
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }
}

/// Data for element nodes
#[derive(Debug, Clone, PartialEq)]
pub struct ElementData {
    /// Lowercase tag name (e.g. "div", "span")
    tag_name: String,
    /// Attributes in insertion order
    attributes: Vec<(String, String)>,
}

impl ElementData {
    /// Create a new element with no attributes
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into().to_ascii_lowercase(),
            attributes: Vec::new(),
        }
    }

    /// The lowercase tag name
    pub fn tag_name(&self) -> &str {
        &self.tag_name
    }

    /// Typed classification of this element
    pub fn kind(&self) -> ElementKind {
        ElementKind::from_tag(&self.tag_name)
    }

    /// Get an attribute value (case-insensitive name)
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    /// Set an attribute, replacing any previous value and keeping its slot
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into().to_ascii_lowercase();
        let value = value.into();
        if let Some(slot) = self.attributes.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            self.attributes.push((name, value));
        }
    }

    /// Set an attribute only if it is not already present (parser semantics
    /// for duplicate attributes: first occurrence wins)
    pub fn set_attr_if_missing(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into().to_ascii_lowercase();
        if !self.has_attr(&name) {
            self.attributes.push((name, value.into()));
        }
    }

    /// Remove an attribute, returning whether it was present
    pub fn remove_attr(&mut self, name: &str) -> bool {
        let before = self.attributes.len();
        self.attributes.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        self.attributes.len() != before
    }

    /// Attributes in insertion order
    pub fn attrs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Get the ID attribute
    pub fn id(&self) -> Option<&str> {
        self.attr("id")
    }

    /// Get class names
    pub fn classes(&self) -> Vec<&str> {
        self.attr("class")
            .map(|c| c.split_whitespace().collect())
            .unwrap_or_default()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().contains(&class)
    }

    /// Whether the element carries the `disabled` attribute
    pub fn is_disabled(&self) -> bool {
        self.has_attr("disabled")
    }
}

/// A node in the arena: payload plus tree links
#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub data: NodeData,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl Node {
    pub(crate) fn new(data: NodeData) -> Self {
        Self {
            data,
            parent: None,
            children: Vec::new(),
        }
    }
}
