//! WebDriver-style element lookup and interaction
//!
//! A thin facade over [`Page`]: locate elements with a [`By`] strategy,
//! then click, type, and read through [`ElementHandle`]s. Handles are
//! plain node references; they survive DOM mutation but interactions
//! refuse elements that are no longer attached to the document.

use crate::dom::{self, ElementKind, NodeId};
use crate::engine::Page;
use crate::forms::{self, FormSubmission};
use crate::style::StyleResolver;
use crate::text;
use crate::utils::{Result, StrixError};

/// Element lookup strategy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum By {
    Id(String),
    Css(String),
    XPath(String),
    Name(String),
    TagName(String),
    /// Anchors whose trimmed visible text equals the given string
    LinkText(String),
}

impl By {
    pub fn id(value: impl Into<String>) -> Self {
        Self::Id(value.into())
    }

    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    pub fn xpath(expr: impl Into<String>) -> Self {
        Self::XPath(expr.into())
    }

    pub fn name(value: impl Into<String>) -> Self {
        Self::Name(value.into())
    }

    pub fn tag_name(value: impl Into<String>) -> Self {
        Self::TagName(value.into())
    }

    pub fn link_text(value: impl Into<String>) -> Self {
        Self::LinkText(value.into())
    }
}

/// Reference to a located element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementHandle(NodeId);

impl ElementHandle {
    pub fn node(self) -> NodeId {
        self.0
    }
}

/// Drives a single page
#[derive(Debug)]
pub struct Driver {
    page: Page,
}

impl Driver {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut Page {
        &mut self.page
    }

    pub fn into_page(self) -> Page {
        self.page
    }

    // --- lookup ---

    /// First element matching the strategy, in document order
    pub fn find(&self, by: &By) -> Result<ElementHandle> {
        self.find_all(by)?
            .into_iter()
            .next()
            .ok_or_else(|| StrixError::NotFound(format!("{by:?}")))
    }

    /// All elements matching the strategy, in document order
    pub fn find_all(&self, by: &By) -> Result<Vec<ElementHandle>> {
        let doc = self.page.document();
        let nodes = match by {
            By::Id(id) => doc.get_element_by_id(id).into_iter().collect(),
            By::Css(selector) => crate::query::select_all(doc, doc.root(), selector)?,
            By::XPath(expr) => dom::xpath::evaluate(doc, expr)?,
            By::Name(name) => doc
                .elements()
                .filter(|id| doc.attr(*id, "name") == Some(name.as_str()))
                .collect(),
            By::TagName(tag) => doc.get_elements_by_tag_name(tag),
            By::LinkText(wanted) => {
                let resolver = StyleResolver::for_document(doc);
                doc.get_elements_by_tag_name("a")
                    .into_iter()
                    .filter(|id| {
                        text::visible_text(doc, &resolver, *id).trim() == wanted.as_str()
                    })
                    .collect()
            }
        };
        Ok(nodes.into_iter().map(ElementHandle).collect())
    }

    fn require_attached(&self, el: ElementHandle) -> Result<NodeId> {
        let doc = self.page.document();
        let node = el.node();
        if node == doc.root() || doc.ancestors(node).any(|a| a == doc.root()) {
            Ok(node)
        } else {
            Err(StrixError::DetachedNode)
        }
    }

    // --- interaction ---

    pub fn click(&mut self, el: ElementHandle) -> Result<()> {
        let node = self.require_attached(el)?;
        self.page.click(node)
    }

    /// Append keystrokes to a text control's value, firing `input` then
    /// `change`
    pub fn type_text(&mut self, el: ElementHandle, keys: &str) -> Result<()> {
        let node = self.require_attached(el)?;
        let doc = self.page.document();
        let current = match doc.kind(node) {
            Some(ElementKind::TextArea) => doc.text_content(node),
            _ => doc.attr(node, "value").unwrap_or("").to_string(),
        };
        self.page.set_value(node, &format!("{current}{keys}"))?;
        self.page.fire_event(node, "input")?;
        Ok(())
    }

    /// Clear a text control
    pub fn clear(&mut self, el: ElementHandle) -> Result<()> {
        let node = self.require_attached(el)?;
        self.page.set_value(node, "")
    }

    /// Set a control's value outright (selects pick the matching option)
    pub fn set_value(&mut self, el: ElementHandle, value: &str) -> Result<()> {
        let node = self.require_attached(el)?;
        self.page.set_value(node, value)
    }

    /// Submit the form the element belongs to
    pub fn submit(&mut self, el: ElementHandle) -> Result<Option<FormSubmission>> {
        let node = self.require_attached(el)?;
        let doc = self.page.document();
        let form = if doc.kind(node) == Some(ElementKind::Form) {
            node
        } else {
            forms::enclosing_form(doc, node)
                .ok_or_else(|| StrixError::NotFound("enclosing form".to_string()))?
        };
        self.page.submit(form, None)
    }

    // --- inspection ---

    /// Visible text of the element's subtree
    pub fn text(&self, el: ElementHandle) -> String {
        let doc = self.page.document();
        let resolver = StyleResolver::for_document(doc);
        text::visible_text(doc, &resolver, el.node())
    }

    pub fn attr(&self, el: ElementHandle, name: &str) -> Option<String> {
        self.page.document().attr(el.node(), name).map(str::to_owned)
    }

    pub fn tag_name(&self, el: ElementHandle) -> Option<String> {
        self.page.document().tag_name(el.node()).map(str::to_owned)
    }

    pub fn value(&self, el: ElementHandle) -> String {
        let doc = self.page.document();
        match doc.kind(el.node()) {
            Some(ElementKind::TextArea) => doc.text_content(el.node()),
            _ => doc.attr(el.node(), "value").unwrap_or("").to_string(),
        }
    }

    pub fn is_displayed(&self, el: ElementHandle) -> bool {
        let doc = self.page.document();
        let resolver = StyleResolver::for_document(doc);
        resolver.is_visible(doc, el.node())
    }

    pub fn is_enabled(&self, el: ElementHandle) -> bool {
        self.page
            .document()
            .element(el.node())
            .is_some_and(|e| !e.is_disabled())
    }

    /// Whether a checkbox/radio is checked or an option is selected
    pub fn is_selected(&self, el: ElementHandle) -> bool {
        let doc = self.page.document();
        match doc.kind(el.node()) {
            Some(ElementKind::OptionItem) => {
                doc.element(el.node()).is_some_and(|e| e.has_attr("selected"))
            }
            _ => doc.element(el.node()).is_some_and(|e| e.has_attr("checked")),
        }
    }

    /// Canonical XPath identifying the element, usable with [`By::XPath`]
    pub fn xpath(&self, el: ElementHandle) -> Option<String> {
        dom::xpath::canonical_xpath(self.page.document(), el.node())
    }
}
