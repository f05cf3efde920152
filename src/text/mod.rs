//! Visible text rendering and HTML serialization
//!
//! `visible_text` approximates what a user would see: CSS display semantics
//! decide line structure, hidden subtrees are dropped, and inter-element
//! whitespace collapses the way inline formatting contexts collapse it.
//! `inner_html`/`outer_html` serialize subtrees back to markup.

use crate::dom::{is_void_tag, Document, ElementKind, NodeData, NodeId};
use crate::style::{Display, StyleResolver};

/// Visible text of a whole document, rendered from `<body>`
pub fn page_text(doc: &Document) -> String {
    let resolver = StyleResolver::for_document(doc);
    let start = doc.body().unwrap_or_else(|| doc.root());
    visible_text(doc, &resolver, start)
}

/// Visible text of one subtree
pub fn visible_text(doc: &Document, resolver: &StyleResolver, id: NodeId) -> String {
    let mut builder = TextBuilder::new();
    render_node(doc, resolver, id, false, &mut builder);
    builder.finish()
}

fn render_node(
    doc: &Document,
    resolver: &StyleResolver,
    id: NodeId,
    preserve: bool,
    out: &mut TextBuilder,
) {
    match doc.data(id) {
        NodeData::Text(text) => {
            if preserve {
                out.push_raw(text);
            } else {
                out.push_collapsed(text);
            }
        }
        NodeData::Element(data) => {
            if data.kind().is_non_rendered() || data.has_attr("hidden") {
                return;
            }
            let display = resolver.display(doc, id);
            if display == Display::None {
                return;
            }
            if resolver
                .property(doc, id, "visibility")
                .is_some_and(|v| v.eq_ignore_ascii_case("hidden"))
            {
                return;
            }
            render_element(doc, resolver, id, data.kind(), display, preserve, out);
        }
        NodeData::Document => {
            for child in doc.children(id) {
                render_node(doc, resolver, *child, preserve, out);
            }
        }
        NodeData::Doctype { .. } | NodeData::Comment(_) => {}
    }
}

fn render_element(
    doc: &Document,
    resolver: &StyleResolver,
    id: NodeId,
    kind: ElementKind,
    display: Display,
    preserve: bool,
    out: &mut TextBuilder,
) {
    match kind {
        ElementKind::Break => {
            out.force_newline();
            return;
        }
        ElementKind::TextArea => {
            out.break_line();
            out.push_raw(&doc.text_content(id));
            out.break_line();
            return;
        }
        ElementKind::Preformatted => {
            out.break_line();
            for child in doc.children(id) {
                render_node(doc, resolver, *child, true, out);
            }
            out.break_line();
            return;
        }
        ElementKind::Select => {
            render_select(doc, id, out);
            return;
        }
        ElementKind::Input => return,
        _ => {}
    }

    if display == Display::TableRow {
        render_table_row(doc, resolver, id, out);
        return;
    }

    let paragraph = kind == ElementKind::Paragraph;
    let block = paragraph || display.is_block_level() || display == Display::TableCell;
    if paragraph {
        out.break_paragraph();
    } else if block {
        out.break_line();
    }
    for child in doc.children(id) {
        render_node(doc, resolver, *child, preserve, out);
    }
    if paragraph {
        out.break_paragraph();
    } else if block {
        out.break_line();
    }
}

/// Table rows become one line, cells separated by tabs
fn render_table_row(doc: &Document, resolver: &StyleResolver, row: NodeId, out: &mut TextBuilder) {
    let mut cells = Vec::new();
    for child in doc.children(row) {
        if doc.kind(*child).is_some_and(ElementKind::is_cell) {
            cells.push(visible_text(doc, resolver, *child));
        }
    }
    out.break_line();
    out.push_raw(&cells.join("\t"));
    out.break_line();
}

/// A select renders the text of its selected options; with no explicit
/// selection a single-select shows its first option
fn render_select(doc: &Document, select: NodeId, out: &mut TextBuilder) {
    let options: Vec<NodeId> = doc
        .subtree(select)
        .filter(|id| doc.kind(*id) == Some(ElementKind::OptionItem))
        .collect();
    let mut selected: Vec<NodeId> = options
        .iter()
        .copied()
        .filter(|id| doc.element(*id).is_some_and(|e| e.has_attr("selected")))
        .collect();
    let multiple = doc.element(select).is_some_and(|e| e.has_attr("multiple"));
    if selected.is_empty() && !multiple {
        selected.extend(options.first());
    }
    for (i, option) in selected.iter().enumerate() {
        if i > 0 {
            out.force_newline();
        }
        out.push_collapsed(&doc.text_content(*option));
    }
}

/// Whitespace-collapsing text accumulator
struct TextBuilder {
    out: String,
    pending_space: bool,
}

impl TextBuilder {
    fn new() -> Self {
        Self {
            out: String::new(),
            pending_space: false,
        }
    }

    fn push_collapsed(&mut self, text: &str) {
        for ch in text.chars() {
            let ch = if ch == '\u{a0}' { ' ' } else { ch };
            if ch.is_whitespace() {
                self.pending_space = true;
            } else {
                if self.pending_space && !self.out.is_empty() && !self.out.ends_with('\n') {
                    self.out.push(' ');
                }
                self.pending_space = false;
                self.out.push(ch);
            }
        }
    }

    fn push_raw(&mut self, text: &str) {
        self.pending_space = false;
        for ch in text.chars() {
            self.out.push(if ch == '\u{a0}' { ' ' } else { ch });
        }
    }

    /// End the current line, if one is open
    fn break_line(&mut self) {
        self.pending_space = false;
        while self.out.ends_with(' ') || self.out.ends_with('\t') {
            self.out.pop();
        }
        if !self.out.is_empty() && !self.out.ends_with('\n') {
            self.out.push('\n');
        }
    }

    /// End the current paragraph: a blank line follows the content
    fn break_paragraph(&mut self) {
        self.break_line();
        if !self.out.is_empty() && !self.out.ends_with("\n\n") {
            self.out.push('\n');
        }
    }

    /// Unconditional line break (`<br>` semantics: consecutive breaks stack)
    fn force_newline(&mut self) {
        self.pending_space = false;
        while self.out.ends_with(' ') {
            self.out.pop();
        }
        self.out.push('\n');
    }

    fn finish(self) -> String {
        // Cap runs of blank lines at one
        let mut result = String::with_capacity(self.out.len());
        let mut newlines = 0;
        for ch in self.out.chars() {
            if ch == '\n' {
                newlines += 1;
                if newlines <= 2 {
                    result.push(ch);
                }
            } else {
                newlines = 0;
                result.push(ch);
            }
        }
        result.trim_matches(['\n', ' ', '\t']).to_string()
    }
}

/// Serialize the children of a node to markup
pub fn inner_html(doc: &Document, id: NodeId) -> String {
    let mut out = String::new();
    for child in doc.children(id) {
        serialize_node(doc, *child, &mut out);
    }
    out
}

/// Serialize a node (and its subtree) to markup
pub fn outer_html(doc: &Document, id: NodeId) -> String {
    let mut out = String::new();
    serialize_node(doc, id, &mut out);
    out
}

fn serialize_node(doc: &Document, id: NodeId, out: &mut String) {
    match doc.data(id) {
        NodeData::Document => {
            for child in doc.children(id) {
                serialize_node(doc, *child, out);
            }
        }
        NodeData::Doctype { name } => {
            out.push_str("<!DOCTYPE ");
            out.push_str(name);
            out.push('>');
        }
        NodeData::Text(text) => {
            escape_text(text, out);
        }
        NodeData::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        NodeData::Element(data) => {
            out.push('<');
            out.push_str(data.tag_name());
            for (name, value) in data.attrs() {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                escape_attr(value, out);
                out.push('"');
            }
            out.push('>');
            if is_void_tag(data.tag_name()) {
                return;
            }
            if matches!(data.kind(), ElementKind::Script | ElementKind::Style) {
                // Raw text content, never entity-escaped
                out.push_str(&doc.text_content(id));
            } else {
                for child in doc.children(id) {
                    serialize_node(doc, *child, out);
                }
            }
            out.push_str("</");
            out.push_str(data.tag_name());
            out.push('>');
        }
    }
}

fn escape_text(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
}

fn escape_attr(value: &str, out: &mut String) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
}
