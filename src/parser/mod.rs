//! Tolerant HTML parsing built on html5ever
//!
//! The HTML5 tree-construction algorithm supplies the tolerance the engine
//! relies on: implied `html`/`head`/`body`, implied `tbody`, recovery from
//! mis-nested and unclosed tags.

mod sink;

pub use sink::DocumentSink;

use crate::dom::{Document, NodeId};
use crate::utils::Result;
use html5ever::tendril::TendrilSink;
use html5ever::tree_builder::TreeBuilderOpts;
use html5ever::{parse_document, ParseOpts};

/// HTML parser producing arena documents
pub struct HtmlParser {
    opts: ParseOpts,
}

impl HtmlParser {
    pub fn new() -> Self {
        Self {
            opts: ParseOpts {
                tree_builder: TreeBuilderOpts {
                    drop_doctype: false,
                    ..Default::default()
                },
                ..Default::default()
            },
        }
    }

    /// Parse a complete HTML document
    pub fn parse(&self, content: &str) -> Result<Document> {
        if content.trim().is_empty() {
            return Ok(Document::new());
        }
        let sink = parse_document(DocumentSink::new(), self.opts.clone()).one(content);
        Ok(sink.into_document())
    }

    /// Parse a markup fragment in a body context.
    ///
    /// Returns the scratch document and the top-level fragment nodes, ready
    /// for [`Document::import_subtree`]. Fragments that only make sense in a
    /// narrower context (a bare `<td>`, say) are reparented or dropped the
    /// way the body insertion mode dictates.
    pub fn parse_fragment(&self, content: &str) -> Result<(Document, Vec<NodeId>)> {
        let doc = self.parse(content)?;
        let roots = match doc.body() {
            Some(body) => doc.children(body).to_vec(),
            None => Vec::new(),
        };
        Ok((doc, roots))
    }
}

impl Default for HtmlParser {
    fn default() -> Self {
        Self::new()
    }
}
