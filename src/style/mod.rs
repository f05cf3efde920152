//! Display and visibility resolution
//!
//! Just enough of the cascade to serialize visible text: `display` and
//! `visibility` from inline `style` attributes and `<style>` sheets, plus a
//! user-agent default-display table. No box model, no layout.

use crate::dom::{Document, NodeId};
use crate::query::{self, Selector};
use cssparser::{ParseError, Parser, ParserInput, Token};

/// Display values the text serializer distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Display {
    Block,
    Inline,
    InlineBlock,
    ListItem,
    Table,
    TableRowGroup,
    TableRow,
    TableCell,
    None,
}

impl Display {
    /// Parse a `display` property value
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "block" | "flow-root" | "flex" | "grid" | "table-caption" => Some(Self::Block),
            "inline" => Some(Self::Inline),
            "inline-block" | "inline-flex" | "inline-grid" | "inline-table" => {
                Some(Self::InlineBlock)
            }
            "list-item" => Some(Self::ListItem),
            "table" => Some(Self::Table),
            "table-row-group" | "table-header-group" | "table-footer-group" => {
                Some(Self::TableRowGroup)
            }
            "table-row" => Some(Self::TableRow),
            "table-cell" => Some(Self::TableCell),
            "none" => Some(Self::None),
            _ => None,
        }
    }

    /// Whether the value establishes a line break boundary in visible text
    pub fn is_block_level(self) -> bool {
        matches!(
            self,
            Self::Block | Self::ListItem | Self::Table | Self::TableRowGroup | Self::TableRow
        )
    }
}

/// User-agent default display per tag
pub fn default_display(tag: &str) -> Display {
    match tag {
        "script" | "style" | "head" | "title" | "meta" | "link" | "base" | "template"
        | "noscript" | "datalist" | "param" | "source" | "track" => Display::None,
        "html" | "body" | "div" | "p" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "ul" | "ol"
        | "dl" | "dd" | "dt" | "blockquote" | "pre" | "address" | "article" | "aside"
        | "footer" | "header" | "main" | "nav" | "section" | "figure" | "figcaption" | "hr"
        | "form" | "fieldset" | "legend" | "details" | "summary" | "caption" | "option"
        | "optgroup" => Display::Block,
        "li" => Display::ListItem,
        "table" => Display::Table,
        "thead" | "tbody" | "tfoot" => Display::TableRowGroup,
        "tr" => Display::TableRow,
        "td" | "th" => Display::TableCell,
        "button" | "input" | "select" | "textarea" | "img" => Display::InlineBlock,
        _ => Display::Inline,
    }
}

/// CSS declaration (property: value), value kept as its source text
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub property: String,
    pub value: String,
}

/// CSS rule (selectors + declarations)
#[derive(Debug, Clone)]
pub struct Rule {
    pub selectors: Vec<Selector>,
    pub declarations: Vec<Declaration>,
}

/// Parsed stylesheet
#[derive(Debug, Clone, Default)]
pub struct Stylesheet {
    pub rules: Vec<Rule>,
}

/// Parse the content of a `style` attribute into declarations
pub fn parse_style_attribute(text: &str) -> Vec<Declaration> {
    let mut input = ParserInput::new(text);
    let mut parser = Parser::new(&mut input);
    parse_declaration_block(&mut parser)
}

/// Parse stylesheet text. Rules with selectors outside the supported subset
/// and at-rules are skipped, never fatal.
pub fn parse_stylesheet(content: &str) -> Stylesheet {
    let mut input = ParserInput::new(content);
    let mut parser = Parser::new(&mut input);
    let mut rules = Vec::new();

    while !parser.is_exhausted() {
        parser.skip_whitespace();
        if parser.is_exhausted() {
            break;
        }
        if let Ok(Some(rule)) = parse_rule(&mut parser) {
            rules.push(rule);
        } else {
            skip_to_next_rule(&mut parser);
        }
    }

    Stylesheet { rules }
}

/// Parse a single rule. `Ok(None)` means the rule was well-formed but uses
/// selectors we do not support, so it is dropped.
fn parse_rule<'i>(
    parser: &mut Parser<'i, '_>,
) -> std::result::Result<Option<Rule>, ParseError<'i, ()>> {
    let mut selector_str = String::new();

    loop {
        let state = parser.state();
        // Whitespace tokens matter in the prelude (descendant combinators)
        match parser.next_including_whitespace() {
            Ok(Token::CurlyBracketBlock) => {
                let declarations = parser.parse_nested_block(
                    |p| -> std::result::Result<Vec<Declaration>, ParseError<'i, ()>> {
                        Ok(parse_declaration_block(p))
                    },
                )?;
                return match query::parse_selector_list(selector_str.trim()) {
                    Ok(selectors) => Ok(Some(Rule {
                        selectors,
                        declarations,
                    })),
                    Err(_) => {
                        log::debug!("skipping rule with unsupported selector: {selector_str}");
                        Ok(None)
                    }
                };
            }
            Ok(Token::AtKeyword(_)) => {
                // At-rules are out of scope; let the caller skip past them
                parser.reset(&state);
                return Err(parser.new_custom_error(()));
            }
            Ok(token) => {
                let text = token_text(token);
                selector_str.push_str(&text);
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// Advance past the next block or semicolon so a bad rule cannot wedge the
/// parser
fn skip_to_next_rule(parser: &mut Parser<'_, '_>) {
    loop {
        match parser.next() {
            // An unconsumed block token is skipped wholesale by the parser
            Ok(Token::CurlyBracketBlock) | Ok(Token::Semicolon) | Err(_) => break,
            Ok(_) => {}
        }
    }
}

fn parse_declaration_block(parser: &mut Parser<'_, '_>) -> Vec<Declaration> {
    let mut declarations = Vec::new();
    loop {
        parser.skip_whitespace();
        let property = match parser.next() {
            Ok(Token::Ident(name)) => name.to_ascii_lowercase(),
            Ok(_) => {
                skip_past_semicolon(parser);
                continue;
            }
            Err(_) => break,
        };
        if parser.expect_colon().is_err() {
            skip_past_semicolon(parser);
            continue;
        }
        let mut value = String::new();
        loop {
            match parser.next_including_whitespace() {
                Ok(Token::Semicolon) => break,
                Ok(token) => {
                    let text = token_text(token);
                    value.push_str(&text);
                }
                Err(_) => break,
            }
        }
        let value = value.trim().to_string();
        if !value.is_empty() {
            declarations.push(Declaration { property, value });
        }
    }
    declarations
}

fn skip_past_semicolon(parser: &mut Parser<'_, '_>) {
    loop {
        match parser.next() {
            Ok(Token::Semicolon) | Err(_) => break,
            Ok(_) => {}
        }
    }
}

/// Source-text rendition of a token, for selector preludes and values
fn token_text(token: &Token) -> String {
    match token {
        Token::Ident(s) => s.to_string(),
        Token::IDHash(s) | Token::Hash(s) => format!("#{s}"),
        Token::QuotedString(s) => s.to_string(),
        Token::Delim(c) => c.to_string(),
        Token::Comma => ",".to_string(),
        Token::Colon => ":".to_string(),
        Token::WhiteSpace(_) => " ".to_string(),
        Token::Number { value, .. } => value.to_string(),
        Token::Percentage { unit_value, .. } => format!("{}%", unit_value * 100.0),
        Token::Dimension { value, unit, .. } => format!("{value}{unit}"),
        _ => String::new(),
    }
}

/// Resolves display/visibility for nodes of one document
#[derive(Debug, Default)]
pub struct StyleResolver {
    sheets: Vec<Stylesheet>,
}

impl StyleResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a resolver from the document's `<style>` elements
    pub fn for_document(doc: &Document) -> Self {
        let mut sheets = Vec::new();
        for style in doc.get_elements_by_tag_name("style") {
            let css = doc.text_content(style);
            if !css.trim().is_empty() {
                sheets.push(parse_stylesheet(&css));
            }
        }
        Self { sheets }
    }

    /// Resolved value of a property for an element: highest specificity
    /// sheet rule (later rules win ties), inline `style` beating all
    pub fn property(&self, doc: &Document, id: NodeId, name: &str) -> Option<String> {
        if let Some(style) = doc.attr(id, "style") {
            if let Some(decl) = parse_style_attribute(style)
                .into_iter()
                .rev()
                .find(|d| d.property == name)
            {
                return Some(decl.value);
            }
        }

        let mut best: Option<((u32, u32, u32), usize, String)> = None;
        let mut order = 0usize;
        for sheet in &self.sheets {
            for rule in &sheet.rules {
                order += 1;
                let spec = rule
                    .selectors
                    .iter()
                    .filter(|s| query::matches(doc, id, s))
                    .map(Selector::specificity)
                    .max();
                let Some(spec) = spec else { continue };
                let Some(decl) = rule.declarations.iter().rev().find(|d| d.property == name) else {
                    continue;
                };
                let better = best
                    .as_ref()
                    .is_none_or(|(bs, bo, _)| (spec, order) >= (*bs, *bo));
                if better {
                    best = Some((spec, order, decl.value.clone()));
                }
            }
        }
        best.map(|(_, _, v)| v)
    }

    /// Effective display value for an element
    pub fn display(&self, doc: &Document, id: NodeId) -> Display {
        let Some(tag) = doc.tag_name(id) else {
            return Display::Inline;
        };
        match self.property(doc, id, "display").as_deref().and_then(Display::parse) {
            Some(display) => display,
            None => default_display(tag),
        }
    }

    /// Whether a node contributes to visible text: no `display:none`,
    /// `visibility:hidden`, or `hidden` attribute on it or any ancestor
    pub fn is_visible(&self, doc: &Document, id: NodeId) -> bool {
        let chain = std::iter::once(id).chain(doc.ancestors(id));
        for node in chain {
            if doc.data(node).is_element() {
                if doc.element(node).is_some_and(|e| e.has_attr("hidden")) {
                    return false;
                }
                if self.display(doc, node) == Display::None {
                    return false;
                }
                if self
                    .property(doc, node, "visibility")
                    .is_some_and(|v| v.eq_ignore_ascii_case("hidden"))
                {
                    return false;
                }
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::HtmlParser;

    #[test]
    fn test_style_attribute_parsing() {
        let decls = parse_style_attribute("display: none; color: red");
        assert_eq!(decls.len(), 2);
        assert_eq!(decls[0].property, "display");
        assert_eq!(decls[0].value, "none");
        assert_eq!(decls[1].value, "red");
    }

    #[test]
    fn test_broken_declaration_skipped() {
        let decls = parse_style_attribute("nonsense;; display :block ; : bad");
        assert_eq!(decls.len(), 1);
        assert_eq!(decls[0].property, "display");
        assert_eq!(decls[0].value, "block");
    }

    #[test]
    fn test_stylesheet_rules() {
        let sheet = parse_stylesheet(".x, div#y { display: none }\np { visibility: hidden; }");
        assert_eq!(sheet.rules.len(), 2);
        assert_eq!(sheet.rules[0].selectors.len(), 2);
        assert_eq!(sheet.rules[1].declarations[0].property, "visibility");
    }

    #[test]
    fn test_at_rule_skipped() {
        let sheet = parse_stylesheet("@media print { p { display: none } } span { display: block }");
        assert_eq!(sheet.rules.len(), 1);
        assert_eq!(sheet.rules[0].declarations[0].value, "block");
    }

    #[test]
    fn test_default_display_table() {
        assert_eq!(default_display("div"), Display::Block);
        assert_eq!(default_display("span"), Display::Inline);
        assert_eq!(default_display("td"), Display::TableCell);
        assert_eq!(default_display("li"), Display::ListItem);
        assert_eq!(default_display("script"), Display::None);
    }

    #[test]
    fn test_inline_style_beats_sheet() {
        let doc = HtmlParser::new()
            .parse(concat!(
                "<style>#a { display: none }</style>",
                r#"<div id="a" style="display: block">x</div>"#,
            ))
            .unwrap();
        let resolver = StyleResolver::for_document(&doc);
        let div = doc.get_element_by_id("a").unwrap();
        assert_eq!(resolver.display(&doc, div), Display::Block);
    }

    #[test]
    fn test_specificity_ordering() {
        let doc = HtmlParser::new()
            .parse(concat!(
                "<style>div { display: inline } #a { display: none } .c { display: block }</style>",
                r#"<div id="a" class="c">x</div>"#,
            ))
            .unwrap();
        let resolver = StyleResolver::for_document(&doc);
        let div = doc.get_element_by_id("a").unwrap();
        // #a (1,0,0) outweighs .c (0,1,0) and div (0,0,1)
        assert_eq!(resolver.display(&doc, div), Display::None);
    }

    #[test]
    fn test_visibility_chain() {
        let doc = HtmlParser::new()
            .parse(concat!(
                r#"<div style="display:none"><span id="in">x</span></div>"#,
                r#"<p hidden id="h">y</p>"#,
                r#"<b id="vis" style="visibility: hidden">z</b>"#,
                r#"<i id="ok">w</i>"#,
            ))
            .unwrap();
        let resolver = StyleResolver::for_document(&doc);
        assert!(!resolver.is_visible(&doc, doc.get_element_by_id("in").unwrap()));
        assert!(!resolver.is_visible(&doc, doc.get_element_by_id("h").unwrap()));
        assert!(!resolver.is_visible(&doc, doc.get_element_by_id("vis").unwrap()));
        assert!(resolver.is_visible(&doc, doc.get_element_by_id("ok").unwrap()));
    }
}
