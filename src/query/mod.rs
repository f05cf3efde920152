//! CSS selector engine
//!
//! Hand-rolled parser and matcher for the selector subset the engine needs:
//! tag, `#id`, `.class`, `[attr]` / `[attr=value]`, compound simple
//! selectors, descendant and child combinators, comma-separated lists.

use crate::dom::{Document, ElementData, NodeId};
use crate::utils::{Result, StrixError};

/// Attribute test inside a compound selector
#[derive(Debug, Clone, PartialEq)]
pub struct AttrPredicate {
    pub name: String,
    /// `None` tests presence only
    pub value: Option<String>,
}

/// A compound simple selector (everything between combinators)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Compound {
    pub tag: Option<String>,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attrs: Vec<AttrPredicate>,
    /// Written as an explicit `*`
    universal: bool,
}

impl Compound {
    fn is_empty(&self) -> bool {
        !self.universal
            && self.tag.is_none()
            && self.id.is_none()
            && self.classes.is_empty()
            && self.attrs.is_empty()
    }
}

/// Relationship between adjacent compounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    Descendant,
    Child,
}

/// One complex selector: compounds left to right, each with the combinator
/// linking it to the compound before it (the first carries none)
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    parts: Vec<(Option<Combinator>, Compound)>,
}

impl Selector {
    /// Specificity as the usual (id, class+attr, tag) triple
    pub fn specificity(&self) -> (u32, u32, u32) {
        let mut spec = (0, 0, 0);
        for (_, compound) in &self.parts {
            if compound.id.is_some() {
                spec.0 += 1;
            }
            spec.1 += (compound.classes.len() + compound.attrs.len()) as u32;
            if compound.tag.is_some() {
                spec.2 += 1;
            }
        }
        spec
    }
}

/// Parse a comma-separated selector list
pub fn parse_selector_list(input: &str) -> Result<Vec<Selector>> {
    let mut selectors = Vec::new();
    for part in split_top_level_commas(input) {
        let part = part.trim();
        if part.is_empty() {
            return Err(StrixError::Selector(input.to_string()));
        }
        selectors.push(parse_selector(part)?);
    }
    if selectors.is_empty() {
        return Err(StrixError::Selector(input.to_string()));
    }
    Ok(selectors)
}

/// Commas inside `[...]` do not separate selectors
fn split_top_level_commas(input: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in input.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&input[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&input[start..]);
    parts
}

fn parse_selector(input: &str) -> Result<Selector> {
    #[derive(PartialEq)]
    enum Mode {
        Tag,
        Id,
        Class,
    }

    let mut parts: Vec<(Option<Combinator>, Compound)> = Vec::new();
    let mut compound = Compound::default();
    let mut pending: Option<Combinator> = None;
    let mut current = String::new();
    let mut mode = Mode::Tag;

    let flush_simple = |compound: &mut Compound, mode: &Mode, current: &mut String| -> Result<()> {
        if current.is_empty() {
            if *mode != Mode::Tag {
                return Err(StrixError::Selector(input.to_string()));
            }
            return Ok(());
        }
        match mode {
            Mode::Tag => {
                if current == "*" {
                    compound.universal = true;
                } else {
                    compound.tag = Some(current.to_ascii_lowercase());
                }
            }
            Mode::Id => compound.id = Some(std::mem::take(current)),
            Mode::Class => compound.classes.push(std::mem::take(current)),
        }
        current.clear();
        Ok(())
    };

    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '#' => {
                flush_simple(&mut compound, &mode, &mut current)?;
                mode = Mode::Id;
            }
            '.' => {
                flush_simple(&mut compound, &mode, &mut current)?;
                mode = Mode::Class;
            }
            '[' => {
                flush_simple(&mut compound, &mode, &mut current)?;
                mode = Mode::Tag;
                let mut body = String::new();
                let mut closed = false;
                for a in chars.by_ref() {
                    if a == ']' {
                        closed = true;
                        break;
                    }
                    body.push(a);
                }
                if !closed {
                    return Err(StrixError::Selector(input.to_string()));
                }
                compound.attrs.push(parse_attr_predicate(input, &body)?);
            }
            c if c.is_whitespace() || c == '>' => {
                flush_simple(&mut compound, &mode, &mut current)?;
                mode = Mode::Tag;
                let mut combinator = if c == '>' {
                    Combinator::Child
                } else {
                    Combinator::Descendant
                };
                // Collapse surrounding whitespace; `a > b` is one child step
                while let Some(&next) = chars.peek() {
                    if next == '>' {
                        combinator = Combinator::Child;
                        chars.next();
                    } else if next.is_whitespace() {
                        chars.next();
                    } else {
                        break;
                    }
                }
                if compound.is_empty() {
                    return Err(StrixError::Selector(input.to_string()));
                }
                parts.push((pending.take(), std::mem::take(&mut compound)));
                pending = Some(combinator);
            }
            c if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '*' => {
                current.push(c);
            }
            _ => return Err(StrixError::Selector(input.to_string())),
        }
    }
    flush_simple(&mut compound, &mode, &mut current)?;
    if compound.is_empty() {
        return Err(StrixError::Selector(input.to_string()));
    }
    parts.push((pending, compound));
    Ok(Selector { parts })
}

fn parse_attr_predicate(selector: &str, body: &str) -> Result<AttrPredicate> {
    let body = body.trim();
    if body.is_empty() {
        return Err(StrixError::Selector(selector.to_string()));
    }
    match body.split_once('=') {
        Some((name, value)) => {
            let value = value.trim();
            let unquoted = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
                .unwrap_or(value);
            Ok(AttrPredicate {
                name: name.trim().to_ascii_lowercase(),
                value: Some(unquoted.to_string()),
            })
        }
        None => Ok(AttrPredicate {
            name: body.to_ascii_lowercase(),
            value: None,
        }),
    }
}

/// Test a node against one selector
pub fn matches(doc: &Document, id: NodeId, selector: &Selector) -> bool {
    matches_parts(doc, id, &selector.parts)
}

fn matches_parts(doc: &Document, id: NodeId, parts: &[(Option<Combinator>, Compound)]) -> bool {
    let Some(((combinator, compound), prefix)) = parts.split_last() else {
        return false;
    };
    let Some(element) = doc.element(id) else {
        return false;
    };
    if !compound_matches(element, compound) {
        return false;
    }
    match combinator {
        None => true,
        Some(Combinator::Child) => doc
            .parent(id)
            .is_some_and(|p| doc.data(p).is_element() && matches_parts(doc, p, prefix)),
        Some(Combinator::Descendant) => doc
            .ancestors(id)
            .filter(|a| doc.data(*a).is_element())
            .any(|a| matches_parts(doc, a, prefix)),
    }
}

fn compound_matches(element: &ElementData, compound: &Compound) -> bool {
    if let Some(tag) = &compound.tag {
        if element.tag_name() != tag {
            return false;
        }
    }
    if let Some(id) = &compound.id {
        if element.id() != Some(id.as_str()) {
            return false;
        }
    }
    for class in &compound.classes {
        if !element.has_class(class) {
            return false;
        }
    }
    for attr in &compound.attrs {
        match (element.attr(&attr.name), &attr.value) {
            (Some(actual), Some(expected)) if actual != expected => return false,
            (None, _) => return false,
            _ => {}
        }
    }
    true
}

/// First matching element under `root` in document order
pub fn query_selector(doc: &Document, root: NodeId, selectors: &[Selector]) -> Option<NodeId> {
    doc.subtree(root)
        .filter(|id| doc.data(*id).is_element())
        .find(|id| selectors.iter().any(|s| matches(doc, *id, s)))
}

/// All matching elements under `root` in document order
pub fn query_selector_all(doc: &Document, root: NodeId, selectors: &[Selector]) -> Vec<NodeId> {
    doc.subtree(root)
        .filter(|id| doc.data(*id).is_element())
        .filter(|id| selectors.iter().any(|s| matches(doc, *id, s)))
        .collect()
}

/// Parse-and-query convenience, first match
pub fn select_first(doc: &Document, root: NodeId, selector: &str) -> Result<Option<NodeId>> {
    let selectors = parse_selector_list(selector)?;
    Ok(query_selector(doc, root, &selectors))
}

/// Parse-and-query convenience, all matches
pub fn select_all(doc: &Document, root: NodeId, selector: &str) -> Result<Vec<NodeId>> {
    let selectors = parse_selector_list(selector)?;
    Ok(query_selector_all(doc, root, &selectors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::HtmlParser;

    fn doc() -> Document {
        HtmlParser::new()
            .parse(concat!(
                r#"<div id="main" class="container active">"#,
                r#"<p class="intro">one</p>"#,
                r#"<span><p data-x="1">two</p></span>"#,
                "</div>",
                r#"<p class="intro outro">three</p>"#,
            ))
            .unwrap()
    }

    #[test]
    fn test_tag_and_id() {
        let doc = doc();
        let main = select_first(&doc, doc.root(), "#main").unwrap().unwrap();
        assert_eq!(doc.tag_name(main), Some("div"));
        assert_eq!(select_all(&doc, doc.root(), "p").unwrap().len(), 3);
    }

    #[test]
    fn test_class_compound() {
        let doc = doc();
        let hits = select_all(&doc, doc.root(), "p.intro").unwrap();
        assert_eq!(hits.len(), 2);
        let both = select_all(&doc, doc.root(), ".intro.outro").unwrap();
        assert_eq!(both.len(), 1);
        assert_eq!(
            select_all(&doc, doc.root(), "div.container.active").unwrap().len(),
            1
        );
    }

    #[test]
    fn test_descendant_and_child() {
        let doc = doc();
        // all p under #main (both depths)
        assert_eq!(select_all(&doc, doc.root(), "#main p").unwrap().len(), 2);
        // only the direct child
        let direct = select_all(&doc, doc.root(), "#main > p").unwrap();
        assert_eq!(direct.len(), 1);
        assert_eq!(doc.text_content(direct[0]), "one");
        // child through span
        assert_eq!(
            select_all(&doc, doc.root(), "div > span > p").unwrap().len(),
            1
        );
    }

    #[test]
    fn test_attribute_selectors() {
        let doc = doc();
        assert_eq!(select_all(&doc, doc.root(), "[data-x]").unwrap().len(), 1);
        assert_eq!(
            select_all(&doc, doc.root(), r#"p[data-x="1"]"#).unwrap().len(),
            1
        );
        assert!(select_all(&doc, doc.root(), "[data-x='2']").unwrap().is_empty());
    }

    #[test]
    fn test_selector_list() {
        let doc = doc();
        let hits = select_all(&doc, doc.root(), "span, .outro").unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn test_universal() {
        let doc = doc();
        let all = select_all(&doc, doc.root(), "*").unwrap();
        assert_eq!(all.len(), doc.elements().count());
    }

    #[test]
    fn test_specificity() {
        let sel = &parse_selector_list("div#a.b.c[d]").unwrap()[0];
        assert_eq!(sel.specificity(), (1, 3, 1));
        let sel = &parse_selector_list("ul > li").unwrap()[0];
        assert_eq!(sel.specificity(), (0, 0, 2));
    }

    #[test]
    fn test_invalid_selectors() {
        assert!(parse_selector_list("").is_err());
        assert!(parse_selector_list("p:hover").is_err());
        assert!(parse_selector_list("[unclosed").is_err());
        assert!(parse_selector_list("> p").is_err());
        assert!(parse_selector_list("a,,b").is_err());
    }
}
