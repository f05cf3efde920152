//! Canonical XPath generation and a small XPath evaluator
//!
//! Supports the subset automation code leans on: absolute paths with
//! positional predicates (`/html/body/div[2]`), descendant searches
//! (`//input`), attribute predicates (`//a[@href='/x']`, `//*[@id='y']`),
//! wildcards and trailing `text()` steps. Canonical paths produced by
//! [`canonical_xpath`] always resolve back to the originating node.

use super::document::Document;
use super::node::{NodeData, NodeId};
use crate::utils::{Result, StrixError};

/// Canonical location path for an element, e.g. `/html/body/div[2]/span`.
///
/// Positional predicates appear only when the element has same-named
/// element siblings. Returns `None` for non-elements and for elements not
/// attached under the document root.
pub fn canonical_xpath(doc: &Document, id: NodeId) -> Option<String> {
    doc.element(id)?;
    let mut steps = Vec::new();
    let mut current = id;
    loop {
        let tag = doc.tag_name(current)?;
        let parent = doc.parent(current)?;
        let same_named: Vec<NodeId> = doc
            .children(parent)
            .iter()
            .copied()
            .filter(|c| doc.tag_name(*c) == Some(tag))
            .collect();
        if same_named.len() > 1 {
            let pos = same_named.iter().position(|c| *c == current)? + 1;
            steps.push(format!("{tag}[{pos}]"));
        } else {
            steps.push(tag.to_string());
        }
        if parent == doc.root() {
            break;
        }
        current = parent;
    }
    steps.reverse();
    Some(format!("/{}", steps.join("/")))
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Axis {
    Child,
    Descendant,
}

#[derive(Debug, Clone, PartialEq)]
enum NodeTest {
    Name(String),
    Any,
    Text,
}

#[derive(Debug, Clone, PartialEq)]
enum Predicate {
    Index(usize),
    Attr { name: String, value: Option<String> },
}

#[derive(Debug, Clone)]
struct Step {
    axis: Axis,
    test: NodeTest,
    predicate: Option<Predicate>,
}

/// Evaluate an XPath expression against the document, returning matches in
/// document order.
pub fn evaluate(doc: &Document, expr: &str) -> Result<Vec<NodeId>> {
    let steps = parse(expr)?;
    let mut context = vec![doc.root()];
    for step in &steps {
        context = apply_step(doc, &context, step);
        if context.is_empty() {
            break;
        }
    }
    Ok(context)
}

/// First match for an XPath expression
pub fn evaluate_first(doc: &Document, expr: &str) -> Result<Option<NodeId>> {
    Ok(evaluate(doc, expr)?.into_iter().next())
}

fn parse(expr: &str) -> Result<Vec<Step>> {
    let expr = expr.trim();
    if !expr.starts_with('/') {
        return Err(StrixError::XPath(expr.to_string()));
    }
    let mut steps = Vec::new();
    let mut rest = expr;
    while !rest.is_empty() {
        let axis = if let Some(tail) = rest.strip_prefix("//") {
            rest = tail;
            Axis::Descendant
        } else if let Some(tail) = rest.strip_prefix('/') {
            rest = tail;
            Axis::Child
        } else {
            return Err(StrixError::XPath(expr.to_string()));
        };
        let end = rest.find('/').unwrap_or(rest.len());
        let (step_text, tail) = rest.split_at(end);
        rest = tail;
        if step_text.is_empty() {
            return Err(StrixError::XPath(expr.to_string()));
        }
        steps.push(parse_step(expr, axis, step_text)?);
    }
    if steps.is_empty() {
        return Err(StrixError::XPath(expr.to_string()));
    }
    Ok(steps)
}

fn parse_step(expr: &str, axis: Axis, text: &str) -> Result<Step> {
    let (test_text, predicate) = match text.find('[') {
        Some(open) => {
            let close = text
                .rfind(']')
                .ok_or_else(|| StrixError::XPath(expr.to_string()))?;
            if close < open {
                return Err(StrixError::XPath(expr.to_string()));
            }
            let pred = parse_predicate(expr, &text[open + 1..close])?;
            (&text[..open], Some(pred))
        }
        None => (text, None),
    };

    let test = match test_text {
        "*" => NodeTest::Any,
        "text()" => NodeTest::Text,
        name if !name.is_empty() && name.chars().all(is_name_char) => {
            NodeTest::Name(name.to_ascii_lowercase())
        }
        _ => return Err(StrixError::XPath(expr.to_string())),
    };

    Ok(Step {
        axis,
        test,
        predicate,
    })
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == ':'
}

fn parse_predicate(expr: &str, text: &str) -> Result<Predicate> {
    let text = text.trim();
    if let Ok(index) = text.parse::<usize>() {
        if index == 0 {
            return Err(StrixError::XPath(expr.to_string()));
        }
        return Ok(Predicate::Index(index));
    }
    let body = text
        .strip_prefix('@')
        .ok_or_else(|| StrixError::XPath(expr.to_string()))?;
    match body.split_once('=') {
        Some((name, value)) => {
            let name = name.trim();
            let value = value.trim();
            let unquoted = value
                .strip_prefix('\'')
                .and_then(|v| v.strip_suffix('\''))
                .or_else(|| value.strip_prefix('"').and_then(|v| v.strip_suffix('"')))
                .ok_or_else(|| StrixError::XPath(expr.to_string()))?;
            Ok(Predicate::Attr {
                name: name.to_ascii_lowercase(),
                value: Some(unquoted.to_string()),
            })
        }
        None => Ok(Predicate::Attr {
            name: body.trim().to_ascii_lowercase(),
            value: None,
        }),
    }
}

fn apply_step(doc: &Document, context: &[NodeId], step: &Step) -> Vec<NodeId> {
    let mut out = Vec::new();
    for &node in context {
        let candidates: Vec<NodeId> = match step.axis {
            Axis::Child => doc.children(node).to_vec(),
            Axis::Descendant => doc.subtree(node).skip(1).collect(),
        };
        let mut matched: Vec<NodeId> = candidates
            .into_iter()
            .filter(|c| test_matches(doc, *c, &step.test))
            .collect();
        if let Some(pred) = &step.predicate {
            matched = apply_predicate(doc, matched, pred);
        }
        for m in matched {
            if !out.contains(&m) {
                out.push(m);
            }
        }
    }
    out
}

fn test_matches(doc: &Document, id: NodeId, test: &NodeTest) -> bool {
    match test {
        NodeTest::Name(name) => doc.tag_name(id) == Some(name.as_str()),
        NodeTest::Any => doc.data(id).is_element(),
        NodeTest::Text => matches!(doc.data(id), NodeData::Text(_)),
    }
}

fn apply_predicate(doc: &Document, matched: Vec<NodeId>, pred: &Predicate) -> Vec<NodeId> {
    match pred {
        // Position within this context's match list, 1-based
        Predicate::Index(index) => matched
            .into_iter()
            .enumerate()
            .filter(|(i, _)| i + 1 == *index)
            .map(|(_, id)| id)
            .collect(),
        Predicate::Attr { name, value } => matched
            .into_iter()
            .filter(|id| match (doc.attr(*id, name), value) {
                (Some(actual), Some(expected)) => actual == expected,
                (Some(_), None) => true,
                (None, _) => false,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_doc() -> Document {
        let mut doc = Document::new();
        let html = doc.create_element("html");
        let body = doc.create_element("body");
        doc.append(doc.root(), html);
        doc.append(html, body);
        for (i, href) in ["/one", "/two"].iter().enumerate() {
            let div = doc.create_element("div");
            let a = doc.create_element("a");
            doc.element_mut(a).unwrap().set_attr("href", *href);
            let t = doc.create_text(format!("link{}", i + 1));
            doc.append(a, t);
            doc.append(div, a);
            doc.append(body, div);
        }
        doc
    }

    #[test]
    fn test_canonical_xpath_positions() {
        let doc = table_doc();
        let divs = doc.get_elements_by_tag_name("div");
        assert_eq!(
            canonical_xpath(&doc, divs[0]).as_deref(),
            Some("/html/body/div[1]")
        );
        assert_eq!(
            canonical_xpath(&doc, divs[1]).as_deref(),
            Some("/html/body/div[2]")
        );
        let body = doc.body().unwrap();
        assert_eq!(canonical_xpath(&doc, body).as_deref(), Some("/html/body"));
    }

    #[test]
    fn test_canonical_xpath_round_trip() {
        let doc = table_doc();
        for id in doc.elements() {
            let path = canonical_xpath(&doc, id).unwrap();
            assert_eq!(evaluate(&doc, &path).unwrap(), vec![id], "path {path}");
        }
    }

    #[test]
    fn test_descendant_search() {
        let doc = table_doc();
        let anchors = evaluate(&doc, "//a").unwrap();
        assert_eq!(anchors.len(), 2);
        assert_eq!(anchors, doc.get_elements_by_tag_name("a"));
    }

    #[test]
    fn test_attribute_predicate() {
        let doc = table_doc();
        let hit = evaluate(&doc, "//a[@href='/two']").unwrap();
        assert_eq!(hit.len(), 1);
        assert_eq!(doc.attr(hit[0], "href"), Some("/two"));
        assert!(evaluate(&doc, "//a[@href='/three']").unwrap().is_empty());
        // bare attribute presence
        assert_eq!(evaluate(&doc, "//a[@href]").unwrap().len(), 2);
    }

    #[test]
    fn test_wildcard_and_index() {
        let doc = table_doc();
        let second = evaluate(&doc, "/html/body/*[2]").unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(doc.tag_name(second[0]), Some("div"));
    }

    #[test]
    fn test_text_step() {
        let doc = table_doc();
        let texts = evaluate(&doc, "//a/text()").unwrap();
        assert_eq!(texts.len(), 2);
        assert_eq!(doc.data(texts[0]).as_text(), Some("link1"));
    }

    #[test]
    fn test_invalid_expressions() {
        let doc = table_doc();
        assert!(evaluate(&doc, "a/b").is_err());
        assert!(evaluate(&doc, "//a[").is_err());
        assert!(evaluate(&doc, "//a[0]").is_err());
        assert!(evaluate(&doc, "").is_err());
    }
}
