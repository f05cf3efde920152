//! Form submission
//!
//! Collects the successful controls of a form in document order and encodes
//! them as `application/x-www-form-urlencoded`, resolving the action against
//! the page URL when one is known.

use crate::dom::{Document, ElementKind, NodeId};
use crate::utils::{Result, StrixError};
use url::Url;

/// HTTP method of a form submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    #[default]
    Get,
    Post,
}

impl Method {
    fn from_attr(value: Option<&str>) -> Self {
        match value {
            Some(m) if m.eq_ignore_ascii_case("post") => Self::Post,
            _ => Self::Get,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

/// The outcome of submitting a form: where it would go and with what data
#[derive(Debug, Clone, PartialEq)]
pub struct FormSubmission {
    /// Resolved action URL. For GET the encoded data replaces its query.
    pub action: String,
    pub method: Method,
    /// Successful controls in document order, before encoding
    pub pairs: Vec<(String, String)>,
    /// Urlencoded request body, present for POST only
    pub body: Option<String>,
}

/// Nearest `<form>` ancestor of a node, falling back to the form named by
/// the node's `form` attribute
pub fn enclosing_form(doc: &Document, id: NodeId) -> Option<NodeId> {
    if let Some(form) = doc
        .ancestors(id)
        .find(|a| doc.kind(*a) == Some(ElementKind::Form))
    {
        return Some(form);
    }
    let owner = doc.attr(id, "form")?;
    let named = doc.get_element_by_id(owner)?;
    (doc.kind(named) == Some(ElementKind::Form)).then_some(named)
}

/// Compute the submission a form would produce.
///
/// `submitter` is the button that triggered the submission, if any; only the
/// submitter contributes a button name/value pair. `base` resolves relative
/// actions.
pub fn submit(
    doc: &Document,
    form: NodeId,
    submitter: Option<NodeId>,
    base: Option<&Url>,
) -> Result<FormSubmission> {
    if doc.kind(form) != Some(ElementKind::Form) {
        return Err(StrixError::Form("node is not a form element".into()));
    }

    let pairs = collect_pairs(doc, form, submitter);
    let method = Method::from_attr(doc.attr(form, "method"));
    let encoded = encode_pairs(&pairs);
    let action_attr = doc.attr(form, "action").unwrap_or("").trim();

    let action = match method {
        Method::Get => action_with_query(action_attr, &encoded, base)?,
        Method::Post => resolve_action(action_attr, base)?,
    };
    let body = match method {
        Method::Get => None,
        Method::Post => Some(encoded),
    };

    Ok(FormSubmission {
        action,
        method,
        pairs,
        body,
    })
}

/// Successful controls of the form, in document order
fn collect_pairs(doc: &Document, form: NodeId, submitter: Option<NodeId>) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for id in doc.subtree(form) {
        let Some(data) = doc.element(id) else { continue };
        if !data.kind().is_submittable_control() {
            continue;
        }
        if is_effectively_disabled(doc, id, form) {
            continue;
        }
        let Some(name) = data.attr("name").filter(|n| !n.is_empty()) else {
            continue;
        };

        match data.kind() {
            ElementKind::Input => {
                let ty = data.attr("type").unwrap_or("text").to_ascii_lowercase();
                match ty.as_str() {
                    "checkbox" | "radio" => {
                        if data.has_attr("checked") {
                            let value = data.attr("value").unwrap_or("on");
                            pairs.push((name.to_string(), value.to_string()));
                        }
                    }
                    "submit" => {
                        if submitter == Some(id) {
                            let value = data.attr("value").unwrap_or("");
                            pairs.push((name.to_string(), value.to_string()));
                        }
                    }
                    // File uploads and image maps are not encoded here;
                    // reset/button never submit
                    "file" | "image" | "reset" | "button" => {}
                    _ => {
                        let value = data.attr("value").unwrap_or("");
                        pairs.push((name.to_string(), value.to_string()));
                    }
                }
            }
            ElementKind::Button => {
                let ty = data.attr("type").unwrap_or("submit");
                if submitter == Some(id) && ty.eq_ignore_ascii_case("submit") {
                    let value = data.attr("value").unwrap_or("");
                    pairs.push((name.to_string(), value.to_string()));
                }
            }
            ElementKind::Select => {
                for option in selected_options(doc, id) {
                    pairs.push((name.to_string(), option_value(doc, option)));
                }
            }
            ElementKind::TextArea => {
                pairs.push((name.to_string(), normalize_newlines(&doc.text_content(id))));
            }
            _ => {}
        }
    }
    pairs
}

fn is_effectively_disabled(doc: &Document, id: NodeId, form: NodeId) -> bool {
    if doc.element(id).is_some_and(|e| e.is_disabled()) {
        return true;
    }
    for ancestor in doc.ancestors(id) {
        if ancestor == form {
            break;
        }
        if doc.kind(ancestor) == Some(ElementKind::Fieldset)
            && doc.element(ancestor).is_some_and(|e| e.is_disabled())
        {
            return true;
        }
    }
    false
}

/// Selected options of a select, with the first-option fallback for
/// single selects
pub fn selected_options(doc: &Document, select: NodeId) -> Vec<NodeId> {
    let options: Vec<NodeId> = doc
        .subtree(select)
        .filter(|id| doc.kind(*id) == Some(ElementKind::OptionItem))
        .collect();
    let selected: Vec<NodeId> = options
        .iter()
        .copied()
        .filter(|id| doc.element(*id).is_some_and(|e| e.has_attr("selected")))
        .collect();
    let multiple = doc.element(select).is_some_and(|e| e.has_attr("multiple"));
    if selected.is_empty() && !multiple {
        return options.into_iter().take(1).collect();
    }
    selected
}

/// An option submits its `value` attribute, or its text when there is none
pub fn option_value(doc: &Document, option: NodeId) -> String {
    match doc.attr(option, "value") {
        Some(value) => value.to_string(),
        None => doc.text_content(option).trim().to_string(),
    }
}

/// Textarea values go over the wire with CRLF line endings
fn normalize_newlines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\r' => {
                out.push_str("\r\n");
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            '\n' => out.push_str("\r\n"),
            _ => out.push(ch),
        }
    }
    out
}

fn encode_pairs(pairs: &[(String, String)]) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (name, value) in pairs {
        serializer.append_pair(name, value);
    }
    serializer.finish()
}

fn resolve_action(action: &str, base: Option<&Url>) -> Result<String> {
    match base {
        Some(base) if action.is_empty() => Ok(base.to_string()),
        Some(base) => Ok(base.join(action)?.to_string()),
        None => Ok(action.to_string()),
    }
}

/// GET submission: the encoded data replaces any query on the action
fn action_with_query(action: &str, encoded: &str, base: Option<&Url>) -> Result<String> {
    match base {
        Some(base) => {
            let mut url = if action.is_empty() {
                base.clone()
            } else {
                base.join(action)?
            };
            url.set_query(if encoded.is_empty() { None } else { Some(encoded) });
            Ok(url.to_string())
        }
        None => {
            let path = action.split('?').next().unwrap_or("");
            if encoded.is_empty() {
                Ok(path.to_string())
            } else {
                Ok(format!("{path}?{encoded}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::HtmlParser;

    fn parse(html: &str) -> Document {
        HtmlParser::new().parse(html).unwrap()
    }

    #[test]
    fn test_basic_get_submission() {
        let doc = parse(concat!(
            r#"<form action="/search"><input name="q" value="rust lang">"#,
            r#"<input type="hidden" name="lang" value="en"></form>"#,
        ));
        let form = doc.get_elements_by_tag_name("form")[0];
        let base = Url::parse("http://example.com/page").unwrap();
        let sub = submit(&doc, form, None, Some(&base)).unwrap();
        assert_eq!(sub.method, Method::Get);
        assert_eq!(sub.action, "http://example.com/search?q=rust+lang&lang=en");
        assert_eq!(sub.body, None);
    }

    #[test]
    fn test_post_body() {
        let doc = parse(concat!(
            r#"<form method="POST" action="/login">"#,
            r#"<input name="user" value="a&b"><input type="password" name="pw" value="s=cret">"#,
            "</form>",
        ));
        let form = doc.get_elements_by_tag_name("form")[0];
        let sub = submit(&doc, form, None, None).unwrap();
        assert_eq!(sub.method, Method::Post);
        assert_eq!(sub.action, "/login");
        assert_eq!(sub.body.as_deref(), Some("user=a%26b&pw=s%3Dcret"));
    }

    #[test]
    fn test_checkbox_and_radio() {
        let doc = parse(concat!(
            "<form>",
            r#"<input type="checkbox" name="a" checked>"#,
            r#"<input type="checkbox" name="b">"#,
            r#"<input type="radio" name="c" value="one">"#,
            r#"<input type="radio" name="c" value="two" checked>"#,
            "</form>",
        ));
        let form = doc.get_elements_by_tag_name("form")[0];
        let sub = submit(&doc, form, None, None).unwrap();
        assert_eq!(
            sub.pairs,
            vec![("a".into(), "on".into()), ("c".into(), "two".into())]
        );
    }

    #[test]
    fn test_submitter_only_button_included() {
        let doc = parse(concat!(
            "<form>",
            r#"<input type="submit" name="go" value="Go">"#,
            r#"<button type="submit" name="other" value="x">x</button>"#,
            "</form>",
        ));
        let form = doc.get_elements_by_tag_name("form")[0];
        let go = doc.get_elements_by_tag_name("input")[0];

        let without = submit(&doc, form, None, None).unwrap();
        assert!(without.pairs.is_empty());

        let with = submit(&doc, form, Some(go), None).unwrap();
        assert_eq!(with.pairs, vec![("go".into(), "Go".into())]);
    }

    #[test]
    fn test_select_fallbacks() {
        let doc = parse(concat!(
            "<form>",
            r#"<select name="s"><option value="v1">one</option><option>two</option></select>"#,
            r#"<select name="m" multiple><option value="x">x</option></select>"#,
            "</form>",
        ));
        let form = doc.get_elements_by_tag_name("form")[0];
        let sub = submit(&doc, form, None, None).unwrap();
        // Single select falls back to its first option; an unselected
        // multiple contributes nothing
        assert_eq!(sub.pairs, vec![("s".into(), "v1".into())]);
    }

    #[test]
    fn test_multi_select_and_non_urlencoded_types() {
        let doc = parse(concat!(
            "<form>",
            r#"<select name="m" multiple>"#,
            r#"<option value="a" selected>a</option>"#,
            r#"<option value="b">b</option>"#,
            r#"<option value="c" selected>c</option>"#,
            "</select>",
            r#"<input type="file" name="upload">"#,
            r#"<input type="image" name="map">"#,
            "</form>",
        ));
        let form = doc.get_elements_by_tag_name("form")[0];
        let sub = submit(&doc, form, None, None).unwrap();
        // One pair per selected option; file and image controls stay out
        // of the urlencoded set
        assert_eq!(
            sub.pairs,
            vec![("m".into(), "a".into()), ("m".into(), "c".into())]
        );
    }

    #[test]
    fn test_option_text_as_value() {
        let doc = parse(r#"<form><select name="s"><option selected> two </option></select></form>"#);
        let form = doc.get_elements_by_tag_name("form")[0];
        let sub = submit(&doc, form, None, None).unwrap();
        assert_eq!(sub.pairs, vec![("s".into(), "two".into())]);
    }

    #[test]
    fn test_disabled_controls_skipped() {
        let doc = parse(concat!(
            "<form>",
            r#"<input name="a" value="1" disabled>"#,
            r#"<fieldset disabled><input name="b" value="2"></fieldset>"#,
            r#"<input name="c" value="3">"#,
            "</form>",
        ));
        let form = doc.get_elements_by_tag_name("form")[0];
        let sub = submit(&doc, form, None, None).unwrap();
        assert_eq!(sub.pairs, vec![("c".into(), "3".into())]);
    }

    #[test]
    fn test_textarea_crlf() {
        let doc = parse("<form><textarea name=\"t\">a\nb</textarea></form>");
        let form = doc.get_elements_by_tag_name("form")[0];
        let sub = submit(&doc, form, None, None).unwrap();
        assert_eq!(sub.pairs, vec![("t".into(), "a\r\nb".into())]);
    }

    #[test]
    fn test_get_replaces_existing_query() {
        let doc = parse(r#"<form action="/s?old=1"><input name="q" value="new"></form>"#);
        let form = doc.get_elements_by_tag_name("form")[0];
        let base = Url::parse("http://example.com/").unwrap();
        let sub = submit(&doc, form, None, Some(&base)).unwrap();
        assert_eq!(sub.action, "http://example.com/s?q=new");
    }

    #[test]
    fn test_enclosing_form() {
        let doc = parse(concat!(
            r#"<form id="f"><div><input id="in"></div></form>"#,
            r#"<input id="out" form="f">"#,
            r#"<input id="none">"#,
        ));
        let form = doc.get_element_by_id("f").unwrap();
        let inner = doc.get_element_by_id("in").unwrap();
        let outer = doc.get_element_by_id("out").unwrap();
        let orphan = doc.get_element_by_id("none").unwrap();
        assert_eq!(enclosing_form(&doc, inner), Some(form));
        assert_eq!(enclosing_form(&doc, outer), Some(form));
        assert_eq!(enclosing_form(&doc, orphan), None);
    }

    #[test]
    fn test_non_form_node_rejected() {
        let doc = parse("<div></div>");
        let div = doc.get_elements_by_tag_name("div")[0];
        assert!(submit(&doc, div, None, None).is_err());
    }
}
