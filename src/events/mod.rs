//! DOM event dispatch and default actions
//!
//! Events propagate from the target up through its ancestors to the
//! document and window. Handlers come from two places: inline `on*`
//! attributes and listeners registered through `addEventListener` (stored
//! on the host state by the JS bridge). An inline handler returning `false`
//! cancels the default action, as does `preventDefault()`.
//!
//! Default actions live here too: activating a submit control submits its
//! form, clicking a link records the navigation, and clicking a checkbox or
//! radio toggles it before handlers run (reverted when cancelled).

use crate::dom::{Document, ElementKind, NodeId};
use crate::forms::{self, FormSubmission};
use crate::js::{self, ListenerTarget, ScriptEngine};
use crate::utils::Result;

/// One handler due to run for a dispatched event
enum Handler {
    /// `on*` attribute source text
    Inline { node: NodeId, source: String },
    /// `addEventListener` callback expression, with the JS expression for
    /// its `currentTarget`
    Listener { current: String, callback: String },
}

/// Dispatch an event at an element, bubbling to document and window.
///
/// Returns whether the default action was cancelled. The page's host state
/// must be installed.
pub fn dispatch(engine: &mut ScriptEngine, target: NodeId, event: &str) -> Result<bool> {
    let handlers = js::with_host(|host| collect_node_handlers(host, target, event))
        .unwrap_or_default();
    run_handlers(engine, handlers, &target_expr(target), event)
}

/// Dispatch a document-level event (`DOMContentLoaded`, `load`)
pub fn dispatch_document(engine: &mut ScriptEngine, event: &str) -> Result<bool> {
    let handlers = js::with_host(|host| {
        let mut handlers = Vec::new();
        collect_listener_handlers(host, ListenerTarget::Document, "document", event, &mut handlers);
        collect_listener_handlers(host, ListenerTarget::Window, "window", event, &mut handlers);
        handlers
    })
    .unwrap_or_default();
    run_handlers(engine, handlers, "document", event)
}

fn target_expr(node: NodeId) -> String {
    format!("__strix_target({})", node.as_usize())
}

fn collect_node_handlers(host: &mut js::HostState, target: NodeId, event: &str) -> Vec<Handler> {
    let mut handlers = Vec::new();
    let attr_name = format!("on{event}");
    let mut chain = vec![target];
    chain.extend(host.document.ancestors(target));
    for node in chain {
        if let Some(source) = host.document.attr(node, &attr_name) {
            handlers.push(Handler::Inline {
                node,
                source: source.to_string(),
            });
        }
        collect_listener_handlers(
            host,
            ListenerTarget::Node(node),
            &target_expr(node),
            event,
            &mut handlers,
        );
    }
    collect_listener_handlers(host, ListenerTarget::Document, "document", event, &mut handlers);
    collect_listener_handlers(host, ListenerTarget::Window, "window", event, &mut handlers);
    handlers
}

fn collect_listener_handlers(
    host: &js::HostState,
    target: ListenerTarget,
    current: &str,
    event: &str,
    out: &mut Vec<Handler>,
) {
    for listener in &host.listeners {
        if listener.target == target && listener.event == event {
            out.push(Handler::Listener {
                current: current.to_string(),
                callback: listener.callback.clone(),
            });
        }
    }
}

fn run_handlers(
    engine: &mut ScriptEngine,
    handlers: Vec<Handler>,
    target: &str,
    event: &str,
) -> Result<bool> {
    if handlers.is_empty() {
        return Ok(false);
    }
    js::with_host(|host| host.default_prevented = false);
    engine.run(&format!(
        concat!(
            "var __strix_event = {{ type: {:?}, target: {}, bubbles: true, cancelable: true, ",
            "preventDefault: function() {{ __strix_prevent_default(); }}, ",
            "stopPropagation: function() {{}} }};"
        ),
        event, target,
    ))?;
    for handler in handlers {
        let code = match handler {
            // An inline handler returning false cancels the default action
            Handler::Inline { node, source } => format!(
                "if ((function(event) {{ {source} }}).call({}, __strix_event) === false) \
                 __strix_prevent_default();",
                target_expr(node),
            ),
            Handler::Listener { current, callback } => {
                format!("({callback}).call({current}, __strix_event);")
            }
        };
        if let Err(e) = engine.run(&code) {
            log::warn!("{event} handler failed: {e}");
        }
    }
    Ok(js::with_host(|host| host.default_prevented).unwrap_or(false))
}

/// State saved before a checkbox/radio pre-toggle so a cancelled click can
/// be undone
struct ToggleRevert {
    changed: Vec<(NodeId, bool)>,
}

impl ToggleRevert {
    fn apply(&self, doc: &mut Document) {
        for (node, was_checked) in &self.changed {
            if let Some(data) = doc.element_mut(*node) {
                if *was_checked {
                    data.set_attr("checked", "");
                } else {
                    data.remove_attr("checked");
                }
            }
        }
    }
}

/// Click an element: pre-toggle checkables, dispatch `click`, then run the
/// default action unless a handler cancelled it
pub fn click(engine: &mut ScriptEngine, target: NodeId) -> Result<()> {
    let revert = js::with_host(|host| pre_toggle(&mut host.document, target)).flatten();

    let prevented = dispatch(engine, target, "click")?;
    if prevented {
        if let Some(revert) = revert {
            js::with_host(|host| revert.apply(&mut host.document));
        }
        return Ok(());
    }

    if let Some((form, submitter)) = submit_target(target) {
        submit_form(engine, form, Some(submitter))?;
        return Ok(());
    }
    follow_link(target);
    Ok(())
}

/// Toggle a checkbox or select a radio before its click handlers run,
/// returning the undo record
fn pre_toggle(doc: &mut Document, target: NodeId) -> Option<ToggleRevert> {
    let ty = doc
        .element(target)
        .filter(|e| e.kind() == ElementKind::Input)?
        .attr("type")?
        .to_ascii_lowercase();
    match ty.as_str() {
        "checkbox" => {
            let was = doc.element(target)?.has_attr("checked");
            let data = doc.element_mut(target)?;
            if was {
                data.remove_attr("checked");
            } else {
                data.set_attr("checked", "");
            }
            Some(ToggleRevert {
                changed: vec![(target, was)],
            })
        }
        "radio" => {
            let name = doc.attr(target, "name").map(str::to_owned);
            let scope = forms::enclosing_form(doc, target).unwrap_or_else(|| doc.root());
            let mut changed = vec![(target, doc.element(target)?.has_attr("checked"))];
            if let Some(name) = &name {
                // Selecting one radio clears the rest of its group
                let group: Vec<NodeId> = doc
                    .subtree(scope)
                    .filter(|id| {
                        *id != target
                            && doc.element(*id).is_some_and(|e| {
                                e.kind() == ElementKind::Input
                                    && e.attr("type")
                                        .is_some_and(|t| t.eq_ignore_ascii_case("radio"))
                                    && e.attr("name") == Some(name.as_str())
                            })
                    })
                    .collect();
                for other in group {
                    let was = doc.element(other)?.has_attr("checked");
                    if was {
                        changed.push((other, true));
                        doc.element_mut(other)?.remove_attr("checked");
                    }
                }
            }
            doc.element_mut(target)?.set_attr("checked", "");
            Some(ToggleRevert { changed })
        }
        _ => None,
    }
}

/// When the clicked node (or an ancestor) is a submit control inside a
/// form, resolve that form and submitter
fn submit_target(target: NodeId) -> Option<(NodeId, NodeId)> {
    js::with_host(|host| {
        let doc = &host.document;
        let mut chain = vec![target];
        chain.extend(doc.ancestors(target));
        for node in chain {
            let Some(data) = doc.element(node) else { continue };
            let is_submitter = match data.kind() {
                ElementKind::Input => data
                    .attr("type")
                    .is_some_and(|t| t.eq_ignore_ascii_case("submit")),
                ElementKind::Button => data
                    .attr("type")
                    .map_or(true, |t| t.eq_ignore_ascii_case("submit")),
                _ => false,
            };
            if is_submitter {
                return forms::enclosing_form(doc, node).map(|form| (form, node));
            }
        }
        None
    })
    .flatten()
}

/// Record the navigation a followed link would cause
fn follow_link(target: NodeId) {
    js::with_host(|host| {
        let doc = &host.document;
        let mut chain = vec![target];
        chain.extend(doc.ancestors(target));
        let href = chain.into_iter().find_map(|node| {
            (doc.kind(node) == Some(ElementKind::Anchor))
                .then(|| doc.attr(node, "href"))
                .flatten()
                .map(str::to_owned)
        });
        let Some(href) = href else { return };
        if href.starts_with('#') || href.to_ascii_lowercase().starts_with("javascript:") {
            return;
        }
        let resolved = match &host.base_url {
            Some(base) => base.join(&href).map(|u| u.to_string()).unwrap_or(href),
            None => href,
        };
        host.navigations.push(resolved);
    });
}

/// Submit a form: fires `submit` (cancellable), then records the encoded
/// submission
pub fn submit_form(
    engine: &mut ScriptEngine,
    form: NodeId,
    submitter: Option<NodeId>,
) -> Result<Option<FormSubmission>> {
    let prevented = dispatch(engine, form, "submit")?;
    if prevented {
        return Ok(None);
    }
    let submission = js::with_host(|host| {
        forms::submit(&host.document, form, submitter, host.base_url.as_ref())
    });
    match submission {
        Some(Ok(submission)) => {
            js::with_host(|host| host.submissions.push(submission.clone()));
            Ok(Some(submission))
        }
        Some(Err(e)) => Err(e),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::js::{install_host, take_host, HostState};
    use crate::parser::HtmlParser;
    use url::Url;

    fn setup(html: &str) -> ScriptEngine {
        let doc = HtmlParser::new().parse(html).unwrap();
        let mut state = HostState::new(doc);
        state.base_url = Some(Url::parse("http://example.com/page").unwrap());
        install_host(state);
        ScriptEngine::new("test-agent/1.0", "Netscape").unwrap()
    }

    fn node_by_id(id: &str) -> NodeId {
        js::with_host(|host| host.document.get_element_by_id(id))
            .flatten()
            .unwrap()
    }

    #[test]
    fn test_inline_handler_fires() {
        let mut engine = setup(concat!(
            r#"<div id="out">before</div>"#,
            r#"<button id="b" onclick="document.getElementById('out').textContent = 'after'">go</button>"#,
        ));
        click(&mut engine, node_by_id("b")).unwrap();
        let state = take_host().unwrap();
        let out = state.document.get_element_by_id("out").unwrap();
        assert_eq!(state.document.text_content(out), "after");
    }

    #[test]
    fn test_listener_receives_target() {
        let mut engine = setup(r#"<button id="b">go</button>"#);
        engine
            .run(concat!(
                "document.getElementById('b').addEventListener('click', function(e) {",
                "  console.log(e.type + ':' + e.target.id);",
                "});",
            ))
            .unwrap();
        click(&mut engine, node_by_id("b")).unwrap();
        let state = take_host().unwrap();
        assert_eq!(state.console.len(), 1);
        assert_eq!(state.console[0].message, "click:b");
    }

    #[test]
    fn test_event_bubbles_to_ancestor() {
        let mut engine = setup(r#"<div id="outer"><span id="inner">x</span></div>"#);
        engine
            .run(concat!(
                "document.getElementById('inner').addEventListener('click', function() { console.log('inner'); });",
                "document.getElementById('outer').addEventListener('click', function() { console.log('outer'); });",
                "document.addEventListener('click', function() { console.log('doc'); });",
            ))
            .unwrap();
        click(&mut engine, node_by_id("inner")).unwrap();
        let state = take_host().unwrap();
        let order: Vec<&str> = state.console.iter().map(|m| m.message.as_str()).collect();
        assert_eq!(order, vec!["inner", "outer", "doc"]);
    }

    #[test]
    fn test_link_click_records_navigation() {
        let mut engine = setup(r#"<a id="l" href="/next">next</a>"#);
        click(&mut engine, node_by_id("l")).unwrap();
        let state = take_host().unwrap();
        assert_eq!(state.navigations, vec!["http://example.com/next"]);
    }

    #[test]
    fn test_inline_return_false_cancels_navigation() {
        let mut engine = setup(r#"<a id="l" href="/next" onclick="return false">next</a>"#);
        click(&mut engine, node_by_id("l")).unwrap();
        let state = take_host().unwrap();
        assert!(state.navigations.is_empty());
    }

    #[test]
    fn test_prevent_default_cancels_navigation() {
        let mut engine = setup(r#"<a id="l" href="/next">next</a>"#);
        engine
            .run(concat!(
                "document.getElementById('l').addEventListener('click', function(e) {",
                "  e.preventDefault();",
                "});",
            ))
            .unwrap();
        click(&mut engine, node_by_id("l")).unwrap();
        let state = take_host().unwrap();
        assert!(state.navigations.is_empty());
    }

    #[test]
    fn test_fragment_link_not_recorded() {
        let mut engine = setup(r##"<a id="l" href="#section">jump</a>"##);
        click(&mut engine, node_by_id("l")).unwrap();
        let state = take_host().unwrap();
        assert!(state.navigations.is_empty());
    }

    #[test]
    fn test_checkbox_toggles_before_handler() {
        let mut engine = setup(r#"<input type="checkbox" id="c">"#);
        engine
            .run(concat!(
                "document.getElementById('c').addEventListener('click', function(e) {",
                "  console.log('checked=' + e.target.checked);",
                "});",
            ))
            .unwrap();
        click(&mut engine, node_by_id("c")).unwrap();
        let state = take_host().unwrap();
        assert_eq!(state.console[0].message, "checked=true");
        let c = state.document.get_element_by_id("c").unwrap();
        assert!(state.document.element(c).unwrap().has_attr("checked"));
    }

    #[test]
    fn test_cancelled_checkbox_click_reverts() {
        let mut engine =
            setup(r#"<input type="checkbox" id="c" onclick="return false">"#);
        click(&mut engine, node_by_id("c")).unwrap();
        let state = take_host().unwrap();
        let c = state.document.get_element_by_id("c").unwrap();
        assert!(!state.document.element(c).unwrap().has_attr("checked"));
    }

    #[test]
    fn test_radio_group_exclusive() {
        let mut engine = setup(concat!(
            "<form>",
            r#"<input type="radio" name="g" id="r1" checked>"#,
            r#"<input type="radio" name="g" id="r2">"#,
            "</form>",
        ));
        click(&mut engine, node_by_id("r2")).unwrap();
        let state = take_host().unwrap();
        let r1 = state.document.get_element_by_id("r1").unwrap();
        let r2 = state.document.get_element_by_id("r2").unwrap();
        assert!(!state.document.element(r1).unwrap().has_attr("checked"));
        assert!(state.document.element(r2).unwrap().has_attr("checked"));
    }

    #[test]
    fn test_submit_button_submits_form() {
        let mut engine = setup(concat!(
            r#"<form action="/go"><input name="q" value="x">"#,
            r#"<input type="submit" id="s" name="btn" value="Send"></form>"#,
        ));
        click(&mut engine, node_by_id("s")).unwrap();
        let state = take_host().unwrap();
        assert_eq!(state.submissions.len(), 1);
        assert_eq!(
            state.submissions[0].action,
            "http://example.com/go?q=x&btn=Send"
        );
    }

    #[test]
    fn test_onsubmit_false_cancels_submission() {
        let mut engine = setup(concat!(
            r#"<form action="/go" onsubmit="return false">"#,
            r#"<input type="submit" id="s"></form>"#,
        ));
        click(&mut engine, node_by_id("s")).unwrap();
        let state = take_host().unwrap();
        assert!(state.submissions.is_empty());
    }

    #[test]
    fn test_document_level_dispatch() {
        let mut engine = setup("<p>x</p>");
        engine
            .run("document.addEventListener('DOMContentLoaded', function() { console.log('ready'); });")
            .unwrap();
        dispatch_document(&mut engine, "DOMContentLoaded").unwrap();
        let state = take_host().unwrap();
        assert_eq!(state.console[0].message, "ready");
    }
}
