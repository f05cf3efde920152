//! A loaded page: document, script engine, and interaction records

use super::BrowserVersion;
use crate::dom::{Document, ElementKind, NodeId};
use crate::events;
use crate::forms::FormSubmission;
use crate::js::{self, ConsoleMessage, HostState, ScriptEngine};
use crate::parser::HtmlParser;
use crate::text;
use crate::utils::Result;
use url::Url;

/// A parsed page with its scripting state.
///
/// The document and all interaction records (dialogs, console output,
/// submissions, navigations) live in a [`HostState`] that is installed into
/// the thread-local host slot around every script evaluation and taken back
/// afterwards, so `&self` accessors read settled state.
#[derive(Debug)]
pub struct Page {
    engine: ScriptEngine,
    state: HostState,
}

impl Page {
    pub(crate) fn load(
        version: &BrowserVersion,
        html: &str,
        base_url: Option<Url>,
    ) -> Result<Self> {
        let document = HtmlParser::new().parse(html)?;
        let mut state = HostState::new(document);
        state.base_url = base_url;
        let engine = ScriptEngine::new(&version.user_agent, &version.app_name)?;
        let mut page = Self { engine, state };

        page.run_inline_scripts();
        page.with_engine(|engine| {
            if let Err(e) = events::dispatch_document(engine, "DOMContentLoaded") {
                log::warn!("DOMContentLoaded handler failed: {e}");
            }
            if let Err(e) = engine.flush_immediate_timers() {
                log::warn!("timer callback failed: {e}");
            }
        });
        page.process_pending_clicks();
        Ok(page)
    }

    /// Run `<script>` bodies in document order. A failing script is logged
    /// and does not abort the load, matching browser behavior.
    fn run_inline_scripts(&mut self) {
        let scripts: Vec<(NodeId, String)> = self
            .state
            .document
            .get_elements_by_tag_name("script")
            .into_iter()
            .map(|id| (id, self.state.document.text_content(id)))
            .collect();

        for (id, source) in scripts {
            if let Some(src) = self.state.document.attr(id, "src") {
                log::debug!("skipping external script: {src}");
                continue;
            }
            // A type attribute marks templates and JSON payloads; only
            // JavaScript runs
            if let Some(ty) = self.state.document.attr(id, "type") {
                let ty = ty.trim().to_ascii_lowercase();
                if !ty.is_empty()
                    && ty != "text/javascript"
                    && ty != "application/javascript"
                    && ty != "module"
                {
                    continue;
                }
            }
            if source.trim().is_empty() {
                continue;
            }
            self.with_engine(|engine| {
                if let Err(e) = engine.run(&source) {
                    log::warn!("inline script failed: {e}");
                }
            });
        }
    }

    /// Install the host state, run `f` against the engine, take the state
    /// back
    fn with_engine<R>(&mut self, f: impl FnOnce(&mut ScriptEngine) -> R) -> R {
        let state = std::mem::replace(&mut self.state, HostState::new(Document::new()));
        js::install_host(state);
        let result = f(&mut self.engine);
        if let Some(state) = js::take_host() {
            self.state = state;
        }
        result
    }

    /// Dispatch clicks queued by script-side `element.click()` calls.
    /// Handlers may queue more; iteration is capped.
    fn process_pending_clicks(&mut self) {
        for _ in 0..16 {
            let pending: Vec<NodeId> = self.state.pending_clicks.drain(..).collect();
            if pending.is_empty() {
                break;
            }
            for node in pending {
                self.with_engine(|engine| {
                    if let Err(e) = events::click(engine, node) {
                        log::warn!("queued click failed: {e}");
                    }
                });
            }
        }
    }

    // --- document access ---

    pub fn document(&self) -> &Document {
        &self.state.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.state.document
    }

    /// The page URL, when one was given at load time
    pub fn url(&self) -> Option<&Url> {
        self.state.base_url.as_ref()
    }

    /// The page title, trimmed
    pub fn title(&self) -> String {
        self.state
            .document
            .get_elements_by_tag_name("title")
            .first()
            .map(|t| self.state.document.text_content(*t).trim().to_string())
            .unwrap_or_default()
    }

    /// Visible text of the page body
    pub fn visible_text(&self) -> String {
        text::page_text(&self.state.document)
    }

    /// Visible text of the body only; empty when the document has none
    pub fn body_text(&self) -> String {
        let doc = &self.state.document;
        let Some(body) = doc.body() else {
            return String::new();
        };
        let resolver = crate::style::StyleResolver::for_document(doc);
        text::visible_text(doc, &resolver, body)
    }

    /// First element matching a CSS selector
    pub fn query_selector(&self, selector: &str) -> Result<Option<NodeId>> {
        let doc = &self.state.document;
        crate::query::select_first(doc, doc.root(), selector)
    }

    /// All elements matching a CSS selector, in document order
    pub fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>> {
        let doc = &self.state.document;
        crate::query::select_all(doc, doc.root(), selector)
    }

    /// Nodes matching an XPath expression, in document order
    pub fn find_by_xpath(&self, expr: &str) -> Result<Vec<NodeId>> {
        crate::dom::xpath::evaluate(&self.state.document, expr)
    }

    /// Current markup of the whole document
    pub fn html(&self) -> String {
        text::outer_html(&self.state.document, self.state.document.root())
    }

    // --- scripting and interaction ---

    /// Evaluate script in the page context and return the completion value
    pub fn execute_script(&mut self, source: &str) -> Result<serde_json::Value> {
        let value = self.with_engine(|engine| {
            let value = engine.execute(source)?;
            engine.flush_immediate_timers()?;
            Ok(value)
        });
        self.process_pending_clicks();
        value
    }

    /// Click an element: fires `click` and runs its default action
    pub fn click(&mut self, target: NodeId) -> Result<()> {
        let result = self.with_engine(|engine| events::click(engine, target));
        self.process_pending_clicks();
        result
    }

    /// Dispatch an event at an element without any default action.
    /// Returns whether a handler called `preventDefault`.
    pub fn fire_event(&mut self, target: NodeId, event: &str) -> Result<bool> {
        let result = self.with_engine(|engine| events::dispatch(engine, target, event));
        self.process_pending_clicks();
        result
    }

    /// Submit a form the way a submit button would, firing `submit` first
    pub fn submit(
        &mut self,
        form: NodeId,
        submitter: Option<NodeId>,
    ) -> Result<Option<FormSubmission>> {
        let result = self.with_engine(|engine| events::submit_form(engine, form, submitter));
        self.process_pending_clicks();
        result
    }

    /// Set the value of an input, textarea, or select option by value.
    /// Fires `change` when the value actually changed.
    pub fn set_value(&mut self, target: NodeId, value: &str) -> Result<()> {
        let changed = {
            let doc = &mut self.state.document;
            match doc.kind(target) {
                Some(ElementKind::TextArea) => {
                    let old = doc.text_content(target);
                    if old != value {
                        let node = doc.create_text(value);
                        doc.replace_children(target, vec![node]);
                        true
                    } else {
                        false
                    }
                }
                Some(ElementKind::Select) => select_option_by_value(doc, target, value),
                _ => {
                    let old = doc.attr(target, "value").unwrap_or("");
                    if old != value {
                        if let Some(data) = doc.element_mut(target) {
                            data.set_attr("value", value);
                        }
                        true
                    } else {
                        false
                    }
                }
            }
        };
        if changed {
            self.fire_event(target, "change")?;
        }
        Ok(())
    }

    // --- interaction records ---

    pub fn console_messages(&self) -> &[ConsoleMessage] {
        &self.state.console
    }

    pub fn alerts(&self) -> &[String] {
        &self.state.alerts
    }

    pub fn confirms(&self) -> &[String] {
        &self.state.confirms
    }

    pub fn prompts(&self) -> &[String] {
        &self.state.prompts
    }

    pub fn submissions(&self) -> &[FormSubmission] {
        &self.state.submissions
    }

    /// URLs the page tried to navigate to (followed links, `location.href`
    /// assignments). Navigation is recorded, not performed.
    pub fn navigations(&self) -> &[String] {
        &self.state.navigations
    }

    /// Answer future `confirm()` dialogs with the given choice
    pub fn set_confirm_answer(&mut self, accept: bool) {
        self.state.confirm_answer = accept;
    }

    /// Answer future `prompt()` dialogs; `None` cancels
    pub fn set_prompt_answer(&mut self, answer: Option<String>) {
        self.state.prompt_answer = answer;
    }
}

/// Mark the option with the given submit value selected, clearing others.
/// Returns whether the selection changed.
fn select_option_by_value(doc: &mut Document, select: NodeId, value: &str) -> bool {
    let options: Vec<NodeId> = doc
        .subtree(select)
        .filter(|id| doc.kind(*id) == Some(ElementKind::OptionItem))
        .collect();
    let target = options.iter().copied().find(|id| {
        let submit_value = crate::forms::option_value(doc, *id);
        submit_value == value
    });
    let Some(target) = target else {
        return false;
    };
    let mut changed = false;
    for option in options {
        let selected = doc.element(option).is_some_and(|e| e.has_attr("selected"));
        if option == target && !selected {
            if let Some(data) = doc.element_mut(option) {
                data.set_attr("selected", "");
            }
            changed = true;
        } else if option != target && selected {
            if let Some(data) = doc.element_mut(option) {
                data.remove_attr("selected");
            }
            changed = true;
        }
    }
    changed
}
