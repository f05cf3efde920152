//! JavaScript execution against the live document
//!
//! Boa's `NativeFunction::from_copy_closure` only accepts `Copy` closures, so
//! host objects cannot capture the document directly. Instead the document
//! (plus dialog/console/listener records) lives in a thread-local
//! [`HostState`] installed for the duration of script execution; native
//! functions reach it through [`with_host`]. Script execution is
//! single-threaded, which makes the side channel sound.

mod bridge;

use crate::dom::{Document, NodeId};
use crate::utils::{Result, StrixError};
use boa_engine::object::builtins::JsArray;
use boa_engine::{Context, JsValue, Source};
use std::cell::RefCell;
use url::Url;

/// Console verbosity levels scripts can emit on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleLevel {
    Log,
    Info,
    Warn,
    Error,
}

/// One `console.*` call recorded during execution
#[derive(Debug, Clone)]
pub struct ConsoleMessage {
    pub level: ConsoleLevel,
    pub message: String,
}

/// What an event listener is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerTarget {
    Window,
    Document,
    Node(NodeId),
}

/// A listener registered via `addEventListener`.
///
/// The callback is stored as a JS expression that evaluates to a callable
/// (a generated global holding the function, or a wrapper around source
/// text), since Boa functions cannot leave their context.
#[derive(Debug, Clone)]
pub struct ListenerRegistration {
    pub target: ListenerTarget,
    pub event: String,
    pub callback: String,
}

/// A timer created by `setTimeout`/`setInterval`
#[derive(Debug, Clone)]
pub struct TimerEntry {
    pub id: u32,
    pub callback: String,
    pub delay_ms: u64,
    pub is_interval: bool,
}

/// Mutable host-side state scripts operate on
#[derive(Debug)]
pub struct HostState {
    pub document: Document,
    pub base_url: Option<Url>,
    pub console: Vec<ConsoleMessage>,
    pub alerts: Vec<String>,
    pub confirms: Vec<String>,
    pub prompts: Vec<String>,
    /// Canned answer handed to `confirm()`
    pub confirm_answer: bool,
    /// Canned answer handed to `prompt()`; `None` means cancel
    pub prompt_answer: Option<String>,
    pub listeners: Vec<ListenerRegistration>,
    pub timers: Vec<TimerEntry>,
    /// Elements whose `.click()` was called from script, to be dispatched
    /// by the engine after the current evaluation
    pub pending_clicks: Vec<NodeId>,
    /// URLs assigned to `location.href` or targeted by followed links
    pub navigations: Vec<String>,
    /// Form submissions that ran to completion
    pub submissions: Vec<crate::forms::FormSubmission>,
    /// Set when the running event handler calls `preventDefault()`
    pub default_prevented: bool,
}

impl HostState {
    pub fn new(document: Document) -> Self {
        Self {
            document,
            base_url: None,
            console: Vec::new(),
            alerts: Vec::new(),
            confirms: Vec::new(),
            prompts: Vec::new(),
            confirm_answer: true,
            prompt_answer: None,
            listeners: Vec::new(),
            timers: Vec::new(),
            pending_clicks: Vec::new(),
            navigations: Vec::new(),
            submissions: Vec::new(),
            default_prevented: false,
        }
    }
}

thread_local! {
    static HOST: RefCell<Option<HostState>> = const { RefCell::new(None) };
}

/// Install the host state for the current thread, returning any previous one
pub fn install_host(state: HostState) -> Option<HostState> {
    HOST.with(|host| host.borrow_mut().replace(state))
}

/// Remove and return the installed host state
pub fn take_host() -> Option<HostState> {
    HOST.with(|host| host.borrow_mut().take())
}

/// Run `f` against the installed host state. Returns `None` when no state
/// is installed (a script running outside a page).
pub fn with_host<R>(f: impl FnOnce(&mut HostState) -> R) -> Option<R> {
    HOST.with(|host| host.borrow_mut().as_mut().map(f))
}

/// A JavaScript context wired up with the browser host objects.
///
/// One engine serves one page; the page installs its [`HostState`] before
/// every evaluation and takes it back afterwards.
pub struct ScriptEngine {
    context: Context,
}

impl ScriptEngine {
    /// Create an engine and register `window`, `document`, `console`,
    /// `navigator` and friends
    pub fn new(user_agent: &str, app_name: &str) -> Result<Self> {
        let mut context = Context::default();
        bridge::register_globals(&mut context, user_agent, app_name)
            .map_err(|e| StrixError::Script(format!("host object setup failed: {e}")))?;
        Ok(Self { context })
    }

    /// Evaluate script source, returning the completion value converted to
    /// JSON-representable data
    pub fn execute(&mut self, source: &str) -> Result<serde_json::Value> {
        let value = self
            .context
            .eval(Source::from_bytes(source.as_bytes()))
            .map_err(|e| StrixError::Script(e.to_string()))?;
        Ok(convert_value(&value, &mut self.context))
    }

    /// Evaluate script source for its side effects, discarding the value
    pub fn run(&mut self, source: &str) -> Result<()> {
        self.context
            .eval(Source::from_bytes(source.as_bytes()))
            .map_err(|e| StrixError::Script(e.to_string()))?;
        Ok(())
    }

    /// Run zero-delay `setTimeout` callbacks queued by earlier evaluations.
    /// Callbacks may queue more; iteration is capped to stay terminating.
    pub fn flush_immediate_timers(&mut self) -> Result<()> {
        for _ in 0..16 {
            let due: Vec<TimerEntry> = match with_host(|host| {
                let (due, rest) = host
                    .timers
                    .drain(..)
                    .partition(|t| t.delay_ms == 0 && !t.is_interval);
                host.timers = rest;
                due
            }) {
                Some(due) if !due.is_empty() => due,
                _ => break,
            };
            for timer in due {
                self.run(&format!("({})();", timer.callback))?;
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for ScriptEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptEngine").finish_non_exhaustive()
    }
}

/// Convert a completion value into JSON data.
///
/// Arrays convert element-wise; other objects come back as an empty map
/// (element proxies and functions have no meaningful JSON form).
fn convert_value(value: &JsValue, context: &mut Context) -> serde_json::Value {
    if value.is_undefined() || value.is_null() {
        serde_json::Value::Null
    } else if let Some(b) = value.as_boolean() {
        serde_json::Value::Bool(b)
    } else if let Some(n) = value.as_number() {
        // Whole numbers come back as JSON integers
        if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
            serde_json::Value::from(n as i64)
        } else {
            serde_json::Number::from_f64(n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null)
        }
    } else if let Some(s) = value.as_string() {
        serde_json::Value::String(s.to_std_string_escaped())
    } else if let Some(obj) = value.as_object() {
        if obj.is_array() {
            let Ok(array) = JsArray::from_object(obj.clone()) else {
                return serde_json::Value::Array(Vec::new());
            };
            let len = array.length(context).unwrap_or(0);
            let mut items = Vec::with_capacity(len as usize);
            for i in 0..len {
                let item = array.get(i, context).unwrap_or_default();
                items.push(convert_value(&item, context));
            }
            serde_json::Value::Array(items)
        } else {
            // Element proxies and plain objects have no meaningful JSON form
            serde_json::Value::Object(serde_json::Map::new())
        }
    } else {
        serde_json::Value::Null
    }
}
