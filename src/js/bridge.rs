//! Host objects exposed to scripts
//!
//! Native functions must be `Copy`, so nothing here captures state: element
//! proxies carry their arena index in a `__node` property and every method
//! reads it back from `this`, while the document itself is reached through
//! the thread-local host slot.

use super::{
    with_host, ConsoleLevel, ConsoleMessage, ListenerRegistration, ListenerTarget, TimerEntry,
};
use crate::dom::{ElementKind, NodeId};
use crate::parser::HtmlParser;
use crate::{query, text};
use boa_engine::object::builtins::JsArray;
use boa_engine::object::ObjectInitializer;
use boa_engine::property::Attribute;
use boa_engine::{js_string, Context, JsObject, JsResult, JsString, JsValue, NativeFunction};
use std::sync::atomic::{AtomicU32, Ordering};

static NEXT_CALLBACK_ID: AtomicU32 = AtomicU32::new(1);
static NEXT_TIMER_ID: AtomicU32 = AtomicU32::new(1);

pub(crate) fn register_globals(
    context: &mut Context,
    user_agent: &str,
    app_name: &str,
) -> JsResult<()> {
    register_event_helpers(context)?;
    register_console(context)?;
    register_dialogs(context)?;
    register_timers(context)?;

    let navigator = build_navigator(context, user_agent, app_name);
    let location = build_location(context);
    let document = build_document(context);
    let window = build_window(context, &navigator, &location, &document);

    context.register_global_property(js_string!("navigator"), navigator, Attribute::all())?;
    context.register_global_property(js_string!("location"), location, Attribute::all())?;
    context.register_global_property(js_string!("document"), document, Attribute::all())?;
    context.register_global_property(js_string!("window"), window, Attribute::all())?;
    Ok(())
}

// --- helpers ---

fn arg_string(args: &[JsValue], index: usize, ctx: &mut Context) -> JsResult<String> {
    args.get(index)
        .map(|v| v.to_string(ctx))
        .transpose()
        .map(|s| s.map(|s| s.to_std_string_escaped()).unwrap_or_default())
}

/// Read the arena index off an element proxy's `this` binding
fn node_of(this: &JsValue, ctx: &mut Context) -> JsResult<Option<NodeId>> {
    let Some(obj) = this.as_object() else {
        return Ok(None);
    };
    let raw = obj.get(js_string!("__node"), ctx)?;
    if raw.is_undefined() || raw.is_null() {
        return Ok(None);
    }
    Ok(Some(NodeId(raw.to_number(ctx)? as usize)))
}

/// Read the arena index off an element proxy passed as an argument
fn node_of_arg(args: &[JsValue], index: usize, ctx: &mut Context) -> JsResult<Option<NodeId>> {
    match args.get(index) {
        Some(value) => node_of(value, ctx),
        None => Ok(None),
    }
}

/// Turn a listener argument into an expression evaluating to a callable.
///
/// Functions are persisted as uniquely named globals (they cannot leave the
/// context); string arguments become a handler body with `event` in scope.
fn extract_callback(arg: &JsValue, ctx: &mut Context) -> JsResult<String> {
    if arg.as_object().is_some_and(|o| o.is_callable()) {
        let n = NEXT_CALLBACK_ID.fetch_add(1, Ordering::Relaxed);
        let name = format!("__strix_cb_{n}");
        ctx.register_global_property(
            JsString::from(name.as_str()),
            arg.clone(),
            Attribute::all(),
        )?;
        return Ok(name);
    }
    if arg.is_string() {
        let source = arg.to_string(ctx)?.to_std_string_escaped();
        return Ok(format!("(function(event) {{ {source} }})"));
    }
    Ok("(function() {})".to_string())
}

fn push_listener(target: ListenerTarget, event: String, callback: String) {
    with_host(|host| {
        host.listeners.push(ListenerRegistration {
            target,
            event,
            callback,
        });
    });
}

/// Callback identity is not tracked; removal drops every listener for the
/// target/event pair
fn drop_listeners(target: ListenerTarget, event: &str) {
    with_host(|host| {
        host.listeners
            .retain(|l| l.target != target || l.event != event);
    });
}

// --- event dispatch support ---

fn register_event_helpers(context: &mut Context) -> JsResult<()> {
    // __strix_target(n): element proxy for an arena index, used when
    // building event objects
    let target_fn = NativeFunction::from_copy_closure(|_this, args, ctx| {
        let raw = args
            .first()
            .map(|v| v.to_number(ctx))
            .transpose()?
            .unwrap_or(-1.0);
        if raw < 0.0 {
            return Ok(JsValue::null());
        }
        Ok(JsValue::from(element_proxy(ctx, NodeId(raw as usize))))
    });

    let prevent_fn = NativeFunction::from_copy_closure(|_this, _args, _ctx| {
        with_host(|host| host.default_prevented = true);
        Ok(JsValue::undefined())
    });

    context.register_global_property(
        js_string!("__strix_target"),
        target_fn.to_js_function(context.realm()),
        Attribute::all(),
    )?;
    context.register_global_property(
        js_string!("__strix_prevent_default"),
        prevent_fn.to_js_function(context.realm()),
        Attribute::all(),
    )
}

// --- console ---

fn console_native(level: ConsoleLevel) -> NativeFunction {
    // One Copy closure per level; the level is encoded in the function choice
    match level {
        ConsoleLevel::Log => NativeFunction::from_copy_closure(|_this, args, ctx| {
            record_console(ConsoleLevel::Log, args, ctx)
        }),
        ConsoleLevel::Info => NativeFunction::from_copy_closure(|_this, args, ctx| {
            record_console(ConsoleLevel::Info, args, ctx)
        }),
        ConsoleLevel::Warn => NativeFunction::from_copy_closure(|_this, args, ctx| {
            record_console(ConsoleLevel::Warn, args, ctx)
        }),
        ConsoleLevel::Error => NativeFunction::from_copy_closure(|_this, args, ctx| {
            record_console(ConsoleLevel::Error, args, ctx)
        }),
    }
}

fn record_console(level: ConsoleLevel, args: &[JsValue], ctx: &mut Context) -> JsResult<JsValue> {
    let mut parts = Vec::with_capacity(args.len());
    for arg in args {
        parts.push(arg.to_string(ctx)?.to_std_string_escaped());
    }
    let message = parts.join(" ");
    log::debug!("console[{level:?}]: {message}");
    with_host(|host| host.console.push(ConsoleMessage { level, message }));
    Ok(JsValue::undefined())
}

fn register_console(context: &mut Context) -> JsResult<()> {
    let console = ObjectInitializer::new(context)
        .function(console_native(ConsoleLevel::Log), js_string!("log"), 1)
        .function(console_native(ConsoleLevel::Info), js_string!("info"), 1)
        .function(console_native(ConsoleLevel::Warn), js_string!("warn"), 1)
        .function(console_native(ConsoleLevel::Error), js_string!("error"), 1)
        .build();
    context.register_global_property(js_string!("console"), console, Attribute::all())
}

// --- dialogs ---

fn alert_native() -> NativeFunction {
    NativeFunction::from_copy_closure(|_this, args, ctx| {
        let message = arg_string(args, 0, ctx)?;
        with_host(|host| host.alerts.push(message));
        Ok(JsValue::undefined())
    })
}

fn confirm_native() -> NativeFunction {
    NativeFunction::from_copy_closure(|_this, args, ctx| {
        let message = arg_string(args, 0, ctx)?;
        let answer = with_host(|host| {
            host.confirms.push(message);
            host.confirm_answer
        })
        .unwrap_or(true);
        Ok(JsValue::from(answer))
    })
}

fn prompt_native() -> NativeFunction {
    NativeFunction::from_copy_closure(|_this, args, ctx| {
        let message = arg_string(args, 0, ctx)?;
        let answer = with_host(|host| {
            host.prompts.push(message);
            host.prompt_answer.clone()
        })
        .flatten();
        Ok(match answer {
            Some(text) => JsValue::from(JsString::from(text.as_str())),
            None => JsValue::null(),
        })
    })
}

fn register_dialogs(context: &mut Context) -> JsResult<()> {
    context.register_global_property(
        js_string!("alert"),
        alert_native().to_js_function(context.realm()),
        Attribute::all(),
    )?;
    context.register_global_property(
        js_string!("confirm"),
        confirm_native().to_js_function(context.realm()),
        Attribute::all(),
    )?;
    context.register_global_property(
        js_string!("prompt"),
        prompt_native().to_js_function(context.realm()),
        Attribute::all(),
    )
}

// --- timers ---

fn set_timer_native(is_interval: bool) -> NativeFunction {
    let make = |is_interval: bool| {
        move |_this: &JsValue, args: &[JsValue], ctx: &mut Context| -> JsResult<JsValue> {
            let callback = args
                .first()
                .map(|v| extract_callback(v, ctx))
                .transpose()?
                .unwrap_or_else(|| "(function() {})".to_string());
            let delay_ms = args
                .get(1)
                .map(|v| v.to_number(ctx))
                .transpose()?
                .map(|n| n.max(0.0) as u64)
                .unwrap_or(0);
            let id = NEXT_TIMER_ID.fetch_add(1, Ordering::Relaxed);
            with_host(|host| {
                host.timers.push(TimerEntry {
                    id,
                    callback,
                    delay_ms,
                    is_interval,
                });
            });
            Ok(JsValue::from(id))
        }
    };
    if is_interval {
        NativeFunction::from_copy_closure(make(true))
    } else {
        NativeFunction::from_copy_closure(make(false))
    }
}

fn clear_timer_native() -> NativeFunction {
    NativeFunction::from_copy_closure(|_this, args, ctx| {
        let id = args
            .first()
            .map(|v| v.to_number(ctx))
            .transpose()?
            .map(|n| n as u32)
            .unwrap_or(0);
        with_host(|host| host.timers.retain(|t| t.id != id));
        Ok(JsValue::undefined())
    })
}

fn register_timers(context: &mut Context) -> JsResult<()> {
    context.register_global_property(
        js_string!("setTimeout"),
        set_timer_native(false).to_js_function(context.realm()),
        Attribute::all(),
    )?;
    context.register_global_property(
        js_string!("setInterval"),
        set_timer_native(true).to_js_function(context.realm()),
        Attribute::all(),
    )?;
    context.register_global_property(
        js_string!("clearTimeout"),
        clear_timer_native().to_js_function(context.realm()),
        Attribute::all(),
    )?;
    context.register_global_property(
        js_string!("clearInterval"),
        clear_timer_native().to_js_function(context.realm()),
        Attribute::all(),
    )
}

// --- navigator ---

fn build_navigator(context: &mut Context, user_agent: &str, app_name: &str) -> JsObject {
    ObjectInitializer::new(context)
        .property(
            js_string!("userAgent"),
            JsString::from(user_agent),
            Attribute::READONLY,
        )
        .property(
            js_string!("appName"),
            JsString::from(app_name),
            Attribute::READONLY,
        )
        .property(
            js_string!("language"),
            js_string!("en-US"),
            Attribute::READONLY,
        )
        .build()
}

// --- location ---

fn location_part(part: fn(&url::Url) -> String) -> Option<String> {
    with_host(|host| host.base_url.as_ref().map(part)).flatten()
}

fn build_location(context: &mut Context) -> JsObject {
    let get_href = NativeFunction::from_copy_closure(|_this, _args, _ctx| {
        let href =
            location_part(|u| u.to_string()).unwrap_or_else(|| "about:blank".to_string());
        Ok(JsValue::from(JsString::from(href.as_str())))
    })
    .to_js_function(context.realm());

    // Assigning location.href records the navigation; no load happens
    let set_href = NativeFunction::from_copy_closure(|_this, args, ctx| {
        let target = arg_string(args, 0, ctx)?;
        with_host(|host| {
            let resolved = match &host.base_url {
                Some(base) => base
                    .join(&target)
                    .map(|u| u.to_string())
                    .unwrap_or_else(|_| target.clone()),
                None => target.clone(),
            };
            host.navigations.push(resolved);
        });
        Ok(JsValue::undefined())
    })
    .to_js_function(context.realm());

    let get_protocol = NativeFunction::from_copy_closure(|_this, _args, _ctx| {
        let v = location_part(|u| format!("{}:", u.scheme())).unwrap_or_default();
        Ok(JsValue::from(JsString::from(v.as_str())))
    })
    .to_js_function(context.realm());

    let get_hostname = NativeFunction::from_copy_closure(|_this, _args, _ctx| {
        let v = location_part(|u| u.host_str().unwrap_or("").to_string()).unwrap_or_default();
        Ok(JsValue::from(JsString::from(v.as_str())))
    })
    .to_js_function(context.realm());

    let get_pathname = NativeFunction::from_copy_closure(|_this, _args, _ctx| {
        let v = location_part(|u| u.path().to_string()).unwrap_or_else(|| "/".to_string());
        Ok(JsValue::from(JsString::from(v.as_str())))
    })
    .to_js_function(context.realm());

    let get_search = NativeFunction::from_copy_closure(|_this, _args, _ctx| {
        let v = location_part(|u| match u.query() {
            Some(q) if !q.is_empty() => format!("?{q}"),
            _ => String::new(),
        })
        .unwrap_or_default();
        Ok(JsValue::from(JsString::from(v.as_str())))
    })
    .to_js_function(context.realm());

    let get_hash = NativeFunction::from_copy_closure(|_this, _args, _ctx| {
        let v = location_part(|u| match u.fragment() {
            Some(f) if !f.is_empty() => format!("#{f}"),
            _ => String::new(),
        })
        .unwrap_or_default();
        Ok(JsValue::from(JsString::from(v.as_str())))
    })
    .to_js_function(context.realm());

    ObjectInitializer::new(context)
        .accessor(js_string!("href"), Some(get_href), Some(set_href), Attribute::all())
        .accessor(js_string!("protocol"), Some(get_protocol), None, Attribute::READONLY)
        .accessor(js_string!("hostname"), Some(get_hostname), None, Attribute::READONLY)
        .accessor(js_string!("pathname"), Some(get_pathname), None, Attribute::READONLY)
        .accessor(js_string!("search"), Some(get_search), None, Attribute::READONLY)
        .accessor(js_string!("hash"), Some(get_hash), None, Attribute::READONLY)
        .build()
}

// --- document ---

fn build_document(context: &mut Context) -> JsObject {
    let get_element_by_id = NativeFunction::from_copy_closure(|_this, args, ctx| {
        let id = arg_string(args, 0, ctx)?;
        if id.is_empty() {
            return Ok(JsValue::null());
        }
        let found = with_host(|host| host.document.get_element_by_id(&id)).flatten();
        Ok(match found {
            Some(node) => JsValue::from(element_proxy(ctx, node)),
            None => JsValue::null(),
        })
    });

    let query_selector = NativeFunction::from_copy_closure(|_this, args, ctx| {
        let selector = arg_string(args, 0, ctx)?;
        let found = with_host(|host| {
            let root = host.document.root();
            query::select_first(&host.document, root, &selector)
                .ok()
                .flatten()
        })
        .flatten();
        Ok(match found {
            Some(node) => JsValue::from(element_proxy(ctx, node)),
            None => JsValue::null(),
        })
    });

    let query_selector_all = NativeFunction::from_copy_closure(|_this, args, ctx| {
        let selector = arg_string(args, 0, ctx)?;
        let found = with_host(|host| {
            let root = host.document.root();
            query::select_all(&host.document, root, &selector).unwrap_or_default()
        })
        .unwrap_or_default();
        proxy_array(ctx, &found)
    });

    let by_tag_name = NativeFunction::from_copy_closure(|_this, args, ctx| {
        let tag = arg_string(args, 0, ctx)?;
        let found =
            with_host(|host| host.document.get_elements_by_tag_name(&tag)).unwrap_or_default();
        proxy_array(ctx, &found)
    });

    let by_class_name = NativeFunction::from_copy_closure(|_this, args, ctx| {
        let class = arg_string(args, 0, ctx)?;
        let found =
            with_host(|host| host.document.get_elements_by_class_name(&class)).unwrap_or_default();
        proxy_array(ctx, &found)
    });

    let create_element = NativeFunction::from_copy_closure(|_this, args, ctx| {
        let tag = arg_string(args, 0, ctx)?;
        let created = with_host(|host| host.document.create_element(&tag));
        Ok(match created {
            Some(node) => JsValue::from(element_proxy(ctx, node)),
            None => JsValue::null(),
        })
    });

    let create_text_node = NativeFunction::from_copy_closure(|_this, args, ctx| {
        let content = arg_string(args, 0, ctx)?;
        let created = with_host(|host| host.document.create_text(content));
        Ok(match created {
            Some(node) => JsValue::from(element_proxy(ctx, node)),
            None => JsValue::null(),
        })
    });

    // document.write appends to the body; the streaming insertion-point
    // semantics are out of scope
    let write = NativeFunction::from_copy_closure(|_this, args, ctx| {
        let html = arg_string(args, 0, ctx)?;
        with_host(|host| {
            let Some(body) = host.document.body() else {
                return;
            };
            match HtmlParser::new().parse_fragment(&html) {
                Ok((frag, roots)) => {
                    for root in roots {
                        let imported = host.document.import_subtree(&frag, root);
                        host.document.append(body, imported);
                    }
                }
                Err(e) => log::debug!("document.write parse failed: {e}"),
            }
        });
        Ok(JsValue::undefined())
    });

    let add_listener = NativeFunction::from_copy_closure(|_this, args, ctx| {
        let event = arg_string(args, 0, ctx)?;
        let callback = args
            .get(1)
            .map(|v| extract_callback(v, ctx))
            .transpose()?
            .unwrap_or_default();
        if !callback.is_empty() {
            push_listener(ListenerTarget::Document, event, callback);
        }
        Ok(JsValue::undefined())
    });

    let remove_listener = NativeFunction::from_copy_closure(|_this, args, ctx| {
        let event = arg_string(args, 0, ctx)?;
        drop_listeners(ListenerTarget::Document, &event);
        Ok(JsValue::undefined())
    });

    let get_title = NativeFunction::from_copy_closure(|_this, _args, _ctx| {
        let title = with_host(|host| {
            host.document
                .get_elements_by_tag_name("title")
                .first()
                .map(|t| host.document.text_content(*t).trim().to_string())
        })
        .flatten()
        .unwrap_or_default();
        Ok(JsValue::from(JsString::from(title.as_str())))
    })
    .to_js_function(context.realm());

    let set_title = NativeFunction::from_copy_closure(|_this, args, ctx| {
        let title = arg_string(args, 0, ctx)?;
        with_host(|host| {
            let existing = host.document.get_elements_by_tag_name("title").first().copied();
            let target = match existing {
                Some(t) => t,
                None => {
                    let Some(head) = host.document.head() else {
                        return;
                    };
                    let t = host.document.create_element("title");
                    host.document.append(head, t);
                    t
                }
            };
            let text = host.document.create_text(title.clone());
            host.document.replace_children(target, vec![text]);
        });
        Ok(JsValue::undefined())
    })
    .to_js_function(context.realm());

    let get_body = NativeFunction::from_copy_closure(|_this, _args, ctx| {
        let body = with_host(|host| host.document.body()).flatten();
        Ok(match body {
            Some(node) => JsValue::from(element_proxy(ctx, node)),
            None => JsValue::null(),
        })
    })
    .to_js_function(context.realm());

    let get_document_element = NativeFunction::from_copy_closure(|_this, _args, ctx| {
        let html = with_host(|host| host.document.document_element()).flatten();
        Ok(match html {
            Some(node) => JsValue::from(element_proxy(ctx, node)),
            None => JsValue::null(),
        })
    })
    .to_js_function(context.realm());

    ObjectInitializer::new(context)
        .function(get_element_by_id, js_string!("getElementById"), 1)
        .function(query_selector, js_string!("querySelector"), 1)
        .function(query_selector_all, js_string!("querySelectorAll"), 1)
        .function(by_tag_name, js_string!("getElementsByTagName"), 1)
        .function(by_class_name, js_string!("getElementsByClassName"), 1)
        .function(create_element, js_string!("createElement"), 1)
        .function(create_text_node, js_string!("createTextNode"), 1)
        .function(write, js_string!("write"), 1)
        .function(add_listener, js_string!("addEventListener"), 2)
        .function(remove_listener, js_string!("removeEventListener"), 2)
        .accessor(js_string!("title"), Some(get_title), Some(set_title), Attribute::all())
        .accessor(js_string!("body"), Some(get_body), None, Attribute::READONLY)
        .accessor(
            js_string!("documentElement"),
            Some(get_document_element),
            None,
            Attribute::READONLY,
        )
        .build()
}

// --- window ---

fn build_window(
    context: &mut Context,
    navigator: &JsObject,
    location: &JsObject,
    document: &JsObject,
) -> JsObject {
    let add_listener = NativeFunction::from_copy_closure(|_this, args, ctx| {
        let event = arg_string(args, 0, ctx)?;
        let callback = args
            .get(1)
            .map(|v| extract_callback(v, ctx))
            .transpose()?
            .unwrap_or_default();
        if !callback.is_empty() {
            push_listener(ListenerTarget::Window, event, callback);
        }
        Ok(JsValue::undefined())
    });

    let remove_listener = NativeFunction::from_copy_closure(|_this, args, ctx| {
        let event = arg_string(args, 0, ctx)?;
        drop_listeners(ListenerTarget::Window, &event);
        Ok(JsValue::undefined())
    });

    let noop = NativeFunction::from_copy_closure(|_this, _args, _ctx| Ok(JsValue::undefined()));

    ObjectInitializer::new(context)
        .function(add_listener, js_string!("addEventListener"), 2)
        .function(remove_listener, js_string!("removeEventListener"), 2)
        .function(set_timer_native(false), js_string!("setTimeout"), 2)
        .function(set_timer_native(true), js_string!("setInterval"), 2)
        .function(clear_timer_native(), js_string!("clearTimeout"), 1)
        .function(clear_timer_native(), js_string!("clearInterval"), 1)
        .function(alert_native(), js_string!("alert"), 1)
        .function(confirm_native(), js_string!("confirm"), 1)
        .function(prompt_native(), js_string!("prompt"), 1)
        .function(noop, js_string!("focus"), 0)
        .property(js_string!("navigator"), navigator.clone(), Attribute::all())
        .property(js_string!("location"), location.clone(), Attribute::all())
        .property(js_string!("document"), document.clone(), Attribute::all())
        .property(js_string!("innerWidth"), 1280, Attribute::all())
        .property(js_string!("innerHeight"), 800, Attribute::all())
        .build()
}

// --- element proxies ---

fn proxy_array(ctx: &mut Context, nodes: &[NodeId]) -> JsResult<JsValue> {
    let array = JsArray::new(ctx);
    for node in nodes {
        let proxy = element_proxy(ctx, *node);
        array.push(JsValue::from(proxy), ctx)?;
    }
    Ok(JsValue::from(array))
}

/// Build a proxy object for one DOM node.
///
/// Must not be called while a `with_host` borrow is live; collect node ids
/// first, then build proxies.
pub(crate) fn element_proxy(ctx: &mut Context, id: NodeId) -> JsObject {
    let tag = with_host(|host| host.document.tag_name(id).map(str::to_owned))
        .flatten()
        .unwrap_or_default();

    let get_inner_html = NativeFunction::from_copy_closure(|this, _args, ctx| {
        let Some(node) = node_of(this, ctx)? else {
            return Ok(JsValue::undefined());
        };
        let html = with_host(|host| text::inner_html(&host.document, node)).unwrap_or_default();
        Ok(JsValue::from(JsString::from(html.as_str())))
    })
    .to_js_function(ctx.realm());

    // Assigned markup is re-parsed as a fragment; scripts inside it are
    // inserted but never executed
    let set_inner_html = NativeFunction::from_copy_closure(|this, args, ctx| {
        let Some(node) = node_of(this, ctx)? else {
            return Ok(JsValue::undefined());
        };
        let html = arg_string(args, 0, ctx)?;
        with_host(|host| match HtmlParser::new().parse_fragment(&html) {
            Ok((frag, roots)) => {
                let imported: Vec<NodeId> = roots
                    .iter()
                    .map(|root| host.document.import_subtree(&frag, *root))
                    .collect();
                host.document.replace_children(node, imported);
            }
            Err(e) => log::debug!("innerHTML parse failed: {e}"),
        });
        Ok(JsValue::undefined())
    })
    .to_js_function(ctx.realm());

    let get_text_content = NativeFunction::from_copy_closure(|this, _args, ctx| {
        let Some(node) = node_of(this, ctx)? else {
            return Ok(JsValue::undefined());
        };
        let content = with_host(|host| host.document.text_content(node)).unwrap_or_default();
        Ok(JsValue::from(JsString::from(content.as_str())))
    })
    .to_js_function(ctx.realm());

    let set_text_content = NativeFunction::from_copy_closure(|this, args, ctx| {
        let Some(node) = node_of(this, ctx)? else {
            return Ok(JsValue::undefined());
        };
        let content = arg_string(args, 0, ctx)?;
        with_host(|host| {
            let children = if content.is_empty() {
                Vec::new()
            } else {
                vec![host.document.create_text(content.clone())]
            };
            host.document.replace_children(node, children);
        });
        Ok(JsValue::undefined())
    })
    .to_js_function(ctx.realm());

    let get_value = NativeFunction::from_copy_closure(|this, _args, ctx| {
        let Some(node) = node_of(this, ctx)? else {
            return Ok(JsValue::undefined());
        };
        let value = with_host(|host| {
            if host.document.kind(node) == Some(ElementKind::TextArea) {
                host.document.text_content(node)
            } else {
                host.document.attr(node, "value").unwrap_or("").to_string()
            }
        })
        .unwrap_or_default();
        Ok(JsValue::from(JsString::from(value.as_str())))
    })
    .to_js_function(ctx.realm());

    let set_value = NativeFunction::from_copy_closure(|this, args, ctx| {
        let Some(node) = node_of(this, ctx)? else {
            return Ok(JsValue::undefined());
        };
        let value = arg_string(args, 0, ctx)?;
        with_host(|host| {
            if host.document.kind(node) == Some(ElementKind::TextArea) {
                let text = host.document.create_text(value.clone());
                host.document.replace_children(node, vec![text]);
            } else if let Some(data) = host.document.element_mut(node) {
                data.set_attr("value", value.clone());
            }
        });
        Ok(JsValue::undefined())
    })
    .to_js_function(ctx.realm());

    let get_checked = NativeFunction::from_copy_closure(|this, _args, ctx| {
        let Some(node) = node_of(this, ctx)? else {
            return Ok(JsValue::undefined());
        };
        let checked = with_host(|host| {
            host.document
                .element(node)
                .is_some_and(|e| e.has_attr("checked"))
        })
        .unwrap_or(false);
        Ok(JsValue::from(checked))
    })
    .to_js_function(ctx.realm());

    let set_checked = NativeFunction::from_copy_closure(|this, args, ctx| {
        let Some(node) = node_of(this, ctx)? else {
            return Ok(JsValue::undefined());
        };
        let on = args.first().is_some_and(JsValue::to_boolean);
        with_host(|host| {
            if let Some(data) = host.document.element_mut(node) {
                if on {
                    data.set_attr("checked", "");
                } else {
                    data.remove_attr("checked");
                }
            }
        });
        Ok(JsValue::undefined())
    })
    .to_js_function(ctx.realm());

    let get_id = NativeFunction::from_copy_closure(|this, _args, ctx| {
        let Some(node) = node_of(this, ctx)? else {
            return Ok(JsValue::undefined());
        };
        let value = with_host(|host| host.document.attr(node, "id").unwrap_or("").to_string())
            .unwrap_or_default();
        Ok(JsValue::from(JsString::from(value.as_str())))
    })
    .to_js_function(ctx.realm());

    let set_id = NativeFunction::from_copy_closure(|this, args, ctx| {
        let Some(node) = node_of(this, ctx)? else {
            return Ok(JsValue::undefined());
        };
        let value = arg_string(args, 0, ctx)?;
        with_host(|host| {
            if let Some(data) = host.document.element_mut(node) {
                data.set_attr("id", value.clone());
            }
        });
        Ok(JsValue::undefined())
    })
    .to_js_function(ctx.realm());

    let get_class_name = NativeFunction::from_copy_closure(|this, _args, ctx| {
        let Some(node) = node_of(this, ctx)? else {
            return Ok(JsValue::undefined());
        };
        let value = with_host(|host| host.document.attr(node, "class").unwrap_or("").to_string())
            .unwrap_or_default();
        Ok(JsValue::from(JsString::from(value.as_str())))
    })
    .to_js_function(ctx.realm());

    let set_class_name = NativeFunction::from_copy_closure(|this, args, ctx| {
        let Some(node) = node_of(this, ctx)? else {
            return Ok(JsValue::undefined());
        };
        let value = arg_string(args, 0, ctx)?;
        with_host(|host| {
            if let Some(data) = host.document.element_mut(node) {
                data.set_attr("class", value.clone());
            }
        });
        Ok(JsValue::undefined())
    })
    .to_js_function(ctx.realm());

    let get_disabled = NativeFunction::from_copy_closure(|this, _args, ctx| {
        let Some(node) = node_of(this, ctx)? else {
            return Ok(JsValue::undefined());
        };
        let disabled =
            with_host(|host| host.document.element(node).is_some_and(|e| e.is_disabled()))
                .unwrap_or(false);
        Ok(JsValue::from(disabled))
    })
    .to_js_function(ctx.realm());

    let get_attribute = NativeFunction::from_copy_closure(|this, args, ctx| {
        let Some(node) = node_of(this, ctx)? else {
            return Ok(JsValue::null());
        };
        let name = arg_string(args, 0, ctx)?;
        let value =
            with_host(|host| host.document.attr(node, &name).map(str::to_owned)).flatten();
        Ok(match value {
            Some(v) => JsValue::from(JsString::from(v.as_str())),
            None => JsValue::null(),
        })
    });

    let set_attribute = NativeFunction::from_copy_closure(|this, args, ctx| {
        let Some(node) = node_of(this, ctx)? else {
            return Ok(JsValue::undefined());
        };
        let name = arg_string(args, 0, ctx)?;
        let value = arg_string(args, 1, ctx)?;
        with_host(|host| {
            if let Some(data) = host.document.element_mut(node) {
                data.set_attr(name.clone(), value.clone());
            }
        });
        Ok(JsValue::undefined())
    });

    let remove_attribute = NativeFunction::from_copy_closure(|this, args, ctx| {
        let Some(node) = node_of(this, ctx)? else {
            return Ok(JsValue::undefined());
        };
        let name = arg_string(args, 0, ctx)?;
        with_host(|host| {
            if let Some(data) = host.document.element_mut(node) {
                data.remove_attr(&name);
            }
        });
        Ok(JsValue::undefined())
    });

    let has_attribute = NativeFunction::from_copy_closure(|this, args, ctx| {
        let Some(node) = node_of(this, ctx)? else {
            return Ok(JsValue::from(false));
        };
        let name = arg_string(args, 0, ctx)?;
        let present = with_host(|host| host.document.attr(node, &name).is_some()).unwrap_or(false);
        Ok(JsValue::from(present))
    });

    let append_child = NativeFunction::from_copy_closure(|this, args, ctx| {
        let Some(parent) = node_of(this, ctx)? else {
            return Ok(JsValue::undefined());
        };
        if let Some(child) = node_of_arg(args, 0, ctx)? {
            with_host(|host| host.document.append(parent, child));
        }
        Ok(args.first().cloned().unwrap_or(JsValue::undefined()))
    });

    let remove_self = NativeFunction::from_copy_closure(|this, _args, ctx| {
        if let Some(node) = node_of(this, ctx)? {
            with_host(|host| host.document.remove(node));
        }
        Ok(JsValue::undefined())
    });

    let remove_child = NativeFunction::from_copy_closure(|this, args, ctx| {
        let Some(parent) = node_of(this, ctx)? else {
            return Ok(JsValue::undefined());
        };
        if let Some(child) = node_of_arg(args, 0, ctx)? {
            with_host(|host| {
                if host.document.parent(child) == Some(parent) {
                    host.document.remove(child);
                }
            });
        }
        Ok(args.first().cloned().unwrap_or(JsValue::undefined()))
    });

    let add_listener = NativeFunction::from_copy_closure(|this, args, ctx| {
        let Some(node) = node_of(this, ctx)? else {
            return Ok(JsValue::undefined());
        };
        let event = arg_string(args, 0, ctx)?;
        let callback = args
            .get(1)
            .map(|v| extract_callback(v, ctx))
            .transpose()?
            .unwrap_or_default();
        if !callback.is_empty() {
            push_listener(ListenerTarget::Node(node), event, callback);
        }
        Ok(JsValue::undefined())
    });

    let remove_listener = NativeFunction::from_copy_closure(|this, args, ctx| {
        let Some(node) = node_of(this, ctx)? else {
            return Ok(JsValue::undefined());
        };
        let event = arg_string(args, 0, ctx)?;
        drop_listeners(ListenerTarget::Node(node), &event);
        Ok(JsValue::undefined())
    });

    // Clicks from script are queued; the page dispatches them after the
    // current evaluation returns
    let click = NativeFunction::from_copy_closure(|this, _args, ctx| {
        if let Some(node) = node_of(this, ctx)? {
            with_host(|host| host.pending_clicks.push(node));
        }
        Ok(JsValue::undefined())
    });

    let focus = NativeFunction::from_copy_closure(|_this, _args, _ctx| Ok(JsValue::undefined()));

    let query_selector = NativeFunction::from_copy_closure(|this, args, ctx| {
        let Some(node) = node_of(this, ctx)? else {
            return Ok(JsValue::null());
        };
        let selector = arg_string(args, 0, ctx)?;
        let found = with_host(|host| {
            query::select_first(&host.document, node, &selector)
                .ok()
                .flatten()
        })
        .flatten();
        Ok(match found {
            Some(found) => JsValue::from(element_proxy(ctx, found)),
            None => JsValue::null(),
        })
    });

    let query_selector_all = NativeFunction::from_copy_closure(|this, args, ctx| {
        let Some(node) = node_of(this, ctx)? else {
            return proxy_array(ctx, &[]);
        };
        let selector = arg_string(args, 0, ctx)?;
        let found = with_host(|host| {
            query::select_all(&host.document, node, &selector).unwrap_or_default()
        })
        .unwrap_or_default();
        proxy_array(ctx, &found)
    });

    ObjectInitializer::new(ctx)
        .property(
            js_string!("__node"),
            id.as_usize() as f64,
            Attribute::READONLY,
        )
        .property(
            js_string!("tagName"),
            JsString::from(tag.to_ascii_uppercase().as_str()),
            Attribute::READONLY,
        )
        .accessor(js_string!("innerHTML"), Some(get_inner_html), Some(set_inner_html), Attribute::all())
        .accessor(js_string!("textContent"), Some(get_text_content), Some(set_text_content), Attribute::all())
        .accessor(js_string!("value"), Some(get_value), Some(set_value), Attribute::all())
        .accessor(js_string!("checked"), Some(get_checked), Some(set_checked), Attribute::all())
        .accessor(js_string!("id"), Some(get_id), Some(set_id), Attribute::all())
        .accessor(
            js_string!("className"),
            Some(get_class_name),
            Some(set_class_name),
            Attribute::all(),
        )
        .accessor(js_string!("disabled"), Some(get_disabled), None, Attribute::READONLY)
        .function(get_attribute, js_string!("getAttribute"), 1)
        .function(set_attribute, js_string!("setAttribute"), 2)
        .function(remove_attribute, js_string!("removeAttribute"), 1)
        .function(has_attribute, js_string!("hasAttribute"), 1)
        .function(append_child, js_string!("appendChild"), 1)
        .function(remove_child, js_string!("removeChild"), 1)
        .function(remove_self, js_string!("remove"), 0)
        .function(add_listener, js_string!("addEventListener"), 2)
        .function(remove_listener, js_string!("removeEventListener"), 2)
        .function(click, js_string!("click"), 0)
        .function(focus, js_string!("focus"), 0)
        .function(query_selector, js_string!("querySelector"), 1)
        .function(query_selector_all, js_string!("querySelectorAll"), 1)
        .build()
}
