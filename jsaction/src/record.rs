//! The structured value the contract produces for each intercepted event.

use wasm_bindgen::{JsCast, JsValue};

use crate::event_type;
use crate::helpers::{get_property, set_property};

/// Expando brand on plain-object event copies held by the queue.
const COPY_BRAND: &str = "__jsaction_copy";

/// Expando key under which the contract parks the suppress-mouse-cascade
/// capability on `touchend` events.
pub(crate) const PREVENT_MOUSE_EVENTS_KEY: &str = "__jsapm";

/// Properties preserved when an event is copied for the queue. Browsers may
/// invalidate event objects after the synchronous dispatch window, so queued
/// records carry a plain object with these fields instead.
const COPIED_PROPERTIES: [&str; 27] = [
    "type",
    "target",
    "srcElement",
    "currentTarget",
    "relatedTarget",
    "detail",
    "which",
    "button",
    "buttons",
    "key",
    "keyCode",
    "charCode",
    "ctrlKey",
    "altKey",
    "shiftKey",
    "metaKey",
    "clientX",
    "clientY",
    "screenX",
    "screenY",
    "pageX",
    "pageY",
    "timeStamp",
    "touches",
    "targetTouches",
    "changedTouches",
    "defaultPrevented",
];

/// What the contract hands the dispatcher: which semantic event fired, where,
/// and which ancestor's declared action matched.
#[derive(Debug, Clone)]
pub struct EventRecord {
    event_type: String,
    event: web_sys::Event,
    target_element: Option<web_sys::Element>,
    action: String,
    action_element: Option<web_sys::Element>,
    time_stamp: f64,
}

impl EventRecord {
    pub(crate) fn new(
        event_type: impl Into<String>,
        event: web_sys::Event,
        target_element: Option<web_sys::Element>,
        action: impl Into<String>,
        action_element: Option<web_sys::Element>,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            event,
            target_element,
            action: action.into(),
            action_element,
            time_stamp: crate::helpers::now(),
        }
    }

    /// The semantic event type that matched (or was classified).
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// The DOM event. For replayed records this is a plain-object copy of the
    /// original, carrying the same fields.
    pub fn event(&self) -> &web_sys::Event {
        &self.event
    }

    /// The original target of the DOM event.
    pub fn target_element(&self) -> Option<&web_sys::Element> {
        self.target_element.as_ref()
    }

    /// The resolved action name; empty when no ancestor matched.
    pub fn action(&self) -> &str {
        &self.action
    }

    /// The ancestor whose `jsaction` attribute matched, if any.
    pub fn action_element(&self) -> Option<&web_sys::Element> {
        self.action_element.as_ref()
    }

    /// Milliseconds since the epoch at record construction. Taken from the
    /// clock, not from `Event.timeStamp`, and preserved across resolution.
    pub fn time_stamp(&self) -> f64 {
        self.time_stamp
    }

    /// Whether any action matched.
    pub fn is_matched(&self) -> bool {
        self.action_element.is_some()
    }

    /// For a `touchend` record, asks the contract to suppress the emulated
    /// mouse cascade the browser will fire next. No-op on other records.
    pub fn prevent_mouse_events(&self) {
        let capability = get_property(&self.event, PREVENT_MOUSE_EVENTS_KEY);
        if let Some(f) = capability.dyn_ref::<js_sys::Function>() {
            _ = f.call1(&JsValue::NULL, &self.event);
        }
    }

    /// The record every dispatch-wide listener observes, match or not:
    /// action cleared, and `clickonly` normalized back to `click`.
    pub(crate) fn global_copy(&self) -> Self {
        let mut copy = self.clone();
        copy.action.clear();
        copy.action_element = None;
        if copy.event_type == event_type::CLICKONLY {
            copy.event_type = event_type::CLICK.to_owned();
        }
        copy
    }

    /// A record safe to hold past the synchronous dispatch window.
    pub(crate) fn copied_for_queue(&self) -> Self {
        let mut copy = self.clone();
        copy.event = copy_event(&self.event);
        copy
    }
}

/// A copy of `event` re-typed and re-targeted for an emulated semantic event
/// (`mouseenter`/`mouseleave`), leaving the raw event untouched for any other
/// binding that observes it.
#[cfg(feature = "mouse-special")]
pub(crate) fn retargeted_copy(
    event: &web_sys::Event,
    new_type: &str,
    target: &web_sys::Element,
) -> web_sys::Event {
    let copy = copy_event(event);
    set_property(&copy, "type", &JsValue::from_str(new_type));
    set_property(&copy, "target", target);
    copy
}

/// Shallow-copies an event into a plain object that outlives the dispatch
/// window. The result is an [`Event`](web_sys::Event) by cast only; it is
/// data for dispatchers, not a dispatchable event.
fn copy_event(event: &web_sys::Event) -> web_sys::Event {
    let copy = js_sys::Object::new();
    for property in COPIED_PROPERTIES {
        let value = get_property(event, property);
        if !value.is_undefined() {
            set_property(&copy, property, &value);
        }
    }
    set_property(&copy, COPY_BRAND, &JsValue::TRUE);
    copy.unchecked_into()
}
