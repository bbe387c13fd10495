//! Thin wrappers over the browser globals the contract needs: window and
//! document handles, cancellable timeouts, and expando-property access.

use std::time::Duration;
use wasm_bindgen::{prelude::Closure, JsCast, JsValue, UnwrapThrowExt};

thread_local! {
    pub(crate) static WINDOW: web_sys::Window = web_sys::window().unwrap_throw();

    pub(crate) static DOCUMENT: web_sys::Document =
        web_sys::window().unwrap_throw().document().unwrap_throw();
}

/// Returns the [`Window`](web_sys::Window).
pub fn window() -> web_sys::Window {
    WINDOW.with(Clone::clone)
}

/// Returns the [`Document`](web_sys::Document).
pub fn document() -> web_sys::Document {
    DOCUMENT.with(Clone::clone)
}

/// Sets an expando property on a DOM object.
pub(crate) fn set_property(target: &JsValue, key: &str, value: &JsValue) {
    _ = js_sys::Reflect::set(target, &JsValue::from_str(key), value);
}

/// Reads an expando property from a DOM object. `undefined` when absent or
/// when the object rejects property access (some removed nodes do).
pub(crate) fn get_property(target: &JsValue, key: &str) -> JsValue {
    js_sys::Reflect::get(target, &JsValue::from_str(key)).unwrap_or(JsValue::UNDEFINED)
}

/// Helper function to extract [`Event.target`](https://developer.mozilla.org/en-US/docs/Web/API/Event/target)
/// from any event.
pub fn event_target<T>(event: &web_sys::Event) -> Option<T>
where
    T: JsCast,
{
    event.target().and_then(|t| t.dyn_into::<T>().ok())
}

/// Handle that is generated by [set_timeout_with_handle] and can be used to
/// clear the timeout.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TimeoutHandle(i32);

impl TimeoutHandle {
    /// Cancels the timeout to which this refers.
    /// See [`clearTimeout()`](https://developer.mozilla.org/en-US/docs/Web/API/clearTimeout)
    pub fn clear(&self) {
        window().clear_timeout_with_handle(self.0);
    }
}

/// Executes the given function after the given duration of time has passed,
/// returning a cancelable handle.
/// [`setTimeout()`](https://developer.mozilla.org/en-US/docs/Web/API/setTimeout).
#[cfg_attr(
    all(debug_assertions, feature = "tracing"),
    tracing::instrument(level = "trace", skip_all, fields(duration = ?duration))
)]
pub fn set_timeout_with_handle(
    cb: impl FnOnce() + 'static,
    duration: Duration,
) -> Result<TimeoutHandle, JsValue> {
    #[inline(never)]
    fn st(cb: JsValue, duration: Duration) -> Result<TimeoutHandle, JsValue> {
        window()
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                cb.as_ref().unchecked_ref(),
                duration.as_millis().try_into().unwrap_throw(),
            )
            .map(TimeoutHandle)
    }

    st(Closure::once_into_js(cb), duration)
}

/// The current time in milliseconds since the epoch.
///
/// Taken from the clock rather than from `Event.timeStamp`: browsers disagree
/// about the epoch of event timestamps, and synthetic events may carry none.
pub(crate) fn now() -> f64 {
    js_sys::Date::now()
}

/// True when the user agent reports an iOS device.
pub(crate) fn is_ios() -> bool {
    user_agent_contains(&["iPhone", "iPad", "iPod"])
}

/// True for Gecko-engine browsers. Blink and WebKit advertise "like Gecko",
/// so match on the slash-delimited engine token instead.
pub(crate) fn is_gecko() -> bool {
    user_agent_contains(&["Gecko/"])
}

fn user_agent_contains(needles: &[&str]) -> bool {
    window()
        .navigator()
        .user_agent()
        .map(|ua| needles.iter().any(|n| ua.contains(n)))
        .unwrap_or(false)
}
