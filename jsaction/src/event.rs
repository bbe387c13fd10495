//! Classification of raw DOM events into the semantic event types actions
//! bind: the modifier-click split, keyboard activation of click bindings,
//! mouseenter/mouseleave emulation, and the custom-event envelope.

use wasm_bindgen::JsCast;
#[cfg(feature = "custom-event")]
use wasm_bindgen::JsValue;

use crate::event_type;
use crate::helpers::get_property;

/// Middle button in `MouseEvent.button` numbering.
const BUTTON_MIDDLE: i16 = 1;

const ENTER_KEY_CODE: u32 = 13;
const SPACE_KEY_CODE: u32 = 32;

/// Tags whose Enter/Space handling belongs to the browser.
const FORM_CONTROLS: [&str; 5] = ["INPUT", "TEXTAREA", "SELECT", "OPTION", "BUTTON"];

/// Tags the browser natively activates from the keyboard.
const NATIVE_CONTROLS: [&str; 7] = [
    "INPUT", "TEXTAREA", "SELECT", "OPTION", "BUTTON", "A", "AREA",
];

/// The semantic type of a DOM `click`: plain clicks match `click` bindings,
/// modified ones match only `clickmod` so the browser's native behavior on
/// e.g. ctrl-clicked links survives.
pub(crate) fn click_semantic(event: &web_sys::Event) -> &'static str {
    let modified = event
        .dyn_ref::<web_sys::MouseEvent>()
        .map(|mouse| {
            is_modified_click(
                mouse.ctrl_key(),
                mouse.alt_key(),
                mouse.shift_key(),
                mouse.meta_key(),
                mouse.button(),
            )
        })
        .unwrap_or(false);
    if modified {
        event_type::CLICKMOD
    } else {
        event_type::CLICK
    }
}

fn is_modified_click(ctrl: bool, alt: bool, shift: bool, meta: bool, button: i16) -> bool {
    ctrl || alt || shift || meta || button == BUTTON_MIDDLE
}

/// Whether a keydown counts as keyboard activation of the target's `click`
/// binding: Enter or Space on a focusable element that is not a form control.
#[cfg(feature = "a11y-click")]
pub(crate) fn is_action_key_event(event: &web_sys::KeyboardEvent) -> bool {
    let Some(target) = crate::helpers::event_target::<web_sys::Element>(event) else {
        return false;
    };
    let focusable = target
        .dyn_ref::<web_sys::HtmlElement>()
        .map(|html| html.tab_index() >= 0)
        .unwrap_or(false);
    focusable && key_activates_click(event.key_code(), &target.tag_name())
}

#[cfg(feature = "a11y-click")]
fn key_activates_click(key_code: u32, tag_name: &str) -> bool {
    matches!(key_code, ENTER_KEY_CODE | SPACE_KEY_CODE)
        && !FORM_CONTROLS.contains(&tag_name.to_ascii_uppercase().as_str())
}

/// Whether a matched keyboard activation must call `preventDefault`: Space
/// scrolls the page, and native controls would otherwise activate twice.
#[cfg(feature = "a11y-click")]
pub(crate) fn key_needs_prevent_default(event: &web_sys::KeyboardEvent) -> bool {
    if event.key_code() == SPACE_KEY_CODE {
        return true;
    }
    crate::helpers::event_target::<web_sys::Element>(event)
        .map(|target| is_native_control(&target.tag_name()))
        .unwrap_or(false)
}

#[cfg(feature = "a11y-click")]
fn is_native_control(tag_name: &str) -> bool {
    NATIVE_CONTROLS.contains(&tag_name.to_ascii_uppercase().as_str())
}

/// Whether a `mouseover`/`mouseout` on `element` actually crosses the
/// element's subtree boundary, i.e. is a real enter/leave rather than
/// movement between descendants.
#[cfg(feature = "mouse-special")]
pub(crate) fn crosses_boundary(event: &web_sys::Event, element: &web_sys::Element) -> bool {
    let related = event
        .dyn_ref::<web_sys::MouseEvent>()
        .and_then(|mouse| mouse.related_target())
        .and_then(|t| t.dyn_into::<web_sys::Node>().ok());
    match related {
        None => true,
        Some(node) => !element.contains(Some(&node)),
    }
}

/// The inner semantic type of a custom-event envelope, if well formed.
#[cfg(feature = "custom-event")]
pub(crate) fn custom_type(event: &web_sys::Event) -> Option<String> {
    let detail = event.dyn_ref::<web_sys::CustomEvent>()?.detail();
    let inner = js_sys::Reflect::get(&detail, &JsValue::from_str("_type")).ok()?;
    inner.as_string()
}

/// Fires the custom-event envelope on `target`: a bubbling DOM
/// [`CustomEvent`](web_sys::CustomEvent) whose detail carries the semantic
/// `event_type` as `_type` and the application payload as `data`.
///
/// The contract's containers observe it once the `custom` raw type has been
/// registered with the facade.
#[cfg(feature = "custom-event")]
pub fn fire_custom_event(target: &web_sys::EventTarget, event_type: &str, payload: &JsValue) {
    let detail = js_sys::Object::new();
    _ = js_sys::Reflect::set(
        &detail,
        &JsValue::from_str("_type"),
        &JsValue::from_str(event_type),
    );
    _ = js_sys::Reflect::set(&detail, &JsValue::from_str("data"), payload);

    let init = web_sys::CustomEventInit::new();
    init.set_bubbles(true);
    init.set_detail(&detail);
    if let Ok(event) =
        web_sys::CustomEvent::new_with_event_init_dict(event_type::CUSTOM, &init)
    {
        _ = target.dispatch_event(&event);
    }
}

/// True for the fast-click synthetic click, recognized by its brand expando.
#[cfg(feature = "fast-click")]
pub(crate) fn is_synthetic_click(event: &web_sys::Event) -> bool {
    get_property(event, crate::fastclick::SYNTHETIC_BRAND).is_truthy()
}

/// Stops propagation if the event still supports it. Replayed records hold
/// plain-object copies without DOM methods; those have nothing to stop.
pub(crate) fn stop_propagation(event: &web_sys::Event) {
    if get_property(event, "stopPropagation")
        .dyn_ref::<js_sys::Function>()
        .is_some()
    {
        event.stop_propagation();
    }
}

/// Prevents the default action if the event still supports it.
pub(crate) fn prevent_default(event: &web_sys::Event) {
    if get_property(event, "preventDefault")
        .dyn_ref::<js_sys::Function>()
        .is_some()
    {
        event.prevent_default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_clicks_are_unmodified() {
        assert!(!is_modified_click(false, false, false, false, 0));
    }

    #[test]
    fn any_modifier_or_middle_button_modifies() {
        assert!(is_modified_click(true, false, false, false, 0));
        assert!(is_modified_click(false, true, false, false, 0));
        assert!(is_modified_click(false, false, true, false, 0));
        assert!(is_modified_click(false, false, false, true, 0));
        assert!(is_modified_click(false, false, false, false, BUTTON_MIDDLE));
    }

    #[cfg(feature = "a11y-click")]
    #[test]
    fn enter_and_space_activate_non_form_elements() {
        assert!(key_activates_click(ENTER_KEY_CODE, "DIV"));
        assert!(key_activates_click(SPACE_KEY_CODE, "SPAN"));
        assert!(key_activates_click(ENTER_KEY_CODE, "A"));
        assert!(!key_activates_click(65, "DIV"));
    }

    #[cfg(feature = "a11y-click")]
    #[test]
    fn form_controls_keep_native_key_handling() {
        assert!(!key_activates_click(ENTER_KEY_CODE, "INPUT"));
        assert!(!key_activates_click(SPACE_KEY_CODE, "BUTTON"));
        assert!(!key_activates_click(ENTER_KEY_CODE, "textarea"));
    }

    #[cfg(feature = "a11y-click")]
    #[test]
    fn anchors_count_as_native_controls() {
        assert!(is_native_control("A"));
        assert!(is_native_control("a"));
        assert!(is_native_control("BUTTON"));
        assert!(!is_native_control("DIV"));
    }
}
