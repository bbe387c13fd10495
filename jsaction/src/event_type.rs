//! Names of the event types the contract understands.
//!
//! A *semantic* event type is the name an action binds in a `jsaction`
//! attribute (`clickmod`, `mouseenter`, ...). It is distinct from the raw DOM
//! type that is physically listened for: several raw events can map to one
//! semantic type and vice versa.

/// An unmodified primary-button click, or its keyboard/touch equivalent.
pub const CLICK: &str = "click";
/// A click carrying a modifier key or a non-primary button.
pub const CLICKMOD: &str = "clickmod";
/// A real DOM click only; never matched by keyboard activation.
pub const CLICKONLY: &str = "clickonly";
/// Keyboard activation of a `click` binding. Internal; produced, never bound.
pub const CLICKKEY: &str = "clickkey";

/// Focus arriving at an element. Does not bubble; observed via capture.
pub const FOCUS: &str = "focus";
/// Bubbling variant of focus arrival.
pub const FOCUSIN: &str = "focusin";
/// Focus leaving an element. Does not bubble; observed via capture.
pub const BLUR: &str = "blur";
/// Bubbling variant of focus departure.
pub const FOCUSOUT: &str = "focusout";

/// Pointer entered the bound element's subtree. Emulated from `mouseover`.
pub const MOUSEENTER: &str = "mouseenter";
/// Pointer left the bound element's subtree. Emulated from `mouseout`.
pub const MOUSELEAVE: &str = "mouseleave";
/// Raw pointer-over, fires on descendant crossings too.
pub const MOUSEOVER: &str = "mouseover";
/// Raw pointer-out, fires on descendant crossings too.
pub const MOUSEOUT: &str = "mouseout";
/// Primary raw mouse button press.
pub const MOUSEDOWN: &str = "mousedown";
/// Primary raw mouse button release.
pub const MOUSEUP: &str = "mouseup";
/// Raw pointer movement.
pub const MOUSEMOVE: &str = "mousemove";

/// A finger went down.
pub const TOUCHSTART: &str = "touchstart";
/// A finger moved.
pub const TOUCHMOVE: &str = "touchmove";
/// A finger lifted.
pub const TOUCHEND: &str = "touchend";

/// Raw key press (down).
pub const KEYDOWN: &str = "keydown";
/// Raw character-producing key press.
pub const KEYPRESS: &str = "keypress";

/// The raw DOM type of the application-fired custom-event envelope. The
/// semantic type travels inside the payload as `detail._type`.
pub const CUSTOM: &str = "_custom";

/// Raw DOM types that do not bubble. Delegation still observes them by
/// installing the container listener in the capture phase.
const NON_BUBBLING: [&str; 5] = ["focus", "blur", "error", "load", "toggle"];

/// Whether a raw DOM event type reaches an ancestor listener in the bubble
/// phase. Determines the phase the container listener is installed in.
pub(crate) fn bubbles(raw_type: &str) -> bool {
    !NON_BUBBLING.contains(&raw_type)
}

/// Maps a semantic event type to the raw DOM type that must be listened for.
pub(crate) fn native_for(semantic: &str) -> &str {
    match semantic {
        CLICKMOD | CLICKONLY => CLICK,
        MOUSEENTER => MOUSEOVER,
        MOUSELEAVE => MOUSEOUT,
        _ => semantic,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn focus_needs_capture() {
        assert!(!bubbles(FOCUS));
        assert!(!bubbles(BLUR));
        assert!(bubbles(CLICK));
        assert!(bubbles(FOCUSIN));
        assert!(bubbles(TOUCHEND));
    }

    #[test]
    fn semantic_types_share_native_listeners() {
        assert_eq!(native_for(CLICKMOD), CLICK);
        assert_eq!(native_for(CLICKONLY), CLICK);
        assert_eq!(native_for(MOUSEENTER), MOUSEOVER);
        assert_eq!(native_for(MOUSELEAVE), MOUSEOUT);
        assert_eq!(native_for(KEYDOWN), KEYDOWN);
    }
}
