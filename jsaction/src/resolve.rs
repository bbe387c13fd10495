//! The ancestor walk from an event's target toward its container, and the
//! per-element matching that turns a raw event plus `jsaction` bindings into
//! an event record.

use wasm_bindgen::JsCast;

use crate::action::{ActionCache, ActionMap};
use crate::event;
use crate::event_type;
use crate::helpers::get_property;
use crate::record::EventRecord;

#[cfg(feature = "fast-click")]
use crate::fastclick::{FastClick, TapOutcome};

/// Expando property that logically re-parents a node for the walk, for
/// shadowed ownership structures whose DOM parent is not their logical one.
const OWNER_PROPERTY: &str = "__owner";

/// Side effects the caller must carry out after resolution; the fast-click
/// machine decides them, the delegated handler owns the timer and the DOM.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TapDirective {
    None,
    /// Cancel any running tap timer.
    CancelTimer,
    /// A sequence was armed: restart the tap timer.
    Armed,
    /// A tap completed: cancel the timer, stop and prevent the raw
    /// `touchend`, and dispatch a synthetic click on `target`.
    Synthesize {
        target: web_sys::Element,
        client_x: i32,
        client_y: i32,
        screen_x: i32,
        screen_y: i32,
    },
}

/// Touch geometry of the event, when it carries any.
#[cfg(feature = "fast-click")]
struct TouchInfo {
    client_x: i32,
    client_y: i32,
    screen_x: i32,
    screen_y: i32,
    multi: bool,
}

/// Resolves an event against the `jsaction` bindings of the target's
/// ancestors. `lookup_type` is the raw DOM type, except for custom envelope
/// events where it is the inner semantic type.
pub(crate) fn resolve(
    actions: &mut ActionCache,
    #[cfg(feature = "fast-click")] fastclick: &mut FastClick<web_sys::Element>,
    event: &web_sys::Event,
    lookup_type: &str,
    container: &web_sys::Element,
) -> (EventRecord, TapDirective) {
    let target = target_element(event);
    let mut directive = TapDirective::None;

    #[cfg(feature = "fast-click")]
    let touch = touch_info(event);

    #[cfg(feature = "fast-click")]
    {
        if lookup_type == event_type::TOUCHSTART && fastclick.reset_if_pending() {
            directive = TapDirective::CancelTimer;
        }
        if lookup_type == event_type::TOUCHMOVE {
            if let Some(touch) = &touch {
                if fastclick.on_touch_move(touch.client_x, touch.client_y) {
                    directive = TapDirective::CancelTimer;
                }
            }
        }
    }

    if let Some(target) = target.clone() {
        for element in AncestorWalk::new(event, target.clone(), container.clone()) {
            let map = actions.action_map(&element, container);

            #[cfg(feature = "fast-click")]
            if let Some(touch) = &touch {
                match lookup_type {
                    t if t == event_type::TOUCHSTART => {
                        let binds_click = map.action_for(event_type::CLICK).is_some()
                            || map.action_for(event_type::CLICKONLY).is_some();
                        let binds_touch = map.action_for(event_type::TOUCHSTART).is_some()
                            || map.action_for(event_type::TOUCHEND).is_some();
                        if FastClick::<web_sys::Element>::eligible(
                            binds_click,
                            binds_touch,
                            &target.tag_name(),
                            touch.multi,
                        ) {
                            fastclick.arm(element, touch.client_x, touch.client_y);
                            let record = unmatched(event, lookup_type, target.clone());
                            return (record, TapDirective::Armed);
                        }
                    }
                    t if t == event_type::TOUCHEND => {
                        match fastclick.try_tap(
                            &element,
                            touch.client_x,
                            touch.client_y,
                            event.default_prevented(),
                            crate::helpers::now(),
                        ) {
                            TapOutcome::Synthesize => {
                                let record = unmatched(event, lookup_type, target.clone());
                                return (
                                    record,
                                    TapDirective::Synthesize {
                                        target: target.clone(),
                                        client_x: touch.client_x,
                                        client_y: touch.client_y,
                                        screen_x: touch.screen_x,
                                        screen_y: touch.screen_y,
                                    },
                                );
                            }
                            TapOutcome::Reset => directive = TapDirective::CancelTimer,
                            TapOutcome::None => {}
                        }
                    }
                    _ => {}
                }
            }

            if let Some((semantic, action)) = match_binding(&map, lookup_type, event, &element) {
                #[cfg(feature = "mouse-special")]
                let event = if semantic == event_type::MOUSEENTER
                    || semantic == event_type::MOUSELEAVE
                {
                    crate::record::retargeted_copy(event, &semantic, &element)
                } else {
                    event.clone()
                };
                #[cfg(not(feature = "mouse-special"))]
                let event = event.clone();

                let record =
                    EventRecord::new(semantic, event, Some(target), action, Some(element));
                return (record, directive);
            }
        }
    }

    #[cfg(feature = "fast-click")]
    if lookup_type == event_type::TOUCHEND && fastclick.reset_if_pending() {
        directive = TapDirective::CancelTimer;
    }

    let record = unmatched(event, lookup_type, target.unwrap_or_else(|| container.clone()));
    (record, directive)
}

/// The record for an event no ancestor handles: empty action, no action
/// element, event type as classified.
fn unmatched(event: &web_sys::Event, lookup_type: &str, target: web_sys::Element) -> EventRecord {
    let semantic = if lookup_type == event_type::CLICK {
        event::click_semantic(event)
    } else {
        lookup_type
    };
    EventRecord::new(semantic, event.clone(), Some(target), "", None)
}

/// Matches one visited element's bindings against the event.
///
/// Returns the semantic event type that matched and the bound action name.
fn match_binding(
    map: &ActionMap,
    lookup_type: &str,
    event: &web_sys::Event,
    element: &web_sys::Element,
) -> Option<(String, String)> {
    if map.is_empty() {
        return None;
    }

    if lookup_type == event_type::CLICK {
        let semantic = event::click_semantic(event);
        if semantic == event_type::CLICK {
            // `click` takes real clicks and keyboard clicks; `clickonly`
            // takes real clicks on elements that bind nothing for `click`.
            if let Some(action) = map.action_for(event_type::CLICK) {
                return Some((event_type::CLICK.to_owned(), action.to_owned()));
            }
            if let Some(action) = map.action_for(event_type::CLICKONLY) {
                return Some((event_type::CLICKONLY.to_owned(), action.to_owned()));
            }
            return None;
        }
        let action = map.action_for(semantic)?;
        return Some((semantic.to_owned(), action.to_owned()));
    }

    #[cfg(feature = "a11y-click")]
    if lookup_type == event_type::KEYDOWN {
        if let Some(action) = map.action_for(event_type::KEYDOWN) {
            return Some((event_type::KEYDOWN.to_owned(), action.to_owned()));
        }
        if let Some(keyboard) = event.dyn_ref::<web_sys::KeyboardEvent>() {
            if event::is_action_key_event(keyboard) {
                if let Some(action) = map.action_for(event_type::CLICK) {
                    return Some((event_type::CLICKKEY.to_owned(), action.to_owned()));
                }
            }
        }
        return None;
    }

    #[cfg(feature = "mouse-special")]
    {
        let emulated = match lookup_type {
            t if t == event_type::MOUSEOVER => Some(event_type::MOUSEENTER),
            t if t == event_type::MOUSEOUT => Some(event_type::MOUSELEAVE),
            _ => None,
        };
        if let Some(emulated) = emulated {
            if let Some(action) = map.action_for(lookup_type) {
                return Some((lookup_type.to_owned(), action.to_owned()));
            }
            if let Some(action) = map.action_for(emulated) {
                if event::crosses_boundary(event, element) {
                    return Some((emulated.to_owned(), action.to_owned()));
                }
            }
            return None;
        }
    }

    let action = map.action_for(lookup_type)?;
    Some((lookup_type.to_owned(), action.to_owned()))
}

/// The element the walk starts from. Events can target non-element nodes;
/// those start at their parent element.
fn target_element(event: &web_sys::Event) -> Option<web_sys::Element> {
    let target = event.target()?;
    match target.dyn_into::<web_sys::Element>() {
        Ok(element) => Some(element),
        Err(other) => other
            .dyn_into::<web_sys::Node>()
            .ok()
            .and_then(|node| node.parent_element()),
    }
}

#[cfg(feature = "fast-click")]
fn touch_info(event: &web_sys::Event) -> Option<TouchInfo> {
    let touch_event = event.dyn_ref::<web_sys::TouchEvent>()?;
    let point = touch_event
        .changed_touches()
        .get(0)
        .or_else(|| touch_event.touches().get(0))?;
    Some(TouchInfo {
        client_x: point.client_x(),
        client_y: point.client_y(),
        screen_x: point.screen_x(),
        screen_y: point.screen_y(),
        multi: touch_event.target_touches().length() > 1,
    })
}

/// Lazy sequence of elements from the target up to and including the
/// container.
///
/// Default mode follows `parentNode`, letting an `__owner` expando re-parent
/// nodes logically. With the `event-path` feature the browser-composed
/// propagation path is used instead when available, which retargets through
/// shadow boundaries.
struct AncestorWalk {
    container: web_sys::Element,
    done: bool,
    mode: WalkMode,
}

enum WalkMode {
    Dom { next: Option<web_sys::Element> },
    #[cfg(feature = "event-path")]
    Path { path: js_sys::Array, index: u32 },
}

impl AncestorWalk {
    fn new(
        #[allow(unused_variables)] event: &web_sys::Event,
        target: web_sys::Element,
        container: web_sys::Element,
    ) -> Self {
        #[cfg(feature = "event-path")]
        {
            let path = event.composed_path();
            if path.length() > 0 {
                return Self {
                    container,
                    done: false,
                    mode: WalkMode::Path { path, index: 0 },
                };
            }
        }
        Self {
            container,
            done: false,
            mode: WalkMode::Dom { next: Some(target) },
        }
    }
}

impl Iterator for AncestorWalk {
    type Item = web_sys::Element;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match &mut self.mode {
            WalkMode::Dom { next } => {
                let Some(current) = next.take() else {
                    self.done = true;
                    return None;
                };
                if current == self.container {
                    self.done = true;
                    return Some(current);
                }
                let owner = get_property(&current, OWNER_PROPERTY);
                *next = match owner.dyn_into::<web_sys::Element>() {
                    Ok(owner) => Some(owner),
                    Err(_) => current.parent_element(),
                };
                Some(current)
            }
            #[cfg(feature = "event-path")]
            WalkMode::Path { path, index } => {
                while *index < path.length() {
                    let entry = path.get(*index);
                    *index += 1;
                    if let Ok(element) = entry.dyn_into::<web_sys::Element>() {
                        if element == self.container {
                            self.done = true;
                        }
                        return Some(element);
                    }
                }
                self.done = true;
                None
            }
        }
    }
}
