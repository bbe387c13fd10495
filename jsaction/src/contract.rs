//! The contract facade: event-type registration, container membership, the
//! per-type delegated handler, the pre-dispatcher queue, and the fast-click
//! driver.

use std::borrow::Cow;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::{intern, prelude::Closure, JsCast, JsValue};

use crate::action::ActionCache;
use crate::container::{ContainerHandle, ContainerRegistry, EventInstaller};
use crate::event_type;
use crate::record::EventRecord;
use crate::resolve;

#[cfg(feature = "fast-click")]
use crate::fastclick::{FastClick, MouseKind, SYNTHETIC_BRAND, TAP_TIMEOUT_MS};
#[cfg(feature = "fast-click")]
use crate::helpers::TimeoutHandle;
#[cfg(feature = "fast-click")]
use std::time::Duration;

thread_local! {
    static NEXT_CONTRACT_ID: Cell<u32> = const { Cell::new(0) };
}

/// What the registered dispatcher receives.
///
/// On attach, the queue accumulated so far arrives once as `Replayed`. After
/// that every intercepted event produces a `Global` record (action cleared,
/// observed match or not), followed by a `Matched` record when an ancestor's
/// binding matched.
pub enum Dispatch {
    /// The queue accumulated before the dispatcher attached, in firing order.
    Replayed(Vec<EventRecord>),
    /// Every intercepted event, with the action cleared; for dispatch-wide
    /// observers.
    Global(EventRecord),
    /// An event whose resolution matched an ancestor's binding.
    Matched(EventRecord),
}

type DispatchFn = Box<dyn FnMut(Dispatch)>;

pub(crate) struct ContractState {
    actions: RefCell<ActionCache>,
    containers: RefCell<ContainerRegistry>,
    installers: RefCell<Vec<EventInstaller>>,
    queue: RefCell<Option<Vec<EventRecord>>>,
    dispatcher: RefCell<Option<DispatchFn>>,
    dispatching: Cell<bool>,
    pending: RefCell<Vec<Dispatch>>,
    #[cfg(feature = "fast-click")]
    fastclick: RefCell<FastClick<web_sys::Element>>,
    #[cfg(feature = "fast-click")]
    tap_timer: Cell<Option<TimeoutHandle>>,
    #[cfg(feature = "fast-click")]
    sweepers: RefCell<Vec<(Cow<'static, str>, js_sys::Function)>>,
    #[cfg(feature = "fast-click")]
    prevent_mouse_capability: RefCell<Option<js_sys::Function>>,
}

/// The delegated event-delegation contract.
///
/// Register the event types of interest with [`add_event`](Self::add_event),
/// add container roots with [`add_container`](Self::add_container), and
/// attach the dispatcher with [`dispatch_to`](Self::dispatch_to) once
/// application code is ready. Events intercepted before that are queued and
/// replayed on attach, so a contract created inline in page HTML loses
/// nothing while the application loads.
pub struct EventContract {
    state: Rc<ContractState>,
}

impl Default for EventContract {
    fn default() -> Self {
        Self::new()
    }
}

impl EventContract {
    /// A fresh contract with no event types, containers, or dispatcher, and
    /// an empty queue.
    pub fn new() -> Self {
        let id = NEXT_CONTRACT_ID.with(|next| {
            let id = next.get();
            next.set(id + 1);
            id
        });
        Self {
            state: Rc::new(ContractState {
                actions: RefCell::new(ActionCache::new(id)),
                containers: RefCell::new(ContainerRegistry::default()),
                installers: RefCell::new(Vec::new()),
                queue: RefCell::new(Some(Vec::new())),
                dispatcher: RefCell::new(None),
                dispatching: Cell::new(false),
                pending: RefCell::new(Vec::new()),
                #[cfg(feature = "fast-click")]
                fastclick: RefCell::new(FastClick::new()),
                #[cfg(feature = "fast-click")]
                tap_timer: Cell::new(None),
                #[cfg(feature = "fast-click")]
                sweepers: RefCell::new(Vec::new()),
                #[cfg(feature = "fast-click")]
                prevent_mouse_capability: RefCell::new(None),
            }),
        }
    }

    /// Registers interest in a semantic event type. Idempotent. The listener
    /// is installed on every current and future container.
    ///
    /// Registering `click` also wires the event types click semantics are
    /// built from: `keydown` for keyboard activation, and the touch types
    /// plus document-level suppression sweeps for fast clicks.
    pub fn add_event(&self, name: &str) {
        let native = event_type::native_for(name).to_owned();
        self.add_event_with_native(name, &native);
    }

    /// Registers a semantic event type listening for a different raw DOM
    /// type, e.g. an application envelope type carried by
    /// [`CUSTOM`](crate::event_type::CUSTOM) events.
    pub fn add_event_with_native(&self, name: &str, native: &str) {
        {
            let installers = self.state.installers.borrow();
            if installers.iter().any(|i| i.semantic == name) {
                return;
            }
        }

        let installer = EventInstaller {
            semantic: Cow::Owned(name.to_owned()),
            native: Cow::Owned(intern(native).to_owned()),
            capture: !event_type::bubbles(native),
            listener: make_handler(&self.state),
        };
        self.state
            .containers
            .borrow()
            .install_everywhere(&installer);
        self.state.installers.borrow_mut().push(installer);

        if name == event_type::CLICK {
            #[cfg(feature = "a11y-click")]
            self.add_event(event_type::KEYDOWN);
            #[cfg(feature = "fast-click")]
            {
                self.add_event(event_type::TOUCHSTART);
                self.add_event(event_type::TOUCHEND);
                self.add_event(event_type::TOUCHMOVE);
                self.install_sweepers();
            }
        }
    }

    /// Adds a container root. Events bubbling to it (or captured on it, for
    /// non-bubbling types) are intercepted for every registered event type.
    pub fn add_container(&self, element: &web_sys::Element) -> ContainerHandle {
        let installers = self.state.installers.borrow();
        self.state
            .containers
            .borrow_mut()
            .add(element.clone(), &installers)
    }

    /// Removes a container and detaches exactly the listeners installed on
    /// it. Containers it was shadowing become active again.
    pub fn remove_container(&self, handle: ContainerHandle) {
        let installers = self.state.installers.borrow();
        self.state
            .containers
            .borrow_mut()
            .remove(handle, &installers);
    }

    /// Attaches the dispatcher. The queue accumulated so far is delivered
    /// once as [`Dispatch::Replayed`] and then discarded; all further events
    /// dispatch live.
    pub fn dispatch_to(&self, dispatcher: impl FnMut(Dispatch) + 'static) {
        *self.state.dispatcher.borrow_mut() = Some(Box::new(dispatcher));
        let queued = self.state.queue.borrow_mut().take();
        if let Some(queued) = queued {
            if !queued.is_empty() {
                dispatch(&self.state, Dispatch::Replayed(queued));
            }
        }
    }

    /// The installed listener for a registered semantic event type, for
    /// replay code that re-enters the contract.
    pub fn handler(&self, name: &str) -> Option<js_sys::Function> {
        self.state
            .installers
            .borrow()
            .iter()
            .find(|i| i.semantic == name)
            .map(|i| i.listener.clone())
    }

    /// Re-enters the installed handler with a record's retained event, as if
    /// the browser had just delivered it.
    pub fn replay(&self, record: &EventRecord) {
        let name = match record.event_type() {
            event_type::CLICKMOD | event_type::CLICKONLY | event_type::CLICKKEY => {
                event_type::CLICK
            }
            other => other,
        };
        if let Some(handler) = self.handler(name) {
            _ = handler.call1(&JsValue::NULL, record.event());
        }
    }

    /// The event type bound by `jsaction` clauses that do not name one.
    pub fn set_default_event_type(&self, event_type: &str) {
        self.state
            .actions
            .borrow_mut()
            .set_default_event_type(event_type);
    }

    /// Detaches every listener this contract installed (containers and
    /// document-level sweeps), drops the queue and the dispatcher. The
    /// contract intercepts nothing afterwards.
    pub fn dispose(&self) {
        self.state.containers.borrow_mut().uninstall_all();
        *self.state.queue.borrow_mut() = None;
        *self.state.dispatcher.borrow_mut() = None;
        #[cfg(feature = "fast-click")]
        {
            self.cancel_tap_timer();
            let document = crate::helpers::document();
            for (name, sweeper) in self.state.sweepers.borrow_mut().drain(..) {
                _ = document
                    .remove_event_listener_with_callback_and_bool(&name, &sweeper, true);
            }
        }
    }

    #[cfg(feature = "fast-click")]
    fn cancel_tap_timer(&self) {
        if let Some(timer) = self.state.tap_timer.take() {
            timer.clear();
        }
    }

    /// Capture-phase document listeners that recognize the emulated mouse
    /// cascade following a synthesized click and stop it before any
    /// container sees it.
    #[cfg(feature = "fast-click")]
    fn install_sweepers(&self) {
        let mut sweepers = self.state.sweepers.borrow_mut();
        if !sweepers.is_empty() {
            return;
        }
        let document = crate::helpers::document();
        for (name, kind) in [
            (event_type::CLICK, MouseKind::Click),
            (event_type::MOUSEUP, MouseKind::Up),
            (event_type::MOUSEDOWN, MouseKind::Down),
        ] {
            let state = Rc::clone(&self.state);
            let sweeper = Closure::wrap(Box::new(move |event: web_sys::Event| {
                sweep_mouse_event(&state, kind, &event);
            }) as Box<dyn FnMut(web_sys::Event)>)
            .into_js_value()
            .unchecked_into::<js_sys::Function>();
            _ = document.add_event_listener_with_callback_and_bool(name, &sweeper, true);
            sweepers.push((Cow::Borrowed(name), sweeper));
        }
    }
}

/// Invokes the dispatcher without keeping its slot borrowed, so a dispatcher
/// that re-enters the contract synchronously (replay, nested DOM dispatch)
/// cannot poison a `RefCell`. Payloads produced during the call are deferred
/// and delivered, in order, when the outer call returns.
fn dispatch(state: &Rc<ContractState>, payload: Dispatch) {
    if state.dispatching.get() {
        state.pending.borrow_mut().push(payload);
        return;
    }
    let Some(mut dispatcher) = state.dispatcher.borrow_mut().take() else {
        return;
    };
    state.dispatching.set(true);
    dispatcher(payload);
    loop {
        let next = {
            let mut pending = state.pending.borrow_mut();
            if pending.is_empty() {
                None
            } else {
                Some(pending.remove(0))
            }
        };
        match next {
            Some(deferred) => dispatcher(deferred),
            None => break,
        }
    }
    state.dispatching.set(false);
    // a dispatcher swapped in mid-call wins over the one we took out
    let mut slot = state.dispatcher.borrow_mut();
    if slot.is_none() {
        *slot = Some(dispatcher);
    }
}

/// Builds the per-event-type listener closure shared by every container.
fn make_handler(state: &Rc<ContractState>) -> js_sys::Function {
    let state = Rc::clone(state);
    Closure::wrap(Box::new(move |event: web_sys::Event| {
        handle_event(&state, &event);
    }) as Box<dyn FnMut(web_sys::Event)>)
    .into_js_value()
    .unchecked_into()
}

/// The delegated handler: classify, walk, produce the record, then dispatch
/// or queue it. Must never throw into the event loop.
#[cfg_attr(
    all(debug_assertions, feature = "tracing"),
    tracing::instrument(level = "trace", skip_all)
)]
fn handle_event(state: &Rc<ContractState>, event: &web_sys::Event) {
    let Some(container) = event
        .current_target()
        .and_then(|t| t.dyn_into::<web_sys::Element>().ok())
    else {
        return;
    };
    let raw = event.type_();

    #[cfg(feature = "custom-event")]
    let lookup = if raw == event_type::CUSTOM {
        match crate::event::custom_type(event) {
            Some(inner) => inner,
            None => {
                crate::debug_warn!("dropping custom event without an inner type");
                return;
            }
        }
    } else {
        raw.clone()
    };
    #[cfg(not(feature = "custom-event"))]
    let lookup = raw.clone();

    #[cfg(feature = "fast-click")]
    let (record, directive) = resolve::resolve(
        &mut state.actions.borrow_mut(),
        &mut state.fastclick.borrow_mut(),
        event,
        &lookup,
        &container,
    );
    #[cfg(not(feature = "fast-click"))]
    let (record, directive) = resolve::resolve(
        &mut state.actions.borrow_mut(),
        event,
        &lookup,
        &container,
    );

    #[cfg(feature = "fast-click")]
    apply_tap_directive(state, event, directive);
    #[cfg(not(feature = "fast-click"))]
    let _ = directive;

    #[cfg(feature = "a11y-click")]
    if record.event_type() == event_type::CLICKKEY {
        if let Some(keyboard) = event.dyn_ref::<web_sys::KeyboardEvent>() {
            if crate::event::key_needs_prevent_default(keyboard) {
                crate::event::prevent_default(event);
            }
        }
    }

    // attached before dispatch so handlers can invoke it synchronously
    #[cfg(feature = "fast-click")]
    if raw == event_type::TOUCHEND {
        attach_prevent_mouse_capability(state, event);
    }

    let matched = record.is_matched();
    let has_dispatcher = state.dispatcher.borrow().is_some() || state.dispatching.get();
    if has_dispatcher {
        dispatch(state, Dispatch::Global(record.global_copy()));
        if matched {
            dispatch(state, Dispatch::Matched(record.clone()));
        }
    } else if matched {
        if let Some(queue) = state.queue.borrow_mut().as_mut() {
            queue.push(record.copied_for_queue());
        }
    }

    #[cfg(feature = "stop-propagation")]
    if !breaks_gecko_caret(&raw, &record) {
        crate::event::stop_propagation(event);
    }

    // Let the action handle matched anchor clicks instead of navigation.
    if matched
        && matches!(
            record.event_type(),
            event_type::CLICK | event_type::CLICKMOD
        )
        && record
            .action_element()
            .is_some_and(|el| el.dyn_ref::<web_sys::HtmlAnchorElement>().is_some())
    {
        crate::event::prevent_default(event);
    }
}

/// Gecko moves the caret as part of focus propagation; stopping focus events
/// over text inputs there breaks it.
#[cfg(feature = "stop-propagation")]
fn breaks_gecko_caret(raw: &str, record: &EventRecord) -> bool {
    if raw != event_type::FOCUS && raw != event_type::FOCUSIN {
        return false;
    }
    if !crate::helpers::is_gecko() {
        return false;
    }
    record
        .target_element()
        .map(|target| {
            let tag = target.tag_name().to_ascii_uppercase();
            tag == "INPUT" || tag == "TEXTAREA"
        })
        .unwrap_or(false)
}

#[cfg(feature = "fast-click")]
fn apply_tap_directive(
    state: &Rc<ContractState>,
    event: &web_sys::Event,
    directive: resolve::TapDirective,
) {
    use resolve::TapDirective;

    match directive {
        TapDirective::None => {}
        TapDirective::CancelTimer => cancel_timer(state),
        TapDirective::Armed => {
            cancel_timer(state);
            let timer_state = Rc::clone(state);
            let timer = crate::helpers::set_timeout_with_handle(
                move || {
                    timer_state.fastclick.borrow_mut().on_timeout();
                    timer_state.tap_timer.set(None);
                },
                Duration::from_millis(TAP_TIMEOUT_MS),
            );
            state.tap_timer.set(timer.ok());
        }
        TapDirective::Synthesize {
            target,
            client_x,
            client_y,
            screen_x,
            screen_y,
        } => {
            cancel_timer(state);
            event.stop_propagation();
            event.prevent_default();
            synthesize_click(&target, client_x, client_y, screen_x, screen_y);
        }
    }
}

#[cfg(feature = "fast-click")]
fn cancel_timer(state: &Rc<ContractState>) {
    if let Some(timer) = state.tap_timer.take() {
        timer.clear();
    }
}

/// Dispatches the immediate click a completed tap stands for. The event is
/// freshly constructed (events in flight are immutable) and branded so the
/// suppression sweep lets it pass.
#[cfg(feature = "fast-click")]
fn synthesize_click(
    target: &web_sys::Element,
    client_x: i32,
    client_y: i32,
    screen_x: i32,
    screen_y: i32,
) {
    let init = web_sys::MouseEventInit::new();
    init.set_bubbles(true);
    init.set_cancelable(true);
    init.set_client_x(client_x);
    init.set_client_y(client_y);
    init.set_screen_x(screen_x);
    init.set_screen_y(screen_y);
    init.set_view(Some(&crate::helpers::window()));
    let Ok(click) =
        web_sys::MouseEvent::new_with_mouse_event_init_dict(event_type::CLICK, &init)
    else {
        return;
    };
    crate::helpers::set_property(&click, SYNTHETIC_BRAND, &JsValue::TRUE);

    let proceeded = target.dispatch_event(&click).unwrap_or(true);
    if proceeded {
        clear_focus_and_selection();
    }
}

/// A tap on a non-input must dismiss any software keyboard and selection the
/// way a native click would. Failures are swallowed; the click already
/// happened.
#[cfg(feature = "fast-click")]
fn clear_focus_and_selection() {
    let document = crate::helpers::document();
    if let Some(active) = document.active_element() {
        let tag = active.tag_name().to_ascii_uppercase();
        if tag == "INPUT" || tag == "TEXTAREA" {
            if let Some(html) = active.dyn_ref::<web_sys::HtmlElement>() {
                _ = html.blur();
            }
        }
    }
    if let Ok(Some(selection)) = crate::helpers::window().get_selection() {
        _ = selection.remove_all_ranges();
    }
}

#[cfg(feature = "fast-click")]
fn sweep_mouse_event(state: &Rc<ContractState>, kind: MouseKind, event: &web_sys::Event) {
    let Some(target) = crate::helpers::event_target::<web_sys::Element>(event) else {
        return;
    };
    let (x, y) = event
        .dyn_ref::<web_sys::MouseEvent>()
        .map(|mouse| (mouse.client_x(), mouse.client_y()))
        .unwrap_or((0, 0));
    let synthetic = crate::event::is_synthetic_click(event);
    let suppress = state.fastclick.borrow_mut().on_mouse(
        kind,
        &target,
        x,
        y,
        crate::helpers::now(),
        synthetic,
    );
    if suppress {
        event.stop_propagation();
        event.prevent_default();
    }
}

/// Parks a capability on the `touchend` event that lets application handlers
/// opt into suppressing the emulated mouse cascade for this touch.
#[cfg(feature = "fast-click")]
fn attach_prevent_mouse_capability(state: &Rc<ContractState>, event: &web_sys::Event) {
    let capability = {
        let mut slot = state.prevent_mouse_capability.borrow_mut();
        slot.get_or_insert_with(|| {
            let state = Rc::clone(state);
            Closure::wrap(Box::new(move |event: web_sys::Event| {
                let Some(target) = crate::helpers::event_target::<web_sys::Element>(&event)
                else {
                    return;
                };
                if let Some(touch_event) = event.dyn_ref::<web_sys::TouchEvent>() {
                    if let Some(touch) = touch_event.changed_touches().get(0) {
                        state.fastclick.borrow_mut().suppress_from(
                            target,
                            touch.client_x(),
                            touch.client_y(),
                            crate::helpers::now(),
                        );
                    }
                }
            }) as Box<dyn FnMut(web_sys::Event)>)
            .into_js_value()
            .unchecked_into::<js_sys::Function>()
        })
        .clone()
    };
    crate::helpers::set_property(event, crate::record::PREVENT_MOUSE_EVENTS_KEY, &capability);
}
