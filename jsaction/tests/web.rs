#![cfg(target_arch = "wasm32")]

use std::cell::RefCell;
use std::rc::Rc;

use gloo_timers::future::TimeoutFuture;
use wasm_bindgen::{prelude::Closure, JsCast, JsValue};
use wasm_bindgen_test::*;

use jsaction::{Dispatch, EventContract};

wasm_bindgen_test_configure!(run_in_browser);

fn document() -> web_sys::Document {
    jsaction::helpers::document()
}

/// Mounts an isolated root for one test and returns it.
fn mount(html: &str) -> web_sys::Element {
    let root = document().create_element("div").unwrap();
    root.set_inner_html(html);
    document().body().unwrap().append_child(&root).unwrap();
    root
}

fn by_id(root: &web_sys::Element, id: &str) -> web_sys::Element {
    root.query_selector(&format!("#{id}")).unwrap().unwrap()
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Seen {
    event_type: String,
    action: String,
    global: bool,
    replayed: bool,
}

type Log = Rc<RefCell<Vec<Seen>>>;

fn attach_collector(contract: &EventContract) -> Log {
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    contract.dispatch_to(move |dispatch| {
        let mut sink = sink.borrow_mut();
        match dispatch {
            Dispatch::Replayed(records) => {
                for record in records {
                    sink.push(Seen {
                        event_type: record.event_type().to_owned(),
                        action: record.action().to_owned(),
                        global: false,
                        replayed: true,
                    });
                }
            }
            Dispatch::Global(record) => sink.push(Seen {
                event_type: record.event_type().to_owned(),
                action: record.action().to_owned(),
                global: true,
                replayed: false,
            }),
            Dispatch::Matched(record) => sink.push(Seen {
                event_type: record.event_type().to_owned(),
                action: record.action().to_owned(),
                global: false,
                replayed: false,
            }),
        }
    });
    log
}

fn matched(log: &Log) -> Vec<Seen> {
    log.borrow()
        .iter()
        .filter(|seen| !seen.global)
        .cloned()
        .collect()
}

fn mouse_init(x: i32, y: i32) -> web_sys::MouseEventInit {
    let init = web_sys::MouseEventInit::new();
    init.set_bubbles(true);
    init.set_cancelable(true);
    init.set_client_x(x);
    init.set_client_y(y);
    init
}

fn mouse_event(kind: &str, init: &web_sys::MouseEventInit) -> web_sys::MouseEvent {
    web_sys::MouseEvent::new_with_mouse_event_init_dict(kind, init).unwrap()
}

fn touch_event(kind: &str, target: &web_sys::EventTarget, x: i32, y: i32) -> web_sys::TouchEvent {
    let touch = web_sys::TouchInit::new(1, target);
    touch.set_client_x(x as f64);
    touch.set_client_y(y as f64);
    touch.set_screen_x(x as f64);
    touch.set_screen_y(y as f64);
    let touch = web_sys::Touch::new(&touch).unwrap();

    let active = js_sys::Array::new();
    let changed = js_sys::Array::new();
    if kind == "touchend" {
        changed.push(&touch);
    } else {
        active.push(&touch);
        changed.push(&touch);
    }
    let init = web_sys::TouchEventInit::new();
    init.set_bubbles(true);
    init.set_cancelable(true);
    init.set_touches(&active);
    init.set_target_touches(&active);
    init.set_changed_touches(&changed);
    web_sys::TouchEvent::new_with_event_init_dict(kind, &init).unwrap()
}

#[wasm_bindgen_test]
fn click_resolves_to_the_bound_action() {
    let root = mount(r#"<div id="c"><a id="a" jsaction="open">Hi</a></div>"#);
    let contract = EventContract::new();
    contract.add_event("click");
    let _container = contract.add_container(&by_id(&root, "c"));
    let log = attach_collector(&contract);

    // propagation must stop at the container boundary
    let outside_clicks = Rc::new(RefCell::new(0u32));
    let counter = Rc::clone(&outside_clicks);
    let listener = Closure::wrap(Box::new(move |_: web_sys::Event| {
        *counter.borrow_mut() += 1;
    }) as Box<dyn FnMut(web_sys::Event)>)
    .into_js_value();
    root.add_event_listener_with_callback("click", listener.unchecked_ref())
        .unwrap();

    let event = mouse_event("click", &mouse_init(10, 10));
    by_id(&root, "a").dispatch_event(&event).unwrap();

    let hits = matched(&log);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].event_type, "click");
    assert_eq!(hits[0].action, "open");
    // matched anchor clicks must not navigate
    assert!(event.default_prevented());
    assert_eq!(*outside_clicks.borrow(), 0);
}

#[wasm_bindgen_test]
fn modifier_click_passes_through_for_the_browser() {
    let root = mount(r#"<div id="c"><a id="a" jsaction="open">Hi</a></div>"#);
    let contract = EventContract::new();
    contract.add_event("click");
    let _container = contract.add_container(&by_id(&root, "c"));
    let log = attach_collector(&contract);

    let init = mouse_init(10, 10);
    init.set_ctrl_key(true);
    let event = mouse_event("click", &init);
    by_id(&root, "a").dispatch_event(&event).unwrap();

    assert!(matched(&log).is_empty());
    let log = log.borrow();
    assert_eq!(log.len(), 1);
    assert!(log[0].global);
    assert_eq!(log[0].event_type, "clickmod");
    assert_eq!(log[0].action, "");
    assert!(!event.default_prevented());
}

#[wasm_bindgen_test]
fn clickmod_binding_catches_modified_clicks() {
    let root = mount(r#"<div id="c"><span id="s" jsaction="clickmod:mod.act">x</span></div>"#);
    let contract = EventContract::new();
    contract.add_event("click");
    let _container = contract.add_container(&by_id(&root, "c"));
    let log = attach_collector(&contract);

    let init = mouse_init(10, 10);
    init.set_meta_key(true);
    by_id(&root, "s")
        .dispatch_event(&mouse_event("click", &init))
        .unwrap();

    let hits = matched(&log);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].event_type, "clickmod");
    assert_eq!(hits[0].action, "mod.act");
}

#[wasm_bindgen_test]
fn walk_skips_elements_without_a_matching_binding() {
    let root = mount(
        r#"<div id="c"><div id="outer" jsaction="click:outer.act"><span id="inner" jsaction="mouseover:inner.hover">X</span></div></div>"#,
    );
    let contract = EventContract::new();
    contract.add_event("click");
    let _container = contract.add_container(&by_id(&root, "c"));
    let log = attach_collector(&contract);

    by_id(&root, "inner")
        .dispatch_event(&mouse_event("click", &mouse_init(10, 10)))
        .unwrap();

    let hits = matched(&log);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].action, "outer.act");
}

#[wasm_bindgen_test]
fn records_queue_until_a_dispatcher_attaches() {
    let root = mount(
        r#"<div id="c"><i id="x" jsaction="foo"></i><i id="y" jsaction="bar"></i></div>"#,
    );
    let contract = EventContract::new();
    contract.add_event("click");
    let _container = contract.add_container(&by_id(&root, "c"));

    by_id(&root, "x")
        .dispatch_event(&mouse_event("click", &mouse_init(1, 1)))
        .unwrap();
    by_id(&root, "y")
        .dispatch_event(&mouse_event("click", &mouse_init(2, 2)))
        .unwrap();

    let log = attach_collector(&contract);
    {
        let seen = log.borrow();
        assert_eq!(seen.len(), 2);
        assert!(seen.iter().all(|s| s.replayed));
        assert_eq!(seen[0].action, "foo");
        assert_eq!(seen[1].action, "bar");
    }

    // further events dispatch live, one by one
    by_id(&root, "x")
        .dispatch_event(&mouse_event("click", &mouse_init(3, 3)))
        .unwrap();
    let hits = matched(&log);
    assert_eq!(hits.len(), 3);
    assert!(!hits[2].replayed);
    assert_eq!(hits[2].action, "foo");
}

#[wasm_bindgen_test]
fn namespace_of_an_ancestor_qualifies_bare_actions() {
    let root = mount(r#"<div id="c" jsnamespace="ns"><button id="b" jsaction="go">OK</button></div>"#);
    let contract = EventContract::new();
    contract.add_event("click");
    let _container = contract.add_container(&by_id(&root, "c"));
    let log = attach_collector(&contract);

    by_id(&root, "b")
        .dispatch_event(&mouse_event("click", &mouse_init(5, 5)))
        .unwrap();

    let hits = matched(&log);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].action, "ns.go");
}

#[wasm_bindgen_test]
fn removing_a_container_detaches_its_listeners() {
    let root = mount(r#"<div id="c"><b id="t" jsaction="hit"></b></div>"#);
    let contract = EventContract::new();
    contract.add_event("click");
    let container = contract.add_container(&by_id(&root, "c"));
    let log = attach_collector(&contract);

    by_id(&root, "t")
        .dispatch_event(&mouse_event("click", &mouse_init(1, 1)))
        .unwrap();
    assert_eq!(matched(&log).len(), 1);

    contract.remove_container(container);
    by_id(&root, "t")
        .dispatch_event(&mouse_event("click", &mouse_init(1, 1)))
        .unwrap();
    assert_eq!(matched(&log).len(), 1);
    assert_eq!(log.borrow().len(), 2);
}

#[wasm_bindgen_test]
fn keyboard_activation_matches_the_click_binding() {
    let root = mount(r#"<div id="c"><div id="k" tabindex="0" jsaction="click:go"></div></div>"#);
    let contract = EventContract::new();
    contract.add_event("click");
    let _container = contract.add_container(&by_id(&root, "c"));
    let log = attach_collector(&contract);

    let init = web_sys::KeyboardEventInit::new();
    init.set_bubbles(true);
    init.set_cancelable(true);
    init.set_key_code(13);
    let event =
        web_sys::KeyboardEvent::new_with_keyboard_event_init_dict("keydown", &init).unwrap();
    by_id(&root, "k").dispatch_event(&event).unwrap();

    let hits = matched(&log);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].event_type, "clickkey");
    assert_eq!(hits[0].action, "go");
}

#[wasm_bindgen_test]
fn clickonly_ignores_keyboard_activation() {
    let root = mount(r#"<div id="c"><div id="k" tabindex="0" jsaction="clickonly:real"></div></div>"#);
    let contract = EventContract::new();
    contract.add_event("click");
    let _container = contract.add_container(&by_id(&root, "c"));
    let log = attach_collector(&contract);

    let init = web_sys::KeyboardEventInit::new();
    init.set_bubbles(true);
    init.set_key_code(13);
    let event =
        web_sys::KeyboardEvent::new_with_keyboard_event_init_dict("keydown", &init).unwrap();
    by_id(&root, "k").dispatch_event(&event).unwrap();
    assert!(matched(&log).is_empty());

    // a real click still matches, and the global copy reads as plain click
    by_id(&root, "k")
        .dispatch_event(&mouse_event("click", &mouse_init(4, 4)))
        .unwrap();
    let hits = matched(&log);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].event_type, "clickonly");
    assert_eq!(hits[0].action, "real");
    let globals: Vec<Seen> = log.borrow().iter().filter(|s| s.global).cloned().collect();
    assert!(globals.iter().any(|s| s.event_type == "click"));
}

#[wasm_bindgen_test]
fn mouseenter_fires_only_on_subtree_boundary_crossings() {
    let root = mount(
        r#"<div id="c"><div id="outer" jsaction="mouseenter:enter"><span id="inner">X</span></div></div>"#,
    );
    let contract = EventContract::new();
    contract.add_event("mouseenter");
    let _container = contract.add_container(&by_id(&root, "c"));
    let log = attach_collector(&contract);

    // entering from outside the subtree
    let init = mouse_init(0, 0);
    init.set_related_target(Some(root.unchecked_ref()));
    by_id(&root, "outer")
        .dispatch_event(&mouse_event("mouseover", &init))
        .unwrap();
    assert_eq!(matched(&log).len(), 1);
    assert_eq!(matched(&log)[0].event_type, "mouseenter");

    // moving between descendants is not an enter
    let init = mouse_init(0, 0);
    init.set_related_target(Some(by_id(&root, "inner").unchecked_ref()));
    by_id(&root, "outer")
        .dispatch_event(&mouse_event("mouseover", &init))
        .unwrap();
    assert_eq!(matched(&log).len(), 1);
}

#[wasm_bindgen_test]
fn custom_envelope_events_dispatch_by_inner_type() {
    let root = mount(r#"<div id="c"><p id="p" jsaction="activate:do.it"></p></div>"#);
    let contract = EventContract::new();
    contract.add_event_with_native("activate", jsaction::event_type::CUSTOM);
    let _container = contract.add_container(&by_id(&root, "c"));
    let log = attach_collector(&contract);

    jsaction::fire_custom_event(
        by_id(&root, "p").unchecked_ref(),
        "activate",
        &JsValue::from_str("payload"),
    );

    let hits = matched(&log);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].event_type, "activate");
    assert_eq!(hits[0].action, "do.it");
}

#[wasm_bindgen_test]
async fn tap_synthesizes_an_immediate_click_and_suppresses_the_cascade() {
    let root = mount(r#"<div id="c"><div id="t" jsaction="click:tap">tap me</div></div>"#);
    let contract = EventContract::new();
    contract.add_event("click");
    let _container = contract.add_container(&by_id(&root, "c"));
    let log = attach_collector(&contract);
    let target = by_id(&root, "t");

    target
        .dispatch_event(&touch_event("touchstart", &target, 100, 100))
        .unwrap();
    TimeoutFuture::new(50).await;
    let touchend = touch_event("touchend", &target, 101, 101);
    target.dispatch_event(&touchend).unwrap();

    let hits = matched(&log);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].event_type, "click");
    assert_eq!(hits[0].action, "tap");
    assert!(touchend.default_prevented());

    // the emulated cascade the browser would fire next stays invisible
    for kind in ["mousedown", "mouseup", "click"] {
        target
            .dispatch_event(&mouse_event(kind, &mouse_init(100, 100)))
            .unwrap();
    }
    assert_eq!(matched(&log).len(), 1);

    contract.dispose();
}

#[wasm_bindgen_test]
fn tap_aborts_when_the_finger_moves() {
    let root = mount(r#"<div id="c"><div id="t" jsaction="click:tap">tap me</div></div>"#);
    let contract = EventContract::new();
    contract.add_event("click");
    let _container = contract.add_container(&by_id(&root, "c"));
    let log = attach_collector(&contract);
    let target = by_id(&root, "t");

    target
        .dispatch_event(&touch_event("touchstart", &target, 100, 100))
        .unwrap();
    target
        .dispatch_event(&touch_event("touchmove", &target, 110, 110))
        .unwrap();
    target
        .dispatch_event(&touch_event("touchend", &target, 110, 110))
        .unwrap();

    assert!(matched(&log).is_empty());

    contract.dispose();
}

#[wasm_bindgen_test]
async fn long_press_falls_back_to_the_browser() {
    let root = mount(r#"<div id="c"><div id="t" jsaction="click:tap">tap me</div></div>"#);
    let contract = EventContract::new();
    contract.add_event("click");
    let _container = contract.add_container(&by_id(&root, "c"));
    let log = attach_collector(&contract);
    let target = by_id(&root, "t");

    target
        .dispatch_event(&touch_event("touchstart", &target, 100, 100))
        .unwrap();
    TimeoutFuture::new(600).await;
    let touchend = touch_event("touchend", &target, 100, 100);
    target.dispatch_event(&touchend).unwrap();

    assert!(matched(&log).is_empty());
    assert!(!touchend.default_prevented());

    contract.dispose();
}

#[wasm_bindgen_test]
fn nested_containers_do_not_double_dispatch() {
    let root = mount(
        r#"<div id="outer"><div id="inner"><u id="t" jsaction="once"></u></div></div>"#,
    );
    let contract = EventContract::new();
    contract.add_event("click");
    let _outer = contract.add_container(&by_id(&root, "outer"));
    let _inner = contract.add_container(&by_id(&root, "inner"));
    let log = attach_collector(&contract);

    by_id(&root, "t")
        .dispatch_event(&mouse_event("click", &mouse_init(1, 1)))
        .unwrap();

    assert_eq!(matched(&log).len(), 1);
}
