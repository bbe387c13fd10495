#![deny(missing_docs)]

//! Declarative event delegation for browser documents.
//!
//! Instead of attaching a listener to every interactive element, applications
//! annotate elements with a [`jsaction`](JSACTION_ATTRIBUTE) attribute naming
//! the *action* each event type should trigger:
//!
//! ```html
//! <div id="container">
//!   <button jsaction="click:menu.open">Menu</button>
//! </div>
//! ```
//!
//! A single [`EventContract`] installs one delegated listener per event type
//! at each container boundary, intercepts events in the bubbling phase,
//! resolves the first ancestor whose declared actions match, and hands an
//! [`EventRecord`] to a dispatcher component. Until a dispatcher attaches,
//! matched records queue up and are replayed in one batch, so a contract
//! created inline in page HTML loses no early interaction while application
//! code loads.
//!
//! The contract only *produces* records; executing the named actions, and
//! any routing or registry for them, belongs to the dispatcher.
//!
//! ```no_run
//! use jsaction::{Dispatch, EventContract};
//!
//! let contract = EventContract::new();
//! contract.add_event("click");
//! let body: web_sys::Element = jsaction::helpers::document().body().unwrap().into();
//! let _handle = contract.add_container(&body);
//!
//! // ... later, once application code is loaded:
//! contract.dispatch_to(|dispatch| match dispatch {
//!     Dispatch::Replayed(_records) => { /* replay the backlog */ }
//!     Dispatch::Matched(record) => { jsaction::log!("run {}", record.action()) }
//!     Dispatch::Global(_) => {}
//! });
//! ```
//!
//! Subsystems are feature-gated so pages that do not need them do not ship
//! them: `fast-click` (touch-to-click synthesis), `a11y-click` (keyboard
//! activation), `mouse-special` (enter/leave emulation), `namespace`
//! (`jsnamespace` qualification), `custom-event` (application envelope
//! events), `stop-propagation`, and `event-path` (resolution over
//! `Event.composedPath()`).

mod action;
mod container;
mod contract;
mod event;
pub mod event_type;
#[cfg(feature = "fast-click")]
mod fastclick;
pub mod helpers;
pub mod logging;
#[cfg(feature = "namespace")]
mod namespace;
mod record;
mod resolve;

pub use action::{ActionMap, JSACTION_ATTRIBUTE, JSNAMESPACE_ATTRIBUTE};
pub use container::ContainerHandle;
pub use contract::{Dispatch, EventContract};
#[cfg(feature = "custom-event")]
pub use event::fire_custom_event;
pub use record::EventRecord;

pub use js_sys;
pub use wasm_bindgen;
pub use web_sys;
