//! The set of contract containers and the listeners installed on them.
//!
//! When propagation is stopped at the container boundary, nesting containers
//! is harmless and every container carries listeners. When it is not, only
//! the outermost container of any DOM subtree may listen, or bubbling events
//! would dispatch twice; the registry re-partitions the full set into
//! *active* and *nested* on every add and remove.

use std::borrow::Cow;
use std::cell::RefCell;
use std::rc::Rc;

use smallvec::SmallVec;
use wasm_bindgen::JsCast;

/// One semantic event type's listener, replayed onto every container that
/// becomes active so late-added containers get all current event types.
#[derive(Clone)]
pub(crate) struct EventInstaller {
    pub semantic: Cow<'static, str>,
    pub native: Cow<'static, str>,
    pub capture: bool,
    pub listener: js_sys::Function,
}

struct InstalledListener {
    native: Cow<'static, str>,
    capture: bool,
    listener: js_sys::Function,
}

/// A contract container: a root element plus exact bookkeeping of the
/// listeners physically installed on it, so removal never guesses.
pub(crate) struct Container {
    element: web_sys::Element,
    installed: RefCell<SmallVec<[InstalledListener; 8]>>,
}

impl Container {
    fn new(element: web_sys::Element) -> Self {
        Self {
            element,
            installed: RefCell::new(SmallVec::new()),
        }
    }

    pub fn element(&self) -> &web_sys::Element {
        &self.element
    }

    fn install(&self, installer: &EventInstaller) {
        _ = self.element.add_event_listener_with_callback_and_bool(
            &installer.native,
            &installer.listener,
            installer.capture,
        );
        self.installed.borrow_mut().push(InstalledListener {
            native: installer.native.clone(),
            capture: installer.capture,
            listener: installer.listener.clone(),
        });
    }

    fn uninstall_all(&self) {
        for installed in self.installed.borrow_mut().drain(..) {
            _ = self.element.remove_event_listener_with_callback_and_bool(
                &installed.native,
                &installed.listener,
                installed.capture,
            );
        }
    }

    fn has_listeners(&self) -> bool {
        !self.installed.borrow().is_empty()
    }
}

/// Opaque handle returned by `add_container`, consumed by `remove_container`.
pub struct ContainerHandle {
    pub(crate) container: Rc<Container>,
}

impl std::fmt::Debug for ContainerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContainerHandle").finish_non_exhaustive()
    }
}

#[derive(Default)]
pub(crate) struct ContainerRegistry {
    active: Vec<Rc<Container>>,
    nested: Vec<Rc<Container>>,
}

impl ContainerRegistry {
    /// Registers a container and wires it with every installer registered so
    /// far. Returns the handle for later removal.
    pub fn add(
        &mut self,
        element: web_sys::Element,
        installers: &[EventInstaller],
    ) -> ContainerHandle {
        let container = Rc::new(Container::new(element));
        if cfg!(feature = "stop-propagation") {
            activate(&container, installers);
            self.active.push(Rc::clone(&container));
        } else {
            self.nested.push(Rc::clone(&container));
            self.repartition(installers);
        }
        ContainerHandle {
            container,
        }
    }

    /// Uninstalls a container's listeners and drops it from whichever list
    /// holds it. Without stop-propagation, a child container it was shadowing
    /// may become active again.
    pub fn remove(&mut self, handle: ContainerHandle, installers: &[EventInstaller]) {
        let target = handle.container;
        target.uninstall_all();
        self.active.retain(|c| !Rc::ptr_eq(c, &target));
        self.nested.retain(|c| !Rc::ptr_eq(c, &target));
        if !cfg!(feature = "stop-propagation") {
            self.repartition(installers);
        }
    }

    /// Installs one newly registered event type on every active container.
    pub fn install_everywhere(&self, installer: &EventInstaller) {
        for container in &self.active {
            container.install(installer);
        }
    }

    pub fn active_containers(&self) -> impl Iterator<Item = &Rc<Container>> {
        self.active.iter()
    }

    pub fn uninstall_all(&mut self) {
        for container in self.active.drain(..).chain(self.nested.drain(..)) {
            container.uninstall_all();
        }
    }

    /// Splits the registered set so that exactly the containers with no
    /// registered proper ancestor carry listeners.
    fn repartition(&mut self, installers: &[EventInstaller]) {
        let all: Vec<Rc<Container>> = self
            .active
            .drain(..)
            .chain(self.nested.drain(..))
            .collect();
        let nested_flags = nested_of(all.len(), |ancestor, descendant| {
            let a: &web_sys::Node = all[ancestor].element();
            let d: &web_sys::Node = all[descendant].element();
            a != d && a.contains(Some(d))
        });
        for (container, is_nested) in all.into_iter().zip(nested_flags) {
            if is_nested {
                if container.has_listeners() {
                    container.uninstall_all();
                }
                self.nested.push(container);
            } else {
                if !container.has_listeners() {
                    activate(&container, installers);
                }
                self.active.push(container);
            }
        }
    }
}

fn activate(container: &Rc<Container>, installers: &[EventInstaller]) {
    for installer in installers {
        container.install(installer);
    }
    // iOS does not bubble events through arbitrary elements unless they look
    // clickable.
    if crate::helpers::is_ios() {
        if let Some(html) = container.element().dyn_ref::<web_sys::HtmlElement>() {
            _ = html.style().set_property("cursor", "pointer");
        }
    }
}

/// Which of `n` containers have some other container as a proper ancestor.
fn nested_of(n: usize, is_ancestor: impl Fn(usize, usize) -> bool) -> Vec<bool> {
    (0..n)
        .map(|descendant| (0..n).any(|ancestor| ancestor != descendant && is_ancestor(ancestor, descendant)))
        .collect()
}
