//! Qualification of bare action names through the `jsnamespace` attribute of
//! an ancestor.

use wasm_bindgen::JsValue;

use crate::{
    action::JSNAMESPACE_ATTRIBUTE,
    helpers::{get_property, set_property},
};

/// Expando key for the per-element namespace cache. The value is the
/// namespace string, JS `null` once an element has been queried and found
/// bare, and missing while the element has never been queried.
const NAMESPACE_KEY: &str = "__jsan";

/// Qualifies `name` against the nearest ancestor namespace.
///
/// Already-qualified names pass through unchanged, which also makes the
/// operation idempotent. The walk starts at `start` and includes `container`
/// itself; a name with no namespace in scope stays bare (global).
pub fn resolve(name: &str, start: &web_sys::Element, container: &web_sys::Element) -> String {
    if is_qualified(name) {
        return name.to_owned();
    }
    let mut node = Some(start.clone());
    while let Some(element) = node {
        if let Some(namespace) = namespace_of(&element) {
            return qualify(name, &namespace);
        }
        if &element == container {
            break;
        }
        node = element.parent_element();
    }
    name.to_owned()
}

fn is_qualified(name: &str) -> bool {
    name.contains('.')
}

fn qualify(name: &str, namespace: &str) -> String {
    format!("{namespace}.{name}")
}

/// The element's own `jsnamespace`, through the per-element cache. One DOM
/// attribute query per element, ever.
fn namespace_of(element: &web_sys::Element) -> Option<String> {
    let cached = get_property(element, NAMESPACE_KEY);
    if !cached.is_undefined() {
        return cached.as_string();
    }
    let namespace = element.get_attribute(JSNAMESPACE_ATTRIBUTE);
    let store = match &namespace {
        Some(ns) => JsValue::from_str(ns),
        None => JsValue::NULL,
    };
    set_property(element, NAMESPACE_KEY, &store);
    namespace
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualified_names_are_recognized() {
        assert!(is_qualified("menu.open"));
        assert!(is_qualified("a.b.c"));
        assert!(!is_qualified("open"));
    }

    #[test]
    fn qualification_concatenates_with_a_dot() {
        assert_eq!(qualify("open", "menu"), "menu.open");
    }

    #[test]
    fn qualification_is_idempotent() {
        let once = qualify("open", "menu");
        assert!(is_qualified(&once));
        // a second resolution pass would take the early return
    }
}
