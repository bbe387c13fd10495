//! Parsing of the `jsaction` attribute into per-element action maps, and the
//! caches that keep repeated lookups off the parser.
//!
//! Two cache layers: a per-raw-string map (many elements share one attribute
//! value) and a per-element binding stored as an expando property holding an
//! index into the interned map table. Index 0 is a shared empty sentinel, so
//! attribute-less elements cost no allocation.

use std::rc::Rc;

use rustc_hash::FxHashMap;
use wasm_bindgen::JsCast;

use crate::helpers::{get_property, set_property};

/// The attribute that binds actions to an element.
pub const JSACTION_ATTRIBUTE: &str = "jsaction";

/// The attribute that qualifies unqualified action names on descendants.
pub const JSNAMESPACE_ATTRIBUTE: &str = "jsnamespace";

/// A parsed `jsaction` attribute: `eventType → actionName`.
///
/// At most one action per event type; within one attribute the last clause
/// for a type wins. Never mutated after construction.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ActionMap {
    actions: FxHashMap<String, String>,
}

impl ActionMap {
    /// Parses a raw attribute value. Malformed clauses are dropped; the rest
    /// of the attribute parses normally. Clauses without an event type bind
    /// `default_event_type`.
    pub fn parse(raw: &str, default_event_type: &str) -> Self {
        let mut actions = FxHashMap::default();
        for clause in raw.split(';') {
            let clause = clause.trim();
            if clause.is_empty() {
                continue;
            }
            let (event_type, action) = match clause.split_once(':') {
                Some((event_type, action)) => (event_type.trim(), action.trim()),
                None => (default_event_type, clause),
            };
            if event_type.is_empty() || action.is_empty() {
                crate::debug_warn!("dropping malformed jsaction clause {clause:?}");
                continue;
            }
            actions.insert(event_type.to_owned(), action.to_owned());
        }
        Self { actions }
    }

    /// The action bound to `event_type`, if any.
    pub fn action_for(&self, event_type: &str) -> Option<&str> {
        self.actions.get(event_type).map(String::as_str)
    }

    /// Whether any event type is bound.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Whether every action name already carries a namespace.
    #[cfg(any(feature = "namespace", test))]
    fn fully_qualified(&self) -> bool {
        self.actions.values().all(|action| action.contains('.'))
    }

    /// A copy with every action name rewritten through `qualify`.
    #[cfg(feature = "namespace")]
    fn map_actions(&self, mut qualify: impl FnMut(&str) -> String) -> Self {
        Self {
            actions: self
                .actions
                .iter()
                .map(|(event_type, action)| (event_type.clone(), qualify(action)))
                .collect(),
        }
    }
}

/// Per-contract parse caches and the interned table of action maps.
///
/// The table is append-only. Per-element bindings live on the element itself
/// as an expando property holding an index into `maps`; the key embeds the
/// contract id so independent contracts on one page never read each other's
/// indices.
pub(crate) struct ActionCache {
    maps: Vec<Rc<ActionMap>>,
    by_raw: FxHashMap<String, u32>,
    default_event_type: String,
    map_key: String,
}

impl ActionCache {
    pub fn new(contract_id: u32) -> Self {
        Self {
            maps: vec![Rc::new(ActionMap::default())],
            by_raw: FxHashMap::default(),
            default_event_type: crate::event_type::CLICK.to_owned(),
            map_key: format!("__jsam{contract_id}"),
        }
    }

    /// Changes the default event type for attributes parsed from now on.
    /// Already-cached maps keep the binding they were parsed with.
    pub fn set_default_event_type(&mut self, event_type: impl Into<String>) {
        self.default_event_type = event_type.into();
    }

    /// The action map for `element`, parsing and caching as needed.
    ///
    /// `container` bounds the namespace walk used to qualify bare action
    /// names. Idempotent: repeated calls return the identical `Rc`.
    pub fn action_map(
        &mut self,
        element: &web_sys::Element,
        #[allow(unused_variables)] container: &web_sys::Element,
    ) -> Rc<ActionMap> {
        if let Some(id) = get_property(element, &self.map_key).as_f64() {
            if let Some(map) = self.maps.get(id as usize) {
                return Rc::clone(map);
            }
        }

        let raw = read_attribute(element, JSACTION_ATTRIBUTE);
        let id = match raw.as_deref() {
            None | Some("") => 0,
            Some(raw) => {
                let shared_id = match self.by_raw.get(raw) {
                    Some(&id) => id,
                    None => {
                        let map = ActionMap::parse(raw, &self.default_event_type);
                        let id = self.intern(map);
                        self.by_raw.insert(raw.to_owned(), id);
                        id
                    }
                };
                #[cfg(feature = "namespace")]
                {
                    self.qualified_id(shared_id, element, container)
                }
                #[cfg(not(feature = "namespace"))]
                {
                    shared_id
                }
            }
        };

        set_property(element, &self.map_key, &f64::from(id).into());
        Rc::clone(&self.maps[id as usize])
    }

    /// Resolves bare action names against ancestor namespaces. The shared
    /// cached map stays unqualified; the qualified clone is interned under a
    /// fresh id bound to this element alone.
    #[cfg(feature = "namespace")]
    fn qualified_id(
        &mut self,
        shared_id: u32,
        element: &web_sys::Element,
        container: &web_sys::Element,
    ) -> u32 {
        let shared = Rc::clone(&self.maps[shared_id as usize]);
        if shared.fully_qualified() {
            return shared_id;
        }
        let qualified =
            shared.map_actions(|action| crate::namespace::resolve(action, element, container));
        self.intern(qualified)
    }

    fn intern(&mut self, map: ActionMap) -> u32 {
        self.maps.push(Rc::new(map));
        (self.maps.len() - 1) as u32
    }
}

/// Reads an attribute defensively: nodes detached by some engines lose the
/// `getAttribute` accessor, which counts as "no attribute".
fn read_attribute(element: &web_sys::Element, name: &str) -> Option<String> {
    if get_property(element, "getAttribute")
        .dyn_ref::<js_sys::Function>()
        .is_none()
    {
        return None;
    }
    element.get_attribute(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_typed_clauses() {
        let map = ActionMap::parse("click:menu.open;mouseover:menu.peek", "click");
        assert_eq!(map.action_for("click"), Some("menu.open"));
        assert_eq!(map.action_for("mouseover"), Some("menu.peek"));
        assert_eq!(map.action_for("keydown"), None);
    }

    #[test]
    fn bare_clause_binds_default_event_type() {
        let map = ActionMap::parse("open", "click");
        assert_eq!(map.action_for("click"), Some("open"));

        let map = ActionMap::parse("open", "mousedown");
        assert_eq!(map.action_for("mousedown"), Some("open"));
        assert_eq!(map.action_for("click"), None);
    }

    #[test]
    fn whitespace_and_trailing_separators_are_tolerated() {
        let map = ActionMap::parse("  click :  open ;; ;touchend:close; ", "click");
        assert_eq!(map.action_for("click"), Some("open"));
        assert_eq!(map.action_for("touchend"), Some("close"));
    }

    #[test]
    fn empty_and_whitespace_attributes_yield_empty_maps() {
        assert!(ActionMap::parse("", "click").is_empty());
        assert!(ActionMap::parse("   ", "click").is_empty());
        assert!(ActionMap::parse(";;", "click").is_empty());
    }

    #[test]
    fn malformed_clauses_are_dropped_without_poisoning_the_rest() {
        let map = ActionMap::parse(":nope;click:open;keydown:", "click");
        assert_eq!(map.action_for("click"), Some("open"));
        assert_eq!(map.action_for(""), None);
        assert_eq!(map.action_for("keydown"), None);
    }

    #[test]
    fn duplicate_event_types_last_wins() {
        let map = ActionMap::parse("click:first;click:second", "click");
        assert_eq!(map.action_for("click"), Some("second"));
    }

    #[test]
    fn parse_yields_exactly_the_named_keys() {
        let map = ActionMap::parse("a:x;b:y", "click");
        assert_eq!(map.action_for("a"), Some("x"));
        assert_eq!(map.action_for("b"), Some("y"));
        assert_eq!(map.actions.len(), 2);
    }

    #[test]
    fn qualification_detection() {
        assert!(ActionMap::parse("click:ns.open", "click").fully_qualified());
        assert!(!ActionMap::parse("click:open", "click").fully_qualified());
        assert!(!ActionMap::parse("click:ns.open;keydown:go", "click").fully_qualified());
    }
}
