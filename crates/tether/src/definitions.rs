//! Declarative per-element source/target rules registered by `make_source` / `make_target`.

use crate::ids::{ElementId, EndpointId};
use crate::params::EndpointOptions;
use indexmap::IndexMap;

/// Matches every connection type when unmaking definitions.
pub const ANY_TYPE: &str = "*";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionKind {
    Source,
    Target,
}

impl DefinitionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Target => "target",
        }
    }

    pub fn of_index(index: usize) -> Self {
        if index == 0 { Self::Source } else { Self::Target }
    }
}

/// Options for `make_source` / `make_target`.
#[derive(Debug, Clone, Default)]
pub struct DefinitionOptions {
    /// Endpoint parameters for endpoints created from this definition. `connection_type`
    /// defaults to `"default"`, `max_connections` to unlimited.
    pub endpoint: EndpointOptions,
    /// Reuse one cached endpoint for every connection formed through this definition.
    pub unique_endpoint: bool,
    /// Create the cached endpoint right away (implies `unique_endpoint`).
    pub create_endpoint: bool,
    /// Drop-target ranking; group elements default to -1.
    pub rank: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct Definition {
    pub(crate) def: EndpointOptions,
    pub(crate) unique_endpoint: bool,
    pub(crate) max_connections: i32,
    pub(crate) enabled: bool,
    pub(crate) endpoint: Option<EndpointId>,
    pub(crate) rank: Option<i32>,
    /// Scope tags stamped on the element when this definition was made.
    pub(crate) scope_tags: Vec<String>,
}

pub type SourceDefinition = Definition;
pub type TargetDefinition = Definition;

impl Definition {
    pub fn params(&self) -> &EndpointOptions {
        &self.def
    }

    pub fn connection_type(&self) -> Option<&str> {
        self.def.connection_type.as_deref()
    }

    pub fn port_id(&self) -> Option<&str> {
        self.def.port_id.as_deref()
    }

    pub fn scope(&self) -> Option<&str> {
        self.def.scope.as_deref()
    }

    pub fn unique_endpoint(&self) -> bool {
        self.unique_endpoint
    }

    pub fn max_connections(&self) -> i32 {
        self.max_connections
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn cached_endpoint(&self) -> Option<EndpointId> {
        self.endpoint
    }

    pub fn rank(&self) -> Option<i32> {
        self.rank
    }

    pub fn scope_tags(&self) -> &[String] {
        &self.scope_tags
    }

    fn matches_type(&self, connection_type: &str) -> bool {
        self.connection_type().is_none_or(|t| t == connection_type)
    }

    /// Type first, then port; a definition without a type or port accepts any.
    fn matches(&self, connection_type: &str, port_id: Option<&str>) -> bool {
        self.matches_type(connection_type) && self.port_id().is_none_or(|p| Some(p) == port_id)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Definitions {
    sources: IndexMap<ElementId, Vec<Definition>>,
    targets: IndexMap<ElementId, Vec<Definition>>,
}

impl Definitions {
    fn map(&self, kind: DefinitionKind) -> &IndexMap<ElementId, Vec<Definition>> {
        match kind {
            DefinitionKind::Source => &self.sources,
            DefinitionKind::Target => &self.targets,
        }
    }

    fn map_mut(&mut self, kind: DefinitionKind) -> &mut IndexMap<ElementId, Vec<Definition>> {
        match kind {
            DefinitionKind::Source => &mut self.sources,
            DefinitionKind::Target => &mut self.targets,
        }
    }

    pub fn list(&self, kind: DefinitionKind, element_id: &str) -> &[Definition] {
        self.map(kind)
            .get(element_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub(crate) fn get_mut(
        &mut self,
        kind: DefinitionKind,
        element_id: &str,
        index: usize,
    ) -> Option<&mut Definition> {
        self.map_mut(kind).get_mut(element_id)?.get_mut(index)
    }

    pub(crate) fn push(&mut self, kind: DefinitionKind, element_id: ElementId, def: Definition) {
        self.map_mut(kind).entry(element_id).or_default().push(def);
    }

    /// Index of the first definition, in declaration order, matching `connection_type` and
    /// `port_id`.
    pub fn find_match(
        &self,
        kind: DefinitionKind,
        element_id: &str,
        connection_type: &str,
        port_id: Option<&str>,
    ) -> Option<usize> {
        self.list(kind, element_id)
            .iter()
            .position(|d| d.matches(connection_type, port_id))
    }

    /// The first definition, or the first whose type equals `connection_type` when one is given.
    pub fn find_first(
        &self,
        kind: DefinitionKind,
        element_id: &str,
        connection_type: Option<&str>,
    ) -> Option<&Definition> {
        let defs = self.list(kind, element_id);
        match connection_type {
            None => defs.first(),
            Some(t) => defs.iter().find(|d| d.connection_type() == Some(t)),
        }
    }

    /// Removes definitions of `connection_type` (or all, for [`ANY_TYPE`]). Returns `true` when
    /// the element has none of this kind left.
    pub(crate) fn remove(&mut self, kind: DefinitionKind, element_id: &str, connection_type: &str) -> bool {
        let map = self.map_mut(kind);
        let Some(defs) = map.get_mut(element_id) else {
            return true;
        };
        if connection_type != ANY_TYPE {
            defs.retain(|d| d.connection_type() != Some(connection_type));
        }
        if connection_type == ANY_TYPE || defs.is_empty() {
            map.shift_remove(element_id);
            return true;
        }
        false
    }

    /// Sets (or toggles) `enabled` on every definition accepting `connection_type`; returns the
    /// previous states.
    pub(crate) fn set_enabled(
        &mut self,
        kind: DefinitionKind,
        element_id: &str,
        state: Option<bool>,
        connection_type: &str,
    ) -> Vec<(bool, bool)> {
        let Some(defs) = self.map_mut(kind).get_mut(element_id) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for d in defs.iter_mut().filter(|d| d.matches_type(connection_type)) {
            let previous = d.enabled;
            d.enabled = state.unwrap_or(!previous);
            out.push((previous, d.enabled));
        }
        out
    }

    pub(crate) fn set_scope(&mut self, kind: DefinitionKind, element_id: &str, scope: &str) {
        if let Some(defs) = self.map_mut(kind).get_mut(element_id) {
            for d in defs {
                d.def.scope = Some(scope.to_string());
            }
        }
    }

    /// Drops cached references to an endpoint that no longer exists.
    pub(crate) fn forget_endpoint(&mut self, endpoint: EndpointId) {
        for defs in self.sources.values_mut().chain(self.targets.values_mut()) {
            for d in defs {
                if d.endpoint == Some(endpoint) {
                    d.endpoint = None;
                }
            }
        }
    }

    pub fn element_ids(&self, kind: DefinitionKind) -> impl Iterator<Item = &ElementId> {
        self.map(kind).keys()
    }

    pub(crate) fn rename_element(&mut self, old: &str, new: &ElementId) {
        for map in [&mut self.sources, &mut self.targets] {
            if let Some(defs) = map.shift_remove(old) {
                map.insert(new.clone(), defs);
            }
        }
    }

    pub fn clear(&mut self) {
        self.sources.clear();
        self.targets.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def(connection_type: Option<&str>, port: Option<&str>) -> Definition {
        Definition {
            def: EndpointOptions {
                connection_type: connection_type.map(str::to_string),
                port_id: port.map(str::to_string),
                ..Default::default()
            },
            unique_endpoint: false,
            max_connections: -1,
            enabled: true,
            endpoint: None,
            rank: None,
            scope_tags: Vec::new(),
        }
    }

    #[test]
    fn first_match_in_declaration_order_wins() {
        let mut defs = Definitions::default();
        let el = ElementId::from("a");
        defs.push(DefinitionKind::Source, el.clone(), def(Some("red"), None));
        defs.push(DefinitionKind::Source, el.clone(), def(Some("default"), Some("out")));
        defs.push(DefinitionKind::Source, el.clone(), def(Some("default"), None));

        assert_eq!(defs.find_match(DefinitionKind::Source, "a", "default", Some("out")), Some(1));
        assert_eq!(defs.find_match(DefinitionKind::Source, "a", "default", None), Some(2));
        assert_eq!(defs.find_match(DefinitionKind::Source, "a", "red", Some("out")), Some(0));
        assert_eq!(defs.find_match(DefinitionKind::Source, "a", "blue", None), None);
    }

    #[test]
    fn untyped_and_unported_definitions_accept_anything() {
        let mut defs = Definitions::default();
        defs.push(DefinitionKind::Target, "a".into(), def(None, None));
        assert_eq!(defs.find_match(DefinitionKind::Target, "a", "blue", Some("p")), Some(0));
    }

    #[test]
    fn remove_by_type_keeps_others_until_empty() {
        let mut defs = Definitions::default();
        defs.push(DefinitionKind::Source, "a".into(), def(Some("red"), None));
        defs.push(DefinitionKind::Source, "a".into(), def(Some("blue"), None));
        assert!(!defs.remove(DefinitionKind::Source, "a", "red"));
        assert_eq!(defs.list(DefinitionKind::Source, "a").len(), 1);
        assert!(defs.remove(DefinitionKind::Source, "a", "blue"));
        assert!(defs.list(DefinitionKind::Source, "a").is_empty());
    }

    #[test]
    fn toggling_reports_previous_state() {
        let mut defs = Definitions::default();
        defs.push(DefinitionKind::Source, "a".into(), def(Some("default"), None));
        assert_eq!(
            defs.set_enabled(DefinitionKind::Source, "a", None, "default"),
            vec![(true, false)]
        );
        assert_eq!(
            defs.set_enabled(DefinitionKind::Source, "a", Some(true), "default"),
            vec![(false, true)]
        );
    }
}
