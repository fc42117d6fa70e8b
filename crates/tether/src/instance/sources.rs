use super::{ATTRIBUTE_SCOPE_PREFIX, ATTRIBUTE_SOURCE, ATTRIBUTE_TARGET, Instance};
use crate::adapter::ElementAdapter;
use crate::definitions::{ANY_TYPE, Definition, DefinitionKind, DefinitionOptions};
use crate::ids::ElementRef;
use crate::router::Router;
use crate::types::DEFAULT_TYPE;

fn attribute(kind: DefinitionKind) -> &'static str {
    match kind {
        DefinitionKind::Source => ATTRIBUTE_SOURCE,
        DefinitionKind::Target => ATTRIBUTE_TARGET,
    }
}

fn disabled_class(kind: DefinitionKind) -> String {
    format!("tether-{}-disabled", kind.as_str())
}

impl<A: ElementAdapter, R: Router> Instance<A, R> {
    /// Declares `el` a connection source: connections dragged or connected from it use an
    /// endpoint built from `options`.
    pub fn make_source(&mut self, el: ElementRef, options: &DefinitionOptions) {
        self.make_definition(DefinitionKind::Source, el, options);
    }

    /// Declares `el` a connection target.
    pub fn make_target(&mut self, el: ElementRef, options: &DefinitionOptions) {
        self.make_definition(DefinitionKind::Target, el, options);
    }

    fn make_definition(&mut self, kind: DefinitionKind, el: ElementRef, options: &DefinitionOptions) {
        let mut def = options.endpoint.clone();
        let connection_type = def
            .connection_type
            .get_or_insert_with(|| DEFAULT_TYPE.to_string())
            .clone();
        let max_connections = def.max_connections.unwrap_or(-1);
        def.max_connections = Some(max_connections);

        match kind {
            DefinitionKind::Source => {
                let spec = self
                    .types
                    .derive_endpoint_and_anchor_spec(&connection_type, false);
                if def.endpoint.is_none() {
                    def.endpoint = spec.endpoints[0].clone();
                }
                if def.anchor.is_none() {
                    def.anchor = spec.anchors[0].clone();
                }
                def.is_source = Some(true);
            }
            DefinitionKind::Target => {
                def.is_target = Some(true);
            }
        }

        let id = self.ensure_managed(el, None, false);
        let attr = attribute(kind);
        self.adapter.set_attribute(el, attr, "");
        let scope = def
            .scope
            .clone()
            .unwrap_or_else(|| self.defaults.scope.clone());
        let scope_tags: Vec<String> = scope.split_whitespace().map(str::to_string).collect();
        for tag in &scope_tags {
            self.adapter
                .set_attribute(el, &format!("{ATTRIBUTE_SCOPE_PREFIX}{tag}"), "");
        }
        self.adapter
            .set_attribute(el, &format!("{attr}-{connection_type}"), "");

        let rank = match kind {
            DefinitionKind::Target if options.rank.is_none() && self.groups.is_group(&id) => Some(-1),
            _ => options.rank,
        };

        let mut definition = Definition {
            def,
            unique_endpoint: options.unique_endpoint,
            max_connections,
            enabled: true,
            endpoint: None,
            rank,
            scope_tags,
        };

        if options.create_endpoint {
            definition.unique_endpoint = true;
            let endpoint = self.add_endpoint(el, &definition.def, None);
            if let Some(e) = self.graph.endpoint_mut(endpoint) {
                e.delete_on_empty = false;
            }
            definition.endpoint = Some(endpoint);
        }

        tracing::debug!(element = %id, kind = kind.as_str(), %connection_type, "definition added");
        self.definitions.push(kind, id, definition);
    }

    /// Removes the source definitions of `connection_type` from `el` (all of them when `None`
    /// or `"*"`).
    pub fn unmake_source(&mut self, el: ElementRef, connection_type: Option<&str>) {
        self.unmake(DefinitionKind::Source, el, connection_type);
    }

    pub fn unmake_target(&mut self, el: ElementRef, connection_type: Option<&str>) {
        self.unmake(DefinitionKind::Target, el, connection_type);
    }

    fn unmake(&mut self, kind: DefinitionKind, el: ElementRef, connection_type: Option<&str>) {
        let Some(id) = self.id_of(el) else {
            return;
        };
        if self.definitions.list(kind, id.as_str()).is_empty() {
            return;
        }
        let connection_type = connection_type.unwrap_or(ANY_TYPE);
        let before: Vec<(Option<String>, Vec<String>)> = self
            .definitions
            .list(kind, id.as_str())
            .iter()
            .map(|d| (d.connection_type().map(str::to_string), d.scope_tags.clone()))
            .collect();
        let attr = attribute(kind);
        if self.definitions.remove(kind, id.as_str(), connection_type) {
            self.adapter.remove_attribute(el, attr);
        }

        let other = match kind {
            DefinitionKind::Source => DefinitionKind::Target,
            DefinitionKind::Target => DefinitionKind::Source,
        };
        let remaining = self.definitions.list(kind, id.as_str());
        let others = self.definitions.list(other, id.as_str());
        let mut stale = Vec::new();
        for (removed_type, tags) in &before {
            if let Some(t) = removed_type {
                if !remaining.iter().any(|d| d.connection_type() == Some(t.as_str())) {
                    stale.push(format!("{attr}-{t}"));
                }
            }
            for tag in tags {
                let in_use = remaining
                    .iter()
                    .chain(others)
                    .any(|d| d.scope_tags.contains(tag));
                if !in_use {
                    stale.push(format!("{ATTRIBUTE_SCOPE_PREFIX}{tag}"));
                }
            }
        }
        for name in stale {
            self.adapter.remove_attribute(el, &name);
        }
    }

    /// Unmakes every element carrying the source attribute.
    pub fn unmake_every_source(&mut self, connection_type: Option<&str>) {
        self.unmake_every(DefinitionKind::Source, connection_type);
    }

    pub fn unmake_every_target(&mut self, connection_type: Option<&str>) {
        self.unmake_every(DefinitionKind::Target, connection_type);
    }

    fn unmake_every(&mut self, kind: DefinitionKind, connection_type: Option<&str>) {
        let selector = format!("[{}]", attribute(kind));
        for el in self.adapter.select(&selector) {
            self.unmake(kind, el, connection_type);
        }
    }

    /// Enables or disables the source definitions accepting `connection_type` (`"default"` when
    /// `None`). Returns the states they had before.
    pub fn set_source_enabled(
        &mut self,
        el: ElementRef,
        enabled: bool,
        connection_type: Option<&str>,
    ) -> Vec<bool> {
        self.set_enabled(DefinitionKind::Source, el, Some(enabled), connection_type)
    }

    pub fn set_target_enabled(
        &mut self,
        el: ElementRef,
        enabled: bool,
        connection_type: Option<&str>,
    ) -> Vec<bool> {
        self.set_enabled(DefinitionKind::Target, el, Some(enabled), connection_type)
    }

    /// Flips the enabled state; returns whether the source is enabled afterwards.
    pub fn toggle_source_enabled(&mut self, el: ElementRef, connection_type: Option<&str>) -> bool {
        self.set_enabled(DefinitionKind::Source, el, None, connection_type);
        self.is_source_enabled(el, connection_type)
    }

    pub fn toggle_target_enabled(&mut self, el: ElementRef, connection_type: Option<&str>) -> bool {
        self.set_enabled(DefinitionKind::Target, el, None, connection_type);
        self.is_target_enabled(el, connection_type)
    }

    fn set_enabled(
        &mut self,
        kind: DefinitionKind,
        el: ElementRef,
        state: Option<bool>,
        connection_type: Option<&str>,
    ) -> Vec<bool> {
        let Some(id) = self.id_of(el) else {
            return Vec::new();
        };
        let changes = self.definitions.set_enabled(
            kind,
            id.as_str(),
            state,
            connection_type.unwrap_or(DEFAULT_TYPE),
        );
        let class = disabled_class(kind);
        for (_, now) in &changes {
            if *now {
                self.adapter.remove_class(el, &class);
            } else {
                self.adapter.add_class(el, &class);
            }
        }
        changes.into_iter().map(|(previous, _)| previous).collect()
    }

    pub fn is_source(&self, el: ElementRef, connection_type: Option<&str>) -> bool {
        self.find_first_source_definition(el, connection_type).is_some()
    }

    pub fn is_target(&self, el: ElementRef, connection_type: Option<&str>) -> bool {
        self.find_first_target_definition(el, connection_type).is_some()
    }

    pub fn is_source_enabled(&self, el: ElementRef, connection_type: Option<&str>) -> bool {
        self.find_first_source_definition(el, connection_type)
            .is_some_and(Definition::is_enabled)
    }

    pub fn is_target_enabled(&self, el: ElementRef, connection_type: Option<&str>) -> bool {
        self.find_first_target_definition(el, connection_type)
            .is_some_and(Definition::is_enabled)
    }

    /// The first source definition on `el`, or the first of `connection_type` when given.
    pub fn find_first_source_definition(
        &self,
        el: ElementRef,
        connection_type: Option<&str>,
    ) -> Option<&Definition> {
        let id = self.id_of(el)?;
        self.definitions
            .find_first(DefinitionKind::Source, id.as_str(), connection_type)
    }

    pub fn find_first_target_definition(
        &self,
        el: ElementRef,
        connection_type: Option<&str>,
    ) -> Option<&Definition> {
        let id = self.id_of(el)?;
        self.definitions
            .find_first(DefinitionKind::Target, id.as_str(), connection_type)
    }

    fn definition_scope(&self, kind: DefinitionKind, el: ElementRef) -> Option<String> {
        let id = self.id_of(el)?;
        self.definitions
            .list(kind, id.as_str())
            .first()
            .and_then(|d| d.scope().map(str::to_string))
    }

    /// The scope of the element's first source definition.
    pub fn get_source_scope(&self, el: ElementRef) -> Option<String> {
        self.definition_scope(DefinitionKind::Source, el)
    }

    pub fn get_target_scope(&self, el: ElementRef) -> Option<String> {
        self.definition_scope(DefinitionKind::Target, el)
    }

    /// The source scope, falling back to the target scope.
    pub fn get_scope(&self, el: ElementRef) -> Option<String> {
        self.get_source_scope(el)
            .or_else(|| self.get_target_scope(el))
    }

    pub fn set_source_scope(&mut self, el: ElementRef, scope: &str) {
        if let Some(id) = self.id_of(el) {
            self.definitions
                .set_scope(DefinitionKind::Source, id.as_str(), scope);
        }
    }

    pub fn set_target_scope(&mut self, el: ElementRef, scope: &str) {
        if let Some(id) = self.id_of(el) {
            self.definitions
                .set_scope(DefinitionKind::Target, id.as_str(), scope);
        }
    }

    /// Sets the scope of every source and target definition on `el`.
    pub fn set_scope(&mut self, el: ElementRef, scope: &str) {
        self.set_source_scope(el, scope);
        self.set_target_scope(el, scope);
    }
}
