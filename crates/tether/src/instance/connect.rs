use super::Instance;
use crate::adapter::ElementAdapter;
use crate::connection::Connection;
use crate::definitions::DefinitionKind;
use crate::error::{End, Error};
use crate::events::{ConnectionEventInfo, Event};
use crate::ids::{ConnectionId, ElementId, ElementRef, EndpointId};
use crate::params::{ConnectParams, EndpointOptions, Terminal};
use crate::router::Router;
use crate::types::{DEFAULT_TYPE, EndpointAndAnchorSpec, TypeKind};
use crate::Result;
use indexmap::IndexMap;

/// Whether two whitespace-separated scope lists share at least one tag.
pub fn scope_match(a: &str, b: &str) -> bool {
    a.split_whitespace()
        .any(|tag| b.split_whitespace().any(|other| other == tag))
}

/// A connect terminal after lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Resolved {
    Element(ElementRef),
    Endpoint(EndpointId),
}

impl<A: ElementAdapter, R: Router> Instance<A, R> {
    pub(crate) fn resolve_terminal(&self, terminal: &Terminal) -> Option<Resolved> {
        match terminal {
            Terminal::Element(el) => Some(Resolved::Element(*el)),
            Terminal::ElementId(id) => self
                .adapter
                .element_by_id(id.as_str())
                .map(Resolved::Element),
            Terminal::Endpoint(id) => self
                .graph
                .has_endpoint(*id)
                .then_some(Resolved::Endpoint(*id)),
            Terminal::Uuid(uuid) => self
                .graph
                .endpoint_by_uuid(uuid)
                .map(|e| Resolved::Endpoint(e.id())),
        }
    }

    /// Connects two terminals.
    ///
    /// `reference` is merged over `params`. Each end is either an explicit endpoint, an endpoint
    /// produced by the element's first matching source/target definition, or a fresh
    /// auto-deleting endpoint. A rejected request leaves the graph as it found it.
    pub fn connect(
        &mut self,
        params: &ConnectParams,
        reference: Option<&ConnectParams>,
    ) -> Result<ConnectionId> {
        let mut p = params.clone();
        if let Some(reference) = reference {
            p.merge_from(reference);
        }

        let ends = [
            p.source.as_ref().and_then(|t| self.resolve_terminal(t)),
            p.target.as_ref().and_then(|t| self.resolve_terminal(t)),
        ];
        let mut endpoints = ends.map(|end| match end {
            Some(Resolved::Endpoint(e)) => Some(e),
            _ => None,
        });

        if endpoints[0].is_some_and(|e| self.is_endpoint_full(e)) {
            return self.reject(Error::SourceEndpointFull, &[]);
        }
        if endpoints[1].is_some_and(|e| self.is_endpoint_full(e)) {
            return self.reject(Error::TargetEndpointFull, &[]);
        }

        if let Some(source) = endpoints[0].and_then(|e| self.graph.endpoint(e)) {
            if p.connection_type.is_none() {
                p.connection_type = source.connection_type.clone();
            }
            if !source.connector_overlays.is_empty() {
                p.overlays
                    .get_or_insert_with(Vec::new)
                    .extend(source.connector_overlays.iter().cloned());
            }
            if p.scope.is_none() {
                p.scope = Some(source.scope.clone());
            }
            if p.pointer_events.is_none() {
                p.pointer_events = source.connector_pointer_events.clone();
            }
        }

        let match_type = p
            .connection_type
            .clone()
            .unwrap_or_else(|| DEFAULT_TYPE.to_string());
        let mut created = Vec::new();
        for index in 0..2 {
            if endpoints[index].is_some() {
                continue;
            }
            let Some(Resolved::Element(el)) = ends[index] else {
                continue;
            };
            match self.endpoint_from_definition(el, index, &match_type, &mut p, &mut created) {
                Ok(Some(e)) => endpoints[index] = Some(e),
                Ok(None) => {}
                Err(err) => return self.reject(err, &created),
            }
        }

        if let [Some(s), Some(t)] = endpoints {
            let source_scope = self.endpoint_scope(s);
            let target_scope = self.endpoint_scope(t);
            if !scope_match(&source_scope, &target_scope) {
                return self.reject(
                    Error::ScopeMismatch {
                        source_scope,
                        target_scope,
                    },
                    &created,
                );
            }
        }

        let Some(source) = ends[0] else {
            return self.reject(Error::SourceMissing, &created);
        };
        let Some(target) = ends[1] else {
            return self.reject(Error::TargetMissing, &created);
        };

        let id = self.new_connection(&p, [source, target], endpoints);
        self.finalise_connection(id, p.fire_event != Some(false));
        Ok(id)
    }

    fn reject<T>(&mut self, err: Error, created: &[EndpointId]) -> Result<T> {
        tracing::warn!(error = %err, "connect rejected");
        for e in created {
            let unused = self
                .graph
                .endpoint(*e)
                .is_some_and(|ep| ep.connections.is_empty());
            if unused {
                self.delete_endpoint(*e);
            }
        }
        Err(err)
    }

    fn is_endpoint_full(&self, id: EndpointId) -> bool {
        self.graph.endpoint(id).is_some_and(|e| e.is_full())
    }

    fn endpoint_scope(&self, id: EndpointId) -> String {
        self.graph
            .endpoint(id)
            .map(|e| e.scope.clone())
            .unwrap_or_default()
    }

    /// Applies the element's first enabled definition matching the connection type and port.
    fn endpoint_from_definition(
        &mut self,
        el: ElementRef,
        index: usize,
        match_type: &str,
        p: &mut ConnectParams,
        created: &mut Vec<EndpointId>,
    ) -> Result<Option<EndpointId>> {
        let end = End::from_index(index);
        let kind = DefinitionKind::of_index(index);
        let element_id = self.get_id(el);
        let Some(def_index) =
            self.definitions
                .find_match(kind, element_id.as_str(), match_type, p.port(index))
        else {
            return Ok(None);
        };
        let Some(def) = self
            .definitions
            .list(kind, element_id.as_str())
            .get(def_index)
            .cloned()
        else {
            return Ok(None);
        };
        if !def.enabled {
            return Err(Error::DefinitionDisabled { end });
        }

        let cached = def.endpoint.filter(|e| self.graph.has_endpoint(*e));
        let endpoint = match cached {
            Some(e) => e,
            None => {
                let params = def.def.clone().merged(&p.endpoint_overrides(index));
                let e = self.add_endpoint(el, &params, None);
                created.push(e);
                e
            }
        };
        if self.is_endpoint_full(endpoint) {
            return Err(Error::DefinitionEndpointFull { end });
        }

        if p.scope.is_none() {
            p.scope = def.def.scope.clone();
        }

        if def.unique_endpoint {
            match cached {
                None => {
                    if let Some(d) =
                        self.definitions
                            .get_mut(kind, element_id.as_str(), def_index)
                    {
                        d.endpoint = Some(endpoint);
                    }
                    if let Some(e) = self.graph.endpoint_mut(endpoint) {
                        e.delete_on_empty = false;
                    }
                }
                Some(cached) => {
                    if let Some(e) = self.graph.endpoint_mut(endpoint) {
                        e.final_endpoint = Some(cached);
                    }
                }
            }
        } else if let Some(e) = self.graph.endpoint_mut(endpoint) {
            e.delete_on_empty = true;
        }

        if index == 0 {
            if let Some(overlays) = &def.def.connector_overlays {
                p.overlays
                    .get_or_insert_with(Vec::new)
                    .extend(overlays.iter().cloned());
            }
        }
        Ok(Some(endpoint))
    }

    /// An auto-deleting endpoint for an end that has neither an explicit endpoint nor a
    /// matching definition.
    pub(crate) fn make_connection_endpoint(
        &mut self,
        el: ElementRef,
        index: usize,
        p: &ConnectParams,
        spec: &EndpointAndAnchorSpec,
    ) -> EndpointId {
        let mut params = EndpointOptions {
            anchor: spec.anchors[index]
                .clone()
                .or_else(|| self.defaults.anchors[index].clone()),
            endpoint: spec.endpoints[index]
                .clone()
                .or_else(|| self.defaults.endpoints[index].clone()),
            paint_style: self.defaults.endpoint_styles[index].clone(),
            hover_paint_style: self.defaults.endpoint_hover_styles[index].clone(),
            scope: p.scope.clone(),
            delete_on_empty: Some(true),
            ..Default::default()
        };
        params.merge_from(&p.endpoint_overrides(index));
        self.add_endpoint(el, &params, None)
    }

    fn new_connection(
        &mut self,
        p: &ConnectParams,
        ends: [Resolved; 2],
        endpoints: [Option<EndpointId>; 2],
    ) -> ConnectionId {
        let type_names = p.connection_type.as_deref().unwrap_or_default();
        let spec = self
            .types
            .derive_endpoint_and_anchor_spec(type_names, false);

        let resolved: [EndpointId; 2] =
            std::array::from_fn(|index| match (endpoints[index], ends[index]) {
                (Some(e), _) | (None, Resolved::Endpoint(e)) => e,
                (None, Resolved::Element(el)) => self.make_connection_endpoint(el, index, p, &spec),
            });

        let typed = self
            .types
            .resolve(&format!("{DEFAULT_TYPE} {type_names}"), TypeKind::Connection);
        let descriptor = typed.as_ref().map(|t| &t.descriptor);

        let mut overlays = IndexMap::new();
        let specs = self
            .defaults
            .connection_overlays
            .iter()
            .chain(p.overlays.iter().flatten());
        if let Some(t) = &typed {
            for (id, o) in &t.overlays {
                overlays.insert(id.clone(), o.clone());
            }
        }
        for spec in specs {
            let full = spec.to_full();
            overlays.insert(full.id().to_string(), full);
        }

        let mut parameters = descriptor.map(|d| d.parameters.clone()).unwrap_or_default();
        for (k, v) in &p.parameters {
            parameters.insert(k.clone(), v.clone());
        }

        let (source, source_id) = self.endpoint_element(resolved[0]);
        let (target, target_id) = self.endpoint_element(resolved[1]);

        let id = ConnectionId::from_stamp(self.stamp.next());
        let connection = Connection {
            id,
            endpoints: resolved,
            source,
            target,
            source_id,
            target_id,
            scope: p
                .scope
                .clone()
                .or_else(|| descriptor.and_then(|d| d.scope.clone()))
                .unwrap_or_else(|| self.defaults.scope.clone()),
            connection_type: p.connection_type.clone(),
            connector: p
                .connector
                .clone()
                .or_else(|| descriptor.and_then(|d| d.connector.clone()))
                .unwrap_or_else(|| self.defaults.connector.clone()),
            paint_style: p
                .paint_style
                .clone()
                .or_else(|| descriptor.and_then(|d| d.paint_style.clone()))
                .unwrap_or_else(|| self.defaults.paint_style.clone()),
            hover_paint_style: p
                .hover_paint_style
                .clone()
                .or_else(|| descriptor.and_then(|d| d.hover_paint_style.clone()))
                .or_else(|| self.defaults.hover_paint_style.clone()),
            css_class: descriptor.and_then(|d| d.css_class.clone()),
            overlays,
            pointer_events: p.pointer_events.clone(),
            parameters,
            proxies: [None, None],
            visible: true,
            pending: true,
            detachable: p
                .detachable
                .or_else(|| descriptor.and_then(|d| d.detachable))
                .unwrap_or(self.defaults.connections_detachable),
            suspended_endpoint: None,
            before_detach: p.before_detach.clone(),
        };

        for e in resolved {
            if let Some(ep) = self.graph.endpoint_mut(e) {
                ep.add_connection(id);
            }
        }
        self.graph.insert_connection(connection);
        id
    }

    fn endpoint_element(&self, id: EndpointId) -> (ElementRef, ElementId) {
        match self.graph.endpoint(id) {
            Some(e) => (e.element, e.element_id.clone()),
            None => (ElementRef::new(0), ElementId::new("")),
        }
    }

    /// Registers the connection, informs the router, redraws from the source and announces it.
    fn finalise_connection(&mut self, id: ConnectionId, fire_event: bool) {
        let Some(connection) = self.graph.connection_mut(id) else {
            return;
        };
        connection.pending = false;
        let suspended = connection.suspended_endpoint.is_some();
        let source_endpoint = connection.endpoints[0];
        if !suspended {
            self.graph.register_connection(id);
        }
        if let Some(e) = self.graph.endpoint_mut(source_endpoint) {
            e.is_temporary_source = false;
        }

        let Some(connection) = self.graph.connection(id) else {
            return;
        };
        self.router.new_connection(connection);
        let info = ConnectionEventInfo::of(connection);

        self.refresh_connected_class(&info.source_id);
        self.refresh_connected_class(&info.target_id);
        self.draw(info.source, None, None, false);

        tracing::debug!(
            connection = %id,
            source = %info.source_id,
            target = %info.target_id,
            "connection established"
        );
        if fire_event {
            self.events.fire(Event::ConnectionCreated(info));
        }
    }
}
