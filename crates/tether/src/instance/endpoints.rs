use super::Instance;
use crate::adapter::ElementAdapter;
use crate::endpoint::Endpoint;
use crate::ids::{ConnectionId, ElementId, ElementRef, EndpointId};
use crate::params::{DeleteOptions, EndpointOptions};
use crate::router::{AnchorInput, Router};
use crate::types::{TypeDescriptor, TypeKind};
use serde_json::Value;

impl<A: ElementAdapter, R: Router> Instance<A, R> {
    /// Adds an endpoint to `el`, managing the element first if needed.
    ///
    /// `params` wins over `reference`; instance defaults fill whatever both leave empty. The
    /// anchor is placed and painted right away unless drawing is suspended.
    pub fn add_endpoint(
        &mut self,
        el: ElementRef,
        params: &EndpointOptions,
        reference: Option<&EndpointOptions>,
    ) -> EndpointId {
        let mut p = reference.cloned().unwrap_or_default();
        p.merge_from(params);
        if p.endpoint.is_none() {
            p.endpoint = Some(self.defaults.endpoint.clone());
        }
        if p.paint_style.is_none() {
            p.paint_style = Some(self.defaults.endpoint_style.clone());
        }

        let recalc = !self.suspend_drawing;
        let element_id = self.ensure_managed(el, None, recalc);
        let id = self.insert_endpoint(el, element_id, &p);

        if !self.suspend_drawing {
            self.paint_endpoint(id);
        }
        id
    }

    pub fn add_endpoints(
        &mut self,
        el: ElementRef,
        endpoints: &[EndpointOptions],
        reference: Option<&EndpointOptions>,
    ) -> Vec<EndpointId> {
        endpoints
            .iter()
            .map(|params| self.add_endpoint(el, params, reference))
            .collect()
    }

    /// Allocates and registers an endpoint without placing or painting it.
    pub fn new_endpoint(&mut self, el: ElementRef, params: &EndpointOptions) -> EndpointId {
        let element_id = self.ensure_managed(el, None, false);
        self.insert_endpoint(el, element_id, params)
    }

    fn insert_endpoint(
        &mut self,
        el: ElementRef,
        element_id: ElementId,
        p: &EndpointOptions,
    ) -> EndpointId {
        let typed = p
            .endpoint_type
            .as_deref()
            .and_then(|names| self.types.resolve(names, TypeKind::Endpoint));
        let descriptor = typed.as_ref().map(|t| &t.descriptor);
        let from_type = |pick: fn(&TypeDescriptor) -> Option<Value>| {
            descriptor.and_then(pick)
        };

        let mut parameters = descriptor.map(|d| d.parameters.clone()).unwrap_or_default();
        for (k, v) in &p.parameters {
            parameters.insert(k.clone(), v.clone());
        }

        let id = EndpointId::from_stamp(self.stamp.next());
        let endpoint = Endpoint {
            id,
            uuid: p.uuid.clone(),
            element: el,
            element_id,
            scope: p
                .scope
                .clone()
                .or_else(|| descriptor.and_then(|d| d.scope.clone()))
                .unwrap_or_else(|| self.defaults.scope.clone()),
            max_connections: p
                .max_connections
                .or_else(|| descriptor.and_then(|d| d.max_connections))
                .unwrap_or(self.defaults.max_connections),
            delete_on_empty: p.delete_on_empty.unwrap_or(false),
            connections: Vec::new(),
            connection_type: p.connection_type.clone(),
            connector_overlays: p.connector_overlays.clone().unwrap_or_default(),
            connector_pointer_events: p.connector_pointer_events.clone(),
            anchor: p
                .anchor
                .clone()
                .or_else(|| from_type(|d| d.anchor.clone()))
                .or_else(|| Some(self.defaults.anchor.clone())),
            shape: p.endpoint.clone().or_else(|| from_type(|d| d.endpoint.clone())),
            paint_style: p
                .paint_style
                .clone()
                .or_else(|| from_type(|d| d.endpoint_style.clone())),
            hover_paint_style: p
                .hover_paint_style
                .clone()
                .or_else(|| from_type(|d| d.endpoint_hover_style.clone()))
                .or_else(|| self.defaults.endpoint_hover_style.clone()),
            port_id: p.port_id.clone(),
            parameters,
            is_source: p.is_source.unwrap_or(false),
            is_target: p.is_target.unwrap_or(false),
            is_temporary_source: false,
            visible: p.visible.unwrap_or(true),
            final_endpoint: None,
            before_detach: p.before_detach.clone(),
            placement: None,
        };
        self.graph.insert_endpoint(endpoint);
        id
    }

    /// Places the endpoint's anchor against its element's cached geometry and paints it.
    pub(crate) fn paint_endpoint(&mut self, id: EndpointId) {
        let Some(endpoint) = self.graph.endpoint(id) else {
            return;
        };
        let element_id = endpoint.element_id.as_str();
        let Some(geometry) = self
            .viewport
            .position(element_id)
            .or_else(|| self.managed.get(element_id).and_then(|m| m.info))
        else {
            return;
        };
        let input = AnchorInput {
            element: geometry,
            rotation: self.get_rotation(element_id),
            timestamp: self.suspended_at,
        };
        let placement = self.router.compute_anchor(endpoint, &input);
        self.router.paint_endpoint(endpoint, &placement);
        if let Some(endpoint) = self.graph.endpoint_mut(id) {
            endpoint.placement = Some(placement);
        }
    }

    /// The endpoints on `el`, in creation order.
    pub fn get_endpoints(&self, el: ElementRef) -> Vec<&Endpoint> {
        match self.id_of(el) {
            Some(id) => self.graph.endpoints_for(id.as_str()).collect(),
            None => Vec::new(),
        }
    }

    /// Looks an endpoint up by its uuid.
    pub fn get_endpoint(&self, uuid: &str) -> Option<&Endpoint> {
        self.graph.endpoint_by_uuid(uuid)
    }

    /// Removes the endpoint from every index and tells the router; connections are untouched.
    pub(crate) fn unregister_endpoint(&mut self, id: EndpointId) -> Option<Endpoint> {
        let endpoint = self.graph.unregister_endpoint(id)?;
        self.router.delete_endpoint(&endpoint);
        self.definitions.forget_endpoint(id);
        Some(endpoint)
    }

    /// Deletes the endpoint when it auto-deletes and has no connection left.
    pub fn maybe_prune_endpoint(&mut self, id: EndpointId) -> bool {
        let prune = self
            .graph
            .endpoint(id)
            .is_some_and(|e| e.delete_on_empty && e.connections.is_empty());
        if prune {
            self.delete_endpoint(id);
        }
        prune
    }

    /// Drops `connection` from the endpoint's list; a non-transient detach prunes an emptied
    /// auto-deleting endpoint.
    pub(crate) fn detach_from_connection(
        &mut self,
        endpoint: EndpointId,
        connection: ConnectionId,
        transient: bool,
    ) {
        if let Some(e) = self.graph.endpoint_mut(endpoint) {
            e.remove_connection(connection);
        }
        if !transient {
            self.maybe_prune_endpoint(endpoint);
        }
    }

    /// Deletes an endpoint and, afterwards, every connection it took part in.
    pub fn delete_endpoint(&mut self, id: EndpointId) -> bool {
        let Some(endpoint) = self.graph.endpoint(id) else {
            tracing::debug!(endpoint = %id, "delete_endpoint: unknown endpoint");
            return false;
        };
        let mut connections = endpoint.connections.clone();
        for c in &connections {
            self.detach_from_connection(id, *c, true);
        }
        for c in self.graph.connections_proxying(id) {
            if !connections.contains(&c) {
                connections.push(c);
            }
        }

        self.unregister_endpoint(id);

        let options = DeleteOptions {
            force: true,
            endpoint_to_ignore: Some(id),
            ..Default::default()
        };
        for c in connections {
            self.delete_connection(c, &options);
        }
        true
    }

    pub fn delete_endpoint_by_uuid(&mut self, uuid: &str) -> bool {
        match self.graph.endpoint_by_uuid(uuid).map(Endpoint::id) {
            Some(id) => self.delete_endpoint(id),
            None => false,
        }
    }

    /// Deletes every endpoint on `el`, and on its descendants when `recurse`.
    pub fn remove_all_endpoints(&mut self, el: ElementRef, recurse: bool) {
        let mut affected = Vec::new();
        self.remove_all_endpoints_into(el, recurse, &mut affected);
    }

    pub(crate) fn remove_all_endpoints_into(
        &mut self,
        el: ElementRef,
        recurse: bool,
        affected: &mut Vec<ElementRef>,
    ) {
        let id = self.get_id(el);
        let endpoints = self.graph.endpoint_ids_for(id.as_str());
        if !endpoints.is_empty() {
            affected.push(el);
            for e in endpoints {
                self.delete_endpoint(e);
            }
        }
        self.graph.forget_element(id.as_str());

        if recurse {
            for child in self.adapter.children(el) {
                self.remove_all_endpoints_into(child, true, affected);
            }
        }
    }
}
