use super::Instance;
use crate::adapter::ElementAdapter;
use crate::connection::Connection;
use crate::ids::{ConnectionId, ElementRef, EndpointId};
use crate::router::Router;
use crate::selection::{
    ConnectionSelection, EndpointSelection, Filter, SelectEndpointOptions, SelectOptions,
};
use indexmap::IndexMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visibility {
    Show,
    Hide,
    Toggle,
}

impl<A: ElementAdapter, R: Router> Instance<A, R> {
    /// Registered connections, in creation order.
    pub fn all_connections(&self) -> &[ConnectionId] {
        self.graph.connections()
    }

    /// Connections passing the scope, source and target filters, in creation order.
    ///
    /// An unset scope means the default scope. Source and target are compared against the
    /// original element of a proxied end.
    pub fn get_connections(&self, options: &SelectOptions) -> Vec<ConnectionId> {
        self.matching_connections(options).map(|c| c.id).collect()
    }

    /// [`get_connections`](Self::get_connections) grouped by connection scope.
    pub fn get_connections_by_scope(
        &self,
        options: &SelectOptions,
    ) -> IndexMap<String, Vec<ConnectionId>> {
        let mut out: IndexMap<String, Vec<ConnectionId>> = IndexMap::new();
        for c in self.matching_connections(options) {
            out.entry(c.scope.clone()).or_default().push(c.id);
        }
        out
    }

    fn matching_connections<'a>(
        &'a self,
        options: &'a SelectOptions,
    ) -> impl Iterator<Item = &'a Connection> + use<'a, A, R> {
        let scopes = if options.scope.is_unset() {
            Filter::scope(&self.defaults.scope)
        } else {
            options.scope.clone()
        };
        self.graph.iter_connections().filter(move |c| {
            scopes.matches(c.scope.as_str(), false)
                && options
                    .source
                    .matches(self.graph.original_element_id(c, 0), false)
                && options
                    .target
                    .matches(self.graph.original_element_id(c, 1), false)
        })
    }

    /// Like [`get_connections`](Self::get_connections), but an unset scope matches every scope.
    pub fn select(&self, options: &SelectOptions) -> ConnectionSelection {
        let mut options = options.clone();
        if options.scope.is_unset() {
            options.scope = Filter::Any;
        }
        ConnectionSelection::new(self.get_connections(&options))
    }

    /// Endpoints filtered by scope and by owning element.
    ///
    /// With no element, source or target filter every element qualifies. A populated source
    /// (target) filter only admits endpoints flagged as sources (targets).
    pub fn select_endpoints(&self, options: &SelectEndpointOptions) -> EndpointSelection {
        let scopes = if options.scope.is_unset() {
            Filter::Any
        } else {
            options.scope.clone()
        };
        let no_element_filters =
            options.element.is_unset() && options.source.is_unset() && options.target.is_unset();
        let (elements, sources, targets) = if no_element_filters {
            (Filter::Any, Filter::Any, Filter::Any)
        } else {
            (
                options.element.clone(),
                options.source.clone(),
                options.target.clone(),
            )
        };

        let mut out: Vec<EndpointId> = Vec::new();
        for id in self.graph.elements_with_endpoints() {
            let either = elements.matches(id, true);
            let source = sources.matches(id, true);
            let target = targets.matches(id, true);
            if !(either || source || target) {
                continue;
            }
            for ep in self.graph.endpoints_for(id.as_str()) {
                if !scopes.matches(ep.scope.as_str(), true) {
                    continue;
                }
                if (sources.is_populated() && !ep.is_source)
                    || (targets.is_populated() && !ep.is_target)
                {
                    continue;
                }
                out.push(ep.id);
            }
        }
        EndpointSelection::new(out)
    }

    /// Shows every connection on the element's endpoints. With `change_endpoints` the endpoints
    /// are shown too, and a connection is only shown when its other endpoint is visible.
    pub fn show(&mut self, el: ElementRef, change_endpoints: bool) {
        self.set_visibility(el, Visibility::Show, change_endpoints);
    }

    pub fn hide(&mut self, el: ElementRef, change_endpoints: bool) {
        self.set_visibility(el, Visibility::Hide, change_endpoints);
    }

    pub fn toggle_visible(&mut self, el: ElementRef, change_endpoints: bool) {
        self.set_visibility(el, Visibility::Toggle, change_endpoints);
    }

    fn set_visibility(&mut self, el: ElementRef, mode: Visibility, change_endpoints: bool) {
        let id = self.get_id(el);
        for endpoint in self.graph.endpoint_ids_for(id.as_str()) {
            let connections = self
                .graph
                .endpoint(endpoint)
                .map(|e| e.connections.clone())
                .unwrap_or_default();

            for c in connections {
                let Some(connection) = self.graph.connection(c) else {
                    continue;
                };
                let visible = match mode {
                    Visibility::Show if change_endpoints => {
                        let other = if connection.source_id == id { 1 } else { 0 };
                        let other_visible = self
                            .graph
                            .endpoint(connection.endpoints[other])
                            .is_some_and(|e| e.visible);
                        if !other_visible {
                            continue;
                        }
                        true
                    }
                    Visibility::Show => true,
                    Visibility::Hide => false,
                    Visibility::Toggle => !connection.visible,
                };
                if let Some(connection) = self.graph.connection_mut(c) {
                    connection.visible = visible;
                }
            }

            if change_endpoints {
                if let Some(e) = self.graph.endpoint_mut(endpoint) {
                    e.visible = match mode {
                        Visibility::Show => true,
                        Visibility::Hide => false,
                        Visibility::Toggle => !e.visible,
                    };
                }
            }
        }
    }
}
