use super::Instance;
use crate::adapter::ElementAdapter;
use crate::connection::{Connection, ProxyRecord};
use crate::ids::{ConnectionId, ElementId, ElementRef, EndpointId};
use crate::params::EndpointOptions;
use crate::router::Router;
use serde_json::{Map, Value};

/// Parameter key marking an endpoint as a proxy stand-in.
pub const PROXY_ENDPOINT_PARAMETER: &str = "isProxyEndpoint";

impl<A: ElementAdapter, R: Router> Instance<A, R> {
    /// Substitutes the live endpoint at `index` of a connection with one on `proxy_el`.
    ///
    /// An existing proxy on the same element is reused; one on another element is detached
    /// (and so pruned) and replaced. The original endpoint is hidden and transiently detached,
    /// never destroyed, so [`unproxy_connection`](Self::unproxy_connection) can restore it.
    pub fn proxy_connection(
        &mut self,
        id: ConnectionId,
        index: usize,
        proxy_el: ElementRef,
        endpoint_factory: impl Fn(&Connection, usize) -> Value,
        anchor_factory: impl Fn(&Connection, usize) -> Value,
    ) -> bool {
        let Some(connection) = self.graph.connection(id) else {
            tracing::debug!(connection = %id, "proxy_connection: unknown connection");
            return false;
        };
        if index > 1 {
            return false;
        }
        let existing = connection.proxies[index];
        let original = existing.map_or(connection.endpoints[index], |r| r.original);
        let endpoint_spec = endpoint_factory(connection, index);
        let anchor_spec = anchor_factory(connection, index);

        let Some(original_element_id) = self.graph.endpoint(original).map(|e| e.element_id.clone())
        else {
            return false;
        };
        let proxy_el_id = self.get_id(proxy_el);

        let reusable = existing.and_then(|r| {
            self.graph
                .endpoint(r.proxy)
                .is_some_and(|e| e.element_id == proxy_el_id)
                .then_some(r.proxy)
        });
        let proxy = match reusable {
            Some(proxy) => proxy,
            None => {
                if let Some(stale) = existing {
                    self.detach_from_connection(stale.proxy, id, false);
                }
                let mut parameters = Map::new();
                parameters.insert(PROXY_ENDPOINT_PARAMETER.to_string(), Value::Bool(true));
                let params = EndpointOptions {
                    endpoint: Some(endpoint_spec),
                    anchor: Some(anchor_spec),
                    parameters,
                    ..Default::default()
                };
                self.add_endpoint(proxy_el, &params, None)
            }
        };

        if let Some(e) = self.graph.endpoint_mut(proxy) {
            e.delete_on_empty = true;
        }
        if let Some(c) = self.graph.connection_mut(id) {
            c.proxies[index] = Some(ProxyRecord { proxy, original });
        }

        self.source_or_target_changed(id, index, &original_element_id, &proxy_el_id, proxy_el);

        self.detach_from_connection(original, id, true);
        if let Some(e) = self.graph.endpoint_mut(proxy) {
            e.connections = vec![id];
        }
        if let Some(e) = self.graph.endpoint_mut(original) {
            e.visible = false;
        }
        if let Some(c) = self.graph.connection_mut(id) {
            c.endpoints[index] = proxy;
            c.visible = true;
        }
        self.refresh_connected_class(&original_element_id);

        tracing::debug!(connection = %id, index, proxy = %proxy, original = %original, "proxied");
        self.revalidate(proxy_el, None);
        true
    }

    /// Reverses [`proxy_connection`](Self::proxy_connection) at `index`; a no-op when that end
    /// is not proxied.
    pub fn unproxy_connection(&mut self, id: ConnectionId, index: usize) -> bool {
        let Some(connection) = self.graph.connection(id) else {
            return false;
        };
        let Some(ProxyRecord { proxy, original }) = connection.proxies.get(index).copied().flatten()
        else {
            return false;
        };
        let visible = connection.visible;
        let proxy_el_id = self
            .graph
            .endpoint(proxy)
            .map(|e| e.element_id.clone())
            .unwrap_or_else(|| {
                if index == 0 {
                    connection.source_id.clone()
                } else {
                    connection.target_id.clone()
                }
            });
        let Some((original_el, original_el_id)) = self
            .graph
            .endpoint(original)
            .map(|e| (e.element, e.element_id.clone()))
        else {
            return false;
        };

        if let Some(c) = self.graph.connection_mut(id) {
            c.endpoints[index] = original;
        }
        self.source_or_target_changed(id, index, &proxy_el_id, &original_el_id, original_el);

        self.detach_from_connection(proxy, id, false);
        if let Some(e) = self.graph.endpoint_mut(original) {
            e.add_connection(id);
            if visible {
                e.visible = true;
            }
        }
        if let Some(c) = self.graph.connection_mut(id) {
            c.proxies[index] = None;
        }
        self.refresh_connected_class(&original_el_id);
        tracing::debug!(connection = %id, index, "unproxied");
        true
    }

    /// Updates the mirrored element of one end after its endpoint moved elsewhere.
    ///
    /// The source end only changes when the id actually differs; the target end always does.
    pub(crate) fn source_or_target_changed(
        &mut self,
        id: ConnectionId,
        index: usize,
        original_id: &ElementId,
        new_id: &ElementId,
        new_el: ElementRef,
    ) {
        if index == 0 && original_id == new_id {
            return;
        }
        let Some(c) = self.graph.connection_mut(id) else {
            return;
        };
        if index == 0 {
            c.source_id = new_id.clone();
            c.source = new_el;
        } else {
            c.target_id = new_id.clone();
            c.target = new_el;
        }
        self.refresh_connected_class(original_id);
        self.refresh_connected_class(new_id);
    }

    /// The original endpoint standing behind a proxied end, if any.
    pub fn proxied_original(&self, id: ConnectionId, index: usize) -> Option<EndpointId> {
        self.graph
            .connection(id)?
            .proxies
            .get(index)
            .copied()
            .flatten()
            .map(|r| r.original)
    }
}
