//! Endpoint and connection storage.
//!
//! Records live in central handle→record maps; everything else refers to them by id, so removing
//! a record never leaves a dangling back-reference behind.

use crate::connection::Connection;
use crate::endpoint::Endpoint;
use crate::ids::{ConnectionId, ElementId, EndpointId};
use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;

type HashMap<K, V> = hashbrown::HashMap<K, V, FxBuildHasher>;

#[derive(Debug, Clone, Default)]
pub struct Graph {
    endpoints: HashMap<EndpointId, Endpoint>,
    endpoints_by_element: IndexMap<ElementId, Vec<EndpointId>>,
    endpoints_by_uuid: HashMap<String, EndpointId>,

    // Registration order is observable through `connections()`.
    connections: Vec<ConnectionId>,
    connection_records: HashMap<ConnectionId, Connection>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn endpoint(&self, id: EndpointId) -> Option<&Endpoint> {
        self.endpoints.get(&id)
    }

    pub(crate) fn endpoint_mut(&mut self, id: EndpointId) -> Option<&mut Endpoint> {
        self.endpoints.get_mut(&id)
    }

    pub fn endpoint_by_uuid(&self, uuid: &str) -> Option<&Endpoint> {
        let id = self.endpoints_by_uuid.get(uuid)?;
        self.endpoints.get(id)
    }

    pub fn endpoint_count(&self) -> usize {
        self.endpoints.len()
    }

    pub fn has_endpoint(&self, id: EndpointId) -> bool {
        self.endpoints.contains_key(&id)
    }

    pub(crate) fn insert_endpoint(&mut self, endpoint: Endpoint) {
        let id = endpoint.id;
        if let Some(uuid) = &endpoint.uuid {
            self.endpoints_by_uuid.insert(uuid.clone(), id);
        }
        let list = self
            .endpoints_by_element
            .entry(endpoint.element_id.clone())
            .or_default();
        if !list.contains(&id) {
            list.push(id);
        }
        self.endpoints.insert(id, endpoint);
    }

    /// Drops the endpoint from every index and hands the record back.
    pub(crate) fn unregister_endpoint(&mut self, id: EndpointId) -> Option<Endpoint> {
        let endpoint = self.endpoints.remove(&id)?;
        if let Some(uuid) = &endpoint.uuid {
            if self.endpoints_by_uuid.get(uuid) == Some(&id) {
                self.endpoints_by_uuid.remove(uuid);
            }
        }
        if let Some(list) = self.endpoints_by_element.get_mut(&endpoint.element_id) {
            list.retain(|e| *e != id);
            if list.is_empty() {
                self.endpoints_by_element.shift_remove(&endpoint.element_id);
            }
        }
        Some(endpoint)
    }

    pub fn endpoints_for<'a>(
        &'a self,
        element_id: &str,
    ) -> impl Iterator<Item = &'a Endpoint> + use<'a> {
        self.endpoints_by_element
            .get(element_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.endpoints.get(id))
    }

    /// A snapshot of the endpoint ids on `element_id`, safe to iterate while mutating.
    pub fn endpoint_ids_for(&self, element_id: &str) -> Vec<EndpointId> {
        self.endpoints_by_element
            .get(element_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn elements_with_endpoints(&self) -> impl Iterator<Item = &ElementId> {
        self.endpoints_by_element.keys()
    }

    pub(crate) fn forget_element(&mut self, element_id: &str) {
        self.endpoints_by_element.shift_remove(element_id);
    }

    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.connection_records.get(&id)
    }

    pub(crate) fn connection_mut(&mut self, id: ConnectionId) -> Option<&mut Connection> {
        self.connection_records.get_mut(&id)
    }

    /// The registered connections, in registration order.
    pub fn connections(&self) -> &[ConnectionId] {
        &self.connections
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn iter_connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections
            .iter()
            .filter_map(|id| self.connection_records.get(id))
    }

    pub fn is_registered(&self, id: ConnectionId) -> bool {
        self.connections.contains(&id)
    }

    pub(crate) fn insert_connection(&mut self, connection: Connection) {
        self.connection_records.insert(connection.id, connection);
    }

    pub(crate) fn register_connection(&mut self, id: ConnectionId) {
        if self.connection_records.contains_key(&id) && !self.connections.contains(&id) {
            self.connections.push(id);
        }
    }

    /// Removes the connection by identity from the list and destroys the record.
    pub(crate) fn remove_connection(&mut self, id: ConnectionId) -> Option<Connection> {
        if let Some(idx) = self.connections.iter().position(|c| *c == id) {
            self.connections.remove(idx);
        }
        self.connection_records.remove(&id)
    }

    /// The element id at `index` of `connection`, looking through an active proxy to the
    /// original endpoint.
    pub fn original_element_id<'a>(&'a self, connection: &'a Connection, index: usize) -> &'a ElementId {
        if let Some(original) = connection
            .proxies
            .get(index)
            .copied()
            .flatten()
            .and_then(|p| self.endpoints.get(&p.original))
        {
            return &original.element_id;
        }
        if index == 0 {
            &connection.source_id
        } else {
            &connection.target_id
        }
    }

    /// Connections with `endpoint` parked behind a proxy, in registration order.
    pub(crate) fn connections_proxying(&self, endpoint: EndpointId) -> Vec<ConnectionId> {
        self.iter_connections()
            .filter(|c| c.proxies.iter().flatten().any(|r| r.original == endpoint))
            .map(|c| c.id)
            .collect()
    }

    pub(crate) fn rename_element(&mut self, old: &str, new: &ElementId) {
        let ids = self.endpoints_by_element.shift_remove(old).unwrap_or_default();
        for id in &ids {
            if let Some(ep) = self.endpoints.get_mut(id) {
                ep.element_id = new.clone();
            }
        }
        if !ids.is_empty() {
            self.endpoints_by_element.insert(new.clone(), ids);
        }
        for c in self.connection_records.values_mut() {
            if c.source_id.as_str() == old {
                c.source_id = new.clone();
            }
            if c.target_id.as_str() == old {
                c.target_id = new.clone();
            }
        }
    }

    pub fn clear(&mut self) {
        self.endpoints.clear();
        self.endpoints_by_element.clear();
        self.endpoints_by_uuid.clear();
        self.connections.clear();
        self.connection_records.clear();
    }
}
