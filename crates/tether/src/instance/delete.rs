use super::Instance;
use super::connect::Resolved;
use crate::adapter::ElementAdapter;
use crate::definitions::DefinitionKind;
use crate::events::{Condition, ConnectionEventInfo, ConnectionMovedInfo, Event};
use crate::ids::{ConnectionId, ElementRef, EndpointId};
use crate::params::{ConnectParams, DeleteOptions, Terminal};
use crate::router::Router;

impl<A: ElementAdapter, R: Router> Instance<A, R> {
    /// Deletes a connection.
    ///
    /// Unless forced, the source endpoint, the target endpoint, the connection itself and then
    /// every `BeforeDetach` condition may veto. Returns whether the connection was removed.
    pub fn delete_connection(&mut self, id: ConnectionId, options: &DeleteOptions) -> bool {
        let Some(connection) = self.graph.connection(id) else {
            tracing::debug!(connection = %id, "delete_connection: unknown connection");
            return false;
        };

        if !options.force {
            let [s, t] = connection.endpoints;
            let allowed = self
                .graph
                .endpoint(s)
                .is_none_or(|e| e.is_detach_allowed(connection))
                && self
                    .graph
                    .endpoint(t)
                    .is_none_or(|e| e.is_detach_allowed(connection))
                && connection.is_detach_allowed()
                && self
                    .events
                    .check_condition(Condition::BeforeDetach, connection);
            if !allowed {
                tracing::debug!(connection = %id, "delete_connection: vetoed");
                return false;
            }
        }

        let fire = !connection.pending && options.fire_event != Some(false);
        let info = ConnectionEventInfo::of(connection);
        let originals: Vec<EndpointId> = connection
            .proxies
            .iter()
            .flatten()
            .map(|r| r.original)
            .filter(|e| Some(*e) != options.endpoint_to_ignore)
            .collect();
        if fire {
            self.events.fire(Event::ConnectionDetached(info.clone()));
        }
        self.events
            .fire(Event::InternalConnectionDetached(info.clone()));
        if let Some(connection) = self.graph.connection(id) {
            self.router.connection_detached(connection);
        }

        let ends = [info.source_endpoint, info.target_endpoint];
        let kept: Vec<EndpointId> = ends
            .into_iter()
            .filter(|e| Some(*e) != options.endpoint_to_ignore)
            .collect();
        for e in &kept {
            self.detach_from_connection(*e, id, true);
        }

        self.graph.remove_connection(id);
        self.refresh_connected_class(&info.source_id);
        self.refresh_connected_class(&info.target_id);

        for e in kept {
            self.maybe_prune_endpoint(e);
        }
        // Parked originals were detached when proxied; they go the same way as the live ends.
        for e in originals {
            if !self.maybe_prune_endpoint(e) {
                if let Some(endpoint) = self.graph.endpoint_mut(e) {
                    endpoint.visible = true;
                }
            }
        }
        true
    }

    /// Deletes every connection under one drawing batch; returns how many went.
    ///
    /// Takes the current head of the list exactly as many times as there were connections when
    /// called, so a vetoed head is retried rather than skipped.
    pub fn delete_every_connection(&mut self, options: &DeleteOptions) -> usize {
        let count = self.graph.connection_count();
        self.batch(
            |this| {
                let mut deleted = 0;
                for _ in 0..count {
                    let Some(head) = this.graph.connections().first().copied() else {
                        break;
                    };
                    if this.delete_connection(head, options) {
                        deleted += 1;
                    }
                }
                deleted
            },
            false,
        )
    }

    /// Deletes every connection on every endpoint of `el`.
    pub fn delete_connections_for_element(&mut self, el: ElementRef, options: &DeleteOptions) {
        let Some(id) = self.id_of(el) else {
            return;
        };
        for endpoint in self.graph.endpoint_ids_for(id.as_str()) {
            let Some(connections) = self
                .graph
                .endpoint(endpoint)
                .map(|e| e.connections.clone())
            else {
                continue;
            };
            for c in connections {
                self.delete_connection(c, options);
            }
        }
    }

    /// Moves the source end of a connection onto another element or endpoint.
    pub fn set_source(
        &mut self,
        connection: ConnectionId,
        terminal: impl Into<Terminal>,
    ) -> Option<ConnectionMovedInfo> {
        self.set_end(connection, 0, &terminal.into())
    }

    /// Moves the target end of a connection onto another element or endpoint.
    pub fn set_target(
        &mut self,
        connection: ConnectionId,
        terminal: impl Into<Terminal>,
    ) -> Option<ConnectionMovedInfo> {
        self.set_end(connection, 1, &terminal.into())
    }

    fn set_end(
        &mut self,
        id: ConnectionId,
        index: usize,
        terminal: &Terminal,
    ) -> Option<ConnectionMovedInfo> {
        let Some(connection) = self.graph.connection(id) else {
            tracing::debug!(connection = %id, "set_end: unknown connection");
            return None;
        };
        let current_id = if index == 0 {
            connection.source_id.clone()
        } else {
            connection.target_id.clone()
        };
        let old_endpoint = connection.endpoints[index];
        let mut moved = ConnectionMovedInfo {
            connection: id,
            index,
            original_source_id: connection.source_id.clone(),
            new_source_id: connection.source_id.clone(),
            original_target_id: connection.target_id.clone(),
            new_target_id: connection.target_id.clone(),
        };
        let scope = connection.scope.clone();
        let connection_type = connection.connection_type.clone().unwrap_or_default();

        let new_endpoint = match self.resolve_terminal(terminal)? {
            Resolved::Endpoint(e) => e,
            Resolved::Element(el) => {
                let element_id = self.get_id(el);
                if element_id == current_id {
                    return None;
                }
                let kind = DefinitionKind::of_index(index);
                let first = self
                    .definitions
                    .list(kind, element_id.as_str())
                    .first()
                    .cloned();
                match first {
                    Some(def) => {
                        if !def.enabled {
                            tracing::debug!(element = %element_id, "set_end: definition disabled");
                            return None;
                        }
                        let e = match def.endpoint.filter(|e| self.graph.has_endpoint(*e)) {
                            Some(e) => e,
                            None => self.add_endpoint(el, &def.def, None),
                        };
                        if def.unique_endpoint {
                            if let Some(d) = self.definitions.get_mut(kind, element_id.as_str(), 0) {
                                d.endpoint = Some(e);
                            }
                        }
                        e
                    }
                    None => {
                        let p = ConnectParams {
                            scope: Some(scope),
                            ..Default::default()
                        };
                        let spec = self
                            .types
                            .derive_endpoint_and_anchor_spec(&connection_type, false);
                        self.make_connection_endpoint(el, index, &p, &spec)
                    }
                }
            }
        };

        if let Some(e) = self.graph.endpoint_mut(new_endpoint) {
            e.add_connection(id);
        }
        self.detach_from_connection(old_endpoint, id, false);

        let (element, element_id) = match self.graph.endpoint(new_endpoint) {
            Some(e) => (e.element, e.element_id.clone()),
            None => return None,
        };
        if let Some(connection) = self.graph.connection_mut(id) {
            connection.endpoints[index] = new_endpoint;
            if index == 0 {
                connection.source = element;
                connection.source_id = element_id.clone();
            } else {
                connection.target = element;
                connection.target_id = element_id.clone();
            }
        }
        if index == 0 {
            moved.new_source_id = element_id.clone();
        } else {
            moved.new_target_id = element_id.clone();
        }

        self.events.fire(Event::ConnectionMoved(moved.clone()));
        self.refresh_connected_class(&current_id);
        self.refresh_connected_class(&element_id);
        self.draw(element, None, None, false);
        Some(moved)
    }
}
