use crate::connection::{Connection, DetachGuard};
use crate::ids::{ConnectionId, ElementId, ElementRef, EndpointId};
use crate::router::AnchorPlacement;
use crate::types::OverlaySpec;
use serde_json::{Map, Value};
use std::fmt;

/// An attachment point on an element where connections terminate.
#[derive(Clone)]
pub struct Endpoint {
    pub(crate) id: EndpointId,
    pub(crate) uuid: Option<String>,
    pub(crate) element: ElementRef,
    pub(crate) element_id: ElementId,
    pub(crate) scope: String,
    /// Negative means unlimited.
    pub(crate) max_connections: i32,
    pub(crate) delete_on_empty: bool,
    pub(crate) connections: Vec<ConnectionId>,
    pub(crate) connection_type: Option<String>,
    pub(crate) connector_overlays: Vec<OverlaySpec>,
    pub(crate) connector_pointer_events: Option<String>,
    pub(crate) anchor: Option<Value>,
    pub(crate) shape: Option<Value>,
    pub(crate) paint_style: Option<Value>,
    pub(crate) hover_paint_style: Option<Value>,
    pub(crate) port_id: Option<String>,
    pub(crate) parameters: Map<String, Value>,
    pub(crate) is_source: bool,
    pub(crate) is_target: bool,
    pub(crate) is_temporary_source: bool,
    pub(crate) visible: bool,
    pub(crate) final_endpoint: Option<EndpointId>,
    pub(crate) before_detach: Option<DetachGuard>,
    pub(crate) placement: Option<AnchorPlacement>,
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("id", &self.id)
            .field("uuid", &self.uuid)
            .field("element_id", &self.element_id)
            .field("scope", &self.scope)
            .field("max_connections", &self.max_connections)
            .field("delete_on_empty", &self.delete_on_empty)
            .field("connections", &self.connections)
            .field("visible", &self.visible)
            .finish_non_exhaustive()
    }
}

impl Endpoint {
    pub fn id(&self) -> EndpointId {
        self.id
    }

    pub fn uuid(&self) -> Option<&str> {
        self.uuid.as_deref()
    }

    pub fn element(&self) -> ElementRef {
        self.element
    }

    pub fn element_id(&self) -> &ElementId {
        &self.element_id
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn max_connections(&self) -> i32 {
        self.max_connections
    }

    pub fn delete_on_empty(&self) -> bool {
        self.delete_on_empty
    }

    pub fn connections(&self) -> &[ConnectionId] {
        &self.connections
    }

    pub fn connection_type(&self) -> Option<&str> {
        self.connection_type.as_deref()
    }

    pub fn connector_overlays(&self) -> &[OverlaySpec] {
        &self.connector_overlays
    }

    pub fn anchor(&self) -> Option<&Value> {
        self.anchor.as_ref()
    }

    pub fn shape(&self) -> Option<&Value> {
        self.shape.as_ref()
    }

    pub fn paint_style(&self) -> Option<&Value> {
        self.paint_style.as_ref()
    }

    pub fn port_id(&self) -> Option<&str> {
        self.port_id.as_deref()
    }

    pub fn parameters(&self) -> &Map<String, Value> {
        &self.parameters
    }

    pub fn is_source(&self) -> bool {
        self.is_source
    }

    pub fn is_target(&self) -> bool {
        self.is_target
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn final_endpoint(&self) -> Option<EndpointId> {
        self.final_endpoint
    }

    /// The anchor placement computed the last time this endpoint was painted.
    pub fn placement(&self) -> Option<&AnchorPlacement> {
        self.placement.as_ref()
    }

    pub fn is_full(&self) -> bool {
        self.max_connections >= 0 && self.connections.len() >= self.max_connections as usize
    }

    pub(crate) fn add_connection(&mut self, connection: ConnectionId) {
        if !self.connections.contains(&connection) {
            self.connections.push(connection);
        }
    }

    pub(crate) fn remove_connection(&mut self, connection: ConnectionId) -> bool {
        let Some(idx) = self.connections.iter().position(|c| *c == connection) else {
            return false;
        };
        self.connections.remove(idx);
        true
    }

    pub(crate) fn is_detach_allowed(&self, connection: &Connection) -> bool {
        self.before_detach
            .as_ref()
            .is_none_or(|guard| guard(connection))
    }
}
