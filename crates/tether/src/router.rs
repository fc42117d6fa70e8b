//! The seam to the geometry side: anchor placement, connector paths and visual redraw are all
//! delegated to a [`Router`].

use crate::connection::Connection;
use crate::endpoint::Endpoint;
use crate::graph::Graph;
use crate::ids::{ConnectionId, ElementId, EndpointId, Timestamp};
use crate::viewport::{Viewport, ViewportElement};
use indexmap::IndexSet;

/// The connections and endpoints touched by a redraw.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedrawResult {
    pub connections: IndexSet<ConnectionId>,
    pub endpoints: IndexSet<EndpointId>,
}

impl RedrawResult {
    pub fn merge(&mut self, other: RedrawResult) {
        self.connections.extend(other.connections);
        self.endpoints.extend(other.endpoints);
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty() && self.endpoints.is_empty()
    }
}

/// Where an anchor landed: a point plus the outward orientation at that point.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AnchorPlacement {
    pub x: f64,
    pub y: f64,
    pub ox: f64,
    pub oy: f64,
}

/// Geometry handed to the router when an endpoint's anchor must be placed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorInput {
    pub element: ViewportElement,
    pub rotation: f64,
    pub timestamp: Option<Timestamp>,
}

/// Read-only view of the core state a router may consult while redrawing.
#[derive(Clone, Copy)]
pub struct Scene<'a> {
    pub graph: &'a Graph,
    pub viewport: &'a Viewport,
}

pub trait Router {
    fn new_connection(&mut self, connection: &Connection);

    fn connection_detached(&mut self, connection: &Connection);

    /// Recomputes the visuals of everything attached to `element_id`.
    fn redraw(
        &mut self,
        scene: Scene<'_>,
        element_id: &ElementId,
        offset: Option<&ViewportElement>,
        timestamp: Timestamp,
    ) -> RedrawResult;

    fn compute_anchor(&mut self, endpoint: &Endpoint, input: &AnchorInput) -> AnchorPlacement;

    fn paint_endpoint(&mut self, _endpoint: &Endpoint, _placement: &AnchorPlacement) {}

    fn delete_endpoint(&mut self, endpoint: &Endpoint);

    fn clear_for(&mut self, element_id: &ElementId);

    fn remove_floating_connection(&mut self, element_id: &ElementId);

    fn reset(&mut self);
}

/// A router without geometry.
///
/// Redraws report the endpoints on the element and every connection touching them; anchors sit
/// at the element's center.
#[derive(Debug, Clone, Default)]
pub struct TopologyRouter;

impl Router for TopologyRouter {
    fn new_connection(&mut self, _connection: &Connection) {}

    fn connection_detached(&mut self, _connection: &Connection) {}

    fn redraw(
        &mut self,
        scene: Scene<'_>,
        element_id: &ElementId,
        _offset: Option<&ViewportElement>,
        _timestamp: Timestamp,
    ) -> RedrawResult {
        let mut out = RedrawResult::default();
        for ep in scene.graph.endpoints_for(element_id.as_str()) {
            out.endpoints.insert(ep.id());
            out.connections.extend(ep.connections().iter().copied());
        }
        out
    }

    fn compute_anchor(&mut self, _endpoint: &Endpoint, input: &AnchorInput) -> AnchorPlacement {
        let (x, y) = input.element.center();
        AnchorPlacement { x, y, ox: 0.0, oy: 0.0 }
    }

    fn delete_endpoint(&mut self, _endpoint: &Endpoint) {}

    fn clear_for(&mut self, _element_id: &ElementId) {}

    fn remove_floating_connection(&mut self, _element_id: &ElementId) {}

    fn reset(&mut self) {}
}
