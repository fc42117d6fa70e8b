//! Parameter bundles accepted by the public surface.
//!
//! Bundles merge slot by slot: a later bundle's `Some` wins, `None` leaves the earlier value.

use crate::connection::DetachGuard;
use crate::ids::{ElementId, ElementRef, EndpointId};
use crate::types::OverlaySpec;
use serde_json::{Map, Value};
use std::fmt;

/// One end of a connect request: a raw element, an element id, a live endpoint, or an endpoint
/// uuid. Resolved once at the API boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Terminal {
    Element(ElementRef),
    ElementId(ElementId),
    Endpoint(EndpointId),
    Uuid(String),
}

impl From<ElementRef> for Terminal {
    fn from(value: ElementRef) -> Self {
        Self::Element(value)
    }
}

impl From<EndpointId> for Terminal {
    fn from(value: EndpointId) -> Self {
        Self::Endpoint(value)
    }
}

macro_rules! merge_some {
    ($dst:expr, $src:expr; $($field:ident),* $(,)?) => {
        $(if $src.$field.is_some() {
            $dst.$field = $src.$field.clone();
        })*
    };
}

#[derive(Clone, Default)]
pub struct EndpointOptions {
    pub uuid: Option<String>,
    pub anchor: Option<Value>,
    /// The endpoint's visual shape spec (e.g. `"Dot"`).
    pub endpoint: Option<Value>,
    pub paint_style: Option<Value>,
    pub hover_paint_style: Option<Value>,
    pub scope: Option<String>,
    pub max_connections: Option<i32>,
    pub delete_on_empty: Option<bool>,
    pub connection_type: Option<String>,
    /// Whitespace-separated endpoint type names folded in on creation.
    pub endpoint_type: Option<String>,
    pub connector_overlays: Option<Vec<OverlaySpec>>,
    pub connector_pointer_events: Option<String>,
    pub port_id: Option<String>,
    pub is_source: Option<bool>,
    pub is_target: Option<bool>,
    pub visible: Option<bool>,
    pub parameters: Map<String, Value>,
    pub before_detach: Option<DetachGuard>,
}

impl fmt::Debug for EndpointOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointOptions")
            .field("uuid", &self.uuid)
            .field("anchor", &self.anchor)
            .field("endpoint", &self.endpoint)
            .field("scope", &self.scope)
            .field("max_connections", &self.max_connections)
            .field("connection_type", &self.connection_type)
            .field("port_id", &self.port_id)
            .finish_non_exhaustive()
    }
}

impl EndpointOptions {
    pub fn merge_from(&mut self, other: &EndpointOptions) {
        merge_some!(self, other;
            uuid,
            anchor,
            endpoint,
            paint_style,
            hover_paint_style,
            scope,
            max_connections,
            delete_on_empty,
            connection_type,
            endpoint_type,
            connector_overlays,
            connector_pointer_events,
            port_id,
            is_source,
            is_target,
            visible,
            before_detach,
        );
        for (k, v) in &other.parameters {
            self.parameters.insert(k.clone(), v.clone());
        }
    }

    /// `self` with `other` merged on top.
    pub fn merged(mut self, other: &EndpointOptions) -> Self {
        self.merge_from(other);
        self
    }
}

#[derive(Clone, Default)]
pub struct ConnectParams {
    pub source: Option<Terminal>,
    pub target: Option<Terminal>,
    /// Whitespace-separated connection type names.
    pub connection_type: Option<String>,
    pub scope: Option<String>,
    pub anchor: Option<Value>,
    pub anchors: Option<[Option<Value>; 2]>,
    pub endpoint: Option<Value>,
    pub endpoints: Option<[Option<Value>; 2]>,
    pub endpoint_style: Option<Value>,
    pub endpoint_styles: Option<[Option<Value>; 2]>,
    pub endpoint_hover_style: Option<Value>,
    pub endpoint_hover_styles: Option<[Option<Value>; 2]>,
    pub ports: Option<[Option<String>; 2]>,
    pub connector: Option<Value>,
    pub paint_style: Option<Value>,
    pub hover_paint_style: Option<Value>,
    pub overlays: Option<Vec<OverlaySpec>>,
    pub pointer_events: Option<String>,
    pub detachable: Option<bool>,
    /// `Some(false)` suppresses the creation event.
    pub fire_event: Option<bool>,
    pub parameters: Map<String, Value>,
    pub before_detach: Option<DetachGuard>,
}

impl fmt::Debug for ConnectParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectParams")
            .field("source", &self.source)
            .field("target", &self.target)
            .field("connection_type", &self.connection_type)
            .field("scope", &self.scope)
            .field("ports", &self.ports)
            .finish_non_exhaustive()
    }
}

impl ConnectParams {
    pub fn new(source: impl Into<Terminal>, target: impl Into<Terminal>) -> Self {
        Self {
            source: Some(source.into()),
            target: Some(target.into()),
            ..Default::default()
        }
    }

    pub fn merge_from(&mut self, other: &ConnectParams) {
        merge_some!(self, other;
            source,
            target,
            connection_type,
            scope,
            anchor,
            anchors,
            endpoint,
            endpoints,
            endpoint_style,
            endpoint_styles,
            endpoint_hover_style,
            endpoint_hover_styles,
            ports,
            connector,
            paint_style,
            hover_paint_style,
            overlays,
            pointer_events,
            detachable,
            fire_event,
            before_detach,
        );
        for (k, v) in &other.parameters {
            self.parameters.insert(k.clone(), v.clone());
        }
    }

    pub(crate) fn port(&self, index: usize) -> Option<&str> {
        self.ports.as_ref().and_then(|p| p[index].as_deref())
    }

    /// Per-end endpoint overrides: the two-element form wins over the shared one.
    pub(crate) fn endpoint_overrides(&self, index: usize) -> EndpointOptions {
        fn pick(pair: &Option<[Option<Value>; 2]>, single: &Option<Value>, i: usize) -> Option<Value> {
            match pair {
                Some(p) => p[i].clone(),
                None => single.clone(),
            }
        }
        EndpointOptions {
            anchor: pick(&self.anchors, &self.anchor, index),
            endpoint: pick(&self.endpoints, &self.endpoint, index),
            paint_style: pick(&self.endpoint_styles, &self.endpoint_style, index),
            hover_paint_style: pick(&self.endpoint_hover_styles, &self.endpoint_hover_style, index),
            port_id: self.port(index).map(str::to_string),
            ..Default::default()
        }
    }
}

/// Options for deleting a connection.
#[derive(Debug, Clone, Default)]
pub struct DeleteOptions {
    /// Skip every "may I detach" guard.
    pub force: bool,
    /// `Some(false)` suppresses the public detach event; the internal one always fires.
    pub fire_event: Option<bool>,
    /// An endpoint that is already being torn down and must not be detached again.
    pub endpoint_to_ignore: Option<EndpointId>,
}

impl DeleteOptions {
    pub fn forced() -> Self {
        Self {
            force: true,
            ..Default::default()
        }
    }
}
