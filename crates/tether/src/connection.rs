use crate::ids::{ConnectionId, ElementId, ElementRef, EndpointId};
use crate::types::FullOverlaySpec;
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::fmt;
use std::rc::Rc;

/// A cancellable "may I detach" check; returning `false` vetoes the deletion.
pub type DetachGuard = Rc<dyn Fn(&Connection) -> bool>;

/// Records that the live endpoint at one end of a connection stands in for another one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProxyRecord {
    pub proxy: EndpointId,
    pub original: EndpointId,
}

/// A directed pairing of two endpoints: index 0 is the source, index 1 the target.
#[derive(Clone)]
pub struct Connection {
    pub(crate) id: ConnectionId,
    pub(crate) endpoints: [EndpointId; 2],
    pub(crate) source: ElementRef,
    pub(crate) target: ElementRef,
    pub(crate) source_id: ElementId,
    pub(crate) target_id: ElementId,
    pub(crate) scope: String,
    pub(crate) connection_type: Option<String>,
    pub(crate) connector: Value,
    pub(crate) paint_style: Value,
    pub(crate) hover_paint_style: Option<Value>,
    pub(crate) css_class: Option<String>,
    pub(crate) overlays: IndexMap<String, FullOverlaySpec>,
    pub(crate) pointer_events: Option<String>,
    pub(crate) parameters: Map<String, Value>,
    pub(crate) proxies: [Option<ProxyRecord>; 2],
    pub(crate) visible: bool,
    pub(crate) pending: bool,
    pub(crate) detachable: bool,
    pub(crate) suspended_endpoint: Option<EndpointId>,
    pub(crate) before_detach: Option<DetachGuard>,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("endpoints", &self.endpoints)
            .field("source_id", &self.source_id)
            .field("target_id", &self.target_id)
            .field("scope", &self.scope)
            .field("proxies", &self.proxies)
            .field("visible", &self.visible)
            .finish_non_exhaustive()
    }
}

impl Connection {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn endpoints(&self) -> [EndpointId; 2] {
        self.endpoints
    }

    /// The endpoint at `index` (0 source, 1 target).
    pub fn endpoint(&self, index: usize) -> Option<EndpointId> {
        self.endpoints.get(index).copied()
    }

    pub fn source(&self) -> ElementRef {
        self.source
    }

    pub fn target(&self) -> ElementRef {
        self.target
    }

    pub fn source_id(&self) -> &ElementId {
        &self.source_id
    }

    pub fn target_id(&self) -> &ElementId {
        &self.target_id
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn connection_type(&self) -> Option<&str> {
        self.connection_type.as_deref()
    }

    pub fn connector(&self) -> &Value {
        &self.connector
    }

    pub fn paint_style(&self) -> &Value {
        &self.paint_style
    }

    pub fn hover_paint_style(&self) -> Option<&Value> {
        self.hover_paint_style.as_ref()
    }

    pub fn css_class(&self) -> Option<&str> {
        self.css_class.as_deref()
    }

    pub fn overlays(&self) -> &IndexMap<String, FullOverlaySpec> {
        &self.overlays
    }

    pub fn pointer_events(&self) -> Option<&str> {
        self.pointer_events.as_deref()
    }

    pub fn parameters(&self) -> &Map<String, Value> {
        &self.parameters
    }

    pub fn proxy(&self, index: usize) -> Option<&ProxyRecord> {
        self.proxies.get(index).and_then(Option::as_ref)
    }

    pub fn is_proxied(&self) -> bool {
        self.proxies.iter().any(Option::is_some)
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn is_detachable(&self) -> bool {
        self.detachable
    }

    pub fn suspended_endpoint(&self) -> Option<EndpointId> {
        self.suspended_endpoint
    }

    pub(crate) fn is_detach_allowed(&self) -> bool {
        self.before_detach.as_ref().is_none_or(|guard| guard(self))
    }
}
