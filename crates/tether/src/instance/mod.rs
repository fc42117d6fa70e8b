//! The connectivity engine's public surface.
//!
//! An [`Instance`] owns the graph, the offset cache, the managed-element registry and the
//! source/target definitions, and drives the host through an [`ElementAdapter`] and a [`Router`].
//! The operations are split across the submodules by concern.

mod connect;
mod delete;
mod endpoints;
mod proxy;
mod redraw;
mod select;
mod sources;

pub use connect::scope_match;
pub use proxy::PROXY_ENDPOINT_PARAMETER;
pub use redraw::UpdateOffset;

use crate::Result;
use crate::adapter::ElementAdapter;
use crate::config::Defaults;
use crate::connection::Connection;
use crate::definitions::Definitions;
use crate::endpoint::Endpoint;
use crate::events::{Condition, Event, EventBus, EventKind, ListenerId};
use crate::graph::Graph;
use crate::group::{GroupManager, NoGroups};
use crate::ids::{ConnectionId, ElementId, ElementRef, EndpointId, IdStamp, Timestamp};
use crate::router::{RedrawResult, Router};
use crate::types::{EndpointAndAnchorSpec, RegisteredType, TypeDescriptor, TypeKind, TypeRegistry};
use crate::viewport::{Viewport, ViewportElement};
use indexmap::IndexMap;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Marks elements under management.
pub const ATTRIBUTE_MANAGED: &str = "data-tether-managed";
/// Internal uuid stamped on every managed element.
pub const ATTRIBUTE_INTERNAL_ID: &str = "data-tether-id";
pub const ATTRIBUTE_SOURCE: &str = "data-tether-source";
pub const ATTRIBUTE_TARGET: &str = "data-tether-target";
pub const ATTRIBUTE_SCOPE_PREFIX: &str = "data-tether-scope-";
/// Carried by every element with at least one connection.
pub const CLASS_CONNECTED: &str = "tether-connected";

static INSTANCE_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Registry record of an element under management.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ManagedElement {
    pub element: ElementRef,
    /// Geometry computed when the element was (re)managed; `None` while drawing was suspended.
    pub info: Option<ViewportElement>,
    pub rotation: f64,
}

pub struct Instance<A: ElementAdapter, R: Router> {
    adapter: A,
    router: R,
    groups: Box<dyn GroupManager>,

    defaults: Defaults,
    initial_defaults: Defaults,

    graph: Graph,
    viewport: Viewport,
    managed: IndexMap<ElementId, ManagedElement>,
    definitions: Definitions,
    types: TypeRegistry,
    events: EventBus,

    stamp: IdStamp,
    instance_index: usize,

    suspend_drawing: bool,
    suspended_at: Option<Timestamp>,

    container: Option<ElementRef>,
    zoom: f64,
}

impl<A: ElementAdapter, R: Router> std::fmt::Debug for Instance<A, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instance")
            .field("instance_index", &self.instance_index)
            .field("managed", &self.managed.len())
            .field("endpoints", &self.graph.endpoint_count())
            .field("connections", &self.graph.connection_count())
            .field("suspend_drawing", &self.suspend_drawing)
            .finish_non_exhaustive()
    }
}

impl<A: ElementAdapter, R: Router> Instance<A, R> {
    pub fn new(adapter: A, router: R) -> Self {
        Self::with_defaults(adapter, router, Defaults::default())
    }

    pub fn with_defaults(adapter: A, router: R, defaults: Defaults) -> Self {
        Self {
            adapter,
            router,
            groups: Box::new(NoGroups),
            initial_defaults: defaults.clone(),
            defaults,
            graph: Graph::new(),
            viewport: Viewport::new(),
            managed: IndexMap::new(),
            definitions: Definitions::default(),
            types: TypeRegistry::new(),
            events: EventBus::new(),
            stamp: IdStamp::default(),
            instance_index: INSTANCE_COUNTER.fetch_add(1, Ordering::Relaxed) + 1,
            suspend_drawing: false,
            suspended_at: None,
            container: None,
            zoom: 1.0,
        }
    }

    pub fn with_group_manager(mut self, groups: impl GroupManager + 'static) -> Self {
        self.groups = Box::new(groups);
        self
    }

    /// Overrides the process-wide instance number used in generated element ids.
    pub fn with_instance_index(mut self, index: usize) -> Self {
        self.instance_index = index;
        self
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn adapter_mut(&mut self) -> &mut A {
        &mut self.adapter
    }

    pub fn router(&self) -> &R {
        &self.router
    }

    pub fn router_mut(&mut self) -> &mut R {
        &mut self.router
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn definitions(&self) -> &Definitions {
        &self.definitions
    }

    pub fn defaults(&self) -> &Defaults {
        &self.defaults
    }

    pub fn instance_index(&self) -> usize {
        self.instance_index
    }

    pub fn default_scope(&self) -> &str {
        &self.defaults.scope
    }

    pub fn endpoint(&self, id: EndpointId) -> Option<&Endpoint> {
        self.graph.endpoint(id)
    }

    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.graph.connection(id)
    }

    // ------------------------------------------------------------------ identity

    /// The element's `id` attribute, assigning `tether-<instance>-<stamp>` when it has none.
    pub fn get_id(&mut self, el: ElementRef) -> ElementId {
        if let Some(id) = self.id_of(el) {
            return id;
        }
        let id = format!("tether-{}-{}", self.instance_index, self.stamp.next());
        self.adapter.set_attribute(el, "id", &id);
        ElementId::new(id)
    }

    /// The element's id without assigning one.
    pub fn id_of(&self, el: ElementRef) -> Option<ElementId> {
        self.adapter
            .get_attribute(el, "id")
            .filter(|id| !id.is_empty() && id != "undefined")
            .map(ElementId::new)
    }

    fn element_for(&self, id: &str) -> Option<ElementRef> {
        self.managed
            .get(id)
            .map(|m| m.element)
            .or_else(|| self.adapter.element_by_id(id))
    }

    /// Changes the element's id attribute and re-keys everything held under the old id.
    pub fn set_id(&mut self, el: ElementRef, new_id: impl Into<ElementId>) {
        let old = self.get_id(el);
        let new_id = new_id.into();
        self.adapter.set_attribute(el, "id", new_id.as_str());
        self.rekey_element(&old, &new_id, el);
    }

    /// Re-keys after the host has already changed an element's id attribute.
    pub fn set_id_changed(&mut self, old: &str, new_id: impl Into<ElementId>) {
        let new_id = new_id.into();
        let Some(el) = self.adapter.element_by_id(new_id.as_str()) else {
            tracing::debug!(old, new = %new_id, "set_id_changed: no element carries the new id");
            return;
        };
        let old = ElementId::new(old);
        self.rekey_element(&old, &new_id, el);
    }

    fn rekey_element(&mut self, old: &ElementId, new_id: &ElementId, el: ElementRef) {
        if old == new_id {
            return;
        }
        self.graph.rename_element(old.as_str(), new_id);
        if let Some(mut record) = self.managed.shift_remove(old.as_str()) {
            record.element = el;
            self.managed.insert(new_id.clone(), record);
        }
        self.viewport.rename(old.as_str(), new_id);
        self.definitions.rename_element(old.as_str(), new_id);
        self.repaint(el);
    }

    // ------------------------------------------------------------------ registry

    /// Brings `el` under management. Idempotent; `recalc` forces a fresh measurement of an
    /// element that is already managed.
    pub fn manage(&mut self, el: ElementRef, recalc: bool) -> ManagedElement {
        self.manage_as(el, None, recalc)
    }

    /// [`manage`](Self::manage), stamping `internal_id` as the element's internal id instead of
    /// a random one. An element that already carries an internal id keeps it.
    pub fn manage_with_id(
        &mut self,
        el: ElementRef,
        internal_id: &str,
        recalc: bool,
    ) -> ManagedElement {
        self.manage_as(el, Some(internal_id), recalc)
    }

    fn manage_as(
        &mut self,
        el: ElementRef,
        internal_id: Option<&str>,
        recalc: bool,
    ) -> ManagedElement {
        let id = self.ensure_managed(el, internal_id, recalc);
        self.managed.get(id.as_str()).copied().unwrap_or(ManagedElement {
            element: el,
            info: None,
            rotation: 0.0,
        })
    }

    pub fn manage_all(&mut self, elements: &[ElementRef], recalc: bool) {
        for el in elements {
            self.ensure_managed(*el, None, recalc);
        }
    }

    pub(crate) fn ensure_managed(
        &mut self,
        el: ElementRef,
        internal_id: Option<&str>,
        recalc: bool,
    ) -> ElementId {
        if self.adapter.get_attribute(el, ATTRIBUTE_INTERNAL_ID).is_none() {
            let internal = internal_id
                .map(str::to_string)
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
            self.adapter
                .set_attribute(el, ATTRIBUTE_INTERNAL_ID, &internal);
        }

        let id = self.get_id(el);
        if !self.managed.contains_key(id.as_str()) {
            self.adapter.set_attribute(el, ATTRIBUTE_MANAGED, "");
            self.managed.insert(
                id.clone(),
                ManagedElement {
                    element: el,
                    info: None,
                    rotation: 0.0,
                },
            );
            let info = if self.suspend_drawing {
                self.viewport.register_element(&id);
                None
            } else {
                self.update_offset(UpdateOffset::new(id.clone()).recalc())
            };
            if let Some(record) = self.managed.get_mut(id.as_str()) {
                record.info = info;
            }
        } else if recalc {
            let info = self.update_offset(UpdateOffset::new(id.clone()).recalc());
            if let Some(record) = self.managed.get_mut(id.as_str()) {
                record.info = info;
            }
        }
        id
    }

    pub fn managed_element(&self, id: &str) -> Option<&ManagedElement> {
        self.managed.get(id)
    }

    pub fn managed_elements(&self) -> impl Iterator<Item = (&ElementId, &ManagedElement)> {
        self.managed.iter()
    }

    pub fn is_managed(&self, id: &str) -> bool {
        self.managed.contains_key(id)
    }

    /// The endpoints owned by a managed element, in creation order.
    pub fn managed_endpoints(&self, id: &str) -> Vec<EndpointId> {
        self.graph.endpoint_ids_for(id)
    }

    /// The connections touching a managed element's endpoints, in first-seen order.
    pub fn managed_connections(&self, id: &str) -> Vec<ConnectionId> {
        let mut out: Vec<ConnectionId> = Vec::new();
        for ep in self.graph.endpoints_for(id) {
            for c in ep.connections() {
                if !out.contains(c) {
                    out.push(*c);
                }
            }
        }
        out
    }

    /// Stops managing `el`: removes its endpoints (and those of its children, which are
    /// released first), drops its definitions and forgets its geometry.
    pub fn unmanage(&mut self, el: ElementRef, remove_element: bool) {
        let mut affected = Vec::new();
        self.remove_all_endpoints_into(el, true, &mut affected);

        for child in affected.into_iter().filter(|a| *a != el) {
            self.release_element(child, remove_element);
        }
        self.release_element(el, remove_element);
    }

    fn release_element(&mut self, el: ElementRef, remove_element: bool) {
        let id = self.get_id(el);

        self.router.clear_for(&id);
        self.router.remove_floating_connection(&id);

        if self.is_source(el, None) {
            self.unmake_source(el, None);
        }
        if self.is_target(el, None) {
            self.unmake_target(el, None);
        }

        self.adapter.remove_attribute(el, ATTRIBUTE_MANAGED);
        self.managed.shift_remove(id.as_str());
        self.viewport.remove(id.as_str());

        if remove_element {
            self.adapter.remove_element(el);
        }
    }

    /// Stores a rotation and revalidates the element unless `skip_repaint`.
    pub fn rotate(&mut self, id: &str, rotation: f64, skip_repaint: bool) -> RedrawResult {
        let Some(record) = self.managed.get_mut(id) else {
            tracing::debug!(id, "rotate: element is not managed");
            return RedrawResult::default();
        };
        record.rotation = rotation;
        let el = record.element;
        self.viewport.rotate_element(&ElementId::new(id), rotation);
        if skip_repaint {
            return RedrawResult::default();
        }
        self.revalidate(el, None)
    }

    pub fn get_rotation(&self, id: &str) -> f64 {
        self.managed.get(id).map(|m| m.rotation).unwrap_or_default()
    }

    /// The cached geometry for `id`, measured on a miss.
    pub fn get_cached_data(&mut self, id: &str) -> Option<ViewportElement> {
        if let Some(position) = self.viewport.position(id) {
            return Some(position);
        }
        self.update_offset(UpdateOffset::new(ElementId::new(id)))
    }

    // ------------------------------------------------------------------ container, zoom, defaults

    pub fn set_container(&mut self, container: ElementRef) {
        self.container = Some(container);
        self.events.fire(Event::ContainerChanged(Some(container)));
    }

    pub fn container(&self) -> Option<ElementRef> {
        self.container
    }

    pub fn set_zoom(&mut self, zoom: f64, repaint_everything: bool) -> bool {
        self.zoom = zoom;
        self.events.fire(Event::Zoom(zoom));
        if repaint_everything {
            self.repaint_everything();
        }
        true
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Deep-merges `overrides` onto the current defaults.
    pub fn import_defaults(&mut self, overrides: &Value) -> Result<()> {
        self.defaults = self.defaults.merged_with(overrides)?;
        Ok(())
    }

    pub fn restore_defaults(&mut self) {
        self.defaults = self.initial_defaults.clone();
    }

    // ------------------------------------------------------------------ types

    pub fn register_connection_type(&mut self, id: impl Into<String>, descriptor: TypeDescriptor) {
        self.types.register_connection_type(id, descriptor);
    }

    pub fn register_connection_types<I, S>(&mut self, types: I)
    where
        I: IntoIterator<Item = (S, TypeDescriptor)>,
        S: Into<String>,
    {
        self.types.register_connection_types(types);
    }

    pub fn register_endpoint_type(&mut self, id: impl Into<String>, descriptor: TypeDescriptor) {
        self.types.register_endpoint_type(id, descriptor);
    }

    pub fn register_endpoint_types<I, S>(&mut self, types: I)
    where
        I: IntoIterator<Item = (S, TypeDescriptor)>,
        S: Into<String>,
    {
        self.types.register_endpoint_types(types);
    }

    pub fn get_type(&self, id: &str, kind: TypeKind) -> Option<&RegisteredType> {
        self.types.get_type(id, kind)
    }

    pub fn derive_endpoint_and_anchor_spec(
        &self,
        type_names: &str,
        dont_prepend_default: bool,
    ) -> EndpointAndAnchorSpec {
        self.types
            .derive_endpoint_and_anchor_spec(type_names, dont_prepend_default)
    }

    // ------------------------------------------------------------------ events

    pub fn bind(&mut self, kind: EventKind, listener: impl FnMut(&Event) + 'static) -> ListenerId {
        self.events.bind(kind, listener)
    }

    pub fn bind_condition(
        &mut self,
        condition: Condition,
        guard: impl Fn(&Connection) -> bool + 'static,
    ) -> ListenerId {
        self.events.bind_condition(condition, guard)
    }

    pub fn unbind(&mut self, id: ListenerId) -> bool {
        self.events.unbind(id)
    }

    pub fn unbind_all(&mut self) {
        self.events.unbind_all();
    }

    pub fn check_condition(&self, condition: Condition, connection: ConnectionId) -> bool {
        self.graph
            .connection(connection)
            .is_none_or(|c| self.events.check_condition(condition, c))
    }

    /// Runs `f` with event firing suppressed.
    pub fn silently<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        let previous = self.events.set_silent(true);
        let out = f(self);
        self.events.set_silent(previous);
        out
    }

    // ------------------------------------------------------------------ groups, lifecycle

    pub fn group_for(&mut self, el: ElementRef) -> Option<String> {
        let id = self.get_id(el);
        self.groups.group_for(&id)
    }

    /// Clears every index, the offset cache, the type registries and the router and group state,
    /// without firing events.
    pub fn reset(&mut self) {
        self.silently(|this| {
            this.graph.clear();
            this.managed.clear();
            this.definitions.clear();
            this.viewport.reset();
            this.router.reset();
            this.groups.reset();
            this.types.clear();
        });
    }

    /// Resets and unbinds every listener.
    pub fn destroy(&mut self) {
        self.reset();
        self.events.unbind_all();
    }

    /// Adds or removes [`CLASS_CONNECTED`] depending on whether the element still has any
    /// connection.
    pub(crate) fn refresh_connected_class(&mut self, id: &ElementId) {
        let Some(el) = self.element_for(id.as_str()) else {
            return;
        };
        let connected = self
            .graph
            .endpoints_for(id.as_str())
            .any(|ep| !ep.connections().is_empty());
        if connected {
            self.adapter.add_class(el, CLASS_CONNECTED);
        } else {
            self.adapter.remove_class(el, CLASS_CONNECTED);
        }
    }
}
