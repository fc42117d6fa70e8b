//! Synchronous publish/subscribe plus boolean condition guards.

use crate::connection::Connection;
use crate::ids::{ConnectionId, ElementId, ElementRef, EndpointId};

#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionEventInfo {
    pub connection: ConnectionId,
    pub source: ElementRef,
    pub target: ElementRef,
    pub source_id: ElementId,
    pub target_id: ElementId,
    pub source_endpoint: EndpointId,
    pub target_endpoint: EndpointId,
}

impl ConnectionEventInfo {
    pub(crate) fn of(c: &Connection) -> Self {
        Self {
            connection: c.id,
            source: c.source,
            target: c.target,
            source_id: c.source_id.clone(),
            target_id: c.target_id.clone(),
            source_endpoint: c.endpoints[0],
            target_endpoint: c.endpoints[1],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionMovedInfo {
    pub connection: ConnectionId,
    pub index: usize,
    pub original_source_id: ElementId,
    pub new_source_id: ElementId,
    pub original_target_id: ElementId,
    pub new_target_id: ElementId,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    ContainerChanged(Option<ElementRef>),
    Zoom(f64),
    ConnectionCreated(ConnectionEventInfo),
    ConnectionDetached(ConnectionEventInfo),
    /// Fired for every detach, even when the public event is suppressed.
    InternalConnectionDetached(ConnectionEventInfo),
    ConnectionMoved(ConnectionMovedInfo),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ContainerChanged,
    Zoom,
    ConnectionCreated,
    ConnectionDetached,
    InternalConnectionDetached,
    ConnectionMoved,
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::ContainerChanged(_) => EventKind::ContainerChanged,
            Self::Zoom(_) => EventKind::Zoom,
            Self::ConnectionCreated(_) => EventKind::ConnectionCreated,
            Self::ConnectionDetached(_) => EventKind::ConnectionDetached,
            Self::InternalConnectionDetached(_) => EventKind::InternalConnectionDetached,
            Self::ConnectionMoved(_) => EventKind::ConnectionMoved,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Condition {
    BeforeDetach,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

pub type Listener = Box<dyn FnMut(&Event)>;
pub type ConditionGuard = Box<dyn Fn(&Connection) -> bool>;

#[derive(Default)]
pub struct EventBus {
    listeners: Vec<(ListenerId, EventKind, Listener)>,
    guards: Vec<(ListenerId, Condition, ConditionGuard)>,
    next: u64,
    silent: bool,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .field("guards", &self.guards.len())
            .field("silent", &self.silent)
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&mut self) -> ListenerId {
        self.next += 1;
        ListenerId(self.next)
    }

    pub fn bind(&mut self, kind: EventKind, listener: impl FnMut(&Event) + 'static) -> ListenerId {
        let id = self.next_id();
        self.listeners.push((id, kind, Box::new(listener)));
        id
    }

    pub fn bind_condition(
        &mut self,
        condition: Condition,
        guard: impl Fn(&Connection) -> bool + 'static,
    ) -> ListenerId {
        let id = self.next_id();
        self.guards.push((id, condition, Box::new(guard)));
        id
    }

    pub fn unbind(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len() + self.guards.len();
        self.listeners.retain(|(l, _, _)| *l != id);
        self.guards.retain(|(l, _, _)| *l != id);
        before != self.listeners.len() + self.guards.len()
    }

    pub fn unbind_all(&mut self) {
        self.listeners.clear();
        self.guards.clear();
    }

    pub fn fire(&mut self, event: Event) {
        if self.silent {
            return;
        }
        let kind = event.kind();
        for (_, k, listener) in &mut self.listeners {
            if *k == kind {
                listener(&event);
            }
        }
    }

    /// Logical AND over every guard bound to `condition`; `true` when none is bound.
    pub fn check_condition(&self, condition: Condition, connection: &Connection) -> bool {
        self.guards
            .iter()
            .filter(|(_, c, _)| *c == condition)
            .all(|(_, _, guard)| guard(connection))
    }

    /// Suppresses (or re-enables) firing; returns the previous setting.
    pub fn set_silent(&mut self, silent: bool) -> bool {
        std::mem::replace(&mut self.silent, silent)
    }

    pub fn is_silent(&self) -> bool {
        self.silent
    }
}
