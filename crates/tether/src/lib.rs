#![forbid(unsafe_code)]

//! Headless endpoint/connection lifecycle manager for diagram editors.
//!
//! `tether` keeps the mutable graph behind a node editor consistent: which elements are
//! managed, which endpoints sit on them, which connections join those endpoints, and which
//! redraws a change requires. Geometry, connector paths and painting are delegated to a
//! [`Router`]; element primitives (attributes, classes, measurement) to an [`ElementAdapter`].
//!
//! Design goals:
//! - every handle is a plain id into maps owned by the [`Instance`]
//! - deleting one record cascades through the graph without dangling references
//! - element measurement is memoized per redraw pass

pub mod adapter;
pub mod config;
pub mod connection;
pub mod definitions;
pub mod endpoint;
pub mod error;
pub mod events;
pub mod graph;
pub mod group;
pub mod ids;
pub mod instance;
pub mod params;
pub mod router;
pub mod selection;
pub mod types;
pub mod viewport;

pub use adapter::{ElementAdapter, MemoryAdapter};
pub use config::{DEFAULT_SCOPE, Defaults};
pub use connection::{Connection, DetachGuard, ProxyRecord};
pub use definitions::{ANY_TYPE, Definition, DefinitionKind, DefinitionOptions};
pub use endpoint::Endpoint;
pub use error::{End, Error, Result};
pub use events::{
    Condition, ConnectionEventInfo, ConnectionMovedInfo, Event, EventKind, ListenerId,
};
pub use graph::Graph;
pub use group::{GroupManager, NoGroups};
pub use ids::{ConnectionId, ElementId, ElementRef, EndpointId, Timestamp};
pub use instance::{Instance, ManagedElement, UpdateOffset, scope_match};
pub use params::{ConnectParams, DeleteOptions, EndpointOptions, Terminal};
pub use router::{AnchorInput, AnchorPlacement, RedrawResult, Router, Scene, TopologyRouter};
pub use selection::{
    ConnectionSelection, EndpointSelection, Filter, SelectEndpointOptions, SelectOptions,
};
pub use types::{
    DEFAULT_TYPE, EndpointAndAnchorSpec, OverlaySpec, RegisteredType, TypeDescriptor, TypeKind,
};
pub use viewport::{Offset, Size, Viewport, ViewportElement};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests;
