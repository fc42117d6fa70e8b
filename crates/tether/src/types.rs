//! Named, reusable bundles of endpoint/connection parameters.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The name every connection type list is implicitly prefixed with.
pub const DEFAULT_TYPE: &str = "default";

/// Overlay spec as accepted from callers: either a bare kind (`"Arrow"`) or `[kind, params]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OverlaySpec {
    Kind(String),
    Full(String, Map<String, Value>),
}

/// Canonical `[kind, {id, ...params}]` overlay form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FullOverlaySpec {
    pub kind: String,
    pub params: Map<String, Value>,
}

impl FullOverlaySpec {
    pub fn id(&self) -> &str {
        self.params.get("id").and_then(Value::as_str).unwrap_or_default()
    }
}

impl OverlaySpec {
    /// Normalizes into the canonical form, generating an id when the spec carries none.
    pub fn to_full(&self) -> FullOverlaySpec {
        let (kind, mut params) = match self {
            Self::Kind(kind) => (kind.clone(), Map::new()),
            Self::Full(kind, params) => (kind.clone(), params.clone()),
        };
        let has_id = params
            .get("id")
            .and_then(Value::as_str)
            .is_some_and(|id| !id.is_empty());
        if !has_id {
            params.insert(
                "id".to_string(),
                Value::String(uuid::Uuid::new_v4().to_string()),
            );
        }
        FullOverlaySpec { kind, params }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TypeDescriptor {
    pub anchor: Option<Value>,
    pub anchors: Option<[Value; 2]>,
    pub endpoint: Option<Value>,
    pub endpoints: Option<[Value; 2]>,
    pub connector: Option<Value>,
    pub paint_style: Option<Value>,
    pub hover_paint_style: Option<Value>,
    pub endpoint_style: Option<Value>,
    pub endpoint_hover_style: Option<Value>,
    pub scope: Option<String>,
    pub css_class: Option<String>,
    pub detachable: Option<bool>,
    pub max_connections: Option<i32>,
    pub overlays: Vec<OverlaySpec>,
    pub parameters: Map<String, Value>,
}

/// A descriptor as stored by the registry: overlays normalized and keyed by overlay id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegisteredType {
    pub descriptor: TypeDescriptor,
    pub overlays: IndexMap<String, FullOverlaySpec>,
}

impl RegisteredType {
    fn from_descriptor(mut descriptor: TypeDescriptor) -> Self {
        let overlays = std::mem::take(&mut descriptor.overlays)
            .iter()
            .map(|spec| {
                let full = spec.to_full();
                (full.id().to_string(), full)
            })
            .collect();
        Self {
            descriptor,
            overlays,
        }
    }

    /// Folds `other` over `self`; values set in `other` win.
    pub fn merge_from(&mut self, other: &RegisteredType) {
        let d = &mut self.descriptor;
        let o = &other.descriptor;
        macro_rules! take_some {
            ($($field:ident),*) => {
                $(if o.$field.is_some() {
                    d.$field = o.$field.clone();
                })*
            };
        }
        take_some!(
            anchor,
            anchors,
            endpoint,
            endpoints,
            connector,
            paint_style,
            hover_paint_style,
            endpoint_style,
            endpoint_hover_style,
            scope,
            css_class,
            detachable,
            max_connections
        );
        for (k, v) in &o.parameters {
            d.parameters.insert(k.clone(), v.clone());
        }
        for (id, spec) in &other.overlays {
            self.overlays.insert(id.clone(), spec.clone());
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Connection,
    Endpoint,
}

/// Per-end endpoint and anchor specs derived from a list of connection types.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EndpointAndAnchorSpec {
    pub endpoints: [Option<Value>; 2],
    pub anchors: [Option<Value>; 2],
}

#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    connection_types: IndexMap<String, RegisteredType>,
    endpoint_types: IndexMap<String, RegisteredType>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_connection_type(&mut self, id: impl Into<String>, descriptor: TypeDescriptor) {
        self.connection_types
            .insert(id.into(), RegisteredType::from_descriptor(descriptor));
    }

    pub fn register_connection_types<I, S>(&mut self, types: I)
    where
        I: IntoIterator<Item = (S, TypeDescriptor)>,
        S: Into<String>,
    {
        for (id, descriptor) in types {
            self.register_connection_type(id, descriptor);
        }
    }

    pub fn register_endpoint_type(&mut self, id: impl Into<String>, descriptor: TypeDescriptor) {
        self.endpoint_types
            .insert(id.into(), RegisteredType::from_descriptor(descriptor));
    }

    pub fn register_endpoint_types<I, S>(&mut self, types: I)
    where
        I: IntoIterator<Item = (S, TypeDescriptor)>,
        S: Into<String>,
    {
        for (id, descriptor) in types {
            self.register_endpoint_type(id, descriptor);
        }
    }

    pub fn get_type(&self, id: &str, kind: TypeKind) -> Option<&RegisteredType> {
        match kind {
            TypeKind::Connection => self.connection_types.get(id),
            TypeKind::Endpoint => self.endpoint_types.get(id),
        }
    }

    /// Folds every registered type named in the whitespace-separated `type_names` (left to right,
    /// later wins). Returns `None` when none of the names is registered.
    pub fn resolve(&self, type_names: &str, kind: TypeKind) -> Option<RegisteredType> {
        let mut out: Option<RegisteredType> = None;
        for name in type_names.split_whitespace() {
            let Some(t) = self.get_type(name, kind) else {
                continue;
            };
            out.get_or_insert_with(RegisteredType::default).merge_from(t);
        }
        out
    }

    pub fn derive_endpoint_and_anchor_spec(
        &self,
        type_names: &str,
        dont_prepend_default: bool,
    ) -> EndpointAndAnchorSpec {
        let mut endpoints: Option<[Value; 2]> = None;
        let mut endpoint: Option<Value> = None;
        let mut anchors: Option<[Value; 2]> = None;
        let mut anchor: Option<Value> = None;

        let prefix = if dont_prepend_default {
            None
        } else {
            Some(DEFAULT_TYPE)
        };
        for name in prefix.into_iter().chain(type_names.split_whitespace()) {
            let Some(t) = self.get_type(name, TypeKind::Connection) else {
                continue;
            };
            let d = &t.descriptor;
            if d.endpoints.is_some() {
                endpoints = d.endpoints.clone();
            }
            if d.endpoint.is_some() {
                endpoint = d.endpoint.clone();
            }
            if d.anchors.is_some() {
                anchors = d.anchors.clone();
            }
            if d.anchor.is_some() {
                anchor = d.anchor.clone();
            }
        }

        EndpointAndAnchorSpec {
            endpoints: match endpoints {
                Some([s, t]) => [Some(s), Some(t)],
                None => [endpoint.clone(), endpoint],
            },
            anchors: match anchors {
                Some([s, t]) => [Some(s), Some(t)],
                None => [anchor.clone(), anchor],
            },
        }
    }

    pub fn clear(&mut self) {
        self.connection_types.clear();
        self.endpoint_types.clear();
    }
}
