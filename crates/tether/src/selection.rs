use crate::ids::{ConnectionId, ElementId, EndpointId};

/// A match list for selection queries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Filter<T> {
    /// No list given.
    #[default]
    Unset,
    /// The `"*"` wildcard.
    Any,
    Only(Vec<T>),
}

impl<T> Filter<T> {
    pub fn only(items: impl IntoIterator<Item = impl Into<T>>) -> Self {
        Self::Only(items.into_iter().map(Into::into).collect())
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, Self::Any)
    }

    /// A non-empty explicit list.
    pub fn is_populated(&self) -> bool {
        matches!(self, Self::Only(items) if !items.is_empty())
    }

    /// An unset (or empty) list matches everything unless `missing_is_false`.
    pub fn matches<Q>(&self, value: &Q, missing_is_false: bool) -> bool
    where
        T: PartialEq<Q>,
        Q: ?Sized,
    {
        match self {
            Self::Any => true,
            Self::Only(items) if !items.is_empty() => items.iter().any(|i| i == value),
            Self::Unset | Self::Only(_) => !missing_is_false,
        }
    }
}

impl Filter<String> {
    /// Parses `"*"` as the wildcard, anything else as a single-item list.
    pub fn scope(scope: &str) -> Self {
        if scope == "*" {
            Self::Any
        } else {
            Self::Only(vec![scope.to_string()])
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SelectOptions {
    pub scope: Filter<String>,
    pub source: Filter<ElementId>,
    pub target: Filter<ElementId>,
}

#[derive(Debug, Clone, Default)]
pub struct SelectEndpointOptions {
    pub scope: Filter<String>,
    pub element: Filter<ElementId>,
    pub source: Filter<ElementId>,
    pub target: Filter<ElementId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionSelection(Vec<ConnectionId>);

impl ConnectionSelection {
    pub(crate) fn new(ids: Vec<ConnectionId>) -> Self {
        Self(ids)
    }

    pub fn ids(&self) -> &[ConnectionId] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.0.contains(&id)
    }
}

impl IntoIterator for ConnectionSelection {
    type Item = ConnectionId;
    type IntoIter = std::vec::IntoIter<ConnectionId>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointSelection(Vec<EndpointId>);

impl EndpointSelection {
    pub(crate) fn new(ids: Vec<EndpointId>) -> Self {
        Self(ids)
    }

    pub fn ids(&self) -> &[EndpointId] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, id: EndpointId) -> bool {
        self.0.contains(&id)
    }
}

impl IntoIterator for EndpointSelection {
    type Item = EndpointId;
    type IntoIter = std::vec::IntoIter<EndpointId>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
