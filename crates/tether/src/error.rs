pub type Result<T> = std::result::Result<T, Error>;

/// Which end of a connection a failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum End {
    Source,
    Target,
}

impl End {
    pub fn index(self) -> usize {
        match self {
            Self::Source => 0,
            Self::Target => 1,
        }
    }

    pub fn from_index(index: usize) -> Self {
        if index == 0 { Self::Source } else { Self::Target }
    }
}

impl std::fmt::Display for End {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Source => f.write_str("source"),
            Self::Target => f.write_str("target"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Cannot establish connection - source does not exist")]
    SourceMissing,

    #[error("Cannot establish connection - target does not exist")]
    TargetMissing,

    #[error("could not add connection; source endpoint is full")]
    SourceEndpointFull,

    #[error("could not add connection; target endpoint is full")]
    TargetEndpointFull,

    #[error("could not add connection; {end} definition is disabled")]
    DefinitionDisabled { end: End },

    #[error("could not add connection; {end} definition endpoint is full")]
    DefinitionEndpointFull { end: End },

    #[error("could not add connection; scopes `{source_scope}` and `{target_scope}` do not intersect")]
    ScopeMismatch {
        source_scope: String,
        target_scope: String,
    },

    #[error("invalid defaults: {0}")]
    Config(#[from] serde_json::Error),
}
