use std::{error::Error, fmt};

/// Failures inside the document store itself: (de)serialization of the
/// backing file and disk io. Anything else the store expresses as an
/// absent document rather than an error.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("io failed on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Catalog-level error, tagged so handlers can map each kind to its own
/// status code instead of collapsing everything into a 500.
#[derive(Debug)]
pub enum CatalogError {
    NotFound(&'static str),
    InvalidInput(String),
    Store(StoreError),
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use CatalogError::*;
        match self {
            NotFound(entity) => write!(f, "{} not found", entity),
            InvalidInput(msg) => write!(f, "{}", msg),
            Store(e) => write!(f, "store failure: {}", e),
        }
    }
}

impl std::error::Error for CatalogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        use CatalogError::*;
        match self {
            Store(e) => Some(e as &dyn Error),
            _ => None,
        }
    }
}

impl From<StoreError> for CatalogError {
    fn from(error: StoreError) -> Self {
        CatalogError::Store(error)
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(error: serde_json::Error) -> Self {
        CatalogError::Store(StoreError::Serialization(error))
    }
}

impl CatalogError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        CatalogError::InvalidInput(msg.into())
    }
}
