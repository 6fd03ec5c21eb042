use std::{fmt, time::Duration};

use thiserror::Error;

/// Which backing store an operation touched.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum StoreKind {
    Relational,
    Document,
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreKind::Relational => f.write_str("relational"),
            StoreKind::Document => f.write_str("document"),
        }
    }
}

pub type HrResult<T> = Result<T, HrError>;

#[derive(Debug, Error)]
pub enum HrError {
    /// A write was asked to persist nothing. No store is contacted.
    #[error("invalid argument: {0} is required")]
    InvalidArgument(&'static str),
    #[error("{store} store failure")]
    Store {
        store: StoreKind,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("{store} store did not answer within {limit:?}")]
    Timeout { store: StoreKind, limit: Duration },
    #[error("{store} store holds gender ordinal {value}, expected 0..=2")]
    InvalidGender { store: StoreKind, value: i32 },
}

impl HrError {
    pub fn relational(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Store {
            store: StoreKind::Relational,
            source: err.into(),
        }
    }

    pub fn document(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Store {
            store: StoreKind::Document,
            source: err.into(),
        }
    }

    /// The store an error came from, if any.
    pub fn store(&self) -> Option<StoreKind> {
        match self {
            HrError::InvalidArgument(_) => None,
            HrError::Store { store, .. }
            | HrError::Timeout { store, .. }
            | HrError::InvalidGender { store, .. } => Some(*store),
        }
    }

    pub fn is_store_failure(&self) -> bool {
        self.store().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn store_failures_name_their_store() {
        let err = HrError::document(io::Error::other("connection refused"));
        assert_eq!(err.store(), Some(StoreKind::Document));
        assert_eq!(err.to_string(), "document store failure");
        assert!(err.is_store_failure());
    }

    #[test]
    fn invalid_argument_is_not_a_store_failure() {
        let err = HrError::InvalidArgument("employee");
        assert!(!err.is_store_failure());
        assert_eq!(err.to_string(), "invalid argument: employee is required");
    }

    #[test]
    fn source_is_preserved() {
        let err = HrError::relational(sea_orm::DbErr::Custom("duplicate key".into()));
        let source = std::error::Error::source(&err)
            .map(|s| s.to_string())
            .unwrap_or_default();
        assert!(source.contains("duplicate key"), "source: {source}");
    }
}
