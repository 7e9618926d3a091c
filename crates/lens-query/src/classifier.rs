use crate::error::{QueryError, Result};
use crate::types::{DatasetQuery, NATIVE_QUERY_TYPE, STRUCTURED_QUERY_TYPE};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{trace, warn};

/// The kind of query a dataset query payload represents
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryKind {
    /// Structured (MBQL-style) atomic query
    Structured,
    /// Native-language atomic query
    Native,
    /// Composite of several atomic queries
    Multi,
}

impl QueryKind {
    /// Whether this kind is a single executable query
    pub fn is_atomic(&self) -> bool {
        !matches!(self, QueryKind::Multi)
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryKind::Structured => write!(f, "structured"),
            QueryKind::Native => write!(f, "native"),
            QueryKind::Multi => write!(f, "multi"),
        }
    }
}

/// Decide which query kind a payload represents.
///
/// Composite structure wins over the discriminant, then the structured
/// marker, then the native marker. Anything else is rejected.
pub fn classify(dataset_query: &DatasetQuery) -> Result<QueryKind> {
    let kind = if dataset_query.is_composite() {
        QueryKind::Multi
    } else if dataset_query.query_type == STRUCTURED_QUERY_TYPE {
        QueryKind::Structured
    } else if dataset_query.query_type == NATIVE_QUERY_TYPE {
        QueryKind::Native
    } else {
        warn!("Unknown dataset query type: {:?}", dataset_query.query_type);
        return Err(QueryError::unknown_query_type(
            dataset_query.query_type.clone(),
        ));
    };

    trace!("Classified dataset query as {}", kind);
    Ok(kind)
}
