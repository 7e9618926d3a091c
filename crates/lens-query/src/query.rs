use crate::classifier::{classify, QueryKind};
use crate::error::{QueryError, Result};
use crate::multi::MultiQuery;
use crate::native::NativeQuery;
use crate::structured::StructuredQuery;
use crate::types::DatasetQuery;
use serde_json::Value;
use std::sync::Arc;

/// A classified dataset query.
///
/// The variant set is closed: code that needs a variant-specific capability
/// asks for that variant and gets `InvalidVariantAccess` otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    Structured(StructuredQuery),
    Native(NativeQuery),
    Multi(MultiQuery),
}

impl Query {
    /// Classify a payload and wrap it in the matching variant
    pub fn from_dataset_query(dataset_query: Arc<DatasetQuery>) -> Result<Self> {
        Ok(match classify(&dataset_query)? {
            QueryKind::Structured => Query::Structured(StructuredQuery::new(dataset_query)),
            QueryKind::Native => Query::Native(NativeQuery::new(dataset_query)),
            QueryKind::Multi => Query::Multi(MultiQuery::new(dataset_query)),
        })
    }

    pub fn kind(&self) -> QueryKind {
        match self {
            Query::Structured(_) => QueryKind::Structured,
            Query::Native(_) => QueryKind::Native,
            Query::Multi(_) => QueryKind::Multi,
        }
    }

    /// The raw payload this query wraps
    pub fn dataset_query(&self) -> &Arc<DatasetQuery> {
        match self {
            Query::Structured(q) => q.dataset_query(),
            Query::Native(q) => q.dataset_query(),
            Query::Multi(q) => q.dataset_query(),
        }
    }

    pub fn database_id(&self) -> Option<i64> {
        self.dataset_query().database
    }

    pub fn is_atomic(&self) -> bool {
        self.kind().is_atomic()
    }

    /// Whether the payload is complete enough to execute
    pub fn can_run(&self) -> bool {
        match self {
            Query::Structured(q) => q.can_run(),
            Query::Native(q) => q.can_run(),
            Query::Multi(q) => q.can_run(),
        }
    }

    /// Atomic members: the query itself when atomic, the decomposed members
    /// of a composite otherwise
    pub fn atomic_queries(&self) -> Result<Vec<Query>> {
        match self {
            Query::Multi(q) => q.atomic_queries(),
            atomic => Ok(vec![atomic.clone()]),
        }
    }

    pub fn as_structured(&self) -> Result<&StructuredQuery> {
        match self {
            Query::Structured(q) => Ok(q),
            other => Err(other.invalid_access("as_structured")),
        }
    }

    pub fn as_native(&self) -> Result<&NativeQuery> {
        match self {
            Query::Native(q) => Ok(q),
            other => Err(other.invalid_access("as_native")),
        }
    }

    pub fn as_multi(&self) -> Result<&MultiQuery> {
        match self {
            Query::Multi(q) => Ok(q),
            other => Err(other.invalid_access("as_multi")),
        }
    }

    pub fn breakouts(&self) -> Result<&[Value]> {
        self.structured_for("breakouts").map(StructuredQuery::breakouts)
    }

    pub fn aggregations(&self) -> Result<Vec<&Value>> {
        self.structured_for("aggregations")
            .map(StructuredQuery::aggregations)
    }

    pub fn filters(&self) -> Result<Vec<Value>> {
        self.structured_for("filters").map(StructuredQuery::filters)
    }

    pub fn is_bare_rows(&self) -> Result<bool> {
        self.structured_for("is_bare_rows")
            .map(StructuredQuery::is_bare_rows)
    }

    pub fn query_text(&self) -> Result<&str> {
        match self {
            Query::Native(q) => Ok(q.query_text()),
            other => Err(other.invalid_access("query_text")),
        }
    }

    fn structured_for(&self, accessor: &'static str) -> Result<&StructuredQuery> {
        match self {
            Query::Structured(q) => Ok(q),
            other => Err(other.invalid_access(accessor)),
        }
    }

    fn invalid_access(&self, accessor: &'static str) -> QueryError {
        let variant = match self.kind() {
            QueryKind::Structured => "structured",
            QueryKind::Native => "native",
            QueryKind::Multi => "multi",
        };
        QueryError::invalid_variant_access(accessor, variant)
    }
}

impl From<StructuredQuery> for Query {
    fn from(query: StructuredQuery) -> Self {
        Query::Structured(query)
    }
}

impl From<NativeQuery> for Query {
    fn from(query: NativeQuery) -> Self {
        Query::Native(query)
    }
}

impl From<MultiQuery> for Query {
    fn from(query: MultiQuery) -> Self {
        Query::Multi(query)
    }
}
