//! # lens-query
//!
//! Dataset query payloads and the closed set of query kinds built on them.
//!
//! A card stores its query as a loosely-typed payload with a `type`
//! discriminant. This crate decides which kind of query a payload is and
//! wraps it in a variant that only exposes what that kind supports:
//!
//! - **StructuredQuery**: MBQL-style body with source table, aggregations,
//!   breakouts and filters
//! - **NativeQuery**: native-language text, kept verbatim
//! - **MultiQuery**: composite of several atomic queries
//!
//! Payloads are shared behind `Arc` and never mutated; every builder
//! returns a new query over a new payload.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use lens_query::{DatasetQuery, Query, QueryKind, StructuredBody};
//!
//! let payload = DatasetQuery::structured(Some(1), StructuredBody::with_source_table(10));
//! let query = Query::from_dataset_query(Arc::new(payload)).unwrap();
//!
//! assert_eq!(query.kind(), QueryKind::Structured);
//! assert!(query.can_run());
//! assert!(query.as_native().is_err());
//! ```
//!
//! ## Canonical cleaning
//!
//! `DatasetQuery::cleaned` produces the canonical form used for URL tokens
//! and dirty checks: empty clauses and the legacy `["rows"]` aggregation are
//! dropped, duplicate breakouts and filter clauses are removed, nested `and`
//! filters are flattened, and keys are emitted in a fixed order.

pub mod classifier;
pub mod cleaning;
pub mod error;
pub mod multi;
pub mod native;
pub mod query;
pub mod structured;
pub mod types;

// Re-export commonly used items
pub use classifier::{classify, QueryKind};
pub use error::{QueryError, Result};
pub use multi::MultiQuery;
pub use native::NativeQuery;
pub use query::Query;
pub use structured::StructuredQuery;
pub use types::{
    DatasetQuery, NativeBody, SourceTable, StructuredBody, MULTI_QUERY_TYPE, NATIVE_QUERY_TYPE,
    STRUCTURED_QUERY_TYPE,
};
