use crate::error::Result;
use crate::query::Query;
use crate::structured::StructuredQuery;
use crate::types::{DatasetQuery, StructuredBody};
use std::sync::Arc;
use tracing::debug;

/// Composite query made of several atomic queries
#[derive(Debug, Clone, PartialEq)]
pub struct MultiQuery {
    dataset_query: Arc<DatasetQuery>,
}

impl MultiQuery {
    pub(crate) fn new(dataset_query: Arc<DatasetQuery>) -> Self {
        Self { dataset_query }
    }

    pub fn dataset_query(&self) -> &Arc<DatasetQuery> {
        &self.dataset_query
    }

    pub fn database_id(&self) -> Option<i64> {
        self.dataset_query.database
    }

    /// Raw member payloads in declaration order
    pub fn members(&self) -> &[DatasetQuery] {
        self.dataset_query.queries.as_deref().unwrap_or(&[])
    }

    /// Decompose into atomic queries, in order. Nested composites are
    /// flattened in place.
    pub fn atomic_queries(&self) -> Result<Vec<Query>> {
        let mut atomic = Vec::with_capacity(self.members().len());
        for member in self.members() {
            match Query::from_dataset_query(Arc::new(member.clone()))? {
                Query::Multi(nested) => atomic.extend(nested.atomic_queries()?),
                query => atomic.push(query),
            }
        }
        Ok(atomic)
    }

    /// Runnable when there is at least one member and every member is
    pub fn can_run(&self) -> bool {
        match self.atomic_queries() {
            Ok(members) => !members.is_empty() && members.iter().all(Query::can_run),
            Err(_) => false,
        }
    }

    /// Split a single-breakout structured query into one member per
    /// aggregation. Every other clause (source, filter, breakout, expressions,
    /// joins, ordering, limit) is carried into each member unchanged.
    ///
    /// Returns `None` unless the query has exactly one breakout and is not a
    /// bare-rows query.
    pub fn from_structured(query: &StructuredQuery) -> Option<MultiQuery> {
        if query.breakouts().len() != 1 || query.is_bare_rows() {
            debug!(
                "Refusing multi-query conversion: {} breakouts, bare rows: {}",
                query.breakouts().len(),
                query.is_bare_rows()
            );
            return None;
        }

        let shared = StructuredBody {
            aggregation: None,
            ..query.body().clone()
        };

        let aggregations = query.aggregations();
        let members = if aggregations.is_empty() {
            vec![DatasetQuery::structured(query.database_id(), shared)]
        } else {
            aggregations
                .into_iter()
                .map(|aggregation| {
                    DatasetQuery::structured(
                        query.database_id(),
                        StructuredBody {
                            aggregation: Some(vec![aggregation.clone()]),
                            ..shared.clone()
                        },
                    )
                })
                .collect()
        };

        Some(Self::new(Arc::new(DatasetQuery::multi(members))))
    }

    /// Merge the members back into one structured query.
    ///
    /// Only possible when every member is structured and the members differ
    /// in nothing but their aggregations.
    pub fn to_structured(&self) -> Option<StructuredQuery> {
        let members = self.atomic_queries().ok()?;
        let structured: Vec<&StructuredQuery> = members
            .iter()
            .map(|member| member.as_structured().ok())
            .collect::<Option<_>>()?;
        let (first, rest) = structured.split_first()?;

        let shared = without_aggregation(first.body());
        let compatible = rest.iter().all(|member| {
            member.database_id() == first.database_id()
                && without_aggregation(member.body()) == shared
        });
        if !compatible {
            return None;
        }

        let aggregations: Vec<_> = structured
            .iter()
            .flat_map(|member| member.aggregations())
            .cloned()
            .collect();
        let body = StructuredBody {
            aggregation: Some(aggregations).filter(|a| !a.is_empty()),
            ..first.body().clone()
        };
        Some(StructuredQuery::new(Arc::new(DatasetQuery::structured(
            first.database_id(),
            body,
        ))))
    }
}

fn without_aggregation(body: &StructuredBody) -> StructuredBody {
    StructuredBody {
        aggregation: None,
        ..body.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::QueryKind;
    use serde_json::{json, Value};

    fn structured(body: Value) -> StructuredQuery {
        let dq = json!({"type": "query", "database": 1, "query": body});
        StructuredQuery::new(Arc::new(serde_json::from_value(dq).unwrap()))
    }

    fn multi(value: Value) -> MultiQuery {
        MultiQuery::new(Arc::new(serde_json::from_value(value).unwrap()))
    }

    #[test]
    fn test_atomic_queries_preserve_order() {
        let q = multi(json!({
            "type": "multi",
            "queries": [
                {"type": "native", "native": {"query": "select 1"}},
                {"type": "query", "query": {"source_table": 2}}
            ]
        }));
        let kinds: Vec<QueryKind> = q.atomic_queries().unwrap().iter().map(Query::kind).collect();
        assert_eq!(kinds, vec![QueryKind::Native, QueryKind::Structured]);
    }

    #[test]
    fn test_nested_composites_flatten() {
        let q = multi(json!({
            "type": "multi",
            "queries": [
                {"type": "query", "query": {"source_table": 1}},
                {"type": "multi", "queries": [
                    {"type": "query", "query": {"source_table": 2}},
                    {"type": "query", "query": {"source_table": 3}}
                ]}
            ]
        }));
        let tables: Vec<Option<i64>> = q
            .atomic_queries()
            .unwrap()
            .iter()
            .map(|m| m.as_structured().unwrap().table_id())
            .collect();
        assert_eq!(tables, vec![Some(1), Some(2), Some(3)]);
    }

    #[test]
    fn test_can_run_requires_every_member() {
        let runnable = multi(json!({
            "type": "multi",
            "queries": [
                {"type": "query", "query": {"source_table": 1}},
                {"type": "native", "native": {"query": "select 1"}}
            ]
        }));
        assert!(runnable.can_run());

        let blocked = multi(json!({
            "type": "multi",
            "queries": [
                {"type": "query", "query": {"source_table": 1}},
                {"type": "query", "query": {}}
            ]
        }));
        assert!(!blocked.can_run());

        assert!(!multi(json!({"type": "multi", "queries": []})).can_run());
        assert!(!multi(json!({"type": "multi", "queries": [{"type": "graph"}]})).can_run());
    }

    #[test]
    fn test_from_structured_splits_aggregations() {
        let source = structured(json!({
            "source_table": 1,
            "aggregation": [["count"], ["sum", ["field", 4, null]]],
            "breakout": [["field", 2, null]],
            "filter": ["=", ["field", 3, null], "a"]
        }));

        let converted = MultiQuery::from_structured(&source).unwrap();
        let members = converted.atomic_queries().unwrap();
        assert_eq!(members.len(), 2);

        let first = members[0].as_structured().unwrap();
        assert_eq!(first.aggregations(), vec![&json!(["count"])]);
        assert_eq!(first.breakouts(), source.breakouts());
        assert_eq!(first.filters(), source.filters());
        assert_eq!(first.table_id(), Some(1));

        let second = members[1].as_structured().unwrap();
        assert_eq!(second.aggregations(), vec![&json!(["sum", ["field", 4, null]])]);
    }

    #[test]
    fn test_from_structured_round_trips_content() {
        let source = structured(json!({
            "source_table": 1,
            "expressions": {"double": ["*", ["field", 4, null], 2]},
            "aggregation": [["count"], ["sum", ["expression", "double"]]],
            "breakout": [["field", 2, null]],
            "order_by": [["desc", ["aggregation", 0]]],
            "limit": 5
        }));

        let multi = MultiQuery::from_structured(&source).unwrap();
        for member in multi.atomic_queries().unwrap() {
            let body = member.as_structured().unwrap().body();
            assert!(body.extra.contains_key("expressions"));
            assert_eq!(body.limit, Some(5));
            assert_eq!(body.order_by, source.body().order_by);
        }

        let merged = MultiQuery::from_structured(&source)
            .unwrap()
            .to_structured()
            .unwrap();
        assert_eq!(merged.body(), source.body());
        assert_eq!(merged.database_id(), source.database_id());
    }

    #[test]
    fn test_from_structured_refuses_bare_rows() {
        let source = structured(json!({"source_table": 1}));
        assert!(MultiQuery::from_structured(&source).is_none());
    }

    #[test]
    fn test_from_structured_refuses_two_breakouts() {
        let source = structured(json!({
            "source_table": 1,
            "aggregation": [["count"]],
            "breakout": [["field", 2, null], ["field", 3, null]]
        }));
        assert!(MultiQuery::from_structured(&source).is_none());
    }

    #[test]
    fn test_to_structured_refuses_mismatched_members() {
        let q = multi(json!({
            "type": "multi",
            "queries": [
                {"type": "query", "query": {"source_table": 1, "aggregation": [["count"]]}},
                {"type": "query", "query": {"source_table": 2, "aggregation": [["count"]]}}
            ]
        }));
        assert!(q.to_structured().is_none());
    }
}
