use crate::cleaning::{combine_clauses, filter_clauses, is_rows_marker};
use crate::types::{DatasetQuery, SourceTable, StructuredBody};
use serde_json::Value;
use std::sync::Arc;

static EMPTY_BODY: StructuredBody = StructuredBody::EMPTY;

/// Atomic structured query.
///
/// Every builder returns a new value backed by a fresh payload; the payload
/// this query was created from is never touched.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredQuery {
    dataset_query: Arc<DatasetQuery>,
}

impl StructuredQuery {
    pub(crate) fn new(dataset_query: Arc<DatasetQuery>) -> Self {
        Self { dataset_query }
    }

    /// Start an empty structured query against a database
    pub fn for_database(database: Option<i64>) -> Self {
        Self::new(Arc::new(DatasetQuery::structured(
            database,
            StructuredBody::default(),
        )))
    }

    pub fn dataset_query(&self) -> &Arc<DatasetQuery> {
        &self.dataset_query
    }

    pub fn body(&self) -> &StructuredBody {
        self.dataset_query
            .query
            .as_ref()
            .unwrap_or(&EMPTY_BODY)
    }

    pub fn database_id(&self) -> Option<i64> {
        self.dataset_query.database
    }

    pub fn source_table(&self) -> Option<&SourceTable> {
        self.body().source_table.as_ref()
    }

    pub fn table_id(&self) -> Option<i64> {
        self.source_table().and_then(SourceTable::table_id)
    }

    /// Aggregations, not counting the legacy bare-rows marker
    pub fn aggregations(&self) -> Vec<&Value> {
        self.body()
            .aggregation
            .iter()
            .flatten()
            .filter(|clause| !is_rows_marker(clause))
            .collect()
    }

    pub fn breakouts(&self) -> &[Value] {
        self.body().breakout.as_deref().unwrap_or(&[])
    }

    /// Top-level filter clauses with `and` compounds flattened
    pub fn filters(&self) -> Vec<Value> {
        self.body()
            .filter
            .as_ref()
            .map(filter_clauses)
            .unwrap_or_default()
    }

    pub fn order_bys(&self) -> &[Value] {
        self.body().order_by.as_deref().unwrap_or(&[])
    }

    pub fn limit(&self) -> Option<u64> {
        self.body().limit
    }

    /// No aggregation and no breakout: the query returns raw rows
    pub fn is_bare_rows(&self) -> bool {
        self.aggregations().is_empty() && self.breakouts().is_empty()
    }

    /// A structured query needs a source to run against
    pub fn can_run(&self) -> bool {
        self.source_table().is_some()
    }

    /// Canonical form of this query
    pub fn clean(&self) -> StructuredQuery {
        Self::new(Arc::new(self.dataset_query.cleaned()))
    }

    /// Drop every clause, keeping the database and source table
    pub fn reset(&self) -> StructuredQuery {
        let source_table = self.source_table().cloned();
        self.update_body(|body| {
            *body = StructuredBody {
                source_table,
                ..StructuredBody::default()
            }
        })
    }

    /// Point the query at another table. Clauses reference fields of the
    /// old table, so they are dropped.
    pub fn set_source_table(&self, source_table: impl Into<SourceTable>) -> StructuredQuery {
        let source_table = source_table.into();
        self.update_body(|body| *body = StructuredBody::with_source_table(source_table))
    }

    pub fn set_database(&self, database: i64) -> StructuredQuery {
        let mut dataset_query = (*self.dataset_query).clone();
        dataset_query.database = Some(database);
        Self::new(Arc::new(dataset_query))
    }

    pub fn add_aggregation(&self, aggregation: Value) -> StructuredQuery {
        self.update_body(|body| {
            let clauses = body.aggregation.get_or_insert_with(Vec::new);
            clauses.retain(|clause| !is_rows_marker(clause));
            clauses.push(aggregation);
        })
    }

    pub fn remove_aggregation(&self, index: usize) -> StructuredQuery {
        self.update_body(|body| {
            let mut clauses: Vec<Value> = body
                .aggregation
                .take()
                .unwrap_or_default()
                .into_iter()
                .filter(|clause| !is_rows_marker(clause))
                .collect();
            if index < clauses.len() {
                clauses.remove(index);
            }
            body.aggregation = Some(clauses).filter(|c| !c.is_empty());
        })
    }

    pub fn clear_aggregations(&self) -> StructuredQuery {
        self.update_body(|body| body.aggregation = None)
    }

    pub fn add_breakout(&self, breakout: Value) -> StructuredQuery {
        self.update_body(|body| body.breakout.get_or_insert_with(Vec::new).push(breakout))
    }

    pub fn update_breakout(&self, index: usize, breakout: Value) -> StructuredQuery {
        self.update_body(|body| {
            if let Some(slot) = body.breakout.as_mut().and_then(|b| b.get_mut(index)) {
                *slot = breakout;
            }
        })
    }

    pub fn remove_breakout(&self, index: usize) -> StructuredQuery {
        self.update_body(|body| {
            if let Some(breakouts) = body.breakout.as_mut() {
                if index < breakouts.len() {
                    breakouts.remove(index);
                }
                if breakouts.is_empty() {
                    body.breakout = None;
                }
            }
        })
    }

    pub fn clear_breakouts(&self) -> StructuredQuery {
        self.update_body(|body| body.breakout = None)
    }

    /// Add a filter clause, combining with existing clauses via `and`
    pub fn add_filter(&self, filter: Value) -> StructuredQuery {
        self.update_body(|body| {
            let mut clauses = body.filter.as_ref().map(filter_clauses).unwrap_or_default();
            for clause in filter_clauses(&filter) {
                if !clauses.contains(&clause) {
                    clauses.push(clause);
                }
            }
            body.filter = combine_clauses(clauses);
        })
    }

    pub fn clear_filters(&self) -> StructuredQuery {
        self.update_body(|body| body.filter = None)
    }

    pub fn set_limit(&self, limit: Option<u64>) -> StructuredQuery {
        self.update_body(|body| body.limit = limit)
    }

    fn update_body(&self, update: impl FnOnce(&mut StructuredBody)) -> StructuredQuery {
        let mut dataset_query = (*self.dataset_query).clone();
        update(dataset_query.query.get_or_insert_with(StructuredBody::default));
        Self::new(Arc::new(dataset_query))
    }
}
