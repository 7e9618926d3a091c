//! Canonical cleaning of structured query bodies.
//!
//! Two bodies that mean the same thing must clean to the same value, and
//! cleaning a clean body must change nothing. Serialized tokens and the dirty
//! check both compare cleaned output byte for byte.

use crate::types::{DatasetQuery, StructuredBody};
use serde_json::Value;

const AND: &str = "and";
const ROWS: &str = "rows";

impl StructuredBody {
    /// Canonical form of this body
    pub fn cleaned(&self) -> StructuredBody {
        StructuredBody {
            source_table: self.source_table.clone(),
            aggregation: non_empty(
                self.aggregation
                    .iter()
                    .flatten()
                    .filter(|clause| !is_rows_marker(clause))
                    .cloned()
                    .collect(),
            ),
            breakout: self.breakout.as_deref().and_then(dedup),
            filter: self.filter.as_ref().and_then(clean_filter),
            order_by: self.order_by.as_deref().and_then(dedup),
            fields: self.fields.as_deref().and_then(dedup),
            limit: self.limit,
            extra: self
                .extra
                .iter()
                .filter(|(_, value)| !is_blank(value))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        }
    }
}

impl DatasetQuery {
    /// Copy of this payload with every structured body cleaned, including
    /// the members of a composite payload
    pub fn cleaned(&self) -> DatasetQuery {
        DatasetQuery {
            query: self.query.as_ref().map(StructuredBody::cleaned),
            queries: self
                .queries
                .as_ref()
                .map(|members| members.iter().map(DatasetQuery::cleaned).collect()),
            ..self.clone()
        }
    }
}

/// Whether a clause is the legacy `["rows"]` aggregation marker
pub(crate) fn is_rows_marker(clause: &Value) -> bool {
    match clause {
        Value::Array(items) => items.len() == 1 && items[0] == ROWS,
        Value::String(s) => s == ROWS,
        _ => false,
    }
}

/// Top-level clauses of a filter, with nested `and` compounds flattened
pub(crate) fn filter_clauses(filter: &Value) -> Vec<Value> {
    let mut clauses = Vec::new();
    collect_clauses(filter, &mut clauses);
    clauses
}

fn collect_clauses(filter: &Value, out: &mut Vec<Value>) {
    match filter {
        Value::Null => {}
        Value::Array(items) if items.is_empty() => {}
        Value::Array(items) if items[0] == AND => {
            for clause in &items[1..] {
                collect_clauses(clause, out);
            }
        }
        clause => {
            if !out.contains(clause) {
                out.push(clause.clone());
            }
        }
    }
}

/// Rebuild a filter value from a clause list
pub(crate) fn combine_clauses(mut clauses: Vec<Value>) -> Option<Value> {
    match clauses.len() {
        0 => None,
        1 => clauses.pop(),
        _ => {
            let mut compound = Vec::with_capacity(clauses.len() + 1);
            compound.push(Value::String(AND.to_string()));
            compound.extend(clauses);
            Some(Value::Array(compound))
        }
    }
}

fn clean_filter(filter: &Value) -> Option<Value> {
    combine_clauses(filter_clauses(filter))
}

fn dedup(items: &[Value]) -> Option<Vec<Value>> {
    let mut out: Vec<Value> = Vec::with_capacity(items.len());
    for item in items {
        if !out.contains(item) {
            out.push(item.clone());
        }
    }
    non_empty(out)
}

fn non_empty(items: Vec<Value>) -> Option<Vec<Value>> {
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(value: Value) -> StructuredBody {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_empty_clauses_are_elided() {
        let cleaned = body(json!({
            "source_table": 1,
            "aggregation": [],
            "breakout": [],
            "filter": ["and"],
            "order_by": [],
            "expressions": {},
            "joins": null
        }))
        .cleaned();

        assert_eq!(cleaned, StructuredBody::with_source_table(1));
    }

    #[test]
    fn test_rows_marker_is_dropped() {
        let cleaned = body(json!({"source_table": 1, "aggregation": [["rows"]]})).cleaned();
        assert!(cleaned.aggregation.is_none());

        let cleaned =
            body(json!({"source_table": 1, "aggregation": [["rows"], ["count"]]})).cleaned();
        assert_eq!(cleaned.aggregation, Some(vec![json!(["count"])]));
    }

    #[test]
    fn test_nested_and_filters_flatten() {
        let cleaned = body(json!({
            "source_table": 1,
            "filter": ["and", ["=", ["field", 1, null], 5], ["and", [">", ["field", 2, null], 3]]]
        }))
        .cleaned();

        assert_eq!(
            cleaned.filter,
            Some(json!(["and", ["=", ["field", 1, null], 5], [">", ["field", 2, null], 3]]))
        );
    }

    #[test]
    fn test_single_clause_and_collapses() {
        let cleaned = body(json!({
            "source_table": 1,
            "filter": ["and", ["=", ["field", 1, null], 5], ["=", ["field", 1, null], 5]]
        }))
        .cleaned();

        assert_eq!(cleaned.filter, Some(json!(["=", ["field", 1, null], 5])));
    }

    #[test]
    fn test_duplicate_breakouts_removed_in_order() {
        let cleaned = body(json!({
            "source_table": 1,
            "breakout": [["field", 2, null], ["field", 1, null], ["field", 2, null]]
        }))
        .cleaned();

        assert_eq!(
            cleaned.breakout,
            Some(vec![json!(["field", 2, null]), json!(["field", 1, null])])
        );
    }

    #[test]
    fn test_cleaning_is_idempotent() {
        let once = body(json!({
            "source_table": 1,
            "aggregation": [["rows"], ["sum", ["field", 3, null]]],
            "breakout": [["field", 2, null], ["field", 2, null]],
            "filter": ["and", ["and", ["=", ["field", 1, null], 5]], ["!=", ["field", 4, null], 0]],
            "limit": 10,
            "page": {}
        }))
        .cleaned();

        assert_eq!(once.cleaned(), once);
    }

    #[test]
    fn test_dataset_query_cleans_composite_members() {
        let dq: DatasetQuery = serde_json::from_value(json!({
            "type": "multi",
            "queries": [
                {"type": "query", "query": {"source_table": 1, "breakout": []}},
                {"type": "native", "native": {"query": "select 1"}}
            ]
        }))
        .unwrap();

        let cleaned = dq.cleaned();
        let members = cleaned.queries.unwrap();
        assert_eq!(members[0].query, Some(StructuredBody::with_source_table(1)));
        assert_eq!(members[1], dq.queries.as_ref().unwrap()[1]);
    }
}
