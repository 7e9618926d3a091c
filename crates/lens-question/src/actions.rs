//! Visualization and drill transformations.
//!
//! The card-level logic sits behind `QueryActions` so callers can plug in
//! their own catalog of actions. `StructuredActions` covers structured
//! queries; every action returns `None` when it does not apply.

use crate::card::Card;
use crate::metadata::{Field, Table};
use crate::question::Question;
use lens_query::{Query, StructuredQuery};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// A clicked dimension: a column reference and the value under the cursor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionValue {
    pub column: Value,
    pub value: Value,
}

impl DimensionValue {
    pub fn new(column: Value, value: Value) -> Self {
        Self { column, value }
    }

    fn filter_clause(&self) -> Value {
        if self.value.is_null() {
            json!(["is-null", self.column])
        } else {
            json!(["=", self.column, self.value])
        }
    }
}

/// The interaction mode a question's query puts the UI in
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryMode {
    /// Native query
    Native,
    /// Single row picked by primary key
    Object,
    /// Raw rows, possibly filtered
    Segment,
    /// Aggregations without breakouts
    Metric,
    /// Aggregations over a single time breakout
    Timeseries,
    /// Aggregations over other breakouts
    Pivot,
}

impl fmt::Display for QueryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryMode::Native => write!(f, "native"),
            QueryMode::Object => write!(f, "object"),
            QueryMode::Segment => write!(f, "segment"),
            QueryMode::Metric => write!(f, "metric"),
            QueryMode::Timeseries => write!(f, "timeseries"),
            QueryMode::Pivot => write!(f, "pivot"),
        }
    }
}

/// Card-level transformations. Each is a pure function of its inputs.
pub trait QueryActions: Send + Sync {
    fn summarize(&self, card: &Card, aggregation: &Value, table: Option<&Table>) -> Option<Card>;

    fn breakout(&self, card: &Card, breakout: &Value, table: Option<&Table>) -> Option<Card>;

    fn pivot(
        &self,
        card: &Card,
        breakouts: &[Value],
        table: Option<&Table>,
        dimensions: &[DimensionValue],
    ) -> Option<Card>;

    fn filter(&self, card: &Card, operator: &str, column: &Value, value: &Value) -> Option<Card>;

    fn drill_underlying_records(&self, card: &Card, dimensions: &[DimensionValue])
        -> Option<Card>;

    fn to_underlying_records(&self, card: &Card) -> Option<Card>;

    /// Query filtered down to the row whose primary key is `value`
    fn drill_pk(&self, query: &StructuredQuery, field: &Field, value: &Value)
        -> Option<StructuredQuery>;

    fn mode(&self, card: &Card, table: Option<&Table>) -> Option<QueryMode>;
}

/// Built-in actions for structured queries
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuredActions;

impl StructuredActions {
    fn structured(card: &Card) -> Option<StructuredQuery> {
        let dataset_query = card.dataset_query.clone()?;
        match Query::from_dataset_query(dataset_query).ok()? {
            Query::Structured(query) => Some(query),
            other => {
                debug!("Structured action not applicable to {} query", other.kind());
                None
            }
        }
    }

    fn with_dimension_filters(
        query: StructuredQuery,
        dimensions: &[DimensionValue],
    ) -> StructuredQuery {
        dimensions
            .iter()
            .fold(query, |query, dimension| query.add_filter(dimension.filter_clause()))
    }

    fn is_temporal(breakout: &Value) -> bool {
        let Some(clause) = breakout.as_array() else {
            return false;
        };
        if clause.first().and_then(Value::as_str) == Some("datetime-field") {
            return true;
        }
        clause
            .last()
            .and_then(Value::as_object)
            .map(|options| options.contains_key("temporal-unit"))
            .unwrap_or(false)
    }

    fn is_pk_filter(clause: &Value, table: Option<&Table>) -> bool {
        let Some(clause) = clause.as_array() else {
            return false;
        };
        if clause.len() != 3 || clause[0] != "=" {
            return false;
        }
        let field_id = clause[1]
            .as_array()
            .filter(|reference| reference.first().and_then(Value::as_str) == Some("field"))
            .and_then(|reference| reference.get(1))
            .and_then(Value::as_i64);

        match (field_id, table) {
            (Some(id), Some(table)) => table.primary_keys().any(|pk| pk.id == id),
            _ => false,
        }
    }
}

impl QueryActions for StructuredActions {
    fn summarize(&self, card: &Card, aggregation: &Value, _table: Option<&Table>) -> Option<Card> {
        let query = Self::structured(card)?.add_aggregation(aggregation.clone());
        Some(card.with_dataset_query(query.dataset_query().clone()))
    }

    fn breakout(&self, card: &Card, breakout: &Value, _table: Option<&Table>) -> Option<Card> {
        let query = Self::structured(card)?.add_breakout(breakout.clone());
        Some(card.with_dataset_query(query.dataset_query().clone()))
    }

    fn pivot(
        &self,
        card: &Card,
        breakouts: &[Value],
        _table: Option<&Table>,
        dimensions: &[DimensionValue],
    ) -> Option<Card> {
        let query = Self::structured(card)?.clear_breakouts();
        let query = Self::with_dimension_filters(query, dimensions);
        let query = breakouts
            .iter()
            .fold(query, |query, breakout| query.add_breakout(breakout.clone()));
        Some(card.with_dataset_query(query.dataset_query().clone()))
    }

    fn filter(&self, card: &Card, operator: &str, column: &Value, value: &Value) -> Option<Card> {
        let query = Self::structured(card)?.add_filter(json!([operator, column, value]));
        Some(card.with_dataset_query(query.dataset_query().clone()))
    }

    fn drill_underlying_records(
        &self,
        card: &Card,
        dimensions: &[DimensionValue],
    ) -> Option<Card> {
        let query = Self::structured(card)?
            .clear_aggregations()
            .clear_breakouts();
        let query = Self::with_dimension_filters(query, dimensions);
        Some(
            card.with_dataset_query(query.dataset_query().clone())
                .with_display("table"),
        )
    }

    fn to_underlying_records(&self, card: &Card) -> Option<Card> {
        let query = Self::structured(card)?
            .clear_aggregations()
            .clear_breakouts();
        Some(
            card.with_dataset_query(query.dataset_query().clone())
                .with_display("table"),
        )
    }

    fn drill_pk(
        &self,
        query: &StructuredQuery,
        field: &Field,
        value: &Value,
    ) -> Option<StructuredQuery> {
        let query = if query.table_id() == Some(field.table_id) {
            query.reset()
        } else {
            query.set_source_table(field.table_id)
        };
        Some(query.add_filter(json!(["=", field.reference(), value])))
    }

    fn mode(&self, card: &Card, table: Option<&Table>) -> Option<QueryMode> {
        let dataset_query = card.dataset_query.clone()?;
        let query = match Query::from_dataset_query(dataset_query).ok()? {
            Query::Native(_) => return Some(QueryMode::Native),
            Query::Multi(_) => return None,
            Query::Structured(query) => query,
        };

        let aggregations = query.aggregations().len();
        let breakouts = query.breakouts();

        Some(match (aggregations, breakouts.len()) {
            (0, 0) => {
                let filters = query.filters();
                if filters.len() == 1 && Self::is_pk_filter(&filters[0], table) {
                    QueryMode::Object
                } else {
                    QueryMode::Segment
                }
            }
            (_, 0) => QueryMode::Metric,
            (_, 1) if Self::is_temporal(&breakouts[0]) => QueryMode::Timeseries,
            _ => QueryMode::Pivot,
        })
    }
}

impl Question {
    fn with_action(&self, card: Option<Card>) -> Option<Question> {
        card.map(|card| self.set_card(card))
    }

    pub fn summarize(&self, actions: &dyn QueryActions, aggregation: &Value) -> Option<Question> {
        let table = self.table_metadata();
        self.with_action(actions.summarize(self.card(), aggregation, table.as_deref()))
    }

    pub fn breakout(&self, actions: &dyn QueryActions, breakout: &Value) -> Option<Question> {
        let table = self.table_metadata();
        self.with_action(actions.breakout(self.card(), breakout, table.as_deref()))
    }

    pub fn pivot(
        &self,
        actions: &dyn QueryActions,
        breakouts: &[Value],
        dimensions: &[DimensionValue],
    ) -> Option<Question> {
        let table = self.table_metadata();
        self.with_action(actions.pivot(self.card(), breakouts, table.as_deref(), dimensions))
    }

    pub fn filter(
        &self,
        actions: &dyn QueryActions,
        operator: &str,
        column: &Value,
        value: &Value,
    ) -> Option<Question> {
        self.with_action(actions.filter(self.card(), operator, column, value))
    }

    pub fn drill_underlying_records(
        &self,
        actions: &dyn QueryActions,
        dimensions: &[DimensionValue],
    ) -> Option<Question> {
        self.with_action(actions.drill_underlying_records(self.card(), dimensions))
    }

    pub fn to_underlying_records(&self, actions: &dyn QueryActions) -> Option<Question> {
        self.with_action(actions.to_underlying_records(self.card()))
    }

    /// Same query shown as a plain table
    pub fn to_underlying_data(&self) -> Question {
        self.set_display("table")
    }

    /// Drill to the row whose primary key `field` equals `value`.
    ///
    /// Only structured questions support this; others return `None`.
    pub fn drill_pk(
        &self,
        actions: &dyn QueryActions,
        field: &Field,
        value: &Value,
    ) -> Option<Question> {
        let query = self.query().ok()?;
        let Query::Structured(structured) = query.query() else {
            debug!("drill_pk not applicable to {} query", query.kind());
            return None;
        };
        let drilled = actions.drill_pk(structured, field, value)?;
        Some(self.set_dataset_query(Arc::clone(drilled.dataset_query())))
    }

    pub fn mode(&self, actions: &dyn QueryActions) -> Option<QueryMode> {
        let table = self.table_metadata();
        actions.mode(self.card(), table.as_deref())
    }
}
