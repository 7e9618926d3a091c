use crate::card::{Card, CardId};
use crate::config::QuestionDefaults;
use crate::metadata::{Metadata, Table};
use crate::parameters::{card_parameters, Parameter, ParameterValues};
use lens_query::{DatasetQuery, Query, QueryError, QueryKind, SourceTable, StructuredBody};
use once_cell::sync::OnceCell;
use serde_json::{Map, Value};
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;
use tracing::{debug, warn};

/// Immutable question: a card, the metadata it is read against, and the
/// runtime parameter values bound to it.
///
/// Every transformer returns a new `Question`. The classified query is
/// computed on first access and cached for the lifetime of this instance.
#[derive(Clone)]
pub struct Question {
    metadata: Arc<dyn Metadata>,
    card: Arc<Card>,
    parameter_values: Arc<ParameterValues>,
    query: OnceCell<Result<Query, QueryError>>,
}

impl fmt::Debug for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Question")
            .field("card", &self.card)
            .field("parameter_values", &self.parameter_values)
            .field("metadata", &"<metadata>")
            .finish()
    }
}

/// A question's query together with the question that owns it
#[derive(Debug, Clone, Copy)]
pub struct QuestionQuery<'q> {
    question: &'q Question,
    query: &'q Query,
}

impl<'q> QuestionQuery<'q> {
    pub fn question(&self) -> &'q Question {
        self.question
    }

    pub fn query(&self) -> &'q Query {
        self.query
    }
}

impl Deref for QuestionQuery<'_> {
    type Target = Query;

    fn deref(&self) -> &Query {
        self.query
    }
}

impl Question {
    pub fn new(metadata: Arc<dyn Metadata>, card: Card) -> Self {
        Self::with_parameter_values(metadata, card, ParameterValues::new())
    }

    pub fn with_parameter_values(
        metadata: Arc<dyn Metadata>,
        card: Card,
        parameter_values: ParameterValues,
    ) -> Self {
        Self::from_parts(metadata, Arc::new(card), Arc::new(parameter_values))
    }

    fn from_parts(
        metadata: Arc<dyn Metadata>,
        card: Arc<Card>,
        parameter_values: Arc<ParameterValues>,
    ) -> Self {
        Self {
            metadata,
            card,
            parameter_values,
            query: OnceCell::new(),
        }
    }

    /// New unsaved question over a database, optionally seeded with a table
    pub fn create(
        metadata: Arc<dyn Metadata>,
        database_id: Option<i64>,
        table_id: Option<i64>,
    ) -> Self {
        Self::create_with(metadata, database_id, table_id, &QuestionDefaults::default())
    }

    pub fn create_with(
        metadata: Arc<dyn Metadata>,
        database_id: Option<i64>,
        table_id: Option<i64>,
        defaults: &QuestionDefaults,
    ) -> Self {
        let body = StructuredBody {
            source_table: table_id.map(SourceTable::Id),
            ..StructuredBody::default()
        };
        let card = Card::new(DatasetQuery::structured(database_id, body))
            .with_display(defaults.display.clone());
        Self::new(metadata, card)
    }

    pub fn metadata(&self) -> &Arc<dyn Metadata> {
        &self.metadata
    }

    pub fn card(&self) -> &Card {
        &self.card
    }

    pub fn id(&self) -> Option<CardId> {
        self.card.id
    }

    pub fn is_saved(&self) -> bool {
        self.card.is_saved()
    }

    pub fn name(&self) -> Option<&str> {
        self.card.name.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.card.description.as_deref()
    }

    pub fn display(&self) -> &str {
        &self.card.display
    }

    pub fn visualization_settings(&self) -> &Map<String, Value> {
        &self.card.visualization_settings
    }

    pub fn original_card_id(&self) -> Option<CardId> {
        self.card.original_card_id
    }

    pub fn can_write(&self) -> bool {
        self.card.can_write.unwrap_or(false)
    }

    pub fn public_uuid(&self) -> Option<uuid::Uuid> {
        self.card.public_uuid
    }

    pub fn dataset_query(&self) -> Option<&Arc<DatasetQuery>> {
        self.card.dataset_query.as_ref()
    }

    pub fn database_id(&self) -> Option<i64> {
        self.dataset_query().and_then(|dq| dq.database)
    }

    /// Source table id of a structured question
    pub fn table_id(&self) -> Option<i64> {
        self.query()
            .ok()
            .and_then(|query| query.as_structured().ok().and_then(|q| q.table_id()))
    }

    /// Table metadata for the structured source, if the catalog knows it
    pub fn table_metadata(&self) -> Option<Arc<Table>> {
        self.table_id().and_then(|id| self.metadata.table(id))
    }

    pub fn parameter_values(&self) -> &ParameterValues {
        &self.parameter_values
    }

    /// Card parameters with runtime values applied
    pub fn parameters(&self) -> Vec<Parameter> {
        card_parameters(&self.card, &self.parameter_values)
    }

    /// The classified query for this question's dataset query.
    ///
    /// Classification runs once per instance; later calls return the cached
    /// outcome, including a cached failure.
    pub fn query(&self) -> lens_query::Result<QuestionQuery<'_>> {
        let classified = self.query.get_or_init(|| match &self.card.dataset_query {
            Some(dataset_query) => Query::from_dataset_query(dataset_query.clone()),
            None => Err(QueryError::MissingDatasetQuery),
        });

        match classified {
            Ok(query) => Ok(QuestionQuery {
                question: self,
                query,
            }),
            Err(err) => Err(err.clone()),
        }
    }

    pub fn query_kind(&self) -> Option<QueryKind> {
        self.query().ok().map(|query| query.kind())
    }

    pub fn is_structured(&self) -> bool {
        self.query_kind() == Some(QueryKind::Structured)
    }

    pub fn is_native(&self) -> bool {
        self.query_kind() == Some(QueryKind::Native)
    }

    pub fn is_multi(&self) -> bool {
        self.query_kind() == Some(QueryKind::Multi)
    }

    pub fn can_run(&self) -> bool {
        self.query().map(|query| query.can_run()).unwrap_or(false)
    }

    /// Flat, ordered list of the atomic queries behind this question.
    ///
    /// Empty when the query cannot be classified or decomposed.
    pub fn atomic_queries(&self) -> Vec<Query> {
        match self.query().and_then(|query| query.atomic_queries()) {
            Ok(queries) => queries,
            Err(err) => {
                warn!("No atomic queries for question {:?}: {}", self.id(), err);
                Vec::new()
            }
        }
    }

    /// Same metadata and parameter values, new card
    pub fn set_card(&self, card: Card) -> Question {
        Self::from_parts(
            self.metadata.clone(),
            Arc::new(card),
            self.parameter_values.clone(),
        )
    }

    /// Replace the dataset query with the query's payload.
    ///
    /// When the payload is the one this question already holds, an
    /// equivalent question is returned without building a new card.
    pub fn set_query(&self, query: &Query) -> Question {
        let unchanged = self
            .card
            .dataset_query
            .as_ref()
            .map(|current| Arc::ptr_eq(current, query.dataset_query()))
            .unwrap_or(false);

        if unchanged {
            debug!("set_query called with the current payload, keeping card");
            return self.clone();
        }
        self.set_dataset_query(query.dataset_query().clone())
    }

    pub fn set_dataset_query(&self, dataset_query: impl Into<Arc<DatasetQuery>>) -> Question {
        self.set_card(self.card.with_dataset_query(dataset_query))
    }

    pub fn set_display(&self, display: impl Into<String>) -> Question {
        self.set_card(self.card.with_display(display))
    }

    pub fn set_name(&self, name: Option<String>) -> Question {
        self.set_card(self.card.with_name(name))
    }

    pub fn set_description(&self, description: Option<String>) -> Question {
        self.set_card(self.card.with_description(description))
    }

    pub fn set_visualization_settings(&self, settings: Map<String, Value>) -> Question {
        self.set_card(self.card.with_visualization_settings(settings))
    }

    /// Shallow-merge settings into the current visualization settings
    pub fn update_settings(&self, settings: Map<String, Value>) -> Question {
        let mut merged = self.card.visualization_settings.clone();
        merged.extend(settings);
        self.set_visualization_settings(merged)
    }

    /// Point this question's lineage at another card
    pub fn with_original_card_id(&self, original_card_id: Option<CardId>) -> Question {
        self.set_card(self.card.with_original_card_id(original_card_id))
    }

    pub fn set_parameter_values(&self, parameter_values: ParameterValues) -> Question {
        Self::from_parts(
            self.metadata.clone(),
            self.card.clone(),
            Arc::new(parameter_values),
        )
    }

    pub fn set_parameter_value(&self, id: impl Into<String>, value: Value) -> Question {
        let mut values = (*self.parameter_values).clone();
        values.insert(id.into(), value);
        self.set_parameter_values(values)
    }

    /// Unsaved duplicate: identifier, name and description are stripped
    pub fn new_question(&self) -> Question {
        self.set_card(Card {
            id: None,
            name: None,
            description: None,
            ..(*self.card).clone()
        })
    }
}
