use crate::card::CardId;
use crate::error::Result;
use crate::parameters::Parameter;
use crate::question::Question;
use async_trait::async_trait;
use futures::future::try_join_all;
use lens_query::DatasetQuery;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Opaque result set returned by a runner
pub type QueryResults = Value;

/// Executes queries on behalf of questions.
///
/// The cancellation token is handed through untouched; honoring it is up
/// to the implementation.
#[async_trait]
pub trait QueryRunner: Send + Sync {
    /// Run an ad-hoc dataset query
    async fn run_dataset(
        &self,
        dataset_query: &DatasetQuery,
        cancel: &CancellationToken,
    ) -> Result<QueryResults>;

    /// Run a saved card by id with bound parameters
    async fn run_card(
        &self,
        card_id: CardId,
        parameters: &[Parameter],
        cancel: &CancellationToken,
    ) -> Result<QueryResults>;
}

impl Question {
    /// Whether `run` would use the saved-card path
    pub fn uses_saved_path(&self, is_dirty: bool) -> bool {
        self.is_saved() && !self.is_multi() && !is_dirty
    }

    /// Run this question, returning one result per atomic query in
    /// `atomic_queries` order.
    ///
    /// Saved, single-query questions the caller reports as clean run by card
    /// id. Everything else runs each atomic query ad hoc with the bound
    /// parameters attached. A composite member that cannot be classified
    /// fails the whole run before anything executes.
    pub async fn run(
        &self,
        runner: &dyn QueryRunner,
        is_dirty: bool,
        cancel: &CancellationToken,
    ) -> Result<Vec<QueryResults>> {
        let atomic = self.query()?.atomic_queries()?;
        let parameters = self.parameters();

        if let (true, Some(card_id)) = (self.uses_saved_path(is_dirty), self.id()) {
            debug!("Running saved card {}", card_id);
            let results = runner.run_card(card_id, &parameters, cancel).await?;
            return Ok(vec![results]);
        }

        let bound: Vec<Value> = parameters
            .iter()
            .filter_map(Parameter::to_dataset_parameter)
            .collect();
        let dataset_queries: Vec<DatasetQuery> = atomic
            .iter()
            .map(|query| DatasetQuery {
                parameters: Some(bound.clone()),
                ..(**query.dataset_query()).clone()
            })
            .collect();

        debug!(
            "Running {} ad-hoc quer{} for question {:?}",
            dataset_queries.len(),
            if dataset_queries.len() == 1 { "y" } else { "ies" },
            self.id()
        );
        try_join_all(
            dataset_queries
                .iter()
                .map(|dataset_query| runner.run_dataset(dataset_query, cancel)),
        )
        .await
    }
}
