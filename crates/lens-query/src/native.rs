use crate::types::{DatasetQuery, NativeBody};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

static EMPTY_BODY: NativeBody = NativeBody::EMPTY;

/// Atomic native-language query, wrapped verbatim
#[derive(Debug, Clone, PartialEq)]
pub struct NativeQuery {
    dataset_query: Arc<DatasetQuery>,
}

impl NativeQuery {
    pub(crate) fn new(dataset_query: Arc<DatasetQuery>) -> Self {
        Self { dataset_query }
    }

    pub fn dataset_query(&self) -> &Arc<DatasetQuery> {
        &self.dataset_query
    }

    pub fn body(&self) -> &NativeBody {
        self.dataset_query.native.as_ref().unwrap_or(&EMPTY_BODY)
    }

    pub fn database_id(&self) -> Option<i64> {
        self.dataset_query.database
    }

    pub fn query_text(&self) -> &str {
        &self.body().query
    }

    pub fn template_tags(&self) -> Option<&BTreeMap<String, Value>> {
        self.body().template_tags.as_ref()
    }

    /// Whitespace alone is not runnable
    pub fn can_run(&self) -> bool {
        !self.query_text().trim().is_empty()
    }

    pub fn set_query_text(&self, text: impl Into<String>) -> NativeQuery {
        let mut dataset_query = (*self.dataset_query).clone();
        dataset_query
            .native
            .get_or_insert_with(NativeBody::default)
            .query = text.into();
        Self::new(Arc::new(dataset_query))
    }
}
