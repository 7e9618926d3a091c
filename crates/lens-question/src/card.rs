use lens_query::DatasetQuery;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use uuid::Uuid;

/// Identifier of a persisted card
pub type CardId = i64;

/// Display used when a card does not name one
pub const DEFAULT_DISPLAY: &str = "table";

pub(crate) fn default_display() -> String {
    DEFAULT_DISPLAY.to_string()
}

/// Stored cards may carry `null` settings; read them as no settings
pub(crate) fn null_as_empty_map<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Parameter template declared on a card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardParameter {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub parameter_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

/// Persisted question record.
///
/// A card is never edited in place. The `with_*` helpers build a new card
/// from a shallow copy; the dataset query sits behind an `Arc` so copies
/// share it until one side replaces it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<CardId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_display")]
    pub display: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset_query: Option<Arc<DatasetQuery>>,
    #[serde(default, deserialize_with = "null_as_empty_map")]
    pub visualization_settings: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Vec<CardParameter>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_card_id: Option<CardId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_write: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_uuid: Option<Uuid>,
}

impl Card {
    /// Unsaved card wrapping a dataset query
    pub fn new(dataset_query: impl Into<Arc<DatasetQuery>>) -> Self {
        Self {
            id: None,
            name: None,
            description: None,
            display: default_display(),
            dataset_query: Some(dataset_query.into()),
            visualization_settings: Map::new(),
            parameters: None,
            original_card_id: None,
            can_write: None,
            public_uuid: None,
        }
    }

    pub fn is_saved(&self) -> bool {
        self.id.is_some()
    }

    pub fn with_id(&self, id: Option<CardId>) -> Card {
        Card { id, ..self.clone() }
    }

    pub fn with_name(&self, name: Option<String>) -> Card {
        Card { name, ..self.clone() }
    }

    pub fn with_description(&self, description: Option<String>) -> Card {
        Card {
            description,
            ..self.clone()
        }
    }

    pub fn with_display(&self, display: impl Into<String>) -> Card {
        Card {
            display: display.into(),
            ..self.clone()
        }
    }

    pub fn with_dataset_query(&self, dataset_query: impl Into<Arc<DatasetQuery>>) -> Card {
        Card {
            dataset_query: Some(dataset_query.into()),
            ..self.clone()
        }
    }

    pub fn with_visualization_settings(&self, settings: Map<String, Value>) -> Card {
        Card {
            visualization_settings: settings,
            ..self.clone()
        }
    }

    pub fn with_parameters(&self, parameters: Option<Vec<CardParameter>>) -> Card {
        Card {
            parameters,
            ..self.clone()
        }
    }

    pub fn with_original_card_id(&self, original_card_id: Option<CardId>) -> Card {
        Card {
            original_card_id,
            ..self.clone()
        }
    }

    pub fn with_public_uuid(&self, public_uuid: Option<Uuid>) -> Card {
        Card {
            public_uuid,
            ..self.clone()
        }
    }
}
