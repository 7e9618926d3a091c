//! URL-safe question tokens.
//!
//! A token is the URL-safe base64 (no padding) of the UTF-8 JSON of a
//! reduced card record: name, description, cleaned dataset query, display,
//! parameters, visualization settings, and optionally the lineage id, in
//! that key order. Decoding accepts padded and unpadded input.

use crate::card::{default_display, null_as_empty_map, Card, CardId, CardParameter};
use crate::error::{QuestionError, Result};
use crate::metadata::Metadata;
use crate::question::Question;
use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine as _,
};
use lens_query::DatasetQuery;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::trace;

const TOKEN_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Options for `Question::serialize_for_url`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UrlOptions {
    /// Keep the lineage identifier in the token
    pub include_original_card_id: bool,
}

impl Default for UrlOptions {
    fn default() -> Self {
        Self {
            include_original_card_id: true,
        }
    }
}

impl UrlOptions {
    pub fn without_original_card_id() -> Self {
        Self {
            include_original_card_id: false,
        }
    }
}

/// The part of a card carried in a URL token. Field order is the key order
/// of the encoded JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct UrlCard {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    dataset_query: Option<DatasetQuery>,
    #[serde(default = "default_display")]
    display: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parameters: Option<Vec<CardParameter>>,
    #[serde(default, deserialize_with = "null_as_empty_map")]
    visualization_settings: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    original_card_id: Option<CardId>,
}

impl UrlCard {
    fn from_card(card: &Card, options: UrlOptions) -> Self {
        Self {
            name: card.name.clone(),
            description: card.description.clone(),
            dataset_query: card.dataset_query.as_deref().map(DatasetQuery::cleaned),
            display: card.display.clone(),
            parameters: card.parameters.clone(),
            visualization_settings: card.visualization_settings.clone(),
            original_card_id: if options.include_original_card_id {
                card.original_card_id
            } else {
                None
            },
        }
    }

    fn into_card(self) -> Card {
        Card {
            id: None,
            name: self.name,
            description: self.description,
            display: self.display,
            dataset_query: self.dataset_query.map(Arc::new),
            visualization_settings: self.visualization_settings,
            parameters: self.parameters,
            original_card_id: self.original_card_id,
            can_write: None,
            public_uuid: None,
        }
    }
}

/// Encode a card as a URL token
pub fn encode_card(card: &Card, options: UrlOptions) -> Result<String> {
    let json = serde_json::to_vec(&UrlCard::from_card(card, options))?;
    trace!("Encoding {} bytes of card JSON", json.len());
    Ok(TOKEN_ENGINE.encode(json))
}

/// Decode a URL token into an unsaved card
pub fn decode_card(token: &str) -> Result<Card> {
    let bytes = TOKEN_ENGINE
        .decode(token.trim())
        .map_err(|e| QuestionError::invalid_token(e.to_string()))?;
    let json = String::from_utf8(bytes).map_err(|_| QuestionError::InvalidUtf8)?;
    let record: UrlCard = serde_json::from_str(&json)?;
    Ok(record.into_card())
}

impl Question {
    /// Deterministic URL token for this question's card
    pub fn serialize_for_url(&self, options: UrlOptions) -> Result<String> {
        encode_card(self.card(), options)
    }

    /// Rebuild a question from a URL token
    pub fn from_url_token(metadata: Arc<dyn Metadata>, token: &str) -> Result<Question> {
        Ok(Question::new(metadata, decode_card(token)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::InMemoryMetadata;
    use serde_json::json;

    fn card(value: Value) -> Card {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_token_is_url_safe_without_padding() {
        let token = encode_card(
            &card(json!({
                "name": "???>>>",
                "dataset_query": {"type": "native", "native": {"query": "select '~~~' "}}
            })),
            UrlOptions::default(),
        )
        .unwrap();

        assert!(!token.contains('+'));
        assert!(!token.contains('/'));
        assert!(!token.contains('='));
    }

    #[test]
    fn test_decimal_numbers_survive_round_trip() {
        let original = card(json!({
            "display": "scatter",
            "visualization_settings": {
                "v": 1.0715660391465826e-75,
                "goal": 0.1,
                "scale": 2.2250738585072014e-308,
                "max": 1.7976931348623157e308
            },
            "dataset_query": {
                "type": "query",
                "query": {"source_table": 1, "filter": [">", ["field", 2, null], 0.30000000000000004]}
            }
        }));

        let first = encode_card(&original, UrlOptions::default()).unwrap();
        let second = encode_card(&decode_card(&first).unwrap(), UrlOptions::default()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_decode_accepts_padding() {
        let original = card(json!({"dataset_query": {"type": "query", "query": {"source_table": 1}}}));
        let token = encode_card(&original, UrlOptions::default()).unwrap();
        let padded = format!("{}{}", token, "=".repeat((4 - token.len() % 4) % 4));

        assert_eq!(decode_card(&padded).unwrap(), decode_card(&token).unwrap());
    }

    #[test]
    fn test_reduced_record_layout() {
        let token = encode_card(
            &card(json!({
                "id": 9,
                "can_write": true,
                "name": "Orders",
                "display": "bar",
                "dataset_query": {"type": "query", "database": 1, "query": {"source_table": 2, "breakout": []}},
                "visualization_settings": {"b": 1, "a": 2},
                "original_card_id": 4
            })),
            UrlOptions::default(),
        )
        .unwrap();

        let json = String::from_utf8(TOKEN_ENGINE.decode(token).unwrap()).unwrap();
        assert_eq!(
            json,
            r#"{"name":"Orders","dataset_query":{"type":"query","database":1,"query":{"source_table":2}},"display":"bar","visualization_settings":{"a":2,"b":1},"original_card_id":4}"#
        );
    }

    #[test]
    fn test_lineage_excluded_on_request() {
        let with_lineage = card(json!({"display": "table", "original_card_id": 4}));
        let without = encode_card(&with_lineage, UrlOptions::without_original_card_id()).unwrap();
        assert_eq!(decode_card(&without).unwrap().original_card_id, None);

        let with = encode_card(&with_lineage, UrlOptions::default()).unwrap();
        assert_eq!(decode_card(&with).unwrap().original_card_id, Some(4));
    }

    #[test]
    fn test_invalid_tokens() {
        assert!(matches!(decode_card("***"), Err(QuestionError::InvalidToken(_))));

        let not_json = TOKEN_ENGINE.encode("not json");
        assert!(matches!(decode_card(&not_json), Err(QuestionError::TokenPayload(_))));

        let not_utf8 = TOKEN_ENGINE.encode([0xff, 0xfe]);
        assert!(matches!(decode_card(&not_utf8), Err(QuestionError::InvalidUtf8)));
    }

    #[test]
    fn test_question_from_token() {
        let metadata: Arc<dyn Metadata> = Arc::new(InMemoryMetadata::new());
        let q = Question::new(
            metadata.clone(),
            card(json!({
                "id": 3,
                "dataset_query": {"type": "native", "native": {"query": "select 1"}}
            })),
        );
        let token = q.serialize_for_url(UrlOptions::default()).unwrap();
        let decoded = Question::from_url_token(metadata, &token).unwrap();

        assert!(!decoded.is_saved());
        assert!(decoded.is_native());
        assert_eq!(decoded.serialize_for_url(UrlOptions::default()).unwrap(), token);
    }
}
