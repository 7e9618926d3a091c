use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Discriminant of a structured (MBQL-style) dataset query
pub const STRUCTURED_QUERY_TYPE: &str = "query";
/// Discriminant of a native-language dataset query
pub const NATIVE_QUERY_TYPE: &str = "native";
/// Discriminant of a composite dataset query
pub const MULTI_QUERY_TYPE: &str = "multi";

/// Source of a structured query: a table id, or a saved card reference
/// such as `"card__12"`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourceTable {
    Id(i64),
    Card(String),
}

impl SourceTable {
    /// Table id when the source is a physical table
    pub fn table_id(&self) -> Option<i64> {
        match self {
            SourceTable::Id(id) => Some(*id),
            SourceTable::Card(_) => None,
        }
    }
}

impl From<i64> for SourceTable {
    fn from(id: i64) -> Self {
        SourceTable::Id(id)
    }
}

impl fmt::Display for SourceTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceTable::Id(id) => write!(f, "{}", id),
            SourceTable::Card(reference) => write!(f, "{}", reference),
        }
    }
}

/// Body of a structured query.
///
/// Clauses are kept as raw JSON; only their presence and ordering matter
/// here. Keys this crate does not model land in `extra`, which is ordered so
/// serialization stays deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_table: Option<SourceTable>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregation: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breakout: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_by: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl StructuredBody {
    pub const EMPTY: StructuredBody = StructuredBody {
        source_table: None,
        aggregation: None,
        breakout: None,
        filter: None,
        order_by: None,
        fields: None,
        limit: None,
        extra: BTreeMap::new(),
    };

    pub fn with_source_table(source_table: impl Into<SourceTable>) -> Self {
        Self {
            source_table: Some(source_table.into()),
            ..Self::default()
        }
    }
}

/// Body of a native query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NativeBody {
    #[serde(default)]
    pub query: String,
    #[serde(
        rename = "template-tags",
        alias = "template_tags",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub template_tags: Option<BTreeMap<String, Value>>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl NativeBody {
    pub const EMPTY: NativeBody = NativeBody {
        query: String::new(),
        template_tags: None,
        extra: BTreeMap::new(),
    };
}

/// Raw dataset query payload as stored on a card.
///
/// The payload is deliberately loose: any discriminant deserializes, and the
/// classifier decides which variant (if any) it represents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetQuery {
    #[serde(rename = "type", default)]
    pub query_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<StructuredBody>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native: Option<NativeBody>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queries: Option<Vec<DatasetQuery>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Vec<Value>>,
    /// Keys not modeled above (`middleware`, `constraints`, ...), kept verbatim
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl DatasetQuery {
    /// Create a structured dataset query
    pub fn structured(database: Option<i64>, body: StructuredBody) -> Self {
        Self {
            query_type: STRUCTURED_QUERY_TYPE.to_string(),
            database,
            query: Some(body),
            ..Self::default()
        }
    }

    /// Create a native dataset query
    pub fn native(database: Option<i64>, query: impl Into<String>) -> Self {
        Self {
            query_type: NATIVE_QUERY_TYPE.to_string(),
            database,
            native: Some(NativeBody {
                query: query.into(),
                ..NativeBody::default()
            }),
            ..Self::default()
        }
    }

    /// Create a composite dataset query from its members
    pub fn multi(queries: Vec<DatasetQuery>) -> Self {
        let database = queries.iter().find_map(|q| q.database);
        Self {
            query_type: MULTI_QUERY_TYPE.to_string(),
            database,
            queries: Some(queries),
            ..Self::default()
        }
    }

    /// Whether the payload nests other dataset queries
    pub fn is_composite(&self) -> bool {
        self.queries.is_some() || self.query_type == MULTI_QUERY_TYPE
    }

    /// Whether the payload holds anything a user typed or picked: a chosen
    /// source table, non-empty native text, or a composite body
    pub fn has_user_content(&self) -> bool {
        if self.is_composite() {
            return true;
        }
        let has_table = self
            .query
            .as_ref()
            .map(|body| body.source_table.is_some())
            .unwrap_or(false);
        let has_text = self
            .native
            .as_ref()
            .map(|body| !body.query.is_empty())
            .unwrap_or(false);
        has_table || has_text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_structured_body_key_order_is_stable() {
        let a: StructuredBody = serde_json::from_value(json!({
            "breakout": [["field", 2, null]],
            "zeta": 1,
            "source_table": 10,
            "alpha": true
        }))
        .unwrap();
        let b: StructuredBody = serde_json::from_value(json!({
            "alpha": true,
            "source_table": 10,
            "zeta": 1,
            "breakout": [["field", 2, null]]
        }))
        .unwrap();

        let a = serde_json::to_string(&a).unwrap();
        let b = serde_json::to_string(&b).unwrap();
        assert_eq!(a, b);
        assert_eq!(
            a,
            r#"{"source_table":10,"breakout":[["field",2,null]],"alpha":true,"zeta":1}"#
        );
    }

    #[test]
    fn test_source_table_variants() {
        let id: SourceTable = serde_json::from_value(json!(4)).unwrap();
        let card: SourceTable = serde_json::from_value(json!("card__12")).unwrap();
        assert_eq!(id.table_id(), Some(4));
        assert_eq!(card.table_id(), None);
        assert_eq!(card.to_string(), "card__12");
    }

    #[test]
    fn test_unmodeled_keys_survive_round_trip() {
        let value = json!({
            "type": "native",
            "database": 1,
            "native": {
                "query": "select {{x}}",
                "template-tags": {"x": {"name": "x", "type": "number"}},
                "collection": "orders"
            },
            "middleware": {"format-rows?": false},
            "constraints": {"max-results": 10}
        });
        let dq: DatasetQuery = serde_json::from_value(value.clone()).unwrap();

        assert!(dq.extra.contains_key("middleware"));
        let native = dq.native.as_ref().unwrap();
        assert!(native.template_tags.as_ref().unwrap().contains_key("x"));
        assert_eq!(native.extra.get("collection"), Some(&json!("orders")));
        assert_eq!(serde_json::to_value(&dq).unwrap(), value);
    }

    #[test]
    fn test_unknown_discriminant_still_deserializes() {
        let dq: DatasetQuery = serde_json::from_value(json!({"type": "graph"})).unwrap();
        assert_eq!(dq.query_type, "graph");
        assert!(!dq.has_user_content());
    }

    #[test]
    fn test_has_user_content() {
        let empty = DatasetQuery::structured(Some(1), StructuredBody::default());
        assert!(!empty.has_user_content());

        let with_table = DatasetQuery::structured(Some(1), StructuredBody::with_source_table(3));
        assert!(with_table.has_user_content());

        assert!(!DatasetQuery::native(Some(1), "").has_user_content());
        assert!(DatasetQuery::native(Some(1), "select 1").has_user_content());

        assert!(DatasetQuery::multi(vec![]).has_user_content());
    }
}
