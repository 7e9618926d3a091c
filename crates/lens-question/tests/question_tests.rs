use lens_query::{MultiQuery, QueryKind};
use lens_question::{
    Card, InMemoryMetadata, Metadata, Question, QuestionError, UrlOptions,
};
use serde_json::{json, Value};
use std::sync::Arc;

fn metadata() -> Arc<dyn Metadata> {
    Arc::new(InMemoryMetadata::new())
}

fn question(card: Value) -> Question {
    let card: Card = serde_json::from_value(card).unwrap();
    Question::new(metadata(), card)
}

fn saved_orders() -> Question {
    question(json!({
        "id": 1,
        "name": "Orders by month",
        "description": "Monthly order counts",
        "display": "line",
        "dataset_query": {
            "type": "query",
            "database": 1,
            "query": {
                "source_table": 2,
                "aggregation": [["count"], ["sum", ["field", 5, null]]],
                "breakout": [["field", 3, {"temporal-unit": "month"}]]
            }
        },
        "visualization_settings": {"graph.show_goal": false},
        "can_write": true
    }))
}

fn token(q: &Question) -> String {
    q.serialize_for_url(UrlOptions::default()).unwrap()
}

#[test]
fn test_set_display_leaves_receiver_untouched() {
    let original = saved_orders();
    let before = token(&original);

    let bar = original.set_display("bar");

    assert_eq!(bar.display(), "bar");
    assert_eq!(original.display(), "line");
    assert_eq!(token(&original), before);
    assert_ne!(token(&bar), before);
}

#[test]
fn test_token_round_trip_is_idempotent() {
    let original = saved_orders().with_original_card_id(Some(9));
    let first = token(&original);

    let decoded = Question::from_url_token(metadata(), &first).unwrap();
    assert_eq!(token(&decoded), first);
    assert!(!decoded.is_saved());
    assert_eq!(decoded.original_card_id(), Some(9));
    assert_eq!(decoded.name(), original.name());
}

#[test]
fn test_fields_outside_the_token_do_not_change_it() {
    let original = saved_orders();
    let read_only = question(json!({
        "id": 1,
        "name": "Orders by month",
        "description": "Monthly order counts",
        "display": "line",
        "dataset_query": original.dataset_query().map(|dq| dq.as_ref().clone()),
        "visualization_settings": {"graph.show_goal": false},
        "can_write": false,
        "public_uuid": "6f0c7f4a-46c5-4c70-a4d6-45e06d3e5e36"
    }));

    assert_eq!(token(&read_only), token(&original));
}

#[test]
fn test_token_is_url_safe_and_unpadded() {
    let t = token(&saved_orders().set_name(Some("a/b+c?".to_string())));
    assert!(t
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
}

#[test]
fn test_corrupt_token_is_rejected() {
    let err = Question::from_url_token(metadata(), "%%%").unwrap_err();
    assert!(matches!(err, QuestionError::InvalidToken(_)));
}

#[test]
fn test_unsaved_empty_question_is_clean() {
    let q = Question::create(metadata(), Some(1), None);
    assert!(!q.is_dirty_compared_to(None));
}

#[test]
fn test_unsaved_question_with_table_is_dirty() {
    let q = Question::create(metadata(), Some(1), Some(2));
    assert!(q.is_dirty_compared_to(None));
}

#[test]
fn test_unsaved_native_question_dirty_once_text_entered() {
    let empty = question(json!({"dataset_query": {"type": "native", "database": 1, "native": {"query": ""}}}));
    assert!(!empty.is_dirty_compared_to(None));

    let typed = question(json!({"dataset_query": {"type": "native", "database": 1, "native": {"query": "select 1"}}}));
    assert!(typed.is_dirty_compared_to(None));
}

#[test]
fn test_saved_question_is_not_dirty_against_itself() {
    let q = saved_orders();
    assert!(!q.is_dirty_compared_to(Some(&q)));
}

#[test]
fn test_saved_question_dirty_after_display_change() {
    let q = saved_orders();
    assert!(q.set_display("bar").is_dirty_compared_to(Some(&q)));
}

#[test]
fn test_cosmetic_query_differences_are_not_dirty() {
    let q = saved_orders();
    let reordered = question(json!({
        "id": 1,
        "name": "Orders by month",
        "description": "Monthly order counts",
        "display": "line",
        "dataset_query": {
            "query": {
                "breakout": [["field", 3, {"temporal-unit": "month"}], ["field", 3, {"temporal-unit": "month"}]],
                "aggregation": [["count"], ["sum", ["field", 5, null]]],
                "source_table": 2,
                "order_by": []
            },
            "database": 1,
            "type": "query"
        },
        "visualization_settings": {"graph.show_goal": false}
    }));

    assert!(!reordered.is_dirty_compared_to(Some(&q)));
}

#[test]
fn test_structured_question_has_one_atomic_query() {
    let q = saved_orders();
    let atomic = q.atomic_queries();
    assert_eq!(atomic.len(), 1);
    assert_eq!(atomic[0].kind(), QueryKind::Structured);
}

#[test]
fn test_multi_question_atomic_queries_match_members() {
    let q = question(json!({
        "dataset_query": {
            "type": "multi",
            "queries": [
                {"type": "query", "database": 1, "query": {"source_table": 2}},
                {"type": "native", "database": 1, "native": {"query": "select 1"}}
            ]
        }
    }));

    assert!(q.is_multi());
    let kinds: Vec<QueryKind> = q.atomic_queries().iter().map(|q| q.kind()).collect();
    assert_eq!(kinds, vec![QueryKind::Structured, QueryKind::Native]);
}

#[test]
fn test_multi_conversion_through_question() {
    let q = saved_orders();
    let structured = q.query().unwrap();
    let structured = structured.as_structured().unwrap();

    let multi = MultiQuery::from_structured(structured).unwrap();
    let converted = q.set_query(&multi.clone().into());
    assert!(converted.is_multi());
    assert_eq!(converted.atomic_queries().len(), 2);

    let back = multi.to_structured().unwrap();
    let restored = converted.set_query(&back.into());
    assert!(!restored.is_dirty_compared_to(Some(&q)));
}

#[test]
fn test_multi_conversion_refused_for_bare_rows() {
    let q = Question::create(metadata(), Some(1), Some(2));
    let query = q.query().unwrap();
    assert!(MultiQuery::from_structured(query.as_structured().unwrap()).is_none());
}

#[test]
fn test_new_question_strips_identity() {
    let fresh = saved_orders().new_question();

    assert_eq!(fresh.id(), None);
    assert_eq!(fresh.name(), None);
    assert_eq!(fresh.description(), None);
    assert_eq!(fresh.display(), "line");
    assert_eq!(fresh.dataset_query(), saved_orders().dataset_query());
}

#[test]
fn test_query_back_reference_points_at_owner() {
    let q = saved_orders();
    let query = q.query().unwrap();
    assert!(std::ptr::eq(query.question(), &q));
    assert_eq!(query.kind(), QueryKind::Structured);
}
