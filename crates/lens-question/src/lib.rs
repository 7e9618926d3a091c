//! # lens-question
//!
//! The `Question` aggregate: an immutable wrapper around a persisted card
//! and the runtime parameter values bound to it.
//!
//! - **Question**: every transformer returns a new question; the card of an
//!   existing question is never modified
//! - **Dirty tracking**: `Question::is_dirty_compared_to` decides whether a
//!   question has meaningful edits
//! - **URL tokens**: `Question::serialize_for_url` produces a deterministic,
//!   URL-safe token that round-trips exactly
//!
//! Collaborators outside this crate are reached through traits:
//!
//! - **Metadata**: read-only catalog of databases, tables and fields
//! - **QueryActions**: summarize, breakout, pivot, filter and drill actions
//! - **QueryRunner**: query execution
//! - **CardStore**: persistence and sharing
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use lens_question::{InMemoryMetadata, Metadata, Question, UrlOptions};
//!
//! let metadata: Arc<dyn Metadata> = Arc::new(InMemoryMetadata::new());
//! let question = Question::create(metadata.clone(), Some(1), Some(10));
//! let bar = question.set_display("bar");
//!
//! assert_eq!(question.display(), "table");
//! assert!(bar.is_dirty_compared_to(Some(&question)));
//!
//! let token = bar.serialize_for_url(UrlOptions::default()).unwrap();
//! let decoded = Question::from_url_token(metadata, &token).unwrap();
//! assert_eq!(decoded.serialize_for_url(UrlOptions::default()).unwrap(), token);
//! ```

pub mod actions;
pub mod card;
pub mod config;
mod dirty;
pub mod error;
pub mod execution;
pub mod metadata;
pub mod parameters;
pub mod persistence;
pub mod question;
pub mod url;

// Re-export commonly used items
pub use actions::{DimensionValue, QueryActions, QueryMode, StructuredActions};
pub use card::{Card, CardId, CardParameter, DEFAULT_DISPLAY};
pub use config::QuestionDefaults;
pub use error::{QuestionError, Result};
pub use execution::{QueryResults, QueryRunner};
pub use metadata::{Database, Field, InMemoryMetadata, Metadata, Table};
pub use parameters::{Parameter, ParameterValues};
pub use persistence::{CardStore, Revision};
pub use question::{Question, QuestionQuery};
pub use url::{decode_card, encode_card, UrlOptions};
