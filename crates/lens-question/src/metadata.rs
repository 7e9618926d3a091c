use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Semantic type marking a primary-key field
pub const PK_SEMANTIC_TYPE: &str = "type/PK";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Database {
    pub id: i64,
    pub name: String,
    pub engine: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub id: i64,
    pub table_id: i64,
    pub name: String,
    pub display_name: Option<String>,
    pub base_type: Option<String>,
    pub semantic_type: Option<String>,
}

impl Field {
    pub fn is_pk(&self) -> bool {
        self.semantic_type.as_deref() == Some(PK_SEMANTIC_TYPE)
    }

    /// Field reference clause for this field
    pub fn reference(&self) -> serde_json::Value {
        serde_json::json!(["field", self.id, null])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub id: i64,
    pub db_id: i64,
    pub name: String,
    pub display_name: Option<String>,
    pub fields: Vec<Field>,
}

impl Table {
    pub fn primary_keys(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|field| field.is_pk())
    }
}

/// Read-only catalog of databases, tables and fields
pub trait Metadata: Send + Sync {
    fn database(&self, id: i64) -> Option<Arc<Database>>;

    fn table(&self, id: i64) -> Option<Arc<Table>>;

    fn field(&self, id: i64) -> Option<Arc<Field>>;
}

/// Metadata catalog held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryMetadata {
    databases: HashMap<i64, Arc<Database>>,
    tables: HashMap<i64, Arc<Table>>,
    fields: HashMap<i64, Arc<Field>>,
}

impl InMemoryMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_database(mut self, database: Database) -> Self {
        self.databases.insert(database.id, Arc::new(database));
        self
    }

    /// Register a table along with its fields
    pub fn with_table(mut self, table: Table) -> Self {
        for field in &table.fields {
            self.fields.insert(field.id, Arc::new(field.clone()));
        }
        self.tables.insert(table.id, Arc::new(table));
        self
    }
}

impl Metadata for InMemoryMetadata {
    fn database(&self, id: i64) -> Option<Arc<Database>> {
        self.databases.get(&id).cloned()
    }

    fn table(&self, id: i64) -> Option<Arc<Table>> {
        self.tables.get(&id).cloned()
    }

    fn field(&self, id: i64) -> Option<Arc<Field>> {
        self.fields.get(&id).cloned()
    }
}
