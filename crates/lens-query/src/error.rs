use thiserror::Error;

/// Errors raised while classifying or inspecting a dataset query
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// The `type` discriminant does not name any known query kind
    #[error("Unknown query type: {query_type:?}")]
    UnknownQueryType { query_type: String },

    /// A variant-specific accessor was called on another variant
    #[error("Invalid variant access: `{accessor}` is not available on {variant} queries")]
    InvalidVariantAccess {
        accessor: &'static str,
        variant: &'static str,
    },

    /// The card carries no dataset query at all
    #[error("Card has no dataset query")]
    MissingDatasetQuery,
}

impl QueryError {
    pub fn unknown_query_type(query_type: impl Into<String>) -> Self {
        QueryError::UnknownQueryType {
            query_type: query_type.into(),
        }
    }

    pub fn invalid_variant_access(accessor: &'static str, variant: &'static str) -> Self {
        QueryError::InvalidVariantAccess { accessor, variant }
    }
}

pub type Result<T> = std::result::Result<T, QueryError>;
