use async_trait::async_trait;
use serde_json::Value as JsonValue;

/// Failures reported by a data source, structured at the collaborator
/// boundary so the error normalizer never has to guess at the shape of a
/// caught error.
#[derive(thiserror::Error, Debug, Clone)]
pub enum SourceError {
    #[error("Upstream service is unavailable: {0}")]
    Unavailable(String),
    #[error("No {kind} found with id \"{id}\"")]
    NotFound { kind: String, id: String },
    #[error("Upstream request failed with status {status}: {body}")]
    Upstream { status: u16, body: String },
    #[error("Transport failure: {0}")]
    Transport(String),
    #[error("Failed to decode upstream response: {0}")]
    Decode(String),
}

/// The data-fetching collaborator the engine delegates to. Implementations
/// are transport-specific (HTTP, database, in-memory fixtures); the engine
/// only sees raw JSON records keyed by entity kind and id.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// The unfiltered record collection backing the home view.
    async fn fetch_home_collection(&self) -> Result<Vec<JsonValue>, SourceError>;

    /// A single record by id. Absent records surface as [`SourceError::NotFound`].
    async fn fetch_by_id(&self, kind: &str, id: &str) -> Result<JsonValue, SourceError>;

    /// Records related to a parent record, in upstream order.
    async fn fetch_related(&self, kind: &str, parent_id: &str)
        -> Result<Vec<JsonValue>, SourceError>;

    /// Increments a counter field on a record and returns the updated record.
    async fn mutate_counter_field(
        &self,
        kind: &str,
        id: &str,
        field_name: &str,
    ) -> Result<JsonValue, SourceError>;
}
