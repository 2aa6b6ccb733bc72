use async_trait::async_trait;
use thiserror::Error;

/// Errors a store can produce. `DuplicateKey` is a normal business outcome
/// (unique-field collision); `Unavailable` means the backend itself failed and
/// must never be folded into an authentication error.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("duplicate key")]
    DuplicateKey,
    #[error("storage unavailable")]
    Unavailable(#[source] sqlx::Error),
}

/// Storage contract for one collection of records.
///
/// Implementations bind their collection (table) at construction, so the trait
/// stays reusable for other entity types: pick a `Record`/`New`/`Key` triple
/// and back it with whatever store fits. Absent records come back as `None`;
/// an `Err` always means the store itself misbehaved.
#[async_trait]
pub trait Repository: Send + Sync {
    /// Stored shape, ids assigned.
    type Record;
    /// Insert shape, before the store assigns an id.
    type New;
    /// Single-field lookup filter.
    type Key;

    async fn add(&self, record: Self::New) -> Result<Self::Record, RepoError>;

    async fn get(&self, key: Self::Key) -> Result<Option<Self::Record>, RepoError>;
}
