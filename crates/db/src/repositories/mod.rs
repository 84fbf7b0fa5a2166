use async_trait::async_trait;
use thiserror::Error;

use frontdesk_core::errors::ApplicationError;
use frontdesk_core::snapshot::{Collection, PracticeSnapshot};

pub mod document;
pub mod memory;

pub use document::SqlPracticeStore;
pub use memory::InMemoryPracticeStore;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("encode error: {0}")]
    Encode(String),
}

impl From<RepositoryError> for ApplicationError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::Encode(message) => Self::Serialization(message),
            other => Self::Persistence(other.to_string()),
        }
    }
}

/// Whole-document persistence for the practice. `load` reads every
/// collection; `commit` replaces the listed collections as one unit.
#[async_trait]
pub trait PracticeStore: Send + Sync {
    async fn load(&self) -> Result<PracticeSnapshot, RepositoryError>;

    async fn commit(
        &self,
        snapshot: &PracticeSnapshot,
        changed: &[Collection],
    ) -> Result<(), RepositoryError>;
}

pub(crate) fn encode_documents(
    snapshot: &PracticeSnapshot,
    changed: &[Collection],
) -> Result<Vec<(Collection, String)>, RepositoryError> {
    changed
        .iter()
        .map(|collection| {
            snapshot
                .document(*collection)
                .map(|body| (*collection, body))
                .map_err(|error| RepositoryError::Encode(format!("{}: {error}", collection.key())))
        })
        .collect()
}

pub(crate) fn decode_document(
    snapshot: &mut PracticeSnapshot,
    collection: Collection,
    body: &str,
) -> Result<(), RepositoryError> {
    snapshot
        .apply_document(collection, body)
        .map_err(|error| RepositoryError::Decode(format!("{}: {error}", collection.key())))
}
