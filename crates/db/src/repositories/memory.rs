use std::collections::HashMap;

use tokio::sync::RwLock;

use frontdesk_core::snapshot::{Collection, PracticeSnapshot};

use super::{decode_document, encode_documents, PracticeStore, RepositoryError};

/// Keeps serialized documents rather than live structs so reads and writes go
/// through the same encoding as the sqlite store.
#[derive(Default)]
pub struct InMemoryPracticeStore {
    documents: RwLock<HashMap<Collection, String>>,
}

impl InMemoryPracticeStore {
    pub fn with_snapshot(snapshot: &PracticeSnapshot) -> Result<Self, RepositoryError> {
        let documents = encode_documents(snapshot, &Collection::ALL)?;
        Ok(Self { documents: RwLock::new(documents.into_iter().collect()) })
    }

    pub async fn document(&self, collection: Collection) -> Option<String> {
        self.documents.read().await.get(&collection).cloned()
    }
}

#[async_trait::async_trait]
impl PracticeStore for InMemoryPracticeStore {
    async fn load(&self) -> Result<PracticeSnapshot, RepositoryError> {
        let documents = self.documents.read().await;
        let mut snapshot = PracticeSnapshot::default();
        for (collection, body) in documents.iter() {
            decode_document(&mut snapshot, *collection, body)?;
        }
        Ok(snapshot)
    }

    async fn commit(
        &self,
        snapshot: &PracticeSnapshot,
        changed: &[Collection],
    ) -> Result<(), RepositoryError> {
        let encoded = encode_documents(snapshot, changed)?;
        let mut documents = self.documents.write().await;
        documents.extend(encoded);
        Ok(())
    }
}
