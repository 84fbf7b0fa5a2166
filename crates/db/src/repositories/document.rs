use chrono::Utc;
use sqlx::Row;
use tracing::debug;

use frontdesk_core::snapshot::{Collection, PracticeSnapshot};

use super::{decode_document, encode_documents, PracticeStore, RepositoryError};
use crate::DbPool;

/// Practice documents in the `practice_document` table, one row per
/// collection.
pub struct SqlPracticeStore {
    pool: DbPool,
}

impl SqlPracticeStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Collections that have a stored document, in key order.
    pub async fn stored_collections(&self) -> Result<Vec<Collection>, RepositoryError> {
        let keys: Vec<String> =
            sqlx::query_scalar("SELECT collection FROM practice_document ORDER BY collection")
                .fetch_all(&self.pool)
                .await?;
        keys.iter().map(|key| parse_collection(key)).collect()
    }
}

#[async_trait::async_trait]
impl PracticeStore for SqlPracticeStore {
    async fn load(&self) -> Result<PracticeSnapshot, RepositoryError> {
        let rows = sqlx::query("SELECT collection, body FROM practice_document")
            .fetch_all(&self.pool)
            .await?;

        let mut snapshot = PracticeSnapshot::default();
        for row in rows {
            let key: String = row.try_get("collection")?;
            let body: String = row.try_get("body")?;
            decode_document(&mut snapshot, parse_collection(&key)?, &body)?;
        }
        Ok(snapshot)
    }

    async fn commit(
        &self,
        snapshot: &PracticeSnapshot,
        changed: &[Collection],
    ) -> Result<(), RepositoryError> {
        if changed.is_empty() {
            return Ok(());
        }

        let encoded = encode_documents(snapshot, changed)?;
        let updated_at = Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await?;

        for (collection, body) in &encoded {
            sqlx::query(
                "INSERT INTO practice_document (collection, body, updated_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(collection) DO UPDATE SET body = excluded.body, updated_at = excluded.updated_at",
            )
            .bind(collection.key())
            .bind(body)
            .bind(&updated_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        debug!(
            event_name = "store.documents.committed",
            collections = ?changed.iter().map(Collection::key).collect::<Vec<_>>(),
            "committed practice documents"
        );
        Ok(())
    }
}

fn parse_collection(key: &str) -> Result<Collection, RepositoryError> {
    Collection::parse(key)
        .ok_or_else(|| RepositoryError::Decode(format!("unknown practice collection `{key}`")))
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};

    use frontdesk_core::directory::Registration;
    use frontdesk_core::domain::slot::SlotDay;
    use frontdesk_core::slots::SlotBook;
    use frontdesk_core::snapshot::{Collection, PracticeSnapshot};

    use super::SqlPracticeStore;
    use crate::migrations::run_pending;
    use crate::repositories::{PracticeStore, RepositoryError};
    use crate::{connect_with_settings, DbPool};

    async fn migrated_pool() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        run_pending(&pool).await.expect("migrate");
        pool
    }

    fn practice() -> PracticeSnapshot {
        let today = NaiveDate::from_ymd_opt(2025, 10, 20).expect("date");
        let mut practice = PracticeSnapshot {
            slots: SlotBook::new(vec![SlotDay::new(
                NaiveDate::from_ymd_opt(2025, 10, 25).expect("date"),
                vec!["9:00 AM".parse().expect("time"), "2:00 PM".parse().expect("time")],
            )]),
            ..PracticeSnapshot::default()
        };
        practice
            .patients
            .register(
                &Registration {
                    full_name: "John Doe".to_string(),
                    phone: "1234567890".to_string(),
                    date_of_birth: "01151990".to_string(),
                    insurance: "Blue Cross".to_string(),
                },
                today,
            )
            .expect("register");
        practice
    }

    #[tokio::test]
    async fn committed_documents_load_back() {
        let store = SqlPracticeStore::new(migrated_pool().await);
        let practice = practice();

        store.commit(&practice, &Collection::ALL).await.expect("commit");
        let loaded = store.load().await.expect("load");

        assert_eq!(loaded, practice);
        assert_eq!(
            store.stored_collections().await.expect("collections"),
            vec![Collection::Alerts, Collection::Appointments, Collection::Patients, Collection::SlotDays]
        );
    }

    #[tokio::test]
    async fn commit_leaves_unlisted_collections_alone() {
        let store = SqlPracticeStore::new(migrated_pool().await);
        let practice = practice();
        store.commit(&practice, &[Collection::SlotDays]).await.expect("slots only");

        let loaded = store.load().await.expect("load");
        assert!(loaded.patients.is_empty());
        assert_eq!(loaded.slots, practice.slots);
    }

    #[tokio::test]
    async fn corrupt_documents_surface_as_decode_errors() {
        let pool = migrated_pool().await;
        sqlx::query(
            "INSERT INTO practice_document (collection, body, updated_at) VALUES ('patients', '{not json', ?1)",
        )
        .bind(Utc::now().to_rfc3339())
        .execute(&pool)
        .await
        .expect("insert");

        let error = SqlPracticeStore::new(pool).load().await.expect_err("decode");
        assert!(matches!(error, RepositoryError::Decode(ref message) if message.starts_with("patients")));
    }

    #[tokio::test]
    async fn missing_table_is_a_database_error() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        let error = SqlPracticeStore::new(pool).load().await.expect_err("no schema");
        assert!(matches!(error, RepositoryError::Database(_)));
    }
}
