//! Record store: keyed student profiles

use crate::db::{self, Database};
use crate::error::{Result, StoreError};
use crate::event::SyncEvent;
use crate::record::{RecordPatch, StudentRecord};
use std::sync::Arc;

/// Durable keyed storage for [`StudentRecord`]s.
#[derive(Clone)]
pub struct RecordStore {
    db: Arc<Database>,
}

impl RecordStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Point lookup. An absent record is not an error.
    pub async fn get(&self, id: &str) -> Result<Option<StudentRecord>> {
        self.db.read(|conn| db::load_student(conn, id)).await
    }

    /// Full overwrite of the record at `record.id`.
    pub async fn put(&self, record: &StudentRecord) -> Result<()> {
        self.db.transact(|tx| db::store_student(tx, record)).await?;
        tracing::debug!("Stored record for {}", record.id);
        Ok(())
    }

    /// Insert a new record, failing if the id is taken.
    pub async fn create(&self, record: &StudentRecord) -> Result<()> {
        self.db
            .transact(|tx| {
                if db::load_student(tx, &record.id)?.is_some() {
                    return Err(StoreError::DuplicateIdentity(record.id.clone()));
                }
                db::store_student(tx, record)
            })
            .await
    }

    /// Merge `patch` over the current record and return the result.
    pub async fn merge(&self, id: &str, patch: &RecordPatch) -> Result<StudentRecord> {
        let (record, _) = self
            .update(id, |record| {
                patch.apply_to(record);
                Ok(None)
            })
            .await?;
        Ok(record)
    }

    /// Atomic read-modify-write of one record.
    ///
    /// `f` sees the freshly read record and may return an event, which is
    /// appended to the outbox in the same transaction. Returns the written
    /// record and the event's sequence id. `f` may not change the record's
    /// `id` or `created_at`.
    pub async fn update<F>(&self, id: &str, f: F) -> Result<(StudentRecord, Option<u64>)>
    where
        F: FnOnce(&mut StudentRecord) -> Result<Option<SyncEvent>>,
    {
        self.db
            .transact(|tx| {
                let mut record = db::load_student(tx, id)?
                    .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
                let created_at = record.created_at;
                let event = f(&mut record)?;
                if record.id != id || record.created_at != created_at {
                    return Err(StoreError::InvalidInput(format!(
                        "update of {} may not change id or createdAt",
                        id
                    )));
                }
                db::store_student(tx, &record)?;
                let seq = event.map(|ev| db::append_event(tx, &ev)).transpose()?;
                Ok((record, seq))
            })
            .await
    }

    /// All records ordered by id.
    pub async fn list(&self) -> Result<Vec<StudentRecord>> {
        self.db.read(db::list_students).await
    }
}
