//! Outbox queue of events awaiting synchronization
//!
//! Append-only and FIFO by sequence id. `clear` removes whatever is
//! visible when it acquires the store; an append serialized after it
//! survives. A sync agent that must not lose events appended while it
//! was flushing should use [`OutboxQueue::acknowledge`] with the last
//! sequence id it flushed instead.

use crate::db::{self, Database};
use crate::error::Result;
use crate::event::{OutboxEvent, SyncEvent};
use std::sync::Arc;

#[derive(Clone)]
pub struct OutboxQueue {
    db: Arc<Database>,
}

impl OutboxQueue {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Append an event, returning its sequence id.
    pub async fn enqueue(&self, event: &SyncEvent) -> Result<u64> {
        let seq = self.db.transact(|tx| db::append_event(tx, event)).await?;
        tracing::debug!("Enqueued {} event #{} for {}", event.kind(), seq, event.student_id());
        Ok(seq)
    }

    /// All pending events in ascending sequence order. Nothing is removed.
    pub async fn drain_all(&self) -> Result<Vec<OutboxEvent>> {
        self.db.read(db::load_events).await
    }

    /// Remove every pending event. Returns how many were removed.
    pub async fn clear(&self) -> Result<usize> {
        let removed = self
            .db
            .transact(|tx| Ok(tx.execute("DELETE FROM sync", [])?))
            .await?;
        tracing::debug!("Cleared {} outbox events", removed);
        Ok(removed)
    }

    /// Remove events with `sequence_id <= through`.
    pub async fn acknowledge(&self, through: u64) -> Result<usize> {
        let through = i64::try_from(through).unwrap_or(i64::MAX);
        let removed = self
            .db
            .transact(|tx| {
                Ok(tx.execute("DELETE FROM sync WHERE seq <= ?1", rusqlite::params![through])?)
            })
            .await?;
        tracing::debug!("Acknowledged {} outbox events through #{}", removed, through);
        Ok(removed)
    }

    pub async fn len(&self) -> Result<usize> {
        self.db.read(db::count_events).await
    }

    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }
}
