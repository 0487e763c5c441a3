//! Entry point wiring all components to one database

use crate::config::StoreConfig;
use crate::credentials::CredentialStore;
use crate::db::Database;
use crate::error::Result;
use crate::outbox::OutboxQueue;
use crate::progress::ProgressApplier;
use crate::record::StudentRecord;
use crate::records::RecordStore;
use crate::session::LoginTracker;
use std::sync::Arc;

/// The offline account & progress store.
///
/// Holds no session state: every operation names its student explicitly.
#[derive(Clone)]
pub struct OfflineStore {
    records: RecordStore,
    outbox: OutboxQueue,
    credentials: CredentialStore,
    logins: LoginTracker,
    progress: ProgressApplier,
}

impl OfflineStore {
    /// Open (or create) the store described by `config`.
    pub fn open(config: &StoreConfig) -> Result<Self> {
        config.validate()?;
        let db = Arc::new(Database::open(config)?);
        let records = RecordStore::new(db.clone());

        if !config.in_memory {
            tracing::info!("Opened offline store at {}", config.db_path().display());
        }

        Ok(Self {
            outbox: OutboxQueue::new(db),
            credentials: CredentialStore::new(records.clone(), config.bcrypt_cost),
            logins: LoginTracker::new(records.clone(), config.day_boundary()),
            progress: ProgressApplier::new(records.clone()),
            records,
        })
    }

    pub fn records(&self) -> &RecordStore {
        &self.records
    }

    pub fn outbox(&self) -> &OutboxQueue {
        &self.outbox
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub fn logins(&self) -> &LoginTracker {
        &self.logins
    }

    pub fn progress(&self) -> &ProgressApplier {
        &self.progress
    }

    /// Verify credentials and record the login. `None` means bad
    /// credentials.
    pub async fn login(&self, id: &str, password: &str) -> Result<Option<StudentRecord>> {
        self.logins.login(&self.credentials, id, password).await
    }
}
