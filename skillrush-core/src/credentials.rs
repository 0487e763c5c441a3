//! Student credentials
//!
//! Passwords are stored as bcrypt hashes with a fresh salt per call.
//! Verifying an unknown id still costs one bcrypt operation at the store's
//! cost, the same as a wrong password.

use crate::error::{Result, StoreError};
use crate::record::StudentRecord;
use crate::records::RecordStore;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::OnceCell;

const DECOY_PASSWORD: &str = "skillrush-decoy";

/// Authentication result
#[derive(Debug, Clone, PartialEq)]
pub enum AuthResult {
    /// Authentication successful with the student id
    Success(String),
    /// Unknown id or wrong password
    Failed,
    /// Authentication error (e.g., storage unavailable)
    Error(String),
}

/// Authentication provider trait
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Authenticate a student with the given credentials
    async fn authenticate(&self, id: &str, password: &str) -> AuthResult;
}

/// Details supplied on the registration screen.
#[derive(Debug, Clone, Default)]
pub struct NewStudent {
    pub id: String,
    pub name: String,
    pub password: String,
    pub class_name: Option<String>,
    pub avatar: Option<String>,
}

impl NewStudent {
    pub fn new(id: impl Into<String>, name: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    pub fn class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    pub fn avatar(mut self, avatar: impl Into<String>) -> Self {
        self.avatar = Some(avatar.into());
        self
    }
}

#[derive(Clone)]
pub struct CredentialStore {
    records: RecordStore,
    cost: u32,
    /// Throwaway hash compared against when the id is unknown.
    decoy: Arc<OnceCell<String>>,
}

impl CredentialStore {
    pub fn new(records: RecordStore, cost: u32) -> Self {
        Self {
            records,
            cost,
            decoy: Arc::new(OnceCell::new()),
        }
    }

    /// Register a student with just an id, name and password.
    pub async fn register(&self, id: &str, name: &str, password: &str) -> Result<StudentRecord> {
        self.register_with(NewStudent::new(id, name, password)).await
    }

    /// Register a student. Fails with `DuplicateIdentity` if the id exists.
    /// A blank name falls back to the id.
    pub async fn register_with(&self, new: NewStudent) -> Result<StudentRecord> {
        let id = normalize_id(&new.id).to_string();
        if id.is_empty() {
            return Err(StoreError::InvalidInput("Student ID cannot be empty".to_string()));
        }
        let name = match new.name.trim() {
            "" => id.clone(),
            name => name.to_string(),
        };
        if new.password.is_empty() {
            return Err(StoreError::InvalidInput("Password cannot be empty".to_string()));
        }

        // Avoid paying for a hash when the id is obviously taken; `create`
        // re-checks inside its transaction.
        if self.records.get(&id).await?.is_some() {
            return Err(StoreError::DuplicateIdentity(id));
        }

        let password_hash = hash_password(new.password, self.cost).await?;
        let mut record = StudentRecord::new(
            id,
            name,
            password_hash,
            chrono::Utc::now().timestamp_millis(),
        );
        record.class_name = new.class_name;
        record.avatar = new.avatar;

        self.records.create(&record).await?;
        tracing::info!("Registered student {}", record.id);
        Ok(record)
    }

    /// Check a password. Returns `false` for an unknown id or a wrong
    /// password alike.
    pub async fn verify(&self, id: &str, password: &str) -> Result<bool> {
        let id = normalize_id(id);
        let ok = match self.records.get(id).await? {
            Some(record) => verify_password(password.to_string(), record.password_hash).await?,
            None => {
                self.burn_decoy(password).await?;
                false
            }
        };
        if !ok {
            tracing::warn!("Failed login attempt for {}", id);
        }
        Ok(ok)
    }

    /// Spend exactly one bcrypt operation: build the decoy on first use,
    /// compare against it afterwards.
    async fn burn_decoy(&self, password: &str) -> Result<()> {
        if let Some(decoy) = self.decoy.get() {
            verify_password(password.to_string(), decoy.clone()).await?;
            return Ok(());
        }
        let cost = self.cost;
        self.decoy
            .get_or_try_init(|| hash_password(DECOY_PASSWORD.to_string(), cost))
            .await?;
        Ok(())
    }
}

/// Ids are compared with surrounding whitespace removed.
pub(crate) fn normalize_id(id: &str) -> &str {
    id.trim()
}

async fn hash_password(password: String, cost: u32) -> Result<String> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| StoreError::Hash(e.to_string()))?
        .map_err(StoreError::from)
}

async fn verify_password(password: String, hash: String) -> Result<bool> {
    let verified = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| StoreError::Hash(e.to_string()))?;
    match verified {
        Ok(ok) => Ok(ok),
        // A malformed stored hash can never match.
        Err(e) => {
            tracing::warn!("Unreadable password hash: {}", e);
            Ok(false)
        }
    }
}

#[async_trait]
impl AuthProvider for CredentialStore {
    async fn authenticate(&self, id: &str, password: &str) -> AuthResult {
        let id = normalize_id(id);
        if id.is_empty() || password.is_empty() {
            return AuthResult::Failed;
        }

        match self.verify(id, password).await {
            Ok(true) => AuthResult::Success(id.to_string()),
            Ok(false) => AuthResult::Failed,
            Err(e) => AuthResult::Error(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::db::Database;

    fn store() -> CredentialStore {
        let db = Arc::new(Database::open(&StoreConfig::in_memory()).unwrap());
        CredentialStore::new(RecordStore::new(db), 4)
    }

    #[tokio::test]
    async fn test_register_then_verify() {
        let creds = store();
        let record = creds.register("s1", "A", "secret123").await.unwrap();
        assert_eq!(record.id, "s1");
        assert_eq!(record.points, 0);
        assert!(record.badges.is_empty());
        assert_eq!(record.games_played, 0);
        assert!(record.created_at > 0);

        assert!(creds.verify("s1", "secret123").await.unwrap());
        assert!(!creds.verify("s1", "wrong").await.unwrap());
        assert!(!creds.verify("unknown", "anything").await.unwrap());
    }

    #[tokio::test]
    async fn test_hash_is_not_plaintext_and_salted() {
        let creds = store();
        let a = creds.register("s1", "A", "same-pass").await.unwrap();
        let b = creds.register("s2", "B", "same-pass").await.unwrap();
        assert!(!a.password_hash.contains("same-pass"));
        assert!(a.password_hash.starts_with("$2"));
        assert_ne!(a.password_hash, b.password_hash);
    }

    #[tokio::test]
    async fn test_duplicate_registration_rejected() {
        let creds = store();
        let first = creds.register("s1", "A", "secret123").await.unwrap();
        let err = creds.register("s1", "B", "other").await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateIdentity(_)));

        let stored = creds.records.get("s1").await.unwrap().unwrap();
        assert_eq!(stored, first);
        assert!(creds.verify("s1", "secret123").await.unwrap());
        assert!(!creds.verify("s1", "other").await.unwrap());
    }

    #[tokio::test]
    async fn test_register_with_class_and_avatar() {
        let creds = store();
        let record = creds
            .register_with(NewStudent::new(" s7 ", "Mina", "pw").class_name("6").avatar("data:,x"))
            .await
            .unwrap();
        assert_eq!(record.id, "s7");
        assert_eq!(record.class_name.as_deref(), Some("6"));
        assert_eq!(record.avatar.as_deref(), Some("data:,x"));
    }

    #[tokio::test]
    async fn test_register_rejects_empty_fields() {
        let creds = store();
        for (id, name, pw) in [("", "A", "pw"), ("  ", "A", "pw"), ("s1", "A", "")] {
            let err = creds.register(id, name, pw).await.unwrap_err();
            assert!(matches!(err, StoreError::InvalidInput(_)));
        }
        assert!(creds.records.get("s1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_blank_name_falls_back_to_id() {
        let creds = store();
        let record = creds.register(" s1 ", "  ", "pw").await.unwrap();
        assert_eq!(record.name, "s1");
        assert_eq!(creds.records.get("s1").await.unwrap().unwrap().name, "s1");
    }

    #[tokio::test]
    async fn test_decoy_built_once_at_store_cost() {
        let creds = store();
        assert!(creds.decoy.get().is_none());
        assert!(!creds.verify("ghost", "pw").await.unwrap());

        let decoy = creds.decoy.get().cloned().unwrap();
        assert!(decoy.starts_with("$2b$04$"));
        assert!(!creds.verify("ghost", "pw").await.unwrap());
        assert_eq!(creds.decoy.get(), Some(&decoy));
    }

    #[tokio::test]
    async fn test_ids_are_trimmed_everywhere() {
        let creds = store();
        creds.register("s1", "A", "secret123").await.unwrap();
        assert!(creds.verify(" s1 ", "secret123").await.unwrap());
        assert!(!creds.verify(" s1 ", "wrong").await.unwrap());
        assert_eq!(
            creds.authenticate("\ts1 ", "secret123").await,
            AuthResult::Success("s1".into())
        );
        assert_eq!(creds.authenticate("   ", "secret123").await, AuthResult::Failed);
    }

    #[tokio::test]
    async fn test_decoy_hash_never_authenticates() {
        let creds = store();
        // The decoy is built from a known string; it must still fail.
        assert!(!creds.verify("ghost", DECOY_PASSWORD).await.unwrap());
        assert!(!creds.verify("ghost", DECOY_PASSWORD).await.unwrap());
    }

    #[tokio::test]
    async fn test_corrupt_stored_hash_fails_closed() {
        let creds = store();
        let mut record = creds.register("s1", "A", "pw").await.unwrap();
        record.password_hash = "not-a-hash".into();
        creds.records.put(&record).await.unwrap();
        assert!(!creds.verify("s1", "pw").await.unwrap());
    }

    #[tokio::test]
    async fn test_auth_provider() {
        let creds = store();
        creds.register("s1", "A", "secret123").await.unwrap();
        assert_eq!(
            creds.authenticate("s1", "secret123").await,
            AuthResult::Success("s1".into())
        );
        assert_eq!(creds.authenticate("s1", "nope").await, AuthResult::Failed);
        assert_eq!(creds.authenticate("nobody", "x").await, AuthResult::Failed);
        assert_eq!(creds.authenticate("", "").await, AuthResult::Failed);
    }
}
