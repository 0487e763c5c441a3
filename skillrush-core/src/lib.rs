//! SkillRush Core Library
//!
//! Offline account & progress store for the SkillRush learning app:
//! - Student records (SQLite, one row per student)
//! - bcrypt credentials
//! - Login streak tracking
//! - Points, badges and play counts from finished games
//! - Outbox queue of events for a later sync agent

pub mod config;
pub mod credentials;
pub mod db;
pub mod error;
pub mod event;
pub mod outbox;
pub mod progress;
pub mod record;
pub mod records;
pub mod session;
pub mod store;

pub use config::{DayBoundary, StoreConfig, DEFAULT_BCRYPT_COST};
pub use credentials::{AuthProvider, AuthResult, CredentialStore, NewStudent};
pub use db::Database;
pub use error::{Result, StoreError};
pub use event::{OutboxEvent, SyncEvent};
pub use outbox::OutboxQueue;
pub use progress::{GameResult, ProgressApplier};
pub use record::{RecordPatch, StudentRecord};
pub use records::RecordStore;
pub use session::{next_streak, LoginTracker};
pub use store::OfflineStore;
