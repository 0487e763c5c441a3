//! Outbox event definitions
//!
//! Events are serialized with a `type` tag (`login`, `gameResult`,
//! `badgeGranted`) and camelCase fields. The browser build queued the same
//! objects with `ts` instead of `timestamp`; both names are accepted when
//! reading, `timestamp` is always written.

use serde::{Deserialize, Serialize};

/// A tracked action waiting to be synchronized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
#[non_exhaustive]
pub enum SyncEvent {
    /// A successful authentication.
    Login {
        student_id: String,
        #[serde(alias = "ts")]
        timestamp: i64,
    },

    /// A completed mini-game.
    GameResult {
        student_id: String,
        game: String,
        score: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        questions: Option<u32>,
        #[serde(alias = "ts")]
        timestamp: i64,
    },

    /// A badge newly granted outside of a game result.
    BadgeGranted {
        student_id: String,
        badge: String,
        #[serde(alias = "ts")]
        timestamp: i64,
    },
}

impl SyncEvent {
    pub fn login(student_id: impl Into<String>, timestamp: i64) -> Self {
        SyncEvent::Login {
            student_id: student_id.into(),
            timestamp,
        }
    }

    /// Tag stored alongside the payload.
    pub fn kind(&self) -> &'static str {
        match self {
            SyncEvent::Login { .. } => "login",
            SyncEvent::GameResult { .. } => "gameResult",
            SyncEvent::BadgeGranted { .. } => "badgeGranted",
        }
    }

    pub fn student_id(&self) -> &str {
        match self {
            SyncEvent::Login { student_id, .. }
            | SyncEvent::GameResult { student_id, .. }
            | SyncEvent::BadgeGranted { student_id, .. } => student_id,
        }
    }

    pub fn timestamp(&self) -> i64 {
        match self {
            SyncEvent::Login { timestamp, .. }
            | SyncEvent::GameResult { timestamp, .. }
            | SyncEvent::BadgeGranted { timestamp, .. } => *timestamp,
        }
    }
}

/// An event as stored in the outbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboxEvent {
    /// FIFO key, assigned at append time and never reused.
    pub sequence_id: u64,
    #[serde(flatten)]
    pub event: SyncEvent,
}
