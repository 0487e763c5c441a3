//! Student profile record
//!
//! The serialized shape is camelCase JSON, the same field names the
//! browser build stored in IndexedDB. Fields added after the first release
//! default when missing, so its records deserialize unchanged.

use serde::{Deserialize, Serialize};

/// A student's identity and accumulated progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    /// Primary key, chosen by the student at registration.
    pub id: String,
    /// Display name.
    pub name: String,
    /// bcrypt hash including its salt.
    pub password_hash: String,
    /// Creation time (Unix millis).
    pub created_at: i64,
    #[serde(default)]
    pub points: u64,
    /// Badge identifiers in the order they were granted, without duplicates.
    #[serde(default)]
    pub badges: Vec<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    /// Class / grade.
    #[serde(default, rename = "class")]
    pub class_name: Option<String>,
    /// Consecutive calendar days with a login.
    #[serde(default)]
    pub streak: u32,
    #[serde(default)]
    pub last_login: Option<i64>,
    #[serde(default)]
    pub games_played: u32,
    #[serde(default)]
    pub last_played: Option<i64>,
    /// Set by the sync agent after a successful flush.
    #[serde(default)]
    pub last_sync: Option<i64>,
}

impl StudentRecord {
    /// Create a fresh record with zeroed progress.
    pub fn new(id: String, name: String, password_hash: String, created_at: i64) -> Self {
        Self {
            id,
            name,
            password_hash,
            created_at,
            points: 0,
            badges: Vec::new(),
            avatar: None,
            class_name: None,
            streak: 0,
            last_login: None,
            games_played: 0,
            last_played: None,
            last_sync: None,
        }
    }

    /// Whether the student holds `badge`.
    pub fn has_badge(&self, badge: &str) -> bool {
        self.badges.iter().any(|b| b == badge)
    }

    /// Grant a badge. Returns `false` if it was already held.
    pub fn grant_badge(&mut self, badge: &str) -> bool {
        if self.has_badge(badge) {
            return false;
        }
        self.badges.push(badge.to_string());
        true
    }
}

/// A partial update applied by [`crate::RecordStore::merge`].
///
/// `Some` fields overwrite, additive fields are added to the freshly
/// read record inside the store transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordPatch {
    pub name: Option<String>,
    /// `Some(None)` clears the avatar.
    pub avatar: Option<Option<String>>,
    /// `Some(None)` clears the class.
    pub class_name: Option<Option<String>>,
    pub last_sync: Option<i64>,
    pub add_points: u64,
    pub add_games_played: u32,
    pub grant_badges: Vec<String>,
}

impl RecordPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn avatar(mut self, avatar: Option<String>) -> Self {
        self.avatar = Some(avatar);
        self
    }

    pub fn class_name(mut self, class_name: Option<String>) -> Self {
        self.class_name = Some(class_name);
        self
    }

    pub fn last_sync(mut self, ts: i64) -> Self {
        self.last_sync = Some(ts);
        self
    }

    pub fn add_points(mut self, points: u64) -> Self {
        self.add_points = self.add_points.saturating_add(points);
        self
    }

    pub fn add_games_played(mut self, games: u32) -> Self {
        self.add_games_played = self.add_games_played.saturating_add(games);
        self
    }

    pub fn grant_badge(mut self, badge: impl Into<String>) -> Self {
        self.grant_badges.push(badge.into());
        self
    }

    /// Apply this patch over `record`.
    pub fn apply_to(&self, record: &mut StudentRecord) {
        if let Some(name) = &self.name {
            record.name = name.clone();
        }
        if let Some(avatar) = &self.avatar {
            record.avatar = avatar.clone();
        }
        if let Some(class_name) = &self.class_name {
            record.class_name = class_name.clone();
        }
        if let Some(ts) = self.last_sync {
            record.last_sync = Some(ts);
        }
        record.points = record.points.saturating_add(self.add_points);
        record.games_played = record.games_played.saturating_add(self.add_games_played);
        for badge in &self.grant_badges {
            record.grant_badge(badge);
        }
    }
}
