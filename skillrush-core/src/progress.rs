//! Folding completed activities into a student's progress

use crate::error::Result;
use crate::event::SyncEvent;
use crate::record::StudentRecord;
use crate::records::RecordStore;

/// Outcome of a finished mini-game, as computed by the game itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameResult {
    /// Game identifier (e.g. `science`, `hindi_sentence`).
    pub game: String,
    /// Raw score reported by the game.
    pub score: u32,
    /// Points to add to the student's total.
    pub points: u64,
    /// Number of questions, for quiz-style games.
    pub questions: Option<u32>,
    /// Badges earned in this game.
    pub badges: Vec<String>,
    /// Completion time (Unix millis).
    pub timestamp: i64,
}

impl GameResult {
    /// A result whose points equal its score, finished now.
    pub fn new(game: impl Into<String>, score: u32) -> Self {
        Self {
            game: game.into(),
            score,
            points: u64::from(score),
            questions: None,
            badges: Vec::new(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn points(mut self, points: u64) -> Self {
        self.points = points;
        self
    }

    pub fn questions(mut self, questions: u32) -> Self {
        self.questions = Some(questions);
        self
    }

    pub fn badge(mut self, badge: impl Into<String>) -> Self {
        self.badges.push(badge.into());
        self
    }

    pub fn at(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }
}

#[derive(Clone)]
pub struct ProgressApplier {
    records: RecordStore,
}

impl ProgressApplier {
    pub fn new(records: RecordStore) -> Self {
        Self { records }
    }

    /// Apply a game result and enqueue its `gameResult` event.
    ///
    /// Fails with `NotFound` if the student does not exist.
    pub async fn apply_result(&self, student_id: &str, result: &GameResult) -> Result<StudentRecord> {
        let (record, seq) = self
            .records
            .update(student_id, |record| {
                record.points = record.points.saturating_add(result.points);
                record.games_played = record.games_played.saturating_add(1);
                record.last_played = Some(result.timestamp);
                for badge in &result.badges {
                    record.grant_badge(badge);
                }
                Ok(Some(SyncEvent::GameResult {
                    student_id: record.id.clone(),
                    game: result.game.clone(),
                    score: result.score,
                    questions: result.questions,
                    timestamp: result.timestamp,
                }))
            })
            .await?;
        tracing::debug!(
            "Applied {} result for {}: +{} points (total {}, outbox #{})",
            result.game,
            record.id,
            result.points,
            record.points,
            seq.unwrap_or_default()
        );
        Ok(record)
    }

    /// Grant a badge outside of a game. Returns whether it was new; only a
    /// new badge enqueues a `badgeGranted` event.
    pub async fn grant_badge(&self, student_id: &str, badge: &str) -> Result<bool> {
        let now = chrono::Utc::now().timestamp_millis();
        let (_, seq) = self
            .records
            .update(student_id, |record| {
                Ok(record.grant_badge(badge).then(|| SyncEvent::BadgeGranted {
                    student_id: record.id.clone(),
                    badge: badge.to_string(),
                    timestamp: now,
                }))
            })
            .await?;
        Ok(seq.is_some())
    }
}
