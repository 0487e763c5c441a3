//! Output formatting for student records

use anyhow::Result;
use serde::Serialize;
use skillrush_core::StudentRecord;

/// A record as shown to an operator, without the password hash.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile<'a> {
    pub id: &'a str,
    pub name: &'a str,
    #[serde(rename = "class")]
    pub class_name: Option<&'a str>,
    pub points: u64,
    pub badges: &'a [String],
    pub streak: u32,
    pub games_played: u32,
    pub created_at: i64,
    pub last_login: Option<i64>,
    pub last_played: Option<i64>,
    pub last_sync: Option<i64>,
    pub has_avatar: bool,
}

impl<'a> From<&'a StudentRecord> for Profile<'a> {
    fn from(r: &'a StudentRecord) -> Self {
        Self {
            id: &r.id,
            name: &r.name,
            class_name: r.class_name.as_deref(),
            points: r.points,
            badges: &r.badges,
            streak: r.streak,
            games_played: r.games_played,
            created_at: r.created_at,
            last_login: r.last_login,
            last_played: r.last_played,
            last_sync: r.last_sync,
            has_avatar: r.avatar.is_some(),
        }
    }
}

pub fn profile_json(record: &StudentRecord) -> Result<String> {
    Ok(serde_json::to_string_pretty(&Profile::from(record))?)
}

pub fn summary_line(record: &StudentRecord) -> String {
    format!(
        "{}\t{}\tclass={}\tpoints={}\tstreak={}\tgames={}\tbadges={}",
        record.id,
        record.name,
        record.class_name.as_deref().unwrap_or("-"),
        record.points,
        record.streak,
        record.games_played,
        record.badges.join(",")
    )
}
