use std::{fmt, str::FromStr};

use anyhow::anyhow;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

use crate::schema::{guild_settings, suggestions, votes};

#[derive(Queryable, Insertable, Clone, Debug, PartialEq)]
#[table_name = "guild_settings"]
pub struct GuildConfigRow {
    pub guild_id: i64,
    pub suggestion_channel_id: Option<i64>,
    pub reviewer_role_id: Option<i64>,
    pub blocked_role_id: Option<i64>,
}

/// Per-guild configuration. A `None` field means "not configured".
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GuildConfig {
    pub guild_id: u64,
    pub suggestion_channel_id: Option<u64>,
    pub reviewer_role_id: Option<u64>,
    pub blocked_role_id: Option<u64>,
}

impl From<GuildConfigRow> for GuildConfig {
    fn from(row: GuildConfigRow) -> Self {
        Self {
            guild_id: row.guild_id as u64,
            suggestion_channel_id: row.suggestion_channel_id.map(|id| id as u64),
            reviewer_role_id: row.reviewer_role_id.map(|id| id as u64),
            blocked_role_id: row.blocked_role_id.map(|id| id as u64),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SuggestionStatus {
    Pending,
    Approved,
    Rejected,
}

impl SuggestionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestionStatus::Pending => "pending",
            SuggestionStatus::Approved => "approved",
            SuggestionStatus::Rejected => "rejected",
        }
    }

    pub fn is_pending(&self) -> bool {
        *self == SuggestionStatus::Pending
    }
}

impl FromStr for SuggestionStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SuggestionStatus::Pending),
            "approved" => Ok(SuggestionStatus::Approved),
            "rejected" => Ok(SuggestionStatus::Rejected),
            other => Err(anyhow!("unknown suggestion status {:?}", other)),
        }
    }
}

impl fmt::Display for SuggestionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VoteType {
    Upvote,
    Downvote,
}

impl VoteType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteType::Upvote => "upvote",
            VoteType::Downvote => "downvote",
        }
    }
}

impl FromStr for VoteType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upvote" => Ok(VoteType::Upvote),
            "downvote" => Ok(VoteType::Downvote),
            other => Err(anyhow!("unknown vote type {:?}", other)),
        }
    }
}

impl fmt::Display for VoteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VoteTally {
    pub upvotes: i64,
    pub downvotes: i64,
}

#[derive(Queryable, Clone, Debug)]
pub struct SuggestionRow {
    pub suggestion_id: String,
    pub guild_id: i64,
    pub user_id: i64,
    pub message_id: i64,
    pub thread_id: Option<i64>,
    pub title: String,
    pub description: String,
    pub pros: String,
    pub cons: String,
    pub image_url: Option<String>,
    pub status: String,
    pub created_at: String,
    pub decision_reason: Option<String>,
    pub decided_anonymously: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Suggestion {
    pub id: String,
    pub guild_id: u64,
    pub author_id: u64,
    pub message_id: u64,
    pub thread_id: Option<u64>,
    pub title: String,
    pub description: String,
    pub pros: String,
    pub cons: String,
    pub image_url: Option<String>,
    pub status: SuggestionStatus,
    pub created_at: DateTime<Utc>,
    pub decision_reason: Option<String>,
    pub decided_anonymously: bool,
}

/// RFC 3339, or a timestamp without offset as written by older releases,
/// which is taken to be UTC.
fn parse_created_at(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(stamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(stamp.with_timezone(&Utc));
    }
    raw.trim()
        .replacen(' ', "T", 1)
        .parse::<NaiveDateTime>()
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

impl TryFrom<SuggestionRow> for Suggestion {
    type Error = anyhow::Error;

    fn try_from(row: SuggestionRow) -> Result<Self, Self::Error> {
        let created_at = parse_created_at(&row.created_at).ok_or_else(|| {
            anyhow!(
                "suggestion {} has a malformed created_at {:?}",
                row.suggestion_id,
                row.created_at
            )
        })?;
        Ok(Self {
            status: row.status.parse()?,
            id: row.suggestion_id,
            guild_id: row.guild_id as u64,
            author_id: row.user_id as u64,
            message_id: row.message_id as u64,
            thread_id: row.thread_id.map(|id| id as u64),
            title: row.title,
            description: row.description,
            pros: row.pros,
            cons: row.cons,
            image_url: row.image_url,
            created_at,
            decision_reason: row.decision_reason,
            decided_anonymously: row.decided_anonymously,
        })
    }
}

#[derive(Insertable)]
#[table_name = "suggestions"]
pub struct NewSuggestion<'a> {
    pub suggestion_id: &'a str,
    pub guild_id: i64,
    pub user_id: i64,
    pub message_id: i64,
    pub thread_id: Option<i64>,
    pub title: &'a str,
    pub description: &'a str,
    pub pros: &'a str,
    pub cons: &'a str,
    pub image_url: Option<&'a str>,
    pub status: &'a str,
    pub created_at: String,
    pub decision_reason: Option<&'a str>,
    pub decided_anonymously: bool,
}

#[derive(Insertable)]
#[table_name = "votes"]
pub struct NewVote<'a> {
    pub suggestion_id: &'a str,
    pub user_id: i64,
    pub vote_type: &'a str,
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, Timelike};

    use super::*;

    #[test]
    fn created_at_keeps_its_offset() {
        let stamp = parse_created_at("2024-03-01T14:00:00+02:00").unwrap();
        assert_eq!(stamp.hour(), 12);
    }

    #[test]
    fn created_at_without_offset_is_utc() {
        let stamp = parse_created_at("2024-03-01T12:00:00.123456").unwrap();
        assert_eq!((stamp.day(), stamp.hour()), (1, 12));
        assert_eq!(stamp.nanosecond(), 123_456_000);

        let spaced = parse_created_at("2024-03-01 12:00:00").unwrap();
        assert_eq!(spaced.hour(), 12);
    }

    #[test]
    fn garbage_created_at_is_refused() {
        assert_eq!(parse_created_at("yesterday"), None);
        assert_eq!(parse_created_at(""), None);
    }
}
