//! Suggestion lifecycle: `pending` on submission, then exactly one reviewer
//! decision moves it to `approved` or `rejected` for good.

use crate::{
    database::Database,
    models::{GuildConfig, NewSuggestion, Suggestion, SuggestionStatus},
    suggestion::SuggestionError,
};

pub const TITLE_LIMIT: usize = 256;
pub const DESCRIPTION_LIMIT: usize = 4000;
pub const PROS_CONS_LIMIT: usize = 1024;

/// A validated suggestion form.
#[derive(Clone, Debug, PartialEq)]
pub struct Submission {
    pub title: String,
    pub description: String,
    pub pros: String,
    pub cons: String,
    pub image_url: Option<String>,
}

fn check_length(
    field: &'static str,
    value: &str,
    limit: usize,
    required: bool,
) -> Result<(), SuggestionError> {
    let len = value.chars().count();
    if len > limit || (required && value.trim().is_empty()) {
        return Err(SuggestionError::InvalidField { field, limit });
    }
    Ok(())
}

impl Submission {
    pub fn new(
        title: String,
        description: String,
        pros: String,
        cons: String,
        image_url: Option<String>,
    ) -> Result<Self, SuggestionError> {
        check_length("Title", &title, TITLE_LIMIT, true)?;
        check_length("Description", &description, DESCRIPTION_LIMIT, true)?;
        check_length("Pros", &pros, PROS_CONS_LIMIT, false)?;
        check_length("Cons", &cons, PROS_CONS_LIMIT, false)?;
        Ok(Self {
            title,
            description,
            pros,
            cons,
            image_url,
        })
    }
}

/// Only `image/*` attachments may be shown on a suggestion.
pub fn check_image_attachment(content_type: Option<&str>) -> Result<(), SuggestionError> {
    match content_type {
        Some(kind) if kind.starts_with("image/") => Ok(()),
        _ => Err(SuggestionError::InvalidAttachment),
    }
}

pub fn ensure_can_submit(
    config: Option<&GuildConfig>,
    member_roles: &[u64],
) -> Result<(), SuggestionError> {
    match config.and_then(|c| c.blocked_role_id) {
        Some(blocked) if member_roles.contains(&blocked) => Err(SuggestionError::Blocked),
        _ => Ok(()),
    }
}

pub fn suggestion_channel(config: Option<&GuildConfig>) -> Result<u64, SuggestionError> {
    config
        .and_then(|c| c.suggestion_channel_id)
        .ok_or(SuggestionError::ChannelNotConfigured)
}

/// Administrators may always decide. Everyone else needs the configured
/// reviewer role.
pub fn authorize_reviewer(
    config: Option<&GuildConfig>,
    member_roles: &[u64],
    is_admin: bool,
) -> Result<(), SuggestionError> {
    if is_admin {
        return Ok(());
    }
    match config.and_then(|c| c.reviewer_role_id) {
        None => Err(SuggestionError::ReviewerRoleNotConfigured),
        Some(role) if member_roles.contains(&role) => Ok(()),
        Some(_) => Err(SuggestionError::NotReviewer),
    }
}

/// Where the published summary of a new suggestion lives.
#[derive(Clone, Copy, Debug)]
pub struct Publication {
    pub guild_id: u64,
    pub author_id: u64,
    pub message_id: u64,
    pub thread_id: Option<u64>,
}

pub fn record_submission(
    db: &Database,
    id: &str,
    published: Publication,
    submission: &Submission,
) -> Result<Suggestion, SuggestionError> {
    db.create_suggestion(&NewSuggestion {
        suggestion_id: id,
        guild_id: published.guild_id as i64,
        user_id: published.author_id as i64,
        message_id: published.message_id as i64,
        thread_id: published.thread_id.map(|t| t as i64),
        title: &submission.title,
        description: &submission.description,
        pros: &submission.pros,
        cons: &submission.cons,
        image_url: submission.image_url.as_deref(),
        status: SuggestionStatus::Pending.as_str(),
        created_at: chrono::Utc::now().to_rfc3339(),
        decision_reason: None,
        decided_anonymously: false,
    })?;
    info!(
        "Suggestion {} submitted by {} in guild {}",
        id, published.author_id, published.guild_id
    );
    db.get_suggestion(id)?.ok_or(SuggestionError::NotFound)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Approved,
    Rejected,
}

impl Verdict {
    pub fn status(self) -> SuggestionStatus {
        match self {
            Verdict::Approved => SuggestionStatus::Approved,
            Verdict::Rejected => SuggestionStatus::Rejected,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Decision {
    pub verdict: Verdict,
    pub reason: Option<String>,
    pub anonymous: bool,
}

/// Moves a pending suggestion of `guild_id` into its terminal state. Unknown
/// tokens, other guilds' suggestions and already decided ones all come back
/// as `NotFound`.
pub fn decide(
    db: &Database,
    guild_id: u64,
    id: &str,
    decision: &Decision,
) -> Result<Suggestion, SuggestionError> {
    let reason = decision
        .reason
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty());
    let applied = db.decide_suggestion(
        id,
        guild_id,
        decision.verdict.status(),
        reason,
        decision.anonymous,
    )?;
    if !applied {
        return Err(SuggestionError::NotFound);
    }
    info!(
        "Suggestion {} in guild {} is now {}",
        id,
        guild_id,
        decision.verdict.status()
    );
    db.get_suggestion(id)?.ok_or(SuggestionError::NotFound)
}
