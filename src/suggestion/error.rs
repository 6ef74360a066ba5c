use diesel::r2d2::PoolError;
use serenity::http::error::Error as HttpError;

/// Failures reported back to the invoking member. The `Display` text is what
/// the member sees in the ephemeral reply.
#[derive(thiserror::Error, Debug)]
pub enum SuggestionError {
    #[error("❌ This command can only be used in a server.")]
    GuildOnly,
    #[error("❌ Suggestion channel not set up. Contact an admin.")]
    ChannelNotConfigured,
    #[error("❌ Suggestion channel not found. Contact an admin.")]
    ChannelMissing,
    #[error("❌ Reviewer role not set up.")]
    ReviewerRoleNotConfigured,
    #[error("❌ You need the reviewer role to use this command.")]
    NotReviewer,
    #[error("❌ You are not allowed to submit suggestions.")]
    Blocked,
    #[error("❌ Suggestion not found.")]
    NotFound,
    #[error("❌ Voting is closed for this suggestion.")]
    VotingClosed,
    #[error("❌ Your vote changed while this click was processed. Please try again.")]
    VoteConflict,
    #[error("❌ Please attach a valid image file.")]
    InvalidAttachment,
    #[error("❌ {field} must be between 1 and {limit} characters.")]
    InvalidField { field: &'static str, limit: usize },
    #[error("❌ Bot is missing required permissions in <#{channel_id}>:\n{}", bullet_list(.missing))]
    MissingPermissions {
        channel_id: u64,
        missing: Vec<&'static str>,
    },
    #[error("❌ Bot lacks permissions to send messages or create threads.")]
    Forbidden,
    #[error("❌ Something went wrong. Please try again later.")]
    Internal(#[from] anyhow::Error),
}

fn bullet_list(items: &[&'static str]) -> String {
    items
        .iter()
        .map(|i| format!("• {}", i))
        .collect::<Vec<_>>()
        .join("\n")
}

impl From<diesel::result::Error> for SuggestionError {
    fn from(e: diesel::result::Error) -> Self {
        SuggestionError::Internal(e.into())
    }
}

impl From<PoolError> for SuggestionError {
    fn from(e: PoolError) -> Self {
        SuggestionError::Internal(e.into())
    }
}

impl From<serenity::Error> for SuggestionError {
    fn from(e: serenity::Error) -> Self {
        if let serenity::Error::Http(http) = &e {
            if let HttpError::UnsuccessfulRequest(response) = http.as_ref() {
                if response.status_code.as_u16() == 403 {
                    return SuggestionError::Forbidden;
                }
            }
        }
        SuggestionError::Internal(e.into())
    }
}
