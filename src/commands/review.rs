use serenity::{
    model::application::interaction::application_command::ApplicationCommandInteraction,
    prelude::Context,
};

use crate::{
    extensions::*,
    suggestion::{
        lifecycle::{self, authorize_reviewer, Decision, Verdict},
        presentation::{publish_decision, DecisionBanner},
        token::is_suggestion_id,
        SuggestionError,
    },
};

fn confirmation(verdict: Verdict, suggestion_id: &str) -> String {
    match verdict {
        Verdict::Approved => format!("✅ Suggestion `{}` approved!", suggestion_id),
        Verdict::Rejected => format!("❌ Suggestion `{}` rejected!", suggestion_id),
    }
}

/// `/approve` and `/reject`. The reviewer gets an answer as soon as the decision
/// is stored. Rendering it on the summary and closing the thread come after.
pub async fn decide(ctx: &Context, command: &ApplicationCommandInteraction) -> Result<(), SuggestionError> {
    let guild_id = command.guild_id.ok_or(SuggestionError::GuildOnly)?;
    let member = command.member.as_ref().ok_or(SuggestionError::GuildOnly)?;
    let verdict = match command.data.name.as_str() {
        "approve" => Verdict::Approved,
        _ => Verdict::Rejected,
    };

    let db = ctx.get_db().await?;
    let config = db.get_guild_config(guild_id.0)?;
    authorize_reviewer(config.as_ref(), &member.role_ids(), member.is_admin())?;

    let options = &command.data.options;
    let suggestion_id = options
        .by_name("suggestion_id")
        .and_then(|o| o.to_string())
        .map(|id| id.trim().to_string())
        .filter(|id| is_suggestion_id(id))
        .ok_or(SuggestionError::NotFound)?;
    let decision = Decision {
        verdict,
        reason: options.by_name("reason").and_then(|o| o.to_string()),
        anonymous: options
            .by_name("anonymous")
            .and_then(|o| o.to_bool())
            .unwrap_or(false),
    };

    let suggestion = lifecycle::decide(&db, guild_id.0, &suggestion_id, &decision)?;
    command
        .reply_ephemeral(&ctx.http, confirmation(verdict, &suggestion_id))
        .await?;

    if let Some(banner) = DecisionBanner::for_suggestion(&suggestion, command.user.id.0) {
        publish_decision(&ctx.http, &db, &suggestion, &banner).await;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confirmations_name_the_suggestion() {
        assert_eq!(
            confirmation(Verdict::Approved, "abcd1234"),
            "✅ Suggestion `abcd1234` approved!"
        );
        assert_eq!(
            confirmation(Verdict::Rejected, "abcd1234"),
            "❌ Suggestion `abcd1234` rejected!"
        );
    }
}
