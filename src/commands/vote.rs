use serenity::{
    model::application::interaction::message_component::MessageComponentInteraction,
    prelude::Context,
};

use crate::{
    commands::report_failure,
    database::Database,
    extensions::*,
    models::{Suggestion, VoteTally},
    suggestion::{
        ledger::toggle_vote,
        presentation::{parse_vote_custom_id, sync_summary},
        SuggestionError,
    },
};

/// The suggestion and its tally, or `None` once a decision has landed. A
/// reviewer may decide between the vote and the refresh, and the decided
/// summary must not get its buttons back.
fn live_tally(db: &Database, suggestion_id: &str) -> Result<Option<(Suggestion, VoteTally)>, anyhow::Error> {
    let suggestion = db
        .get_suggestion(suggestion_id)?
        .ok_or_else(|| anyhow::anyhow!("suggestion {} vanished", suggestion_id))?;
    if !suggestion.status.is_pending() {
        return Ok(None);
    }
    let tally = db.tally_votes(suggestion_id)?;
    Ok(Some((suggestion, tally)))
}

/// Refreshes the tally on the message the button belongs to.
async fn refresh(ctx: &Context, component: &mut MessageComponentInteraction, db: &Database, suggestion_id: &str) {
    let refreshed = async {
        match live_tally(db, suggestion_id)? {
            Some((suggestion, tally)) => {
                sync_summary(&ctx.http, &mut component.message, &suggestion, tally, None).await
            }
            None => {
                debug!("Skipping tally refresh of decided suggestion {}", suggestion_id);
                Ok::<_, anyhow::Error>(())
            }
        }
    };
    if let Err(e) = refreshed.await {
        warn!("Could not refresh tally of {}: {:#}", suggestion_id, e);
    }
}

/// Upvote and downvote buttons, custom id `<vote type>:<suggestion id>`.
pub async fn handle_button(ctx: &Context, mut component: MessageComponentInteraction) {
    let (requested, suggestion_id) = match parse_vote_custom_id(&component.data.custom_id) {
        Some((kind, id)) => (kind, id.to_string()),
        None => {
            warn!("Unknown button {}", component.data.custom_id);
            return;
        }
    };
    let db = match ctx.get_db().await {
        Ok(db) => db,
        Err(e) => {
            report_failure(ctx, &component, "vote", e.into()).await;
            return;
        }
    };

    let guild_id = match component.guild_id {
        Some(guild_id) => guild_id,
        None => {
            report_failure(ctx, &component, "vote", SuggestionError::GuildOnly).await;
            return;
        }
    };

    match toggle_vote(&db, guild_id.0, &suggestion_id, component.user.id.0, requested) {
        Ok(outcome) => {
            if let Err(e) = component
                .reply_ephemeral(&ctx.http, outcome.reply(requested).to_string())
                .await
            {
                warn!("Could not confirm vote of {}: {}", component.user.id, e);
            }
            refresh(ctx, &mut component, &db, &suggestion_id).await;
        }
        Err(e) => report_failure(ctx, &component, "vote", e).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        database::{suggestions::tests::new_suggestion, testing},
        models::{SuggestionStatus, VoteType},
    };

    #[test]
    fn pending_suggestion_has_a_live_tally() {
        let (_dir, db) = testing::database();
        db.create_suggestion(&new_suggestion("abc12345", 1)).unwrap();
        db.cast_vote("abc12345", 7, VoteType::Upvote).unwrap();

        let (suggestion, tally) = live_tally(&db, "abc12345").unwrap().unwrap();
        assert!(suggestion.status.is_pending());
        assert_eq!(tally, VoteTally { upvotes: 1, downvotes: 0 });
    }

    #[test]
    fn decided_suggestion_is_left_alone() {
        let (_dir, db) = testing::database();
        db.create_suggestion(&new_suggestion("abc12345", 1)).unwrap();
        db.cast_vote("abc12345", 7, VoteType::Upvote).unwrap();
        assert!(db
            .decide_suggestion("abc12345", 1, SuggestionStatus::Rejected, None, false)
            .unwrap());

        assert!(live_tally(&db, "abc12345").unwrap().is_none());
    }

    #[test]
    fn missing_suggestion_is_an_error() {
        let (_dir, db) = testing::database();
        assert!(live_tally(&db, "zzzzzzzz").is_err());
    }
}
