use std::collections::HashMap;

use serenity::{
    builder::CreateComponents,
    model::{
        application::{
            component::{ActionRow, ActionRowComponent, InputTextStyle},
            interaction::{
                application_command::ApplicationCommandInteraction, modal::ModalSubmitInteraction,
                InteractionResponseType,
            },
        },
        channel::{GuildChannel, Message},
        id::ChannelId,
        Permissions,
    },
    prelude::Context,
};

use crate::{
    commands::log_failure,
    extensions::*,
    suggestion::{
        lifecycle::{
            check_image_attachment, ensure_can_submit, record_submission, suggestion_channel,
            Publication, Submission, DESCRIPTION_LIMIT, PROS_CONS_LIMIT, TITLE_LIMIT,
        },
        presentation::{summary_embed, thread_name, vote_buttons, Author, THREAD_AUTO_ARCHIVE},
        token::unused_suggestion_id,
        SuggestionError,
    },
};

pub const SUGGESTION_MODAL: &str = "suggestion_modal";

const REQUIRED_PERMISSIONS: [(Permissions, &str); 4] = [
    (Permissions::SEND_MESSAGES, "Send Messages"),
    (Permissions::EMBED_LINKS, "Embed Links"),
    (Permissions::CREATE_PUBLIC_THREADS, "Create Public Threads"),
    (Permissions::SEND_MESSAGES_IN_THREADS, "Send Messages In Threads"),
];

/// Names of the permissions the bot needs in the suggestion channel but lacks.
pub fn missing_permissions(granted: Permissions) -> Vec<&'static str> {
    REQUIRED_PERMISSIONS
        .iter()
        .filter(|(permission, _)| !granted.contains(*permission))
        .map(|(_, name)| *name)
        .collect()
}

fn form_fields(c: &mut CreateComponents) -> &mut CreateComponents {
    let fields = [
        ("title", "Title", "Enter suggestion title...", InputTextStyle::Short, TITLE_LIMIT),
        (
            "description",
            "Description",
            "Describe your suggestion...",
            InputTextStyle::Paragraph,
            DESCRIPTION_LIMIT,
        ),
        ("pros", "Pros", "What are the benefits?", InputTextStyle::Paragraph, PROS_CONS_LIMIT),
        ("cons", "Cons", "What are the drawbacks?", InputTextStyle::Paragraph, PROS_CONS_LIMIT),
    ];
    for (custom_id, label, placeholder, style, limit) in fields {
        c.create_action_row(|r| {
            r.create_input_text(|t| {
                t.custom_id(custom_id)
                    .label(label)
                    .placeholder(placeholder)
                    .style(style)
                    .max_length(limit as u64)
                    .required(true)
            })
        });
    }
    c
}

/// `/suggest [image]`: refuses blocked members, validates the attachment and
/// opens the suggestion form.
pub async fn open_form(ctx: &Context, command: &ApplicationCommandInteraction) -> Result<(), SuggestionError> {
    let guild_id = command.guild_id.ok_or(SuggestionError::GuildOnly)?;
    let member = command.member.as_ref().ok_or(SuggestionError::GuildOnly)?;
    let db = ctx.get_db().await?;
    let config = db.get_guild_config(guild_id.0)?;
    ensure_can_submit(config.as_ref(), &member.role_ids())?;

    let image = command
        .data
        .options
        .by_name("image")
        .and_then(|o| o.to_attachment());
    if let Some(attachment) = &image {
        check_image_attachment(attachment.content_type.as_deref())?;
    }
    stash_attachment(ctx, guild_id.0, command.user.id.0, image.map(|a| a.url)).await;

    command
        .create_interaction_response(&ctx.http, |r| {
            r.kind(InteractionResponseType::Modal)
                .interaction_response_data(|d| {
                    d.custom_id(SUGGESTION_MODAL)
                        .title("Submit a Suggestion")
                        .components(form_fields)
                })
        })
        .await?;
    Ok(())
}

fn input_values(rows: &[ActionRow]) -> HashMap<&str, &str> {
    rows.iter()
        .flat_map(|row| row.components.iter())
        .filter_map(|component| match component {
            ActionRowComponent::InputText(input) => {
                Some((input.custom_id.as_str(), input.value.as_str()))
            }
            _ => None,
        })
        .collect()
}

/// Handles the submitted suggestion form. The response is deferred first since
/// publishing takes several round trips.
pub async fn submit_form(ctx: &Context, modal: ModalSubmitInteraction) {
    if let Err(e) = modal
        .create_interaction_response(&ctx.http, |r| {
            r.kind(InteractionResponseType::DeferredChannelMessageWithSource)
                .interaction_response_data(|d| d.ephemeral(true))
        })
        .await
    {
        warn!("Could not defer suggestion form of {}: {}", modal.user.id, e);
        return;
    }

    let content = match publish(ctx, &modal).await {
        Ok(()) => "✅ Suggestion submitted!".to_string(),
        Err(e) => {
            log_failure("suggest", &e);
            e.to_string()
        }
    };
    if let Err(e) = modal
        .edit_original_interaction_response(&ctx.http, |r| r.content(content))
        .await
    {
        warn!("Could not answer suggestion form of {}: {}", modal.user.id, e);
    }
}

fn submission_from(modal: &ModalSubmitInteraction, image_url: Option<String>) -> Result<Submission, SuggestionError> {
    let values = input_values(&modal.data.components);
    let value = |id: &str| values.get(id).map(|v| v.to_string()).unwrap_or_default();
    Submission::new(
        value("title"),
        value("description"),
        value("pros"),
        value("cons"),
        image_url,
    )
}

fn target_channel(ctx: &Context, guild_id: u64, channel_id: u64) -> Result<GuildChannel, SuggestionError> {
    let channel = ctx
        .cache
        .guild_channel(ChannelId(channel_id))
        .filter(|c| c.guild_id.0 == guild_id)
        .ok_or(SuggestionError::ChannelMissing)?;
    let granted = channel.permissions_for_user(&ctx.cache, ctx.cache.current_user_id())?;
    let missing = missing_permissions(granted);
    if !missing.is_empty() {
        return Err(SuggestionError::MissingPermissions {
            channel_id,
            missing,
        });
    }
    Ok(channel)
}

async fn publish(ctx: &Context, modal: &ModalSubmitInteraction) -> Result<(), SuggestionError> {
    let guild_id = modal.guild_id.ok_or(SuggestionError::GuildOnly)?;
    let member = modal.member.as_ref().ok_or(SuggestionError::GuildOnly)?;
    let image_url = take_attachment(ctx, guild_id.0, modal.user.id.0).await;
    let submission = submission_from(modal, image_url)?;

    let db = ctx.get_db().await?;
    let config = db.get_guild_config(guild_id.0)?;
    ensure_can_submit(config.as_ref(), &member.role_ids())?;
    let channel = target_channel(ctx, guild_id.0, suggestion_channel(config.as_ref())?)?;

    let suggestion_id = unused_suggestion_id(&db)?;
    let name = member.display_name();
    let author = Author {
        id: modal.user.id.0,
        name: &name,
        avatar_url: member.face(),
    };
    let message = channel
        .send_message(ctx, |m| {
            m.embed(|e| summary_embed(e, &suggestion_id, &submission, &author))
                .components(|c| vote_buttons(c, &suggestion_id))
        })
        .await?;

    let recorded = async {
        let thread = channel
            .id
            .create_public_thread(&ctx.http, message.id, |t| {
                t.name(thread_name(&submission.title))
                    .auto_archive_duration(THREAD_AUTO_ARCHIVE)
            })
            .await?;
        let published = Publication {
            guild_id: guild_id.0,
            author_id: modal.user.id.0,
            message_id: message.id.0,
            thread_id: Some(thread.id.0),
        };
        record_submission(&db, &suggestion_id, published, &submission)
    };
    match recorded.await {
        Ok(_) => Ok(()),
        Err(e) => {
            withdraw(ctx, &message).await;
            Err(e)
        }
    }
}

/// Removes a summary that never made it into the database, so no buttons
/// point at an unknown suggestion.
async fn withdraw(ctx: &Context, message: &Message) {
    if let Err(e) = message.delete(ctx).await {
        warn!("Could not withdraw orphaned summary {}: {}", message.id, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_permissions_miss_nothing() {
        assert!(missing_permissions(Permissions::all()).is_empty());
        let granted = Permissions::SEND_MESSAGES
            | Permissions::EMBED_LINKS
            | Permissions::CREATE_PUBLIC_THREADS
            | Permissions::SEND_MESSAGES_IN_THREADS;
        assert!(missing_permissions(granted).is_empty());
    }

    #[test]
    fn missing_permissions_keep_their_order() {
        assert_eq!(
            missing_permissions(Permissions::empty()),
            vec![
                "Send Messages",
                "Embed Links",
                "Create Public Threads",
                "Send Messages In Threads"
            ]
        );
        assert_eq!(
            missing_permissions(Permissions::SEND_MESSAGES | Permissions::EMBED_LINKS),
            vec!["Create Public Threads", "Send Messages In Threads"]
        );
    }
}
