use serenity::{
    model::{
        application::interaction::application_command::ApplicationCommandInteraction,
        channel::ChannelType,
        id::GuildId,
    },
    prelude::Context,
};

use crate::{
    database::guild_settings::GuildSetting,
    extensions::*,
    suggestion::SuggestionError,
};

fn guild_of(command: &ApplicationCommandInteraction) -> Result<GuildId, SuggestionError> {
    command.guild_id.ok_or(SuggestionError::GuildOnly)
}

async fn store(ctx: &Context, guild_id: GuildId, setting: GuildSetting) -> Result<(), SuggestionError> {
    let db = ctx.get_db().await?;
    match setting {
        GuildSetting::SuggestionChannel(id) => db.set_suggestion_channel(guild_id.0, id)?,
        GuildSetting::ReviewerRole(id) => db.set_reviewer_role(guild_id.0, id)?,
        GuildSetting::BlockedRole(id) => db.set_blocked_role(guild_id.0, id)?,
    }
    info!("Guild {} updated {:?}", guild_id, setting);
    Ok(())
}

pub async fn set_channel(ctx: &Context, command: &ApplicationCommandInteraction) -> Result<(), SuggestionError> {
    let guild_id = guild_of(command)?;
    let channel = command
        .data
        .options
        .by_name("channel")
        .and_then(|o| o.to_channel())
        .ok_or(SuggestionError::ChannelMissing)?;
    if channel.kind != ChannelType::Text {
        return Err(SuggestionError::ChannelMissing);
    }
    store(ctx, guild_id, GuildSetting::SuggestionChannel(channel.id.0)).await?;
    command
        .reply_ephemeral(
            &ctx.http,
            format!("✅ Suggestion channel set to <#{}>", channel.id),
        )
        .await?;
    Ok(())
}

pub async fn set_reviewer_role(
    ctx: &Context,
    command: &ApplicationCommandInteraction,
) -> Result<(), SuggestionError> {
    let guild_id = guild_of(command)?;
    let role = command
        .data
        .options
        .by_name("role")
        .and_then(|o| o.to_role())
        .ok_or_else(|| anyhow::anyhow!("setreviewerrole without a role"))?;
    store(ctx, guild_id, GuildSetting::ReviewerRole(role.id.0)).await?;
    command
        .reply_ephemeral(&ctx.http, format!("✅ Reviewer role set to <@&{}>", role.id))
        .await?;
    Ok(())
}

pub async fn set_blocked_role(
    ctx: &Context,
    command: &ApplicationCommandInteraction,
) -> Result<(), SuggestionError> {
    let guild_id = guild_of(command)?;
    let role = command
        .data
        .options
        .by_name("role")
        .and_then(|o| o.to_role())
        .ok_or_else(|| anyhow::anyhow!("setblockedrole without a role"))?;
    store(ctx, guild_id, GuildSetting::BlockedRole(role.id.0)).await?;
    command
        .reply_ephemeral(
            &ctx.http,
            format!(
                "✅ Users with <@&{}> can no longer submit suggestions.",
                role.id
            ),
        )
        .await?;
    Ok(())
}
