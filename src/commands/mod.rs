pub mod review;
pub mod settings;
pub mod suggest;
pub mod vote;

use serenity::{
    builder::CreateApplicationCommands,
    model::{
        application::{
            command::{Command, CommandOptionType},
            interaction::application_command::ApplicationCommandInteraction,
        },
        channel::ChannelType,
        id::GuildId,
        Permissions,
    },
    prelude::Context,
};

use crate::{extensions::EphemeralReplyExt, suggestion::SuggestionError};

fn register_commands(commands: &mut CreateApplicationCommands) -> &mut CreateApplicationCommands {
    commands
        .create_application_command(|c| {
            c.name("suggest")
                .description("Submit a suggestion")
                .dm_permission(false)
                .create_option(|o| {
                    o.name("image")
                        .description("Optional image attachment")
                        .kind(CommandOptionType::Attachment)
                        .required(false)
                })
        })
        .create_application_command(|c| {
            c.name("setchannel")
                .description("Set the suggestions channel (Admin only)")
                .default_member_permissions(Permissions::ADMINISTRATOR)
                .dm_permission(false)
                .create_option(|o| {
                    o.name("channel")
                        .description("The channel for suggestions")
                        .kind(CommandOptionType::Channel)
                        .channel_types(&[ChannelType::Text])
                        .required(true)
                })
        })
        .create_application_command(|c| {
            c.name("setreviewerrole")
                .description("Set the role that can approve/reject suggestions (Admin only)")
                .default_member_permissions(Permissions::ADMINISTRATOR)
                .dm_permission(false)
                .create_option(|o| {
                    o.name("role")
                        .description("The reviewer role")
                        .kind(CommandOptionType::Role)
                        .required(true)
                })
        })
        .create_application_command(|c| {
            c.name("setblockedrole")
                .description("Set a role that cannot submit suggestions (Admin only)")
                .default_member_permissions(Permissions::ADMINISTRATOR)
                .dm_permission(false)
                .create_option(|o| {
                    o.name("role")
                        .description("The role to block from suggesting")
                        .kind(CommandOptionType::Role)
                        .required(true)
                })
        });
    for (name, description, verb) in [
        ("approve", "Approve a suggestion (Reviewer only)", "Approve"),
        ("reject", "Reject a suggestion (Reviewer only)", "Reject"),
    ] {
        commands.create_application_command(|c| {
            c.name(name)
                .description(description)
                .dm_permission(false)
                .create_option(|o| {
                    o.name("suggestion_id")
                        .description("The ID of the suggestion")
                        .kind(CommandOptionType::String)
                        .required(true)
                })
                .create_option(|o| {
                    o.name("reason")
                        .description("Optional reason")
                        .kind(CommandOptionType::String)
                        .required(false)
                })
                .create_option(|o| {
                    o.name("anonymous")
                        .description(format!("{} anonymously (hides your name)", verb))
                        .kind(CommandOptionType::Boolean)
                        .required(false)
                })
        });
    }
    commands
}

/// Registers the slash commands on the development guild when one is
/// configured, globally otherwise.
pub async fn sync_commands(ctx: &Context, dev_guild_id: Option<u64>) -> Result<usize, anyhow::Error> {
    let synced = match dev_guild_id {
        Some(guild) => {
            GuildId(guild)
                .set_application_commands(&ctx.http, register_commands)
                .await?
        }
        None => Command::set_global_application_commands(&ctx.http, register_commands).await?,
    };
    Ok(synced.len())
}

pub async fn handle_command(ctx: &Context, command: ApplicationCommandInteraction) {
    let result = match command.data.name.as_str() {
        "suggest" => suggest::open_form(ctx, &command).await,
        "setchannel" => settings::set_channel(ctx, &command).await,
        "setreviewerrole" => settings::set_reviewer_role(ctx, &command).await,
        "setblockedrole" => settings::set_blocked_role(ctx, &command).await,
        "approve" | "reject" => review::decide(ctx, &command).await,
        other => {
            warn!("Unknown command {}", other);
            return;
        }
    };
    if let Err(e) = result {
        report_failure(ctx, &command, &command.data.name, e).await;
    }
}

/// Tells the invoking member what went wrong. Internal causes only go to the log.
pub async fn report_failure<I>(ctx: &Context, interaction: &I, action: &str, err: SuggestionError)
where
    I: EphemeralReplyExt + Sync,
{
    log_failure(action, &err);
    if let Err(e) = interaction.reply_ephemeral(&ctx.http, err.to_string()).await {
        warn!("Could not report failure of {}: {}", action, e);
    }
}

pub fn log_failure(action: &str, err: &SuggestionError) {
    match err {
        SuggestionError::Internal(cause) => error!("{} failed: {:#}", action, cause),
        other => debug!("{} refused: {:?}", action, other),
    }
}
