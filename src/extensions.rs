use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use anyhow::anyhow;
use serenity::{
    async_trait, client,
    http::Http,
    model::{
        application::interaction::{
            application_command::{
                ApplicationCommandInteraction, CommandDataOption, CommandDataOptionValue,
            },
            message_component::MessageComponentInteraction,
            modal::ModalSubmitInteraction,
            InteractionResponseType,
        },
        channel::{Attachment, PartialChannel},
        guild::{Member, Role},
    },
    prelude::TypeMapKey,
};

use crate::database::Database;

#[async_trait]
pub trait ClientContextExt {
    async fn get_db(&self) -> Result<Database, anyhow::Error>;
}

#[async_trait]
impl ClientContextExt for client::Context {
    async fn get_db(&self) -> Result<Database, anyhow::Error> {
        self.data
            .read()
            .await
            .get::<Database>()
            .cloned()
            .ok_or_else(|| anyhow!("database missing from client data"))
    }
}

pub trait InteractionDataOptionExt {
    fn to_string(&self) -> Option<String>;
    fn to_bool(&self) -> Option<bool>;
    fn to_role(&self) -> Option<Role>;
    fn to_channel(&self) -> Option<PartialChannel>;
    fn to_attachment(&self) -> Option<Attachment>;
}

pub trait CommandDataOptionVecExt {
    fn by_name(&self, name: &str) -> Option<&CommandDataOption>;
}

impl<'a> InteractionDataOptionExt for &'a CommandDataOption {
    fn to_string(&self) -> Option<String> {
        self.resolved.as_ref().and_then(|v| {
            if let CommandDataOptionValue::String(x) = v {
                Some(x.to_owned())
            } else {
                None
            }
        })
    }

    fn to_bool(&self) -> Option<bool> {
        self.resolved.as_ref().and_then(|v| {
            if let CommandDataOptionValue::Boolean(x) = v {
                Some(x.to_owned())
            } else {
                None
            }
        })
    }

    fn to_role(&self) -> Option<Role> {
        self.resolved.as_ref().and_then(|v| {
            if let CommandDataOptionValue::Role(x) = v {
                Some(x.to_owned())
            } else {
                None
            }
        })
    }

    fn to_channel(&self) -> Option<PartialChannel> {
        self.resolved.as_ref().and_then(|v| {
            if let CommandDataOptionValue::Channel(x) = v {
                Some(x.to_owned())
            } else {
                None
            }
        })
    }

    fn to_attachment(&self) -> Option<Attachment> {
        self.resolved.as_ref().and_then(|v| {
            if let CommandDataOptionValue::Attachment(x) = v {
                Some(x.to_owned())
            } else {
                None
            }
        })
    }
}

impl CommandDataOptionVecExt for Vec<CommandDataOption> {
    fn by_name(&self, name: &str) -> Option<&CommandDataOption> {
        self.iter().find(|x| x.name == name)
    }
}

pub trait MemberExt {
    fn role_ids(&self) -> Vec<u64>;
    fn is_admin(&self) -> bool;
}

impl MemberExt for Member {
    fn role_ids(&self) -> Vec<u64> {
        self.roles.iter().map(|r| r.0).collect()
    }

    /// Interaction payloads carry the member's resolved guild permissions.
    fn is_admin(&self) -> bool {
        self.permissions.map_or(false, |p| p.administrator())
    }
}

/// Private replies, visible only to the member who triggered the interaction.
#[async_trait]
pub trait EphemeralReplyExt {
    async fn reply_ephemeral(&self, http: &Http, content: String) -> serenity::Result<()>;
}

macro_rules! impl_ephemeral_reply {
    ($($interaction:ty),+) => {
        $(
            #[async_trait]
            impl EphemeralReplyExt for $interaction {
                async fn reply_ephemeral(&self, http: &Http, content: String) -> serenity::Result<()> {
                    self.create_interaction_response(http, |r| {
                        r.kind(InteractionResponseType::ChannelMessageWithSource)
                            .interaction_response_data(|d| d.ephemeral(true).content(content))
                    })
                    .await
                }
            }
        )+
    };
}

impl_ephemeral_reply!(
    ApplicationCommandInteraction,
    MessageComponentInteraction,
    ModalSubmitInteraction
);

const PENDING_ATTACHMENT_TTL: Duration = Duration::from_secs(15 * 60);

/// Image URLs validated by `/suggest`, held until the member submits the form.
/// Keyed by (guild, member).
pub struct PendingAttachments;

impl TypeMapKey for PendingAttachments {
    type Value = HashMap<(u64, u64), (String, Instant)>;
}

pub async fn stash_attachment(ctx: &client::Context, guild_id: u64, user_id: u64, url: Option<String>) {
    let mut data = ctx.data.write().await;
    let pending = data
        .entry::<PendingAttachments>()
        .or_insert_with(HashMap::new);
    pending.retain(|_, (_, stashed)| stashed.elapsed() < PENDING_ATTACHMENT_TTL);
    match url {
        Some(url) => {
            pending.insert((guild_id, user_id), (url, Instant::now()));
        }
        None => {
            pending.remove(&(guild_id, user_id));
        }
    }
}

pub async fn take_attachment(ctx: &client::Context, guild_id: u64, user_id: u64) -> Option<String> {
    let mut data = ctx.data.write().await;
    data.get_mut::<PendingAttachments>()
        .and_then(|pending| pending.remove(&(guild_id, user_id)))
        .filter(|(_, stashed)| stashed.elapsed() < PENDING_ATTACHMENT_TTL)
        .map(|(url, _)| url)
}
