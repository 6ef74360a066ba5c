pub mod reconcile;

use serenity::{
    async_trait,
    model::{application::interaction::Interaction, gateway::Ready},
    prelude::*,
};

use crate::{
    commands::{self, suggest, vote},
    extensions::ClientContextExt,
};

pub struct Handler {
    pub dev_guild_id: Option<u64>,
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("Logged in as {} (ID: {})", ready.user.tag(), ready.user.id);
        match commands::sync_commands(&ctx, self.dev_guild_id).await {
            Ok(count) => info!("Synced {} command(s)", count),
            Err(e) => error!("Error syncing commands: {:#}", e),
        }

        match ctx.get_db().await {
            Ok(db) => {
                let http = ctx.http.clone();
                tokio::spawn(async move {
                    reconcile::reconcile_pending(&http, &db).await;
                });
            }
            Err(e) => error!("Skipping reconciliation: {:#}", e),
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        match interaction {
            Interaction::ApplicationCommand(command) => commands::handle_command(&ctx, command).await,
            Interaction::MessageComponent(component) => vote::handle_button(&ctx, component).await,
            Interaction::ModalSubmit(modal) if modal.data.custom_id == suggest::SUGGESTION_MODAL => {
                suggest::submit_form(&ctx, modal).await
            }
            _ => {}
        }
    }
}
