pub mod commands;
pub mod config;
pub mod database;
pub mod events;
pub mod extensions;
pub mod models;
pub mod schema;
pub mod suggestion;

#[macro_use]
extern crate tracing;
#[macro_use]
extern crate diesel;

use std::collections::HashMap;

use anyhow::Context as _;
use serenity::{prelude::GatewayIntents, Client};
use tracing_subscriber::EnvFilter;

use crate::{config::Config, database::Database, events::Handler, extensions::PendingAttachments};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!(
        "Starting {} {} ({})",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH")
    );
    let config = Config::from_env()?;

    let db = Database::new(&config.database_url, config.pool_size)?;
    let applied = db
        .run_migrations()
        .context("Failed to migrate the suggestion database")?;
    info!("Database {} ready, {} migration(s) applied", config.database_url, applied);

    let mut client = Client::builder(&config.token, GatewayIntents::GUILDS)
        .event_handler(Handler {
            dev_guild_id: config.dev_guild_id,
        })
        .await
        .context("Error creating client")?;

    {
        let mut data = client.data.write().await;
        data.insert::<Database>(db);
        data.insert::<PendingAttachments>(HashMap::new());
    }

    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutting down");
                shard_manager.lock().await.shutdown_all().await;
            }
            Err(e) => error!("Could not register ctrl+c handler: {}", e),
        }
    });

    client.start().await.context("Client error")?;
    Ok(())
}
