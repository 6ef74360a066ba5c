use diesel::prelude::*;

use super::Database;
use crate::models::*;

/// A single configurable guild field, written without touching the others.
#[derive(Clone, Copy, Debug)]
pub enum GuildSetting {
    SuggestionChannel(u64),
    ReviewerRole(u64),
    BlockedRole(u64),
}

impl Database {
    pub fn get_guild_config(&self, guildid: u64) -> Result<Option<GuildConfig>, anyhow::Error> {
        use crate::schema::guild_settings::dsl::*;
        Ok(guild_settings
            .find(guildid as i64)
            .first::<GuildConfigRow>(&self.pool.get()?)
            .optional()?
            .map(GuildConfig::from))
    }

    pub fn set_suggestion_channel(&self, guildid: u64, channel_id: u64) -> Result<(), anyhow::Error> {
        self.upsert_guild_setting(guildid, GuildSetting::SuggestionChannel(channel_id))
    }

    pub fn set_reviewer_role(&self, guildid: u64, role_id: u64) -> Result<(), anyhow::Error> {
        self.upsert_guild_setting(guildid, GuildSetting::ReviewerRole(role_id))
    }

    pub fn set_blocked_role(&self, guildid: u64, role_id: u64) -> Result<(), anyhow::Error> {
        self.upsert_guild_setting(guildid, GuildSetting::BlockedRole(role_id))
    }

    /// Creates the guild's row if needed, otherwise updates exactly one field.
    pub fn upsert_guild_setting(
        &self,
        guildid: u64,
        setting: GuildSetting,
    ) -> Result<(), anyhow::Error> {
        use crate::schema::guild_settings::dsl::*;
        self.immediate::<_, anyhow::Error, _>(|conn| {
            let target = guild_settings.find(guildid as i64);
            let updated = match setting {
                GuildSetting::SuggestionChannel(id) => diesel::update(target)
                    .set(suggestion_channel_id.eq(Some(id as i64)))
                    .execute(conn)?,
                GuildSetting::ReviewerRole(id) => diesel::update(target)
                    .set(reviewer_role_id.eq(Some(id as i64)))
                    .execute(conn)?,
                GuildSetting::BlockedRole(id) => diesel::update(target)
                    .set(blocked_role_id.eq(Some(id as i64)))
                    .execute(conn)?,
            };
            if updated == 0 {
                let mut row = GuildConfigRow {
                    guild_id: guildid as i64,
                    suggestion_channel_id: None,
                    reviewer_role_id: None,
                    blocked_role_id: None,
                };
                match setting {
                    GuildSetting::SuggestionChannel(id) => row.suggestion_channel_id = Some(id as i64),
                    GuildSetting::ReviewerRole(id) => row.reviewer_role_id = Some(id as i64),
                    GuildSetting::BlockedRole(id) => row.blocked_role_id = Some(id as i64),
                }
                diesel::insert_into(guild_settings)
                    .values(&row)
                    .execute(conn)?;
            }
            Ok(())
        })
    }
}
