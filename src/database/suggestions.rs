use diesel::{prelude::*, SqliteConnection};

use super::Database;
use crate::models::*;

pub(crate) fn find_suggestion(
    conn: &SqliteConnection,
    id: &str,
) -> Result<Option<Suggestion>, anyhow::Error> {
    use crate::schema::suggestions::dsl::*;
    suggestions
        .find(id)
        .first::<SuggestionRow>(conn)
        .optional()?
        .map(Suggestion::try_from)
        .transpose()
}

impl Database {
    /// Inserts a new suggestion. Fails on a token collision.
    pub fn create_suggestion(&self, suggestion: &NewSuggestion) -> Result<(), anyhow::Error> {
        diesel::insert_into(crate::schema::suggestions::table)
            .values(suggestion)
            .execute(&self.pool.get()?)?;
        Ok(())
    }

    pub fn get_suggestion(&self, id: &str) -> Result<Option<Suggestion>, anyhow::Error> {
        let conn = self.pool.get()?;
        find_suggestion(&conn, id)
    }

    pub fn suggestion_id_exists(&self, id: &str) -> Result<bool, anyhow::Error> {
        use crate::schema::suggestions::dsl::*;
        Ok(suggestions
            .find(id)
            .select(suggestion_id)
            .first::<String>(&self.pool.get()?)
            .optional()?
            .is_some())
    }

    pub fn pending_suggestion_ids(&self) -> Result<Vec<String>, anyhow::Error> {
        use crate::schema::suggestions::dsl::*;
        Ok(suggestions
            .filter(status.eq(SuggestionStatus::Pending.as_str()))
            .select(suggestion_id)
            .load::<String>(&self.pool.get()?)?)
    }

    /// Unconditionally overwrites the decision columns.
    pub fn set_suggestion_decision(
        &self,
        id: &str,
        new_status: SuggestionStatus,
        reason: Option<&str>,
        anonymous: bool,
    ) -> Result<(), anyhow::Error> {
        use crate::schema::suggestions::dsl::*;
        diesel::update(suggestions.find(id))
            .set((
                status.eq(new_status.as_str()),
                decision_reason.eq(reason),
                decided_anonymously.eq(anonymous),
            ))
            .execute(&self.pool.get()?)?;
        Ok(())
    }

    /// Records a decision only if the suggestion belongs to `guildid` and is
    /// still pending. Returns `false` when nothing was updated.
    pub fn decide_suggestion(
        &self,
        id: &str,
        guildid: u64,
        new_status: SuggestionStatus,
        reason: Option<&str>,
        anonymous: bool,
    ) -> Result<bool, anyhow::Error> {
        use crate::schema::suggestions::dsl::*;
        let updated = diesel::update(
            suggestions
                .filter(suggestion_id.eq(id))
                .filter(guild_id.eq(guildid as i64))
                .filter(status.eq(SuggestionStatus::Pending.as_str())),
        )
        .set((
            status.eq(new_status.as_str()),
            decision_reason.eq(reason),
            decided_anonymously.eq(anonymous),
        ))
        .execute(&self.pool.get()?)?;
        Ok(updated == 1)
    }
}
