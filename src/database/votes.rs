use diesel::{dsl::count_star, prelude::*, SqliteConnection};

use super::Database;
use crate::models::*;

pub(crate) fn find_user_vote(
    conn: &SqliteConnection,
    id: &str,
    voter: u64,
) -> Result<Option<VoteType>, anyhow::Error> {
    use crate::schema::votes::dsl::*;
    votes
        .find((id, voter as i64))
        .select(vote_type)
        .first::<String>(conn)
        .optional()?
        .map(|v| v.parse())
        .transpose()
}

/// Inserts the vote unless the voter already has one. The primary key on
/// `(suggestion_id, user_id)` is what guarantees a single row per voter.
pub(crate) fn insert_vote(
    conn: &SqliteConnection,
    id: &str,
    voter: u64,
    kind: VoteType,
) -> QueryResult<bool> {
    let vote = NewVote {
        suggestion_id: id,
        user_id: voter as i64,
        vote_type: kind.as_str(),
    };
    let inserted = diesel::insert_or_ignore_into(crate::schema::votes::table)
        .values(&vote)
        .execute(conn)?;
    Ok(inserted == 1)
}

pub(crate) fn delete_vote(conn: &SqliteConnection, id: &str, voter: u64) -> QueryResult<usize> {
    use crate::schema::votes::dsl::*;
    diesel::delete(votes.find((id, voter as i64))).execute(conn)
}

fn count_votes(conn: &SqliteConnection, id: &str, kind: VoteType) -> QueryResult<i64> {
    use crate::schema::votes::dsl::*;
    votes
        .filter(suggestion_id.eq(id))
        .filter(vote_type.eq(kind.as_str()))
        .select(count_star())
        .first::<i64>(conn)
}

impl Database {
    /// Returns `false` without touching anything if the voter already voted.
    pub fn cast_vote(&self, id: &str, voter: u64, kind: VoteType) -> Result<bool, anyhow::Error> {
        let conn = self.pool.get()?;
        Ok(insert_vote(&conn, id, voter, kind)?)
    }

    pub fn retract_vote(&self, id: &str, voter: u64) -> Result<(), anyhow::Error> {
        let conn = self.pool.get()?;
        delete_vote(&conn, id, voter)?;
        Ok(())
    }

    pub fn get_user_vote(&self, id: &str, voter: u64) -> Result<Option<VoteType>, anyhow::Error> {
        let conn = self.pool.get()?;
        find_user_vote(&conn, id, voter)
    }

    pub fn tally_votes(&self, id: &str) -> Result<VoteTally, anyhow::Error> {
        let conn = self.pool.get()?;
        let tally = conn.transaction::<_, diesel::result::Error, _>(|| {
            Ok(VoteTally {
                upvotes: count_votes(&conn, id, VoteType::Upvote)?,
                downvotes: count_votes(&conn, id, VoteType::Downvote)?,
            })
        })?;
        Ok(tally)
    }
}
