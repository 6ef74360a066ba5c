use crate::{
    database::{suggestions::find_suggestion, votes, Database},
    models::VoteType,
    suggestion::SuggestionError,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoteOutcome {
    Added,
    Retracted,
    Switched,
}

impl VoteOutcome {
    /// What to do given the voter's current vote and the button they pressed.
    pub fn plan(current: Option<VoteType>, requested: VoteType) -> VoteOutcome {
        match current {
            None => VoteOutcome::Added,
            Some(existing) if existing == requested => VoteOutcome::Retracted,
            Some(_) => VoteOutcome::Switched,
        }
    }

    pub fn reply(self, requested: VoteType) -> &'static str {
        match (self, requested) {
            (VoteOutcome::Added, VoteType::Upvote) => "✅ Upvoted!",
            (VoteOutcome::Added, VoteType::Downvote) => "❌ Downvoted!",
            (VoteOutcome::Retracted, VoteType::Upvote) => "🔄 Upvote removed.",
            (VoteOutcome::Retracted, VoteType::Downvote) => "🔄 Downvote removed.",
            (VoteOutcome::Switched, VoteType::Upvote) => "✅ Changed to upvote.",
            (VoteOutcome::Switched, VoteType::Downvote) => "❌ Changed to downvote.",
        }
    }
}

/// Applies a vote button press. Pressing the button of the current vote
/// retracts it, pressing the other one switches.
///
/// The status check and the ledger write share one immediate transaction, so a
/// decision landing concurrently cannot let a vote slip in afterwards.
pub fn toggle_vote(
    db: &Database,
    guild_id: u64,
    suggestion_id: &str,
    voter: u64,
    requested: VoteType,
) -> Result<VoteOutcome, SuggestionError> {
    let outcome = db.immediate::<_, SuggestionError, _>(|conn| {
        let suggestion = find_suggestion(conn, suggestion_id)?
            .filter(|s| s.guild_id == guild_id)
            .ok_or(SuggestionError::NotFound)?;
        if !suggestion.status.is_pending() {
            return Err(SuggestionError::VotingClosed);
        }

        let current = votes::find_user_vote(conn, suggestion_id, voter)?;
        let outcome = VoteOutcome::plan(current, requested);
        match outcome {
            VoteOutcome::Retracted => {
                votes::delete_vote(conn, suggestion_id, voter)?;
            }
            VoteOutcome::Switched => {
                votes::delete_vote(conn, suggestion_id, voter)?;
                if !votes::insert_vote(conn, suggestion_id, voter, requested)? {
                    return Err(SuggestionError::VoteConflict);
                }
            }
            VoteOutcome::Added => {
                if !votes::insert_vote(conn, suggestion_id, voter, requested)? {
                    return Err(SuggestionError::VoteConflict);
                }
            }
        }
        Ok(outcome)
    })?;
    debug!(
        "Vote {:?} ({}) by {} on suggestion {}",
        outcome, requested, voter, suggestion_id
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        database::testing,
        models::{SuggestionStatus, VoteTally},
        suggestion::lifecycle::{record_submission, Publication, Submission},
    };

    const GUILD: u64 = 1;

    fn setup() -> (tempfile::TempDir, Database) {
        let (dir, db) = testing::database();
        let submission = Submission::new(
            "Title".into(),
            "Description".into(),
            "Pros".into(),
            "Cons".into(),
            None,
        )
        .unwrap();
        let published = Publication {
            guild_id: GUILD,
            author_id: 5,
            message_id: 50,
            thread_id: Some(51),
        };
        record_submission(&db, "s0000001", published, &submission).unwrap();
        (dir, db)
    }

    fn tally(db: &Database) -> (i64, i64) {
        let VoteTally { upvotes, downvotes } = db.tally_votes("s0000001").unwrap();
        (upvotes, downvotes)
    }

    #[test]
    fn plan_covers_every_case() {
        use VoteType::*;
        assert_eq!(VoteOutcome::plan(None, Upvote), VoteOutcome::Added);
        assert_eq!(VoteOutcome::plan(Some(Upvote), Upvote), VoteOutcome::Retracted);
        assert_eq!(VoteOutcome::plan(Some(Downvote), Upvote), VoteOutcome::Switched);
        assert_eq!(VoteOutcome::plan(Some(Upvote), Downvote), VoteOutcome::Switched);
    }

    #[test]
    fn voting_walkthrough() {
        let (_dir, db) = setup();
        assert_eq!(tally(&db), (0, 0));

        let up = toggle_vote(&db, GUILD, "s0000001", 100, VoteType::Upvote).unwrap();
        assert_eq!(up, VoteOutcome::Added);
        assert_eq!(tally(&db), (1, 0));

        let again = toggle_vote(&db, GUILD, "s0000001", 100, VoteType::Upvote).unwrap();
        assert_eq!(again, VoteOutcome::Retracted);
        assert_eq!(tally(&db), (0, 0));
        assert_eq!(db.get_user_vote("s0000001", 100).unwrap(), None);

        toggle_vote(&db, GUILD, "s0000001", 100, VoteType::Downvote).unwrap();
        assert_eq!(tally(&db), (0, 1));

        toggle_vote(&db, GUILD, "s0000001", 200, VoteType::Downvote).unwrap();
        assert_eq!(tally(&db), (0, 2));
    }

    #[test]
    fn switching_keeps_a_single_vote() {
        let (_dir, db) = setup();
        toggle_vote(&db, GUILD, "s0000001", 100, VoteType::Downvote).unwrap();
        let switched = toggle_vote(&db, GUILD, "s0000001", 100, VoteType::Upvote).unwrap();
        assert_eq!(switched, VoteOutcome::Switched);
        assert_eq!(tally(&db), (1, 0));
        assert_eq!(db.get_user_vote("s0000001", 100).unwrap(), Some(VoteType::Upvote));
    }

    #[test]
    fn decided_suggestions_reject_every_vote() {
        let (_dir, db) = setup();
        toggle_vote(&db, GUILD, "s0000001", 100, VoteType::Upvote).unwrap();
        db.set_suggestion_decision("s0000001", SuggestionStatus::Approved, None, false)
            .unwrap();

        for (voter, kind) in [
            (100, VoteType::Upvote),
            (100, VoteType::Downvote),
            (200, VoteType::Upvote),
        ] {
            let result = toggle_vote(&db, GUILD, "s0000001", voter, kind);
            assert!(matches!(result, Err(SuggestionError::VotingClosed)));
        }
        assert_eq!(tally(&db), (1, 0));
        assert_eq!(db.get_user_vote("s0000001", 100).unwrap(), Some(VoteType::Upvote));
    }

    #[test]
    fn other_guilds_cannot_vote() {
        let (_dir, db) = setup();
        let result = toggle_vote(&db, 2, "s0000001", 100, VoteType::Upvote);
        assert!(matches!(result, Err(SuggestionError::NotFound)));
        let unknown = toggle_vote(&db, GUILD, "nope0000", 100, VoteType::Upvote);
        assert!(matches!(unknown, Err(SuggestionError::NotFound)));
        assert_eq!(tally(&db), (0, 0));
    }

    #[test]
    fn concurrent_voters_each_get_one_row() {
        let (_dir, db) = setup();
        let handles: Vec<_> = (0..8u64)
            .map(|voter| {
                let db = db.clone();
                std::thread::spawn(move || {
                    toggle_vote(&db, GUILD, "s0000001", voter % 4, VoteType::Upvote)
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap().unwrap();
        }
        // Each of the four voters pressed twice: added then retracted.
        assert_eq!(tally(&db), (0, 0));
    }
}
