//! Keeps the published summary embed in step with the stored suggestion.
//!
//! Rendering is best effort: the stored state is already committed by the
//! time anything here runs, so failures are logged and dropped.

use anyhow::anyhow;
use serenity::{
    builder::{CreateComponents, CreateEmbed},
    http::Http,
    model::{
        application::component::ButtonStyle,
        channel::{EmbedField, Message, ReactionType},
        id::{ChannelId, MessageId},
        Timestamp,
    },
    utils::Colour,
};

use crate::{
    database::Database,
    models::{Suggestion, SuggestionStatus, VoteTally, VoteType},
    suggestion::lifecycle::{Submission, Verdict},
};

pub const RESULTS_PENDING: &str = "Results so far:";
pub const RESULTS_FINAL: &str = "Results:";
const APPROVED_BANNER: &str = "✅ Approved";
const REJECTED_BANNER: &str = "❌ Rejected";
const ANONYMOUS_REVIEWER: &str = "Anonymous Reviewer";
const THREAD_NAME_LIMIT: usize = 80;
/// Seven days, in minutes.
pub const THREAD_AUTO_ARCHIVE: u16 = 10080;

pub fn results_label(status: SuggestionStatus) -> &'static str {
    if status.is_pending() {
        RESULTS_PENDING
    } else {
        RESULTS_FINAL
    }
}

pub fn results_value(tally: VoteTally) -> String {
    format!(
        "Upvotes: {} ✅\nDownvotes: {} ❌",
        tally.upvotes, tally.downvotes
    )
}

pub fn status_colour(status: SuggestionStatus) -> Colour {
    match status {
        SuggestionStatus::Pending => Colour::BLUE,
        SuggestionStatus::Approved => Colour(0x2E_CC_71),
        SuggestionStatus::Rejected => Colour::RED,
    }
}

/// Rewrites the results field in place. Returns `false` if the embed has none,
/// in which case nothing is added.
pub fn patch_results(fields: &mut [EmbedField], status: SuggestionStatus, tally: VoteTally) -> bool {
    match fields
        .iter_mut()
        .find(|f| f.name == RESULTS_PENDING || f.name == RESULTS_FINAL)
    {
        Some(field) => {
            *field = EmbedField::new(results_label(status), results_value(tally), false);
            true
        }
        None => false,
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DecisionBanner {
    pub verdict: Verdict,
    /// `None` when the reviewer chose to stay anonymous.
    pub reviewer_id: Option<u64>,
    pub reason: Option<String>,
}

impl DecisionBanner {
    pub fn for_suggestion(suggestion: &Suggestion, reviewer_id: u64) -> Option<Self> {
        let verdict = match suggestion.status {
            SuggestionStatus::Pending => return None,
            SuggestionStatus::Approved => Verdict::Approved,
            SuggestionStatus::Rejected => Verdict::Rejected,
        };
        Some(Self {
            verdict,
            reviewer_id: (!suggestion.decided_anonymously).then(|| reviewer_id),
            reason: suggestion.decision_reason.clone(),
        })
    }

    pub fn title(&self) -> &'static str {
        match self.verdict {
            Verdict::Approved => APPROVED_BANNER,
            Verdict::Rejected => REJECTED_BANNER,
        }
    }

    pub fn text(&self) -> String {
        let action = match self.verdict {
            Verdict::Approved => "Approved",
            Verdict::Rejected => "Rejected",
        };
        let reviewer = match self.reviewer_id {
            Some(id) => format!("<@{}>", id),
            None => ANONYMOUS_REVIEWER.to_string(),
        };
        let mut text = format!("{} by: {}", action, reviewer);
        if let Some(reason) = &self.reason {
            text.push_str(&format!("\nReason: {}", reason));
        }
        text
    }
}

/// Appends the decision banner unless the embed already carries one.
pub fn add_decision_banner(fields: &mut Vec<EmbedField>, banner: &DecisionBanner) -> bool {
    if fields
        .iter()
        .any(|f| f.name == APPROVED_BANNER || f.name == REJECTED_BANNER)
    {
        return false;
    }
    fields.push(EmbedField::new(banner.title(), banner.text(), false));
    true
}

pub fn initial_fields(submission: &Submission) -> Vec<EmbedField> {
    let mut fields = vec![EmbedField::new(
        "Description",
        &submission.description,
        false,
    )];
    if !submission.pros.is_empty() {
        fields.push(EmbedField::new("Pros", &submission.pros, false));
    }
    if !submission.cons.is_empty() {
        fields.push(EmbedField::new("Cons", &submission.cons, false));
    }
    fields.push(EmbedField::new(
        RESULTS_PENDING,
        results_value(VoteTally::default()),
        false,
    ));
    fields
}

/// Who submitted, as shown in the embed author line and footer.
pub struct Author<'a> {
    pub id: u64,
    pub name: &'a str,
    pub avatar_url: String,
}

pub fn summary_embed<'e>(
    e: &'e mut CreateEmbed,
    suggestion_id: &str,
    submission: &Submission,
    author: &Author,
) -> &'e mut CreateEmbed {
    e.title(&submission.title);
    e.colour(status_colour(SuggestionStatus::Pending));
    e.timestamp(Timestamp::now());
    e.author(|a| a.name(author.name).icon_url(&author.avatar_url));
    for field in initial_fields(submission) {
        e.field(field.name, field.value, field.inline);
    }
    e.footer(|f| {
        f.text(format!(
            "User ID: {} | Suggestion ID: {}",
            author.id, suggestion_id
        ))
    });
    if let Some(url) = &submission.image_url {
        e.image(url);
    }
    e
}

pub fn thread_name(title: &str) -> String {
    title.chars().take(THREAD_NAME_LIMIT).collect()
}

pub fn vote_custom_id(kind: VoteType, suggestion_id: &str) -> String {
    format!("{}:{}", kind.as_str(), suggestion_id)
}

pub fn parse_vote_custom_id(custom_id: &str) -> Option<(VoteType, &str)> {
    let (kind, suggestion_id) = custom_id.split_once(':')?;
    Some((kind.parse().ok()?, suggestion_id))
}

pub fn vote_buttons<'c>(c: &'c mut CreateComponents, suggestion_id: &str) -> &'c mut CreateComponents {
    c.create_action_row(|r| {
        r.create_button(|b| {
            b.style(ButtonStyle::Secondary);
            b.emoji(ReactionType::Unicode("✅".to_string()));
            b.custom_id(vote_custom_id(VoteType::Upvote, suggestion_id))
        });
        r.create_button(|b| {
            b.style(ButtonStyle::Secondary);
            b.emoji(ReactionType::Unicode("❌".to_string()));
            b.custom_id(vote_custom_id(VoteType::Downvote, suggestion_id))
        })
    })
}

/// Patches the results field, colour and optional decision banner of an
/// already published summary. While pending, the vote buttons are re-attached.
pub async fn sync_summary(
    http: &Http,
    message: &mut Message,
    suggestion: &Suggestion,
    tally: VoteTally,
    banner: Option<&DecisionBanner>,
) -> Result<(), anyhow::Error> {
    let mut embed = message
        .embeds
        .first()
        .cloned()
        .ok_or_else(|| anyhow!("summary of {} has no embed", suggestion.id))?;
    if !patch_results(&mut embed.fields, suggestion.status, tally) {
        warn!("Summary of {} has no results field", suggestion.id);
    }
    if let Some(banner) = banner {
        add_decision_banner(&mut embed.fields, banner);
    }
    let mut embed = CreateEmbed::from(embed);
    embed.colour(status_colour(suggestion.status));

    message
        .edit(http, |m| {
            m.set_embed(embed);
            if suggestion.status.is_pending() {
                m.components(|c| vote_buttons(c, &suggestion.id));
            }
            m
        })
        .await?;
    Ok(())
}

/// Fetches the summary message from the guild's configured channel.
pub async fn locate_summary(
    http: &Http,
    db: &Database,
    suggestion: &Suggestion,
) -> Result<Message, anyhow::Error> {
    let channel = db
        .get_guild_config(suggestion.guild_id)?
        .and_then(|c| c.suggestion_channel_id)
        .ok_or_else(|| anyhow!("guild {} has no suggestion channel", suggestion.guild_id))?;
    Ok(ChannelId(channel)
        .message(http, MessageId(suggestion.message_id))
        .await?)
}

/// Reflects a decision on the summary and closes the discussion thread.
pub async fn publish_decision(
    http: &Http,
    db: &Database,
    suggestion: &Suggestion,
    banner: &DecisionBanner,
) {
    let rendered = async {
        let mut message = locate_summary(http, db, suggestion).await?;
        let tally = db.tally_votes(&suggestion.id)?;
        sync_summary(http, &mut message, suggestion, tally, Some(banner)).await
    };
    if let Err(e) = rendered.await {
        warn!("Could not render decision on {}: {:#}", suggestion.id, e);
    }

    if let Some(thread) = suggestion.thread_id {
        if let Err(e) = ChannelId(thread)
            .edit_thread(http, |t| t.locked(true).archived(true))
            .await
        {
            warn!(
                "Could not lock thread {} of suggestion {}: {}",
                thread, suggestion.id, e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn tally(upvotes: i64, downvotes: i64) -> VoteTally {
        VoteTally { upvotes, downvotes }
    }

    fn submission(pros: &str, cons: &str) -> Submission {
        Submission {
            title: "Title".into(),
            description: "Description".into(),
            pros: pros.into(),
            cons: cons.into(),
            image_url: None,
        }
    }

    fn suggestion(status: SuggestionStatus, anonymous: bool, reason: Option<&str>) -> Suggestion {
        Suggestion {
            id: "abcd1234".into(),
            guild_id: 1,
            author_id: 2,
            message_id: 3,
            thread_id: None,
            title: "Title".into(),
            description: "Description".into(),
            pros: String::new(),
            cons: String::new(),
            image_url: None,
            status,
            created_at: Utc::now(),
            decision_reason: reason.map(String::from),
            decided_anonymously: anonymous,
        }
    }

    #[test]
    fn initial_fields_skip_empty_pros_and_cons() {
        let names: Vec<String> = initial_fields(&submission("", "costly"))
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, vec!["Description", "Cons", RESULTS_PENDING]);

        let full = initial_fields(&submission("fun", "costly"));
        assert_eq!(full.len(), 4);
        assert_eq!(full[3].value, "Upvotes: 0 ✅\nDownvotes: 0 ❌");
    }

    #[test]
    fn results_are_patched_in_place() {
        let mut fields = initial_fields(&submission("fun", "costly"));
        assert!(patch_results(&mut fields, SuggestionStatus::Pending, tally(3, 1)));
        assert!(patch_results(&mut fields, SuggestionStatus::Pending, tally(4, 1)));

        assert_eq!(fields.len(), 4);
        assert_eq!(fields[3].name, RESULTS_PENDING);
        assert_eq!(fields[3].value, "Upvotes: 4 ✅\nDownvotes: 1 ❌");
    }

    #[test]
    fn label_turns_final_once_decided() {
        let mut fields = initial_fields(&submission("", ""));
        patch_results(&mut fields, SuggestionStatus::Rejected, tally(0, 2));
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[1].name, RESULTS_FINAL);

        // A final label is still recognised on the next pass.
        assert!(patch_results(&mut fields, SuggestionStatus::Rejected, tally(0, 3)));
        assert_eq!(fields.len(), 2);
    }

    #[test]
    fn missing_results_field_is_not_appended() {
        let mut fields = vec![EmbedField::new("Description", "d", false)];
        assert!(!patch_results(&mut fields, SuggestionStatus::Pending, tally(1, 0)));
        assert_eq!(fields.len(), 1);
    }

    #[test]
    fn colours_distinguish_states() {
        let pending = status_colour(SuggestionStatus::Pending);
        let approved = status_colour(SuggestionStatus::Approved);
        let rejected = status_colour(SuggestionStatus::Rejected);
        assert_ne!(pending, approved);
        assert_ne!(approved, rejected);
        assert_ne!(pending, rejected);
    }

    #[test]
    fn banner_names_reviewer_or_hides_them() {
        let approved = suggestion(SuggestionStatus::Approved, false, Some("good idea"));
        let banner = DecisionBanner::for_suggestion(&approved, 77).unwrap();
        assert_eq!(banner.title(), "✅ Approved");
        assert_eq!(banner.text(), "Approved by: <@77>\nReason: good idea");

        let rejected = suggestion(SuggestionStatus::Rejected, true, None);
        let banner = DecisionBanner::for_suggestion(&rejected, 77).unwrap();
        assert_eq!(banner.title(), "❌ Rejected");
        assert_eq!(banner.text(), "Rejected by: Anonymous Reviewer");

        let pending = suggestion(SuggestionStatus::Pending, false, None);
        assert_eq!(DecisionBanner::for_suggestion(&pending, 77), None);
    }

    #[test]
    fn banner_is_added_once() {
        let approved = suggestion(SuggestionStatus::Approved, false, None);
        let banner = DecisionBanner::for_suggestion(&approved, 1).unwrap();
        let mut fields = initial_fields(&submission("", ""));
        assert!(add_decision_banner(&mut fields, &banner));
        assert!(!add_decision_banner(&mut fields, &banner));
        assert_eq!(fields.len(), 3);
    }

    #[test]
    fn vote_custom_ids_round_trip() {
        let id = vote_custom_id(VoteType::Downvote, "abcd1234");
        assert_eq!(id, "downvote:abcd1234");
        assert_eq!(
            parse_vote_custom_id(&id),
            Some((VoteType::Downvote, "abcd1234"))
        );
        assert_eq!(parse_vote_custom_id("sidevote:abcd1234"), None);
        assert_eq!(parse_vote_custom_id("upvote"), None);
    }

    #[test]
    fn thread_names_are_truncated() {
        assert_eq!(thread_name("short"), "short");
        assert_eq!(thread_name(&"x".repeat(200)).chars().count(), 80);
    }
}
